use std::collections::BTreeMap;

use crate::models::{ConstraintGroup, GeoCandidate, TravelConstraint};

/// Signature used for candidates whose profile collapses to nothing after
/// normalization; the classifier substitutes the system default profile.
pub const DEFAULT_SIGNATURE: &str = "default";

/// Partitions geo candidates into groups sharing an identical,
/// order-independent travel-constraint signature, so one isoline computation
/// serves every member of a group.
#[derive(Debug, Default, Clone)]
pub struct ConstraintGrouper;

impl ConstraintGrouper {
    /// Drops unusable entries (absent or zero limits), sorts ascending by
    /// `(distance, duration)` and removes duplicates.
    pub fn normalize(profile: &[TravelConstraint]) -> Vec<TravelConstraint> {
        let mut entries: Vec<TravelConstraint> =
            profile.iter().copied().filter(|c| !c.is_empty()).collect();
        entries.sort_by_key(|c| (c.distance_meters.unwrap_or(0), c.duration_seconds.unwrap_or(0)));
        entries.dedup();
        entries
    }

    pub fn signature(profile: &[TravelConstraint]) -> String {
        let normalized = Self::normalize(profile);
        if normalized.is_empty() {
            return DEFAULT_SIGNATURE.to_string();
        }

        normalized
            .iter()
            .map(|c| {
                format!(
                    "{}-{}",
                    c.distance_meters.unwrap_or(0),
                    c.duration_seconds.unwrap_or(0)
                )
            })
            .collect::<Vec<String>>()
            .join("|")
    }

    pub fn group(&self, candidates: Vec<GeoCandidate>) -> Vec<ConstraintGroup> {
        let mut groups: BTreeMap<String, ConstraintGroup> = BTreeMap::new();

        for candidate in candidates {
            let constraints = Self::normalize(&candidate.constraint_profile);
            let signature = Self::signature(&candidate.constraint_profile);

            groups
                .entry(signature.clone())
                .or_insert_with(|| ConstraintGroup {
                    signature,
                    constraints,
                    members: vec![],
                })
                .members
                .push(candidate);
        }

        groups.into_values().collect()
    }
}
