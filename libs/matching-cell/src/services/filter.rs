use std::collections::HashSet;

use tracing::debug;

use crate::models::{GenderPreference, TherapistProfile};

/// Narrows the raw therapist pool to bookable candidates. Held by the engine
/// as an explicit collaborator rather than shared query helpers.
#[derive(Debug, Default, Clone)]
pub struct CandidateFilter;

impl CandidateFilter {
    pub fn apply(
        &self,
        pool: Vec<TherapistProfile>,
        service_id: &str,
        region: &str,
        gender_preference: Option<GenderPreference>,
    ) -> Vec<TherapistProfile> {
        let target_region = canonical_region(region).to_string();
        let mut seen: HashSet<uuid::Uuid> = HashSet::new();

        let candidates: Vec<TherapistProfile> = pool
            .into_iter()
            .filter(|t| t.is_active)
            .filter(|t| t.service_ids.iter().any(|s| s == service_id))
            .filter(|t| t.home_coordinate.is_valid())
            .filter(|t| !t.region_restricted || canonical_region(&t.region) == target_region)
            .filter(|t| seen.insert(t.id))
            .filter(|t| match gender_preference {
                None | Some(GenderPreference::NoPreference) => true,
                Some(preference) => preference.accepts(t.gender),
            })
            .collect();

        debug!(
            "Filtered pool to {} candidates for service {} in region {}",
            candidates.len(),
            service_id,
            region
        );

        candidates
    }
}

/// The Jakarta metro id is administered as part of the wider Jabodetabek
/// area; both ids name the same coverage for region-restriction purposes.
fn canonical_region(region: &str) -> &str {
    match region {
        "jakarta" => "jabodetabek",
        other => other,
    }
}
