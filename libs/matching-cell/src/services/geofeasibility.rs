use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use geo_routing_cell::{Coordinate, GeoRoutingProvider, TravelConstraint};

use crate::models::{ConstraintGroup, FeasibilityReason, FeasibilityVerdict, MatchingConfig};

/// Classifies grouped candidates as reachable or not by requesting one
/// isoline computation per group and testing each member's anchor point
/// against the returned regions.
///
/// Groups run concurrently through a bounded pool; a provider failure is
/// converted into verdicts for that group's members and never aborts the
/// sibling groups.
pub struct GeoFeasibilityClassifier {
    provider: Arc<dyn GeoRoutingProvider>,
    default_constraints: Vec<TravelConstraint>,
    max_concurrent: usize,
}

impl GeoFeasibilityClassifier {
    pub fn new(provider: Arc<dyn GeoRoutingProvider>, config: &MatchingConfig) -> Self {
        Self {
            provider,
            default_constraints: config.default_constraints.clone(),
            max_concurrent: config.max_concurrent_isoline_requests.max(1),
        }
    }

    pub async fn classify(
        &self,
        groups: Vec<ConstraintGroup>,
        origin: Coordinate,
    ) -> Vec<FeasibilityVerdict> {
        let verdicts: Vec<Vec<FeasibilityVerdict>> = stream::iter(
            groups
                .into_iter()
                .map(|group| self.classify_group(group, origin)),
        )
        .buffer_unordered(self.max_concurrent)
        .collect()
        .await;

        verdicts.into_iter().flatten().collect()
    }

    async fn classify_group(
        &self,
        group: ConstraintGroup,
        origin: Coordinate,
    ) -> Vec<FeasibilityVerdict> {
        let constraints = if group.constraints.is_empty() {
            &self.default_constraints
        } else {
            &group.constraints
        };

        match self.provider.compute_isoline(origin, constraints).await {
            Ok(regions) => {
                debug!(
                    "Group {} resolved {} reachable regions for {} members",
                    group.signature,
                    regions.len(),
                    group.members.len()
                );

                group
                    .members
                    .iter()
                    .map(|member| {
                        // Any one satisfied limit makes the candidate reachable.
                        let feasible = regions.iter().any(|region| region.contains(member.anchor));
                        FeasibilityVerdict {
                            candidate_id: member.id,
                            feasible,
                            reason: (!feasible).then_some(FeasibilityReason::OutsideServiceArea),
                        }
                    })
                    .collect()
            }
            Err(err) => {
                warn!(
                    "Isoline computation failed for group {}: {}",
                    group.signature, err
                );

                group
                    .members
                    .iter()
                    .map(|member| FeasibilityVerdict {
                        candidate_id: member.id,
                        feasible: false,
                        reason: Some(FeasibilityReason::GeoProviderError),
                    })
                    .collect()
            }
        }
    }
}
