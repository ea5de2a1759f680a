use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{
    AvailabilityDecision, FeasibilityVerdict, MatchResult, MatchState, UnavailableReason,
};

/// Joins the temporal and geographic phases into the final per-candidate
/// results. Candidates that failed the temporal check never entered the geo
/// phase and carry `feasible: None`.
pub struct ResultAggregator;

#[derive(Debug, Clone, Serialize)]
pub struct PartitionedResults {
    pub available_and_feasible: Vec<MatchResult>,
    pub available_not_feasible: Vec<MatchResult>,
    pub unavailable: Vec<MatchResult>,
}

impl ResultAggregator {
    pub fn aggregate(
        candidate_ids: &[Uuid],
        availability: &HashMap<Uuid, AvailabilityDecision>,
        feasibility: &HashMap<Uuid, FeasibilityVerdict>,
    ) -> Vec<MatchResult> {
        candidate_ids
            .iter()
            .map(|id| match availability.get(id) {
                Some(decision) if decision.available => {
                    let verdict = feasibility.get(id);
                    MatchResult {
                        candidate_id: *id,
                        temporally_available: true,
                        unavailable_reason: None,
                        availability_reasons: vec![],
                        feasible: verdict.map(|v| v.feasible),
                        feasibility_reason: verdict.and_then(|v| v.reason),
                    }
                }
                Some(decision) => MatchResult {
                    candidate_id: *id,
                    temporally_available: false,
                    unavailable_reason: decision.primary_reason(),
                    availability_reasons: decision.reasons.clone(),
                    feasible: None,
                    feasibility_reason: None,
                },
                None => MatchResult {
                    candidate_id: *id,
                    temporally_available: false,
                    unavailable_reason: Some(UnavailableReason::ScheduleMissing),
                    availability_reasons: vec![UnavailableReason::ScheduleMissing],
                    feasible: None,
                    feasibility_reason: None,
                },
            })
            .collect()
    }

    pub fn partition(results: &[MatchResult]) -> PartitionedResults {
        let mut partitioned = PartitionedResults {
            available_and_feasible: vec![],
            available_not_feasible: vec![],
            unavailable: vec![],
        };

        for result in results {
            match result.state() {
                MatchState::Feasible => partitioned.available_and_feasible.push(result.clone()),
                MatchState::NotFeasible | MatchState::FeasibilityUnknown => {
                    partitioned.available_not_feasible.push(result.clone())
                }
                MatchState::Unavailable => partitioned.unavailable.push(result.clone()),
            }
        }

        partitioned
    }
}
