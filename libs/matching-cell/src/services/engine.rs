use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use geo_routing_cell::GeoRoutingProvider;

use crate::models::{
    AvailabilityDecision, Coordinate, ExistingBooking, GeoCandidate, MatchRequest, MatchResult,
    MatchingConfig, MatchingError, RequestContext, RequestedTime, ScheduleModel, TherapistProfile,
    TravelConstraint, UnavailableReason,
};
use crate::repository::TherapistRepository;
use crate::services::aggregator::ResultAggregator;
use crate::services::availability::AvailabilityEvaluator;
use crate::services::filter::CandidateFilter;
use crate::services::geofeasibility::GeoFeasibilityClassifier;
use crate::services::grouping::ConstraintGrouper;

/// The matching pipeline: filter the pool, evaluate temporal availability
/// per candidate, group the available ones by travel-constraint signature,
/// classify reachability per group, and aggregate.
///
/// The engine is a plain future from the caller's point of view; dropping it
/// abandons any in-flight isoline requests along with it.
pub struct MatchingEngine {
    repository: Arc<dyn TherapistRepository>,
    filter: CandidateFilter,
    evaluator: AvailabilityEvaluator,
    grouper: ConstraintGrouper,
    classifier: GeoFeasibilityClassifier,
    config: MatchingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    candidate_id: Uuid,
    requested_time: RequestedTime,
    exclude_booking_id: Option<Uuid>,
}

#[derive(Clone)]
struct CandidateEvaluation {
    decision: AvailabilityDecision,
    anchor: Coordinate,
    constraint_profile: Vec<TravelConstraint>,
}

/// Evaluation cache shared by the visits of one matching call and discarded
/// with it. Not a process-wide cache.
struct MatchSession {
    memo: Mutex<HashMap<MemoKey, CandidateEvaluation>>,
}

impl MatchSession {
    fn new() -> Self {
        Self {
            memo: Mutex::new(HashMap::new()),
        }
    }

    async fn get(&self, key: &MemoKey) -> Option<CandidateEvaluation> {
        self.memo.lock().await.get(key).cloned()
    }

    async fn put(&self, key: MemoKey, evaluation: CandidateEvaluation) {
        self.memo.lock().await.insert(key, evaluation);
    }
}

impl MatchingEngine {
    pub fn new(
        repository: Arc<dyn TherapistRepository>,
        geo_provider: Arc<dyn GeoRoutingProvider>,
        config: MatchingConfig,
    ) -> Self {
        Self {
            repository,
            filter: CandidateFilter,
            evaluator: AvailabilityEvaluator::new(&config),
            grouper: ConstraintGrouper,
            classifier: GeoFeasibilityClassifier::new(geo_provider, &config),
            config,
        }
    }

    pub async fn find_available_therapists(
        &self,
        request: &MatchRequest,
        ctx: &RequestContext,
    ) -> Result<Vec<MatchResult>, MatchingError> {
        let session = MatchSession::new();
        self.run(request, ctx, &session).await
    }

    /// Matches every visit of a series against the pool with one shared
    /// evaluation cache, so a candidate probed for the same instant twice is
    /// computed once.
    pub async fn find_for_series(
        &self,
        requests: &[MatchRequest],
        ctx: &RequestContext,
    ) -> Result<Vec<Vec<MatchResult>>, MatchingError> {
        let session = MatchSession::new();
        let mut all_results = Vec::with_capacity(requests.len());

        for request in requests {
            all_results.push(self.run(request, ctx, &session).await?);
        }

        Ok(all_results)
    }

    async fn run(
        &self,
        request: &MatchRequest,
        ctx: &RequestContext,
        session: &MatchSession,
    ) -> Result<Vec<MatchResult>, MatchingError> {
        request.validate()?;

        debug!(
            "Matching request for service {} in region {}",
            request.service_id, request.region
        );

        let pool = self
            .repository
            .load_pool(&request.service_id, &request.region)
            .await
            .map_err(|e| MatchingError::Repository(e.to_string()))?;

        let candidates = self.filter.apply(
            pool,
            &request.service_id,
            &request.region,
            request.gender_preference,
        );

        let eval_futures: Vec<_> = candidates
            .iter()
            .map(|profile| self.evaluate_candidate(profile, request, ctx, session))
            .collect();

        let evaluations: Vec<Result<(Uuid, CandidateEvaluation), MatchingError>> =
            stream::iter(eval_futures)
                .buffer_unordered(self.config.max_concurrent_evaluations.max(1))
                .collect()
                .await;

        let mut availability: HashMap<Uuid, AvailabilityDecision> = HashMap::new();
        let mut geo_candidates: Vec<GeoCandidate> = Vec::new();

        for evaluation in evaluations {
            let (candidate_id, evaluation) = evaluation?;
            if evaluation.decision.available {
                geo_candidates.push(GeoCandidate {
                    id: candidate_id,
                    anchor: evaluation.anchor,
                    constraint_profile: evaluation.constraint_profile.clone(),
                });
            }
            availability.insert(candidate_id, evaluation.decision);
        }

        let groups = self.grouper.group(geo_candidates);
        info!(
            "{} temporally available candidates collapsed into {} constraint groups",
            availability.values().filter(|d| d.available).count(),
            groups.len()
        );

        let verdicts = self.classifier.classify(groups, request.coordinate).await;
        let feasibility = verdicts
            .into_iter()
            .map(|v| (v.candidate_id, v))
            .collect::<HashMap<_, _>>();

        let candidate_ids: Vec<Uuid> = candidates.iter().map(|c| c.id).collect();
        Ok(ResultAggregator::aggregate(
            &candidate_ids,
            &availability,
            &feasibility,
        ))
    }

    async fn evaluate_candidate(
        &self,
        profile: &TherapistProfile,
        request: &MatchRequest,
        ctx: &RequestContext,
        session: &MatchSession,
    ) -> Result<(Uuid, CandidateEvaluation), MatchingError> {
        let key = MemoKey {
            candidate_id: profile.id,
            requested_time: request.requested_time,
            exclude_booking_id: request.exclude_booking_id,
        };

        if let Some(cached) = session.get(&key).await {
            return Ok((profile.id, cached));
        }

        let schedule = self
            .repository
            .load_schedule(profile.id)
            .await
            .map_err(|e| MatchingError::Repository(e.to_string()))?;

        let evaluation = match schedule {
            None => CandidateEvaluation {
                decision: AvailabilityDecision::blocked(vec![UnavailableReason::ScheduleMissing]),
                anchor: profile.home_coordinate,
                constraint_profile: profile.constraint_profile.clone(),
            },
            Some(schedule) => {
                let bookings = self
                    .repository
                    .load_active_bookings(profile.id)
                    .await
                    .map_err(|e| MatchingError::Repository(e.to_string()))?;

                let decision = self.evaluator.evaluate(
                    &schedule,
                    &bookings,
                    request.requested_time,
                    request.exclude_booking_id,
                    ctx,
                );
                let anchor =
                    resolve_anchor(profile, &schedule, &bookings, request.requested_time);

                CandidateEvaluation {
                    decision,
                    anchor,
                    constraint_profile: profile.constraint_profile.clone(),
                }
            }
        };

        session.put(key, evaluation.clone()).await;
        Ok((profile.id, evaluation))
    }
}

/// Picks the candidate's geofeasibility anchor: the nearest adjacent active
/// booking with a usable visit location on the requested date wins over the
/// home address, modelling travel chaining between visits.
fn resolve_anchor(
    profile: &TherapistProfile,
    schedule: &ScheduleModel,
    bookings: &[ExistingBooking],
    requested: RequestedTime,
) -> Coordinate {
    let tz = schedule.timezone;
    let (target_date, probe_instant) = match requested {
        RequestedTime::At(instant) => (instant.with_timezone(&tz).date_naive(), Some(instant)),
        RequestedTime::AllDay(date) => (date, None),
    };

    bookings
        .iter()
        .filter(|b| b.status.is_active())
        .filter(|b| b.location.map_or(false, |c| c.is_valid()))
        .filter(|b| b.start_time.with_timezone(&tz).date_naive() == target_date)
        .min_by_key(|b| match probe_instant {
            Some(instant) => (b.start_time - instant).num_seconds().abs(),
            None => b.start_time.timestamp(),
        })
        .and_then(|b| b.location)
        .unwrap_or(profile.home_coordinate)
}
