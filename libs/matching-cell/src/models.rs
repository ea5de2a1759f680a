use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use geo_routing_cell::{Coordinate, TravelConstraint};

/// Per-therapist scheduling configuration. Owned by the therapist record;
/// read-only to the matching engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleModel {
    pub therapist_id: Uuid,
    pub timezone: Tz,
    pub slot_duration_minutes: i64,
    pub buffer_minutes: i64,
    pub max_advance_booking_days: i64,
    pub min_booking_lead_hours: Option<i64>,
    pub start_window_date: Option<NaiveDate>,
    pub end_window_date: Option<NaiveDate>,
    pub weekly_rules: Vec<WeeklyRule>,
    pub exceptions: Vec<DateException>,
}

impl ScheduleModel {
    pub fn exception_for(&self, date: NaiveDate) -> Option<&DateException> {
        self.exceptions.iter().find(|e| e.date == date)
    }

    /// Working intervals for a calendar date, wall-clock in `timezone`.
    /// An exception for the date fully replaces the weekly rules; null
    /// exception times block the whole day.
    pub fn effective_intervals(&self, date: NaiveDate) -> Vec<(NaiveTime, NaiveTime)> {
        if let Some(exception) = self.exception_for(date) {
            return match (exception.start_time, exception.end_time) {
                (Some(start), Some(end)) => vec![(start, end)],
                _ => vec![],
            };
        }

        let day_of_week = date.weekday().num_days_from_sunday();
        self.weekly_rules
            .iter()
            .filter(|rule| rule.day_of_week == day_of_week)
            .map(|rule| (rule.start_time, rule.end_time))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyRule {
    pub day_of_week: u32, // 0 = Sunday, 1 = Monday, etc.
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// A date-specific schedule override. Null times mean the therapist is off
/// for the whole day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateException {
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::InProgress
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingBooking {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub status: BookingStatus,
    pub location: Option<Coordinate>,
}

impl ExistingBooking {
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + chrono::Duration::minutes(self.duration_minutes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenderPreference {
    #[default]
    NoPreference,
    Male,
    Female,
}

impl GenderPreference {
    pub fn accepts(&self, gender: Gender) -> bool {
        match self {
            GenderPreference::NoPreference => true,
            GenderPreference::Male => gender == Gender::Male,
            GenderPreference::Female => gender == Gender::Female,
        }
    }
}

/// Pool entry loaded per matching request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TherapistProfile {
    pub id: Uuid,
    pub full_name: String,
    pub gender: Gender,
    pub is_active: bool,
    pub service_ids: Vec<String>,
    pub region: String,
    pub region_restricted: bool,
    pub home_coordinate: Coordinate,
    pub constraint_profile: Vec<TravelConstraint>,
}

/// Either a concrete instant or an all-day request evaluated at day
/// granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedTime {
    At(DateTime<Utc>),
    AllDay(NaiveDate),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    pub service_id: String,
    pub region: String,
    pub requested_time: RequestedTime,
    pub coordinate: Coordinate,
    pub address: Option<String>,
    pub gender_preference: Option<GenderPreference>,
    pub exclude_booking_id: Option<Uuid>,
}

impl MatchRequest {
    pub fn validate(&self) -> Result<(), MatchingError> {
        if self.service_id.trim().is_empty() {
            return Err(MatchingError::InvalidRequest(
                "service_id must not be empty".to_string(),
            ));
        }
        if !self.coordinate.is_valid() {
            return Err(MatchingError::InvalidRequest(
                "patient coordinate must be a finite, non-zero location".to_string(),
            ));
        }
        Ok(())
    }
}

/// Explicit caller context threaded through evaluation instead of hidden
/// current-actor state.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub actor_id: Option<Uuid>,
    pub now: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(actor_id: Option<Uuid>) -> Self {
        Self {
            actor_id,
            now: Utc::now(),
        }
    }

    pub fn at(actor_id: Option<Uuid>, now: DateTime<Utc>) -> Self {
        Self { actor_id, now }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnavailableReason {
    ScheduleMissing,
    PastInstant,
    BookingWindowExceeded,
    LeadTimeTooShort,
    OutsideDateWindow,
    NoSlotForDate,
    OverlappingBooking,
}

impl std::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            UnavailableReason::ScheduleMissing => "Therapist has no schedule configured",
            UnavailableReason::PastInstant => "Requested time is in the past",
            UnavailableReason::BookingWindowExceeded => {
                "Requested time exceeds the advance booking window"
            }
            UnavailableReason::LeadTimeTooShort => {
                "Requested time is inside the minimum booking lead time"
            }
            UnavailableReason::OutsideDateWindow => {
                "Requested date is outside the therapist's booking dates"
            }
            UnavailableReason::NoSlotForDate => "No working slot covers the requested time",
            UnavailableReason::OverlappingBooking => {
                "Requested time overlaps an existing booking"
            }
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeasibilityReason {
    OutsideServiceArea,
    GeoProviderError,
}

/// Outcome of the temporal rule chain. The first entry of `reasons` is the
/// authoritative verdict; the rest are kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityDecision {
    pub available: bool,
    pub reasons: Vec<UnavailableReason>,
}

impl AvailabilityDecision {
    pub fn free() -> Self {
        Self {
            available: true,
            reasons: vec![],
        }
    }

    pub fn blocked(reasons: Vec<UnavailableReason>) -> Self {
        Self {
            available: false,
            reasons,
        }
    }

    pub fn primary_reason(&self) -> Option<UnavailableReason> {
        self.reasons.first().copied()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeasibilityVerdict {
    pub candidate_id: Uuid,
    pub feasible: bool,
    pub reason: Option<FeasibilityReason>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub candidate_id: Uuid,
    pub temporally_available: bool,
    pub unavailable_reason: Option<UnavailableReason>,
    pub availability_reasons: Vec<UnavailableReason>,
    pub feasible: Option<bool>,
    pub feasibility_reason: Option<FeasibilityReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchState {
    Unavailable,
    Feasible,
    NotFeasible,
    FeasibilityUnknown,
}

impl MatchResult {
    pub fn state(&self) -> MatchState {
        if !self.temporally_available {
            return MatchState::Unavailable;
        }
        if self.feasibility_reason == Some(FeasibilityReason::GeoProviderError) {
            return MatchState::FeasibilityUnknown;
        }
        match self.feasible {
            Some(true) => MatchState::Feasible,
            Some(false) => MatchState::NotFeasible,
            None => MatchState::FeasibilityUnknown,
        }
    }
}

/// A temporally available candidate entering the geo phase.
#[derive(Debug, Clone)]
pub struct GeoCandidate {
    pub id: Uuid,
    pub anchor: Coordinate,
    pub constraint_profile: Vec<TravelConstraint>,
}

/// Candidates sharing one normalized constraint signature; classified with a
/// single isoline computation.
#[derive(Debug, Clone)]
pub struct ConstraintGroup {
    pub signature: String,
    pub constraints: Vec<TravelConstraint>,
    pub members: Vec<GeoCandidate>,
}

#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub default_constraints: Vec<TravelConstraint>,
    pub max_concurrent_evaluations: usize,
    pub max_concurrent_isoline_requests: usize,
    pub enforce_min_lead_time: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            default_constraints: vec![
                TravelConstraint::distance(10_000),
                TravelConstraint::duration(3_600),
            ],
            max_concurrent_evaluations: 8,
            max_concurrent_isoline_requests: 4,
            enforce_min_lead_time: false,
        }
    }
}

// Error types specific to matching operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum MatchingError {
    #[error("Invalid match request: {0}")]
    InvalidRequest(String),

    #[error("Repository error: {0}")]
    Repository(String),
}
