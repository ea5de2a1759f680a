use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use matching_cell::models::{
    AvailabilityDecision, BookingStatus, DateException, ExistingBooking, MatchingConfig,
    RequestContext, RequestedTime, ScheduleModel, UnavailableReason, WeeklyRule,
};
use matching_cell::AvailabilityEvaluator;

// ==============================================================================
// TEST FIXTURES AND UTILITIES
// ==============================================================================

const JAKARTA: Tz = chrono_tz::Asia::Jakarta;

fn jakarta_schedule() -> ScheduleModel {
    ScheduleModel {
        therapist_id: Uuid::new_v4(),
        timezone: JAKARTA,
        slot_duration_minutes: 60,
        buffer_minutes: 15,
        max_advance_booking_days: 30,
        min_booking_lead_hours: None,
        start_window_date: None,
        end_window_date: None,
        weekly_rules: vec![WeeklyRule {
            day_of_week: 1, // Monday
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        }],
        exceptions: vec![],
    }
}

fn evaluator() -> AvailabilityEvaluator {
    AvailabilityEvaluator::new(&MatchingConfig::default())
}

fn ctx() -> RequestContext {
    RequestContext::at(None, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
}

/// Monday 2025-03-10 at the given wall-clock time in the Jakarta zone.
fn monday_at(hour: u32, minute: u32) -> RequestedTime {
    RequestedTime::At(
        JAKARTA
            .with_ymd_and_hms(2025, 3, 10, hour, minute, 0)
            .unwrap()
            .with_timezone(&Utc),
    )
}

fn booking(hour: u32, minute: u32, status: BookingStatus) -> ExistingBooking {
    ExistingBooking {
        id: Uuid::new_v4(),
        start_time: JAKARTA
            .with_ymd_and_hms(2025, 3, 10, hour, minute, 0)
            .unwrap()
            .with_timezone(&Utc),
        duration_minutes: 60,
        status,
        location: None,
    }
}

fn evaluate(
    schedule: &ScheduleModel,
    bookings: &[ExistingBooking],
    requested: RequestedTime,
) -> AvailabilityDecision {
    evaluator().evaluate(schedule, bookings, requested, None, &ctx())
}

// ==============================================================================
// RULE CHAIN TESTS
// ==============================================================================

#[test]
fn weekly_rule_admits_instant_inside_interval() {
    let decision = evaluate(&jakarta_schedule(), &[], monday_at(9, 0));
    assert!(decision.available);
    assert!(decision.reasons.is_empty());
}

#[test]
fn evaluation_is_deterministic() {
    let schedule = jakarta_schedule();
    let bookings = [booking(8, 30, BookingStatus::Confirmed)];

    let first = evaluate(&schedule, &bookings, monday_at(9, 40));
    let second = evaluate(&schedule, &bookings, monday_at(9, 40));

    assert_eq!(first, second);
}

#[test]
fn instant_outside_weekly_interval_is_rejected() {
    let decision = evaluate(&jakarta_schedule(), &[], monday_at(13, 0));
    assert!(!decision.available);
    assert_eq!(
        decision.primary_reason(),
        Some(UnavailableReason::NoSlotForDate)
    );
}

#[test]
fn day_without_rules_is_rejected() {
    // Tuesday 2025-03-11 has no weekly rule.
    let requested = RequestedTime::At(
        JAKARTA
            .with_ymd_and_hms(2025, 3, 11, 9, 0, 0)
            .unwrap()
            .with_timezone(&Utc),
    );
    let decision = evaluate(&jakarta_schedule(), &[], requested);
    assert_eq!(
        decision.primary_reason(),
        Some(UnavailableReason::NoSlotForDate)
    );
}

#[test]
fn past_instant_is_rejected_and_first_reason_wins() {
    // Tuesday before "now": both the past rule and slot membership fail; the
    // past rule is authoritative and the rest stays available as diagnostics.
    let requested = RequestedTime::At(
        JAKARTA
            .with_ymd_and_hms(2025, 2, 25, 9, 0, 0)
            .unwrap()
            .with_timezone(&Utc),
    );
    let decision = evaluate(&jakarta_schedule(), &[], requested);

    assert!(!decision.available);
    assert_eq!(
        decision.primary_reason(),
        Some(UnavailableReason::PastInstant)
    );
    assert!(decision
        .reasons
        .contains(&UnavailableReason::NoSlotForDate));
}

#[test]
fn advance_booking_window_is_enforced() {
    // Monday 2025-04-14 is 44 days past "now" with a 30-day window.
    let requested = RequestedTime::At(
        JAKARTA
            .with_ymd_and_hms(2025, 4, 14, 9, 0, 0)
            .unwrap()
            .with_timezone(&Utc),
    );
    let decision = evaluate(&jakarta_schedule(), &[], requested);
    assert_eq!(
        decision.primary_reason(),
        Some(UnavailableReason::BookingWindowExceeded)
    );
}

#[test]
fn date_window_bounds_are_inclusive() {
    let mut schedule = jakarta_schedule();
    schedule.start_window_date = NaiveDate::from_ymd_opt(2025, 3, 10);
    schedule.end_window_date = NaiveDate::from_ymd_opt(2025, 3, 10);
    assert!(evaluate(&schedule, &[], monday_at(9, 0)).available);

    schedule.start_window_date = NaiveDate::from_ymd_opt(2025, 3, 11);
    let decision = evaluate(&schedule, &[], monday_at(9, 0));
    assert_eq!(
        decision.primary_reason(),
        Some(UnavailableReason::OutsideDateWindow)
    );

    schedule.start_window_date = None;
    schedule.end_window_date = NaiveDate::from_ymd_opt(2025, 3, 9);
    let decision = evaluate(&schedule, &[], monday_at(9, 0));
    assert_eq!(
        decision.primary_reason(),
        Some(UnavailableReason::OutsideDateWindow)
    );
}

// ==============================================================================
// DATE EXCEPTION TESTS
// ==============================================================================

#[test]
fn null_time_exception_blocks_the_whole_day() {
    let mut schedule = jakarta_schedule();
    schedule.exceptions.push(DateException {
        date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        start_time: None,
        end_time: None,
        reason: Some("public holiday".to_string()),
    });

    // The weekly Monday rule would admit 09:00; the exception wins.
    let decision = evaluate(&schedule, &[], monday_at(9, 0));
    assert!(!decision.available);
    assert_eq!(
        decision.primary_reason(),
        Some(UnavailableReason::NoSlotForDate)
    );
}

#[test]
fn timed_exception_replaces_weekly_interval_for_that_date() {
    let mut schedule = jakarta_schedule();
    schedule.exceptions.push(DateException {
        date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        start_time: NaiveTime::from_hms_opt(13, 0, 0),
        end_time: NaiveTime::from_hms_opt(15, 0, 0),
        reason: None,
    });

    // 09:00 sits in the (overridden) weekly interval only.
    assert!(!evaluate(&schedule, &[], monday_at(9, 0)).available);
    // 14:00 sits in the exception interval.
    assert!(evaluate(&schedule, &[], monday_at(14, 0)).available);
}

// ==============================================================================
// OVERLAP TESTS
// ==============================================================================

#[test]
fn request_inside_buffered_booking_window_is_rejected() {
    // Existing booking 08:30 + 60min, buffer 15min: occupied until 09:45.
    let bookings = [booking(8, 30, BookingStatus::Confirmed)];

    let decision = evaluate(&jakarta_schedule(), &bookings, monday_at(9, 40));
    assert_eq!(
        decision.primary_reason(),
        Some(UnavailableReason::OverlappingBooking)
    );

    // Exactly at the buffer edge still counts as occupied.
    let decision = evaluate(&jakarta_schedule(), &bookings, monday_at(9, 45));
    assert_eq!(
        decision.primary_reason(),
        Some(UnavailableReason::OverlappingBooking)
    );

    // One minute past the buffer edge is free.
    let decision = evaluate(&jakarta_schedule(), &bookings, monday_at(9, 46));
    assert!(decision.available);
}

#[test]
fn request_swallowing_a_later_booking_is_rejected() {
    let bookings = [booking(10, 0, BookingStatus::Confirmed)];

    // 09:00 + 60min slot + 15min buffer reaches 10:15, over the 10:00 start.
    let decision = evaluate(&jakarta_schedule(), &bookings, monday_at(9, 0));
    assert_eq!(
        decision.primary_reason(),
        Some(UnavailableReason::OverlappingBooking)
    );

    // 08:44 ends its padded window at 09:59 and stays clear.
    assert!(evaluate(&jakarta_schedule(), &bookings, monday_at(8, 44)).available);
}

#[test]
fn cancelled_bookings_are_ignored() {
    let bookings = [booking(9, 0, BookingStatus::Cancelled)];
    assert!(evaluate(&jakarta_schedule(), &bookings, monday_at(9, 0)).available);
}

#[test]
fn excluded_booking_is_ignored_when_rescheduling() {
    let existing = booking(9, 0, BookingStatus::Confirmed);
    let exclude_id = existing.id;

    let blocked = evaluator().evaluate(
        &jakarta_schedule(),
        &[existing.clone()],
        monday_at(9, 0),
        None,
        &ctx(),
    );
    assert!(!blocked.available);

    let free = evaluator().evaluate(
        &jakarta_schedule(),
        &[existing],
        monday_at(9, 0),
        Some(exclude_id),
        &ctx(),
    );
    assert!(free.available);
}

// ==============================================================================
// ALL-DAY REQUESTS
// ==============================================================================

#[test]
fn all_day_request_only_needs_working_hours_on_the_date() {
    let monday = RequestedTime::AllDay(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
    assert!(evaluate(&jakarta_schedule(), &[], monday).available);

    let tuesday = RequestedTime::AllDay(NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());
    let decision = evaluate(&jakarta_schedule(), &[], tuesday);
    assert_eq!(
        decision.primary_reason(),
        Some(UnavailableReason::NoSlotForDate)
    );
}

#[test]
fn all_day_request_skips_the_overlap_rule() {
    // The whole Monday window is booked solid; day-granularity requests do
    // not probe a specific instant.
    let bookings = [
        booking(8, 0, BookingStatus::Confirmed),
        booking(9, 15, BookingStatus::Confirmed),
        booking(10, 30, BookingStatus::Confirmed),
    ];
    let monday = RequestedTime::AllDay(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
    assert!(evaluate(&jakarta_schedule(), &bookings, monday).available);
}

#[test]
fn all_day_request_in_the_past_is_rejected() {
    let requested = RequestedTime::AllDay(NaiveDate::from_ymd_opt(2025, 2, 24).unwrap());
    let decision = evaluate(&jakarta_schedule(), &[], requested);
    assert_eq!(
        decision.primary_reason(),
        Some(UnavailableReason::PastInstant)
    );
}

// ==============================================================================
// LEAD TIME (INERT BY DEFAULT)
// ==============================================================================

#[test]
fn lead_time_rule_is_inert_by_default() {
    let mut schedule = jakarta_schedule();
    schedule.min_booking_lead_hours = Some(48);

    // Only 24 hours of notice, but the rule is disabled.
    let now = JAKARTA
        .with_ymd_and_hms(2025, 3, 9, 9, 0, 0)
        .unwrap()
        .with_timezone(&Utc);
    let decision = evaluator().evaluate(
        &schedule,
        &[],
        monday_at(9, 0),
        None,
        &RequestContext::at(None, now),
    );
    assert!(decision.available);
}

#[test]
fn lead_time_rule_applies_when_enabled() {
    let mut schedule = jakarta_schedule();
    schedule.min_booking_lead_hours = Some(48);

    let config = MatchingConfig {
        enforce_min_lead_time: true,
        ..MatchingConfig::default()
    };
    let now = JAKARTA
        .with_ymd_and_hms(2025, 3, 9, 9, 0, 0)
        .unwrap()
        .with_timezone(&Utc);

    let decision = AvailabilityEvaluator::new(&config).evaluate(
        &schedule,
        &[],
        monday_at(9, 0),
        None,
        &RequestContext::at(None, now),
    );
    assert_eq!(
        decision.primary_reason(),
        Some(UnavailableReason::LeadTimeTooShort)
    );
}

// ==============================================================================
// TIMEZONE CORRECTNESS
// ==============================================================================

#[test]
fn rules_are_interpreted_in_the_schedule_timezone() {
    let mut schedule = jakarta_schedule();
    schedule.timezone = chrono_tz::America::New_York;

    // 13:00 UTC on Monday 2025-03-10 is 09:00 EDT, inside the Monday rule.
    let decision = evaluate(
        &schedule,
        &[],
        RequestedTime::At(Utc.with_ymd_and_hms(2025, 3, 10, 13, 0, 0).unwrap()),
    );
    assert!(decision.available);

    // 03:00 UTC the same calendar day is still Sunday evening in New York.
    let decision = evaluate(
        &schedule,
        &[],
        RequestedTime::At(Utc.with_ymd_and_hms(2025, 3, 10, 3, 0, 0).unwrap()),
    );
    assert_eq!(
        decision.primary_reason(),
        Some(UnavailableReason::NoSlotForDate)
    );
}
