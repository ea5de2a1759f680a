use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::models::{
    AvailabilityDecision, ExistingBooking, MatchingConfig, RequestContext, RequestedTime,
    ScheduleModel, UnavailableReason,
};

/// Pure temporal evaluation of one therapist schedule against one requested
/// time. No I/O; deterministic for a fixed `RequestContext::now`.
///
/// Rules run in a fixed order and every failing rule is recorded; the first
/// recorded reason is the authoritative verdict.
pub struct AvailabilityEvaluator {
    enforce_min_lead_time: bool,
}

/// Requested time resolved into the therapist's timezone.
struct SlotProbe {
    requested: RequestedTime,
    now: DateTime<Utc>,
    today_local: NaiveDate,
    date: NaiveDate,
    local_time: Option<NaiveTime>,
}

impl SlotProbe {
    fn resolve(schedule: &ScheduleModel, requested: RequestedTime, ctx: &RequestContext) -> Self {
        let tz = schedule.timezone;
        let (date, local_time) = match requested {
            RequestedTime::At(instant) => {
                let local = instant.with_timezone(&tz);
                (local.date_naive(), Some(local.time()))
            }
            RequestedTime::AllDay(date) => (date, None),
        };

        Self {
            requested,
            now: ctx.now,
            today_local: ctx.now.with_timezone(&tz).date_naive(),
            date,
            local_time,
        }
    }
}

impl AvailabilityEvaluator {
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            enforce_min_lead_time: config.enforce_min_lead_time,
        }
    }

    pub fn evaluate(
        &self,
        schedule: &ScheduleModel,
        bookings: &[ExistingBooking],
        requested: RequestedTime,
        exclude_booking_id: Option<Uuid>,
        ctx: &RequestContext,
    ) -> AvailabilityDecision {
        let probe = SlotProbe::resolve(schedule, requested, ctx);

        let checks = [
            Self::check_past_instant(&probe),
            Self::check_booking_window(schedule, &probe),
            self.check_lead_time(schedule, &probe),
            Self::check_date_window(schedule, &probe),
            Self::check_slot_membership(schedule, &probe),
            Self::check_overlap(schedule, bookings, &probe, exclude_booking_id),
        ];

        let reasons: Vec<UnavailableReason> = checks.into_iter().flatten().collect();

        if reasons.is_empty() {
            AvailabilityDecision::free()
        } else {
            AvailabilityDecision::blocked(reasons)
        }
    }

    fn check_past_instant(probe: &SlotProbe) -> Option<UnavailableReason> {
        let in_past = match probe.requested {
            RequestedTime::At(instant) => instant <= probe.now,
            RequestedTime::AllDay(_) => probe.date < probe.today_local,
        };
        in_past.then_some(UnavailableReason::PastInstant)
    }

    fn check_booking_window(schedule: &ScheduleModel, probe: &SlotProbe) -> Option<UnavailableReason> {
        let beyond_window = match probe.requested {
            RequestedTime::At(instant) => {
                instant > probe.now + Duration::days(schedule.max_advance_booking_days)
            }
            RequestedTime::AllDay(_) => {
                probe.date > probe.today_local + Duration::days(schedule.max_advance_booking_days)
            }
        };
        beyond_window.then_some(UnavailableReason::BookingWindowExceeded)
    }

    // Carried in the schedule schema but inert unless explicitly enabled.
    fn check_lead_time(&self, schedule: &ScheduleModel, probe: &SlotProbe) -> Option<UnavailableReason> {
        if !self.enforce_min_lead_time {
            return None;
        }
        let hours = schedule.min_booking_lead_hours.filter(|h| *h > 0)?;
        let earliest = probe.now + Duration::hours(hours);

        let too_soon = match probe.requested {
            RequestedTime::At(instant) => instant < earliest,
            RequestedTime::AllDay(_) => {
                probe.date < earliest.with_timezone(&schedule.timezone).date_naive()
            }
        };
        too_soon.then_some(UnavailableReason::LeadTimeTooShort)
    }

    fn check_date_window(schedule: &ScheduleModel, probe: &SlotProbe) -> Option<UnavailableReason> {
        if let Some(start) = schedule.start_window_date {
            if probe.date < start {
                return Some(UnavailableReason::OutsideDateWindow);
            }
        }
        if let Some(end) = schedule.end_window_date {
            if probe.date > end {
                return Some(UnavailableReason::OutsideDateWindow);
            }
        }
        None
    }

    fn check_slot_membership(schedule: &ScheduleModel, probe: &SlotProbe) -> Option<UnavailableReason> {
        let intervals = schedule.effective_intervals(probe.date);
        if intervals.is_empty() {
            return Some(UnavailableReason::NoSlotForDate);
        }

        match probe.local_time {
            // All-day requests only require the date to have working hours.
            None => None,
            Some(time) => {
                let covered = intervals
                    .iter()
                    .any(|(start, end)| *start <= time && time < *end);
                (!covered).then_some(UnavailableReason::NoSlotForDate)
            }
        }
    }

    fn check_overlap(
        schedule: &ScheduleModel,
        bookings: &[ExistingBooking],
        probe: &SlotProbe,
        exclude_booking_id: Option<Uuid>,
    ) -> Option<UnavailableReason> {
        // Day-granularity requests carry no instant to compare.
        let RequestedTime::At(requested) = probe.requested else {
            return None;
        };

        let buffer = Duration::minutes(schedule.buffer_minutes);
        let own_end = requested + Duration::minutes(schedule.slot_duration_minutes) + buffer;

        let conflict = bookings
            .iter()
            .filter(|booking| booking.status.is_active())
            .filter(|booking| Some(booking.id) != exclude_booking_id)
            .any(|booking| {
                let occupied_start = booking.start_time - buffer;
                let occupied_end = booking.end_time() + buffer;

                let inside_existing = occupied_start <= requested && requested <= occupied_end;
                let swallows_existing =
                    requested <= booking.start_time && booking.start_time <= own_end;

                inside_existing || swallows_existing
            });

        conflict.then_some(UnavailableReason::OverlappingBooking)
    }
}
