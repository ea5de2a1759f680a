use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::PostgrestClient;

use crate::models::{ExistingBooking, ScheduleModel, TherapistProfile};

/// Data access consumed by the matching engine. Production speaks PostgREST;
/// tests plug in an in-memory implementation.
#[async_trait]
pub trait TherapistRepository: Send + Sync {
    async fn load_pool(&self, service_id: &str, region: &str) -> Result<Vec<TherapistProfile>>;

    /// Returns `None` when the therapist has no schedule configured; the
    /// engine reports that as unavailability, not as an error.
    async fn load_schedule(&self, therapist_id: Uuid) -> Result<Option<ScheduleModel>>;

    /// Cancelled bookings are excluded at the source.
    async fn load_active_bookings(&self, therapist_id: Uuid) -> Result<Vec<ExistingBooking>>;
}

pub struct PostgrestTherapistRepository {
    client: PostgrestClient,
}

impl PostgrestTherapistRepository {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: PostgrestClient::new(config),
        }
    }
}

#[async_trait]
impl TherapistRepository for PostgrestTherapistRepository {
    async fn load_pool(&self, service_id: &str, region: &str) -> Result<Vec<TherapistProfile>> {
        debug!(
            "Loading therapist pool for service {} in region {}",
            service_id, region
        );

        // Region scoping stays in CandidateFilter so that region-unrestricted
        // therapists are not dropped server-side.
        let path = format!(
            "/rest/v1/therapists?is_active=eq.true&service_ids=cs.{{{}}}&order=full_name.asc",
            service_id
        );
        let result: Vec<Value> = self.client.request(Method::GET, &path, None).await?;

        let pool: Vec<TherapistProfile> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<TherapistProfile>, _>>()?;

        Ok(pool)
    }

    async fn load_schedule(&self, therapist_id: Uuid) -> Result<Option<ScheduleModel>> {
        debug!("Loading schedule for therapist {}", therapist_id);

        let path = format!(
            "/rest/v1/therapist_schedules?therapist_id=eq.{}&select=*,weekly_rules(*),exceptions:schedule_exceptions(*)",
            therapist_id
        );
        let result: Vec<Value> = self.client.request(Method::GET, &path, None).await?;

        let Some(row) = result.into_iter().next() else {
            return Ok(None);
        };

        let schedule: ScheduleModel = serde_json::from_value(row)?;
        Ok(Some(schedule))
    }

    async fn load_active_bookings(&self, therapist_id: Uuid) -> Result<Vec<ExistingBooking>> {
        debug!("Loading active bookings for therapist {}", therapist_id);

        let path = format!(
            "/rest/v1/bookings?therapist_id=eq.{}&status=neq.cancelled&order=start_time.asc",
            therapist_id
        );
        let result: Vec<Value> = self.client.request(Method::GET, &path, None).await?;

        let bookings: Vec<ExistingBooking> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<ExistingBooking>, _>>()?;

        Ok(bookings)
    }
}
