use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    Coordinate, GenderPreference, MatchRequest, MatchingConfig, MatchingError, RequestContext,
    RequestedTime,
};
use crate::repository::PostgrestTherapistRepository;
use crate::services::aggregator::ResultAggregator;
use crate::services::engine::MatchingEngine;

use geo_routing_cell::IsolineClient;

#[derive(Debug, Deserialize)]
pub struct MatchSearchPayload {
    pub service_id: String,
    pub region: String,
    pub requested_at: Option<DateTime<Utc>>,
    pub all_day_date: Option<NaiveDate>,
    pub coordinate: Coordinate,
    pub address: Option<String>,
    pub gender_preference: Option<GenderPreference>,
    pub exclude_booking_id: Option<Uuid>,
}

impl MatchSearchPayload {
    fn into_request(self) -> Result<MatchRequest, AppError> {
        let requested_time = match (self.requested_at, self.all_day_date) {
            (Some(instant), _) => RequestedTime::At(instant),
            (None, Some(date)) => RequestedTime::AllDay(date),
            (None, None) => {
                return Err(AppError::BadRequest(
                    "Either requested_at or all_day_date is required".to_string(),
                ))
            }
        };

        Ok(MatchRequest {
            service_id: self.service_id,
            region: self.region,
            requested_time,
            coordinate: self.coordinate,
            address: self.address,
            gender_preference: self.gender_preference,
            exclude_booking_id: self.exclude_booking_id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SeriesSearchPayload {
    pub visits: Vec<MatchSearchPayload>,
}

fn build_engine(config: &AppConfig) -> Result<MatchingEngine, AppError> {
    let repository = PostgrestTherapistRepository::new(config);
    let geo_provider =
        IsolineClient::new(config).map_err(|e| AppError::ExternalService(e.to_string()))?;

    Ok(MatchingEngine::new(
        Arc::new(repository),
        Arc::new(geo_provider),
        MatchingConfig::default(),
    ))
}

impl From<MatchingError> for AppError {
    fn from(err: MatchingError) -> Self {
        match err {
            MatchingError::InvalidRequest(msg) => AppError::BadRequest(msg),
            MatchingError::Repository(msg) => AppError::Database(msg),
        }
    }
}

#[axum::debug_handler]
pub async fn search_available_therapists(
    State(state): State<Arc<AppConfig>>,
    Json(payload): Json<MatchSearchPayload>,
) -> Result<Json<Value>, AppError> {
    let engine = build_engine(&state)?;
    let request = payload.into_request()?;
    let ctx = RequestContext::new(None);

    let results = engine.find_available_therapists(&request, &ctx).await?;
    let partitioned = ResultAggregator::partition(&results);

    Ok(Json(json!({
        "results": results,
        "available_and_feasible": partitioned.available_and_feasible,
        "available_not_feasible": partitioned.available_not_feasible,
        "unavailable": partitioned.unavailable,
        "total": results.len()
    })))
}

#[axum::debug_handler]
pub async fn search_for_series(
    State(state): State<Arc<AppConfig>>,
    Json(payload): Json<SeriesSearchPayload>,
) -> Result<Json<Value>, AppError> {
    if payload.visits.is_empty() {
        return Err(AppError::BadRequest(
            "At least one visit is required".to_string(),
        ));
    }

    let engine = build_engine(&state)?;
    let requests = payload
        .visits
        .into_iter()
        .map(MatchSearchPayload::into_request)
        .collect::<Result<Vec<MatchRequest>, AppError>>()?;
    let ctx = RequestContext::new(None);

    let results = engine.find_for_series(&requests, &ctx).await?;

    Ok(Json(json!({
        "visits": results,
        "total": results.len()
    })))
}
