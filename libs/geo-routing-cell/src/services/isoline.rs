use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, warn};

use shared_config::AppConfig;

use crate::models::{Coordinate, GeoRoutingError, RangeKind, ReachableRegion, TravelConstraint};
use crate::GeoRoutingProvider;

/// Isochrone API client (openrouteservice-compatible endpoint).
///
/// The provider accepts one range type per request, so mixed
/// distance/duration profiles fan out into one request per kind. Each
/// response is a GeoJSON feature collection with one polygon per range value.
#[derive(Debug)]
pub struct IsolineClient {
    client: Client,
    base_url: String,
    api_key: String,
}

const ISOCHRONE_PATH: &str = "/v2/isochrones/driving-car";

impl IsolineClient {
    pub fn new(config: &AppConfig) -> Result<Self, GeoRoutingError> {
        if !config.is_geo_routing_configured() {
            return Err(GeoRoutingError::NotConfigured);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.isoline_timeout_seconds))
            .build()
            .map_err(|e| GeoRoutingError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.isoline_base_url.clone(),
            api_key: config.isoline_api_key.clone(),
        })
    }

    async fn fetch_isochrones(
        &self,
        origin: Coordinate,
        kind: RangeKind,
        values: &[u32],
    ) -> Result<Vec<ReachableRegion>, GeoRoutingError> {
        let url = format!("{}{}", self.base_url, ISOCHRONE_PATH);
        let range_type = match kind {
            RangeKind::Distance => "distance",
            RangeKind::Duration => "time",
        };

        debug!(
            "Requesting {} isochrones at ({}, {}) for ranges {:?}",
            range_type, origin.lat, origin.lng, values
        );

        let body = json!({
            "locations": [[origin.lng, origin.lat]],
            "range": values,
            "range_type": range_type,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await.map_err(GeoRoutingError::from)?;

        if !status.is_success() {
            error!("Isochrone request failed: {} - {}", status, response_text);
            return Err(GeoRoutingError::ProviderStatus {
                status: status.as_u16(),
                message: response_text,
            });
        }

        let parsed: IsochroneResponse = serde_json::from_str(&response_text)
            .map_err(|e| GeoRoutingError::InvalidResponse(e.to_string()))?;

        if parsed.features.is_empty() {
            warn!("Isochrone response carried no features for ranges {:?}", values);
        }

        let mut regions = Vec::with_capacity(parsed.features.len());
        for feature in parsed.features {
            let ring = feature
                .geometry
                .coordinates
                .into_iter()
                .next()
                .ok_or_else(|| {
                    GeoRoutingError::InvalidResponse("isochrone polygon has no outer ring".into())
                })?;

            let ring = ring
                .into_iter()
                .map(|pair| Coordinate::new(pair[1], pair[0]))
                .collect();

            regions.push(ReachableRegion::from_ring(
                kind,
                feature.properties.value.round() as u32,
                ring,
            ));
        }

        Ok(regions)
    }
}

#[async_trait]
impl GeoRoutingProvider for IsolineClient {
    async fn compute_isoline(
        &self,
        origin: Coordinate,
        constraints: &[TravelConstraint],
    ) -> Result<Vec<ReachableRegion>, GeoRoutingError> {
        let distance_values: Vec<u32> = constraints
            .iter()
            .filter_map(|c| c.distance_meters)
            .filter(|v| *v > 0)
            .collect();
        let duration_values: Vec<u32> = constraints
            .iter()
            .filter_map(|c| c.duration_seconds)
            .filter(|v| *v > 0)
            .collect();

        if distance_values.is_empty() && duration_values.is_empty() {
            return Err(GeoRoutingError::InvalidResponse(
                "no usable travel constraints".into(),
            ));
        }

        let mut regions = Vec::new();

        if !distance_values.is_empty() {
            regions.extend(
                self.fetch_isochrones(origin, RangeKind::Distance, &distance_values)
                    .await?,
            );
        }
        if !duration_values.is_empty() {
            regions.extend(
                self.fetch_isochrones(origin, RangeKind::Duration, &duration_values)
                    .await?,
            );
        }

        Ok(regions)
    }
}

#[derive(Debug, Deserialize)]
struct IsochroneResponse {
    features: Vec<IsochroneFeature>,
}

#[derive(Debug, Deserialize)]
struct IsochroneFeature {
    properties: IsochroneProperties,
    geometry: IsochroneGeometry,
}

#[derive(Debug, Deserialize)]
struct IsochroneProperties {
    value: f64,
}

#[derive(Debug, Deserialize)]
struct IsochroneGeometry {
    coordinates: Vec<Vec<[f64; 2]>>,
}
