pub mod models;
pub mod services;

pub use models::{Coordinate, GeoRoutingError, RangeKind, ReachableRegion, TravelConstraint};
pub use services::isoline::IsolineClient;

use async_trait::async_trait;

/// A routing provider able to compute reachable-region polygons (isolines)
/// around an origin point for a set of distance/duration constraints.
#[async_trait]
pub trait GeoRoutingProvider: Send + Sync {
    async fn compute_isoline(
        &self,
        origin: Coordinate,
        constraints: &[TravelConstraint],
    ) -> Result<Vec<ReachableRegion>, GeoRoutingError>;
}
