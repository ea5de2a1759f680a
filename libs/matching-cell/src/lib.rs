pub mod handlers;
pub mod models;
pub mod repository;
pub mod router;
pub mod services;

// Re-export the engine surface for external use
pub use models::*;
pub use repository::{PostgrestTherapistRepository, TherapistRepository};
pub use services::aggregator::{PartitionedResults, ResultAggregator};
pub use services::availability::AvailabilityEvaluator;
pub use services::engine::MatchingEngine;
pub use services::filter::CandidateFilter;
pub use services::geofeasibility::GeoFeasibilityClassifier;
pub use services::grouping::ConstraintGrouper;
