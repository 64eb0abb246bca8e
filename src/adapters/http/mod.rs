//! HTTP adapter: JSON boundary for risk assessment.
//!
//! - `POST /api/predict`: clinical record in, prediction and advisories out
//! - `GET /api/health`: liveness plus model load status

mod dto;
mod handlers;
mod routes;

pub use dto::{ErrorResponse, HealthResponse, PredictResponse, RecommendationResponse};
pub use handlers::AppState;
pub use routes::router;
