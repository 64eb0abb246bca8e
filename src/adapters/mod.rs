//! Adapters layer: Concrete implementations of ports.
//!
//! - `logistic`: Exported logistic regression artifact (JSON + digest manifest)
//! - `shared`: Load-once handle around a model artifact
//! - `http`: axum JSON boundary
//! - `sanitize`: Clinical-value filtering for logs

pub mod http;
pub mod logistic;
pub mod sanitize;
pub mod shared;

pub use logistic::{Integrity, LogisticModel, ModelError};
pub use shared::SharedModel;
