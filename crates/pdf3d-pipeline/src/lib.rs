//! # pdf3d-pipeline
//!
//! The batch driver. Sources are processed strictly one at a time because the
//! CAD application and its signal files are a single shared resource; each
//! job ends in a [`JobReport`] whatever happens to it.

pub mod driver;
pub mod error;
pub mod metrics;
pub mod report;
pub mod state;

pub use driver::BatchDriver;
pub use error::JobFailure;
pub use metrics::{BatchMetrics, MetricsSnapshot};
pub use report::{BatchSummary, JobReport};
pub use state::JobState;
