//! Background jobs.

pub mod cleanup_surveys;
pub mod pool_metrics;
pub mod scheduler;

pub use cleanup_surveys::CleanupSurveysJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
