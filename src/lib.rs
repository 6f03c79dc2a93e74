//! Metrics aggregation and deviation-projection core for the PulseBoard
//! dashboard. Callers hand in daily records and plan targets, and get back
//! period summaries and projected deviations as plain data; everything UI-,
//! auth- and payment-shaped lives outside this crate.

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use services::aggregation::aggregate;
pub use services::period::{convert, convert_with_policy, WorkdayPolicy};
pub use services::projection::{project, project_with_policy};
