//! Production line dashboard: line utilization and demand fulfillment
//! reports over CSV datasets.
//!
//! The aggregation engine lives in [`reports`] and only ever sees records
//! handed to it; [`loader`] turns CSV files into those records and
//! [`dashboard`] drives the interactive session.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod loader;
pub mod logging;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;

pub use error::{DashboardError, Result};
