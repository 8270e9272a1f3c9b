//! evebox: aggregation reports over EveBox security events
//!
//! - `report/` - request builder, presets, result types and the report view model
//! - `client/` - the `ReportApi` seam, the EveBox HTTP client and an offline EVE file backend
//! - `render` - table and JSON output
//! - `config` - TOML configuration

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod render;
pub mod report;

pub use client::{EveFileReportApi, HttpReportClient, ReportApi};
pub use config::Config;
pub use error::{Error, Result, ValidationError};
