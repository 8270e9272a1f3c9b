//! Report query client
//!
//! [`ReportApi`] is the seam between the report session and whatever answers
//! aggregation queries. [`HttpReportClient`] talks to a running EveBox server.

mod http;
mod local;
pub mod wire;

pub use http::HttpReportClient;
pub use local::EveFileReportApi;

use crate::error::Result;
use crate::report::types::{AggregationRequest, ReportRow};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait ReportApi: Send + Sync {
    /// Run one aggregation and return its buckets in backend order.
    ///
    /// One call is one request: no retries, no deduplication.
    async fn run_aggregation(&self, request: &AggregationRequest) -> Result<Vec<ReportRow>>;

    /// Human-readable backend name
    fn backend_name(&self) -> &str;
}

#[async_trait]
impl<T: ReportApi + ?Sized> ReportApi for Arc<T> {
    async fn run_aggregation(&self, request: &AggregationRequest) -> Result<Vec<ReportRow>> {
        (**self).run_aggregation(request).await
    }

    fn backend_name(&self) -> &str {
        (**self).backend_name()
    }
}
