use super::{wire, ReportApi};
use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::metrics::{record_request, record_truncated};
use crate::report::types::{AggregationRequest, ReportRow};
use async_trait::async_trait;
use reqwest::Url;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Aggregation client for the EveBox HTTP API.
#[derive(Debug, Clone)]
pub struct HttpReportClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpReportClient {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .user_agent(concat!("evebox-reports/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let endpoint = endpoint_url(&config.url, &config.agg_path)?;
        Ok(Self { client, endpoint })
    }

    /// Client with default settings pointed at `base_url`.
    pub fn from_url(base_url: &str) -> Result<Self> {
        Self::new(&ServerConfig {
            url: base_url.to_string(),
            ..ServerConfig::default()
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Full query URL for `request`.
    pub fn aggregation_url(&self, request: &AggregationRequest) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("agg", &request.field)
                .append_pair("size", &request.size.to_string())
                .append_pair("order", request.order.as_str());
            if let Some(q) = &request.filters.query_string {
                query.append_pair("queryString", q);
            }
            if let Some(range) = &request.filters.time_range {
                query.append_pair("timeRange", range);
            }
            if let Some(event_type) = &request.filters.event_type {
                query.append_pair("eventType", event_type);
            }
        }
        url
    }

    async fn fetch(&self, request: &AggregationRequest) -> Result<Vec<ReportRow>> {
        let url = self.aggregation_url(request);
        debug!(%url, kind = %request.kind, "Running aggregation");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let reason = wire::error_reason(&body);
            warn!(status = status.as_u16(), %reason, field = %request.field, "Aggregation failed");
            return Err(Error::Backend {
                status: status.as_u16(),
                reason,
            });
        }

        let mut rows = wire::decode_rows(&body)?;
        let size = request.size.get();
        if rows.len() > size {
            warn!(
                returned = rows.len(),
                size,
                field = %request.field,
                "Backend returned more rows than requested, truncating"
            );
            record_truncated(rows.len() - size);
            rows.truncate(size);
        }
        Ok(rows)
    }
}

/// Joins the API path onto the base URL, keeping any path prefix the base has.
fn endpoint_url(base: &str, path: &str) -> Result<Url> {
    let mut base = base.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let base = Url::parse(&base).map_err(|e| Error::InvalidUrl(format!("{}: {}", base, e)))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl(format!(
            "unsupported scheme '{}'",
            base.scheme()
        )));
    }
    base.join(path.trim_start_matches('/'))
        .map_err(|e| Error::InvalidUrl(format!("{}: {}", path, e)))
}

#[async_trait]
impl ReportApi for HttpReportClient {
    async fn run_aggregation(&self, request: &AggregationRequest) -> Result<Vec<ReportRow>> {
        let start = Instant::now();
        let result = self.fetch(request).await;
        let status = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        record_request(status, start.elapsed());
        result
    }

    fn backend_name(&self) -> &str {
        self.endpoint.host_str().unwrap_or("evebox")
    }
}
