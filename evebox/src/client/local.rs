//! Offline aggregation over Suricata EVE log files.
//!
//! Mirrors EveBox's oneshot mode: events are read once into memory and every
//! query covers all of them, so time ranges are not applied.

use super::ReportApi;
use crate::error::{Error, Result};
use crate::report::types::{AggregationRequest, ReportRow, SortOrder};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

pub struct EveFileReportApi {
    events: Vec<Value>,
}

impl EveFileReportApi {
    pub fn from_events(events: Vec<Value>) -> Self {
        Self { events }
    }

    /// Reads one JSON event per line. Malformed lines are skipped.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut events = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let reader = BufReader::new(File::open(path)?);
            let mut skipped = 0usize;
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Value>(&line) {
                    Ok(event) if event.is_object() => events.push(event),
                    _ => skipped += 1,
                }
            }
            if skipped > 0 {
                warn!(path = %path.display(), skipped, "Skipped malformed EVE lines");
            }
            info!(path = %path.display(), total = events.len(), "Loaded EVE events");
        }
        if events.is_empty() {
            return Err(Error::Config("no EVE events found in input".into()));
        }
        Ok(Self { events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn matches(event: &Value, request: &AggregationRequest) -> bool {
        let event_type = event["event_type"].as_str();
        // Stats records are never part of reports.
        if event_type == Some("stats") {
            return false;
        }
        if let Some(wanted) = &request.filters.event_type {
            if event_type != Some(wanted.as_str()) {
                return false;
            }
        }
        if let Some(query) = &request.filters.query_string {
            return query
                .split_whitespace()
                .all(|term| term_matches(event, term));
        }
        true
    }

    fn aggregate(&self, request: &AggregationRequest) -> Vec<ReportRow> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for event in self.events.iter().filter(|e| Self::matches(e, request)) {
            for key in lookup(event, &request.field) {
                *counts.entry(key).or_default() += 1;
            }
        }

        let mut rows: Vec<ReportRow> = counts
            .into_iter()
            .map(|(key, count)| ReportRow { key, count })
            .collect();
        rows.sort_by(|a, b| {
            let by_count = match request.order {
                SortOrder::Desc => b.count.cmp(&a.count),
                SortOrder::Asc => a.count.cmp(&b.count),
            };
            by_count.then_with(|| a.key.cmp(&b.key))
        });
        rows.truncate(request.size.get());
        rows
    }
}

/// `field:value` must match exactly; a bare word matches any string value.
fn term_matches(event: &Value, term: &str) -> bool {
    match term.split_once(':') {
        Some((field, value)) if !field.is_empty() => {
            lookup(event, field).iter().any(|v| v == value)
        }
        _ => contains_text(event, term),
    }
}

fn contains_text(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.contains(needle),
        Value::Array(items) => items.iter().any(|v| contains_text(v, needle)),
        Value::Object(map) => map.values().any(|v| contains_text(v, needle)),
        _ => false,
    }
}

/// Values at a dotted path; array elements count individually.
fn lookup(event: &Value, path: &str) -> Vec<String> {
    let mut current = event;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return Vec::new(),
        }
    }
    match current {
        Value::Null | Value::Object(_) => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Null | Value::Object(_) | Value::Array(_) => None,
                other => Some(other.to_string()),
            })
            .collect(),
        other => vec![other.to_string()],
    }
}

#[async_trait]
impl ReportApi for EveFileReportApi {
    async fn run_aggregation(&self, request: &AggregationRequest) -> Result<Vec<ReportRow>> {
        if request.filters.time_range.is_some() {
            debug!("Ignoring time range for EVE file reports");
        }
        Ok(self.aggregate(request))
    }

    fn backend_name(&self) -> &str {
        "eve-file"
    }
}
