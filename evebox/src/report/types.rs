use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Which flavour of aggregation report the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregationKind {
    /// Free-form field chosen by the user.
    #[default]
    CustomAggregation,
    /// Field taken from a named preset.
    PresetAggregation,
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CustomAggregation => write!(f, "customAggregation"),
            Self::PresetAggregation => write!(f, "presetAggregation"),
        }
    }
}

/// Bucket ordering, applied by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Value sent in the `order` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// True when `counts` already follows this order.
    pub fn is_ordered<I>(&self, counts: I) -> bool
    where
        I: IntoIterator<Item = u64>,
    {
        let mut prev: Option<u64> = None;
        for count in counts {
            if let Some(p) = prev {
                let ok = match self {
                    Self::Asc => p <= count,
                    Self::Desc => p >= count,
                };
                if !ok {
                    return false;
                }
            }
            prev = Some(count);
        }
        true
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order '{}', expected ASC or DESC", other)),
        }
    }
}

/// Optional narrowing applied to the events being aggregated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
    /// Relative range such as `24h` or `7d`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

impl ReportFilters {
    pub fn is_empty(&self) -> bool {
        self.query_string.is_none() && self.time_range.is_none() && self.event_type.is_none()
    }
}

/// A validated aggregation query, ready to be dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationRequest {
    pub kind: AggregationKind,
    pub field: String,
    pub size: NonZeroUsize,
    pub order: SortOrder,
    #[serde(default, skip_serializing_if = "ReportFilters::is_empty")]
    pub filters: ReportFilters,
}

impl AggregationRequest {
    /// Custom aggregation on `field` with no filters.
    pub fn new(field: impl Into<String>, size: NonZeroUsize, order: SortOrder) -> Self {
        Self {
            kind: AggregationKind::CustomAggregation,
            field: field.into(),
            size,
            order,
            filters: ReportFilters::default(),
        }
    }

    pub fn with_kind(mut self, kind: AggregationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_filters(mut self, filters: ReportFilters) -> Self {
        self.filters = filters;
        self
    }
}

/// One bucket of an aggregation: a distinct value and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportRow {
    pub key: String,
    pub count: u64,
}

impl ReportRow {
    pub fn new(key: impl Into<String>, count: u64) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// Header of the count column.
pub const COUNT_HEADER: &str = "#";

/// Normalized result handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub title: String,
    pub label: String,
    pub rows: Vec<ReportRow>,
}

impl AggregationResult {
    /// Title and label both name the aggregated field.
    pub fn from_rows(request: &AggregationRequest, rows: Vec<ReportRow>) -> Self {
        Self {
            title: request.field.clone(),
            label: request.field.clone(),
            rows,
        }
    }

    pub fn headers(&self) -> [&str; 2] {
        [COUNT_HEADER, self.label.as_str()]
    }

    pub fn total(&self) -> u64 {
        self.rows.iter().map(|r| r.count).sum()
    }
}
