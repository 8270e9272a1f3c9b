//! Aggregation reports: request building, presets and the report view model.

pub mod form;
pub mod presets;
pub mod session;
pub mod types;

pub use form::{FormEdit, ReportForm, DEFAULT_SIZE, MAX_SIZE};
pub use presets::{builtin_presets, Preset, PresetCatalog, SUGGESTED_FIELDS};
pub use session::{Generation, Outcome, ReportSession, ReportView, Submission, Ticket};
pub use types::{
    AggregationKind, AggregationRequest, AggregationResult, ReportFilters, ReportRow, SortOrder,
};
