//! Report request builder.
//!
//! The editable parameter set is a plain value. Every UI edit is a
//! [`FormEdit`] applied with [`ReportForm::apply`], which yields the next
//! value rather than mutating shared state.

use crate::error::ValidationError;
use crate::report::presets::Preset;
use crate::report::types::{AggregationKind, AggregationRequest, ReportFilters, SortOrder};
use std::num::NonZeroUsize;

pub const DEFAULT_SIZE: usize = 10;
pub const MAX_SIZE: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEdit {
    SetKind(AggregationKind),
    SetField(String),
    /// Raw text from the size input; parsed on build.
    SetSize(String),
    SetOrder(SortOrder),
    /// Switches to a preset aggregation, adopting the preset's size and order.
    SelectPreset(Preset),
    SetQueryString(String),
    SetTimeRange(String),
    SetEventType(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportForm {
    kind: AggregationKind,
    field: String,
    size: String,
    order: SortOrder,
    preset: Option<Preset>,
    filters: ReportFilters,
    dirty: bool,
}

impl Default for ReportForm {
    fn default() -> Self {
        Self {
            kind: AggregationKind::CustomAggregation,
            field: String::new(),
            size: DEFAULT_SIZE.to_string(),
            order: SortOrder::Desc,
            preset: None,
            filters: ReportFilters::default(),
            dirty: false,
        }
    }
}

impl ReportForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form seeded with configured defaults.
    pub fn with_defaults(size: usize, order: SortOrder) -> Self {
        Self {
            size: size.to_string(),
            order,
            ..Self::default()
        }
    }

    pub fn kind(&self) -> AggregationKind {
        self.kind
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn size(&self) -> &str {
        &self.size
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn preset(&self) -> Option<&Preset> {
        self.preset.as_ref()
    }

    pub fn filters(&self) -> &ReportFilters {
        &self.filters
    }

    /// True once the user has edited the form since it was last submitted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn apply(self, edit: FormEdit) -> Self {
        let mut next = self;
        match edit {
            FormEdit::SetKind(kind) => next.kind = kind,
            FormEdit::SetField(field) => next.field = field,
            FormEdit::SetSize(size) => next.size = size,
            FormEdit::SetOrder(order) => next.order = order,
            FormEdit::SelectPreset(preset) => {
                next.kind = AggregationKind::PresetAggregation;
                if let Some(size) = preset.size {
                    next.size = size.to_string();
                }
                if let Some(order) = preset.order {
                    next.order = order;
                }
                next.preset = Some(preset);
            }
            FormEdit::SetQueryString(q) => next.filters.query_string = non_blank(q),
            FormEdit::SetTimeRange(r) => next.filters.time_range = non_blank(r),
            FormEdit::SetEventType(t) => next.filters.event_type = non_blank(t),
        }
        next.dirty = true;
        next
    }

    /// Applies a sequence of edits in order.
    pub fn apply_all<I>(self, edits: I) -> Self
    where
        I: IntoIterator<Item = FormEdit>,
    {
        edits.into_iter().fold(self, Self::apply)
    }

    pub fn mark_pristine(self) -> Self {
        Self {
            dirty: false,
            ..self
        }
    }

    /// Validates the current parameters and packages them as a request.
    pub fn build(&self) -> Result<AggregationRequest, ValidationError> {
        let field = match self.kind {
            AggregationKind::CustomAggregation => self.field.trim().to_string(),
            AggregationKind::PresetAggregation => match &self.preset {
                Some(preset) => preset.field.clone(),
                None => return Err(ValidationError::UnknownPreset(String::new())),
            },
        };
        validate_field(&field)?;

        let size = if self.size.trim().is_empty() && self.kind == AggregationKind::PresetAggregation
        {
            let fallback = self
                .preset
                .as_ref()
                .and_then(|p| p.size)
                .unwrap_or(DEFAULT_SIZE);
            parse_size(&fallback.to_string())?
        } else {
            parse_size(&self.size)?
        };

        Ok(AggregationRequest {
            kind: self.kind,
            field,
            size,
            order: self.order,
            filters: self.filters.clone(),
        })
    }
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Accepts dotted attribute paths such as `tls.sni` or `@timestamp`.
pub fn validate_field(field: &str) -> Result<(), ValidationError> {
    if field.is_empty() {
        return Err(ValidationError::EmptyField);
    }
    let valid_segment = |seg: &str| {
        !seg.is_empty()
            && seg
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '@'))
    };
    if field.split('.').all(valid_segment) {
        Ok(())
    } else {
        Err(ValidationError::InvalidField(field.to_string()))
    }
}

pub fn parse_size(raw: &str) -> Result<NonZeroUsize, ValidationError> {
    let raw = raw.trim();
    let size: u64 = raw
        .parse()
        .map_err(|_| ValidationError::InvalidSize(raw.to_string()))?;
    if size == 0 || size > MAX_SIZE as u64 {
        return Err(ValidationError::SizeOutOfRange {
            size,
            max: MAX_SIZE,
        });
    }
    NonZeroUsize::new(size as usize).ok_or(ValidationError::SizeOutOfRange {
        size,
        max: MAX_SIZE,
    })
}
