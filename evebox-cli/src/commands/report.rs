//! Aggregation report commands.

use crate::ReportArgs;
use anyhow::{Context, Result};
use evebox::render::{render_json, render_result};
use evebox::report::{FormEdit, PresetCatalog, ReportForm, ReportSession, ReportView};
use evebox::{Config, EveFileReportApi, HttpReportClient, ReportApi, ValidationError};
use std::path::PathBuf;
use std::sync::Arc;

/// Run a custom aggregation on `field`.
pub async fn run_agg(
    config: &Config,
    eve_files: &[PathBuf],
    field: &str,
    opts: &ReportArgs,
) -> Result<()> {
    let form = base_form(config).apply(FormEdit::SetField(field.to_string()));
    run_form(config, eve_files, form, opts).await
}

/// Run the preset called `name`.
pub async fn run_preset(
    config: &Config,
    eve_files: &[PathBuf],
    name: &str,
    opts: &ReportArgs,
) -> Result<()> {
    let catalog = PresetCatalog::with_extra(&config.report.presets);
    let preset = catalog
        .find(name)
        .cloned()
        .ok_or_else(|| ValidationError::UnknownPreset(name.to_string()))?;
    let form = base_form(config).apply(FormEdit::SelectPreset(preset));
    run_form(config, eve_files, form, opts).await
}

fn base_form(config: &Config) -> ReportForm {
    ReportForm::with_defaults(config.report.default_size, config.report.default_order)
}

/// Form edits for the flags the user actually passed.
fn edits(opts: &ReportArgs) -> Vec<FormEdit> {
    let mut edits = Vec::new();
    if let Some(size) = &opts.size {
        edits.push(FormEdit::SetSize(size.clone()));
    }
    if let Some(order) = opts.order {
        edits.push(FormEdit::SetOrder(order));
    }
    if let Some(q) = &opts.query {
        edits.push(FormEdit::SetQueryString(q.clone()));
    }
    if let Some(range) = &opts.time_range {
        edits.push(FormEdit::SetTimeRange(range.clone()));
    }
    if let Some(event_type) = &opts.event_type {
        edits.push(FormEdit::SetEventType(event_type.clone()));
    }
    edits
}

fn make_api(config: &Config, eve_files: &[PathBuf]) -> Result<Arc<dyn ReportApi>> {
    if eve_files.is_empty() {
        let client = HttpReportClient::new(&config.server)
            .with_context(|| format!("Invalid server settings for {}", config.server.url))?;
        tracing::debug!(backend = client.backend_name(), "Querying {}", client.endpoint());
        Ok(Arc::new(client))
    } else {
        let api = EveFileReportApi::load(eve_files).context("Failed to read EVE files")?;
        tracing::info!(
            backend = api.backend_name(),
            "Aggregating {} events from {} file(s)",
            api.len(),
            eve_files.len()
        );
        Ok(Arc::new(api))
    }
}

async fn run_form(
    config: &Config,
    eve_files: &[PathBuf],
    form: ReportForm,
    opts: &ReportArgs,
) -> Result<()> {
    let form = form.apply_all(edits(opts));
    let api = make_api(config, eve_files)?;
    let session = ReportSession::new(api);

    let (submission, form) = session.submit(&form)?;
    tracing::debug!(field = form.field(), dirty = form.is_dirty(), "Report submitted");
    tokio::select! {
        _ = submission.wait() => {}
        _ = tokio::signal::ctrl_c() => {
            session.shutdown();
            anyhow::bail!("Interrupted");
        }
    }

    match session.view() {
        ReportView::Ready { result, .. } => {
            if opts.json {
                println!("{}", render_json(&result)?);
            } else {
                print!("{}", render_result(&result));
            }
            Ok(())
        }
        ReportView::Failed { message, .. } => anyhow::bail!("{}", message),
        other => anyhow::bail!("Report did not complete: {:?}", other),
    }
}
