//! Request/response handling for one user session.
//!
//! Every interaction reruns the whole pipeline (filter, aggregate, render)
//! from the cached table. Only the parsed table is cached, keyed by the
//! SHA-256 of the uploaded bytes.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::aggregate::summarize;
use crate::error::Result;
use crate::filter::apply_filter;
use crate::loader::load_table;
use crate::models::{DateRange, FilterSpec, Table};
use crate::render::{build_dashboard, Controls, RenderModel, Screen};

// ---------------------------------------------------------------------------
// Load cache
// ---------------------------------------------------------------------------

pub fn content_key(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Single-entry parse cache. A new upload with different content replaces
/// the entry; failed loads are never cached.
#[derive(Debug, Clone, Default)]
pub struct LoadCache {
    entry: Option<(String, Arc<Table>)>,
}

impl LoadCache {
    pub fn get_or_load(&mut self, bytes: &[u8]) -> Result<Arc<Table>> {
        let key = content_key(bytes);
        if let Some((cached_key, table)) = &self.entry {
            if *cached_key == key {
                tracing::debug!(key = &key[..12], "load cache hit");
                return Ok(Arc::clone(table));
            }
        }
        tracing::debug!(key = &key[..12], "load cache miss");
        self.entry = None;
        let table = Arc::new(load_table(bytes)?);
        self.entry = Some((key, Arc::clone(&table)));
        Ok(table)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn key(&self) -> Option<&str> {
        self.entry.as_ref().map(|(k, _)| k.as_str())
    }
}

// ---------------------------------------------------------------------------
// Interactions
// ---------------------------------------------------------------------------

/// Raw widget state, as the filter controls report it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterInput {
    pub categories: Vec<String>,
    /// Zero, one or two dates; only exactly two form a valid range.
    pub dates: Vec<NaiveDate>,
    pub show_all: bool,
}

impl FilterInput {
    /// Default widget state for a freshly loaded table: every category and
    /// the full date span.
    pub fn select_all(table: &Table) -> Self {
        let dates = table
            .date_bounds()
            .map(|(min, max)| vec![min, max])
            .unwrap_or_default();
        Self {
            categories: table.categories(),
            dates,
            show_all: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Interaction {
    Upload { name: String, bytes: Vec<u8> },
    Filter(FilterInput),
    ClearUpload,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    cache: LoadCache,
    table: Option<Arc<Table>>,
    upload_name: String,
    input: Option<FilterInput>,
    spec: Option<FilterSpec>,
    preview_rows: usize,
}

impl SessionState {
    pub fn new(preview_rows: usize) -> Self {
        Self {
            cache: LoadCache::default(),
            table: None,
            upload_name: String::new(),
            input: None,
            spec: None,
            preview_rows,
        }
    }

    pub fn table(&self) -> Option<&Arc<Table>> {
        self.table.as_ref()
    }

    pub fn filter_input(&self) -> Option<&FilterInput> {
        self.input.as_ref()
    }

    /// The filter that produced the last dashboard, if the input was valid.
    pub fn filter_spec(&self) -> Option<&FilterSpec> {
        self.spec.as_ref()
    }

    pub fn cache(&self) -> &LoadCache {
        &self.cache
    }
}

/// Apply one interaction and rerun the pipeline. Errors never escape: they
/// become the screen in the returned [`RenderModel`].
pub fn handle_interaction(mut state: SessionState, interaction: Interaction) -> (SessionState, RenderModel) {
    match interaction {
        Interaction::Upload { name, bytes } => match state.cache.get_or_load(&bytes) {
            Ok(table) => {
                state.input = Some(FilterInput::select_all(&table));
                state.table = Some(table);
                state.upload_name = name;
            }
            Err(e) => {
                tracing::warn!(upload = %name, error = %e, "upload rejected");
                state.table = None;
                state.input = None;
                state.spec = None;
                state.upload_name = name;
                return (state, RenderModel::from_error(&e, None));
            }
        },
        Interaction::Filter(input) => state.input = Some(input),
        Interaction::ClearUpload => {
            state.cache.invalidate();
            state.table = None;
            state.input = None;
            state.spec = None;
            state.upload_name.clear();
        }
    }

    let model = render(&mut state);
    (state, model)
}

fn render(state: &mut SessionState) -> RenderModel {
    state.spec = None;
    let Some(table) = state.table.clone() else {
        return RenderModel::welcome();
    };
    let input = state.input.clone().unwrap_or_else(|| FilterInput::select_all(&table));
    let bounds = table.date_bounds();

    let mut controls = Controls {
        upload_name: state.upload_name.clone(),
        categories: table.categories(),
        selected: input.categories.iter().cloned().collect::<BTreeSet<_>>(),
        bounds,
        range: None,
        dropped: table.dropped,
    };

    let requested = match DateRange::from_endpoints(&input.dates) {
        Ok(range) => range,
        // a table with no rows has nothing to pick dates from
        Err(_) if table.is_empty() => {
            return RenderModel::from_error(&crate::error::SpendError::EmptyResult, Some(controls));
        }
        Err(e) => return RenderModel::from_error(&e, Some(controls)),
    };
    // a range that misses the file's span selects nothing; an overlapping
    // one selects the same rows once pulled inside it
    let Some(range) = bounds.and_then(|b| requested.clamp_to(b)) else {
        tracing::debug!(start = %requested.start(), end = %requested.end(), "range outside the data");
        controls.range = Some(requested);
        return RenderModel::from_error(&crate::error::SpendError::EmptyResult, Some(controls));
    };
    controls.range = Some(range);

    let spec = FilterSpec::new(controls.selected.iter().cloned(), range);
    let view = apply_filter(&table, &spec);
    let summary = summarize(&view);
    tracing::debug!(rows = view.len(), total = summary.total, "pipeline run");
    let dashboard = build_dashboard(&view, &summary, input.show_all, state.preview_rows);
    state.spec = Some(spec);

    match dashboard {
        Ok(d) => RenderModel {
            controls: Some(controls),
            screen: Screen::Dashboard(Box::new(d)),
        },
        Err(e) => RenderModel::from_error(&e, Some(controls)),
    }
}
