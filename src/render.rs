//! Render model handed to the presenters.
//!
//! Everything here is plain data: the text report and the ratatui dashboard
//! draw the same [`RenderModel`], and neither reaches back into the pipeline.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::error::{Result, SpendError};
use crate::export::export_bytes;
use crate::filter::FilteredView;
use crate::models::{DateRange, Summary};

pub const WELCOME_MESSAGE: &str = "Upload a CSV file with columns: Date, Category, Amount.";
pub const PARSE_MESSAGE: &str =
    "Could not read the file. Please upload a valid CSV with columns: Date, Category, Amount.";
pub const SCHEMA_MESSAGE: &str = "CSV must contain 'Date', 'Category', and 'Amount' columns.";
pub const RANGE_MESSAGE: &str = "Please select both start and end dates from the date picker.";
pub const EMPTY_NOTICE: &str = "No data found for selected filters.";
pub const PIE_NO_DATA: &str = "No category data to display.";
pub const PIE_FAILED: &str = "Could not generate pie chart. Please check the data format.";
pub const BAR_NO_DATA: &str = "No monthly trend to show.";
pub const BAR_FAILED: &str = "Could not generate bar chart. Please check the data.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Parse,
    Schema,
    Other,
}

/// Result of building one chart. Charts fail independently of each other
/// and of the rest of the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutcome<T> {
    Ready(T),
    NoData(&'static str),
    Failed(&'static str),
}

#[cfg(test)]
impl<T> ChartOutcome<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySlice {
    pub category: String,
    pub amount: f64,
    /// Percentage of the filtered total, 0–100.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthBar {
    pub month: String,
    pub amount: f64,
}

/// State of the filter widgets, so a presenter can draw them.
#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    pub upload_name: String,
    pub categories: Vec<String>,
    pub selected: BTreeSet<String>,
    pub bounds: Option<(NaiveDate, NaiveDate)>,
    pub range: Option<DateRange>,
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub headers: Vec<String>,
    pub preview: Vec<Vec<String>>,
    pub row_count: usize,
    pub showing_all: bool,
    pub total: f64,
    pub average: f64,
    pub categories: ChartOutcome<Vec<CategorySlice>>,
    pub months: ChartOutcome<Vec<MonthBar>>,
    /// Filtered table as UTF-8 CSV, ready to be saved.
    pub export_csv: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Welcome,
    Failed { kind: FailureKind, message: String },
    NeedsRange { message: String },
    Empty { notice: String },
    Dashboard(Box<Dashboard>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderModel {
    pub controls: Option<Controls>,
    pub screen: Screen,
}

impl RenderModel {
    pub fn welcome() -> Self {
        Self {
            controls: None,
            screen: Screen::Welcome,
        }
    }

    /// Convert a pipeline error into the screen the user should see.
    pub fn from_error(err: &SpendError, controls: Option<Controls>) -> Self {
        let screen = match err {
            SpendError::Parse(detail) => Screen::Failed {
                kind: FailureKind::Parse,
                message: format!("{PARSE_MESSAGE} ({detail})"),
            },
            SpendError::Schema { missing } => Screen::Failed {
                kind: FailureKind::Schema,
                message: format!("{SCHEMA_MESSAGE} Missing: {}.", missing.join(", ")),
            },
            SpendError::InvalidRange(_) => Screen::NeedsRange {
                message: RANGE_MESSAGE.to_string(),
            },
            SpendError::EmptyResult | SpendError::DivideByZero => Screen::Empty {
                notice: EMPTY_NOTICE.to_string(),
            },
            other => Screen::Failed {
                kind: FailureKind::Other,
                message: other.to_string(),
            },
        };
        // Parse/schema failures abort everything, including the filter widgets
        let controls = if matches!(screen, Screen::Failed { .. }) {
            None
        } else {
            controls
        };
        Self { controls, screen }
    }
}

// ---------------------------------------------------------------------------
// Chart builders
// ---------------------------------------------------------------------------

pub fn category_chart(summary: &Summary) -> ChartOutcome<Vec<CategorySlice>> {
    if summary.by_category.is_empty() {
        return ChartOutcome::NoData(PIE_NO_DATA);
    }
    let sum: f64 = summary.by_category.values().sum();
    let degenerate = summary.by_category.values().any(|v| !v.is_finite() || *v < 0.0);
    if degenerate || !sum.is_finite() || sum <= 0.0 {
        tracing::debug!(sum, "category distribution is not drawable");
        return ChartOutcome::Failed(PIE_FAILED);
    }
    ChartOutcome::Ready(
        summary
            .by_category
            .iter()
            .map(|(category, amount)| CategorySlice {
                category: category.clone(),
                amount: *amount,
                share: amount / sum * 100.0,
            })
            .collect(),
    )
}

pub fn month_chart(summary: &Summary) -> ChartOutcome<Vec<MonthBar>> {
    if summary.by_month.is_empty() {
        return ChartOutcome::NoData(BAR_NO_DATA);
    }
    if summary.by_month.values().any(|v| !v.is_finite()) {
        return ChartOutcome::Failed(BAR_FAILED);
    }
    ChartOutcome::Ready(
        summary
            .by_month
            .iter()
            .map(|(month, amount)| MonthBar {
                month: month.clone(),
                amount: *amount,
            })
            .collect(),
    )
}

/// Assemble the dashboard for a non-empty view. An empty view is an
/// [`SpendError::EmptyResult`], which callers show as a notice.
pub fn build_dashboard(
    view: &FilteredView<'_>,
    summary: &Summary,
    show_all: bool,
    preview_rows: usize,
) -> Result<Dashboard> {
    if view.is_empty() {
        return Err(SpendError::EmptyResult);
    }
    let rows = if show_all { view.records() } else { view.head(preview_rows) };
    Ok(Dashboard {
        headers: view.headers().to_vec(),
        preview: rows.iter().map(|r| r.fields.clone()).collect(),
        row_count: view.len(),
        showing_all: show_all,
        total: summary.total,
        average: summary.average()?,
        categories: category_chart(summary),
        months: month_chart(summary),
        export_csv: export_bytes(view)?,
    })
}
