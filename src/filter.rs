use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::error::{Result, SpendError};
use crate::models::{DateRange, FilterSpec, Record, Table};

// ---------------------------------------------------------------------------
// Date range construction
// ---------------------------------------------------------------------------

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(SpendError::InvalidRange(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Build a range from whatever a date picker returned. Anything other
    /// than exactly two endpoints is rejected rather than guessed.
    pub fn from_endpoints(dates: &[NaiveDate]) -> Result<Self> {
        match dates {
            [start, end] => Self::new(*start, *end),
            _ => Err(SpendError::InvalidRange(format!(
                "expected a start and an end date, got {} date(s)",
                dates.len()
            ))),
        }
    }

    /// Pull both ends into `bounds`. Returns `None` when the range does not
    /// overlap `bounds` at all.
    pub fn clamp_to(self, bounds: (NaiveDate, NaiveDate)) -> Option<Self> {
        let (min, max) = bounds;
        if self.end < min || self.start > max {
            return None;
        }
        Some(Self {
            start: self.start.max(min),
            end: self.end.min(max),
        })
    }
}

impl FilterSpec {
    /// All categories and the full date span of `table`.
    /// Returns `None` for a table with no rows.
    #[cfg(test)]
    pub fn select_all(table: &Table) -> Option<Self> {
        let (start, end) = table.date_bounds()?;
        Some(Self {
            selected_categories: table.categories().into_iter().collect(),
            date_range: DateRange { start, end },
        })
    }

    pub fn new<I, S>(categories: I, date_range: DateRange) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected_categories: categories.into_iter().map(Into::into).collect::<BTreeSet<_>>(),
            date_range,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.selected_categories.contains(&record.category) && self.date_range.contains(record.date)
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Rows of a [`Table`] that passed a [`FilterSpec`]. Borrows the table; the
/// table itself is never modified.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    headers: &'a [String],
    records: Vec<&'a Record>,
}

impl<'a> FilteredView<'a> {
    pub fn headers(&self) -> &'a [String] {
        self.headers
    }

    pub fn records(&self) -> &[&'a Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First `n` rows, like a dataframe `head()`.
    pub fn head(&self, n: usize) -> &[&'a Record] {
        &self.records[..n.min(self.records.len())]
    }
}

/// Keep rows whose category is selected and whose date lies in the range
/// (inclusive). An empty category selection yields an empty view.
pub fn apply_filter<'a>(table: &'a Table, spec: &FilterSpec) -> FilteredView<'a> {
    let records = table.records.iter().filter(|r| spec.matches(r)).collect();
    FilteredView {
        headers: &table.headers,
        records,
    }
}
