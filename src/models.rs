use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;

pub const DATE_COLUMN: &str = "Date";
pub const CATEGORY_COLUMN: &str = "Category";
pub const AMOUNT_COLUMN: &str = "Amount";

pub const REQUIRED_COLUMNS: [&str; 3] = [DATE_COLUMN, CATEGORY_COLUMN, AMOUNT_COLUMN];

/// One transaction row that survived loading.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub category: String,
    pub amount: f64,
    /// Year-month bucket, e.g. "2024-03".
    pub month: String,
    /// Raw fields of the source row in header order, kept for export.
    pub fields: Vec<String>,
}

/// Loaded transaction log. Never mutated after [`crate::loader::load_table`] returns it.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
    /// Rows omitted because date, category or amount was missing or unparseable.
    pub dropped: usize,
}

impl Table {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.category.as_str()))
            .map(|r| r.category.clone())
            .collect()
    }

    /// Row count per category, alphabetical.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.records {
            *counts.entry(r.category.clone()).or_default() += 1;
        }
        counts
    }

    /// Earliest and latest date, or `None` for an empty table.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }
}

/// Inclusive calendar date range. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub(crate) start: NaiveDate,
    pub(crate) end: NaiveDate,
}

impl DateRange {
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub selected_categories: BTreeSet<String>,
    pub date_range: DateRange,
}

/// Aggregates over a filtered view. Values are unrounded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary {
    pub total: f64,
    pub count: usize,
    pub by_category: BTreeMap<String, f64>,
    /// Keyed by "YYYY-MM"; lexical order is chronological.
    pub by_month: BTreeMap<String, f64>,
}
