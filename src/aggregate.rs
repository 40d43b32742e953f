use crate::error::{Result, SpendError};
use crate::filter::FilteredView;
use crate::models::Summary;

/// Compute totals over a filtered view. Always recomputed from scratch.
pub fn summarize(view: &FilteredView<'_>) -> Summary {
    let mut summary = Summary::default();
    for r in view.records() {
        summary.total += r.amount;
        summary.count += 1;
        *summary.by_category.entry(r.category.clone()).or_default() += r.amount;
        *summary.by_month.entry(r.month.clone()).or_default() += r.amount;
    }
    summary
}

impl Summary {
    /// Mean amount per row. Callers check emptiness first; an empty view
    /// has no average.
    pub fn average(&self) -> Result<f64> {
        if self.count == 0 {
            return Err(SpendError::DivideByZero);
        }
        Ok(self.total / self.count as f64)
    }
}
