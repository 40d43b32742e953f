use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use super::{run_pipeline, FilterArgs};
use crate::error::{Result, SpendError};
use crate::fmt::{money, month_label, pct};
use crate::render::{ChartOutcome, CategorySlice, Controls, Dashboard, MonthBar, RenderModel, Screen, WELCOME_MESSAGE};
use crate::settings::load_settings;

const BAR_WIDTH: usize = 30;

pub fn run(file: &str, filter: &FilterArgs, all: bool) -> Result<()> {
    let settings = load_settings();
    let (_, model) = run_pipeline(file, filter, all, settings.preview_rows)?;
    match &model.screen {
        Screen::Failed { message, .. } => Err(SpendError::Other(message.clone())),
        Screen::NeedsRange { message } => Err(SpendError::InvalidRange(message.clone())),
        _ => {
            println!("{}", format_model(&model, &settings.currency_symbol));
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Pure formatting functions (render model → String)
// ---------------------------------------------------------------------------

pub fn format_model(model: &RenderModel, symbol: &str) -> String {
    let mut out = String::new();
    if let Some(controls) = &model.controls {
        out.push_str(&format_filters(controls));
        out.push('\n');
    }
    match &model.screen {
        Screen::Welcome => out.push_str(WELCOME_MESSAGE),
        Screen::Failed { message, .. } => out.push_str(&message.red().to_string()),
        Screen::NeedsRange { message } => out.push_str(&message.yellow().to_string()),
        Screen::Empty { notice } => out.push_str(&notice.cyan().to_string()),
        Screen::Dashboard(dashboard) => out.push_str(&format_dashboard(dashboard, symbol)),
    }
    if let Some(controls) = model.controls.as_ref().filter(|c| c.dropped > 0) {
        out.push_str(&format!(
            "\n\n{}",
            format!(
                "{} row(s) without a usable Date, Category or Amount were skipped.",
                controls.dropped
            )
            .dimmed()
        ));
    }
    out
}

fn format_filters(controls: &Controls) -> String {
    let categories = if controls.selected.len() == controls.categories.len()
        && controls.categories.iter().all(|c| controls.selected.contains(c))
    {
        "all".to_string()
    } else if controls.selected.is_empty() {
        "none".to_string()
    } else {
        controls.selected.iter().cloned().collect::<Vec<_>>().join(", ")
    };
    let range = match controls.range {
        Some(r) => format!("{} to {}", r.start(), r.end()),
        None => "(incomplete)".to_string(),
    };
    format!(
        "{}\nCategories: {categories}\nDate range: {range}\n",
        controls.upload_name.bold()
    )
}

pub fn format_dashboard(d: &Dashboard, symbol: &str) -> String {
    let mut sections = Vec::new();

    let mut preview = Table::new();
    preview.set_header(d.headers.clone());
    for row in &d.preview {
        preview.add_row(row.clone());
    }
    let shown = if d.showing_all {
        format!("all {} rows", d.row_count)
    } else {
        format!("{} of {} rows", d.preview.len(), d.row_count)
    };
    sections.push(format!("{} ({shown})\n{preview}", "Preview of Filtered Data".bold()));

    let mut metrics = Table::new();
    metrics.set_header(vec!["Total Spent", "Average per Entry"]);
    metrics.add_row(vec![
        Cell::new(money(d.total, symbol)).set_alignment(CellAlignment::Right),
        Cell::new(money(d.average, symbol)).set_alignment(CellAlignment::Right),
    ]);
    sections.push(format!("{}\n{metrics}", "Summary Statistics".bold()));

    sections.push(format!(
        "{}\n{}",
        "Expense Distribution by Category".bold(),
        chart_section(&d.categories, |s| format_categories(s, symbol))
    ));
    sections.push(format!(
        "{}\n{}",
        "Monthly Expense Trend".bold(),
        chart_section(&d.months, |m| format_months(m, symbol))
    ));

    sections.join("\n\n")
}

fn chart_section<T>(outcome: &ChartOutcome<T>, draw: impl Fn(&T) -> String) -> String {
    match outcome {
        ChartOutcome::Ready(data) => draw(data),
        ChartOutcome::NoData(msg) => msg.cyan().to_string(),
        ChartOutcome::Failed(msg) => msg.yellow().to_string(),
    }
}

/// Text bar scaled against `max` (the largest magnitude). Negative values
/// are drawn hatched with a leading minus.
fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value == 0.0 || !value.is_finite() {
        return String::new();
    }
    let len = ((value.abs() / max) * BAR_WIDTH as f64).round().max(1.0) as usize;
    if value < 0.0 {
        format!("-{}", "░".repeat(len))
    } else {
        "█".repeat(len)
    }
}

fn format_categories(slices: &[CategorySlice], symbol: &str) -> String {
    let max = slices.iter().map(|s| s.share).fold(0.0, f64::max);
    let mut table = Table::new();
    table.set_header(vec!["Category", "Amount", "Share", ""]);
    for s in slices {
        table.add_row(vec![
            Cell::new(&s.category),
            Cell::new(money(s.amount, symbol)).set_alignment(CellAlignment::Right),
            Cell::new(pct(s.share)).set_alignment(CellAlignment::Right),
            Cell::new(bar(s.share, max)),
        ]);
    }
    table.to_string()
}

fn format_months(months: &[MonthBar], symbol: &str) -> String {
    let max = months.iter().map(|m| m.amount.abs()).fold(0.0, f64::max);
    let mut table = Table::new();
    table.set_header(vec!["Month", "Amount", ""]);
    for m in months {
        table.add_row(vec![
            Cell::new(month_label(&m.month)),
            Cell::new(money(m.amount, symbol)).set_alignment(CellAlignment::Right),
            Cell::new(bar(m.amount, max)),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{handle_interaction, FilterInput, Interaction, SessionState};

    fn model_for(csv: &str, input: Option<FilterInput>) -> RenderModel {
        let (state, model) = handle_interaction(
            SessionState::new(5),
            Interaction::Upload {
                name: "expenses.csv".into(),
                bytes: csv.as_bytes().to_vec(),
            },
        );
        match input {
            Some(i) => handle_interaction(state, Interaction::Filter(i)).1,
            None => model,
        }
    }

    const CSV: &str = "\
Date,Category,Amount
2024-01-05,Food,100
2024-01-20,Food,50
2024-02-01,Rent,500
";

    #[test]
    fn test_format_dashboard_sections() {
        let text = format_model(&model_for(CSV, None), "₹");
        assert!(text.contains("expenses.csv"));
        assert!(text.contains("Categories: all"));
        assert!(text.contains("Preview of Filtered Data"));
        assert!(text.contains("3 of 3 rows"));
        assert!(text.contains("₹650.00"));
        assert!(text.contains("₹216.67"));
        assert!(text.contains("23.1%"));
        assert!(text.contains("76.9%"));
        assert!(text.contains("Jan 2024"));
        assert!(text.contains("Feb 2024"));
        assert!(!text.contains("skipped"));
    }

    #[test]
    fn test_format_empty_notice() {
        let input = FilterInput {
            categories: vec![],
            dates: vec![
                chrono::NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            ],
            show_all: false,
        };
        let text = format_model(&model_for(CSV, Some(input)), "₹");
        assert!(text.contains("No data found for selected filters."));
        assert!(text.contains("Categories: none"));
        assert!(!text.contains("Summary Statistics"));
    }

    #[test]
    fn test_format_reports_skipped_rows() {
        let text = format_model(&model_for("Date,Category,Amount\n2024-01-05,Food,1\nbad,Food,2\n", None), "$");
        assert!(text.contains("1 row(s)"));
    }

    #[test]
    fn test_failed_pie_still_prints_trend() {
        let csv = "Date,Category,Amount\n2024-01-05,Food,100\n2024-01-09,Refund,-300\n";
        let text = format_model(&model_for(csv, None), "$");
        assert!(text.contains("Could not generate pie chart"));
        assert!(text.contains("Jan 2024"));
        assert!(text.contains("-$200.00"));
        // the net-negative month still gets a bar
        assert!(text.contains(&format!("-{}", "░".repeat(BAR_WIDTH))));
    }

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(10.0, 10.0).chars().count(), BAR_WIDTH);
        assert_eq!(bar(0.1, 100.0).chars().count(), 1);
        assert_eq!(bar(0.0, 10.0), "");
        assert_eq!(bar(-5.0, 10.0), format!("-{}", "░".repeat(BAR_WIDTH / 2)));
    }
}
