pub mod categories;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod report;

use std::path::Path;

use clap::{Args, Parser, Subcommand};

use crate::error::{Result, SpendError};
use crate::loader::parse_date;
use crate::models::DateRange;
use crate::render::RenderModel;
use crate::session::{handle_interaction, FilterInput, Interaction, SessionState};

#[derive(Parser)]
#[command(
    name = "spendview",
    version,
    about = "Analyze an expense CSV by category and over time."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the filtered table, summary statistics and charts.
    Report {
        /// CSV file with Date, Category and Amount columns
        file: String,
        #[command(flatten)]
        filter: FilterArgs,
        /// Show the full table instead of the first rows
        #[arg(long)]
        all: bool,
    },
    /// Write the filtered rows to a CSV file.
    Export {
        /// CSV file with Date, Category and Amount columns
        file: String,
        #[command(flatten)]
        filter: FilterArgs,
        /// Output path (default: <export_dir>/filtered_expenses.csv)
        #[arg(long, short)]
        output: Option<String>,
    },
    /// List the categories found in a file.
    Categories {
        /// CSV file with Date, Category and Amount columns
        file: String,
    },
    /// Interactive dashboard with category and date range filters.
    Dashboard {
        /// CSV file with Date, Category and Amount columns
        file: String,
    },
    /// Show or change settings.
    Config {
        /// Update a setting: currency_symbol, preview_rows or export_dir
        #[arg(long, value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// Generate shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Category to include; repeat for several (default: all)
    #[arg(long = "category", short = 'c')]
    pub categories: Vec<String>,
    /// Start date, inclusive (default: earliest date in the file)
    #[arg(long = "from")]
    pub from_date: Option<String>,
    /// End date, inclusive (default: latest date in the file)
    #[arg(long = "to")]
    pub to_date: Option<String>,
}

impl FilterArgs {
    /// Overlay the command-line filters on the default widget state.
    /// Unparseable or reversed dates fail here with the offending values.
    /// A lone `--from` or `--to` leaves a single endpoint, which the
    /// pipeline rejects the same way as a half-picked date range.
    pub fn to_input(&self, defaults: &FilterInput, show_all: bool) -> Result<FilterInput> {
        let parse = |raw: &str| {
            parse_date(raw).ok_or_else(|| SpendError::InvalidRange(format!("unrecognized date '{raw}'")))
        };
        let categories = if self.categories.is_empty() {
            defaults.categories.clone()
        } else {
            self.categories.clone()
        };
        let dates = match (&self.from_date, &self.to_date) {
            (None, None) => defaults.dates.clone(),
            (Some(from), Some(to)) => {
                let range = DateRange::new(parse(from.as_str())?, parse(to.as_str())?)?;
                vec![range.start(), range.end()]
            }
            (Some(one), None) | (None, Some(one)) => vec![parse(one.as_str())?],
        };
        Ok(FilterInput {
            categories,
            dates,
            show_all,
        })
    }
}

/// File name shown in headers and status lines.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Upload `file` into a fresh session and apply the command-line filters.
pub(crate) fn run_pipeline(
    file: &str,
    filter: &FilterArgs,
    show_all: bool,
    preview_rows: usize,
) -> Result<(SessionState, RenderModel)> {
    let path = Path::new(file);
    let bytes = std::fs::read(path)?;
    let name = display_name(path);

    let (state, model) = handle_interaction(SessionState::new(preview_rows), Interaction::Upload { name, bytes });
    let Some(defaults) = state.filter_input().cloned() else {
        return Ok((state, model));
    };
    let input = filter.to_input(&defaults, show_all)?;
    Ok(handle_interaction(state, Interaction::Filter(input)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn defaults() -> FilterInput {
        FilterInput {
            categories: vec!["Food".into(), "Rent".into()],
            dates: vec![
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            ],
            show_all: false,
        }
    }

    #[test]
    fn test_no_flags_keeps_defaults() {
        let input = FilterArgs::default().to_input(&defaults(), true).unwrap();
        assert_eq!(input.categories, defaults().categories);
        assert_eq!(input.dates, defaults().dates);
        assert!(input.show_all);
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = FilterArgs {
            categories: vec!["Rent".into()],
            from_date: Some("2024-01-10".into()),
            to_date: Some("01/31/2024".into()),
        };
        let input = args.to_input(&defaults(), false).unwrap();
        assert_eq!(input.categories, vec!["Rent".to_string()]);
        assert_eq!(
            input.dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            ]
        );
    }

    #[test]
    fn test_lone_endpoint_leaves_single_date() {
        let args = FilterArgs {
            from_date: Some("2024-01-10".into()),
            ..Default::default()
        };
        assert_eq!(args.to_input(&defaults(), false).unwrap().dates.len(), 1);
    }

    #[test]
    fn test_unrecognized_date_is_rejected() {
        let args = FilterArgs {
            from_date: Some("soon".into()),
            to_date: Some("later".into()),
            ..Default::default()
        };
        assert!(matches!(
            args.to_input(&defaults(), false),
            Err(SpendError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_reversed_dates_keep_the_detail() {
        let args = FilterArgs {
            from_date: Some("2024-02-01".into()),
            to_date: Some("2024-01-05".into()),
            ..Default::default()
        };
        match args.to_input(&defaults(), false) {
            Err(SpendError::InvalidRange(detail)) => {
                assert!(detail.contains("2024-02-01 is after end date 2024-01-05"));
            }
            other => panic!("expected a range error, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
