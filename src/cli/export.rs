use std::path::{Path, PathBuf};

use super::{run_pipeline, FilterArgs};
use crate::error::{Result, SpendError};
use crate::export::write_payload;
use crate::render::{RenderModel, Screen};
use crate::settings::{load_settings, shellexpand_path};

pub fn run(file: &str, filter: &FilterArgs, output: Option<String>) -> Result<()> {
    let settings = load_settings();
    let (state, model) = run_pipeline(file, filter, false, settings.preview_rows)?;
    let path = output
        .map(|o| PathBuf::from(shellexpand_path(&o)))
        .unwrap_or_else(|| settings.default_export_path());

    match &model.screen {
        Screen::Dashboard(_) => {
            let rows = write_dashboard(&model, &path)?;
            let span = state
                .filter_spec()
                .map(|spec| format!(", {} to {}", spec.date_range.start(), spec.date_range.end()))
                .unwrap_or_default();
            println!("Wrote {} ({rows} rows{span})", path.display());
            Ok(())
        }
        Screen::Empty { notice } => {
            println!("{notice}");
            Ok(())
        }
        Screen::NeedsRange { message } => Err(SpendError::InvalidRange(message.clone())),
        Screen::Failed { message, .. } => Err(SpendError::Other(message.clone())),
        Screen::Welcome => Err(SpendError::Other("nothing to export".into())),
    }
}

/// Save the CSV payload of a rendered dashboard. Returns the row count.
/// Any other screen has nothing to export.
pub fn write_dashboard(model: &RenderModel, path: &Path) -> Result<usize> {
    let Screen::Dashboard(dashboard) = &model.screen else {
        return Err(SpendError::EmptyResult);
    };
    write_payload(&dashboard.export_csv, path)?;
    Ok(dashboard.row_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{handle_interaction, Interaction, SessionState};

    #[test]
    fn test_write_dashboard_uses_current_filter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("filtered.csv");
        let (state, _) = handle_interaction(
            SessionState::new(5),
            Interaction::Upload {
                name: "e.csv".into(),
                bytes: b"Date,Category,Amount\n2024-01-05,Food,100\n2024-02-01,Rent,500\n".to_vec(),
            },
        );
        let mut input = state.filter_input().unwrap().clone();
        input.categories = vec!["Rent".into()];
        let (_, model) = handle_interaction(state, Interaction::Filter(input));

        assert_eq!(write_dashboard(&model, &path).unwrap(), 1);
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Date,Category,Amount\n2024-02-01,Rent,500\n");
    }

    #[test]
    fn test_write_dashboard_without_rows() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_dashboard(&RenderModel::welcome(), &dir.path().join("x.csv")).unwrap_err();
        assert!(matches!(err, SpendError::EmptyResult));
        assert!(!dir.path().join("x.csv").exists());
    }
}
