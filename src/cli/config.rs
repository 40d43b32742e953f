use comfy_table::Table;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path, Settings};

pub fn run(assignments: &[String]) -> Result<()> {
    let mut settings = load_settings();
    if !assignments.is_empty() {
        for assignment in assignments {
            settings.set(assignment)?;
        }
        save_settings(&settings)?;
        println!("Saved {}", settings_path().display());
    }
    println!("{}", format_settings(&settings));
    Ok(())
}

pub fn format_settings(settings: &Settings) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec!["currency_symbol", settings.currency_symbol.as_str()]);
    table.add_row(vec!["preview_rows".to_string(), settings.preview_rows.to_string()]);
    table.add_row(vec![
        "export_dir".to_string(),
        settings.export_dir.clone().unwrap_or_else(|| "(current directory)".into()),
    ]);
    table.to_string()
}
