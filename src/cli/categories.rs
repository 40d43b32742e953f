use comfy_table::{Cell, CellAlignment, Table};

use crate::error::Result;
use crate::loader::load_file;
use crate::models;

pub fn list(file: &str) -> Result<()> {
    let table = load_file(std::path::Path::new(file))?;
    println!("{}", format_categories(&table));
    Ok(())
}

pub fn format_categories(table: &models::Table) -> String {
    let mut out = Table::new();
    out.set_header(vec!["Category", "Rows"]);
    for (name, count) in table.category_counts() {
        out.add_row(vec![
            Cell::new(name),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }
    let span = match table.date_bounds() {
        Some((min, max)) => format!("Dates: {min} to {max}"),
        None => "Dates: (no rows)".to_string(),
    };
    format!("{out}\n{span}")
}
