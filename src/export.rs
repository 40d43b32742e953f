use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::filter::FilteredView;

/// Write the filtered rows with the same header and column order as the input.
pub fn write_filtered_csv<W: Write>(view: &FilteredView<'_>, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(view.headers())?;
    for record in view.records() {
        wtr.write_record(&record.fields)?;
    }
    wtr.flush()?;
    Ok(())
}

/// In-memory download payload (UTF-8 CSV).
pub fn export_bytes(view: &FilteredView<'_>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_filtered_csv(view, &mut buf)?;
    Ok(buf)
}

/// Save a payload built by [`export_bytes`], creating the parent directory.
pub fn write_payload(payload: &[u8], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, payload)?;
    tracing::info!(path = %path.display(), bytes = payload.len(), "exported filtered rows");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::apply_filter;
    use crate::loader::load_table;
    use crate::models::{DateRange, FilterSpec};
    use chrono::NaiveDate;

    const CSV: &str = "\
Date,Category,Amount,Note
2024-01-05,Food,100,\"lunch, with team\"
2024-01-20,Food,50,
2024-02-01,Rent,500,february
";

    #[test]
    fn test_export_keeps_layout_and_extra_columns() {
        let table = load_table(CSV.as_bytes()).unwrap();
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap();
        let view = apply_filter(&table, &FilterSpec::new(["Food"], range));
        let out = String::from_utf8(export_bytes(&view).unwrap()).unwrap();
        assert_eq!(
            out,
            "Date,Category,Amount,Note\n2024-01-05,Food,100,\"lunch, with team\"\n2024-01-20,Food,50,\n"
        );
    }

    #[test]
    fn test_exported_file_loads_back() {
        let table = load_table(CSV.as_bytes()).unwrap();
        let view = apply_filter(&table, &FilterSpec::select_all(&table).unwrap());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("filtered_expenses.csv");
        write_payload(&export_bytes(&view).unwrap(), &path).unwrap();
        let reloaded = load_table(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(reloaded.headers, table.headers);
        assert_eq!(reloaded.records, table.records);
    }

    #[test]
    fn test_export_empty_view_writes_header_only() {
        let table = load_table(CSV.as_bytes()).unwrap();
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        )
        .unwrap();
        let view = apply_filter(&table, &FilterSpec::new(["Food"], range));
        let out = String::from_utf8(export_bytes(&view).unwrap()).unwrap();
        assert_eq!(out, "Date,Category,Amount,Note\n");
    }
}
