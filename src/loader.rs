use std::path::Path;

use chrono::NaiveDate;

use crate::error::{Result, SpendError};
use crate::models::{Record, Table, AMOUNT_COLUMN, CATEGORY_COLUMN, DATE_COLUMN, REQUIRED_COLUMNS};

// ---------------------------------------------------------------------------
// Field coercion
// ---------------------------------------------------------------------------

/// Spellings read as a missing value, same as a pandas CSV reader.
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %b %Y", "%b %d, %Y", "%B %d, %Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

pub fn is_na(raw: &str) -> bool {
    NA_VALUES.contains(&raw.trim())
}

/// Coerce a date cell. Unparseable values yield `None`, never an error.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if is_na(s) {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| chrono::DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

const CURRENCY_SYMBOLS: &[char] = &['$', '₹', '€', '£'];

/// Coerce an amount cell: `1,234.56`, `$50`, `₹500`, `(42.00)` for negatives.
/// Only surrounding whitespace and well-formed thousands separators are
/// ignored; `1 2 3` or `12,34` is not a number.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if is_na(s) {
        return None;
    }
    let (negated, s) = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (true, inner.trim()),
        None => (false, s),
    };
    let (sign, body) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.strip_prefix('+').unwrap_or(s)),
    };
    let digits = strip_thousands(body.trim_start_matches(CURRENCY_SYMBOLS))?;
    let value: f64 = format!("{sign}{digits}").parse().ok()?;
    let value = if negated { -value } else { value };
    value.is_finite().then_some(value)
}

/// Remove commas from `1,234,567.89`-style numbers. Misplaced commas
/// reject the value.
fn strip_thousands(s: &str) -> Option<String> {
    if !s.contains(',') {
        return Some(s.to_string());
    }
    let (int_part, frac) = match s.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (s, None),
    };
    let mut groups = int_part.split(',');
    let first = groups.next()?;
    if first.is_empty() || first.len() > 3 || !groups.all(|g| g.len() == 3) {
        return None;
    }
    let mut out = int_part.replace(',', "");
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    Some(out)
}

fn parse_category(raw: &str) -> Option<String> {
    let s = raw.trim();
    if is_na(s) {
        None
    } else {
        Some(s.to_string())
    }
}

pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

// ---------------------------------------------------------------------------
// load_table
// ---------------------------------------------------------------------------

/// Column positions of the required fields within the header row.
struct ColumnIndex {
    date: usize,
    category: usize,
    amount: usize,
}

fn index_columns(headers: &[String]) -> Result<ColumnIndex> {
    let find = |name: &str| headers.iter().position(|h| h == name);
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|&&c| find(c).is_none())
        .map(|c| c.to_string())
        .collect();
    match (find(DATE_COLUMN), find(CATEGORY_COLUMN), find(AMOUNT_COLUMN)) {
        (Some(date), Some(category), Some(amount)) => Ok(ColumnIndex { date, category, amount }),
        _ => Err(SpendError::Schema { missing }),
    }
}

/// Parse uploaded CSV bytes into a [`Table`].
///
/// Rows with a missing or unparseable date, category or amount are dropped
/// and counted in [`Table::dropped`]; they never fail the load.
pub fn load_table(bytes: &[u8]) -> Result<Table> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| SpendError::Parse(format!("file is not valid UTF-8 ({e})")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return Err(SpendError::Parse("file is empty".to_string()));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| SpendError::Parse(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let columns = index_columns(&headers)?;

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for result in rdr.records() {
        let row = result.map_err(|e| SpendError::Parse(e.to_string()))?;
        if row.len() > headers.len() {
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            return Err(SpendError::Parse(format!(
                "expected {} fields in line {line}, saw {}",
                headers.len(),
                row.len()
            )));
        }

        let date = row.get(columns.date).and_then(parse_date);
        let category = row.get(columns.category).and_then(parse_category);
        let amount = row.get(columns.amount).and_then(parse_amount);
        let (Some(date), Some(category), Some(amount)) = (date, category, amount) else {
            dropped += 1;
            continue;
        };

        let mut fields: Vec<String> = row.iter().map(str::to_string).collect();
        fields.resize(headers.len(), String::new());
        records.push(Record {
            date,
            category,
            amount,
            month: month_key(date),
            fields,
        });
    }

    if dropped > 0 {
        tracing::warn!(dropped, kept = records.len(), "dropped rows with missing Date, Category or Amount");
    }
    tracing::debug!(rows = records.len(), columns = headers.len(), "loaded table");

    Ok(Table {
        headers,
        records,
        dropped,
    })
}

/// Read a file from disk and load it.
pub fn load_file(path: &Path) -> Result<Table> {
    let bytes = std::fs::read(path)?;
    load_table(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("  -42.50  "), Some(-42.5));
        assert_eq!(parse_amount("0"), Some(0.0));
        assert_eq!(parse_amount("not_a_number"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_parse_amount_rejects_stray_separators() {
        assert_eq!(parse_amount("1 2 3"), None);
        assert_eq!(parse_amount("12,34"), None);
        assert_eq!(parse_amount(",123"), None);
        assert_eq!(parse_amount("1,2,3"), None);
        assert_eq!(parse_amount("1234,567"), None);
        assert_eq!(parse_amount(" 1,234 "), Some(1234.0));
    }

    #[test]
    fn test_parse_amount_currency_and_parentheses() {
        assert_eq!(parse_amount("$1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("₹500"), Some(500.0));
        assert_eq!(parse_amount("(50.00)"), Some(-50.0));
        assert_eq!(parse_amount("-$50.00"), Some(-50.0));
        assert_eq!(parse_amount("12,345,678.9"), Some(12345678.9));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 7);
        assert_eq!(parse_date("2024-03-07"), expected);
        assert_eq!(parse_date("2024/03/07"), expected);
        assert_eq!(parse_date("03/07/2024"), expected);
        assert_eq!(parse_date("07 Mar 2024"), expected);
        assert_eq!(parse_date("Mar 07, 2024"), expected);
        assert_eq!(parse_date("2024-03-07 13:45:00"), expected);
        assert_eq!(parse_date("2024-03-07T13:45:00"), expected);
        assert_eq!(parse_date(" 2024-03-07 "), expected);
    }

    #[test]
    fn test_parse_date_rejects_invalid() {
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("13/01/2024"), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("NaT"), None);
    }

    #[test]
    fn test_month_key() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(month_key(d), "2024-03");
    }

    #[test]
    fn test_load_table_basic() {
        let csv = "Date,Category,Amount\n2024-01-05,Food,100\n2024-01-20,Food,50\n2024-02-01,Rent,500\n";
        let table = load_table(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.dropped, 0);
        assert_eq!(table.records[0].month, "2024-01");
        assert_eq!(table.records[2].month, "2024-02");
        assert_eq!(table.records[2].amount, 500.0);
    }

    #[test]
    fn test_load_table_drops_incomplete_rows() {
        let csv = "\
Date,Category,Amount
2024-01-05,Food,100
not-a-date,Food,10
2024-01-06,,10
2024-01-07,Travel,
2024-01-08,Travel,abc
2024-01-09,NA,5
2024-01-10,Bills
2024-01-11,Bills,75
";
        let table = load_table(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.dropped, 6);
        for r in &table.records {
            assert!(!r.category.is_empty());
            assert!(r.amount.is_finite());
        }
    }

    #[test]
    fn test_load_table_missing_column_is_schema_error() {
        let csv = "Date,Category\n2024-01-05,Food\n";
        let err = load_table(csv.as_bytes()).unwrap_err();
        match err {
            SpendError::Schema { missing } => assert_eq!(missing, vec!["Amount".to_string()]),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_table_headers_are_case_sensitive() {
        let csv = "date,category,amount\n2024-01-05,Food,1\n";
        let err = load_table(csv.as_bytes()).unwrap_err();
        match err {
            SpendError::Schema { missing } => assert_eq!(missing.len(), 3),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_table_unreadable_input() {
        assert!(matches!(load_table(b""), Err(SpendError::Parse(_))));
        assert!(matches!(load_table(&[0xff, 0xfe, 0x00, 0x41]), Err(SpendError::Parse(_))));
        let ragged = "Date,Category,Amount\n2024-01-05,Food,1,extra\n";
        assert!(matches!(load_table(ragged.as_bytes()), Err(SpendError::Parse(_))));
    }

    #[test]
    fn test_load_table_keeps_extra_columns_and_bom() {
        let csv = "\u{feff}Note,Date,Category,Amount\nlunch,2024-01-05,Food,12.5\n";
        let table = load_table(csv.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["Note", "Date", "Category", "Amount"]);
        assert_eq!(table.records[0].fields, vec!["lunch", "2024-01-05", "Food", "12.5"]);
        assert_eq!(table.records[0].category, "Food");
    }

    #[test]
    fn test_load_table_header_only() {
        let table = load_table(b"Date,Category,Amount\n").unwrap();
        assert!(table.is_empty());
        assert!(table.date_bounds().is_none());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expenses.csv");
        std::fs::write(&path, "Date,Category,Amount\n2024-01-05,Food,100\n").unwrap();
        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 1);
        assert!(matches!(load_file(&dir.path().join("missing.csv")), Err(SpendError::Io(_))));
    }
}
