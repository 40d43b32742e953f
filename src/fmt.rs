/// Format a float as a currency amount with thousands separators: ₹1,234.56
pub fn money(val: f64, symbol: &str) -> String {
    let negative = val < 0.0;
    let abs = val.abs();
    let cents = format!("{:.2}", abs);
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    // no sign on values that round to zero
    if negative && cents != "0.00" {
        format!("-{symbol}{with_commas}.{dec_part}")
    } else {
        format!("{symbol}{with_commas}.{dec_part}")
    }
}

/// Percentage with one decimal, as shown on the category chart: 23.1%
pub fn pct(share: f64) -> String {
    format!("{share:.1}%")
}

/// "2024-03" → "Mar 2024". Returns the input unchanged when it is not a month key.
pub fn month_label(month: &str) -> String {
    chrono::NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|_| month.to_string())
}
