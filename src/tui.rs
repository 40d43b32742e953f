use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use crate::fmt::money;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const TITLE_STYLE: Style = Style::new().add_modifier(Modifier::BOLD);

pub const AMOUNT_POS_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const AMOUNT_NEG_STYLE: Style = Style::new().fg(Color::Red);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const INFO_STYLE: Style = Style::new().fg(Color::Cyan);
pub const WARN_STYLE: Style = Style::new().fg(Color::Yellow);
pub const ERROR_STYLE: Style = Style::new().fg(Color::Red).add_modifier(Modifier::BOLD);

/// Format an amount as a colored Span (red for negative amounts such as refunds).
pub fn money_span(amount: f64, symbol: &str) -> Span<'static> {
    let style = if amount < 0.0 {
        AMOUNT_NEG_STYLE
    } else {
        AMOUNT_POS_STYLE
    };
    Span::styled(money(amount, symbol), style)
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_span_style() {
        assert_eq!(money_span(-5.0, "$").style, AMOUNT_NEG_STYLE);
        assert_eq!(money_span(5.0, "$").content, "$5.00");
    }

    #[test]
    fn test_wrap_text() {
        let (wrapped, lines) = wrap_text("No data found for selected filters.", 12);
        assert!(lines >= 3);
        assert!(wrapped.lines().all(|l| l.len() <= 12));
        assert_eq!(wrap_text("abc", 0), ("abc".to_string(), 1));
    }
}
