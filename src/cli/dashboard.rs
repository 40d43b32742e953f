use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

use super::display_name;
use super::export::write_dashboard;
use crate::error::{Result, SpendError};
use crate::fmt::{money, month_label, pct};
use crate::render::{
    CategorySlice, ChartOutcome, Controls, Dashboard, MonthBar, RenderModel, Screen, WELCOME_MESSAGE,
};
use crate::session::{content_key, handle_interaction, FilterInput, Interaction, SessionState};
use crate::settings::{load_settings, Settings};
use crate::tui::{
    money_span, wrap_text, AMOUNT_NEG_STYLE, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE, INFO_STYLE, SELECTED_STYLE,
    TITLE_STYLE, WARN_STYLE,
};

const SIDEBAR_WIDTH: u16 = 30;
const MAX_COLUMN_WIDTH: usize = 18;
const HINTS: &str =
    " ↑↓ move  Space toggle  a/n all/none  [ ] start  { } end  r reset  t table  x export  u reload  q quit";

#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

pub struct DashboardApp {
    state: SessionState,
    model: RenderModel,
    settings: Settings,
    source: Option<PathBuf>,
    cursor: usize,
    scroll: u16,
    status_message: Option<String>,
}

impl DashboardApp {
    pub fn new(name: String, bytes: Vec<u8>, settings: Settings) -> Self {
        let (state, model) = handle_interaction(
            SessionState::new(settings.preview_rows),
            Interaction::Upload { name, bytes },
        );
        Self {
            state,
            model,
            settings,
            source: None,
            cursor: 0,
            scroll: 0,
            status_message: None,
        }
    }

    /// Load `path` and remember it so `u` can read it again.
    pub fn open(path: &Path, settings: Settings) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let mut app = Self::new(display_name(path), bytes, settings);
        app.source = Some(path.to_path_buf());
        Ok(app)
    }

    pub fn model(&self) -> &RenderModel {
        &self.model
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    fn apply(&mut self, interaction: Interaction) {
        let state = std::mem::replace(&mut self.state, SessionState::new(self.settings.preview_rows));
        let (state, model) = handle_interaction(state, interaction);
        self.state = state;
        self.model = model;
    }

    fn categories(&self) -> &[String] {
        self.model
            .controls
            .as_ref()
            .map(|c| c.categories.as_slice())
            .unwrap_or_default()
    }

    fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.model.controls.as_ref().and_then(|c| c.bounds)
    }

    /// Edit the current widget state and rerun the pipeline.
    fn update_input(&mut self, edit: impl FnOnce(&mut FilterInput, &[String], Option<(NaiveDate, NaiveDate)>)) {
        let Some(mut input) = self.state.filter_input().cloned() else {
            return;
        };
        let categories = self.categories().to_vec();
        edit(&mut input, &categories, self.bounds());
        self.apply(Interaction::Filter(input));
    }

    pub fn handle_key(&mut self, code: KeyCode) -> KeyAction {
        self.status_message = None;
        let count = self.categories().len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return KeyAction::Quit,
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => self.cursor = (self.cursor + 1).min(count.saturating_sub(1)),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(5),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(5),
            KeyCode::Char(' ') | KeyCode::Enter => {
                let cursor = self.cursor;
                self.update_input(|input, categories, _| {
                    let Some(name) = categories.get(cursor) else {
                        return;
                    };
                    if input.categories.contains(name) {
                        input.categories.retain(|c| c != name);
                    } else {
                        input.categories.push(name.clone());
                    }
                });
            }
            KeyCode::Char('a') => self.update_input(|input, categories, _| {
                input.categories = categories.to_vec();
            }),
            KeyCode::Char('n') => self.update_input(|input, _, _| input.categories.clear()),
            KeyCode::Char('[') => self.update_input(|input, _, bounds| shift_start(input, -1, bounds)),
            KeyCode::Char(']') => self.update_input(|input, _, bounds| shift_start(input, 1, bounds)),
            KeyCode::Char('{') => self.update_input(|input, _, bounds| shift_end(input, -1, bounds)),
            KeyCode::Char('}') => self.update_input(|input, _, bounds| shift_end(input, 1, bounds)),
            // leave only the start date picked
            KeyCode::Char('d') => self.update_input(|input, _, _| input.dates.truncate(1)),
            KeyCode::Char('r') => self.update_input(|input, _, bounds| {
                input.dates = bounds.map(|(min, max)| vec![min, max]).unwrap_or_default();
            }),
            KeyCode::Char('t') => {
                self.scroll = 0;
                self.update_input(|input, _, _| input.show_all = !input.show_all);
            }
            KeyCode::Char('u') => self.reload(),
            KeyCode::Char('x') => {
                let path = self.settings.default_export_path();
                self.export(&path);
            }
            _ => {}
        }
        KeyAction::Continue
    }

    /// Read the source file again. The cached table is dropped first, so
    /// edits made on disk since the last load are picked up.
    pub fn reload(&mut self) {
        let Some(path) = self.source.clone() else {
            return;
        };
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.status_message = Some(format!("Reload failed: {e}"));
                return;
            }
        };
        let unchanged = self.state.cache().key() == Some(content_key(&bytes).as_str());
        let name = display_name(&path);
        self.apply(Interaction::ClearUpload);
        self.apply(Interaction::Upload {
            name: name.clone(),
            bytes,
        });
        self.cursor = 0;
        self.scroll = 0;
        self.status_message = Some(match (self.state.table(), unchanged) {
            (None, _) => format!("Reload failed: {name} could not be read"),
            (Some(table), true) => format!("Reloaded {name}: unchanged, {} rows", table.len()),
            (Some(table), false) => format!("Reloaded {name}: {} rows", table.len()),
        });
    }

    pub fn export(&mut self, path: &Path) {
        self.status_message = Some(match write_dashboard(&self.model, path) {
            Ok(rows) => format!("Wrote {} ({rows} rows)", path.display()),
            Err(SpendError::EmptyResult) => "Nothing to export for the current filters.".to_string(),
            Err(e) => format!("Export failed: {e}"),
        });
    }

    pub fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, sep_area, body_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let title = self
            .model
            .controls
            .as_ref()
            .map(|c| format!(" Expense Analyzer: {}", c.upload_name))
            .unwrap_or_else(|| " Expense Analyzer".to_string());
        frame.render_widget(Paragraph::new(title).style(HEADER_STYLE), header_area);
        frame.render_widget(
            Paragraph::new("━".repeat(area.width as usize)).style(Style::default().fg(Color::DarkGray)),
            sep_area,
        );

        let [sidebar, content] =
            Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Fill(1)]).areas(body_area);
        if let Some(controls) = &self.model.controls {
            self.draw_sidebar(frame, controls, sidebar);
        }

        match &self.model.screen {
            Screen::Welcome => draw_message(frame, WELCOME_MESSAGE, INFO_STYLE, content),
            Screen::Failed { message, .. } => draw_message(frame, message, ERROR_STYLE, content),
            Screen::NeedsRange { message } => draw_message(frame, message, WARN_STYLE, content),
            Screen::Empty { notice } => draw_message(frame, notice, INFO_STYLE, content),
            Screen::Dashboard(dashboard) => self.draw_dashboard(frame, dashboard, content),
        }

        let hints = match self.status_message() {
            Some(msg) => Paragraph::new(format!(" {msg}")).style(WARN_STYLE),
            None => Paragraph::new(HINTS).style(FOOTER_STYLE),
        };
        frame.render_widget(hints, hints_area);
    }

    fn draw_sidebar(&self, frame: &mut Frame, controls: &Controls, area: Rect) {
        let mut lines = vec![Line::from(Span::styled(" Categories", TITLE_STYLE))];
        for (i, name) in controls.categories.iter().enumerate() {
            let mark = if controls.selected.contains(name) { "[x]" } else { "[ ]" };
            let style = if i == self.cursor {
                SELECTED_STYLE
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(format!(" {mark} {name}"), style)));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(" Date range", TITLE_STYLE)));
        match (controls.range, self.state.filter_input().map(|i| i.dates.as_slice())) {
            (Some(range), _) => {
                lines.push(Line::from(format!(" From {}", range.start())));
                lines.push(Line::from(format!(" To   {}", range.end())));
            }
            (None, Some([start])) => {
                lines.push(Line::from(format!(" From {start}")));
                lines.push(Line::from(Span::styled(" To   (pick a date)", WARN_STYLE)));
            }
            _ => lines.push(Line::from(Span::styled(" (none)", FOOTER_STYLE))),
        }
        if let Some((min, max)) = controls.bounds {
            lines.push(Line::from(Span::styled(format!(" File spans {min} to {max}"), FOOTER_STYLE)));
        }
        if controls.dropped > 0 {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!(" {} row(s) skipped", controls.dropped),
                FOOTER_STYLE,
            )));
        }

        let block = Block::default().borders(Borders::RIGHT).border_style(FOOTER_STYLE);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_dashboard(&self, frame: &mut Frame, d: &Dashboard, area: Rect) {
        let table_height = (d.preview.len() as u16 + 2).min(area.height / 2).max(3);
        let [metrics_area, table_area, charts_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(table_height),
            Constraint::Fill(1),
        ])
        .areas(area);

        let symbol = self.settings.currency_symbol.as_str();
        let metrics = vec![
            Line::from(Span::styled(" Summary Statistics", TITLE_STYLE)),
            Line::from(vec![Span::raw(" Total Spent        "), money_span(d.total, symbol)]),
            Line::from(vec![Span::raw(" Average per Entry  "), money_span(d.average, symbol)]),
        ];
        frame.render_widget(Paragraph::new(metrics), metrics_area);

        let shown = if d.showing_all {
            format!(" Filtered Data (all {} rows)", d.row_count)
        } else {
            format!(" Preview of Filtered Data ({} of {} rows)", d.preview.len(), d.row_count)
        };
        let mut lines = vec![Line::from(Span::styled(shown, TITLE_STYLE))];
        lines.extend(preview_lines(&d.headers, &d.preview));
        frame.render_widget(Paragraph::new(lines).scroll((self.scroll, 0)), table_area);

        let [pie_area, bar_area] =
            Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(charts_area);
        self.draw_categories(frame, &d.categories, pie_area);
        draw_months(frame, &d.months, &self.settings.currency_symbol, bar_area);
    }

    fn draw_categories(&self, frame: &mut Frame, outcome: &ChartOutcome<Vec<CategorySlice>>, area: Rect) {
        let mut lines = vec![Line::from(Span::styled(" Expense Distribution by Category", TITLE_STYLE))];
        match outcome {
            ChartOutcome::Ready(slices) => {
                let width = slices.iter().map(|s| s.category.chars().count()).max().unwrap_or(8);
                for s in slices {
                    lines.push(Line::from(vec![
                        Span::raw(format!(" {:<width$}  {:>6}  ", s.category, pct(s.share))),
                        money_span(s.amount, &self.settings.currency_symbol),
                    ]));
                }
            }
            ChartOutcome::NoData(msg) => lines.push(Line::from(Span::styled(format!(" {msg}"), INFO_STYLE))),
            ChartOutcome::Failed(msg) => lines.push(Line::from(Span::styled(format!(" {msg}"), WARN_STYLE))),
        }
        frame.render_widget(Paragraph::new(lines), area);
    }
}

fn draw_message(frame: &mut Frame, message: &str, style: Style, area: Rect) {
    let (wrapped, _) = wrap_text(message, area.width.saturating_sub(2) as usize);
    let lines: Vec<Line> = wrapped
        .lines()
        .map(|l| Line::from(Span::styled(format!(" {l}"), style)))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_months(frame: &mut Frame, outcome: &ChartOutcome<Vec<MonthBar>>, symbol: &str, area: Rect) {
    let block = Block::default()
        .title(" Monthly Expense Trend")
        .title_style(Style::default().add_modifier(Modifier::BOLD))
        .borders(Borders::NONE);
    let bars = match outcome {
        ChartOutcome::Ready(bars) => bars,
        ChartOutcome::NoData(msg) => {
            frame.render_widget(Paragraph::new(format!(" {msg}")).style(INFO_STYLE).block(block), area);
            return;
        }
        ChartOutcome::Failed(msg) => {
            frame.render_widget(Paragraph::new(format!(" {msg}")).style(WARN_STYLE).block(block), area);
            return;
        }
    };

    // bars cannot go below the axis, so net-negative months are listed under the chart
    let refunds: Vec<String> = bars
        .iter()
        .filter(|b| b.amount < 0.0)
        .map(|b| format!("{} {}", month_label(&b.month), money(b.amount, symbol)))
        .collect();
    let (chart_area, note_area) = if refunds.is_empty() {
        (area, None)
    } else {
        let [chart, note] = Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
        (chart, Some(note))
    };
    if let Some(note_area) = note_area {
        frame.render_widget(
            Paragraph::new(format!(" Net refunds: {}", refunds.join(", "))).style(AMOUNT_NEG_STYLE),
            note_area,
        );
    }

    let bar_style = Style::default().fg(Color::Rgb(80, 180, 220));
    let data: Vec<Bar> = bars
        .iter()
        .map(|b| {
            Bar::default()
                .value(b.amount.max(0.0).round() as u64)
                .label(Line::from(month_label(&b.month)))
                .style(bar_style)
        })
        .collect();
    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&data))
        .bar_width(8)
        .bar_gap(1);
    frame.render_widget(chart, chart_area);
}

/// Fixed-width text rows for the preview table.
fn preview_lines(headers: &[String], rows: &[Vec<String>]) -> Vec<Line<'static>> {
    let widths: Vec<usize> = (0..headers.len())
        .map(|i| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .chain(std::iter::once(&headers[i]))
                .map(|v| v.chars().count())
                .max()
                .unwrap_or(0)
                .min(MAX_COLUMN_WIDTH)
        })
        .collect();
    let format_row = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| {
                let cell: String = cell.chars().take(w).collect();
                format!("{cell:<w$}")
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut lines = vec![Line::from(Span::styled(format!(" {}", format_row(headers)), HEADER_STYLE))];
    for row in rows {
        lines.push(Line::from(format!(" {}", format_row(row))));
    }
    lines
}

pub fn run(file: &str) -> Result<()> {
    let mut app = DashboardApp::open(Path::new(file), load_settings())?;
    if let Screen::Failed { message, .. } = &app.model().screen {
        return Err(SpendError::Other(message.clone()));
    }

    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();
    let exit: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| app.draw(frame)) {
            break Err(e.into());
        }
        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    break Ok(());
                }
                if app.handle_key(key.code) == KeyAction::Quit {
                    break Ok(());
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    exit
}

// ---------------------------------------------------------------------------
// Date picker helpers
// ---------------------------------------------------------------------------

fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(chrono::Duration::days(days)).unwrap_or(date)
}

/// Move the start date, keeping it within the file's span and not past the end date.
fn shift_start(input: &mut FilterInput, days: i64, bounds: Option<(NaiveDate, NaiveDate)>) {
    let [start, end] = input.dates[..] else {
        return;
    };
    let lower = bounds.map(|(min, _)| min).unwrap_or(NaiveDate::MIN);
    input.dates = vec![shift(start, days).clamp(lower.min(end), end), end];
}

/// Move the end date, keeping it within the file's span and not before the start date.
fn shift_end(input: &mut FilterInput, days: i64, bounds: Option<(NaiveDate, NaiveDate)>) {
    match input.dates[..] {
        [start, end] => {
            let upper = bounds.map(|(_, max)| max).unwrap_or(NaiveDate::MAX);
            input.dates = vec![start, shift(end, days).clamp(start, upper.max(start))];
        }
        // picking the second date completes a half-picked range
        [start] => {
            let upper = bounds.map(|(_, max)| max).unwrap_or(start);
            input.dates = vec![start, upper.max(start)];
        }
        _ => {}
    }
}
