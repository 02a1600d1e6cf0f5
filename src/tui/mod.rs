//! Ratatui-based terminal UI.
//!
//! The TUI is the interactive version of a data command: a chart of every
//! source, or the pivot table of the selected sources, with source toggles,
//! CSV export and refetch.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::DateTime;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
};

use crate::app::pipeline::{ViewOutput, run_view};
use crate::domain::{DEFAULT_EXPORT_FILE, PivotTable, ViewConfig};
use crate::error::AppError;
use crate::io::export::write_csv;
use crate::reshape::{PatternFormatter, SourceSelection, pivot, series_bounds};

mod plotters_chart;

use plotters_chart::{SeriesPlottersChart, series_color};

/// Start the TUI for an already-built view configuration.
pub fn run(config: ViewConfig) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config)?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Chart,
    Table,
}

struct App {
    config: ViewConfig,
    formatter: PatternFormatter,
    screen: Screen,
    /// Table selection; reset on every successful fetch.
    selection: SourceSelection,
    /// Pivot of `selection`, rebuilt whenever the selection changes.
    table: PivotTable,
    scroll: usize,
    status: String,
    view: ViewOutput,
}

impl App {
    fn new(config: ViewConfig) -> Result<Self, AppError> {
        let view = run_view(&config)?;
        Self::with_view(config, view)
    }

    fn with_view(config: ViewConfig, view: ViewOutput) -> Result<Self, AppError> {
        let formatter = PatternFormatter::new(config.date_pattern.as_str())
            .map_err(|e| AppError::new(2, format!("Invalid --date-format: {e}")))?;
        let screen = if config.view.shows_chart() { Screen::Chart } else { Screen::Table };
        let status = loaded_status(&view);
        Ok(Self {
            config,
            formatter,
            screen,
            selection: view.selection.clone(),
            table: view.table.clone(),
            scroll: 0,
            status,
            view,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => {
                self.screen = match self.screen {
                    Screen::Chart => Screen::Table,
                    Screen::Table => Screen::Chart,
                };
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                self.toggle_source(index);
            }
            KeyCode::Char('a') => {
                self.selection = self.view.available.clone();
                self.rebuild_table();
                self.status = format!("Selected all {} source(s).", self.selection.len());
            }
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('r') => self.refetch(),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.scroll + 1 < self.table.rows.len() {
                    self.scroll += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll = self.scroll.saturating_sub(1);
            }
            _ => {}
        }
        false
    }

    fn toggle_source(&mut self, index: usize) {
        let Some(source) = self.view.available.as_slice().get(index).cloned() else {
            return;
        };
        self.selection.toggle(&source, &self.view.available);
        self.rebuild_table();
        let state = if self.selection.contains(&source) { "shown" } else { "hidden" };
        self.status = format!("{source}: {state} in table.");
    }

    fn rebuild_table(&mut self) {
        self.table = pivot(&self.view.ingest.observations, &self.selection, &self.formatter);
        self.scroll = self.scroll.min(self.table.rows.len().saturating_sub(1));
    }

    fn export_path(&self) -> PathBuf {
        self.config
            .export
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE))
    }

    fn export(&mut self) {
        if self.table.is_empty() {
            self.status = "Nothing to export: the table is empty.".to_string();
            return;
        }
        let path = self.export_path();
        self.status = match write_csv(&path, &self.table.columns, &self.table.rows) {
            Ok(()) => format!("Exported {} row(s) to {}.", self.table.rows.len(), path.display()),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    fn refetch(&mut self) {
        match run_view(&self.config) {
            Ok(view) => {
                self.selection = view.selection.clone();
                self.table = view.table.clone();
                self.scroll = 0;
                self.status = loaded_status(&view);
                self.view = view;
            }
            Err(err) => {
                self.status = format!("Refetch failed: {err}");
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        match self.screen {
            Screen::Chart => self.draw_chart(frame, chunks[1]),
            Screen::Table => self.draw_table(frame, chunks[1]),
        }
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("sf", Style::default().fg(Color::Cyan)),
            Span::raw(format!(
                " - {} | {} observation(s), {} skipped",
                self.config.query.label(),
                self.view.ingest.observations.len(),
                self.view.ingest.skipped.len(),
            )),
        ]));

        // Source toggles; the chart always shows every source.
        let mut spans = Vec::new();
        for (i, source) in self.view.available.iter().enumerate() {
            let mark = if self.selection.contains(source) { "[x]" } else { "[ ]" };
            let key = if i < 9 { format!("{}", i + 1) } else { " ".to_string() };
            spans.push(Span::styled(
                format!("{key}{mark} {source}  "),
                Style::default().fg(series_color(i)),
            ));
        }
        lines.push(Line::from(spans));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::LEFT | Borders::RIGHT | Borders::TOP));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Chart (all sources)").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some((x_bounds, y_bounds)) = chart_bounds(&self.view) else {
            let msg = Paragraph::new("No chartable observations.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let y_label = common_unit(&self.view);
        let (chart_rect, insets) = chart_layout(inner);
        let widget = SeriesPlottersChart {
            lines: &self.view.lines,
            x_bounds,
            y_bounds,
            y_label: y_label.clone(),
            fmt_x: fmt_axis_time,
            fmt_y: fmt_axis_value,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds, &y_label);
        }
    }

    fn draw_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = format!(
            "Table ({} row(s), {} column(s))",
            self.table.rows.len(),
            self.table.columns.len()
        );
        let block = Block::default().title(title).borders(Borders::ALL);

        if self.table.is_empty() {
            let msg = Paragraph::new("No rows: select at least one source (1-9, a).")
                .style(Style::default().fg(Color::Yellow))
                .block(block);
            frame.render_widget(msg, area);
            return;
        }

        let header = Row::new(
            std::iter::once("date".to_string())
                .chain(self.table.columns.iter().cloned())
                .map(Cell::from),
        )
        .style(Style::default().add_modifier(Modifier::BOLD));

        let rows = self.table.rows.iter().skip(self.scroll).map(|row| {
            let mut cells = vec![Cell::from(row.formatted_date.clone())];
            cells.extend(
                self.table
                    .columns
                    .iter()
                    .map(|c| Cell::from(row.cell(c).unwrap_or("-").to_string())),
            );
            Row::new(cells)
        });

        let mut widths = vec![Constraint::Length(18)];
        widths.extend(self.table.columns.iter().map(|c| Constraint::Min(c.chars().count().max(10) as u16)));

        let table = Table::new(rows, widths).header(header).block(block);
        frame.render_widget(table, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "Tab chart/table  1-9 toggle  a all  e export  r refetch  j/k scroll  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn loaded_status(view: &ViewOutput) -> String {
    let skipped = view.ingest.skipped.len() + view.table.skipped.len() + view.chart_skipped.len();
    if skipped == 0 {
        format!("Loaded {} observation(s).", view.ingest.observations.len())
    } else {
        format!(
            "Loaded {} observation(s), skipped {skipped} malformed record(s).",
            view.ingest.observations.len()
        )
    }
}

/// Padded chart bounds, or `None` when there is nothing to draw.
fn chart_bounds(view: &ViewOutput) -> Option<([f64; 2], [f64; 2])> {
    let ([mut x0, mut x1], [mut y0, mut y1]) = series_bounds(&view.lines)?;
    if x1 <= x0 {
        x0 -= 1800.0;
        x1 += 1800.0;
    }
    if y1 <= y0 {
        y0 -= 1.0;
        y1 += 1.0;
    }
    let pad = ((y1 - y0).abs() * 0.05).max(1e-12);
    Some(([x0, x1], [y0 - pad, y1 + pad]))
}

fn common_unit(view: &ViewOutput) -> String {
    match view.lines.first() {
        Some(first) if view.lines.iter().all(|l| l.unit == first.unit) => first.unit.clone(),
        Some(_) => "mixed".to_string(),
        None => String::new(),
    }
}

fn fmt_axis_time(v: f64) -> String {
    DateTime::from_timestamp(v as i64, 0)
        .map(|dt| dt.naive_utc().format("%d.%m %H:%M").to_string())
        .unwrap_or_default()
}

fn fmt_axis_value(v: f64) -> String {
    format!("{v:.0}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    y_label: &str,
) {
    let ticks = 4usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_time(x_val);
        let label_len = label.len() as u16;
        let start = x
            .saturating_sub((label.len() / 2) as u16)
            .min((chart.x + chart.width).saturating_sub(label_len));
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_axis_value(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("time")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(
        Paragraph::new(y_label.to_string()).style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)),
        y_rect,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::{build_view, load_observations_for};
    use crate::domain::{DEFAULT_DATE_PATTERN, DataOrigin, DateRange, ResourceQuery, ViewMode};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn app(export: Option<PathBuf>) -> App {
        let config = ViewConfig {
            query: ResourceQuery::Forecast { plant_id: 2 },
            origin: DataOrigin::Sample { seed: 3 },
            range: Some(DateRange::new(at(0), at(23)).unwrap()),
            sources: None,
            view: ViewMode::Both,
            date_pattern: DEFAULT_DATE_PATTERN.to_string(),
            plot_width: 60,
            plot_height: 12,
            export,
        };
        let ingest = load_observations_for(&config, at(12)).unwrap();
        let view = build_view(&config, ingest).unwrap();
        App::with_view(config, view).unwrap()
    }

    #[test]
    fn starts_on_chart_with_every_source_selected() {
        let app = app(None);
        assert_eq!(app.screen, Screen::Chart);
        assert_eq!(app.selection, app.view.available);
        assert_eq!(app.table.columns.len(), 3);
    }

    #[test]
    fn digit_keys_toggle_table_columns_only() {
        let mut app = app(None);
        app.handle_key(KeyCode::Char('2'));
        assert_eq!(app.table.columns, ["Model A", "Production"]);
        // Chart data is untouched.
        assert_eq!(app.view.lines.len(), 3);

        app.handle_key(KeyCode::Char('2'));
        assert_eq!(app.table.columns, ["Model A", "Model B", "Production"]);

        // No source behind this key.
        app.handle_key(KeyCode::Char('9'));
        assert_eq!(app.selection.len(), 3);
    }

    #[test]
    fn export_refused_when_table_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut app = app(Some(path.clone()));
        for key in ['1', '2', '3'] {
            app.handle_key(KeyCode::Char(key));
        }
        assert!(app.table.is_empty());

        app.handle_key(KeyCode::Char('e'));
        assert!(app.status.starts_with("Nothing to export"));
        assert!(!path.exists());

        app.handle_key(KeyCode::Char('a'));
        app.handle_key(KeyCode::Char('e'));
        let csv = std::fs::read_to_string(&path).unwrap();
        assert!(csv.starts_with("date,Model A,Model B,Production\n\"01.06.2024 00:00\","));
        assert_eq!(csv.lines().count(), 25);
    }

    #[test]
    fn tab_switches_screen_and_q_quits() {
        let mut app = app(None);
        assert!(!app.handle_key(KeyCode::Tab));
        assert_eq!(app.screen, Screen::Table);
        assert!(!app.handle_key(KeyCode::Tab));
        assert_eq!(app.screen, Screen::Chart);
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn scrolling_stays_within_rows() {
        let mut app = app(None);
        app.handle_key(KeyCode::Up);
        assert_eq!(app.scroll, 0);
        for _ in 0..100 {
            app.handle_key(KeyCode::Char('j'));
        }
        assert_eq!(app.scroll, app.table.rows.len() - 1);
    }

    #[test]
    fn refetch_resets_selection() {
        let mut app = app(None);
        app.handle_key(KeyCode::Char('1'));
        assert_eq!(app.selection.len(), 2);
        app.handle_key(KeyCode::Char('r'));
        assert_eq!(app.selection, app.view.available);
        assert_eq!(app.scroll, 0);
    }
}
