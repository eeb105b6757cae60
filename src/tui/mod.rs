//! Ratatui-based terminal UI.
//!
//! One screen over a `Session`: the selected view as a table, its close-price
//! chart, the insight text, and a status footer. `o` opens another CSV.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
    Terminal,
};
use tracing::info;

use crate::app::Session;
use crate::cli::picker;
use crate::domain::{ChartSeries, DisplayColumn, DisplayView};
use crate::error::AppError;
use crate::insight::{CompletionService, WriterClient};
use crate::io::Upload;

mod plotters_chart;

use plotters_chart::PricePlottersChart;

/// Start the TUI, optionally loading `initial` first.
pub fn run(session: Session, service: Option<WriterClient>, initial: Option<PathBuf>) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(session, service);
    if let Some(path) = initial {
        app.open(&path);
    }
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

/// Open-file overlay: discovered CSVs plus a typed path.
struct Picker {
    files: Vec<PathBuf>,
    selected: usize,
    input: String,
}

struct App {
    session: Session,
    service: Option<WriterClient>,
    picker: Option<Picker>,
    table: TableState,
    /// Set after a successful ingest; the insight call runs after the next draw.
    analysis_pending: bool,
    /// Overrides the session status until the next action.
    notice: Option<String>,
}

impl App {
    fn new(session: Session, service: Option<WriterClient>) -> Self {
        Self {
            session,
            service,
            picker: None,
            table: TableState::default(),
            analysis_pending: false,
            notice: None,
        }
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

            if self.analysis_pending {
                self.run_analysis();
                needs_redraw = true;
                continue;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
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
        if self.picker.is_some() {
            self.handle_picker_key(code);
            return false;
        }

        self.notice = None;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('a') => {
                let _ = self.session.show_all();
                self.table.select(Some(0));
            }
            KeyCode::Char('l') | KeyCode::Char('7') => {
                let _ = self.session.show_last_seven();
                self.table.select(Some(0));
            }
            KeyCode::Char('o') => {
                self.picker = Some(Picker {
                    files: picker::discover_csv_files(),
                    selected: 0,
                    input: String::new(),
                });
            }
            KeyCode::Down | KeyCode::Char('j') => self.scroll(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll(-1),
            _ => {}
        }
        false
    }

    fn handle_picker_key(&mut self, code: KeyCode) {
        let Some(p) = self.picker.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.picker = None;
                self.notice = Some("Open canceled.".to_string());
            }
            KeyCode::Up => p.selected = p.selected.saturating_sub(1),
            KeyCode::Down => {
                if p.selected + 1 < p.files.len() {
                    p.selected += 1;
                }
            }
            KeyCode::Backspace => {
                p.input.pop();
            }
            KeyCode::Char(c) => p.input.push(c),
            KeyCode::Enter => {
                let typed = p.input.trim();
                let target = if typed.is_empty() {
                    p.files.get(p.selected).cloned()
                } else {
                    Some(PathBuf::from(typed))
                };
                self.picker = None;
                match target {
                    Some(path) => self.open(&path),
                    None => self.notice = Some("No CSV selected.".to_string()),
                }
            }
            _ => {}
        }
    }

    /// Ingest a file; the insight request follows on the next loop turn.
    fn open(&mut self, path: &Path) {
        self.notice = None;
        let upload = match picker::validate_csv_path(path) {
            Ok(path) => Upload::from_path(&path),
            Err(err) => {
                self.notice = Some(format!("Error processing file: {err}"));
                return;
            }
        };
        let upload = match upload {
            Ok(upload) => upload,
            Err(err) => {
                self.notice = Some(format!("Error processing file: {err}"));
                return;
            }
        };

        if self.session.ingest(&upload).is_ok() {
            info!(file = %upload.name, "file opened");
            self.table.select(Some(0));
            self.analysis_pending = true;
        }
    }

    fn run_analysis(&mut self) {
        self.analysis_pending = false;
        let service = self.service.as_ref().map(|s| s as &dyn CompletionService);
        self.session.analyze(service);
    }

    fn scroll(&mut self, delta: isize) {
        let Some(len) = self.session.view().map(DisplayView::len).filter(|n| *n > 0) else {
            return;
        };
        let cur = self.table.selected().unwrap_or(0) as isize;
        let next = (cur + delta).clamp(0, len as isize - 1);
        self.table.select(Some(next as usize));
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);

        if self.picker.is_some() {
            self.draw_picker(frame, size);
        }
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = Line::from(vec![
            Span::styled(self.session.symbol().to_string(), Style::default().fg(Color::Cyan)),
            Span::raw(" stock insight"),
        ]);

        let file = self.session.file_name().unwrap_or("-");
        let rows = self.session.records().map(|r| r.len()).unwrap_or(0);
        let span = self
            .session
            .records()
            .and_then(|r| r.date_span())
            .map(|(lo, hi)| format!("{lo} → {hi}"))
            .unwrap_or_else(|| "-".to_string());
        let details = Line::from(Span::styled(
            format!(
                "file: {file} | records: {rows} | span: {span} | view: {}",
                self.session.mode().display_name()
            ),
            Style::default().fg(Color::Gray),
        ));

        let p = Paragraph::new(Text::from(vec![title, details])).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&mut self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);
        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);

        self.draw_table(frame, top[0]);
        self.draw_chart(frame, top[1]);
        self.draw_analysis(frame, rows[1]);
    }

    fn draw_table(&mut self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(view) = self.session.view() else {
            let block = Block::default().title("Records").borders(Borders::ALL);
            let msg = Paragraph::new("Press a (all) or l (last seven) to show records.")
                .style(Style::default().fg(Color::Yellow))
                .block(block);
            frame.render_widget(msg, area);
            return;
        };

        let header = Row::new(view.headers().into_iter().map(|h| {
            Cell::from(Line::from(h).right_aligned())
        }))
        .style(Style::default().add_modifier(Modifier::BOLD));

        let body = view.rows.iter().map(|r| {
            Row::new(r.cells.iter().map(|c| Cell::from(Line::from(c.as_str()).right_aligned())))
        });

        let widths = view.columns.iter().map(|c| match c {
            DisplayColumn::Date => Constraint::Length(10),
            DisplayColumn::Value(_) | DisplayColumn::Extra(_) => Constraint::Min(8),
        });

        let mut title = format!("{} ({} rows)", view.kind.display_name(), view.len());
        if let Some(from) = self.session.view_file_name().filter(|f| Some(*f) != self.session.file_name()) {
            title.push_str(&format!(" from '{from}'"));
        }
        let table = Table::new(body, widths)
            .header(header)
            .block(Block::default().title(title).borders(Borders::ALL))
            .row_highlight_style(Style::default().fg(Color::Black).bg(Color::White));

        frame.render_stateful_widget(table, area, &mut self.table);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Close").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(data) = self.session.chart().and_then(chart_data) else {
            let msg = Paragraph::new("No chart yet.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let widget = PricePlottersChart {
            points: &data.points,
            origin: data.origin,
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_analysis(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let (text, style) = if self.analysis_pending {
            ("Generating insight...", Style::default().fg(Color::Yellow))
        } else {
            let is_error = self.session.analysis().map(|a| a.is_error()).unwrap_or(false);
            let color = if is_error { Color::Red } else { Color::White };
            (self.session.analysis_text(), Style::default().fg(color))
        };

        let p = Paragraph::new(text)
            .style(style)
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Insight").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "a all  l/7 last seven  ↑/↓ scroll  o open  q quit";
        let status = self.notice.as_deref().unwrap_or(self.session.status());
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_picker(&self, frame: &mut ratatui::Frame<'_>, size: Rect) {
        let Some(p) = &self.picker else {
            return;
        };

        let area = centered(size, 70, 60);
        frame.render_widget(Clear, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let input = Paragraph::new(p.input.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().title("Path (Enter open, Esc cancel)").borders(Borders::ALL));
        frame.render_widget(input, chunks[0]);

        let items: Vec<ListItem> = if p.files.is_empty() {
            vec![ListItem::new("No CSV files found; type a path above.")]
        } else {
            p.files.iter().map(|f| ListItem::new(picker::pretty_path(f))).collect()
        };
        let list = List::new(items)
            .block(Block::default().title("CSV files").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        if !p.files.is_empty() {
            state.select(Some(p.selected));
        }
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }
}

/// Plot-ready form of a chart series.
#[derive(Debug, Clone, PartialEq)]
struct ChartData {
    origin: NaiveDate,
    points: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Map a series onto `(days since first point, close)` with padded bounds.
fn chart_data(series: &ChartSeries) -> Option<ChartData> {
    let (origin, last) = series.date_range()?;
    let (lo, hi) = series.close_range()?;

    let points = series
        .points
        .iter()
        .map(|p| ((p.date - origin).num_days() as f64, p.close))
        .collect();

    let span_days = (last - origin).num_days() as f64;
    let x_bounds = if span_days > 0.0 { [0.0, span_days] } else { [-0.5, 0.5] };

    let pad = if hi > lo { (hi - lo) * 0.05 } else { (lo.abs() * 0.05).max(0.5) };
    let y_bounds = [lo - pad, hi + pad];

    Some(ChartData {
        origin,
        points,
        x_bounds,
        y_bounds,
    })
}

/// A rectangle of `pct_x`% × `pct_y`% centered in `area`.
fn centered(area: Rect, pct_x: u16, pct_y: u16) -> Rect {
    // Widened so wide terminals don't overflow u16 before the division.
    let width = (u32::from(area.width) * u32::from(pct_x.min(100)) / 100) as u16;
    let height = (u32::from(area.height) * u32::from(pct_y.min(100)) / 100) as u16;
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChartPoint, InsightConfig, SessionConfig, ViewKind};

    fn app() -> App {
        let config = SessionConfig {
            insight_enabled: false,
            ..SessionConfig::default()
        };
        App::new(Session::new(config, InsightConfig::default()), None)
    }

    fn write_csv(tag: &str, days: u32) -> PathBuf {
        let mut text = String::from("timestamp,open,high,low,close,volume\n");
        for d in 1..=days {
            text.push_str(&format!("2024-03-{d:02},1,2,0.5,{d},100\n"));
        }
        let path = std::env::temp_dir().join(format!("stocks_tui_{tag}_{}.csv", std::process::id()));
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn chart_data_measures_days_from_first_point() {
        let series = ChartSeries {
            points: vec![
                ChartPoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    close: 10.0,
                },
                ChartPoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
                    close: 20.0,
                },
            ],
        };
        let data = chart_data(&series).unwrap();
        assert_eq!(data.points, vec![(0.0, 10.0), (10.0, 20.0)]);
        assert_eq!(data.x_bounds, [0.0, 10.0]);
        assert_eq!(data.y_bounds, [9.5, 20.5]);
        assert!(chart_data(&ChartSeries::default()).is_none());
    }

    #[test]
    fn centered_handles_very_wide_terminals() {
        let area = Rect {
            x: 0,
            y: 0,
            width: 1200,
            height: 400,
        };
        let r = centered(area, 70, 60);
        assert_eq!((r.x, r.y, r.width, r.height), (180, 80, 840, 240));

        let max = Rect {
            x: 0,
            y: 0,
            width: u16::MAX,
            height: u16::MAX,
        };
        let r = centered(max, 70, 60);
        assert_eq!(r.width, 45874);
    }

    #[test]
    fn open_then_toggle_views_with_keys() {
        let path = write_csv("keys", 9);
        let mut app = app();
        app.open(&path);
        let _ = std::fs::remove_file(&path);
        assert!(app.analysis_pending);

        app.run_analysis();
        assert!(!app.analysis_pending);
        assert!(app.session.status().starts_with("Analysis complete for"));

        assert!(!app.handle_key(KeyCode::Char('l')));
        assert_eq!(app.session.mode(), ViewKind::LastSeven);
        assert_eq!(app.session.view().unwrap().len(), 7);

        app.handle_key(KeyCode::Char('a'));
        assert_eq!(app.session.view().unwrap().len(), 9);

        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Down);
        assert_eq!(app.table.selected(), Some(2));

        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn picker_typed_path_errors_surface_as_notice() {
        let mut app = app();
        app.handle_key(KeyCode::Char('o'));
        assert!(app.picker.is_some());

        for c in "missing.csv".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        // Letters go to the path input, not the view toggles.
        assert!(app.session.view().is_none());

        app.handle_key(KeyCode::Enter);
        assert!(app.picker.is_none());
        assert!(app.notice.as_deref().unwrap().starts_with("Error processing file:"));
        assert!(!app.analysis_pending);
    }
}
