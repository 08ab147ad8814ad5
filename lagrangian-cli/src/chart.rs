//! Four-panel terminal chart of a completed run.
//!
//! Panels, top to bottom:
//! - Close price with its moving average and buy markers
//! - Velocity with the velocity threshold
//! - Kinetic and potential energy
//! - Lagrangian with the Lagrangian threshold
//!
//! The x axis is the row index; undefined values are left out of each series
//! rather than plotted as zero.

use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Style,
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget},
    Terminal,
};
use tracing::info;

use lagrangian_core::config::{RunConfig, VelocityRule};
use lagrangian_core::output::Presenter;
use lagrangian_core::{Error, IndicatorRow, Signal};

use crate::theme::Theme;

type Series = Vec<(f64, f64)>;

/// Collect `(index, value)` pairs for the rows where `value` is defined.
pub fn series(rows: &[IndicatorRow], value: impl Fn(&IndicatorRow) -> Option<f64>) -> Series {
    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| value(row).filter(|v| v.is_finite()).map(|v| (i as f64, v)))
        .collect()
}

/// Buy markers positioned at their row index and close.
pub fn signal_points(rows: &[IndicatorRow], signals: &[Signal]) -> Series {
    signals
        .iter()
        .filter_map(|s| {
            rows.binary_search_by_key(&s.timestamp, |r| r.timestamp)
                .ok()
                .map(|i| (i as f64, s.close))
        })
        .collect()
}

fn horizontal(level: f64, x_max: f64) -> Series {
    vec![(0.0, level), (x_max, level)]
}

/// Padded y bounds over every point of every series.
fn y_bounds(sets: &[&Series]) -> [f64; 2] {
    let (lo, hi) = sets
        .iter()
        .flat_map(|s| s.iter().map(|&(_, y)| y))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    let range = hi - lo;
    let pad = if range > 0.0 {
        range * 0.05
    } else {
        lo.abs().max(1.0) * 0.05
    };
    [lo - pad, hi + pad]
}

fn line<'a>(name: &'a str, data: &'a Series, style: Style) -> Dataset<'a> {
    Dataset::default()
        .name(name)
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(style)
        .data(data)
}

/// Widget drawing the full four-panel view.
pub struct LagrangianChart<'a> {
    rows: &'a [IndicatorRow],
    signals: &'a [Signal],
    config: &'a RunConfig,
    theme: &'a Theme,
}

impl<'a> LagrangianChart<'a> {
    pub fn new(
        rows: &'a [IndicatorRow],
        signals: &'a [Signal],
        config: &'a RunConfig,
        theme: &'a Theme,
    ) -> Self {
        Self {
            rows,
            signals,
            config,
            theme,
        }
    }

    fn x_labels(&self) -> Vec<Span<'static>> {
        let fmt = |row: Option<&IndicatorRow>| {
            row.map(|r| r.timestamp.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        };
        vec![
            Span::raw(fmt(self.rows.first())),
            Span::raw(fmt(self.rows.get(self.rows.len() / 2))),
            Span::raw(fmt(self.rows.last())),
        ]
    }

    fn header(&self) -> Line<'static> {
        let mut spans = vec![
            Span::styled(format!(" {} ", self.config.symbol), self.theme.title()),
            Span::styled(
                format!(
                    "{} rows | {} signals | window {} ",
                    self.rows.len(),
                    self.signals.len(),
                    self.config.window
                ),
                Style::default().fg(self.theme.text_secondary),
            ),
        ];
        if let Some(l) = self.rows.iter().rev().find_map(|r| r.lagrangian) {
            spans.push(Span::styled(
                format!("| last L {l:.6} "),
                Style::default().fg(self
                    .theme
                    .lagrangian_color(l, self.config.lagrangian_threshold)),
            ));
        }
        spans.push(Span::styled(
            "| q/Esc to close",
            Style::default().fg(self.theme.muted),
        ));
        Line::from(spans)
    }

    fn panel<'d>(
        &self,
        title: &'d str,
        datasets: Vec<Dataset<'d>>,
        bounds: [f64; 2],
        x_max: f64,
    ) -> Chart<'d> {
        let y_labels = vec![
            Span::raw(format!("{:.4}", bounds[0])),
            Span::raw(format!("{:.4}", (bounds[0] + bounds[1]) / 2.0)),
            Span::raw(format!("{:.4}", bounds[1])),
        ];
        Chart::new(datasets)
            .block(
                Block::default()
                    .title(Span::styled(title, self.theme.title()))
                    .borders(Borders::ALL)
                    .border_style(self.theme.panel_border())
                    .style(Style::default().bg(self.theme.background)),
            )
            .x_axis(
                Axis::default()
                    .style(self.theme.axis())
                    .bounds([0.0, x_max])
                    .labels(self.x_labels()),
            )
            .y_axis(
                Axis::default()
                    .style(self.theme.axis())
                    .bounds(bounds)
                    .labels(y_labels),
            )
    }
}

impl Widget for LagrangianChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let x_max = self.rows.len().saturating_sub(1).max(1) as f64;

        let price = series(self.rows, |r| Some(r.close));
        let mean = series(self.rows, |r| r.rolling_mean);
        let markers = signal_points(self.rows, self.signals);
        let velocity = series(self.rows, |r| r.velocity);
        let kinetic = series(self.rows, |r| r.kinetic_energy);
        let potential = series(self.rows, |r| r.potential_energy);
        let lagrangian = series(self.rows, |r| r.lagrangian);

        let vt = self.config.velocity_threshold;
        let upper_vt = horizontal(vt, x_max);
        let lower_vt = horizontal(-vt, x_max);
        let lt = horizontal(self.config.lagrangian_threshold, x_max);
        let show_lower_vt = self.config.signal.direction == VelocityRule::Absolute;

        let [header, p1, p2, p3, p4] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Fill(1),
        ])
        .areas(area);

        Paragraph::new(self.header())
            .style(Style::default().bg(theme.background))
            .render(header, buf);

        let price_chart = self.panel(
            "Price",
            vec![
                line("Close", &price, Style::default().fg(theme.accent)),
                line("Moving average", &mean, Style::default().fg(theme.muted)),
                Dataset::default()
                    .name("Buy signal")
                    .marker(symbols::Marker::Dot)
                    .graph_type(GraphType::Scatter)
                    .style(Style::default().fg(theme.positive))
                    .data(&markers),
            ],
            y_bounds(&[&price, &mean]),
            x_max,
        );
        price_chart.render(p1, buf);

        let mut velocity_sets = vec![
            line("Velocity", &velocity, Style::default().fg(theme.neutral)),
            line("Threshold", &upper_vt, theme.threshold()),
        ];
        let velocity_bounds = if show_lower_vt {
            velocity_sets.push(
                Dataset::default()
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(theme.threshold())
                    .data(&lower_vt),
            );
            y_bounds(&[&velocity, &upper_vt, &lower_vt])
        } else {
            y_bounds(&[&velocity, &upper_vt])
        };
        self.panel("Velocity", velocity_sets, velocity_bounds, x_max)
            .render(p2, buf);

        self.panel(
            "Energy",
            vec![
                line("Kinetic", &kinetic, Style::default().fg(theme.positive)),
                line("Potential", &potential, Style::default().fg(theme.negative)),
            ],
            y_bounds(&[&kinetic, &potential]),
            x_max,
        )
        .render(p3, buf);

        self.panel(
            "Lagrangian",
            vec![
                line("L = KE - PE", &lagrangian, Style::default().fg(theme.neutral)),
                line("Threshold", &lt, theme.threshold()),
            ],
            y_bounds(&[&lagrangian, &lt]),
            x_max,
        )
        .render(p4, buf);
    }
}

/// Interactive full-screen presenter. Blocks until the user presses `q` or `Esc`.
#[derive(Debug)]
pub struct ChartView {
    theme: Theme,
}

impl ChartView {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }
}

impl Presenter for ChartView {
    fn render(
        &mut self,
        rows: &[IndicatorRow],
        signals: &[Signal],
        config: &RunConfig,
    ) -> lagrangian_core::Result<()> {
        if !io::stdout().is_terminal() {
            info!("stdout is not a terminal; skipping chart");
            return Ok(());
        }
        show(rows, signals, config, &self.theme).map_err(Error::Render)
    }
}

fn show(
    rows: &[IndicatorRow],
    signals: &[Signal],
    config: &RunConfig,
    theme: &Theme,
) -> io::Result<()> {
    with_panic_cleanup(restore_terminal, || {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;

        let result = event_loop(&mut terminal, rows, signals, config, theme);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    })
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stderr(), LeaveAlternateScreen);
}

/// Run `body` with a panic hook that calls `cleanup` before the previous
/// hook prints the panic. The previous hook is reinstated once `body` returns.
fn with_panic_cleanup<T>(cleanup: fn(), body: impl FnOnce() -> T) -> T {
    let previous = Arc::new(std::panic::take_hook());
    let chained = Arc::clone(&previous);
    std::panic::set_hook(Box::new(move |panic_info| {
        cleanup();
        (*chained)(panic_info);
    }));

    let out = body();

    // Dropping our hook releases its handle on `previous`.
    drop(std::panic::take_hook());
    match Arc::try_unwrap(previous) {
        Ok(hook) => std::panic::set_hook(hook),
        Err(shared) => std::panic::set_hook(Box::new(move |panic_info| (*shared)(panic_info))),
    }
    out
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    rows: &[IndicatorRow],
    signals: &[Signal],
    config: &RunConfig,
    theme: &Theme,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| {
            f.render_widget(LagrangianChart::new(rows, signals, config, theme), f.area())
        })?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                {
                    return Ok(());
                }
            }
        }
    }
}
