//! TUI layout and widget rendering.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, Paragraph};

use super::runtime::App;
use super::style;

/// Renders the full TUI frame.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(10),   // charts
            Constraint::Length(3), // efficiency gauge
            Constraint::Length(5), // status panel
            Constraint::Length(1), // footer
        ])
        .split(frame.area());

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(charts[1]);

    render_header(frame, app, chunks[0]);
    render_power_chart(frame, app, charts[0]);
    render_iv_chart(frame, app, right[0]);
    render_operating_point_chart(frame, app, right[1]);
    render_efficiency_gauge(frame, app, chunks[2]);
    render_status(frame, app, chunks[3]);
    render_footer(frame, chunks[4]);
}

/// Header bar: scenario name, iteration progress, speed, run state.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let (state_icon, state_label) = if app.is_finished() {
        ("■", "DONE")
    } else if app.paused {
        ("‖", "PAUSED")
    } else {
        ("▶", "RUNNING")
    };

    let header = Line::from(vec![
        Span::styled(
            " MPPT-SIM ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            &app.preset_name,
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " │ {} │ k={}/{} │ {}ms │ {} {} ",
            app.mode_name(),
            app.iteration(),
            app.total_steps,
            app.tick_interval_ms(),
            state_icon,
            state_label,
        )),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

fn x_range(data: &[(f64, f64)]) -> [f64; 2] {
    let lo = data.first().map_or(0.0, |p| p.0);
    let hi = data.last().map_or(1.0, |p| p.0).max(lo + 1.0);
    [lo, hi]
}

/// Panel power vs theoretical maximum chart.
fn render_power_chart(frame: &mut Frame, app: &App, area: Rect) {
    let power_data: Vec<(f64, f64)> = app.history.iter().map(|s| (s.time_s, s.power)).collect();
    let max_data: Vec<(f64, f64)> = app
        .history
        .iter()
        .map(|s| (s.time_s, s.max_power))
        .collect();

    let y_bounds = style::auto_bounds_y(&power_data, &max_data);
    let x_bounds = x_range(&power_data);

    let datasets = vec![
        Dataset::default()
            .name("Power")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(style::POWER_COLOR))
            .data(&power_data),
        Dataset::default()
            .name("Max")
            .marker(symbols::Marker::Dot)
            .style(Style::default().fg(style::MAX_POWER_COLOR))
            .data(&max_data),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(" Power vs Theoretical Maximum ")
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("s")
                .bounds(x_bounds)
                .labels(vec![
                    format!("{:.0}", x_bounds[0]),
                    format!("{:.0}", x_bounds[1]),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("W")
                .bounds(y_bounds)
                .labels(vec![
                    format!("{:.1}", y_bounds[0]),
                    format!("{:.1}", y_bounds[1]),
                ]),
        );

    frame.render_widget(chart, area);
}

/// Present I-V curve with the last measurement marked on it.
fn render_iv_chart(frame: &mut Frame, app: &App, area: Rect) {
    let curve = app.iv_curve();
    let marker: Vec<(f64, f64)> = app.operating_marker().into_iter().collect();

    let x_bounds = x_range(&curve);
    let y_bounds = [0.0, style::auto_bounds_y(&curve, &marker)[1]];

    let datasets = vec![
        Dataset::default()
            .name("I-V")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(style::IV_CURVE_COLOR))
            .data(&curve),
        Dataset::default()
            .name("now")
            .marker(symbols::Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(style::MARKER_COLOR))
            .data(&marker),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().title(" I-V Curve ").borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .title("V")
                .bounds(x_bounds)
                .labels(vec![
                    format!("{:.0}", x_bounds[0]),
                    format!("{:.0}", x_bounds[1]),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("A")
                .bounds(y_bounds)
                .labels(vec![
                    format!("{:.1}", y_bounds[0]),
                    format!("{:.1}", y_bounds[1]),
                ]),
        );

    frame.render_widget(chart, area);
}

/// Operating point commanded by the controller over time.
fn render_operating_point_chart(frame: &mut Frame, app: &App, area: Rect) {
    let op_data: Vec<(f64, f64)> = app
        .history
        .iter()
        .map(|s| (s.time_s, s.operating_point))
        .collect();

    let y_bounds = style::auto_bounds_y(&op_data, &[]);
    let x_bounds = x_range(&op_data);

    let datasets = vec![
        Dataset::default()
            .name(app.mode_name())
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(style::OPERATING_POINT_COLOR))
            .data(&op_data),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(" Operating Point ")
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("s")
                .bounds(x_bounds)
                .labels(vec![
                    format!("{:.0}", x_bounds[0]),
                    format!("{:.0}", x_bounds[1]),
                ]),
        )
        .y_axis(
            Axis::default()
                .bounds(y_bounds)
                .labels(vec![
                    format!("{:.2}", y_bounds[0]),
                    format!("{:.2}", y_bounds[1]),
                ]),
        );

    frame.render_widget(chart, area);
}

/// Tracking efficiency gauge with the environment indicator.
fn render_efficiency_gauge(frame: &mut Frame, app: &App, area: Rect) {
    let pct = app.last_sample().map_or(0.0, |s| s.efficiency_pct());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(24)])
        .split(area);

    let gauge = Gauge::default()
        .block(Block::default().title(" Efficiency ").borders(Borders::ALL))
        .gauge_style(Style::default().fg(style::efficiency_color(pct)))
        .ratio((pct / 100.0).clamp(0.0, 1.0))
        .label(format!("{pct:.1}%"));
    frame.render_widget(gauge, chunks[0]);

    let env = app.last_sample().map_or_else(String::new, |s| {
        format!("{:.0} W/m² {:.1}°C", s.irradiance, s.temperature)
    });
    let env_widget = Paragraph::new(Line::from(Span::styled(
        env,
        Style::default()
            .fg(style::ENVIRONMENT_FG)
            .add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(env_widget, chunks[1]);
}

/// Status panel showing the latest measurement and run metrics.
fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let lines = if let Some(s) = app.last_sample() {
        vec![
            Line::from(format!(
                "  V={:>7.3} V  I={:>6.3} A  P={:>8.3} W  max={:>8.3} W",
                s.voltage, s.current, s.power, s.max_power,
            )),
            Line::from(format!(
                "  op={:.4}  t={:.2} s  mean efficiency={:.2}%",
                s.operating_point,
                s.time_s,
                app.mean_efficiency(),
            )),
            Line::from(format!(
                "  environment changes applied={}",
                app.environment_changes(),
            )),
        ]
    } else {
        vec![Line::from("  Waiting for first sample...")]
    };

    let block = Block::default().title(" Status ").borders(Borders::ALL);
    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

/// Footer with keybinding hints.
fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(Span::styled(
        " q:Quit  Space:Pause  +/-:Speed  1-5:Preset  r:Restart",
        Style::default().fg(style::FOOTER_FG),
    )));
    frame.render_widget(footer, area);
}
