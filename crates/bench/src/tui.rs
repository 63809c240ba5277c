use framepace::PacerStats;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};

use crate::display::SyncMode;

pub struct Dashboard<'a> {
    pub stats: &'a PacerStats,
    pub scene: &'a str,
    pub scene_status: Option<String>,
    pub sync: SyncMode,
    pub rects: usize,
    pub presented: u64,
    pub torn: u64,
}

pub fn render(frame: &mut Frame, dashboard: &Dashboard) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Min(0),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], dashboard);
    render_budget(frame, chunks[1], dashboard.stats);
    render_timing(frame, chunks[2], dashboard.stats);
    render_sync(frame, chunks[3], dashboard);
    render_help(frame, chunks[4]);
}

fn render_header(frame: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let stats = dashboard.stats;
    let title = format!(" framepace - {} ", dashboard.scene);

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let mut text = format!(
        "Policy: {}  |  Mitigation: {}  |  Sync: {}  |  {} Hz updates",
        stats.policy, stats.mitigation, dashboard.sync, stats.update_rate
    );
    if let Some(status) = &dashboard.scene_status {
        text.push_str("  |  ");
        text.push_str(status);
    }

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(paragraph, area);
}

fn render_budget(frame: &mut Frame, area: Rect, stats: &PacerStats) {
    let block = Block::default()
        .title(" Frame budget ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let (ratio, label) = match stats.refresh_period_us {
        Some(period) => {
            let busy = stats.update_cost_avg_us + stats.draw_cost_avg_us;
            (
                busy as f64 / period as f64,
                format!("{} / {}", format_micros(busy), format_micros(period)),
            )
        }
        None => (0.0, "no deadline".to_string()),
    };
    let color = if ratio > 0.9 { Color::Red } else { Color::Green };

    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(color))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(label);

    frame.render_widget(gauge, area);
}

fn render_timing(frame: &mut Frame, area: Rect, stats: &PacerStats) {
    let block = Block::default()
        .title(" Timing ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let lines = vec![
        stat_line("Frame rate: ", format!("{:.1} fps", stats.frame_rate)),
        stat_line("Iteration: ", format_micros(stats.average_iteration_us)),
        stat_line(
            "Update: ",
            format!(
                "{} avg / {} max",
                format_micros(stats.update_cost_avg_us),
                format_micros(stats.update_cost_max_us)
            ),
        ),
        stat_line(
            "Draw: ",
            format!(
                "{} avg / {} max",
                format_micros(stats.draw_cost_avg_us),
                format_micros(stats.draw_cost_max_us)
            ),
        ),
        stat_line(
            "Steps: ",
            format!(
                "{} committed{}",
                stats.last.steps.committed,
                if stats.last.steps.extrapolated { " + preview" } else { "" }
            ),
        ),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_sync(frame: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let stats = dashboard.stats;
    let block = Block::default()
        .title(" Sync ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let missed_style = Style::default().fg(if stats.last.missed {
        Color::Red
    } else {
        Color::White
    });

    let lines = vec![
        stat_line(
            "Refresh: ",
            stats
                .refresh_period_us
                .map(format_micros)
                .unwrap_or_else(|| "free running".to_string()),
        ),
        stat_line(
            "Slack: ",
            format!(
                "{} min / {} predicted wait",
                format_micros(stats.min_slack_us),
                format_micros(stats.predicted_wait_us)
            ),
        ),
        stat_line("Frame delay: ", format_micros(stats.last.frame_delay)),
        Line::from(vec![
            Span::styled("Missed: ", Style::default().fg(Color::Gray)),
            Span::styled(stats.missed_frames.to_string(), missed_style),
        ]),
        stat_line(
            "Presented: ",
            format!(
                "{} ({} torn), {} rects per frame",
                dashboard.presented, dashboard.torn, dashboard.rects
            ),
        ),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = Paragraph::new(
        "'p' policy  |  'm' mitigation  |  'v' sync mode  |  'r' reset scene  |  'q' or ESC quit",
    )
    .block(block)
    .style(
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    );

    frame.render_widget(text, area);
}

fn stat_line(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

fn format_micros(micros: i64) -> String {
    if micros.abs() < 1_000 {
        format!("{}µs", micros)
    } else {
        format!("{:.2}ms", micros as f64 / 1_000.0)
    }
}
