use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Wrap};

use chargewatch_core::types::{MonitorState, MonitorStatus};

use crate::tui::{App, Permission};

// Stand-in for the bundled image resource.
const BATTERY_ART: &[&str] = &[
    "  ┌────────────┐  ",
    "  │ ▓▓▓▓▓▓▓▓▓  │█ ",
    "  │ ▓▓▓▓▓▓▓▓▓  │█ ",
    "  └────────────┘  ",
];

pub fn draw(f: &mut Frame, app: &App) {
    let banner_h = if app.banner.is_some() { 4 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(banner_h),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(f.area());

    draw_status(f, app, chunks[0]);
    if banner_h > 0 {
        draw_banner(f, app, chunks[1]);
    }

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);
    draw_battery(f, app, body[0]);
    draw_specs(f, app, body[1]);
    draw_footer(f, app, chunks[3]);
}

fn status_text(status: &MonitorStatus) -> String {
    let level = status
        .latest_level
        .map_or_else(|| "--".to_owned(), |l| format!("{l}%"));
    let baseline = status
        .baseline
        .map_or_else(|| "--".to_owned(), |l| format!("{l}%"));
    format!(
        " {}  |  {} {}  |  baseline {}  |  confirmed {}",
        status.state, status.latest_status, level, baseline, status.confirmations
    )
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let color = match app.status.state {
        MonitorState::Idle => Color::DarkGray,
        MonitorState::ChargingPending => Color::Yellow,
        MonitorState::ConfirmedFake => Color::Red,
    };
    let mut spans = vec![Span::styled(status_text(&app.status), Style::default().fg(color))];
    if let Some(clip) = &app.cue {
        spans.push(Span::styled(format!("  ♪ {clip}"), Style::default().fg(Color::Magenta)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_banner(f: &mut Frame, app: &App, area: Rect) {
    let Some(n) = &app.banner else { return };
    let lines = vec![
        Line::from(Span::styled(n.title.as_str(), Style::default().bold())),
        Line::from(Span::raw(n.body.as_str())),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", n.channel_id))
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_battery(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" battery ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    match (&app.reading, app.image_visible) {
        (Some(reading), true) => {
            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(Color::Green))
                .percent(u16::from(reading.level_pct))
                .label(format!("Battery Level: {}%", reading.level_pct));
            f.render_widget(gauge, rows[0]);

            let mut art: Vec<Line> = BATTERY_ART.iter().map(|l| Line::from(*l)).collect();
            art.push(Line::from(Span::styled(
                reading.image.as_str(),
                Style::default().dim(),
            )));
            f.render_widget(Paragraph::new(art), rows[2]);
        }
        _ => {
            let hint = match app.sim {
                Some(sim) => format!(
                    "simulated: {}% {}",
                    sim.level,
                    if sim.plugged { "plugged" } else { "unplugged" }
                ),
                None => "watching battery".to_owned(),
            };
            f.render_widget(
                Paragraph::new(Line::from(Span::styled(hint, Style::default().dim()))),
                rows[0],
            );
        }
    }
}

fn draw_specs(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" specifications ");
    let lines: Vec<Line> = app
        .reel
        .revealed()
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = app
        .toasts
        .iter()
        .rev()
        .take(2)
        .map(|(t, _)| {
            Line::from(Span::styled(
                t.content.as_str(),
                Style::default().add_modifier(Modifier::REVERSED),
            ))
        })
        .collect();
    lines.reverse();

    let help = match (app.permission, app.sim.is_some()) {
        (Permission::Asking, _) => "allow notifications? y / n",
        (_, true) => "c plug  u unplug  +/- level  o open  q quit",
        (_, false) => "o open notification  q quit",
    };
    lines.push(Line::from(Span::styled(help, Style::default().fg(Color::DarkGray))));
    f.render_widget(Paragraph::new(lines), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chargewatch_core::types::ChargeStatus;

    #[test]
    fn status_text_shows_placeholders_before_first_sample() {
        let text = status_text(&MonitorStatus::default());
        assert!(text.contains("baseline --"));
        assert!(text.contains("confirmed 0"));
    }

    #[test]
    fn status_text_shows_levels() {
        let status = MonitorStatus {
            state: MonitorState::ChargingPending,
            baseline: Some(40),
            latest_level: Some(41),
            latest_status: ChargeStatus::Charging,
            confirmations: 2,
        };
        let text = status_text(&status);
        assert!(text.contains("41%"));
        assert!(text.contains("baseline 40%"));
        assert!(text.contains("confirmed 2"));
    }
}
