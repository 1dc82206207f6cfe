//! Common UI components shared across views.
//!
//! This module contains the header bar, label panel, tab bar, status bar,
//! and help overlay.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};

const PLACEHOLDER: &str = "--";

/// Render the header bar with the window title and thresholds.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let snapshot = &app.snapshot;

    let (icon, icon_style) = if snapshot.source_error.is_some() {
        ("●", Style::default().fg(app.theme.high))
    } else {
        ("●", Style::default().fg(app.theme.low))
    };

    let line = Line::from(vec![
        Span::styled(format!(" {} ", icon), icon_style),
        Span::styled(
            "BLUETOOTH TEMPERATURE ",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
        Span::styled(
            format!("high ≥ {}°C", snapshot.thresholds.high),
            Style::default().fg(app.theme.high),
        ),
        Span::raw("  "),
        Span::styled(
            format!("low ≤ {}°C", snapshot.thresholds.low),
            Style::default().fg(app.theme.low),
        ),
        Span::raw(" │ "),
        Span::styled(
            format!("{}", snapshot.len),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" readings"),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the three labels side by side: current, maximum, minimum.
///
/// Labels that have not been set yet show a placeholder.
pub fn render_labels(frame: &mut Frame, app: &App, area: Rect) {
    let labels = &app.snapshot.labels;
    let columns = Layout::horizontal([
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
    ])
    .split(area);

    let cells = [
        (labels.current.as_deref(), Style::default().add_modifier(Modifier::BOLD)),
        (labels.max.as_deref(), Style::default().fg(app.theme.high)),
        (labels.min.as_deref(), Style::default().fg(app.theme.low)),
    ];

    for ((text, style), column) in cells.into_iter().zip(columns.iter()) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border));
        let paragraph = Paragraph::new(text.unwrap_or(PLACEHOLDER))
            .style(style)
            .block(block);
        frame.render_widget(paragraph, *column);
    }
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = vec![Line::from(" 1:Chart "), Line::from(" 2:Readings ")];

    let selected = match app.current_view {
        View::Chart => 0,
        View::Readings => 1,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// A temporary status message wins over a recent alert, which wins over a
/// source error. Otherwise shows the source, counters and controls.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(alert) = app.recent_alert() {
        let paragraph = Paragraph::new(format!(" ⚠ {}: {} ", alert.title, alert.message))
            .style(Style::default().fg(app.theme.high).add_modifier(Modifier::BOLD));
        frame.render_widget(paragraph, area);
        return;
    }

    let snapshot = &app.snapshot;
    let controls = "r:reset Tab:switch e:export ?:help q:quit";

    let (status, style) = if let Some(ref err) = snapshot.source_error {
        (
            format!(" {} | Error: {} | {}", app.source_description(), err, controls),
            Style::default().fg(app.theme.high),
        )
    } else {
        let updated = app
            .last_refresh
            .map(|t| format!("Updated {:.1}s ago", t.elapsed().as_secs_f64()))
            .unwrap_or_else(|| "Waiting...".to_string());
        (
            format!(
                " {} | {} samples, {} rejected | {} | {}",
                app.source_description(),
                snapshot.total_arrived,
                snapshot.rejected,
                updated,
                controls,
            ),
            Style::default().add_modifier(Modifier::DIM),
        )
    };

    frame.render_widget(Paragraph::new(status).style(style), area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Navigation",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  Tab ←/→     Switch views"),
        Line::from("  1/2         Chart / Readings"),
        Line::from("  ↑/↓ j/k     Select reading"),
        Line::from("  PgUp/PgDn   Jump 10 readings"),
        Line::from("  Home/End    Oldest / follow newest"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  r         Reset chart and extremes"),
        Line::from("  e         Export to JSON"),
        Line::from("  q Esc     Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 19u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{EngineConfig, RecordingAlertSink, SharedEngine};
    use crate::ui::Theme;
    use ratatui::{backend::TestBackend, Terminal};

    fn render_to_string(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                let rows = Layout::vertical([
                    Constraint::Length(1),
                    Constraint::Length(3),
                    Constraint::Length(1),
                ])
                .split(area);
                render_header(frame, app, rows[0]);
                render_labels(frame, app, rows[1]);
                render_status_bar(frame, app, rows[2]);
            })
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_labels_show_placeholder_before_data() {
        let engine = SharedEngine::new(EngineConfig::default());
        let mut app = App::with_theme(engine, RecordingAlertSink::default(), "test", Theme::dark());
        app.refresh();
        let screen = render_to_string(&app, 120, 5);
        assert!(screen.contains("BLUETOOTH TEMPERATURE"));
        assert!(screen.contains(PLACEHOLDER));
        assert!(!screen.contains("Maximum"));
    }

    #[test]
    fn test_labels_show_readings() {
        let engine = SharedEngine::new(EngineConfig::default());
        engine.ingest_line(b"22.5").unwrap();
        let mut app = App::with_theme(engine, RecordingAlertSink::default(), "test", Theme::dark());
        app.refresh();
        let screen = render_to_string(&app, 120, 5);
        assert!(screen.contains("Current temperature: 22.5°C"));
        assert!(screen.contains("Maximum temperature: 22.5°C"));
        assert!(screen.contains("Minimum temperature: 22.5°C"));
    }
}
