//! Chart view: the temperature series as a line, with markers on readings
//! that cross a threshold and the focused reading annotated with its value.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::sample::format_temperature;
use crate::data::{Classification, SeriesPoint};

const TITLE: &str = " Temperature Chart ";
const Y_TITLE: &str = "Temperature (°C)";

/// Render the chart view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let snapshot = &app.snapshot;

    let block = Block::default()
        .title(TITLE)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if snapshot.points.is_empty() {
        let paragraph = Paragraph::new("Waiting for readings...")
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    // The selected reading when browsing, otherwise the newest one
    let focus = if app.follow_latest {
        snapshot.points.last()
    } else {
        snapshot.points.get(app.selected_reading).or(snapshot.points.last())
    };
    let block = match focus {
        Some(point) => block.title_top(
            Line::from(annotation(point))
                .right_aligned()
                .style(app.theme.class_style(point.class)),
        ),
        None => block,
    };
    let focus_point: Vec<(f64, f64)> = focus.map(|p| (p.x, p.value)).into_iter().collect();

    let line: Vec<(f64, f64)> = snapshot.points.iter().map(|p| (p.x, p.value)).collect();
    let high = markers(&snapshot.points, Classification::High);
    let low = markers(&snapshot.points, Classification::Low);

    let mut datasets = vec![Dataset::default()
        .name("Temperature")
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(app.theme.line))
        .data(&line)];
    if !high.is_empty() {
        datasets.push(
            Dataset::default()
                .name("High")
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(app.theme.high))
                .data(&high),
        );
    }
    if !low.is_empty() {
        datasets.push(
            Dataset::default()
                .name("Low")
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(app.theme.low))
                .data(&low),
        );
    }

    datasets.push(
        Dataset::default()
            .marker(Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(app.theme.highlight))
            .data(&focus_point),
    );

    let (x_min, x_max) = x_bounds(&snapshot.points);
    let (y_min, y_max) = y_bounds(&snapshot.points);

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title(snapshot.axis.label.as_str())
                .style(Style::default().fg(app.theme.border))
                .bounds([x_min, x_max])
                .labels(vec![
                    Span::raw(format!("{:.1}", x_min)),
                    Span::raw(format!("{:.1}", (x_min + x_max) / 2.0)),
                    Span::raw(format!("{:.1}", x_max)),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(Y_TITLE)
                .style(Style::default().fg(app.theme.border))
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{:.1}", y_min)),
                    Span::raw(format!("{:.1}", (y_min + y_max) / 2.0)),
                    Span::raw(format!("{:.1}", y_max)),
                ]),
        );

    frame.render_widget(chart, area);
}

/// Value annotation for one point, e.g. " 36.0°C HIGH @ 1.2 ".
fn annotation(point: &SeriesPoint) -> String {
    format!(
        " {}°C {} @ {:.1} ",
        format_temperature(point.value),
        point.class.label(),
        point.x
    )
}

fn markers(points: &[SeriesPoint], class: Classification) -> Vec<(f64, f64)> {
    points
        .iter()
        .filter(|p| p.class == class)
        .map(|p| (p.x, p.value))
        .collect()
}

/// Horizontal bounds; a single point still gets a non-empty range.
fn x_bounds(points: &[SeriesPoint]) -> (f64, f64) {
    let first = points.first().map_or(0.0, |p| p.x);
    let last = points.last().map_or(0.0, |p| p.x);
    if last > first {
        (first, last)
    } else {
        (first, first + 1.0)
    }
}

/// Vertical bounds padded by a tenth of the spread, or one degree when flat.
fn y_bounds(points: &[SeriesPoint]) -> (f64, f64) {
    let (min, max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.value), hi.max(p.value))
        });
    let pad = ((max - min) * 0.1).max(1.0);
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{EngineConfig, RecordingAlertSink, SharedEngine};
    use crate::ui::Theme;
    use ratatui::{backend::TestBackend, Terminal};

    fn point(index: u64, value: f64, class: Classification) -> SeriesPoint {
        SeriesPoint {
            index,
            x: index as f64 / 10.0,
            value,
            class,
        }
    }

    #[test]
    fn test_bounds() {
        let points = vec![
            point(0, 20.0, Classification::Low),
            point(5, 30.0, Classification::Normal),
            point(10, 40.0, Classification::High),
        ];
        assert_eq!(x_bounds(&points), (0.0, 1.0));
        assert_eq!(y_bounds(&points), (18.0, 42.0));

        let single = vec![point(3, 30.0, Classification::Normal)];
        let (lo, hi) = x_bounds(&single);
        assert!(hi > lo);
        assert_eq!(y_bounds(&single), (29.0, 31.0));
    }

    #[test]
    fn test_markers_split_by_class() {
        let points = vec![
            point(0, 20.0, Classification::Low),
            point(1, 30.0, Classification::Normal),
            point(2, 36.0, Classification::High),
            point(3, 24.0, Classification::Low),
        ];
        assert_eq!(markers(&points, Classification::High), vec![(0.2, 36.0)]);
        assert_eq!(markers(&points, Classification::Low).len(), 2);
    }

    #[test]
    fn test_annotation() {
        assert_eq!(annotation(&point(12, 36.0, Classification::High)), " 36.0°C HIGH @ 1.2 ");
        assert_eq!(annotation(&point(3, 24.5, Classification::Low)), " 24.5°C LOW @ 0.3 ");
    }

    #[test]
    fn test_render_empty_and_populated() {
        let engine = SharedEngine::new(EngineConfig::default());
        let mut app = App::with_theme(engine.clone(), RecordingAlertSink::default(), "test", Theme::dark());
        app.refresh();

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| render(frame, &app, frame.area())).unwrap();
        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(screen.contains("Waiting for readings"));

        for line in ["20", "30", "36"] {
            engine.ingest_line(line.as_bytes()).unwrap();
        }
        app.refresh();
        terminal.draw(|frame| render(frame, &app, frame.area())).unwrap();
        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(screen.contains("Temperature Chart"));
        assert!(!screen.contains("Waiting for readings"));
        assert!(screen.contains("36.0°C HIGH"));

        app.select_first();
        terminal.draw(|frame| render(frame, &app, frame.area())).unwrap();
        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(screen.contains("20.0°C LOW"));
    }
}
