//! Readings view rendering.
//!
//! Lists every retained reading with its arrival index, time coordinate,
//! value and threshold classification.

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::sample::format_temperature;

/// Render the Readings view as a table, oldest first.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let snapshot = &app.snapshot;

    let header = Row::new(vec![
        Cell::from("#"),
        Cell::from(snapshot.axis.label.clone()),
        Cell::from("Temperature"),
        Cell::from("Class"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = snapshot
        .points
        .iter()
        .map(|p| {
            Row::new(vec![
                Cell::from(p.index.to_string()),
                Cell::from(format!("{:.2}", p.x)),
                Cell::from(format!("{}°C", format_temperature(p.value))),
                Cell::from(p.class.symbol()).style(app.theme.class_style(p.class)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(6),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Min(10),
    ];

    let selected = app.selected_reading.min(snapshot.points.len().saturating_sub(1));

    let position_info = if !snapshot.points.is_empty() {
        format!(" [{}/{}]", selected + 1, snapshot.points.len())
    } else {
        String::new()
    };
    let follow = if app.follow_latest { " [following]" } else { "" };
    let title = format!(" Readings ({}){}{} ", snapshot.len, position_info, follow);

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !snapshot.points.is_empty() {
        state.select(Some(selected));
    }

    frame.render_stateful_widget(table, area, &mut state);
}
