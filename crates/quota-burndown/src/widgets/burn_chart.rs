use chrono::Datelike;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::AppState;

/// Cumulative planned curve against observed usage, by day of month.
pub struct BurnChartWidget;

impl BurnChartWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let block = Block::bordered().title("Planned vs Actual");

        let points = state.monitor.calculator().burn_points(&state.history);
        if points.is_empty() {
            let empty = Paragraph::new(Span::styled(
                "Nothing to chart yet",
                Style::default().fg(Color::Gray),
            ))
            .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let planned: Vec<(f64, f64)> = points
            .iter()
            .map(|(date, planned, _)| (date.day() as f64, *planned))
            .collect();
        let actual: Vec<(f64, f64)> = points
            .iter()
            .filter_map(|(date, _, actual)| actual.map(|a| (date.day() as f64, a)))
            .collect();

        let last_day = state.month.last_day().day() as f64;
        let y_max = points
            .iter()
            .map(|(_, planned, actual)| planned.max(actual.unwrap_or(0.0)))
            .fold(1.0, f64::max)
            * 1.1;

        let datasets = vec![
            Dataset::default()
                .name("Planned")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Cyan))
                .data(&planned),
            Dataset::default()
                .name("Actual")
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Yellow))
                .data(&actual),
        ];

        let x_labels = vec![
            "1".to_string(),
            format!("{}", (last_day / 2.0).round()),
            format!("{}", last_day),
        ];
        let y_labels = vec![
            "0".to_string(),
            format!("{:.0}", y_max / 2.0),
            format!("{:.0}", y_max),
        ];

        let chart = Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .title("Day")
                    .style(Style::default().fg(Color::Gray))
                    .bounds([1.0, last_day])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .style(Style::default().fg(Color::Gray))
                    .bounds([0.0, y_max])
                    .labels(y_labels),
            );

        frame.render_widget(chart, area);
    }
}
