use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::AppState;

pub struct PredictionsWidget;

impl PredictionsWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let predictions_text = match &state.summary {
            Some(summary) if summary.observed().is_some() => {
                let mut lines = Vec::new();

                if let Some(variance) = summary.variance() {
                    let (label, color) = if variance > 0.0 {
                        (format!("{:.2} ahead of plan", variance), Color::Red)
                    } else if variance < 0.0 {
                        (format!("{:.2} under plan", -variance), Color::Green)
                    } else {
                        ("On plan".to_string(), Color::Green)
                    };
                    lines.push(Line::from(vec![
                        Span::styled("Pace: ", Style::default().fg(Color::White)),
                        Span::styled(
                            label,
                            Style::default().fg(color).add_modifier(Modifier::BOLD),
                        ),
                    ]));
                }

                let projection = summary.projected_month_end();
                lines.push(Line::from(vec![
                    Span::styled("Projected month end: ", Style::default().fg(Color::White)),
                    Span::styled(
                        projection
                            .map(|p| format!("{:.2}", p))
                            .unwrap_or_else(|| "N/A".to_string()),
                        Style::default()
                            .fg(match projection {
                                Some(p) if p > summary.target() => Color::Red,
                                Some(_) => Color::Green,
                                None => Color::Gray,
                            })
                            .add_modifier(Modifier::BOLD),
                    ),
                ]));

                lines.push(Line::from(vec![
                    Span::styled("Recent daily usage: ", Style::default().fg(Color::White)),
                    Span::styled(
                        summary
                            .recent_daily_usage()
                            .map(|d| format!("{:.2}/day", d))
                            .unwrap_or_else(|| "N/A".to_string()),
                        Style::default()
                            .fg(Color::Blue)
                            .add_modifier(Modifier::BOLD),
                    ),
                ]));

                lines.push(Line::from(vec![
                    Span::styled("Remaining: ", Style::default().fg(Color::White)),
                    Span::styled(
                        format!("{:.2}", summary.remaining()),
                        Style::default()
                            .fg(if summary.remaining() < 0.0 {
                                Color::Red
                            } else {
                                Color::Cyan
                            })
                            .add_modifier(Modifier::BOLD),
                    ),
                ]));

                lines
            }
            _ => Self::render_no_data_text(state),
        };

        let predictions = Paragraph::new(predictions_text)
            .block(Block::bordered().title("Predictions"))
            .alignment(Alignment::Left);

        frame.render_widget(predictions, area);
    }

    fn render_no_data_text(state: &AppState) -> Vec<Line<'static>> {
        vec![
            Line::from(vec![Span::styled(
                if state.data_loaded {
                    "No actual usage recorded this month"
                } else {
                    "No history for this month"
                },
                Style::default().fg(Color::Red),
            )]),
            Line::from(vec![Span::styled(
                "Run `quota-burndown update` with GITHUB_TOKEN set to record usage",
                Style::default().fg(Color::Gray),
            )]),
        ]
    }
}
