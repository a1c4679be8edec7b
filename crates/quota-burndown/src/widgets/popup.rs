use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
    Frame,
};

use crate::AppState;

/// Breakdown of the latest observed total by model.
pub struct PopupWidget;

impl PopupWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let popup_area = centered_rect(60, 70, area);

        frame.render_widget(Clear, popup_area);

        let breakdown_text = Self::create_model_breakdown_text(state);

        let popup = Paragraph::new(breakdown_text)
            .block(
                Block::bordered()
                    .title("Model Breakdown")
                    .title_alignment(Alignment::Center)
                    .style(Style::default().fg(Color::Cyan)),
            )
            .alignment(Alignment::Left);

        frame.render_widget(popup, popup_area);
    }

    fn create_model_breakdown_text(state: &AppState) -> Vec<Line<'static>> {
        let Some(observed) = state.summary.as_ref().and_then(|s| s.observed()) else {
            return vec![
                Line::from(vec![Span::styled(
                    "No usage observed this month",
                    Style::default().fg(Color::Red),
                )]),
                Line::from(" "),
                Self::close_hint(),
            ];
        };

        let mut breakdown_text = vec![
            Line::from(vec![
                Span::styled("As of: ", Style::default().fg(Color::White)),
                Span::styled(
                    observed.date.format("%Y-%m-%d").to_string(),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("Total: ", Style::default().fg(Color::White)),
                Span::styled(
                    format!("{:.2}", observed.actual),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(" "),
        ];

        // Largest consumers first.
        let mut models: Vec<_> = observed.models.iter().collect();
        models.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (model, amount) in models {
            let share = if observed.actual > 0.0 {
                amount / observed.actual * 100.0
            } else {
                0.0
            };
            breakdown_text.push(Line::from(vec![
                Span::styled("  ", Style::default()),
                Span::styled(
                    format!("{}: {:.2} ({:.1}%)", model, amount, share),
                    Style::default().fg(Color::White),
                ),
            ]));
        }

        breakdown_text.extend(vec![Line::from(" "), Self::close_hint()]);
        breakdown_text
    }

    fn close_hint() -> Line<'static> {
        Line::from(vec![
            Span::styled("Press ", Style::default().fg(Color::Gray)),
            Span::styled(
                "m",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" to close", Style::default().fg(Color::Gray)),
        ])
    }
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
