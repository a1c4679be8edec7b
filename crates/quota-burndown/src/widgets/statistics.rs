use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::AppState;

pub struct StatisticsWidget;

impl StatisticsWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let observed_days = state
            .history
            .values()
            .filter(|record| record.is_observed())
            .count();

        let mut stats_text = vec![Line::from(vec![
            Span::styled("Data Status: ", Style::default().fg(Color::White)),
            Span::styled(
                if state.data_loaded {
                    format!(
                        "Loaded ({} days, {} observed)",
                        state.history.len(),
                        observed_days
                    )
                } else if state.is_loading {
                    "Loading...".to_string()
                } else {
                    "No data".to_string()
                },
                Style::default()
                    .fg(if state.data_loaded {
                        Color::Green
                    } else {
                        Color::Red
                    })
                    .add_modifier(Modifier::BOLD),
            ),
        ])];

        if let Some(summary) = &state.summary {
            stats_text.push(Line::from(vec![
                Span::styled("Used: ", Style::default().fg(Color::White)),
                Span::styled(
                    format!("{:.2}", summary.actual()),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" / {:.2}", summary.target()),
                    Style::default().fg(Color::Gray),
                ),
            ]));
            stats_text.push(Line::from(vec![
                Span::styled("Planned by today: ", Style::default().fg(Color::White)),
                Span::styled(
                    format!("{:.2}", summary.planned_today()),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
            ]));
        }

        if let Some(error) = &state.error_message {
            stats_text.push(Line::from(vec![
                Span::styled("Error: ", Style::default().fg(Color::Red)),
                Span::styled(
                    error.chars().take(60).collect::<String>()
                        + if error.chars().count() > 60 { "..." } else { "" },
                    Style::default().fg(Color::Red),
                ),
            ]));
        } else {
            stats_text.push(Line::from(vec![
                Span::styled("Last Refresh: ", Style::default().fg(Color::White)),
                Span::styled(
                    state.last_update.format("%H:%M:%S UTC").to_string(),
                    Style::default().fg(Color::Cyan),
                ),
            ]));
        }

        let stats = Paragraph::new(stats_text)
            .block(Block::bordered().title("Statistics"))
            .alignment(Alignment::Left);

        frame.render_widget(stats, area);
    }
}
