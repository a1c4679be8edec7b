use chrono::Datelike;
use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Cell, Clear, Row, Table},
    Frame,
};

use super::popup::centered_rect;
use crate::AppState;

/// Day-by-day planned and actual values for the viewed month.
pub struct HistoryPopupWidget;

impl HistoryPopupWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let popup_area = centered_rect(70, 85, area);

        frame.render_widget(Clear, popup_area);

        let header = Row::new(["Date", "Planned", "Actual", "Delta"]).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

        let rows = state.history.iter().map(|(date, record)| {
            let weekend = date.weekday().number_from_monday() > 5;
            let date_style = if weekend {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };

            let (actual, delta) = if record.is_observed() {
                let delta = record.actual - record.planned;
                (
                    Cell::from(format!("{:.2}", record.actual)),
                    Cell::from(format!("{:+.2}", delta)).style(Style::default().fg(
                        if delta > 0.0 {
                            Color::Red
                        } else {
                            Color::Green
                        },
                    )),
                )
            } else {
                (Cell::from("-"), Cell::from(""))
            };

            Row::new(vec![
                Cell::from(date.format("%a %m-%d").to_string()).style(date_style),
                Cell::from(format!("{:.2}", record.planned)),
                actual,
                delta,
            ])
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(10),
                Constraint::Length(10),
                Constraint::Length(10),
                Constraint::Length(10),
            ],
        )
        .header(header)
        .block(
            Block::bordered()
                .title(format!("Daily History {} (h to close)", state.month))
                .title_alignment(Alignment::Center)
                .style(Style::default().fg(Color::Cyan)),
        );

        frame.render_widget(table, popup_area);
    }
}
