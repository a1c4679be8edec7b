use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Gauge},
    Frame,
};

use crate::AppState;

pub struct ProgressBarsWidget;

impl ProgressBarsWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let usage_percentage = state.get_usage_percentage();
        let planned_percentage = state.get_planned_percentage();
        let quota_gauge = Gauge::default()
            .block(Block::bordered().title("Quota Used"))
            .gauge_style(if usage_percentage > 100.0 {
                Style::default().fg(Color::Red)
            } else if usage_percentage > planned_percentage {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Green)
            })
            .percent(usage_percentage.clamp(0.0, 100.0) as u16)
            .label(format!(
                "{:.1}% (plan {:.1}%)",
                usage_percentage, planned_percentage
            ));

        frame.render_widget(quota_gauge, chunks[0]);

        let (days_left, elapsed) = state.get_month_progress();
        let month_gauge = Gauge::default()
            .block(Block::bordered().title("Month Elapsed"))
            .gauge_style(Style::default().fg(Color::Blue))
            .percent((elapsed * 100.0).clamp(0.0, 100.0) as u16)
            .label(format!("{} days left", days_left));

        frame.render_widget(month_gauge, chunks[1]);
    }
}
