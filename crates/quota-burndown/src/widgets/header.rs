use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::AppState;

pub struct HeaderWidget;

impl HeaderWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let mut spans = vec![Span::styled(
            format!("Quota Burndown {}", state.month),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )];

        if let Some(summary) = &state.summary {
            spans.push(Span::styled(
                format!("  target {:.0}", summary.target()),
                Style::default().fg(Color::Gray),
            ));
            let observed = summary
                .observed()
                .map(|o| format!("  observed {}", o.date.format("%b %d")))
                .unwrap_or_else(|| "  not yet observed".to_string());
            spans.push(Span::styled(observed, Style::default().fg(Color::Gray)));
        }

        if state.is_loading {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                state.get_spinner_char().to_string(),
                Style::default().fg(Color::Yellow),
            ));
        }

        let header = Paragraph::new(Line::from(spans))
            .block(Block::bordered().title("Month"))
            .alignment(Alignment::Center);

        frame.render_widget(header, area);
    }
}
