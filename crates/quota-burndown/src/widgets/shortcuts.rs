use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::AppState;

pub struct ShortcutsWidget;

impl ShortcutsWidget {
    pub fn render(frame: &mut Frame, area: Rect, _state: &AppState) {
        let key_style = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        let text_style = Style::default().fg(Color::Gray);

        let mut spans = vec![Span::styled("Press ", text_style)];
        let bindings = [
            ("q", " to quit, "),
            ("r", " to reload, "),
            ("m", " for models, "),
            ("h", " for daily history"),
        ];
        for (key, action) in bindings {
            spans.push(Span::styled(key, key_style));
            spans.push(Span::styled(action, text_style));
        }

        let shortcuts = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);

        frame.render_widget(shortcuts, area);
    }
}
