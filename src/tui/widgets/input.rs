//! Input widget for the TUI.
//!
//! Provides the question field with a "> " prompt.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Title of the input box.
pub const INPUT_TITLE: &str = " ¿En qué te puedo ayudar? ";

/// Calculates the scroll offset needed to keep the cursor visible.
///
/// Returns the number of characters to skip from the start of the text.
pub fn calculate_scroll_offset(cursor: usize, available_width: usize) -> usize {
    cursor.saturating_sub(available_width)
}

/// Width left for text inside the box: borders, the prompt and one cursor cell.
pub fn available_width(area: Rect) -> usize {
    area.width.saturating_sub(5) as usize
}

/// Input bar widget.
pub struct InputBar<'a> {
    text: &'a str,
    cursor: usize,
    busy: bool,
}

impl<'a> InputBar<'a> {
    /// Creates a new input bar widget. `cursor` is a character index.
    pub fn new(text: &'a str, cursor: usize, busy: bool) -> Self {
        Self { text, cursor, busy }
    }
}

impl Widget for InputBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.busy {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Cyan)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(INPUT_TITLE);

        let prompt_style = Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD);

        let scroll_offset = calculate_scroll_offset(self.cursor, available_width(area));
        let visible_text: String = self.text.chars().skip(scroll_offset).collect();

        let line = Line::from(vec![
            Span::styled("> ", prompt_style),
            Span::raw(visible_text),
        ]);

        Paragraph::new(line).block(block).render(area, buf);
    }
}
