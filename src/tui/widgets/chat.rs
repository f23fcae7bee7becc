//! Chat panel widget.
//!
//! Renders the conversation newest first. A question still being answered
//! sits at the top with a placeholder answer.

use crate::tui::history::ChatHistory;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// Shown before the first question.
pub const WELCOME_TEXT: &str = "Puedes hacerme preguntas sobre la base de datos en lenguaje natural. \
Escribe tu pregunta abajo y pulsa Enter.";

const USER_LABEL: &str = "Tú: ";
const ASSISTANT_LABEL: &str = "db-chat: ";
const PENDING_ANSWER: &str = "...";

/// Chat panel widget.
pub struct ChatPanel<'a> {
    history: &'a ChatHistory,
    pending: Option<&'a str>,
    scroll: u16,
}

impl<'a> ChatPanel<'a> {
    /// Creates a new chat panel widget.
    pub fn new(history: &'a ChatHistory, pending: Option<&'a str>, scroll: u16) -> Self {
        Self {
            history,
            pending,
            scroll,
        }
    }

    fn question_lines(question: &str) -> Line<'_> {
        Line::from(vec![
            Span::styled(
                USER_LABEL,
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(question),
        ])
    }

    fn answer_lines(answer: &str, is_error: bool) -> Vec<Line<'_>> {
        let label_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let text_style = if is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };

        // Tables span several lines; the label only goes on the first.
        let mut lines = Vec::new();
        for (i, text) in answer.lines().enumerate() {
            let label = if i == 0 { ASSISTANT_LABEL } else { "" };
            lines.push(Line::from(vec![
                Span::styled(label, label_style),
                Span::styled(text, text_style),
            ]));
        }
        if lines.is_empty() {
            lines.push(Line::from(Span::styled(ASSISTANT_LABEL, label_style)));
        }
        lines
    }

    fn build_text(&self) -> Text<'a> {
        let mut lines: Vec<Line<'a>> = Vec::new();

        if self.history.is_empty() && self.pending.is_none() {
            lines.push(Line::from(Span::styled(
                WELCOME_TEXT,
                Style::default().fg(Color::DarkGray),
            )));
            return Text::from(lines);
        }

        if let Some(question) = self.pending {
            lines.push(Self::question_lines(question));
            lines.push(Line::from(vec![
                Span::styled(
                    ASSISTANT_LABEL,
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(PENDING_ANSWER, Style::default().fg(Color::DarkGray)),
            ]));
            lines.push(Line::default());
        }

        for exchange in self.history.newest_first() {
            lines.push(Self::question_lines(&exchange.question));
            lines.extend(Self::answer_lines(&exchange.answer, exchange.is_error()));
            lines.push(Line::default());
        }

        Text::from(lines)
    }
}

impl Widget for ChatPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Chat ");

        let text = self.build_text();
        Paragraph::new(text)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .render(area, buf);
    }
}
