//! Header widget for the TUI.
//!
//! Displays the application name, version, pipeline mode and database
//! connection info.

use super::spinner::Spinner;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Widget,
};

/// Header bar widget.
pub struct Header<'a> {
    connection_info: Option<&'a str>,
    mode: &'a str,
    spinner: Option<&'a Spinner>,
}

impl<'a> Header<'a> {
    /// Creates a new header widget.
    pub fn new(connection_info: Option<&'a str>, mode: &'a str, spinner: Option<&'a Spinner>) -> Self {
        Self {
            connection_info,
            mode,
            spinner,
        }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(style);
        }

        let left_text = format!(" db-chat v{} ({})", env!("CARGO_PKG_VERSION"), self.mode);
        let left_span = Span::styled(left_text, style);
        buf.set_span(area.x, area.y, &left_span, area.width);

        if let Some(spinner) = self.spinner {
            let spinner_text = spinner.display();
            let spinner_style = Style::default()
                .bg(Color::Blue)
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD);
            let spinner_width = spinner_text.chars().count() as u16;
            let spinner_x = area.x + (area.width.saturating_sub(spinner_width)) / 2;
            buf.set_string(spinner_x, area.y, &spinner_text, spinner_style);
        }

        if let Some(info) = self.connection_info {
            let right_text = format!(" [db: {}] ", info);
            let right_width = right_text.chars().count() as u16;
            if right_width < area.width {
                let right_x = area.right().saturating_sub(right_width);
                buf.set_string(right_x, area.y, &right_text, style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_line(header: Header<'_>, width: u16) -> String {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        header.render(area, &mut buf);
        (0..width).map(|x| buf[(x, 0)].symbol().to_string()).collect()
    }

    #[test]
    fn test_header_shows_name_and_connection() {
        let line = render_line(Header::new(Some("root@localhost/shop"), "simple", None), 80);
        assert!(line.starts_with(" db-chat v"));
        assert!(line.contains("(simple)"));
        assert!(line.trim_end().ends_with("[db: root@localhost/shop]"));
    }

    #[test]
    fn test_header_shows_spinner() {
        let spinner = Spinner::thinking();
        let line = render_line(Header::new(None, "elaborated", Some(&spinner)), 80);
        assert!(line.contains("Pensando..."));
    }
}
