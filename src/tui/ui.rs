//! UI rendering for the TUI.
//!
//! Defines the layout and renders all UI components.

use super::app::App;
use super::widgets::{chat, header, input};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Main layout: header, chat, input
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(3),    // Chat
            Constraint::Length(3), // Input
        ])
        .split(area);

    render_header(frame, main_layout[0], app);
    render_chat(frame, main_layout[1], app);
    render_input(frame, main_layout[2], app);
}

/// Renders the header bar.
fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let widget = header::Header::new(
        app.connection_info.as_deref(),
        &app.mode_label,
        app.spinner.as_ref(),
    );
    frame.render_widget(widget, area);
}

/// Renders the chat panel.
fn render_chat(frame: &mut Frame, area: Rect, app: &App) {
    let widget = chat::ChatPanel::new(&app.history, app.pending.as_deref(), app.chat_scroll);
    frame.render_widget(widget, area);
}

/// Renders the input bar and places the cursor in it.
fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let widget = input::InputBar::new(&app.input.text, app.input.cursor, app.is_processing());
    frame.render_widget(widget, area);

    // Account for border (1) and prompt "> " (2)
    let offset = input::calculate_scroll_offset(app.input.cursor, input::available_width(area));
    let cursor_x = area.x + 1 + 2 + (app.input.cursor - offset) as u16;
    let cursor_y = area.y + 1;
    frame.set_cursor_position((cursor_x, cursor_y));
}
