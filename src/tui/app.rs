//! Application state for the TUI.
//!
//! Contains the App struct and the input line it edits.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::history::ChatHistory;
use super::widgets::spinner::Spinner;
use super::Event;

/// Input state for text editing.
///
/// The cursor counts characters, not bytes, so accented input edits cleanly.
#[derive(Debug, Default)]
pub struct InputState {
    /// Current input text.
    pub text: String,
    /// Cursor position (character index).
    pub cursor: usize,
}

impl InputState {
    /// Creates a new empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    /// Inserts a character at the cursor position.
    pub fn insert(&mut self, c: char) {
        let index = self.byte_index(self.cursor);
        self.text.insert(index, c);
        self.cursor += 1;
    }

    /// Deletes the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let index = self.byte_index(self.cursor);
            self.text.remove(index);
        }
    }

    /// Deletes the character at the cursor (delete key).
    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let index = self.byte_index(self.cursor);
            self.text.remove(index);
        }
    }

    /// Moves the cursor left.
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Moves the cursor right.
    pub fn move_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    /// Moves the cursor to the start of the input.
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// Moves the cursor to the end of the input.
    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    /// Clears the input and returns the previous text.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    /// Clears the input.
    pub fn clear(&mut self) {
        self.take();
    }
}

/// Main application state.
pub struct App {
    /// Whether the application is still running.
    pub running: bool,
    /// Input field state.
    pub input: InputState,
    /// Answered questions.
    pub history: ChatHistory,
    /// The question currently being answered.
    pub pending: Option<String>,
    /// Thinking indicator, present while a question is pending.
    pub spinner: Option<Spinner>,
    /// Chat scroll offset (lines from the top).
    pub chat_scroll: u16,
    /// Database connection info for display.
    pub connection_info: Option<String>,
    /// Pipeline mode label for display.
    pub mode_label: String,
}

impl App {
    /// Creates a new App instance.
    pub fn new(connection_info: Option<String>, mode_label: impl Into<String>) -> Self {
        Self {
            running: true,
            input: InputState::new(),
            history: ChatHistory::new(),
            pending: None,
            spinner: None,
            chat_scroll: 0,
            connection_info,
            mode_label: mode_label.into(),
        }
    }

    /// Returns true while a question is being answered.
    pub fn is_processing(&self) -> bool {
        self.pending.is_some()
    }

    /// Handles an event and returns a question to submit, if any.
    pub fn handle_event(&mut self, event: Event) -> Option<String> {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Resize(_, _) | Event::Tick => None,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<String> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                self.running = false;
            }
            KeyCode::Enter => return self.submit_input(),
            KeyCode::Esc => self.input.clear(),
            KeyCode::Char(c) => self.input.insert(c),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.move_home(),
            KeyCode::End => self.input.move_end(),
            KeyCode::Up => self.chat_scroll = self.chat_scroll.saturating_sub(1),
            KeyCode::Down => self.chat_scroll = self.chat_scroll.saturating_add(1),
            KeyCode::PageUp => self.chat_scroll = self.chat_scroll.saturating_sub(10),
            KeyCode::PageDown => self.chat_scroll = self.chat_scroll.saturating_add(10),
            _ => {}
        }

        None
    }

    /// Takes the input as a question and marks it pending.
    ///
    /// Blank input is ignored, and so is Enter while another question is
    /// still being answered.
    pub fn submit_input(&mut self) -> Option<String> {
        if self.is_processing() || self.input.text.trim().is_empty() {
            return None;
        }

        let question = self.input.take();
        self.pending = Some(question.clone());
        self.spinner = Some(Spinner::thinking());
        self.chat_scroll = 0;
        Some(question)
    }

    /// Records the answer to the pending question.
    pub fn complete(&mut self, answer: String) {
        let question = self.pending.take().unwrap_or_default();
        self.history.push(question, answer);
        self.spinner = None;
        self.chat_scroll = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_event(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_input_insert_multibyte() {
        let mut input = InputState::new();
        for c in "¿Qué?".chars() {
            input.insert(c);
        }
        assert_eq!(input.text, "¿Qué?");
        assert_eq!(input.cursor, 5);

        input.move_left();
        input.backspace();
        assert_eq!(input.text, "¿Qu?");
        assert_eq!(input.cursor, 3);
    }

    #[test]
    fn test_input_delete_and_movement() {
        let mut input = InputState::new();
        input.text = "añadir".to_string();
        input.move_end();
        assert_eq!(input.cursor, 6);

        input.move_home();
        input.move_right();
        input.delete();
        assert_eq!(input.text, "aadir");

        input.move_end();
        input.delete();
        assert_eq!(input.text, "aadir");
    }

    #[test]
    fn test_input_take() {
        let mut input = InputState::new();
        input.text = "hola".to_string();
        input.cursor = 3;

        assert_eq!(input.take(), "hola");
        assert!(input.text.is_empty());
        assert_eq!(input.cursor, 0);
    }

    #[test]
    fn test_enter_submits_and_clears_input() {
        let mut app = App::new(None, "simple");
        type_text(&mut app, "¿Cuántos usuarios hay?");

        let submitted = app.handle_event(key(KeyCode::Enter));

        assert_eq!(submitted.as_deref(), Some("¿Cuántos usuarios hay?"));
        assert!(app.input.text.is_empty());
        assert!(app.is_processing());
        assert!(app.spinner.is_some());
    }

    #[test]
    fn test_blank_input_is_not_submitted() {
        let mut app = App::new(None, "simple");
        assert!(app.handle_event(key(KeyCode::Enter)).is_none());

        type_text(&mut app, "   ");
        assert!(app.handle_event(key(KeyCode::Enter)).is_none());
        assert!(!app.is_processing());
    }

    #[test]
    fn test_single_question_in_flight() {
        let mut app = App::new(None, "simple");
        type_text(&mut app, "primera");
        assert!(app.handle_event(key(KeyCode::Enter)).is_some());

        type_text(&mut app, "segunda");
        assert!(app.handle_event(key(KeyCode::Enter)).is_none());
        assert_eq!(app.input.text, "segunda");

        app.complete("Resultado: 1".to_string());
        assert!(!app.is_processing());
        assert_eq!(app.handle_event(key(KeyCode::Enter)).as_deref(), Some("segunda"));
    }

    #[test]
    fn test_complete_appends_history() {
        let mut app = App::new(None, "simple");
        type_text(&mut app, "¿Cuántos?");
        app.handle_event(key(KeyCode::Enter));

        app.complete("Resultado: 2".to_string());

        assert_eq!(app.history.len(), 1);
        let exchange = app.history.newest_first().next().unwrap();
        assert_eq!(exchange.question, "¿Cuántos?");
        assert_eq!(exchange.answer, "Resultado: 2");
        assert!(app.spinner.is_none());
    }

    #[test]
    fn test_esc_clears_input() {
        let mut app = App::new(None, "simple");
        type_text(&mut app, "borrador");
        app.handle_event(key(KeyCode::Esc));
        assert!(app.input.text.is_empty());
        assert!(app.running);
    }

    #[test]
    fn test_ctrl_c_and_ctrl_q_quit() {
        for c in ['c', 'q'] {
            let mut app = App::new(None, "simple");
            app.handle_event(Event::Key(KeyEvent::new(
                KeyCode::Char(c),
                KeyModifiers::CONTROL,
            )));
            assert!(!app.running);
            assert!(app.input.text.is_empty());
        }
    }

    #[test]
    fn test_chat_scroll() {
        let mut app = App::new(None, "simple");
        app.handle_event(key(KeyCode::PageDown));
        assert_eq!(app.chat_scroll, 10);
        app.handle_event(key(KeyCode::Up));
        assert_eq!(app.chat_scroll, 9);
        app.handle_event(key(KeyCode::PageUp));
        assert_eq!(app.chat_scroll, 0);
    }
}
