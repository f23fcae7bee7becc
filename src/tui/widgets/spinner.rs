//! Thinking indicator for the TUI.

use std::time::Instant;

/// Braille spinner frames.
const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Animation speed in milliseconds per frame.
const FRAME_DURATION_MS: u128 = 100;

/// Spinner state for the animated indicator.
#[derive(Debug, Clone)]
pub struct Spinner {
    /// When the spinner started.
    start_time: Instant,
    /// Label to display with the spinner.
    label: String,
}

impl Spinner {
    /// Creates a new spinner with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            start_time: Instant::now(),
            label: label.into(),
        }
    }

    /// Creates the spinner shown while a question is being answered.
    pub fn thinking() -> Self {
        Self::new("Pensando")
    }

    /// Returns the current frame of the animation.
    pub fn frame(&self) -> &'static str {
        let elapsed_ms = self.start_time.elapsed().as_millis();
        let frame_index = (elapsed_ms / FRAME_DURATION_MS) as usize;
        FRAMES[frame_index % FRAMES.len()]
    }

    /// Returns the display string for the spinner.
    pub fn display(&self) -> String {
        format!("{} {}...", self.frame(), self.label)
    }

    /// Returns the label.
    pub fn label(&self) -> &str {
        &self.label
    }
}
