//! Conversation history for the TUI.
//!
//! An append-only log of question/answer exchanges. The pipeline never reads
//! it; it exists only for display.

/// One question and the answer it received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// The question as the user typed it.
    pub question: String,
    /// The answer shown for it.
    pub answer: String,
}

impl Exchange {
    /// Returns true when the answer reports a failure.
    pub fn is_error(&self) -> bool {
        self.answer.starts_with("Error")
    }
}

/// Append-only chat history.
#[derive(Debug, Default)]
pub struct ChatHistory {
    /// Exchanges, oldest first.
    exchanges: Vec<Exchange>,
}

impl ChatHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an exchange.
    pub fn push(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.exchanges.push(Exchange {
            question: question.into(),
            answer: answer.into(),
        });
    }

    /// Number of exchanges recorded.
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    /// Returns true if nothing has been asked yet.
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Iterates over the exchanges, most recent first.
    pub fn newest_first(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter().rev()
    }
}
