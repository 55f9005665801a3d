use tracing::debug;

use super::{Answer, ChatEngine, GREETING};
use crate::openai::ChatMessage;

/// One conversation: the engine plus an append-only transcript
///
/// The transcript is for display only; each question is answered on its own.
#[derive(Debug)]
pub struct ChatSession {
    engine: ChatEngine,
    transcript: Vec<ChatMessage>,
}

impl ChatSession {
    #[inline]
    pub fn new(engine: ChatEngine) -> Self {
        Self {
            engine,
            transcript: vec![ChatMessage::assistant(GREETING)],
        }
    }

    #[inline]
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Submit one line of user input
    ///
    /// Blank input is ignored and returns `None` without any service call.
    #[inline]
    pub async fn send(&mut self, input: &str) -> Option<Answer> {
        let question = input.trim();
        if question.is_empty() {
            debug!("Ignoring blank input");
            return None;
        }

        self.transcript.push(ChatMessage::user(question));
        let answer = self.engine.answer(question).await;
        self.transcript.push(ChatMessage::assistant(answer.text.clone()));

        Some(answer)
    }
}
