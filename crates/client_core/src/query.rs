use std::sync::Arc;

use shared::domain::Message;
use tracing::debug;

use crate::{
    error::QueryError,
    session::SessionState,
    types::{Answer, PendingRequest},
    QaBackend,
};

pub struct QueryController {
    backend: Arc<dyn QaBackend>,
}

impl QueryController {
    pub fn new(backend: Arc<dyn QaBackend>) -> Self {
        Self { backend }
    }

    pub fn prepare(question: &str) -> Result<String, QueryError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::EmptyQuestion);
        }
        Ok(question.to_string())
    }

    /// Callers must already hold the session gate: an active document and
    /// nothing else in flight.
    pub async fn ask(&self, question: &str) -> Result<Answer, QueryError> {
        let question = Self::prepare(question)?;
        debug!(chars = question.len(), "sending question to QA backend");

        let response = self.backend.ask(&question).await?;
        Ok(Answer {
            text: response.answer,
        })
    }

    pub(crate) fn begin(state: &mut SessionState, question: &str) -> Message {
        let message = Message::user(question);
        state.log.append(message.clone());
        state.pending = Some(PendingRequest::Question);
        message
    }

    /// Appends exactly one assistant turn, the answer or the error text, and
    /// clears the in-flight flag.
    pub(crate) fn settle(state: &mut SessionState, result: &Result<Answer, QueryError>) -> Message {
        let message = match result {
            Ok(answer) => Message::assistant(answer.text.clone()),
            Err(err) => Message::assistant(err.transcript_text()),
        };
        state.log.append(message.clone());
        state.pending = None;
        message
    }
}
