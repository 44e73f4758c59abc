use shared::error::DocumentError;
use thiserror::Error;

use crate::types::PendingRequest;

pub const INVALID_TYPE_MESSAGE: &str = "Please upload a PDF file";
pub const UPLOAD_FALLBACK_MESSAGE: &str = "Failed to upload PDF";
pub const ANSWER_FALLBACK_MESSAGE: &str = "Failed to get answer";
pub const QUERY_TRANSPORT_MESSAGE: &str =
    "Sorry, I encountered an error while processing your question.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("backend returned status {status}")]
    Backend { status: u16, detail: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error(transparent)]
    InvalidType(#[from] DocumentError),
    #[error("upload transport failure: {0}")]
    Transport(String),
    #[error("upload rejected with status {status}")]
    Backend { status: u16, detail: Option<String> },
}

impl UploadError {
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidType(_) => INVALID_TYPE_MESSAGE.to_string(),
            Self::Transport(_) => UPLOAD_FALLBACK_MESSAGE.to_string(),
            Self::Backend { detail, .. } => detail
                .clone()
                .unwrap_or_else(|| UPLOAD_FALLBACK_MESSAGE.to_string()),
        }
    }
}

impl From<RequestError> for UploadError {
    fn from(value: RequestError) -> Self {
        match value {
            RequestError::Transport(reason) => Self::Transport(reason),
            RequestError::Backend { status, detail } => Self::Backend { status, detail },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("question is empty")]
    EmptyQuestion,
    #[error("question transport failure: {0}")]
    Transport(String),
    #[error("question rejected with status {status}")]
    Backend { status: u16, detail: Option<String> },
}

impl QueryError {
    pub fn transcript_text(&self) -> String {
        match self {
            Self::Backend {
                detail: Some(detail),
                ..
            } => detail.clone(),
            Self::Backend { detail: None, .. } | Self::EmptyQuestion => {
                ANSWER_FALLBACK_MESSAGE.to_string()
            }
            Self::Transport(_) => QUERY_TRANSPORT_MESSAGE.to_string(),
        }
    }
}

impl From<RequestError> for QueryError {
    fn from(value: RequestError) -> Self {
        match value {
            RequestError::Transport(reason) => Self::Transport(reason),
            RequestError::Backend { status, detail } => Self::Backend { status, detail },
        }
    }
}

/// Reasons the orchestrator refuses a submission. A refusal never changes
/// session state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("server availability is still being checked")]
    Checking,
    #[error("server is offline")]
    Offline,
    #[error("a {0} is already in flight")]
    Busy(PendingRequest),
    #[error("no document has been uploaded")]
    NoActiveDocument,
    #[error("question is empty")]
    EmptyQuestion,
    #[error(transparent)]
    Upload(#[from] UploadError),
}
