use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the QA backend on any non-success status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
        }
    }

    /// Non-blank detail text, if the backend provided one.
    pub fn into_detail(self) -> Option<String> {
        self.detail.filter(|detail| !detail.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("{name} is not a PDF (detected {mime_type})")]
    InvalidType { name: String, mime_type: String },
}
