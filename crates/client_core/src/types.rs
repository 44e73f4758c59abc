use std::fmt;

use serde::{Deserialize, Serialize};
use shared::domain::{ActiveDocument, Message, ServerStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingRequest {
    Upload,
    Question,
}

impl fmt::Display for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload => f.write_str("document upload"),
            Self::Question => f.write_str("question"),
        }
    }
}

/// Where the session sits in its lifecycle:
/// `Checking -> {Online, Offline}`, and within Online
/// `Idle -> Uploading -> Ready -> Asking -> Ready -> ...`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Checking,
    Offline,
    Idle,
    Uploading,
    Ready,
    Asking,
}

impl SessionPhase {
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Uploading | Self::Asking)
    }

    pub fn accepts_upload(self) -> bool {
        matches!(self, Self::Idle | Self::Ready)
    }

    pub fn accepts_question(self) -> bool {
        matches!(self, Self::Ready)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadAck {
    pub message: String,
    pub document: ActiveDocument,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: ServerStatus,
    pub phase: SessionPhase,
    pub active_document: Option<ActiveDocument>,
    pub pending: Option<PendingRequest>,
    pub transcript: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    StatusChanged(ServerStatus),
    PhaseChanged(SessionPhase),
    DocumentChanged(Option<ActiveDocument>),
    MessageAppended(Message),
    /// Blocking, user-visible upload failure.
    Alert(String),
    /// The question input may take focus again.
    InputReady,
}
