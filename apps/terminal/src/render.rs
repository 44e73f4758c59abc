//! Text rendering of session events and snapshots. Holds no state of its own.

use client_core::{SessionError, SessionEvent, SessionPhase, SessionSnapshot};
use shared::domain::{Role, ServerStatus, DEFAULT_DISPLAY_NAME_LEN};

pub const LOADING_TEXT: &str = "Analyzing document and composing response...";
pub const OFFLINE_TITLE: &str = "Server Offline";
pub const OFFLINE_HINT: &str = "Please start the FastAPI server first";

pub fn render_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::StatusChanged(ServerStatus::Online) => Some("Connected.".into()),
        SessionEvent::StatusChanged(_) => None,
        SessionEvent::PhaseChanged(SessionPhase::Uploading) => {
            Some("Uploading document...".into())
        }
        SessionEvent::PhaseChanged(SessionPhase::Asking) => Some(LOADING_TEXT.into()),
        SessionEvent::PhaseChanged(_) => None,
        SessionEvent::DocumentChanged(Some(document)) => Some(format!(
            "[document] {}",
            document.display_name(DEFAULT_DISPLAY_NAME_LEN)
        )),
        SessionEvent::DocumentChanged(None) => Some("[document] none".into()),
        SessionEvent::MessageAppended(message) => match message.role() {
            // The user already sees what they typed.
            Role::User => None,
            Role::Assistant => Some(format!("assistant> {}", message.text())),
        },
        SessionEvent::Alert(text) => Some(format!("! {text}")),
        SessionEvent::InputReady => None,
    }
}

pub fn render_refusal(err: &SessionError) -> Option<String> {
    match err {
        // Upload failures were already shown as alerts.
        SessionError::Upload(_) => None,
        SessionError::EmptyQuestion => None,
        SessionError::NoActiveDocument => {
            Some("Upload a PDF with /upload <path> before asking questions.".into())
        }
        other => Some(format!("Cannot do that right now: {other}.")),
    }
}

pub fn render_status(snapshot: &SessionSnapshot) -> String {
    let server = match snapshot.status {
        ServerStatus::Checking => "checking",
        ServerStatus::Online => "online",
        ServerStatus::Offline => "offline",
    };
    let document = snapshot
        .active_document
        .as_ref()
        .map(|document| {
            format!(
                "{} ({} bytes)",
                document.display_name(DEFAULT_DISPLAY_NAME_LEN),
                document.size_bytes
            )
        })
        .unwrap_or_else(|| "none".into());

    format!(
        "server: {server}\nphase: {:?}\ndocument: {document}\nmessages: {}",
        snapshot.phase,
        snapshot.transcript.len()
    )
}
