use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const DEFAULT_DISPLAY_NAME_LEN: usize = 20;

/// Reachability of the QA backend as determined by the startup probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    #[default]
    Checking,
    Online,
    Offline,
}

impl ServerStatus {
    pub fn is_settled(self) -> bool {
        !matches!(self, Self::Checking)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry. Fields are private so a message cannot change after
/// it has been appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A document picked by the user, not yet known to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Document {
    /// Builds a document whose MIME type is guessed from its file name.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_guess::from_path(&name)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        Self {
            name,
            mime_type,
            bytes,
        }
    }

    pub fn with_mime_type(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type.eq_ignore_ascii_case(PDF_MIME_TYPE)
    }

    pub fn ensure_pdf(&self) -> Result<(), DocumentError> {
        if self.is_pdf() {
            Ok(())
        } else {
            Err(DocumentError::InvalidType {
                name: self.name.clone(),
                mime_type: self.mime_type.clone(),
            })
        }
    }

    pub fn descriptor(&self) -> ActiveDocument {
        ActiveDocument {
            name: self.name.clone(),
            size_bytes: self.bytes.len() as u64,
        }
    }
}

/// The document the backend has ingested and questions are asked against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActiveDocument {
    pub name: String,
    pub size_bytes: u64,
}

impl ActiveDocument {
    /// Shortens long names for headers while keeping the extension visible,
    /// e.g. `a-very-long-quarterly-report.pdf` -> `a-very-long-quart....pdf`.
    pub fn display_name(&self, max_len: usize) -> String {
        truncate_file_name(&self.name, max_len)
    }
}

pub fn truncate_file_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        return name.to_string();
    }

    let (stem, extension) = match name.rfind('.') {
        Some(idx) => name.split_at(idx),
        None => (name, ""),
    };
    let keep = max_len.saturating_sub(3);
    let stem: String = stem.chars().take(keep).collect();
    format!("{stem}...{extension}")
}
