use std::sync::Arc;

use shared::domain::Document;
use tracing::debug;

use crate::{
    error::UploadError,
    session::SessionState,
    types::{PendingRequest, UploadAck},
    QaBackend,
};

pub struct UploadController {
    backend: Arc<dyn QaBackend>,
}

impl UploadController {
    pub fn new(backend: Arc<dyn QaBackend>) -> Self {
        Self { backend }
    }

    pub fn validate(document: &Document) -> Result<(), UploadError> {
        document.ensure_pdf().map_err(UploadError::from)
    }

    pub async fn upload(&self, document: &Document) -> Result<UploadAck, UploadError> {
        Self::validate(document)?;
        debug!(
            document = %document.name,
            size_bytes = document.bytes.len(),
            "sending document to QA backend"
        );

        let response = self.backend.upload(document).await?;
        Ok(UploadAck {
            message: response.message,
            document: document.descriptor(),
        })
    }

    /// Marks the upload in flight. The new document is shown as active
    /// right away; `settle` clears it again if the backend does not take it.
    pub(crate) fn begin(state: &mut SessionState, document: &Document) {
        state.pending = Some(PendingRequest::Upload);
        state.active_document = Some(document.descriptor());
    }

    /// Any failure leaves no active document, including one that was active
    /// before this upload started.
    pub(crate) fn settle(state: &mut SessionState, result: &Result<UploadAck, UploadError>) {
        state.pending = None;
        state.active_document = match result {
            Ok(ack) => Some(ack.document.clone()),
            Err(_) => None,
        };
    }
}
