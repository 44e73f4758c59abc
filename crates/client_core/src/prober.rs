use std::sync::Arc;

use shared::domain::ServerStatus;
use tracing::{info, warn};

use crate::QaBackend;

pub struct ConnectivityProber {
    backend: Arc<dyn QaBackend>,
}

impl ConnectivityProber {
    pub fn new(backend: Arc<dyn QaBackend>) -> Self {
        Self { backend }
    }

    pub async fn probe(&self) -> ServerStatus {
        match self.backend.health().await {
            Ok(()) => {
                info!("QA backend is online");
                ServerStatus::Online
            }
            Err(err) => {
                warn!(error = %err, "QA backend health check failed");
                ServerStatus::Offline
            }
        }
    }
}
