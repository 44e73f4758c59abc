use std::sync::Arc;

use shared::domain::{ActiveDocument, Document, Message, ServerStatus};
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{error, info, warn};

use crate::{
    conversation::ConversationLog,
    error::{QueryError, SessionError, UploadError},
    prober::ConnectivityProber,
    query::QueryController,
    types::{Answer, PendingRequest, SessionEvent, SessionPhase, SessionSnapshot, UploadAck},
    upload::UploadController,
    QaBackend,
};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub(crate) status: ServerStatus,
    pub(crate) probe_started: bool,
    pub(crate) active_document: Option<ActiveDocument>,
    pub(crate) pending: Option<PendingRequest>,
    pub(crate) log: ConversationLog,
}

struct Observation {
    phase: SessionPhase,
    document: Option<ActiveDocument>,
}

impl SessionState {
    pub(crate) fn phase(&self) -> SessionPhase {
        match self.status {
            ServerStatus::Checking => SessionPhase::Checking,
            ServerStatus::Offline => SessionPhase::Offline,
            ServerStatus::Online => match self.pending {
                Some(PendingRequest::Upload) => SessionPhase::Uploading,
                Some(PendingRequest::Question) => SessionPhase::Asking,
                None if self.active_document.is_some() => SessionPhase::Ready,
                None => SessionPhase::Idle,
            },
        }
    }

    /// Moves out of `Checking` exactly once; a settled status never changes.
    pub(crate) fn settle_status(&mut self, status: ServerStatus) -> bool {
        if self.status.is_settled() || !status.is_settled() {
            return false;
        }
        self.status = status;
        true
    }

    pub(crate) fn ensure_accepting(&self) -> Result<(), SessionError> {
        match self.status {
            ServerStatus::Checking => Err(SessionError::Checking),
            ServerStatus::Offline => Err(SessionError::Offline),
            ServerStatus::Online => match self.pending {
                Some(pending) => Err(SessionError::Busy(pending)),
                None => Ok(()),
            },
        }
    }

    fn observe(&self) -> Observation {
        Observation {
            phase: self.phase(),
            document: self.active_document.clone(),
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            phase: self.phase(),
            active_document: self.active_document.clone(),
            pending: self.pending,
            transcript: self.log.messages().to_vec(),
        }
    }
}

pub struct SessionOrchestrator {
    prober: ConnectivityProber,
    uploads: UploadController,
    queries: QueryController,
    state: Mutex<SessionState>,
    settled: watch::Sender<ServerStatus>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionOrchestrator {
    pub fn new(backend: Arc<dyn QaBackend>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            prober: ConnectivityProber::new(Arc::clone(&backend)),
            uploads: UploadController::new(Arc::clone(&backend)),
            queries: QueryController::new(backend),
            state: Mutex::new(SessionState::default()),
            settled: watch::Sender::new(ServerStatus::Checking),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn status(&self) -> ServerStatus {
        self.state.lock().await.status
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase()
    }

    pub async fn active_document(&self) -> Option<ActiveDocument> {
        self.state.lock().await.active_document.clone()
    }

    pub async fn transcript(&self) -> Vec<Message> {
        self.state.lock().await.log.messages().to_vec()
    }

    /// Runs the one startup probe. Every caller, including ones that arrive
    /// while the probe is in flight, waits for and returns the settled status.
    pub async fn start(self: &Arc<Self>) -> ServerStatus {
        let mut settled = self.settled.subscribe();
        {
            let mut state = self.state.lock().await;
            if !state.probe_started {
                state.probe_started = true;
                let this = Arc::clone(self);
                tokio::spawn(async move {
                    let prober = Arc::clone(&this);
                    let probe = tokio::spawn(async move { prober.prober.probe().await });
                    let status = match probe.await {
                        Ok(status) => status,
                        Err(err) => {
                            error!(error = %err, "health probe task failed");
                            ServerStatus::Offline
                        }
                    };
                    this.finish_probe(status).await;
                });
            }
        }

        let outcome = settled
            .wait_for(|status| status.is_settled())
            .await
            .map(|status| *status);
        match outcome {
            Ok(status) => status,
            Err(_) => self.status().await,
        }
    }

    async fn finish_probe(&self, status: ServerStatus) {
        let mut state = self.state.lock().await;
        let before = state.observe();
        if state.settle_status(status) {
            info!(?status, "server status settled");
            self.emit(SessionEvent::StatusChanged(status));
            self.publish(&before, &state);
        }
        self.settled.send_replace(state.status);
    }

    pub async fn upload(self: &Arc<Self>, document: Document) -> Result<UploadAck, SessionError> {
        {
            let mut state = self.state.lock().await;
            state.ensure_accepting()?;
            if let Err(err) = UploadController::validate(&document) {
                warn!(
                    document = %document.name,
                    mime_type = %document.mime_type,
                    "rejected document before upload"
                );
                self.emit(SessionEvent::Alert(err.user_message()));
                return Err(err.into());
            }

            let before = state.observe();
            UploadController::begin(&mut state, &document);
            info!(document = %document.name, "document upload started");
            self.publish(&before, &state);
        }

        let this = Arc::clone(self);
        let request = tokio::spawn(async move {
            let result = this.uploads.upload(&document).await;
            this.finish_upload(result).await
        });
        match request.await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, "upload task failed");
                self.finish_upload(Err(UploadError::Transport(err.to_string())))
                    .await
            }
        }
    }

    async fn finish_upload(
        &self,
        result: Result<UploadAck, UploadError>,
    ) -> Result<UploadAck, SessionError> {
        let mut state = self.state.lock().await;
        let before = state.observe();
        UploadController::settle(&mut state, &result);
        self.publish(&before, &state);

        match result {
            Ok(ack) => {
                info!(document = %ack.document.name, reply = %ack.message, "document ingested");
                self.emit(SessionEvent::InputReady);
                Ok(ack)
            }
            Err(err) => {
                warn!(error = %err, "document upload failed");
                self.emit(SessionEvent::Alert(err.user_message()));
                Err(err.into())
            }
        }
    }

    /// Backend failures come back as the appended assistant turn; `Err` only
    /// means the question was refused before sending.
    pub async fn ask(self: &Arc<Self>, question: &str) -> Result<Message, SessionError> {
        let question = {
            let mut state = self.state.lock().await;
            state.ensure_accepting()?;
            if state.active_document.is_none() {
                return Err(SessionError::NoActiveDocument);
            }
            let question =
                QueryController::prepare(question).map_err(|_| SessionError::EmptyQuestion)?;

            let before = state.observe();
            let message = QueryController::begin(&mut state, &question);
            self.emit(SessionEvent::MessageAppended(message));
            self.publish(&before, &state);
            question
        };

        let this = Arc::clone(self);
        let request = tokio::spawn(async move {
            let result = this.queries.ask(&question).await;
            this.finish_question(result).await
        });
        match request.await {
            Ok(message) => Ok(message),
            Err(err) => {
                error!(error = %err, "question task failed");
                Ok(self
                    .finish_question(Err(QueryError::Transport(err.to_string())))
                    .await)
            }
        }
    }

    async fn finish_question(&self, result: Result<Answer, QueryError>) -> Message {
        if let Err(err) = &result {
            warn!(error = %err, "question failed");
        }

        let mut state = self.state.lock().await;
        let before = state.observe();
        let message = QueryController::settle(&mut state, &result);
        self.emit(SessionEvent::MessageAppended(message.clone()));
        self.publish(&before, &state);
        self.emit(SessionEvent::InputReady);
        message
    }

    fn publish(&self, before: &Observation, state: &SessionState) {
        let phase = state.phase();
        if phase != before.phase {
            self.emit(SessionEvent::PhaseChanged(phase));
        }
        if state.active_document != before.document {
            self.emit(SessionEvent::DocumentChanged(state.active_document.clone()));
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
