use async_trait::async_trait;
use shared::{
    domain::Document,
    protocol::{AskResponse, UploadResponse},
};

pub mod conversation;
pub mod error;
pub mod prober;
pub mod query;
pub mod session;
pub mod transport;
pub mod types;
pub mod upload;

pub use conversation::ConversationLog;
pub use error::{QueryError, RequestError, SessionError, UploadError};
pub use prober::ConnectivityProber;
pub use query::QueryController;
pub use session::SessionOrchestrator;
pub use transport::HttpQaBackend;
pub use types::{Answer, PendingRequest, SessionEvent, SessionPhase, SessionSnapshot, UploadAck};
pub use upload::UploadController;

#[async_trait]
pub trait QaBackend: Send + Sync {
    async fn health(&self) -> Result<(), RequestError>;
    async fn upload(&self, document: &Document) -> Result<UploadResponse, RequestError>;
    async fn ask(&self, question: &str) -> Result<AskResponse, RequestError>;
}
