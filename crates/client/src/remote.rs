use async_trait::async_trait;
use store::{
    BulkUpdateRequest, BulkUpdateSummary, CreateTask, Task, TaskError, TaskFilter, TaskPage,
    TaskStatus, UpdateTask,
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RemoteError {
    /// The backend rejected the call; `code` is the stable error code from
    /// the response envelope.
    #[error("{code}: {message}")]
    Api { code: String, message: String },
    /// The call never produced a response (connection refused, timeout,
    /// DNS). Only this class triggers the stale-cache fallback.
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RemoteError {
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, RemoteError::Transport(_))
    }

    pub fn code(&self) -> &str {
        match self {
            RemoteError::Api { code, .. } => code,
            RemoteError::Transport(_) => "TRANSPORT_ERROR",
            RemoteError::Decode(_) => "DECODE_ERROR",
        }
    }
}

impl From<TaskError> for RemoteError {
    fn from(err: TaskError) -> Self {
        RemoteError::Api {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Transport(err.to_string())
    }
}

/// The task backend surface. `HttpRemote` talks to a real server;
/// `InProcessRemote` serves the same contract from an owned store for
/// tests and single-process deployments.
#[async_trait]
pub trait TaskRemote: Send + Sync {
    async fn list(&self, filter: &TaskFilter) -> Result<TaskPage, RemoteError>;
    async fn get(&self, id: Uuid) -> Result<Task, RemoteError>;
    async fn create(&self, data: &CreateTask) -> Result<Task, RemoteError>;
    async fn update(&self, id: Uuid, update: &UpdateTask) -> Result<Task, RemoteError>;
    async fn delete(&self, id: Uuid) -> Result<(), RemoteError>;
    async fn move_task(
        &self,
        id: Uuid,
        status: TaskStatus,
        position: i64,
    ) -> Result<(), RemoteError>;
    async fn bulk_update(
        &self,
        request: &BulkUpdateRequest,
    ) -> Result<BulkUpdateSummary, RemoteError>;
}
