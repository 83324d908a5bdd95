use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TaskError {
    /// All violations found in one pass, joined for display.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("Task not found: {0}")]
    NotFound(Uuid),
    #[error("Dependency error: {0}")]
    Dependency(String),
}

impl TaskError {
    /// Stable machine-readable code carried through the API envelope.
    pub fn code(&self) -> &'static str {
        match self {
            TaskError::Validation(_) => "VALIDATION_ERROR",
            TaskError::NotFound(_) => "TASK_NOT_FOUND",
            TaskError::Dependency(_) => "DEPENDENCY_ERROR",
        }
    }
}
