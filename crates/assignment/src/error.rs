use store::TaskError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error("Assignee not found: {0}")]
    AssigneeNotFound(Uuid),
    #[error(
        "Capacity exceeded for {}: projected utilization {:.1}%",
        .member_id,
        .projected * 100.0
    )]
    CapacityExceeded { member_id: Uuid, projected: f64 },
    #[error("Automatic assignment is disabled")]
    FeatureDisabled,
}

impl AssignmentError {
    pub fn code(&self) -> &'static str {
        match self {
            AssignmentError::Task(err) => err.code(),
            AssignmentError::AssigneeNotFound(_) => "ASSIGNEE_NOT_FOUND",
            AssignmentError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            AssignmentError::FeatureDisabled => "FEATURE_DISABLED",
        }
    }
}
