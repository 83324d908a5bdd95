pub mod error;
pub mod filter;
mod graph;
pub mod history;
pub mod store;
pub mod task;
pub mod types;
mod validate;

pub use error::TaskError;
pub use filter::{SortDirection, TaskFilter, TaskPage, TaskSort};
pub use history::{FieldChange, HistoryEntry, HistoryKind};
pub use store::{
    BulkItemOutcome, BulkUpdateItem, BulkUpdateRequest, BulkUpdateSummary, TaskStore,
};
pub use task::{CreateTask, MoveTaskRequest, Task, TaskDependency, UpdateTask};
pub use types::{
    ComplexityLevel, DependencyKind, EffortLevel, RiskLevel, TaskPriority, TaskStatus,
};
