use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::types::{ComplexityLevel, DependencyKind, EffortLevel, RiskLevel, TaskPriority, TaskStatus};

/// Directed edge: the owning task depends on `depends_on_id`. The edge set
/// over all tasks must stay acyclic; `lag_days` is schedule data and does
/// not participate in cycle detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct TaskDependency {
    pub depends_on_id: Uuid,
    #[serde(default)]
    pub kind: DependencyKind,
    #[serde(default)]
    pub lag_days: i32,
}

impl TaskDependency {
    pub fn on(depends_on_id: Uuid) -> Self {
        Self {
            depends_on_id,
            kind: DependencyKind::default(),
            lag_days: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub milestone_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee_id: Option<Uuid>,
    /// Rank within the task's status column.
    pub position: i64,
    pub tags: Vec<String>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub story_points: Option<u32>,
    pub effort: EffortLevel,
    pub complexity: ComplexityLevel,
    pub risk: RiskLevel,
    /// Percent complete, always within 0..=100.
    pub progress: u8,
    pub dependencies: Vec<TaskDependency>,
    /// User-defined fields rendered by the dashboard.
    pub custom_fields: HashMap<String, serde_json::Value>,
    /// Opaque integration data; never interpreted by the store.
    pub metadata: HashMap<String, serde_json::Value>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub milestone_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub estimated_hours: Option<f64>,
    pub story_points: Option<u32>,
    pub effort: Option<EffortLevel>,
    pub complexity: Option<ComplexityLevel>,
    pub risk: Option<RiskLevel>,
    pub progress: Option<u8>,
    #[serde(default)]
    pub dependencies: Vec<TaskDependency>,
    #[serde(default)]
    pub custom_fields: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub due_date: Option<DateTime<Utc>>,
}

impl CreateTask {
    pub fn from_title(project_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            project_id,
            title: title.into(),
            description: None,
            milestone_id: None,
            status: None,
            priority: None,
            assignee_id: None,
            tags: Vec::new(),
            estimated_hours: None,
            story_points: None,
            effort: None,
            complexity: None,
            risk: None,
            progress: None,
            dependencies: Vec::new(),
            custom_fields: HashMap::new(),
            metadata: HashMap::new(),
            due_date: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub milestone_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
    pub tags: Option<Vec<String>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub story_points: Option<u32>,
    pub effort: Option<EffortLevel>,
    pub complexity: Option<ComplexityLevel>,
    pub risk: Option<RiskLevel>,
    pub progress: Option<u8>,
    pub dependencies: Option<Vec<TaskDependency>>,
    pub custom_fields: Option<HashMap<String, serde_json::Value>>,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Body of the move operation: target column and slot.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct MoveTaskRequest {
    pub status: TaskStatus,
    pub position: i64,
}

impl UpdateTask {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn progress(progress: u8) -> Self {
        Self {
            progress: Some(progress),
            ..Self::default()
        }
    }
}

impl Task {
    /// Merge an update into a copy of this task, applying the completion
    /// side effects: a transition into a completed status stamps
    /// `completed_at` and forces progress to 100, a regression out of it
    /// clears `completed_at`. Progress is clamped to 0..=100 either way.
    ///
    /// The store applies this before validating and committing; the client
    /// uses the same merge to predict the post-update record for
    /// optimistic display.
    pub fn merged_with(&self, update: &UpdateTask, now: DateTime<Utc>) -> Task {
        let mut task = self.clone();
        let was_completed = task.status.is_completed();

        if let Some(title) = &update.title {
            task.title = title.clone();
        }
        if let Some(description) = &update.description {
            task.description = if description.trim().is_empty() {
                None
            } else {
                Some(description.clone())
            };
        }
        if let Some(milestone_id) = update.milestone_id {
            task.milestone_id = Some(milestone_id);
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(assignee_id) = update.assignee_id {
            task.assignee_id = Some(assignee_id);
        }
        if let Some(tags) = &update.tags {
            task.tags = tags.clone();
        }
        if let Some(estimated_hours) = update.estimated_hours {
            task.estimated_hours = Some(estimated_hours);
        }
        if let Some(actual_hours) = update.actual_hours {
            task.actual_hours = Some(actual_hours);
        }
        if let Some(story_points) = update.story_points {
            task.story_points = Some(story_points);
        }
        if let Some(effort) = update.effort {
            task.effort = effort;
        }
        if let Some(complexity) = update.complexity {
            task.complexity = complexity;
        }
        if let Some(risk) = update.risk {
            task.risk = risk;
        }
        if let Some(progress) = update.progress {
            task.progress = progress;
        }
        if let Some(dependencies) = &update.dependencies {
            task.dependencies = dependencies.clone();
        }
        if let Some(custom_fields) = &update.custom_fields {
            task.custom_fields = custom_fields.clone();
        }
        if let Some(metadata) = &update.metadata {
            task.metadata = metadata.clone();
        }
        if let Some(due_date) = update.due_date {
            task.due_date = Some(due_date);
        }

        let is_completed = task.status.is_completed();
        if is_completed && !was_completed {
            task.completed_at = Some(now);
            task.progress = 100;
        } else if !is_completed && was_completed {
            task.completed_at = None;
        }
        task.progress = task.progress.min(100);
        task.updated_at = now;

        task
    }
}
