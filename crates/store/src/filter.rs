use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use crate::task::Task;
use crate::types::{TaskPriority, TaskStatus};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 200;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
    Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskSort {
    /// Status column rank, then position within the column.
    #[default]
    Board,
    CreatedAt,
    UpdatedAt,
    DueDate,
    Priority,
    Progress,
    Title,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
    Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct TaskFilter {
    pub project_id: Option<Uuid>,
    pub milestone_id: Option<Uuid>,
    /// Empty means any status; same for the other list filters.
    pub status: Vec<TaskStatus>,
    pub priority: Vec<TaskPriority>,
    pub assignee_id: Option<Uuid>,
    /// Matches tasks carrying at least one of the listed tags.
    pub tags: Vec<String>,
    /// Case-insensitive free-text search over title, description and tags.
    pub search: Option<String>,
    pub progress_min: Option<u8>,
    pub progress_max: Option<u8>,
    pub story_points_min: Option<u32>,
    pub story_points_max: Option<u32>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub due_after: Option<DateTime<Utc>>,
    pub due_before: Option<DateTime<Utc>>,
    pub sort: TaskSort,
    pub direction: SortDirection,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
}

impl TaskFilter {
    pub fn for_project(project_id: Uuid) -> Self {
        Self {
            project_id: Some(project_id),
            ..Self::default()
        }
    }

    pub fn for_assignee(assignee_id: Uuid) -> Self {
        Self {
            assignee_id: Some(assignee_id),
            ..Self::default()
        }
    }

    /// Fill defaults and normalize the order-insensitive parts so that two
    /// equivalent filters serialize to the same canonical key.
    pub fn normalized(&self) -> Self {
        let mut filter = self.clone();
        filter.page = Some(filter.page.unwrap_or(1).max(1));
        filter.limit = Some(
            filter
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        );
        filter.status.sort_by_key(|s| s.column_position());
        filter.status.dedup();
        filter.priority.sort_by_key(|p| p.rank());
        filter.priority.dedup();
        filter.tags = filter
            .tags
            .iter()
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();
        filter.tags.sort();
        filter.tags.dedup();
        filter.search = filter
            .search
            .as_ref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        filter
    }

    /// Canonical serialization of the normalized filter; used as the
    /// response-cache key.
    pub fn cache_key(&self) -> String {
        let normalized = self.normalized();
        match utils_core::canonical::to_canonical_string(&normalized) {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(error = %err, "failed to canonicalize filter, using debug key");
                format!("{normalized:?}")
            }
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(project_id) = self.project_id
            && task.project_id != project_id
        {
            return false;
        }
        if let Some(milestone_id) = self.milestone_id
            && task.milestone_id != Some(milestone_id)
        {
            return false;
        }
        if !self.status.is_empty() && !self.status.contains(&task.status) {
            return false;
        }
        if !self.priority.is_empty() && !self.priority.contains(&task.priority) {
            return false;
        }
        if let Some(assignee_id) = self.assignee_id
            && task.assignee_id != Some(assignee_id)
        {
            return false;
        }
        if !self.tags.is_empty() {
            let task_tags: Vec<String> = task.tags.iter().map(|t| t.to_lowercase()).collect();
            if !self
                .tags
                .iter()
                .any(|tag| task_tags.contains(&tag.to_lowercase()))
            {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_title = task.title.to_lowercase().contains(&needle);
            let in_description = task
                .description
                .as_ref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            let in_tags = task
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle));
            if !(in_title || in_description || in_tags) {
                return false;
            }
        }
        if let Some(min) = self.progress_min
            && task.progress < min
        {
            return false;
        }
        if let Some(max) = self.progress_max
            && task.progress > max
        {
            return false;
        }
        if let Some(min) = self.story_points_min
            && task.story_points.is_none_or(|points| points < min)
        {
            return false;
        }
        if let Some(max) = self.story_points_max
            && task.story_points.is_none_or(|points| points > max)
        {
            return false;
        }
        if let Some(after) = self.created_after
            && task.created_at < after
        {
            return false;
        }
        if let Some(before) = self.created_before
            && task.created_at > before
        {
            return false;
        }
        if let Some(after) = self.due_after
            && task.due_date.is_none_or(|due| due < after)
        {
            return false;
        }
        if let Some(before) = self.due_before
            && task.due_date.is_none_or(|due| due > before)
        {
            return false;
        }
        true
    }

    pub fn compare(&self, a: &Task, b: &Task) -> std::cmp::Ordering {
        let ordering = match self.sort {
            TaskSort::Board => (a.status.column_position(), a.position)
                .cmp(&(b.status.column_position(), b.position)),
            TaskSort::CreatedAt => a.created_at.cmp(&b.created_at),
            TaskSort::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            TaskSort::DueDate => match (a.due_date, b.due_date) {
                (Some(a_due), Some(b_due)) => a_due.cmp(&b_due),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            },
            TaskSort::Priority => b.priority.rank().cmp(&a.priority.rank()),
            TaskSort::Progress => a.progress.cmp(&b.progress),
            TaskSort::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        };
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}
