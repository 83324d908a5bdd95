use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use events::{
    EVENT_TASK_CREATED, EVENT_TASK_DELETED, EVENT_TASK_UPDATED, EventBus, TaskEventPayload,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::TaskError;
use crate::filter::{DEFAULT_PAGE_SIZE, TaskFilter, TaskPage};
use crate::graph;
use crate::history::{HistoryEntry, HistoryKind, diff_tasks};
use crate::task::{CreateTask, Task, TaskDependency, UpdateTask};
use crate::types::TaskStatus;
use crate::validate::validate_task;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct BulkUpdateItem {
    pub task_id: Uuid,
    pub update: UpdateTask,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct BulkUpdateRequest {
    pub items: Vec<BulkUpdateItem>,
    #[serde(default)]
    pub continue_on_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct BulkItemOutcome {
    pub task_id: Uuid,
    pub error_code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct BulkUpdateSummary {
    pub requested: usize,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub outcomes: Vec<BulkItemOutcome>,
}

struct Inner {
    tasks: HashMap<Uuid, Task>,
    history: Vec<HistoryEntry>,
}

/// In-memory task table. Constructed explicitly and shared via `Arc`; all
/// mutations validate before touching the table and publish an event after
/// the lock is released.
pub struct TaskStore {
    inner: RwLock<Inner>,
    bus: Arc<EventBus>,
}

impl TaskStore {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                tasks: HashMap::new(),
                history: Vec::new(),
            }),
            bus,
        }
    }

    pub fn list(&self, filter: &TaskFilter) -> TaskPage {
        let filter = filter.normalized();
        let inner = self.inner.read().unwrap();
        let mut tasks: Vec<Task> = inner
            .tasks
            .values()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| filter.compare(a, b));

        let total = tasks.len();
        let page = filter.page.unwrap_or(1);
        let limit = filter.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = (page as usize - 1).saturating_mul(limit as usize);
        let tasks = tasks
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect();

        TaskPage {
            tasks,
            total,
            page,
            limit,
        }
    }

    pub fn get(&self, id: Uuid) -> Result<Task, TaskError> {
        self.inner
            .read()
            .unwrap()
            .tasks
            .get(&id)
            .cloned()
            .ok_or(TaskError::NotFound(id))
    }

    pub fn create(&self, data: &CreateTask) -> Result<Task, TaskError> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let mut inner = self.inner.write().unwrap();

        let status = data.status.unwrap_or_default();
        let mut task = Task {
            id,
            project_id: data.project_id,
            milestone_id: data.milestone_id,
            title: data.title.clone(),
            description: data.description.clone(),
            status,
            priority: data.priority.unwrap_or_default(),
            assignee_id: data.assignee_id,
            position: next_position(&inner.tasks, status, id),
            tags: data.tags.clone(),
            estimated_hours: data.estimated_hours,
            actual_hours: None,
            story_points: data.story_points,
            effort: data.effort.unwrap_or_default(),
            complexity: data.complexity.unwrap_or_default(),
            risk: data.risk.unwrap_or_default(),
            progress: data.progress.unwrap_or(0),
            dependencies: data.dependencies.clone(),
            custom_fields: data.custom_fields.clone(),
            metadata: data.metadata.clone(),
            due_date: data.due_date,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        if task.status.is_completed() {
            task.completed_at = Some(now);
            task.progress = 100;
        }

        // All checks happen before the table changes.
        let errors = validate_task(&task);
        if !errors.is_empty() {
            return Err(TaskError::Validation(errors));
        }
        check_dependencies(&inner.tasks, id, &task.dependencies)?;

        inner.tasks.insert(id, task.clone());
        inner
            .history
            .push(HistoryEntry::new(id, HistoryKind::Created, Vec::new()));
        drop(inner);

        tracing::debug!(task_id = %id, title = %task.title, "task created");
        self.publish(EVENT_TASK_CREATED, &task);
        Ok(task)
    }

    pub fn update(&self, id: Uuid, update: &UpdateTask) -> Result<Task, TaskError> {
        let now = Utc::now();
        let mut inner = self.inner.write().unwrap();
        let current = inner
            .tasks
            .get(&id)
            .cloned()
            .ok_or(TaskError::NotFound(id))?;

        let mut merged = current.merged_with(update, now);
        let errors = validate_task(&merged);
        if !errors.is_empty() {
            return Err(TaskError::Validation(errors));
        }
        if update.dependencies.is_some() {
            check_dependencies(&inner.tasks, id, &merged.dependencies)?;
        }
        // A status change through update drops the task at the end of its
        // new column; explicit placement goes through move_task.
        if merged.status != current.status {
            merged.position = next_position(&inner.tasks, merged.status, id);
        }

        let changes = diff_tasks(&current, &merged);
        inner.tasks.insert(id, merged.clone());
        if merged.status != current.status {
            reindex_column(&mut inner.tasks, current.status);
        }
        inner
            .history
            .push(HistoryEntry::new(id, HistoryKind::Updated, changes));
        drop(inner);

        self.publish(EVENT_TASK_UPDATED, &merged);
        Ok(merged)
    }

    pub fn delete(&self, id: Uuid) -> Result<(), TaskError> {
        let mut inner = self.inner.write().unwrap();
        if !inner.tasks.contains_key(&id) {
            return Err(TaskError::NotFound(id));
        }
        let dependents = graph::dependents_of(&inner.tasks, id);
        if !dependents.is_empty() {
            return Err(TaskError::Dependency(format!(
                "{} task(s) depend on {id}",
                dependents.len()
            )));
        }

        let removed = inner.tasks.remove(&id).ok_or(TaskError::NotFound(id))?;
        reindex_column(&mut inner.tasks, removed.status);
        inner
            .history
            .push(HistoryEntry::new(id, HistoryKind::Deleted, Vec::new()));
        drop(inner);

        tracing::debug!(task_id = %id, "task deleted");
        self.publish(EVENT_TASK_DELETED, &removed);
        Ok(())
    }

    /// Reassign status and position, shifting sibling positions in both the
    /// source and destination columns. `new_position` is clamped into the
    /// destination column's bounds.
    pub fn move_task(
        &self,
        id: Uuid,
        new_status: TaskStatus,
        new_position: i64,
    ) -> Result<Task, TaskError> {
        let now = Utc::now();
        let mut inner = self.inner.write().unwrap();
        let current = inner
            .tasks
            .get(&id)
            .cloned()
            .ok_or(TaskError::NotFound(id))?;
        let old_status = current.status;

        let mut column: Vec<(i64, Uuid)> = inner
            .tasks
            .values()
            .filter(|task| task.status == new_status && task.id != id)
            .map(|task| (task.position, task.id))
            .collect();
        column.sort();
        let mut ordered: Vec<Uuid> = column.into_iter().map(|(_, task_id)| task_id).collect();
        let index = (new_position.max(0) as usize).min(ordered.len());
        ordered.insert(index, id);

        let mut moved = current.clone();
        moved.status = new_status;
        moved.updated_at = now;
        let was_completed = old_status.is_completed();
        let is_completed = new_status.is_completed();
        if is_completed && !was_completed {
            moved.completed_at = Some(now);
            moved.progress = 100;
        } else if !is_completed && was_completed {
            moved.completed_at = None;
        }
        inner.tasks.insert(id, moved);

        for (position, task_id) in ordered.iter().enumerate() {
            if let Some(task) = inner.tasks.get_mut(task_id) {
                task.position = position as i64;
            }
        }
        if old_status != new_status {
            reindex_column(&mut inner.tasks, old_status);
        }

        let moved = inner
            .tasks
            .get(&id)
            .cloned()
            .ok_or(TaskError::NotFound(id))?;
        let changes = diff_tasks(&current, &moved);
        inner
            .history
            .push(HistoryEntry::new(id, HistoryKind::Moved, changes));
        drop(inner);

        self.publish(EVENT_TASK_UPDATED, &moved);
        Ok(moved)
    }

    /// Sequential per-item update with aggregated reporting. Stops at the
    /// first failure unless `continue_on_error` is set; items never reached
    /// count as skipped.
    pub fn bulk_update(&self, request: &BulkUpdateRequest) -> BulkUpdateSummary {
        let requested = request.items.len();
        let mut outcomes = Vec::with_capacity(requested);
        let mut successful = 0;
        let mut failed = 0;
        let mut processed = 0;

        for item in &request.items {
            processed += 1;
            match self.update(item.task_id, &item.update) {
                Ok(_) => {
                    successful += 1;
                    outcomes.push(BulkItemOutcome {
                        task_id: item.task_id,
                        error_code: None,
                        message: None,
                    });
                }
                Err(err) => {
                    failed += 1;
                    outcomes.push(BulkItemOutcome {
                        task_id: item.task_id,
                        error_code: Some(err.code().to_string()),
                        message: Some(err.to_string()),
                    });
                    if !request.continue_on_error {
                        tracing::warn!(
                            task_id = %item.task_id,
                            error = %err,
                            "bulk update stopped at first failure"
                        );
                        break;
                    }
                }
            }
        }

        BulkUpdateSummary {
            requested,
            processed,
            successful,
            failed,
            skipped: requested - processed,
            outcomes,
        }
    }

    pub fn history(&self, task_id: Uuid) -> Vec<HistoryEntry> {
        self.inner
            .read()
            .unwrap()
            .history
            .iter()
            .filter(|entry| entry.task_id == task_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn publish(&self, kind: &str, task: &Task) {
        match serde_json::to_value(TaskEventPayload {
            task_id: task.id,
            project_id: task.project_id,
        }) {
            Ok(payload) => self.bus.publish(kind, "task", task.id, payload),
            Err(err) => {
                tracing::warn!(task_id = %task.id, error = %err, "failed to encode event payload");
            }
        }
    }
}

fn next_position(tasks: &HashMap<Uuid, Task>, status: TaskStatus, exclude: Uuid) -> i64 {
    tasks
        .values()
        .filter(|task| task.status == status && task.id != exclude)
        .map(|task| task.position)
        .max()
        .map_or(0, |max| max + 1)
}

fn reindex_column(tasks: &mut HashMap<Uuid, Task>, status: TaskStatus) {
    let mut column: Vec<(i64, Uuid)> = tasks
        .values()
        .filter(|task| task.status == status)
        .map(|task| (task.position, task.id))
        .collect();
    column.sort();
    for (index, (_, id)) in column.into_iter().enumerate() {
        if let Some(task) = tasks.get_mut(&id) {
            task.position = index as i64;
        }
    }
}

fn check_dependencies(
    tasks: &HashMap<Uuid, Task>,
    task_id: Uuid,
    dependencies: &[TaskDependency],
) -> Result<(), TaskError> {
    let mut seen = HashSet::new();
    for dependency in dependencies {
        let dep_id = dependency.depends_on_id;
        if !seen.insert(dep_id) {
            return Err(TaskError::Dependency(format!(
                "duplicate dependency on {dep_id}"
            )));
        }
        if dep_id == task_id {
            return Err(TaskError::Dependency(
                "task cannot depend on itself".to_string(),
            ));
        }
        if !tasks.contains_key(&dep_id) {
            return Err(TaskError::Dependency(format!(
                "dependency target not found: {dep_id}"
            )));
        }
        if graph::would_create_cycle(tasks, task_id, dep_id) {
            return Err(TaskError::Dependency(format!(
                "dependency on {dep_id} would create a cycle"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::TaskSort;

    fn store() -> TaskStore {
        TaskStore::new(Arc::new(EventBus::new()))
    }

    fn create(store: &TaskStore, project_id: Uuid, title: &str) -> Task {
        store
            .create(&CreateTask::from_title(project_id, title))
            .unwrap()
    }

    #[test]
    fn create_assigns_sequential_positions_per_column() {
        let store = store();
        let project_id = Uuid::new_v4();
        let a = create(&store, project_id, "a");
        let b = create(&store, project_id, "b");
        assert_eq!(a.position, 0);
        assert_eq!(b.position, 1);
    }

    #[test]
    fn create_rejects_invalid_data_with_collected_errors() {
        let store = store();
        let mut data = CreateTask::from_title(Uuid::new_v4(), "");
        data.story_points = Some(1000);
        let err = store.create(&data).unwrap_err();
        match err {
            TaskError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(store.is_empty());
    }

    #[test]
    fn progress_stays_within_bounds_after_any_update() {
        let store = store();
        let task = create(&store, Uuid::new_v4(), "t");

        let updated = store.update(task.id, &UpdateTask::progress(250)).unwrap();
        assert_eq!(updated.progress, 100);

        let updated = store.update(task.id, &UpdateTask::progress(55)).unwrap();
        assert_eq!(updated.progress, 55);
    }

    #[test]
    fn completing_and_regressing_maintains_completed_at_invariant() {
        let store = store();
        let task = create(&store, Uuid::new_v4(), "t");

        let done = store
            .update(task.id, &UpdateTask::status(TaskStatus::Done))
            .unwrap();
        assert!(done.completed_at.is_some());
        assert_eq!(done.progress, 100);

        let reopened = store
            .update(task.id, &UpdateTask::status(TaskStatus::InProgress))
            .unwrap();
        assert!(reopened.completed_at.is_none());
    }

    #[test]
    fn cycle_completing_dependency_is_rejected_before_mutation() {
        let store = store();
        let project_id = Uuid::new_v4();
        let a = create(&store, project_id, "a");

        let mut b_data = CreateTask::from_title(project_id, "b");
        b_data.dependencies = vec![TaskDependency::on(a.id)];
        let b = store.create(&b_data).unwrap();

        // Making A depend on B must fail and leave A untouched.
        let update = UpdateTask {
            dependencies: Some(vec![TaskDependency::on(b.id)]),
            ..UpdateTask::default()
        };
        let err = store.update(a.id, &update).unwrap_err();
        assert_eq!(err.code(), "DEPENDENCY_ERROR");
        assert!(store.get(a.id).unwrap().dependencies.is_empty());
    }

    #[test]
    fn dependency_on_unknown_task_is_rejected() {
        let store = store();
        let mut data = CreateTask::from_title(Uuid::new_v4(), "t");
        data.dependencies = vec![TaskDependency::on(Uuid::new_v4())];
        let err = store.create(&data).unwrap_err();
        assert_eq!(err.code(), "DEPENDENCY_ERROR");
        assert!(store.is_empty());
    }

    #[test]
    fn delete_with_dependents_fails_and_leaves_store_unchanged() {
        let store = store();
        let project_id = Uuid::new_v4();
        let a = create(&store, project_id, "a");
        let mut b_data = CreateTask::from_title(project_id, "b");
        b_data.dependencies = vec![TaskDependency::on(a.id)];
        store.create(&b_data).unwrap();

        let err = store.delete(a.id).unwrap_err();
        assert_eq!(err.code(), "DEPENDENCY_ERROR");
        assert_eq!(store.len(), 2);
        assert!(store.get(a.id).is_ok());
    }

    #[test]
    fn move_reindexes_source_and_destination_columns() {
        let store = store();
        let project_id = Uuid::new_v4();
        let a = create(&store, project_id, "a");
        let b = create(&store, project_id, "b");
        let c = create(&store, project_id, "c");

        let moved = store.move_task(b.id, TaskStatus::InProgress, 0).unwrap();
        assert_eq!(moved.status, TaskStatus::InProgress);
        assert_eq!(moved.position, 0);

        // Source column closed the gap.
        assert_eq!(store.get(a.id).unwrap().position, 0);
        assert_eq!(store.get(c.id).unwrap().position, 1);

        // Moving into an occupied slot shifts the sibling down.
        let moved_a = store.move_task(a.id, TaskStatus::InProgress, 0).unwrap();
        assert_eq!(moved_a.position, 0);
        assert_eq!(store.get(b.id).unwrap().position, 1);
    }

    #[test]
    fn move_to_done_stamps_completion() {
        let store = store();
        let task = create(&store, Uuid::new_v4(), "t");
        let moved = store.move_task(task.id, TaskStatus::Done, 0).unwrap();
        assert!(moved.completed_at.is_some());
        assert_eq!(moved.progress, 100);
    }

    #[test]
    fn list_filters_sorts_and_paginates() {
        let store = store();
        let project_id = Uuid::new_v4();
        for i in 0..5 {
            create(&store, project_id, &format!("task {i}"));
        }
        create(&store, Uuid::new_v4(), "other project");

        let page = store.list(&TaskFilter {
            project_id: Some(project_id),
            limit: Some(2),
            page: Some(2),
            sort: TaskSort::Board,
            ..TaskFilter::default()
        });
        assert_eq!(page.total, 5);
        assert_eq!(page.tasks.len(), 2);
        assert_eq!(page.page, 2);
        assert_eq!(page.tasks[0].title, "task 2");
    }

    #[test]
    fn bulk_update_stops_at_first_failure_by_default() {
        let store = store();
        let project_id = Uuid::new_v4();
        let a = create(&store, project_id, "a");
        let b = create(&store, project_id, "b");

        let request = BulkUpdateRequest {
            items: vec![
                BulkUpdateItem {
                    task_id: a.id,
                    update: UpdateTask::progress(10),
                },
                BulkUpdateItem {
                    task_id: Uuid::new_v4(),
                    update: UpdateTask::progress(10),
                },
                BulkUpdateItem {
                    task_id: b.id,
                    update: UpdateTask::progress(10),
                },
            ],
            continue_on_error: false,
        };
        let summary = store.bulk_update(&request);
        assert_eq!(summary.requested, 3);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed + summary.successful, summary.processed);
        // The third task never ran.
        assert_eq!(store.get(b.id).unwrap().progress, 0);
    }

    #[test]
    fn bulk_update_continues_when_asked() {
        let store = store();
        let project_id = Uuid::new_v4();
        let a = create(&store, project_id, "a");
        let b = create(&store, project_id, "b");

        let request = BulkUpdateRequest {
            items: vec![
                BulkUpdateItem {
                    task_id: a.id,
                    update: UpdateTask::progress(10),
                },
                BulkUpdateItem {
                    task_id: Uuid::new_v4(),
                    update: UpdateTask::progress(10),
                },
                BulkUpdateItem {
                    task_id: b.id,
                    update: UpdateTask::progress(10),
                },
            ],
            continue_on_error: true,
        };
        let summary = store.bulk_update(&request);
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(store.get(b.id).unwrap().progress, 10);
    }

    #[test]
    fn history_records_lifecycle() {
        let store = store();
        let task = create(&store, Uuid::new_v4(), "t");
        store.update(task.id, &UpdateTask::progress(10)).unwrap();
        store.move_task(task.id, TaskStatus::InProgress, 0).unwrap();
        store.delete(task.id).unwrap();

        let history = store.history(task.id);
        let kinds: Vec<HistoryKind> = history.iter().map(|entry| entry.kind).collect();
        assert_eq!(
            kinds,
            vec![
                HistoryKind::Created,
                HistoryKind::Updated,
                HistoryKind::Moved,
                HistoryKind::Deleted,
            ]
        );

        let update_entry = &history[1];
        assert!(
            update_entry
                .changes
                .iter()
                .any(|change| change.field == "progress")
        );
    }

    #[test]
    fn mutations_publish_events() {
        let bus = Arc::new(EventBus::new());
        let store = TaskStore::new(bus.clone());
        let mut rx = bus.subscribe();

        let task = create(&store, Uuid::new_v4(), "t");
        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, EVENT_TASK_CREATED);
        assert_eq!(event.entity_id, task.id);
    }
}
