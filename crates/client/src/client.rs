use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use events::{
    EVENT_TASK_CREATED, EVENT_TASK_DELETED, EVENT_TASK_UPDATED, EventBus, TaskEventPayload,
};
use store::{
    BulkUpdateRequest, BulkUpdateSummary, CreateTask, Task, TaskFilter, TaskPage, TaskStatus,
    UpdateTask,
};
use uuid::Uuid;

use crate::cache::{CacheConfig, ListCache};
use crate::optimistic::OptimisticUpdates;
use crate::remote::{RemoteError, TaskRemote};

#[derive(Debug, Clone)]
pub struct CachedPage {
    pub page: TaskPage,
    /// Set when the page came from an expired cache entry because the
    /// backend was unreachable.
    pub is_stale: bool,
}

/// Consuming-side engine over any [`TaskRemote`]: response cache, working
/// set of records, and optimistic mutations with snapshot rollback.
///
/// Mutations apply the predicted state to the working set before the remote
/// call; success swaps in the server-confirmed record, failure restores the
/// snapshot and surfaces the error. There is no retry policy and in-flight
/// calls cannot be cancelled.
pub struct TaskClient<R: TaskRemote> {
    remote: R,
    cache: ListCache,
    optimistic: OptimisticUpdates,
    tasks: RwLock<HashMap<Uuid, Task>>,
    bus: Arc<EventBus>,
}

impl<R: TaskRemote> TaskClient<R> {
    pub fn new(remote: R, bus: Arc<EventBus>, config: CacheConfig) -> Self {
        Self {
            remote,
            cache: ListCache::new(config),
            optimistic: OptimisticUpdates::new(),
            tasks: RwLock::new(HashMap::new()),
            bus,
        }
    }

    /// Serve from cache while fresh; otherwise fetch and fill. A transport
    /// failure falls back to the last cached page for the same filter,
    /// marked stale. API rejections propagate as-is.
    pub async fn list(&self, filter: &TaskFilter) -> Result<CachedPage, RemoteError> {
        let key = filter.cache_key();
        if let Some(page) = self.cache.get_fresh(&key) {
            return Ok(CachedPage {
                page,
                is_stale: false,
            });
        }

        match self.remote.list(filter).await {
            Ok(page) => {
                self.cache.insert(key, page.clone());
                let mut tasks = self.tasks.write().unwrap();
                for task in &page.tasks {
                    tasks.insert(task.id, task.clone());
                }
                Ok(CachedPage {
                    page,
                    is_stale: false,
                })
            }
            Err(err) if err.is_transport() => match self.cache.get_any(&key) {
                Some((page, _)) => {
                    tracing::warn!(error = %err, "list fetch failed, serving stale cache entry");
                    Ok(CachedPage {
                        page,
                        is_stale: true,
                    })
                }
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Task, RemoteError> {
        let task = self.remote.get(id).await?;
        self.tasks.write().unwrap().insert(task.id, task.clone());
        Ok(task)
    }

    pub async fn create(&self, data: &CreateTask) -> Result<Task, RemoteError> {
        let task = self.remote.create(data).await?;
        self.tasks.write().unwrap().insert(task.id, task.clone());
        self.cache.clear();
        self.publish(EVENT_TASK_CREATED, &task);
        Ok(task)
    }

    pub async fn update(&self, id: Uuid, update: &UpdateTask) -> Result<Task, RemoteError> {
        if let Some(current) = self.task(id) {
            self.optimistic.snapshot(&current);
            let predicted = current.merged_with(update, Utc::now());
            self.tasks.write().unwrap().insert(id, predicted);
        }

        match self.remote.update(id, update).await {
            Ok(task) => {
                self.optimistic.discard(id);
                self.tasks.write().unwrap().insert(id, task.clone());
                self.cache.clear();
                self.publish(EVENT_TASK_UPDATED, &task);
                Ok(task)
            }
            Err(err) => {
                self.rollback(id);
                Err(err)
            }
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), RemoteError> {
        let removed = self.tasks.write().unwrap().remove(&id);
        if let Some(task) = &removed {
            self.optimistic.snapshot(task);
        }

        match self.remote.delete(id).await {
            Ok(()) => {
                self.optimistic.discard(id);
                self.cache.clear();
                if let Some(task) = &removed {
                    self.publish(EVENT_TASK_DELETED, task);
                }
                Ok(())
            }
            Err(err) => {
                self.rollback(id);
                Err(err)
            }
        }
    }

    pub async fn move_task(
        &self,
        id: Uuid,
        status: TaskStatus,
        position: i64,
    ) -> Result<(), RemoteError> {
        if let Some(current) = self.task(id) {
            self.optimistic.snapshot(&current);
            let mut predicted = current.merged_with(&UpdateTask::status(status), Utc::now());
            predicted.position = position;
            self.tasks.write().unwrap().insert(id, predicted);
        }

        match self.remote.move_task(id, status, position).await {
            Ok(()) => {
                self.optimistic.discard(id);
                self.cache.clear();
                if let Some(task) = self.task(id) {
                    self.publish(EVENT_TASK_UPDATED, &task);
                }
                Ok(())
            }
            Err(err) => {
                self.rollback(id);
                Err(err)
            }
        }
    }

    /// Bulk updates are not applied optimistically; the working set catches
    /// up on the next fetch.
    pub async fn bulk_update(
        &self,
        request: &BulkUpdateRequest,
    ) -> Result<BulkUpdateSummary, RemoteError> {
        let summary = self.remote.bulk_update(request).await?;
        if summary.successful > 0 {
            self.cache.clear();
        }
        Ok(summary)
    }

    /// Current working-set copy of a record, optimistic state included.
    pub fn task(&self, id: Uuid) -> Option<Task> {
        self.tasks.read().unwrap().get(&id).cloned()
    }

    pub fn pending_optimistic(&self) -> usize {
        self.optimistic.pending()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    fn rollback(&self, id: Uuid) {
        if let Some(snapshot) = self.optimistic.restore(id) {
            self.tasks.write().unwrap().insert(id, snapshot);
        }
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
