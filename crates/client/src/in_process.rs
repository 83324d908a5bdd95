use std::sync::Arc;

use async_trait::async_trait;
use store::{
    BulkUpdateRequest, BulkUpdateSummary, CreateTask, Task, TaskFilter, TaskPage, TaskStatus,
    TaskStore, UpdateTask,
};
use uuid::Uuid;

use crate::remote::{RemoteError, TaskRemote};

/// Backend served directly from an in-process store. Stands in for the
/// HTTP backend in tests and single-process deployments.
#[derive(Clone)]
pub struct InProcessRemote {
    store: Arc<TaskStore>,
}

impl InProcessRemote {
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }
}

#[async_trait]
impl TaskRemote for InProcessRemote {
    async fn list(&self, filter: &TaskFilter) -> Result<TaskPage, RemoteError> {
        Ok(self.store.list(filter))
    }

    async fn get(&self, id: Uuid) -> Result<Task, RemoteError> {
        Ok(self.store.get(id)?)
    }

    async fn create(&self, data: &CreateTask) -> Result<Task, RemoteError> {
        Ok(self.store.create(data)?)
    }

    async fn update(&self, id: Uuid, update: &UpdateTask) -> Result<Task, RemoteError> {
        Ok(self.store.update(id, update)?)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RemoteError> {
        Ok(self.store.delete(id)?)
    }

    async fn move_task(
        &self,
        id: Uuid,
        status: TaskStatus,
        position: i64,
    ) -> Result<(), RemoteError> {
        self.store.move_task(id, status, position)?;
        Ok(())
    }

    async fn bulk_update(
        &self,
        request: &BulkUpdateRequest,
    ) -> Result<BulkUpdateSummary, RemoteError> {
        Ok(self.store.bulk_update(request))
    }
}
