use std::collections::HashMap;
use std::sync::Mutex;

use store::Task;
use uuid::Uuid;

/// Snapshot-before-mutate side map. The snapshot taken before an optimistic
/// mutation is either discarded on success or restored verbatim on failure;
/// restoration is always a full single-record replace.
#[derive(Default)]
pub struct OptimisticUpdates {
    snapshots: Mutex<HashMap<Uuid, Task>>,
}

impl OptimisticUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self, task: &Task) {
        self.snapshots
            .lock()
            .unwrap()
            .insert(task.id, task.clone());
    }

    pub fn discard(&self, id: Uuid) -> Option<Task> {
        self.snapshots.lock().unwrap().remove(&id)
    }

    pub fn restore(&self, id: Uuid) -> Option<Task> {
        self.snapshots.lock().unwrap().remove(&id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.snapshots.lock().unwrap().contains_key(&id)
    }

    pub fn pending(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }
}
