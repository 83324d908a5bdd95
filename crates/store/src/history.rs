use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::Display;
use ts_rs::TS;
use uuid::Uuid;

use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HistoryKind {
    Created,
    Updated,
    Moved,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct FieldChange {
    pub field: String,
    pub from: Value,
    pub to: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub kind: HistoryKind,
    pub changes: Vec<FieldChange>,
    pub at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(task_id: Uuid, kind: HistoryKind, changes: Vec<FieldChange>) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            kind,
            changes,
            at: Utc::now(),
        }
    }
}

/// Field-level diff of two task snapshots. `updated_at` always moves, so
/// it is excluded.
pub(crate) fn diff_tasks(before: &Task, after: &Task) -> Vec<FieldChange> {
    let before = match serde_json::to_value(before) {
        Ok(Value::Object(map)) => map,
        _ => return Vec::new(),
    };
    let after = match serde_json::to_value(after) {
        Ok(Value::Object(map)) => map,
        _ => return Vec::new(),
    };

    before
        .iter()
        .filter(|(field, _)| field.as_str() != "updated_at")
        .filter_map(|(field, old)| {
            let new = after.get(field).cloned().unwrap_or(Value::Null);
            if *old != new {
                Some(FieldChange {
                    field: field.clone(),
                    from: old.clone(),
                    to: new,
                })
            } else {
                None
            }
        })
        .collect()
}
