use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::task::Task;

/// Whether adding the edge `task_id -> depends_on_id` would close a cycle.
///
/// The walk starts at the candidate prerequisite and follows dependency
/// edges; reaching `task_id` means the prerequisite already depends on the
/// task, directly or transitively. Ids not present in the table are dead
/// ends.
pub(crate) fn would_create_cycle(
    tasks: &HashMap<Uuid, Task>,
    task_id: Uuid,
    depends_on_id: Uuid,
) -> bool {
    if task_id == depends_on_id {
        return true;
    }

    let mut visited: HashSet<Uuid> = HashSet::new();
    let mut stack = vec![depends_on_id];
    while let Some(current) = stack.pop() {
        if current == task_id {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(task) = tasks.get(&current) {
            for dependency in &task.dependencies {
                stack.push(dependency.depends_on_id);
            }
        }
    }
    false
}

/// Ids of tasks whose dependency list references `id`.
pub(crate) fn dependents_of(tasks: &HashMap<Uuid, Task>, id: Uuid) -> Vec<Uuid> {
    tasks
        .values()
        .filter(|task| {
            task.id != id
                && task
                    .dependencies
                    .iter()
                    .any(|dependency| dependency.depends_on_id == id)
        })
        .map(|task| task.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;
    use crate::task::{CreateTask, TaskDependency};
    use crate::types::{ComplexityLevel, EffortLevel, RiskLevel, TaskPriority, TaskStatus};

    fn insert_task(tasks: &mut HashMap<Uuid, Task>, dependencies: Vec<TaskDependency>) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let data = CreateTask::from_title(Uuid::new_v4(), "t");
        tasks.insert(
            id,
            Task {
                id,
                project_id: data.project_id,
                milestone_id: None,
                title: data.title,
                description: None,
                status: TaskStatus::Todo,
                priority: TaskPriority::Medium,
                assignee_id: None,
                position: 0,
                tags: Vec::new(),
                estimated_hours: None,
                actual_hours: None,
                story_points: None,
                effort: EffortLevel::Medium,
                complexity: ComplexityLevel::Moderate,
                risk: RiskLevel::Low,
                progress: 0,
                dependencies,
                custom_fields: HashMap::new(),
                metadata: HashMap::new(),
                due_date: None,
                created_at: now,
                updated_at: now,
                completed_at: None,
            },
        );
        id
    }

    #[test]
    fn direct_cycle_is_detected() {
        let mut tasks = HashMap::new();
        let a = insert_task(&mut tasks, Vec::new());
        let b = insert_task(&mut tasks, vec![TaskDependency::on(a)]);

        // B depends on A; making A depend on B closes the loop.
        assert!(would_create_cycle(&tasks, a, b));
        assert!(!would_create_cycle(&tasks, b, a));
    }

    #[test]
    fn transitive_cycle_is_detected() {
        let mut tasks = HashMap::new();
        let a = insert_task(&mut tasks, Vec::new());
        let b = insert_task(&mut tasks, vec![TaskDependency::on(a)]);
        let c = insert_task(&mut tasks, vec![TaskDependency::on(b)]);

        assert!(would_create_cycle(&tasks, a, c));
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let tasks = HashMap::new();
        let id = Uuid::new_v4();
        assert!(would_create_cycle(&tasks, id, id));
    }

    #[test]
    fn dependents_are_found() {
        let mut tasks = HashMap::new();
        let a = insert_task(&mut tasks, Vec::new());
        let b = insert_task(&mut tasks, vec![TaskDependency::on(a)]);
        let _c = insert_task(&mut tasks, Vec::new());

        assert_eq!(dependents_of(&tasks, a), vec![b]);
        assert!(dependents_of(&tasks, b).is_empty());
    }
}
