use crate::task::Task;

pub(crate) const MAX_TITLE_LEN: usize = 200;
pub(crate) const MAX_DESCRIPTION_LEN: usize = 10_000;
pub(crate) const MAX_TAGS: usize = 10;
pub(crate) const MAX_TAG_LEN: usize = 50;
pub(crate) const MAX_STORY_POINTS: u32 = 100;
pub(crate) const MAX_HOURS: f64 = 10_000.0;

/// Collect every violation instead of stopping at the first, so the caller
/// can report them all in one error.
pub(crate) fn validate_task(task: &Task) -> Vec<String> {
    let mut errors = Vec::new();

    if task.title.trim().is_empty() {
        errors.push("title cannot be empty".to_string());
    } else if task.title.chars().count() > MAX_TITLE_LEN {
        errors.push(format!("title cannot exceed {MAX_TITLE_LEN} characters"));
    }

    if let Some(description) = &task.description
        && description.chars().count() > MAX_DESCRIPTION_LEN
    {
        errors.push(format!(
            "description cannot exceed {MAX_DESCRIPTION_LEN} characters"
        ));
    }

    if task.tags.len() > MAX_TAGS {
        errors.push(format!("at most {MAX_TAGS} tags are allowed"));
    }
    for tag in &task.tags {
        if tag.trim().is_empty() {
            errors.push("tags cannot be empty".to_string());
        } else if tag.chars().count() > MAX_TAG_LEN {
            errors.push(format!("tag '{tag}' exceeds {MAX_TAG_LEN} characters"));
        }
    }

    if let Some(story_points) = task.story_points
        && story_points > MAX_STORY_POINTS
    {
        errors.push(format!("story points cannot exceed {MAX_STORY_POINTS}"));
    }

    if let Some(hours) = task.estimated_hours
        && !(0.0..=MAX_HOURS).contains(&hours)
    {
        errors.push(format!("estimated hours must be within 0..={MAX_HOURS}"));
    }
    if let Some(hours) = task.actual_hours
        && !(0.0..=MAX_HOURS).contains(&hours)
    {
        errors.push(format!("actual hours must be within 0..={MAX_HOURS}"));
    }

    if task.progress > 100 {
        errors.push("progress must be at most 100".to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::types::{ComplexityLevel, EffortLevel, RiskLevel, TaskPriority, TaskStatus};

    fn valid_task() -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            milestone_id: None,
            title: "Valid".to_string(),
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
            dependencies: Vec::new(),
            custom_fields: HashMap::new(),
            metadata: HashMap::new(),
            due_date: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    #[test]
    fn valid_task_has_no_errors() {
        assert!(validate_task(&valid_task()).is_empty());
    }

    #[test]
    fn violations_are_collected_not_short_circuited() {
        let mut task = valid_task();
        task.title = String::new();
        task.story_points = Some(MAX_STORY_POINTS + 1);
        task.estimated_hours = Some(-1.0);

        let errors = validate_task(&task);
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn tag_limits_are_enforced() {
        let mut task = valid_task();
        task.tags = (0..MAX_TAGS + 1).map(|i| format!("tag-{i}")).collect();
        let errors = validate_task(&task);
        assert_eq!(errors.len(), 1);

        let mut task = valid_task();
        task.tags = vec!["x".repeat(MAX_TAG_LEN + 1)];
        let errors = validate_task(&task);
        assert_eq!(errors.len(), 1);
    }
}
