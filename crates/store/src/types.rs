use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
    Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskStatus {
    Backlog,
    #[default]
    Todo,
    InProgress,
    InReview,
    Done,
    Cancelled,
}

impl TaskStatus {
    /// Rank of the column on the board; the default list order sorts by
    /// this before the task's position within the column.
    pub fn column_position(&self) -> i64 {
        match self {
            TaskStatus::Backlog => 0,
            TaskStatus::Todo => 1,
            TaskStatus::InProgress => 2,
            TaskStatus::InReview => 3,
            TaskStatus::Done => 4,
            TaskStatus::Cancelled => 5,
        }
    }

    /// Done is the only status that marks a task completed; Cancelled is
    /// terminal but never sets `completed_at`.
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
    Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn rank(&self) -> u8 {
        match self {
            TaskPriority::Low => 0,
            TaskPriority::Medium => 1,
            TaskPriority::High => 2,
            TaskPriority::Urgent => 3,
        }
    }
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
pub enum EffortLevel {
    Trivial,
    Small,
    #[default]
    Medium,
    Large,
    ExtraLarge,
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
pub enum ComplexityLevel {
    Simple,
    #[default]
    Moderate,
    Complex,
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
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DependencyKind {
    #[default]
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_columns_are_ordered() {
        assert!(TaskStatus::Backlog.column_position() < TaskStatus::Todo.column_position());
        assert!(TaskStatus::Todo.column_position() < TaskStatus::InProgress.column_position());
        assert!(TaskStatus::InReview.column_position() < TaskStatus::Done.column_position());
    }

    #[test]
    fn only_done_is_completed() {
        assert!(TaskStatus::Done.is_completed());
        assert!(!TaskStatus::Cancelled.is_completed());
        assert!(!TaskStatus::InProgress.is_completed());
    }

    #[test]
    fn status_round_trips_through_strings() {
        let parsed: TaskStatus = "inprogress".parse().unwrap();
        assert_eq!(parsed, TaskStatus::InProgress);
        assert_eq!(TaskStatus::InReview.to_string(), "inreview");
    }
}
