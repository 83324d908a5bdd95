use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Skill {
    pub name: String,
    /// Proficiency, 1 (novice) to 5 (expert).
    pub level: u8,
    pub weight: f64,
}

impl Skill {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: 3,
            weight: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Availability {
    pub hours_per_week: f64,
    #[serde(default)]
    pub blackout_dates: Vec<NaiveDate>,
}

/// Observed delivery factors, both within 0..=1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct PerformanceMetrics {
    pub reliability: f64,
    pub velocity: f64,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            reliability: 1.0,
            velocity: 1.0,
        }
    }
}

/// Currently committed work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct Workload {
    pub active_tasks: u32,
    pub estimated_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct TeamMemberProfile {
    pub id: Uuid,
    pub name: String,
    pub skills: Vec<Skill>,
    pub availability: Availability,
    #[serde(default)]
    pub performance: PerformanceMetrics,
    #[serde(default)]
    pub workload: Workload,
}

impl TeamMemberProfile {
    pub fn new(id: Uuid, name: impl Into<String>, hours_per_week: f64) -> Self {
        Self {
            id,
            name: name.into(),
            skills: Vec::new(),
            availability: Availability {
                hours_per_week,
                blackout_dates: Vec::new(),
            },
            performance: PerformanceMetrics::default(),
            workload: Workload::default(),
        }
    }

    /// Committed fraction of the weekly capacity.
    pub fn utilization(&self) -> f64 {
        if self.availability.hours_per_week <= 0.0 {
            return 1.0;
        }
        self.workload.estimated_hours / self.availability.hours_per_week
    }

    pub fn remaining_hours(&self) -> f64 {
        (self.availability.hours_per_week - self.workload.estimated_hours).max(0.0)
    }

    pub fn has_skill(&self, name: &str) -> bool {
        self.skills
            .iter()
            .any(|skill| skill.name.eq_ignore_ascii_case(name))
    }

    pub fn is_blacked_out(&self, date: NaiveDate) -> bool {
        self.availability.blackout_dates.contains(&date)
    }
}
