use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use events::{
    EVENT_ASSIGNMENT_CREATED, EVENT_ASSIGNMENT_REMOVED, AssignmentEventPayload, EventBus,
};
use serde::{Deserialize, Serialize};
use store::{Task, TaskFilter, TaskStore, UpdateTask};
use strum_macros::Display;
use ts_rs::TS;
use uuid::Uuid;

use crate::config::AssignmentConfig;
use crate::error::AssignmentError;
use crate::profile::TeamMemberProfile;

const DEFAULT_HOURS_PER_WEEK: f64 = 40.0;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AssignmentScore {
    pub skills_match: f64,
    pub workload: f64,
    pub availability: f64,
    pub overall: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AssignmentSuggestion {
    pub member_id: Uuid,
    pub member_name: String,
    pub score: AssignmentScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CapacityRecommendation {
    /// Plenty of headroom left.
    Comfortable,
    /// Acceptable, but keep an eye on the load.
    Monitor,
    /// Over the accept threshold; shrink the ask before committing.
    ReduceScope,
    /// Over capacity outright.
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CapacityCheck {
    pub member_id: Uuid,
    pub requested_hours: f64,
    /// Committed fraction of weekly capacity after taking the work.
    pub projected_utilization: f64,
    pub can_accept: bool,
    pub recommendation: CapacityRecommendation,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ReassignmentProposal {
    pub task_id: Uuid,
    pub from_member: Uuid,
    pub to_member: Uuid,
    pub estimated_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct WorkloadBalancePlan {
    pub proposals: Vec<ReassignmentProposal>,
    pub score_before: f64,
    pub score_after: f64,
    pub improvement: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AutoAssignResult {
    Assigned { member_id: Uuid, score: f64 },
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AutoAssignOutcome {
    pub task_id: Uuid,
    pub result: AutoAssignResult,
}

/// Candidate scoring and workload planning over the team profile registry.
pub struct AssignmentEngine {
    store: Arc<TaskStore>,
    profiles: RwLock<HashMap<Uuid, TeamMemberProfile>>,
    config: AssignmentConfig,
    bus: Arc<EventBus>,
}

impl AssignmentEngine {
    pub fn new(store: Arc<TaskStore>, bus: Arc<EventBus>, config: AssignmentConfig) -> Self {
        Self {
            store,
            profiles: RwLock::new(HashMap::new()),
            config,
            bus,
        }
    }

    pub fn upsert_member(&self, mut profile: TeamMemberProfile) {
        if profile.availability.hours_per_week <= 0.0 {
            tracing::warn!(
                member_id = %profile.id,
                "hours_per_week must be positive, using default {DEFAULT_HOURS_PER_WEEK}"
            );
            profile.availability.hours_per_week = DEFAULT_HOURS_PER_WEEK;
        }
        self.profiles.write().unwrap().insert(profile.id, profile);
    }

    pub fn remove_member(&self, id: Uuid) -> bool {
        self.profiles.write().unwrap().remove(&id).is_some()
    }

    pub fn member(&self, id: Uuid) -> Result<TeamMemberProfile, AssignmentError> {
        self.profiles
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(AssignmentError::AssigneeNotFound(id))
    }

    pub fn members(&self) -> Vec<TeamMemberProfile> {
        let mut members: Vec<TeamMemberProfile> =
            self.profiles.read().unwrap().values().cloned().collect();
        members.sort_by(|a, b| a.name.cmp(&b.name));
        members
    }

    /// Rank every member as a candidate assignee for the task, best first.
    pub fn suggest_assignees(
        &self,
        task_id: Uuid,
    ) -> Result<Vec<AssignmentSuggestion>, AssignmentError> {
        let task = self.store.get(task_id)?;
        let profiles = self.profiles.read().unwrap();

        let vocabulary: HashSet<String> = profiles
            .values()
            .flat_map(|member| member.skills.iter())
            .map(|skill| skill.name.to_lowercase())
            .collect();
        let required = required_skills(&task, &vocabulary);

        let mut suggestions: Vec<AssignmentSuggestion> = profiles
            .values()
            .map(|member| {
                let score = self.score_candidate(member, &required);
                AssignmentSuggestion {
                    member_id: member.id,
                    member_name: member.name.clone(),
                    score,
                }
            })
            .collect();
        drop(profiles);

        suggestions.sort_by(|a, b| {
            b.score
                .overall
                .partial_cmp(&a.score.overall)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        suggestions.truncate(self.config.max_suggestions);
        Ok(suggestions)
    }

    fn score_candidate(
        &self,
        member: &TeamMemberProfile,
        required_skills: &[String],
    ) -> AssignmentScore {
        let skills_match = if required_skills.is_empty() {
            1.0
        } else {
            let matched = required_skills
                .iter()
                .filter(|skill| member.has_skill(skill))
                .count();
            matched as f64 / required_skills.len() as f64
        };

        let performance_scale =
            ((member.performance.reliability + member.performance.velocity) / 2.0).clamp(0.0, 1.0);
        let workload = (1.0 - member.utilization()).clamp(0.0, 1.0) * performance_scale;

        let availability = if member.is_blacked_out(Utc::now().date_naive()) {
            0.0
        } else {
            (member.remaining_hours() / member.availability.hours_per_week).clamp(0.0, 1.0)
        };

        let overall = self.config.skills_weight * skills_match
            + self.config.workload_weight * workload
            + self.config.availability_weight * availability;

        AssignmentScore {
            skills_match,
            workload,
            availability,
            overall,
        }
    }

    /// Project the member's utilization after adding `hours` of work.
    pub fn check_capacity(
        &self,
        member_id: Uuid,
        hours: f64,
    ) -> Result<CapacityCheck, AssignmentError> {
        let member = self.member(member_id)?;
        let projected =
            (member.workload.estimated_hours + hours) / member.availability.hours_per_week;
        let can_accept = projected <= self.config.capacity_accept_threshold;

        let recommendation = if projected <= self.config.capacity_comfortable_threshold {
            CapacityRecommendation::Comfortable
        } else if projected <= self.config.capacity_accept_threshold {
            CapacityRecommendation::Monitor
        } else if projected <= 1.0 {
            CapacityRecommendation::ReduceScope
        } else {
            CapacityRecommendation::Reject
        };

        Ok(CapacityCheck {
            member_id,
            requested_hours: hours,
            projected_utilization: projected,
            can_accept,
            recommendation,
        })
    }

    /// Assign the task, enforcing the capacity threshold. Replacing an
    /// existing assignee emits a removal for the previous member.
    pub fn assign(&self, task_id: Uuid, member_id: Uuid) -> Result<Task, AssignmentError> {
        let task = self.store.get(task_id)?;
        let hours = task.estimated_hours.unwrap_or(0.0);

        let check = self.check_capacity(member_id, hours)?;
        if !check.can_accept {
            return Err(AssignmentError::CapacityExceeded {
                member_id,
                projected: check.projected_utilization,
            });
        }

        let previous_assignee = task.assignee_id;
        let updated = self.store.update(
            task_id,
            &UpdateTask {
                assignee_id: Some(member_id),
                ..UpdateTask::default()
            },
        )?;

        {
            let mut profiles = self.profiles.write().unwrap();
            if let Some(previous) = previous_assignee
                && previous != member_id
                && let Some(profile) = profiles.get_mut(&previous)
            {
                profile.workload.active_tasks = profile.workload.active_tasks.saturating_sub(1);
                profile.workload.estimated_hours =
                    (profile.workload.estimated_hours - hours).max(0.0);
            }
            if let Some(profile) = profiles.get_mut(&member_id) {
                profile.workload.active_tasks += 1;
                profile.workload.estimated_hours += hours;
            }
        }

        if let Some(previous) = previous_assignee
            && previous != member_id
        {
            self.publish_assignment(EVENT_ASSIGNMENT_REMOVED, task_id, previous);
        }
        self.publish_assignment(EVENT_ASSIGNMENT_CREATED, task_id, member_id);
        Ok(updated)
    }

    /// Plan reassignments from members above the overload threshold to
    /// members below the underload threshold with overlapping skills. The
    /// plan is advisory; nothing is applied.
    pub fn balance_workload(
        &self,
        member_ids: &[Uuid],
    ) -> Result<WorkloadBalancePlan, AssignmentError> {
        let profiles = self.profiles.read().unwrap();
        let mut members = Vec::with_capacity(member_ids.len());
        for id in member_ids {
            members.push(
                profiles
                    .get(id)
                    .cloned()
                    .ok_or(AssignmentError::AssigneeNotFound(*id))?,
            );
        }
        drop(profiles);

        // Working copy of committed hours, adjusted as proposals accrue.
        let mut committed: HashMap<Uuid, f64> = members
            .iter()
            .map(|member| (member.id, member.workload.estimated_hours))
            .collect();
        let capacity: HashMap<Uuid, f64> = members
            .iter()
            .map(|member| (member.id, member.availability.hours_per_week))
            .collect();
        let utilization = |committed: &HashMap<Uuid, f64>, id: Uuid| -> f64 {
            committed.get(&id).copied().unwrap_or(0.0) / capacity.get(&id).copied().unwrap_or(1.0)
        };

        let score_before = balance_score(
            &members
                .iter()
                .map(|m| utilization(&committed, m.id))
                .collect::<Vec<_>>(),
        );

        let mut proposals = Vec::new();
        let overloaded: Vec<Uuid> = members
            .iter()
            .filter(|m| utilization(&committed, m.id) > self.config.overload_threshold)
            .map(|m| m.id)
            .collect();

        for donor_id in overloaded {
            let donor_tasks = self.store.list(&TaskFilter::for_assignee(donor_id));
            for task in donor_tasks.tasks {
                if utilization(&committed, donor_id) <= self.config.overload_threshold {
                    break;
                }
                if task.status.is_completed() {
                    continue;
                }
                let Some(hours) = task.estimated_hours.filter(|hours| *hours > 0.0) else {
                    continue;
                };

                let profiles = self.profiles.read().unwrap();
                let vocabulary: HashSet<String> = profiles
                    .values()
                    .flat_map(|member| member.skills.iter())
                    .map(|skill| skill.name.to_lowercase())
                    .collect();
                let required = required_skills(&task, &vocabulary);
                drop(profiles);

                let recipient = members.iter().find(|candidate| {
                    candidate.id != donor_id
                        && utilization(&committed, candidate.id) < self.config.underload_threshold
                        && (required.is_empty()
                            || required.iter().any(|skill| candidate.has_skill(skill)))
                        && (committed.get(&candidate.id).copied().unwrap_or(0.0) + hours)
                            / capacity.get(&candidate.id).copied().unwrap_or(1.0)
                            <= self.config.capacity_accept_threshold
                });

                if let Some(recipient) = recipient {
                    *committed.entry(donor_id).or_insert(0.0) -= hours;
                    *committed.entry(recipient.id).or_insert(0.0) += hours;
                    proposals.push(ReassignmentProposal {
                        task_id: task.id,
                        from_member: donor_id,
                        to_member: recipient.id,
                        estimated_hours: hours,
                    });
                }
            }
        }

        let score_after = balance_score(
            &members
                .iter()
                .map(|m| utilization(&committed, m.id))
                .collect::<Vec<_>>(),
        );

        Ok(WorkloadBalancePlan {
            proposals,
            score_before,
            score_after,
            improvement: score_after - score_before,
        })
    }

    /// Assign each task only when the top suggestion clears the confidence
    /// threshold; anything less is reported skipped rather than guessed.
    pub fn auto_assign(
        &self,
        task_ids: &[Uuid],
    ) -> Result<Vec<AutoAssignOutcome>, AssignmentError> {
        if !self.config.auto_assign_enabled {
            return Err(AssignmentError::FeatureDisabled);
        }

        let mut outcomes = Vec::with_capacity(task_ids.len());
        for task_id in task_ids {
            let result = match self.suggest_assignees(*task_id) {
                Ok(suggestions) => match suggestions.first() {
                    Some(top) if top.score.overall >= self.config.auto_assign_threshold => {
                        match self.assign(*task_id, top.member_id) {
                            Ok(_) => AutoAssignResult::Assigned {
                                member_id: top.member_id,
                                score: top.score.overall,
                            },
                            Err(err) => AutoAssignResult::Skipped {
                                reason: err.to_string(),
                            },
                        }
                    }
                    Some(top) => AutoAssignResult::Skipped {
                        reason: format!(
                            "best score {:.2} below threshold {:.2}",
                            top.score.overall, self.config.auto_assign_threshold
                        ),
                    },
                    None => AutoAssignResult::Skipped {
                        reason: "no candidates available".to_string(),
                    },
                },
                Err(err) => AutoAssignResult::Skipped {
                    reason: err.to_string(),
                },
            };
            outcomes.push(AutoAssignOutcome {
                task_id: *task_id,
                result,
            });
        }
        Ok(outcomes)
    }

    fn publish_assignment(&self, kind: &str, task_id: Uuid, assignee_id: Uuid) {
        match serde_json::to_value(AssignmentEventPayload {
            task_id,
            assignee_id,
        }) {
            Ok(payload) => self.bus.publish(kind, "assignment", task_id, payload),
            Err(err) => {
                tracing::warn!(%task_id, error = %err, "failed to encode assignment payload");
            }
        }
    }
}

/// Skills the task asks for: its tags, plus any term from the team's skill
/// vocabulary that appears in the title or description.
fn required_skills(task: &Task, vocabulary: &HashSet<String>) -> Vec<String> {
    let mut required: Vec<String> = task.tags.iter().map(|tag| tag.to_lowercase()).collect();

    let text = match &task.description {
        Some(description) => format!("{} {}", task.title, description).to_lowercase(),
        None => task.title.to_lowercase(),
    };
    for term in vocabulary {
        if text.contains(term.as_str()) && !required.contains(term) {
            required.push(term.clone());
        }
    }

    required.sort();
    required.dedup();
    required
}

/// 1.0 means perfectly even utilization; the spread is penalized by the
/// standard deviation.
fn balance_score(utilizations: &[f64]) -> f64 {
    if utilizations.is_empty() {
        return 1.0;
    }
    let mean = utilizations.iter().sum::<f64>() / utilizations.len() as f64;
    let variance = utilizations
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / utilizations.len() as f64;
    (1.0 - variance.sqrt()).max(0.0)
}

#[cfg(test)]
mod tests {
    use store::CreateTask;

    use super::*;
    use crate::profile::Skill;

    fn engine() -> (AssignmentEngine, Arc<TaskStore>) {
        let bus = Arc::new(EventBus::new());
        let store = Arc::new(TaskStore::new(bus.clone()));
        let engine = AssignmentEngine::new(store.clone(), bus, AssignmentConfig::default());
        (engine, store)
    }

    fn member_with(
        engine: &AssignmentEngine,
        name: &str,
        skills: &[&str],
        committed_hours: f64,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let mut profile = TeamMemberProfile::new(id, name, 40.0);
        profile.skills = skills.iter().map(|s| Skill::named(*s)).collect();
        profile.workload.estimated_hours = committed_hours;
        engine.upsert_member(profile);
        id
    }

    fn task_with_tags(store: &TaskStore, tags: &[&str], hours: Option<f64>) -> Task {
        let mut data = CreateTask::from_title(Uuid::new_v4(), "Implement API endpoint");
        data.tags = tags.iter().map(|t| t.to_string()).collect();
        data.estimated_hours = hours;
        store.create(&data).unwrap()
    }

    #[test]
    fn capacity_example_from_a_full_week() {
        let (engine, _store) = engine();
        let member = member_with(&engine, "Sam", &[], 35.0);

        let check = engine.check_capacity(member, 10.0).unwrap();
        assert!((check.projected_utilization - 1.125).abs() < 1e-9);
        assert!(!check.can_accept);
        assert_eq!(check.recommendation, CapacityRecommendation::Reject);
    }

    #[test]
    fn capacity_grades_scale_with_headroom() {
        let (engine, _store) = engine();
        let member = member_with(&engine, "Sam", &[], 10.0);

        let comfortable = engine.check_capacity(member, 5.0).unwrap();
        assert!(comfortable.can_accept);
        assert_eq!(
            comfortable.recommendation,
            CapacityRecommendation::Comfortable
        );

        let monitor = engine.check_capacity(member, 24.0).unwrap();
        assert!(monitor.can_accept);
        assert_eq!(monitor.recommendation, CapacityRecommendation::Monitor);

        let reduce = engine.check_capacity(member, 29.0).unwrap();
        assert!(!reduce.can_accept);
        assert_eq!(reduce.recommendation, CapacityRecommendation::ReduceScope);
    }

    #[test]
    fn skilled_idle_member_outranks_busy_unskilled_one() {
        let (engine, store) = engine();
        let skilled = member_with(&engine, "Ada", &["backend"], 4.0);
        let busy = member_with(&engine, "Bo", &[], 36.0);
        let task = task_with_tags(&store, &["backend"], Some(8.0));

        let suggestions = engine.suggest_assignees(task.id).unwrap();
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].member_id, skilled);
        assert_eq!(suggestions[1].member_id, busy);
        assert!(suggestions[0].score.skills_match > suggestions[1].score.skills_match);
    }

    #[test]
    fn suggestions_are_truncated_to_the_configured_max() {
        let (engine, store) = engine();
        for i in 0..8 {
            member_with(&engine, &format!("m{i}"), &[], 0.0);
        }
        let task = task_with_tags(&store, &[], None);
        let suggestions = engine.suggest_assignees(task.id).unwrap();
        assert_eq!(suggestions.len(), AssignmentConfig::default().max_suggestions);
    }

    #[test]
    fn assign_updates_task_and_workload_counters() {
        let (engine, store) = engine();
        let member = member_with(&engine, "Ada", &["backend"], 0.0);
        let task = task_with_tags(&store, &["backend"], Some(8.0));

        let updated = engine.assign(task.id, member).unwrap();
        assert_eq!(updated.assignee_id, Some(member));

        let profile = engine.member(member).unwrap();
        assert_eq!(profile.workload.active_tasks, 1);
        assert!((profile.workload.estimated_hours - 8.0).abs() < 1e-9);
    }

    #[test]
    fn assign_rejects_over_capacity_members() {
        let (engine, store) = engine();
        let member = member_with(&engine, "Ada", &[], 35.0);
        let task = task_with_tags(&store, &[], Some(10.0));

        let err = engine.assign(task.id, member).unwrap_err();
        assert_eq!(err.code(), "CAPACITY_EXCEEDED");
        assert!(store.get(task.id).unwrap().assignee_id.is_none());
    }

    #[test]
    fn auto_assign_skips_below_threshold() {
        let (engine, store) = engine();
        // Half-loaded member with no matching skill scores well under 0.8.
        member_with(&engine, "Bo", &["frontend"], 20.0);
        let task = task_with_tags(&store, &["backend"], Some(4.0));

        let outcomes = engine.auto_assign(&[task.id]).unwrap();
        assert!(matches!(
            outcomes[0].result,
            AutoAssignResult::Skipped { .. }
        ));
        assert!(store.get(task.id).unwrap().assignee_id.is_none());
    }

    #[test]
    fn auto_assign_assigns_confident_matches() {
        let (engine, store) = engine();
        let member = member_with(&engine, "Ada", &["backend"], 0.0);
        let task = task_with_tags(&store, &["backend"], Some(4.0));

        let outcomes = engine.auto_assign(&[task.id]).unwrap();
        match &outcomes[0].result {
            AutoAssignResult::Assigned { member_id, score } => {
                assert_eq!(*member_id, member);
                assert!(*score >= 0.8);
            }
            other => panic!("expected assignment, got {other:?}"),
        }
        assert_eq!(store.get(task.id).unwrap().assignee_id, Some(member));
    }

    #[test]
    fn auto_assign_respects_the_feature_flag() {
        let bus = Arc::new(EventBus::new());
        let store = Arc::new(TaskStore::new(bus.clone()));
        let config = AssignmentConfig {
            auto_assign_enabled: false,
            ..AssignmentConfig::default()
        };
        let engine = AssignmentEngine::new(store, bus, config);

        let err = engine.auto_assign(&[Uuid::new_v4()]).unwrap_err();
        assert_eq!(err.code(), "FEATURE_DISABLED");
    }

    #[test]
    fn balance_moves_work_from_overloaded_to_underloaded() {
        let (engine, store) = engine();
        let donor = member_with(&engine, "Don", &["backend"], 36.0);
        let recipient = member_with(&engine, "Rei", &["backend"], 4.0);

        let mut data = CreateTask::from_title(Uuid::new_v4(), "Heavy backend work");
        data.tags = vec!["backend".to_string()];
        data.estimated_hours = Some(8.0);
        data.assignee_id = Some(donor);
        let task = store.create(&data).unwrap();

        let plan = engine.balance_workload(&[donor, recipient]).unwrap();
        assert_eq!(plan.proposals.len(), 1);
        assert_eq!(plan.proposals[0].task_id, task.id);
        assert_eq!(plan.proposals[0].from_member, donor);
        assert_eq!(plan.proposals[0].to_member, recipient);
        assert!(plan.improvement > 0.0);
        // Advisory only: the task is untouched.
        assert_eq!(store.get(task.id).unwrap().assignee_id, Some(donor));
    }

    #[test]
    fn balance_requires_known_members() {
        let (engine, _store) = engine();
        let err = engine.balance_workload(&[Uuid::new_v4()]).unwrap_err();
        assert_eq!(err.code(), "ASSIGNEE_NOT_FOUND");
    }
}
