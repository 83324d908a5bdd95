use assignment::{
    AssignmentSuggestion, AutoAssignOutcome, CapacityCheck, TeamMemberProfile, WorkloadBalancePlan,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use store::Task;
use ts_rs::TS;
use utils_core::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct AssignRequest {
    pub member_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct CapacityRequest {
    pub hours: f64,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct BalanceRequest {
    pub member_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct AutoAssignRequest {
    pub task_ids: Vec<Uuid>,
}

pub async fn get_members(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<TeamMemberProfile>>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(state.engine().members())))
}

pub async fn upsert_member(
    State(state): State<AppState>,
    Json(profile): Json<TeamMemberProfile>,
) -> Result<ResponseJson<ApiResponse<TeamMemberProfile>>, ApiError> {
    state.engine().upsert_member(profile.clone());
    let stored = state.engine().member(profile.id)?;
    Ok(ResponseJson(ApiResponse::success(stored)))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Path(member_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if !state.engine().remove_member(member_id) {
        return Err(ApiError::NotFound(format!("member {member_id}")));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn suggest_assignees(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<AssignmentSuggestion>>>, ApiError> {
    let suggestions = state.engine().suggest_assignees(task_id)?;
    Ok(ResponseJson(ApiResponse::success(suggestions)))
}

pub async fn assign_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = state.engine().assign(task_id, payload.member_id)?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn check_capacity(
    State(state): State<AppState>,
    Path(member_id): Path<Uuid>,
    Json(payload): Json<CapacityRequest>,
) -> Result<ResponseJson<ApiResponse<CapacityCheck>>, ApiError> {
    let check = state.engine().check_capacity(member_id, payload.hours)?;
    Ok(ResponseJson(ApiResponse::success(check)))
}

pub async fn balance_workload(
    State(state): State<AppState>,
    Json(payload): Json<BalanceRequest>,
) -> Result<ResponseJson<ApiResponse<WorkloadBalancePlan>>, ApiError> {
    let plan = state.engine().balance_workload(&payload.member_ids)?;
    Ok(ResponseJson(ApiResponse::success(plan)))
}

pub async fn auto_assign(
    State(state): State<AppState>,
    Json(payload): Json<AutoAssignRequest>,
) -> Result<ResponseJson<ApiResponse<Vec<AutoAssignOutcome>>>, ApiError> {
    let outcomes = state.engine().auto_assign(&payload.task_ids)?;
    Ok(ResponseJson(ApiResponse::success(outcomes)))
}

pub fn router() -> Router<AppState> {
    let inner = Router::new()
        .route("/members", get(get_members).put(upsert_member))
        .route("/members/{member_id}", axum::routing::delete(remove_member))
        .route("/members/{member_id}/capacity", post(check_capacity))
        .route("/tasks/{task_id}/suggestions", get(suggest_assignees))
        .route("/tasks/{task_id}/assign", post(assign_task))
        .route("/balance", post(balance_workload))
        .route("/auto-assign", post(auto_assign));

    Router::new().nest("/assignments", inner)
}
