use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use store::{
    BulkUpdateRequest, BulkUpdateSummary, CreateTask, HistoryEntry, MoveTaskRequest, Task,
    TaskFilter, TaskPage, TaskStatus, UpdateTask,
};
use ts_rs::TS;
use utils_core::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::load_task_middleware};

/// Common filters exposed as plain query parameters; the full filter
/// surface goes through `POST /tasks/search`.
#[derive(Debug, Default, Serialize, Deserialize, TS)]
pub struct TaskListQuery {
    pub project_id: Option<Uuid>,
    pub milestone_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<TaskListQuery> for TaskFilter {
    fn from(query: TaskListQuery) -> Self {
        TaskFilter {
            project_id: query.project_id,
            milestone_id: query.milestone_id,
            assignee_id: query.assignee_id,
            status: query.status.into_iter().collect(),
            search: query.search,
            page: query.page,
            limit: query.limit,
            ..TaskFilter::default()
        }
    }
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> Result<ResponseJson<ApiResponse<TaskPage>>, ApiError> {
    let page = state.store().list(&TaskFilter::from(query));
    Ok(ResponseJson(ApiResponse::success(page)))
}

pub async fn search_tasks(
    State(state): State<AppState>,
    Json(filter): Json<TaskFilter>,
) -> Result<ResponseJson<ApiResponse<TaskPage>>, ApiError> {
    let page = state.store().list(&filter);
    Ok(ResponseJson(ApiResponse::success(page)))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    tracing::debug!(
        "Creating task '{}' in project {}",
        payload.title,
        payload.project_id
    );
    let task = state.store().create(&payload)?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task(
    Extension(existing_task): Extension<Task>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = state.store().update(existing_task.id, &payload)?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn delete_task(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.store().delete(task.id)?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn move_task(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
    Json(payload): Json<MoveTaskRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state
        .store()
        .move_task(task.id, payload.status, payload.position)?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn bulk_update_tasks(
    State(state): State<AppState>,
    Json(payload): Json<BulkUpdateRequest>,
) -> Result<ResponseJson<ApiResponse<BulkUpdateSummary>>, ApiError> {
    let summary = state.store().bulk_update(&payload);
    Ok(ResponseJson(ApiResponse::success(summary)))
}

pub async fn task_history(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<HistoryEntry>>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(
        state.store().history(task.id),
    )))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let task_id_router = Router::new()
        .route(
            "/",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/move", post(move_task))
        .route("/history", get(task_history))
        .layer(from_fn_with_state(state.clone(), load_task_middleware));

    let inner = Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/search", post(search_tasks))
        .route("/bulk", post(bulk_update_tasks))
        .nest("/{task_id}", task_id_router);

    Router::new().nest("/tasks", inner)
}
