use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use store::TaskError;
use uuid::Uuid;

use crate::AppState;

/// Loads the task addressed by the `task_id` path segment into a request
/// extension, so id-scoped handlers get a `Extension<Task>` instead of
/// repeating the lookup.
pub async fn load_task_middleware(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    match state.store().get(task_id) {
        Ok(task) => {
            let mut request = request;
            request.extensions_mut().insert(task);
            Ok(next.run(request).await)
        }
        Err(TaskError::NotFound(_)) => {
            tracing::warn!("task {task_id} not found");
            Err(StatusCode::NOT_FOUND)
        }
        Err(error) => {
            tracing::error!("failed to load task {task_id}: {error}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
