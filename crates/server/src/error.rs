use assignment::AssignmentError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use store::TaskError;
use thiserror::Error;
use utils_core::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    fn code(&self) -> &str {
        match self {
            ApiError::Task(err) => err.code(),
            ApiError::Assignment(err) => err.code(),
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Task(err) => task_status(err),
            ApiError::Assignment(err) => match err {
                AssignmentError::Task(inner) => task_status(inner),
                AssignmentError::AssigneeNotFound(_) => StatusCode::NOT_FOUND,
                AssignmentError::CapacityExceeded { .. } => StatusCode::CONFLICT,
                AssignmentError::FeatureDisabled => StatusCode::FORBIDDEN,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn task_status(err: &TaskError) -> StatusCode {
    match err {
        TaskError::Validation(_) => StatusCode::BAD_REQUEST,
        TaskError::NotFound(_) => StatusCode::NOT_FOUND,
        TaskError::Dependency(_) => StatusCode::CONFLICT,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let code = self.code().to_string();
        let message = self.to_string();

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                code,
                error = %self,
                "API request failed"
            );
        }
        let response = ApiResponse::<()>::error_with_code(&code, &message);
        (status_code, Json(response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn task_errors_map_to_expected_http_statuses() {
        assert_eq!(
            ApiError::from(TaskError::Validation(vec!["bad".to_string()]))
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(TaskError::NotFound(Uuid::new_v4()))
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(TaskError::Dependency("cycle".to_string()))
                .into_response()
                .status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn assignment_errors_map_to_expected_http_statuses() {
        assert_eq!(
            ApiError::from(AssignmentError::AssigneeNotFound(Uuid::new_v4()))
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(AssignmentError::CapacityExceeded {
                member_id: Uuid::new_v4(),
                projected: 1.2,
            })
            .into_response()
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(AssignmentError::FeatureDisabled)
                .into_response()
                .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(AssignmentError::Task(TaskError::NotFound(Uuid::new_v4())))
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn generic_errors_map_to_expected_http_statuses() {
        assert_eq!(
            ApiError::BadRequest("bad".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal("boom".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
