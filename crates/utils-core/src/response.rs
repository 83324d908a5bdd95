use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Envelope for every HTTP response body. `error_code` carries the stable
/// machine-readable code of the domain error, `message` the human-readable
/// description.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub error_code: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error_code: None,
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.to_string()),
            error_code: None,
        }
    }

    pub fn error_with_code(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.to_string()),
            error_code: Some(code.to_string()),
        }
    }
}
