use async_trait::async_trait;
use serde::de::DeserializeOwned;
use store::{
    BulkUpdateRequest, BulkUpdateSummary, CreateTask, MoveTaskRequest, Task, TaskFilter, TaskPage,
    TaskStatus, UpdateTask,
};
use url::Url;
use utils_core::response::ApiResponse;
use uuid::Uuid;

use crate::remote::{RemoteError, TaskRemote};

/// HTTP implementation of the backend surface, speaking the `ApiResponse`
/// envelope of the task server.
pub struct HttpRemote {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpRemote {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> Result<Url, RemoteError> {
        self.base_url
            .join(path)
            .map_err(|err| RemoteError::Transport(format!("invalid url {path}: {err}")))
    }

    /// Unwrap the response envelope. `fallback_code` tags failures the
    /// envelope itself does not code (non-JSON error pages, missing
    /// `error_code`); fetches fall back to the HTTP status instead.
    async fn parse<T: DeserializeOwned>(
        response: reqwest::Response,
        fallback_code: Option<&str>,
    ) -> Result<T, RemoteError> {
        let status = response.status();
        let bytes = response.bytes().await?;
        let fallback =
            |status: reqwest::StatusCode| -> String {
                fallback_code
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("HTTP_{}", status.as_u16()))
            };

        match serde_json::from_slice::<ApiResponse<T>>(&bytes) {
            Ok(envelope) if envelope.success => envelope
                .data
                .ok_or_else(|| RemoteError::api("EMPTY_RESPONSE", "response carried no data")),
            Ok(envelope) => Err(RemoteError::Api {
                code: envelope.error_code.unwrap_or_else(|| fallback(status)),
                message: envelope.message.unwrap_or_default(),
            }),
            Err(_) if !status.is_success() => Err(RemoteError::Api {
                code: fallback(status),
                message: String::from_utf8_lossy(&bytes).into_owned(),
            }),
            Err(err) => Err(RemoteError::Decode(err)),
        }
    }

    /// Like `parse`, for endpoints whose envelope carries no data.
    async fn parse_unit(
        response: reqwest::Response,
        fallback_code: Option<&str>,
    ) -> Result<(), RemoteError> {
        let status = response.status();
        let bytes = response.bytes().await?;
        let fallback =
            |status: reqwest::StatusCode| -> String {
                fallback_code
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("HTTP_{}", status.as_u16()))
            };

        match serde_json::from_slice::<ApiResponse<serde_json::Value>>(&bytes) {
            Ok(envelope) if envelope.success => Ok(()),
            Ok(envelope) => Err(RemoteError::Api {
                code: envelope.error_code.unwrap_or_else(|| fallback(status)),
                message: envelope.message.unwrap_or_default(),
            }),
            Err(_) if !status.is_success() => Err(RemoteError::Api {
                code: fallback(status),
                message: String::from_utf8_lossy(&bytes).into_owned(),
            }),
            Err(err) => Err(RemoteError::Decode(err)),
        }
    }
}

#[async_trait]
impl TaskRemote for HttpRemote {
    async fn list(&self, filter: &TaskFilter) -> Result<TaskPage, RemoteError> {
        let response = self
            .http
            .post(self.url("api/tasks/search")?)
            .json(filter)
            .send()
            .await?;
        Self::parse(response, None).await
    }

    async fn get(&self, id: Uuid) -> Result<Task, RemoteError> {
        let response = self
            .http
            .get(self.url(&format!("api/tasks/{id}"))?)
            .send()
            .await?;
        Self::parse(response, None).await
    }

    async fn create(&self, data: &CreateTask) -> Result<Task, RemoteError> {
        let response = self
            .http
            .post(self.url("api/tasks")?)
            .json(data)
            .send()
            .await?;
        Self::parse(response, Some("CREATE_FAILED")).await
    }

    async fn update(&self, id: Uuid, update: &UpdateTask) -> Result<Task, RemoteError> {
        let response = self
            .http
            .put(self.url(&format!("api/tasks/{id}"))?)
            .json(update)
            .send()
            .await?;
        Self::parse(response, Some("UPDATE_FAILED")).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RemoteError> {
        let response = self
            .http
            .delete(self.url(&format!("api/tasks/{id}"))?)
            .send()
            .await?;
        Self::parse_unit(response, Some("DELETE_FAILED")).await
    }

    async fn move_task(
        &self,
        id: Uuid,
        status: TaskStatus,
        position: i64,
    ) -> Result<(), RemoteError> {
        let response = self
            .http
            .post(self.url(&format!("api/tasks/{id}/move"))?)
            .json(&MoveTaskRequest { status, position })
            .send()
            .await?;
        Self::parse_unit(response, Some("MOVE_FAILED")).await
    }

    async fn bulk_update(
        &self,
        request: &BulkUpdateRequest,
    ) -> Result<BulkUpdateSummary, RemoteError> {
        let response = self
            .http
            .post(self.url("api/tasks/bulk")?)
            .json(request)
            .send()
            .await?;
        Self::parse(response, Some("BULK_UPDATE_FAILED")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_against_the_base() {
        let remote = HttpRemote::new(Url::parse("http://localhost:8787/").unwrap());
        assert_eq!(
            remote.url("api/tasks").unwrap().as_str(),
            "http://localhost:8787/api/tasks"
        );
    }
}
