use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::models::{
    CreateRequest, CreateResponse, MoveRequest, RequestsResponse, Task, Technician, TechniciansResponse,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Client for the maintenance tracker's HTTP API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.client.get(self.url(path)).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn list_technicians(&self) -> Result<Vec<Technician>, ApiError> {
        let response: TechniciansResponse = self.get_json("/api/technicians").await?;
        Ok(response.technicians)
    }

    pub async fn list_requests(&self) -> Result<Vec<Task>, ApiError> {
        let response: RequestsResponse = self.get_json("/api/requests").await?;
        Ok(response.requests)
    }

    /// Create a request. The body is decoded whatever the HTTP status, so a
    /// rejected request still carries the server's message.
    pub async fn create_request(&self, request: &CreateRequest) -> Result<CreateResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/api/requests"))
            .json(request)
            .send()
            .await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Persist a status change. The response body is ignored.
    pub async fn move_task(&self, request: &MoveRequest) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/kanban/move"))
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
