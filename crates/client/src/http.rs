//! reqwest-backed complaint client.

use async_trait::async_trait;
use campus_common::{AppError, AppResult, config::ApiConfig};
use campus_core::{ComplaintGateway, ComplaintSource, NewComment, StatusChange};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

const USER_AGENT: &str = concat!("campus-resolve/", env!("CARGO_PKG_VERSION"));

/// Client for the complaint endpoints.
#[derive(Clone)]
pub struct HttpComplaintClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
    student_id: Option<String>,
}

impl HttpComplaintClient {
    /// Create a client from configuration.
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| AppError::Config(format!("api.base_url {}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "api.base_url {} cannot carry a path",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            token: config.token.clone().filter(|t| !t.trim().is_empty()),
            student_id: None,
        })
    }

    /// Limit [`ComplaintSource::fetch_raw`] to one student's complaints.
    #[must_use]
    pub fn for_student(mut self, student_id: impl Into<String>) -> Self {
        self.student_id = Some(student_id.into());
        self
    }

    /// `GET /api/complaint/all`.
    pub async fn fetch_all(&self) -> AppResult<Vec<Value>> {
        let url = self.endpoint(&["api", "complaint", "all"])?;
        self.fetch_list(url).await
    }

    /// `GET /api/complaint/user/{uid}`.
    pub async fn fetch_for_student(&self, student_id: &str) -> AppResult<Vec<Value>> {
        let url = self.endpoint(&["api", "complaint", "user", student_id])?;
        self.fetch_list(url).await
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Config(format!(
                    "api.base_url {} cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_list(&self, url: Url) -> AppResult<Vec<Value>> {
        debug!(url = %url, "Fetching complaints");
        let response = self.authorize(self.client.get(url.clone())).send().await?;
        let response = check_status(response, &url).await?;

        match response.json::<Value>().await? {
            Value::Array(records) => Ok(records),
            other => {
                warn!(url = %url, "Complaint list response is not an array");
                Err(AppError::InvalidResponse(format!(
                    "expected an array of complaints, got {}",
                    kind_of(&other)
                )))
            }
        }
    }
}

#[async_trait]
impl ComplaintSource for HttpComplaintClient {
    async fn fetch_raw(&self) -> AppResult<Vec<Value>> {
        match &self.student_id {
            Some(student_id) => self.fetch_for_student(student_id).await,
            None => self.fetch_all().await,
        }
    }
}

#[async_trait]
impl ComplaintGateway for HttpComplaintClient {
    async fn update_status(&self, id: &str, change: &StatusChange) -> AppResult<()> {
        let url = self.endpoint(&["api", "complaint", id, "status"])?;
        debug!(url = %url, status = %change.status, "Updating complaint status");
        let response = self
            .authorize(self.client.put(url.clone()))
            .json(change)
            .send()
            .await?;
        check_status(response, &url).await?;
        Ok(())
    }

    async fn add_comment(&self, id: &str, comment: &NewComment) -> AppResult<Option<Value>> {
        let url = self.endpoint(&["api", "complaint", id, "comment"])?;
        debug!(url = %url, "Adding complaint comment");
        let response = self
            .authorize(self.client.post(url.clone()))
            .json(comment)
            .send()
            .await?;
        let response = check_status(response, &url).await?;

        // The backend may answer with plain text instead of the saved comment.
        let body = response.text().await?;
        Ok(serde_json::from_str::<Value>(&body)
            .ok()
            .filter(Value::is_object))
    }
}

/// Pass a successful response through; turn anything else into
/// [`AppError::Http`] carrying the server's message when it sent one.
async fn check_status(response: Response, url: &Url) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!(url = %url, status = %status, body = %body, "Complaint request failed");
    Err(AppError::Http {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Extract a message from an error body: `message`, then `error.message`,
/// then `error` as a string, then the raw text.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return Some(body.to_string());
    };

    let from_json = json
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| json.pointer("/error/message").and_then(Value::as_str))
        .or_else(|| json.get("error").and_then(Value::as_str))
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(ToString::to_string);

    match json {
        Value::String(text) if from_json.is_none() => Some(text),
        _ => from_json,
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
