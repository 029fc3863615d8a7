//! Thin HTTP client for the hosted platform's REST endpoints

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::config::PlatformConfig;
use crate::error::{StoreError, StoreResult};

/// Platform client
#[derive(Debug, Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PlatformClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &PlatformConfig) -> Self {
        Self::new(&config.url, &config.anon_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an API path such as `/auth/v1/user`
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Headers every request carries: the project key, and a bearer which is
    /// the user's access token when acting for a session
    fn auth_headers(&self, access_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        let bearer = access_token.unwrap_or(&self.api_key);
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", bearer)) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    /// Start a request against `path`
    pub fn request(&self, method: Method, path: &str, access_token: Option<&str>) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .headers(self.auth_headers(access_token))
    }

    /// Send a request, turning non-success statuses into `StoreError`s that keep
    /// the platform's own message
    pub async fn send(&self, request: RequestBuilder) -> StoreResult<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        tracing::debug!("Platform request failed with {}: {}", status, message);

        Err(match status {
            StatusCode::NOT_FOUND => StoreError::NotFound(message),
            StatusCode::CONFLICT => StoreError::Conflict(message),
            _ => StoreError::Rejected {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Send a request and decode its JSON body
    pub async fn send_json<T: serde::de::DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// Pick the human readable part of a platform error body.
/// Auth endpoints use `msg` / `error_description`, storage and tables use `message`.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for field in ["message", "msg", "error_description", "error"] {
            if let Some(text) = value.get(field).and_then(Value::as_str) {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        body.to_string()
    }
}

/// Percent-encode each segment of a storage key, keeping the separators
pub fn encode_key(key: &str) -> String {
    key.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
