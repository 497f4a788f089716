//! Client side of the summarization service contract.
//!
//! `POST {backend}/summarize` with a JSON body; the service answers with the
//! summaries, or with a `detail` message on failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, TransportError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummarizeRequest {
    pub text: String,
    pub min_length: u32,
    pub max_length: u32,
    pub num_beams: u32,
    pub extractive_k: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub abstractive: String,
    pub extractive: String,
    /// Generation parameters the service reports having used, shown verbatim.
    pub used_params: Option<Value>,
    /// Service-side remark, e.g. when only the extractive half was produced.
    pub note: Option<String>,
}

impl Summary {
    pub fn from_payload(payload: &Value) -> Result<Self, TransportError> {
        let object = payload
            .as_object()
            .ok_or_else(|| TransportError::Malformed("expected a JSON object".to_string()))?;
        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            abstractive: text("abstractive_summary")
                .or_else(|| text("summary"))
                .unwrap_or_default(),
            extractive: text("extractive_summary").unwrap_or_default(),
            used_params: object
                .get("used_generation_params")
                .filter(|v| !v.is_null())
                .cloned(),
            note: text("note"),
        })
    }
}

/// Message for a non-success response: the `detail` field when the body has
/// one, otherwise the status line.
pub fn rejection_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) if !detail.is_empty() => detail.clone(),
            Some(detail) if !detail.is_null() => detail.to_string(),
            _ => format!("HTTP {status}"),
        },
        _ => format!("HTTP {status}"),
    }
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, request: &SummarizeRequest) -> Result<Summary, TransportError>;
}

pub struct HttpSummarizer {
    client: Client,
    endpoint: Url,
}

impl HttpSummarizer {
    pub fn new(backend_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let raw = format!("{}/summarize", backend_url.trim_end_matches('/'));
        let endpoint = Url::parse(&raw).map_err(|e| ConfigError::InvalidBackendUrl {
            url: backend_url.to_string(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, request: &SummarizeRequest) -> Result<Summary, TransportError> {
        debug!(endpoint = %self.endpoint, chars = request.text.len(), "Posting summarize request");
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message: rejection_message(status, &body),
            });
        }

        let payload: Value =
            serde_json::from_str(&body).map_err(|e| TransportError::Malformed(e.to_string()))?;
        Summary::from_payload(&payload)
    }
}
