//! Gemini `generateContent` classifier.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error, warn};
use url::Url;

use super::Moderator;
use crate::config::ModerationConfig;
use crate::{PostboxError, Result};

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// User agent string for classifier requests.
const USER_AGENT: &str = "postbox/0.1 (moderation)";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Request body asking for a `{ "safe": boolean }` verdict on `text`.
pub fn build_request_body(text: &str) -> Value {
    let prompt = format!(
        "Analyze the following text for hate speech, severe profanity, harassment, \
         or sexually explicit content.\nText: \"{text}\"\n\nReturn JSON: {{ \"safe\": boolean }}"
    );

    json!({
        "contents": [
            { "role": "user", "parts": [ { "text": prompt } ] }
        ],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "safe": { "type": "BOOLEAN" }
                }
            }
        }
    })
}

/// Extract the verdict from a `generateContent` response body.
///
/// Returns `None` if the body is not a well-formed response. A well-formed
/// verdict allows the text only when it carries `safe: true`.
pub fn parse_verdict(body: &str) -> Option<bool> {
    let response: Value = serde_json::from_str(body).ok()?;
    let text = response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()?;

    let verdict: Value = serde_json::from_str(text).ok()?;
    if !verdict.is_object() {
        return None;
    }
    Some(verdict.get("safe") == Some(&Value::Bool(true)))
}

/// Moderator backed by the Gemini REST API.
pub struct GeminiModerator {
    client: Client,
    url: Url,
    api_key: String,
    timeout: Duration,
}

impl GeminiModerator {
    /// Create a moderator from configuration.
    pub fn new(config: &ModerationConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PostboxError::Moderation(format!("failed to create HTTP client: {e}")))?;

        let base = config.endpoint.trim_end_matches('/');
        let url = Url::parse(&format!(
            "{base}/v1beta/models/{}:generateContent",
            config.model
        ))
        .map_err(|e| PostboxError::Moderation(format!("invalid endpoint: {e}")))?;

        Ok(Self {
            client,
            url,
            api_key: config.api_key.trim().to_string(),
            timeout,
        })
    }

    /// Endpoint the classifier is called at.
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn classify(&self, text: &str) -> std::result::Result<Option<bool>, reqwest::Error> {
        let response = self
            .client
            .post(self.url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(build_request_body(text).to_string())
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        Ok(parse_verdict(&body))
    }
}

#[async_trait]
impl Moderator for GeminiModerator {
    async fn is_safe(&self, text: &str) -> bool {
        match tokio::time::timeout(self.timeout, self.classify(text)).await {
            Ok(Ok(Some(safe))) => {
                debug!(safe, "Moderation verdict");
                safe
            }
            Ok(Ok(None)) => {
                warn!("Malformed moderation response, allowing letter");
                true
            }
            Ok(Err(e)) => {
                error!(error = %e, "Moderation request failed, allowing letter");
                true
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Moderation timed out, allowing letter");
                true
            }
        }
    }
}
