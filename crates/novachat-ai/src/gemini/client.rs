//! Gemini API client: credential handling, request building and chunk parsing.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{AiError, CompletionService, RemoteSession};

use super::config::{Credential, GeminiConfig};
use super::session::GeminiSession;

pub(crate) const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Speaker of one turn in a Gemini conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    fn as_str(self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }
}

/// One completed turn of conversation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Turn {
    pub role: TurnRole,
    pub text: String,
}

/// State shared between the client and every session it opens.
#[derive(Debug)]
pub(crate) struct GeminiInner {
    pub config: GeminiConfig,
    pub credential: Option<Credential>,
    pub base_url: String,
    pub http: reqwest::Client,
}

/// Gemini API client.
///
/// The credential is resolved up front but only required when a session is
/// created, so a widget can be constructed before a key is configured.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    pub(crate) inner: Arc<GeminiInner>,
}

impl GeminiClient {
    /// Client using the credential from `GEMINI_API_KEY` or `API_KEY`.
    pub fn from_env(config: GeminiConfig) -> Result<Self, AiError> {
        Self::build(config, Credential::from_env())
    }

    /// Client with an explicit API key.
    pub fn with_api_key(config: GeminiConfig, api_key: impl Into<String>) -> Result<Self, AiError> {
        Self::build(config, Credential::new(api_key))
    }

    fn build(config: GeminiConfig, credential: Option<Credential>) -> Result<Self, AiError> {
        // Connect timeout only; the chat session bounds each chunk wait.
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| AiError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        if credential.is_none() {
            warn!("no Gemini credential configured; chat sessions will fail to start");
        }

        Ok(Self {
            inner: Arc::new(GeminiInner {
                config,
                credential,
                base_url: GEMINI_API_BASE.to_string(),
                http,
            }),
        })
    }

    /// Point the client at another API root (for proxies and tests).
    pub fn with_base_url(self, base_url: impl Into<String>) -> Self {
        let inner = &self.inner;
        Self {
            inner: Arc::new(GeminiInner {
                config: inner.config.clone(),
                credential: inner.credential.clone(),
                base_url: base_url.into(),
                http: inner.http.clone(),
            }),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.inner.credential.is_some()
    }

    pub fn model(&self) -> &str {
        &self.inner.config.model
    }
}

impl GeminiInner {
    pub(crate) fn stream_url(&self) -> String {
        format!(
            "{}/{}:streamGenerateContent?alt=sse",
            self.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Build the JSON request body for the Gemini API.
    pub(crate) fn build_request_body(
        &self,
        system_instruction: &str,
        history: &[Turn],
        user_text: &str,
    ) -> serde_json::Value {
        let contents: Vec<_> = history
            .iter()
            .map(|turn| (turn.role, turn.text.as_str()))
            .chain(std::iter::once((TurnRole::User, user_text)))
            .map(|(role, text)| {
                serde_json::json!({
                    "role": role.as_str(),
                    "parts": [{ "text": text }]
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": self.config.max_tokens,
                "temperature": self.config.temperature,
            }
        });

        if !system_instruction.is_empty() {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": system_instruction }]
            });
        }

        body
    }
}

/// Extract the reply text carried by one streamed SSE payload.
///
/// Returns `Ok(None)` for payloads without text (usage metadata, safety
/// ratings) and malformed JSON; an `error` object is a remote failure.
pub(crate) fn parse_chunk(data: &str) -> Result<Option<String>, AiError> {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(data) else {
        debug!(len = data.len(), "skipping non-JSON SSE payload");
        return Ok(None);
    };

    if let Some(error) = json.get("error") {
        let message = error["message"].as_str().unwrap_or("unknown error");
        let code = error["code"].as_u64().unwrap_or(0);
        return Err(AiError::ApiError(format!("{code}: {message}")));
    }

    let mut chunk = String::new();
    if let Some(candidates) = json["candidates"].as_array() {
        for candidate in candidates {
            if let Some(parts) = candidate["content"]["parts"].as_array() {
                for part in parts {
                    if let Some(t) = part["text"].as_str() {
                        chunk.push_str(t);
                    }
                }
            }
        }
    }

    Ok((!chunk.is_empty()).then_some(chunk))
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn create_session(
        &self,
        system_instruction: &str,
    ) -> Result<Box<dyn RemoteSession>, AiError> {
        if self.inner.credential.is_none() {
            return Err(AiError::Credential(
                "Gemini API not configured. Set GEMINI_API_KEY or API_KEY.".into(),
            ));
        }
        debug!(model = %self.inner.config.model, "Gemini session created");
        Ok(Box::new(GeminiSession::new(
            Arc::clone(&self.inner),
            system_instruction,
        )))
    }
}
