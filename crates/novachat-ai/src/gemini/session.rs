//! One Gemini conversation: history plus the streaming request.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::{stream, Stream, StreamExt};
use tracing::debug;

use crate::streaming::{response_events, SseEvent};
use crate::{AiError, ChunkStream, RemoteSession};

use super::client::{parse_chunk, GeminiInner, Turn, TurnRole};

/// A stateful Gemini chat.
///
/// A turn joins the history only after its reply streamed to a clean end,
/// so a failed turn can simply be re-sent.
pub(crate) struct GeminiSession {
    inner: Arc<GeminiInner>,
    system_instruction: String,
    history: Arc<Mutex<Vec<Turn>>>,
}

impl GeminiSession {
    pub(crate) fn new(inner: Arc<GeminiInner>, system_instruction: &str) -> Self {
        Self {
            inner,
            system_instruction: system_instruction.to_string(),
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn history_snapshot(&self) -> Vec<Turn> {
        match self.history.lock() {
            Ok(history) => history.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl RemoteSession for GeminiSession {
    async fn stream_reply(&self, user_text: &str) -> Result<ChunkStream, AiError> {
        let credential = self
            .inner
            .credential
            .as_ref()
            .ok_or_else(|| AiError::Credential("Gemini API key missing".into()))?;

        let body =
            self.inner
                .build_request_body(&self.system_instruction, &self.history_snapshot(), user_text);

        debug!(model = %self.inner.config.model, "Gemini API streaming request");

        let response = self
            .inner
            .http
            .post(self.inner.stream_url())
            .header("content-type", "application/json")
            .header("x-goog-api-key", credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AiError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text = text.chars().take(200).collect::<String>();
            return Err(AiError::ApiError(format!("HTTP {status}: {text}")));
        }

        Ok(Box::pin(reply_chunks(
            response_events(response),
            Arc::clone(&self.history),
            user_text.to_string(),
        )))
    }
}

struct ReplyState<E> {
    events: std::pin::Pin<Box<E>>,
    history: Arc<Mutex<Vec<Turn>>>,
    user_text: String,
    reply: String,
}

impl<E> ReplyState<E> {
    fn commit(self) {
        let mut history = match self.history.lock() {
            Ok(history) => history,
            Err(poisoned) => poisoned.into_inner(),
        };
        history.push(Turn {
            role: TurnRole::User,
            text: self.user_text,
        });
        history.push(Turn {
            role: TurnRole::Model,
            text: self.reply,
        });
    }
}

/// Map SSE events to reply text, recording the turn on a clean end.
pub(crate) fn reply_chunks<E>(
    events: E,
    history: Arc<Mutex<Vec<Turn>>>,
    user_text: String,
) -> impl Stream<Item = Result<String, AiError>> + Send
where
    E: Stream<Item = Result<SseEvent, AiError>> + Send + 'static,
{
    let state = ReplyState {
        events: Box::pin(events),
        history,
        user_text,
        reply: String::new(),
    };

    stream::unfold(Some(state), |state| async move {
        let mut state = state?;
        loop {
            match state.events.next().await {
                Some(Ok(event)) => match parse_chunk(&event.data) {
                    Ok(Some(text)) => {
                        state.reply.push_str(&text);
                        return Some((Ok(text), Some(state)));
                    }
                    Ok(None) => continue,
                    Err(e) => return Some((Err(e), None)),
                },
                Some(Err(e)) => return Some((Err(e), None)),
                None => {
                    state.commit();
                    return None;
                }
            }
        }
    })
}
