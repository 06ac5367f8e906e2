//! One user turn: append, stream the reply, settle.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use novachat_common::MessageId;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{AiError, RemoteSession};

use super::manager::{ChatSessionManager, Shared};
use super::message::Message;
use super::types::ChatError;

/// What a turn captured from the session when it started.
struct TurnContext {
    generation: u64,
    cancel: CancellationToken,
    remote: Option<Arc<dyn RemoteSession>>,
    system_instruction: String,
}

enum TurnOutcome {
    Completed { chunks: usize },
    /// Remote session could not be created.
    Unavailable(AiError),
    /// Transport or remote failure after the placeholder was appended.
    Failed(AiError),
    /// The session was reconfigured underneath this turn.
    Abandoned,
}

/// Clears `is_loading` if the turn's future is dropped before it settles.
struct LoadingGuard<'a> {
    shared: &'a Shared,
    generation: u64,
    armed: bool,
}

impl<'a> LoadingGuard<'a> {
    fn new(shared: &'a Shared, generation: u64) -> Self {
        Self {
            shared,
            generation,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!(generation = self.generation, "turn dropped before settling");
            self.shared
                .with_current(self.generation, |state| state.is_loading = false);
        }
    }
}

/// Await a remote call that must answer within `limit`.
async fn within<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, AiError>>,
) -> Result<T, AiError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(AiError::Timeout))
}

impl ChatSessionManager {
    /// Send a user message and stream the reply into the transcript.
    ///
    /// Blank text and sends while a reply is streaming are rejected without
    /// touching the transcript. Remote failures are never returned: they
    /// become a bot message with `is_error` set, and loading is cleared.
    pub async fn send_message(&self, text: impl Into<String>) -> Result<(), ChatError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let turn = {
            let mut state = self.shared.lock();
            if state.is_loading {
                return Err(ChatError::Busy);
            }
            state.transcript.push(Message::user(text.clone()));
            state.is_loading = true;
            self.shared.publish(&state);
            TurnContext {
                generation: state.generation,
                cancel: state.cancel.clone(),
                remote: state.remote.clone(),
                system_instruction: state.config.system_instruction.clone(),
            }
        };

        let mut guard = LoadingGuard::new(&self.shared, turn.generation);

        let outcome = tokio::select! {
            biased;
            _ = turn.cancel.cancelled() => TurnOutcome::Abandoned,
            outcome = self.run_turn(&turn, &text) => outcome,
        };

        guard.disarm();
        self.settle(turn.generation, outcome);
        Ok(())
    }

    async fn run_turn(&self, turn: &TurnContext, text: &str) -> TurnOutcome {
        let remote = match &turn.remote {
            Some(remote) => Arc::clone(remote),
            None => match self.open_remote(turn).await {
                Ok(Some(remote)) => remote,
                Ok(None) => return TurnOutcome::Abandoned,
                Err(e) => return TurnOutcome::Unavailable(e),
            },
        };

        let placeholder = Message::bot("");
        let placeholder_id = placeholder.id.clone();
        if self
            .shared
            .with_current(turn.generation, |state| state.transcript.push(placeholder))
            .is_none()
        {
            return TurnOutcome::Abandoned;
        }

        let stall_timeout = self.shared.options.stall_timeout;
        let mut stream = match within(stall_timeout, remote.stream_reply(text)).await {
            Ok(stream) => stream,
            Err(e) => return TurnOutcome::Failed(e),
        };

        let mut chunks = 0usize;
        loop {
            let next = match tokio::time::timeout(stall_timeout, stream.next()).await {
                Ok(next) => next,
                Err(_) => return TurnOutcome::Failed(AiError::Timeout),
            };
            match next {
                None => return TurnOutcome::Completed { chunks },
                Some(Err(e)) => return TurnOutcome::Failed(e),
                Some(Ok(chunk)) => {
                    if !self.append_chunk(turn.generation, &placeholder_id, &chunk) {
                        return TurnOutcome::Abandoned;
                    }
                    chunks += 1;
                }
            }
        }
    }

    /// Create the remote session and store it, unless the session moved on meanwhile.
    async fn open_remote(
        &self,
        turn: &TurnContext,
    ) -> Result<Option<Arc<dyn RemoteSession>>, AiError> {
        let created = within(
            self.shared.options.stall_timeout,
            self.shared.service.create_session(&turn.system_instruction),
        )
        .await?;
        let remote: Arc<dyn RemoteSession> = Arc::from(created);
        let stored = self.shared.with_current(turn.generation, |state| {
            state.remote = Some(Arc::clone(&remote));
        });
        Ok(stored.map(|()| remote))
    }

    fn append_chunk(&self, generation: u64, placeholder: &MessageId, chunk: &str) -> bool {
        self.shared
            .with_current(generation, |state| {
                if let Some(message) = state
                    .transcript
                    .iter_mut()
                    .rev()
                    .find(|m| &m.id == placeholder)
                {
                    message.text.push_str(chunk);
                }
            })
            .is_some()
    }

    fn settle(&self, generation: u64, outcome: TurnOutcome) {
        let notice = match outcome {
            TurnOutcome::Completed { chunks } => {
                debug!(generation, chunks, "reply complete");
                None
            }
            TurnOutcome::Unavailable(e) => {
                warn!(generation, error = %e, "chat service unavailable");
                Some(self.shared.options.unavailable_text.clone())
            }
            TurnOutcome::Failed(e) => {
                warn!(generation, error = %e, "chat reply failed");
                Some(self.shared.options.failure_text.clone())
            }
            TurnOutcome::Abandoned => {
                debug!(generation, "reply abandoned after reconfigure");
                return;
            }
        };

        self.shared.with_current(generation, |state| {
            if let Some(text) = notice {
                state.transcript.push(Message::error(text));
            }
            state.is_loading = false;
        });
    }
}
