//! ChatSessionManager: shared state, lifecycle and observation.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{CompletionService, RemoteSession};

use super::message::Message;
use super::types::{ChatSnapshot, ManagerOptions, SessionConfig};

/// Mutable state of one conversation.
pub(super) struct SessionState {
    pub config: SessionConfig,
    pub transcript: Vec<Message>,
    pub is_loading: bool,
    pub generation: u64,
    /// Created on the first send of a generation, dropped on reconfigure.
    pub remote: Option<Arc<dyn RemoteSession>>,
    /// Cancelled when this generation is replaced.
    pub cancel: CancellationToken,
}

impl SessionState {
    fn fresh(config: SessionConfig, generation: u64) -> Self {
        let welcome = Message::bot(config.welcome_message.clone());
        Self {
            config,
            transcript: vec![welcome],
            is_loading: false,
            generation,
            remote: None,
            cancel: CancellationToken::new(),
        }
    }

    fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            transcript: self.transcript.clone(),
            is_loading: self.is_loading,
            generation: self.generation,
        }
    }
}

pub(super) struct Shared {
    state: Mutex<SessionState>,
    updates: watch::Sender<ChatSnapshot>,
    pub service: Arc<dyn CompletionService>,
    pub options: ManagerOptions,
}

impl Shared {
    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn publish(&self, state: &SessionState) {
        self.updates.send_replace(state.snapshot());
    }

    /// Apply `f` only if `generation` is still current, then notify observers.
    pub fn with_current<R>(
        &self,
        generation: u64,
        f: impl FnOnce(&mut SessionState) -> R,
    ) -> Option<R> {
        let mut state = self.lock();
        if state.generation != generation {
            return None;
        }
        let result = f(&mut state);
        self.publish(&state);
        Some(result)
    }
}

/// Owns one chat conversation and streams replies into its transcript.
///
/// Cloning yields another handle to the same conversation, so one task can
/// await [`send_message`](Self::send_message) while another calls
/// [`reconfigure`](Self::reconfigure) or renders snapshots.
#[derive(Clone)]
pub struct ChatSessionManager {
    pub(super) shared: Arc<Shared>,
}

impl ChatSessionManager {
    /// Start a session with the default options. No remote call is made yet.
    pub fn start(service: Arc<dyn CompletionService>, config: SessionConfig) -> Self {
        Self::start_with_options(service, config, ManagerOptions::default())
    }

    pub fn start_with_options(
        service: Arc<dyn CompletionService>,
        config: SessionConfig,
        options: ManagerOptions,
    ) -> Self {
        let state = SessionState::fresh(config, 0);
        let (updates, _) = watch::channel(state.snapshot());
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                updates,
                service,
                options,
            }),
        }
    }

    /// Reset to a single fresh welcome message under a new configuration.
    ///
    /// Any in-flight reply is abandoned: its transport is cancelled and its
    /// remaining chunks never reach the new transcript.
    pub fn reconfigure(&self, config: SessionConfig) {
        let mut state = self.shared.lock();
        state.cancel.cancel();
        let generation = state.generation + 1;
        let was_loading = state.is_loading;
        *state = SessionState::fresh(config, generation);
        self.shared.publish(&state);
        info!(generation, abandoned_turn = was_loading, "chat session reconfigured");
    }

    /// Subscribe to snapshots. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.shared.updates.subscribe()
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        self.shared.lock().snapshot()
    }

    pub fn transcript(&self) -> Vec<Message> {
        self.shared.lock().transcript.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.lock().is_loading
    }

    pub fn config(&self) -> SessionConfig {
        self.shared.lock().config.clone()
    }

    pub fn options(&self) -> &ManagerOptions {
        &self.shared.options
    }
}

impl std::fmt::Debug for ChatSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("ChatSessionManager")
            .field("generation", &state.generation)
            .field("messages", &state.transcript.len())
            .field("is_loading", &state.is_loading)
            .finish()
    }
}
