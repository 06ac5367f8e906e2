//! Interactive terminal chat with live config preview.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use novachat_ai::{
    ChatError, ChatSessionManager, GeminiClient, GeminiConfig, ManagerOptions, SessionConfig,
};
use novachat_common::{NovachatError, Result};
use novachat_config::{
    estimated_tokens, AgentConfig, ModelConfig, NovachatConfig, ReloadManager,
    SessionSettings,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::render::TranscriptRenderer;

pub fn session_config(agent: &AgentConfig) -> SessionConfig {
    SessionConfig::new(
        agent.system_instruction.clone(),
        agent.welcome_message.clone(),
    )
}

pub fn manager_options(session: &SessionSettings) -> ManagerOptions {
    ManagerOptions {
        stall_timeout: Duration::from_secs(u64::from(session.stall_timeout_secs)),
        failure_text: session.failure_message.clone(),
        unavailable_text: session.unavailable_message.clone(),
    }
}

pub fn gemini_config(model: &ModelConfig) -> GeminiConfig {
    GeminiConfig::new(model.name.clone())
        .with_max_tokens(model.max_tokens)
        .with_temperature(model.temperature)
}

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Blank,
    Reset,
    Quit,
    Message(String),
}

impl Input {
    fn parse(line: String) -> Self {
        match line.trim() {
            "" => Input::Blank,
            "/reset" => Input::Reset,
            "/quit" | "/sair" => Input::Quit,
            _ => Input::Message(line),
        }
    }
}

/// Run the chat until stdin closes or the user quits.
pub async fn run(config_path: PathBuf) -> Result<()> {
    let (mut current, mut config_rx) = ReloadManager::start(config_path).await?;

    let client = GeminiClient::from_env(gemini_config(&current.model))
        .map_err(|e| NovachatError::Ai(e.to_string()))?;
    if !client.has_credential() {
        warn!("no GEMINI_API_KEY or API_KEY set; replies will fail");
    }
    info!(
        model = client.model(),
        instruction_tokens = estimated_tokens(&current.agent.system_instruction),
        "starting chat"
    );

    let manager = ChatSessionManager::start_with_options(
        Arc::new(client),
        session_config(&current.agent),
        manager_options(&current.session),
    );
    let renderer = tokio::spawn(render_loop(manager.clone(), config_rx.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight: Option<JoinHandle<()>> = None;
    let mut watching = true;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Input::parse(line) {
                    Input::Blank => {}
                    Input::Quit => break,
                    Input::Reset => manager.reconfigure(session_config(&current.agent)),
                    Input::Message(text) => {
                        if manager.is_loading() {
                            eprintln!("(aguarde a resposta terminar)");
                            continue;
                        }
                        in_flight = Some(spawn_send(&manager, text));
                    }
                }
            }
            changed = config_rx.changed(), if watching => {
                if changed.is_err() {
                    warn!("config reload stopped; live preview disabled");
                    watching = false;
                    continue;
                }
                let updated = config_rx.borrow_and_update().clone();
                apply_config(&manager, &current, &updated);
                current = updated;
            }
        }
    }

    if let Some(turn) = in_flight {
        if let Err(e) = turn.await {
            warn!(error = %e, "send task failed");
        }
    }
    renderer.abort();
    Ok(())
}

fn spawn_send(manager: &ChatSessionManager, text: String) -> JoinHandle<()> {
    let manager = manager.clone();
    tokio::spawn(async move {
        match manager.send_message(text).await {
            Ok(()) => {}
            Err(ChatError::Busy) => eprintln!("(aguarde a resposta terminar)"),
            Err(e) => debug!(error = %e, "message rejected"),
        }
    })
}

/// Reset the chat when the persona changed. Other edits take effect on restart.
fn apply_config(manager: &ChatSessionManager, old: &NovachatConfig, new: &NovachatConfig) {
    if old.agent.session_differs(&new.agent) {
        info!("agent persona changed, resetting chat");
        manager.reconfigure(session_config(&new.agent));
    }
    if old.model != new.model || old.session != new.session {
        info!("model and session settings apply after restart");
    }
}

async fn render_loop(manager: ChatSessionManager, config_rx: watch::Receiver<NovachatConfig>) {
    let mut updates = manager.subscribe();
    let mut renderer = TranscriptRenderer::new();
    let mut stdout = std::io::stdout();

    loop {
        let out = {
            let snapshot = updates.borrow_and_update();
            let config = config_rx.borrow();
            renderer.render(&snapshot, &config.agent.bot_name)
        };
        if !out.is_empty() {
            let written = stdout
                .write_all(out.as_bytes())
                .and_then(|()| stdout.flush());
            if let Err(e) = written {
                warn!(error = %e, "failed to write transcript");
                return;
            }
        }
        if updates.changed().await.is_err() {
            return;
        }
    }
}
