use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream;
use tokio::sync::{mpsc, oneshot, watch};

use super::*;
use crate::{AiError, ChunkStream, CompletionService, RemoteSession};

type ChunkResult = Result<String, AiError>;

enum Reply {
    /// Yield these items, then end.
    Chunks(Vec<ChunkResult>),
    /// Yield whatever the test pushes, ending when the sender drops.
    Live(mpsc::UnboundedReceiver<ChunkResult>),
    /// `stream_reply` itself fails.
    Refuse(AiError),
}

#[derive(Default)]
struct StubState {
    replies: VecDeque<Reply>,
    instructions: Vec<String>,
    prompts: Vec<String>,
    missing_credential: bool,
    /// When set, the next `create_session` waits for this before answering.
    create_gate: Option<oneshot::Receiver<()>>,
}

#[derive(Clone, Default)]
struct StubService {
    state: Arc<Mutex<StubState>>,
}

impl StubService {
    fn with_replies(replies: Vec<Reply>) -> Self {
        let stub = Self::default();
        stub.state.lock().unwrap().replies = replies.into();
        stub
    }

    fn without_credential() -> Self {
        let stub = Self::default();
        stub.state.lock().unwrap().missing_credential = true;
        stub
    }

    /// Hold the next `create_session` until the returned sender fires.
    fn gate_create(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().unwrap().create_gate = Some(rx);
        tx
    }

    fn push(&self, reply: Reply) {
        self.state.lock().unwrap().replies.push_back(reply);
    }

    fn instructions(&self) -> Vec<String> {
        self.state.lock().unwrap().instructions.clone()
    }

    fn prompts(&self) -> Vec<String> {
        self.state.lock().unwrap().prompts.clone()
    }
}

struct StubSession {
    state: Arc<Mutex<StubState>>,
}

#[async_trait]
impl CompletionService for StubService {
    async fn create_session(
        &self,
        system_instruction: &str,
    ) -> Result<Box<dyn RemoteSession>, AiError> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.instructions.push(system_instruction.to_string());
            state.create_gate.take()
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let state = self.state.lock().unwrap();
        if state.missing_credential {
            return Err(AiError::Credential("no key".into()));
        }
        Ok(Box::new(StubSession {
            state: Arc::clone(&self.state),
        }))
    }
}

#[async_trait]
impl RemoteSession for StubSession {
    async fn stream_reply(&self, user_text: &str) -> Result<ChunkStream, AiError> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.prompts.push(user_text.to_string());
            state.replies.pop_front()
        };
        match reply {
            None => Ok(Box::pin(stream::empty())),
            Some(Reply::Chunks(items)) => Ok(Box::pin(stream::iter(items))),
            Some(Reply::Live(rx)) => Ok(Box::pin(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            }))),
            Some(Reply::Refuse(e)) => Err(e),
        }
    }
}

fn chunks(parts: &[&str]) -> Reply {
    Reply::Chunks(parts.iter().map(|p| Ok(p.to_string())).collect())
}

fn manager(stub: &StubService) -> ChatSessionManager {
    ChatSessionManager::start(
        Arc::new(stub.clone()),
        SessionConfig::new("Be helpful", "Hi!"),
    )
}

async fn wait_for(
    rx: &mut watch::Receiver<ChatSnapshot>,
    pred: impl FnMut(&ChatSnapshot) -> bool,
) -> ChatSnapshot {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("timed out waiting for snapshot")
        .expect("manager dropped")
        .clone()
}

fn texts(transcript: &[Message]) -> Vec<(Sender, String, bool)> {
    transcript
        .iter()
        .map(|m| (m.sender, m.text.clone(), m.is_error))
        .collect()
}

#[tokio::test]
async fn start_shows_only_welcome() {
    let stub = StubService::default();
    let chat = manager(&stub);

    let snap = chat.snapshot();
    assert_eq!(texts(&snap.transcript), vec![(Sender::Bot, "Hi!".into(), false)]);
    assert!(!snap.is_loading);
    assert!(stub.instructions().is_empty());
}

#[tokio::test]
async fn blank_config_falls_back_to_defaults() {
    let stub = StubService::with_replies(vec![chunks(&["ok"])]);
    let chat = ChatSessionManager::start(Arc::new(stub.clone()), SessionConfig::new("  ", ""));

    assert_eq!(chat.transcript()[0].text, DEFAULT_WELCOME);
    chat.send_message("hello").await.unwrap();
    assert_eq!(stub.instructions(), vec![DEFAULT_INSTRUCTION.to_string()]);
}

#[tokio::test]
async fn streamed_reply_is_concatenated() {
    let stub = StubService::with_replies(vec![chunks(&["Ol", "á, ", "tudo bem?"])]);
    let chat = manager(&stub);

    chat.send_message("Oi").await.unwrap();

    let snap = chat.snapshot();
    assert_eq!(
        texts(&snap.transcript),
        vec![
            (Sender::Bot, "Hi!".into(), false),
            (Sender::User, "Oi".into(), false),
            (Sender::Bot, "Olá, tudo bem?".into(), false),
        ]
    );
    assert!(!snap.is_loading);
    assert_eq!(stub.prompts(), vec!["Oi".to_string()]);
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let stub = StubService::default();
    let chat = manager(&stub);

    assert_eq!(chat.send_message("").await, Err(ChatError::EmptyMessage));
    assert_eq!(chat.send_message(" \n\t").await, Err(ChatError::EmptyMessage));
    assert_eq!(chat.transcript().len(), 1);
    assert!(stub.instructions().is_empty());
}

#[tokio::test]
async fn message_text_is_kept_verbatim() {
    let stub = StubService::with_replies(vec![chunks(&["x"])]);
    let chat = manager(&stub);

    chat.send_message("  spaced  ").await.unwrap();
    assert_eq!(chat.transcript()[1].text, "  spaced  ");
    assert_eq!(stub.prompts(), vec!["  spaced  ".to_string()]);
}

#[tokio::test]
async fn mid_stream_failure_keeps_partial_and_appends_error() {
    let stub = StubService::with_replies(vec![Reply::Chunks(vec![
        Ok("Parcial".into()),
        Err(AiError::NetworkError("reset".into())),
    ])]);
    let chat = manager(&stub);

    chat.send_message("Oi").await.unwrap();

    let snap = chat.snapshot();
    let failure = chat.options().failure_text.clone();
    assert_eq!(
        texts(&snap.transcript),
        vec![
            (Sender::Bot, "Hi!".into(), false),
            (Sender::User, "Oi".into(), false),
            (Sender::Bot, "Parcial".into(), false),
            (Sender::Bot, failure, true),
        ]
    );
    assert!(!snap.is_loading);
}

#[tokio::test]
async fn refused_stream_keeps_empty_placeholder() {
    let stub = StubService::with_replies(vec![Reply::Refuse(AiError::RateLimited)]);
    let chat = manager(&stub);

    chat.send_message("Oi").await.unwrap();

    let transcript = chat.transcript();
    assert_eq!(transcript.len(), 4);
    assert_eq!(transcript[2].text, "");
    assert!(!transcript[2].is_error);
    assert!(transcript[3].is_error);
    assert!(!chat.is_loading());
}

#[tokio::test]
async fn missing_credential_appends_unavailable_notice() {
    let stub = StubService::without_credential();
    let chat = manager(&stub);

    chat.send_message("Oi").await.unwrap();

    let transcript = chat.transcript();
    let unavailable = chat.options().unavailable_text.clone();
    assert_eq!(
        texts(&transcript),
        vec![
            (Sender::Bot, "Hi!".into(), false),
            (Sender::User, "Oi".into(), false),
            (Sender::Bot, unavailable, true),
        ]
    );
    assert!(!chat.is_loading());
    assert!(stub.prompts().is_empty());
}

#[tokio::test]
async fn remote_session_is_created_once_per_generation() {
    let stub = StubService::with_replies(vec![chunks(&["a"]), chunks(&["b"])]);
    let chat = manager(&stub);

    chat.send_message("one").await.unwrap();
    chat.send_message("two").await.unwrap();

    assert_eq!(stub.instructions(), vec!["Be helpful".to_string()]);
    assert_eq!(stub.prompts(), vec!["one".to_string(), "two".to_string()]);
    assert_eq!(chat.transcript().len(), 5);
}

#[tokio::test]
async fn failed_creation_is_retried_on_next_send() {
    let stub = StubService::without_credential();
    let chat = manager(&stub);

    chat.send_message("one").await.unwrap();
    stub.state.lock().unwrap().missing_credential = false;
    stub.push(chunks(&["ok"]));
    chat.send_message("two").await.unwrap();

    assert_eq!(stub.instructions().len(), 2);
    assert_eq!(chat.transcript().last().unwrap().text, "ok");
}

#[tokio::test]
async fn observers_see_growing_prefixes() {
    let (tx, rx) = mpsc::unbounded_channel();
    let stub = StubService::with_replies(vec![Reply::Live(rx)]);
    let chat = manager(&stub);
    let mut updates = chat.subscribe();

    let sender = chat.clone();
    let turn = tokio::spawn(async move { sender.send_message("Oi").await });

    let snap = wait_for(&mut updates, |s| s.transcript.len() == 3).await;
    assert!(snap.is_loading);
    assert_eq!(snap.transcript[2].text, "");

    let mut expected = String::new();
    for part in ["Com ", "certeza", "!"] {
        tx.send(Ok(part.to_string())).unwrap();
        expected.push_str(part);
        let want = expected.clone();
        let snap = wait_for(&mut updates, |s| s.transcript[2].text == want).await;
        assert!(snap.is_loading);
    }

    drop(tx);
    turn.await.unwrap().unwrap();
    let snap = wait_for(&mut updates, |s| !s.is_loading).await;
    assert_eq!(snap.transcript[2].text, "Com certeza!");
    assert_eq!(snap.transcript.len(), 3);
}

#[tokio::test]
async fn send_while_loading_is_rejected() {
    let (tx, rx) = mpsc::unbounded_channel();
    let stub = StubService::with_replies(vec![Reply::Live(rx)]);
    let chat = manager(&stub);
    let mut updates = chat.subscribe();

    let sender = chat.clone();
    let turn = tokio::spawn(async move { sender.send_message("first").await });
    wait_for(&mut updates, |s| s.transcript.len() == 3).await;

    assert_eq!(chat.send_message("second").await, Err(ChatError::Busy));
    assert_eq!(chat.transcript().len(), 3);

    tx.send(Ok("done".into())).unwrap();
    drop(tx);
    turn.await.unwrap().unwrap();
    assert_eq!(stub.prompts(), vec!["first".to_string()]);
}

#[tokio::test]
async fn stalled_stream_times_out() {
    let (tx, rx) = mpsc::unbounded_channel();
    let stub = StubService::with_replies(vec![Reply::Live(rx)]);
    let chat = ChatSessionManager::start_with_options(
        Arc::new(stub.clone()),
        SessionConfig::new("Be helpful", "Hi!"),
        ManagerOptions {
            stall_timeout: Duration::from_millis(50),
            ..ManagerOptions::default()
        },
    );

    tx.send(Ok("meio".into())).unwrap();
    chat.send_message("Oi").await.unwrap();

    let transcript = chat.transcript();
    assert_eq!(transcript[2].text, "meio");
    assert!(transcript[3].is_error);
    assert!(!chat.is_loading());
    drop(tx);
}

#[tokio::test]
async fn reconfigure_resets_transcript_with_new_ids() {
    let stub = StubService::with_replies(vec![chunks(&["a"])]);
    let chat = manager(&stub);
    chat.send_message("one").await.unwrap();
    let old_ids: Vec<_> = chat.transcript().into_iter().map(|m| m.id).collect();

    chat.reconfigure(SessionConfig::new("Be brief", "Welcome back"));

    let snap = chat.snapshot();
    assert_eq!(snap.generation, 1);
    assert_eq!(texts(&snap.transcript), vec![(Sender::Bot, "Welcome back".into(), false)]);
    assert!(!old_ids.contains(&snap.transcript[0].id));
    assert_eq!(chat.config().system_instruction, "Be brief");
}

#[tokio::test]
async fn reconfigure_opens_a_new_remote_session() {
    let stub = StubService::with_replies(vec![chunks(&["a"]), chunks(&["b"])]);
    let chat = manager(&stub);

    chat.send_message("one").await.unwrap();
    chat.reconfigure(SessionConfig::new("Be brief", "Hi!"));
    chat.send_message("two").await.unwrap();

    assert_eq!(
        stub.instructions(),
        vec!["Be helpful".to_string(), "Be brief".to_string()]
    );
    assert_eq!(chat.transcript().len(), 3);
}

#[tokio::test]
async fn reconfigure_mid_stream_discards_late_chunks() {
    let (tx, rx) = mpsc::unbounded_channel();
    let stub = StubService::with_replies(vec![Reply::Live(rx)]);
    let chat = manager(&stub);
    let mut updates = chat.subscribe();

    let sender = chat.clone();
    let turn = tokio::spawn(async move { sender.send_message("Oi").await });
    tx.send(Ok("antes".into())).unwrap();
    wait_for(&mut updates, |s| {
        s.transcript.len() == 3 && s.transcript[2].text == "antes"
    })
    .await;

    chat.reconfigure(SessionConfig::new("Be brief", "Nova sessão"));
    turn.await.unwrap().unwrap();
    // The receiver is dropped along with the abandoned stream.
    assert!(tx.send(Ok("depois".into())).is_err());

    let snap = chat.snapshot();
    assert_eq!(texts(&snap.transcript), vec![(Sender::Bot, "Nova sessão".into(), false)]);
    assert!(!snap.is_loading);
    assert_eq!(snap.generation, 1);
}

#[tokio::test]
async fn send_after_reconfigure_during_stream_is_accepted() {
    let (tx, rx) = mpsc::unbounded_channel();
    let stub = StubService::with_replies(vec![Reply::Live(rx)]);
    let chat = manager(&stub);
    let mut updates = chat.subscribe();

    let sender = chat.clone();
    let turn = tokio::spawn(async move { sender.send_message("first").await });
    wait_for(&mut updates, |s| s.transcript.len() == 3).await;

    chat.reconfigure(SessionConfig::new("Be brief", "Hi!"));
    stub.push(chunks(&["fresh"]));
    chat.send_message("second").await.unwrap();
    turn.await.unwrap().unwrap();
    drop(tx);

    assert_eq!(
        texts(&chat.transcript()),
        vec![
            (Sender::Bot, "Hi!".into(), false),
            (Sender::User, "second".into(), false),
            (Sender::Bot, "fresh".into(), false),
        ]
    );
}

#[tokio::test]
async fn dropped_send_clears_loading() {
    let (tx, rx) = mpsc::unbounded_channel();
    let stub = StubService::with_replies(vec![Reply::Live(rx)]);
    let chat = manager(&stub);
    let mut updates = chat.subscribe();

    let sender = chat.clone();
    let turn = tokio::spawn(async move { sender.send_message("Oi").await });
    wait_for(&mut updates, |s| s.transcript.len() == 3).await;

    turn.abort();
    let _ = turn.await;
    wait_for(&mut updates, |s| !s.is_loading).await;
    drop(tx);

    stub.push(chunks(&["again"]));
    chat.send_message("retry").await.unwrap();
    assert_eq!(chat.transcript().last().unwrap().text, "again");
}

async fn wait_for_create_calls(stub: &StubService, calls: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while stub.instructions().len() < calls {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("create_session was not called");
}

#[tokio::test]
async fn reconfigure_while_session_is_opening_abandons_it() {
    let stub = StubService::with_replies(vec![chunks(&["novo"])]);
    let release = stub.gate_create();
    let chat = manager(&stub);

    let sender = chat.clone();
    let turn = tokio::spawn(async move { sender.send_message("Oi").await });
    wait_for_create_calls(&stub, 1).await;
    assert!(chat.is_loading());

    chat.reconfigure(SessionConfig::new("Be brief", "Nova sessão"));
    turn.await.unwrap().unwrap();
    // The pending creation was dropped with the abandoned turn.
    assert!(release.send(()).is_err());

    let snap = chat.snapshot();
    assert_eq!(texts(&snap.transcript), vec![(Sender::Bot, "Nova sessão".into(), false)]);
    assert!(!snap.is_loading);

    // No stale handle was kept: the next send opens a session for the new persona.
    chat.send_message("de novo").await.unwrap();
    assert_eq!(
        stub.instructions(),
        vec!["Be helpful".to_string(), "Be brief".to_string()]
    );
    assert_eq!(chat.transcript().last().unwrap().text, "novo");
}

#[tokio::test]
async fn slow_session_creation_times_out() {
    let stub = StubService::default();
    let _release = stub.gate_create();
    let chat = ChatSessionManager::start_with_options(
        Arc::new(stub.clone()),
        SessionConfig::new("Be helpful", "Hi!"),
        ManagerOptions {
            stall_timeout: Duration::from_millis(50),
            ..ManagerOptions::default()
        },
    );

    chat.send_message("Oi").await.unwrap();

    let unavailable = chat.options().unavailable_text.clone();
    assert_eq!(
        texts(&chat.transcript()),
        vec![
            (Sender::Bot, "Hi!".into(), false),
            (Sender::User, "Oi".into(), false),
            (Sender::Bot, unavailable, true),
        ]
    );
    assert!(!chat.is_loading());
}

#[test]
fn snapshot_serializes_transcript() {
    let snap = ChatSnapshot {
        transcript: vec![Message::user("Oi")],
        is_loading: true,
        generation: 2,
    };
    let json = serde_json::to_value(&snap).unwrap();
    assert_eq!(json["transcript"][0]["sender"], "user");
    assert_eq!(json["transcript"][0]["text"], "Oi");
    assert_eq!(json["is_loading"], true);
    assert_eq!(snap.last().unwrap().text, "Oi");
}
