//! Integration tests for the conversation session's run-polling workflow.
//!
//! A scripted stub stands in for the upstream assistants API; each test
//! drives the session through a status sequence and asserts on the calls
//! the session made and the state it published.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::timeout;

use care_assist::chat::{ChatConfig, ChatSession};
use care_assist::error::{ChatError, LlmError};
use care_assist::llm::{
    AssistantsApi, CompletionRequest, MessageContent, MessageRole, MessageText, Run, RunStatus,
    Thread, ThreadMessage,
};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

fn message(id: &str, role: MessageRole, text: &str, created_at: i64) -> ThreadMessage {
    ThreadMessage {
        id: id.to_string(),
        thread_id: "thread_1".to_string(),
        role,
        content: vec![MessageContent {
            kind: "text".to_string(),
            text: Some(MessageText {
                value: text.to_string(),
            }),
        }],
        created_at,
    }
}

/// Scripted assistants API: `get_run` pops the next status (repeating the
/// last one when the script runs out) and call counts are recorded.
struct ScriptedApi {
    statuses: Mutex<VecDeque<RunStatus>>,
    thread_messages: Vec<ThreadMessage>,
    get_run_calls: AtomicUsize,
    list_calls: AtomicUsize,
    create_message_calls: AtomicUsize,
}

impl ScriptedApi {
    fn new(statuses: Vec<RunStatus>, thread_messages: Vec<ThreadMessage>) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(statuses.into()),
            thread_messages,
            get_run_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            create_message_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl AssistantsApi for ScriptedApi {
    async fn create_thread(&self) -> Result<Thread, LlmError> {
        Ok(Thread {
            id: "thread_1".to_string(),
            created_at: 0,
            metadata: Default::default(),
        })
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Thread, LlmError> {
        Ok(Thread {
            id: thread_id.to_string(),
            created_at: 0,
            metadata: Default::default(),
        })
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage, LlmError> {
        self.create_message_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ThreadMessage {
            id: "msg_new".to_string(),
            thread_id: thread_id.to_string(),
            role,
            content: vec![MessageContent {
                kind: "text".to_string(),
                text: Some(MessageText {
                    value: content.to_string(),
                }),
            }],
            created_at: 0,
        })
    }

    async fn list_messages(&self, _thread_id: &str) -> Result<Vec<ThreadMessage>, LlmError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.thread_messages.clone())
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, LlmError> {
        Ok(Run {
            id: "run_1".to_string(),
            thread_id: thread_id.to_string(),
            status: RunStatus::Queued,
            assistant_id: assistant_id.to_string(),
            created_at: 0,
        })
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, LlmError> {
        self.get_run_calls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().await;
        let status = if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            statuses.front().cloned().unwrap_or(RunStatus::Queued)
        };
        Ok(Run {
            id: run_id.to_string(),
            thread_id: thread_id.to_string(),
            status,
            assistant_id: "asst_test".to_string(),
            created_at: 0,
        })
    }

    async fn cancel_run(&self, _thread_id: &str, _run_id: &str) -> Result<(), LlmError> {
        Ok(())
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<String, LlmError> {
        unimplemented!("not used in chat tests")
    }
}

fn fast_config() -> ChatConfig {
    ChatConfig {
        assistant_id: "asst_test".to_string(),
        poll_interval: Duration::from_millis(10),
        poll_deadline: Duration::from_secs(2),
    }
}

#[tokio::test]
async fn completed_run_publishes_messages_after_one_fetch() {
    timeout(TEST_TIMEOUT, async {
        // Out-of-order list response: session must sort by created_at and
        // drop the first (seed prompt).
        let api = ScriptedApi::new(
            vec![RunStatus::Queued, RunStatus::InProgress, RunStatus::Completed],
            vec![
                message("msg_3", MessageRole::Assistant, "the answer", 30),
                message("msg_1", MessageRole::User, "seed prompt", 10),
                message("msg_2", MessageRole::User, "visible question", 20),
            ],
        );
        let session = ChatSession::new(api.clone(), fast_config());

        session.start_conversation("seed prompt").await.unwrap();

        // Exactly one fetch, after the third poll reached `completed`.
        assert_eq!(api.get_run_calls.load(Ordering::SeqCst), 3);
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 1);

        let visible = session.messages();
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].id, "msg_2");
        assert_eq!(visible[1].id, "msg_3");
        assert_eq!(visible[1].text(), "the answer");
        assert!(!session.is_processing());
        assert_eq!(session.thread_id().await.as_deref(), Some("thread_1"));
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn failed_run_surfaces_typed_error_without_fetching() {
    timeout(TEST_TIMEOUT, async {
        let api = ScriptedApi::new(vec![RunStatus::Failed], Vec::new());
        let session = ChatSession::new(api.clone(), fast_config());

        let err = session.start_conversation("hello").await.unwrap_err();
        assert!(matches!(
            err,
            ChatError::RunEnded {
                status: RunStatus::Failed
            }
        ));
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 0);
        assert!(session.messages().is_empty());
        assert!(!session.is_processing());
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn expired_run_surfaces_its_status() {
    timeout(TEST_TIMEOUT, async {
        let api = ScriptedApi::new(vec![RunStatus::Expired], Vec::new());
        let session = ChatSession::new(api, fast_config());
        let err = session.start_conversation("hello").await.unwrap_err();
        assert!(matches!(
            err,
            ChatError::RunEnded {
                status: RunStatus::Expired
            }
        ));
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn never_terminal_run_hits_poll_deadline() {
    timeout(TEST_TIMEOUT, async {
        let api = ScriptedApi::new(vec![RunStatus::Queued], Vec::new());
        let config = ChatConfig {
            poll_deadline: Duration::from_millis(50),
            ..fast_config()
        };
        let session = ChatSession::new(api.clone(), config);

        let err = session.start_conversation("hello").await.unwrap_err();
        assert!(matches!(err, ChatError::PollDeadlineExceeded { .. }));
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 0);
        assert!(!session.is_processing());
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn unknown_status_keeps_polling() {
    timeout(TEST_TIMEOUT, async {
        let api = ScriptedApi::new(
            vec![
                RunStatus::Unknown("requires_action".to_string()),
                RunStatus::Completed,
            ],
            vec![
                message("msg_1", MessageRole::User, "seed", 1),
                message("msg_2", MessageRole::Assistant, "reply", 2),
            ],
        );
        let session = ChatSession::new(api.clone(), fast_config());

        session.start_conversation("seed").await.unwrap();
        assert_eq!(api.get_run_calls.load(Ordering::SeqCst), 2);
        assert_eq!(session.messages().len(), 1);
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn state_retained_without_observers() {
    timeout(TEST_TIMEOUT, async {
        let api = ScriptedApi::new(
            vec![RunStatus::Completed],
            vec![
                message("msg_1", MessageRole::User, "seed", 1),
                message("msg_2", MessageRole::Assistant, "reply", 2),
            ],
        );
        let session = ChatSession::new(api, fast_config());

        // No watch receivers exist; snapshot accessors must still reflect
        // the completed poll.
        session.start_conversation("seed").await.unwrap();
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].text(), "reply");
        assert!(!session.is_processing());
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn send_message_without_thread_is_noop() {
    timeout(TEST_TIMEOUT, async {
        let api = ScriptedApi::new(vec![RunStatus::Completed], Vec::new());
        let session = ChatSession::new(api.clone(), fast_config());

        session.send_message("early").await.unwrap();
        assert_eq!(api.create_message_calls.load(Ordering::SeqCst), 0);
        assert_eq!(api.get_run_calls.load(Ordering::SeqCst), 0);
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn send_message_reuses_thread_and_refreshes_messages() {
    timeout(TEST_TIMEOUT, async {
        let api = ScriptedApi::new(
            vec![RunStatus::Completed],
            vec![
                message("msg_1", MessageRole::User, "seed", 1),
                message("msg_2", MessageRole::Assistant, "first reply", 2),
            ],
        );
        let session = ChatSession::new(api.clone(), fast_config());

        session.start_conversation("seed").await.unwrap();
        session.send_message("follow-up").await.unwrap();

        assert_eq!(api.create_message_calls.load(Ordering::SeqCst), 2);
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(session.thread_id().await.as_deref(), Some("thread_1"));
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn cancel_stops_polling_and_discards_results() {
    timeout(TEST_TIMEOUT, async {
        let api = ScriptedApi::new(vec![RunStatus::Queued], Vec::new());
        let session = Arc::new(ChatSession::new(api.clone(), ChatConfig {
            poll_interval: Duration::from_millis(20),
            poll_deadline: Duration::from_secs(60),
            ..fast_config()
        }));

        let worker = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.start_conversation("hello").await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(session.is_processing());
        session.cancel();

        // The superseded loop exits quietly.
        worker.await.unwrap().unwrap();
        assert!(session.messages().is_empty());
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 0);
        assert!(!session.is_processing());
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn processing_flag_observable_through_watch() {
    timeout(TEST_TIMEOUT, async {
        let api = ScriptedApi::new(
            vec![RunStatus::Queued, RunStatus::Completed],
            vec![
                message("msg_1", MessageRole::User, "seed", 1),
                message("msg_2", MessageRole::Assistant, "reply", 2),
            ],
        );
        let session = Arc::new(ChatSession::new(api, fast_config()));
        let mut processing = session.subscribe_processing();
        let mut messages = session.subscribe_messages();

        let worker = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.start_conversation("seed").await })
        };

        // Flag flips on, then off; the message list change arrives in between.
        processing.wait_for(|on| *on).await.unwrap();
        messages.wait_for(|m| !m.is_empty()).await.unwrap();
        processing.wait_for(|on| !*on).await.unwrap();

        worker.await.unwrap().unwrap();
    })
    .await
    .unwrap();
}
