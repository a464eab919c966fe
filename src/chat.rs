//! Conversation session — thread/run orchestration against the assistants API.
//!
//! A `ChatSession` owns one upstream thread. Sending a message posts it,
//! starts a run, then polls the run at a fixed interval until it reaches a
//! terminal status (or a deadline expires). On completion the thread's
//! messages are fetched, ordered by creation time, the seed prompt dropped,
//! and the rest published to observers.
//!
//! Each send bumps a generation counter; a poll loop that observes a newer
//! generation stops and discards its results, so a message sent mid-poll
//! supersedes the older loop instead of racing it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{RwLock, watch};

use crate::error::ChatError;
use crate::llm::{AssistantsApi, MessageRole, RunStatus, ThreadMessage};

/// Tuning knobs for the polling loop.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Assistant that executes runs.
    pub assistant_id: String,
    /// Pause between run-status checks.
    pub poll_interval: Duration,
    /// Abandon a run that has not reached a terminal status within this span.
    pub poll_deadline: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            assistant_id: crate::config::DEFAULT_ASSISTANT_ID.to_string(),
            poll_interval: Duration::from_secs(1),
            poll_deadline: Duration::from_secs(120),
        }
    }
}

/// A single-thread conversation with observable message state.
pub struct ChatSession {
    api: Arc<dyn AssistantsApi>,
    config: ChatConfig,
    thread_id: RwLock<Option<String>>,
    /// Bumped on every send/cancel; stale poll loops check it and bail.
    generation: AtomicU64,
    messages_tx: watch::Sender<Vec<ThreadMessage>>,
    processing_tx: watch::Sender<bool>,
}

impl ChatSession {
    pub fn new(api: Arc<dyn AssistantsApi>, config: ChatConfig) -> Self {
        let (messages_tx, _) = watch::channel(Vec::new());
        let (processing_tx, _) = watch::channel(false);
        Self {
            api,
            config,
            thread_id: RwLock::new(None),
            generation: AtomicU64::new(0),
            messages_tx,
            processing_tx,
        }
    }

    /// Subscribe to the visible message list.
    pub fn subscribe_messages(&self) -> watch::Receiver<Vec<ThreadMessage>> {
        self.messages_tx.subscribe()
    }

    /// Subscribe to the processing flag (true while a send/poll is in flight).
    pub fn subscribe_processing(&self) -> watch::Receiver<bool> {
        self.processing_tx.subscribe()
    }

    /// Snapshot of the visible messages.
    pub fn messages(&self) -> Vec<ThreadMessage> {
        self.messages_tx.borrow().clone()
    }

    pub fn is_processing(&self) -> bool {
        *self.processing_tx.borrow()
    }

    /// The upstream thread id, once a conversation has started.
    pub async fn thread_id(&self) -> Option<String> {
        self.thread_id.read().await.clone()
    }

    /// Invalidate any in-flight poll loop without starting new work.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.processing_tx.send_replace(false);
    }

    /// Create a thread, post the seed prompt, run, and poll to completion.
    pub async fn start_conversation(&self, initial_prompt: &str) -> Result<(), ChatError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.processing_tx.send_replace(true);

        let result = async {
            let thread = self.api.create_thread().await?;
            *self.thread_id.write().await = Some(thread.id.clone());
            self.run_and_poll(generation, &thread.id, initial_prompt).await
        }
        .await;

        self.finish(generation);
        result
    }

    /// Post a message on the existing thread, run, and poll to completion.
    ///
    /// No-op when no conversation has been started yet.
    pub async fn send_message(&self, content: &str) -> Result<(), ChatError> {
        let Some(thread_id) = self.thread_id().await else {
            tracing::debug!("send_message before start_conversation, ignoring");
            return Ok(());
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.processing_tx.send_replace(true);

        let result = self.run_and_poll(generation, &thread_id, content).await;
        self.finish(generation);
        result
    }

    async fn run_and_poll(
        &self,
        generation: u64,
        thread_id: &str,
        content: &str,
    ) -> Result<(), ChatError> {
        self.api
            .create_message(thread_id, MessageRole::User, content)
            .await?;
        let run = self
            .api
            .create_run(thread_id, &self.config.assistant_id)
            .await?;
        self.poll_run(generation, thread_id, &run.id).await
    }

    /// Poll the run until terminal status, deadline, or supersession.
    async fn poll_run(
        &self,
        generation: u64,
        thread_id: &str,
        run_id: &str,
    ) -> Result<(), ChatError> {
        let deadline = tokio::time::Instant::now() + self.config.poll_deadline;

        loop {
            if self.generation.load(Ordering::SeqCst) != generation {
                tracing::debug!(run_id, "Poll superseded, discarding");
                return Ok(());
            }

            let run = self.api.get_run(thread_id, run_id).await?;
            match run.status {
                RunStatus::Completed => {
                    return self.fetch_messages(generation, thread_id).await;
                }
                status @ (RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired) => {
                    tracing::warn!(run_id, %status, "Run ended without completing");
                    return Err(ChatError::RunEnded { status });
                }
                RunStatus::Queued | RunStatus::InProgress => {}
                RunStatus::Unknown(ref s) => {
                    tracing::warn!(run_id, status = %s, "Unknown run status, continuing to poll");
                }
            }

            if tokio::time::Instant::now() + self.config.poll_interval > deadline {
                tracing::warn!(run_id, deadline = ?self.config.poll_deadline, "Run poll deadline exceeded");
                return Err(ChatError::PollDeadlineExceeded {
                    deadline: self.config.poll_deadline,
                });
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Fetch, order, and publish the thread's messages.
    ///
    /// The first message is the hidden seed prompt and is not shown.
    async fn fetch_messages(&self, generation: u64, thread_id: &str) -> Result<(), ChatError> {
        let mut messages = self.api.list_messages(thread_id).await?;
        messages.sort_by_key(|m| m.created_at);

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(thread_id, "Messages fetched by superseded poll, discarding");
            return Ok(());
        }

        let visible: Vec<ThreadMessage> = messages.into_iter().skip(1).collect();
        // send_replace: the snapshot must be retained even with zero subscribers.
        self.messages_tx.send_replace(visible);
        Ok(())
    }

    /// Reset the processing flag unless a newer send owns it.
    fn finish(&self, generation: u64) {
        if self.generation.load(Ordering::SeqCst) == generation {
            self.processing_tx.send_replace(false);
        }
    }
}
