//! Upstream AI integration.
//!
//! Two surfaces share one trait:
//! - the **assistants API** (threads, messages, runs) backing the chat
//!   session and the thread-proxy routes, and
//! - **one-shot completions** used by routine generation and behavior
//!   analysis.
//!
//! `OpenAiClient` is the real reqwest-backed implementation; tests substitute
//! stub implementations of `AssistantsApi`.

mod openai;
pub mod types;

pub use openai::OpenAiClient;
pub use types::{MessageContent, MessageList, MessageRole, MessageText, Run, RunStatus, Thread, ThreadMessage};

use async_trait::async_trait;

use crate::error::LlmError;

/// A one-shot chat-completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Ask the model to emit a JSON object (upstream `response_format`).
    pub json_response: bool,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: system.into(),
            user_prompt: user.into(),
            max_tokens: None,
            temperature: None,
            json_response: false,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_json_response(mut self) -> Self {
        self.json_response = true;
        self
    }
}

/// Client for the upstream assistants/completions service.
#[async_trait]
pub trait AssistantsApi: Send + Sync {
    /// Create a new conversation thread.
    async fn create_thread(&self) -> Result<Thread, LlmError>;

    /// Retrieve an existing thread.
    async fn get_thread(&self, thread_id: &str) -> Result<Thread, LlmError>;

    /// Append a message to a thread.
    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage, LlmError>;

    /// List all messages in a thread.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, LlmError>;

    /// Start an assistant run against a thread.
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, LlmError>;

    /// Fetch the current state of a run.
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, LlmError>;

    /// Cancel an in-flight run.
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<(), LlmError>;

    /// One-shot chat completion; returns the assistant message text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}
