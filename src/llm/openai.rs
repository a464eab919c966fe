//! reqwest-backed client for the hosted assistants API.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::json;

use crate::error::LlmError;

use super::types::{MessageList, MessageRole, Run, Thread, ThreadMessage};
use super::{AssistantsApi, CompletionRequest};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// HTTP client for the assistants + chat-completions endpoints.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: secrecy::SecretString,
}

impl OpenAiClient {
    pub fn new(api_key: secrecy::SecretString) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the client at a non-default base URL (tests, proxies).
    pub fn with_base_url(api_key: secrecy::SecretString, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(self.api_key.expose_secret())
            .header("OpenAI-Beta", "assistants=v2")
    }

    /// Send a request and decode a JSON body, mapping non-2xx to `LlmError`.
    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        operation: &str,
    ) -> Result<T, LlmError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, operation, "Upstream request failed");
            return Err(LlmError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }
        response.json().await.map_err(|e| LlmError::RequestFailed {
            operation: operation.to_string(),
            reason: format!("failed to decode response: {e}"),
        })
    }
}

#[async_trait]
impl AssistantsApi for OpenAiClient {
    async fn create_thread(&self) -> Result<Thread, LlmError> {
        let thread: Thread = self
            .send(
                self.request(reqwest::Method::POST, "/threads").json(&json!({})),
                "creating thread",
            )
            .await?;
        tracing::debug!(thread_id = %thread.id, "Created thread");
        Ok(thread)
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Thread, LlmError> {
        self.send(
            self.request(reqwest::Method::GET, &format!("/threads/{thread_id}")),
            "retrieving thread",
        )
        .await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage, LlmError> {
        self.send(
            self.request(
                reqwest::Method::POST,
                &format!("/threads/{thread_id}/messages"),
            )
            .json(&json!({ "role": role.as_str(), "content": content })),
            "creating message",
        )
        .await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, LlmError> {
        let list: MessageList = self
            .send(
                self.request(
                    reqwest::Method::GET,
                    &format!("/threads/{thread_id}/messages"),
                ),
                "getting messages",
            )
            .await?;
        Ok(list.data)
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, LlmError> {
        let run: Run = self
            .send(
                self.request(reqwest::Method::POST, &format!("/threads/{thread_id}/runs"))
                    .json(&json!({ "assistant_id": assistant_id })),
                "creating run",
            )
            .await?;
        tracing::debug!(run_id = %run.id, thread_id, "Created run");
        Ok(run)
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, LlmError> {
        self.send(
            self.request(
                reqwest::Method::GET,
                &format!("/threads/{thread_id}/runs/{run_id}"),
            ),
            "getting run",
        )
        .await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<(), LlmError> {
        let _: Run = self
            .send(
                self.request(
                    reqwest::Method::POST,
                    &format!("/threads/{thread_id}/runs/{run_id}/cancel"),
                ),
                "canceling run",
            )
            .await?;
        tracing::debug!(run_id, "Canceled run");
        Ok(())
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let mut body = json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt },
            ],
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        if request.json_response {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let response: serde_json::Value = self
            .send(
                self.request(reqwest::Method::POST, "/chat/completions")
                    .json(&body),
                "chat completion",
            )
            .await?;

        response["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                LlmError::InvalidResponse("completion response missing message content".to_string())
            })
    }
}
