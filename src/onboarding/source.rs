//! Question sources.
//!
//! Onboarding questions live in the `onboarding_steps_questions` collection
//! of the remote document store. The trait keeps the flow controller
//! independent of where they come from; tests use in-memory fixtures.

use async_trait::async_trait;

use crate::error::OnboardingError;

use super::model::Question;

/// Provides the ordered onboarding question set.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn list(&self) -> Result<Vec<Question>, OnboardingError>;
}

/// Fetches questions from a document-store REST endpoint.
///
/// Expects `GET {base_url}/onboarding_steps_questions` to return a JSON array
/// of question documents. Documents that fail to parse are skipped with a
/// warning rather than failing the whole load.
pub struct HttpQuestionSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpQuestionSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl QuestionSource for HttpQuestionSource {
    async fn list(&self) -> Result<Vec<Question>, OnboardingError> {
        let url = format!("{}/onboarding_steps_questions", self.base_url);
        let documents: Vec<serde_json::Value> = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| OnboardingError::LoadFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| OnboardingError::LoadFailed(e.to_string()))?
            .json()
            .await
            .map_err(|e| OnboardingError::LoadFailed(e.to_string()))?;

        let mut questions = Vec::with_capacity(documents.len());
        for document in documents {
            match serde_json::from_value::<Question>(document) {
                Ok(question) => questions.push(question),
                Err(e) => {
                    tracing::warn!("Skipping malformed question document: {}", e);
                }
            }
        }
        tracing::debug!(count = questions.len(), "Loaded onboarding questions");
        Ok(questions)
    }
}

/// Fixed in-memory question set, for tests and local development.
pub struct StaticQuestionSource {
    questions: Vec<Question>,
}

impl StaticQuestionSource {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }
}

#[async_trait]
impl QuestionSource for StaticQuestionSource {
    async fn list(&self) -> Result<Vec<Question>, OnboardingError> {
        Ok(self.questions.clone())
    }
}
