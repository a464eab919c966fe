//! Curated activity library.
//!
//! The `activities` collection of the remote document store holds the
//! per-domain library of support activities; behavior-analysis suggestions
//! reference its entries by id. Like the onboarding questions, documents
//! that fail to parse are skipped with a warning rather than failing the
//! whole fetch.

use std::str::FromStr;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::CatalogError;
use crate::onboarding::SpectrumCategory;

/// Setting an activity is designed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    AtHome,
    Outdoor,
    GeneralStrategy,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::AtHome => "AT_HOME",
            ActivityKind::Outdoor => "OUTDOOR",
            ActivityKind::GeneralStrategy => "GENERAL_STRATEGY",
        }
    }
}

impl FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AT_HOME" => Ok(ActivityKind::AtHome),
            "OUTDOOR" => Ok(ActivityKind::Outdoor),
            "GENERAL_STRATEGY" => Ok(ActivityKind::GeneralStrategy),
            other => Err(format!("'{other}' is not a valid activity type")),
        }
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One library activity, keyed to a support domain.
#[derive(Debug, Clone)]
pub struct CatalogActivity {
    pub id: String,
    pub category: SpectrumCategory,
    pub kind: ActivityKind,
    pub title: String,
    pub description: String,
    /// Hint injected into AI prompts; general strategies omit it.
    pub ai_cue: Option<String>,
    pub high_impact: bool,
}

/// Raw document shape in the `activities` collection.
#[derive(Debug, Deserialize)]
struct ActivityDocument {
    id: String,
    domain: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    ai_cue: Option<String>,
    #[serde(default)]
    is_high_impact: bool,
}

impl ActivityDocument {
    fn into_activity(self) -> Result<CatalogActivity, String> {
        Ok(CatalogActivity {
            category: self.domain.parse()?,
            kind: self.kind.parse()?,
            id: self.id,
            title: self.title,
            description: self.description,
            ai_cue: self.ai_cue,
            high_impact: self.is_high_impact,
        })
    }
}

/// Provides the activity library.
#[async_trait]
pub trait ActivityCatalog: Send + Sync {
    /// One-shot fetch of every activity.
    async fn list(&self) -> Result<Vec<CatalogActivity>, CatalogError>;

    /// Activities for one support domain.
    async fn for_category(
        &self,
        category: SpectrumCategory,
    ) -> Result<Vec<CatalogActivity>, CatalogError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|a| a.category == category)
            .collect())
    }
}

/// Fetches the catalog from a document-store REST endpoint.
///
/// Expects `GET {base_url}/activities` to return a JSON array of activity
/// documents.
pub struct HttpActivityCatalog {
    http: reqwest::Client,
    base_url: String,
}

impl HttpActivityCatalog {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ActivityCatalog for HttpActivityCatalog {
    async fn list(&self) -> Result<Vec<CatalogActivity>, CatalogError> {
        let url = format!("{}/activities", self.base_url);
        let documents: Vec<serde_json::Value> = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::LoadFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| CatalogError::LoadFailed(e.to_string()))?
            .json()
            .await
            .map_err(|e| CatalogError::LoadFailed(e.to_string()))?;

        let mut activities = Vec::with_capacity(documents.len());
        for document in documents {
            let parsed = serde_json::from_value::<ActivityDocument>(document)
                .map_err(|e| e.to_string())
                .and_then(ActivityDocument::into_activity);
            match parsed {
                Ok(activity) => activities.push(activity),
                Err(e) => {
                    tracing::warn!("Skipping malformed activity document: {}", e);
                }
            }
        }
        tracing::debug!(count = activities.len(), "Loaded activity catalog");
        Ok(activities)
    }
}

/// Fixed in-memory catalog, for tests and local development.
pub struct StaticActivityCatalog {
    activities: Vec<CatalogActivity>,
}

impl StaticActivityCatalog {
    pub fn new(activities: Vec<CatalogActivity>) -> Self {
        Self { activities }
    }
}

#[async_trait]
impl ActivityCatalog for StaticActivityCatalog {
    async fn list(&self) -> Result<Vec<CatalogActivity>, CatalogError> {
        Ok(self.activities.clone())
    }
}
