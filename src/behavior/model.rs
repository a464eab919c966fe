//! Behavior-log types, stores, and the analysis prompt.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;

/// A behavior event reported by a parent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorLogRequest {
    #[serde(default)]
    pub child_id: Option<String>,
    #[serde(default)]
    pub parent_emotion: Option<String>,
    #[serde(default)]
    pub event_description: Option<String>,
    #[serde(default)]
    pub context_tags: Option<Vec<String>>,
}

/// A child profile from the `children` collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChildProfile {
    pub name: Option<String>,
    pub support_profile: serde_json::Value,
    pub sensory_profile: serde_json::Value,
}

/// The model's structured analysis of a behavior event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorAnalysis {
    pub analysis: AnalysisBody,
    #[serde(default)]
    pub suggested_activities: Vec<SuggestedActivity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisBody {
    pub probable_cause: String,
    pub reassurance_text: String,
    pub explanation_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedActivity {
    pub activity_id: String,
    pub title: String,
    /// One of PREVENTATIVE, TOOL, IMMEDIATE_CALM_DOWN.
    #[serde(rename = "type")]
    pub kind: String,
}

/// A persisted behavior-log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorLogEntry {
    pub id: Uuid,
    pub parent_id: String,
    pub child_id: String,
    pub timestamp: DateTime<Utc>,
    pub parent_emotion: String,
    pub event_description: String,
    pub context_tags: Vec<String>,
    pub analysis: BehaviorAnalysis,
}

/// System prompt for the behavior analysis completion.
pub const BEHAVIOR_SYSTEM_PROMPT: &str = "You are a compassionate AI for parents of \
neurodivergent children. Analyze events, provide empathy, causes, and strategies in the \
specified JSON format.";

/// Build the structured analysis prompt: child profile + log data + output schema.
pub fn build_analysis_prompt(
    profile: &ChildProfile,
    parent_emotion: &str,
    event_description: &str,
    context_tags: &[String],
) -> String {
    let prompt = json!({
        "childProfile": {
            "name": profile.name.as_deref().unwrap_or("the child"),
            "supportProfile": profile.support_profile,
            "sensoryProfile": profile.sensory_profile,
        },
        "behaviorLog": {
            "parentEmotion": parent_emotion,
            "description": event_description,
            "context": context_tags,
        },
        "outputSchema": {
            "analysis": {
                "probableCause": "A short, descriptive snake_case string (e.g., SENSORY_OVERLOAD)",
                "reassuranceText": "A personalized, empathetic message for the parent.",
                "explanationText": "A clear explanation of the meltdown's cause.",
            },
            "suggestedActivities": [
                {
                    "activityId": "a_unique_snake_case_id",
                    "title": "A short, clear title for the suggestion.",
                    "type": "One of: PREVENTATIVE, TOOL, IMMEDIATE_CALM_DOWN",
                }
            ],
        },
    });
    serde_json::to_string_pretty(&prompt).unwrap_or_else(|_| prompt.to_string())
}

/// Lookup for child profiles (`children` collection).
#[async_trait]
pub trait ChildProfileStore: Send + Sync {
    async fn get(&self, child_id: &str) -> Result<Option<ChildProfile>, StoreError>;
}

/// Sink for behavior-log entries (`behavior_logs` collection).
#[async_trait]
pub trait BehaviorLogStore: Send + Sync {
    async fn add(&self, entry: BehaviorLogEntry) -> Result<(), StoreError>;
}

/// In-memory child profiles, seeded at startup.
pub struct InMemoryChildProfiles {
    children: RwLock<HashMap<String, ChildProfile>>,
}

impl InMemoryChildProfiles {
    pub fn new() -> Self {
        Self {
            children: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, child_id: impl Into<String>, profile: ChildProfile) {
        self.children.write().await.insert(child_id.into(), profile);
    }
}

impl Default for InMemoryChildProfiles {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChildProfileStore for InMemoryChildProfiles {
    async fn get(&self, child_id: &str) -> Result<Option<ChildProfile>, StoreError> {
        Ok(self.children.read().await.get(child_id).cloned())
    }
}

/// In-memory behavior log.
pub struct InMemoryBehaviorLog {
    entries: RwLock<Vec<BehaviorLogEntry>>,
}

impl InMemoryBehaviorLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub async fn entries(&self) -> Vec<BehaviorLogEntry> {
        self.entries.read().await.clone()
    }
}

impl Default for InMemoryBehaviorLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BehaviorLogStore for InMemoryBehaviorLog {
    async fn add(&self, entry: BehaviorLogEntry) -> Result<(), StoreError> {
        self.entries.write().await.push(entry);
        Ok(())
    }
}
