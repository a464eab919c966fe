//! Onboarding questions, options, and score aggregation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The five DSM-5 support domains onboarding questions are grouped under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumCategory {
    MedicalNeeds,
    SocialCommunication,
    CognitiveFunctioning,
    SensoryProcessing,
    BehavioralRegulation,
}

impl SpectrumCategory {
    pub const ALL: [SpectrumCategory; 5] = [
        SpectrumCategory::MedicalNeeds,
        SpectrumCategory::SocialCommunication,
        SpectrumCategory::CognitiveFunctioning,
        SpectrumCategory::SensoryProcessing,
        SpectrumCategory::BehavioralRegulation,
    ];

    /// Human-readable domain name.
    pub fn display_name(&self) -> &'static str {
        match self {
            SpectrumCategory::MedicalNeeds => "Physical and Mental Health Needs",
            SpectrumCategory::SocialCommunication => "Social Communication and Interaction",
            SpectrumCategory::CognitiveFunctioning => "Cognitive Functioning and Learning",
            SpectrumCategory::SensoryProcessing => "Sensory Processing and Integration",
            SpectrumCategory::BehavioralRegulation => "Behavioral Regulation and Emotional Control",
        }
    }
}

impl std::fmt::Display for SpectrumCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for SpectrumCategory {
    type Err = String;

    /// Parses a stored domain name. Documents are inconsistent about case
    /// (`sensory_processing` vs `SENSORY_PROCESSING`), so both are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "medical_needs" => Ok(SpectrumCategory::MedicalNeeds),
            "social_communication" => Ok(SpectrumCategory::SocialCommunication),
            "cognitive_functioning" => Ok(SpectrumCategory::CognitiveFunctioning),
            "sensory_processing" => Ok(SpectrumCategory::SensoryProcessing),
            "behavioral_regulation" => Ok(SpectrumCategory::BehavioralRegulation),
            other => Err(format!("'{other}' is not a known support domain")),
        }
    }
}

/// One selectable answer for a question. `impact` weights 0–4.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub impact: u32,
    /// UI-transient selection flag; never persisted upstream.
    #[serde(default, skip_serializing)]
    pub selected: bool,
}

/// A single onboarding question with its ordered options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub category: SpectrumCategory,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
}

impl Question {
    /// Whether any option is currently selected.
    pub fn has_selection(&self) -> bool {
        self.options.iter().any(|o| o.selected)
    }

    /// Sum of impacts of the selected options.
    pub fn selected_impact(&self) -> u32 {
        self.options.iter().filter(|o| o.selected).map(|o| o.impact).sum()
    }
}

/// Aggregate onboarding result: total impact plus per-category breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub total: u32,
    pub by_category: BTreeMap<SpectrumCategory, u32>,
}

impl ScoreSummary {
    /// Aggregate selected impacts across a question set.
    pub fn from_questions(questions: &[Question]) -> Self {
        let mut by_category: BTreeMap<SpectrumCategory, u32> = BTreeMap::new();
        for question in questions {
            *by_category.entry(question.category).or_default() += question.selected_impact();
        }
        let total = by_category.values().sum();
        Self { total, by_category }
    }

    pub fn category(&self, category: SpectrumCategory) -> u32 {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}
