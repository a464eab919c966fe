//! OnboardingController — drives the question flow end to end.
//!
//! Loads questions from the source, applies option selections with the
//! UI-feedback pause before advancing, and persists aggregate scores to the
//! preference store when the final question is answered. Observers watch a
//! snapshot of the flow.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};

use crate::prefs::PreferenceStore;

use super::flow::{FlowState, OnboardingFlow, Selection};
use super::model::Question;
use super::source::QuestionSource;

/// Observable view of the flow for UI binding.
#[derive(Debug, Clone)]
pub struct OnboardingSnapshot {
    pub state: FlowState,
    pub questions: Vec<Question>,
}

impl OnboardingSnapshot {
    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            FlowState::InProgress { step } => self.questions.get(step),
            _ => None,
        }
    }
}

/// Coordinates question loading, selection, scoring, and persistence.
pub struct OnboardingController {
    source: Arc<dyn QuestionSource>,
    prefs: Arc<PreferenceStore>,
    flow: Mutex<OnboardingFlow>,
    snapshot_tx: watch::Sender<OnboardingSnapshot>,
    feedback_delay: Duration,
}

impl OnboardingController {
    pub fn new(
        source: Arc<dyn QuestionSource>,
        prefs: Arc<PreferenceStore>,
        feedback_delay: Duration,
    ) -> Self {
        let flow = OnboardingFlow::new();
        let (snapshot_tx, _) = watch::channel(OnboardingSnapshot {
            state: flow.state().clone(),
            questions: Vec::new(),
        });
        Self {
            source,
            prefs,
            flow: Mutex::new(flow),
            snapshot_tx,
            feedback_delay,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<OnboardingSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> OnboardingSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Fetch the question set and leave the flow in progress (or failed).
    pub async fn load_questions(&self) {
        let result = self.source.list().await;
        let mut flow = self.flow.lock().await;
        match result {
            Ok(questions) => flow.questions_loaded(questions),
            Err(e) => {
                tracing::warn!("Question load failed: {}", e);
                flow.load_failed("Could not load onboarding steps.");
            }
        }
        self.publish(&flow);
    }

    /// Handle an option tap.
    ///
    /// Marks the selection immediately (so a second tap during the pause is
    /// a no-op), pauses for UI feedback, then advances — persisting scores
    /// if that was the last question.
    pub async fn select_option(&self, option_id: &str) {
        let selection = {
            let mut flow = self.flow.lock().await;
            let selection = flow.select_option(option_id);
            if selection != Selection::Ignored {
                self.publish(&flow);
            }
            selection
        };
        if selection == Selection::Ignored {
            return;
        }

        // Brief pause so the selection is visible before the step changes.
        tokio::time::sleep(self.feedback_delay).await;

        let mut flow = self.flow.lock().await;
        flow.advance();
        if let FlowState::Completed(summary) = flow.state() {
            tracing::info!(total = summary.total, "Onboarding completed");
            self.prefs.complete_onboarding(summary);
        }
        self.publish(&flow);
    }

    fn publish(&self, flow: &OnboardingFlow) {
        // send_replace: the snapshot must be retained even with zero subscribers.
        self.snapshot_tx.send_replace(OnboardingSnapshot {
            state: flow.state().clone(),
            questions: flow.questions().to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::model::{QuestionOption, SpectrumCategory};
    use crate::onboarding::source::StaticQuestionSource;

    fn question(id: &str, category: SpectrumCategory, impacts: &[(&str, u32)]) -> Question {
        Question {
            id: id.to_string(),
            title: format!("question {id}"),
            subtitle: None,
            category,
            options: impacts
                .iter()
                .map(|(opt_id, impact)| QuestionOption {
                    id: opt_id.to_string(),
                    text: format!("option {opt_id}"),
                    impact: *impact,
                    selected: false,
                })
                .collect(),
        }
    }

    async fn controller_with(
        questions: Vec<Question>,
    ) -> (OnboardingController, Arc<PreferenceStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Arc::new(PreferenceStore::open(dir.path().join("prefs.json")).await);
        let controller = OnboardingController::new(
            Arc::new(StaticQuestionSource::new(questions)),
            Arc::clone(&prefs),
            Duration::from_millis(1),
        );
        (controller, prefs, dir)
    }

    #[tokio::test]
    async fn full_walk_persists_scores() {
        let (controller, prefs, _dir) = controller_with(vec![
            question("q1", SpectrumCategory::SensoryProcessing, &[("a", 1), ("b", 3)]),
            question("q2", SpectrumCategory::MedicalNeeds, &[("c", 2)]),
        ])
        .await;

        controller.load_questions().await;
        controller.select_option("b").await;
        controller.select_option("c").await;

        let snapshot = controller.snapshot();
        let FlowState::Completed(summary) = &snapshot.state else {
            panic!("expected completion, got {:?}", snapshot.state);
        };
        assert_eq!(summary.total, 5);

        assert!(prefs.onboarding_completed());
        assert_eq!(prefs.total_impact_score(), 5);
        assert_eq!(
            prefs.category_scores().get(&SpectrumCategory::SensoryProcessing),
            Some(&3)
        );
    }

    #[tokio::test]
    async fn empty_source_reports_failure() {
        let (controller, prefs, _dir) = controller_with(Vec::new()).await;
        controller.load_questions().await;
        assert!(matches!(controller.snapshot().state, FlowState::Failed(_)));
        assert!(!prefs.onboarding_completed());
    }

    #[tokio::test]
    async fn select_before_load_is_ignored() {
        let (controller, _prefs, _dir) = controller_with(vec![question(
            "q1",
            SpectrumCategory::MedicalNeeds,
            &[("a", 1)],
        )])
        .await;
        controller.select_option("a").await;
        assert_eq!(controller.snapshot().state, FlowState::Loading);
    }

    #[tokio::test]
    async fn watch_observers_see_progress() {
        let (controller, _prefs, _dir) = controller_with(vec![
            question("q1", SpectrumCategory::MedicalNeeds, &[("a", 1)]),
            question("q2", SpectrumCategory::MedicalNeeds, &[("b", 2)]),
        ])
        .await;
        let mut rx = controller.subscribe();

        controller.load_questions().await;
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state, FlowState::InProgress { step: 0 });

        controller.select_option("a").await;
        assert_eq!(
            controller.snapshot().state,
            FlowState::InProgress { step: 1 }
        );
    }
}
