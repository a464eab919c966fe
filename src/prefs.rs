//! Preference store — onboarding completion state and aggregate scores.
//!
//! A watch value cell fronts a JSON file. Writers update the cell
//! synchronously (observers see the change immediately) and the durable
//! write runs fire-and-forget; write failures are logged, never returned.
//! Reads always serve the last-known snapshot and default to zero/empty
//! when the file is missing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::StoreError;
use crate::onboarding::model::{ScoreSummary, SpectrumCategory};

/// The persisted preference values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceSnapshot {
    pub onboarding_completed: bool,
    pub total_impact_score: u32,
    pub category_scores: BTreeMap<SpectrumCategory, u32>,
}

/// Observable key-value store for onboarding results.
pub struct PreferenceStore {
    path: PathBuf,
    cell: watch::Sender<PreferenceSnapshot>,
}

impl PreferenceStore {
    /// Open the store at `path`, seeding from the file when it exists.
    ///
    /// A missing or unreadable file yields defaults; this read path never fails.
    pub async fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let initial = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), "Unreadable preference file, using defaults: {}", e);
                PreferenceSnapshot::default()
            }),
            Err(_) => PreferenceSnapshot::default(),
        };
        let (cell, _) = watch::channel(initial);
        Self { path, cell }
    }

    /// Last-known values.
    pub fn snapshot(&self) -> PreferenceSnapshot {
        self.cell.borrow().clone()
    }

    /// Subscribe to preference changes.
    pub fn subscribe(&self) -> watch::Receiver<PreferenceSnapshot> {
        self.cell.subscribe()
    }

    pub fn onboarding_completed(&self) -> bool {
        self.cell.borrow().onboarding_completed
    }

    pub fn total_impact_score(&self) -> u32 {
        self.cell.borrow().total_impact_score
    }

    pub fn category_scores(&self) -> BTreeMap<SpectrumCategory, u32> {
        self.cell.borrow().category_scores.clone()
    }

    /// Record onboarding completion with the aggregate scores.
    ///
    /// The in-memory cell updates before this returns; the file write is
    /// spawned and not awaited.
    pub fn complete_onboarding(&self, summary: &ScoreSummary) {
        let snapshot = PreferenceSnapshot {
            onboarding_completed: true,
            total_impact_score: summary.total,
            category_scores: summary.by_category.clone(),
        };
        // send_replace: the value must land even with zero subscribers.
        self.cell.send_replace(snapshot.clone());

        let path = self.path.clone();
        tokio::spawn(async move {
            if let Err(e) = write_snapshot(&path, &snapshot).await {
                tracing::error!(path = %path.display(), "Failed to persist preferences: {}", e);
            }
        });
    }

    /// Write the current snapshot and wait for it (shutdown, tests).
    pub async fn flush(&self) -> Result<(), StoreError> {
        let snapshot = self.snapshot();
        write_snapshot(&self.path, &snapshot).await
    }
}

async fn write_snapshot(path: &Path, snapshot: &PreferenceSnapshot) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> ScoreSummary {
        let mut by_category = BTreeMap::new();
        by_category.insert(SpectrumCategory::SensoryProcessing, 7);
        by_category.insert(SpectrumCategory::MedicalNeeds, 2);
        ScoreSummary { total: 9, by_category }
    }

    #[tokio::test]
    async fn defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::open(dir.path().join("prefs.json")).await;
        assert!(!store.onboarding_completed());
        assert_eq!(store.total_impact_score(), 0);
        assert!(store.category_scores().is_empty());
    }

    #[tokio::test]
    async fn complete_onboarding_updates_cell_synchronously() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::open(dir.path().join("prefs.json")).await;
        let mut rx = store.subscribe();

        store.complete_onboarding(&summary());

        // Visible without yielding to the spawned writer.
        assert!(store.onboarding_completed());
        assert_eq!(store.total_impact_score(), 9);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().total_impact_score, 9);
    }

    #[tokio::test]
    async fn update_lands_with_no_subscribers() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::open(dir.path().join("prefs.json")).await;

        // Nobody is watching; the cell must still take the new value.
        store.complete_onboarding(&summary());

        assert!(store.onboarding_completed());
        assert_eq!(store.total_impact_score(), 9);
        assert_eq!(store.snapshot().category_scores.len(), 2);
    }

    #[tokio::test]
    async fn snapshot_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let store = PreferenceStore::open(&path).await;
        store.complete_onboarding(&summary());
        store.flush().await.unwrap();

        let reloaded = PreferenceStore::open(&path).await;
        assert_eq!(reloaded.snapshot(), store.snapshot());
        assert_eq!(
            reloaded.category_scores().get(&SpectrumCategory::SensoryProcessing),
            Some(&7)
        );
    }

    #[tokio::test]
    async fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let store = PreferenceStore::open(&path).await;
        assert_eq!(store.snapshot(), PreferenceSnapshot::default());
    }
}
