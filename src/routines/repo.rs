//! Routine repository.
//!
//! Handlers depend only on this trait; the in-memory implementation is
//! demo-grade and makes no durability promises.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;

use super::model::Routine;

/// CRUD contract for routine storage.
#[async_trait]
pub trait RoutineRepository: Send + Sync {
    async fn insert(&self, routine: Routine) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Routine>, StoreError>;

    /// Replace an existing routine. `NotFound` when the id is unknown.
    async fn update(&self, routine: Routine) -> Result<(), StoreError>;

    async fn remove(&self, id: &str) -> Result<(), StoreError>;
}

/// Map-backed repository for local/demo use.
pub struct InMemoryRoutineRepository {
    routines: RwLock<HashMap<String, Routine>>,
}

impl InMemoryRoutineRepository {
    pub fn new() -> Self {
        Self {
            routines: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRoutineRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoutineRepository for InMemoryRoutineRepository {
    async fn insert(&self, routine: Routine) -> Result<(), StoreError> {
        self.routines
            .write()
            .await
            .insert(routine.id.clone(), routine);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Routine>, StoreError> {
        Ok(self.routines.read().await.get(id).cloned())
    }

    async fn update(&self, routine: Routine) -> Result<(), StoreError> {
        let mut routines = self.routines.write().await;
        if !routines.contains_key(&routine.id) {
            return Err(StoreError::NotFound {
                entity: "routine".to_string(),
                id: routine.id,
            });
        }
        routines.insert(routine.id.clone(), routine);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        if self.routines.write().await.remove(id).is_none() {
            return Err(StoreError::NotFound {
                entity: "routine".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
