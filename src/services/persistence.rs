//! Durable storage seam for playground templates
//!
//! The session never talks to a database directly; it hands the whole
//! template tree to a `PersistenceGateway` and reacts to success or failure.
//! The wire format and transport live behind the trait.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::model::TemplateFolder;

/// Errors surfaced by a persistence backend
#[derive(Debug, Clone)]
pub enum PersistError {
    /// The backend refused or failed the save
    Rejected(String),
    /// No template stored under the given playground id
    NotFound(String),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Rejected(reason) => write!(f, "save rejected: {}", reason),
            PersistError::NotFound(id) => write!(f, "no template for playground: {}", id),
        }
    }
}

impl std::error::Error for PersistError {}

/// Asynchronous durable storage for template trees
///
/// Calls may be slow and may fail independently per invocation; callers are
/// expected to keep their previous tree around until a save succeeds.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Persist the full template tree for a playground.
    ///
    /// # Errors
    ///
    /// Returns `PersistError::Rejected` when the backend could not store the
    /// tree; the caller's in-memory state must then be rolled back.
    async fn save_template(
        &self,
        playground_id: &str,
        root: &TemplateFolder,
    ) -> Result<(), PersistError>;

    /// Load the template tree for a playground.
    async fn load_template(&self, playground_id: &str) -> Result<TemplateFolder, PersistError>;
}

/// In-memory gateway for tests and embedders without a backend
///
/// Can be told to fail the next save, which exercises the rollback paths.
#[derive(Default)]
pub struct InMemoryGateway {
    templates: Mutex<HashMap<String, TemplateFolder>>,
    fail_next_save: AtomicBool,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `save_template` call fail with `Rejected`.
    pub fn fail_next_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }

    /// The last tree saved for a playground, if any.
    pub async fn stored(&self, playground_id: &str) -> Option<TemplateFolder> {
        self.templates.lock().await.get(playground_id).cloned()
    }

    /// Seed a template so `load_template` can find it.
    pub async fn put(&self, playground_id: &str, root: TemplateFolder) {
        self.templates
            .lock()
            .await
            .insert(playground_id.to_string(), root);
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn save_template(
        &self,
        playground_id: &str,
        root: &TemplateFolder,
    ) -> Result<(), PersistError> {
        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            return Err(PersistError::Rejected("injected failure".to_string()));
        }
        self.templates
            .lock()
            .await
            .insert(playground_id.to_string(), root.clone());
        Ok(())
    }

    async fn load_template(&self, playground_id: &str) -> Result<TemplateFolder, PersistError> {
        self.templates
            .lock()
            .await
            .get(playground_id)
            .cloned()
            .ok_or_else(|| PersistError::NotFound(playground_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_gateway_round_trip() {
        let gateway = InMemoryGateway::new();
        let root = TemplateFolder::new("root");
        gateway.save_template("p1", &root).await.unwrap();
        let loaded = gateway.load_template("p1").await.unwrap();
        assert_eq!(loaded, root);
    }

    #[tokio::test]
    async fn test_memory_gateway_missing_template() {
        let gateway = InMemoryGateway::new();
        assert!(matches!(
            gateway.load_template("nope").await,
            Err(PersistError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fail_next_save_is_one_shot() {
        let gateway = InMemoryGateway::new();
        let root = TemplateFolder::new("root");
        gateway.fail_next_save();
        assert!(gateway.save_template("p1", &root).await.is_err());
        assert!(gateway.save_template("p1", &root).await.is_ok());
    }
}
