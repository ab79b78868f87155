//! Persistence of user scope, conversation scope and the dialog stack between turns.

mod in_memory;

pub use in_memory::InMemoryScopeStorage;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::activity::Activity;
use crate::dialog::DialogStack;
use crate::memory::Value;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Identifies the persisted state of one user in one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageKey {
    pub conversation_id: String,
    pub user_id: String,
}

impl StorageKey {
    pub fn new(conversation_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            user_id: user_id.into(),
        }
    }
}

impl From<&Activity> for StorageKey {
    fn from(activity: &Activity) -> Self {
        Self::new(activity.conversation_id.clone(), activity.from.id.clone())
    }
}

/// Everything that survives a turn. The turn scope and dialog scopes of popped frames
/// are never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeSnapshot {
    pub user: Value,
    pub conversation: Value,
    pub stack: DialogStack,
}

impl Default for ScopeSnapshot {
    fn default() -> Self {
        Self {
            user: Value::empty_map(),
            conversation: Value::empty_map(),
            stack: DialogStack::new(),
        }
    }
}

/// Loads and saves snapshots. A missing entry loads as an empty snapshot.
#[mockall::automock]
#[async_trait]
pub trait ScopeStorage: Send + Sync {
    async fn load(&self, key: &StorageKey) -> Result<ScopeSnapshot, StorageError>;
    async fn save(&self, key: &StorageKey, snapshot: &ScopeSnapshot) -> Result<(), StorageError>;
    async fn delete(&self, key: &StorageKey) -> Result<(), StorageError>;
}
