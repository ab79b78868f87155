use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ScopeSnapshot, ScopeStorage, StorageError, StorageKey};
use crate::config::StorageConfig;
use crate::dialog::DialogStack;
use crate::memory::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConversationRecord {
    scope: Value,
    stack: DialogStack,
}

/// Process-local storage backed by DashMap.
///
/// User scope is keyed by user id so it follows the user across conversations.
/// Conversation scope and the dialog stack are keyed by conversation and user.
/// Records are stored serialized, so everything saved must survive a JSON round trip.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScopeStorage {
    config: StorageConfig,
    users: Arc<DashMap<String, serde_json::Value>>,
    conversations: Arc<DashMap<StorageKey, serde_json::Value>>,
}

impl InMemoryScopeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StorageConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }
}

fn encode<T: Serialize>(value: &T) -> Result<serde_json::Value, StorageError> {
    serde_json::to_value(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode<T: for<'de> Deserialize<'de>>(value: serde_json::Value) -> Result<T, StorageError> {
    serde_json::from_value(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

#[async_trait]
impl ScopeStorage for InMemoryScopeStorage {
    async fn load(&self, key: &StorageKey) -> Result<ScopeSnapshot, StorageError> {
        let mut snapshot = ScopeSnapshot::default();
        if let Some(user) = self.users.get(&key.user_id) {
            snapshot.user = decode(user.clone())?;
        }
        if let Some(record) = self.conversations.get(key) {
            let record: ConversationRecord = decode(record.clone())?;
            snapshot.conversation = record.scope;
            snapshot.stack = record.stack;
        }
        debug!(
            "loaded snapshot for {}/{} with {} frames",
            key.conversation_id,
            key.user_id,
            snapshot.stack.len()
        );
        Ok(snapshot)
    }

    async fn save(&self, key: &StorageKey, snapshot: &ScopeSnapshot) -> Result<(), StorageError> {
        if self.config.persist_user_scope {
            self.users
                .insert(key.user_id.clone(), encode(&snapshot.user)?);
        }
        let record = ConversationRecord {
            scope: if self.config.persist_conversation_scope {
                snapshot.conversation.clone()
            } else {
                Value::empty_map()
            },
            stack: snapshot.stack.clone(),
        };
        self.conversations.insert(key.clone(), encode(&record)?);
        Ok(())
    }

    async fn delete(&self, key: &StorageKey) -> Result<(), StorageError> {
        self.conversations.remove(key);
        Ok(())
    }
}
