//! Persistence gateway for chat histories and favorites.
//!
//! [`ChatArchive`] is the only component that reads or writes the key-value
//! store. Both collections are stored as whole JSON arrays under fixed keys
//! and rewritten in full on every save.

use super::history::ChatHistory;
use super::message::Message;
use super::store::KeyValueStore;
use crate::error::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Store key of the chat history collection.
pub const CHAT_HISTORY_KEY: &str = "@chat_history";

/// Store key of the favorites collection.
pub const FAVORITES_KEY: &str = "@favorites";

/// Maximum number of retained chat histories.
pub const MAX_HISTORIES: usize = 50;

/// Typed access to the persisted collections.
///
/// The archive keeps an in-memory mirror of both collections, refreshed on
/// [`ChatArchive::open`] and updated after each successful write. The mirror
/// is what the history browser projects.
///
/// Saves are read-modify-write against the mirror and assume a single writer.
pub struct ChatArchive {
    store: Arc<dyn KeyValueStore>,
    histories: RwLock<Vec<ChatHistory>>,
    favorites: RwLock<Vec<Message>>,
}

impl ChatArchive {
    /// Creates an archive with empty mirrors. Call [`ChatArchive::refresh`]
    /// to hydrate them.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            histories: RwLock::new(Vec::new()),
            favorites: RwLock::new(Vec::new()),
        }
    }

    /// Creates an archive and loads both collections.
    pub async fn open(store: Arc<dyn KeyValueStore>) -> Self {
        let archive = Self::new(store);
        archive.refresh().await;
        archive
    }

    /// Reloads both mirrors from the store.
    pub async fn refresh(&self) {
        let histories = self.load_histories().await;
        let favorites = self.load_favorites().await;
        *self.histories.write().await = histories;
        *self.favorites.write().await = favorites;
    }

    /// Reads the history collection, newest first.
    ///
    /// A missing key or unreadable content yields an empty collection.
    pub async fn load_histories(&self) -> Vec<ChatHistory> {
        self.read_collection(CHAT_HISTORY_KEY).await
    }

    /// Reads the favorites collection.
    ///
    /// A missing key or unreadable content yields an empty collection.
    pub async fn load_favorites(&self) -> Vec<Message> {
        self.read_collection(FAVORITES_KEY).await
    }

    /// Prepends `entry` to the history collection and writes it back.
    ///
    /// An existing entry with the same id is superseded, and the collection
    /// is truncated to the [`MAX_HISTORIES`] most recent entries. The mirror
    /// is only updated when the write succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the store write fails.
    pub async fn save_history(&self, entry: ChatHistory) -> Result<()> {
        let mut histories = self.histories.write().await;

        let mut updated = Vec::with_capacity(MAX_HISTORIES);
        let entry_id = entry.id.clone();
        updated.push(entry);
        updated.extend(
            histories
                .iter()
                .filter(|history| history.id != entry_id)
                .cloned(),
        );
        updated.truncate(MAX_HISTORIES);

        self.write_collection(CHAT_HISTORY_KEY, &updated).await?;
        tracing::info!(
            history_id = %entry_id,
            retained = updated.len(),
            "Saved chat history"
        );

        *histories = updated;
        Ok(())
    }

    /// Overwrites the favorites collection with `favorites`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the store write fails.
    pub async fn save_favorites(&self, favorites: Vec<Message>) -> Result<()> {
        let mut mirror = self.favorites.write().await;
        self.write_collection(FAVORITES_KEY, &favorites).await?;
        tracing::debug!(count = favorites.len(), "Saved favorites");
        *mirror = favorites;
        Ok(())
    }

    /// Returns the mirrored history collection, newest first.
    pub async fn histories(&self) -> Vec<ChatHistory> {
        self.histories.read().await.clone()
    }

    /// Returns the mirrored favorites collection.
    pub async fn favorites(&self) -> Vec<Message> {
        self.favorites.read().await.clone()
    }

    /// Finds a mirrored history by id.
    pub async fn find_history(&self, history_id: &str) -> Option<ChatHistory> {
        self.histories
            .read()
            .await
            .iter()
            .find(|history| history.id == history_id)
            .cloned()
    }

    async fn read_collection<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read collection, treating as empty");
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "Unreadable collection, treating as empty");
            Vec::new()
        })
    }

    async fn write_collection<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let result = match serde_json::to_string(items) {
            Ok(raw) => self.store.set(key, &raw).await,
            Err(e) => Err(e.into()),
        };

        result.inspect_err(|e| {
            tracing::error!(key, error = %e, "Failed to write collection");
        })
    }
}
