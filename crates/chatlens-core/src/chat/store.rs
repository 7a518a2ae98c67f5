//! Key-value store trait.
//!
//! Defines the interface the persistence gateway writes through.

use crate::error::Result;
use async_trait::async_trait;

/// An abstract string-keyed store of serialized blobs.
///
/// This trait decouples the archive from the storage mechanism (JSON files,
/// memory, a platform key-value service).
///
/// # Implementation Notes
///
/// Implementations only need single-key atomicity: a `set` either replaces
/// the whole value or leaves the previous one intact. No transactions span
/// several keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: Value found
    /// - `Ok(None)`: Key absent
    /// - `Err(_)`: The store could not be read
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the value stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Value written
    /// - `Err(_)`: The write failed; the previous value is retained
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}
