//! Document store adapters for the Person collection.
//!
//! [`PersonStore`] is the seam between the RPC handler set and a concrete
//! document store. An adapter is built once at startup, shared by every
//! in-flight request behind an `Arc`, and never mutated afterwards.
//!
//! ## Backends
//!
//! - [`mongo::MongoStore`] - MongoDB via the official driver.
//! - [`memory::MemoryStore`] - process-local map, for development and tests.

pub mod memory;
pub mod mongo;

use crate::server::config::{ServerConfig, StoreBackend};
use crate::server::lifecycle::StartupError;
use std::sync::Arc;
use stet_tonic_core::{Result, types::PersonId};

/// A Person document as held by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPerson {
    pub id: PersonId,
    pub name: String,
}

/// Storage operations over a single collection of Person documents.
///
/// Every operation reports connectivity or unexpected store failures as
/// [`Error::StoreUnavailable`](stet_tonic_core::Error::StoreUnavailable).
/// Lookups by identifier report a missing document as
/// [`Error::NotFound`](stet_tonic_core::Error::NotFound).
#[tonic::async_trait]
pub trait PersonStore: Send + Sync + 'static {
    /// Inserts a new document and returns the identifier the store assigned.
    async fn insert(&self, name: &str) -> Result<PersonId>;

    async fn find_by_id(&self, id: PersonId) -> Result<StoredPerson>;

    /// Replaces the name of one document and returns its post-update state.
    ///
    /// The read-modify-write is atomic for that document.
    async fn update_by_id(&self, id: PersonId, name: &str) -> Result<StoredPerson>;

    /// Removes one document and returns how many were deleted (never zero).
    async fn delete_by_id(&self, id: PersonId) -> Result<u64>;

    /// Releases the underlying connection. Called once, during shutdown.
    async fn close(&self) -> Result<()>;
}

/// Builds the adapter selected by `config.store` and verifies it is usable.
pub async fn connect(
    config: &ServerConfig,
) -> core::result::Result<Arc<dyn PersonStore>, StartupError> {
    match config.store {
        StoreBackend::Mongo => {
            let store =
                mongo::MongoStore::connect(&config.mongo, config.shutdown_timeout).await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => Ok(Arc::new(memory::MemoryStore::new())),
    }
}
