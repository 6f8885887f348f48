//! In-memory adapter.
//!
//! Identifiers are freshly generated 12-byte object ids, so they have the same
//! wire form as documents stored in MongoDB. A single `RwLock` over the map
//! makes each update atomic per document.

use super::{PersonStore, StoredPerson};
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use stet_tonic_core::{Error, Result, types::PersonId};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<PersonId, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[tonic::async_trait]
impl PersonStore for MemoryStore {
    async fn insert(&self, name: &str) -> Result<PersonId> {
        let mut documents = self.documents.write().await;
        let id = loop {
            let candidate = PersonId::from_bytes(ObjectId::new().bytes());
            if !documents.contains_key(&candidate) {
                break candidate;
            }
        };
        documents.insert(id, name.to_string());
        Ok(id)
    }

    async fn find_by_id(&self, id: PersonId) -> Result<StoredPerson> {
        let documents = self.documents.read().await;
        let name = documents
            .get(&id)
            .ok_or_else(|| Error::NotFound { id: id.encode() })?;
        Ok(StoredPerson {
            id,
            name: name.clone(),
        })
    }

    async fn update_by_id(&self, id: PersonId, name: &str) -> Result<StoredPerson> {
        let mut documents = self.documents.write().await;
        let stored = documents
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound { id: id.encode() })?;
        *stored = name.to_string();
        Ok(StoredPerson {
            id,
            name: stored.clone(),
        })
    }

    async fn delete_by_id(&self, id: PersonId) -> Result<u64> {
        match self.documents.write().await.remove(&id) {
            Some(_) => Ok(1),
            None => Err(Error::NotFound { id: id.encode() }),
        }
    }

    async fn close(&self) -> Result<()> {
        let count = self.len().await;
        tracing::debug!(count, "Dropping in-memory documents");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashSet, sync::Arc};

    #[tokio::test]
    async fn inserted_document_is_found() {
        let store = MemoryStore::new();
        let id = store.insert("xyz").await.unwrap();

        let found = store.find_by_id(id).await.unwrap();
        assert_eq!(
            found,
            StoredPerson {
                id,
                name: "xyz".to_string()
            }
        );
    }

    #[tokio::test]
    async fn update_returns_post_update_state() {
        let store = MemoryStore::new();
        let id = store.insert("xyz").await.unwrap();

        let updated = store.update_by_id(id, "Changed xyz").await.unwrap();
        assert_eq!(updated.name, "Changed xyz");
        assert_eq!(store.find_by_id(id).await.unwrap().name, "Changed xyz");
    }

    #[tokio::test]
    async fn missing_documents_are_not_found() {
        let store = MemoryStore::new();
        let id = PersonId::from_bytes([7; 12]);

        let not_found = Error::NotFound { id: id.encode() };
        assert_eq!(store.find_by_id(id).await, Err(not_found.clone()));
        assert_eq!(store.update_by_id(id, "x").await, Err(not_found.clone()));
        assert_eq!(store.delete_by_id(id).await, Err(not_found));
    }

    #[tokio::test]
    async fn delete_removes_exactly_once() {
        let store = MemoryStore::new();
        let id = store.insert("xyz").await.unwrap();

        assert_eq!(store.delete_by_id(id).await, Ok(1));
        assert!(store.delete_by_id(id).await.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_get_distinct_ids() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert(&format!("person-{i}")).await.unwrap()
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }
        assert_eq!(ids.len(), 64);
        assert_eq!(store.len().await, 64);
    }
}
