//! MongoDB adapter.
//!
//! Documents have the shape `{ _id: ObjectId, name: String }`. The driver's
//! `ObjectId` never leaves this module: it is converted to and from
//! [`PersonId`] at the adapter boundary.

use super::{PersonStore, StoredPerson};
use crate::server::{config::MongoConfig, lifecycle::StartupError};
use core::{future::IntoFuture, time::Duration};
use mongodb::{
    Client, Collection,
    bson::{doc, oid::ObjectId},
    options::{ClientOptions, ReturnDocument},
};
use serde::{Deserialize, Serialize};
use stet_tonic_core::{Error, Result, types::PersonId};

#[derive(Debug, Serialize, Deserialize)]
struct PersonDocument {
    // Left empty on insert so the server assigns the identifier.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    name: String,
}

impl PersonDocument {
    fn into_stored(self) -> Result<StoredPerson> {
        let id = self.id.ok_or_else(|| Error::StoreUnavailable {
            context: "document is missing _id".to_string(),
        })?;
        Ok(StoredPerson {
            id: PersonId::from_bytes(id.bytes()),
            name: self.name,
        })
    }
}

fn unavailable(err: mongodb::error::Error) -> Error {
    Error::StoreUnavailable {
        context: err.to_string(),
    }
}

fn object_id(id: PersonId) -> ObjectId {
    ObjectId::from_bytes(id.to_bytes())
}

pub struct MongoStore {
    client: Client,
    collection: Collection<PersonDocument>,
    shutdown_timeout: Duration,
}

impl MongoStore {
    /// Connects to the deployment named by `config.uri` and pings it.
    ///
    /// The driver connects lazily, so the ping is what turns an unreachable
    /// server into a startup failure instead of a failed first request.
    pub async fn connect(
        config: &MongoConfig,
        shutdown_timeout: Duration,
    ) -> core::result::Result<Self, StartupError> {
        let mut options = ClientOptions::parse(&config.uri).await?;
        options.app_name = Some("stet".to_string());
        options.connect_timeout = Some(config.connect_timeout);
        options.server_selection_timeout = Some(config.connect_timeout);

        let client = Client::with_options(options)?;
        let database = client.database(&config.database);
        database.run_command(doc! { "ping": 1 }).await?;

        tracing::info!(
            database = %config.database,
            collection = %config.collection,
            "Connected to MongoDB"
        );

        Ok(Self {
            collection: database.collection(&config.collection),
            client,
            shutdown_timeout,
        })
    }
}

#[tonic::async_trait]
impl PersonStore for MongoStore {
    async fn insert(&self, name: &str) -> Result<PersonId> {
        let document = PersonDocument {
            id: None,
            name: name.to_string(),
        };
        let res = self
            .collection
            .insert_one(document)
            .await
            .map_err(unavailable)?;
        let oid = res
            .inserted_id
            .as_object_id()
            .ok_or_else(|| Error::StoreUnavailable {
                context: format!("inserted _id is not an ObjectId: {}", res.inserted_id),
            })?;
        Ok(PersonId::from_bytes(oid.bytes()))
    }

    async fn find_by_id(&self, id: PersonId) -> Result<StoredPerson> {
        self.collection
            .find_one(doc! { "_id": object_id(id) })
            .await
            .map_err(unavailable)?
            .ok_or_else(|| Error::NotFound { id: id.encode() })?
            .into_stored()
    }

    async fn update_by_id(&self, id: PersonId, name: &str) -> Result<StoredPerson> {
        self.collection
            .find_one_and_update(
                doc! { "_id": object_id(id) },
                doc! { "$set": { "name": name } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(unavailable)?
            .ok_or_else(|| Error::NotFound { id: id.encode() })?
            .into_stored()
    }

    async fn delete_by_id(&self, id: PersonId) -> Result<u64> {
        let res = self
            .collection
            .delete_one(doc! { "_id": object_id(id) })
            .await
            .map_err(unavailable)?;
        if res.deleted_count == 0 {
            return Err(Error::NotFound { id: id.encode() });
        }
        Ok(res.deleted_count)
    }

    async fn close(&self) -> Result<()> {
        tokio::time::timeout(
            self.shutdown_timeout,
            self.client.clone().shutdown().into_future(),
        )
        .await
        .map_err(|_| Error::StoreUnavailable {
            context: format!(
                "disconnect did not finish within {:?}",
                self.shutdown_timeout
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_round_trips_through_person_id() {
        let oid = ObjectId::new();
        let id = PersonId::from_bytes(oid.bytes());
        assert_eq!(object_id(id), oid);
        assert_eq!(id.encode(), oid.to_hex());
    }

    #[test]
    fn insert_document_omits_id() {
        let document = PersonDocument {
            id: None,
            name: "xyz".to_string(),
        };
        let bson = mongodb::bson::to_document(&document).unwrap();
        assert!(!bson.contains_key("_id"));
        assert_eq!(bson.get_str("name").unwrap(), "xyz");
    }

    #[test]
    fn document_without_id_is_a_store_error() {
        let document = PersonDocument {
            id: None,
            name: "xyz".to_string(),
        };
        assert!(matches!(
            document.into_stored(),
            Err(Error::StoreUnavailable { .. })
        ));
    }

    /// Runs against a live deployment named by `MONGO_URI`, e.g.
    /// `MONGO_URI=mongodb://localhost:27017 cargo test -- --ignored`.
    #[tokio::test]
    #[ignore = "needs a MongoDB deployment in MONGO_URI"]
    async fn absent_documents_map_to_not_found() {
        let Ok(uri) = std::env::var("MONGO_URI") else {
            return;
        };
        let config = MongoConfig {
            uri,
            database: "stet_test".to_string(),
            collection: format!("people_{}", ObjectId::new().to_hex()),
            connect_timeout: Duration::from_secs(5),
        };
        let store = MongoStore::connect(&config, Duration::from_secs(5))
            .await
            .unwrap();

        let unknown = PersonId::from_bytes(ObjectId::new().bytes());
        assert!(matches!(
            store.find_by_id(unknown).await,
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            store.update_by_id(unknown, "nobody").await,
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            store.delete_by_id(unknown).await,
            Err(Error::NotFound { .. })
        ));

        let id = store.insert("xyz").await.unwrap();
        assert_eq!(store.find_by_id(id).await.unwrap().name, "xyz");

        let updated = store.update_by_id(id, "Changed xyz").await.unwrap();
        assert_eq!(updated.id, id);
        assert_eq!(updated.name, "Changed xyz");

        assert_eq!(store.delete_by_id(id).await.unwrap(), 1);
        assert!(matches!(
            store.delete_by_id(id).await,
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            store.find_by_id(id).await,
            Err(Error::NotFound { .. })
        ));

        store.collection.drop().await.unwrap();
        store.close().await.unwrap();
    }
}
