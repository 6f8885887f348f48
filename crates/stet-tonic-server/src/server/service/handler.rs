//! gRPC service implementation for Person CRUD.
//!
//! This module defines [`PersonService`], the concrete implementation of the
//! [`StetService`] gRPC service defined in the protobuf specification. Every
//! handler has the same shape: decode the identifier (where one is given),
//! call the [`PersonStore`], and translate the outcome.
//!
//! ## Status mapping
//!
//! | Outcome                        | Status             |
//! |--------------------------------|--------------------|
//! | identifier fails to decode     | `INVALID_ARGUMENT` |
//! | `person` message missing       | `INVALID_ARGUMENT` |
//! | no matching document           | `NOT_FOUND`        |
//! | store unreachable or failing   | `INTERNAL`         |
//!
//! Nothing is retried server-side.

use crate::server::{store::PersonStore, telemetry::record_rpc};
use std::{sync::Arc, time::Instant};
use stet_tonic_core::{
    Error, Result as ServiceResult,
    proto::{
        CreatePersonRequest, CreatePersonResponse, DeletePersonRequest, DeletePersonResponse,
        Person, ReadPersonRequest, ReadPersonResponse, UpdatePersonRequest, UpdatePersonResponse,
        stet_service_server::StetService,
    },
    types::PersonId,
};
use tonic::{Code, Request, Response, Status};

/// Person CRUD over an injected [`PersonStore`].
///
/// Cloning is cheap; all clones share the same store handle.
#[derive(Clone)]
pub struct PersonService {
    store: Arc<dyn PersonStore>,
}

impl PersonService {
    pub fn new(store: Arc<dyn PersonStore>) -> Self {
        Self { store }
    }

    async fn create(&self, req: CreatePersonRequest) -> ServiceResult<Person> {
        let person = req.person.ok_or_else(missing_person)?;
        let id = self.store.insert(&person.name).await?;
        Ok(Person {
            id: id.encode(),
            name: person.name,
        })
    }

    async fn read(&self, req: ReadPersonRequest) -> ServiceResult<Person> {
        let id = PersonId::decode(&req.person_id)?;
        let stored = self.store.find_by_id(id).await?;
        Ok(Person {
            id: stored.id.encode(),
            name: stored.name,
        })
    }

    async fn update(&self, req: UpdatePersonRequest) -> ServiceResult<Person> {
        let person = req.person.ok_or_else(missing_person)?;
        let id = PersonId::decode(&person.id)?;
        let stored = self.store.update_by_id(id, &person.name).await?;
        Ok(Person {
            id: stored.id.encode(),
            name: stored.name,
        })
    }

    async fn delete(&self, req: DeletePersonRequest) -> ServiceResult<String> {
        let id = PersonId::decode(&req.person_id)?;
        self.store.delete_by_id(id).await?;
        Ok(req.person_id)
    }
}

fn missing_person() -> Error {
    Error::InvalidRequest {
        reason: "missing person".to_string(),
    }
}

/// Converts a handler outcome into a gRPC response, logging and recording it.
fn respond<T>(
    method: &'static str,
    start: Instant,
    result: ServiceResult<T>,
) -> Result<Response<T>, Status> {
    let elapsed = start.elapsed();
    match result {
        Ok(body) => {
            record_rpc(method, Code::Ok, elapsed);
            Ok(Response::new(body))
        }
        Err(err) => {
            let status = Status::from(err.clone());
            record_rpc(method, status.code(), elapsed);
            match err {
                Error::StoreUnavailable { .. } => {
                    tracing::error!(method, error = %err, "Store failure")
                }
                _ => tracing::debug!(method, error = %err, "Request rejected"),
            }
            Err(status)
        }
    }
}

#[tonic::async_trait]
impl StetService for PersonService {
    #[tracing::instrument(skip_all)]
    async fn create_person(
        &self,
        req: Request<CreatePersonRequest>,
    ) -> Result<Response<CreatePersonResponse>, Status> {
        let start = Instant::now();
        let result = self
            .create(req.into_inner())
            .await
            .map(|person| CreatePersonResponse {
                person: Some(person),
            });
        respond("CreatePerson", start, result)
    }

    #[tracing::instrument(skip_all, fields(person_id = %req.get_ref().person_id))]
    async fn read_person(
        &self,
        req: Request<ReadPersonRequest>,
    ) -> Result<Response<ReadPersonResponse>, Status> {
        let start = Instant::now();
        let result = self
            .read(req.into_inner())
            .await
            .map(|person| ReadPersonResponse {
                person: Some(person),
            });
        respond("ReadPerson", start, result)
    }

    #[tracing::instrument(
        skip_all,
        fields(person_id = req.get_ref().person.as_ref().map(|p| p.id.as_str()).unwrap_or_default())
    )]
    async fn update_person(
        &self,
        req: Request<UpdatePersonRequest>,
    ) -> Result<Response<UpdatePersonResponse>, Status> {
        let start = Instant::now();
        let result = self
            .update(req.into_inner())
            .await
            .map(|person| UpdatePersonResponse {
                person: Some(person),
            });
        respond("UpdatePerson", start, result)
    }

    #[tracing::instrument(skip_all, fields(person_id = %req.get_ref().person_id))]
    async fn delete_person(
        &self,
        req: Request<DeletePersonRequest>,
    ) -> Result<Response<DeletePersonResponse>, Status> {
        let start = Instant::now();
        let result = self
            .delete(req.into_inner())
            .await
            .map(|person_id| DeletePersonResponse { person_id });
        respond("DeletePerson", start, result)
    }
}
