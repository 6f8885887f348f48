//! Error types for the Person service.
//!
//! This module defines the central `Error` enum shared by the identifier
//! codec, the store adapters and the gRPC handlers. It implements
//! `From<Error>` for `tonic::Status` so handlers can propagate failures with
//! `?` and clients receive a stable status code for each case.
//!
//! ## Error Cases
//! - `InvalidIdentifier`: A person id was not a valid wire encoding.
//! - `InvalidRequest`: The request was structurally incomplete.
//! - `NotFound`: No stored document matches the identifier.
//! - `StoreUnavailable`: The document store could not be reached or failed
//!   unexpectedly.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the Person service.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The identifier is not 24 hexadecimal characters.
    #[error("Cannot parse ID {value:?}")]
    InvalidIdentifier { value: String },

    /// The request was missing a required message.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// No document carries the identifier.
    #[error("Cannot find person with ID {id}")]
    NotFound { id: String },

    /// Connectivity or write failure reported by the store.
    #[error("Store unavailable: {context}")]
    StoreUnavailable { context: String },
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidIdentifier { .. } => Status::invalid_argument(err.to_string()),
            Error::InvalidRequest { reason } => Status::invalid_argument(reason),
            Error::NotFound { .. } => Status::not_found(err.to_string()),
            Error::StoreUnavailable { context } => {
                Status::internal(format!("Internal error: {}", context))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn maps_each_case_to_its_status_code() {
        let cases = [
            (
                Error::InvalidIdentifier {
                    value: "abc".into(),
                },
                Code::InvalidArgument,
            ),
            (
                Error::InvalidRequest {
                    reason: "missing person".into(),
                },
                Code::InvalidArgument,
            ),
            (
                Error::NotFound {
                    id: "5f1d7a3c9b1e8a0012345678".into(),
                },
                Code::NotFound,
            ),
            (
                Error::StoreUnavailable {
                    context: "connection refused".into(),
                },
                Code::Internal,
            ),
        ];

        for (err, code) in cases {
            assert_eq!(Status::from(err).code(), code);
        }
    }

    #[test]
    fn internal_status_carries_store_context() {
        let status = Status::from(Error::StoreUnavailable {
            context: "connection refused".into(),
        });
        assert_eq!(status.message(), "Internal error: connection refused");
    }

    #[test]
    fn invalid_request_passes_reason_through() {
        let status = Status::from(Error::InvalidRequest {
            reason: "missing person".into(),
        });
        assert_eq!(status.message(), "missing person");
    }
}
