pub mod error;
pub mod types;

pub use error::{Error, Result};

/// gRPC service and message definitions generated from `proto/stet.proto`.
///
/// - [`proto::stet_service_server::StetService`] - server trait implemented
///   by the Person handler set.
/// - [`proto::stet_service_client::StetServiceClient`] - generated client.
pub mod proto {
    tonic::include_proto!("stet");
    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("stet_descriptor");
}
