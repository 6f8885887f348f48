//! gRPC service implementation for the Person collection.
//!
//! ## Structure
//!
//! - [`handler`] - gRPC service entry point (`PersonService`).

pub mod handler;
