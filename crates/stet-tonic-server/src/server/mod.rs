//! Server-side components of the `stet` Person service.
//!
//! ## Submodules
//!
//! - [`config`] - CLI/environment configuration and its validation.
//! - [`store`] - Document store adapters behind the [`store::PersonStore`]
//!   trait.
//! - [`service`] - gRPC handler set (`PersonService`).
//! - [`lifecycle`] - Connect, bind, serve and ordered teardown.
//! - [`telemetry`] - `tracing` subscriber setup and optional OpenTelemetry
//!   export.

pub mod config;
pub mod lifecycle;
pub mod service;
pub mod store;
pub mod telemetry;
