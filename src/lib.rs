//! Strata Provider SDK
//!
//! This crate provides the interfaces, protocol types, and server glue for
//! building Strata providers: plugins that teach the Strata orchestration
//! tool how to provision a family of infrastructure resources.
//!
//! # Overview
//!
//! The SDK provides:
//!
//! - **Provider interfaces**: The [`Provider`], [`Resource`], and
//!   [`DataSource`] traits providers implement
//! - **Request/response objects**: One typed pair per RPC verb, with an
//!   accumulating [`Diagnostics`] collection on every response
//! - **Schema types**: Types for describing provider, resource, and data
//!   source schemas
//! - **Import helpers**: [`resource_import_state_passthrough_id`] and
//!   [`resource_import_state_not_implemented`] for common import handlers
//! - **Server helpers**: [`serve`] starts the gRPC server with the
//!   handshake protocol; the dispatch layer maps RPCs onto the traits
//! - **Value contract**: [`AttrType`]/[`AttrValue`] for plugging custom
//!   attribute value representations into the wire protocol
//! - **Logging**: Integration with `tracing` for structured logging
//! - **Testing**: [`testing::ProviderTester`] drives a provider without a
//!   server, plus conformance doubles for the value contract
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use strata_provider_sdk::{
//!     async_trait, serve, ConfigureProviderRequest, ConfigureProviderResponse,
//!     CreateResourceRequest, CreateResourceResponse, DeleteResourceRequest,
//!     DeleteResourceResponse, Provider, ProviderError, ProviderSchema,
//!     ReadResourceRequest, ReadResourceResponse, Resource,
//!     UpdateResourceRequest, UpdateResourceResponse,
//!     schema::{Attribute, Schema},
//! };
//!
//! struct MyProvider;
//! struct ServerResource;
//!
//! #[async_trait]
//! impl Resource for ServerResource {
//!     async fn create(&self, req: CreateResourceRequest, resp: &mut CreateResourceResponse) {
//!         resp.state = req.plan.clone();
//!         let diags = resp.state.set_attribute("id", "srv-123".into());
//!         resp.diagnostics.append(diags);
//!     }
//!
//!     async fn read(&self, _req: ReadResourceRequest, _resp: &mut ReadResourceResponse) {}
//!
//!     async fn update(&self, req: UpdateResourceRequest, resp: &mut UpdateResourceResponse) {
//!         resp.state = req.plan;
//!     }
//!
//!     async fn delete(&self, _req: DeleteResourceRequest, _resp: &mut DeleteResourceResponse) {}
//! }
//!
//! #[async_trait]
//! impl Provider for MyProvider {
//!     fn schema(&self) -> ProviderSchema {
//!         ProviderSchema::new()
//!             .with_resource("example_server", Schema::v0()
//!                 .with_attribute("name", Attribute::required_string())
//!                 .with_attribute("id", Attribute::computed_string()))
//!     }
//!
//!     async fn configure(
//!         &self,
//!         _req: ConfigureProviderRequest,
//!         _resp: &mut ConfigureProviderResponse,
//!     ) {
//!     }
//!
//!     fn resource(&self, type_name: &str) -> Option<Arc<dyn Resource>> {
//!         match type_name {
//!             "example_server" => Some(Arc::new(ServerResource)),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ProviderError> {
//!     let provider = MyProvider;
//!     serve(provider).await
//! }
//! ```
//!
//! # Handshake Protocol
//!
//! When a provider starts via [`serve`], it outputs a handshake string to stdout:
//!
//! ```text
//! STRATA_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! Format: `STRATA_PROVIDER|<protocol_version>|<address>`
//!
//! This allows Strata to spawn the provider as a subprocess and connect via gRPC.
//!
//! # Provider Protocol
//!
//! The RPC verbs, and where each lands:
//!
//! - **GetMetadata / GetSchema**: answered from [`Provider::schema`]
//! - **ValidateProviderConfig / ValidateResourceConfig /
//!   ValidateDataSourceConfig**: answered by schema validation, no handler
//!   involved
//! - **Configure**: [`Provider::configure`]
//! - **Stop**: [`Provider::stop`]
//! - **Plan**: [`Resource::modify_plan`] adjusts the host's proposed plan
//! - **Create/Read/Update/Delete**: the resource's CRUD handlers
//! - **UpgradeResourceState**: [`Resource::upgrade_state`], only for state
//!   written at an older schema version
//! - **ImportResourceState**: [`Resource::import_state`]
//! - **ReadDataSource**: [`DataSource::read`]
//!
//! Errors travel exclusively as diagnostics on the response objects; a
//! handler never fails an RPC at the transport level.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod data;
pub mod diag;
pub mod error;
pub mod logging;
pub mod provider;
pub mod request;
pub mod resource;
pub mod response;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod validation;
pub mod value;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod generated;

// Re-export main types at crate root
pub use data::{Config, State};
pub use diag::{Diagnostic, DiagnosticSeverity, Diagnostics};
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::Provider;
pub use request::{
    ConfigureProviderRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ModifyResourcePlanRequest, ReadDataSourceRequest,
    ReadResourceRequest, UpdateResourceRequest, UpgradeResourceStateRequest,
};
pub use resource::{
    resource_import_state_not_implemented, resource_import_state_passthrough_id, DataSource,
    Resource,
};
pub use response::{
    ConfigureProviderResponse, CreateResourceResponse, DeleteResourceResponse,
    ImportResourceStateResponse, ModifyResourcePlanResponse, ReadDataSourceResponse,
    ReadResourceResponse, UpdateResourceResponse, UpgradeResourceStateResponse,
};
pub use schema::ProviderSchema;
pub use server::{serve, serve_on, serve_on_with_options, serve_with_options, ServeOptions};
pub use types::{
    AttributeChange, ProviderMetadata, ServerCapabilities, HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};
pub use validation::{is_valid, validate, validate_result};
pub use value::{AttrType, AttrValue, DynamicValue};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tonic;
pub use tracing;
