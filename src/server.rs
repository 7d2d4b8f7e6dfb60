//! The gRPC dispatch layer and `serve` entry points.
//!
//! This module wraps a [`Provider`] in the generated gRPC service: each RPC
//! is decoded into the matching request object, handed to the provider (or
//! the resource/data source handler it names), and the response object is
//! encoded back. A handler that fails never becomes a gRPC error; its error
//! diagnostics ride back on the response for the host to surface.
//!
//! # Signal Handling
//!
//! The server handles OS signals (SIGTERM, SIGINT) for graceful shutdown.
//! When a signal is received, the server:
//! 1. Stops accepting new connections
//! 2. Waits for in-flight requests to complete (with configurable timeout)
//! 3. Calls the provider's `stop()` method
//! 4. Exits cleanly

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::net::TcpListener;
use tonic::transport::Server;
use tracing::{debug, error, info, instrument, warn};

use crate::data::{Config, State};
use crate::diag::Diagnostics;
use crate::error::ProviderError;
use crate::provider::Provider;
use crate::request::{
    ConfigureProviderRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ModifyResourcePlanRequest, ReadDataSourceRequest,
    ReadResourceRequest, UpdateResourceRequest, UpgradeResourceStateRequest,
};
use crate::resource::{DataSource, Resource};
use crate::response::{
    ConfigureProviderResponse, CreateResourceResponse, DeleteResourceResponse,
    ImportResourceStateResponse, ModifyResourcePlanResponse, ReadDataSourceResponse,
    ReadResourceResponse, UpdateResourceResponse, UpgradeResourceStateResponse,
};
use crate::schema::Schema;
use crate::types::{HANDSHAKE_PREFIX, PROTOCOL_VERSION};
use crate::validation;

/// Wrapper that implements the generated gRPC trait over a [`Provider`].
struct ProviderGrpcService<P: Provider> {
    provider: Arc<P>,
}

impl<P: Provider> ProviderGrpcService<P> {
    fn resource_schema(&self, type_name: &str) -> Option<Schema> {
        self.provider.schema().resources.get(type_name).cloned()
    }

    fn resource_parts(&self, type_name: &str) -> Option<(Arc<dyn Resource>, Schema)> {
        let schema = self.resource_schema(type_name)?;
        let resource = self.provider.resource(type_name)?;
        Some((resource, schema))
    }

    fn data_source_schema(&self, type_name: &str) -> Option<Schema> {
        self.provider.schema().data_sources.get(type_name).cloned()
    }

    fn data_source_parts(&self, type_name: &str) -> Option<(Arc<dyn DataSource>, Schema)> {
        let schema = self.data_source_schema(type_name)?;
        let data_source = self.provider.data_source(type_name)?;
        Some((data_source, schema))
    }
}

fn unknown_resource_type(type_name: &str) -> Vec<crate::generated::Diagnostic> {
    let mut diagnostics = Diagnostics::new();
    diagnostics.add_error(
        "Unknown Resource Type",
        format!(
            "The provider does not support resource type '{}'.",
            type_name
        ),
    );
    diagnostics.into_proto()
}

fn unknown_data_source_type(type_name: &str) -> Vec<crate::generated::Diagnostic> {
    let mut diagnostics = Diagnostics::new();
    diagnostics.add_error(
        "Unknown Data Source Type",
        format!(
            "The provider does not support data source type '{}'.",
            type_name
        ),
    );
    diagnostics.into_proto()
}

/// Empty bytes mean "not populated"; anything else is a JSON document.
fn decode_document(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap_or(Value::Null)
    }
}

/// A null state encodes back to empty bytes, which the host reads as "gone".
fn encode_state(state: &State) -> Vec<u8> {
    if state.is_null() {
        Vec::new()
    } else {
        serde_json::to_vec(state.raw()).unwrap_or_default()
    }
}

#[tonic::async_trait]
impl<P: Provider> crate::generated::provider_server::Provider for ProviderGrpcService<P> {
    #[instrument(skip(self, _request), name = "grpc.get_metadata")]
    async fn get_metadata(
        &self,
        _request: tonic::Request<crate::generated::GetMetadataRequest>,
    ) -> Result<tonic::Response<crate::generated::GetMetadataResponse>, tonic::Status> {
        debug!("GetMetadata called");
        let metadata = self.provider.metadata();
        info!(
            resources = metadata.resources.len(),
            data_sources = metadata.data_sources.len(),
            "GetMetadata completed"
        );
        Ok(tonic::Response::new(
            crate::generated::GetMetadataResponse {
                server_capabilities: Some(crate::generated::ServerCapabilities {
                    plan_destroy: metadata.capabilities.plan_destroy,
                }),
                resources: metadata.resources,
                data_sources: metadata.data_sources,
                diagnostics: vec![],
            },
        ))
    }

    #[instrument(skip(self, _request), name = "grpc.get_schema")]
    async fn get_schema(
        &self,
        _request: tonic::Request<crate::generated::GetSchemaRequest>,
    ) -> Result<tonic::Response<crate::generated::GetSchemaResponse>, tonic::Status> {
        debug!("GetSchema called");
        let schema = self.provider.schema();
        info!(
            resources = schema.resources.len(),
            data_sources = schema.data_sources.len(),
            "GetSchema completed"
        );
        Ok(tonic::Response::new(crate::generated::GetSchemaResponse {
            provider: Some((&schema.provider).into()),
            resources: schema
                .resources
                .iter()
                .map(|(k, v)| (k.clone(), v.into()))
                .collect(),
            data_sources: schema
                .data_sources
                .iter()
                .map(|(k, v)| (k.clone(), v.into()))
                .collect(),
            diagnostics: vec![],
        }))
    }

    #[instrument(skip(self, request), name = "grpc.validate_provider_config")]
    async fn validate_provider_config(
        &self,
        request: tonic::Request<crate::generated::ValidateProviderConfigRequest>,
    ) -> Result<tonic::Response<crate::generated::ValidateProviderConfigResponse>, tonic::Status>
    {
        debug!("ValidateProviderConfig called");
        let req = request.into_inner();
        let config = decode_document(&req.config);

        let diagnostics = validation::validate(&self.provider.schema().provider, &config);
        if diagnostics.has_errors() {
            warn!(
                diagnostics = diagnostics.len(),
                "ValidateProviderConfig completed with errors"
            );
        } else {
            info!("ValidateProviderConfig completed successfully");
        }
        Ok(tonic::Response::new(
            crate::generated::ValidateProviderConfigResponse {
                diagnostics: diagnostics.into_proto(),
            },
        ))
    }

    #[instrument(skip(self, request), name = "grpc.configure")]
    async fn configure(
        &self,
        request: tonic::Request<crate::generated::ConfigureRequest>,
    ) -> Result<tonic::Response<crate::generated::ConfigureResponse>, tonic::Status> {
        debug!("Configure called");
        let req = request.into_inner();

        let provider_req = ConfigureProviderRequest {
            host_version: req.host_version,
            config: Config::new(decode_document(&req.config)),
        };
        let mut resp = ConfigureProviderResponse::default();
        self.provider.configure(provider_req, &mut resp).await;

        if resp.diagnostics.has_errors() {
            warn!(
                diagnostics = resp.diagnostics.len(),
                "Configure completed with errors"
            );
        } else {
            info!("Configure completed successfully");
        }
        Ok(tonic::Response::new(crate::generated::ConfigureResponse {
            diagnostics: resp.diagnostics.into_proto(),
        }))
    }

    #[instrument(skip(self, _request), name = "grpc.stop")]
    async fn stop(
        &self,
        _request: tonic::Request<crate::generated::StopRequest>,
    ) -> Result<tonic::Response<crate::generated::StopResponse>, tonic::Status> {
        info!("Stop called");
        match self.provider.stop().await {
            Ok(()) => {
                info!("Stop completed successfully");
                Ok(tonic::Response::new(crate::generated::StopResponse {
                    error: String::new(),
                }))
            }
            Err(e) => {
                error!(error = %e, "Stop failed");
                Ok(tonic::Response::new(crate::generated::StopResponse {
                    error: e.to_string(),
                }))
            }
        }
    }

    #[instrument(skip(self, request), name = "grpc.validate_resource_config")]
    async fn validate_resource_config(
        &self,
        request: tonic::Request<crate::generated::ValidateResourceConfigRequest>,
    ) -> Result<tonic::Response<crate::generated::ValidateResourceConfigResponse>, tonic::Status>
    {
        let req = request.into_inner();
        debug!(resource_type = %req.resource_type, "ValidateResourceConfig called");

        let schema = match self.resource_schema(&req.resource_type) {
            Some(schema) => schema,
            None => {
                error!(resource_type = %req.resource_type, "ValidateResourceConfig failed: unknown type");
                return Ok(tonic::Response::new(
                    crate::generated::ValidateResourceConfigResponse {
                        diagnostics: unknown_resource_type(&req.resource_type),
                    },
                ));
            }
        };

        let config = decode_document(&req.config);
        let diagnostics = validation::validate(&schema, &config);
        if diagnostics.has_errors() {
            warn!(resource_type = %req.resource_type, diagnostics = diagnostics.len(), "ValidateResourceConfig completed with errors");
        } else {
            info!(resource_type = %req.resource_type, "ValidateResourceConfig completed successfully");
        }
        Ok(tonic::Response::new(
            crate::generated::ValidateResourceConfigResponse {
                diagnostics: diagnostics.into_proto(),
            },
        ))
    }

    #[instrument(skip(self, request), name = "grpc.upgrade_resource_state")]
    async fn upgrade_resource_state(
        &self,
        request: tonic::Request<crate::generated::UpgradeResourceStateRequest>,
    ) -> Result<tonic::Response<crate::generated::UpgradeResourceStateResponse>, tonic::Status>
    {
        let req = request.into_inner();
        debug!(resource_type = %req.resource_type, version = req.version, "UpgradeResourceState called");

        let (resource, schema) = match self.resource_parts(&req.resource_type) {
            Some(parts) => parts,
            None => {
                error!(resource_type = %req.resource_type, "UpgradeResourceState failed: unknown type");
                return Ok(tonic::Response::new(
                    crate::generated::UpgradeResourceStateResponse {
                        upgraded_state: vec![],
                        diagnostics: unknown_resource_type(&req.resource_type),
                    },
                ));
            }
        };

        // State already written at the current version passes through
        // untouched without involving the resource.
        if req.version == schema.version as i64 {
            info!(resource_type = %req.resource_type, version = req.version, "UpgradeResourceState passthrough, already current");
            return Ok(tonic::Response::new(
                crate::generated::UpgradeResourceStateResponse {
                    upgraded_state: req.raw_state,
                    diagnostics: vec![],
                },
            ));
        }

        let upgrade_req = UpgradeResourceStateRequest {
            version: req.version,
            state: State::from_value(schema.clone(), decode_document(&req.raw_state)),
        };
        let mut resp = UpgradeResourceStateResponse::new(schema);
        resource.upgrade_state(upgrade_req, &mut resp).await;

        if resp.diagnostics.has_errors() {
            warn!(resource_type = %req.resource_type, from_version = req.version, "UpgradeResourceState completed with errors");
        } else {
            info!(resource_type = %req.resource_type, from_version = req.version, "UpgradeResourceState completed");
        }
        Ok(tonic::Response::new(
            crate::generated::UpgradeResourceStateResponse {
                upgraded_state: encode_state(&resp.state),
                diagnostics: resp.diagnostics.into_proto(),
            },
        ))
    }

    #[instrument(skip(self, request), name = "grpc.plan")]
    async fn plan(
        &self,
        request: tonic::Request<crate::generated::PlanRequest>,
    ) -> Result<tonic::Response<crate::generated::PlanResponse>, tonic::Status> {
        let req = request.into_inner();
        let is_create = req.prior_state.is_empty();
        debug!(resource_type = %req.resource_type, is_create = is_create, "Plan called");

        let (resource, schema) = match self.resource_parts(&req.resource_type) {
            Some(parts) => parts,
            None => {
                error!(resource_type = %req.resource_type, "Plan failed: unknown type");
                return Ok(tonic::Response::new(crate::generated::PlanResponse {
                    planned_state: vec![],
                    changes: vec![],
                    requires_replace: vec![],
                    diagnostics: unknown_resource_type(&req.resource_type),
                }));
            }
        };

        let prior_state = if req.prior_state.is_empty() {
            None
        } else {
            Some(State::from_value(
                schema.clone(),
                decode_document(&req.prior_state),
            ))
        };
        let proposed = State::from_value(schema.clone(), decode_document(&req.proposed_state));

        let plan_req = ModifyResourcePlanRequest {
            config: Config::new(decode_document(&req.config)),
            state: prior_state,
            plan: proposed.clone(),
            provider_meta: Config::new(decode_document(&req.provider_meta)),
        };
        let mut resp = ModifyResourcePlanResponse::from_plan(proposed);
        resource.modify_plan(plan_req, &mut resp).await;

        if resp.diagnostics.has_errors() {
            warn!(resource_type = %req.resource_type, diagnostics = resp.diagnostics.len(), "Plan completed with errors");
        } else {
            info!(
                resource_type = %req.resource_type,
                changes = resp.changes.len(),
                requires_replace = resp.requires_replace.len(),
                "Plan completed"
            );
        }
        Ok(tonic::Response::new(crate::generated::PlanResponse {
            planned_state: encode_state(&resp.plan),
            changes: resp.changes.into_iter().map(Into::into).collect(),
            requires_replace: resp.requires_replace,
            diagnostics: resp.diagnostics.into_proto(),
        }))
    }

    #[instrument(skip(self, request), name = "grpc.create")]
    async fn create(
        &self,
        request: tonic::Request<crate::generated::CreateRequest>,
    ) -> Result<tonic::Response<crate::generated::CreateResponse>, tonic::Status> {
        let req = request.into_inner();
        info!(resource_type = %req.resource_type, "Create called");

        let (resource, schema) = match self.resource_parts(&req.resource_type) {
            Some(parts) => parts,
            None => {
                error!(resource_type = %req.resource_type, "Create failed: unknown type");
                return Ok(tonic::Response::new(crate::generated::CreateResponse {
                    state: vec![],
                    diagnostics: unknown_resource_type(&req.resource_type),
                }));
            }
        };

        let create_req = CreateResourceRequest {
            config: Config::new(decode_document(&req.config)),
            plan: State::from_value(schema.clone(), decode_document(&req.planned_state)),
            provider_meta: Config::new(decode_document(&req.provider_meta)),
        };
        let mut resp = CreateResourceResponse::new(schema);
        resource.create(create_req, &mut resp).await;

        if resp.diagnostics.has_errors() {
            warn!(resource_type = %req.resource_type, diagnostics = resp.diagnostics.len(), "Create completed with errors");
        } else {
            info!(resource_type = %req.resource_type, "Create completed successfully");
        }
        Ok(tonic::Response::new(crate::generated::CreateResponse {
            state: encode_state(&resp.state),
            diagnostics: resp.diagnostics.into_proto(),
        }))
    }

    #[instrument(skip(self, request), name = "grpc.read")]
    async fn read(
        &self,
        request: tonic::Request<crate::generated::ReadRequest>,
    ) -> Result<tonic::Response<crate::generated::ReadResponse>, tonic::Status> {
        let req = request.into_inner();
        debug!(resource_type = %req.resource_type, "Read called");

        let (resource, schema) = match self.resource_parts(&req.resource_type) {
            Some(parts) => parts,
            None => {
                error!(resource_type = %req.resource_type, "Read failed: unknown type");
                return Ok(tonic::Response::new(crate::generated::ReadResponse {
                    state: vec![],
                    diagnostics: unknown_resource_type(&req.resource_type),
                }));
            }
        };

        let current = State::from_value(schema, decode_document(&req.current_state));
        let read_req = ReadResourceRequest {
            state: current.clone(),
            provider_meta: Config::new(decode_document(&req.provider_meta)),
        };
        // The response starts from the prior state; a handler that leaves it
        // untouched reports no drift.
        let mut resp = ReadResourceResponse::from_state(current);
        resource.read(read_req, &mut resp).await;

        if resp.diagnostics.has_errors() {
            warn!(resource_type = %req.resource_type, diagnostics = resp.diagnostics.len(), "Read completed with errors");
        } else {
            debug!(resource_type = %req.resource_type, "Read completed successfully");
        }
        Ok(tonic::Response::new(crate::generated::ReadResponse {
            state: encode_state(&resp.state),
            diagnostics: resp.diagnostics.into_proto(),
        }))
    }

    #[instrument(skip(self, request), name = "grpc.update")]
    async fn update(
        &self,
        request: tonic::Request<crate::generated::UpdateRequest>,
    ) -> Result<tonic::Response<crate::generated::UpdateResponse>, tonic::Status> {
        let req = request.into_inner();
        info!(resource_type = %req.resource_type, "Update called");

        let (resource, schema) = match self.resource_parts(&req.resource_type) {
            Some(parts) => parts,
            None => {
                error!(resource_type = %req.resource_type, "Update failed: unknown type");
                return Ok(tonic::Response::new(crate::generated::UpdateResponse {
                    state: vec![],
                    diagnostics: unknown_resource_type(&req.resource_type),
                }));
            }
        };

        let update_req = UpdateResourceRequest {
            config: Config::new(decode_document(&req.config)),
            plan: State::from_value(schema.clone(), decode_document(&req.planned_state)),
            state: State::from_value(schema.clone(), decode_document(&req.prior_state)),
            provider_meta: Config::new(decode_document(&req.provider_meta)),
        };
        let mut resp = UpdateResourceResponse::new(schema);
        resource.update(update_req, &mut resp).await;

        if resp.diagnostics.has_errors() {
            warn!(resource_type = %req.resource_type, diagnostics = resp.diagnostics.len(), "Update completed with errors");
        } else {
            info!(resource_type = %req.resource_type, "Update completed successfully");
        }
        Ok(tonic::Response::new(crate::generated::UpdateResponse {
            state: encode_state(&resp.state),
            diagnostics: resp.diagnostics.into_proto(),
        }))
    }

    #[instrument(skip(self, request), name = "grpc.delete")]
    async fn delete(
        &self,
        request: tonic::Request<crate::generated::DeleteRequest>,
    ) -> Result<tonic::Response<crate::generated::DeleteResponse>, tonic::Status> {
        let req = request.into_inner();
        info!(resource_type = %req.resource_type, "Delete called");

        let (resource, schema) = match self.resource_parts(&req.resource_type) {
            Some(parts) => parts,
            None => {
                error!(resource_type = %req.resource_type, "Delete failed: unknown type");
                return Ok(tonic::Response::new(crate::generated::DeleteResponse {
                    diagnostics: unknown_resource_type(&req.resource_type),
                }));
            }
        };

        let delete_req = DeleteResourceRequest {
            state: State::from_value(schema, decode_document(&req.current_state)),
            provider_meta: Config::new(decode_document(&req.provider_meta)),
        };
        let mut resp = DeleteResourceResponse::default();
        resource.delete(delete_req, &mut resp).await;

        if resp.diagnostics.has_errors() {
            warn!(resource_type = %req.resource_type, diagnostics = resp.diagnostics.len(), "Delete completed with errors");
        } else {
            info!(resource_type = %req.resource_type, "Delete completed successfully");
        }
        Ok(tonic::Response::new(crate::generated::DeleteResponse {
            diagnostics: resp.diagnostics.into_proto(),
        }))
    }

    #[instrument(skip(self, request), name = "grpc.import_resource_state")]
    async fn import_resource_state(
        &self,
        request: tonic::Request<crate::generated::ImportResourceStateRequest>,
    ) -> Result<tonic::Response<crate::generated::ImportResourceStateResponse>, tonic::Status> {
        let req = request.into_inner();
        info!(resource_type = %req.resource_type, id = %req.id, "ImportResourceState called");

        let (resource, schema) = match self.resource_parts(&req.resource_type) {
            Some(parts) => parts,
            None => {
                error!(resource_type = %req.resource_type, "ImportResourceState failed: unknown type");
                return Ok(tonic::Response::new(
                    crate::generated::ImportResourceStateResponse {
                        state: vec![],
                        diagnostics: unknown_resource_type(&req.resource_type),
                    },
                ));
            }
        };

        let import_req = ImportResourceStateRequest { id: req.id.clone() };
        let mut resp = ImportResourceStateResponse::new(schema);
        resource.import_state(import_req, &mut resp).await;

        if resp.diagnostics.has_errors() {
            warn!(resource_type = %req.resource_type, id = %req.id, diagnostics = resp.diagnostics.len(), "ImportResourceState completed with errors");
        } else {
            info!(resource_type = %req.resource_type, id = %req.id, "ImportResourceState completed");
        }
        Ok(tonic::Response::new(
            crate::generated::ImportResourceStateResponse {
                state: encode_state(&resp.state),
                diagnostics: resp.diagnostics.into_proto(),
            },
        ))
    }

    #[instrument(skip(self, request), name = "grpc.validate_data_source_config")]
    async fn validate_data_source_config(
        &self,
        request: tonic::Request<crate::generated::ValidateDataSourceConfigRequest>,
    ) -> Result<tonic::Response<crate::generated::ValidateDataSourceConfigResponse>, tonic::Status>
    {
        let req = request.into_inner();
        debug!(data_source_type = %req.data_source_type, "ValidateDataSourceConfig called");

        let schema = match self.data_source_schema(&req.data_source_type) {
            Some(schema) => schema,
            None => {
                error!(data_source_type = %req.data_source_type, "ValidateDataSourceConfig failed: unknown type");
                return Ok(tonic::Response::new(
                    crate::generated::ValidateDataSourceConfigResponse {
                        diagnostics: unknown_data_source_type(&req.data_source_type),
                    },
                ));
            }
        };

        let config = decode_document(&req.config);
        let diagnostics = validation::validate(&schema, &config);
        if diagnostics.has_errors() {
            warn!(data_source_type = %req.data_source_type, diagnostics = diagnostics.len(), "ValidateDataSourceConfig completed with errors");
        } else {
            info!(data_source_type = %req.data_source_type, "ValidateDataSourceConfig completed successfully");
        }
        Ok(tonic::Response::new(
            crate::generated::ValidateDataSourceConfigResponse {
                diagnostics: diagnostics.into_proto(),
            },
        ))
    }

    #[instrument(skip(self, request), name = "grpc.read_data_source")]
    async fn read_data_source(
        &self,
        request: tonic::Request<crate::generated::ReadDataSourceRequest>,
    ) -> Result<tonic::Response<crate::generated::ReadDataSourceResponse>, tonic::Status> {
        let req = request.into_inner();
        debug!(data_source_type = %req.data_source_type, "ReadDataSource called");

        let (data_source, schema) = match self.data_source_parts(&req.data_source_type) {
            Some(parts) => parts,
            None => {
                error!(data_source_type = %req.data_source_type, "ReadDataSource failed: unknown type");
                return Ok(tonic::Response::new(
                    crate::generated::ReadDataSourceResponse {
                        state: vec![],
                        diagnostics: unknown_data_source_type(&req.data_source_type),
                    },
                ));
            }
        };

        let read_req = ReadDataSourceRequest {
            config: Config::new(decode_document(&req.config)),
            provider_meta: Config::new(decode_document(&req.provider_meta)),
        };
        let mut resp = ReadDataSourceResponse::new(schema);
        data_source.read(read_req, &mut resp).await;

        if resp.diagnostics.has_errors() {
            warn!(data_source_type = %req.data_source_type, diagnostics = resp.diagnostics.len(), "ReadDataSource completed with errors");
        } else {
            info!(data_source_type = %req.data_source_type, "ReadDataSource completed successfully");
        }
        Ok(tonic::Response::new(
            crate::generated::ReadDataSourceResponse {
                state: encode_state(&resp.state),
                diagnostics: resp.diagnostics.into_proto(),
            },
        ))
    }
}

/// Options for configuring the provider server.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// Timeout for graceful shutdown. After a shutdown signal is received,
    /// the server waits this long for in-flight requests to complete.
    /// Default: 30 seconds.
    pub shutdown_timeout: Duration,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServeOptions {
    /// Create new serve options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// On Unix, this waits for SIGTERM or SIGINT.
/// On Windows, this waits for CTRL+C.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                eprintln!("Received SIGTERM, initiating graceful shutdown...");
            }
            _ = sigint.recv() => {
                eprintln!("Received SIGINT, initiating graceful shutdown...");
            }
        }
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C handler");
        eprintln!("Received CTRL+C, initiating graceful shutdown...");
    }

    #[cfg(not(any(unix, windows)))]
    {
        // Fallback: just wait forever (no signal handling)
        std::future::pending::<()>().await;
    }
}

/// Serve a provider as a gRPC server.
///
/// This function:
/// 1. Finds an available port
/// 2. Starts the gRPC server
/// 3. Outputs the handshake string to stdout
/// 4. Handles shutdown signals (SIGTERM/SIGINT) gracefully
///
/// The handshake format is: `STRATA_PROVIDER|<version>|<address>`
///
/// For custom configuration, use [`serve_with_options`].
pub async fn serve<P: Provider>(provider: P) -> Result<(), ProviderError> {
    serve_with_options(provider, ServeOptions::default()).await
}

/// Serve a provider with custom options.
///
/// See [`serve`] for details. This function allows configuring
/// shutdown behavior via [`ServeOptions`].
pub async fn serve_with_options<P: Provider>(
    provider: P,
    options: ServeOptions,
) -> Result<(), ProviderError> {
    // Find an available port by binding to port 0
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    serve_on_listener(provider, listener, addr, options).await
}

/// Serve a provider on a specific address.
///
/// Unlike [`serve`], this function binds to the specified address rather than
/// finding an available port.
pub async fn serve_on<P: Provider>(provider: P, addr: SocketAddr) -> Result<(), ProviderError> {
    serve_on_with_options(provider, addr, ServeOptions::default()).await
}

/// Serve a provider on a specific address with custom options.
pub async fn serve_on_with_options<P: Provider>(
    provider: P,
    addr: SocketAddr,
    options: ServeOptions,
) -> Result<(), ProviderError> {
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    serve_on_listener(provider, listener, actual_addr, options).await
}

/// Internal function to serve on an already-bound listener.
async fn serve_on_listener<P: Provider>(
    provider: P,
    listener: TcpListener,
    addr: SocketAddr,
    options: ServeOptions,
) -> Result<(), ProviderError> {
    // Output the handshake
    println!("{}|{}|{}", HANDSHAKE_PREFIX, PROTOCOL_VERSION, addr);

    info!(address = %addr, "Provider server starting");

    // Share the provider between the gRPC service and the shutdown path
    let provider = Arc::new(provider);
    let provider_for_shutdown = Arc::clone(&provider);

    let grpc_service = ProviderGrpcService { provider };
    let server = crate::generated::provider_server::ProviderServer::new(grpc_service);

    // One watch channel feeds both the server's shutdown future and the
    // select below, so the drain timeout starts counting at the signal.
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let mut server_shutdown_rx = shutdown_rx.clone();
    let server_future = Server::builder()
        .add_service(server)
        .serve_with_incoming_shutdown(
            tokio_stream::wrappers::TcpListenerStream::new(listener),
            async move {
                let _ = server_shutdown_rx.changed().await;
            },
        );
    tokio::pin!(server_future);

    tokio::select! {
        result = &mut server_future => {
            result?;
            info!("Server shutdown complete");
        }
        _ = shutdown_rx.changed() => {
            // Signal observed; bound the drain of in-flight requests.
            match tokio::time::timeout(options.shutdown_timeout, &mut server_future).await {
                Ok(result) => {
                    result?;
                    info!("Server shutdown complete");
                }
                Err(_) => {
                    warn!(
                        timeout = ?options.shutdown_timeout,
                        "Shutdown timeout exceeded, forcing shutdown"
                    );
                }
            }
        }
    }

    // Call the provider's stop() method
    debug!("Calling provider stop()");
    if let Err(e) = provider_for_shutdown.stop().await {
        warn!(error = %e, "Provider stop() returned error");
    }

    info!("Provider shutdown complete");
    Ok(())
}
