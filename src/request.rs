//! Request objects handed to provider handlers, one per RPC verb.
//!
//! These are flat, single-use carriers: the dispatch layer builds one from
//! the decoded RPC payload, hands it to the handler by value, and discards
//! it afterwards. Fields are populated only where the operation defines
//! them (an unpopulated config is null).

use crate::data::{Config, State};

/// Request supplied to the provider's configure handler.
#[derive(Debug, Clone)]
pub struct ConfigureProviderRequest {
    /// Version of the Strata host executing the request. Supplied for
    /// logging and diagnostics only; do not gate provider behavior on it.
    pub host_version: String,
    /// The configuration the user supplied for the provider. Usually
    /// persisted into the value implementing the provider trait, for use in
    /// later resource operations.
    pub config: Config,
}

/// Request supplied to a resource's create handler.
#[derive(Debug, Clone)]
pub struct CreateResourceRequest {
    /// The configuration the user supplied for the resource.
    ///
    /// This may contain values the host could not resolve at request time
    /// (interpolation still pending).
    pub config: Config,
    /// The planned state for the resource.
    pub plan: State,
    /// Metadata from the provider-meta block of the module.
    pub provider_meta: Config,
}

/// Request supplied to a resource's read handler.
#[derive(Debug, Clone)]
pub struct ReadResourceRequest {
    /// The current state of the resource prior to the read.
    pub state: State,
    /// Metadata from the provider-meta block of the module.
    pub provider_meta: Config,
}

/// Request supplied to a resource's update handler.
#[derive(Debug, Clone)]
pub struct UpdateResourceRequest {
    /// The configuration the user supplied for the resource.
    ///
    /// This may contain values the host could not resolve at request time
    /// (interpolation still pending).
    pub config: Config,
    /// The planned state for the resource.
    pub plan: State,
    /// The current state of the resource prior to the update.
    pub state: State,
    /// Metadata from the provider-meta block of the module.
    pub provider_meta: Config,
}

/// Request supplied to a resource's delete handler.
#[derive(Debug, Clone)]
pub struct DeleteResourceRequest {
    /// The current state of the resource prior to the delete.
    pub state: State,
    /// Metadata from the provider-meta block of the module.
    pub provider_meta: Config,
}

/// Request supplied to a resource's modify-plan handler.
#[derive(Debug, Clone)]
pub struct ModifyResourcePlanRequest {
    /// The configuration the user supplied for the resource.
    ///
    /// This may contain values the host could not resolve at request time
    /// (interpolation still pending).
    pub config: Config,
    /// The current state of the resource, absent when planning a create.
    pub state: Option<State>,
    /// The planned new state the host generated for the resource.
    pub plan: State,
    /// Metadata from the provider-meta block of the module.
    pub provider_meta: Config,
}

/// Request supplied to a resource's import handler.
#[derive(Debug, Clone)]
pub struct ImportResourceStateRequest {
    /// The identifier the user passed on import. Its format is whatever the
    /// provider documents for the resource type.
    pub id: String,
}

/// Request supplied to a resource's state upgrade handler.
#[derive(Debug, Clone)]
pub struct UpgradeResourceStateRequest {
    /// The schema version the stored state was written at.
    pub version: i64,
    /// The stored state, as written by that older schema version.
    pub state: State,
}

/// Request supplied to a data source's read handler.
#[derive(Debug, Clone)]
pub struct ReadDataSourceRequest {
    /// The configuration the user supplied for the data source.
    ///
    /// This may contain values the host could not resolve at request time
    /// (interpolation still pending).
    pub config: Config,
    /// Metadata from the provider-meta block of the module.
    pub provider_meta: Config,
}
