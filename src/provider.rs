//! The provider trait tying schemas, resources, and data sources together.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::request::ConfigureProviderRequest;
use crate::resource::{DataSource, Resource};
use crate::response::ConfigureProviderResponse;
use crate::schema::ProviderSchema;
use crate::types::ProviderMetadata;

/// A Strata provider: the entry point a plugin implements.
///
/// The provider declares its schema, configures itself with user-supplied
/// credentials, and hands out the handler for each resource or data source
/// type it serves. Handlers are looked up per request, so a provider may
/// share one handler value across calls or build them on demand.
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    /// The provider's schema including all resources and data sources.
    fn schema(&self) -> ProviderSchema;

    /// Provider metadata, derived from the schema by default.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        ProviderMetadata {
            resources: schema.resources.keys().cloned().collect(),
            data_sources: schema.data_sources.keys().cloned().collect(),
            capabilities: Default::default(),
        }
    }

    /// Configure the provider with credentials and settings.
    ///
    /// Failures are reported by appending error diagnostics to the response.
    async fn configure(
        &self,
        req: ConfigureProviderRequest,
        resp: &mut ConfigureProviderResponse,
    );

    /// The handler for a managed resource type, or `None` if this provider
    /// does not serve it.
    fn resource(&self, type_name: &str) -> Option<Arc<dyn Resource>>;

    /// The handler for a data source type, or `None` if this provider does
    /// not serve it.
    fn data_source(&self, type_name: &str) -> Option<Arc<dyn DataSource>> {
        let _ = type_name;
        None
    }

    /// Stop the provider gracefully.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
