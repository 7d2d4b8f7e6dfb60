//! Testing utilities for provider implementations.
//!
//! [`ProviderTester`] drives a [`Provider`] the way the dispatch layer
//! would, without spinning up a gRPC server: it builds the request and
//! response objects, invokes the handler, and turns error diagnostics into
//! [`TestError`].
//!
//! The module also ships [`TestStringType`] / [`TestStringValue`], a
//! minimal string implementation of the attribute value conversion
//! contract, useful for exercising code that is generic over
//! [`AttrType`]/[`AttrValue`].
//!
//! # Example
//!
//! ```ignore
//! use strata_provider_sdk::testing::ProviderTester;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_resource() {
//!     let tester = ProviderTester::new(MyProvider::new());
//!
//!     tester.configure(json!({"api_key": "test"})).await.unwrap();
//!
//!     let state = tester.create("my_resource", json!({
//!         "name": "test-resource"
//!     })).await.unwrap();
//!
//!     assert_eq!(state["name"], "test-resource");
//! }
//! ```

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use crate::data::{Config, State};
use crate::diag::{Diagnostic, Diagnostics};
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
use crate::schema::{AttributeType, ProviderSchema, Schema};
use crate::validation;
use crate::value::{AttrType, AttrValue, DynamicValue};

/// A test harness that drives a [`Provider`] without a gRPC server.
pub struct ProviderTester<P: Provider> {
    provider: P,
}

impl<P: Provider> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Get the list of data source type names.
    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    fn resource(&self, resource_type: &str) -> Result<(Arc<dyn Resource>, Schema), TestError> {
        let schema = self
            .provider
            .schema()
            .resources
            .get(resource_type)
            .cloned()
            .ok_or_else(|| {
                TestError::Provider(ProviderError::UnknownResource(resource_type.to_string()))
            })?;
        let resource = self.provider.resource(resource_type).ok_or_else(|| {
            TestError::Provider(ProviderError::UnknownResource(resource_type.to_string()))
        })?;
        Ok((resource, schema))
    }

    fn data_source(&self, data_source_type: &str) -> Result<(Arc<dyn DataSource>, Schema), TestError> {
        let schema = self
            .provider
            .schema()
            .data_sources
            .get(data_source_type)
            .cloned()
            .ok_or_else(|| {
                TestError::Provider(ProviderError::UnknownResource(data_source_type.to_string()))
            })?;
        let data_source = self.provider.data_source(data_source_type).ok_or_else(|| {
            TestError::Provider(ProviderError::UnknownResource(data_source_type.to_string()))
        })?;
        Ok((data_source, schema))
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate provider configuration against the declared schema.
    pub fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        check_diagnostics(validation::validate(&self.provider.schema().provider, &config))
    }

    /// Configure the provider.
    ///
    /// Returns `Err` with the error diagnostics if configuration fails.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let req = ConfigureProviderRequest {
            host_version: "test".to_string(),
            config: Config::new(config),
        };
        let mut resp = ConfigureProviderResponse::default();
        self.provider.configure(req, &mut resp).await;
        check_diagnostics(resp.diagnostics)
    }

    /// Stop the provider.
    pub async fn stop(&self) -> Result<(), ProviderError> {
        self.provider.stop().await
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource configuration against the declared schema.
    pub fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let (_, schema) = self.resource(resource_type)?;
        check_diagnostics(validation::validate(&schema, &config))
    }

    /// Plan a resource creation (no prior state).
    pub async fn plan_create(
        &self,
        resource_type: &str,
        proposed_state: Value,
    ) -> Result<ModifyResourcePlanResponse, TestError> {
        self.plan(resource_type, None, proposed_state.clone(), proposed_state)
            .await
    }

    /// Plan a resource update.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<ModifyResourcePlanResponse, TestError> {
        self.plan(
            resource_type,
            Some(prior_state),
            proposed_state.clone(),
            proposed_state,
        )
        .await
    }

    /// Plan a resource deletion.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<ModifyResourcePlanResponse, TestError> {
        self.plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    /// Full plan operation with explicit config.
    pub async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<ModifyResourcePlanResponse, TestError> {
        let (resource, schema) = self.resource(resource_type)?;
        let proposed = State::from_value(schema.clone(), proposed_state);
        let req = ModifyResourcePlanRequest {
            config: Config::new(config),
            state: prior_state.map(|prior| State::from_value(schema.clone(), prior)),
            plan: proposed.clone(),
            provider_meta: Config::null(),
        };
        let mut resp = ModifyResourcePlanResponse::from_plan(proposed);
        resource.modify_plan(req, &mut resp).await;

        if resp.diagnostics.has_errors() {
            return Err(TestError::from_diagnostics(resp.diagnostics));
        }
        Ok(resp)
    }

    /// Create a new resource, returning the resulting state.
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, TestError> {
        let (resource, schema) = self.resource(resource_type)?;
        let req = CreateResourceRequest {
            config: Config::new(planned_state.clone()),
            plan: State::from_value(schema.clone(), planned_state),
            provider_meta: Config::null(),
        };
        let mut resp = CreateResourceResponse::new(schema);
        resource.create(req, &mut resp).await;
        finish_state(resp.state, resp.diagnostics)
    }

    /// Read the current state of a resource.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, TestError> {
        let (resource, schema) = self.resource(resource_type)?;
        let current = State::from_value(schema, current_state);
        let req = ReadResourceRequest {
            state: current.clone(),
            provider_meta: Config::null(),
        };
        let mut resp = ReadResourceResponse::from_state(current);
        resource.read(req, &mut resp).await;
        finish_state(resp.state, resp.diagnostics)
    }

    /// Update an existing resource, returning the resulting state.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, TestError> {
        let (resource, schema) = self.resource(resource_type)?;
        let req = UpdateResourceRequest {
            config: Config::new(planned_state.clone()),
            plan: State::from_value(schema.clone(), planned_state),
            state: State::from_value(schema.clone(), prior_state),
            provider_meta: Config::null(),
        };
        let mut resp = UpdateResourceResponse::new(schema);
        resource.update(req, &mut resp).await;
        finish_state(resp.state, resp.diagnostics)
    }

    /// Delete a resource.
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), TestError> {
        let (resource, schema) = self.resource(resource_type)?;
        let req = DeleteResourceRequest {
            state: State::from_value(schema, current_state),
            provider_meta: Config::null(),
        };
        let mut resp = DeleteResourceResponse::default();
        resource.delete(req, &mut resp).await;
        check_diagnostics(resp.diagnostics)
    }

    /// Import an existing resource by identifier, returning the imported state.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Value, TestError> {
        let (resource, schema) = self.resource(resource_type)?;
        let req = ImportResourceStateRequest { id: id.to_string() };
        let mut resp = ImportResourceStateResponse::new(schema);
        resource.import_state(req, &mut resp).await;
        finish_state(resp.state, resp.diagnostics)
    }

    /// Upgrade resource state from an older schema version.
    ///
    /// Mirrors the dispatch layer: state already at the current schema
    /// version passes through without invoking the handler.
    pub async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, TestError> {
        let (resource, schema) = self.resource(resource_type)?;
        if version == schema.version as i64 {
            return Ok(state);
        }
        let req = UpgradeResourceStateRequest {
            version,
            state: State::from_value(schema.clone(), state),
        };
        let mut resp = UpgradeResourceStateResponse::new(schema);
        resource.upgrade_state(req, &mut resp).await;
        finish_state(resp.state, resp.diagnostics)
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Validate a data source configuration against the declared schema.
    pub fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let (_, schema) = self.data_source(data_source_type)?;
        check_diagnostics(validation::validate(&schema, &config))
    }

    /// Read data from a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, TestError> {
        let (data_source, schema) = self.data_source(data_source_type)?;
        let req = ReadDataSourceRequest {
            config: Config::new(config),
            provider_meta: Config::null(),
        };
        let mut resp = ReadDataSourceResponse::new(schema);
        data_source.read(req, &mut resp).await;
        finish_state(resp.state, resp.diagnostics)
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Run a full create lifecycle: plan → create → read.
    ///
    /// Returns the final state after read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, TestError> {
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.plan.into_value()).await?;
        self.read(resource_type, created).await
    }

    /// Run a full update lifecycle: plan → update → read.
    ///
    /// Returns the final state after read.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<Value, TestError> {
        let plan = self
            .plan_update(resource_type, prior_state.clone(), proposed_state)
            .await?;
        let updated = self
            .update(resource_type, prior_state, plan.plan.into_value())
            .await?;
        self.read(resource_type, updated).await
    }

    /// Run a full delete lifecycle: plan → delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), TestError> {
        let _ = self
            .plan_delete(resource_type, current_state.clone())
            .await?;
        self.delete(resource_type, current_state).await
    }

    /// Run a full CRUD lifecycle: create → read → update → read → delete.
    ///
    /// Returns the state after the update (before delete).
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, TestError> {
        let created = self.lifecycle_create(resource_type, initial_config).await?;
        let updated = self
            .lifecycle_update(resource_type, created, updated_config)
            .await?;
        self.lifecycle_delete(resource_type, updated.clone()).await?;
        Ok(updated)
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation reported error diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with an SDK error.
    Provider(ProviderError),
}

impl TestError {
    fn from_diagnostics(diagnostics: Diagnostics) -> Self {
        TestError::Diagnostics(diagnostics.into_iter().filter(Diagnostic::is_error).collect())
    }
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

fn check_diagnostics(diagnostics: Diagnostics) -> Result<(), TestError> {
    if diagnostics.has_errors() {
        Err(TestError::from_diagnostics(diagnostics))
    } else {
        Ok(())
    }
}

fn finish_state(state: State, diagnostics: Diagnostics) -> Result<Value, TestError> {
    check_diagnostics(diagnostics)?;
    Ok(state.into_value())
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that a plan reports no changes.
///
/// # Panics
///
/// Panics if the plan reports any change.
pub fn assert_plan_no_changes(plan: &ModifyResourcePlanResponse) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan reports at least one change.
///
/// # Panics
///
/// Panics if the plan reports no changes.
pub fn assert_plan_has_changes(plan: &ModifyResourcePlanResponse) {
    assert!(
        !plan.changes.is_empty(),
        "Expected plan to have changes, but got no changes"
    );
}

/// Assert that a plan requires resource replacement.
///
/// # Panics
///
/// Panics if no attribute path requires replacement.
pub fn assert_plan_replaces(plan: &ModifyResourcePlanResponse) {
    assert!(
        !plan.requires_replace.is_empty(),
        "Expected plan to require replacement, but it does not"
    );
}

/// Assert that a plan does not require resource replacement.
///
/// # Panics
///
/// Panics if any attribute path requires replacement.
pub fn assert_plan_updates_in_place(plan: &ModifyResourcePlanResponse) {
    assert!(
        plan.requires_replace.is_empty(),
        "Expected plan to update in place, but it requires replacement of: {:?}",
        plan.requires_replace
    );
}

/// Assert that a plan reports a change for a specific attribute path.
///
/// # Panics
///
/// Panics if the plan does not report a change for the given path.
pub fn assert_plan_changes_attribute(plan: &ModifyResourcePlanResponse, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        has_change,
        "Expected plan to change attribute '{}', but it was not changed. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &Diagnostics) {
    let errors: Vec<_> = diagnostics.errors().collect();
    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain at least one error.
///
/// # Panics
///
/// Panics if there are no error diagnostics.
pub fn assert_has_errors(diagnostics: &Diagnostics) {
    assert!(
        diagnostics.has_errors(),
        "Expected at least one error, but got none"
    );
}

/// Assert that diagnostics contain an error with the given summary substring.
///
/// # Panics
///
/// Panics if no error diagnostic contains the given substring.
pub fn assert_error_contains(diagnostics: &Diagnostics, substring: &str) {
    let has_matching_error = diagnostics
        .errors()
        .any(|d| d.summary.contains(substring));

    assert!(
        has_matching_error,
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics.errors().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

// =========================================================================
// Conversion Contract Doubles
// =========================================================================

/// A string implementation of [`AttrType`] for tests.
///
/// Values produced by a type built with [`TestStringType::with_set_error`]
/// fail every [`AttrValue::set_from_wire`] call with the configured message.
#[derive(Debug, Clone, Default)]
pub struct TestStringType {
    set_error: Option<String>,
}

impl TestStringType {
    /// A plain string type.
    pub fn new() -> Self {
        Self::default()
    }

    /// A string type whose produced values fail updates with `message`.
    pub fn with_set_error(message: impl Into<String>) -> Self {
        Self {
            set_error: Some(message.into()),
        }
    }
}

impl AttrType for TestStringType {
    fn wire_type(&self) -> AttributeType {
        AttributeType::String
    }

    fn value_from_wire(&self, value: &DynamicValue) -> Result<Box<dyn AttrValue>, ProviderError> {
        if value.wire_type() != &AttributeType::String {
            return Err(ProviderError::type_mismatch(
                &AttributeType::String,
                value.wire_type(),
            ));
        }

        let mut result = TestStringValue {
            set_error: self.set_error.clone(),
            ..Default::default()
        };
        if !value.is_known() {
            result.unknown = true;
            return Ok(Box::new(result));
        }
        if value.is_null() {
            result.null = true;
            return Ok(Box::new(result));
        }
        result.value = value
            .as_str()
            .ok_or_else(|| ProviderError::Sdk("wire value is not a string".to_string()))?
            .to_string();
        Ok(Box::new(result))
    }

    fn equal(&self, other: &dyn AttrType) -> bool {
        other.as_any().downcast_ref::<TestStringType>().is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A string implementation of [`AttrValue`] for tests, carrying the three
/// value states explicitly.
#[derive(Debug, Clone, Default)]
pub struct TestStringValue {
    /// The value is still pending interpolation.
    pub unknown: bool,
    /// The value is known and null.
    pub null: bool,
    /// The string contents when known and set.
    pub value: String,
    set_error: Option<String>,
}

impl TestStringValue {
    /// A value in the unknown state.
    pub fn unknown() -> Self {
        Self {
            unknown: true,
            ..Default::default()
        }
    }

    /// A value in the null state.
    pub fn null() -> Self {
        Self {
            null: true,
            ..Default::default()
        }
    }

    /// A known, set value.
    pub fn known(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }
}

impl AttrValue for TestStringValue {
    fn to_wire(&self) -> Result<DynamicValue, ProviderError> {
        if self.unknown {
            return Ok(DynamicValue::unknown(AttributeType::String));
        }
        if self.null {
            return Ok(DynamicValue::null(AttributeType::String));
        }
        Ok(DynamicValue::string(self.value.clone()))
    }

    fn set_from_wire(&mut self, value: &DynamicValue) -> Result<(), ProviderError> {
        if let Some(message) = &self.set_error {
            return Err(ProviderError::Sdk(message.clone()));
        }
        if value.wire_type() != &AttributeType::String {
            return Err(ProviderError::type_mismatch(
                &AttributeType::String,
                value.wire_type(),
            ));
        }

        self.unknown = false;
        self.null = false;
        self.value = String::new();
        if !value.is_known() {
            self.unknown = true;
            return Ok(());
        }
        if value.is_null() {
            self.null = true;
            return Ok(());
        }
        self.value = value
            .as_str()
            .ok_or_else(|| ProviderError::Sdk("wire value is not a string".to_string()))?
            .to_string();
        Ok(())
    }

    fn equal(&self, other: &dyn AttrValue) -> bool {
        match other.as_any().downcast_ref::<TestStringValue>() {
            Some(other) => {
                self.unknown == other.unknown
                    && self.null == other.null
                    && self.value == other.value
            }
            None => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{
        resource_import_state_not_implemented, resource_import_state_passthrough_id,
    };
    use crate::schema::Attribute;
    use crate::types::AttributeChange;
    use async_trait::async_trait;
    use serde_json::json;

    // A provider serving one fully-featured resource, one resource that
    // leans on every default handler, and one data source.
    struct TestProvider;

    struct TestResource;

    #[async_trait]
    impl Resource for TestResource {
        async fn create(&self, req: CreateResourceRequest, resp: &mut CreateResourceResponse) {
            resp.state = req.plan.clone();
            let diags = resp.state.set_attribute("id", json!("generated-id"));
            resp.diagnostics.append(diags);
        }

        async fn read(&self, req: ReadResourceRequest, resp: &mut ReadResourceResponse) {
            // No drift: the pre-populated prior state stands.
            let _ = (req, &resp);
        }

        async fn update(&self, req: UpdateResourceRequest, resp: &mut UpdateResourceResponse) {
            resp.state = req.plan;
        }

        async fn delete(&self, req: DeleteResourceRequest, resp: &mut DeleteResourceResponse) {
            let _ = (req, &resp);
        }

        async fn modify_plan(
            &self,
            req: ModifyResourcePlanRequest,
            resp: &mut ModifyResourcePlanResponse,
        ) {
            match req.state {
                None => {
                    // Creating: fill in the computed identifier.
                    let diags = resp.plan.set_attribute("id", json!("generated-id"));
                    resp.diagnostics.append(diags);
                    resp.changes
                        .push(AttributeChange::added("id", json!("generated-id")));
                }
                Some(prior) => {
                    let before = prior.get_attribute("name").cloned();
                    let after = req.plan.get_attribute("name").cloned();
                    if before != after {
                        resp.changes.push(AttributeChange::new("name", before, after));
                    } else {
                        // Nothing to do; keep the prior state as the plan.
                        resp.plan = prior;
                    }
                }
            }
        }

        async fn import_state(
            &self,
            req: ImportResourceStateRequest,
            resp: &mut ImportResourceStateResponse,
        ) {
            resource_import_state_passthrough_id("id", &req, resp);
        }
    }

    // Relies on every defaulted handler; CRUD is intentionally blank and not
    // expected to be exercised.
    struct LegacyResource;

    #[async_trait]
    impl Resource for LegacyResource {
        async fn create(&self, _req: CreateResourceRequest, _resp: &mut CreateResourceResponse) {}
        async fn read(&self, _req: ReadResourceRequest, _resp: &mut ReadResourceResponse) {}
        async fn update(&self, _req: UpdateResourceRequest, _resp: &mut UpdateResourceResponse) {}
        async fn delete(&self, _req: DeleteResourceRequest, _resp: &mut DeleteResourceResponse) {}
    }

    struct TestDataSource;

    #[async_trait]
    impl DataSource for TestDataSource {
        async fn read(&self, req: ReadDataSourceRequest, resp: &mut ReadDataSourceResponse) {
            let filter = req.config.get_str("filter").unwrap_or("*").to_string();
            let diags = resp.state.set_attribute("result", json!(filter));
            resp.diagnostics.append(diags);
        }
    }

    fn resource_schema() -> Schema {
        Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("id", Attribute::computed_string())
    }

    fn legacy_schema() -> Schema {
        Schema::new(1)
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("optional_attribute", Attribute::optional_string())
            .with_attribute("required_attribute", Attribute::required_string())
    }

    #[async_trait]
    impl Provider for TestProvider {
        fn schema(&self) -> ProviderSchema {
            ProviderSchema::new()
                .with_provider_config(
                    Schema::v0().with_attribute("api_key", Attribute::optional_string()),
                )
                .with_resource("test_resource", resource_schema())
                .with_resource("test_legacy", legacy_schema())
                .with_data_source(
                    "test_data",
                    Schema::v0()
                        .with_attribute("filter", Attribute::optional_string())
                        .with_attribute("result", Attribute::computed_string()),
                )
        }

        async fn configure(
            &self,
            req: ConfigureProviderRequest,
            resp: &mut ConfigureProviderResponse,
        ) {
            if req.config.get("api_key") == Some(&json!("invalid")) {
                resp.diagnostics
                    .add_error("Invalid Credentials", "The api_key was rejected");
            }
        }

        fn resource(&self, type_name: &str) -> Option<Arc<dyn Resource>> {
            match type_name {
                "test_resource" => Some(Arc::new(TestResource)),
                "test_legacy" => Some(Arc::new(LegacyResource)),
                _ => None,
            }
        }

        fn data_source(&self, type_name: &str) -> Option<Arc<dyn DataSource>> {
            match type_name {
                "test_data" => Some(Arc::new(TestDataSource)),
                _ => None,
            }
        }
    }

    #[tokio::test]
    async fn test_tester_configure() {
        let tester = ProviderTester::new(TestProvider);
        assert!(tester.configure(json!({"api_key": "test"})).await.is_ok());

        let err = tester
            .configure(json!({"api_key": "invalid"}))
            .await
            .unwrap_err();
        assert!(matches!(err, TestError::Diagnostics(_)));
    }

    #[tokio::test]
    async fn test_tester_schema_and_metadata() {
        let tester = ProviderTester::new(TestProvider);
        assert!(tester.schema().resources.contains_key("test_resource"));
        assert!(tester.resource_types().contains(&"test_resource".to_string()));
        assert!(tester.data_source_types().contains(&"test_data".to_string()));
    }

    #[tokio::test]
    async fn test_tester_validate_configs() {
        let tester = ProviderTester::new(TestProvider);

        assert!(tester.validate_provider_config(json!({})).is_ok());
        assert!(tester
            .validate_resource_config("test_resource", json!({"name": "web"}))
            .is_ok());
        assert!(tester
            .validate_resource_config("test_resource", json!({}))
            .is_err());
        assert!(tester
            .validate_data_source_config("test_data", json!({"filter": "a"}))
            .is_ok());
    }

    #[tokio::test]
    async fn test_tester_plan_create() {
        let tester = ProviderTester::new(TestProvider);
        let plan = tester
            .plan_create("test_resource", json!({"name": "test"}))
            .await
            .unwrap();

        assert_plan_has_changes(&plan);
        assert_plan_changes_attribute(&plan, "id");
        assert_eq!(plan.plan.get_attribute("id"), Some(&json!("generated-id")));
    }

    #[tokio::test]
    async fn test_tester_plan_update_with_changes() {
        let tester = ProviderTester::new(TestProvider);
        let plan = tester
            .plan_update(
                "test_resource",
                json!({"name": "old", "id": "123"}),
                json!({"name": "new", "id": "123"}),
            )
            .await
            .unwrap();

        assert_plan_has_changes(&plan);
        assert_plan_changes_attribute(&plan, "name");
        assert_plan_updates_in_place(&plan);
    }

    #[tokio::test]
    async fn test_tester_plan_update_no_changes() {
        let tester = ProviderTester::new(TestProvider);
        let state = json!({"name": "same", "id": "123"});
        let plan = tester
            .plan_update("test_resource", state.clone(), state.clone())
            .await
            .unwrap();

        assert_plan_no_changes(&plan);
        assert_eq!(plan.plan.raw(), &state);
    }

    #[tokio::test]
    async fn test_tester_lifecycle_create() {
        let tester = ProviderTester::new(TestProvider);
        let state = tester
            .lifecycle_create("test_resource", json!({"name": "test"}))
            .await
            .unwrap();

        assert_eq!(state["name"], "test");
        assert_eq!(state["id"], "generated-id");
    }

    #[tokio::test]
    async fn test_tester_lifecycle_crud() {
        let tester = ProviderTester::new(TestProvider);
        let final_state = tester
            .lifecycle_crud(
                "test_resource",
                json!({"name": "initial"}),
                json!({"name": "updated"}),
            )
            .await
            .unwrap();

        assert_eq!(final_state["name"], "updated");
    }

    #[tokio::test]
    async fn test_tester_unknown_resource() {
        let tester = ProviderTester::new(TestProvider);
        let err = tester
            .create("no_such_resource", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TestError::Provider(ProviderError::UnknownResource(_))
        ));
    }

    #[tokio::test]
    async fn test_tester_import_passthrough() {
        let tester = ProviderTester::new(TestProvider);
        let state = tester
            .import_resource("test_resource", "i-12345")
            .await
            .unwrap();
        assert_eq!(state["id"], "i-12345");
    }

    #[tokio::test]
    async fn test_tester_import_not_implemented_default() {
        let tester = ProviderTester::new(TestProvider);
        let err = tester
            .import_resource("test_legacy", "i-12345")
            .await
            .unwrap_err();

        match err {
            TestError::Diagnostics(diags) => {
                assert_eq!(diags.len(), 1);
                assert_eq!(diags[0].summary, "Resource Import Not Implemented");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_tester_upgrade_state_current_version_passthrough() {
        let tester = ProviderTester::new(TestProvider);
        let state = json!({"id": "x", "required_attribute": "v"});
        let upgraded = tester
            .upgrade_resource_state("test_legacy", 1, state.clone())
            .await
            .unwrap();
        assert_eq!(upgraded, state);
    }

    #[tokio::test]
    async fn test_tester_upgrade_state_not_implemented() {
        let tester = ProviderTester::new(TestProvider);
        let err = tester
            .upgrade_resource_state("test_legacy", 0, json!({"id": "x"}))
            .await
            .unwrap_err();

        match err {
            TestError::Diagnostics(diags) => {
                assert_eq!(diags.len(), 1);
                assert_eq!(diags[0].summary, "Unable to Upgrade Resource State");
                assert!(diags[0].detail.as_deref().unwrap().contains("version 0"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_tester_read_data_source() {
        let tester = ProviderTester::new(TestProvider);
        let state = tester
            .read_data_source("test_data", json!({"filter": "env:prod"}))
            .await
            .unwrap();
        assert_eq!(state["result"], "env:prod");
    }

    #[test]
    fn test_assert_no_errors() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_warning("Just a warning", "no action needed");
        assert_no_errors(&diagnostics);
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_error("An error", "details");
        assert_no_errors(&diagnostics);
    }

    #[test]
    fn test_assert_has_errors() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_error("An error", "details");
        assert_has_errors(&diagnostics);
    }

    #[test]
    fn test_assert_error_contains() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_error("Invalid configuration value", "details");
        assert_error_contains(&diagnostics, "Invalid");
        assert_error_contains(&diagnostics, "configuration");
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("First error").with_attribute("field1"),
            Diagnostic::error("Second error").with_detail("More info"),
        ]);

        let display = format!("{}", err);
        assert!(display.contains("First error"));
        assert!(display.contains("Second error"));
        assert!(display.contains("field1"));
        assert!(display.contains("More info"));
    }

    // =====================================================================
    // Conversion contract conformance
    // =====================================================================

    #[test]
    fn test_double_unknown_encodes_to_unknown_sentinel() {
        let wire = TestStringValue::unknown().to_wire().unwrap();
        assert!(!wire.is_known());
        assert!(!wire.is_null());
    }

    #[test]
    fn test_double_null_encodes_to_wire_null() {
        let wire = TestStringValue::null().to_wire().unwrap();
        assert!(wire.is_known());
        assert!(wire.is_null());
    }

    #[test]
    fn test_double_string_round_trips() {
        let ty = TestStringType::new();
        let decoded = ty.value_from_wire(&DynamicValue::string("hello")).unwrap();

        let expected = TestStringValue::known("hello");
        assert!(decoded.equal(&expected));

        let wire = decoded.to_wire().unwrap();
        assert_eq!(wire.as_str(), Some("hello"));
    }

    #[test]
    fn test_double_decodes_all_three_states() {
        let ty = TestStringType::new();

        let unknown = ty
            .value_from_wire(&DynamicValue::unknown(AttributeType::String))
            .unwrap();
        assert!(unknown.equal(&TestStringValue::unknown()));

        let null = ty
            .value_from_wire(&DynamicValue::null(AttributeType::String))
            .unwrap();
        assert!(null.equal(&TestStringValue::null()));

        let known = ty.value_from_wire(&DynamicValue::string("v")).unwrap();
        assert!(known.equal(&TestStringValue::known("v")));
    }

    #[test]
    fn test_double_rejects_wrong_wire_type() {
        let ty = TestStringType::new();
        let err = ty
            .value_from_wire(&DynamicValue::known(AttributeType::Bool, json!(true)))
            .unwrap_err();
        assert!(matches!(err, ProviderError::TypeMismatch { .. }));
    }

    #[test]
    fn test_double_equality_matrix() {
        let cases = [
            TestStringValue::unknown(),
            TestStringValue::null(),
            TestStringValue::known("a"),
            TestStringValue::known("b"),
        ];

        for (i, left) in cases.iter().enumerate() {
            for (j, right) in cases.iter().enumerate() {
                assert_eq!(
                    left.equal(right),
                    i == j,
                    "equality of case {} vs case {}",
                    i,
                    j
                );
            }
        }
    }

    #[test]
    fn test_double_set_from_wire_updates_in_place() {
        let ty = TestStringType::new();
        let mut value = ty.value_from_wire(&DynamicValue::string("before")).unwrap();

        value
            .set_from_wire(&DynamicValue::null(AttributeType::String))
            .unwrap();
        assert!(value.equal(&TestStringValue::null()));

        value
            .set_from_wire(&DynamicValue::unknown(AttributeType::String))
            .unwrap();
        assert!(value.equal(&TestStringValue::unknown()));

        value.set_from_wire(&DynamicValue::string("after")).unwrap();
        assert!(value.equal(&TestStringValue::known("after")));
    }

    #[test]
    fn test_double_injected_set_error_returned_verbatim() {
        let ty = TestStringType::with_set_error("boom");
        let mut value = ty.value_from_wire(&DynamicValue::string("x")).unwrap();

        let err = value
            .set_from_wire(&DynamicValue::string("y"))
            .unwrap_err();
        match err {
            ProviderError::Sdk(message) => assert_eq!(message, "boom"),
            other => panic!("unexpected error: {}", other),
        }

        // The failed update left the contents untouched.
        assert!(value.equal(&TestStringValue::known("x")));
    }

    #[test]
    fn test_double_type_equality() {
        let a = TestStringType::new();
        let b = TestStringType::with_set_error("boom");
        assert!(a.equal(&b));
        assert_eq!(a.wire_type(), AttributeType::String);
    }

    #[test]
    fn test_config_attribute_value_through_double() {
        let config = Config::new(json!({"name": "web", "missing": null}));
        let ty = TestStringType::new();

        let known = config.attribute_value("name", &ty).unwrap();
        assert!(known.equal(&TestStringValue::known("web")));

        let null = config.attribute_value("missing", &ty).unwrap();
        assert!(null.equal(&TestStringValue::null()));

        let absent = config.attribute_value("not_there", &ty).unwrap();
        assert!(absent.equal(&TestStringValue::null()));
    }

    #[test]
    fn test_import_helper_direct_use() {
        let mut resp = ImportResourceStateResponse::new(resource_schema());
        resource_import_state_not_implemented("intentionally not implemented", &mut resp);
        assert_error_contains(&resp.diagnostics, "Resource Import Not Implemented");
    }
}
