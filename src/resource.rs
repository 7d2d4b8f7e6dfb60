//! Resource and data source handler traits, plus import helpers.

use async_trait::async_trait;
use serde_json::Value;

use crate::request::{
    CreateResourceRequest, DeleteResourceRequest, ImportResourceStateRequest,
    ModifyResourcePlanRequest, ReadDataSourceRequest, ReadResourceRequest,
    UpdateResourceRequest, UpgradeResourceStateRequest,
};
use crate::response::{
    CreateResourceResponse, DeleteResourceResponse, ImportResourceStateResponse,
    ModifyResourcePlanResponse, ReadDataSourceResponse, ReadResourceResponse,
    UpdateResourceResponse, UpgradeResourceStateResponse,
};

/// A managed resource type served by a provider.
///
/// The four CRUD handlers are required. The remaining handlers have
/// defaults a resource overrides only when it supports the behavior:
/// plan passthrough, no state upgrades, and no import.
///
/// Handlers report failure by appending error diagnostics to the response;
/// they do not return errors.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Create the resource described by the planned state.
    async fn create(&self, req: CreateResourceRequest, resp: &mut CreateResourceResponse);

    /// Refresh state against the real infrastructure.
    ///
    /// Setting the response state to null reports that the resource no
    /// longer exists.
    async fn read(&self, req: ReadResourceRequest, resp: &mut ReadResourceResponse);

    /// Update the resource in place to match the planned state.
    async fn update(&self, req: UpdateResourceRequest, resp: &mut UpdateResourceResponse);

    /// Destroy the resource.
    async fn delete(&self, req: DeleteResourceRequest, resp: &mut DeleteResourceResponse);

    /// Adjust the planned new state the host generated for the resource.
    ///
    /// The default accepts the host's plan unchanged. Override to fill in
    /// provider-known defaults, report attribute changes, or mark paths in
    /// `requires_replace`.
    async fn modify_plan(
        &self,
        req: ModifyResourcePlanRequest,
        resp: &mut ModifyResourcePlanResponse,
    ) {
        resp.plan = req.plan;
    }

    /// Rewrite state stored at an older schema version to the current one.
    ///
    /// Called only when the stored version differs from the schema version.
    /// The default reports that the stored state cannot be upgraded.
    async fn upgrade_state(
        &self,
        req: UpgradeResourceStateRequest,
        resp: &mut UpgradeResourceStateResponse,
    ) {
        resp.diagnostics.add_error(
            "Unable to Upgrade Resource State",
            format!(
                "This resource does not support upgrading state written at schema \
                 version {}. Report this to the provider developer.",
                req.version
            ),
        );
    }

    /// Import existing infrastructure into management.
    ///
    /// Must return enough state for a subsequent read to fully refresh the
    /// resource. When setting a single identifier attribute, use
    /// [`resource_import_state_passthrough_id`]. The default reports that
    /// the resource does not support import.
    async fn import_state(
        &self,
        req: ImportResourceStateRequest,
        resp: &mut ImportResourceStateResponse,
    ) {
        let _ = req;
        resource_import_state_not_implemented("", resp);
    }
}

/// A data source type served by a provider.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Read data from the external source described by the config.
    async fn read(&self, req: ReadDataSourceRequest, resp: &mut ReadDataSourceResponse);
}

/// Report that a resource does not support import.
///
/// Appends an error diagnostic to the response. The detail defaults to a
/// generic message pointing at the provider developer; pass a non-empty
/// `details` to give users specific guidance instead.
pub fn resource_import_state_not_implemented(
    details: &str,
    resp: &mut ImportResourceStateResponse,
) {
    let details = if details.is_empty() {
        "This resource does not support import. Contact the provider developer \
         for additional information."
    } else {
        details
    };

    resp.diagnostics
        .add_error("Resource Import Not Implemented", details);
}

/// Copy the import identifier into a string attribute of the response state.
///
/// The attribute at `path` must accept a string value. An empty path is
/// always a provider bug and produces an error diagnostic.
pub fn resource_import_state_passthrough_id(
    path: &str,
    req: &ImportResourceStateRequest,
    resp: &mut ImportResourceStateResponse,
) {
    if path.is_empty() {
        resp.diagnostics.add_error(
            "Resource Import Passthrough Missing Attribute Path",
            "This is always an error in the provider. Report the following to the \
             provider developer:\n\nThe import passthrough path must name an \
             attribute that accepts a string value.",
        );
        return;
    }

    let diagnostics = resp
        .state
        .set_attribute(path, Value::String(req.id.clone()));
    resp.diagnostics.append(diagnostics);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Schema};
    use serde_json::json;

    fn import_parts() -> (ImportResourceStateRequest, ImportResourceStateResponse) {
        let schema = Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string());
        (
            ImportResourceStateRequest {
                id: "i-abc123".to_string(),
            },
            ImportResourceStateResponse::new(schema),
        )
    }

    #[test]
    fn test_not_implemented_default_detail() {
        let (_, mut resp) = import_parts();
        resource_import_state_not_implemented("", &mut resp);

        assert!(resp.diagnostics.has_errors());
        let entry = resp.diagnostics.iter().next().unwrap();
        assert_eq!(entry.summary, "Resource Import Not Implemented");
        assert!(entry
            .detail
            .as_deref()
            .unwrap()
            .contains("does not support import"));
    }

    #[test]
    fn test_not_implemented_custom_detail() {
        let (_, mut resp) = import_parts();
        resource_import_state_not_implemented("Use the bulk import tool instead.", &mut resp);

        let entry = resp.diagnostics.iter().next().unwrap();
        assert_eq!(
            entry.detail.as_deref(),
            Some("Use the bulk import tool instead.")
        );
    }

    #[test]
    fn test_passthrough_sets_identifier() {
        let (req, mut resp) = import_parts();
        resource_import_state_passthrough_id("id", &req, &mut resp);

        assert!(resp.diagnostics.is_empty());
        assert_eq!(resp.state.get_attribute("id"), Some(&json!("i-abc123")));
    }

    #[test]
    fn test_passthrough_empty_path() {
        let (req, mut resp) = import_parts();
        resource_import_state_passthrough_id("", &req, &mut resp);

        assert!(resp.diagnostics.has_errors());
        let entry = resp.diagnostics.iter().next().unwrap();
        assert_eq!(
            entry.summary,
            "Resource Import Passthrough Missing Attribute Path"
        );
        assert!(resp.state.is_null());
    }

    #[test]
    fn test_passthrough_undeclared_path() {
        let (req, mut resp) = import_parts();
        resource_import_state_passthrough_id("arn", &req, &mut resp);

        assert!(resp.diagnostics.has_errors());
        let entry = resp.diagnostics.iter().next().unwrap();
        assert_eq!(entry.summary, "Invalid Attribute Path");
        assert!(resp.state.is_null());
    }
}
