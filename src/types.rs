//! Convenience types shared across the provider protocol surface.

use serde::{Deserialize, Serialize};

/// A change to a single attribute, reported alongside a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The dotted path to the attribute that changed.
    pub path: String,
    /// The value before the change (None if creating).
    pub before: Option<serde_json::Value>,
    /// The value after the change (None if deleting).
    pub after: Option<serde_json::Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(
        path: impl Into<String>,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Create a change for a new attribute.
    pub fn added(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// Create a change for a removed attribute.
    pub fn removed(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// Create a change for a modified attribute.
    pub fn modified(
        path: impl Into<String>,
        before: serde_json::Value,
        after: serde_json::Value,
    ) -> Self {
        Self::new(path, Some(before), Some(after))
    }
}

impl From<crate::generated::AttributeChange> for AttributeChange {
    fn from(proto: crate::generated::AttributeChange) -> Self {
        Self {
            path: proto.path,
            before: if proto.before.is_empty() {
                None
            } else {
                serde_json::from_slice(&proto.before).ok()
            },
            after: if proto.after.is_empty() {
                None
            } else {
                serde_json::from_slice(&proto.after).ok()
            },
        }
    }
}

impl From<AttributeChange> for crate::generated::AttributeChange {
    fn from(change: AttributeChange) -> Self {
        Self {
            path: change.path,
            before: change
                .before
                .map(|v| serde_json::to_vec(&v).unwrap_or_default())
                .unwrap_or_default(),
            after: change
                .after
                .map(|v| serde_json::to_vec(&v).unwrap_or_default())
                .unwrap_or_default(),
        }
    }
}

/// Provider metadata returned by GetMetadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// List of resource type names.
    pub resources: Vec<String>,
    /// List of data source type names.
    pub data_sources: Vec<String>,
    /// Server capabilities.
    pub capabilities: ServerCapabilities,
}

/// Server capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServerCapabilities {
    /// Whether the provider supports planning destroy operations.
    pub plan_destroy: bool,
}

/// The protocol version for the handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// The handshake prefix output by providers.
pub const HANDSHAKE_PREFIX: &str = "STRATA_PROVIDER";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_change_constructors() {
        let added = AttributeChange::added("name", serde_json::json!("test"));
        assert!(added.before.is_none());
        assert_eq!(added.after, Some(serde_json::json!("test")));

        let removed = AttributeChange::removed("name", serde_json::json!("old"));
        assert_eq!(removed.before, Some(serde_json::json!("old")));
        assert!(removed.after.is_none());

        let modified =
            AttributeChange::modified("count", serde_json::json!(1), serde_json::json!(2));
        assert_eq!(modified.before, Some(serde_json::json!(1)));
        assert_eq!(modified.after, Some(serde_json::json!(2)));
    }

    #[test]
    fn test_attribute_change_conversion() {
        let change =
            AttributeChange::modified("field", serde_json::json!("old"), serde_json::json!("new"));

        let proto: crate::generated::AttributeChange = change.clone().into();
        assert_eq!(proto.path, "field");

        let back: AttributeChange = proto.into();
        assert_eq!(back, change);
    }

    #[test]
    fn test_attribute_change_absent_sides() {
        let added = AttributeChange::added("id", serde_json::json!("i-1"));
        let proto: crate::generated::AttributeChange = added.into();
        assert!(proto.before.is_empty());

        let back: AttributeChange = proto.into();
        assert!(back.before.is_none());
        assert_eq!(back.after, Some(serde_json::json!("i-1")));
    }

    #[test]
    fn test_protocol_constants() {
        assert_eq!(PROTOCOL_VERSION, 1);
        assert_eq!(HANDSHAKE_PREFIX, "STRATA_PROVIDER");
    }
}
