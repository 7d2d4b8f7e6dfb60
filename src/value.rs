//! The attribute value conversion contract.
//!
//! Attribute values cross the protocol as [`DynamicValue`]s: a wire type
//! descriptor plus one of exactly three states (known-and-set, known-null,
//! or unknown). An unknown value is one the host cannot resolve yet at plan
//! time (it is still pending interpolation) and every attribute value
//! implementation must round-trip all three states.
//!
//! Provider authors plug their own value representations in through
//! [`AttrType`] and [`AttrValue`]. The SDK ships no production
//! implementations; see the doubles in [`crate::testing`] for a minimal
//! string implementation of the contract.

use std::any::Any;

use crate::error::ProviderError;
use crate::schema::AttributeType;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
enum Contents {
    Unknown,
    Null,
    Known(Value),
}

/// A wire-level attribute value in one of three states.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicValue {
    ty: AttributeType,
    contents: Contents,
}

impl DynamicValue {
    /// The unknown sentinel: a value still pending interpolation.
    pub fn unknown(ty: AttributeType) -> Self {
        Self {
            ty,
            contents: Contents::Unknown,
        }
    }

    /// A known, explicitly null value.
    pub fn null(ty: AttributeType) -> Self {
        Self {
            ty,
            contents: Contents::Null,
        }
    }

    /// A known, set value.
    ///
    /// A JSON null collapses into the null state.
    pub fn known(ty: AttributeType, value: Value) -> Self {
        let contents = match value {
            Value::Null => Contents::Null,
            other => Contents::Known(other),
        };
        Self { ty, contents }
    }

    /// A known string value.
    pub fn string(value: impl Into<String>) -> Self {
        Self::known(AttributeType::String, Value::String(value.into()))
    }

    /// The wire type descriptor of this value.
    pub fn wire_type(&self) -> &AttributeType {
        &self.ty
    }

    /// Whether the value is resolved (set or null, but not pending).
    pub fn is_known(&self) -> bool {
        !matches!(self.contents, Contents::Unknown)
    }

    /// Whether the value is known and null.
    pub fn is_null(&self) -> bool {
        matches!(self.contents, Contents::Null)
    }

    /// The raw JSON value, when known and set.
    pub fn as_value(&self) -> Option<&Value> {
        match &self.contents {
            Contents::Known(v) => Some(v),
            _ => None,
        }
    }

    /// The string contents, when known, set, and a string.
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// The integer contents, when known, set, and an integer.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    /// The boolean contents, when known, set, and a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }
}

/// Capability of an attribute type: produce the wire type descriptor and
/// decode wire values into in-memory [`AttrValue`]s.
pub trait AttrType: Send + Sync + 'static {
    /// The wire type descriptor values of this type are encoded with.
    fn wire_type(&self) -> AttributeType;

    /// Decode a wire value into an in-memory value of this type.
    ///
    /// Implementations must accept all three value states and reject wire
    /// values of a different type.
    fn value_from_wire(&self, value: &DynamicValue) -> Result<Box<dyn AttrValue>, ProviderError>;

    /// Whether `other` is the same attribute type.
    fn equal(&self, other: &dyn AttrType) -> bool;

    /// Self as [`Any`], so implementations can downcast in [`AttrType::equal`].
    fn as_any(&self) -> &dyn Any;
}

/// Capability of an in-memory attribute value: re-encode to the wire and
/// update in place from a new wire value.
pub trait AttrValue: std::fmt::Debug + Send + Sync + 'static {
    /// Re-encode this value to its wire form, preserving the value state.
    fn to_wire(&self) -> Result<DynamicValue, ProviderError>;

    /// Replace this value's contents with those of a new wire value.
    fn set_from_wire(&mut self, value: &DynamicValue) -> Result<(), ProviderError>;

    /// Whether `other` holds the same state and contents.
    fn equal(&self, other: &dyn AttrValue) -> bool;

    /// Self as [`Any`], so implementations can downcast in [`AttrValue::equal`].
    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_three_states() {
        let unknown = DynamicValue::unknown(AttributeType::String);
        assert!(!unknown.is_known());
        assert!(!unknown.is_null());
        assert!(unknown.as_value().is_none());

        let null = DynamicValue::null(AttributeType::String);
        assert!(null.is_known());
        assert!(null.is_null());
        assert!(null.as_value().is_none());

        let known = DynamicValue::string("web-1");
        assert!(known.is_known());
        assert!(!known.is_null());
        assert_eq!(known.as_str(), Some("web-1"));
    }

    #[test]
    fn test_known_null_collapses() {
        let value = DynamicValue::known(AttributeType::String, Value::Null);
        assert!(value.is_null());
        assert!(value.as_value().is_none());
    }

    #[test]
    fn test_typed_accessors() {
        let count = DynamicValue::known(AttributeType::Int64, json!(3));
        assert_eq!(count.as_i64(), Some(3));
        assert_eq!(count.as_str(), None);

        let enabled = DynamicValue::known(AttributeType::Bool, json!(true));
        assert_eq!(enabled.as_bool(), Some(true));

        assert_eq!(count.wire_type(), &AttributeType::Int64);
    }

    #[test]
    fn test_equality_across_states() {
        assert_eq!(
            DynamicValue::unknown(AttributeType::String),
            DynamicValue::unknown(AttributeType::String)
        );
        assert_ne!(
            DynamicValue::unknown(AttributeType::String),
            DynamicValue::null(AttributeType::String)
        );
        assert_ne!(
            DynamicValue::string("a"),
            DynamicValue::string("b")
        );
        assert_ne!(
            DynamicValue::unknown(AttributeType::String),
            DynamicValue::unknown(AttributeType::Bool)
        );
    }
}
