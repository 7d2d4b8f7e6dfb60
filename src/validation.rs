//! Schema validation helpers.
//!
//! This module validates a `serde_json::Value` against a [`Schema`]. The
//! dispatch layer runs it for the validate RPCs, and the data layer reuses
//! the single-type check when writing attributes into state.
//!
//! # Example
//!
//! ```
//! use strata_provider_sdk::schema::{Schema, Attribute};
//! use strata_provider_sdk::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute("count", Attribute::optional_int64());
//!
//! let diagnostics = validate(&schema, &json!({"name": "test", "count": 42}));
//! assert!(diagnostics.is_empty());
//!
//! // Wrong type for count
//! let diagnostics = validate(&schema, &json!({"name": "test", "count": "three"}));
//! assert!(diagnostics.has_errors());
//! ```

use crate::diag::{Diagnostic, Diagnostics};
use crate::schema::{Attribute, AttributeType, Block, BlockNestingMode, NestedBlock, Schema};
use serde_json::Value;
use std::collections::HashMap;

/// Validate a JSON value against a schema.
///
/// Returns the diagnostics for every problem found; an empty collection
/// means the value is valid.
///
/// # Validation Rules
///
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed-only attributes are skipped (provider sets these)
/// - Attribute types must match the schema
/// - Nested blocks are validated recursively with min/max item constraints
pub fn validate(schema: &Schema, value: &Value) -> Diagnostics {
    let mut validator = Validator::default();
    validator.block(&schema.block, value, "");
    validator.finish()
}

/// Validate a JSON value against a schema, returning `Err` with the
/// diagnostics when anything is wrong.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Diagnostics> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
///
/// Use [`validate`] to get detailed error information.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

/// Check a single value against a declared attribute type.
///
/// Used by the state data layer to type-check attribute writes.
pub(crate) fn check_type(attr_type: &AttributeType, value: &Value, path: &str) -> Diagnostics {
    let mut validator = Validator::default();
    validator.attribute_type(attr_type, value, path);
    validator.finish()
}

#[derive(Default)]
struct Validator {
    diagnostics: Diagnostics,
}

impl Validator {
    fn finish(self) -> Diagnostics {
        self.diagnostics
    }

    fn block(&mut self, block: &Block, value: &Value, path: &str) {
        let obj = match value {
            Value::Object(map) => map,
            // Null is valid for optional blocks; nothing further to check.
            Value::Null => return,
            _ => {
                let mut diagnostic = Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(value)));
                if !path.is_empty() {
                    diagnostic = diagnostic.with_attribute(path);
                }
                self.diagnostics.push(diagnostic);
                return;
            }
        };

        for (name, attr) in &block.attributes {
            let attr_path = join_path(path, name);
            self.attribute(attr, obj.get(name), &attr_path);
        }

        for (name, nested) in &block.blocks {
            let block_path = join_path(path, name);
            self.nested_block(nested, obj.get(name), &block_path);
        }
    }

    fn attribute(&mut self, attr: &Attribute, value: Option<&Value>, path: &str) {
        // Computed-only attributes are filled in by the provider, not the
        // configuration, so their absence and their value are both fine here.
        if attr.flags.computed && !attr.flags.optional && !attr.flags.required {
            return;
        }

        match value {
            None | Some(Value::Null) => {
                if attr.flags.required {
                    self.diagnostics.add_attribute_error(
                        path,
                        format!("Missing required attribute '{}'", path),
                        "This attribute is required and must be provided",
                    );
                }
            }
            Some(v) => self.attribute_type(&attr.attr_type, v, path),
        }
    }

    fn attribute_type(&mut self, attr_type: &AttributeType, value: &Value, path: &str) {
        match attr_type {
            AttributeType::String => {
                if !value.is_string() {
                    self.type_error(path, "string", value);
                }
            }
            AttributeType::Int64 => {
                if !is_int64(value) {
                    self.type_error(path, "int64", value);
                }
            }
            AttributeType::Float64 => {
                if !value.is_number() {
                    self.type_error(path, "float64", value);
                }
            }
            AttributeType::Bool => {
                if !value.is_boolean() {
                    self.type_error(path, "bool", value);
                }
            }
            // Sets are represented as arrays in JSON, so both validate alike.
            AttributeType::List(element_type) | AttributeType::Set(element_type) => {
                if let Some(arr) = value.as_array() {
                    for (i, elem) in arr.iter().enumerate() {
                        let elem_path = format!("{}.{}", path, i);
                        self.attribute_type(element_type, elem, &elem_path);
                    }
                } else {
                    let expected = if matches!(attr_type, AttributeType::List(_)) {
                        "list"
                    } else {
                        "set"
                    };
                    self.type_error(path, expected, value);
                }
            }
            AttributeType::Map(value_type) => {
                if let Some(obj) = value.as_object() {
                    for (key, val) in obj {
                        let key_path = format!("{}.{}", path, key);
                        self.attribute_type(value_type, val, &key_path);
                    }
                } else {
                    self.type_error(path, "map", value);
                }
            }
            AttributeType::Object(attrs) => {
                if let Some(obj) = value.as_object() {
                    self.object_type(attrs, obj, path);
                } else {
                    self.type_error(path, "object", value);
                }
            }
            // Dynamic accepts any value.
            AttributeType::Dynamic => {}
        }
    }

    fn object_type(
        &mut self,
        attrs: &HashMap<String, AttributeType>,
        obj: &serde_json::Map<String, Value>,
        path: &str,
    ) {
        // Object fields carry no required/optional flags, so only the types
        // of present fields are enforced.
        for (name, attr_type) in attrs {
            if let Some(value) = obj.get(name) {
                let attr_path = join_path(path, name);
                self.attribute_type(attr_type, value, &attr_path);
            }
        }
    }

    fn nested_block(&mut self, nested: &NestedBlock, value: Option<&Value>, path: &str) {
        match nested.nesting_mode {
            BlockNestingMode::Single => self.single_block(nested, value, path),
            // Sets validate the same as lists here.
            BlockNestingMode::List | BlockNestingMode::Set => {
                self.list_block(nested, value, path)
            }
            BlockNestingMode::Map => self.map_block(nested, value, path),
        }
    }

    fn single_block(&mut self, nested: &NestedBlock, value: Option<&Value>, path: &str) {
        match value {
            None | Some(Value::Null) => {
                if nested.min_items > 0 {
                    self.diagnostics.add_attribute_error(
                        path,
                        format!("Missing required block '{}'", path),
                        "At least one block is required",
                    );
                }
            }
            Some(v) => self.block(&nested.block, v, path),
        }
    }

    fn list_block(&mut self, nested: &NestedBlock, value: Option<&Value>, path: &str) {
        match value {
            None | Some(Value::Null) => {
                if nested.min_items > 0 {
                    self.missing_items(path, nested.min_items);
                }
            }
            Some(Value::Array(arr)) => {
                self.item_count(path, nested, arr.len() as u32);
                for (i, item) in arr.iter().enumerate() {
                    let item_path = format!("{}.{}", path, i);
                    self.block(&nested.block, item, &item_path);
                }
            }
            Some(v) => {
                let diagnostic = Diagnostic::error(format!("Expected list for block '{}'", path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path);
                self.diagnostics.push(diagnostic);
            }
        }
    }

    fn map_block(&mut self, nested: &NestedBlock, value: Option<&Value>, path: &str) {
        match value {
            None | Some(Value::Null) => {
                if nested.min_items > 0 {
                    self.missing_items(path, nested.min_items);
                }
            }
            Some(Value::Object(obj)) => {
                self.item_count(path, nested, obj.len() as u32);
                for (key, item) in obj {
                    let item_path = format!("{}.{}", path, key);
                    self.block(&nested.block, item, &item_path);
                }
            }
            Some(v) => {
                let diagnostic = Diagnostic::error(format!("Expected map for block '{}'", path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path);
                self.diagnostics.push(diagnostic);
            }
        }
    }

    fn missing_items(&mut self, path: &str, min: u32) {
        self.diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' requires at least {} item(s)",
                path, min
            ))
            .with_attribute(path),
        );
    }

    fn item_count(&mut self, path: &str, nested: &NestedBlock, len: u32) {
        if len < nested.min_items {
            self.diagnostics.push(
                Diagnostic::error(format!(
                    "Block '{}' requires at least {} item(s), got {}",
                    path, nested.min_items, len
                ))
                .with_attribute(path),
            );
        }
        // max_items of 0 means unlimited.
        if nested.max_items > 0 && len > nested.max_items {
            self.diagnostics.push(
                Diagnostic::error(format!(
                    "Block '{}' allows at most {} item(s), got {}",
                    path, nested.max_items, len
                ))
                .with_attribute(path),
            );
        }
    }

    fn type_error(&mut self, path: &str, expected: &str, got: &Value) {
        self.diagnostics.add_attribute_error(
            path,
            format!("Invalid type for attribute '{}'", path),
            format!("Expected {}, got {}", expected, value_type_name(got)),
        );
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            if n.as_i64().is_some() {
                true
            } else if let Some(f) = n.as_f64() {
                // Accept floats that carry an integral value.
                f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64
            } else {
                false
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeFlags, Block, NestedBlock, Schema};
    use serde_json::json;

    fn first_attribute(diagnostics: &Diagnostics) -> Option<&str> {
        diagnostics.iter().next()?.attribute.as_deref()
    }

    #[test]
    fn test_validate_required_string() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        let diagnostics = validate(&schema, &json!({"name": "test"}));
        assert!(diagnostics.is_empty());

        // Missing required
        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(first_attribute(&diagnostics), Some("name"));

        // Null value
        let diagnostics = validate(&schema, &json!({"name": null}));
        assert_eq!(diagnostics.len(), 1);

        // Wrong type
        let diagnostics = validate(&schema, &json!({"name": 123}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.iter().next().unwrap().summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_optional_attribute() {
        let schema = Schema::v0().with_attribute("count", Attribute::optional_int64());

        assert!(validate(&schema, &json!({"count": 42})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"count": null})).is_empty());

        let diagnostics = validate(&schema, &json!({"count": "not a number"}));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_validate_computed_attribute_skipped() {
        let schema = Schema::v0().with_attribute("id", Attribute::computed_string());

        assert!(validate(&schema, &json!({})).is_empty());
        // Computed-only attrs are never checked against the config value.
        assert!(validate(&schema, &json!({"id": 123})).is_empty());
    }

    #[test]
    fn test_validate_int64() {
        let schema = Schema::v0().with_attribute("count", Attribute::required_int64());

        assert!(validate(&schema, &json!({"count": 42})).is_empty());
        // Float that's actually an integer
        assert!(validate(&schema, &json!({"count": 42.0})).is_empty());

        assert_eq!(validate(&schema, &json!({"count": 42.5})).len(), 1);
        assert_eq!(validate(&schema, &json!({"count": "42"})).len(), 1);
    }

    #[test]
    fn test_validate_bool() {
        let schema = Schema::v0().with_attribute("enabled", Attribute::required_bool());

        assert!(validate(&schema, &json!({"enabled": true})).is_empty());
        assert!(validate(&schema, &json!({"enabled": false})).is_empty());
        assert_eq!(validate(&schema, &json!({"enabled": "true"})).len(), 1);
    }

    #[test]
    fn test_validate_list() {
        let schema = Schema::v0().with_attribute(
            "tags",
            Attribute::new(
                AttributeType::list(AttributeType::String),
                AttributeFlags::required(),
            ),
        );

        assert!(validate(&schema, &json!({"tags": ["a", "b", "c"]})).is_empty());
        assert!(validate(&schema, &json!({"tags": []})).is_empty());

        // Wrong element type, reported at the element path
        let diagnostics = validate(&schema, &json!({"tags": ["a", 123, "c"]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(first_attribute(&diagnostics), Some("tags.1"));

        assert_eq!(validate(&schema, &json!({"tags": "not a list"})).len(), 1);
    }

    #[test]
    fn test_validate_map() {
        let schema = Schema::v0().with_attribute(
            "labels",
            Attribute::new(
                AttributeType::map(AttributeType::String),
                AttributeFlags::required(),
            ),
        );

        assert!(validate(&schema, &json!({"labels": {"env": "prod", "app": "web"}})).is_empty());

        let diagnostics = validate(&schema, &json!({"labels": {"env": "prod", "count": 42}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(first_attribute(&diagnostics), Some("labels.count"));
    }

    #[test]
    fn test_validate_nested_block_single() {
        let schema = Schema::v0().with_block(
            "config",
            NestedBlock::single(Block::new().with_attribute("enabled", Attribute::required_bool())),
        );

        assert!(validate(&schema, &json!({"config": {"enabled": true}})).is_empty());
        // Missing optional block is ok
        assert!(validate(&schema, &json!({})).is_empty());

        let diagnostics = validate(&schema, &json!({"config": {"enabled": "yes"}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(first_attribute(&diagnostics), Some("config.enabled"));
    }

    #[test]
    fn test_validate_nested_block_list() {
        let schema = Schema::v0().with_block(
            "ingress",
            NestedBlock::list(Block::new().with_attribute("port", Attribute::required_int64()))
                .with_min_items(1)
                .with_max_items(3),
        );

        assert!(validate(&schema, &json!({"ingress": [{"port": 80}, {"port": 443}]})).is_empty());

        let diagnostics = validate(&schema, &json!({"ingress": []}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.iter().next().unwrap().summary.contains("at least 1"));

        let diagnostics = validate(
            &schema,
            &json!({"ingress": [{"port": 80}, {"port": 443}, {"port": 8080}, {"port": 9090}]}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.iter().next().unwrap().summary.contains("at most 3"));

        let diagnostics = validate(&schema, &json!({"ingress": [{"port": "eighty"}]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(first_attribute(&diagnostics), Some("ingress.0.port"));
    }

    #[test]
    fn test_validate_nested_block_map() {
        let schema = Schema::v0().with_block(
            "volumes",
            NestedBlock::map(
                Block::new().with_attribute("mount_path", Attribute::required_string()),
            ),
        );

        let diagnostics = validate(
            &schema,
            &json!({"volumes": {"data": {"mount_path": "/data"}, "logs": {"mount_path": "/logs"}}}),
        );
        assert!(diagnostics.is_empty());

        let diagnostics = validate(&schema, &json!({"volumes": {"data": {"mount_path": 123}}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(first_attribute(&diagnostics), Some("volumes.data.mount_path"));
    }

    #[test]
    fn test_validate_multiple_errors() {
        let schema = Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("count", Attribute::required_int64())
            .with_attribute("enabled", Attribute::required_bool());

        let diagnostics = validate(
            &schema,
            &json!({"name": 123, "count": "not a number", "enabled": "yes"}),
        );
        assert_eq!(diagnostics.len(), 3);
    }

    #[test]
    fn test_validate_deeply_nested() {
        let schema = Schema::v0().with_block(
            "network",
            NestedBlock::list(
                Block::new()
                    .with_attribute("name", Attribute::required_string())
                    .with_block(
                        "subnet",
                        NestedBlock::list(
                            Block::new().with_attribute("cidr", Attribute::required_string()),
                        ),
                    ),
            ),
        );

        let diagnostics = validate(
            &schema,
            &json!({
                "network": [{
                    "name": "vpc-1",
                    "subnet": [{"cidr": "10.0.0.0/24"}]
                }]
            }),
        );
        assert!(diagnostics.is_empty());

        let diagnostics = validate(
            &schema,
            &json!({
                "network": [{
                    "name": "vpc-1",
                    "subnet": [{"cidr": 123}]
                }]
            }),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(first_attribute(&diagnostics), Some("network.0.subnet.0.cidr"));
    }

    #[test]
    fn test_is_valid_helper() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(is_valid(&schema, &json!({"name": "test"})));
        assert!(!is_valid(&schema, &json!({})));
    }

    #[test]
    fn test_validate_result_helper() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(validate_result(&schema, &json!({"name": "test"})).is_ok());

        let result = validate_result(&schema, &json!({}));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().len(), 1);
    }

    #[test]
    fn test_validate_dynamic_type() {
        let schema = Schema::v0().with_attribute(
            "metadata",
            Attribute::new(AttributeType::Dynamic, AttributeFlags::required()),
        );

        assert!(validate(&schema, &json!({"metadata": "string"})).is_empty());
        assert!(validate(&schema, &json!({"metadata": 123})).is_empty());
        assert!(validate(&schema, &json!({"metadata": {"nested": "object"}})).is_empty());
        assert!(validate(&schema, &json!({"metadata": [1, 2, 3]})).is_empty());
    }

    #[test]
    fn test_validate_root_not_object() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        let diagnostics = validate(&schema, &json!("not an object"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.iter().next().unwrap().summary.contains("Expected object"));
    }

    #[test]
    fn test_check_type_helper() {
        let diagnostics = check_type(&AttributeType::String, &json!("ok"), "name");
        assert!(diagnostics.is_empty());

        let diagnostics = check_type(&AttributeType::String, &json!(7), "name");
        assert!(diagnostics.has_errors());
        assert_eq!(
            diagnostics.iter().next().unwrap().attribute,
            Some("name".to_string())
        );
    }
}
