//! Configuration and state data passed through request/response objects.
//!
//! [`Config`] is the read-only form: what the user wrote, possibly not yet
//! fully resolved by the host. [`State`] is the mutable form handlers write
//! back: it carries the resource schema so attribute writes can be checked
//! against declared paths and types.
//!
//! Both address nested values with dotted paths ("network.0.cidr"), the same
//! syntax validation diagnostics use.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::diag::Diagnostics;
use crate::error::ProviderError;
use crate::schema::Schema;
use crate::validation;
use crate::value::{AttrType, AttrValue, DynamicValue};

fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        if segment.is_empty() {
            return None;
        }
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(arr) => arr.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Read-only configuration data supplied by the host.
///
/// A null config means the field was not populated for this operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    raw: Value,
}

impl Config {
    /// Wrap a raw JSON document.
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// An unpopulated config.
    pub fn null() -> Self {
        Self { raw: Value::Null }
    }

    /// Whether the config was populated at all.
    pub fn is_null(&self) -> bool {
        self.raw.is_null()
    }

    /// The underlying JSON document.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Look up the value at a dotted attribute path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.raw, path)
    }

    /// The string at a dotted path, if present and a string.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// The integer at a dotted path, if present and an integer.
    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(Value::as_i64)
    }

    /// The boolean at a dotted path, if present and a boolean.
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    /// Deserialize the whole config into an author-defined struct.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ProviderError> {
        Ok(serde_json::from_value(self.raw.clone())?)
    }

    /// Decode the attribute at `path` through a custom attribute type.
    ///
    /// An absent or null attribute decodes as the null value state.
    pub fn attribute_value(
        &self,
        path: &str,
        ty: &dyn AttrType,
    ) -> Result<Box<dyn AttrValue>, ProviderError> {
        let wire = match self.get(path) {
            None | Some(Value::Null) => DynamicValue::null(ty.wire_type()),
            Some(v) => DynamicValue::known(ty.wire_type(), v.clone()),
        };
        ty.value_from_wire(&wire)
    }
}

impl From<Value> for Config {
    fn from(raw: Value) -> Self {
        Self::new(raw)
    }
}

/// Mutable, schema-aware state data.
///
/// Handlers receive states built by the dispatch layer and write results
/// back through [`State::set_attribute`] or [`State::set_from`]. Writes are
/// checked against the schema: an undeclared path or a value of the wrong
/// type produces error diagnostics instead of silently corrupting state.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    raw: Value,
    schema: Schema,
}

impl State {
    /// An empty (null) state for the given schema.
    pub fn new(schema: Schema) -> Self {
        Self {
            raw: Value::Null,
            schema,
        }
    }

    /// Wrap an existing JSON document with its schema.
    pub fn from_value(schema: Schema, raw: Value) -> Self {
        Self { raw, schema }
    }

    /// The schema this state is checked against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Whether no state has been written yet.
    pub fn is_null(&self) -> bool {
        self.raw.is_null()
    }

    /// The underlying JSON document.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Consume the state, returning the JSON document.
    pub fn into_value(self) -> Value {
        self.raw
    }

    /// Look up the value at a dotted attribute path.
    pub fn get_attribute(&self, path: &str) -> Option<&Value> {
        lookup(&self.raw, path)
    }

    /// Write a value at a dotted attribute path.
    ///
    /// Missing intermediate containers are created along the way. Returns
    /// the diagnostics describing why the write was rejected: the path not
    /// matching a declared attribute, the value not matching the declared
    /// type, or the existing data not being traversable at that path. On
    /// success the returned collection is empty.
    pub fn set_attribute(&mut self, path: &str, value: Value) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();

        let attr_type = match self.schema.attribute_type_at(path) {
            Some(ty) => ty.clone(),
            None => {
                diagnostics.add_attribute_error(
                    path,
                    "Invalid Attribute Path",
                    format!(
                        "The path '{}' does not match an attribute declared in the schema.",
                        path
                    ),
                );
                return diagnostics;
            }
        };

        if !value.is_null() {
            let type_diags = validation::check_type(&attr_type, &value, path);
            if type_diags.has_errors() {
                diagnostics.append(type_diags);
                return diagnostics;
            }
        }

        let segments: Vec<&str> = path.split('.').collect();
        if let Err(diagnostic) = write_value(&mut self.raw, &segments, value, path) {
            diagnostics.push(diagnostic);
        }
        diagnostics
    }

    /// Serialize an author-defined struct as the entire state document.
    pub fn set_from<T: Serialize>(&mut self, value: &T) -> Result<(), ProviderError> {
        self.raw = serde_json::to_value(value)?;
        Ok(())
    }

    /// Deserialize the whole state into an author-defined struct.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ProviderError> {
        Ok(serde_json::from_value(self.raw.clone())?)
    }
}

fn write_value(
    target: &mut Value,
    segments: &[&str],
    value: Value,
    full_path: &str,
) -> Result<(), crate::diag::Diagnostic> {
    let (first, rest) = match segments.split_first() {
        Some(split) => split,
        None => {
            *target = value;
            return Ok(());
        }
    };

    match first.parse::<usize>() {
        Ok(index) => {
            if target.is_null() {
                *target = Value::Array(Vec::new());
            }
            let arr = target.as_array_mut().ok_or_else(|| {
                crate::diag::Diagnostic::error("Invalid Attribute Path")
                    .with_detail(format!(
                        "The existing value along '{}' is not a list and cannot be indexed.",
                        full_path
                    ))
                    .with_attribute(full_path)
            })?;
            // Appending one past the end is allowed; anything further would
            // leave holes.
            if index > arr.len() {
                return Err(crate::diag::Diagnostic::error("Invalid Attribute Path")
                    .with_detail(format!(
                        "Index {} along '{}' is out of range for a list of {} element(s).",
                        index,
                        full_path,
                        arr.len()
                    ))
                    .with_attribute(full_path));
            }
            if index == arr.len() {
                arr.push(Value::Null);
            }
            write_value(&mut arr[index], rest, value, full_path)
        }
        Err(_) => {
            if target.is_null() {
                *target = Value::Object(serde_json::Map::new());
            }
            let obj = target.as_object_mut().ok_or_else(|| {
                crate::diag::Diagnostic::error("Invalid Attribute Path")
                    .with_detail(format!(
                        "The existing value along '{}' is not an object and cannot be traversed.",
                        full_path
                    ))
                    .with_attribute(full_path)
            })?;
            let entry = obj.entry(first.to_string()).or_insert(Value::Null);
            write_value(entry, rest, value, full_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock};
    use serde_json::json;

    fn test_schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string())
            .with_attribute(
                "tags",
                Attribute::new(
                    AttributeType::list(AttributeType::String),
                    AttributeFlags::optional(),
                ),
            )
            .with_block(
                "network",
                NestedBlock::list(Block::new().with_attribute("cidr", Attribute::required_string())),
            )
    }

    #[test]
    fn test_config_lookup() {
        let config = Config::new(json!({
            "name": "web",
            "count": 3,
            "enabled": true,
            "network": [{"cidr": "10.0.0.0/24"}]
        }));

        assert_eq!(config.get_str("name"), Some("web"));
        assert_eq!(config.get_i64("count"), Some(3));
        assert_eq!(config.get_bool("enabled"), Some(true));
        assert_eq!(config.get_str("network.0.cidr"), Some("10.0.0.0/24"));
        assert!(config.get("network.1.cidr").is_none());
        assert!(config.get("missing").is_none());
        assert!(config.get("").is_none());
    }

    #[test]
    fn test_config_null() {
        let config = Config::null();
        assert!(config.is_null());
        assert!(config.get("anything").is_none());
    }

    #[test]
    fn test_config_parse() {
        #[derive(serde::Deserialize)]
        struct ServerConfig {
            name: String,
            count: i64,
        }

        let config = Config::new(json!({"name": "web", "count": 2}));
        let parsed: ServerConfig = config.parse().unwrap();
        assert_eq!(parsed.name, "web");
        assert_eq!(parsed.count, 2);

        let bad = Config::new(json!({"name": "web"}));
        assert!(bad.parse::<ServerConfig>().is_err());
    }

    #[test]
    fn test_state_set_attribute() {
        let mut state = State::new(test_schema());
        assert!(state.is_null());

        let diags = state.set_attribute("name", json!("web"));
        assert!(diags.is_empty());
        let diags = state.set_attribute("id", json!("i-123"));
        assert!(diags.is_empty());

        assert_eq!(state.raw(), &json!({"name": "web", "id": "i-123"}));
        assert_eq!(state.get_attribute("name"), Some(&json!("web")));
    }

    #[test]
    fn test_state_set_attribute_invalid_path() {
        let mut state = State::new(test_schema());

        let diags = state.set_attribute("nonexistent", json!("x"));
        assert!(diags.has_errors());
        let entry = diags.iter().next().unwrap();
        assert_eq!(entry.summary, "Invalid Attribute Path");
        assert_eq!(entry.attribute, Some("nonexistent".to_string()));
        // Nothing was written.
        assert!(state.is_null());
    }

    #[test]
    fn test_state_set_attribute_type_mismatch() {
        let mut state = State::new(test_schema());

        let diags = state.set_attribute("name", json!(42));
        assert!(diags.has_errors());
        assert!(state.is_null());
    }

    #[test]
    fn test_state_set_attribute_null_clears() {
        let mut state = State::new(test_schema());
        state.set_attribute("name", json!("web"));

        let diags = state.set_attribute("name", Value::Null);
        assert!(diags.is_empty());
        assert_eq!(state.get_attribute("name"), Some(&Value::Null));
    }

    #[test]
    fn test_state_set_attribute_creates_containers() {
        let mut state = State::new(test_schema());

        let diags = state.set_attribute("network.0.cidr", json!("10.0.0.0/24"));
        assert!(diags.is_empty());
        let diags = state.set_attribute("tags.0", json!("prod"));
        assert!(diags.is_empty());

        assert_eq!(
            state.raw(),
            &json!({
                "network": [{"cidr": "10.0.0.0/24"}],
                "tags": ["prod"]
            })
        );
    }

    #[test]
    fn test_state_set_attribute_sparse_index_rejected() {
        let mut state = State::new(test_schema());

        let diags = state.set_attribute("tags.2", json!("prod"));
        assert!(diags.has_errors());
        let entry = diags.iter().next().unwrap();
        assert!(entry.detail.as_deref().unwrap().contains("out of range"));
    }

    #[test]
    fn test_state_set_from_and_parse() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct ServerState {
            id: String,
            name: String,
        }

        let mut state = State::new(test_schema());
        let value = ServerState {
            id: "i-1".into(),
            name: "web".into(),
        };
        state.set_from(&value).unwrap();

        assert_eq!(state.get_attribute("id"), Some(&json!("i-1")));
        let back: ServerState = state.parse().unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_state_into_value() {
        let mut state = State::new(test_schema());
        state.set_attribute("name", json!("web"));
        assert_eq!(state.into_value(), json!({"name": "web"}));
    }
}
