//! Raw state records.
//!
//! A [`RawState`] is one resource instance's persisted attributes, decoded
//! from the host's state document into a tagged [`StateValue`] per field.
//! Migrators pattern-match on these values instead of asserting types at
//! runtime, so an absent or mistyped field is always an explicit branch.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

use crate::error::MigrationError;
use crate::schema::AttributeType;

/// A single untyped value in a state record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum StateValue {
    /// An explicit null.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number, kept in its exact JSON form.
    Number(Number),
    /// A string.
    String(String),
    /// An ordered sequence.
    List(Vec<StateValue>),
    /// A nested mapping.
    Map(BTreeMap<String, StateValue>),
}

impl StateValue {
    /// Create a string value.
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Create a list of strings.
    pub fn string_list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(|v| Self::String(v.into())).collect())
    }

    /// Create an empty list.
    pub fn empty_list() -> Self {
        Self::List(Vec::new())
    }

    /// Whether the value is an explicit null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean payload, if this is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The list payload, if this is a list.
    pub fn as_list(&self) -> Option<&[StateValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Human-readable type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Narrow this value to the shape `attr_type` expects.
    ///
    /// Scalars are converted where the conversion is lossless: numbers and
    /// bools render as strings, numeric strings parse as int64, and
    /// `"true"`/`"false"` parse as bool. Collections must already have the
    /// right shape; their elements are coerced recursively. Returns `None`
    /// when no conversion exists.
    pub fn coerce(&self, attr_type: &AttributeType) -> Option<StateValue> {
        match (attr_type, self) {
            (AttributeType::Dynamic, v) => Some(v.clone()),
            (AttributeType::String, Self::String(_)) => Some(self.clone()),
            (AttributeType::String, Self::Number(n)) => Some(Self::String(n.to_string())),
            (AttributeType::String, Self::Bool(b)) => Some(Self::String(b.to_string())),
            (AttributeType::Int64, Self::Number(n)) if n.is_i64() || n.is_u64() => {
                n.as_i64().map(|i| Self::Number(i.into()))
            }
            (AttributeType::Int64, Self::String(s)) => {
                s.trim().parse::<i64>().ok().map(|i| Self::Number(i.into()))
            }
            (AttributeType::Float64, Self::Number(_)) => Some(self.clone()),
            (AttributeType::Float64, Self::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Self::Number),
            (AttributeType::Bool, Self::Bool(_)) => Some(self.clone()),
            (AttributeType::Bool, Self::String(s)) => match s.as_str() {
                "true" => Some(Self::Bool(true)),
                "false" => Some(Self::Bool(false)),
                _ => None,
            },
            (AttributeType::List(elem) | AttributeType::Set(elem), Self::List(items)) => items
                .iter()
                .map(|item| item.coerce(elem))
                .collect::<Option<Vec<_>>>()
                .map(Self::List),
            (AttributeType::Map(elem), Self::Map(entries)) => entries
                .iter()
                .map(|(k, v)| v.coerce(elem).map(|v| (k.clone(), v)))
                .collect::<Option<BTreeMap<_, _>>>()
                .map(Self::Map),
            (AttributeType::Object(fields), Self::Map(entries)) => entries
                .iter()
                .map(|(k, v)| match fields.get(k) {
                    Some(field_type) => v.coerce(field_type).map(|v| (k.clone(), v)),
                    None => Some((k.clone(), v.clone())),
                })
                .collect::<Option<BTreeMap<_, _>>>()
                .map(Self::Map),
            _ => None,
        }
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<Value> for StateValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<StateValue> for Value {
    fn from(value: StateValue) -> Self {
        match value {
            StateValue::Null => Value::Null,
            StateValue::Bool(b) => Value::Bool(b),
            StateValue::Number(n) => Value::Number(n),
            StateValue::String(s) => Value::String(s),
            StateValue::List(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            StateValue::Map(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// One resource instance's persisted attributes at a single schema version.
///
/// The record is exclusively owned by whoever holds it; upgraders take it by
/// value and hand back the migrated record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct RawState(BTreeMap<String, StateValue>);

impl RawState {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a record from the host's JSON representation.
    ///
    /// The document must be an object; anything else is not a state record.
    pub fn from_json(value: Value) -> Result<Self, MigrationError> {
        match value {
            Value::Object(map) => Ok(Self(
                map.into_iter()
                    .map(|(k, v)| (k, StateValue::from(v)))
                    .collect(),
            )),
            other => Err(MigrationError::InvalidState(format!(
                "expected an object of attributes, got {}",
                StateValue::from(other).type_name()
            ))),
        }
    }

    /// Encode the record back into the host's JSON representation.
    pub fn into_json(self) -> Value {
        Value::from(StateValue::Map(self.0))
    }

    /// Builder-style insert, mostly for tests and fixtures.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// The value of `field`, if present.
    pub fn get(&self, field: &str) -> Option<&StateValue> {
        self.0.get(field)
    }

    /// Mutable access to the value of `field`, if present.
    pub fn get_mut(&mut self, field: &str) -> Option<&mut StateValue> {
        self.0.get_mut(field)
    }

    /// Whether `field` is present with a non-null value.
    ///
    /// A null is how the host records an attribute that was never set, so it
    /// counts as absent.
    pub fn is_set(&self, field: &str) -> bool {
        self.0.get(field).is_some_and(|v| !v.is_null())
    }

    /// The string value of `field`, if present and a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(StateValue::as_str)
    }

    /// The boolean value of `field`, if present and a bool.
    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.0.get(field).and_then(StateValue::as_bool)
    }

    /// Set `field`, returning the previous value.
    pub fn insert(
        &mut self,
        field: impl Into<String>,
        value: impl Into<StateValue>,
    ) -> Option<StateValue> {
        self.0.insert(field.into(), value.into())
    }

    /// Remove `field`, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<StateValue> {
        self.0.remove(field)
    }

    /// The underlying field mapping.
    pub fn fields(&self) -> &BTreeMap<String, StateValue> {
        &self.0
    }

    /// Iterate over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &StateValue)> {
        self.0.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, StateValue>> for RawState {
    fn from(map: BTreeMap<String, StateValue>) -> Self {
        Self(map)
    }
}

impl From<RawState> for StateValue {
    fn from(state: RawState) -> Self {
        StateValue::Map(state.0)
    }
}
