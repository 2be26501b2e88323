//! Field policies shared by the per-resource upgraders.
//!
//! A record written before a field existed simply lacks it. Each upgrader
//! decides what that absence meant at the time and fills it in accordingly;
//! nothing here ever fails.

use tracing::trace;

use crate::state::{RawState, StateValue};

/// What to do when a field is missing from a legacy record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsentPolicy {
    /// The feature was implicitly on for every existing resource.
    DefaultTrue,
    /// The feature was implicitly off for every existing resource.
    DefaultFalse,
    /// The collection was implicitly empty.
    DefaultEmptyList,
    /// Remove `companion`, which is meaningless without the missing field.
    Drop {
        /// The dependent field to remove.
        companion: &'static str,
    },
}

impl AbsentPolicy {
    fn default_value(self) -> Option<StateValue> {
        match self {
            Self::DefaultTrue => Some(StateValue::Bool(true)),
            Self::DefaultFalse => Some(StateValue::Bool(false)),
            Self::DefaultEmptyList => Some(StateValue::empty_list()),
            Self::Drop { .. } => None,
        }
    }

    fn apply(self, state: &mut RawState, field: &str) {
        match self {
            Self::Drop { companion } => {
                if state.remove(companion).is_some() {
                    trace!(field, companion, "dropped companion of absent field");
                }
            }
            _ => {
                if let Some(value) = self.default_value() {
                    trace!(field, ?value, "defaulted absent field");
                    state.insert(field, value);
                }
            }
        }
    }
}

/// Apply `policy` to `field` if it is absent or null.
///
/// Present values are left exactly as they are.
pub fn ensure_field(state: &mut RawState, field: &str, policy: AbsentPolicy) {
    if !state.is_set(field) {
        policy.apply(state, field);
    }
}

/// Reshape a delimited string field into an ordered list of strings.
///
/// Pieces keep their order and are not trimmed. An empty string means the
/// list was never set and becomes an empty list. A value that is already a
/// list of strings is kept. Any other value is treated as unset.
pub fn split_delimited(state: &mut RawState, field: &str, delimiter: char) {
    let reshaped = match state.get(field) {
        Some(value) => reshape_delimited(value, delimiter),
        None => StateValue::empty_list(),
    };
    state.insert(field, reshaped);
}

/// The list form of a single delimited value; see [`split_delimited`].
pub fn reshape_delimited(value: &StateValue, delimiter: char) -> StateValue {
    match value {
        StateValue::String(s) if s.is_empty() => StateValue::empty_list(),
        StateValue::String(s) => StateValue::string_list(s.split(delimiter)),
        StateValue::List(items) if items.iter().all(|i| i.as_str().is_some()) => {
            value.clone()
        }
        other => {
            trace!(
                found = other.type_name(),
                "delimited field has unexpected type, treating as unset"
            );
            StateValue::empty_list()
        }
    }
}

/// Move the value of `from` to `to`.
///
/// If `to` is already set it wins and the old value is discarded. `from` is
/// always removed.
pub fn rename_field(state: &mut RawState, from: &str, to: &str) {
    let Some(value) = state.remove(from) else {
        return;
    };
    if !state.is_set(to) && !value.is_null() {
        state.insert(to, value);
    }
}
