//! Checking state records against schemas.
//!
//! [`validate`] reports every mismatch between a record and a schema as a
//! [`Diagnostic`]. [`decode_legacy`] is the stricter gate run before each
//! upgrader: it only looks at required identifying fields, coerces them into
//! their declared types, and refuses records that cannot be interpreted.
//!
//! # Example
//!
//! ```
//! use aviatrix_provider_state::schema::{Attribute, Schema};
//! use aviatrix_provider_state::state::RawState;
//! use aviatrix_provider_state::validation::validate;
//!
//! let schema = Schema::new(1)
//!     .with_attribute("gw_name", Attribute::required_string())
//!     .with_attribute("manage_firewall_policies", Attribute::optional_bool());
//!
//! let state = RawState::new()
//!     .with("gw_name", "gw-east")
//!     .with("manage_firewall_policies", "yes");
//! let diagnostics = validate(&schema, &state);
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("manage_firewall_policies".to_string()));
//! ```

use std::collections::{BTreeMap, HashMap};

use crate::error::MigrationError;
use crate::schema::{Attribute, AttributeType, Block, Diagnostic, NestedBlock, Schema};
use crate::state::{RawState, StateValue};

/// Validate a record against a schema.
///
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed-only attributes are skipped
/// - Attribute types must match exactly (no coercion)
/// - Nested blocks are validated recursively with min/max item constraints
///
/// Fields the schema does not mention are ignored.
pub fn validate(schema: &Schema, state: &RawState) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, state.fields(), "", &mut diagnostics);
    diagnostics
}

/// Like [`validate`], returning `Err` with the diagnostics if any were found.
pub fn validate_result(schema: &Schema, state: &RawState) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, state);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Whether a record is valid against a schema.
pub fn is_valid(schema: &Schema, state: &RawState) -> bool {
    validate(schema, state).is_empty()
}

/// Decode a legacy record against its descriptor before upgrading it.
///
/// Every required attribute of the descriptor's root block must be present
/// and coercible into its declared type; the coerced value replaces the
/// stored one. Optional attributes are left untouched, since their absence or
/// odd shape is the upgrader's business.
pub fn decode_legacy(
    resource_type: &str,
    schema: &Schema,
    mut state: RawState,
) -> Result<RawState, MigrationError> {
    for (name, attr) in schema.block.required_attributes() {
        let value = match state.get(name) {
            None | Some(StateValue::Null) => {
                return Err(MigrationError::missing(resource_type, name));
            }
            Some(value) => value,
        };
        let coerced = value.coerce(&attr.attr_type).ok_or_else(|| {
            MigrationError::invalid(
                resource_type,
                name,
                format!(
                    "expected {}, got {}",
                    attr.attr_type.name(),
                    value.type_name()
                ),
            )
        })?;
        state.insert(name, coerced);
    }
    Ok(state)
}

fn validate_block(
    block: &Block,
    fields: &BTreeMap<String, StateValue>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (name, attr) in &block.attributes {
        let attr_path = join_path(path, name);
        validate_attribute(attr, fields.get(name), &attr_path, diagnostics);
    }

    for (name, nested) in &block.blocks {
        let block_path = join_path(path, name);
        validate_nested_block(nested, fields.get(name), &block_path, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&StateValue>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.computed && !attr.flags.optional && !attr.flags.required {
        return;
    }

    match value {
        None | Some(StateValue::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        }
        Some(v) => validate_attribute_type(&attr.attr_type, v, path, diagnostics),
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &StateValue,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match (attr_type, value) {
        (AttributeType::Dynamic, _) => {}
        (AttributeType::String, StateValue::String(_)) => {}
        (AttributeType::Bool, StateValue::Bool(_)) => {}
        (AttributeType::Float64, StateValue::Number(_)) => {}
        (AttributeType::Int64, StateValue::Number(n)) if n.is_i64() || n.is_u64() => {}
        (AttributeType::List(elem) | AttributeType::Set(elem), StateValue::List(items)) => {
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{}.{}", path, i);
                validate_attribute_type(elem, item, &item_path, diagnostics);
            }
        }
        (AttributeType::Map(elem), StateValue::Map(entries)) => {
            for (key, item) in entries {
                let item_path = format!("{}.{}", path, key);
                validate_attribute_type(elem, item, &item_path, diagnostics);
            }
        }
        (AttributeType::Object(attrs), StateValue::Map(entries)) => {
            validate_object_type(attrs, entries, path, diagnostics);
        }
        (expected, got) => diagnostics.push(type_error(path, expected.name(), got)),
    }
}

fn validate_object_type(
    attrs: &HashMap<String, AttributeType>,
    entries: &BTreeMap<String, StateValue>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (name, attr_type) in attrs {
        if let Some(value) = entries.get(name) {
            validate_attribute_type(attr_type, value, &join_path(path, name), diagnostics);
        }
    }
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&StateValue>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // Nested blocks are persisted as a list of mappings.
    let items = match value {
        None | Some(StateValue::Null) => &[][..],
        Some(StateValue::List(items)) => items.as_slice(),
        Some(other) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected list for block '{}'", path))
                    .with_detail(format!("Got {}", other.type_name()))
                    .with_attribute(path),
            );
            return;
        }
    };

    let len = items.len() as u32;
    if len < nested.min_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' requires at least {} item(s), got {}",
                path, nested.min_items, len
            ))
            .with_attribute(path),
        );
    }
    if nested.max_items > 0 && len > nested.max_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' allows at most {} item(s), got {}",
                path, nested.max_items, len
            ))
            .with_attribute(path),
        );
    }

    for (i, item) in items.iter().enumerate() {
        let item_path = format!("{}.{}", path, i);
        match item {
            StateValue::Map(fields) => {
                validate_block(&nested.block, fields, &item_path, diagnostics)
            }
            other => diagnostics.push(
                Diagnostic::error(format!("Expected object for block '{}'", item_path))
                    .with_detail(format!("Got {}", other.type_name()))
                    .with_attribute(item_path),
            ),
        }
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn type_error(path: &str, expected: &str, got: &StateValue) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, got.type_name()))
        .with_attribute(path)
}
