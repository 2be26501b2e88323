//! `aviatrix_fqdn`: an FQDN filter tag and the gateways it is attached to.
//!
//! Two historical changes:
//!
//! - version 1 introduced `manage_domain_names`; older tags always managed
//!   their domain rules in-line, so it defaults to `true`.
//! - version 2 turned each `gw_filter_tag_list[*].source_ip_list` from a
//!   comma separated string into a set of strings.

use std::collections::BTreeMap;

use serde_json::json;
use tracing::trace;

use crate::error::MigrationError;
use crate::policy::{ensure_field, reshape_delimited, AbsentPolicy};
use crate::registry::{ResourceDefinition, StateUpgrader};
use crate::schema::{Attribute, Block, NestedBlock, Schema};
use crate::state::{RawState, StateValue};

/// Resource type name.
pub const RESOURCE_TYPE: &str = "aviatrix_fqdn";

const GW_FILTER_TAG_LIST: &str = "gw_filter_tag_list";
const SOURCE_IP_LIST: &str = "source_ip_list";

/// Current schema (version 2).
pub fn schema() -> Schema {
    let gw_filter_tag = Block::new()
        .with_attribute(
            "gw_name",
            Attribute::required_string()
                .with_description("Name of the gateway to attach to the specific tag."),
        )
        .with_attribute(SOURCE_IP_LIST, Attribute::optional_string_set());

    let domain_name = Block::new()
        .with_attribute("fqdn", Attribute::required_string())
        .with_attribute("proto", Attribute::required_string())
        .with_attribute("port", Attribute::required_string())
        .with_attribute(
            "action",
            Attribute::optional_string().with_default(json!("Base Policy")),
        );

    Schema::new(2)
        .with_attribute(
            "fqdn_tag",
            Attribute::required_string().with_description("FQDN Filter Tag Name."),
        )
        .with_attribute("fqdn_enabled", Attribute::optional_bool())
        .with_attribute("fqdn_mode", Attribute::optional_string())
        .with_block(GW_FILTER_TAG_LIST, NestedBlock::list(gw_filter_tag))
        .with_block("domain_names", NestedBlock::list(domain_name))
        .with_attribute(
            "manage_domain_names",
            Attribute::optional_bool().with_default(json!(true)),
        )
}

fn schema_v0() -> Schema {
    Schema::legacy(0).with_attribute("fqdn_tag", Attribute::required_string())
}

fn schema_v1() -> Schema {
    Schema::legacy(1)
        .with_attribute("fqdn_tag", Attribute::required_string())
        .with_block(
            GW_FILTER_TAG_LIST,
            NestedBlock::list(
                Block::new()
                    .with_attribute("gw_name", Attribute::required_string())
                    .with_attribute(SOURCE_IP_LIST, Attribute::optional_string()),
            ),
        )
}

/// Version 0 → 1.
pub fn upgrade_v0(mut state: RawState) -> Result<RawState, MigrationError> {
    ensure_field(&mut state, "manage_domain_names", AbsentPolicy::DefaultTrue);
    Ok(state)
}

/// Version 1 → 2.
///
/// A `gw_filter_tag_list` that is not a list is treated as unset and null
/// entries are skipped. Every remaining entry must be a mapping naming its
/// gateway; one that is not cannot be attributed to anything and fails the
/// upgrade.
pub fn upgrade_v1(mut state: RawState) -> Result<RawState, MigrationError> {
    let entries = match state.get(GW_FILTER_TAG_LIST) {
        None | Some(StateValue::Null) => return Ok(state),
        Some(StateValue::List(entries)) => entries,
        Some(other) => {
            trace!(
                found = other.type_name(),
                "gw_filter_tag_list has unexpected type, treating as unset"
            );
            state.insert(GW_FILTER_TAG_LIST, StateValue::empty_list());
            return Ok(state);
        }
    };

    let entries = entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| !entry.is_null())
        .map(|(i, entry)| upgrade_gw_filter_tag(i, entry))
        .collect::<Result<Vec<_>, _>>()?;

    state.insert(GW_FILTER_TAG_LIST, StateValue::List(entries));
    Ok(state)
}

fn upgrade_gw_filter_tag(index: usize, entry: &StateValue) -> Result<StateValue, MigrationError> {
    let path = format!("{}.{}", GW_FILTER_TAG_LIST, index);
    let mut fields: BTreeMap<String, StateValue> = match entry {
        StateValue::Map(fields) => fields.clone(),
        other => {
            return Err(MigrationError::invalid(
                RESOURCE_TYPE,
                path,
                format!("expected a gateway mapping, got {}", other.type_name()),
            ))
        }
    };

    match fields.get("gw_name") {
        Some(StateValue::String(name)) if !name.is_empty() => {}
        _ => return Err(MigrationError::missing(RESOURCE_TYPE, format!("{}.gw_name", path))),
    }

    let source_ips = fields
        .get(SOURCE_IP_LIST)
        .map(|value| reshape_delimited(value, ','))
        .unwrap_or_else(StateValue::empty_list);
    fields.insert(SOURCE_IP_LIST.to_string(), source_ips);

    Ok(StateValue::Map(fields))
}

/// Registration entry.
pub fn definition() -> ResourceDefinition {
    ResourceDefinition {
        name: RESOURCE_TYPE,
        schema: schema(),
        upgraders: vec![
            StateUpgrader::new(0, schema_v0, upgrade_v0),
            StateUpgrader::new(1, schema_v1, upgrade_v1),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(value: serde_json::Value) -> RawState {
        RawState::from_json(value).unwrap()
    }

    #[test]
    fn test_upgrade_v0_defaults_manage_domain_names() {
        let upgraded = upgrade_v0(state(json!({"fqdn_tag": "tag-1"}))).unwrap();
        assert_eq!(upgraded.get_bool("manage_domain_names"), Some(true));
    }

    #[test]
    fn test_upgrade_v1_splits_source_ips() {
        let upgraded = upgrade_v1(state(json!({
            "fqdn_tag": "tag-1",
            "gw_filter_tag_list": [
                {"gw_name": "gw-a", "source_ip_list": "10.0.0.1,10.0.0.2"},
                {"gw_name": "gw-b"},
                {"gw_name": "gw-c", "source_ip_list": 7},
            ],
        })))
        .unwrap();

        assert_eq!(
            upgraded.into_json(),
            json!({
                "fqdn_tag": "tag-1",
                "gw_filter_tag_list": [
                    {"gw_name": "gw-a", "source_ip_list": ["10.0.0.1", "10.0.0.2"]},
                    {"gw_name": "gw-b", "source_ip_list": []},
                    {"gw_name": "gw-c", "source_ip_list": []},
                ],
            })
        );
    }

    #[test]
    fn test_upgrade_v1_without_gateways() {
        let input = state(json!({"fqdn_tag": "tag-1"}));
        assert_eq!(upgrade_v1(input.clone()).unwrap(), input);
    }

    #[test]
    fn test_upgrade_v1_rejects_unnamed_gateway() {
        let err = upgrade_v1(state(json!({
            "fqdn_tag": "tag-1",
            "gw_filter_tag_list": [{"gw_name": "gw-a"}, {"source_ip_list": "10.0.0.1"}],
        })))
        .unwrap_err();
        assert_eq!(err.field(), Some("gw_filter_tag_list.1.gw_name"));
    }

    #[test]
    fn test_upgrade_v1_non_list_treated_as_unset() {
        let upgraded = upgrade_v1(state(json!({
            "fqdn_tag": "tag-1",
            "gw_filter_tag_list": "gw-a",
        })))
        .unwrap();
        assert_eq!(
            upgraded.into_json(),
            json!({"fqdn_tag": "tag-1", "gw_filter_tag_list": []})
        );
    }

    #[test]
    fn test_upgrade_v1_skips_null_entries() {
        let upgraded = upgrade_v1(state(json!({
            "fqdn_tag": "tag-1",
            "gw_filter_tag_list": [{"gw_name": "gw-a"}, null],
        })))
        .unwrap();
        assert_eq!(
            upgraded.into_json(),
            json!({
                "fqdn_tag": "tag-1",
                "gw_filter_tag_list": [{"gw_name": "gw-a", "source_ip_list": []}],
            })
        );
    }

    #[test]
    fn test_upgrade_v1_keeps_null_list() {
        let input = state(json!({"fqdn_tag": "tag-1", "gw_filter_tag_list": null}));
        let upgraded = upgrade_v1(input.clone()).unwrap();
        assert_eq!(upgraded, input);
        assert!(upgraded.get(GW_FILTER_TAG_LIST).is_some());
    }

    #[test]
    fn test_upgrade_v1_rejects_non_mapping_entry() {
        let err = upgrade_v1(state(json!({
            "fqdn_tag": "tag-1",
            "gw_filter_tag_list": ["gw-a"],
        })))
        .unwrap_err();
        assert_eq!(err.field(), Some("gw_filter_tag_list.0"));
    }
}
