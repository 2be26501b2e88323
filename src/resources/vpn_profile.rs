//! `aviatrix_vpn_profile`.

use serde_json::json;

use crate::error::MigrationError;
use crate::policy::{ensure_field, AbsentPolicy};
use crate::registry::{ResourceDefinition, StateUpgrader};
use crate::schema::{Attribute, Block, NestedBlock, Schema};
use crate::state::RawState;

/// Resource type name.
pub const RESOURCE_TYPE: &str = "aviatrix_vpn_profile";

/// Current schema (version 1).
pub fn schema() -> Schema {
    let policy = Block::new()
        .with_attribute("action", Attribute::optional_string())
        .with_attribute("proto", Attribute::optional_string())
        .with_attribute("port", Attribute::optional_string())
        .with_attribute("target", Attribute::optional_string());

    Schema::new(1)
        .with_attribute(
            "name",
            Attribute::required_string().with_description("name for the VPN profile."),
        )
        .with_attribute("base_rule", Attribute::optional_string())
        .with_attribute("users", Attribute::optional_string_list())
        .with_block("policy", NestedBlock::list(policy))
        .with_attribute(
            "manage_user_attachment",
            Attribute::optional_bool().with_default(json!(true)),
        )
}

fn schema_v0() -> Schema {
    Schema::legacy(0).with_attribute("name", Attribute::required_string())
}

/// Version 0 → 1: profiles always owned their user list before the flag.
pub fn upgrade_v0(mut state: RawState) -> Result<RawState, MigrationError> {
    ensure_field(&mut state, "manage_user_attachment", AbsentPolicy::DefaultTrue);
    Ok(state)
}

/// Registration entry.
pub fn definition() -> ResourceDefinition {
    ResourceDefinition {
        name: RESOURCE_TYPE,
        schema: schema(),
        upgraders: vec![StateUpgrader::new(0, schema_v0, upgrade_v0)],
    }
}
