//! `aviatrix_firewall`: stateful firewall policies on a gateway.

use serde_json::json;

use crate::error::MigrationError;
use crate::policy::{ensure_field, AbsentPolicy};
use crate::registry::{ResourceDefinition, StateUpgrader};
use crate::schema::{Attribute, Block, NestedBlock, Schema};
use crate::state::RawState;

/// Resource type name.
pub const RESOURCE_TYPE: &str = "aviatrix_firewall";

/// Current schema (version 1).
pub fn schema() -> Schema {
    let policy = Block::new()
        .with_attribute("src_ip", Attribute::required_string())
        .with_attribute("dst_ip", Attribute::required_string())
        .with_attribute("protocol", Attribute::optional_string().with_default(json!("all")))
        .with_attribute("port", Attribute::required_string())
        .with_attribute("action", Attribute::required_string())
        .with_attribute("log_enabled", Attribute::optional_bool().with_default(json!(false)))
        .with_attribute("description", Attribute::optional_string());

    Schema::new(1)
        .with_attribute(
            "gw_name",
            Attribute::required_string().with_description("The name of gateway."),
        )
        .with_attribute(
            "base_policy",
            Attribute::optional_string().with_default(json!("deny-all")),
        )
        .with_attribute(
            "base_log_enabled",
            Attribute::optional_bool().with_default(json!(false)),
        )
        .with_block("policy", NestedBlock::list(policy))
        .with_attribute(
            "manage_firewall_policies",
            Attribute::optional_bool().with_default(json!(true)),
        )
}

fn schema_v0() -> Schema {
    Schema::legacy(0).with_attribute("gw_name", Attribute::required_string())
}

/// Version 0 → 1: in-line policies were the only option before the flag.
pub fn upgrade_v0(mut state: RawState) -> Result<RawState, MigrationError> {
    ensure_field(&mut state, "manage_firewall_policies", AbsentPolicy::DefaultTrue);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upgrade_v0() {
        let state = upgrade_v0(RawState::new()).unwrap();
        assert_eq!(state, RawState::new().with("manage_firewall_policies", true));
    }

    #[test]
    fn test_upgrade_v0_manage_already_set() {
        let state = upgrade_v0(RawState::new().with("manage_firewall_policies", false)).unwrap();
        assert_eq!(state, RawState::new().with("manage_firewall_policies", false));
    }
}
