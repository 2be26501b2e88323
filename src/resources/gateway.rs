//! `aviatrix_gateway`: a standalone (VPN/egress) gateway.

use serde_json::json;

use crate::error::MigrationError;
use crate::policy::split_delimited;
use crate::registry::{ResourceDefinition, StateUpgrader};
use crate::schema::{Attribute, Schema};
use crate::state::RawState;

/// Resource type name.
pub const RESOURCE_TYPE: &str = "aviatrix_gateway";

/// Attributes every gateway-like resource shares.
pub(crate) fn gateway_identity(schema: Schema) -> Schema {
    schema
        .with_attribute(
            "cloud_type",
            Attribute::required_int64().with_description("Type of cloud service provider."),
        )
        .with_attribute("account_name", Attribute::required_string())
        .with_attribute("gw_name", Attribute::required_string().with_force_new())
        .with_attribute("vpc_id", Attribute::required_string().with_force_new())
        .with_attribute("vpc_reg", Attribute::required_string().with_force_new())
        .with_attribute("gw_size", Attribute::required_string())
        .with_attribute("subnet", Attribute::required_string().with_force_new())
}

/// Legacy descriptor shared by gateway-like resources: identity fields only.
pub(crate) fn legacy_identity(version: u64) -> Schema {
    Schema::legacy(version)
        .with_attribute("cloud_type", Attribute::required_int64())
        .with_attribute("account_name", Attribute::required_string())
        .with_attribute("gw_name", Attribute::required_string())
}

/// Current schema (version 1).
pub fn schema() -> Schema {
    gateway_identity(Schema::new(1))
        .with_attribute(
            "single_az_ha",
            Attribute::optional_bool().with_default(json!(false)),
        )
        .with_attribute(
            "enable_vpn_nat",
            Attribute::optional_bool().with_default(json!(true)),
        )
        .with_attribute(
            "enable_monitor_gateway_subnets",
            Attribute::optional_bool().with_default(json!(false)),
        )
        .with_attribute(
            "monitor_exclude_list",
            Attribute::optional_string_set().with_description(
                "A set of monitored instance ids. Only valid when \
                 'enable_monitor_gateway_subnets' = true.",
            ),
        )
}

fn schema_v0() -> Schema {
    legacy_identity(0).with_attribute("monitor_exclude_list", Attribute::optional_string())
}

/// Version 0 → 1: `monitor_exclude_list` went from `"i-1,i-2"` to a set.
pub fn upgrade_v0(mut state: RawState) -> Result<RawState, MigrationError> {
    split_delimited(&mut state, "monitor_exclude_list", ',');
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
