//! `aviatrix_transit_gateway`.
//!
//! Version 0 stored the monitor exclusions as a comma separated string and
//! called the FireNet toggle `enable_firenet_interfaces`.

use serde_json::json;

use crate::error::MigrationError;
use crate::policy::{rename_field, split_delimited};
use crate::registry::{ResourceDefinition, StateUpgrader};
use crate::resources::gateway::{gateway_identity, legacy_identity};
use crate::schema::{Attribute, Schema};
use crate::state::RawState;

/// Resource type name.
pub const RESOURCE_TYPE: &str = "aviatrix_transit_gateway";

/// Current schema (version 1).
pub fn schema() -> Schema {
    gateway_identity(Schema::new(1))
        .with_attribute(
            "enable_firenet",
            Attribute::optional_bool()
                .with_default(json!(false))
                .with_description("Enable FireNet interfaces."),
        )
        .with_attribute(
            "enable_transit_firenet",
            Attribute::optional_bool().with_default(json!(false)),
        )
        .with_attribute(
            "connected_transit",
            Attribute::optional_bool().with_default(json!(false)),
        )
        .with_attribute(
            "enable_monitor_gateway_subnets",
            Attribute::optional_bool().with_default(json!(false)),
        )
        .with_attribute("monitor_exclude_list", Attribute::optional_string_set())
}

fn schema_v0() -> Schema {
    legacy_identity(0)
        .with_attribute("enable_firenet_interfaces", Attribute::optional_bool())
        .with_attribute("monitor_exclude_list", Attribute::optional_string())
}

/// Version 0 → 1.
pub fn upgrade_v0(mut state: RawState) -> Result<RawState, MigrationError> {
    rename_field(&mut state, "enable_firenet_interfaces", "enable_firenet");
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
