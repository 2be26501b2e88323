//! `aviatrix_firenet`: FireNet settings of a transit VPC.

use serde_json::json;

use crate::error::MigrationError;
use crate::policy::{ensure_field, AbsentPolicy};
use crate::registry::{ResourceDefinition, StateUpgrader};
use crate::schema::{Attribute, Schema};
use crate::state::RawState;

/// Resource type name.
pub const RESOURCE_TYPE: &str = "aviatrix_firenet";

/// Current schema (version 1).
pub fn schema() -> Schema {
    Schema::new(1)
        .with_attribute(
            "vpc_id",
            Attribute::required_string().with_description("VPC ID."),
        )
        .with_attribute(
            "inspection_enabled",
            Attribute::optional_bool().with_default(json!(true)),
        )
        .with_attribute(
            "egress_enabled",
            Attribute::optional_bool().with_default(json!(false)),
        )
        .with_attribute(
            "hashing_algorithm",
            Attribute::optional_string().with_default(json!("5-Tuple")),
        )
        .with_attribute(
            "keep_alive_via_lan_interface_enabled",
            Attribute::optional_bool().with_default(json!(false)),
        )
        .with_attribute("egress_static_cidrs", Attribute::optional_string_set())
        .with_attribute(
            "east_west_inspection_excluded_cidrs",
            Attribute::optional_string_set(),
        )
        .with_attribute(
            "manage_firewall_instance_association",
            Attribute::optional_bool()
                .with_default(json!(true))
                .with_description(
                    "Enable to manage firewall instance associations in-line. If false, \
                     associations must be managed with aviatrix_firewall_instance_association.",
                ),
        )
}

fn schema_v0() -> Schema {
    Schema::legacy(0).with_attribute("vpc_id", Attribute::required_string())
}

/// Version 0 → 1.
///
/// Every FireNet created before the flag existed managed its firewall
/// instance associations in-line.
pub fn upgrade_v0(mut state: RawState) -> Result<RawState, MigrationError> {
    ensure_field(
        &mut state,
        "manage_firewall_instance_association",
        AbsentPolicy::DefaultTrue,
    );
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
