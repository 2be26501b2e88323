//! `aviatrix_spoke_gateway`.

use serde_json::json;

use crate::error::MigrationError;
use crate::policy::{ensure_field, split_delimited, AbsentPolicy};
use crate::registry::{ResourceDefinition, StateUpgrader};
use crate::resources::gateway::{gateway_identity, legacy_identity};
use crate::schema::{Attribute, Schema};
use crate::state::RawState;

/// Resource type name.
pub const RESOURCE_TYPE: &str = "aviatrix_spoke_gateway";

/// Current schema (version 1).
pub fn schema() -> Schema {
    gateway_identity(Schema::new(1))
        .with_attribute(
            "single_ip_snat",
            Attribute::optional_bool().with_default(json!(false)),
        )
        .with_attribute("transit_gw", Attribute::optional_string())
        .with_attribute(
            "manage_transit_gateway_attachment",
            Attribute::optional_bool()
                .with_default(json!(true))
                .with_description(
                    "Enable to manage spoke-to-transit attachments in-line. If false, \
                     attachments must be managed with aviatrix_spoke_transit_attachment.",
                ),
        )
        .with_attribute(
            "enable_monitor_gateway_subnets",
            Attribute::optional_bool().with_default(json!(false)),
        )
        .with_attribute("monitor_exclude_list", Attribute::optional_string_set())
}

fn schema_v0() -> Schema {
    legacy_identity(0)
        .with_attribute("transit_gw", Attribute::optional_string())
        .with_attribute("monitor_exclude_list", Attribute::optional_string())
}

/// Version 0 → 1.
pub fn upgrade_v0(mut state: RawState) -> Result<RawState, MigrationError> {
    split_delimited(&mut state, "monitor_exclude_list", ',');
    ensure_field(
        &mut state,
        "manage_transit_gateway_attachment",
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateValue;

    #[test]
    fn test_upgrade_v0() {
        let state = upgrade_v0(
            RawState::new()
                .with("gw_name", "spoke-1")
                .with("transit_gw", "transit-1")
                .with("monitor_exclude_list", "i-111,i-222"),
        )
        .unwrap();

        assert_eq!(state.get_str("transit_gw"), Some("transit-1"));
        assert_eq!(state.get_bool("manage_transit_gateway_attachment"), Some(true));
        assert_eq!(
            state.get("monitor_exclude_list"),
            Some(&StateValue::string_list(["i-111", "i-222"]))
        );
    }

    #[test]
    fn test_upgrade_v0_keeps_disabled_attachment() {
        let state = upgrade_v0(
            RawState::new().with("manage_transit_gateway_attachment", false),
        )
        .unwrap();
        assert_eq!(state.get_bool("manage_transit_gateway_attachment"), Some(false));
    }
}
