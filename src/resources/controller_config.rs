//! `aviatrix_controller_config`: controller-wide settings.

use serde_json::json;

use crate::error::MigrationError;
use crate::policy::{ensure_field, AbsentPolicy};
use crate::registry::{ResourceDefinition, StateUpgrader};
use crate::schema::{Attribute, Schema};
use crate::state::RawState;

/// Resource type name.
pub const RESOURCE_TYPE: &str = "aviatrix_controller_config";

/// Current schema (version 1).
pub fn schema() -> Schema {
    Schema::new(1)
        .with_attribute(
            "sg_management_account_name",
            Attribute::optional_string().with_description("Cloud account name of user."),
        )
        .with_attribute(
            "security_group_management",
            Attribute::optional_bool().with_default(json!(false)),
        )
        .with_attribute(
            "http_access",
            Attribute::optional_bool().with_default(json!(false)),
        )
        .with_attribute(
            "fqdn_exception_rule",
            Attribute::optional_bool().with_default(json!(true)),
        )
        .with_attribute("target_version", Attribute::optional_string())
        .with_attribute("version", Attribute::computed_string())
}

fn schema_v0() -> Schema {
    Schema::legacy(0)
}

/// Version 0 → 1.
///
/// Security group management is keyed by its account; a record without the
/// account cannot express the setting, so the flag is dropped and re-read
/// from the controller on the next refresh.
pub fn upgrade_v0(mut state: RawState) -> Result<RawState, MigrationError> {
    ensure_field(
        &mut state,
        "sg_management_account_name",
        AbsentPolicy::Drop {
            companion: "security_group_management",
        },
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
