//! `aviatrix_vpn_user`.
//!
//! Note the polarity of `manage_user_attachment`: before the flag existed,
//! VPN users never managed their profile attachments (profiles attached
//! users), so absent means `false` here. `aviatrix_vpn_profile` defaults the
//! field of the same name to `true`.

use serde_json::json;

use crate::error::MigrationError;
use crate::policy::{ensure_field, AbsentPolicy};
use crate::registry::{ResourceDefinition, StateUpgrader};
use crate::schema::{Attribute, Schema};
use crate::state::RawState;

/// Resource type name.
pub const RESOURCE_TYPE: &str = "aviatrix_vpn_user";

/// Current schema (version 1).
pub fn schema() -> Schema {
    Schema::new(1)
        .with_attribute("vpc_id", Attribute::optional_string().with_force_new())
        .with_attribute("gw_name", Attribute::optional_string().with_force_new())
        .with_attribute("dns_name", Attribute::optional_string().with_force_new())
        .with_attribute("user_name", Attribute::required_string().with_force_new())
        .with_attribute("user_email", Attribute::optional_string())
        .with_attribute("saml_endpoint", Attribute::optional_string())
        .with_attribute("profiles", Attribute::optional_string_list())
        .with_attribute(
            "manage_user_attachment",
            Attribute::optional_bool().with_default(json!(false)),
        )
}

fn schema_v0() -> Schema {
    Schema::legacy(0).with_attribute("user_name", Attribute::required_string())
}

/// Version 0 → 1.
pub fn upgrade_v0(mut state: RawState) -> Result<RawState, MigrationError> {
    ensure_field(&mut state, "manage_user_attachment", AbsentPolicy::DefaultFalse);
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
