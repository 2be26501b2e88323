//! `aviatrix_aws_tgw`: an AWS Transit Gateway managed by the controller.
//!
//! Version 0 records predate `manage_vpc_attachment`; version 1 records
//! predate `manage_transit_gateway_attachment`. Before either flag existed
//! the resource always managed its attachments in-line, so both default to
//! `true`.

use serde_json::json;

use crate::error::MigrationError;
use crate::policy::{ensure_field, AbsentPolicy};
use crate::registry::{ResourceDefinition, StateUpgrader};
use crate::schema::{Attribute, Block, NestedBlock, Schema};
use crate::state::RawState;

/// Resource type name.
pub const RESOURCE_TYPE: &str = "aviatrix_aws_tgw";

/// Current schema (version 2).
pub fn schema() -> Schema {
    let attached_vpc = Block::new()
        .with_attribute("vpc_region", Attribute::required_string())
        .with_attribute("vpc_account_name", Attribute::required_string())
        .with_attribute("vpc_id", Attribute::required_string())
        .with_attribute("subnets", Attribute::optional_string())
        .with_attribute("route_tables", Attribute::optional_string())
        .with_attribute("customized_routes", Attribute::optional_string())
        .with_attribute(
            "disable_local_route_propagation",
            Attribute::optional_bool().with_default(json!(false)),
        );

    let security_domain = Block::new()
        .with_attribute("security_domain_name", Attribute::required_string())
        .with_attribute("connected_domains", Attribute::optional_string_list())
        .with_attribute(
            "aviatrix_firewall",
            Attribute::optional_bool().with_default(json!(false)),
        )
        .with_attribute(
            "native_egress",
            Attribute::optional_bool().with_default(json!(false)),
        )
        .with_attribute(
            "native_firewall",
            Attribute::optional_bool().with_default(json!(false)),
        )
        .with_block("attached_vpc", NestedBlock::list(attached_vpc));

    Schema::new(2)
        .with_attribute(
            "tgw_name",
            Attribute::required_string()
                .with_force_new()
                .with_description("Name of the AWS TGW."),
        )
        .with_attribute("account_name", Attribute::required_string().with_force_new())
        .with_attribute("region", Attribute::required_string().with_force_new())
        .with_attribute(
            "aws_side_as_number",
            Attribute::required_string().with_force_new(),
        )
        .with_attribute(
            "cloud_type",
            Attribute::optional_int64().with_default(json!(1)),
        )
        .with_block("security_domains", NestedBlock::list(security_domain))
        .with_attribute(
            "attached_aviatrix_transit_gateway",
            Attribute::optional_string_list(),
        )
        .with_attribute(
            "manage_vpc_attachment",
            Attribute::optional_bool()
                .with_default(json!(true))
                .with_description("Manage VPC attachments in-line."),
        )
        .with_attribute(
            "manage_transit_gateway_attachment",
            Attribute::optional_bool()
                .with_default(json!(true))
                .with_description("Manage transit gateway attachments in-line."),
        )
        .with_attribute(
            "enable_multicast",
            Attribute::optional_bool().with_default(json!(false)),
        )
}

fn identity(version: u64) -> Schema {
    Schema::legacy(version)
        .with_attribute("tgw_name", Attribute::required_string())
        .with_attribute("account_name", Attribute::required_string())
        .with_attribute("region", Attribute::required_string())
}

fn schema_v0() -> Schema {
    identity(0)
}

fn schema_v1() -> Schema {
    identity(1).with_attribute("manage_vpc_attachment", Attribute::optional_bool())
}

/// Version 0 → 1.
pub fn upgrade_v0(mut state: RawState) -> Result<RawState, MigrationError> {
    ensure_field(&mut state, "manage_vpc_attachment", AbsentPolicy::DefaultTrue);
    Ok(state)
}

/// Version 1 → 2.
pub fn upgrade_v1(mut state: RawState) -> Result<RawState, MigrationError> {
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
        upgraders: vec![
            StateUpgrader::new(0, schema_v0, upgrade_v0),
            StateUpgrader::new(1, schema_v1, upgrade_v1),
        ],
    }
}
