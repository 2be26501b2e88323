//! Per-resource schemas and state upgraders.
//!
//! Each submodule owns one resource type: its current schema, the legacy
//! descriptors for every older version, and the single-step upgraders
//! between them.

pub mod aws_tgw;
pub mod controller_config;
pub mod firenet;
pub mod firewall;
pub mod fqdn;
pub mod gateway;
pub mod spoke_gateway;
pub mod transit_gateway;
pub mod vpn_profile;
pub mod vpn_user;

use crate::error::MigrationError;
use crate::registry::{ResourceDefinition, UpgradeRegistry};

/// Definitions of every resource type with versioned state.
pub fn definitions() -> Vec<ResourceDefinition> {
    vec![
        aws_tgw::definition(),
        controller_config::definition(),
        firenet::definition(),
        firewall::definition(),
        fqdn::definition(),
        gateway::definition(),
        spoke_gateway::definition(),
        transit_gateway::definition(),
        vpn_profile::definition(),
        vpn_user::definition(),
    ]
}

/// Build and verify the provider's upgrade table.
pub fn registry() -> Result<UpgradeRegistry, MigrationError> {
    let mut registry = UpgradeRegistry::new();
    for definition in definitions() {
        registry.register(definition)?;
    }
    registry.verify()?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::reshape_delimited;
    use crate::state::{RawState, StateValue};
    use crate::validation::validate;
    use serde_json::json;

    #[test]
    fn test_registry_is_complete() {
        let registry = registry().unwrap();
        assert_eq!(registry.resource_types().count(), definitions().len());
        assert_eq!(registry.current_version(aws_tgw::RESOURCE_TYPE), Some(2));
        assert_eq!(registry.current_version(fqdn::RESOURCE_TYPE), Some(2));
        assert_eq!(registry.current_version(firenet::RESOURCE_TYPE), Some(1));
    }

    #[test]
    fn test_aws_tgw_full_chain() {
        let registry = registry().unwrap();
        let state = RawState::new()
            .with("tgw_name", "tgw-1")
            .with("account_name", "aws-prod")
            .with("region", "us-east-1")
            .with("aws_side_as_number", "64512");

        let result = registry.upgrade(aws_tgw::RESOURCE_TYPE, 0, state).unwrap();
        assert_eq!(result.steps_applied, vec![0, 1]);
        assert_eq!(result.state.get_bool("manage_vpc_attachment"), Some(true));
        assert_eq!(
            result.state.get_bool("manage_transit_gateway_attachment"),
            Some(true)
        );
        assert!(validate(&aws_tgw::schema(), &result.state).is_empty());
    }

    #[test]
    fn test_aws_tgw_missing_identity_fails_whole_chain() {
        let registry = registry().unwrap();
        let state = RawState::new()
            .with("account_name", "aws-prod")
            .with("region", "us-east-1");

        let err = registry
            .upgrade(aws_tgw::RESOURCE_TYPE, 0, state)
            .unwrap_err();
        assert_eq!(err.field(), Some("tgw_name"));
    }

    #[test]
    fn test_gateway_chain_coerces_cloud_type() {
        let registry = registry().unwrap();
        let state = RawState::from_json(json!({
            "cloud_type": "1",
            "account_name": "aws-prod",
            "gw_name": "gw-east",
            "vpc_id": "vpc-0abc",
            "vpc_reg": "us-east-1",
            "gw_size": "t3.small",
            "subnet": "10.0.0.0/24",
            "monitor_exclude_list": "i-111,i-222",
        }))
        .unwrap();

        let result = registry.upgrade(gateway::RESOURCE_TYPE, 0, state).unwrap();
        assert_eq!(result.state.get("cloud_type"), Some(&StateValue::from(1_i64)));
        assert_eq!(
            result.state.get("monitor_exclude_list"),
            Some(&StateValue::string_list(["i-111", "i-222"]))
        );
        assert!(validate(&gateway::schema(), &result.state).is_empty());
    }

    #[test]
    fn test_fqdn_full_chain() {
        let registry = registry().unwrap();
        let state = RawState::from_json(json!({
            "fqdn_tag": "tag-1",
            "fqdn_mode": "white",
            "gw_filter_tag_list": [
                {"gw_name": "gw-a", "source_ip_list": "10.0.0.1,10.0.0.2"},
            ],
        }))
        .unwrap();

        let result = registry.upgrade(fqdn::RESOURCE_TYPE, 0, state).unwrap();
        assert_eq!(
            result.state.into_json(),
            json!({
                "fqdn_tag": "tag-1",
                "fqdn_mode": "white",
                "manage_domain_names": true,
                "gw_filter_tag_list": [
                    {"gw_name": "gw-a", "source_ip_list": ["10.0.0.1", "10.0.0.2"]},
                ],
            })
        );
    }

    #[test]
    fn test_manage_user_attachment_polarity_differs() {
        let registry = registry().unwrap();

        let user = registry
            .upgrade(
                vpn_user::RESOURCE_TYPE,
                0,
                RawState::new().with("user_name", "alice"),
            )
            .unwrap();
        let profile = registry
            .upgrade(
                vpn_profile::RESOURCE_TYPE,
                0,
                RawState::new().with("name", "dev"),
            )
            .unwrap();

        assert_eq!(user.state.get_bool("manage_user_attachment"), Some(false));
        assert_eq!(profile.state.get_bool("manage_user_attachment"), Some(true));
    }

    #[test]
    fn test_fqdn_malformed_gateway_list_falls_back() {
        let registry = registry().unwrap();

        let result = registry
            .upgrade(
                fqdn::RESOURCE_TYPE,
                1,
                RawState::from_json(json!({"fqdn_tag": "tag-1", "gw_filter_tag_list": "gw-a"}))
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(
            result.state.get("gw_filter_tag_list"),
            Some(&StateValue::empty_list())
        );

        let result = registry
            .upgrade(
                fqdn::RESOURCE_TYPE,
                1,
                RawState::from_json(json!({
                    "fqdn_tag": "tag-1",
                    "gw_filter_tag_list": [{"gw_name": "gw-a", "source_ip_list": "10.0.0.1"}, null],
                }))
                .unwrap(),
            )
            .unwrap();
        assert_eq!(
            result.state.into_json()["gw_filter_tag_list"],
            json!([{"gw_name": "gw-a", "source_ip_list": ["10.0.0.1"]}])
        );
    }

    #[test]
    fn test_delimited_reshape_preserves_count_and_order() {
        let cases = [
            "i-1",
            "i-1,i-2,i-3",
            "i-3,i-1,i-2",
            "i-1,",
            ",i-1",
            ",,",
            "i-1,i-1",
            " i-1 , i-2",
        ];

        for input in cases {
            let expected: Vec<&str> = input.split(',').collect();
            let reshaped = reshape_delimited(&StateValue::string(input), ',');
            let pieces: Vec<&str> = reshaped
                .as_list()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap())
                .collect();
            assert_eq!(pieces.len(), input.split(',').count(), "count for {:?}", input);
            assert_eq!(pieces, expected, "order for {:?}", input);

            let again = reshape_delimited(&StateValue::string(input), ',');
            assert_eq!(again, reshaped, "repeatable for {:?}", input);
        }
    }

    #[test]
    fn test_upgraders_are_pure() {
        let registry = registry().unwrap();
        let state = RawState::from_json(json!({
            "cloud_type": 1,
            "account_name": "aws-prod",
            "gw_name": "spoke-1",
            "monitor_exclude_list": "i-1,i-2,i-3",
        }))
        .unwrap();

        let first = registry
            .upgrade(spoke_gateway::RESOURCE_TYPE, 0, state.clone())
            .unwrap();
        let second = registry
            .upgrade(spoke_gateway::RESOURCE_TYPE, 0, state)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_current_schemas_accept_their_defaults() {
        for definition in definitions() {
            for (name, attr) in &definition.schema.block.attributes {
                if let Some(default) = &attr.default {
                    let state = RawState::new().with(name.as_str(), StateValue::from(default.clone()));
                    let diagnostics = validate(&definition.schema, &state)
                        .into_iter()
                        .filter(|d| d.attribute.as_deref() == Some(name.as_str()))
                        .count();
                    assert_eq!(diagnostics, 0, "{}.{} default mismatch", definition.name, name);
                }
            }
        }
    }
}
