//! Plain result types returned to the host.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::state::RawState;

/// The outcome of upgrading one record to its resource's current version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeResult {
    /// The record, interpretable under the current schema.
    pub state: RawState,
    /// Version the record was stored at.
    pub from_version: u64,
    /// Version the record now conforms to.
    pub to_version: u64,
    /// Source versions of the upgraders that ran, in order.
    pub steps_applied: Vec<u64>,
}

impl UpgradeResult {
    /// A record that was already current.
    pub fn unchanged(state: RawState, version: u64) -> Self {
        Self {
            state,
            from_version: version,
            to_version: version,
            steps_applied: Vec::new(),
        }
    }

    /// Whether any upgrader ran.
    pub fn upgraded(&self) -> bool {
        !self.steps_applied.is_empty()
    }
}

/// Provider metadata returned by [`crate::ProviderService::metadata`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Current schema version of each resource type.
    pub resources: BTreeMap<String, u64>,
}

impl ProviderMetadata {
    /// Resource type names in sorted order.
    pub fn resource_types(&self) -> Vec<String> {
        self.resources.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upgrade_result_unchanged() {
        let result = UpgradeResult::unchanged(RawState::new().with("tgw_name", "tgw-1"), 2);
        assert_eq!(result.from_version, 2);
        assert_eq!(result.to_version, 2);
        assert!(!result.upgraded());
    }

    #[test]
    fn test_metadata_resource_types_sorted() {
        let mut metadata = ProviderMetadata::default();
        metadata.resources.insert("aviatrix_vpn_user".to_string(), 1);
        metadata.resources.insert("aviatrix_aws_tgw".to_string(), 2);
        assert_eq!(
            metadata.resource_types(),
            vec!["aviatrix_aws_tgw".to_string(), "aviatrix_vpn_user".to_string()]
        );
    }
}
