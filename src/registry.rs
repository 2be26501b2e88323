//! The upgrader table and version chaining.
//!
//! Each resource type registers its current [`Schema`] and one
//! [`StateUpgrader`] per legacy version. An upgrader only ever moves a record
//! from version `v` to `v + 1`; [`UpgradeRegistry::upgrade`] composes them by
//! repeated application until the record reaches the current version.
//!
//! The table is built once at startup (see [`crate::resources::registry`])
//! and is immutable afterwards, so it can be shared freely across threads.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, instrument};

use crate::error::MigrationError;
use crate::schema::{ProviderSchema, Schema};
use crate::state::RawState;
use crate::types::UpgradeResult;
use crate::validation::decode_legacy;

/// A single-step migrator: a record at version `v` in, version `v + 1` out.
///
/// Upgraders are pure functions. They must not perform I/O and must not keep
/// state between calls.
pub type UpgradeFn = fn(RawState) -> Result<RawState, MigrationError>;

/// Upgrades records stored at `version` to `version + 1`.
#[derive(Debug, Clone, Copy)]
pub struct StateUpgrader {
    /// The source version this upgrader accepts.
    pub version: u64,
    /// Descriptor used to decode records stored at `version`.
    pub legacy_schema: fn() -> Schema,
    /// The migrator itself.
    pub upgrade: UpgradeFn,
}

impl StateUpgrader {
    /// Create an upgrader for records stored at `version`.
    pub fn new(version: u64, legacy_schema: fn() -> Schema, upgrade: UpgradeFn) -> Self {
        Self {
            version,
            legacy_schema,
            upgrade,
        }
    }

    /// Decode `state` against the legacy descriptor, then migrate it.
    pub fn apply(&self, resource_type: &str, state: RawState) -> Result<RawState, MigrationError> {
        let decoded = decode_legacy(resource_type, &(self.legacy_schema)(), state)?;
        (self.upgrade)(decoded)
    }
}

/// A resource type's current schema together with its upgraders.
#[derive(Debug, Clone)]
pub struct ResourceDefinition {
    /// Resource type name, e.g. `aviatrix_firenet`.
    pub name: &'static str,
    /// The current schema; its version is the chain's terminal version.
    pub schema: Schema,
    /// One upgrader per legacy version.
    pub upgraders: Vec<StateUpgrader>,
}

/// Table mapping (resource type, source version) to upgraders.
#[derive(Debug, Default)]
pub struct UpgradeRegistry {
    schemas: BTreeMap<String, Schema>,
    upgraders: HashMap<(String, u64), StateUpgrader>,
}

impl UpgradeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource type's current schema.
    pub fn register_resource(
        &mut self,
        resource_type: impl Into<String>,
        schema: Schema,
    ) -> Result<(), MigrationError> {
        let resource_type = resource_type.into();
        if self.schemas.contains_key(&resource_type) {
            return Err(MigrationError::Registration(format!(
                "resource type {} registered twice",
                resource_type
            )));
        }
        self.schemas.insert(resource_type, schema);
        Ok(())
    }

    /// Register an upgrader for an already registered resource type.
    pub fn register_upgrader(
        &mut self,
        resource_type: &str,
        upgrader: StateUpgrader,
    ) -> Result<(), MigrationError> {
        let current = self
            .current_version(resource_type)
            .ok_or_else(|| MigrationError::UnknownResource(resource_type.to_string()))?;

        if upgrader.version >= current {
            return Err(MigrationError::Registration(format!(
                "{} upgrader for version {} is not below current version {}",
                resource_type, upgrader.version, current
            )));
        }
        let descriptor_version = (upgrader.legacy_schema)().version;
        if descriptor_version != upgrader.version {
            return Err(MigrationError::Registration(format!(
                "{} upgrader for version {} decodes with a version {} schema",
                resource_type, upgrader.version, descriptor_version
            )));
        }

        let key = (resource_type.to_string(), upgrader.version);
        if self.upgraders.contains_key(&key) {
            return Err(MigrationError::Registration(format!(
                "{} upgrader for version {} registered twice",
                resource_type, upgrader.version
            )));
        }
        self.upgraders.insert(key, upgrader);
        Ok(())
    }

    /// Register a resource definition and all of its upgraders.
    pub fn register(&mut self, definition: ResourceDefinition) -> Result<(), MigrationError> {
        self.register_resource(definition.name, definition.schema)?;
        for upgrader in definition.upgraders {
            self.register_upgrader(definition.name, upgrader)?;
        }
        Ok(())
    }

    /// Check that every resource has an unbroken chain from version 0.
    pub fn verify(&self) -> Result<(), MigrationError> {
        for (resource_type, schema) in &self.schemas {
            for version in 0..schema.version {
                if self.upgrader(resource_type, version).is_none() {
                    return Err(MigrationError::NoUpgradePath {
                        resource_type: resource_type.clone(),
                        version,
                    });
                }
            }
        }
        Ok(())
    }

    /// The current schema version of a resource type.
    pub fn current_version(&self, resource_type: &str) -> Option<u64> {
        self.schemas.get(resource_type).map(|s| s.version)
    }

    /// The current schema of a resource type.
    pub fn schema(&self, resource_type: &str) -> Option<&Schema> {
        self.schemas.get(resource_type)
    }

    /// The upgrader for records of `resource_type` stored at `version`.
    pub fn upgrader(&self, resource_type: &str, version: u64) -> Option<&StateUpgrader> {
        self.upgraders.get(&(resource_type.to_string(), version))
    }

    /// Registered resource types in sorted order.
    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Current schemas of all registered resource types.
    pub fn provider_schema(&self) -> ProviderSchema {
        self.schemas
            .iter()
            .fold(ProviderSchema::new(), |acc, (name, schema)| {
                acc.with_resource(name.clone(), schema.clone())
            })
    }

    /// Bring a record stored at `version` up to the current schema version.
    ///
    /// Upgraders run strictly in ascending order, one version at a time. The
    /// record is moved through the chain and only returned once every step
    /// succeeded; on error the caller keeps nothing but the error.
    #[instrument(skip(self, state), name = "state.upgrade")]
    pub fn upgrade(
        &self,
        resource_type: &str,
        version: u64,
        state: RawState,
    ) -> Result<UpgradeResult, MigrationError> {
        let current = self
            .current_version(resource_type)
            .ok_or_else(|| MigrationError::UnknownResource(resource_type.to_string()))?;

        if version > current {
            return Err(MigrationError::VersionAhead {
                resource_type: resource_type.to_string(),
                stored: version,
                current,
            });
        }
        if version == current {
            debug!("state already at current version");
            return Ok(UpgradeResult::unchanged(state, version));
        }

        let mut state = state;
        let mut steps_applied = Vec::new();
        for step in version..current {
            let upgrader =
                self.upgrader(resource_type, step)
                    .ok_or_else(|| MigrationError::NoUpgradePath {
                        resource_type: resource_type.to_string(),
                        version: step,
                    })?;
            debug!(from = step, to = step + 1, "applying state upgrader");
            state = upgrader.apply(resource_type, state)?;
            steps_applied.push(step);
        }

        info!(from = version, to = current, "state upgraded");
        Ok(UpgradeResult {
            state,
            from_version: version,
            to_version: current,
            steps_applied,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;
    use crate::state::StateValue;

    fn widget_v0() -> Schema {
        Schema::legacy(0).with_attribute("name", Attribute::required_string())
    }

    fn widget_v1() -> Schema {
        Schema::legacy(1).with_attribute("name", Attribute::required_string())
    }

    fn add_step_zero(mut state: RawState) -> Result<RawState, MigrationError> {
        state.insert("step_0", true);
        Ok(state)
    }

    fn add_step_one(mut state: RawState) -> Result<RawState, MigrationError> {
        if state.get_bool("step_0") != Some(true) {
            return Err(MigrationError::InvalidState("step 0 did not run".to_string()));
        }
        state.insert("step_1", true);
        Ok(state)
    }

    fn reject(_: RawState) -> Result<RawState, MigrationError> {
        Err(MigrationError::invalid("widget", "name", "rejected"))
    }

    fn widget_registry() -> UpgradeRegistry {
        let mut registry = UpgradeRegistry::new();
        registry
            .register(ResourceDefinition {
                name: "widget",
                schema: Schema::new(2).with_attribute("name", Attribute::required_string()),
                upgraders: vec![
                    StateUpgrader::new(0, widget_v0, add_step_zero),
                    StateUpgrader::new(1, widget_v1, add_step_one),
                ],
            })
            .unwrap();
        registry
    }

    #[test]
    fn test_chain_applies_in_order() {
        let registry = widget_registry();
        let result = registry
            .upgrade("widget", 0, RawState::new().with("name", "w"))
            .unwrap();

        assert_eq!(result.from_version, 0);
        assert_eq!(result.to_version, 2);
        assert_eq!(result.steps_applied, vec![0, 1]);
        assert_eq!(result.state.get_bool("step_0"), Some(true));
        assert_eq!(result.state.get_bool("step_1"), Some(true));
    }

    #[test]
    fn test_chain_starts_at_stored_version() {
        let registry = widget_registry();
        let state = RawState::new().with("name", "w").with("step_0", true);
        let result = registry.upgrade("widget", 1, state).unwrap();
        assert_eq!(result.steps_applied, vec![1]);
    }

    #[test]
    fn test_current_version_is_untouched() {
        let registry = widget_registry();
        let state = RawState::new().with("name", "w");
        let result = registry.upgrade("widget", 2, state.clone()).unwrap();
        assert!(!result.upgraded());
        assert_eq!(result.state, state);
    }

    #[test]
    fn test_newer_version_rejected() {
        let registry = widget_registry();
        let err = registry.upgrade("widget", 3, RawState::new()).unwrap_err();
        assert!(matches!(
            err,
            MigrationError::VersionAhead {
                stored: 3,
                current: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_resource() {
        let registry = widget_registry();
        let err = registry.upgrade("gadget", 0, RawState::new()).unwrap_err();
        assert!(matches!(err, MigrationError::UnknownResource(_)));
    }

    #[test]
    fn test_legacy_decode_failure_aborts_chain() {
        let registry = widget_registry();
        let err = registry
            .upgrade("widget", 0, RawState::new().with("name", StateValue::Null))
            .unwrap_err();
        assert!(matches!(err, MigrationError::MissingField { .. }));
    }

    #[test]
    fn test_registration_rules() {
        let mut registry = UpgradeRegistry::new();
        registry.register_resource("widget", Schema::new(1)).unwrap();

        assert!(registry.register_resource("widget", Schema::new(1)).is_err());
        assert!(matches!(
            registry.register_upgrader("gadget", StateUpgrader::new(0, widget_v0, reject)),
            Err(MigrationError::UnknownResource(_))
        ));
        // Version must be below current
        assert!(registry
            .register_upgrader("widget", StateUpgrader::new(1, widget_v1, reject))
            .is_err());
        // Descriptor must describe the source version
        assert!(registry
            .register_upgrader("widget", StateUpgrader::new(0, widget_v1, reject))
            .is_err());

        registry
            .register_upgrader("widget", StateUpgrader::new(0, widget_v0, reject))
            .unwrap();
        assert!(registry
            .register_upgrader("widget", StateUpgrader::new(0, widget_v0, reject))
            .is_err());
    }

    #[test]
    fn test_verify_reports_gaps() {
        let mut registry = UpgradeRegistry::new();
        registry.register_resource("widget", Schema::new(2)).unwrap();
        registry
            .register_upgrader("widget", StateUpgrader::new(1, widget_v1, add_step_one))
            .unwrap();

        let err = registry.verify().unwrap_err();
        assert!(matches!(err, MigrationError::NoUpgradePath { version: 0, .. }));

        let err = registry
            .upgrade("widget", 0, RawState::new().with("name", "w"))
            .unwrap_err();
        assert!(matches!(err, MigrationError::NoUpgradePath { version: 0, .. }));

        assert!(widget_registry().verify().is_ok());
    }

    #[test]
    fn test_provider_schema_lists_current_versions() {
        let schema = widget_registry().provider_schema();
        assert_eq!(schema.resources["widget"].version, 2);
    }
}
