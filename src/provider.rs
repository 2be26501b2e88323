//! The host-facing provider service.
//!
//! [`ProviderService`] is the seam a plugin host calls through: JSON in,
//! JSON out, typed errors that convert into [`Diagnostic`]s.
//! [`AviatrixProvider`] implements it over the resource [`UpgradeRegistry`].

use tracing::{debug, error, info, instrument, warn};

use crate::error::MigrationError;
use crate::registry::UpgradeRegistry;
use crate::resources;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::state::RawState;
use crate::types::ProviderMetadata;
use crate::validation::validate;

/// Operations a provider exposes to its host.
///
/// # Example
///
/// ```
/// use aviatrix_provider_state::{AviatrixProvider, ProviderService};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let provider = AviatrixProvider::new().unwrap();
/// let upgraded = provider
///     .upgrade_resource_state("aviatrix_firenet", 0, json!({"vpc_id": "vpc-1"}))
///     .await
///     .unwrap();
/// assert_eq!(upgraded["manage_firewall_instance_association"], json!(true));
/// # });
/// ```
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// Return the current schema of every resource.
    fn schema(&self) -> ProviderSchema;

    /// Return provider metadata. By default, this is derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            resources: self
                .schema()
                .resources
                .into_iter()
                .map(|(name, schema)| (name, schema.version))
                .collect(),
        }
    }

    /// Validate a resource's configuration against its current schema.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: serde_json::Value,
    ) -> Result<Vec<Diagnostic>, MigrationError>;

    /// Upgrade a record stored at `version` to the resource's current version.
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: serde_json::Value,
    ) -> Result<serde_json::Value, MigrationError>;
}

/// Options for [`AviatrixProvider`].
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    /// Check every upgraded record against the current schema and log any
    /// mismatch as a warning. The upgrade itself still succeeds.
    /// Default: false.
    pub validate_upgraded_state: bool,
}

impl ProviderOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable post-upgrade validation.
    pub fn with_validate_upgraded_state(mut self, enabled: bool) -> Self {
        self.validate_upgraded_state = enabled;
        self
    }
}

/// The Aviatrix provider's state upgrade service.
#[derive(Debug)]
pub struct AviatrixProvider {
    registry: UpgradeRegistry,
    options: ProviderOptions,
}

impl AviatrixProvider {
    /// Build the provider with every registered resource and default options.
    pub fn new() -> Result<Self, MigrationError> {
        Self::with_options(ProviderOptions::default())
    }

    /// Build the provider with custom options.
    pub fn with_options(options: ProviderOptions) -> Result<Self, MigrationError> {
        Ok(Self {
            registry: resources::registry()?,
            options,
        })
    }

    /// The underlying upgrade table.
    pub fn registry(&self) -> &UpgradeRegistry {
        &self.registry
    }

    fn check_upgraded(&self, resource_type: &str, state: &RawState) {
        let Some(schema) = self.registry.schema(resource_type) else {
            return;
        };
        for diagnostic in validate(schema, state) {
            warn!(
                resource_type,
                attribute = diagnostic.attribute.as_deref().unwrap_or_default(),
                summary = %diagnostic.summary,
                "upgraded state does not match current schema"
            );
        }
    }
}

#[async_trait::async_trait]
impl ProviderService for AviatrixProvider {
    fn schema(&self) -> ProviderSchema {
        self.registry.provider_schema()
    }

    #[instrument(skip(self, config), name = "provider.validate_resource_config")]
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: serde_json::Value,
    ) -> Result<Vec<Diagnostic>, MigrationError> {
        let schema = self
            .registry
            .schema(resource_type)
            .ok_or_else(|| MigrationError::UnknownResource(resource_type.to_string()))?;
        let config = RawState::from_json(config)?;

        let diagnostics = validate(schema, &config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            warn!(
                diagnostics = diagnostics.len(),
                "ValidateResourceConfig completed with errors"
            );
        } else {
            debug!("ValidateResourceConfig completed successfully");
        }
        Ok(diagnostics)
    }

    #[instrument(skip(self, state), name = "provider.upgrade_resource_state")]
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: serde_json::Value,
    ) -> Result<serde_json::Value, MigrationError> {
        let stored = u64::try_from(version).map_err(|_| {
            MigrationError::InvalidRequest(format!(
                "schema version must not be negative, got {}",
                version
            ))
        })?;

        let result = RawState::from_json(state)
            .and_then(|state| self.registry.upgrade(resource_type, stored, state));

        match result {
            Ok(result) => {
                if self.options.validate_upgraded_state && result.upgraded() {
                    self.check_upgraded(resource_type, &result.state);
                }
                info!(
                    from_version = result.from_version,
                    to_version = result.to_version,
                    "UpgradeResourceState completed"
                );
                Ok(result.state.into_json())
            }
            Err(e) => {
                error!(error = %e, "UpgradeResourceState failed");
                Err(e)
            }
        }
    }
}
