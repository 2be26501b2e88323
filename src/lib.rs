//! Aviatrix Provider State
//!
//! Schema-versioned state upgrades for the Aviatrix Terraform provider.
//!
//! Every resource type persists its attributes together with the schema
//! version that wrote them. When the provider's schema for a resource moves
//! forward, records written by older releases are brought up to date by a
//! chain of single-step upgraders, one per version, before anything else
//! reads them.
//!
//! # Overview
//!
//! - **State model**: [`RawState`] and [`StateValue`], a dynamic field map
//! - **Field policies**: what an absent field meant for legacy records
//! - **Resources**: the current schema, legacy descriptors and upgraders for
//!   each versioned resource type
//! - **Registry**: the (resource type, version) → upgrader table and the
//!   chaining logic
//! - **Provider**: [`ProviderService`], the JSON seam a plugin host calls
//! - **Logging**: Integration with `tracing` for structured logging
//!
//! # Quick Start
//!
//! ```
//! use aviatrix_provider_state::{resources, RawState};
//!
//! let registry = resources::registry().unwrap();
//! let record = RawState::new()
//!     .with("tgw_name", "tgw-1")
//!     .with("account_name", "aws-prod")
//!     .with("region", "us-east-1");
//!
//! let result = registry.upgrade("aviatrix_aws_tgw", 0, record).unwrap();
//! assert_eq!(result.to_version, 2);
//! assert_eq!(result.state.get_bool("manage_vpc_attachment"), Some(true));
//! assert_eq!(result.state.get_bool("manage_transit_gateway_attachment"), Some(true));
//! ```
//!
//! # Upgrade Semantics
//!
//! - Upgraders are pure: the output depends only on the input record.
//! - A record already at the current version is returned unchanged.
//! - A record newer than the current version is rejected.
//! - Any failing step fails the whole upgrade; no partial record escapes.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod logging;
pub mod policy;
pub mod provider;
pub mod registry;
pub mod resources;
pub mod schema;
pub mod state;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use error::MigrationError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use policy::AbsentPolicy;
pub use provider::{AviatrixProvider, ProviderOptions, ProviderService};
pub use registry::{ResourceDefinition, StateUpgrader, UpgradeRegistry};
pub use schema::ProviderSchema;
pub use state::{RawState, StateValue};
pub use types::{ProviderMetadata, UpgradeResult};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
