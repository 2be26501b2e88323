//! Error types for state upgrades.

use thiserror::Error;

use crate::schema::Diagnostic;

/// Errors that can occur while upgrading a persisted state record.
///
/// Absent optional fields and type mismatches on reshaped fields are not
/// errors; migrators resolve them through their field policies. Everything
/// here aborts the upgrade and is reported to the user verbatim.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A required identifying field is absent from the record.
    #[error("Missing required field '{field}' in {resource_type} state")]
    MissingField {
        /// Resource type whose record failed.
        resource_type: String,
        /// The absent field.
        field: String,
    },

    /// A field holds a value that cannot be interpreted under its schema.
    #[error("Invalid field '{field}' in {resource_type} state: {reason}")]
    InvalidField {
        /// Resource type whose record failed.
        resource_type: String,
        /// The offending field (dotted path for nested values).
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The record as a whole is not a field mapping.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// No upgraders are registered for this resource type.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// The stored record was written by a newer schema than this provider knows.
    #[error("State for {resource_type} is at schema version {stored}, newer than current version {current}")]
    VersionAhead {
        /// Resource type whose record failed.
        resource_type: String,
        /// Version recorded with the state.
        stored: u64,
        /// Current schema version of the resource.
        current: u64,
    },

    /// A step in the version chain has no registered upgrader.
    #[error("No state upgrader registered for {resource_type} version {version}")]
    NoUpgradePath {
        /// Resource type whose chain is broken.
        resource_type: String,
        /// Source version without an upgrader.
        version: u64,
    },

    /// An upgrader was registered twice, or outside the resource's version range.
    #[error("Invalid upgrader registration: {0}")]
    Registration(String),

    /// The host sent a malformed request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MigrationError {
    /// Shorthand for [`MigrationError::MissingField`].
    pub fn missing(resource_type: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            resource_type: resource_type.into(),
            field: field.into(),
        }
    }

    /// Shorthand for [`MigrationError::InvalidField`].
    pub fn invalid(
        resource_type: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            resource_type: resource_type.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// The field the error is attached to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field, .. } | Self::InvalidField { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<MigrationError> for Diagnostic {
    fn from(err: MigrationError) -> Self {
        let diagnostic = Diagnostic::error("Failed to upgrade resource state")
            .with_detail(err.to_string());
        match err.field() {
            Some(field) => diagnostic.with_attribute(field),
            None => diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DiagnosticSeverity;

    #[test]
    fn test_error_display() {
        let err = MigrationError::missing("aviatrix_firenet", "vpc_id");
        assert_eq!(
            format!("{}", err),
            "Missing required field 'vpc_id' in aviatrix_firenet state"
        );

        let err = MigrationError::UnknownResource("aviatrix_custom".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: aviatrix_custom");

        let err = MigrationError::VersionAhead {
            resource_type: "aviatrix_aws_tgw".to_string(),
            stored: 3,
            current: 2,
        };
        assert_eq!(
            format!("{}", err),
            "State for aviatrix_aws_tgw is at schema version 3, newer than current version 2"
        );
    }

    #[test]
    fn test_field_accessor() {
        let err = MigrationError::invalid("aviatrix_fqdn", "gw_filter_tag_list.0", "not a mapping");
        assert_eq!(err.field(), Some("gw_filter_tag_list.0"));

        let err = MigrationError::InvalidRequest("negative version".to_string());
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_error_to_diagnostic() {
        let diagnostic: Diagnostic = MigrationError::missing("aviatrix_gateway", "gw_name").into();
        assert_eq!(diagnostic.severity, DiagnosticSeverity::Error);
        assert_eq!(diagnostic.attribute, Some("gw_name".to_string()));
        assert!(diagnostic
            .detail
            .as_deref()
            .is_some_and(|d| d.contains("gw_name")));

        let diagnostic: Diagnostic =
            MigrationError::UnknownResource("aviatrix_custom".to_string()).into();
        assert_eq!(diagnostic.attribute, None);
    }
}
