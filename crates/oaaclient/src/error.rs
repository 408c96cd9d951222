//! Error types for payload templates.
//!
//! Template errors are raised locally, before anything is sent to the remote
//! platform, whenever a name, tag, property or relationship would produce an
//! invalid payload.

use thiserror::Error;

use crate::validation::PROPERTY_NAME_PATTERN;

/// Errors raised while building or serializing an OAA payload template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A tag key contains characters outside letters, digits and `_`.
    #[error(
        "Invalid characters in tag key. Key '{key}'. Key may only contain letters, numbers, and _ (underscore)"
    )]
    InvalidTagKey {
        /// The rejected key.
        key: String,
    },

    /// A tag value contains characters outside the allowed set.
    #[error(
        "Invalid characters in tag value. Value '{value}'. Value may only contain letters, numbers, whitespace and the special characters @,._-"
    )]
    InvalidTagValue {
        /// The rejected value.
        value: String,
    },

    /// A custom property name does not match the property name pattern.
    #[error(
        "Lower-cased property name must match the pattern: '{pattern}': {name}",
        pattern = PROPERTY_NAME_PATTERN
    )]
    InvalidPropertyName {
        /// The rejected property name.
        name: String,
    },

    /// A custom property was set without a matching definition.
    #[error("unknown property name {name}")]
    UnknownProperty {
        /// The undefined property name.
        name: String,
    },

    /// An HRIS employee property was set without a matching definition.
    #[error("unknown employee property name {name}")]
    UnknownEmployeeProperty {
        /// The undefined property name.
        name: String,
    },

    /// An HRIS group property was set without a matching definition.
    #[error("unknown group property name {name}")]
    UnknownGroupProperty {
        /// The undefined property name.
        name: String,
    },

    /// A resource property was set on a type with no property definitions.
    #[error("No custom properties defined for resource type {resource_type}")]
    NoResourceProperties {
        /// The resource type lacking definitions.
        resource_type: String,
    },

    /// The entity kind cannot carry custom properties.
    #[error("{entity} do not support custom properties")]
    PropertiesUnsupported {
        /// Human readable entity kind.
        entity: &'static str,
    },

    /// An identifier collides with an existing entry or references itself.
    #[error("{message}")]
    Conflict {
        /// Description of the conflict.
        message: String,
    },

    /// A required value is missing or an argument combination is invalid.
    #[error("{message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// The payload could not be converted to JSON.
    #[error("failed to serialize payload: {message}")]
    Serialization {
        /// Description of the serializer failure.
        message: String,
    },
}

impl TemplateError {
    /// Build a [`TemplateError::Conflict`] from a message.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Build a [`TemplateError::InvalidArgument`] from a message.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for TemplateError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Display checks for template errors.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::tag_key(
        TemplateError::InvalidTagKey { key: "bad key".to_owned() },
        "Invalid characters in tag key. Key 'bad key'. Key may only contain letters, numbers, and _ (underscore)"
    )]
    #[case::property_name(
        TemplateError::InvalidPropertyName { name: "9lives".to_owned() },
        "Lower-cased property name must match the pattern: '^[a-z][a-z_]*$': 9lives"
    )]
    #[case::resource_type(
        TemplateError::NoResourceProperties { resource_type: "bucket".to_owned() },
        "No custom properties defined for resource type bucket"
    )]
    #[case::unsupported(
        TemplateError::PropertiesUnsupported { entity: "IdP identities" },
        "IdP identities do not support custom properties"
    )]
    #[case::conflict(
        TemplateError::conflict("Cannot add role to self"),
        "Cannot add role to self"
    )]
    fn formats_messages(#[case] error: TemplateError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }
}
