//! Custom property definitions for custom applications.
//!
//! Every custom property set on an application entity must first be declared
//! here with a name and an [`OaaPropertyType`]. Lookups are case-insensitive;
//! declared names keep the spelling they were defined with.

use std::collections::BTreeMap;

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

use super::enums::OaaPropertyType;
use crate::error::TemplateError;
use crate::validation::is_valid_property_name;

/// Property name to type map for one entity kind.
pub type PropertyMap = BTreeMap<String, OaaPropertyType>;

/// Entity kind a property name is validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyTarget<'a> {
    /// The application itself.
    Application,
    /// Local users.
    LocalUser,
    /// Local groups.
    LocalGroup,
    /// Local roles.
    LocalRole,
    /// Properties attached to a role assignment.
    RoleAssignment,
    /// Local access credentials.
    AccessCred,
    /// Resources (and sub-resources) of the named type.
    Resource(&'a str),
}

/// Custom property declarations for one application type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplicationPropertyDefinitions {
    #[serde(skip_serializing_if = "String::is_empty")]
    application_type: String,
    #[serde(rename = "application_properties", skip_serializing_if = "BTreeMap::is_empty")]
    application: PropertyMap,
    #[serde(rename = "local_user_properties", skip_serializing_if = "BTreeMap::is_empty")]
    local_user: PropertyMap,
    #[serde(rename = "local_group_properties", skip_serializing_if = "BTreeMap::is_empty")]
    local_group: PropertyMap,
    #[serde(rename = "local_role_properties", skip_serializing_if = "BTreeMap::is_empty")]
    local_role: PropertyMap,
    #[serde(rename = "role_assignment_properties", skip_serializing_if = "BTreeMap::is_empty")]
    role_assignment: PropertyMap,
    #[serde(rename = "local_access_creds_properties", skip_serializing_if = "BTreeMap::is_empty")]
    access_cred: PropertyMap,
    #[serde(
        skip_serializing_if = "no_resource_properties",
        serialize_with = "serialize_resource_properties"
    )]
    resources: BTreeMap<String, PropertyMap>,
}

impl ApplicationPropertyDefinitions {
    /// Creates empty definitions for `application_type`.
    #[must_use]
    pub fn new(application_type: impl Into<String>) -> Self {
        Self {
            application_type: application_type.into(),
            ..Self::default()
        }
    }

    /// Application type the definitions belong to.
    #[must_use]
    pub fn application_type(&self) -> &str {
        &self.application_type
    }

    /// Declares an application-level property.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidPropertyName`] for malformed names.
    pub fn define_application_property(
        &mut self,
        name: &str,
        property_type: OaaPropertyType,
    ) -> Result<(), TemplateError> {
        insert_definition(&mut self.application, name, property_type)
    }

    /// Declares a local user property.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidPropertyName`] for malformed names.
    pub fn define_local_user_property(
        &mut self,
        name: &str,
        property_type: OaaPropertyType,
    ) -> Result<(), TemplateError> {
        insert_definition(&mut self.local_user, name, property_type)
    }

    /// Declares a local group property.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidPropertyName`] for malformed names.
    pub fn define_local_group_property(
        &mut self,
        name: &str,
        property_type: OaaPropertyType,
    ) -> Result<(), TemplateError> {
        insert_definition(&mut self.local_group, name, property_type)
    }

    /// Declares a local role property.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidPropertyName`] for malformed names.
    pub fn define_local_role_property(
        &mut self,
        name: &str,
        property_type: OaaPropertyType,
    ) -> Result<(), TemplateError> {
        insert_definition(&mut self.local_role, name, property_type)
    }

    /// Declares a role assignment property.
    ///
    /// Role assignment names share a namespace with local role properties on
    /// the platform, so a name already used by a local role property is
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] when the name is a local role
    /// property, or [`TemplateError::InvalidPropertyName`] for malformed
    /// names.
    pub fn define_role_assignment_property(
        &mut self,
        name: &str,
        property_type: OaaPropertyType,
    ) -> Result<(), TemplateError> {
        if self.local_role.contains_key(name) {
            return Err(TemplateError::conflict(format!(
                "Role assignment property names must be unique to role properties, name {name}"
            )));
        }
        insert_definition(&mut self.role_assignment, name, property_type)
    }

    /// Declares a local access credential property.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidPropertyName`] for malformed names.
    pub fn define_access_cred_property(
        &mut self,
        name: &str,
        property_type: OaaPropertyType,
    ) -> Result<(), TemplateError> {
        insert_definition(&mut self.access_cred, name, property_type)
    }

    /// Declares a property for resources of `resource_type`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidPropertyName`] for malformed names.
    pub fn define_resource_property(
        &mut self,
        resource_type: &str,
        name: &str,
        property_type: OaaPropertyType,
    ) -> Result<(), TemplateError> {
        validate_name(name)?;
        self.resources
            .entry(resource_type.to_owned())
            .or_default()
            .insert(name.to_owned(), property_type);
        Ok(())
    }

    /// Checks that `property_name` has been declared for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownProperty`] for undeclared names and
    /// [`TemplateError::NoResourceProperties`] when a resource type has no
    /// declarations at all.
    pub fn validate_property_name(
        &self,
        property_name: &str,
        target: PropertyTarget<'_>,
    ) -> Result<(), TemplateError> {
        let declared = match target {
            PropertyTarget::Application => &self.application,
            PropertyTarget::LocalUser => &self.local_user,
            PropertyTarget::LocalGroup => &self.local_group,
            PropertyTarget::LocalRole => &self.local_role,
            PropertyTarget::RoleAssignment => &self.role_assignment,
            PropertyTarget::AccessCred => &self.access_cred,
            PropertyTarget::Resource(resource_type) => {
                self.resources.get(resource_type).ok_or_else(|| {
                    TemplateError::NoResourceProperties {
                        resource_type: resource_type.to_owned(),
                    }
                })?
            }
        };
        if contains_ignore_case(declared, property_name) {
            Ok(())
        } else {
            Err(TemplateError::UnknownProperty {
                name: property_name.to_owned(),
            })
        }
    }
}

/// Validates a property name against the property name pattern.
pub(crate) fn validate_name(name: &str) -> Result<(), TemplateError> {
    if is_valid_property_name(name) {
        Ok(())
    } else {
        Err(TemplateError::InvalidPropertyName {
            name: name.to_owned(),
        })
    }
}

/// Case-insensitive membership test over declared names.
pub(crate) fn contains_ignore_case(declared: &PropertyMap, name: &str) -> bool {
    let lowered = name.to_lowercase();
    declared.keys().any(|key| key.to_lowercase() == lowered)
}

fn insert_definition(
    map: &mut PropertyMap,
    name: &str,
    property_type: OaaPropertyType,
) -> Result<(), TemplateError> {
    validate_name(name)?;
    map.insert(name.to_owned(), property_type);
    Ok(())
}

fn no_resource_properties(resources: &BTreeMap<String, PropertyMap>) -> bool {
    resources.values().all(BTreeMap::is_empty)
}

fn serialize_resource_properties<S: Serializer>(
    resources: &BTreeMap<String, PropertyMap>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct ResourceProperties<'a> {
        resource_type: &'a str,
        properties: &'a PropertyMap,
    }

    let mut seq = serializer.serialize_seq(None)?;
    for (resource_type, properties) in resources {
        if properties.is_empty() {
            continue;
        }
        seq.serialize_element(&ResourceProperties {
            resource_type,
            properties,
        })?;
    }
    seq.end()
}

#[cfg(test)]
mod tests {
    //! Property declaration and validation rules.

    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    #[fixture]
    fn definitions() -> ApplicationPropertyDefinitions {
        let mut definitions = ApplicationPropertyDefinitions::new("pytest");
        definitions
            .define_local_user_property("Department", OaaPropertyType::String)
            .expect("valid name");
        definitions
            .define_local_role_property("scope", OaaPropertyType::String)
            .expect("valid name");
        definitions
            .define_resource_property("bucket", "region", OaaPropertyType::String)
            .expect("valid name");
        definitions
    }

    #[rstest]
    fn validation_ignores_case(definitions: ApplicationPropertyDefinitions) {
        definitions
            .validate_property_name("department", PropertyTarget::LocalUser)
            .expect("declared name");
        definitions
            .validate_property_name("REGION", PropertyTarget::Resource("bucket"))
            .expect("declared name");
    }

    #[rstest]
    fn unknown_names_are_rejected(definitions: ApplicationPropertyDefinitions) {
        let error = definitions
            .validate_property_name("office", PropertyTarget::LocalUser)
            .expect_err("undeclared name");
        assert_eq!(error.to_string(), "unknown property name office");
    }

    #[rstest]
    fn undefined_resource_types_are_rejected(definitions: ApplicationPropertyDefinitions) {
        let error = definitions
            .validate_property_name("region", PropertyTarget::Resource("queue"))
            .expect_err("undeclared resource type");
        assert_eq!(
            error,
            TemplateError::NoResourceProperties {
                resource_type: "queue".to_owned()
            }
        );
    }

    #[rstest]
    fn role_assignment_names_must_not_shadow_role_properties(
        mut definitions: ApplicationPropertyDefinitions,
    ) {
        let error = definitions
            .define_role_assignment_property("scope", OaaPropertyType::String)
            .expect_err("shared name");
        assert!(matches!(error, TemplateError::Conflict { .. }));
        definitions
            .define_role_assignment_property("granted_by", OaaPropertyType::String)
            .expect("distinct name");
    }

    #[rstest]
    #[case::digit("2fa")]
    #[case::dash("last-login")]
    #[case::space("last login")]
    fn malformed_names_are_rejected(#[case] name: &str) {
        let mut definitions = ApplicationPropertyDefinitions::new("pytest");
        let error = definitions
            .define_application_property(name, OaaPropertyType::Boolean)
            .expect_err("malformed name");
        assert!(matches!(error, TemplateError::InvalidPropertyName { .. }));
    }

    #[rstest]
    fn serializes_only_populated_sections(definitions: ApplicationPropertyDefinitions) {
        let json = serde_json::to_value(&definitions).expect("serializes");
        assert_eq!(
            json,
            json!({
                "application_type": "pytest",
                "local_user_properties": {"Department": "STRING"},
                "local_role_properties": {"scope": "STRING"},
                "resources": [
                    {"resource_type": "bucket", "properties": {"region": "STRING"}}
                ]
            })
        );
    }
}
