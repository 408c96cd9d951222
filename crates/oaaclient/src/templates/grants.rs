//! Permission and role bookkeeping shared by every identity kind.
//!
//! Identities grant access either to the whole application or to resources
//! referenced by their resource key. Grants are rendered into the
//! `identity_to_permissions` section of the application payload.

use serde::Serialize;
use serde_json::{Map, Value};

use super::enums::OaaIdentityType;
use super::properties::PropertyTarget;
use super::EntityMut;
use crate::error::TemplateError;

/// Role held by an identity, with its targets and assignment properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleAssignment {
    apply_to_application: Option<bool>,
    resources: Vec<String>,
    custom_properties: Map<String, Value>,
}

impl RoleAssignment {
    /// Whether the role applies to the application itself. `None` until a
    /// caller sets it explicitly.
    #[must_use]
    pub const fn apply_to_application(&self) -> Option<bool> {
        self.apply_to_application
    }

    /// Keys of the resources the role applies to.
    #[must_use]
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    /// Properties attached to the assignment.
    #[must_use]
    pub const fn custom_properties(&self) -> &Map<String, Value> {
        &self.custom_properties
    }

    fn is_unassigned(&self) -> bool {
        !self.apply_to_application.unwrap_or(false) && self.resources.is_empty()
    }
}

/// Permissions and roles held by one identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grants {
    application_permissions: Vec<String>,
    resource_permissions: Vec<(String, Vec<String>)>,
    role_assignments: Vec<(String, RoleAssignment)>,
}

impl Grants {
    /// Grants `permission` on the application and/or the listed resources.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidArgument`] when there is nothing to
    /// grant the permission on.
    pub fn add_permission(
        &mut self,
        permission: &str,
        resource_keys: &[&str],
        apply_to_application: bool,
    ) -> Result<(), TemplateError> {
        if !apply_to_application && resource_keys.is_empty() {
            return Err(TemplateError::invalid_argument(
                "Must add permission to resource or application. resources cannot be empty and apply_to_application be False",
            ));
        }
        if apply_to_application && !self.application_permissions.iter().any(|p| p == permission) {
            self.application_permissions.push(permission.to_owned());
        }
        if resource_keys.is_empty() {
            return Ok(());
        }
        let index = self
            .resource_permissions
            .iter()
            .position(|(name, _)| name == permission)
            .unwrap_or_else(|| {
                self.resource_permissions
                    .push((permission.to_owned(), Vec::new()));
                self.resource_permissions.len() - 1
            });
        if let Some((_, keys)) = self.resource_permissions.get_mut(index) {
            extend_unique(keys, resource_keys);
        }
        Ok(())
    }

    /// Records `role` without validating assignment property names.
    ///
    /// Repeated calls merge: the application flag only changes when given,
    /// resource keys are appended without duplicates and properties are
    /// updated.
    pub fn add_role_unchecked(
        &mut self,
        role: &str,
        resource_keys: &[&str],
        apply_to_application: Option<bool>,
        assignment_properties: Map<String, Value>,
    ) {
        if let Some((_, existing)) = self.role_assignments.iter_mut().find(|(name, _)| name == role) {
            if apply_to_application.is_some() {
                existing.apply_to_application = apply_to_application;
            }
            extend_unique(&mut existing.resources, resource_keys);
            existing.custom_properties.extend(assignment_properties);
            return;
        }
        let mut assignment = RoleAssignment {
            apply_to_application,
            resources: Vec::new(),
            custom_properties: assignment_properties,
        };
        extend_unique(&mut assignment.resources, resource_keys);
        self.role_assignments.push((role.to_owned(), assignment));
    }

    /// Permission names granted on the application itself.
    #[must_use]
    pub fn application_permissions(&self) -> &[String] {
        &self.application_permissions
    }

    /// Resource keys `permission` has been granted on.
    #[must_use]
    pub fn resource_permission(&self, permission: &str) -> Option<&[String]> {
        self.resource_permissions
            .iter()
            .find(|(name, _)| name == permission)
            .map(|(_, keys)| keys.as_slice())
    }

    /// Assignment of `role`, when held.
    #[must_use]
    pub fn role_assignment(&self, role: &str) -> Option<&RoleAssignment> {
        self.role_assignments
            .iter()
            .find(|(name, _)| name == role)
            .map(|(_, assignment)| assignment)
    }

    /// Renders the grants of `identity` for the payload.
    pub(crate) fn to_entry<'a>(
        &'a self,
        identity: &'a str,
        identity_type: OaaIdentityType,
        application: &'a str,
    ) -> IdentityPermissions<'a> {
        let direct = self
            .application_permissions
            .iter()
            .map(|permission| PermissionEntry {
                application,
                resources: None,
                permission,
                apply_to_application: Some(true),
            });
        let on_resources = self
            .resource_permissions
            .iter()
            .map(|(permission, keys)| PermissionEntry {
                application,
                resources: Some(keys),
                permission,
                apply_to_application: None,
            });
        let role_assignments = self
            .role_assignments
            .iter()
            .filter(|(_, assignment)| !assignment.is_unassigned())
            .map(|(role, assignment)| RoleEntry {
                application,
                role,
                apply_to_application: assignment.apply_to_application.unwrap_or(false),
                resources: &assignment.resources,
                custom_properties: &assignment.custom_properties,
            })
            .collect();
        IdentityPermissions {
            identity,
            identity_type,
            application_permissions: direct.chain(on_resources).collect(),
            role_assignments,
        }
    }
}

/// One identity's entry in `identity_to_permissions`.
#[derive(Debug, Serialize)]
pub(crate) struct IdentityPermissions<'a> {
    identity: &'a str,
    identity_type: OaaIdentityType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    application_permissions: Vec<PermissionEntry<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    role_assignments: Vec<RoleEntry<'a>>,
}

impl IdentityPermissions<'_> {
    /// Identities without grants are left out of the payload.
    pub(crate) fn has_grants(&self) -> bool {
        !(self.application_permissions.is_empty() && self.role_assignments.is_empty())
    }
}

#[derive(Debug, Serialize)]
struct PermissionEntry<'a> {
    application: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    resources: Option<&'a [String]>,
    permission: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    apply_to_application: Option<bool>,
}

#[derive(Debug, Serialize)]
struct RoleEntry<'a> {
    application: &'a str,
    role: &'a str,
    apply_to_application: bool,
    #[serde(skip_serializing_if = "no_keys")]
    resources: &'a [String],
    #[serde(skip_serializing_if = "no_properties")]
    custom_properties: &'a Map<String, Value>,
}

/// An entity that can hold application permissions and roles.
pub trait Identity {
    /// Identity type reported in the payload.
    fn identity_type(&self) -> OaaIdentityType;

    /// Identifier the payload references: the unique id, else the name.
    fn identifier(&self) -> &str;

    /// Grants held by the identity.
    fn grants(&self) -> &Grants;

    /// Mutable grants held by the identity.
    fn grants_mut(&mut self) -> &mut Grants;

    /// Grants `permission` on the application and/or resources.
    ///
    /// # Errors
    ///
    /// See [`Grants::add_permission`].
    fn add_permission(
        &mut self,
        permission: &str,
        resource_keys: &[&str],
        apply_to_application: bool,
    ) -> Result<(), TemplateError> {
        self.grants_mut()
            .add_permission(permission, resource_keys, apply_to_application)
    }
}

impl<T: Identity> EntityMut<'_, T> {
    /// Assigns `role` to the identity after checking the assignment property
    /// names against the application's role assignment definitions.
    ///
    /// # Errors
    ///
    /// Returns the property validation error for undeclared names.
    pub fn add_role(
        &mut self,
        role: &str,
        resource_keys: &[&str],
        apply_to_application: Option<bool>,
        assignment_properties: Map<String, Value>,
    ) -> Result<(), TemplateError> {
        let definitions = self.definitions();
        for name in assignment_properties.keys() {
            definitions.validate_property_name(name, PropertyTarget::RoleAssignment)?;
        }
        self.entity_mut().grants_mut().add_role_unchecked(
            role,
            resource_keys,
            apply_to_application,
            assignment_properties,
        );
        Ok(())
    }
}

fn no_keys(keys: &&[String]) -> bool {
    keys.is_empty()
}

fn no_properties(properties: &&Map<String, Value>) -> bool {
    properties.is_empty()
}

fn extend_unique(target: &mut Vec<String>, additions: &[&str]) {
    for addition in additions {
        if !target.iter().any(|known| known == addition) {
            target.push((*addition).to_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    //! Grant merging and payload rendering.

    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn render(grants: &Grants) -> Value {
        let entry = grants.to_entry("alice", OaaIdentityType::LocalUser, "app");
        serde_json::to_value(entry).expect("serializes")
    }

    #[test]
    fn permission_needs_a_target() {
        let mut grants = Grants::default();
        let error = grants
            .add_permission("view", &[], false)
            .expect_err("no target");
        assert!(error.to_string().starts_with("Must add permission to resource or application"));
    }

    #[test]
    fn resource_permissions_merge_without_duplicates() {
        let mut grants = Grants::default();
        grants.add_permission("view", &["r1"], false).expect("valid");
        grants.add_permission("view", &["r1", "r2"], true).expect("valid");
        grants.add_permission("view", &[], true).expect("valid");
        assert_eq!(grants.application_permissions(), ["view"]);
        assert_eq!(grants.resource_permission("view"), Some(["r1".to_owned(), "r2".to_owned()].as_slice()));
    }

    #[test]
    fn role_merge_keeps_flag_when_not_given() {
        let mut grants = Grants::default();
        let mut first = Map::new();
        first.insert("granted_by".to_owned(), json!("ops"));
        grants.add_role_unchecked("admin", &["r1"], Some(true), first);
        grants.add_role_unchecked("admin", &["r1", "r2"], None, Map::new());
        let assignment = grants.role_assignment("admin").expect("role held");
        assert_eq!(assignment.apply_to_application(), Some(true));
        assert_eq!(assignment.resources(), ["r1", "r2"]);
        assert_eq!(assignment.custom_properties().get("granted_by"), Some(&json!("ops")));
    }

    #[test]
    fn renders_permissions_and_roles() {
        let mut grants = Grants::default();
        grants.add_permission("view", &[], true).expect("valid");
        grants.add_permission("edit", &["r1"], false).expect("valid");
        grants.add_role_unchecked("reader", &["r2"], None, Map::new());
        assert_eq!(
            render(&grants),
            json!({
                "identity": "alice",
                "identity_type": "local_user",
                "application_permissions": [
                    {"application": "app", "permission": "view", "apply_to_application": true},
                    {"application": "app", "resources": ["r1"], "permission": "edit"}
                ],
                "role_assignments": [
                    {"application": "app", "role": "reader", "apply_to_application": false, "resources": ["r2"]}
                ]
            })
        );
    }

    #[rstest]
    #[case::no_flag(None)]
    #[case::false_flag(Some(false))]
    fn unassigned_roles_are_skipped(#[case] flag: Option<bool>) {
        let mut grants = Grants::default();
        grants.add_role_unchecked("reader", &[], flag, Map::new());
        let entry = grants.to_entry("alice", OaaIdentityType::LocalUser, "app");
        assert!(!entry.has_grants());
    }
}
