//! Local roles: named collections of custom permissions.

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};

use super::properties::PropertyTarget;
use super::tag::{self, Tag};
use super::{non_empty, HasProperties};
use crate::error::TemplateError;
use crate::validation::unique_strs;

/// Role local to the application.
///
/// Identities assigned the role receive its permissions on the assignment
/// target. Permissions limited to resource types only apply to matching
/// resources.
#[derive(Debug, Clone, Default)]
pub struct LocalRole {
    name: String,
    unique_id: Option<String>,
    permissions: Vec<String>,
    roles: Vec<String>,
    tags: Vec<Tag>,
    custom_properties: Map<String, Value>,
}

impl LocalRole {
    /// Creates a role granting `permissions`, identified by `unique_id`,
    /// else `name`.
    #[must_use]
    pub fn new(name: &str, permissions: &[&str], unique_id: Option<&str>) -> Self {
        let mut role = Self {
            name: name.to_owned(),
            unique_id: non_empty(unique_id),
            ..Self::default()
        };
        role.add_permissions(permissions);
        role
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique identifier, when one was supplied.
    #[must_use]
    pub fn unique_id(&self) -> Option<&str> {
        self.unique_id.as_deref()
    }

    /// Key other roles and identities use to reference this role.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.unique_id.as_deref().unwrap_or(&self.name)
    }

    /// Permission names as added, including repeats.
    #[must_use]
    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    /// Nested role identifiers.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Custom property values set so far.
    #[must_use]
    pub const fn custom_properties(&self) -> &Map<String, Value> {
        &self.custom_properties
    }

    /// Adds permission names to the role. Repeats collapse on output.
    pub fn add_permissions(&mut self, permissions: &[&str]) {
        self.permissions
            .extend(permissions.iter().map(|permission| (*permission).to_owned()));
    }

    /// Nests the role identified by `role` inside this one.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] when `role` is this role.
    pub fn add_role(&mut self, role: &str) -> Result<(), TemplateError> {
        if self.identifier() == role {
            return Err(TemplateError::conflict("Cannot add role to self"));
        }
        self.roles.push(role.to_owned());
        Ok(())
    }

    /// Adds a tag, ignoring exact duplicates.
    ///
    /// # Errors
    ///
    /// Returns the tag validation error for malformed keys or values.
    pub fn add_tag(&mut self, key: &str, value: &str) -> Result<(), TemplateError> {
        tag::push_unique(&mut self.tags, key, value)
    }
}

impl HasProperties for LocalRole {
    fn property_target(&self) -> PropertyTarget<'_> {
        PropertyTarget::LocalRole
    }

    fn custom_properties_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.custom_properties
    }
}

// Roles always emit every section; only the id is optional.
impl Serialize for LocalRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = if self.unique_id.is_some() { 6 } else { 5 };
        let mut state = serializer.serialize_struct("LocalRole", fields)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("permissions", &unique_strs(&self.permissions))?;
        state.serialize_field("roles", &self.roles)?;
        state.serialize_field("tags", &self.tags)?;
        state.serialize_field("custom_properties", &self.custom_properties)?;
        if let Some(id) = &self.unique_id {
            state.serialize_field("id", id)?;
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    //! Role nesting and payload shape.

    use serde_json::json;

    use super::*;

    #[test]
    fn permissions_are_unique_on_output() {
        let mut role = LocalRole::new("admin", &["Read", "write"], Some("r-1"));
        role.add_permissions(&["read", "Delete"]);
        role.add_role("viewer").expect("other role");

        let json = serde_json::to_value(&role).expect("serializes");
        assert_eq!(
            json,
            json!({
                "name": "admin",
                "permissions": ["Read", "write", "Delete"],
                "roles": ["viewer"],
                "tags": [],
                "custom_properties": {},
                "id": "r-1"
            })
        );
    }

    #[test]
    fn role_cannot_contain_itself() {
        let mut role = LocalRole::new("admin", &[], None);
        let error = role.add_role("admin").expect_err("self nesting");
        assert_eq!(error.to_string(), "Cannot add role to self");
    }
}
