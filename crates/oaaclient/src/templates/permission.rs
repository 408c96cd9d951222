//! Application-defined permissions and their canonical mapping.

use serde::Serialize;

use super::enums::OaaPermission;

/// Named application permission mapped onto canonical [`OaaPermission`]s.
///
/// When `resource_types` is populated and the permission is granted through
/// a role, it only applies to resources of a listed type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomPermission {
    name: String,
    permission_type: Vec<OaaPermission>,
    apply_to_sub_resources: bool,
    resource_types: Vec<String>,
}

impl CustomPermission {
    /// Creates a permission named `name` covering `permissions`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        permissions: &[OaaPermission],
        apply_to_sub_resources: bool,
    ) -> Self {
        Self {
            name: name.into(),
            permission_type: permissions.to_vec(),
            apply_to_sub_resources,
            resource_types: Vec::new(),
        }
    }

    /// Permission name as used by identities and roles.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical permissions this permission represents.
    #[must_use]
    pub fn permission_type(&self) -> &[OaaPermission] {
        &self.permission_type
    }

    /// Whether the grant extends to every child of the target.
    #[must_use]
    pub const fn apply_to_sub_resources(&self) -> bool {
        self.apply_to_sub_resources
    }

    /// Resource types the permission is limited to inside roles.
    #[must_use]
    pub fn resource_types(&self) -> &[String] {
        &self.resource_types
    }

    /// Limits the permission to `resource_type` when granted via a role.
    /// Repeated types are ignored.
    pub fn add_resource_type(&mut self, resource_type: &str) {
        if !self.resource_types.iter().any(|known| known == resource_type) {
            self.resource_types.push(resource_type.to_owned());
        }
    }
}
