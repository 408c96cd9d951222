//! Payload templates for custom applications, identity providers and HRIS
//! systems.
//!
//! Each template owns its entities in case-insensitive keyed containers and
//! renders the JSON payload the platform expects through [`OaaTemplate`].
//! Mutable lookups hand out an [`EntityMut`], pairing the entity with the
//! template's property definitions so custom properties and role
//! assignments are validated as they are set.

use std::ops::{Deref, DerefMut};

use serde_json::{Map, Value};

use crate::error::TemplateError;

mod application;
mod enums;
mod grants;
mod hris;
mod identity;
mod idp;
mod permission;
mod properties;
mod resource;
mod role;
mod tag;

pub use application::CustomApplication;
pub use enums::{
    CustomTemplate, IdpProviderType, IdpUserIdentityType, LocalUserType, OaaIdentityType,
    OaaPermission, OaaPropertyType,
};
pub use grants::{Grants, Identity, RoleAssignment};
pub use hris::{HrisEmployee, HrisGroup, HrisPropertyDefinitions, HrisProvider, HrisSystem};
pub use identity::{AccessCred, IdpIdentity, LocalGroup, LocalUser};
pub use idp::{
    CustomIdpApp, CustomIdpDomain, CustomIdpGroup, CustomIdpProvider, CustomIdpUser,
    IdpAppAssignment, IdpEntity, IdpPropertyDefinitions, IdpPropertyTarget, SourceIdentity,
};
pub use permission::CustomPermission;
pub use properties::{ApplicationPropertyDefinitions, PropertyMap, PropertyTarget};
pub use resource::{CustomResource, ResourceConnection};
pub use role::LocalRole;
pub use tag::Tag;

/// A complete payload template.
pub trait OaaTemplate {
    /// Provider template the payload is pushed under.
    fn template(&self) -> CustomTemplate;

    /// Renders the payload as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Serialization`] when a value cannot be
    /// represented as JSON.
    fn payload(&self) -> Result<Value, TemplateError>;
}

/// Application entity whose custom properties are validated against
/// [`ApplicationPropertyDefinitions`].
pub trait HasProperties {
    /// Definitions section the entity's property names are checked against.
    fn property_target(&self) -> PropertyTarget<'_>;

    /// Property values of the entity.
    fn custom_properties_mut(&mut self) -> &mut Map<String, Value>;
}

/// Mutable entity borrowed from a template together with the template's
/// property definitions.
///
/// Dereferences to the entity, so every entity method stays available.
#[derive(Debug)]
pub struct EntityMut<'a, T, D = ApplicationPropertyDefinitions> {
    entity: &'a mut T,
    definitions: &'a D,
}

impl<'a, T, D> EntityMut<'a, T, D> {
    pub(crate) const fn new(entity: &'a mut T, definitions: &'a D) -> Self {
        Self {
            entity,
            definitions,
        }
    }

    /// Property definitions the entity is validated against.
    #[must_use]
    pub const fn definitions(&self) -> &'a D {
        self.definitions
    }

    /// Releases the handle, keeping the mutable entity borrow.
    #[must_use]
    pub const fn into_inner(self) -> &'a mut T {
        self.entity
    }

    pub(crate) const fn entity_mut(&mut self) -> &mut T {
        &mut *self.entity
    }
}

impl<T, D> Deref for EntityMut<'_, T, D> {
    type Target = T;

    fn deref(&self) -> &T {
        &*self.entity
    }
}

impl<T, D> DerefMut for EntityMut<'_, T, D> {
    fn deref_mut(&mut self) -> &mut T {
        &mut *self.entity
    }
}

impl<T: HasProperties> EntityMut<'_, T> {
    /// Sets a custom property after checking that its name is declared for
    /// the entity kind.
    ///
    /// # Errors
    ///
    /// Returns the validation error from
    /// [`ApplicationPropertyDefinitions::validate_property_name`].
    pub fn set_property(&mut self, name: &str, value: impl Into<Value>) -> Result<(), TemplateError> {
        self.definitions
            .validate_property_name(name, self.entity.property_target())?;
        self.entity
            .custom_properties_mut()
            .insert(name.to_owned(), value.into());
        Ok(())
    }
}

/// Treats an empty identifier as absent.
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|inner| !inner.is_empty()).map(str::to_owned)
}

/// Serde skip predicate for absent or empty strings.
pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}
