//! The custom identity provider template.
//!
//! A [`CustomIdpProvider`] describes one identity provider domain with its
//! users, groups and applications, and renders the `identity_provider`
//! template payload.

use serde::Serialize;
use serde_json::{Map, Value};

use super::enums::{CustomTemplate, IdpProviderType, IdpUserIdentityType, OaaPropertyType};
use super::properties::{contains_ignore_case, PropertyMap};
use super::tag::{self, Tag};
use super::{non_empty, EntityMut, OaaTemplate};
use crate::error::TemplateError;
use crate::keyed::{self, CaseInsensitiveMap};

/// Entity kind an IdP property name is validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdpPropertyTarget {
    /// The IdP domain.
    Domain,
    /// IdP users.
    User,
    /// IdP groups.
    Group,
    /// IdP applications.
    App,
    /// Application assignments of users and groups.
    AppAssignment,
}

/// Custom property declarations for an identity provider.
///
/// Every section is emitted, even when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdpPropertyDefinitions {
    domain_properties: PropertyMap,
    user_properties: PropertyMap,
    group_properties: PropertyMap,
    app_properties: PropertyMap,
    app_assignment_properties: PropertyMap,
}

impl IdpPropertyDefinitions {
    /// Declares a domain property.
    pub fn define_domain_property(&mut self, name: &str, property_type: OaaPropertyType) {
        self.domain_properties.insert(name.to_owned(), property_type);
    }

    /// Declares a user property.
    pub fn define_user_property(&mut self, name: &str, property_type: OaaPropertyType) {
        self.user_properties.insert(name.to_owned(), property_type);
    }

    /// Declares a group property.
    pub fn define_group_property(&mut self, name: &str, property_type: OaaPropertyType) {
        self.group_properties.insert(name.to_owned(), property_type);
    }

    /// Declares an application property.
    pub fn define_app_property(&mut self, name: &str, property_type: OaaPropertyType) {
        self.app_properties.insert(name.to_owned(), property_type);
    }

    /// Declares an application assignment property.
    pub fn define_app_assignment_property(&mut self, name: &str, property_type: OaaPropertyType) {
        self.app_assignment_properties
            .insert(name.to_owned(), property_type);
    }

    /// Checks, ignoring case, that `property_name` is declared for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownProperty`] for undeclared names.
    pub fn validate_property_name(
        &self,
        property_name: &str,
        target: IdpPropertyTarget,
    ) -> Result<(), TemplateError> {
        let declared = match target {
            IdpPropertyTarget::Domain => &self.domain_properties,
            IdpPropertyTarget::User => &self.user_properties,
            IdpPropertyTarget::Group => &self.group_properties,
            IdpPropertyTarget::App => &self.app_properties,
            IdpPropertyTarget::AppAssignment => &self.app_assignment_properties,
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

/// IdP entity carrying custom properties.
pub trait IdpEntity {
    /// Definitions section the entity's property names are checked against.
    const TARGET: IdpPropertyTarget;

    /// Property values of the entity.
    fn custom_properties_mut(&mut self) -> &mut Map<String, Value>;
}

impl<T: IdpEntity> EntityMut<'_, T, IdpPropertyDefinitions> {
    /// Sets a custom property declared for the entity kind.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownProperty`] for undeclared names.
    pub fn set_property(&mut self, name: &str, value: impl Into<Value>) -> Result<(), TemplateError> {
        self.definitions().validate_property_name(name, T::TARGET)?;
        self.entity_mut()
            .custom_properties_mut()
            .insert(name.to_owned(), value.into());
        Ok(())
    }
}

/// Reference to another identity by its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct IdentityRef {
    identity: String,
}

/// IdP identity a custom user is linked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceIdentity {
    identity: String,
    provider_type: IdpProviderType,
}

/// Assignment of an IdP application to a user or group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdpAppAssignment {
    id: String,
    name: String,
    app_id: String,
    custom_properties: Map<String, Value>,
}

impl IdpAppAssignment {
    /// Assignment id, unique per user or group.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id of the assigned application.
    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }
}

/// Domain of the identity provider.
#[derive(Debug, Clone, Serialize)]
pub struct CustomIdpDomain {
    name: String,
    tags: Vec<Tag>,
    custom_properties: Map<String, Value>,
}

impl CustomIdpDomain {
    /// Domain name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
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

impl IdpEntity for CustomIdpDomain {
    const TARGET: IdpPropertyTarget = IdpPropertyTarget::Domain;

    fn custom_properties_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.custom_properties
    }
}

/// User of the identity provider.
///
/// Null and empty values are left out of the payload.
#[derive(Debug, Clone, Serialize)]
pub struct CustomIdpUser {
    name: String,
    /// Primary email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    identity: String,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Department name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Whether the user is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// Whether the user is a guest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_guest: Option<bool>,
    /// Identity of the user's manager.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    groups: Vec<IdentityRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    assumed_role_arns: Vec<IdentityRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_identity: Option<SourceIdentity>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    custom_properties: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    app_assignments: Vec<IdpAppAssignment>,
    /// Human or non-human account; the platform assumes human when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_type: Option<IdpUserIdentityType>,
}

impl CustomIdpUser {
    /// Creates a user identified by `identity`, else `name`.
    #[must_use]
    pub fn new(
        name: &str,
        email: Option<&str>,
        full_name: Option<&str>,
        identity: Option<&str>,
    ) -> Self {
        Self {
            name: name.to_owned(),
            email: email.map(str::to_owned),
            identity: non_empty(identity).unwrap_or_else(|| name.to_owned()),
            full_name: full_name.map(str::to_owned),
            department: None,
            is_active: None,
            is_guest: None,
            manager_id: None,
            groups: Vec::new(),
            assumed_role_arns: Vec::new(),
            source_identity: None,
            tags: Vec::new(),
            custom_properties: Map::new(),
            app_assignments: Vec::new(),
            identity_type: None,
        }
    }

    /// User name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique identity of the user.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Links the user to an identity discovered from another provider.
    /// [`IdpProviderType::Any`] searches every provider.
    pub fn set_source_identity(&mut self, identity: &str, provider_type: IdpProviderType) {
        self.source_identity = Some(SourceIdentity {
            identity: identity.to_owned(),
            provider_type,
        });
    }

    /// Adds role ARNs the user may assume; repeats are ignored.
    pub fn add_assumed_role_arns(&mut self, arns: &[&str]) {
        push_identity_refs(&mut self.assumed_role_arns, arns);
    }

    /// Adds the user to groups by group identity; repeats are ignored.
    pub fn add_groups(&mut self, group_identities: &[&str]) {
        push_identity_refs(&mut self.groups, group_identities);
    }

    /// Application assignments so far.
    #[must_use]
    pub fn app_assignments(&self) -> &[IdpAppAssignment] {
        &self.app_assignments
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

impl IdpEntity for CustomIdpUser {
    const TARGET: IdpPropertyTarget = IdpPropertyTarget::User;

    fn custom_properties_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.custom_properties
    }
}

impl EntityMut<'_, CustomIdpUser, IdpPropertyDefinitions> {
    /// Assigns an IdP application to the user.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] for a repeated assignment id and
    /// [`TemplateError::UnknownProperty`] for undeclared assignment
    /// properties.
    pub fn add_app_assignment(
        &mut self,
        id: &str,
        name: &str,
        app_id: &str,
        assignment_properties: Map<String, Value>,
    ) -> Result<(), TemplateError> {
        let definitions = self.definitions();
        let assignments = &mut self.entity_mut().app_assignments;
        push_app_assignment(assignments, definitions, "user", AppAssignmentSpec {
            id,
            name,
            app_id,
            custom_properties: assignment_properties,
        })
    }
}

/// Group of the identity provider.
///
/// Null and empty values are left out of the payload.
#[derive(Debug, Clone, Serialize)]
pub struct CustomIdpGroup {
    name: String,
    identity: String,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Whether the group is a security group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_security_group: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    assumed_role_arns: Vec<IdentityRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    groups: Vec<IdentityRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    custom_properties: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    app_assignments: Vec<IdpAppAssignment>,
}

impl CustomIdpGroup {
    /// Creates a group identified by `identity`, else `name`.
    #[must_use]
    pub fn new(name: &str, full_name: Option<&str>, identity: Option<&str>) -> Self {
        Self {
            name: name.to_owned(),
            identity: non_empty(identity).unwrap_or_else(|| name.to_owned()),
            full_name: full_name.map(str::to_owned),
            is_security_group: None,
            assumed_role_arns: Vec::new(),
            groups: Vec::new(),
            tags: Vec::new(),
            custom_properties: Map::new(),
            app_assignments: Vec::new(),
        }
    }

    /// Group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique identity of the group.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Adds role ARNs members may assume; repeats are ignored.
    pub fn add_assumed_role_arns(&mut self, arns: &[&str]) {
        push_identity_refs(&mut self.assumed_role_arns, arns);
    }

    /// Nests this group in the parent groups identified by
    /// `group_identities`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] when a parent is this group;
    /// parents before it are kept.
    pub fn add_groups(&mut self, group_identities: &[&str]) -> Result<(), TemplateError> {
        for group_identity in group_identities {
            if *group_identity == self.identity {
                return Err(TemplateError::conflict(format!(
                    "Cannot add a group to itself '{group_identity}'"
                )));
            }
            push_identity_refs(&mut self.groups, &[group_identity]);
        }
        Ok(())
    }

    /// Application assignments so far.
    #[must_use]
    pub fn app_assignments(&self) -> &[IdpAppAssignment] {
        &self.app_assignments
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

impl IdpEntity for CustomIdpGroup {
    const TARGET: IdpPropertyTarget = IdpPropertyTarget::Group;

    fn custom_properties_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.custom_properties
    }
}

impl EntityMut<'_, CustomIdpGroup, IdpPropertyDefinitions> {
    /// Assigns an IdP application to the group.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] for a repeated assignment id and
    /// [`TemplateError::UnknownProperty`] for undeclared assignment
    /// properties.
    pub fn add_app_assignment(
        &mut self,
        id: &str,
        name: &str,
        app_id: &str,
        assignment_properties: Map<String, Value>,
    ) -> Result<(), TemplateError> {
        let definitions = self.definitions();
        let assignments = &mut self.entity_mut().app_assignments;
        push_app_assignment(assignments, definitions, "group", AppAssignmentSpec {
            id,
            name,
            app_id,
            custom_properties: assignment_properties,
        })
    }
}

/// Application known to the identity provider. Emitted unfiltered.
#[derive(Debug, Clone, Serialize)]
pub struct CustomIdpApp {
    id: String,
    name: String,
    /// Free-text description.
    pub description: String,
    assumed_role_arns: Vec<IdentityRef>,
    custom_properties: Map<String, Value>,
    tags: Vec<Tag>,
}

impl CustomIdpApp {
    /// Creates an application with an empty description.
    #[must_use]
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            description: String::new(),
            assumed_role_arns: Vec::new(),
            custom_properties: Map::new(),
            tags: Vec::new(),
        }
    }

    /// Application id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Application name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds role ARNs the application may assume; repeats are ignored.
    pub fn add_assumed_role_arns(&mut self, arns: &[&str]) {
        push_identity_refs(&mut self.assumed_role_arns, arns);
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

impl IdpEntity for CustomIdpApp {
    const TARGET: IdpPropertyTarget = IdpPropertyTarget::App;

    fn custom_properties_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.custom_properties
    }
}

/// Custom identity provider payload.
///
/// # Examples
///
/// ```
/// use oaaclient::templates::{CustomIdpProvider, OaaPropertyType, OaaTemplate};
///
/// let mut idp = CustomIdpProvider::new("My IdP", "ldap", "example.com", None);
/// idp.property_definitions_mut()
///     .define_user_property("region", OaaPropertyType::String);
/// let mut user = idp
///     .add_user("alice", Some("Alice"), Some("alice@example.com"), None)
///     .expect("new user");
/// user.set_property("region", "emea").expect("declared property");
///
/// let payload = idp.payload().expect("serializable");
/// assert_eq!(payload["users"][0]["identity"], "alice");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct CustomIdpProvider {
    #[serde(rename = "custom_property_definition")]
    property_definitions: IdpPropertyDefinitions,
    name: String,
    idp_type: String,
    #[serde(rename = "domains", serialize_with = "serialize_domain")]
    domain: CustomIdpDomain,
    #[serde(serialize_with = "keyed::serialize_values")]
    users: CaseInsensitiveMap<CustomIdpUser>,
    #[serde(serialize_with = "keyed::serialize_values")]
    groups: CaseInsensitiveMap<CustomIdpGroup>,
    #[serde(serialize_with = "keyed::serialize_values")]
    apps: CaseInsensitiveMap<CustomIdpApp>,
    #[serde(skip)]
    description: Option<String>,
}

impl CustomIdpProvider {
    /// Creates a provider for `domain`.
    #[must_use]
    pub fn new(name: &str, idp_type: &str, domain: &str, description: Option<&str>) -> Self {
        Self {
            property_definitions: IdpPropertyDefinitions::default(),
            name: name.to_owned(),
            idp_type: idp_type.to_owned(),
            domain: CustomIdpDomain {
                name: domain.to_owned(),
                tags: Vec::new(),
                custom_properties: Map::new(),
            },
            users: CaseInsensitiveMap::new(),
            groups: CaseInsensitiveMap::new(),
            apps: CaseInsensitiveMap::new(),
            description: description.map(str::to_owned),
        }
    }

    /// Provider name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provider type label.
    #[must_use]
    pub fn idp_type(&self) -> &str {
        &self.idp_type
    }

    /// Optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Custom property declarations.
    #[must_use]
    pub const fn property_definitions(&self) -> &IdpPropertyDefinitions {
        &self.property_definitions
    }

    /// Mutable custom property declarations, for `define_*` calls.
    pub const fn property_definitions_mut(&mut self) -> &mut IdpPropertyDefinitions {
        &mut self.property_definitions
    }

    /// The provider's domain.
    #[must_use]
    pub const fn domain(&self) -> &CustomIdpDomain {
        &self.domain
    }

    /// Handle to the domain for setting properties and tags.
    pub const fn domain_mut(&mut self) -> EntityMut<'_, CustomIdpDomain, IdpPropertyDefinitions> {
        EntityMut::new(&mut self.domain, &self.property_definitions)
    }

    /// Creates a user identified by `identity`, else `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] when the identifier is taken.
    pub fn add_user(
        &mut self,
        name: &str,
        full_name: Option<&str>,
        email: Option<&str>,
        identity: Option<&str>,
    ) -> Result<EntityMut<'_, CustomIdpUser, IdpPropertyDefinitions>, TemplateError> {
        let user = CustomIdpUser::new(name, email, full_name, identity);
        let identifier = user.identity.clone();
        let stored = self.users.try_insert(&identifier, user).ok_or_else(|| {
            TemplateError::conflict(format!("IdP user identified by {identifier} already defined"))
        })?;
        Ok(EntityMut::new(stored, &self.property_definitions))
    }

    /// Users keyed by identity.
    #[must_use]
    pub const fn users(&self) -> &CaseInsensitiveMap<CustomIdpUser> {
        &self.users
    }

    /// Handle to a user.
    pub fn user_mut(
        &mut self,
        identity: &str,
    ) -> Option<EntityMut<'_, CustomIdpUser, IdpPropertyDefinitions>> {
        let definitions = &self.property_definitions;
        self.users
            .get_mut(identity)
            .map(|user| EntityMut::new(user, definitions))
    }

    /// Creates a group identified by `identity`, else `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] when the identifier is taken.
    pub fn add_group(
        &mut self,
        name: &str,
        full_name: Option<&str>,
        identity: Option<&str>,
    ) -> Result<EntityMut<'_, CustomIdpGroup, IdpPropertyDefinitions>, TemplateError> {
        let group = CustomIdpGroup::new(name, full_name, identity);
        let identifier = group.identity.clone();
        let stored = self
            .groups
            .try_insert(&identifier, group)
            .ok_or_else(|| TemplateError::conflict(format!("IdP group {identifier} already defined")))?;
        Ok(EntityMut::new(stored, &self.property_definitions))
    }

    /// Groups keyed by identity.
    #[must_use]
    pub const fn groups(&self) -> &CaseInsensitiveMap<CustomIdpGroup> {
        &self.groups
    }

    /// Handle to a group.
    pub fn group_mut(
        &mut self,
        identity: &str,
    ) -> Option<EntityMut<'_, CustomIdpGroup, IdpPropertyDefinitions>> {
        let definitions = &self.property_definitions;
        self.groups
            .get_mut(identity)
            .map(|group| EntityMut::new(group, definitions))
    }

    /// Creates an application.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] when the id is taken.
    pub fn add_app(
        &mut self,
        id: &str,
        name: &str,
    ) -> Result<EntityMut<'_, CustomIdpApp, IdpPropertyDefinitions>, TemplateError> {
        let stored = self
            .apps
            .try_insert(id, CustomIdpApp::new(id, name))
            .ok_or_else(|| TemplateError::conflict(format!("IdP App with ID {id} already defined")))?;
        Ok(EntityMut::new(stored, &self.property_definitions))
    }

    /// Applications keyed by id.
    #[must_use]
    pub const fn apps(&self) -> &CaseInsensitiveMap<CustomIdpApp> {
        &self.apps
    }

    /// Handle to an application.
    pub fn app_mut(&mut self, id: &str) -> Option<EntityMut<'_, CustomIdpApp, IdpPropertyDefinitions>> {
        let definitions = &self.property_definitions;
        self.apps
            .get_mut(id)
            .map(|app| EntityMut::new(app, definitions))
    }
}

impl OaaTemplate for CustomIdpProvider {
    fn template(&self) -> CustomTemplate {
        CustomTemplate::IdentityProvider
    }

    fn payload(&self) -> Result<Value, TemplateError> {
        Ok(serde_json::to_value(self)?)
    }
}

struct AppAssignmentSpec<'a> {
    id: &'a str,
    name: &'a str,
    app_id: &'a str,
    custom_properties: Map<String, Value>,
}

fn push_app_assignment(
    assignments: &mut Vec<IdpAppAssignment>,
    definitions: &IdpPropertyDefinitions,
    owner: &str,
    spec: AppAssignmentSpec<'_>,
) -> Result<(), TemplateError> {
    if assignments.iter().any(|existing| existing.id == spec.id) {
        return Err(TemplateError::conflict(format!(
            "App assignment with ID {} already exists for {owner}",
            spec.id
        )));
    }
    for name in spec.custom_properties.keys() {
        definitions.validate_property_name(name, IdpPropertyTarget::AppAssignment)?;
    }
    assignments.push(IdpAppAssignment {
        id: spec.id.to_owned(),
        name: spec.name.to_owned(),
        app_id: spec.app_id.to_owned(),
        custom_properties: spec.custom_properties,
    });
    Ok(())
}

fn push_identity_refs(target: &mut Vec<IdentityRef>, identities: &[&str]) {
    for identity in identities {
        if !target.iter().any(|known| known.identity == *identity) {
            target.push(IdentityRef {
                identity: (*identity).to_owned(),
            });
        }
    }
}

fn serialize_domain<S: serde::Serializer>(
    domain: &CustomIdpDomain,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(std::iter::once(domain))
}

#[cfg(test)]
mod tests {
    //! Identity provider containers and payload shape.

    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    #[fixture]
    fn idp() -> CustomIdpProvider {
        let mut idp = CustomIdpProvider::new("pytest idp", "pytest", "example.com", None);
        idp.property_definitions_mut()
            .define_user_property("region", OaaPropertyType::String);
        idp.property_definitions_mut()
            .define_app_assignment_property("granted_by", OaaPropertyType::String);
        idp.add_user("alice", Some("Alice A"), Some("alice@example.com"), None)
            .expect("new user");
        idp.add_group("admins", None, Some("g-1")).expect("new group");
        idp.add_app("app-1", "Portal").expect("new app");
        idp
    }

    #[rstest]
    fn duplicates_are_rejected(mut idp: CustomIdpProvider) {
        let error = idp
            .add_user("ALICE", None, None, None)
            .expect_err("duplicate user");
        assert_eq!(error.to_string(), "IdP user identified by ALICE already defined");
        let group_error = idp
            .add_group("other", None, Some("G-1"))
            .expect_err("duplicate group");
        assert_eq!(group_error.to_string(), "IdP group G-1 already defined");
        let app_error = idp.add_app("app-1", "Again").expect_err("duplicate app");
        assert_eq!(app_error.to_string(), "IdP App with ID app-1 already defined");
    }

    #[rstest]
    fn properties_are_validated_per_entity(mut idp: CustomIdpProvider) {
        let mut user = idp.user_mut("alice").expect("known user");
        user.set_property("REGION", "emea").expect("declared");
        let error = user.set_property("office", "HQ").expect_err("undeclared");
        assert_eq!(error.to_string(), "unknown property name office");

        let mut group = idp.group_mut("g-1").expect("known group");
        let group_error = group.set_property("region", "emea").expect_err("user only");
        assert_eq!(group_error.to_string(), "unknown property name region");
    }

    #[rstest]
    fn app_assignments_are_unique_and_validated(mut idp: CustomIdpProvider) {
        let mut properties = Map::new();
        properties.insert("granted_by".to_owned(), json!("ops"));
        let mut user = idp.user_mut("alice").expect("known user");
        user.add_app_assignment("as-1", "Portal access", "app-1", properties)
            .expect("first assignment");
        let error = user
            .add_app_assignment("as-1", "Portal access", "app-1", Map::new())
            .expect_err("duplicate assignment");
        assert_eq!(error.to_string(), "App assignment with ID as-1 already exists for user");

        let mut bad = Map::new();
        bad.insert("reason".to_owned(), json!("audit"));
        let mut group = idp.group_mut("g-1").expect("known group");
        let property_error = group
            .add_app_assignment("as-2", "Portal access", "app-1", bad)
            .expect_err("undeclared property");
        assert_eq!(property_error.to_string(), "unknown property name reason");
    }

    #[test]
    fn group_cannot_nest_in_itself() {
        let mut group = CustomIdpGroup::new("admins", None, None);
        group.add_groups(&["everyone"]).expect("other group");
        let error = group
            .add_groups(&["admins"])
            .expect_err("self nesting");
        assert_eq!(error.to_string(), "Cannot add a group to itself 'admins'");
    }

    #[rstest]
    fn payload_matches_template_shape(mut idp: CustomIdpProvider) {
        {
            let mut user = idp.user_mut("alice").expect("known user");
            user.is_active = Some(false);
            user.add_groups(&["g-1", "g-1"]);
            user.add_assumed_role_arns(&["arn:aws:iam::123456789012:role/admin"]);
            user.set_source_identity("alice@corp.example.com", IdpProviderType::Okta);
        }
        idp.domain_mut().add_tag("env", "prod").expect("valid tag");

        let payload = idp.payload().expect("serializable");
        assert_eq!(payload["name"], "pytest idp");
        assert_eq!(payload["idp_type"], "pytest");
        assert_eq!(
            payload["custom_property_definition"],
            json!({
                "domain_properties": {},
                "user_properties": {"region": "STRING"},
                "group_properties": {},
                "app_properties": {},
                "app_assignment_properties": {"granted_by": "STRING"}
            })
        );
        assert_eq!(
            payload["domains"],
            json!([{"name": "example.com", "tags": [{"key": "env", "value": "prod"}], "custom_properties": {}}])
        );
        assert_eq!(
            payload["users"],
            json!([{
                "name": "alice",
                "email": "alice@example.com",
                "identity": "alice",
                "full_name": "Alice A",
                "is_active": false,
                "groups": [{"identity": "g-1"}],
                "assumed_role_arns": [{"identity": "arn:aws:iam::123456789012:role/admin"}],
                "source_identity": {"identity": "alice@corp.example.com", "provider_type": "okta"}
            }])
        );
        assert_eq!(payload["groups"], json!([{"name": "admins", "identity": "g-1"}]));
        assert_eq!(
            payload["apps"],
            json!([{
                "id": "app-1",
                "name": "Portal",
                "description": "",
                "assumed_role_arns": [],
                "custom_properties": {},
                "tags": []
            }])
        );
        assert_eq!(idp.template(), CustomTemplate::IdentityProvider);
    }
}
