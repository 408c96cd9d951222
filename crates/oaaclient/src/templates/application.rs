//! The custom application template.
//!
//! A [`CustomApplication`] models the identities, resources, roles and
//! permissions of one application instance and renders the `application`
//! template payload:
//!
//! ```json
//! {
//!   "custom_property_definition": {"applications": [...]},
//!   "applications": [...],
//!   "permissions": [...],
//!   "identity_to_permissions": [...]
//! }
//! ```

use serde::Serialize;
use serde_json::{Map, Value};

use super::enums::{CustomTemplate, OaaIdentityType, OaaPermission};
use super::grants::{Identity, IdentityPermissions};
use super::identity::{AccessCred, IdpIdentity, LocalGroup, LocalUser};
use super::permission::CustomPermission;
use super::properties::{ApplicationPropertyDefinitions, PropertyTarget};
use super::resource::CustomResource;
use super::role::LocalRole;
use super::tag::{self, Tag};
use super::{non_empty, EntityMut, OaaTemplate};
use crate::error::TemplateError;
use crate::keyed::{self, CaseInsensitiveMap};

/// Authorization model of a custom application.
///
/// Serializing the application directly yields its entry in the payload's
/// `applications` list; use [`OaaTemplate::payload`] for the full payload.
///
/// # Examples
///
/// ```
/// use oaaclient::templates::{CustomApplication, OaaPermission, OaaTemplate};
/// use serde_json::Map;
///
/// let mut app = CustomApplication::new("Sample", "sample", None);
/// app.add_custom_permission("view", &[OaaPermission::DataRead], false, &[])
///     .expect("new permission");
/// let bucket_key = app
///     .add_resource("bucket1", "bucket", None, None)
///     .expect("new resource")
///     .key()
///     .to_owned();
/// let mut user = app.add_local_user("alice", &[], &[], None).expect("new user");
/// user.add_role("viewer", &[bucket_key.as_str()], None, Map::new())
///     .expect("no assignment properties");
///
/// let payload = app.payload().expect("serializable");
/// assert_eq!(payload["identity_to_permissions"][0]["identity"], "alice");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct CustomApplication {
    name: String,
    application_type: String,
    description: Option<String>,
    #[serde(serialize_with = "keyed::serialize_values")]
    local_users: CaseInsensitiveMap<LocalUser>,
    #[serde(serialize_with = "keyed::serialize_values")]
    local_groups: CaseInsensitiveMap<LocalGroup>,
    #[serde(serialize_with = "keyed::serialize_values")]
    local_roles: CaseInsensitiveMap<LocalRole>,
    #[serde(rename = "local_access_creds", serialize_with = "keyed::serialize_values")]
    access_creds: CaseInsensitiveMap<AccessCred>,
    tags: Vec<Tag>,
    custom_properties: Map<String, Value>,
    #[serde(serialize_with = "keyed::serialize_values")]
    resources: CaseInsensitiveMap<CustomResource>,
    #[serde(skip)]
    idp_identities: CaseInsensitiveMap<IdpIdentity>,
    #[serde(skip)]
    custom_permissions: CaseInsensitiveMap<CustomPermission>,
    #[serde(skip)]
    property_definitions: ApplicationPropertyDefinitions,
}

impl CustomApplication {
    /// Creates an empty application.
    ///
    /// `application_type` is a searchable label shared by instances of the
    /// same kind of application.
    #[must_use]
    pub fn new(name: &str, application_type: &str, description: Option<&str>) -> Self {
        Self {
            name: name.to_owned(),
            application_type: application_type.to_owned(),
            description: description.map(str::to_owned),
            local_users: CaseInsensitiveMap::new(),
            local_groups: CaseInsensitiveMap::new(),
            local_roles: CaseInsensitiveMap::new(),
            access_creds: CaseInsensitiveMap::new(),
            tags: Vec::new(),
            custom_properties: Map::new(),
            resources: CaseInsensitiveMap::new(),
            idp_identities: CaseInsensitiveMap::new(),
            custom_permissions: CaseInsensitiveMap::new(),
            property_definitions: ApplicationPropertyDefinitions::new(application_type),
        }
    }

    /// Application name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Searchable application type.
    #[must_use]
    pub fn application_type(&self) -> &str {
        &self.application_type
    }

    /// Optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Custom property declarations.
    #[must_use]
    pub const fn property_definitions(&self) -> &ApplicationPropertyDefinitions {
        &self.property_definitions
    }

    /// Mutable custom property declarations, for `define_*` calls.
    pub const fn property_definitions_mut(&mut self) -> &mut ApplicationPropertyDefinitions {
        &mut self.property_definitions
    }

    /// Application-level custom property values.
    #[must_use]
    pub const fn custom_properties(&self) -> &Map<String, Value> {
        &self.custom_properties
    }

    /// Tags attached to the application.
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Adds a tag to the application, ignoring exact duplicates.
    ///
    /// # Errors
    ///
    /// Returns the tag validation error for malformed keys or values.
    pub fn add_tag(&mut self, key: &str, value: &str) -> Result<(), TemplateError> {
        tag::push_unique(&mut self.tags, key, value)
    }

    /// Sets an application-level custom property.
    ///
    /// # Errors
    ///
    /// Returns the validation error when `name` is not declared as an
    /// application property.
    pub fn set_property(&mut self, name: &str, value: impl Into<Value>) -> Result<(), TemplateError> {
        self.property_definitions
            .validate_property_name(name, PropertyTarget::Application)?;
        self.custom_properties.insert(name.to_owned(), value.into());
        Ok(())
    }

    /// Creates a custom permission mapped onto canonical permissions.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] when the name is taken.
    pub fn add_custom_permission(
        &mut self,
        name: &str,
        permissions: &[OaaPermission],
        apply_to_sub_resources: bool,
        resource_types: &[&str],
    ) -> Result<&mut CustomPermission, TemplateError> {
        let mut permission = CustomPermission::new(name, permissions, apply_to_sub_resources);
        for resource_type in resource_types {
            permission.add_resource_type(resource_type);
        }
        self.custom_permissions
            .try_insert(name, permission)
            .ok_or_else(|| TemplateError::conflict(format!("Custom permission {name} already exists")))
    }

    /// Registers a prebuilt custom permission.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] when the name is taken.
    pub fn define_custom_permission(
        &mut self,
        permission: CustomPermission,
    ) -> Result<&mut CustomPermission, TemplateError> {
        let name = permission.name().to_owned();
        self.custom_permissions
            .try_insert(&name, permission)
            .ok_or_else(|| TemplateError::conflict(format!("Custom permission {name} already defined")))
    }

    /// Custom permissions keyed by name.
    #[must_use]
    pub const fn custom_permissions(&self) -> &CaseInsensitiveMap<CustomPermission> {
        &self.custom_permissions
    }

    /// Mutable custom permission lookup.
    pub fn custom_permission_mut(&mut self, name: &str) -> Option<&mut CustomPermission> {
        self.custom_permissions.get_mut(name)
    }

    /// Creates a top-level resource identified by `unique_id`, else `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] when the identifier is taken.
    pub fn add_resource(
        &mut self,
        name: &str,
        resource_type: &str,
        description: Option<&str>,
        unique_id: Option<&str>,
    ) -> Result<EntityMut<'_, CustomResource>, TemplateError> {
        let identifier = identifier_of(name, unique_id);
        let resource = CustomResource::new(name, resource_type, description, unique_id);
        let stored = self.resources.try_insert(&identifier, resource).ok_or_else(|| {
            TemplateError::conflict(format!("Resource identified by {identifier} already defined"))
        })?;
        Ok(EntityMut::new(stored, &self.property_definitions))
    }

    /// Top-level resources keyed by unique id or name.
    #[must_use]
    pub const fn resources(&self) -> &CaseInsensitiveMap<CustomResource> {
        &self.resources
    }

    /// Handle to a top-level resource.
    pub fn resource_mut(&mut self, identifier: &str) -> Option<EntityMut<'_, CustomResource>> {
        let definitions = &self.property_definitions;
        self.resources
            .get_mut(identifier)
            .map(|resource| EntityMut::new(resource, definitions))
    }

    /// Creates a local user identified by `unique_id`, else `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] when the identifier is taken.
    pub fn add_local_user(
        &mut self,
        name: &str,
        identities: &[&str],
        groups: &[&str],
        unique_id: Option<&str>,
    ) -> Result<EntityMut<'_, LocalUser>, TemplateError> {
        let identifier = identifier_of(name, unique_id);
        let mut user = LocalUser::new(name, unique_id);
        user.add_identities(identities);
        for group in groups {
            user.add_group(group);
        }
        let stored = self.local_users.try_insert(&identifier, user).ok_or_else(|| {
            TemplateError::conflict(format!("Local user identified by {identifier} already defined"))
        })?;
        Ok(EntityMut::new(stored, &self.property_definitions))
    }

    /// Local users keyed by unique id or name.
    #[must_use]
    pub const fn local_users(&self) -> &CaseInsensitiveMap<LocalUser> {
        &self.local_users
    }

    /// Handle to a local user.
    pub fn local_user_mut(&mut self, identifier: &str) -> Option<EntityMut<'_, LocalUser>> {
        let definitions = &self.property_definitions;
        self.local_users
            .get_mut(identifier)
            .map(|user| EntityMut::new(user, definitions))
    }

    /// Creates a local group identified by `unique_id`, else `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] when the identifier is taken.
    pub fn add_local_group(
        &mut self,
        name: &str,
        identities: &[&str],
        unique_id: Option<&str>,
    ) -> Result<EntityMut<'_, LocalGroup>, TemplateError> {
        let identifier = identifier_of(name, unique_id);
        let mut group = LocalGroup::new(name, unique_id);
        for identity in identities {
            group.add_identity(identity);
        }
        let stored = self.local_groups.try_insert(&identifier, group).ok_or_else(|| {
            TemplateError::conflict(format!("Local group identified by {identifier} already defined"))
        })?;
        Ok(EntityMut::new(stored, &self.property_definitions))
    }

    /// Local groups keyed by unique id or name.
    #[must_use]
    pub const fn local_groups(&self) -> &CaseInsensitiveMap<LocalGroup> {
        &self.local_groups
    }

    /// Handle to a local group.
    pub fn local_group_mut(&mut self, identifier: &str) -> Option<EntityMut<'_, LocalGroup>> {
        let definitions = &self.property_definitions;
        self.local_groups
            .get_mut(identifier)
            .map(|group| EntityMut::new(group, definitions))
    }

    /// Creates a local role identified by `unique_id`, else `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] when the identifier is taken.
    pub fn add_local_role(
        &mut self,
        name: &str,
        permissions: &[&str],
        unique_id: Option<&str>,
    ) -> Result<EntityMut<'_, LocalRole>, TemplateError> {
        let identifier = identifier_of(name, unique_id);
        let role = LocalRole::new(name, permissions, unique_id);
        let stored = self.local_roles.try_insert(&identifier, role).ok_or_else(|| {
            TemplateError::conflict(format!("Local role identified by {identifier} already defined"))
        })?;
        Ok(EntityMut::new(stored, &self.property_definitions))
    }

    /// Local roles keyed by unique id or name.
    #[must_use]
    pub const fn local_roles(&self) -> &CaseInsensitiveMap<LocalRole> {
        &self.local_roles
    }

    /// Handle to a local role.
    pub fn local_role_mut(&mut self, identifier: &str) -> Option<EntityMut<'_, LocalRole>> {
        let definitions = &self.property_definitions;
        self.local_roles
            .get_mut(identifier)
            .map(|role| EntityMut::new(role, definitions))
    }

    /// Creates an IdP identity granted access without a local account.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] when the name is taken.
    pub fn add_idp_identity(&mut self, name: &str) -> Result<EntityMut<'_, IdpIdentity>, TemplateError> {
        let stored = self
            .idp_identities
            .try_insert(name, IdpIdentity::new(name))
            .ok_or_else(|| TemplateError::conflict(format!("IdP Identity {name} already defined")))?;
        Ok(EntityMut::new(stored, &self.property_definitions))
    }

    /// IdP identities keyed by name.
    #[must_use]
    pub const fn idp_identities(&self) -> &CaseInsensitiveMap<IdpIdentity> {
        &self.idp_identities
    }

    /// Handle to an IdP identity.
    pub fn idp_identity_mut(&mut self, name: &str) -> Option<EntityMut<'_, IdpIdentity>> {
        let definitions = &self.property_definitions;
        self.idp_identities
            .get_mut(name)
            .map(|identity| EntityMut::new(identity, definitions))
    }

    /// Creates an access credential.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] when the id is taken, or
    /// [`TemplateError::InvalidArgument`] when the id or name is empty.
    pub fn add_access_cred(
        &mut self,
        unique_id: &str,
        name: &str,
    ) -> Result<EntityMut<'_, AccessCred>, TemplateError> {
        let cred = AccessCred::new(unique_id, name)?;
        let stored = self.access_creds.try_insert(unique_id, cred).ok_or_else(|| {
            TemplateError::conflict(format!(
                "Access credential identified by {unique_id} already exists"
            ))
        })?;
        Ok(EntityMut::new(stored, &self.property_definitions))
    }

    /// Access credentials keyed by unique id.
    #[must_use]
    pub const fn access_creds(&self) -> &CaseInsensitiveMap<AccessCred> {
        &self.access_creds
    }

    /// Handle to an access credential.
    pub fn access_cred_mut(&mut self, unique_id: &str) -> Option<EntityMut<'_, AccessCred>> {
        let definitions = &self.property_definitions;
        self.access_creds
            .get_mut(unique_id)
            .map(|cred| EntityMut::new(cred, definitions))
    }

    /// Grants `permission` to an identity on the application, or on
    /// `resource` when given.
    ///
    /// Kept for callers of the older access API; new code grants access
    /// through the identity handles. IdP identities are created on demand.
    /// A grant on `resource` covers that resource only and does not also
    /// grant `permission` on the application.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidArgument`] when the identity or
    /// resource does not exist or the identity type cannot hold access.
    pub fn add_access(
        &mut self,
        identity: &str,
        identity_type: OaaIdentityType,
        permission: &str,
        resource: Option<&str>,
    ) -> Result<(), TemplateError> {
        let resource_key = resource
            .map(|identifier| {
                self.resources
                    .get(identifier)
                    .map(|found| found.key().to_owned())
                    .ok_or_else(|| {
                        TemplateError::invalid_argument(format!(
                            "Resource {identifier} not found in resources"
                        ))
                    })
            })
            .transpose()?;
        let resource_keys: Vec<&str> = resource_key.iter().map(String::as_str).collect();
        let apply_to_application = resource_key.is_none();

        match identity_type {
            OaaIdentityType::LocalUser => self
                .local_users
                .get_mut(identity)
                .ok_or_else(|| {
                    TemplateError::invalid_argument(format!("User {identity} not found in local_users"))
                })?
                .add_permission(permission, &resource_keys, apply_to_application),
            OaaIdentityType::LocalGroup => self
                .local_groups
                .get_mut(identity)
                .ok_or_else(|| {
                    TemplateError::invalid_argument(format!(
                        "Group {identity} not found in local_groups"
                    ))
                })?
                .add_permission(permission, &resource_keys, apply_to_application),
            OaaIdentityType::Idp => {
                if !self.idp_identities.contains_key(identity) {
                    self.idp_identities.insert(identity, IdpIdentity::new(identity));
                }
                self.idp_identities
                    .get_mut(identity)
                    .ok_or_else(|| {
                        TemplateError::invalid_argument(format!("IdP Identity {identity} not found"))
                    })?
                    .add_permission(permission, &resource_keys, apply_to_application)
            }
            OaaIdentityType::LocalRole | OaaIdentityType::AccessCred => {
                Err(TemplateError::invalid_argument(format!(
                    "add_access does not support identity type {identity_type}"
                )))
            }
        }
    }

    fn identity_to_permissions(&self) -> Vec<IdentityPermissions<'_>> {
        let users = self.local_users.values().map(|user| self.entry_for(user));
        let groups = self.local_groups.values().map(|group| self.entry_for(group));
        let idp = self.idp_identities.values().map(|identity| self.entry_for(identity));
        let creds = self.access_creds.values().map(|cred| self.entry_for(cred));
        users
            .chain(groups)
            .chain(idp)
            .chain(creds)
            .filter(IdentityPermissions::has_grants)
            .collect()
    }

    fn entry_for<'a, I: Identity>(&'a self, identity: &'a I) -> IdentityPermissions<'a> {
        identity
            .grants()
            .to_entry(identity.identifier(), identity.identity_type(), &self.name)
    }
}

#[derive(Serialize)]
struct DefinitionsSection<'a> {
    applications: [&'a ApplicationPropertyDefinitions; 1],
}

#[derive(Serialize)]
struct ApplicationPayload<'a> {
    custom_property_definition: DefinitionsSection<'a>,
    applications: [&'a CustomApplication; 1],
    permissions: Vec<&'a CustomPermission>,
    identity_to_permissions: Vec<IdentityPermissions<'a>>,
}

impl OaaTemplate for CustomApplication {
    fn template(&self) -> CustomTemplate {
        CustomTemplate::Application
    }

    fn payload(&self) -> Result<Value, TemplateError> {
        let payload = ApplicationPayload {
            custom_property_definition: DefinitionsSection {
                applications: [&self.property_definitions],
            },
            applications: [self],
            permissions: self.custom_permissions.values().collect(),
            identity_to_permissions: self.identity_to_permissions(),
        };
        Ok(serde_json::to_value(payload)?)
    }
}

fn identifier_of(name: &str, unique_id: Option<&str>) -> String {
    non_empty(unique_id).unwrap_or_else(|| name.to_owned())
}

#[cfg(test)]
mod tests {
    //! Application containers, legacy access and payload assembly.

    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::templates::OaaPropertyType;

    #[fixture]
    fn app() -> CustomApplication {
        let mut app = CustomApplication::new("pytest app", "pytest", Some("test app"));
        app.add_custom_permission("read", &[OaaPermission::DataRead], false, &[])
            .expect("new permission");
        app.add_resource("bucket1", "bucket", None, None)
            .expect("new resource");
        app.add_local_user("alice", &["alice@example.com"], &[], None)
            .expect("new user");
        app.add_local_group("admins", &[], None).expect("new group");
        app
    }

    #[rstest]
    fn duplicate_identifiers_are_case_insensitive(mut app: CustomApplication) {
        let error = app
            .add_local_user("ALICE", &[], &[], None)
            .expect_err("duplicate user");
        assert_eq!(error.to_string(), "Local user identified by ALICE already defined");
        let resource_error = app
            .add_resource("Bucket1", "bucket", None, None)
            .expect_err("duplicate resource");
        assert_eq!(resource_error.to_string(), "Resource identified by Bucket1 already defined");
        let added_error = app
            .add_custom_permission("READ", &[], false, &[])
            .expect_err("duplicate permission");
        assert_eq!(added_error.to_string(), "Custom permission READ already exists");
        let defined_error = app
            .define_custom_permission(CustomPermission::new("read", &[], false))
            .expect_err("duplicate permission");
        assert_eq!(defined_error.to_string(), "Custom permission read already defined");
    }

    #[rstest]
    fn unique_ids_key_the_containers(mut app: CustomApplication) {
        app.add_local_user("alice", &[], &[], Some("u-2"))
            .expect("same name, new id");
        assert!(app.local_users().contains_key("u-2"));
        app.add_access_cred("key-1", "Deploy key").expect("new cred");
        let error = app
            .add_access_cred("KEY-1", "Other key")
            .expect_err("duplicate cred");
        assert_eq!(error.to_string(), "Access credential identified by KEY-1 already exists");
    }

    #[rstest]
    fn handles_validate_properties(mut app: CustomApplication) {
        app.property_definitions_mut()
            .define_local_user_property("department", OaaPropertyType::String)
            .expect("valid name");
        let mut user = app.local_user_mut("alice").expect("known user");
        user.set_property("Department", "eng").expect("declared");
        let error = user
            .set_property("office", "HQ")
            .expect_err("undeclared");
        assert_eq!(error.to_string(), "unknown property name office");

        let mut resource = app.resource_mut("bucket1").expect("known resource");
        let resource_error = resource
            .set_property("region", "eu")
            .expect_err("no resource properties");
        assert_eq!(resource_error.to_string(), "No custom properties defined for resource type bucket");
    }

    #[rstest]
    fn role_assignment_properties_are_validated(mut app: CustomApplication) {
        let mut properties = Map::new();
        properties.insert("granted_by".to_owned(), json!("ops"));
        let mut user = app.local_user_mut("alice").expect("known user");
        let error = user
            .add_role("viewer", &[], Some(true), properties.clone())
            .expect_err("undeclared assignment property");
        assert_eq!(error.to_string(), "unknown property name granted_by");

        app.property_definitions_mut()
            .define_role_assignment_property("granted_by", OaaPropertyType::String)
            .expect("valid name");
        let mut declared = app.local_user_mut("alice").expect("known user");
        declared
            .add_role("viewer", &[], Some(true), properties)
            .expect("declared assignment property");
    }

    #[rstest]
    fn application_property_requires_definition(mut app: CustomApplication) {
        let error = app.set_property("owner", "ops").expect_err("undeclared");
        assert_eq!(error.to_string(), "unknown property name owner");
        app.property_definitions_mut()
            .define_application_property("owner", OaaPropertyType::String)
            .expect("valid name");
        app.set_property("owner", "ops").expect("declared");
        assert_eq!(app.custom_properties().get("owner"), Some(&json!("ops")));
    }

    #[rstest]
    fn legacy_access_targets_application_without_resource(mut app: CustomApplication) {
        app.add_access("alice", OaaIdentityType::LocalUser, "read", None)
            .expect("known user");
        app.add_access("admins", OaaIdentityType::LocalGroup, "read", Some("bucket1"))
            .expect("known group and resource");
        app.add_access("bob@example.com", OaaIdentityType::Idp, "read", None)
            .expect("idp identity created");

        let alice = app.local_users().get("alice").expect("known user");
        assert_eq!(alice.grants().application_permissions(), ["read"]);
        let admins = app.local_groups().get("admins").expect("known group");
        assert!(admins.grants().application_permissions().is_empty());
        assert_eq!(
            admins.grants().resource_permission("read"),
            Some(["bucket1".to_owned()].as_slice())
        );
        assert!(app.idp_identities().contains_key("bob@example.com"));
    }

    #[rstest]
    fn legacy_access_requires_existing_entities(mut app: CustomApplication) {
        let error = app
            .add_access("carol", OaaIdentityType::LocalUser, "read", None)
            .expect_err("unknown user");
        assert_eq!(error.to_string(), "User carol not found in local_users");
        let resource_error = app
            .add_access("alice", OaaIdentityType::LocalUser, "read", Some("missing"))
            .expect_err("unknown resource");
        assert_eq!(resource_error.to_string(), "Resource missing not found in resources");
    }

    #[rstest]
    fn payload_lists_only_identities_with_grants(mut app: CustomApplication) {
        {
            let mut user = app.local_user_mut("alice").expect("known user");
            user.add_permission("read", &["bucket1"], false)
                .expect("resource target");
        }
        app.add_tag("env", "prod").expect("valid tag");

        let payload = app.payload().expect("serializable");
        assert_eq!(
            payload["custom_property_definition"],
            json!({"applications": [{"application_type": "pytest"}]})
        );
        assert_eq!(payload["applications"][0]["name"], "pytest app");
        assert_eq!(payload["applications"][0]["description"], "test app");
        assert_eq!(payload["applications"][0]["local_users"][0]["identities"], json!(["alice@example.com"]));
        assert_eq!(payload["applications"][0]["tags"], json!([{"key": "env", "value": "prod"}]));
        assert_eq!(
            payload["permissions"],
            json!([{
                "name": "read",
                "permission_type": ["DataRead"],
                "apply_to_sub_resources": false,
                "resource_types": []
            }])
        );
        assert_eq!(
            payload["identity_to_permissions"],
            json!([{
                "identity": "alice",
                "identity_type": "local_user",
                "application_permissions": [
                    {"application": "pytest app", "resources": ["bucket1"], "permission": "read"}
                ]
            }])
        );
    }

    #[test]
    fn missing_description_serializes_as_null() {
        let app = CustomApplication::new("bare", "bare", None);
        let payload = app.payload().expect("serializable");
        assert_eq!(payload["applications"][0]["description"], Value::Null);
        assert_eq!(app.template(), CustomTemplate::Application);
    }
}
