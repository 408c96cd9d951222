//! Identities of a custom application: local users, local groups, IdP
//! identities and access credentials.

use serde::Serialize;
use serde_json::{Map, Value};

use super::enums::{LocalUserType, OaaIdentityType};
use super::grants::{Grants, Identity};
use super::properties::PropertyTarget;
use super::tag::{self, Tag};
use super::{is_blank, non_empty, HasProperties};
use crate::error::TemplateError;

macro_rules! identity_impl {
    ($ty:ty, $kind:expr, $target:expr) => {
        impl Identity for $ty {
            fn identity_type(&self) -> OaaIdentityType {
                $kind
            }

            fn identifier(&self) -> &str {
                self.unique_id.as_deref().unwrap_or(&self.name)
            }

            fn grants(&self) -> &Grants {
                &self.grants
            }

            fn grants_mut(&mut self) -> &mut Grants {
                &mut self.grants
            }
        }

        impl HasProperties for $ty {
            fn property_target(&self) -> PropertyTarget<'_> {
                $target
            }

            fn custom_properties_mut(&mut self) -> &mut Map<String, Value> {
                &mut self.custom_properties
            }
        }

        impl $ty {
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

            /// Custom property values set so far.
            #[must_use]
            pub const fn custom_properties(&self) -> &Map<String, Value> {
                &self.custom_properties
            }

            /// Tags attached to the identity.
            #[must_use]
            pub fn tags(&self) -> &[Tag] {
                &self.tags
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
    };
}

/// User account local to the application.
///
/// Null and empty values are left out of the payload; `false` is kept.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LocalUser {
    name: String,
    /// Contact email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// IdP identities (usually emails) the user maps to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    groups: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    access_creds: Vec<String>,
    /// Whether the account is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// RFC 3339 creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// RFC 3339 time of the last login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<String>,
    /// RFC 3339 deactivation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated_at: Option<String>,
    /// RFC 3339 time of the last password change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_last_changed_at: Option<String>,
    /// Human or service account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<LocalUserType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    custom_properties: Map<String, Value>,
    #[serde(rename = "id", skip_serializing_if = "Option::is_none")]
    unique_id: Option<String>,
    #[serde(skip)]
    grants: Grants,
}

identity_impl!(LocalUser, OaaIdentityType::LocalUser, PropertyTarget::LocalUser);

impl LocalUser {
    /// Creates a user identified by `unique_id`, else `name`.
    #[must_use]
    pub fn new(name: &str, unique_id: Option<&str>) -> Self {
        Self {
            name: name.to_owned(),
            unique_id: non_empty(unique_id),
            ..Self::default()
        }
    }

    /// Associates the user with an IdP identity.
    pub fn add_identity(&mut self, identity: &str) {
        self.identities.push(identity.to_owned());
    }

    /// Associates the user with several IdP identities.
    pub fn add_identities(&mut self, identities: &[&str]) {
        self.identities
            .extend(identities.iter().map(|identity| (*identity).to_owned()));
    }

    /// Local groups the user belongs to.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Adds the user to a local group; repeats are ignored.
    pub fn add_group(&mut self, group: &str) {
        if !self.groups.iter().any(|known| known == group) {
            self.groups.push(group.to_owned());
        }
    }

    /// Access credentials owned by the user.
    #[must_use]
    pub fn access_creds(&self) -> &[String] {
        &self.access_creds
    }

    /// Links an access credential to the user; repeats are ignored.
    pub fn add_access_cred(&mut self, access_cred: &str) {
        if !self.access_creds.iter().any(|known| known == access_cred) {
            self.access_creds.push(access_cred.to_owned());
        }
    }
}

/// Group of local users.
///
/// Empty and false values are left out of the payload.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LocalGroup {
    #[serde(skip_serializing_if = "String::is_empty")]
    name: String,
    /// IdP identities the group maps to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<String>,
    /// RFC 3339 creation time.
    #[serde(skip_serializing_if = "is_blank")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    groups: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    custom_properties: Map<String, Value>,
    #[serde(rename = "id", skip_serializing_if = "Option::is_none")]
    unique_id: Option<String>,
    #[serde(skip)]
    grants: Grants,
}

identity_impl!(LocalGroup, OaaIdentityType::LocalGroup, PropertyTarget::LocalGroup);

impl LocalGroup {
    /// Creates a group identified by `unique_id`, else `name`.
    #[must_use]
    pub fn new(name: &str, unique_id: Option<&str>) -> Self {
        Self {
            name: name.to_owned(),
            unique_id: non_empty(unique_id),
            ..Self::default()
        }
    }

    /// Associates the group with an IdP identity.
    pub fn add_identity(&mut self, identity: &str) {
        self.identities.push(identity.to_owned());
    }

    /// Groups this group is nested in.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Nests this group inside `group`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] when `group` is this group.
    pub fn add_group(&mut self, group: &str) -> Result<(), TemplateError> {
        if self.identifier() == group {
            return Err(TemplateError::conflict("Cannot add group to self"));
        }
        if !self.groups.iter().any(|known| known == group) {
            self.groups.push(group.to_owned());
        }
        Ok(())
    }
}

/// Federated user or group granted access directly, without a local
/// account.
#[derive(Debug, Clone, Default)]
pub struct IdpIdentity {
    name: String,
    grants: Grants,
}

impl IdpIdentity {
    /// Creates an identity for the IdP principal `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            grants: Grants::default(),
        }
    }

    /// IdP identifier (email, group name, ...).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// IdP identities are discovered through their provider and carry no
    /// custom properties.
    ///
    /// # Errors
    ///
    /// Always returns [`TemplateError::PropertiesUnsupported`].
    pub const fn set_property(&self, _name: &str, _value: &Value) -> Result<(), TemplateError> {
        Err(TemplateError::PropertiesUnsupported {
            entity: "IdP identities",
        })
    }
}

impl Identity for IdpIdentity {
    fn identity_type(&self) -> OaaIdentityType {
        OaaIdentityType::Idp
    }

    fn identifier(&self) -> &str {
        &self.name
    }

    fn grants(&self) -> &Grants {
        &self.grants
    }

    fn grants_mut(&mut self) -> &mut Grants {
        &mut self.grants
    }
}

/// Non-user access method such as an API key or an integration token.
///
/// Null and empty values are left out of the payload; `false` is kept.
#[derive(Debug, Clone, Serialize)]
pub struct AccessCred {
    #[serde(rename = "id", skip_serializing_if = "Option::is_none")]
    unique_id: Option<String>,
    name: String,
    /// Whether the credential is usable. Defaults to `true`.
    pub is_active: bool,
    /// RFC 3339 creation time.
    #[serde(skip_serializing_if = "is_blank")]
    pub created_at: Option<String>,
    /// RFC 3339 expiry time.
    #[serde(skip_serializing_if = "is_blank")]
    pub expires_at: Option<String>,
    /// RFC 3339 time of last use.
    #[serde(skip_serializing_if = "is_blank")]
    pub last_used_at: Option<String>,
    /// Whether this kind of credential can expire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_expire: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    custom_properties: Map<String, Value>,
    #[serde(skip)]
    grants: Grants,
}

identity_impl!(AccessCred, OaaIdentityType::AccessCred, PropertyTarget::AccessCred);

impl AccessCred {
    /// Creates an active credential.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidArgument`] when either value is empty.
    pub fn new(unique_id: &str, name: &str) -> Result<Self, TemplateError> {
        if unique_id.is_empty() {
            return Err(TemplateError::invalid_argument("Unique ID cannot be empty"));
        }
        if name.is_empty() {
            return Err(TemplateError::invalid_argument("Name cannot be empty"));
        }
        Ok(Self {
            unique_id: Some(unique_id.to_owned()),
            name: name.to_owned(),
            is_active: true,
            created_at: None,
            expires_at: None,
            last_used_at: None,
            can_expire: None,
            tags: Vec::new(),
            custom_properties: Map::new(),
            grants: Grants::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    //! Identity construction and payload shapes.

    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn local_user_keeps_false_and_drops_empty_values() {
        let mut user = LocalUser::new("bob", Some("u-1"));
        user.is_active = Some(false);
        user.email = Some("bob@example.com".to_owned());
        user.add_group("admins");
        user.add_group("admins");
        user.add_access_cred("key-1");

        let json = serde_json::to_value(&user).expect("serializes");
        assert_eq!(
            json,
            json!({
                "name": "bob",
                "email": "bob@example.com",
                "groups": ["admins"],
                "access_creds": ["key-1"],
                "is_active": false,
                "id": "u-1"
            })
        );
    }

    #[rstest]
    #[case::by_name(None, "bob")]
    #[case::by_id(Some("u-1"), "u-1")]
    fn identifier_prefers_unique_id(#[case] unique_id: Option<&str>, #[case] expected: &str) {
        let user = LocalUser::new("bob", unique_id);
        assert_eq!(user.identifier(), expected);
        assert_eq!(user.identity_type(), OaaIdentityType::LocalUser);
    }

    #[rstest]
    #[case::by_name(None, "admins")]
    #[case::by_id(Some("g-1"), "g-1")]
    fn group_cannot_contain_itself(#[case] unique_id: Option<&str>, #[case] own_key: &str) {
        let mut group = LocalGroup::new("admins", unique_id);
        let error = group.add_group(own_key).expect_err("self nesting");
        assert_eq!(error.to_string(), "Cannot add group to self");
    }

    #[test]
    fn local_group_drops_blank_values() {
        let mut group = LocalGroup::new("admins", None);
        group.created_at = Some(String::new());
        group.add_group("everyone").expect("other group");
        let json = serde_json::to_value(&group).expect("serializes");
        assert_eq!(json, json!({"name": "admins", "groups": ["everyone"]}));
    }

    #[test]
    fn idp_identity_rejects_properties() {
        let identity = IdpIdentity::new("alice@example.com");
        let error = identity
            .set_property("department", &json!("eng"))
            .expect_err("unsupported");
        assert_eq!(error.to_string(), "IdP identities do not support custom properties");
    }

    #[rstest]
    #[case::id("", "key", "Unique ID cannot be empty")]
    #[case::name("key-1", "", "Name cannot be empty")]
    fn access_cred_requires_id_and_name(#[case] id: &str, #[case] name: &str, #[case] message: &str) {
        let error = AccessCred::new(id, name).expect_err("missing value");
        assert_eq!(error.to_string(), message);
    }

    #[test]
    fn access_cred_defaults_to_active() {
        let mut cred = AccessCred::new("key-1", "Deploy key").expect("valid");
        cred.created_at = Some(String::new());
        cred.can_expire = Some(false);
        let json = serde_json::to_value(&cred).expect("serializes");
        assert_eq!(
            json,
            json!({"id": "key-1", "name": "Deploy key", "is_active": true, "can_expire": false})
        );
    }
}
