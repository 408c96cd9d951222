//! Application resources and nested sub-resources.

use serde::Serialize;
use serde_json::{Map, Value};

use super::properties::PropertyTarget;
use super::tag::{self, Tag};
use super::{non_empty, EntityMut, HasProperties};
use crate::error::TemplateError;
use crate::keyed::{self, CaseInsensitiveMap};

/// External node a resource is connected to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceConnection {
    id: String,
    node_type: String,
}

/// Resource or sub-resource of a custom application.
///
/// Permissions and roles reference resources by their resource key: the
/// unique id when one was given, otherwise the name. Sub-resource keys are
/// prefixed with the parent key and a `.`.
#[derive(Debug, Clone, Serialize)]
pub struct CustomResource {
    #[serde(rename = "id", skip_serializing_if = "Option::is_none")]
    unique_id: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    resource_type: String,
    #[serde(skip_serializing_if = "super::is_blank")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    connections: Vec<ResourceConnection>,
    #[serde(
        skip_serializing_if = "CaseInsensitiveMap::is_empty",
        serialize_with = "keyed::serialize_values"
    )]
    sub_resources: CaseInsensitiveMap<CustomResource>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    custom_properties: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<Tag>,
    #[serde(skip)]
    resource_key: String,
}

impl CustomResource {
    /// Creates a top-level resource.
    #[must_use]
    pub fn new(
        name: &str,
        resource_type: &str,
        description: Option<&str>,
        unique_id: Option<&str>,
    ) -> Self {
        let id = non_empty(unique_id);
        let resource_key = id.clone().unwrap_or_else(|| name.to_owned());
        Self {
            unique_id: id,
            name: name.to_owned(),
            resource_type: resource_type.to_owned(),
            description: description.map(str::to_owned),
            connections: Vec::new(),
            sub_resources: CaseInsensitiveMap::new(),
            custom_properties: Map::new(),
            tags: Vec::new(),
            resource_key,
        }
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

    /// Resource type used for grouping and property definitions.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Free-text description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Key identities use to reference this resource.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.resource_key
    }

    /// Connections to external nodes.
    #[must_use]
    pub fn connections(&self) -> &[ResourceConnection] {
        &self.connections
    }

    /// Custom property values set so far.
    #[must_use]
    pub const fn custom_properties(&self) -> &Map<String, Value> {
        &self.custom_properties
    }

    /// Tags attached to the resource.
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Sub-resources keyed by unique id or name.
    #[must_use]
    pub const fn sub_resources(&self) -> &CaseInsensitiveMap<Self> {
        &self.sub_resources
    }

    /// Looks up a direct sub-resource by unique id or name.
    pub fn sub_resource_mut(&mut self, identifier: &str) -> Option<&mut Self> {
        self.sub_resources.get_mut(identifier)
    }

    /// Adds a sub-resource identified by `unique_id`, else `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] when a sibling with the same
    /// identifier exists.
    pub fn add_sub_resource(
        &mut self,
        name: &str,
        resource_type: &str,
        description: Option<&str>,
        unique_id: Option<&str>,
    ) -> Result<&mut Self, TemplateError> {
        let mut child = Self::new(name, resource_type, description, unique_id);
        let identifier = child.unique_id.clone().unwrap_or_else(|| name.to_owned());
        child.resource_key = format!("{}.{identifier}", self.resource_key);
        self.sub_resources.try_insert(&identifier, child).ok_or_else(|| {
            TemplateError::conflict(format!(
                "Sub-resource identified by {identifier} already defined"
            ))
        })
    }

    /// Records a connection to an external node such as a service account.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidArgument`] when either value is empty.
    pub fn add_resource_connection(&mut self, id: &str, node_type: &str) -> Result<(), TemplateError> {
        if id.is_empty() {
            return Err(TemplateError::invalid_argument(
                "resource connection id cannot be None",
            ));
        }
        if node_type.is_empty() {
            return Err(TemplateError::invalid_argument(
                "resource connection node_type cannot be None",
            ));
        }
        let connection = ResourceConnection {
            id: id.to_owned(),
            node_type: node_type.to_owned(),
        };
        if !self.connections.contains(&connection) {
            self.connections.push(connection);
        }
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

impl HasProperties for CustomResource {
    fn property_target(&self) -> PropertyTarget<'_> {
        PropertyTarget::Resource(&self.resource_type)
    }

    fn custom_properties_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.custom_properties
    }
}

impl EntityMut<'_, CustomResource> {
    /// Adds a sub-resource and returns a handle that validates its
    /// properties against the same definitions.
    ///
    /// # Errors
    ///
    /// See [`CustomResource::add_sub_resource`].
    pub fn add_sub_resource(
        &mut self,
        name: &str,
        resource_type: &str,
        description: Option<&str>,
        unique_id: Option<&str>,
    ) -> Result<EntityMut<'_, CustomResource>, TemplateError> {
        let definitions = self.definitions();
        let child = self
            .entity_mut()
            .add_sub_resource(name, resource_type, description, unique_id)?;
        Ok(EntityMut::new(child, definitions))
    }

    /// Handle to an existing direct sub-resource.
    pub fn sub_resource(&mut self, identifier: &str) -> Option<EntityMut<'_, CustomResource>> {
        let definitions = self.definitions();
        self.entity_mut()
            .sub_resource_mut(identifier)
            .map(|child| EntityMut::new(child, definitions))
    }
}

#[cfg(test)]
mod tests {
    //! Resource keys, sub-resources and serialization.

    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case::by_name(None, "bucket1")]
    #[case::by_id(Some("b-001"), "b-001")]
    #[case::empty_id(Some(""), "bucket1")]
    fn resource_key_prefers_unique_id(#[case] unique_id: Option<&str>, #[case] expected: &str) {
        let resource = CustomResource::new("bucket1", "bucket", None, unique_id);
        assert_eq!(resource.key(), expected);
    }

    #[test]
    fn sub_resource_keys_include_parent() {
        let mut resource = CustomResource::new("bucket1", "bucket", None, None);
        let child = resource
            .add_sub_resource("folder", "folder", None, None)
            .expect("new child");
        let grandchild = child
            .add_sub_resource("file", "file", None, Some("f-1"))
            .expect("new child");
        assert_eq!(grandchild.key(), "bucket1.folder.f-1");
    }

    #[test]
    fn duplicate_sub_resources_are_rejected() {
        let mut resource = CustomResource::new("bucket1", "bucket", None, None);
        resource
            .add_sub_resource("folder", "folder", None, None)
            .expect("new child");
        let error = resource
            .add_sub_resource("FOLDER", "folder", None, None)
            .expect_err("duplicate child");
        assert_eq!(
            error.to_string(),
            "Sub-resource identified by FOLDER already defined"
        );
    }

    #[rstest]
    #[case::id("", "service_account", "resource connection id cannot be None")]
    #[case::node_type("sa-1", "", "resource connection node_type cannot be None")]
    fn connections_require_values(#[case] id: &str, #[case] node_type: &str, #[case] message: &str) {
        let mut resource = CustomResource::new("bucket1", "bucket", None, None);
        let error = resource
            .add_resource_connection(id, node_type)
            .expect_err("missing value");
        assert_eq!(error.to_string(), message);
    }

    #[test]
    fn serialization_drops_empty_values() {
        let mut resource = CustomResource::new("bucket1", "bucket", Some(""), None);
        resource
            .add_resource_connection("sa-1", "GoogleCloudServiceAccount")
            .expect("valid connection");
        resource
            .add_resource_connection("sa-1", "GoogleCloudServiceAccount")
            .expect("valid connection");
        resource
            .add_sub_resource("folder", "folder", Some("nested"), None)
            .expect("new child");
        resource.add_tag("env", "prod").expect("valid tag");

        let json = serde_json::to_value(&resource).expect("serializes");
        assert_eq!(
            json,
            json!({
                "name": "bucket1",
                "resource_type": "bucket",
                "connections": [{"id": "sa-1", "node_type": "GoogleCloudServiceAccount"}],
                "sub_resources": [
                    {"name": "folder", "resource_type": "folder", "description": "nested"}
                ],
                "tags": [{"key": "env", "value": "prod"}]
            })
        );
    }
}
