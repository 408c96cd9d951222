//! The HRIS template: an HR system with its employees and groups.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

use super::enums::{CustomTemplate, IdpProviderType, OaaPropertyType};
use super::properties::{contains_ignore_case, validate_name, PropertyMap};
use super::{EntityMut, OaaTemplate};
use crate::error::TemplateError;
use crate::keyed::{self, CaseInsensitiveMap};

/// Custom property declarations for an HRIS payload.
///
/// Names are checked against the property name pattern and stored
/// lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HrisPropertyDefinitions {
    system_properties: PropertyMap,
    employee_properties: PropertyMap,
    group_properties: PropertyMap,
}

impl HrisPropertyDefinitions {
    /// Declares a system property.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidPropertyName`] for malformed names.
    pub fn define_system_property(
        &mut self,
        name: &str,
        property_type: OaaPropertyType,
    ) -> Result<(), TemplateError> {
        define(&mut self.system_properties, name, property_type)
    }

    /// Declares an employee property.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidPropertyName`] for malformed names.
    pub fn define_employee_property(
        &mut self,
        name: &str,
        property_type: OaaPropertyType,
    ) -> Result<(), TemplateError> {
        define(&mut self.employee_properties, name, property_type)
    }

    /// Declares a group property.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidPropertyName`] for malformed names.
    pub fn define_group_property(
        &mut self,
        name: &str,
        property_type: OaaPropertyType,
    ) -> Result<(), TemplateError> {
        define(&mut self.group_properties, name, property_type)
    }

    /// Declared system properties.
    #[must_use]
    pub const fn system_properties(&self) -> &PropertyMap {
        &self.system_properties
    }

    /// Declared employee properties.
    #[must_use]
    pub const fn employee_properties(&self) -> &PropertyMap {
        &self.employee_properties
    }

    /// Declared group properties.
    #[must_use]
    pub const fn group_properties(&self) -> &PropertyMap {
        &self.group_properties
    }
}

fn define(
    map: &mut PropertyMap,
    name: &str,
    property_type: OaaPropertyType,
) -> Result<(), TemplateError> {
    validate_name(name)?;
    map.insert(name.to_lowercase(), property_type);
    Ok(())
}

/// Details of the HRIS instance.
#[derive(Debug, Clone, Serialize)]
pub struct HrisSystem {
    id: String,
    name: String,
    url: String,
    idp_providers: Vec<IdpProviderType>,
}

impl HrisSystem {
    /// Creates the system record; the id is the name.
    #[must_use]
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            id: name.to_owned(),
            name: name.to_owned(),
            url: url.to_owned(),
            idp_providers: Vec::new(),
        }
    }

    /// Instance URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Links employees to identities of an IdP type; repeats are ignored.
    pub fn add_idp_type(&mut self, provider_type: IdpProviderType) -> &[IdpProviderType] {
        if !self.idp_providers.contains(&provider_type) {
            self.idp_providers.push(provider_type);
        }
        &self.idp_providers
    }

    /// IdP types employees are linked to.
    #[must_use]
    pub fn idp_providers(&self) -> &[IdpProviderType] {
        &self.idp_providers
    }
}

/// Reference to an employee or group by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct IdRef<'a> {
    id: &'a str,
}

/// Employee record.
///
/// Empty strings and collections are left out of the payload.
#[derive(Debug, Clone, Serialize)]
pub struct HrisEmployee {
    #[serde(rename = "id")]
    unique_id: String,
    name: String,
    employee_number: String,
    /// Company or subsidiary the employee works for.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub company: String,
    first_name: String,
    last_name: String,
    /// Preferred first name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub preferred_name: String,
    /// Full name for display.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub display_full_name: String,
    /// Canonical name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub canonical_name: String,
    /// Username shown in the HR system.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    /// Work email.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    /// Id of the employee in the linked IdP; the email is used when empty.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub idp_id: String,
    /// Personal email.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub personal_email: String,
    /// Home location.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub home_location: String,
    /// Work location.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub work_location: String,
    employment_status: String,
    /// Start date, RFC 3339.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub start_date: String,
    /// Termination date, RFC 3339.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub termination_date: String,
    /// Job title.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub job_title: String,
    /// Employment types such as `FULL_TIME` or `CONTRACTOR`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub employment_types: Vec<String>,
    /// Primary time zone.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub primary_time_zone: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    custom_properties: Map<String, Value>,
    is_active: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "id_refs")]
    groups: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "id_refs")]
    managers: Vec<String>,
    /// Group id of the employee's department.
    #[serde(skip_serializing_if = "String::is_empty", serialize_with = "id_ref")]
    pub department: String,
    /// Group id of the employee's cost center.
    #[serde(skip_serializing_if = "String::is_empty", serialize_with = "id_ref")]
    pub cost_center: String,
}

impl HrisEmployee {
    /// Creates an employee record. Every string argument is required.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidArgument`] naming the first empty
    /// argument.
    pub fn new(
        unique_id: &str,
        name: &str,
        employee_number: &str,
        first_name: &str,
        last_name: &str,
        is_active: bool,
        employment_status: &str,
    ) -> Result<Self, TemplateError> {
        let required = [
            ("unique_id", unique_id),
            ("name", name),
            ("employee_number", employee_number),
            ("first_name", first_name),
            ("last_name", last_name),
            ("employment_status", employment_status),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(TemplateError::invalid_argument(format!("{field} cannot be empty")));
        }
        Ok(Self {
            unique_id: unique_id.to_owned(),
            name: name.to_owned(),
            employee_number: employee_number.to_owned(),
            company: String::new(),
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            preferred_name: String::new(),
            display_full_name: String::new(),
            canonical_name: String::new(),
            username: String::new(),
            email: String::new(),
            idp_id: String::new(),
            personal_email: String::new(),
            home_location: String::new(),
            work_location: String::new(),
            employment_status: employment_status.to_owned(),
            start_date: String::new(),
            termination_date: String::new(),
            job_title: String::new(),
            employment_types: Vec::new(),
            primary_time_zone: String::new(),
            custom_properties: Map::new(),
            is_active,
            groups: Vec::new(),
            managers: Vec::new(),
            department: String::new(),
            cost_center: String::new(),
        })
    }

    /// Unique employee id.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the employee is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Employment status such as `ACTIVE` or `TERMINATED`.
    #[must_use]
    pub fn employment_status(&self) -> &str {
        &self.employment_status
    }

    /// Group ids the employee belongs to.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Employee ids of the employee's managers.
    #[must_use]
    pub fn managers(&self) -> &[String] {
        &self.managers
    }

    /// Custom property values set so far.
    #[must_use]
    pub const fn custom_properties(&self) -> &Map<String, Value> {
        &self.custom_properties
    }

    /// Adds the employee to a group; repeats are ignored.
    pub fn add_group(&mut self, group_id: &str) {
        push_unique(&mut self.groups, group_id);
    }

    /// Adds a manager by employee id; repeats are ignored.
    pub fn add_manager(&mut self, manager_id: &str) {
        push_unique(&mut self.managers, manager_id);
    }

    /// Sets a custom property without validation.
    ///
    /// Employees added through [`HrisProvider::add_employee`] validate names
    /// through their handle instead.
    pub fn set_property(&mut self, name: &str, value: impl Into<Value>) {
        warn!(
            employee = %self.unique_id,
            property = name,
            "Employee does not have property names set, cannot validate property name"
        );
        self.custom_properties.insert(name.to_owned(), value.into());
    }
}

impl EntityMut<'_, HrisEmployee, HrisPropertyDefinitions> {
    /// Sets a custom property declared for employees.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownEmployeeProperty`] for undeclared
    /// names.
    pub fn set_property(&mut self, name: &str, value: impl Into<Value>) -> Result<(), TemplateError> {
        if !contains_ignore_case(&self.definitions().employee_properties, name) {
            return Err(TemplateError::UnknownEmployeeProperty {
                name: name.to_owned(),
            });
        }
        self.entity_mut()
            .custom_properties
            .insert(name.to_owned(), value.into());
        Ok(())
    }
}

/// Group of employees: a team, department, cost center or similar unit.
///
/// Group ids are unique across all group types.
#[derive(Debug, Clone, Serialize)]
pub struct HrisGroup {
    #[serde(rename = "id")]
    unique_id: String,
    name: String,
    group_type: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    custom_properties: Map<String, Value>,
}

impl HrisGroup {
    /// Creates a group.
    #[must_use]
    pub fn new(unique_id: &str, name: &str, group_type: &str) -> Self {
        Self {
            unique_id: unique_id.to_owned(),
            name: name.to_owned(),
            group_type: group_type.to_owned(),
            custom_properties: Map::new(),
        }
    }

    /// Unique group id.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Group type label.
    #[must_use]
    pub fn group_type(&self) -> &str {
        &self.group_type
    }

    /// Custom property values set so far.
    #[must_use]
    pub const fn custom_properties(&self) -> &Map<String, Value> {
        &self.custom_properties
    }

    /// Sets a custom property without validation.
    pub fn set_property(&mut self, name: &str, value: impl Into<Value>) {
        warn!(
            group = %self.unique_id,
            property = name,
            "Group does not have property names set, cannot validate property name"
        );
        self.custom_properties.insert(name.to_owned(), value.into());
    }
}

impl EntityMut<'_, HrisGroup, HrisPropertyDefinitions> {
    /// Sets a custom property declared for groups.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownGroupProperty`] for undeclared names.
    pub fn set_property(&mut self, name: &str, value: impl Into<Value>) -> Result<(), TemplateError> {
        if !contains_ignore_case(&self.definitions().group_properties, name) {
            return Err(TemplateError::UnknownGroupProperty {
                name: name.to_owned(),
            });
        }
        self.entity_mut()
            .custom_properties
            .insert(name.to_owned(), value.into());
        Ok(())
    }
}

/// HRIS payload: the system record plus employees and groups keyed by id.
///
/// # Examples
///
/// ```
/// use oaaclient::templates::{HrisProvider, OaaPropertyType, OaaTemplate};
///
/// let mut hris = HrisProvider::new("Acme HR", "workday", "https://hr.example.com");
/// hris.property_definitions_mut()
///     .define_employee_property("badge", OaaPropertyType::Number)
///     .expect("valid name");
/// let mut employee = hris
///     .add_employee("e-1", "Ada", "0001", "Ada", "Lovelace", true, "ACTIVE")
///     .expect("new employee");
/// employee.set_property("badge", 42).expect("declared");
///
/// let payload = hris.payload().expect("serializable");
/// assert_eq!(payload["employees"][0]["custom_properties"]["badge"], 42);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct HrisProvider {
    name: String,
    hris_type: String,
    #[serde(rename = "custom_property_definition")]
    property_definitions: HrisPropertyDefinitions,
    system: HrisSystem,
    #[serde(serialize_with = "keyed::serialize_values")]
    employees: CaseInsensitiveMap<HrisEmployee>,
    #[serde(serialize_with = "keyed::serialize_values")]
    groups: CaseInsensitiveMap<HrisGroup>,
}

impl HrisProvider {
    /// Creates an HRIS payload; `hris_type` is usually the vendor name.
    #[must_use]
    pub fn new(name: &str, hris_type: &str, url: &str) -> Self {
        Self {
            name: name.to_owned(),
            hris_type: hris_type.to_owned(),
            property_definitions: HrisPropertyDefinitions::default(),
            system: HrisSystem::new(name, url),
            employees: CaseInsensitiveMap::new(),
            groups: CaseInsensitiveMap::new(),
        }
    }

    /// Instance name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// HRIS type label.
    #[must_use]
    pub fn hris_type(&self) -> &str {
        &self.hris_type
    }

    /// Custom property declarations.
    #[must_use]
    pub const fn property_definitions(&self) -> &HrisPropertyDefinitions {
        &self.property_definitions
    }

    /// Mutable custom property declarations, for `define_*` calls.
    pub const fn property_definitions_mut(&mut self) -> &mut HrisPropertyDefinitions {
        &mut self.property_definitions
    }

    /// The system record.
    #[must_use]
    pub const fn system(&self) -> &HrisSystem {
        &self.system
    }

    /// Mutable system record.
    pub const fn system_mut(&mut self) -> &mut HrisSystem {
        &mut self.system
    }

    /// Adds an employee keyed by `unique_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] for a repeated id and
    /// [`TemplateError::InvalidArgument`] for an empty required argument.
    #[expect(clippy::too_many_arguments, reason = "mirrors the employee record's required fields")]
    pub fn add_employee(
        &mut self,
        unique_id: &str,
        name: &str,
        employee_number: &str,
        first_name: &str,
        last_name: &str,
        is_active: bool,
        employment_status: &str,
    ) -> Result<EntityMut<'_, HrisEmployee, HrisPropertyDefinitions>, TemplateError> {
        if self.employees.contains_key(unique_id) {
            return Err(TemplateError::conflict(format!(
                "Employee with unique ID already exists, {unique_id}"
            )));
        }
        let employee = HrisEmployee::new(
            unique_id,
            name,
            employee_number,
            first_name,
            last_name,
            is_active,
            employment_status,
        )?;
        let stored = self.employees.try_insert(unique_id, employee).ok_or_else(|| {
            TemplateError::conflict(format!("Employee with unique ID already exists, {unique_id}"))
        })?;
        Ok(EntityMut::new(stored, &self.property_definitions))
    }

    /// Employees keyed by id.
    #[must_use]
    pub const fn employees(&self) -> &CaseInsensitiveMap<HrisEmployee> {
        &self.employees
    }

    /// Handle to an employee.
    pub fn employee_mut(
        &mut self,
        unique_id: &str,
    ) -> Option<EntityMut<'_, HrisEmployee, HrisPropertyDefinitions>> {
        let definitions = &self.property_definitions;
        self.employees
            .get_mut(unique_id)
            .map(|employee| EntityMut::new(employee, definitions))
    }

    /// Adds a group keyed by `unique_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Conflict`] for a repeated id.
    pub fn add_group(
        &mut self,
        unique_id: &str,
        name: &str,
        group_type: &str,
    ) -> Result<EntityMut<'_, HrisGroup, HrisPropertyDefinitions>, TemplateError> {
        let stored = self
            .groups
            .try_insert(unique_id, HrisGroup::new(unique_id, name, group_type))
            .ok_or_else(|| {
                TemplateError::conflict(format!("Group with unique ID already exists, {unique_id}"))
            })?;
        Ok(EntityMut::new(stored, &self.property_definitions))
    }

    /// Groups keyed by id.
    #[must_use]
    pub const fn groups(&self) -> &CaseInsensitiveMap<HrisGroup> {
        &self.groups
    }

    /// Handle to a group.
    pub fn group_mut(
        &mut self,
        unique_id: &str,
    ) -> Option<EntityMut<'_, HrisGroup, HrisPropertyDefinitions>> {
        let definitions = &self.property_definitions;
        self.groups
            .get_mut(unique_id)
            .map(|group| EntityMut::new(group, definitions))
    }
}

impl OaaTemplate for HrisProvider {
    fn template(&self) -> CustomTemplate {
        CustomTemplate::Hris
    }

    fn payload(&self) -> Result<Value, TemplateError> {
        Ok(serde_json::to_value(self)?)
    }
}

fn push_unique(target: &mut Vec<String>, value: &str) {
    if !target.iter().any(|known| known == value) {
        target.push(value.to_owned());
    }
}

fn id_refs<S: Serializer>(ids: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(ids.iter().map(|id| IdRef { id }))
}

fn id_ref<S: Serializer>(id: &str, serializer: S) -> Result<S::Ok, S::Error> {
    IdRef { id }.serialize(serializer)
}

#[cfg(test)]
mod tests {
    //! HRIS containers, validation and payload shape.

    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    #[fixture]
    fn hris() -> HrisProvider {
        let mut hris = HrisProvider::new("Acme HR", "workday", "https://hr.example.com");
        hris.property_definitions_mut()
            .define_employee_property("Badge_Number", OaaPropertyType::Number)
            .expect("valid name");
        hris.property_definitions_mut()
            .define_group_property("budget", OaaPropertyType::Number)
            .expect("valid name");
        hris.add_group("g-eng", "Engineering", "Department")
            .expect("new group");
        hris.add_employee("e-1", "Ada", "0001", "Ada", "Lovelace", true, "ACTIVE")
            .expect("new employee");
        hris
    }

    #[rstest]
    #[case::unique_id("", "name", "unique_id cannot be empty")]
    #[case::name("e-9", "", "name cannot be empty")]
    fn required_fields_must_be_present(
        #[case] unique_id: &str,
        #[case] name: &str,
        #[case] expected: &str,
    ) {
        let error = HrisEmployee::new(unique_id, name, "1", "First", "Last", true, "ACTIVE")
            .expect_err("missing field");
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    fn duplicate_ids_are_rejected(mut hris: HrisProvider) {
        let error = hris
            .add_employee("E-1", "Bob", "0002", "Bob", "B", true, "ACTIVE")
            .expect_err("duplicate employee");
        assert_eq!(error.to_string(), "Employee with unique ID already exists, E-1");
        let group_error = hris
            .add_group("g-eng", "Eng", "Team")
            .expect_err("duplicate group");
        assert_eq!(group_error.to_string(), "Group with unique ID already exists, g-eng");
    }

    #[rstest]
    fn definitions_are_stored_lowercased(hris: HrisProvider) {
        assert!(hris
            .property_definitions()
            .employee_properties()
            .contains_key("badge_number"));
        let mut definitions = HrisPropertyDefinitions::default();
        let error = definitions
            .define_system_property("2fast", OaaPropertyType::String)
            .expect_err("malformed name");
        assert!(matches!(error, TemplateError::InvalidPropertyName { .. }));
    }

    #[rstest]
    fn handles_validate_property_names(mut hris: HrisProvider) {
        let mut employee = hris.employee_mut("e-1").expect("known employee");
        employee.set_property("BADGE_NUMBER", 7).expect("declared");
        let error = employee.set_property("desk", "4F").expect_err("undeclared");
        assert_eq!(error.to_string(), "unknown employee property name desk");

        let mut group = hris.group_mut("g-eng").expect("known group");
        let group_error = group.set_property("desk", "4F").expect_err("undeclared");
        assert_eq!(group_error.to_string(), "unknown group property name desk");
    }

    #[test]
    fn standalone_entities_accept_any_property() {
        let mut group = HrisGroup::new("g-1", "Ops", "Team");
        group.set_property("anything", true);
        assert_eq!(group.custom_properties().get("anything"), Some(&json!(true)));
    }

    #[rstest]
    fn payload_matches_template_shape(mut hris: HrisProvider) {
        hris.system_mut().add_idp_type(IdpProviderType::Okta);
        hris.system_mut().add_idp_type(IdpProviderType::Okta);
        {
            let mut employee = hris.employee_mut("e-1").expect("known employee");
            employee.email = "ada@example.com".to_owned();
            employee.department = "g-eng".to_owned();
            employee.add_group("g-eng");
            employee.add_group("g-eng");
            employee.add_manager("e-0");
        }

        let payload = hris.payload().expect("serializable");
        assert_eq!(payload["name"], "Acme HR");
        assert_eq!(payload["hris_type"], "workday");
        assert_eq!(
            payload["custom_property_definition"],
            json!({
                "system_properties": {},
                "employee_properties": {"badge_number": "NUMBER"},
                "group_properties": {"budget": "NUMBER"}
            })
        );
        assert_eq!(
            payload["system"],
            json!({"id": "Acme HR", "name": "Acme HR", "url": "https://hr.example.com", "idp_providers": ["okta"]})
        );
        assert_eq!(
            payload["employees"],
            json!([{
                "id": "e-1",
                "name": "Ada",
                "employee_number": "0001",
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": "ada@example.com",
                "employment_status": "ACTIVE",
                "is_active": true,
                "groups": [{"id": "g-eng"}],
                "managers": [{"id": "e-0"}],
                "department": {"id": "g-eng"}
            }])
        );
        assert_eq!(
            payload["groups"],
            json!([{"id": "g-eng", "name": "Engineering", "group_type": "Department"}])
        );
        assert_eq!(hris.template(), CustomTemplate::Hris);
    }
}
