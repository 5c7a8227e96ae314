use crate::json::JsonNode;
use crate::property::{FromProperty, Property, PropertyCollection};
use crate::project::PropertyTypes;

/// A project class: named bundle of default member values.
///
/// Instances are clones of the prototype with some members overridden.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TiledClass {
    id: u32,
    name: String,
    kind: String,
    members: PropertyCollection,
}

impl TiledClass {
    /// Reads a `"class"` entry of a project's `propertyTypes`.
    pub fn parse(json: &dyn JsonNode, types: Option<&PropertyTypes>) -> Self {
        TiledClass {
            id: json.field_u32("id").unwrap_or_default(),
            name: json.field_string("name").unwrap_or_default(),
            kind: json.field_string("type").unwrap_or_default(),
            members: PropertyCollection::parse(&json.array("members"), types),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entry tag from the project file, normally `"class"`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn members(&self) -> &PropertyCollection {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Property> {
        self.members.property(name)
    }

    pub fn get<T: FromProperty + Default>(&self, name: &str) -> T {
        self.members.value(name)
    }

    /// Overrides members named in the JSON object `json`, keeping each
    /// member's declared type. Members not mentioned keep their defaults.
    pub fn update_from_json(&mut self, json: &dyn JsonNode, types: Option<&PropertyTypes>) {
        let names: Vec<String> = self.members.iter().map(|m| m.name().to_owned()).collect();
        for name in names {
            let (Some(value), Some(member)) = (json.get(&name), self.members.property_mut(&name)) else {
                continue;
            };
            member.set_value_by_type(value, types);
        }
    }

    /// Overrides members that share both name and type with a property in
    /// `properties`.
    pub fn update_from_properties(&mut self, properties: &PropertyCollection) {
        for prop in properties.iter() {
            let same_type = self
                .members
                .property(prop.name())
                .is_some_and(|m| m.kind() == prop.kind());
            if same_type {
                self.members.add(prop.clone());
            }
        }
    }
}
