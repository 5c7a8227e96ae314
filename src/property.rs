//! Typed custom properties and the collections that hold them.

use crate::color::Color;
use crate::json::JsonNode;
use crate::project::{EnumDefinition, EnumValue, PropertyTypes, TiledClass};
use log::warn;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Effective type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertyType {
    #[default]
    Undefined,
    Color,
    File,
    Int,
    Boolean,
    Float,
    String,
    Class,
    Enum,
    Object,
}

impl PropertyType {
    /// Maps the JSON `type` tag. Unknown tags become `Undefined`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "color" => PropertyType::Color,
            "file" => PropertyType::File,
            "int" => PropertyType::Int,
            "bool" => PropertyType::Boolean,
            "float" => PropertyType::Float,
            "string" => PropertyType::String,
            "class" => PropertyType::Class,
            "object" => PropertyType::Object,
            _ => PropertyType::Undefined,
        }
    }
}

/// Id of another object on the map, as stored by `object` properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjectRef(pub u32);

impl ObjectRef {
    pub fn id(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyValue {
    /// Nothing could be resolved (class property without a known class).
    #[default]
    Empty,
    Color(Color),
    File(PathBuf),
    Int(i32),
    Bool(bool),
    Float(f32),
    String(String),
    Enum(EnumValue),
    Class(TiledClass),
    Object(ObjectRef),
}

/// Extraction of a concrete Rust type from a [`PropertyValue`].
pub trait FromProperty: Sized {
    fn from_property(value: &PropertyValue) -> Option<Self>;
}

macro_rules! from_property {
    ($ty:ty, $variant:ident) => {
        impl FromProperty for $ty {
            fn from_property(value: &PropertyValue) -> Option<Self> {
                match value {
                    PropertyValue::$variant(v) => Some(Clone::clone(v)),
                    _ => None,
                }
            }
        }
    };
}

from_property!(i32, Int);
from_property!(bool, Bool);
from_property!(f32, Float);
from_property!(String, String);
from_property!(Color, Color);
from_property!(PathBuf, File);
from_property!(EnumValue, Enum);
from_property!(TiledClass, Class);
from_property!(ObjectRef, Object);

/// Non-negative `int` values.
impl FromProperty for u32 {
    fn from_property(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Int(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }
}

/// A named, typed value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Property {
    name: String,
    kind: PropertyType,
    property_type: String,
    value: PropertyValue,
}

impl Property {
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        let kind = match &value {
            PropertyValue::Empty => PropertyType::Undefined,
            PropertyValue::Color(_) => PropertyType::Color,
            PropertyValue::File(_) => PropertyType::File,
            PropertyValue::Int(_) => PropertyType::Int,
            PropertyValue::Bool(_) => PropertyType::Boolean,
            PropertyValue::Float(_) => PropertyType::Float,
            PropertyValue::String(_) => PropertyType::String,
            PropertyValue::Enum(_) => PropertyType::Enum,
            PropertyValue::Class(_) => PropertyType::Class,
            PropertyValue::Object(_) => PropertyType::Object,
        };
        Property {
            name: name.into(),
            kind,
            property_type: String::new(),
            value,
        }
    }

    /// Reads `{name, type, propertyType, value}`.
    ///
    /// With a non-empty `propertyType`, `int` and `string` properties become
    /// enums resolved against `types`; `class` properties clone the named class
    /// and overlay the members present in `value`. Missing definitions degrade
    /// to empty values.
    pub fn parse(json: &dyn JsonNode, types: Option<&PropertyTypes>) -> Self {
        let property_type = json
            .field_str("propertytype")
            .or_else(|| json.field_str("propertyType"))
            .unwrap_or_default()
            .to_owned();
        let mut prop = Property {
            name: json.field_string("name").unwrap_or_default(),
            kind: PropertyType::from_tag(json.field_str("type").unwrap_or_default()),
            property_type,
            value: PropertyValue::Empty,
        };
        match json.get("value") {
            Some(value) => prop.set_value_by_type(value, types),
            None => prop.value = prop.default_value(),
        }
        prop
    }

    fn default_value(&self) -> PropertyValue {
        match self.kind {
            PropertyType::Color => PropertyValue::Color(Color::default()),
            PropertyType::File => PropertyValue::File(PathBuf::new()),
            PropertyType::Int => PropertyValue::Int(0),
            PropertyType::Boolean => PropertyValue::Bool(false),
            PropertyType::Float => PropertyValue::Float(0.0),
            PropertyType::String | PropertyType::Undefined => PropertyValue::String(String::new()),
            PropertyType::Object => PropertyValue::Object(ObjectRef::default()),
            PropertyType::Class | PropertyType::Enum => PropertyValue::Empty,
        }
    }

    /// Re-reads the value from `json` according to the current type.
    pub(crate) fn set_value_by_type(&mut self, json: &dyn JsonNode, types: Option<&PropertyTypes>) {
        let text = || json.as_str().unwrap_or_default().to_owned();
        let kind = self.kind;
        self.value = match kind {
            PropertyType::Color => PropertyValue::Color(Color::parse(json.as_str().unwrap_or_default())),
            PropertyType::File => PropertyValue::File(PathBuf::from(text())),
            PropertyType::Int if !self.property_type.is_empty() => {
                self.kind = PropertyType::Enum;
                self.enum_value(types, |def| EnumValue::new(json.as_u32().unwrap_or_default(), def))
            }
            PropertyType::String if !self.property_type.is_empty() => {
                self.kind = PropertyType::Enum;
                self.enum_value(types, |def| {
                    EnumValue::from_names(json.as_str().unwrap_or_default(), def)
                })
            }
            PropertyType::Int => PropertyValue::Int(json.as_i32().unwrap_or_default()),
            PropertyType::Boolean => PropertyValue::Bool(json.as_bool().unwrap_or_default()),
            PropertyType::Float => PropertyValue::Float(json.as_f32().unwrap_or_default()),
            PropertyType::String | PropertyType::Undefined => PropertyValue::String(text()),
            PropertyType::Object => PropertyValue::Object(ObjectRef(json.as_u32().unwrap_or_default())),
            PropertyType::Class => self.class_value(json, types),
            PropertyType::Enum => {
                // overlaying an already resolved enum keeps its definition
                let def = match &self.value {
                    PropertyValue::Enum(old) => old.shared_definition().cloned(),
                    _ => None,
                }
                .or_else(|| {
                    types
                        .and_then(|t| t.enum_definition(&self.property_type))
                        .cloned()
                });
                match def {
                    Some(def) => PropertyValue::Enum(match json.as_str() {
                        Some(names) => EnumValue::from_names(names, &def),
                        None => EnumValue::new(json.as_u32().unwrap_or_default(), &def),
                    }),
                    None => PropertyValue::Enum(EnumValue::default()),
                }
            }
        };
    }

    fn enum_value(
        &self,
        types: Option<&PropertyTypes>,
        make: impl FnOnce(&Arc<EnumDefinition>) -> EnumValue,
    ) -> PropertyValue {
        match types.and_then(|t| t.enum_definition(&self.property_type)) {
            Some(def) => PropertyValue::Enum(make(def)),
            None => {
                warn!(
                    "property '{}': enum '{}' is not defined, value left empty",
                    self.name, self.property_type
                );
                PropertyValue::Enum(EnumValue::default())
            }
        }
    }

    fn class_value(&self, json: &dyn JsonNode, types: Option<&PropertyTypes>) -> PropertyValue {
        // nested overlay onto an existing instance keeps members already set
        let base = match &self.value {
            PropertyValue::Class(existing) => Some(existing.clone()),
            _ => types.and_then(|t| t.class(&self.property_type)).cloned(),
        };
        match base {
            Some(mut class) => {
                class.update_from_json(json, types);
                PropertyValue::Class(class)
            }
            None => {
                warn!(
                    "property '{}': class '{}' is not defined, value left empty",
                    self.name, self.property_type
                );
                PropertyValue::Empty
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PropertyType {
        self.kind
    }

    /// Name of the custom enum or class type, empty for plain properties.
    pub fn property_type(&self) -> &str {
        &self.property_type
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    pub fn set_value(&mut self, value: PropertyValue) {
        self.value = value;
    }

    /// Value as `T`, or `T::default()` when the stored type differs.
    pub fn get<T: FromProperty + Default>(&self) -> T {
        self.try_get().unwrap_or_default()
    }

    pub fn try_get<T: FromProperty>(&self) -> Option<T> {
        T::from_property(&self.value)
    }
}

/// Properties keyed by name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyCollection {
    properties: HashMap<String, Property>,
}

impl PropertyCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses every element of a `properties` array.
    pub fn parse(items: &[&dyn JsonNode], types: Option<&PropertyTypes>) -> Self {
        let mut out = PropertyCollection::new();
        for item in items {
            out.add(Property::parse(*item, types));
        }
        out
    }

    /// Inserts `property`, replacing one with the same name.
    pub fn add(&mut self, property: Property) {
        self.properties.insert(property.name.clone(), property);
    }

    pub fn remove(&mut self, name: &str) -> Option<Property> {
        self.properties.remove(name)
    }

    /// Replaces the value of an existing property; no-op when absent.
    pub fn set_value(&mut self, name: &str, value: PropertyValue) -> bool {
        match self.properties.get_mut(name) {
            Some(p) => {
                p.set_value(value);
                true
            }
            None => false,
        }
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.get_mut(name)
    }

    /// Value of `name` as `T`; default when missing or of another type.
    pub fn value<T: FromProperty + Default>(&self, name: &str) -> T {
        self.property(name).map(Property::get).unwrap_or_default()
    }

    /// Layers `other` on top of `self`; colliding names take `other`'s value.
    pub fn merge(&mut self, other: PropertyCollection) {
        self.properties.extend(other.properties);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: serde_json::Value) -> Property {
        Property::parse(&v, None)
    }

    #[test]
    fn scalar_properties() {
        let p = parse(json!({"name": "hp", "type": "int", "value": 49}));
        assert_eq!(p.kind(), PropertyType::Int);
        assert_eq!(p.get::<i32>(), 49);

        let p = parse(json!({"name": "f", "type": "file", "value": "../a.json"}));
        assert_eq!(p.get::<PathBuf>(), PathBuf::from("../a.json"));

        let p = parse(json!({"name": "c", "type": "color", "value": "#ff069504"}));
        assert_eq!(p.get::<Color>(), Color::rgba(0x06, 0x95, 0x04, 0xff));

        let p = parse(json!({"name": "o", "type": "object", "value": 39}));
        assert_eq!(p.kind(), PropertyType::Object);
        assert_eq!(p.get::<ObjectRef>(), ObjectRef(39));
        assert_eq!(p.get::<u32>(), 0);

        let p = parse(json!({"name": "x", "type": "float", "value": 16.9344}));
        assert!((p.get::<f32>() - 16.9344).abs() < 1e-4);
    }

    #[test]
    fn unsigned_reads_int_properties() {
        let p = parse(json!({"name": "hp", "type": "int", "value": 49}));
        assert_eq!(p.get::<u32>(), 49);
        assert_eq!(p.get::<ObjectRef>(), ObjectRef(0));

        let p = parse(json!({"name": "dx", "type": "int", "value": -3}));
        assert!(p.try_get::<u32>().is_none());
        assert_eq!(p.get::<i32>(), -3);
    }

    #[test]
    fn type_mismatch_gives_default() {
        let p = parse(json!({"name": "c", "type": "color", "value": "#ff000000"}));
        assert_eq!(p.get::<i32>(), 0);
        assert_eq!(p.get::<String>(), "");
        assert!(!p.get::<bool>());
        assert!(p.try_get::<f32>().is_none());
    }

    #[test]
    fn unknown_tag_is_stored_as_string() {
        let p = parse(json!({"name": "m", "type": "mystery", "value": "x"}));
        assert_eq!(p.kind(), PropertyType::Undefined);
        assert_eq!(p.get::<String>(), "x");
    }

    #[test]
    fn enum_redirect_without_project_degrades() {
        let p = parse(json!({"name": "e", "type": "int", "propertytype": "Flags", "value": 10}));
        assert_eq!(p.kind(), PropertyType::Enum);
        assert_eq!(p.property_type(), "Flags");
        assert_eq!(p.get::<EnumValue>().value(), 0);
        assert_eq!(p.get::<i32>(), 0);

        let p = parse(json!({"name": "k", "type": "class", "propertytype": "Nope", "value": {}}));
        assert_eq!(p.kind(), PropertyType::Class);
        assert_eq!(p.value(), &PropertyValue::Empty);
    }

    #[test]
    fn collection_operations() {
        let items = json!([
            {"name": "a", "type": "int", "value": 1},
            {"name": "b", "type": "bool", "value": true},
            {"name": "a", "type": "int", "value": 2}
        ]);
        let nodes = (&items as &dyn JsonNode).elements();
        let mut props = PropertyCollection::parse(&nodes, None);
        assert_eq!(props.len(), 2);
        assert_eq!(props.value::<i32>("a"), 2);
        assert!(props.value::<bool>("b"));
        assert_eq!(props.value::<i32>("missing"), 0);

        assert!(props.set_value("a", PropertyValue::Int(7)));
        assert!(!props.set_value("zzz", PropertyValue::Int(7)));
        assert_eq!(props.value::<i32>("a"), 7);

        let mut top = PropertyCollection::new();
        top.add(Property::new("a", PropertyValue::Int(100)));
        top.add(Property::new("c", PropertyValue::String("new".into())));
        props.merge(top);
        assert_eq!(props.value::<i32>("a"), 100);
        assert_eq!(props.value::<String>("c"), "new");
        assert_eq!(props.len(), 3);

        assert!(props.remove("b").is_some());
        assert!(!props.has_property("b"));
    }
}
