use crate::json::JsonNode;
use crate::project::{EnumDefinition, TiledClass};
use log::{debug, warn};
use std::sync::Arc;

/// Enum and class definitions declared in a project's `propertyTypes`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyTypes {
    enums: Vec<Arc<EnumDefinition>>,
    classes: Vec<TiledClass>,
    unhandled_content_found: bool,
}

impl PropertyTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the `propertyTypes` array.
    ///
    /// Enums are read first so class members typed with an enum can resolve
    /// it; classes are then read in file order.
    pub fn parse(items: &[&dyn JsonNode]) -> Self {
        let mut types = PropertyTypes::new();
        let mut deferred = Vec::new();

        for item in items {
            match item.field_str("type") {
                Some("enum") => types.add_enum(EnumDefinition::parse(*item)),
                Some("class") => deferred.push(*item),
                other => {
                    warn!("unhandled property type entry {:?}", other);
                    types.unhandled_content_found = true;
                }
            }
        }

        for item in deferred {
            let class = TiledClass::parse(item, Some(&types));
            types.classes.push(class);
        }

        debug!(
            "loaded {} enum and {} class definitions",
            types.enums.len(),
            types.classes.len()
        );
        types
    }

    pub fn add_enum(&mut self, definition: EnumDefinition) {
        self.enums.push(Arc::new(definition));
    }

    pub fn add_class(&mut self, class: TiledClass) {
        self.classes.push(class);
    }

    pub fn enum_definition(&self, name: &str) -> Option<&Arc<EnumDefinition>> {
        self.enums.iter().find(|e| e.name() == name)
    }

    pub fn class(&self, name: &str) -> Option<&TiledClass> {
        self.classes.iter().find(|c| c.name() == name)
    }

    pub fn enums(&self) -> &[Arc<EnumDefinition>] {
        &self.enums
    }

    pub fn classes(&self) -> &[TiledClass] {
        &self.classes
    }

    /// True when an entry of a kind other than enum or class was skipped.
    pub fn is_unhandled_content_found(&self) -> bool {
        self.unhandled_content_found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::EnumValue;
    use crate::property::PropertyType;
    use serde_json::json;

    #[test]
    fn classes_see_enums_declared_after_them() {
        let items = json!([
            {
                "id": 1,
                "name": "TestClass",
                "type": "class",
                "members": [
                    {"name": "NumFlag", "propertyType": "TestEnumNumberFlags", "type": "int", "value": 10},
                    {"name": "StrFlag", "propertyType": "TestEnumStringFlags", "type": "string", "value": "HasJobFlag,HasHouseFlag"}
                ]
            },
            {
                "id": 4,
                "name": "TestEnumNumberFlags",
                "storageType": "int",
                "type": "enum",
                "values": ["HasCalculatorFlag", "HasBombFlag", "HasHumorFlag", "HasInvisibilityFlag"],
                "valuesAsFlags": true
            },
            {
                "id": 5,
                "name": "TestEnumStringFlags",
                "storageType": "string",
                "type": "enum",
                "values": ["HasCarFlag", "HasJobFlag", "HasBuddyFlag", "HasHouseFlag"],
                "valuesAsFlags": true
            },
            {"id": 9, "name": "Legacy", "type": "objecttype"}
        ]);
        let nodes = (&items as &dyn JsonNode).elements();
        let types = PropertyTypes::parse(&nodes);

        assert_eq!(types.enums().len(), 2);
        assert_eq!(types.classes().len(), 1);
        assert!(types.is_unhandled_content_found());

        let class = types.class("TestClass").expect("class");
        let num: EnumValue = class.get("NumFlag");
        assert_eq!(num.value(), 10);
        assert!(num.has_flag_value(2 | 8));
        assert_eq!(num.value_names(), vec!["HasBombFlag", "HasInvisibilityFlag"]);

        let strf = class.member("StrFlag").expect("member");
        assert_eq!(strf.kind(), PropertyType::Enum);
        let strv: EnumValue = strf.get();
        assert_eq!(strv.value(), 2 | 8);
        assert!(strv.contains_value_name("HasHouseFlag"));
        assert!(!strv.contains_value_name("HasCarFlag"));

        assert!(types.enum_definition("Missing").is_none());
        assert!(types.class("Missing").is_none());
    }
}
