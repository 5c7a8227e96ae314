use crate::json::JsonNode;
use std::collections::BTreeMap;
use std::sync::Arc;

/// How Tiled stores values of an enum in property JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumStorageType {
    #[default]
    Unspecified,
    /// Numeric value, written as an `int` property.
    Int,
    /// Comma separated value names, written as a `string` property.
    String,
}

/// A project enum: ordered `value -> name` table.
///
/// Plain enums number their values `1, 2, 3, ...`; flag enums use
/// `1, 2, 4, 8, ...`. Value 0 is always `"None"`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnumDefinition {
    id: u32,
    name: String,
    storage_type: EnumStorageType,
    values_as_flags: bool,
    values: BTreeMap<u32, String>,
    max_value: u32,
}

impl EnumDefinition {
    pub fn new<S: AsRef<str>>(
        id: u32,
        name: impl Into<String>,
        storage_type: EnumStorageType,
        values_as_flags: bool,
        names: &[S],
    ) -> Self {
        let mut values = BTreeMap::new();
        values.insert(0, "None".to_owned());

        let mut next = 1u32;
        for (i, n) in names.iter().enumerate() {
            values.insert(next, n.as_ref().to_owned());
            next = if values_as_flags {
                1u32.checked_shl(i as u32 + 1).unwrap_or(0)
            } else {
                next + 1
            };
        }

        EnumDefinition {
            id,
            name: name.into(),
            storage_type,
            values_as_flags,
            values,
            max_value: next,
        }
    }

    /// Reads an `"enum"` entry of a project's `propertyTypes`.
    pub fn parse(json: &dyn JsonNode) -> Self {
        let storage_type = match json.field_str("storageType") {
            Some("int") => EnumStorageType::Int,
            Some("string") => EnumStorageType::String,
            _ => EnumStorageType::Unspecified,
        };
        let names: Vec<&str> = json
            .array("values")
            .into_iter()
            .filter_map(|n| n.as_str())
            .collect();

        EnumDefinition::new(
            json.field_u32("id").unwrap_or_default(),
            json.field_str("name").unwrap_or_default(),
            storage_type,
            json.field_bool("valuesAsFlags").unwrap_or(false),
            &names,
        )
    }

    pub fn id(&self) -> u32 {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn storage_type(&self) -> EnumStorageType {
        self.storage_type
    }
    pub fn has_values_as_flags(&self) -> bool {
        self.values_as_flags
    }
    /// One past the last assigned value (next flag bit for flag enums).
    pub fn max_value(&self) -> u32 {
        self.max_value
    }

    /// Numeric value of `name`, or 0 when unknown.
    pub fn value_of(&self, name: &str) -> u32 {
        self.values
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(v, _)| *v)
            .unwrap_or(0)
    }

    /// Name stored at exactly `value`, or `""` when unknown.
    pub fn name_of(&self, value: u32) -> &str {
        self.values.get(&value).map(String::as_str).unwrap_or("")
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.values.values().any(|n| n == name)
    }

    pub fn contains_value(&self, value: u32) -> bool {
        self.values.contains_key(&value)
    }

    /// Names making up `value`: every set flag for flag enums, the single
    /// matching name otherwise.
    pub fn names_for(&self, value: u32) -> Vec<String> {
        if self.values_as_flags {
            self.values
                .iter()
                .filter(|(flag, _)| **flag != 0 && value & **flag == **flag)
                .map(|(_, n)| n.clone())
                .collect()
        } else {
            match self.values.get(&value) {
                Some(n) if value != 0 => vec![n.clone()],
                _ => Vec::new(),
            }
        }
    }
}

/// A value of some [`EnumDefinition`].
///
/// Without a definition (unknown `propertyType`, no project) the value is 0
/// and every name lookup is empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnumValue {
    value: u32,
    definition: Option<Arc<EnumDefinition>>,
}

impl EnumValue {
    pub fn new(value: u32, definition: &Arc<EnumDefinition>) -> Self {
        EnumValue {
            value,
            definition: Some(Arc::clone(definition)),
        }
    }

    /// ORs together the values of the comma separated names in `names`.
    pub fn from_names(names: &str, definition: &Arc<EnumDefinition>) -> Self {
        let value = names
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .fold(0, |acc, n| acc | definition.value_of(n));
        EnumValue::new(value, definition)
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn definition(&self) -> Option<&EnumDefinition> {
        self.definition.as_deref()
    }

    pub(crate) fn shared_definition(&self) -> Option<&Arc<EnumDefinition>> {
        self.definition.as_ref()
    }

    /// Single name for non-flag enums.
    pub fn value_name(&self) -> String {
        self.definition()
            .map(|d| d.name_of(self.value).to_owned())
            .unwrap_or_default()
    }

    pub fn value_names(&self) -> Vec<String> {
        self.definition()
            .map(|d| d.names_for(self.value))
            .unwrap_or_default()
    }

    /// All bits of `flags` set (flag enums) or exact equality (plain enums).
    pub fn has_flag_value(&self, flags: u32) -> bool {
        match self.definition() {
            Some(d) if d.has_values_as_flags() => self.value & flags == flags,
            _ => self.value == flags,
        }
    }

    /// Any bit of `flags` set (flag enums) or exact equality (plain enums).
    pub fn has_any_flag_value(&self, flags: u32) -> bool {
        match self.definition() {
            Some(d) if d.has_values_as_flags() => self.value & flags != 0,
            _ => self.value == flags,
        }
    }

    pub fn has_flag(&self, flags: impl Into<u32>) -> bool {
        self.has_flag_value(flags.into())
    }

    pub fn has_any_flag(&self, flags: impl Into<u32>) -> bool {
        self.has_any_flag_value(flags.into())
    }

    pub fn contains_value_name(&self, name: &str) -> bool {
        match self.definition() {
            Some(d) if d.has_values_as_flags() => d.names_for(self.value).iter().any(|n| n == name),
            Some(d) => d.contains_name(name) && d.value_of(name) == self.value,
            None => false,
        }
    }
}
