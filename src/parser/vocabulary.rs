//! Raw type names to semantic value types
//!
//! Each input family spells types its own way (`stringSlice`, `uint64`,
//! `integer`). The vocabulary is handed to every parser explicitly; anything
//! it does not know maps to `string`.

use std::collections::BTreeMap;

use crate::domain::ValueType;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeVocabulary {
    entries: BTreeMap<String, ValueType>,
}

impl TypeVocabulary {
    /// Empty vocabulary (everything resolves to `string`)
    pub fn new() -> Self {
        Self::default()
    }

    /// Vocabulary covering the names used by the supported input families
    pub fn builtin() -> Self {
        let list = || ValueType::list_of(ValueType::String);
        let map = || ValueType::dictionary_of(ValueType::String, ValueType::String);

        let mut vocabulary = Self::new();
        for (raw, value_type) in [
            ("string", ValueType::String),
            ("bool", ValueType::Bool),
            ("boolean", ValueType::Bool),
            ("int", ValueType::Int),
            ("integer", ValueType::Int),
            ("int32", ValueType::Int),
            ("uint16", ValueType::Int),
            ("uint32", ValueType::Int),
            ("int64", ValueType::Long),
            ("uint64", ValueType::Long),
            ("long", ValueType::Long),
            ("bytes", ValueType::Long),
            ("float", ValueType::Decimal),
            ("double", ValueType::Decimal),
            ("number", ValueType::Decimal),
            ("decimal", ValueType::Decimal),
            ("path", ValueType::Path),
            ("file", ValueType::Path),
            ("directory", ValueType::Path),
            ("list", list()),
            ("stringSlice", list()),
            ("stringArray", list()),
            ("strings", list()),
            ("map", map()),
            ("stringToString", map()),
        ] {
            vocabulary.insert(raw, value_type);
        }
        vocabulary
    }

    pub fn insert(&mut self, raw: impl Into<String>, value_type: ValueType) {
        self.entries.insert(raw.into(), value_type);
    }

    /// Adds or replaces entries
    pub fn extend(&mut self, entries: &BTreeMap<String, ValueType>) {
        for (raw, value_type) in entries {
            self.entries.insert(raw.clone(), value_type.clone());
        }
    }

    /// Exact match first, then a case-insensitive one
    pub fn lookup(&self, raw: &str) -> Option<&ValueType> {
        self.entries.get(raw).or_else(|| {
            self.entries
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(raw))
                .map(|(_, value_type)| value_type)
        })
    }

    /// Maps a raw type name to its semantic type, defaulting to `string`
    pub fn resolve(&self, raw: Option<&str>) -> ValueType {
        raw.map(str::trim)
            .and_then(|raw| self.lookup(raw))
            .cloned()
            .unwrap_or(ValueType::String)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
