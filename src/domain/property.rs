//! Property and value type model
//!
//! A [`Property`] is one invocation parameter of a task (or one field of a
//! data class). Its [`ValueType`] is serialized as the plain type name the
//! downstream emitter expects (`string`, `List<string>`, `MyDataClass`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValueTypeError {
    #[error("Invalid value type: {0}")]
    Invalid(String),
}

/// Semantic type of a property value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Bool,
    Int,
    Long,
    Decimal,
    Path,
    /// Repeated or delimited values
    List(Box<ValueType>),
    /// Key/value pairs
    Dictionary(Box<ValueType>, Box<ValueType>),
    /// A data class or enumeration of the same tool
    Named(String),
}

impl ValueType {
    pub fn list_of(item: ValueType) -> Self {
        ValueType::List(Box::new(item))
    }

    pub fn dictionary_of(key: ValueType, value: ValueType) -> Self {
        ValueType::Dictionary(Box::new(key), Box::new(value))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, ValueType::Bool)
    }

    /// Returns the referenced data class or enumeration name, if any
    pub fn named(&self) -> Option<&str> {
        match self {
            ValueType::Named(name) => Some(name),
            ValueType::List(item) => item.named(),
            ValueType::Dictionary(_, value) => value.named(),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::String => f.write_str("string"),
            ValueType::Bool => f.write_str("bool"),
            ValueType::Int => f.write_str("int"),
            ValueType::Long => f.write_str("long"),
            ValueType::Decimal => f.write_str("decimal"),
            ValueType::Path => f.write_str("path"),
            ValueType::List(item) => write!(f, "List<{}>", item),
            ValueType::Dictionary(key, value) => write!(f, "Dictionary<{},{}>", key, value),
            ValueType::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for ValueType {
    type Err = ValueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "string" => return Ok(ValueType::String),
            "bool" => return Ok(ValueType::Bool),
            "int" => return Ok(ValueType::Int),
            "long" => return Ok(ValueType::Long),
            "decimal" => return Ok(ValueType::Decimal),
            "path" => return Ok(ValueType::Path),
            _ => {}
        }

        if let Some(inner) = s.strip_prefix("List<").and_then(|r| r.strip_suffix('>')) {
            return Ok(ValueType::list_of(inner.parse()?));
        }

        if let Some(inner) = s.strip_prefix("Dictionary<").and_then(|r| r.strip_suffix('>')) {
            let (key, value) = split_top_level(inner).ok_or_else(|| ValueTypeError::Invalid(s.to_string()))?;
            return Ok(ValueType::dictionary_of(key.parse()?, value.parse()?));
        }

        // Schema names are kept verbatim, so dotted names like `io.k8s.Pod` are valid
        let reserved = |c: char| matches!(c, '<' | '>' | ',') || c.is_whitespace();
        if !s.is_empty() && !s.contains(reserved) {
            Ok(ValueType::Named(s.to_string()))
        } else {
            Err(ValueTypeError::Invalid(s.to_string()))
        }
    }
}

/// Splits `a,b` at the first comma that is not nested in `<...>`
fn split_top_level(s: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => return Some((&s[..i], &s[i + 1..])),
            _ => {}
        }
    }
    None
}

impl Serialize for ValueType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Operating systems a property applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[default]
    Any,
    Windows,
    Unix,
}

impl Platform {
    pub fn is_any(&self) -> bool {
        matches!(self, Platform::Any)
    }
}

/// Value type plus rendering hints, as produced by schema walkers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeReference {
    pub value_type: ValueType,

    /// Delimiter for values joined into a single argument
    pub separator: Option<char>,

    /// Rendering of one collection item (e.g. `{key}={value}`)
    pub item_format: Option<String>,
}

impl TypeReference {
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            separator: None,
            item_format: None,
        }
    }

    pub fn with_separator(mut self, separator: Option<char>) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_item_format(mut self, item_format: Option<String>) -> Self {
        self.item_format = item_format;
        self
    }
}

/// A named, typed parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,

    #[serde(rename = "type")]
    pub value_type: ValueType,

    /// Argument template, `{value}` is replaced at invocation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,

    #[serde(default, skip_serializing_if = "Platform::is_any")]
    pub platform: Platform,

    /// Single-character alias of the argument
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shorthand: Option<char>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<char>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_format: Option<String>,
}

impl Property {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            format: None,
            default: None,
            help: String::new(),
            platform: Platform::Any,
            shorthand: None,
            separator: None,
            item_format: None,
        }
    }

    /// Creates a property carrying the rendering hints of a type reference
    pub fn from_type_reference(name: impl Into<String>, reference: TypeReference) -> Self {
        let mut property = Self::new(name, reference.value_type);
        property.separator = reference.separator;
        property.item_format = reference.item_format;
        property
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into().trim().to_string();
        self
    }

    pub fn with_default(mut self, default: Option<String>) -> Self {
        self.default = default;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_shorthand(mut self, shorthand: Option<char>) -> Self {
        self.shorthand = shorthand;
        self
    }
}
