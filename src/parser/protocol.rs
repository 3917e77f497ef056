//! Parser contract
//!
//! Every input family implements [`SpecificationParser`]. A parser owns the
//! raw definitions it was opened with and releases them when dropped, which
//! happens at the end of the scope that ran it on every exit path.

use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::{ModelBuilder, ToolMetadata};
use crate::storage::RawDefinition;

use super::api_description::ApiDescriptionParser;
use super::argument_list::ArgumentListParser;
use super::nested_schema::NestedSchemaParser;
use super::vocabulary::TypeVocabulary;

/// Input family of a definition source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecificationFormat {
    /// One record per command with a flat option list
    ArgumentList,
    /// Operations with parameters plus named schema components
    ApiDescription,
    /// Recursive command tree with nested value schemas
    NestedSchema,
}

impl SpecificationFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecificationFormat::ArgumentList => "argument-list",
            SpecificationFormat::ApiDescription => "api-description",
            SpecificationFormat::NestedSchema => "nested-schema",
        }
    }
}

impl fmt::Display for SpecificationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Recursive schema: '{0}' references itself")]
    RecursiveSchema(String),

    #[error("Unresolved type reference '{reference}' in {context}")]
    UnresolvedReference { reference: String, context: String },

    #[error("Invalid argument in '{command}': {reason}")]
    InvalidArgument { command: String, reason: String },
}

/// A parser that adds tasks and types to the tool under construction
pub trait SpecificationParser {
    /// Input family handled by this parser
    fn format(&self) -> SpecificationFormat;

    /// Appends everything parsed from the owned definitions
    fn populate(&mut self, builder: &mut ModelBuilder) -> Result<()>;
}

/// Raw definitions held by an open parser
#[derive(Debug)]
pub struct ParserInput {
    format: SpecificationFormat,
    definitions: Vec<RawDefinition>,
}

impl ParserInput {
    pub fn new(format: SpecificationFormat, definitions: Vec<RawDefinition>) -> Self {
        debug!(format = %format, definitions = definitions.len(), "opened parser input");
        Self { format, definitions }
    }

    pub fn definitions(&self) -> &[RawDefinition] {
        &self.definitions
    }
}

impl Drop for ParserInput {
    fn drop(&mut self) {
        debug!(format = %self.format, definitions = self.definitions.len(), "released parser input");
    }
}

/// Opens the parser for a format
pub fn open(
    format: SpecificationFormat,
    definitions: Vec<RawDefinition>,
    metadata: &ToolMetadata,
    vocabulary: &TypeVocabulary,
) -> Box<dyn SpecificationParser> {
    let input = ParserInput::new(format, definitions);
    match format {
        SpecificationFormat::ArgumentList => {
            Box::new(ArgumentListParser::new(input, metadata, vocabulary.clone()))
        }
        SpecificationFormat::ApiDescription => {
            Box::new(ApiDescriptionParser::new(input, metadata, vocabulary.clone()))
        }
        SpecificationFormat::NestedSchema => {
            Box::new(NestedSchemaParser::new(input, metadata, vocabulary.clone()))
        }
    }
}

/// Reads a scalar of any kind (string, number, bool) as text
///
/// Definition files are hand-written YAML, where `default_value: 0` and
/// `default_value: "0"` mean the same thing.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "lenient_string")]
        value: Option<String>,
    }

    #[test]
    fn lenient_string_accepts_scalars() {
        let parse = |yaml: &str| serde_yaml::from_str::<Holder>(yaml).unwrap().value;

        assert_eq!(parse("value: \"0\""), Some("0".to_string()));
        assert_eq!(parse("value: 0"), Some("0".to_string()));
        assert_eq!(parse("value: true"), Some("true".to_string()));
        assert_eq!(parse("value: ~"), None);
        assert_eq!(parse("{}"), None);
    }

    #[test]
    fn format_names_round_trip() {
        for format in [
            SpecificationFormat::ArgumentList,
            SpecificationFormat::ApiDescription,
            SpecificationFormat::NestedSchema,
        ] {
            let json = serde_json::to_string(&format).unwrap();
            assert_eq!(json, format!("\"{}\"", format.as_str()));
        }
    }
}
