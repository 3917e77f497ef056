//! Format parsers
//!
//! One parser per input family, all behind [`SpecificationParser`]:
//!
//! | Format            | Input                                        |
//! |-------------------|----------------------------------------------|
//! | `argument-list`   | one record per command with flat options     |
//! | `api-description` | operations plus named schema components      |
//! | `nested-schema`   | command tree with nested value schemas       |

mod api_description;
mod argument_list;
mod naming;
mod nested_schema;
mod protocol;
mod vocabulary;

pub use api_description::{ApiDescriptionParser, ApiDocument, ApiSchema, Operation, Parameter};
pub use argument_list::{ArgumentDefinition, ArgumentListParser, CommandDefinition};
pub use naming::pascal_case;
pub use nested_schema::{CommandNode, NestedSchemaParser, SchemaDocument, SchemaNode};
pub use protocol::{open, ParseError, ParserInput, SpecificationFormat, SpecificationParser};
pub use vocabulary::TypeVocabulary;
