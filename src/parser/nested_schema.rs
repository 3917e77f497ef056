//! Nested-schema parser
//!
//! Reads a recursive command tree whose options are described by nested
//! value schemas, as chart tooling publishes them:
//!
//! ```yaml
//! definitions:
//!   Values:
//!     type: object
//!     additionalProperties: { type: string }
//!     separator: ","
//! commands:
//!   - name: install
//!     help: Install a chart
//!     options:
//!       set: { $ref: "#/definitions/Values" }
//!       wait: { type: boolean }
//!   - name: repo
//!     commands:
//!       - name: add
//! ```
//!
//! Every schema node is reduced to a [`TypeReference`]. Named definitions are
//! expanded once and reused; a definition that reaches itself is rejected
//! before anything is expanded.

use std::collections::HashMap;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info};

use super::naming::{pascal_case, reference_name};
use super::protocol::{lenient_string, ParseError, ParserInput, SpecificationFormat, SpecificationParser};
use super::vocabulary::TypeVocabulary;
use crate::domain::{
    BuildError, DataClass, DefinitionKind, Enumeration, GraphError, ModelBuilder, Property,
    ReferenceGraph, SettingsClass, Task, ToolMetadata, TypeReference, ValueType,
};

/// Rendering of one dictionary entry when none is given
const DICTIONARY_ITEM_FORMAT: &str = "{key}={value}";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub definitions: IndexMap<String, SchemaNode>,

    #[serde(default)]
    pub commands: Vec<CommandNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandNode {
    pub name: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub help: Option<String>,

    #[serde(default)]
    pub options: IndexMap<String, SchemaNode>,

    #[serde(default)]
    pub commands: Vec<CommandNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    #[serde(default, rename = "type")]
    pub node_type: Option<String>,

    #[serde(default, rename = "$ref")]
    pub reference: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub default: Option<String>,

    #[serde(default)]
    pub items: Option<Box<SchemaNode>>,

    #[serde(default)]
    pub properties: IndexMap<String, SchemaNode>,

    #[serde(default)]
    pub additional_properties: Option<Box<SchemaNode>>,

    #[serde(default, rename = "enum")]
    pub values: Vec<serde_json::Value>,

    /// Delimiter for values joined into one argument
    #[serde(default)]
    pub separator: Option<char>,

    #[serde(default)]
    pub item_format: Option<String>,
}

impl SchemaNode {
    /// Names of all definitions referenced anywhere below this node
    fn references(&self, out: &mut Vec<String>) {
        if let Some(reference) = &self.reference {
            out.push(reference_name(reference).to_string());
        }
        if let Some(items) = &self.items {
            items.references(out);
        }
        if let Some(values) = &self.additional_properties {
            values.references(out);
        }
        for property in self.properties.values() {
            property.references(out);
        }
    }
}

/// Expands schema nodes, materializing data classes and enumerations on the way
struct SchemaWalker<'a> {
    definitions: &'a IndexMap<String, SchemaNode>,
    vocabulary: &'a TypeVocabulary,
    expanded: HashMap<String, TypeReference>,
}

impl<'a> SchemaWalker<'a> {
    fn new(definitions: &'a IndexMap<String, SchemaNode>, vocabulary: &'a TypeVocabulary) -> Self {
        Self {
            definitions,
            vocabulary,
            expanded: HashMap::new(),
        }
    }

    /// Expands a named definition once; later calls reuse the result
    fn definition(&mut self, name: &str, context: &str, builder: &mut ModelBuilder) -> Result<TypeReference> {
        if let Some(reference) = self.expanded.get(name) {
            return Ok(reference.clone());
        }

        let definitions = self.definitions;
        let node = definitions.get(name).ok_or_else(|| ParseError::UnresolvedReference {
            reference: name.to_string(),
            context: context.to_string(),
        })?;

        let reference = self.walk(node, name, builder)?;
        debug!(definition = name, value_type = %reference.value_type, "expanded definition");
        self.expanded.insert(name.to_string(), reference.clone());
        Ok(reference)
    }

    /// Reduces a node to a type reference; `name` names any type created for it
    fn walk(&mut self, node: &SchemaNode, name: &str, builder: &mut ModelBuilder) -> Result<TypeReference> {
        let inner = if let Some(reference) = &node.reference {
            self.definition(reference_name(reference), name, builder)?
        } else if !node.values.is_empty() {
            let values = node.values.iter().map(scalar_text).collect();
            builder.add_enumeration(Enumeration::new(name, values))?;
            TypeReference::new(ValueType::Named(name.to_string()))
        } else if !node.properties.is_empty() {
            let mut properties = Vec::with_capacity(node.properties.len());
            for (property, child) in &node.properties {
                let child_name = format!("{}{}", name, pascal_case(property));
                let reference = self.walk(child, &child_name, builder)?;
                properties.push(
                    Property::from_type_reference(pascal_case(property), reference)
                        .with_help(child.description.clone().unwrap_or_default())
                        .with_default(child.default.clone()),
                );
            }
            let help = node.description.as_ref().or(node.title.as_ref()).cloned().unwrap_or_default();
            builder.add_data_class(DataClass::new(name, properties).with_help(help))?;
            TypeReference::new(ValueType::Named(name.to_string()))
        } else if let Some(values) = &node.additional_properties {
            let value = self.walk(values, &format!("{}Value", name), builder)?;
            TypeReference::new(ValueType::dictionary_of(ValueType::String, value.value_type))
                .with_separator(value.separator)
                .with_item_format(Some(DICTIONARY_ITEM_FORMAT.to_string()))
        } else if node.node_type.as_deref() == Some("array") {
            let item = match &node.items {
                Some(items) => self.walk(items, &format!("{}Item", name), builder)?,
                None => TypeReference::new(ValueType::String),
            };
            TypeReference::new(ValueType::list_of(item.value_type))
                .with_separator(item.separator)
                .with_item_format(item.item_format)
        } else {
            TypeReference::new(self.vocabulary.resolve(node.node_type.as_deref()))
        };

        let separator = node.separator.or(inner.separator);
        let item_format = node.item_format.clone().or(inner.item_format);
        Ok(TypeReference::new(inner.value_type)
            .with_separator(separator)
            .with_item_format(item_format))
    }
}

pub struct NestedSchemaParser {
    input: ParserInput,
    vocabulary: TypeVocabulary,
}

impl NestedSchemaParser {
    pub fn new(input: ParserInput, _metadata: &ToolMetadata, vocabulary: TypeVocabulary) -> Self {
        Self { input, vocabulary }
    }

    fn add_commands(
        walker: &mut SchemaWalker<'_>,
        builder: &mut ModelBuilder,
        path: &mut Vec<String>,
        commands: &[CommandNode],
    ) -> Result<usize> {
        let mut added = 0;

        for command in commands {
            path.push(command.name.clone());

            if command.options.is_empty() && !command.commands.is_empty() {
                debug!(command = %path.join(" "), "skipping command group");
            } else {
                let task = Self::task(walker, builder, path, command)?;
                builder.add_task(task)?;
                added += 1;
            }

            added += Self::add_commands(walker, builder, path, &command.commands)?;
            path.pop();
        }

        Ok(added)
    }

    fn task(
        walker: &mut SchemaWalker<'_>,
        builder: &mut ModelBuilder,
        path: &[String],
        command: &CommandNode,
    ) -> Result<Task> {
        let definite_argument = path.join(" ");
        let name = pascal_case(&definite_argument);
        let tool = builder.tool_name().to_string();

        let mut properties = Vec::with_capacity(command.options.len());
        for (option, node) in &command.options {
            let type_name = format!("{}{}", name, pascal_case(option));
            let reference = walker
                .walk(node, &type_name, builder)
                .with_context(|| format!("Failed to expand option '{}' of '{}'", option, definite_argument))?;

            let format = if reference.value_type.is_bool() {
                format!("--{}", option)
            } else {
                format!("--{}={{value}}", option)
            };

            properties.push(
                Property::from_type_reference(pascal_case(option), reference)
                    .with_format(format)
                    .with_help(node.description.clone().unwrap_or_default())
                    .with_default(node.default.clone()),
            );
        }

        let settings_class = SettingsClass::new(SettingsClass::name_for(&tool, &name), properties);
        Ok(Task::new(name, settings_class)
            .with_help(command.help.clone().unwrap_or_default())
            .with_definite_argument(definite_argument))
    }
}

impl SpecificationParser for NestedSchemaParser {
    fn format(&self) -> SpecificationFormat {
        SpecificationFormat::NestedSchema
    }

    fn populate(&mut self, builder: &mut ModelBuilder) -> Result<()> {
        let mut definitions = IndexMap::new();
        let mut commands = Vec::new();

        for definition in self.input.definitions() {
            let document: SchemaDocument = definition.parse()?;
            for (name, node) in document.definitions {
                if definitions.contains_key(&name) {
                    return Err(BuildError::DuplicateDefinition {
                        tool: builder.tool_name().to_string(),
                        kind: DefinitionKind::DataClass,
                        name,
                    }
                    .into());
                }
                definitions.insert(name, node);
            }
            commands.extend(document.commands);
        }

        ensure_acyclic(&definitions)?;

        let mut walker = SchemaWalker::new(&definitions, &self.vocabulary);
        for name in definitions.keys() {
            walker.definition(name, "definitions", builder)?;
        }

        let tasks = Self::add_commands(&mut walker, builder, &mut Vec::new(), &commands)?;

        info!(tool = %builder.tool_name(), tasks, definitions = definitions.len(), "parsed nested schema");
        Ok(())
    }
}

/// Rejects definitions that reach themselves through `$ref` links
fn ensure_acyclic(definitions: &IndexMap<String, SchemaNode>) -> Result<(), ParseError> {
    let mut graph = ReferenceGraph::new();
    for name in definitions.keys() {
        graph.add_definition(name.as_str());
    }

    for (name, node) in definitions {
        let mut references = Vec::new();
        node.references(&mut references);
        for target in references {
            if !graph.contains(&target) {
                return Err(ParseError::UnresolvedReference {
                    reference: target,
                    context: name.clone(),
                });
            }
            graph.add_reference(name, &target).map_err(graph_error)?;
        }
    }

    graph.ensure_acyclic().map_err(graph_error)
}

fn graph_error(error: GraphError) -> ParseError {
    match error {
        GraphError::CycleDetected(name) => ParseError::RecursiveSchema(name),
        GraphError::DefinitionNotFound(name) => ParseError::UnresolvedReference {
            reference: name,
            context: "definitions".to_string(),
        },
    }
}

fn scalar_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
