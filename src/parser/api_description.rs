//! API-description parser
//!
//! Reads documents with a list of operations and a table of named schema
//! components:
//!
//! ```yaml
//! operations:
//!   - id: run
//!     command: run
//!     summary: Runs a document
//!     parameters:
//!       - name: runtime
//!         schema: { $ref: "#/components/schemas/Runtime" }
//! components:
//!   schemas:
//!     Runtime:
//!       enum: [Net461, NetCore21]
//! ```
//!
//! Components may refer to each other in any order, so names are collected
//! across all documents before anything is materialized.

use std::collections::HashSet;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info};

use super::naming::{pascal_case, reference_name};
use super::protocol::{lenient_string, ParseError, ParserInput, SpecificationFormat, SpecificationParser};
use super::vocabulary::TypeVocabulary;
use crate::domain::{
    DataClass, Enumeration, ModelBuilder, Property, SettingsClass, Task, ToolMetadata, ValueType,
};

const DEFAULT_ARGUMENT_FORMAT: &str = "--{name} {value}";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiDocument {
    #[serde(default)]
    pub operations: Vec<Operation>,

    #[serde(default)]
    pub components: Components,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, ApiSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Operation {
    pub id: String,

    /// Sub-command words passed before the parameters
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,

    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub default: Option<String>,

    #[serde(default)]
    pub schema: ApiSchema,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSchema {
    #[serde(default, rename = "type")]
    pub schema_type: Option<String>,

    #[serde(default, rename = "$ref")]
    pub reference: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub default: Option<String>,

    #[serde(default)]
    pub items: Option<Box<ApiSchema>>,

    #[serde(default)]
    pub properties: IndexMap<String, ApiSchema>,

    #[serde(default)]
    pub additional_properties: Option<Box<ApiSchema>>,

    #[serde(default, rename = "enum")]
    pub values: Vec<serde_json::Value>,
}

/// Parser for operation/component documents, parameterized by tool metadata
pub struct ApiDescriptionParser {
    input: ParserInput,
    argument_format: String,
    vocabulary: TypeVocabulary,
}

impl ApiDescriptionParser {
    pub fn new(input: ParserInput, metadata: &ToolMetadata, vocabulary: TypeVocabulary) -> Self {
        Self {
            input,
            argument_format: metadata
                .argument_format
                .clone()
                .unwrap_or_else(|| DEFAULT_ARGUMENT_FORMAT.to_string()),
            vocabulary,
        }
    }

    /// Resolves a schema to a value type; inline enums and objects become types named `name`
    fn value_type(
        &self,
        schema: &ApiSchema,
        name: &str,
        components: &HashSet<String>,
        context: &str,
        builder: &mut ModelBuilder,
    ) -> Result<ValueType> {
        if let Some(reference) = &schema.reference {
            let target = reference_name(reference);
            if !components.contains(target) {
                return Err(ParseError::UnresolvedReference {
                    reference: reference.clone(),
                    context: context.to_string(),
                }
                .into());
            }
            return Ok(ValueType::Named(target.to_string()));
        }

        if !schema.values.is_empty() {
            let values = schema.values.iter().map(enum_value).collect();
            builder.add_enumeration(Enumeration::new(name, values))?;
            return Ok(ValueType::Named(name.to_string()));
        }

        if !schema.properties.is_empty() {
            self.add_data_class(builder, name, schema, components)?;
            return Ok(ValueType::Named(name.to_string()));
        }

        match (schema.schema_type.as_deref(), &schema.additional_properties) {
            (Some("array"), _) => {
                let item = match &schema.items {
                    Some(items) => self.value_type(items, &format!("{}Item", name), components, context, builder)?,
                    None => ValueType::String,
                };
                Ok(ValueType::list_of(item))
            }
            (Some("object"), Some(values)) => Ok(ValueType::dictionary_of(
                ValueType::String,
                self.value_type(values, &format!("{}Value", name), components, context, builder)?,
            )),
            (raw, _) => Ok(self.vocabulary.resolve(raw)),
        }
    }

    fn add_component(
        &self,
        builder: &mut ModelBuilder,
        name: &str,
        schema: &ApiSchema,
        components: &HashSet<String>,
    ) -> Result<()> {
        if !schema.values.is_empty() {
            let values = schema.values.iter().map(enum_value).collect();
            builder.add_enumeration(Enumeration::new(name, values))?;
            return Ok(());
        }
        self.add_data_class(builder, name, schema, components)
    }

    fn add_data_class(
        &self,
        builder: &mut ModelBuilder,
        name: &str,
        schema: &ApiSchema,
        components: &HashSet<String>,
    ) -> Result<()> {
        let mut properties = Vec::with_capacity(schema.properties.len());
        for (property, field) in &schema.properties {
            let property_name = pascal_case(property);
            let context = format!("{}.{}", name, property);
            let value_type = self.value_type(
                field,
                &format!("{}{}", name, property_name),
                components,
                &context,
                builder,
            )?;
            properties.push(
                Property::new(property_name, value_type)
                    .with_help(field.description.clone().unwrap_or_default())
                    .with_default(field.default.clone()),
            );
        }

        let data_class =
            DataClass::new(name, properties).with_help(schema.description.clone().unwrap_or_default());
        builder.add_data_class(data_class)?;
        Ok(())
    }

    fn task(
        &self,
        tool: &str,
        operation: &Operation,
        components: &HashSet<String>,
        builder: &mut ModelBuilder,
    ) -> Result<Task> {
        let name = pascal_case(&operation.id);

        let mut properties = Vec::with_capacity(operation.parameters.len());
        for parameter in &operation.parameters {
            let property_name = pascal_case(&parameter.name);
            let context = format!("operation {} parameter {}", operation.id, parameter.name);
            let value_type = self.value_type(
                &parameter.schema,
                &format!("{}{}", name, property_name),
                components,
                &context,
                builder,
            )?;
            let help = parameter
                .description
                .as_ref()
                .or(parameter.schema.description.as_ref())
                .cloned()
                .unwrap_or_default();

            properties.push(
                Property::new(property_name, value_type)
                    .with_format(self.argument_format.replace("{name}", &parameter.name))
                    .with_help(help)
                    .with_default(parameter.default.clone().or_else(|| parameter.schema.default.clone())),
            );
        }

        let help = operation
            .summary
            .as_deref()
            .or(operation.description.as_deref())
            .unwrap_or_default();

        let settings_class = SettingsClass::new(SettingsClass::name_for(tool, &name), properties);
        Ok(Task::new(name, settings_class)
            .with_help(help)
            .with_definite_argument(operation.command.clone().unwrap_or_default()))
    }
}

impl SpecificationParser for ApiDescriptionParser {
    fn format(&self) -> SpecificationFormat {
        SpecificationFormat::ApiDescription
    }

    fn populate(&mut self, builder: &mut ModelBuilder) -> Result<()> {
        let tool = builder.tool_name().to_string();

        // First pass: every component name, across all documents
        let documents = self
            .input
            .definitions()
            .iter()
            .map(|definition| definition.parse::<ApiDocument>())
            .collect::<Result<Vec<_>, _>>()?;

        let components: HashSet<String> = documents
            .iter()
            .flat_map(|document| document.components.schemas.keys().cloned())
            .collect();
        debug!(tool = %tool, components = components.len(), "collected schema components");

        // Second pass: materialize with all references resolvable
        for document in &documents {
            for (name, schema) in &document.components.schemas {
                self.add_component(builder, name, schema, &components)
                    .with_context(|| format!("Failed to build component {}", name))?;
            }
        }

        let mut added = 0;
        for document in &documents {
            for operation in &document.operations {
                let task = self.task(&tool, operation, &components, builder)?;
                builder.add_task(task)?;
                added += 1;
            }
        }

        info!(tool = %tool, tasks = added, components = components.len(), "parsed api description");
        Ok(())
    }
}

fn enum_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
