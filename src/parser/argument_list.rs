//! Argument-list parser
//!
//! Reads one record per command, as exported by CLI reference generators:
//!
//! ```yaml
//! command: docker container create
//! short: Create a new container
//! inherited_options:
//!   - option: log-level
//!     value_type: string
//! options:
//!   - option: detach
//!     shorthand: d
//!     value_type: bool
//!     default_value: "false"
//! ```
//!
//! Each command becomes a task; each option becomes a property of its
//! settings class.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::naming::pascal_case;
use super::protocol::{lenient_string, ParseError, ParserInput, SpecificationFormat, SpecificationParser};
use super::vocabulary::TypeVocabulary;
use crate::domain::{ModelBuilder, Platform, Property, SettingsClass, Task, ToolMetadata, ValueType};

/// One option of a command
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArgumentDefinition {
    #[serde(rename = "option")]
    pub name: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub shorthand: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub value_type: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub default_value: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub os_type: Option<String>,

    #[serde(default)]
    pub deprecated: bool,
}

/// One command record
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommandDefinition {
    pub command: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub short: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub long: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub usage: Option<String>,

    #[serde(default)]
    pub options: Option<Vec<ArgumentDefinition>>,

    #[serde(default)]
    pub inherited_options: Option<Vec<ArgumentDefinition>>,

    #[serde(default)]
    pub deprecated: bool,

    #[serde(default)]
    pub experimental: bool,

    /// Sub-commands, present on commands that only group others
    #[serde(default)]
    pub cname: Option<Vec<String>>,
}

impl CommandDefinition {
    /// Commands with sub-commands but no options of their own
    pub fn is_group(&self) -> bool {
        let has_children = self.cname.as_ref().is_some_and(|c| !c.is_empty());
        let has_options = self.options.as_ref().is_some_and(|o| !o.is_empty());
        has_children && !has_options
    }

    /// Inherited options followed by own options; a later option with the
    /// same name replaces the earlier one in place. Deprecated options are
    /// dropped first, so they never replace a live definition.
    pub fn effective_options(&self) -> Vec<&ArgumentDefinition> {
        let mut merged: IndexMap<&str, &ArgumentDefinition> = IndexMap::new();
        let inherited = self.inherited_options.iter().flatten();
        let own = self.options.iter().flatten();

        for argument in inherited.chain(own).filter(|argument| !argument.deprecated) {
            if merged.insert(argument.name.as_str(), argument).is_some() {
                debug!(command = %self.command, option = %argument.name, "option overrides inherited definition");
            }
        }
        merged.into_values().collect()
    }
}

pub struct ArgumentListParser {
    input: ParserInput,
    executable: String,
    vocabulary: TypeVocabulary,
}

impl ArgumentListParser {
    pub fn new(input: ParserInput, metadata: &ToolMetadata, vocabulary: TypeVocabulary) -> Self {
        Self {
            input,
            executable: metadata.executable(),
            vocabulary,
        }
    }

    fn task(&self, tool: &str, command: &CommandDefinition) -> Result<Task, ParseError> {
        let mut words = command.command.split_whitespace();
        if let Some(first) = words.next() {
            if first != self.executable {
                debug!(command = %command.command, executable = %self.executable, "command does not start with the executable");
            }
        }
        let definite_argument = words.collect::<Vec<_>>().join(" ");

        let name = if definite_argument.is_empty() {
            pascal_case(&self.executable)
        } else {
            pascal_case(&definite_argument)
        };

        let properties = command
            .effective_options()
            .into_iter()
            .map(|argument| self.property(&command.command, argument))
            .collect::<Result<Vec<_>, _>>()?;

        let help = command
            .short
            .as_deref()
            .or(command.long.as_deref())
            .unwrap_or_default();

        let settings_class = SettingsClass::new(SettingsClass::name_for(tool, &name), properties);
        Ok(Task::new(name, settings_class)
            .with_help(help)
            .with_definite_argument(definite_argument))
    }

    fn property(&self, command: &str, argument: &ArgumentDefinition) -> Result<Property, ParseError> {
        let option = argument.name.trim();
        if option.is_empty() || option.starts_with('-') {
            return Err(ParseError::InvalidArgument {
                command: command.to_string(),
                reason: format!("option name '{}' is not usable", argument.name),
            });
        }

        let value_type = self.vocabulary.resolve(argument.value_type.as_deref());
        let format = if value_type.is_bool() {
            format!("--{}", option)
        } else {
            format!("--{} {{value}}", option)
        };

        Ok(Property::new(pascal_case(option), value_type.clone())
            .with_format(format)
            .with_help(argument.description.clone().unwrap_or_default())
            .with_default(meaningful_default(argument.default_value.as_deref(), &value_type))
            .with_platform(platform(command, option, argument.os_type.as_deref()))
            .with_shorthand(shorthand(command, option, argument.shorthand.as_deref())))
    }
}

impl SpecificationParser for ArgumentListParser {
    fn format(&self) -> SpecificationFormat {
        SpecificationFormat::ArgumentList
    }

    fn populate(&mut self, builder: &mut ModelBuilder) -> Result<()> {
        let tool = builder.tool_name().to_string();
        let mut added = 0;

        for definition in self.input.definitions() {
            let command: CommandDefinition = definition.parse()?;

            if command.deprecated {
                debug!(command = %command.command, "skipping deprecated command");
                continue;
            }
            if command.is_group() {
                debug!(command = %command.command, "skipping command group");
                continue;
            }

            let task = self
                .task(&tool, &command)
                .with_context(|| format!("Failed to parse {}", definition.origin))?;
            builder.add_task(task)?;
            added += 1;
        }

        info!(tool = %tool, tasks = added, "parsed argument list");
        Ok(())
    }
}

/// Drops defaults that only mean "unset"
fn meaningful_default(default: Option<&str>, value_type: &ValueType) -> Option<String> {
    let default = default?.trim();
    let unset = match default {
        "" | "[]" | "map[]" => true,
        "false" | "0" => value_type.is_bool(),
        _ => false,
    };
    (!unset).then(|| default.to_string())
}

fn platform(command: &str, option: &str, os_type: Option<&str>) -> Platform {
    match os_type.map(str::trim) {
        None | Some("") => Platform::Any,
        Some("windows") => Platform::Windows,
        Some("linux") | Some("unix") => Platform::Unix,
        Some(other) => {
            warn!(command, option, os_type = other, "unknown os_type, treating option as cross-platform");
            Platform::Any
        }
    }
}

fn shorthand(command: &str, option: &str, shorthand: Option<&str>) -> Option<char> {
    let shorthand = shorthand?.trim();
    let mut chars = shorthand.chars();
    match (chars.next(), chars.next()) {
        (None, _) => None,
        (Some(c), None) => Some(c),
        _ => {
            warn!(command, option, shorthand, "ignoring shorthand longer than one character");
            None
        }
    }
}
