//! Model builder
//!
//! Collects parser output into one [`Tool`], rejecting ambiguous names.
//! Data classes and enumerations share one type namespace since properties
//! refer to both by bare name.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use super::merge::{lift_common_properties, MergePolicy};
use super::tool::{DataClass, Enumeration, Task, Tool};

/// Kind of named definition held by a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    Task,
    DataClass,
    Enumeration,
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionKind::Task => f.write_str("task"),
            DefinitionKind::DataClass => f.write_str("data class"),
            DefinitionKind::Enumeration => f.write_str("enumeration"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("Duplicate {kind} definition '{name}' in tool {tool}")]
    DuplicateDefinition {
        tool: String,
        kind: DefinitionKind,
        name: String,
    },
}

/// Tool under construction
#[derive(Debug)]
pub struct ModelBuilder {
    tool: Tool,
    task_names: HashSet<String>,
    type_names: HashSet<String>,
}

impl ModelBuilder {
    pub fn new(tool: Tool) -> Self {
        let task_names = tool.tasks.iter().map(|t| t.name.clone()).collect();
        let type_names = tool
            .data_classes
            .iter()
            .map(|d| d.name.clone())
            .chain(tool.enumerations.iter().map(|e| e.name.clone()))
            .collect();

        Self {
            tool,
            task_names,
            type_names,
        }
    }

    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    pub fn tool_name(&self) -> &str {
        &self.tool.name
    }

    pub fn add_task(&mut self, task: Task) -> Result<(), BuildError> {
        if !self.task_names.insert(task.name.clone()) {
            return Err(self.duplicate(DefinitionKind::Task, task.name));
        }
        debug!(task = %task.name, properties = task.properties().len(), "added task");
        self.tool.tasks.push(task);
        Ok(())
    }

    pub fn add_data_class(&mut self, data_class: DataClass) -> Result<(), BuildError> {
        if !self.type_names.insert(data_class.name.clone()) {
            return Err(self.duplicate(DefinitionKind::DataClass, data_class.name));
        }
        debug!(data_class = %data_class.name, "added data class");
        self.tool.data_classes.push(data_class);
        Ok(())
    }

    pub fn add_enumeration(&mut self, enumeration: Enumeration) -> Result<(), BuildError> {
        if !self.type_names.insert(enumeration.name.clone()) {
            return Err(self.duplicate(DefinitionKind::Enumeration, enumeration.name));
        }
        debug!(enumeration = %enumeration.name, values = enumeration.values.len(), "added enumeration");
        self.tool.enumerations.push(enumeration);
        Ok(())
    }

    fn duplicate(&self, kind: DefinitionKind, name: String) -> BuildError {
        BuildError::DuplicateDefinition {
            tool: self.tool.name.clone(),
            kind,
            name,
        }
    }

    /// Runs the merge pass and hands out the finished tool
    pub fn finish(mut self, policy: &MergePolicy) -> Tool {
        lift_common_properties(&mut self.tool, policy);
        self.tool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Property, SettingsClass, ToolMetadata, ValueType};

    fn builder() -> ModelBuilder {
        ModelBuilder::new(Tool::from_metadata(&ToolMetadata::new("Tool")))
    }

    fn task(name: &str) -> Task {
        Task::new(name, SettingsClass::new(format!("Tool{}Settings", name), vec![]))
    }

    #[test]
    fn adds_definitions_in_order() {
        let mut builder = builder();
        builder.add_task(task("Build")).unwrap();
        builder.add_task(task("Run")).unwrap();

        let names: Vec<_> = builder.tool().tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Build", "Run"]);
    }

    #[test]
    fn duplicate_task_is_rejected() {
        let mut builder = builder();
        builder.add_task(task("Build")).unwrap();

        let err = builder.add_task(task("Build")).unwrap_err();
        assert_eq!(
            err,
            BuildError::DuplicateDefinition {
                tool: "Tool".to_string(),
                kind: DefinitionKind::Task,
                name: "Build".to_string(),
            }
        );
        assert_eq!(builder.tool().tasks.len(), 1);
    }

    #[test]
    fn data_classes_and_enumerations_share_names() {
        let mut builder = builder();
        builder
            .add_data_class(DataClass::new("Mode", vec![Property::new("Value", ValueType::String)]))
            .unwrap();

        let err = builder
            .add_enumeration(Enumeration::new("Mode", vec!["fast".to_string()]))
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::DuplicateDefinition { kind: DefinitionKind::Enumeration, .. }
        ));
        assert_eq!(builder.tool().enumerations.len(), 0);
    }

    #[test]
    fn task_and_type_namespaces_are_separate() {
        let mut builder = builder();
        builder.add_task(task("Config")).unwrap();
        builder.add_data_class(DataClass::new("Config", vec![])).unwrap();
        assert_eq!(builder.tool().data_classes.len(), 1);
    }
}
