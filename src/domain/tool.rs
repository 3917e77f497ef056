//! Tool aggregate
//!
//! A [`Tool`] owns its tasks, data classes and enumerations. Ownership is
//! strictly tree-shaped: navigation back up the tree (task to tool, settings
//! class to task) goes through name references that are filled in by
//! [`resolve_references`](super::resolve_references) once the tree is built.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::property::Property;

/// Static description of a tool, supplied by configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ToolMetadata {
    pub name: String,

    pub help: String,

    pub official_url: Option<String>,

    /// License header lines
    pub license: Vec<String>,

    /// Executable name expected on PATH
    pub path_executable: Option<String>,

    /// Environment variable that may point to the executable
    pub environment_executable: Option<String>,

    /// Package that ships the executable
    pub package_id: Option<String>,

    /// Executable name inside the package
    pub package_executable: Option<String>,

    pub custom_executable: bool,

    /// Argument template for API-described parameters, `{name}` and `{value}` are substituted
    pub argument_format: Option<String>,
}

impl ToolMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the command word that prefixes every task invocation
    pub fn executable(&self) -> String {
        self.path_executable
            .clone()
            .unwrap_or_else(|| self.name.to_lowercase())
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Root aggregate for one wrapped command-line tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official_url: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub license: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_executable: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_executable: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_executable: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub custom_executable: bool,

    #[serde(default)]
    pub tasks: Vec<Task>,

    #[serde(default)]
    pub data_classes: Vec<DataClass>,

    #[serde(default)]
    pub enumerations: Vec<Enumeration>,

    #[serde(default)]
    pub common_task_properties: Vec<Property>,

    #[serde(default)]
    pub common_task_property_sets: Vec<CommonTaskPropertySet>,
}

impl Tool {
    /// Creates an empty tool from its configured metadata
    pub fn from_metadata(metadata: &ToolMetadata) -> Self {
        Self {
            name: metadata.name.clone(),
            help: metadata.help.clone(),
            official_url: metadata.official_url.clone(),
            license: metadata.license.clone(),
            path_executable: metadata.path_executable.clone(),
            environment_executable: metadata.environment_executable.clone(),
            package_id: metadata.package_id.clone(),
            package_executable: metadata.package_executable.clone(),
            custom_executable: metadata.custom_executable,
            tasks: Vec::new(),
            data_classes: Vec::new(),
            enumerations: Vec::new(),
            common_task_properties: Vec::new(),
            common_task_property_sets: Vec::new(),
        }
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn data_class(&self, name: &str) -> Option<&DataClass> {
        self.data_classes.iter().find(|d| d.name == name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&Enumeration> {
        self.enumerations.iter().find(|e| e.name == name)
    }

    pub fn common_property_set(&self, name: &str) -> Option<&CommonTaskPropertySet> {
        self.common_task_property_sets.iter().find(|s| s.name == name)
    }

    /// Lists `(owner, type)` for every named property type the tool does not define
    pub fn undefined_types(&self) -> Vec<(String, String)> {
        let defined: HashSet<&str> = self
            .data_classes
            .iter()
            .map(|d| d.name.as_str())
            .chain(self.enumerations.iter().map(|e| e.name.as_str()))
            .collect();

        let owners = self
            .tasks
            .iter()
            .map(|t| (format!("task {}", t.name), t.properties()))
            .chain(
                self.data_classes
                    .iter()
                    .map(|d| (format!("data class {}", d.name), d.properties.as_slice())),
            )
            .chain(std::iter::once((
                "common properties".to_string(),
                self.common_task_properties.as_slice(),
            )))
            .chain(
                self.common_task_property_sets
                    .iter()
                    .map(|s| (format!("property set {}", s.name), s.properties.as_slice())),
            );

        let mut undefined = Vec::new();
        for (owner, properties) in owners {
            for property in properties {
                if let Some(name) = property.value_type.named() {
                    if !defined.contains(name) {
                        undefined.push((format!("{}.{}", owner, property.name), name.to_string()));
                    }
                }
            }
        }
        undefined
    }

    /// Returns true once every back-reference points at its owner
    pub fn is_resolved(&self) -> bool {
        let own = Some(self.name.as_str());
        self.data_classes.iter().all(|d| d.tool.as_deref() == own)
            && self.tasks.iter().all(|t| {
                t.tool.as_deref() == own
                    && t.settings_class.tool.as_deref() == own
                    && t.settings_class.task.as_deref() == Some(t.name.as_str())
            })
    }
}

/// One exposed operation of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,

    /// Sub-command words passed before any property (e.g. `container create`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definite_argument: Option<String>,

    pub settings_class: SettingsClass,

    /// Names of lifted common properties this task uses
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub common_properties: Vec<String>,

    /// Names of lifted common property sets this task uses
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub common_property_sets: Vec<String>,

    /// Owning tool (back-reference)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

impl Task {
    pub fn new(name: impl Into<String>, settings_class: SettingsClass) -> Self {
        Self {
            name: name.into(),
            help: String::new(),
            definite_argument: None,
            settings_class,
            common_properties: Vec::new(),
            common_property_sets: Vec::new(),
            tool: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into().trim().to_string();
        self
    }

    pub fn with_definite_argument(mut self, argument: impl Into<String>) -> Self {
        let argument = argument.into();
        self.definite_argument = (!argument.is_empty()).then_some(argument);
        self
    }

    pub fn properties(&self) -> &[Property] {
        &self.settings_class.properties
    }
}

/// Property bag backing a task's invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsClass {
    pub name: String,

    #[serde(default)]
    pub properties: Vec<Property>,

    /// Owning task (back-reference)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,

    /// Owning tool (back-reference)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

impl SettingsClass {
    pub fn new(name: impl Into<String>, properties: Vec<Property>) -> Self {
        Self {
            name: name.into(),
            properties,
            task: None,
            tool: None,
        }
    }

    /// Conventional settings class name: `<Tool><Task>Settings`
    pub fn name_for(tool: &str, task: &str) -> String {
        format!("{}{}Settings", tool, task)
    }
}

/// Reusable structured type referenced by properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataClass {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,

    #[serde(default)]
    pub properties: Vec<Property>,

    /// Owning tool (back-reference)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

impl DataClass {
    pub fn new(name: impl Into<String>, properties: Vec<Property>) -> Self {
        Self {
            name: name.into(),
            help: String::new(),
            properties,
            tool: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into().trim().to_string();
        self
    }
}

/// Closed set of named values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enumeration {
    pub name: String,
    pub values: Vec<String>,
}

impl Enumeration {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Ordered group of properties shared verbatim by several tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonTaskPropertySet {
    pub name: String,
    pub properties: Vec<Property>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValueType;

    #[test]
    fn from_metadata_copies_executable_hints() {
        let mut metadata = ToolMetadata::new("Docker");
        metadata.path_executable = Some("docker".to_string());
        metadata.environment_executable = Some("DOCKER_EXE".to_string());

        let tool = Tool::from_metadata(&metadata);
        assert_eq!(tool.name, "Docker");
        assert_eq!(tool.path_executable.as_deref(), Some("docker"));
        assert_eq!(tool.environment_executable.as_deref(), Some("DOCKER_EXE"));
        assert!(tool.tasks.is_empty());
    }

    #[test]
    fn executable_falls_back_to_lowercase_name() {
        assert_eq!(ToolMetadata::new("Helm").executable(), "helm");
    }

    #[test]
    fn undefined_types_are_listed_by_owner() {
        let mut tool = Tool::from_metadata(&ToolMetadata::new("Helm"));
        tool.enumerations.push(Enumeration::new("Strategy", vec!["wait".to_string()]));
        tool.tasks.push(Task::new(
            "Install",
            SettingsClass::new(
                "HelmInstallSettings",
                vec![
                    Property::new("Strategy", ValueType::Named("Strategy".to_string())),
                    Property::new("Timeout", ValueType::list_of(ValueType::Named("TimeSpan".to_string()))),
                ],
            ),
        ));

        assert_eq!(
            tool.undefined_types(),
            [("task Install.Timeout".to_string(), "TimeSpan".to_string())]
        );
    }

    #[test]
    fn empty_definite_argument_is_dropped() {
        let task = Task::new("Run", SettingsClass::new("ToolRunSettings", vec![]))
            .with_definite_argument("");
        assert_eq!(task.definite_argument, None);
    }

    #[test]
    fn fresh_tool_with_tasks_is_unresolved() {
        let mut tool = Tool::from_metadata(&ToolMetadata::new("Tool"));
        assert!(tool.is_resolved());

        tool.tasks.push(Task::new(
            "Run",
            SettingsClass::new("ToolRunSettings", vec![Property::new("Force", ValueType::Bool)]),
        ));
        assert!(!tool.is_resolved());
    }
}
