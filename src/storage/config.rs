//! Configuration handling for toolspec
//!
//! Configuration is stored in `toolspec.toml` (project) and
//! `~/.config/toolspec/config.toml` (global). The project file lists the
//! tools to generate; the global file may add vocabulary entries.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::loader::SourceLocation;
use crate::domain::{MergePolicy, ToolMetadata, ValueType};
use crate::parser::{SpecificationFormat, TypeVocabulary};

/// Name of the project configuration file
pub const CONFIG_FILE: &str = "toolspec.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// One input of a tool: a format plus where its definitions live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub format: SpecificationFormat,

    pub source: SourceLocation,

    /// Version tag of the definitions (subfolder or `{reference}` in URLs)
    #[serde(default)]
    pub reference: Option<String>,

    /// Definition names to skip (exact match)
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// A tool to generate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolEntry {
    #[serde(flatten)]
    pub metadata: ToolMetadata,

    /// Inputs, parsed in order into the same tool
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

impl ToolEntry {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Folder for generated documents, relative to the project root
    pub output_folder: PathBuf,

    /// Common property lifting thresholds
    pub merge: MergePolicy,

    /// Extra raw type names, merged over the built-in vocabulary
    pub vocabulary: BTreeMap<String, ValueType>,

    /// Tools to generate
    #[serde(rename = "tool")]
    pub tools: Vec<ToolEntry>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            output_folder: PathBuf::from("specifications"),
            merge: MergePolicy::default(),
            vocabulary: BTreeMap::new(),
            tools: vec![],
        }
    }
}

impl ProjectConfig {
    /// Checks tool entries for missing names and sources
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for tool in &self.tools {
            if tool.name().trim().is_empty() {
                return Err(ConfigError::Invalid("tool entry without a name".to_string()));
            }
            if !seen.insert(tool.name()) {
                return Err(ConfigError::Invalid(format!("tool '{}' is configured twice", tool.name())));
            }
            if tool.sources.is_empty() {
                return Err(ConfigError::Invalid(format!("tool '{}' has no sources", tool.name())));
            }
        }
        Ok(())
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,

    /// Extra raw type names shared by all projects
    pub vocabulary: BTreeMap<String, ValueType>,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from an explicit project file
    pub fn from_file(path: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_file(path)?;
        let root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            project,
            global,
            project_root: Some(root),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "toolspec", "toolspec").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    pub fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads and validates a project configuration file
    fn load_project_file(config_path: &Path) -> Result<ProjectConfig> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")?;

        config.validate()?;
        Ok(config)
    }

    /// Finds the project root by looking for `toolspec.toml`
    pub fn find_project_root() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            if current.join(CONFIG_FILE).is_file() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns the project root, or an error if not in a project
    pub fn require_project_root(&self) -> Result<&Path> {
        self.project_root
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No {} found. Run 'toolspec init' first.", CONFIG_FILE))
    }

    /// Built-in vocabulary overlaid with global, then project entries
    pub fn vocabulary(&self) -> TypeVocabulary {
        let mut vocabulary = TypeVocabulary::builtin();
        vocabulary.extend(&self.global.vocabulary);
        vocabulary.extend(&self.project.vocabulary);
        vocabulary
    }

    /// Picks tool entries by name, or all of them when `names` is empty
    pub fn select_tools(&self, names: &[String]) -> Result<Vec<&ToolEntry>, ConfigError> {
        if names.is_empty() {
            return Ok(self.project.tools.iter().collect());
        }

        names
            .iter()
            .map(|name| {
                self.project
                    .tools
                    .iter()
                    .find(|t| t.name() == name)
                    .ok_or_else(|| ConfigError::Invalid(format!("unknown tool '{}'", name)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
output_folder = "out"

[merge]
min_tasks = 3

[vocabulary]
ulimit = "Dictionary<string,string>"

[[tool]]
name = "Docker"
help = "Docker CLI"
official_url = "https://docs.docker.com/engine/reference/commandline/cli/"
path_executable = "docker"

[[tool.sources]]
format = "argument-list"
source = { folder = "definitions/docker" }
reference = "v20.10"
exclude = ["docker_checkpoint"]
"#;

    fn config_with(project: ProjectConfig) -> Config {
        Config {
            project,
            global: GlobalConfig::default(),
            project_root: Some(PathBuf::from("/work")),
        }
    }

    #[test]
    fn parse_project_config() {
        let config: ProjectConfig = toml::from_str(SAMPLE).unwrap();

        assert_eq!(config.output_folder, PathBuf::from("out"));
        assert_eq!(config.merge.min_tasks, 3);
        assert_eq!(config.merge.min_set_size, 3);
        assert!(config.merge.enabled);

        let docker = &config.tools[0];
        assert_eq!(docker.name(), "Docker");
        assert_eq!(docker.metadata.path_executable.as_deref(), Some("docker"));
        assert_eq!(docker.sources[0].format, SpecificationFormat::ArgumentList);
        assert_eq!(docker.sources[0].reference.as_deref(), Some("v20.10"));
        assert_eq!(docker.sources[0].exclude, ["docker_checkpoint"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn project_vocabulary_overrides_builtin() {
        let config = config_with(toml::from_str(SAMPLE).unwrap());
        let vocabulary = config.vocabulary();

        assert_eq!(
            vocabulary.resolve(Some("ulimit")),
            ValueType::dictionary_of(ValueType::String, ValueType::String)
        );
        assert_eq!(vocabulary.resolve(Some("bool")), ValueType::Bool);
    }

    #[test]
    fn duplicate_tool_names_are_invalid() {
        let mut config: ProjectConfig = toml::from_str(SAMPLE).unwrap();
        config.tools.push(config.tools[0].clone());

        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn tool_without_sources_is_invalid() {
        let mut config: ProjectConfig = toml::from_str(SAMPLE).unwrap();
        config.tools[0].sources.clear();

        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn select_tools_by_name() {
        let config = config_with(toml::from_str(SAMPLE).unwrap());

        assert_eq!(config.select_tools(&[]).unwrap().len(), 1);
        assert_eq!(config.select_tools(&["Docker".to_string()]).unwrap()[0].name(), "Docker");
        assert!(config.select_tools(&["docker".to_string()]).is_err());
    }

    #[test]
    fn from_file_uses_parent_as_root() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, SAMPLE).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.project_root.as_deref(), Some(dir.path()));
        assert_eq!(config.project.tools.len(), 1);
    }

    #[test]
    fn config_without_project() {
        let config = Config {
            project: ProjectConfig::default(),
            global: GlobalConfig::default(),
            project_root: None,
        };

        assert!(config.require_project_root().is_err());
        assert_eq!(config.global.default_format, OutputFormat::Text);
    }
}
