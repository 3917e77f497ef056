//! Project management
//!
//! A project is a directory holding `toolspec.toml`. Relative definition
//! sources and the output folder are resolved against its root.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::{Config, CONFIG_FILE};
use crate::generator::GenerateOptions;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("No toolspec.toml found. Run 'toolspec init' first.")]
    NotInProject,
}

const STARTER_CONFIG: &str = r#"# toolspec configuration

# Folder for generated <Tool>.json documents
output_folder = "specifications"

[merge]
enabled = true
min_tasks = 2
min_set_size = 3

# Extra raw type names, e.g. ulimit = "Dictionary<string,string>"
[vocabulary]

[[tool]]
name = "Example"
help = "Example command-line tool"
path_executable = "example"

[[tool.sources]]
format = "argument-list"
source = { folder = "definitions/example" }
exclude = []
"#;

const STARTER_DEFINITION: &str = r#"command: example run
short: Run a job
options:
- option: name
  value_type: string
  description: Job name
- option: detach
  shorthand: d
  value_type: bool
  default_value: "false"
  description: Run in the background
"#;

/// A toolspec project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config_path = root.join(CONFIG_FILE);

        if !config_path.is_file() {
            return Err(ProjectError::NotInProject.into());
        }

        Self::open_config(&config_path)
    }

    /// Opens the project described by an explicit config file
    pub fn open_config(config_path: &Path) -> Result<Self> {
        let config = Config::from_file(config_path)?;
        let root = config.require_project_root()?.to_path_buf();
        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project with a starter configuration
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create project directory: {}", root.display()))?;

        let config_path = root.join(CONFIG_FILE);
        if !config_path.exists() {
            fs::write(&config_path, STARTER_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

            let definitions_dir = root.join("definitions").join("example");
            fs::create_dir_all(&definitions_dir).with_context(|| {
                format!(
                    "Failed to create definitions directory: {}",
                    definitions_dir.display()
                )
            })?;

            let definition_path = definitions_dir.join("example_run.yaml");
            fs::write(&definition_path, STARTER_DEFINITION).with_context(|| {
                format!("Failed to write definition: {}", definition_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the folder generated documents are written to
    pub fn output_folder(&self) -> PathBuf {
        self.root.join(&self.config.project.output_folder)
    }

    /// Options for running the generator inside this project
    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            base_dir: self.root.clone(),
            output_folder: self.output_folder(),
            vocabulary: self.config.vocabulary(),
            merge: self.config.project.merge.clone(),
        }
    }
}
