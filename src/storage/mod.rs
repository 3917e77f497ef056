//! # Storage Layer
//!
//! Everything that touches the filesystem or network.
//!
//! ## Files
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Project config | TOML | `toolspec.toml` |
//! | Global config | TOML | `~/.config/toolspec/config.toml` |
//! | Definitions | YAML or JSON | configured per tool source |
//! | Specifications | Pretty JSON | `<output_folder>/<Tool>.json` |
//!
//! ## Write Safety
//!
//! Specification documents are written to a locked temp file (`fs2`) and
//! renamed into place, so a failed run never leaves a truncated document.
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for a toolspec project
//! - [`Config`] - Project and global configuration
//! - [`RawDefinition`] - One unparsed definition read by [`load`]
//! - [`WrittenDocument`] - Result of [`save`]

mod config;
mod document;
mod loader;
mod project;

pub use config::{Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig, SourceEntry, ToolEntry, CONFIG_FILE};
pub use document::{document_path, load as load_document, render, save, SerializationError, WrittenDocument};
pub use loader::{load, DocumentFormat, LoadError, RawDefinition, SourceLocation};
pub use project::{Project, ProjectError};
