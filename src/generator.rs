//! Generation pipeline
//!
//! Runs one configured tool through load, parse, build, resolve and save.
//! Stages only ever hand their output forward. Any failure aborts before
//! the document is written, so a run leaves either a complete document or
//! the previous one untouched.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{resolve_references, MergePolicy, ModelBuilder, Tool};
use crate::parser::{self, TypeVocabulary};
use crate::storage::{self, ToolEntry};

/// Inputs shared by every tool of a run
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Relative definition folders and files are resolved against this
    pub base_dir: PathBuf,

    pub output_folder: PathBuf,

    pub vocabulary: TypeVocabulary,

    pub merge: MergePolicy,
}

/// Counts and output location of one generated document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    pub tool: String,
    pub tasks: usize,
    pub data_classes: usize,
    pub enumerations: usize,
    pub common_task_properties: usize,
    pub common_task_property_sets: usize,
    pub path: PathBuf,
    pub fingerprint: String,
}

impl GenerationSummary {
    fn new(tool: &Tool, path: PathBuf, fingerprint: String) -> Self {
        Self {
            tool: tool.name.clone(),
            tasks: tool.tasks.len(),
            data_classes: tool.data_classes.len(),
            enumerations: tool.enumerations.len(),
            common_task_properties: tool.common_task_properties.len(),
            common_task_property_sets: tool.common_task_property_sets.len(),
            path,
            fingerprint,
        }
    }
}

/// Builds the resolved tool without writing anything
pub fn build(entry: &ToolEntry, options: &GenerateOptions) -> Result<Tool> {
    let mut builder = ModelBuilder::new(Tool::from_metadata(&entry.metadata));

    for source in &entry.sources {
        let location = source.source.relative_to(&options.base_dir);
        let definitions = storage::load(&location, source.reference.as_deref(), &source.exclude)
            .with_context(|| format!("Failed to load definitions for {}", entry.name()))?;

        // The parser, and the definitions it owns, are released at the end of this block
        {
            let mut format_parser =
                parser::open(source.format, definitions, &entry.metadata, &options.vocabulary);
            format_parser
                .populate(&mut builder)
                .with_context(|| format!("Failed to parse {} ({})", location.describe(), format_parser.format()))?;
        }
    }

    let mut tool = builder.finish(&options.merge);
    resolve_references(&mut tool);

    // Vocabulary entries may name types the emitter provides itself
    for (owner, type_name) in tool.undefined_types() {
        warn!(tool = %tool.name, property = %owner, value_type = %type_name, "type is not defined by this tool");
    }
    Ok(tool)
}

/// Builds a tool and writes `<Tool>.json` into the output folder
pub fn generate(entry: &ToolEntry, options: &GenerateOptions) -> Result<GenerationSummary> {
    info!(tool = %entry.name(), sources = entry.sources.len(), "generating specification");

    let tool = build(entry, options)?;
    let written = storage::save(&tool, &options.output_folder)?;

    let summary = GenerationSummary::new(&tool, written.path, written.fingerprint);
    info!(
        tool = %summary.tool,
        tasks = summary.tasks,
        data_classes = summary.data_classes,
        enumerations = summary.enumerations,
        common_task_properties = summary.common_task_properties,
        common_task_property_sets = summary.common_task_property_sets,
        "generation finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BuildError, ToolMetadata};
    use crate::parser::SpecificationFormat;
    use crate::storage::{document_path, SourceEntry, SourceLocation};
    use std::fs;
    use tempfile::TempDir;

    fn options(dir: &TempDir) -> GenerateOptions {
        GenerateOptions {
            base_dir: dir.path().to_path_buf(),
            output_folder: dir.path().join("out"),
            vocabulary: TypeVocabulary::builtin(),
            merge: MergePolicy::default(),
        }
    }

    fn entry(name: &str, sources: Vec<SourceEntry>) -> ToolEntry {
        let mut metadata = ToolMetadata::new(name);
        metadata.path_executable = Some(name.to_lowercase());
        ToolEntry { metadata, sources }
    }

    fn folder(format: SpecificationFormat, path: &str) -> SourceEntry {
        SourceEntry {
            format,
            source: SourceLocation::Folder(PathBuf::from(path)),
            reference: None,
            exclude: vec![],
        }
    }

    fn write_commands(dir: &TempDir) {
        let definitions = dir.path().join("defs");
        fs::create_dir_all(&definitions).unwrap();
        for command in ["build", "push", "pull"] {
            fs::write(
                definitions.join(format!("docker_{}.yaml", command)),
                format!(
                    "command: docker {}\noptions:\n  - option: quiet\n    value_type: bool\n  - option: platform\n    value_type: string\n",
                    command
                ),
            )
            .unwrap();
        }
    }

    #[test]
    fn generate_writes_resolved_document() {
        let dir = TempDir::new().unwrap();
        write_commands(&dir);
        let entry = entry("Docker", vec![folder(SpecificationFormat::ArgumentList, "defs")]);

        let summary = generate(&entry, &options(&dir)).unwrap();

        assert_eq!(summary.tool, "Docker");
        assert_eq!(summary.tasks, 3);
        assert_eq!(summary.common_task_properties, 2);
        assert_eq!(summary.path, document_path(&dir.path().join("out"), "Docker"));

        let tool = storage::load_document(&summary.path).unwrap();
        assert!(tool.is_resolved());
        assert_eq!(tool.tasks[0].common_properties, ["Quiet", "Platform"]);
    }

    #[test]
    fn sources_share_one_namespace() {
        let dir = TempDir::new().unwrap();
        write_commands(&dir);
        let entry = entry(
            "Docker",
            vec![
                folder(SpecificationFormat::ArgumentList, "defs"),
                folder(SpecificationFormat::ArgumentList, "defs"),
            ],
        );

        let err = generate(&entry, &options(&dir)).unwrap_err();
        assert!(err.downcast_ref::<BuildError>().is_some());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn failed_run_keeps_previous_document() {
        let dir = TempDir::new().unwrap();
        write_commands(&dir);
        let options = options(&dir);
        let good = entry("Docker", vec![folder(SpecificationFormat::ArgumentList, "defs")]);
        let summary = generate(&good, &options).unwrap();
        let before = fs::read(&summary.path).unwrap();

        fs::write(dir.path().join("defs/docker_broken.yaml"), "usage: no command here\n").unwrap();
        assert!(generate(&good, &options).is_err());

        assert_eq!(fs::read(&summary.path).unwrap(), before);
    }

    #[test]
    fn missing_source_fails_before_writing() {
        let dir = TempDir::new().unwrap();
        let entry = entry("Docker", vec![folder(SpecificationFormat::ArgumentList, "missing")]);

        let err = generate(&entry, &options(&dir)).unwrap_err();
        assert!(err.downcast_ref::<storage::LoadError>().is_some());
        assert!(!dir.path().join("out").exists());
    }
}
