//! Tool commands (list, generate)

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::output::Output;
use crate::generator::{self, GenerationSummary};
use crate::storage::Project;

/// Opens the project named by `--config`, or the one around the current directory
pub fn open_project(config: Option<&Path>) -> Result<Project> {
    match config {
        Some(path) => Project::open_config(path),
        None => Project::open_current(),
    }
}

/// Lists the configured tools and their sources
pub fn list(output: &Output, config: Option<&Path>) -> Result<()> {
    let project = open_project(config)?;
    output.verbose_ctx("list", &format!("Opened project at: {}", project.root().display()));

    let tools = &project.config().project.tools;

    if output.is_json() {
        let items: Vec<_> = tools
            .iter()
            .map(|tool| {
                serde_json::json!({
                    "name": tool.name(),
                    "help": tool.metadata.help,
                    "sources": tool.sources.iter().map(|s| serde_json::json!({
                        "format": s.format,
                        "source": s.source.describe(),
                        "reference": s.reference,
                        "exclude": s.exclude,
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();
        output.data(&items);
    } else if tools.is_empty() {
        println!("No tools configured.");
    } else {
        println!("{:<20} {:<16} SOURCE", "TOOL", "FORMAT");
        println!("{}", "-".repeat(70));
        for tool in tools {
            for source in &tool.sources {
                println!("{:<20} {:<16} {}", tool.name(), source.format, source.source.describe());
            }
        }
    }

    Ok(())
}

/// Generates documents for the selected tools (all when none are named)
pub fn generate(output: &Output, config: Option<&Path>, tools: &[String], output_dir: Option<PathBuf>) -> Result<()> {
    let project = open_project(config)?;
    output.verbose_ctx("generate", &format!("Opened project at: {}", project.root().display()));

    let mut options = project.generate_options();
    if let Some(dir) = output_dir {
        options.output_folder = dir;
    }
    output.verbose_ctx(
        "generate",
        &format!("Writing documents to: {}", options.output_folder.display()),
    );

    let selected = project.config().select_tools(tools)?;
    let mut summaries = Vec::with_capacity(selected.len());
    for entry in selected {
        output.verbose_ctx("generate", &format!("Generating {}", entry.name()));
        let summary = generator::generate(entry, &options)?;
        if !output.is_json() {
            print_summary(&summary);
        }
        summaries.push(summary);
    }

    if output.is_json() {
        output.data(&summaries);
    } else if summaries.is_empty() {
        println!("No tools configured.");
    }

    Ok(())
}

fn print_summary(summary: &GenerationSummary) {
    println!("Generated {} -> {}", summary.tool, summary.path.display());
    println!("  Tasks:                      {}", summary.tasks);
    println!("  Data classes:               {}", summary.data_classes);
    println!("  Enumerations:               {}", summary.enumerations);
    println!("  Common task properties:     {}", summary.common_task_properties);
    println!("  Common task property sets:  {}", summary.common_task_property_sets);
}
