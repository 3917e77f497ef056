//! toolspec - Turns descriptions of command-line tools into specification documents
//!
//! Definitions in several input formats (argument lists, API descriptions,
//! nested schemas) are parsed into one [`Tool`] model, deduplicated and
//! written as a deterministic `<Tool>.json` for downstream code emitters.

pub mod cli;
pub mod domain;
pub mod generator;
pub mod parser;
pub mod storage;

pub use domain::{DataClass, Enumeration, Property, Task, Tool, ValueType};
pub use generator::{generate, GenerateOptions, GenerationSummary};
