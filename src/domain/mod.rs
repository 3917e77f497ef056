//! Tool model for generated specifications
//!
//! Contains the object graph and the passes over it, without any I/O.

mod builder;
mod graph;
mod merge;
mod property;
mod resolve;
mod tool;

pub use builder::{BuildError, DefinitionKind, ModelBuilder};
pub use graph::{GraphError, ReferenceGraph};
pub use merge::{lift_common_properties, MergeOutcome, MergePolicy};
pub use property::{Platform, Property, TypeReference, ValueType, ValueTypeError};
pub use resolve::resolve_references;
pub use tool::{CommonTaskPropertySet, DataClass, Enumeration, SettingsClass, Task, Tool, ToolMetadata};
