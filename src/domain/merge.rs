//! Common property lifting
//!
//! After all parsers ran, properties repeated verbatim across tasks are
//! lifted out of the settings classes:
//!
//! 1. Ordered blocks of at least `min_set_size` properties found in at least
//!    `min_tasks` tasks become a [`CommonTaskPropertySet`]. The block covering
//!    the most property slots (length times tasks) goes first; ties go to the
//!    longer block, then to the block seen first.
//! 2. Single properties still found in at least `min_tasks` tasks become
//!    common task properties.
//!
//! Properties match by full equality, so two properties that only share a
//! name and description but differ in default stay separate.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::property::Property;
use super::tool::{CommonTaskPropertySet, Task, Tool};

/// Thresholds for lifting shared properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergePolicy {
    /// Run the merge pass at all
    pub enabled: bool,

    /// Minimum number of tasks that must share a property (at least 2)
    pub min_tasks: usize,

    /// Minimum block length lifted as a set (at least 2)
    pub min_set_size: usize,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            min_tasks: 2,
            min_set_size: 3,
        }
    }
}

impl MergePolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Number of definitions created by one merge pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub property_sets: usize,
    pub properties: usize,
}

/// Lifts shared property blocks and properties out of the tool's tasks
///
/// # Returns
///
/// How many sets and single properties were lifted.
pub fn lift_common_properties(tool: &mut Tool, policy: &MergePolicy) -> MergeOutcome {
    if !policy.enabled {
        return MergeOutcome::default();
    }

    let min_tasks = policy.min_tasks.max(2);
    let min_set_size = policy.min_set_size.max(2);

    let outcome = MergeOutcome {
        property_sets: lift_sets(tool, min_tasks, min_set_size),
        properties: lift_properties(tool, min_tasks),
    };

    debug!(
        tool = %tool.name,
        sets = outcome.property_sets,
        properties = outcome.properties,
        "merged common task properties"
    );
    outcome
}

#[derive(Debug)]
struct Candidate {
    tasks: usize,
    last_task: usize,
    first_seen: usize,
}

/// Finds the shared block with the best coverage, if any qualifies
fn best_shared_block(tasks: &[Task], min_tasks: usize, min_len: usize) -> Option<Vec<Property>> {
    let mut candidates: HashMap<&[Property], Candidate> = HashMap::new();

    for (index, task) in tasks.iter().enumerate() {
        let properties = task.properties();
        for len in min_len..=properties.len() {
            for window in properties.windows(len) {
                let first_seen = candidates.len();
                let candidate = candidates.entry(window).or_insert(Candidate {
                    tasks: 0,
                    last_task: usize::MAX,
                    first_seen,
                });
                if candidate.last_task != index {
                    candidate.tasks += 1;
                    candidate.last_task = index;
                }
            }
        }
    }

    candidates
        .into_iter()
        .filter(|(_, c)| c.tasks >= min_tasks)
        .max_by(|(wa, a), (wb, b)| {
            (wa.len() * a.tasks)
                .cmp(&(wb.len() * b.tasks))
                .then(wa.len().cmp(&wb.len()))
                .then(b.first_seen.cmp(&a.first_seen))
        })
        .map(|(window, _)| window.to_vec())
}

fn find_block(properties: &[Property], block: &[Property]) -> Option<usize> {
    properties.windows(block.len()).position(|w| w == block)
}

fn unique_set_name(tool: &Tool, base: &str) -> String {
    let base = format!("{}Set", base);
    let mut name = base.clone();
    let mut suffix = 2;
    while tool.common_property_set(&name).is_some() {
        name = format!("{}{}", base, suffix);
        suffix += 1;
    }
    name
}

fn lift_sets(tool: &mut Tool, min_tasks: usize, min_len: usize) -> usize {
    let mut lifted = 0;

    while let Some(block) = best_shared_block(&tool.tasks, min_tasks, min_len) {
        let name = unique_set_name(tool, &block[0].name);
        let mut users = 0;

        for task in &mut tool.tasks {
            let properties = &mut task.settings_class.properties;
            if let Some(start) = find_block(properties, &block) {
                properties.drain(start..start + block.len());
                task.common_property_sets.push(name.clone());
                users += 1;
            }
        }

        debug!(set = %name, properties = block.len(), tasks = users, "lifted common property set");
        tool.common_task_property_sets.push(CommonTaskPropertySet {
            name,
            properties: block,
        });
        lifted += 1;
    }

    lifted
}

fn lift_properties(tool: &mut Tool, min_tasks: usize) -> usize {
    let mut counts: HashMap<&Property, usize> = HashMap::new();
    let mut order: Vec<&Property> = Vec::new();

    for task in &tool.tasks {
        let mut in_task = HashSet::new();
        for property in task.properties() {
            if !in_task.insert(property) {
                continue;
            }
            let count = counts.entry(property).or_insert(0);
            if *count == 0 {
                order.push(property);
            }
            *count += 1;
        }
    }

    let mut taken: HashSet<&str> = tool
        .common_task_properties
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    let mut chosen: Vec<Property> = Vec::new();
    for property in order {
        if counts[property] >= min_tasks && taken.insert(property.name.as_str()) {
            chosen.push(property.clone());
        }
    }

    if chosen.is_empty() {
        return 0;
    }

    let lifted: HashSet<&Property> = chosen.iter().collect();
    for task in &mut tool.tasks {
        let mut names = Vec::new();
        task.settings_class.properties.retain(|p| {
            if lifted.contains(p) {
                if !names.contains(&p.name) {
                    names.push(p.name.clone());
                }
                false
            } else {
                true
            }
        });
        task.common_properties.extend(names);
    }

    let count = chosen.len();
    tool.common_task_properties.extend(chosen);
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SettingsClass, ToolMetadata, ValueType};

    fn prop(name: &str) -> Property {
        Property::new(name, ValueType::String)
            .with_format(format!("--{} {{value}}", name.to_lowercase()))
            .with_help(format!("{} option", name))
    }

    /// Builds a tool from `(task, "space separated property names")` pairs
    fn tool_with(tasks: &[(&str, &str)]) -> Tool {
        let mut tool = Tool::from_metadata(&ToolMetadata::new("Tool"));
        for (name, props) in tasks {
            let properties = props.split_whitespace().map(prop).collect();
            tool.tasks.push(Task::new(
                *name,
                SettingsClass::new(SettingsClass::name_for("Tool", name), properties),
            ));
        }
        tool
    }

    fn names(properties: &[Property]) -> Vec<&str> {
        properties.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn shared_block_is_lifted_as_one_set() {
        let mut tool = tool_with(&[
            ("A", "Config Host Tls Force"),
            ("B", "Config Host Tls"),
            ("C", "Name Config Host Tls"),
            ("D", "Config Host Tls Quiet"),
            ("E", "Config Host"),
        ]);

        let outcome = lift_common_properties(&mut tool, &MergePolicy::default());

        assert_eq!(outcome.property_sets, 1);
        assert_eq!(tool.common_task_property_sets.len(), 1);
        let set = &tool.common_task_property_sets[0];
        assert_eq!(set.name, "ConfigSet");
        assert_eq!(names(&set.properties), ["Config", "Host", "Tls"]);

        for name in ["A", "B", "C", "D"] {
            assert_eq!(tool.task(name).unwrap().common_property_sets, ["ConfigSet"]);
        }

        let e = tool.task("E").unwrap();
        assert!(e.common_property_sets.is_empty());
        assert!(e.common_properties.is_empty());
        assert_eq!(names(e.properties()), ["Config", "Host"]);
        assert!(tool.common_task_properties.is_empty());
    }

    #[test]
    fn single_shared_property_is_lifted() {
        let mut tool = tool_with(&[
            ("A", "Debug Force"),
            ("B", "Quiet Debug"),
            ("C", "Name"),
        ]);

        let outcome = lift_common_properties(&mut tool, &MergePolicy::default());

        assert_eq!(outcome, MergeOutcome { property_sets: 0, properties: 1 });
        assert_eq!(names(&tool.common_task_properties), ["Debug"]);
        assert_eq!(tool.task("A").unwrap().common_properties, ["Debug"]);
        assert_eq!(names(tool.task("A").unwrap().properties()), ["Force"]);
        assert_eq!(names(tool.task("B").unwrap().properties()), ["Quiet"]);
        assert!(tool.task("C").unwrap().common_properties.is_empty());
    }

    #[test]
    fn longer_block_wins_when_coverage_ties() {
        // 4 props x 3 tasks = 12 slots vs 3 props x 4 tasks = 12 slots
        let mut tool = tool_with(&[
            ("A", "W X Y Z"),
            ("B", "W X Y Z"),
            ("C", "W X Y Z"),
            ("D", "W X Y"),
        ]);

        lift_common_properties(&mut tool, &MergePolicy::default());

        assert_eq!(names(&tool.common_task_property_sets[0].properties), ["W", "X", "Y", "Z"]);
        // D keeps a block that is no longer shared with anyone
        assert_eq!(names(tool.task("D").unwrap().properties()), ["W", "X", "Y"]);
    }

    #[test]
    fn differing_defaults_are_not_merged() {
        let mut tool = tool_with(&[("A", "Port"), ("B", "")]);
        tool.tasks[1]
            .settings_class
            .properties
            .push(prop("Port").with_default(Some("8080".to_string())));

        lift_common_properties(&mut tool, &MergePolicy::default());
        assert!(tool.common_task_properties.is_empty());
    }

    #[test]
    fn same_name_different_property_stays_inline() {
        let mut tool = tool_with(&[("A", "Force"), ("B", "Force"), ("C", ""), ("D", "")]);
        for task in &mut tool.tasks[2..] {
            task.settings_class
                .properties
                .push(Property::new("Force", ValueType::Bool).with_format("--force"));
        }

        lift_common_properties(&mut tool, &MergePolicy::default());

        assert_eq!(tool.common_task_properties.len(), 1);
        assert_eq!(tool.common_task_properties[0].value_type, ValueType::String);
        assert_eq!(tool.task("C").unwrap().properties().len(), 1);
    }

    #[test]
    fn disabled_policy_is_a_no_op() {
        let mut tool = tool_with(&[("A", "X Y Z"), ("B", "X Y Z")]);
        let before = tool.clone();

        let outcome = lift_common_properties(&mut tool, &MergePolicy::disabled());

        assert_eq!(outcome, MergeOutcome::default());
        assert_eq!(tool, before);
    }

    #[test]
    fn set_names_get_suffixes_on_collision() {
        let mut tool = tool_with(&[
            ("A", "X Y Z Q X R S"),
            ("B", "X Y Z"),
            ("C", "X R S"),
        ]);

        lift_common_properties(&mut tool, &MergePolicy::default());

        let set_names: Vec<_> = tool
            .common_task_property_sets
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(set_names, ["XSet", "XSet2"]);
        assert_eq!(tool.task("A").unwrap().common_property_sets, ["XSet", "XSet2"]);
        assert_eq!(names(tool.task("A").unwrap().properties()), ["Q"]);
    }
}
