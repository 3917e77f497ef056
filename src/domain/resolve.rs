//! Back-reference wiring
//!
//! Runs once after the builder finished. Every assignment is unconditional,
//! so resolving an already resolved tool leaves it unchanged.

use super::tool::Tool;

/// Points every data class, task and settings class back at its owners
pub fn resolve_references(tool: &mut Tool) {
    let tool_name = tool.name.clone();

    for data_class in &mut tool.data_classes {
        data_class.tool = Some(tool_name.clone());
    }

    for task in &mut tool.tasks {
        task.tool = Some(tool_name.clone());
        task.settings_class.tool = Some(tool_name.clone());
        task.settings_class.task = Some(task.name.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DataClass, Property, SettingsClass, Task, ToolMetadata, ValueType};
    use proptest::prelude::*;

    fn sample_tool(task_names: &[String]) -> Tool {
        let mut tool = Tool::from_metadata(&ToolMetadata::new("Docker"));
        for name in task_names {
            tool.tasks.push(Task::new(
                name.clone(),
                SettingsClass::new(
                    SettingsClass::name_for("Docker", name),
                    vec![Property::new("Force", ValueType::Bool)],
                ),
            ));
        }
        tool.data_classes.push(DataClass::new("Mount", vec![]));
        tool
    }

    #[test]
    fn wires_every_back_reference() {
        let mut tool = sample_tool(&["Run".to_string(), "Build".to_string()]);
        resolve_references(&mut tool);

        assert!(tool.is_resolved());
        let run = tool.task("Run").unwrap();
        assert_eq!(run.tool.as_deref(), Some("Docker"));
        assert_eq!(run.settings_class.task.as_deref(), Some("Run"));
        assert_eq!(run.settings_class.tool.as_deref(), Some("Docker"));
        assert_eq!(tool.data_class("Mount").unwrap().tool.as_deref(), Some("Docker"));
    }

    proptest! {
        #[test]
        fn resolving_twice_equals_resolving_once(names in proptest::collection::hash_set("[A-Z][a-z]{1,8}", 0..12)) {
            let names: Vec<String> = names.into_iter().collect();
            let mut once = sample_tool(&names);
            resolve_references(&mut once);

            let mut twice = once.clone();
            resolve_references(&mut twice);

            prop_assert_eq!(once, twice);
        }
    }
}
