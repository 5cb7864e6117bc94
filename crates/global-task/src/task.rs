//! The monitor task definition.

use serde::{Deserialize, Serialize};

/// Reserved label identifying the monitor task in the task list.
pub const GLOBAL_TASK_LABEL: &str = "codecarbon-emissions";

/// A shell task in the editor's `tasks.json` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub label: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub is_background: bool,
    pub command: String,
    pub presentation: Presentation,
    pub run_options: RunOptions,
    pub problem_matcher: ProblemMatcher,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    pub reveal: String,
    pub close: bool,
    pub panel: String,
    pub show_reuse_message: bool,
    pub echo: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOptions {
    pub run_on: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemMatcher {
    pub owner: String,
    pub pattern: MatcherPattern,
    pub background: MatcherBackground,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherPattern {
    pub regexp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatcherBackground {
    pub active_on_start: bool,
    pub begins_pattern: String,
    pub ends_pattern: String,
}

impl TaskDefinition {
    /// Silent background task running `<binary> monitor --no-api` on every
    /// folder open. The problem matcher only keeps the task marked active.
    pub fn monitor(binary: &str) -> Self {
        Self {
            label: GLOBAL_TASK_LABEL.to_string(),
            task_type: "shell".to_string(),
            is_background: true,
            command: format!("{} monitor --no-api", binary),
            presentation: Presentation {
                reveal: "silent".to_string(),
                close: true,
                panel: "dedicated".to_string(),
                show_reuse_message: false,
                echo: false,
            },
            run_options: RunOptions {
                run_on: "folderOpen".to_string(),
            },
            problem_matcher: ProblemMatcher {
                owner: "custom".to_string(),
                pattern: MatcherPattern {
                    regexp: "^(.*)$".to_string(),
                },
                background: MatcherBackground {
                    active_on_start: true,
                    begins_pattern: ".*".to_string(),
                    ends_pattern: ".*".to_string(),
                },
            },
        }
    }

    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Whether a raw task record carries `label`.
pub(crate) fn has_label(task: &serde_json::Value, label: &str) -> bool {
    task.get("label").and_then(|l| l.as_str()) == Some(label)
}
