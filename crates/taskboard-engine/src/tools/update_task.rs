use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use taskboard_core::tools::{Tool, ToolContext, ToolError, ToolOutput};
use taskboard_core::{Action, TaskPatch};
use taskboard_store::TaskRepo;

use super::{
    category_schema, optional_category, optional_date, optional_priority, optional_status,
    optional_str, priority_schema, required_str, status_schema,
};

pub struct UpdateTaskTool {
    repo: TaskRepo,
}

impl UpdateTaskTool {
    pub fn new(repo: TaskRepo) -> Self {
        Self { repo }
    }
}

/// Only keys present in `args` end up in the patch.
fn patch_from_args(args: &Value) -> Result<TaskPatch, ToolError> {
    let description = match args.get("description") {
        None => None,
        Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(s.clone())),
        Some(other) => {
            return Err(ToolError::InvalidArguments(format!(
                "description must be a string, got {other}"
            )))
        }
    };

    Ok(TaskPatch {
        title: optional_str(args, "new_title")?.map(|s| s.trim().to_string()),
        description,
        status: optional_status(args)?,
        priority: optional_priority(args)?,
        category: optional_category(args)?,
        due_date: optional_date(args, "due_date")?,
        time_estimate: optional_str(args, "time_estimate")?.map(str::to_string),
        position: None,
    })
}

#[async_trait]
impl Tool for UpdateTaskTool {
    fn name(&self) -> &str {
        "update_task"
    }

    fn description(&self) -> &str {
        "Update an existing task's fields (find by title, update any fields)"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "title": { "type": "string", "description": "Title or partial title of the task to find" },
                "new_title": { "type": "string", "description": "New title" },
                "description": { "type": "string", "description": "New description" },
                "status": { "type": "string", "enum": status_schema() },
                "priority": { "type": "string", "enum": priority_schema() },
                "category": { "type": "string", "enum": category_schema() },
                "due_date": { "type": "string", "description": "New due date YYYY-MM-DD" },
                "time_estimate": { "type": "string" }
            },
            "required": ["title"]
        })
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let fragment = required_str(&args, "title")?;
        let patch = patch_from_args(&args)?;

        let task = match self.repo.search_title(fragment) {
            Ok(Some(task)) => task,
            Ok(None) => {
                debug!(fragment, "no task matched");
                return Ok(ToolOutput::text(
                    format!("No task found matching \"{fragment}\""),
                    start.elapsed(),
                ));
            }
            Err(e) => {
                warn!(request_id = %ctx.request_id, error = %e, "update_task lookup failed");
                return Ok(ToolOutput::text(format!("Error updating: {e}"), start.elapsed()));
            }
        };

        match self.repo.update(&task.id, &patch) {
            Ok(updated) => Ok(ToolOutput::text(
                format!("Task \"{}\" updated", updated.title),
                start.elapsed(),
            )
            .with_action(Action::TaskUpdated { task: updated })),
            Err(e) => {
                warn!(request_id = %ctx.request_id, task_id = %task.id, error = %e, "update_task failed");
                Ok(ToolOutput::text(format!("Error updating: {e}"), start.elapsed()))
            }
        }
    }
}
