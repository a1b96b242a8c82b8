use std::time::Instant;

use async_trait::async_trait;
use tracing::warn;

use taskboard_core::tools::{Tool, ToolContext, ToolError, ToolOutput};
use taskboard_core::{Action, NewTask};
use taskboard_store::TaskRepo;

use super::{
    category_schema, optional_category, optional_date, optional_priority, optional_status,
    optional_str, priority_schema, required_str, status_schema,
};

pub struct AddTaskTool {
    repo: TaskRepo,
}

impl AddTaskTool {
    pub fn new(repo: TaskRepo) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl Tool for AddTaskTool {
    fn name(&self) -> &str {
        "add_task"
    }

    fn description(&self) -> &str {
        "Add a new task to the Kanban board"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "title": { "type": "string", "description": "Task title" },
                "description": { "type": "string", "description": "Task description" },
                "status": { "type": "string", "enum": status_schema(), "description": "Task status column" },
                "priority": { "type": "string", "enum": priority_schema(), "description": "Task priority" },
                "category": { "type": "string", "enum": category_schema(), "description": "Task category" },
                "due_date": { "type": "string", "description": "Due date in YYYY-MM-DD format" },
                "time_estimate": { "type": "string", "description": "Time estimate e.g. 2h, 1d" }
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

        let mut new = NewTask::titled(required_str(&args, "title")?);
        new.description = optional_str(&args, "description")?.map(str::to_string);
        if let Some(status) = optional_status(&args)? {
            new.status = status;
        }
        if let Some(priority) = optional_priority(&args)? {
            new.priority = priority;
        }
        new.category = optional_category(&args)?;
        new.due_date = optional_date(&args, "due_date")?;
        new.time_estimate = optional_str(&args, "time_estimate")?.map(str::to_string);
        // Chat-created tasks land at the head of their column.
        new.position = 0;

        match self.repo.insert(&new) {
            Ok(task) => Ok(ToolOutput::text(
                format!("Task \"{}\" added to {}", task.title, task.status),
                start.elapsed(),
            )
            .with_action(Action::TaskAdded { task })),
            Err(e) => {
                warn!(request_id = %ctx.request_id, error = %e, "add_task failed");
                Ok(ToolOutput::text(format!("Error adding task: {e}"), start.elapsed()))
            }
        }
    }
}
