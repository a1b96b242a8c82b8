use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use taskboard_core::tools::{Tool, ToolContext, ToolError, ToolOutput};
use taskboard_core::Action;
use taskboard_store::TaskRepo;

use super::required_str;

pub struct DeleteTaskTool {
    repo: TaskRepo,
}

impl DeleteTaskTool {
    pub fn new(repo: TaskRepo) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl Tool for DeleteTaskTool {
    fn name(&self) -> &str {
        "delete_task"
    }

    fn description(&self) -> &str {
        "Delete a task from the Kanban board by its title (case-insensitive partial match)"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "title": { "type": "string", "description": "Title or partial title of the task to delete" }
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
                warn!(request_id = %ctx.request_id, error = %e, "delete_task lookup failed");
                return Ok(ToolOutput::text(format!("Error deleting: {e}"), start.elapsed()));
            }
        };

        match self.repo.delete(&task.id) {
            Ok(()) => Ok(ToolOutput::text(
                format!("Task \"{}\" deleted", task.title),
                start.elapsed(),
            )
            .with_action(Action::TaskDeleted { id: task.id })),
            Err(e) => {
                warn!(request_id = %ctx.request_id, task_id = %task.id, error = %e, "delete_task failed");
                Ok(ToolOutput::text(format!("Error deleting: {e}"), start.elapsed()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{break_store, ctx, seed};
    use serde_json::json;
    use taskboard_core::Status;
    use taskboard_store::Database;

    #[tokio::test]
    async fn deletes_first_match_only() {
        let repo = crate::tools::test_support::repo();
        let first = seed(&repo, "Write report", Status::Todo, 0);
        let second = seed(&repo, "Report Q1", Status::InProgress, 0);
        let tool = DeleteTaskTool::new(repo.clone());

        let out = tool.execute(json!({"title": "report"}), &ctx()).await.unwrap();
        assert_eq!(out.content, "Task \"Write report\" deleted");
        assert_eq!(out.action, Some(Action::TaskDeleted { id: first.id.clone() }));

        assert!(repo.get(&first.id).unwrap_err().is_not_found());
        assert!(repo.get(&second.id).is_ok());
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn no_match_leaves_store_untouched() {
        let repo = crate::tools::test_support::repo();
        seed(&repo, "Write report", Status::Todo, 0);
        let tool = DeleteTaskTool::new(repo.clone());

        let out = tool.execute(json!({"title": "invoice"}), &ctx()).await.unwrap();
        assert_eq!(out.content, "No task found matching \"invoice\"");
        assert!(out.action.is_none());
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_title_is_invalid() {
        let tool = DeleteTaskTool::new(crate::tools::test_support::repo());
        assert!(tool.execute(json!({}), &ctx()).await.is_err());
    }

    #[tokio::test]
    async fn store_failure_becomes_result_text() {
        let db = Database::in_memory().unwrap();
        let tool = DeleteTaskTool::new(TaskRepo::new(db.clone()));
        break_store(&db);

        let out = tool.execute(json!({"title": "x"}), &ctx()).await.unwrap();
        assert!(out.content.starts_with("Error deleting:"), "{}", out.content);
        assert!(out.action.is_none());
    }
}
