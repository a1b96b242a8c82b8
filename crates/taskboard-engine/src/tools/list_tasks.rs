use std::time::Instant;

use async_trait::async_trait;
use tracing::warn;

use taskboard_core::tools::{Tool, ToolContext, ToolError, ToolOutput};
use taskboard_core::Task;
use taskboard_store::TaskRepo;

use super::{optional_status, status_schema};

pub struct ListTasksTool {
    repo: TaskRepo,
}

impl ListTasksTool {
    pub fn new(repo: TaskRepo) -> Self {
        Self { repo }
    }
}

/// `Found N tasks:` then one bullet per task.
pub fn format_summary(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks found".to_string();
    }
    let lines: Vec<String> = tasks
        .iter()
        .map(|t| format!("• [{}] {} ({} priority)", t.status, t.title, t.priority))
        .collect();
    format!("Found {} tasks:\n{}", tasks.len(), lines.join("\n"))
}

#[async_trait]
impl Tool for ListTasksTool {
    fn name(&self) -> &str {
        "list_tasks"
    }

    fn description(&self) -> &str {
        "List all current tasks on the board, optionally filtered by status"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "status": { "type": "string", "enum": status_schema(), "description": "Filter by status" }
            }
        })
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let status = optional_status(&args)?;

        match self.repo.list(status) {
            Ok(tasks) => Ok(ToolOutput::text(format_summary(&tasks), start.elapsed())),
            Err(e) => {
                warn!(request_id = %ctx.request_id, error = %e, "list_tasks failed");
                Ok(ToolOutput::text(format!("Error: {e}"), start.elapsed()))
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
    async fn lists_all_in_position_order() {
        let repo = crate::tools::test_support::repo();
        seed(&repo, "Second", Status::Todo, 1);
        seed(&repo, "First", Status::Todo, 0);
        let tool = ListTasksTool::new(repo);

        let out = tool.execute(json!({}), &ctx()).await.unwrap();
        assert_eq!(
            out.content,
            "Found 2 tasks:\n• [todo] First (medium priority)\n• [todo] Second (medium priority)"
        );
        assert!(out.action.is_none());
    }

    #[tokio::test]
    async fn status_filter() {
        let repo = crate::tools::test_support::repo();
        seed(&repo, "b", Status::Todo, 1);
        seed(&repo, "doing", Status::InProgress, 0);
        seed(&repo, "a", Status::Todo, 0);
        let tool = ListTasksTool::new(repo);

        let out = tool.execute(json!({"status": "todo"}), &ctx()).await.unwrap();
        assert!(out.content.starts_with("Found 2 tasks:"));
        assert!(!out.content.contains("doing"));
        let a = out.content.find("] a (").unwrap();
        let b = out.content.find("] b (").unwrap();
        assert!(a < b);
    }

    #[tokio::test]
    async fn empty_board() {
        let tool = ListTasksTool::new(crate::tools::test_support::repo());
        let out = tool.execute(json!({}), &ctx()).await.unwrap();
        assert_eq!(out.content, "No tasks found");
    }

    #[tokio::test]
    async fn store_failure_becomes_result_text() {
        let db = Database::in_memory().unwrap();
        let tool = ListTasksTool::new(TaskRepo::new(db.clone()));
        break_store(&db);
        let out = tool.execute(json!({}), &ctx()).await.unwrap();
        assert!(out.content.starts_with("Error: "), "{}", out.content);
    }
}
