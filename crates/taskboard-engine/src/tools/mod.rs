pub mod add_task;
pub mod delete_task;
pub mod list_tasks;
pub mod update_task;

use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;

use taskboard_core::tools::ToolError;
use taskboard_core::{Category, Priority, Status};
use taskboard_store::TaskRepo;

use crate::registry::ToolRegistry;

/// Registry holding the four board tools.
pub fn create_board_registry(repo: TaskRepo) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(add_task::AddTaskTool::new(repo.clone())));
    registry.register(Arc::new(delete_task::DeleteTaskTool::new(repo.clone())));
    registry.register(Arc::new(update_task::UpdateTaskTool::new(repo.clone())));
    registry.register(Arc::new(list_tasks::ListTasksTool::new(repo)));
    registry
}

fn status_schema() -> Value {
    serde_json::json!(Status::ALL.iter().map(Status::as_str).collect::<Vec<_>>())
}

fn priority_schema() -> Value {
    serde_json::json!(["low", "medium", "high"])
}

fn category_schema() -> Value {
    serde_json::json!(Category::ALL.iter().map(Category::as_str).collect::<Vec<_>>())
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("{key} is required")))
}

/// A non-empty string argument. Absent, null, and empty all read as unset.
fn optional_str<'a>(args: &'a Value, key: &str) -> Result<Option<&'a str>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(ToolError::InvalidArguments(format!(
            "{key} must be a string, got {other}"
        ))),
    }
}

fn optional_enum<T: FromStr<Err = String>>(args: &Value, key: &str) -> Result<Option<T>, ToolError> {
    optional_str(args, key)?
        .map(|raw| raw.parse::<T>().map_err(ToolError::InvalidArguments))
        .transpose()
}

fn optional_status(args: &Value) -> Result<Option<Status>, ToolError> {
    optional_enum(args, "status")
}

fn optional_priority(args: &Value) -> Result<Option<Priority>, ToolError> {
    optional_enum(args, "priority")
}

fn optional_category(args: &Value) -> Result<Option<Category>, ToolError> {
    optional_enum(args, "category")
}

fn optional_date(args: &Value, key: &str) -> Result<Option<NaiveDate>, ToolError> {
    optional_str(args, key)?
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                ToolError::InvalidArguments(format!("{key} must be YYYY-MM-DD, got {raw}"))
            })
        })
        .transpose()
}

#[cfg(test)]
pub(crate) mod test_support {
    use taskboard_core::tools::ToolContext;
    use taskboard_core::{NewTask, RequestId, Status, Task};
    use taskboard_store::{Database, TaskRepo};

    pub fn ctx() -> ToolContext {
        ToolContext::new(RequestId::new())
    }

    pub fn repo() -> TaskRepo {
        TaskRepo::new(Database::in_memory().unwrap())
    }

    pub fn seed(repo: &TaskRepo, title: &str, status: Status, position: u32) -> Task {
        let mut new = NewTask::titled(title);
        new.status = status;
        new.position = position;
        repo.insert(&new).unwrap()
    }

    /// Make every further store call fail.
    pub fn break_store(db: &Database) {
        db.with_conn(|conn| {
            conn.execute_batch("DROP TABLE tasks")?;
            Ok(())
        })
        .unwrap();
    }
}
