use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::TaskId;

/// Board column a task lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Todo,
    InProgress,
    Completed,
}

impl Status {
    /// Columns in display order.
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// Fixed label set for tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Design,
    Development,
    Marketing,
    Research,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Design,
        Category::Development,
        Category::Marketing,
        Category::Research,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Design => "Design",
            Self::Development => "Development",
            Self::Marketing => "Marketing",
            Self::Research => "Research",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

/// A unit of work on the board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub category: Option<Category>,
    pub due_date: Option<NaiveDate>,
    pub time_estimate: Option<String>,
    /// Order within the task's status column only.
    pub position: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// Insert payload. Unsupplied fields take the board defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_status")]
    pub status: Status,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub time_estimate: Option<String>,
    #[serde(default)]
    pub position: u32,
}

fn default_status() -> Status {
    Status::Todo
}

fn default_priority() -> Priority {
    Priority::Medium
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: default_status(),
            priority: default_priority(),
            category: None,
            due_date: None,
            time_estimate: None,
            position: 0,
        }
    }

    /// Blank optional text fields are stored as null.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = non_blank(self.description);
        self.time_estimate = non_blank(self.time_estimate);
        self
    }
}

/// Partial update. `None` leaves the column untouched.
///
/// `description` is doubly optional so a caller can clear it:
/// `Some(None)` writes null, `None` keeps the stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub due_date: Option<NaiveDate>,
    pub time_estimate: Option<String>,
    pub position: Option<u32>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Patch that moves a task to `status` at `position`.
    pub fn placement(status: Status, position: u32) -> Self {
        Self {
            status: Some(status),
            position: Some(position),
            ..Self::default()
        }
    }

    /// Apply the patch to an in-memory task, mirroring what the store does.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = self.category {
            task.category = Some(category);
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(estimate) = &self.time_estimate {
            task.time_estimate = Some(estimate.clone());
        }
        if let Some(position) = self.position {
            task.position = position;
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Task {
        Task {
            id: TaskId::from_raw("task_1"),
            title: "Write report".into(),
            description: Some("quarterly".into()),
            status: Status::Todo,
            priority: Priority::Medium,
            category: None,
            due_date: None,
            time_estimate: None,
            position: 0,
            created_at: "2026-01-01T00:00:00+00:00".into(),
            updated_at: "2026-01-01T00:00:00+00:00".into(),
        }
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_string(&Status::InProgress).unwrap(), r#""in_progress""#);
        assert_eq!("completed".parse::<Status>().unwrap(), Status::Completed);
        assert!("done".parse::<Status>().is_err());
    }

    #[test]
    fn category_is_capitalized_on_the_wire() {
        assert_eq!(serde_json::to_string(&Category::Research).unwrap(), r#""Research""#);
        assert_eq!("Marketing".parse::<Category>().unwrap(), Category::Marketing);
        assert!("marketing".parse::<Category>().is_err());
    }

    #[test]
    fn new_task_defaults_from_json() {
        let task: NewTask = serde_json::from_str(r#"{"title":"Write report"}"#).unwrap();
        assert_eq!(task, NewTask::titled("Write report"));
        assert_eq!(task.status, Status::Todo);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.position, 0);
    }

    #[test]
    fn normalized_drops_blank_text() {
        let mut task = NewTask::titled("  Plan sprint ");
        task.description = Some("   ".into());
        task.time_estimate = Some("".into());
        let task = task.normalized();
        assert_eq!(task.title, "Plan sprint");
        assert!(task.description.is_none());
        assert!(task.time_estimate.is_none());
    }

    #[test]
    fn patch_touches_only_present_fields() {
        let mut task = sample();
        let patch = TaskPatch {
            status: Some(Status::Completed),
            ..TaskPatch::default()
        };
        patch.apply_to(&mut task);
        assert_eq!(task.status, Status::Completed);
        assert_eq!(task.title, "Write report");
        assert_eq!(task.description.as_deref(), Some("quarterly"));
        assert_eq!(task.priority, Priority::Medium);
    }

    #[test]
    fn patch_can_clear_description() {
        let mut task = sample();
        let patch = TaskPatch {
            description: Some(None),
            ..TaskPatch::default()
        };
        patch.apply_to(&mut task);
        assert!(task.description.is_none());
    }

    #[test]
    fn empty_patch() {
        assert!(TaskPatch::default().is_empty());
        assert!(!TaskPatch::placement(Status::Todo, 0).is_empty());
    }
}
