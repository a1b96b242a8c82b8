use chrono::Utc;
use rusqlite::types::ToSql;
use tracing::{debug, instrument};

use taskboard_core::{NewTask, Status, Task, TaskId, TaskPatch};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

const COLUMNS: &str = "id, title, description, status, priority, category, due_date, \
                       time_estimate, position, created_at, updated_at";

/// Persistence for board tasks.
#[derive(Clone)]
pub struct TaskRepo {
    db: Database,
}

impl TaskRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All tasks ordered by position, optionally restricted to one column.
    #[instrument(skip(self))]
    pub fn list(&self, status: Option<Status>) -> Result<Vec<Task>, StoreError> {
        self.db.with_conn(|conn| {
            let mut results = Vec::new();
            match status {
                Some(s) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM tasks WHERE status = ?1
                         ORDER BY position ASC, created_at ASC, rowid ASC"
                    ))?;
                    let mut rows = stmt.query([s.as_str()])?;
                    while let Some(row) = rows.next()? {
                        results.push(row_to_task(row)?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM tasks
                         ORDER BY position ASC, created_at ASC, rowid ASC"
                    ))?;
                    let mut rows = stmt.query([])?;
                    while let Some(row) = rows.next()? {
                        results.push(row_to_task(row)?);
                    }
                }
            }
            Ok(results)
        })
    }

    #[instrument(skip(self), fields(task_id = %id))]
    pub fn get(&self, id: &TaskId) -> Result<Task, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM tasks WHERE id = ?1"))?;
            let mut rows = stmt.query([id.as_str()])?;
            match rows.next()? {
                Some(row) => row_to_task(row),
                None => Err(StoreError::NotFound(format!("task {id}"))),
            }
        })
    }

    /// Insert a task and return the stored row.
    #[instrument(skip(self, new), fields(title = %new.title, status = %new.status))]
    pub fn insert(&self, new: &NewTask) -> Result<Task, StoreError> {
        let new = new.clone().normalized();
        let id = TaskId::new();
        let now = Utc::now().to_rfc3339();
        let due_date = new.due_date.map(|d| d.format("%Y-%m-%d").to_string());

        self.db.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO tasks ({COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
                ),
                rusqlite::params![
                    id.as_str(),
                    new.title,
                    new.description,
                    new.status.as_str(),
                    new.priority.as_str(),
                    new.category.map(|c| c.as_str()),
                    due_date,
                    new.time_estimate,
                    new.position,
                    now,
                    now,
                ],
            )?;
            Ok(())
        })?;

        debug!(task_id = %id, "task inserted");
        Ok(Task {
            id,
            title: new.title,
            description: new.description,
            status: new.status,
            priority: new.priority,
            category: new.category,
            due_date: new.due_date,
            time_estimate: new.time_estimate,
            position: new.position,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Write the fields present in `patch`, bump `updated_at`, and return the
    /// refreshed row.
    #[instrument(skip(self, patch), fields(task_id = %id))]
    pub fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, StoreError> {
        let mut sets: Vec<&'static str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(title) = &patch.title {
            sets.push("title");
            values.push(Box::new(title.trim().to_string()));
        }
        if let Some(description) = &patch.description {
            sets.push("description");
            values.push(Box::new(description.clone()));
        }
        if let Some(status) = patch.status {
            sets.push("status");
            values.push(Box::new(status.as_str()));
        }
        if let Some(priority) = patch.priority {
            sets.push("priority");
            values.push(Box::new(priority.as_str()));
        }
        if let Some(category) = patch.category {
            sets.push("category");
            values.push(Box::new(category.as_str()));
        }
        if let Some(due_date) = patch.due_date {
            sets.push("due_date");
            values.push(Box::new(due_date.format("%Y-%m-%d").to_string()));
        }
        if let Some(estimate) = &patch.time_estimate {
            sets.push("time_estimate");
            values.push(Box::new(estimate.clone()));
        }
        if let Some(position) = patch.position {
            sets.push("position");
            values.push(Box::new(position));
        }
        sets.push("updated_at");
        values.push(Box::new(Utc::now().to_rfc3339()));

        let assignments = sets
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{col} = ?{}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE tasks SET {assignments} WHERE id = ?{}",
            values.len() + 1
        );
        values.push(Box::new(id.as_str().to_string()));

        let changed = self.db.with_conn(|conn| {
            let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
            Ok(conn.execute(&sql, params.as_slice())?)
        })?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("task {id}")));
        }
        self.get(id)
    }

    #[instrument(skip(self), fields(task_id = %id))]
    pub fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        let changed = self
            .db
            .with_conn(|conn| Ok(conn.execute("DELETE FROM tasks WHERE id = ?1", [id.as_str()])?))?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("task {id}")));
        }
        Ok(())
    }

    /// First task, in insertion order, whose title contains `fragment`
    /// ignoring case. Case folding is Unicode-aware, so it runs here rather
    /// than in SQLite's ASCII-only `LIKE`.
    #[instrument(skip(self))]
    pub fn search_title(&self, fragment: &str) -> Result<Option<Task>, StoreError> {
        let needle = fragment.to_lowercase();
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {COLUMNS} FROM tasks ORDER BY rowid ASC"))?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let title: String = row_helpers::get(row, 1, "tasks", "title")?;
                if title.to_lowercase().contains(&needle) {
                    return Ok(Some(row_to_task(row)?));
                }
            }
            Ok(None)
        })
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        self.db.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
            Ok(n as u64)
        })
    }
}

fn row_to_task(row: &rusqlite::Row<'_>) -> Result<Task, StoreError> {
    let status: String = row_helpers::get(row, 3, "tasks", "status")?;
    let priority: String = row_helpers::get(row, 4, "tasks", "priority")?;
    let category: Option<String> = row_helpers::get(row, 5, "tasks", "category")?;
    let position: i64 = row_helpers::get(row, 8, "tasks", "position")?;

    Ok(Task {
        id: TaskId::from_raw(row_helpers::get::<String>(row, 0, "tasks", "id")?),
        title: row_helpers::get(row, 1, "tasks", "title")?,
        description: row_helpers::get(row, 2, "tasks", "description")?,
        status: row_helpers::parse_enum(&status, "tasks", "status")?,
        priority: row_helpers::parse_enum(&priority, "tasks", "priority")?,
        category: category
            .map(|c| row_helpers::parse_enum(&c, "tasks", "category"))
            .transpose()?,
        due_date: row_helpers::parse_date(
            row_helpers::get(row, 6, "tasks", "due_date")?,
            "tasks",
            "due_date",
        )?,
        time_estimate: row_helpers::get(row, 7, "tasks", "time_estimate")?,
        position: u32::try_from(position).map_err(|_| StoreError::CorruptRow {
            table: "tasks",
            column: "position",
            detail: format!("out of range: {position}"),
        })?,
        created_at: row_helpers::get(row, 9, "tasks", "created_at")?,
        updated_at: row_helpers::get(row, 10, "tasks", "updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use taskboard_core::{Category, Priority};

    fn repo() -> TaskRepo {
        TaskRepo::new(Database::in_memory().unwrap())
    }

    fn add(repo: &TaskRepo, title: &str, status: Status, position: u32) -> Task {
        let mut new = NewTask::titled(title);
        new.status = status;
        new.position = position;
        repo.insert(&new).unwrap()
    }

    #[test]
    fn insert_with_defaults() {
        let repo = repo();
        let task = repo.insert(&NewTask::titled("Write report")).unwrap();
        assert!(task.id.as_str().starts_with("task_"));
        assert_eq!(task.status, Status::Todo);
        assert_eq!(task.priority, Priority::Medium);
        assert!(task.category.is_none());
        assert_eq!(task.position, 0);

        let stored = repo.get(&task.id).unwrap();
        assert_eq!(stored, task);
    }

    #[test]
    fn insert_all_fields_round_trips() {
        let repo = repo();
        let mut new = NewTask::titled("Launch campaign");
        new.description = Some("Q3 push".into());
        new.status = Status::InProgress;
        new.priority = Priority::High;
        new.category = Some(Category::Marketing);
        new.due_date = NaiveDate::from_ymd_opt(2026, 11, 2);
        new.time_estimate = Some("3 days".into());
        let task = repo.insert(&new).unwrap();

        let stored = repo.get(&task.id).unwrap();
        assert_eq!(stored.category, Some(Category::Marketing));
        assert_eq!(stored.due_date, NaiveDate::from_ymd_opt(2026, 11, 2));
        assert_eq!(stored.time_estimate.as_deref(), Some("3 days"));
        assert_eq!(stored.description.as_deref(), Some("Q3 push"));
    }

    #[test]
    fn blank_title_rejected() {
        let repo = repo();
        let err = repo.insert(&NewTask::titled("   ")).unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[test]
    fn get_missing_is_not_found() {
        let err = repo().get(&TaskId::from_raw("task_missing")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn list_orders_by_position() {
        let repo = repo();
        add(&repo, "c", Status::Todo, 2);
        add(&repo, "a", Status::Todo, 0);
        add(&repo, "b", Status::Todo, 1);
        let titles: Vec<_> = repo.list(None).unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, ["a", "b", "c"]);
    }

    #[test]
    fn list_with_status_filter() {
        let repo = repo();
        add(&repo, "todo 1", Status::Todo, 1);
        add(&repo, "doing", Status::InProgress, 0);
        add(&repo, "todo 0", Status::Todo, 0);
        let todo = repo.list(Some(Status::Todo)).unwrap();
        assert_eq!(todo.len(), 2);
        assert!(todo.iter().all(|t| t.status == Status::Todo));
        assert_eq!(todo[0].title, "todo 0");
    }

    #[test]
    fn update_touches_only_patched_fields() {
        let repo = repo();
        let mut new = NewTask::titled("Write report");
        new.description = Some("draft".into());
        let task = repo.insert(&new).unwrap();

        let patch = TaskPatch {
            status: Some(Status::Completed),
            ..TaskPatch::default()
        };
        let updated = repo.update(&task.id, &patch).unwrap();
        assert_eq!(updated.status, Status::Completed);
        assert_eq!(updated.title, "Write report");
        assert_eq!(updated.description.as_deref(), Some("draft"));
        assert_eq!(updated.priority, Priority::Medium);
        assert_eq!(updated.created_at, task.created_at);
    }

    #[test]
    fn update_can_clear_description() {
        let repo = repo();
        let mut new = NewTask::titled("Write report");
        new.description = Some("draft".into());
        let task = repo.insert(&new).unwrap();

        let patch = TaskPatch {
            description: Some(None),
            ..TaskPatch::default()
        };
        assert!(repo.update(&task.id, &patch).unwrap().description.is_none());
    }

    #[test]
    fn update_placement() {
        let repo = repo();
        let task = add(&repo, "Move me", Status::Todo, 0);
        let moved = repo
            .update(&task.id, &TaskPatch::placement(Status::InProgress, 3))
            .unwrap();
        assert_eq!(moved.status, Status::InProgress);
        assert_eq!(moved.position, 3);
    }

    #[test]
    fn update_missing_is_not_found() {
        let err = repo()
            .update(&TaskId::from_raw("task_missing"), &TaskPatch::placement(Status::Todo, 0))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn delete_removes_row() {
        let repo = repo();
        let task = add(&repo, "Gone soon", Status::Todo, 0);
        repo.delete(&task.id).unwrap();
        assert!(repo.get(&task.id).unwrap_err().is_not_found());
        assert!(repo.delete(&task.id).unwrap_err().is_not_found());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let repo = repo();
        add(&repo, "Write REPORT", Status::Todo, 0);
        let found = repo.search_title("report").unwrap().unwrap();
        assert_eq!(found.title, "Write REPORT");
        assert!(repo.search_title("invoice").unwrap().is_none());
    }

    #[test]
    fn search_folds_non_ascii_case() {
        let repo = repo();
        add(&repo, "Écrire le rapport", Status::Todo, 0);
        let found = repo.search_title("écrire").unwrap().unwrap();
        assert_eq!(found.title, "Écrire le rapport");
        assert!(repo.search_title("RAPPORT").unwrap().is_some());
    }

    #[test]
    fn search_returns_first_inserted_match() {
        let repo = repo();
        let first = add(&repo, "report draft", Status::Completed, 5);
        add(&repo, "report final", Status::Todo, 0);
        assert_eq!(repo.search_title("report").unwrap().unwrap().id, first.id);
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let repo = repo();
        add(&repo, "grow revenue", Status::Todo, 0);
        add(&repo, "grow 100% revenue", Status::Todo, 1);
        let found = repo.search_title("100%").unwrap().unwrap();
        assert_eq!(found.title, "grow 100% revenue");
        assert!(repo.search_title("_").unwrap().is_none());
    }

    #[test]
    fn corrupt_status_surfaces() {
        let repo = repo();
        let task = add(&repo, "ok", Status::Todo, 0);
        repo.db
            .with_conn(|conn| {
                conn.execute_batch("PRAGMA ignore_check_constraints = ON")?;
                conn.execute("UPDATE tasks SET status = 'doing' WHERE id = ?1", [task.id.as_str()])?;
                Ok(())
            })
            .unwrap();
        assert!(matches!(
            repo.get(&task.id),
            Err(StoreError::CorruptRow { column: "status", .. })
        ));
    }

    #[test]
    fn count_tasks() {
        let repo = repo();
        assert_eq!(repo.count().unwrap(), 0);
        add(&repo, "one", Status::Todo, 0);
        add(&repo, "two", Status::Completed, 0);
        assert_eq!(repo.count().unwrap(), 2);
    }
}
