//! Direct board mutations: the operations the board UI performs without chat.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use taskboard_core::board::{self, Move};
use taskboard_core::{NewTask, Status, Task, TaskId, TaskPatch};
use taskboard_store::{StoreError, TaskRepo};

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("task not found: {0}")]
    NotFound(TaskId),

    #[error("invalid task: {0}")]
    Invalid(String),

    #[error("failed to save {failed} of {total} tasks")]
    SaveFailed { failed: usize, total: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Column placement for one task, as sent by a save-all.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub id: TaskId,
    pub status: Status,
    pub position: u32,
}

impl From<&Task> for Placement {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            status: task.status,
            position: task.position,
        }
    }
}

/// Snapshot after a move, plus the tasks whose placement changed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub tasks: Vec<Task>,
    pub changed: Vec<Task>,
}

#[derive(Clone)]
pub struct BoardService {
    repo: TaskRepo,
}

impl BoardService {
    pub fn new(repo: TaskRepo) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &TaskRepo {
        &self.repo
    }

    /// Every task ordered by position.
    pub fn load(&self) -> Result<Vec<Task>, BoardError> {
        Ok(self.repo.list(None)?)
    }

    /// Insert at the end of the target column.
    #[instrument(skip(self, new), fields(status = %new.status))]
    pub fn add_task(&self, new: NewTask) -> Result<Task, BoardError> {
        let mut new = new.normalized();
        if new.title.is_empty() {
            return Err(BoardError::Invalid("title is required".into()));
        }
        let snapshot = self.repo.list(Some(new.status))?;
        new.position = board::next_position(&snapshot, new.status);
        let task = self.repo.insert(&new)?;
        info!(task_id = %task.id, position = task.position, "task added");
        Ok(task)
    }

    #[instrument(skip(self), fields(task_id = %id))]
    pub fn delete_task(&self, id: &TaskId) -> Result<(), BoardError> {
        self.repo.delete(id).map_err(|e| match e {
            e if e.is_not_found() => BoardError::NotFound(id.clone()),
            e => BoardError::Store(e),
        })?;
        info!("task deleted");
        Ok(())
    }

    /// Apply a drag result to the stored board and persist what moved.
    #[instrument(skip(self, mv), fields(task_id = %mv.task_id))]
    pub async fn move_task(&self, mv: &Move) -> Result<MoveOutcome, BoardError> {
        let before = self.load()?;
        if !mv.is_noop() && !before.iter().any(|t| t.id == mv.task_id) {
            return Err(BoardError::NotFound(mv.task_id.clone()));
        }

        let after = board::apply_move(&before, mv);
        let changed = board::changed(&before, &after);
        if !changed.is_empty() {
            let placements: Vec<Placement> = changed.iter().map(Placement::from).collect();
            self.save_all(&placements).await?;
        }
        Ok(MoveOutcome {
            tasks: after,
            changed,
        })
    }

    /// Write each placement as its own update on the blocking pool.
    /// The updates are issued together but the single connection still
    /// applies them one at a time. Any failure is reported as one error
    /// with the failure count.
    #[instrument(skip(self, placements), fields(count = placements.len()))]
    pub async fn save_all(&self, placements: &[Placement]) -> Result<(), BoardError> {
        let updates = placements.iter().cloned().map(|p| {
            let repo = self.repo.clone();
            tokio::task::spawn_blocking(move || {
                repo.update(&p.id, &TaskPatch::placement(p.status, p.position))
            })
        });
        let results = join_all(updates).await;

        let mut failed = 0;
        for result in results {
            match result {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => {
                    warn!(error = %err, "placement update failed");
                    failed += 1;
                }
                Err(err) => {
                    warn!(error = %err, "placement update task aborted");
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            return Err(BoardError::SaveFailed {
                failed,
                total: placements.len(),
            });
        }
        Ok(())
    }
}
