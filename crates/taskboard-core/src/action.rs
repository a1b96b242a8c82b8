use serde::{Deserialize, Serialize};

use crate::ids::TaskId;
use crate::task::Task;

/// Change notification emitted by the chat interpreter so the board can refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    TaskAdded { task: Task },
    TaskDeleted { id: TaskId },
    TaskUpdated { task: Task },
}

impl Action {
    pub fn task_id(&self) -> &TaskId {
        match self {
            Self::TaskAdded { task } | Self::TaskUpdated { task } => &task.id,
            Self::TaskDeleted { id } => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::TaskAdded { .. } => "task_added",
            Self::TaskDeleted { .. } => "task_deleted",
            Self::TaskUpdated { .. } => "task_updated",
        }
    }
}
