//! Column ordering for drag-and-drop moves.
//!
//! Every function here is pure: a snapshot goes in, a new snapshot comes out.
//! Positions are only meaningful within a status column. After a settled move
//! the affected columns hold the positions `0..len` exactly once each.

use serde::{Deserialize, Serialize};

use crate::ids::TaskId;
use crate::task::{Status, Task};

/// A slot on the board: a column and a 0-based index within it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub status: Status,
    pub index: usize,
}

/// A single drag result. `destination` is `None` when the drag was cancelled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub task_id: TaskId,
    pub source: Location,
    pub destination: Option<Location>,
}

impl Move {
    /// Cancelled drags and drops back onto the starting slot change nothing.
    pub fn is_noop(&self) -> bool {
        match &self.destination {
            None => true,
            Some(dest) => *dest == self.source,
        }
    }
}

/// Tasks of one column sorted by position. Ties keep snapshot order.
pub fn column(snapshot: &[Task], status: Status) -> Vec<&Task> {
    let mut tasks: Vec<&Task> = snapshot.iter().filter(|t| t.status == status).collect();
    tasks.sort_by_key(|t| t.position);
    tasks
}

/// Position a task appended to `status` should take: one past the column's
/// highest position, so a gap left by a delete is never reused.
pub fn next_position(snapshot: &[Task], status: Status) -> u32 {
    snapshot
        .iter()
        .filter(|t| t.status == status)
        .map(|t| t.position + 1)
        .max()
        .unwrap_or(0)
}

/// True when the column's positions are exactly `0..len`.
pub fn is_contiguous(snapshot: &[Task], status: Status) -> bool {
    let mut positions: Vec<u32> = snapshot
        .iter()
        .filter(|t| t.status == status)
        .map(|t| t.position)
        .collect();
    positions.sort_unstable();
    positions.iter().enumerate().all(|(i, p)| *p as usize == i)
}

/// Apply a move and return the resulting snapshot.
///
/// The vector keeps its element order; only `status` and `position` change.
/// An unknown `task_id` returns the snapshot unchanged. The snapshot's own
/// status for the task wins over `mv.source.status`.
pub fn apply_move(snapshot: &[Task], mv: &Move) -> Vec<Task> {
    let mut next = snapshot.to_vec();
    let Some(dest) = mv.destination.filter(|_| !mv.is_noop()) else {
        return next;
    };
    let Some(moved) = snapshot.iter().position(|t| t.id == mv.task_id) else {
        return next;
    };
    let from = snapshot[moved].status;

    let mut dest_order = column_indices(snapshot, dest.status, moved);
    let at = dest.index.min(dest_order.len());
    dest_order.insert(at, moved);

    next[moved].status = dest.status;
    renumber(&mut next, &dest_order);

    if from != dest.status {
        let source_order = column_indices(snapshot, from, moved);
        renumber(&mut next, &source_order);
    }

    next
}

/// Tasks in `after` whose placement differs from `before`.
pub fn changed(before: &[Task], after: &[Task]) -> Vec<Task> {
    after
        .iter()
        .filter(|t| {
            before
                .iter()
                .find(|b| b.id == t.id)
                .map_or(true, |b| b.status != t.status || b.position != t.position)
        })
        .cloned()
        .collect()
}

/// Snapshot indices of a column in position order, leaving out `skip`.
fn column_indices(snapshot: &[Task], status: Status, skip: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = snapshot
        .iter()
        .enumerate()
        .filter(|(i, t)| *i != skip && t.status == status)
        .map(|(i, _)| i)
        .collect();
    indices.sort_by_key(|i| snapshot[*i].position);
    indices
}

fn renumber(tasks: &mut [Task], order: &[usize]) {
    for (position, idx) in order.iter().enumerate() {
        tasks[*idx].position = position as u32;
    }
}
