pub mod action;
pub mod board;
pub mod errors;
pub mod ids;
pub mod messages;
pub mod provider;
pub mod task;
pub mod tools;

pub use action::Action;
pub use ids::{RequestId, TaskId, ToolCallId};
pub use task::{Category, NewTask, Priority, Status, Task, TaskPatch};
