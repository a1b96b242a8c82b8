pub mod board;
pub mod error;
pub mod interpreter;
pub mod registry;
pub mod tools;

pub use board::{BoardError, BoardService, MoveOutcome, Placement};
pub use error::EngineError;
pub use interpreter::{ChatReply, CommandInterpreter, InterpreterConfig};
pub use registry::ToolRegistry;
pub use tools::create_board_registry;
