pub mod handlers;
pub mod server;

pub use handlers::ApiError;
pub use server::{build_router, start, AppState, ServerConfig, ServerHandle};
