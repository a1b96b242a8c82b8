pub mod converter;
pub mod models;
pub mod provider;
pub mod sse;

pub mod mock;

pub use mock::MockProvider;
pub use provider::{ChatCompletionsProvider, ProviderConfig};
pub use sse::StreamAssembler;
