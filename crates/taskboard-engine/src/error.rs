use taskboard_core::errors::GatewayError;
use taskboard_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// The gateway failure behind this error, if any.
    pub fn as_gateway(&self) -> Option<&GatewayError> {
        match self {
            Self::Gateway(e) => Some(e),
            Self::Store(_) => None,
        }
    }
}
