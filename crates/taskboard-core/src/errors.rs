/// Errors from the completion service gateway.
///
/// `MissingCredential` is a configuration problem and is detected before any
/// request is sent. The status-derived variants come from a non-2xx response.
#[derive(Clone, Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{0} is not configured")]
    MissingCredential(String),

    #[error("rate limited")]
    RateLimited,
    #[error("quota exhausted")]
    QuotaExhausted,
    #[error("service error {status}: {body}")]
    ServiceError { status: u16, body: String },

    #[error("network error: {0}")]
    NetworkError(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => Self::RateLimited,
            402 => Self::QuotaExhausted,
            _ => Self::ServiceError { status, body },
        }
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::MissingCredential(_) => "missing_credential",
            Self::RateLimited => "rate_limited",
            Self::QuotaExhausted => "quota_exhausted",
            Self::ServiceError { .. } => "service_error",
            Self::NetworkError(_) => "network_error",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }

    /// HTTP status the chat endpoint answers with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::RateLimited => 429,
            Self::QuotaExhausted => 402,
            _ => 500,
        }
    }

    /// Message safe to show in the chat transcript.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential(_) => self.to_string(),
            Self::RateLimited => "Rate limit exceeded.".into(),
            Self::QuotaExhausted => "AI credits exhausted.".into(),
            Self::ServiceError { .. } | Self::NetworkError(_) | Self::MalformedResponse(_) => {
                "AI service error".into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_status_mapping() {
        assert!(matches!(GatewayError::from_status(429, String::new()), GatewayError::RateLimited));
        assert!(matches!(GatewayError::from_status(402, String::new()), GatewayError::QuotaExhausted));
        assert!(matches!(
            GatewayError::from_status(503, "down".into()),
            GatewayError::ServiceError { status: 503, .. }
        ));
        assert!(matches!(
            GatewayError::from_status(401, "bad key".into()),
            GatewayError::ServiceError { status: 401, .. }
        ));
    }

    #[test]
    fn http_status_per_kind() {
        assert_eq!(GatewayError::RateLimited.http_status(), 429);
        assert_eq!(GatewayError::QuotaExhausted.http_status(), 402);
        assert_eq!(GatewayError::ServiceError { status: 503, body: String::new() }.http_status(), 500);
        assert_eq!(GatewayError::MissingCredential("key".into()).http_status(), 500);
    }

    #[test]
    fn user_messages_hide_upstream_bodies() {
        let err = GatewayError::ServiceError { status: 500, body: "stack trace".into() };
        assert_eq!(err.user_message(), "AI service error");
        assert_eq!(GatewayError::RateLimited.user_message(), "Rate limit exceeded.");
        assert_eq!(GatewayError::QuotaExhausted.user_message(), "AI credits exhausted.");
        assert_eq!(
            GatewayError::MissingCredential("TASKBOARD_API_KEY".into()).user_message(),
            "TASKBOARD_API_KEY is not configured"
        );
    }

    #[test]
    fn error_kind_strings() {
        assert_eq!(GatewayError::RateLimited.error_kind(), "rate_limited");
        assert_eq!(GatewayError::NetworkError("tcp".into()).error_kind(), "network_error");
    }
}
