/// Model used when settings name none.
pub const DEFAULT_MODEL: &str = "google/gemini-3-flash-preview";

/// OpenAI-compatible gateway the board talks to by default.
pub const DEFAULT_BASE_URL: &str = "https://ai.gateway.lovable.dev/v1";

/// Name used in the missing-credential error.
pub const CREDENTIAL_NAME: &str = "completion API key";

/// `<base_url>/chat/completions`, tolerating a trailing slash.
pub fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}
