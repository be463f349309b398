use thiserror::Error;

/// Failure of a collaborator call (exchange, news feed, social feed)
///
/// Callers inside the bot tasks degrade these to a safe default and log them;
/// they never cross a task boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("response is missing field `{0}`")]
    MissingField(&'static str),

    #[error("could not parse `{field}` from {value:?}")]
    Parse { field: &'static str, value: String },
}

impl ServiceError {
    pub(crate) fn parse(field: &'static str, value: impl Into<String>) -> Self {
        Self::Parse {
            field,
            value: value.into(),
        }
    }
}

/// Startup configuration failure; the bot must not enter its loop
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required setting `{0}` is missing or empty")]
    Missing(&'static str),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}
