/// Core error type for the relay bot.
///
/// Adapter crates map their specific errors into this type. Per-request
/// upstream failures never surface here; they are folded into a
/// `CompletionResult` by the relay core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
