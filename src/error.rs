use crate::data::Symbol;
use thiserror::Error;

/// Failure to obtain a price from the market-data endpoint.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network failure, timeout or an unreadable response body.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status code.
    #[error("endpoint returned HTTP {0}")]
    Status(u16),

    /// The body was not the expected ticker JSON.
    #[error("malformed ticker payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The ticker payload had no entry for the requested pair.
    #[error("pair {0} missing from ticker payload")]
    MissingPair(String),

    /// The `avg` field could not be read as a finite number.
    #[error("bad price for {symbol}: {raw:?}")]
    BadPrice { symbol: Symbol, raw: String },
}

impl FetchError {
    /// Whether another attempt could reasonably succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Status(code) => *code == 429 || (500..600).contains(code),
            FetchError::Decode(_) | FetchError::MissingPair(_) | FetchError::BadPrice { .. } => {
                false
            }
        }
    }
}

/// Failure of the raw keyboard input collaborator.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("keyboard is already held by another reader")]
    Busy,

    #[error("keyboard input failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("keyboard event stream closed")]
    Closed,
}

/// Failure to draw a frame.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("terminal write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a pipeline session ended abnormally.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("sampler stopped: {0}")]
    Fetch(#[from] FetchError),

    #[error("input stopped: {0}")]
    Input(#[from] InputError),

    #[error("renderer stopped: {0}")]
    Render(#[from] RenderError),

    #[error("sampler task panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config encoding: {0}")]
    Json(#[from] serde_json::Error),
}
