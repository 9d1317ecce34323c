use thiserror::Error;

/// Failure to read a field out of a remote event payload.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("missing field '{key}' (requested as '{name}')")]
    MissingField { name: String, key: String },

    #[error("field '{name}' has unexpected type, expected {expected}")]
    UnexpectedType { name: String, expected: &'static str },

    #[error("field '{name}' has unparsable timestamp '{value}'")]
    Timestamp { name: String, value: String },

    #[error("field '{name}' has unknown value '{value}'")]
    UnknownVariant { name: String, value: String },

    #[error("duplicate subgroup id {0}")]
    DuplicateSubgroup(u64),
}

/// Failure talking to one of the remote platforms.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("response from {url} could not be decoded: {message}")]
    Decode { url: String, message: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("tracked member file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("tracked member file {path}, line {line}: invalid rider id '{value}'")]
    InvalidId {
        path: String,
        line: usize,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat request failed: {0}")]
    Transport(String),

    #[error("chat request returned status {0}")]
    Status(u16),

    #[error("chat is not configured: {0}")]
    NotConfigured(&'static str),
}

/// Everything that can abort one scheduled firing or one on-demand render.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Render(#[from] crate::notify::RenderError),

    #[error("firing panicked: {0}")]
    Panicked(String),
}
