use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("embedding backend returned {status}: {detail}")]
    Backend { status: u16, detail: String },

    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("chat backend returned {status}: {detail}")]
    Backend { status: u16, detail: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid chunking parameters: {0}")]
    InvalidChunkParams(String),

    #[error("invalid input for '{origin}': {detail}")]
    InvalidInput { origin: String, detail: String },

    #[error("no usable fragments produced from '{0}'")]
    EmptyDocument(String),

    #[error("fragment alignment mismatch for '{origin}': {detail}")]
    Alignment { origin: String, detail: String },

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedError),

    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedError),

    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
