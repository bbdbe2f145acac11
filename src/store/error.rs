use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store encoding error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
