use thiserror::Error;

#[derive(Error, Debug)]
pub enum NordPoolError {
    #[error("DocumentError: {0}")]
    DocumentError(String),
    #[error("NetworkError: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("StatusError: {0}")]
    StatusError(u16),
    #[error("NoTableError")]
    NoTableError,
}
