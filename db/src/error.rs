use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage engine error: {0}")]
    Engine(String),

    #[error("operation attempted after close")]
    Closed,
}

impl From<sled::Error> for DbError {
    fn from(err: sled::Error) -> Self {
        match err {
            sled::Error::Io(io_err) => DbError::Io(io_err),
            other => DbError::Engine(other.to_string()),
        }
    }
}
