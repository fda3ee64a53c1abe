use std::io;

use crate::catalog::CatalogError;
use crate::view::EmptyCatalog;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] figment::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    EmptyCatalog(#[from] EmptyCatalog),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_not_labelled_as_terminal_errors() {
        let err = AppError::from(io::Error::new(io::ErrorKind::NotFound, "no such device"));
        assert_eq!(err.to_string(), "io error: no such device");
    }
}
