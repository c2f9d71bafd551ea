use thiserror::Error;

use common::error::Error as RouteError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    ConfigLoadError(String),

    #[error("Graph processing error: {0}")]
    GraphError(#[from] RouteError),
}
