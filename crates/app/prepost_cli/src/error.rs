use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    #[error("IO::{:?}: {}", .0, .0)]
    Io(#[from] std::io::Error),

    #[error("Json: {}", .0)]
    Json(#[from] serde_json::Error),

    #[error("{}", .0)]
    Document(#[from] prepost_core::documents::DocumentError),

    #[error("{}", .0)]
    Compare(#[from] prepost_core::compare::CompareError),

    #[error("FlexiLogger::{:?}: {}", .0, .0)]
    FlexiLogger(#[from] flexi_logger::FlexiLoggerError),
}
