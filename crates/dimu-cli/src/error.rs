use dimu::DimuError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Analysis(#[from] DimuError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
