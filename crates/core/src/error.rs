use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to parse location: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Location has an empty country")]
    EmptyCountry,
}

pub type Result<T> = std::result::Result<T, CoreError>;
