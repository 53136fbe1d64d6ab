use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No element to place the caret in")]
    NoElement,

    #[error("DOM error: {0}")]
    Dom(String),

    #[error("Markup error: {0}")]
    Markup(String),
}

pub type Result<T> = std::result::Result<T, Error>;
