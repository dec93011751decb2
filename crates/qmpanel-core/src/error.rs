use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Desktop entry error: {0}")]
    DesktopEntry(String),

    #[error("Launch error: {0}")]
    Launch(String),
}

pub type Result<T> = std::result::Result<T, Error>;
