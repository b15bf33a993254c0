use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriadForgeError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Parsing Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Base effort config contains {found} values, but layouts are {expected} keys long")]
    BaseEffortCount { found: usize, expected: usize },

    #[error("Corpus Error: {0}")]
    Corpus(String),

    #[error("Layout Error: {0}")]
    Layout(String),

    #[error("Protocol Error: {0}")]
    Protocol(String),

    #[error("Transport Error: {0}")]
    Transport(String),
}

pub type TfResult<T> = Result<T, TriadForgeError>;
