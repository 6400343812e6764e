use thiserror::Error;

/// Why a single candidate block could not become a tool-call value.
///
/// Always recoverable: the block is dropped and the rest of the text is still evaluated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("block is empty after cleanup")]
    Empty,

    #[error("invalid JSON: {0}")]
    Json(String),

    #[error("invalid literal at offset {offset}: {message}")]
    Literal { offset: usize, message: String },

    #[error("block is not wrapped in single quotes")]
    NotQuoted,

    #[error("parsed value is a {0}, not a mapping")]
    NotAMapping(&'static str),
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::Json(err.to_string())
    }
}

/// Errors that stop evaluation before it begins, or that come from I/O around it.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Invalid tool specification: {0}")]
    InvalidToolSpec(String),

    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    #[error("Invalid tool-call tags: {0}")]
    InvalidTags(String),

    #[error("Unknown chat template: {0}")]
    UnknownChatTemplate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}
