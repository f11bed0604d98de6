use crate::domain::severity::UnknownSeverity;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum FilterError {
    #[error("Regex compilation failed for {list} pattern '{pattern}': {source}")]
    InvalidPattern {
        list: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Regex pattern not found: {name}")]
    PatternNotFound { name: String },

    #[error("Invalid minimum severity: {0}")]
    InvalidSeverity(#[from] UnknownSeverity),
}
