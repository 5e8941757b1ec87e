use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or reporting a grammar.
///
/// The nullable solver and the epsilon-elimination engine never fail, so
/// everything here originates in the loader, the builder or the presenter.
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("Error opening file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Syntax error on line {line}: '{text}'")]
    Syntax { line: usize, text: String },

    #[error("Invalid symbol '{symbol}' on line {line}")]
    InvalidSymbol { line: usize, symbol: char },

    #[error("Invalid non-terminal: '{0}'")]
    InvalidNonTerminal(char),

    #[error("Invalid production: {0}")]
    InvalidProduction(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for grammar operations
pub type Result<T> = std::result::Result<T, GrammarError>;
