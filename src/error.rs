use std::fmt;

/// Errors surfaced at the boundaries the embedding engine controls directly:
/// constructing a list and loading its configuration. In-loop caller misuse
/// (duplicate insert, stepping an invalid iterator) stays a fatal assertion
/// instead of a recoverable error, since it signals a bug in the caller
/// rather than bad input.
#[derive(Debug)]
pub enum IndexError {
    InvalidArgument(String),
    Config(String),
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            IndexError::Config(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for IndexError {}
