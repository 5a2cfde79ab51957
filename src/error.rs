use thiserror::Error;

/// Fatal errors at the host boundary. Everything past IR loading degrades
/// instead of failing.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("invalid component IR: {0}")]
    InvalidIr(#[source] serde_json::Error),
    #[error("invalid compile options: {0}")]
    InvalidOptions(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    #[error("style object could not be parsed: {0}")]
    Parse(String),
    #[error("style binding is not an object literal")]
    NotAnObject,
    #[error("style property `{0}` has a value that is not static")]
    DynamicValue(String),
    #[error("style object contains an unsupported key")]
    UnsupportedKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("frontmatter could not be parsed: {0}")]
    Parse(String),
    #[error("frontmatter fence is not closed")]
    UnclosedFence,
}
