use thiserror::Error;

// Errors raised by registry plugins and the CLI. The wrapper itself never
// produces one of these: plugin errors travel through it as their own type.
#[derive(Debug, Error, PartialEq)]
pub enum PluginError {
    // No plugin registered under this name
    #[error("unknown plugin: {0}")]
    UnknownPlugin(String),

    // A built-in got a receiver or argument of the wrong JSON shape
    #[error("{plugin}: expected {expected}")]
    Type {
        plugin: &'static str,
        expected: &'static str,
    },

    // Any other failure inside a built-in
    #[error("runtime error: {0}")]
    Runtime(String),

    // Input that is not valid JSON
    #[error("parse error: {0}")]
    Parse(String),
}

impl PluginError {
    pub(crate) fn type_error(plugin: &'static str, expected: &'static str) -> Self {
        PluginError::Type { plugin, expected }
    }
}

// Type alias for results that use `PluginError` as the error type
pub type Result<T> = std::result::Result<T, PluginError>;
