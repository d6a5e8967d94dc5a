use core::num::ParseIntError;

/// Error returned when reading a property whose accessor throws.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("reading property `{key}` threw: {message}")]
pub struct PropertyAccessError {
    /// The property that was read.
    pub key: String,
    /// The message thrown by the accessor.
    pub message: String,
}

/// Error returned when an environment setting cannot be understood.
///
/// These errors never abort setup: they are logged and the default value is
/// used instead.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A handler name other than `onerror`, `onunhandledrejection` or `none`.
    #[error("unknown global handler `{0}`")]
    UnknownHandler(String),
    /// A maximum value length that is not a non-negative integer.
    #[error("invalid max value length `{value}`")]
    InvalidMaxValueLength {
        /// The rejected value.
        value: String,
        /// The parse failure.
        #[source]
        source: ParseIntError,
    },
}
