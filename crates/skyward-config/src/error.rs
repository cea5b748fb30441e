//! Configuration error types.

/// What can go wrong between `config.ron` on disk and a usable [`Config`].
///
/// [`Config`]: crate::Config
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("could not read config file: {0}")]
    ReadError(#[source] std::io::Error),

    /// The config directory or file could not be written.
    #[error("could not write config file: {0}")]
    WriteError(#[source] std::io::Error),

    /// The file's RON content did not deserialize into a [`Config`].
    ///
    /// [`Config`]: crate::Config
    #[error("config file is not valid: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// A [`Config`] value refused to serialize, which points at a bug
    /// rather than bad user input.
    ///
    /// [`Config`]: crate::Config
    #[error("could not serialize config: {0}")]
    SerializeError(#[source] ron::Error),
}
