use core::{
    error::Error,
    fmt::{self, Display, Formatter},
};
use std::{io, path::PathBuf};

/// A configuration error.
#[derive(Debug)]
pub enum ConfigError {
    /// Circular configuration extensions.
    CircularConfigFiles(Vec<PathBuf>),
    /// An I/O error while reading configuration.
    Io(io::Error),
    /// An invalid pattern of ignored includes.
    IgnoredInclude {
        /// A pattern.
        pattern: String,
        /// An error.
        error: regex::Error,
    },
    /// A TOML deserialization error.
    TomlDeserialize(::toml::de::Error),
    /// An unknown schema syntax name.
    UnknownSyntax(String),
}

impl Display for ConfigError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::CircularConfigFiles(paths) => {
                let paths = paths
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect::<Vec<_>>()
                    .join(" -> ");
                write!(formatter, "circular configuration files: {paths}")
            }
            Self::IgnoredInclude { pattern, error } => {
                write!(formatter, "invalid ignored include pattern '{pattern}': {error}")
            }
            Self::Io(error) => write!(formatter, "{error}"),
            Self::TomlDeserialize(error) => write!(formatter, "{error}"),
            Self::UnknownSyntax(name) => write!(formatter, "unknown schema syntax: {name}"),
        }
    }
}

impl Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<::toml::de::Error> for ConfigError {
    fn from(error: ::toml::de::Error) -> Self {
        Self::TomlDeserialize(error)
    }
}
