use crate::config::ConfigError;
use core::{
    error,
    fmt::{self, Display, Formatter},
};
use std::{io, path::PathBuf};
use url::Url;

/// An error.
#[derive(Debug)]
pub enum Error {
    /// A traversal cancelled.
    Cancelled,
    /// A compact syntax parse error.
    CompactParse {
        /// A file URL.
        url: Url,
        /// A parse error.
        error: rngscope_rnc::ParseError,
    },
    /// A configuration error.
    Config(ConfigError),
    /// Diagnostics with errors.
    Diagnostics(usize),
    /// An invalid file path.
    InvalidPath(PathBuf),
    /// An I/O error.
    Io(io::Error),
    /// A JSON serialization error.
    Json(serde_json::Error),
    /// A file without a grammar.
    MissingGrammar(Url),
    /// An unknown schema syntax.
    UnknownSyntax(Url),
    /// An unresolved definition name.
    UnresolvedName(String),
    /// A URL parse error.
    UrlParse(url::ParseError),
    /// An XML syntax parse error.
    XmlParse {
        /// A file URL.
        url: Url,
        /// A parse error.
        error: roxmltree::Error,
    },
}

impl error::Error for Error {}

impl Display for Error {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(formatter, "cancelled"),
            Self::CompactParse { url, error } => write!(formatter, "{url}: {error}"),
            Self::Config(error) => write!(formatter, "{error}"),
            Self::Diagnostics(count) => write!(formatter, "{count} error(s) found"),
            Self::InvalidPath(path) => write!(formatter, "invalid path: {}", path.display()),
            Self::Io(error) => write!(formatter, "{error}"),
            Self::Json(error) => write!(formatter, "{error}"),
            Self::MissingGrammar(url) => write!(formatter, "no grammar in {url}"),
            Self::UnknownSyntax(url) => write!(formatter, "unknown schema syntax: {url}"),
            Self::UnresolvedName(name) => write!(formatter, "unresolved definition '{name}'"),
            Self::UrlParse(error) => write!(formatter, "{error}"),
            Self::XmlParse { url, error } => write!(formatter, "{url}: {error}"),
        }
    }
}

impl From<crate::Cancelled> for Error {
    fn from(_: crate::Cancelled) -> Self {
        Self::Cancelled
    }
}

impl From<ConfigError> for Error {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error)
    }
}

impl From<url::ParseError> for Error {
    fn from(error: url::ParseError) -> Self {
        Self::UrlParse(error)
    }
}
