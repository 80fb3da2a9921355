use crate::{FileId, model::{NodeId, Span}};
use core::fmt::{self, Display, Formatter};
use serde::Serialize;

/// A diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// An error.
    Error,
    /// An information.
    Info,
}

impl Display for Severity {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(formatter, "error"),
            Self::Info => write!(formatter, "info"),
        }
    }
}

/// A diagnostic kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A reference to a name defined nowhere.
    UnresolvedReference {
        /// A name.
        name: String,
    },
    /// An override of a name not defined in an included grammar.
    OverrideMismatch {
        /// A name.
        name: String,
        /// A name of an included file.
        file: String,
    },
    /// An override of definitions in an included grammar.
    Overrides {
        /// A name.
        name: String,
        /// A name of an included file.
        file: String,
        /// Overridden definitions.
        targets: Vec<NodeId>,
    },
    /// A definition overridden by including files.
    OverriddenBy {
        /// A name.
        name: String,
        /// A name of an including file.
        file: String,
        /// Overriding definitions.
        overriders: Vec<NodeId>,
    },
    /// An include of a file not found.
    UnresolvedInclude {
        /// A target reference.
        href: String,
    },
    /// An external reference to a file not found.
    UnresolvedExternalRef {
        /// A target reference.
        href: String,
    },
}

impl DiagnosticKind {
    /// Returns a severity.
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Overrides { .. } | Self::OverriddenBy { .. } => Severity::Info,
            Self::UnresolvedReference { .. }
            | Self::OverrideMismatch { .. }
            | Self::UnresolvedInclude { .. }
            | Self::UnresolvedExternalRef { .. } => Severity::Error,
        }
    }
}

impl Display for DiagnosticKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedReference { name } => {
                write!(formatter, "unresolved pattern reference '{name}'")
            }
            Self::OverrideMismatch { file, .. } => {
                write!(formatter, "definition doesn't override anything from {file}")
            }
            Self::Overrides { name, file, .. } => write!(formatter, "overrides '{name}' in {file}"),
            Self::OverriddenBy { name, file, .. } => {
                write!(formatter, "'{name}' is overridden in {file}")
            }
            Self::UnresolvedInclude { href } => write!(formatter, "cannot resolve include '{href}'"),
            Self::UnresolvedExternalRef { href } => {
                write!(formatter, "cannot resolve external reference '{href}'")
            }
        }
    }
}

/// A diagnostic attached to a range in a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    file: FileId,
    span: Span,
    kind: DiagnosticKind,
}

impl Diagnostic {
    /// Creates a diagnostic.
    pub const fn new(file: FileId, span: Span, kind: DiagnosticKind) -> Self {
        Self { file, span, kind }
    }

    /// Returns a file.
    pub const fn file(&self) -> FileId {
        self.file
    }

    /// Returns a span.
    pub const fn span(&self) -> Span {
        self.span
    }

    /// Returns a kind.
    pub const fn kind(&self) -> &DiagnosticKind {
        &self.kind
    }

    /// Returns a severity.
    pub const fn severity(&self) -> Severity {
        self.kind.severity()
    }
}
