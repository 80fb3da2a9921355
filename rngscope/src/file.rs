use crate::{
    error::Error,
    model::{Grammar, Pattern},
    syntax,
};
use alloc::sync::Arc;
use core::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};
use serde::{Deserialize, Serialize};
use url::Url;

/// An identity of an opened schema file.
///
/// Distinct files never share an identity even if their contents are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileId(u32);

impl FileId {
    /// Creates a file identity.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl Display for FileId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// A schema syntax.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    /// The compact syntax.
    Compact,
    /// The XML syntax.
    Xml,
}

impl FromStr for Syntax {
    type Err = String;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        match string {
            "compact" | "rnc" => Ok(Self::Compact),
            "xml" | "rng" => Ok(Self::Xml),
            _ => Err(string.into()),
        }
    }
}

/// A root of a schema file.
#[derive(Clone, Debug)]
pub enum Root {
    /// A grammar.
    Grammar(Arc<Grammar>),
    /// A bare pattern.
    Pattern(Pattern),
    /// Nothing recognized as a schema.
    Empty,
}

/// A line and column position in a source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Position {
    /// A line number starting from 1.
    pub line: usize,
    /// A column number in characters starting from 1.
    pub column: usize,
}

/// A parsed schema file.
#[derive(Debug)]
pub struct SchemaFile {
    id: FileId,
    url: Url,
    syntax: Syntax,
    version: u64,
    text: String,
    root: Root,
}

impl SchemaFile {
    /// Parses a schema file.
    pub fn parse(
        id: FileId,
        url: Url,
        syntax: Syntax,
        version: u64,
        text: String,
    ) -> Result<Self, Error> {
        let root = match syntax {
            Syntax::Compact => syntax::compact::parse(id, &text)
                .map_err(|error| Error::CompactParse {
                    url: url.clone(),
                    error,
                })?,
            Syntax::Xml => syntax::xml::parse(id, &text).map_err(|error| Error::XmlParse {
                url: url.clone(),
                error,
            })?,
        };

        Ok(Self {
            id,
            url,
            syntax,
            version,
            text,
            root,
        })
    }

    /// Returns an identity.
    pub const fn id(&self) -> FileId {
        self.id
    }

    /// Returns a URL.
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Returns a syntax.
    pub const fn syntax(&self) -> Syntax {
        self.syntax
    }

    /// Returns a version refreshed on every reopening.
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns a source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns a root.
    pub const fn root(&self) -> &Root {
        &self.root
    }

    /// Returns a short name for messages.
    pub fn name(&self) -> &str {
        self.url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .unwrap_or(self.url.as_str())
    }

    /// Resolves a reference relative to the file into a URL.
    pub fn reference_url(&self, href: &str) -> Option<Url> {
        self.url.join(href.trim()).ok()
    }

    /// Converts a byte offset into a position.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let prefix = self.text.get(..offset).unwrap_or_default();
        let line_start = prefix.rfind('\n').map_or(0, |index| index + 1);

        Position {
            line: prefix.matches('\n').count() + 1,
            column: prefix[line_start..].chars().count() + 1,
        }
    }
}
