mod error;
mod serde;
mod toml;

pub use self::{
    error::ConfigError,
    serde::{SerializableConfig, compile_config},
    toml::read_config,
};
use crate::Syntax;
use regex::Regex;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// A configuration.
#[derive(Clone, Debug)]
pub struct Config {
    roots: Vec<PathBuf>,
    backward_search: bool,
    ignored_includes: Vec<Regex>,
    syntaxes: HashMap<String, Syntax>,
}

impl Config {
    /// Creates a configuration.
    pub fn new() -> Self {
        Self {
            roots: vec![],
            backward_search: true,
            ignored_includes: vec![],
            syntaxes: Default::default(),
        }
    }

    /// Returns root schema files.
    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PathBuf::as_path)
    }

    /// Returns `true` if unresolved names are searched in including files.
    pub const fn backward_search(&self) -> bool {
        self.backward_search
    }

    /// Returns patterns of include references not to be loaded.
    pub fn ignored_includes(&self) -> impl Iterator<Item = &Regex> {
        self.ignored_includes.iter()
    }

    /// Returns `true` if an include reference is ignored.
    pub fn is_ignored(&self, href: &str) -> bool {
        self.ignored_includes
            .iter()
            .any(|pattern| pattern.is_match(href))
    }

    /// Returns syntaxes by file extensions.
    pub const fn syntaxes(&self) -> &HashMap<String, Syntax> {
        &self.syntaxes
    }

    /// Sets root schema files.
    pub fn set_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.roots = roots;
        self
    }

    /// Sets whether unresolved names are searched in including files.
    pub const fn set_backward_search(mut self, enabled: bool) -> Self {
        self.backward_search = enabled;
        self
    }

    /// Sets patterns of include references not to be loaded.
    pub fn set_ignored_includes(mut self, patterns: Vec<Regex>) -> Self {
        self.ignored_includes = patterns;
        self
    }

    /// Sets syntaxes by file extensions.
    pub fn set_syntaxes(mut self, syntaxes: HashMap<String, Syntax>) -> Self {
        self.syntaxes = syntaxes;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_ignored_includes() {
        let config = Config::new().set_ignored_includes(vec![Regex::new("^https?:").unwrap()]);

        assert!(config.is_ignored("https://example.com/a.rng"));
        assert!(!config.is_ignored("a.rng"));
    }

    #[test]
    fn enable_backward_search_by_default() {
        assert!(Config::default().backward_search());
        assert!(!Config::default().set_backward_search(false).backward_search());
    }
}
