use super::error::ConfigError;
use crate::Syntax;
use alloc::collections::BTreeMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A serializable configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SerializableConfig {
    extend: Option<PathBuf>,
    roots: Option<Vec<PathBuf>>,
    backward_search: Option<bool>,
    ignored_includes: Option<Vec<String>>,
    syntax: Option<BTreeMap<String, String>>,
}

impl SerializableConfig {
    /// Returns a configuration file path to extend from.
    pub fn extend(&self) -> Option<&Path> {
        self.extend.as_deref()
    }

    /// Merges another configuration extending this one.
    ///
    /// The `extend` field of this configuration is kept.
    pub fn merge(&mut self, other: Self) {
        if other.roots.is_some() {
            self.roots = other.roots;
        }

        if other.backward_search.is_some() {
            self.backward_search = other.backward_search;
        }

        if other.ignored_includes.is_some() {
            self.ignored_includes = other.ignored_includes;
        }

        if let Some(other) = other.syntax {
            if let Some(syntax) = &mut self.syntax {
                syntax.extend(other);
            } else {
                self.syntax = Some(other);
            }
        }
    }

    /// Resolves relative root paths against a directory.
    pub(super) fn resolve_roots(&mut self, directory: &Path) {
        for root in self.roots.iter_mut().flatten() {
            if root.is_relative() {
                *root = directory.join(&*root);
            }
        }
    }
}

/// Compiles a configuration.
pub fn compile_config(config: SerializableConfig) -> Result<super::Config, ConfigError> {
    Ok(super::Config::new()
        .set_roots(config.roots.unwrap_or_default())
        .set_backward_search(config.backward_search.unwrap_or(true))
        .set_ignored_includes(
            config
                .ignored_includes
                .iter()
                .flatten()
                .map(|pattern| {
                    Regex::new(pattern).map_err(|error| ConfigError::IgnoredInclude {
                        pattern: pattern.clone(),
                        error,
                    })
                })
                .collect::<Result<_, _>>()?,
        )
        .set_syntaxes(
            config
                .syntax
                .into_iter()
                .flatten()
                .map(|(extension, name)| {
                    let syntax = name
                        .parse::<Syntax>()
                        .map_err(ConfigError::UnknownSyntax)?;

                    Ok((extension, syntax))
                })
                .collect::<Result<_, ConfigError>>()?,
        ))
}
