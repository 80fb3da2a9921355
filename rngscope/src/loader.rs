use crate::{
    Error, Root, SchemaFile, Workspace,
    config::Config,
    model::{ExternalRef, Grammar, Include, Visitor, walk_grammar, walk_pattern},
};
use alloc::sync::Arc;
use async_recursion::async_recursion;
use core::ops::ControlFlow;
use futures::future::try_join_all;
use log::debug;
use scc::{HashMap, HashSet};
use std::{io, path::Path};
use tokio::{
    fs::{canonicalize, read_to_string},
    sync::OnceCell,
};
use url::Url;

const INITIAL_CAPACITY: usize = 1 << 6;

type FileCell = Arc<OnceCell<Option<Arc<SchemaFile>>>>;

/// A loader of schema files and files they reference.
///
/// Concurrent loads of the same file share a single read.
#[derive(Debug)]
pub struct Loader {
    workspace: Arc<Workspace>,
    config: Arc<Config>,
    files: HashMap<Url, FileCell>,
    expanded: HashSet<Url>,
}

impl Loader {
    /// Creates a loader.
    pub fn new(workspace: Arc<Workspace>, config: Arc<Config>) -> Self {
        Self {
            workspace,
            config,
            files: HashMap::with_capacity(INITIAL_CAPACITY),
            expanded: HashSet::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Loads a schema file and files it includes or references externally.
    ///
    /// Missing referenced files are skipped.
    pub async fn load(&self, path: &Path) -> Result<Arc<SchemaFile>, Error> {
        let path = canonicalize(path).await?;
        let url = Url::from_file_path(&path).map_err(|()| Error::InvalidPath(path.clone()))?;

        self.load_url(url, true)
            .await?
            .ok_or(Error::InvalidPath(path))
    }

    #[async_recursion]
    async fn load_url(&self, url: Url, root: bool) -> Result<Option<Arc<SchemaFile>>, Error> {
        let cell = self
            .files
            .entry_async(url.clone())
            .await
            .or_default()
            .get()
            .clone();
        let Some(file) = cell
            .get_or_try_init(|| self.open(&url, root))
            .await?
            .clone()
        else {
            return Ok(None);
        };

        // Only the first caller follows references so that include cycles end.
        if self.expanded.insert_async(url).await.is_err() {
            return Ok(Some(file));
        }

        try_join_all(
            references(&file)
                .into_iter()
                .filter(|href| {
                    let ignored = self.config.is_ignored(href);

                    if ignored {
                        debug!("ignoring {href} in {}", file.url());
                    }

                    !ignored
                })
                .filter_map(|href| file.reference_url(&href))
                .filter(|url| url.scheme() == "file")
                .map(|url| self.load_url(url, false)),
        )
        .await?;

        Ok(Some(file))
    }

    async fn open(&self, url: &Url, root: bool) -> Result<Option<Arc<SchemaFile>>, Error> {
        let Ok(path) = url.to_file_path() else {
            debug!("skipping non-file {url}");
            return Ok(None);
        };
        let text = match read_to_string(&path).await {
            Ok(text) => text,
            Err(error) if !root && error.kind() == io::ErrorKind::NotFound => {
                debug!("skipping missing {url}");
                return Ok(None);
            }
            Err(error) => return Err(error.into()),
        };

        debug!("loading {url}");
        Ok(Some(self.workspace.open(url.clone(), text)?))
    }
}

fn references(file: &SchemaFile) -> Vec<String> {
    struct Collector(Vec<String>);

    impl Visitor for Collector {
        type Break = ();

        fn visit_include(
            &mut self,
            include: &Include,
            _grammars: &[Arc<Grammar>],
        ) -> ControlFlow<Self::Break> {
            self.0.push(include.href().into());
            ControlFlow::Continue(())
        }

        fn visit_external_ref(&mut self, external: &ExternalRef) -> ControlFlow<Self::Break> {
            self.0.push(external.href().into());
            ControlFlow::Continue(())
        }
    }

    let mut collector = Collector(vec![]);

    let _ = match file.root() {
        Root::Grammar(grammar) => walk_grammar(&mut collector, grammar),
        Root::Pattern(pattern) => walk_pattern(&mut collector, pattern),
        Root::Empty => ControlFlow::Continue(()),
    };

    collector.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use regex::Regex;
    use tempfile::tempdir;
    use tokio::fs::{create_dir_all, write};

    fn names(workspace: &Workspace) -> Vec<String> {
        let mut names = workspace
            .files()
            .iter()
            .map(|file| file.name().to_owned())
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    #[tokio::test]
    async fn load_included_files() {
        let directory = tempdir().unwrap();
        let directory = directory.path();

        create_dir_all(directory.join("common")).await.unwrap();
        write(
            directory.join("main.rng"),
            indoc! {r#"
                <grammar xmlns="http://relaxng.org/ns/structure/1.0">
                  <include href="common/base.rnc"/>
                  <start><externalRef href="other.rng"/></start>
                </grammar>
            "#},
        )
        .await
        .unwrap();
        write(
            directory.join("common/base.rnc"),
            "include \"../main.rng\"\nbase = text",
        )
        .await
        .unwrap();
        write(
            directory.join("other.rng"),
            r#"<empty xmlns="http://relaxng.org/ns/structure/1.0"/>"#,
        )
        .await
        .unwrap();

        let workspace = Arc::new(Workspace::new());
        let loader = Loader::new(workspace.clone(), Config::new().into());

        let file = loader.load(&directory.join("main.rng")).await.unwrap();

        assert_eq!(file.name(), "main.rng");
        assert_eq!(names(&workspace), vec!["base.rnc", "main.rng", "other.rng"]);
    }

    #[tokio::test]
    async fn skip_missing_and_ignored_files() {
        let directory = tempdir().unwrap();
        let directory = directory.path();

        write(
            directory.join("main.rnc"),
            indoc! {r#"
                include "missing.rnc"
                include "vendor/ignored.rnc"
                include "http://example.com/remote.rnc"
                start = empty
            "#},
        )
        .await
        .unwrap();

        let workspace = Arc::new(Workspace::new());
        let loader = Loader::new(
            workspace.clone(),
            Config::new()
                .set_ignored_includes(vec![Regex::new("^vendor/").unwrap()])
                .into(),
        );

        loader.load(&directory.join("main.rnc")).await.unwrap();

        assert_eq!(names(&workspace), vec!["main.rnc"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn load_same_root_concurrently() {
        let directory = tempdir().unwrap();
        let directory = directory.path();
        let path = directory.join("main.rnc");

        write(&path, "include \"base.rnc\"\nstart = base")
            .await
            .unwrap();
        write(directory.join("base.rnc"), "include \"main.rnc\"\nbase = text")
            .await
            .unwrap();

        for _ in 0..50 {
            let workspace = Arc::new(Workspace::new());
            let loader = Loader::new(workspace.clone(), Config::new().into());

            let files = try_join_all([loader.load(&path), loader.load(&path)])
                .await
                .unwrap();

            assert_eq!(files[0].url(), files[1].url());
            assert_eq!(names(&workspace), vec!["base.rnc", "main.rnc"]);
        }
    }

    #[tokio::test]
    async fn fail_to_load_missing_root() {
        let directory = tempdir().unwrap();
        let loader = Loader::new(Workspace::new().into(), Config::new().into());

        assert!(matches!(
            loader.load(&directory.path().join("missing.rng")).await,
            Err(Error::Io(_))
        ));
    }
}
