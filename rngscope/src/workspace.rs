use crate::{Error, FileId, SchemaFile, Syntax, include_index::IncludeIndex};
use alloc::sync::Arc;
use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use log::debug;
use scc::{HashMap, hash_map::Entry};
use std::{collections, sync::Mutex};
use url::Url;

const INITIAL_CAPACITY: usize = 1 << 6;

/// A store of opened schema files.
///
/// Every opening of a file gets a fresh version so that results derived from
/// an older handle can be detected as stale.
#[derive(Debug)]
pub struct Workspace {
    files: HashMap<FileId, Arc<SchemaFile>>,
    urls: HashMap<Url, FileId>,
    syntaxes: collections::HashMap<String, Syntax>,
    next_id: AtomicU32,
    next_version: AtomicU64,
    generation: AtomicU64,
    include_index: Mutex<Option<(u64, Arc<IncludeIndex>)>>,
}

impl Workspace {
    /// Creates a workspace.
    pub fn new() -> Self {
        Self {
            files: HashMap::with_capacity(INITIAL_CAPACITY),
            urls: HashMap::with_capacity(INITIAL_CAPACITY),
            syntaxes: [("rnc".into(), Syntax::Compact), ("rng".into(), Syntax::Xml)]
                .into_iter()
                .collect(),
            next_id: Default::default(),
            next_version: Default::default(),
            generation: Default::default(),
            include_index: Default::default(),
        }
    }

    /// Sets syntaxes by file extensions on top of the default ones.
    pub fn set_syntaxes(mut self, syntaxes: impl IntoIterator<Item = (String, Syntax)>) -> Self {
        self.syntaxes.extend(syntaxes);
        self
    }

    /// Returns a syntax of a URL guessed from its file extension.
    pub fn syntax_of(&self, url: &Url) -> Option<Syntax> {
        let name = url.path_segments()?.next_back()?;
        let (_, extension) = name.rsplit_once('.')?;

        self.syntaxes
            .get(extension)
            .or_else(|| self.syntaxes.get(&extension.to_lowercase()))
            .copied()
    }

    /// Opens a file with a syntax guessed from its URL.
    pub fn open(&self, url: Url, text: String) -> Result<Arc<SchemaFile>, Error> {
        let Some(syntax) = self.syntax_of(&url) else {
            return Err(Error::UnknownSyntax(url));
        };

        self.open_with_syntax(url, syntax, text)
    }

    /// Opens a file.
    ///
    /// If the URL is already open, its identity is reused and a new version
    /// replaces the old one.
    pub fn open_with_syntax(
        &self,
        url: Url,
        syntax: Syntax,
        text: String,
    ) -> Result<Arc<SchemaFile>, Error> {
        let id = match self.urls.entry(url.clone()) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = FileId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
                entry.insert_entry(id);
                id
            }
        };
        let version = self.next_version.fetch_add(1, Ordering::Relaxed) + 1;
        let file = Arc::new(SchemaFile::parse(id, url, syntax, version, text)?);

        debug!("opened {} as {id} at version {version}", file.url());
        self.files.upsert(id, file.clone());
        self.generation.fetch_add(1, Ordering::Release);

        Ok(file)
    }

    /// Closes a file.
    pub fn close(&self, id: FileId) -> Option<Arc<SchemaFile>> {
        let (_, file) = self.files.remove(&id)?;

        self.urls.remove(file.url());
        self.generation.fetch_add(1, Ordering::Release);
        debug!("closed {}", file.url());

        Some(file)
    }

    /// Returns a current file.
    pub fn file(&self, id: FileId) -> Option<Arc<SchemaFile>> {
        self.files.read(&id, |_, file| file.clone())
    }

    /// Returns a current file at a URL.
    pub fn file_by_url(&self, url: &Url) -> Option<Arc<SchemaFile>> {
        self.file(self.urls.read(url, |_, id| *id)?)
    }

    /// Returns all current files in identity order.
    pub fn files(&self) -> Vec<Arc<SchemaFile>> {
        let mut files = vec![];

        self.files.scan(|_, file| files.push(file.clone()));
        files.sort_by_key(|file| file.id());

        files
    }

    /// Returns `true` if a file handle is the current one of its identity.
    pub fn is_current(&self, file: &Arc<SchemaFile>) -> bool {
        self.files
            .read(&file.id(), |_, current| Arc::ptr_eq(current, file))
            .unwrap_or_default()
    }

    /// Returns a file referenced from another file.
    pub fn include_target(&self, from: &SchemaFile, href: &str) -> Option<Arc<SchemaFile>> {
        self.file_by_url(&from.reference_url(href)?)
    }

    /// Returns a generation changed on every opening or closing of a file.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Returns an include index of the current files.
    pub fn include_index(&self) -> Arc<IncludeIndex> {
        let mut cache = self
            .include_index
            .lock()
            .unwrap_or_else(|error| error.into_inner());
        let generation = self.generation();

        if let Some((cached, index)) = &*cache
            && *cached == generation
        {
            return index.clone();
        }

        let index = Arc::new(IncludeIndex::new(self));
        *cache = Some((generation, index.clone()));

        index
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn url(path: &str) -> Url {
        Url::parse(&format!("file:///{path}")).unwrap()
    }

    #[test]
    fn open_file() {
        let workspace = Workspace::new();

        let file = workspace
            .open(url("a.rnc"), "start = empty".into())
            .unwrap();

        assert_eq!(file.syntax(), Syntax::Compact);
        assert!(Arc::ptr_eq(&workspace.file(file.id()).unwrap(), &file));
        assert!(Arc::ptr_eq(&workspace.file_by_url(&url("a.rnc")).unwrap(), &file));
    }

    #[test]
    fn fail_to_open_file_with_unknown_syntax() {
        assert!(matches!(
            Workspace::new().open(url("a.xsd"), "".into()),
            Err(Error::UnknownSyntax(_))
        ));
    }

    #[test]
    fn open_file_with_custom_syntax() {
        let workspace = Workspace::new().set_syntaxes([("xrng".into(), Syntax::Xml)]);

        assert_eq!(workspace.syntax_of(&url("a.xrng")), Some(Syntax::Xml));
        assert_eq!(workspace.syntax_of(&url("a.RNC")), Some(Syntax::Compact));
        assert_eq!(workspace.syntax_of(&url("a")), None);
    }

    #[test]
    fn reopen_file() {
        let workspace = Workspace::new();
        let old = workspace.open(url("a.rnc"), "start = empty".into()).unwrap();
        let generation = workspace.generation();

        let new = workspace.open(url("a.rnc"), "start = text".into()).unwrap();

        assert_eq!(new.id(), old.id());
        assert!(new.version() > old.version());
        assert!(workspace.generation() > generation);
        assert!(workspace.is_current(&new));
        assert!(!workspace.is_current(&old));
    }

    #[test]
    fn close_file() {
        let workspace = Workspace::new();
        let file = workspace.open(url("a.rnc"), "start = empty".into()).unwrap();

        assert!(workspace.close(file.id()).is_some());

        assert!(workspace.file(file.id()).is_none());
        assert!(workspace.file_by_url(&url("a.rnc")).is_none());
        assert!(!workspace.is_current(&file));
        assert!(workspace.close(file.id()).is_none());
    }

    #[test]
    fn list_files_in_order() {
        let workspace = Workspace::new();

        for name in ["c.rnc", "a.rnc", "b.rnc"] {
            workspace.open(url(name), "".into()).unwrap();
        }

        assert_eq!(
            workspace
                .files()
                .iter()
                .map(|file| file.name().to_owned())
                .collect::<Vec<_>>(),
            vec!["c.rnc", "a.rnc", "b.rnc"]
        );
    }

    #[test]
    fn resolve_include_target() {
        let workspace = Workspace::new();
        let target = workspace
            .open(url("common/a.rnc"), "start = empty".into())
            .unwrap();
        let file = workspace
            .open(url("main/b.rnc"), r#"include "../common/a.rnc""#.into())
            .unwrap();

        assert!(Arc::ptr_eq(
            &workspace.include_target(&file, "../common/a.rnc").unwrap(),
            &target
        ));
        assert!(workspace.include_target(&file, "missing.rnc").is_none());
    }

    #[test]
    fn cache_include_index() {
        let workspace = Workspace::new();
        workspace.open(url("a.rnc"), "".into()).unwrap();

        let index = workspace.include_index();

        assert!(Arc::ptr_eq(&workspace.include_index(), &index));

        workspace.open(url("b.rnc"), "".into()).unwrap();

        assert!(!Arc::ptr_eq(&workspace.include_index(), &index));
    }
}
