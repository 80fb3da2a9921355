use super::Variants;
use crate::{FileId, Workspace};
use alloc::sync::Arc;
use url::Url;

// A file state read while computing cached variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum Dependency {
    File { id: FileId, version: u64 },
    Missing(Url),
}

impl Dependency {
    fn is_valid(&self, workspace: &Workspace) -> bool {
        match self {
            Self::File { id, version } => workspace
                .file(*id)
                .is_some_and(|file| file.version() == *version),
            Self::Missing(url) => workspace.file_by_url(url).is_none(),
        }
    }
}

#[derive(Debug)]
pub(super) struct CachedVariants {
    variants: Arc<Variants>,
    dependencies: Vec<Dependency>,
}

impl CachedVariants {
    pub const fn new(variants: Arc<Variants>, dependencies: Vec<Dependency>) -> Self {
        Self {
            variants,
            dependencies,
        }
    }

    pub const fn variants(&self) -> &Arc<Variants> {
        &self.variants
    }

    pub fn is_valid(&self, workspace: &Workspace) -> bool {
        self.dependencies
            .iter()
            .all(|dependency| dependency.is_valid(workspace))
    }
}
