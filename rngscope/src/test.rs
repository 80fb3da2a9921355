use crate::{SchemaFile, Workspace};
use alloc::sync::Arc;
use url::Url;

pub fn url(name: &str) -> Url {
    Url::parse(&format!("file:///schema/{name}")).unwrap()
}

pub fn open(workspace: &Workspace, name: &str, text: &str) -> Arc<SchemaFile> {
    workspace.open(url(name), text.into()).unwrap()
}
