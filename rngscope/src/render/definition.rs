use crate::{
    Position, Workspace,
    model::{Combine, Define},
};
use serde::Serialize;
use url::Url;

#[derive(Debug, Serialize)]
pub struct RenderedDefinition<'a> {
    name: &'a str,
    combine: Option<Combine>,
    url: Url,
    #[serde(flatten)]
    position: Position,
}

impl<'a> RenderedDefinition<'a> {
    pub fn new(workspace: &Workspace, define: &'a Define) -> Option<Self> {
        let file = workspace.file(define.id().file())?;

        Some(Self {
            name: define.name(),
            combine: define.combine(),
            url: file.url().clone(),
            position: file.position(define.span().start),
        })
    }

    pub const fn name(&self) -> &'a str {
        self.name
    }

    pub const fn url(&self) -> &Url {
        &self.url
    }

    pub const fn position(&self) -> Position {
        self.position
    }
}
