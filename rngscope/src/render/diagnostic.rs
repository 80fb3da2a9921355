use crate::{
    Position, Workspace,
    diagnostic::{Diagnostic, Severity},
};
use serde::Serialize;
use url::Url;

#[derive(Debug, Serialize)]
pub struct RenderedDiagnostic {
    url: Url,
    #[serde(flatten)]
    position: Position,
    severity: Severity,
    message: String,
}

impl RenderedDiagnostic {
    pub fn new(workspace: &Workspace, diagnostic: &Diagnostic) -> Option<Self> {
        let file = workspace.file(diagnostic.file())?;

        Some(Self {
            url: file.url().clone(),
            position: file.position(diagnostic.span().start),
            severity: diagnostic.severity(),
            message: diagnostic.kind().to_string(),
        })
    }

    pub const fn url(&self) -> &Url {
        &self.url
    }

    pub const fn position(&self) -> Position {
        self.position
    }

    pub const fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
