use crate::{
    FileId, Root, SchemaFile, Workspace,
    model::{Grammar, Include, Visitor, walk_grammar, walk_pattern},
};
use alloc::sync::Arc;
use core::ops::ControlFlow;
use log::trace;
use petgraph::{
    graphmap::DiGraphMap,
    visit::{Dfs, Reversed},
};

/// An index of include relations between files.
///
/// An edge points from an including file to an included one.
#[derive(Debug, Default)]
pub struct IncludeIndex {
    graph: DiGraphMap<FileId, ()>,
}

impl IncludeIndex {
    /// Builds an index of the current files in a workspace.
    pub fn new(workspace: &Workspace) -> Self {
        let mut graph = DiGraphMap::new();

        for file in workspace.files() {
            graph.add_node(file.id());

            for href in include_hrefs(&file) {
                if let Some(target) = workspace.include_target(&file, &href) {
                    trace!("{} includes {}", file.url(), target.url());
                    graph.add_edge(file.id(), target.id(), ());
                }
            }
        }

        Self { graph }
    }

    /// Returns files including a file directly or transitively.
    ///
    /// Files are listed in depth-first order without duplicates. The file
    /// itself is not listed even if it includes itself through a cycle.
    pub fn backward_dependencies(&self, id: FileId) -> Vec<FileId> {
        if !self.graph.contains_node(id) {
            return vec![];
        }

        let graph = Reversed(&self.graph);
        let mut dfs = Dfs::new(graph, id);
        let mut files = vec![];

        while let Some(file) = dfs.next(graph) {
            if file != id {
                files.push(file);
            }
        }

        files
    }

    /// Returns files included by a file directly.
    pub fn includes(&self, id: FileId) -> impl Iterator<Item = FileId> + '_ {
        self.graph.neighbors(id)
    }
}

/// Returns references of includes in a file, including ones in nested
/// grammars.
pub fn include_hrefs(file: &SchemaFile) -> Vec<String> {
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
    use url::Url;

    fn open(workspace: &Workspace, name: &str, text: &str) -> FileId {
        workspace
            .open(Url::parse(&format!("file:///{name}")).unwrap(), text.into())
            .unwrap()
            .id()
    }

    #[test]
    fn collect_nested_includes() {
        let workspace = Workspace::new();
        let id = open(
            &workspace,
            "a.rnc",
            indoc! {r#"
                include "b.rnc"
                start = grammar { include "c.rnc" }
            "#},
        );

        assert_eq!(
            include_hrefs(&workspace.file(id).unwrap()),
            vec!["b.rnc", "c.rnc"]
        );
    }

    #[test]
    fn list_backward_dependencies() {
        let workspace = Workspace::new();
        let base = open(&workspace, "base.rnc", "start = empty");
        let middle = open(&workspace, "middle.rnc", r#"include "base.rnc""#);
        let top = open(&workspace, "top.rnc", r#"include "middle.rnc""#);
        let other = open(&workspace, "other.rnc", r#"include "base.rnc""#);

        let index = workspace.include_index();
        let mut dependencies = index.backward_dependencies(base);
        dependencies.sort();

        assert_eq!(dependencies, vec![middle, top, other]);
        assert_eq!(index.backward_dependencies(top), vec![]);
        assert_eq!(index.includes(top).collect::<Vec<_>>(), vec![middle]);
    }

    #[test]
    fn list_backward_dependencies_in_cycle() {
        let workspace = Workspace::new();
        let a = open(&workspace, "a.rnc", r#"include "b.rnc""#);
        let b = open(&workspace, "b.rnc", r#"include "a.rnc""#);

        let index = workspace.include_index();

        assert_eq!(index.backward_dependencies(a), vec![b]);
        assert_eq!(index.backward_dependencies(b), vec![a]);
    }

    #[test]
    fn ignore_missing_targets() {
        let workspace = Workspace::new();
        let a = open(&workspace, "a.rnc", r#"include "missing.rnc""#);

        assert_eq!(workspace.include_index().includes(a).count(), 0);
    }
}
