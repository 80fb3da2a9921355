use crate::{
    Cancellation, Cancelled, Root, SchemaFile, Syntax,
    diagnostic::{Diagnostic, DiagnosticKind},
    grammar_factory::grammar_of,
    model::{
        Define, ExternalRef, Grammar, Include, Reference, ReferenceKind, Span, Visitor,
        walk_grammar, walk_pattern,
    },
    resolver::{Resolver, Scope},
};
use alloc::sync::Arc;
use core::ops::ControlFlow;
use log::trace;

/// Annotates a file with diagnostics.
///
/// A stale file gets no diagnostics.
pub fn annotate(
    resolver: &Resolver,
    file: &Arc<SchemaFile>,
    cancellation: &Cancellation,
) -> Result<Vec<Diagnostic>, Cancelled> {
    if !resolver.workspace().is_current(file) {
        trace!("skipping stale {}", file.url());
        return Ok(vec![]);
    }

    let mut annotator = Annotator {
        resolver,
        file,
        cancellation,
        diagnostics: vec![],
    };

    let flow = match file.root() {
        Root::Grammar(grammar) => walk_grammar(&mut annotator, grammar),
        Root::Pattern(pattern) => walk_pattern(&mut annotator, pattern),
        Root::Empty => ControlFlow::Continue(()),
    };

    match flow {
        ControlFlow::Continue(()) => Ok(annotator.diagnostics),
        ControlFlow::Break(cancelled) => Err(cancelled),
    }
}

struct Annotator<'a> {
    resolver: &'a Resolver,
    file: &'a Arc<SchemaFile>,
    cancellation: &'a Cancellation,
    diagnostics: Vec<Diagnostic>,
}

impl Annotator<'_> {
    fn report(&mut self, span: Span, kind: DiagnosticKind) {
        self.diagnostics
            .push(Diagnostic::new(self.file.id(), span, kind));
    }

    fn overriders(
        &self,
        define: &Arc<Define>,
    ) -> Result<Option<(String, Vec<Arc<Define>>)>, Cancelled> {
        let workspace = self.resolver.workspace();

        for id in workspace.include_index().backward_dependencies(self.file.id()) {
            self.cancellation.check()?;

            let Some(includer) = workspace.file(id) else {
                continue;
            };
            let Some(grammar) = grammar_of(&includer) else {
                continue;
            };
            let mut overriders = vec![];

            for include in includes(&grammar) {
                let Some(overrides) =
                    self.resolver
                        .override_targets(&includer, &include, self.cancellation)?
                else {
                    continue;
                };

                overriders.extend(
                    overrides
                        .into_iter()
                        .filter(|r#override| r#override.targets().contains(define))
                        .map(|r#override| r#override.define().clone()),
                );
            }

            if !overriders.is_empty() {
                return Ok(Some((includer.name().into(), overriders)));
            }
        }

        Ok(None)
    }
}

impl Visitor for Annotator<'_> {
    type Break = Cancelled;

    fn visit_define(
        &mut self,
        define: &Arc<Define>,
        _grammars: &[Arc<Grammar>],
    ) -> ControlFlow<Self::Break> {
        if self.file.syntax() != Syntax::Xml {
            return ControlFlow::Continue(());
        }

        match self.overriders(define) {
            Ok(Some((file, overriders))) => self.report(
                define.span(),
                DiagnosticKind::OverriddenBy {
                    name: define.name().into(),
                    file,
                    overriders: overriders.iter().map(|define| define.id()).collect(),
                },
            ),
            Ok(None) => {}
            Err(cancelled) => return ControlFlow::Break(cancelled),
        }

        ControlFlow::Continue(())
    }

    fn visit_include(
        &mut self,
        include: &Include,
        _grammars: &[Arc<Grammar>],
    ) -> ControlFlow<Self::Break> {
        let Some(target) = self
            .resolver
            .workspace()
            .include_target(self.file, include.href())
        else {
            self.report(
                include.span(),
                DiagnosticKind::UnresolvedInclude {
                    href: include.href().into(),
                },
            );
            return ControlFlow::Continue(());
        };

        let overrides = match self
            .resolver
            .overrides(self.file, include, self.cancellation)
        {
            Ok(Some(overrides)) => overrides,
            Ok(None) => return ControlFlow::Continue(()),
            Err(cancelled) => return ControlFlow::Break(cancelled),
        };

        for r#override in overrides {
            let define = r#override.define();
            let name = define.name().to_owned();
            let file = target.name().to_owned();

            self.report(
                define.span(),
                if r#override.is_valid() {
                    DiagnosticKind::Overrides {
                        name,
                        file,
                        targets: r#override.targets().iter().map(|define| define.id()).collect(),
                    }
                } else {
                    DiagnosticKind::OverrideMismatch { name, file }
                },
            );
        }

        ControlFlow::Continue(())
    }

    fn visit_reference(
        &mut self,
        reference: &Reference,
        kind: ReferenceKind,
        grammars: &[Arc<Grammar>],
    ) -> ControlFlow<Self::Break> {
        let definitions = match Scope::of_reference(self.file, kind, grammars) {
            Some(scope) => match self
                .resolver
                .resolve(&scope, reference.name(), self.cancellation)
            {
                Ok(Some(definitions)) => definitions,
                Ok(None) => return ControlFlow::Continue(()),
                Err(cancelled) => return ControlFlow::Break(cancelled),
            },
            None => Default::default(),
        };

        if definitions.is_empty() {
            self.report(
                reference.span(),
                DiagnosticKind::UnresolvedReference {
                    name: reference.name().into(),
                },
            );
        }

        ControlFlow::Continue(())
    }

    fn visit_external_ref(&mut self, external: &ExternalRef) -> ControlFlow<Self::Break> {
        if self
            .resolver
            .workspace()
            .include_target(self.file, external.href())
            .is_none()
        {
            self.report(
                external.span(),
                DiagnosticKind::UnresolvedExternalRef {
                    href: external.href().into(),
                },
            );
        }

        ControlFlow::Continue(())
    }
}

fn includes(grammar: &Arc<Grammar>) -> Vec<Include> {
    struct Collector(Vec<Include>);

    impl Visitor for Collector {
        type Break = ();

        fn visit_include(
            &mut self,
            include: &Include,
            grammars: &[Arc<Grammar>],
        ) -> ControlFlow<Self::Break> {
            // Includes of nested grammars do not override top-level ones.
            if grammars.len() == 1 {
                self.0.push(include.clone());
            }

            ControlFlow::Continue(())
        }
    }

    let mut collector = Collector(vec![]);
    let _ = walk_grammar(&mut collector, grammar);
    collector.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Workspace, diagnostic::Severity, test::open};
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn annotate_file(files: &[(&str, &str)], name: &str) -> Vec<(Severity, String, String)> {
        let workspace = Workspace::new();
        let mut target = None;

        for (file_name, text) in files {
            let file = open(&workspace, file_name, text);

            if *file_name == name {
                target = Some(file);
            }
        }

        let file = target.unwrap();

        annotate(
            &Resolver::new(workspace.into()),
            &file,
            &Cancellation::new(),
        )
        .unwrap()
        .into_iter()
        .map(|diagnostic| {
            let span = diagnostic.span();

            (
                diagnostic.severity(),
                diagnostic.kind().to_string(),
                file.text()[span.start..span.end].to_owned(),
            )
        })
        .collect()
    }

    #[test]
    fn report_unresolved_references() {
        assert_eq!(
            annotate_file(
                &[("a.rnc", "start = foo | bar\nfoo = parent baz")],
                "a.rnc"
            ),
            vec![
                (
                    Severity::Error,
                    "unresolved pattern reference 'bar'".into(),
                    "bar".into()
                ),
                (
                    Severity::Error,
                    "unresolved pattern reference 'baz'".into(),
                    "baz".into()
                ),
            ]
        );
    }

    #[test]
    fn resolve_parent_references_in_enclosing_grammar() {
        assert_eq!(
            annotate_file(
                &[(
                    "a.rnc",
                    indoc! {"
                        start = grammar { start = parent foo bar = parent missing }
                        foo = text
                    "}
                )],
                "a.rnc"
            ),
            vec![(
                Severity::Error,
                "unresolved pattern reference 'missing'".into(),
                "missing".into()
            )]
        );
    }

    #[test]
    fn report_overrides() {
        assert_eq!(
            annotate_file(
                &[
                    ("a.rnc", "foo = text"),
                    ("b.rnc", "include \"a.rnc\" { foo = empty bar = empty }"),
                ],
                "b.rnc"
            ),
            vec![
                (Severity::Info, "overrides 'foo' in a.rnc".into(), "foo".into()),
                (
                    Severity::Error,
                    "definition doesn't override anything from a.rnc".into(),
                    "bar".into()
                ),
            ]
        );
    }

    #[test]
    fn report_overridden_definitions() {
        assert_eq!(
            annotate_file(
                &[
                    (
                        "a.rng",
                        indoc! {r#"
                            <grammar xmlns="http://relaxng.org/ns/structure/1.0">
                              <define name="foo"><text/></define>
                              <define name="bar"><text/></define>
                            </grammar>
                        "#},
                    ),
                    (
                        "b.rng",
                        indoc! {r#"
                            <grammar xmlns="http://relaxng.org/ns/structure/1.0">
                              <include href="a.rng">
                                <define name="foo"><empty/></define>
                              </include>
                            </grammar>
                        "#},
                    ),
                ],
                "a.rng"
            ),
            vec![(
                Severity::Info,
                "'foo' is overridden in b.rng".into(),
                "foo".into()
            )]
        );
    }

    #[test]
    fn report_unresolved_includes() {
        assert_eq!(
            annotate_file(
                &[(
                    "a.rnc",
                    "include \"missing.rnc\"\nstart = external \"other.rnc\""
                )],
                "a.rnc"
            ),
            vec![
                (
                    Severity::Error,
                    "cannot resolve include 'missing.rnc'".into(),
                    "\"missing.rnc\"".into()
                ),
                (
                    Severity::Error,
                    "cannot resolve external reference 'other.rnc'".into(),
                    "\"other.rnc\"".into()
                ),
            ]
        );
    }

    #[test]
    fn skip_stale_file() {
        let workspace = Arc::new(Workspace::new());
        let file = open(&workspace, "a.rnc", "start = foo");

        open(&workspace, "a.rnc", "start = bar");

        assert_eq!(
            annotate(
                &Resolver::new(workspace),
                &file,
                &Cancellation::new()
            ),
            Ok(vec![])
        );
    }

    #[test]
    fn cancel_annotation() {
        let workspace = Arc::new(Workspace::new());
        let file = open(&workspace, "a.rnc", "start = foo");
        let cancellation = Cancellation::new();

        cancellation.cancel();

        assert_eq!(
            annotate(&Resolver::new(workspace), &file, &cancellation),
            Err(Cancelled)
        );
    }
}
