//! Definition resolution over include graphs.

mod cache;
mod scope;

pub use self::scope::Scope;
use self::cache::{CachedVariants, Dependency};
use crate::{
    Cancellation, Cancelled, FileId, SchemaFile, Syntax, Workspace,
    grammar_factory::grammar_of,
    model::{Define, GrammarItem, Include, NodeId},
};
use alloc::sync::Arc;
use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};
use scc::HashMap;
use std::collections::HashSet;

const INITIAL_CACHE_CAPACITY: usize = 1 << 8;

/// Definitions sharing a name in declaration order.
pub type Definitions = IndexSet<Arc<Define>>;

/// Definitions reachable from a grammar scope indexed by their names.
pub type Variants = IndexMap<String, Definitions>;

/// An override of definitions in an included grammar.
#[derive(Clone, Debug)]
pub struct Override {
    define: Arc<Define>,
    targets: Definitions,
}

impl Override {
    /// Returns an overriding definition.
    pub const fn define(&self) -> &Arc<Define> {
        &self.define
    }

    /// Returns overridden definitions.
    pub const fn targets(&self) -> &Definitions {
        &self.targets
    }

    /// Returns `true` if the override overrides anything.
    pub fn is_valid(&self) -> bool {
        !self.targets.is_empty()
    }
}

/// A definition resolver.
///
/// Variants of grammar scopes are memoized until any file read to compute
/// them changes.
#[derive(Debug)]
pub struct Resolver {
    workspace: Arc<Workspace>,
    backward_search: bool,
    cache: HashMap<NodeId, Arc<CachedVariants>>,
}

impl Resolver {
    /// Creates a resolver.
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self {
            workspace,
            backward_search: true,
            cache: HashMap::with_capacity(INITIAL_CACHE_CAPACITY),
        }
    }

    /// Sets whether unresolved names are searched in including files.
    pub const fn set_backward_search(mut self, enabled: bool) -> Self {
        self.backward_search = enabled;
        self
    }

    /// Returns a workspace.
    pub const fn workspace(&self) -> &Arc<Workspace> {
        &self.workspace
    }

    /// Returns all definitions reachable from a scope.
    ///
    /// Definitions are collected in declaration order with includes expanded
    /// in place. Overriding definitions of an include precede overridden ones
    /// rather than replacing them. It returns `None` if the scope is stale.
    pub fn variants(
        &self,
        scope: &Scope,
        cancellation: &Cancellation,
    ) -> Result<Option<Arc<Variants>>, Cancelled> {
        if !self.workspace.is_current(scope.file()) {
            return Ok(None);
        }

        let id = scope.grammar().id();

        if let Some(variants) = self
            .cache
            .read(&id, |_, cached| {
                cached
                    .is_valid(&self.workspace)
                    .then(|| cached.variants().clone())
            })
            .flatten()
        {
            trace!("variants of {id} in {} cached", scope.file().url());
            return Ok(Some(variants));
        }

        let mut traversal = Traversal {
            variants: Default::default(),
            visited: Default::default(),
            dependencies: vec![Dependency::File {
                id: scope.file().id(),
                version: scope.file().version(),
            }],
        };

        self.collect_variants(
            scope.file(),
            scope.grammar().items(),
            &mut traversal,
            cancellation,
        )?;

        debug!(
            "computed {} name(s) for {id} in {} from {} file(s)",
            traversal.variants.len(),
            scope.file().url(),
            traversal.visited.len() + 1,
        );

        let variants = Arc::new(traversal.variants);
        self.cache.upsert(
            id,
            CachedVariants::new(variants.clone(), traversal.dependencies).into(),
        );

        Ok(Some(variants))
    }

    fn collect_variants(
        &self,
        file: &SchemaFile,
        items: &[GrammarItem],
        traversal: &mut Traversal,
        cancellation: &Cancellation,
    ) -> Result<(), Cancelled> {
        for item in items {
            cancellation.check()?;

            match item {
                GrammarItem::Define(define) => {
                    traversal
                        .variants
                        .entry(define.name().into())
                        .or_default()
                        .insert(define.clone());
                }
                GrammarItem::Div(div) => {
                    self.collect_variants(file, div.items(), traversal, cancellation)?
                }
                GrammarItem::Include(include) => {
                    self.collect_variants(file, include.items(), traversal, cancellation)?;

                    let Some(url) = file.reference_url(include.href()) else {
                        continue;
                    };
                    let Some(target) = self.workspace.file_by_url(&url) else {
                        trace!("missing include {url}");
                        traversal.dependencies.push(Dependency::Missing(url));
                        continue;
                    };

                    if !traversal.visited.insert(target.id()) {
                        continue;
                    }

                    traversal.dependencies.push(Dependency::File {
                        id: target.id(),
                        version: target.version(),
                    });

                    if let Some(grammar) = grammar_of(&target) {
                        trace!("following include of {url}");
                        self.collect_variants(&target, grammar.items(), traversal, cancellation)?;
                    }
                }
                GrammarItem::Start(_) => {}
            }
        }

        Ok(())
    }

    /// Resolves a name in a scope.
    ///
    /// If a name is not defined in a scope of an XML syntax file, files
    /// including the file are searched for the first definition of the name.
    /// It returns `None` if the scope is stale and an empty set if the name is
    /// unresolved.
    pub fn resolve(
        &self,
        scope: &Scope,
        name: &str,
        cancellation: &Cancellation,
    ) -> Result<Option<Definitions>, Cancelled> {
        let Some(variants) = self.variants(scope, cancellation)? else {
            return Ok(None);
        };

        if let Some(definitions) = variants
            .get(name)
            .filter(|definitions| !definitions.is_empty())
        {
            return Ok(Some(definitions.clone()));
        }

        if self.backward_search
            && scope.file().syntax() == Syntax::Xml
            && let Some(define) = self.resolve_backward(scope.file(), name, cancellation)?
        {
            return Ok(Some(IndexSet::from([define])));
        }

        Ok(Some(Default::default()))
    }

    /// Searches files including a file for the first definition of a name.
    ///
    /// Files are searched depth first and definitions in overrides of
    /// includes are not.
    pub fn resolve_backward(
        &self,
        file: &SchemaFile,
        name: &str,
        cancellation: &Cancellation,
    ) -> Result<Option<Arc<Define>>, Cancelled> {
        let mut visited = HashSet::new();

        for id in self.workspace.include_index().backward_dependencies(file.id()) {
            cancellation.check()?;

            let Some(includer) = self.workspace.file(id) else {
                continue;
            };
            let Some(grammar) = grammar_of(&includer) else {
                continue;
            };

            trace!("searching {name} in {}", includer.url());

            if let Some(define) =
                self.find_define(&includer, grammar.items(), name, &mut visited, cancellation)?
            {
                debug!("resolved {name} backward in {}", includer.url());
                return Ok(Some(define));
            }
        }

        Ok(None)
    }

    fn find_define(
        &self,
        file: &SchemaFile,
        items: &[GrammarItem],
        name: &str,
        visited: &mut HashSet<FileId>,
        cancellation: &Cancellation,
    ) -> Result<Option<Arc<Define>>, Cancelled> {
        for item in items {
            cancellation.check()?;

            let define = match item {
                GrammarItem::Define(define) => (define.name() == name).then(|| define.clone()),
                GrammarItem::Div(div) => {
                    self.find_define(file, div.items(), name, visited, cancellation)?
                }
                GrammarItem::Include(include) => {
                    match self.workspace.include_target(file, include.href()) {
                        Some(target) if visited.insert(target.id()) => match grammar_of(&target) {
                            Some(grammar) => self.find_define(
                                &target,
                                grammar.items(),
                                name,
                                visited,
                                cancellation,
                            )?,
                            None => None,
                        },
                        _ => None,
                    }
                }
                GrammarItem::Start(_) => None,
            };

            if define.is_some() {
                return Ok(define);
            }
        }

        Ok(None)
    }

    /// Returns names of all definitions reachable from a scope.
    pub fn completion_names(
        &self,
        scope: &Scope,
        cancellation: &Cancellation,
    ) -> Result<Option<Vec<String>>, Cancelled> {
        Ok(self.variants(scope, cancellation)?.map(|variants| {
            variants
                .iter()
                .filter(|(_, definitions)| !definitions.is_empty())
                .map(|(name, _)| name.clone())
                .collect()
        }))
    }

    /// Returns overrides of an include with definitions they override.
    ///
    /// It returns `None` if the included file is missing, stale, or without a
    /// grammar.
    pub fn overrides(
        &self,
        file: &SchemaFile,
        include: &Include,
        cancellation: &Cancellation,
    ) -> Result<Option<Vec<Override>>, Cancelled> {
        let Some(scope) = self
            .workspace
            .include_target(file, include.href())
            .and_then(Scope::of)
        else {
            return Ok(None);
        };
        let Some(variants) = self.variants(&scope, cancellation)? else {
            return Ok(None);
        };

        Ok(Some(
            include
                .overrides()
                .into_iter()
                .map(|define| Override {
                    define: define.clone(),
                    targets: variants.get(define.name()).cloned().unwrap_or_default(),
                })
                .collect(),
        ))
    }

    /// Returns only overrides which override anything.
    pub fn override_targets(
        &self,
        file: &SchemaFile,
        include: &Include,
        cancellation: &Cancellation,
    ) -> Result<Option<Vec<Override>>, Cancelled> {
        Ok(self
            .overrides(file, include, cancellation)?
            .map(|overrides| overrides.into_iter().filter(Override::is_valid).collect()))
    }
}

struct Traversal {
    variants: Variants,
    visited: HashSet<FileId>,
    dependencies: Vec<Dependency>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::Pattern,
        test::{open, url},
    };
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn resolver(files: &[(&str, &str)]) -> Resolver {
        let workspace = Workspace::new();

        for (name, text) in files {
            open(&workspace, name, text);
        }

        Resolver::new(workspace.into())
    }

    fn scope(resolver: &Resolver, name: &str) -> Scope {
        Scope::of(resolver.workspace().file_by_url(&url(name)).unwrap()).unwrap()
    }

    fn resolve(resolver: &Resolver, file: &str, name: &str) -> Option<Definitions> {
        resolver
            .resolve(&scope(resolver, file), name, &Cancellation::new())
            .unwrap()
    }

    fn names(definitions: &Definitions) -> Vec<(String, String)> {
        definitions
            .iter()
            .map(|define| {
                let file = define.id().file();
                (file.to_string(), define.name().to_owned())
            })
            .collect()
    }

    #[test]
    fn resolve_definitions_of_included_file() {
        let resolver = resolver(&[
            (
                "a.rng",
                indoc! {r#"
                    <grammar xmlns="http://relaxng.org/ns/structure/1.0">
                      <define name="title"><text/></define>
                    </grammar>
                "#},
            ),
            (
                "b.rng",
                indoc! {r#"
                    <grammar xmlns="http://relaxng.org/ns/structure/1.0">
                      <include href="a.rng"/>
                      <define name="title">
                        <element name="bold"><text/></element>
                      </define>
                    </grammar>
                "#},
            ),
        ]);

        let definitions = resolve(&resolver, "b.rng", "title").unwrap();

        assert_eq!(definitions.len(), 2);
        assert!(
            definitions
                .iter()
                .any(|define| define.pattern() == Some(&Pattern::Text))
        );
        assert!(definitions.iter().any(|define| matches!(
            define.pattern(),
            Some(Pattern::Element { .. })
        )));
    }

    #[test]
    fn keep_declaration_order() {
        let resolver = resolver(&[
            ("a.rnc", "foo = text"),
            ("b.rnc", "foo = empty\ninclude \"a.rnc\""),
        ]);

        assert_eq!(
            names(&resolve(&resolver, "b.rnc", "foo").unwrap()),
            vec![("#1".into(), "foo".into()), ("#0".into(), "foo".into())]
        );
    }

    #[test]
    fn flatten_divisions() {
        let resolver = resolver(&[(
            "a.rnc",
            "div { foo = text div { bar = empty } }",
        )]);

        assert_eq!(
            resolver
                .completion_names(&scope(&resolver, "a.rnc"), &Cancellation::new())
                .unwrap()
                .unwrap(),
            vec!["foo", "bar"]
        );
    }

    #[test]
    fn resolve_in_include_cycle() {
        let resolver = resolver(&[
            ("a.rnc", "include \"b.rnc\"\nfoo = text"),
            ("b.rnc", "include \"a.rnc\"\nbar = text"),
        ]);

        let variants = resolver
            .variants(&scope(&resolver, "a.rnc"), &Cancellation::new())
            .unwrap()
            .unwrap();

        assert_eq!(variants.len(), 2);
        assert_eq!(variants["foo"].len(), 1);
        assert_eq!(variants["bar"].len(), 1);
    }

    #[test]
    fn keep_overridden_definitions() {
        let resolver = resolver(&[
            ("a.rnc", "foo = text"),
            ("b.rnc", "include \"a.rnc\" { foo = empty }"),
        ]);

        assert_eq!(
            names(&resolve(&resolver, "b.rnc", "foo").unwrap()),
            vec![("#1".into(), "foo".into()), ("#0".into(), "foo".into())]
        );
    }

    #[test]
    fn resolve_unknown_name_to_empty_set() {
        let resolver = resolver(&[("a.rnc", "foo = text")]);

        assert_eq!(resolve(&resolver, "a.rnc", "bar"), Some(Default::default()));
    }

    #[test]
    fn resolve_name_backward() {
        let resolver = resolver(&[
            (
                "child.rng",
                indoc! {r#"
                    <grammar xmlns="http://relaxng.org/ns/structure/1.0">
                      <start><ref name="x"/></start>
                    </grammar>
                "#},
            ),
            (
                "parent.rng",
                indoc! {r#"
                    <grammar xmlns="http://relaxng.org/ns/structure/1.0">
                      <include href="child.rng"/>
                      <div><define name="x"><text/></define></div>
                    </grammar>
                "#},
            ),
        ]);

        assert_eq!(
            names(&resolve(&resolver, "child.rng", "x").unwrap()),
            vec![("#1".into(), "x".into())]
        );
    }

    #[test]
    fn resolve_name_backward_through_included_sibling() {
        let resolver = resolver(&[
            (
                "child.rng",
                r#"<grammar xmlns="http://relaxng.org/ns/structure/1.0"/>"#,
            ),
            (
                "sibling.rng",
                indoc! {r#"
                    <grammar xmlns="http://relaxng.org/ns/structure/1.0">
                      <define name="x"><text/></define>
                    </grammar>
                "#},
            ),
            (
                "parent.rng",
                indoc! {r#"
                    <grammar xmlns="http://relaxng.org/ns/structure/1.0">
                      <include href="child.rng"/>
                      <include href="sibling.rng"/>
                    </grammar>
                "#},
            ),
        ]);

        assert_eq!(
            names(&resolve(&resolver, "child.rng", "x").unwrap()),
            vec![("#1".into(), "x".into())]
        );
    }

    #[test]
    fn skip_backward_search_in_compact_syntax() {
        let resolver = resolver(&[
            ("child.rnc", "start = x"),
            ("parent.rnc", "include \"child.rnc\"\nx = text"),
        ]);

        assert_eq!(
            resolve(&resolver, "child.rnc", "x"),
            Some(Default::default())
        );
    }

    #[test]
    fn skip_disabled_backward_search() {
        let resolver = resolver(&[
            (
                "child.rng",
                r#"<grammar xmlns="http://relaxng.org/ns/structure/1.0"/>"#,
            ),
            (
                "parent.rng",
                indoc! {r#"
                    <grammar xmlns="http://relaxng.org/ns/structure/1.0">
                      <include href="child.rng"/>
                      <define name="x"><text/></define>
                    </grammar>
                "#},
            ),
        ])
        .set_backward_search(false);

        assert_eq!(
            resolve(&resolver, "child.rng", "x"),
            Some(Default::default())
        );
    }

    #[test]
    fn return_none_for_stale_scope() {
        let resolver = resolver(&[("a.rnc", "foo = text")]);
        let scope = scope(&resolver, "a.rnc");

        open(resolver.workspace(), "a.rnc", "foo = empty");

        assert_eq!(
            resolver
                .resolve(&scope, "foo", &Cancellation::new())
                .unwrap(),
            None
        );
    }

    #[test]
    fn reuse_cached_variants() {
        let resolver = resolver(&[("a.rnc", "foo = text")]);
        let scope = scope(&resolver, "a.rnc");
        let cancellation = Cancellation::new();

        let variants = resolver.variants(&scope, &cancellation).unwrap().unwrap();

        assert!(Arc::ptr_eq(
            &resolver.variants(&scope, &cancellation).unwrap().unwrap(),
            &variants
        ));
        assert_eq!(
            resolver.resolve(&scope, "foo", &cancellation).unwrap(),
            resolver.resolve(&scope, "foo", &cancellation).unwrap(),
        );
    }

    #[test]
    fn invalidate_cache_on_included_file_change() {
        let resolver = resolver(&[
            ("a.rnc", "foo = text"),
            ("b.rnc", "include \"a.rnc\""),
        ]);
        let scope = scope(&resolver, "b.rnc");

        assert_eq!(resolve(&resolver, "b.rnc", "bar"), Some(Default::default()));

        open(resolver.workspace(), "a.rnc", "bar = text");

        assert_eq!(
            resolver
                .resolve(&scope, "bar", &Cancellation::new())
                .unwrap()
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn invalidate_cache_on_missing_include_opened() {
        let resolver = resolver(&[("b.rnc", "include \"a.rnc\"")]);
        let scope = scope(&resolver, "b.rnc");

        assert_eq!(resolve(&resolver, "b.rnc", "foo"), Some(Default::default()));

        open(resolver.workspace(), "a.rnc", "foo = text");

        assert_eq!(
            resolver
                .resolve(&scope, "foo", &Cancellation::new())
                .unwrap()
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn resolve_in_nested_grammar() {
        let resolver = resolver(&[(
            "a.rnc",
            "foo = grammar { start = parent foo bar = text }",
        )]);
        let file = resolver.workspace().file_by_url(&url("a.rnc")).unwrap();
        let outer = scope(&resolver, "a.rnc");
        let [GrammarItem::Define(define)] = outer.grammar().items() else {
            panic!("unexpected items");
        };
        let Some(Pattern::Grammar(inner)) = define.pattern() else {
            panic!("unexpected pattern");
        };
        let inner = Scope::new(file.clone(), inner.clone());
        let cancellation = Cancellation::new();

        assert_eq!(
            resolver
                .completion_names(&inner, &cancellation)
                .unwrap()
                .unwrap(),
            vec!["bar"]
        );
        assert_eq!(
            resolver
                .resolve(&outer, "foo", &cancellation)
                .unwrap()
                .unwrap()
                .len(),
            1
        );
        assert!(
            resolver
                .resolve(&inner, "foo", &cancellation)
                .unwrap()
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn cancel_resolution() {
        let resolver = resolver(&[("a.rnc", "foo = text")]);
        let cancellation = Cancellation::new();

        cancellation.cancel();

        assert_eq!(
            resolver.resolve(&scope(&resolver, "a.rnc"), "foo", &cancellation),
            Err(Cancelled)
        );
    }

    #[test]
    fn list_overrides() {
        let resolver = resolver(&[
            ("a.rnc", "foo = text"),
            ("b.rnc", "include \"a.rnc\" { foo = empty bar = empty }"),
        ]);
        let file = resolver.workspace().file_by_url(&url("b.rnc")).unwrap();
        let scope = Scope::of(file.clone()).unwrap();
        let [GrammarItem::Include(include)] = scope.grammar().items() else {
            panic!("unexpected items");
        };
        let cancellation = Cancellation::new();

        let overrides = resolver
            .overrides(&file, include, &cancellation)
            .unwrap()
            .unwrap();

        assert_eq!(overrides.len(), 2);
        assert!(overrides[0].is_valid());
        assert!(!overrides[1].is_valid());

        let targets = resolver
            .override_targets(&file, include, &cancellation)
            .unwrap()
            .unwrap();

        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].define().name(), "foo");
        assert_eq!(targets[0].targets().len(), 1);
    }
}
