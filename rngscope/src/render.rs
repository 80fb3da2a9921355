mod definition;
mod diagnostic;
mod options;

pub use self::options::{RenderFormat, RenderOptions};
use self::{definition::RenderedDefinition, diagnostic::RenderedDiagnostic};
use crate::{
    Error, Workspace,
    diagnostic::{Diagnostic, Severity},
    model::Define,
    outline::Description,
};
use alloc::sync::Arc;
use colored::Colorize;
use serde::Serialize;
use tabled::{
    Table,
    settings::{Color, Style, themes::Colorization},
};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Renders diagnostics.
///
/// Informational diagnostics are rendered only in verbose mode.
pub async fn render_diagnostics(
    workspace: &Workspace,
    diagnostics: &[Diagnostic],
    options: &RenderOptions,
    writer: &mut (impl AsyncWrite + Unpin),
) -> Result<(), Error> {
    let diagnostics = diagnostics
        .iter()
        .filter(|diagnostic| options.verbose() || diagnostic.severity() == Severity::Error)
        .filter_map(|diagnostic| RenderedDiagnostic::new(workspace, diagnostic))
        .collect::<Vec<_>>();

    match options.format() {
        RenderFormat::Text => {
            for diagnostic in diagnostics {
                let severity = match diagnostic.severity() {
                    Severity::Error => diagnostic.severity().to_string().red(),
                    Severity::Info => diagnostic.severity().to_string().blue(),
                };
                let position = diagnostic.position();

                render_line(
                    writer,
                    &format!(
                        "{}:{}:{}: {severity} {}",
                        options.location(diagnostic.url()),
                        position.line,
                        position.column,
                        diagnostic.message()
                    ),
                )
                .await?;
            }

            Ok(())
        }
        RenderFormat::Json => render_json_lines(writer, diagnostics).await,
    }
}

/// Renders definitions.
pub async fn render_definitions(
    workspace: &Workspace,
    definitions: impl IntoIterator<Item = &Arc<Define>>,
    options: &RenderOptions,
    writer: &mut (impl AsyncWrite + Unpin),
) -> Result<(), Error> {
    let definitions = definitions
        .into_iter()
        .filter_map(|define| RenderedDefinition::new(workspace, define))
        .collect::<Vec<_>>();

    match options.format() {
        RenderFormat::Text => {
            for definition in definitions {
                let position = definition.position();

                render_line(
                    writer,
                    &format!(
                        "{}\t{}:{}:{}",
                        definition.name().yellow(),
                        options.location(definition.url()),
                        position.line,
                        position.column
                    ),
                )
                .await?;
            }

            Ok(())
        }
        RenderFormat::Json => render_json_lines(writer, definitions).await,
    }
}

/// Renders names with their numbers of definitions.
pub async fn render_names(
    names: &[(String, usize)],
    options: &RenderOptions,
    writer: &mut (impl AsyncWrite + Unpin),
) -> Result<(), Error> {
    #[derive(Serialize)]
    struct RenderedName<'a> {
        name: &'a str,
        definitions: usize,
    }

    match options.format() {
        RenderFormat::Text => {
            render_line(
                writer,
                &Table::from_iter(
                    [vec!["name".into(), "definitions".into()]]
                        .into_iter()
                        .chain(
                            names
                                .iter()
                                .map(|(name, count)| vec![name.clone(), count.to_string()]),
                        ),
                )
                .with(Style::markdown())
                .with(Colorization::columns([Color::FG_YELLOW, Color::FG_WHITE]))
                .to_string(),
            )
            .await
        }
        RenderFormat::Json => {
            render_json_lines(
                writer,
                names.iter().map(|(name, count)| RenderedName {
                    name,
                    definitions: *count,
                }),
            )
            .await
        }
    }
}

/// Renders a description of a name.
pub async fn render_description(
    description: &Description,
    options: &RenderOptions,
    writer: &mut (impl AsyncWrite + Unpin),
) -> Result<(), Error> {
    if options.format() == RenderFormat::Json {
        return render_json_lines(writer, [description]).await;
    }

    render_line(
        writer,
        &format!(
            "{} ({} definition(s))",
            description.name().yellow(),
            description.definitions()
        ),
    )
    .await?;

    for (label, children) in [
        ("elements", description.elements()),
        ("attributes", description.attributes()),
    ] {
        if children.is_empty() {
            continue;
        }

        render_line(writer, &format!("\t{label}")).await?;

        for child in children {
            render_line(
                writer,
                &format!(
                    "\t\t{}{}{}",
                    child.name(),
                    if child.optional() { "?" } else { "" },
                    if child.repeated() { "+" } else { "" },
                ),
            )
            .await?;
        }
    }

    if !description.required_attributes().is_empty() {
        render_line(
            writer,
            &format!(
                "\trequired attributes: {}",
                description.required_attributes().join(", ").green()
            ),
        )
        .await?;
    }

    if !description.references().is_empty() {
        render_line(
            writer,
            &format!("\treferences: {}", description.references().join(", ")),
        )
        .await?;
    }

    Ok(())
}

async fn render_json_lines(
    writer: &mut (impl AsyncWrite + Unpin),
    values: impl IntoIterator<Item = impl Serialize>,
) -> Result<(), Error> {
    for value in values {
        render_line(writer, &serde_json::to_string(&value)?).await?;
    }

    Ok(())
}

async fn render_line(writer: &mut (impl AsyncWrite + Unpin), string: &str) -> Result<(), Error> {
    writer.write_all(string.as_bytes()).await?;
    writer.write_all(b"\n").await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cancellation, annotator::annotate, resolver::Resolver, test::open};
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    async fn render(
        workspace: &Workspace,
        diagnostics: &[Diagnostic],
        options: RenderOptions,
    ) -> String {
        let mut output = vec![];

        colored::control::set_override(false);
        render_diagnostics(workspace, diagnostics, &options, &mut output)
            .await
            .unwrap();

        String::from_utf8(output).unwrap()
    }

    fn diagnostics(workspace: &Arc<Workspace>) -> Vec<Diagnostic> {
        open(workspace, "a.rnc", "foo = text");
        let file = open(
            workspace,
            "b.rnc",
            "include \"a.rnc\" { foo = empty }\nstart =\n  bar",
        );

        annotate(
            &Resolver::new(workspace.clone()),
            &file,
            &Cancellation::new(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn render_errors_in_text() {
        let workspace = Arc::new(Workspace::new());
        let diagnostics = diagnostics(&workspace);

        assert_eq!(
            render(&workspace, &diagnostics, RenderOptions::new()).await,
            "file:///schema/b.rnc:3:3: error unresolved pattern reference 'bar'\n"
        );
    }

    #[tokio::test]
    async fn render_diagnostics_relative_to_base() {
        let workspace = Arc::new(Workspace::new());
        let diagnostics = diagnostics(&workspace);

        assert_eq!(
            render(
                &workspace,
                &diagnostics,
                RenderOptions::new().set_base(url::Url::parse("file:///schema/").ok())
            )
            .await,
            "b.rnc:3:3: error unresolved pattern reference 'bar'\n"
        );
    }

    #[tokio::test]
    async fn render_all_diagnostics_in_verbose_mode() {
        let workspace = Arc::new(Workspace::new());
        let diagnostics = diagnostics(&workspace);

        assert_eq!(
            render(
                &workspace,
                &diagnostics,
                RenderOptions::new().set_verbose(true)
            )
            .await
            .lines()
            .count(),
            2
        );
    }

    #[tokio::test]
    async fn render_diagnostics_in_json() {
        let workspace = Arc::new(Workspace::new());
        let diagnostics = diagnostics(&workspace);

        let output = render(
            &workspace,
            &diagnostics,
            RenderOptions::new().set_format(RenderFormat::Json),
        )
        .await;

        assert_eq!(
            serde_json::from_str::<serde_json::Value>(output.trim()).unwrap(),
            serde_json::json!({
                "url": "file:///schema/b.rnc",
                "line": 3,
                "column": 3,
                "severity": "error",
                "message": "unresolved pattern reference 'bar'",
            })
        );
    }

    #[tokio::test]
    async fn render_names_in_json() {
        let mut output = vec![];

        render_names(
            &[("foo".into(), 2), ("bar".into(), 1)],
            &RenderOptions::new().set_format(RenderFormat::Json),
            &mut output,
        )
        .await
        .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            indoc! {r#"
                {"name":"foo","definitions":2}
                {"name":"bar","definitions":1}
            "#}
        );
    }

    #[tokio::test]
    async fn render_definitions_in_text() {
        let workspace = Arc::new(Workspace::new());
        let file = open(&workspace, "a.rnc", "foo = text\nfoo |= empty");
        let resolver = Resolver::new(workspace.clone());
        let definitions = resolver
            .resolve(
                &crate::resolver::Scope::of(file).unwrap(),
                "foo",
                &Cancellation::new(),
            )
            .unwrap()
            .unwrap();
        let mut output = vec![];

        colored::control::set_override(false);
        render_definitions(&workspace, &definitions, &RenderOptions::new(), &mut output)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "foo\tfile:///schema/a.rnc:1:1\nfoo\tfile:///schema/a.rnc:2:1\n"
        );
    }
}
