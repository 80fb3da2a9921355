#![doc = include_str!("../README.md")]

extern crate alloc;

use alloc::sync::Arc;
use clap::{Parser, Subcommand};
use core::error::Error;
use env_logger::Env;
use futures::future::try_join_all;
use itertools::Itertools;
use rngscope::{
    Cancellation, Config, Diagnostic, Loader, RenderFormat, RenderOptions, Resolver, SchemaFile,
    Scope, Severity, Workspace, annotate, compile_config, describe, merger, read_config,
};
use std::{env::current_dir, path::PathBuf, process::exit};
use tabled::{
    Table,
    settings::{Color, Style, themes::Colorization},
};
use tokio::io::{AsyncWriteExt, stdout};
use url::Url;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Arguments {
    #[command(subcommand)]
    command: Command,
    /// Sets a configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Sets an output format.
    #[arg(long, global = true, default_value = "text")]
    format: RenderFormat,
    /// Becomes verbose.
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Checks schema files and files they reference.
    Check {
        /// Schema files in addition to configured roots.
        files: Vec<PathBuf>,
    },
    /// Lists definitions of a name visible from a schema file.
    Resolve {
        /// A schema file.
        file: PathBuf,
        /// A definition name.
        name: String,
    },
    /// Lists names visible from a schema file.
    Names {
        /// A schema file.
        file: PathBuf,
    },
    /// Describes a name merged over its definitions.
    Describe {
        /// A schema file.
        file: PathBuf,
        /// A definition name.
        name: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("{error}");
        exit(1)
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let Arguments {
        command,
        config,
        format,
        verbose,
    } = Arguments::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(if verbose {
        "debug"
    } else {
        "warn"
    }))
    .init();

    let config = Arc::new(if let Some(path) = &config {
        compile_config(read_config(path).await?)?
    } else {
        Config::new()
    });
    let workspace = Arc::new(Workspace::new().set_syntaxes(config.syntaxes().clone()));
    let loader = Loader::new(workspace.clone(), config.clone());
    let resolver =
        Resolver::new(workspace.clone()).set_backward_search(config.backward_search());
    let options = RenderOptions::new()
        .set_format(format)
        .set_verbose(verbose)
        .set_base(Url::from_directory_path(current_dir()?).ok());
    let cancellation = Cancellation::new();
    let mut output = stdout();

    match command {
        Command::Check { files } => {
            try_join_all(
                files
                    .iter()
                    .map(PathBuf::as_path)
                    .chain(config.roots())
                    .map(|path| loader.load(path)),
            )
            .await?;

            let mut diagnostics = vec![];

            for file in workspace.files() {
                diagnostics.extend(annotate(&resolver, &file, &cancellation)?);
            }

            rngscope::render_diagnostics(&workspace, &diagnostics, &options, &mut output).await?;
            output.flush().await?;

            let counts = diagnostics.iter().counts_by(Diagnostic::severity);
            let errors = counts.get(&Severity::Error).copied().unwrap_or_default();

            eprintln!();
            eprintln!(
                "{}",
                Table::from_iter(
                    [vec!["files".into(), "errors".into(), "infos".into()]]
                        .into_iter()
                        .chain([vec![
                            workspace.files().len().to_string(),
                            errors.to_string(),
                            counts
                                .get(&Severity::Info)
                                .copied()
                                .unwrap_or_default()
                                .to_string(),
                        ]])
                )
                .with(Style::markdown())
                .with(Colorization::columns([
                    Color::FG_WHITE,
                    Color::FG_RED,
                    Color::FG_GREEN,
                ])),
            );

            if errors > 0 {
                return Err(rngscope::Error::Diagnostics(errors).into());
            }
        }
        Command::Resolve { file, name } => {
            let scope = scope(loader.load(&file).await?)?;
            let definitions = resolver
                .resolve(&scope, &name, &cancellation)?
                .unwrap_or_default();

            if definitions.is_empty() {
                return Err(rngscope::Error::UnresolvedName(name).into());
            }

            rngscope::render_definitions(&workspace, &definitions, &options, &mut output)
                .await?;
        }
        Command::Names { file } => {
            let scope = scope(loader.load(&file).await?)?;
            let variants = resolver
                .variants(&scope, &cancellation)?
                .unwrap_or_default();
            let names = resolver
                .completion_names(&scope, &cancellation)?
                .unwrap_or_default()
                .into_iter()
                .map(|name| {
                    let count = variants.get(&name).map(|definitions| definitions.len());

                    (name, count.unwrap_or_default())
                })
                .collect::<Vec<_>>();

            rngscope::render_names(&names, &options, &mut output).await?;
        }
        Command::Describe { file, name } => {
            let scope = scope(loader.load(&file).await?)?;
            let description = describe(&resolver, &merger(), &scope, &name, &cancellation)?
                .ok_or(rngscope::Error::UnresolvedName(name))?;

            rngscope::render_description(&description, &options, &mut output).await?;
        }
    }

    output.flush().await?;

    Ok(())
}

fn scope(file: Arc<SchemaFile>) -> Result<Scope, rngscope::Error> {
    let url = file.url().clone();

    Scope::of(file).ok_or(rngscope::Error::MissingGrammar(url))
}
