#![doc = include_str!("../README.md")]

extern crate alloc;

mod annotator;
mod cancellation;
mod config;
mod diagnostic;
mod error;
mod file;
mod grammar_factory;
mod include_index;
mod loader;
pub mod model;
mod outline;
mod render;
mod resolver;
mod syntax;
#[cfg(test)]
mod test;
mod workspace;

pub use self::{
    annotator::annotate,
    cancellation::{Cancellation, Cancelled},
    config::{Config, ConfigError, SerializableConfig, compile_config, read_config},
    diagnostic::{Diagnostic, DiagnosticKind, Severity},
    error::Error,
    file::{FileId, Position, Root, SchemaFile, Syntax},
    grammar_factory::grammar_of,
    include_index::{IncludeIndex, include_hrefs},
    loader::Loader,
    outline::{
        AttributeOutline, ChildDescription, DefineOutline, Description, ElementOutline,
        ReferenceOutline, describe, merger, outline,
    },
    render::{
        RenderFormat, RenderOptions, render_definitions, render_description, render_diagnostics,
        render_names,
    },
    resolver::{Definitions, Override, Resolver, Scope, Variants},
    workspace::Workspace,
};
