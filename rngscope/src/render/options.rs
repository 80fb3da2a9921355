use url::Url;

/// A rendering format.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum RenderFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON lines.
    Json,
}

/// Rendering options.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct RenderOptions {
    format: RenderFormat,
    verbose: bool,
    base: Option<Url>,
}

impl RenderOptions {
    /// Creates rendering options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a rendering format.
    pub const fn format(&self) -> RenderFormat {
        self.format
    }

    /// Returns `true` if informational diagnostics are rendered too.
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Returns a base URL of locations in text.
    pub const fn base(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    /// Sets a rendering format.
    pub const fn set_format(mut self, format: RenderFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets whether informational diagnostics are rendered too.
    pub const fn set_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Sets a base URL of locations in text.
    ///
    /// A base URL of a directory needs a trailing slash.
    pub fn set_base(mut self, base: Option<Url>) -> Self {
        self.base = base;
        self
    }

    /// Formats a file URL as a location in text.
    ///
    /// URLs under a base are shown relative to it.
    pub fn location(&self, url: &Url) -> String {
        self.base
            .as_ref()
            .filter(|base| url.as_str().starts_with(base.as_str()))
            .and_then(|base| base.make_relative(url))
            .unwrap_or_else(|| url.to_string())
    }
}
