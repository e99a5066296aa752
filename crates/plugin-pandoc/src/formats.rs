//! Catalog of output formats the plugin knows how to request from pandoc.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PandocError;

/// A document format the converter can produce.
///
/// The catalog is closed; whether the installed converter actually supports
/// a variant is decided by the capability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Native Haskell AST
    Native,
    /// JSON AST
    Json,
    /// HTML source
    Html,
    /// Plain text
    Plain,
    /// Markdown
    Markdown,
    /// reStructuredText
    Rst,
    /// LaTeX
    Latex,
    /// ConTeXt
    Context,
    /// groff man page
    Man,
    /// MediaWiki markup
    Mediawiki,
    /// Textile
    Textile,
    /// GNU Texinfo
    Texinfo,
    /// Rich Text Format
    Rtf,
}

impl OutputFormat {
    /// Every format in the catalog, in declaration order.
    pub const ALL: [OutputFormat; 13] = [
        Self::Native,
        Self::Json,
        Self::Html,
        Self::Plain,
        Self::Markdown,
        Self::Rst,
        Self::Latex,
        Self::Context,
        Self::Man,
        Self::Mediawiki,
        Self::Textile,
        Self::Texinfo,
        Self::Rtf,
    ];

    /// Identifier passed to the converter's `-t` flag.
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Json => "json",
            Self::Html => "html",
            Self::Plain => "plain",
            Self::Markdown => "markdown",
            Self::Rst => "rst",
            Self::Latex => "latex",
            Self::Context => "context",
            Self::Man => "man",
            Self::Mediawiki => "mediawiki",
            Self::Textile => "textile",
            Self::Texinfo => "texinfo",
            Self::Rtf => "rtf",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Native => "Native Haskell",
            Self::Json => "JSON",
            Self::Html => "HTML Source",
            Self::Plain => "Plain text",
            Self::Markdown => "Markdown",
            Self::Rst => "reStructuredText",
            Self::Latex => "LaTeX",
            Self::Context => "ConTeXt",
            Self::Man => "man (groff man)",
            Self::Mediawiki => "MediaWiki markup",
            Self::Textile => "Textile",
            Self::Texinfo => "GNU Texinfo",
            Self::Rtf => "RTF",
        }
    }

    /// MIME type of converted output, without charset.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Native | Self::Html | Self::Plain | Self::Rst => "text/plain",
            Self::Json => "application/json",
            Self::Markdown => "text/x-web-markdown",
            Self::Latex => "application/x-latex",
            Self::Context => "text/context",
            Self::Man => "application/x-troff-man",
            Self::Mediawiki => "text/mediawiki",
            Self::Textile => "text/x-web-textile",
            Self::Texinfo => "application/x-texinfo",
            Self::Rtf => "application/rtf",
        }
    }

    /// File extension for downloads, if the format has one.
    pub fn extension(&self) -> Option<&'static str> {
        Some(match self {
            Self::Native => "o",
            Self::Json => "json",
            Self::Html => "html",
            Self::Plain | Self::Context | Self::Man | Self::Mediawiki => "txt",
            Self::Markdown => "md",
            Self::Rst => "rst",
            Self::Latex => "tex",
            Self::Textile => "textile",
            Self::Texinfo => "texi",
            Self::Rtf => "rtf",
        })
    }

    /// Case-insensitive exact lookup by identifier.
    pub fn lookup(identifier: &str) -> Result<Self, PandocError> {
        Self::ALL
            .into_iter()
            .find(|f| f.identifier().eq_ignore_ascii_case(identifier))
            .ok_or_else(|| PandocError::UnknownFormat {
                identifier: identifier.to_string(),
            })
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for OutputFormat {
    type Err = PandocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s)
    }
}
