//! Turning a conversion outcome into response headers and bytes.

use std::fmt;

use axum::body::Body;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

use crate::formats::OutputFormat;
use crate::pipeline::ConversionOutcome;

/// How a browser should present the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispositionKind {
    /// Display in the browser.
    Inline,
    /// Offer as a download.
    Attachment,
}

/// `Content-Disposition` header value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentDisposition {
    /// Inline or attachment.
    pub kind: DispositionKind,
    /// Suggested file name.
    pub filename: String,
}

impl fmt::Display for ContentDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DispositionKind::Inline => "inline",
            DispositionKind::Attachment => "attachment",
        };
        write!(f, "{kind}; filename=\"{}\"", self.filename)
    }
}

/// Download file name: template base name plus the format's extension.
///
/// Characters that cannot appear inside a quoted header parameter are
/// replaced with `_`.
pub fn attachment_filename(base: &str, extension: Option<&str>) -> String {
    let clean: String = base
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match extension {
        Some(ext) => format!("{clean}.{ext}"),
        None => clean,
    }
}

/// A rendered, possibly converted, document ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    /// Document bytes.
    pub body: Bytes,
    /// Content type including charset.
    pub content_type: String,
    /// Disposition, present only when the converter produced the body.
    pub disposition: Option<ContentDisposition>,
    /// Format the body is in, `None` for HTML fallback.
    pub format: Option<OutputFormat>,
}

impl RenderedDocument {
    /// Build the document for `outcome` rendered from template `base_name`.
    pub fn from_outcome(outcome: ConversionOutcome, base_name: &str, attachment: bool) -> Self {
        let content_type = outcome.content_type();
        match outcome {
            ConversionOutcome::Converted { body, format } => Self {
                body,
                content_type,
                disposition: Some(ContentDisposition {
                    kind: if attachment {
                        DispositionKind::Attachment
                    } else {
                        DispositionKind::Inline
                    },
                    filename: attachment_filename(base_name, format.extension()),
                }),
                format: Some(format),
            },
            ConversionOutcome::Fallback { body } => Self {
                body,
                content_type,
                disposition: None,
                format: None,
            },
        }
    }

    /// Whether the body came from the converter.
    pub fn is_converted(&self) -> bool {
        self.format.is_some()
    }

    /// Set response headers.
    ///
    /// `Content-Disposition` is always set when present; `Content-Type` is
    /// left alone if the caller already set one.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        if let Some(disposition) = &self.disposition {
            match HeaderValue::from_str(&disposition.to_string()) {
                Ok(value) => {
                    headers.insert(CONTENT_DISPOSITION, value);
                }
                Err(e) => warn!(
                    filename = %disposition.filename,
                    error = %e,
                    "Dropping Content-Disposition with unencodable file name"
                ),
            }
        }

        if !headers.contains_key(CONTENT_TYPE) {
            if let Ok(value) = HeaderValue::from_str(&self.content_type) {
                headers.insert(CONTENT_TYPE, value);
            }
        }
    }

    /// Write the body to `out` and flush. Returns the number of bytes written.
    pub async fn write_to<W>(&self, out: &mut W) -> std::io::Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        out.write_all(&self.body).await?;
        out.flush().await?;
        Ok(self.body.len() as u64)
    }
}

impl IntoResponse for RenderedDocument {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        self.apply_headers(&mut headers);
        let mut response = Response::new(Body::from(self.body));
        *response.headers_mut() = headers;
        response
    }
}
