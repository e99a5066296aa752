//! Converter capability discovery.
//!
//! Probing runs once at plugin load. The result is an immutable
//! [`ConverterCapabilities`] snapshot that is shared by reference with the
//! conversion pipeline; nothing mutates it afterwards.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::PandocError;
use crate::executor::ConverterExecutor;
use crate::formats::OutputFormat;

static VERSION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+) (\d+.*)$").expect("valid version regex"));

static OUTPUT_FORMATS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Output formats:\s*(.+)$").expect("valid formats regex"));

static LIST_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*").expect("valid separator regex"));

/// What the installed converter can do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConverterCapabilities {
    /// Whether the converter ran and reported a version.
    pub available: bool,
    /// Program name from the version banner.
    pub name: Option<String>,
    /// Version string from the version banner.
    pub version: Option<String>,
    /// Catalog formats the converter reported as output formats.
    pub supported: BTreeSet<OutputFormat>,
}

impl ConverterCapabilities {
    /// Snapshot for a missing or broken converter.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            name: None,
            version: None,
            supported: BTreeSet::new(),
        }
    }

    /// An available converter supporting exactly `formats`.
    pub fn with_formats(version: impl Into<String>, formats: impl IntoIterator<Item = OutputFormat>) -> Self {
        Self {
            available: true,
            name: Some("pandoc".to_string()),
            version: Some(version.into()),
            supported: formats.into_iter().collect(),
        }
    }

    /// Whether `format` can be produced by the converter.
    pub fn supports(&self, format: OutputFormat) -> bool {
        self.available && self.supported.contains(&format)
    }

    /// The whole catalog, each entry flagged with converter support.
    pub fn catalog(&self) -> Vec<FormatSupport> {
        OutputFormat::ALL
            .into_iter()
            .map(|format| FormatSupport {
                identifier: format.identifier(),
                name: format.display_name(),
                mime_type: format.mime_type(),
                extension: format.extension(),
                supported: self.supports(format),
            })
            .collect()
    }
}

/// One catalog entry as reported to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatSupport {
    pub identifier: &'static str,
    pub name: &'static str,
    pub mime_type: &'static str,
    pub extension: Option<&'static str>,
    /// Whether the installed converter can produce this format.
    pub supported: bool,
}

impl fmt::Display for ConverterCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.available {
            return f.write_str("converter unavailable");
        }
        write!(
            f,
            "{} {} ({} formats)",
            self.name.as_deref().unwrap_or("converter"),
            self.version.as_deref().unwrap_or("?"),
            self.supported.len()
        )
    }
}

/// Produces a capability snapshot.
#[async_trait]
pub trait Prober: Send + Sync + fmt::Debug {
    /// Probe the converter. Never fails; problems yield an unavailable snapshot.
    async fn probe(&self) -> ConverterCapabilities;
}

/// A prober that returns a fixed snapshot.
#[derive(Debug, Clone)]
pub struct StaticProber(pub ConverterCapabilities);

#[async_trait]
impl Prober for StaticProber {
    async fn probe(&self) -> ConverterCapabilities {
        self.0.clone()
    }
}

/// Probes the converter by running `-v` and `-h`.
#[derive(Debug, Clone)]
pub struct CapabilityProber {
    executor: ConverterExecutor,
    timeout: Duration,
}

impl CapabilityProber {
    /// Create a prober for `executable` with a per-invocation timeout.
    pub fn new(executable: impl Into<String>, timeout: Duration) -> Self {
        Self {
            executor: ConverterExecutor::new(executable),
            timeout,
        }
    }

    async fn run(&self, flag: &str) -> Result<String, PandocError> {
        let output = self
            .executor
            .run(&[flag.to_string()], None, self.timeout, &CancellationToken::new())
            .await?;
        output.check_status()?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn detect_formats(&self) -> Result<Vec<String>, PandocError> {
        let help = self.run("-h").await?;
        if let Some(formats) = parse_output_formats(&help) {
            return Ok(formats);
        }

        // Newer converters dropped the summary line from `-h`.
        debug!("No output format line in help text, asking for the format list");
        let list = self.run("--list-output-formats").await?;
        Ok(parse_format_list(&list))
    }
}

#[async_trait]
impl Prober for CapabilityProber {
    async fn probe(&self) -> ConverterCapabilities {
        let executable = self.executor.executable();
        debug!(executable = %executable, "Checking for converter support");

        let banner = match self.run("-v").await {
            Ok(banner) => banner,
            Err(PandocError::ConverterNotFound { .. }) => {
                warn!(
                    executable = %executable,
                    "Converter not found; documents will be rendered as HTML. \
                     See https://pandoc.org/installing.html"
                );
                return ConverterCapabilities::unavailable();
            }
            Err(e) => {
                warn!(executable = %executable, error = %e, "Converter version check failed");
                return ConverterCapabilities::unavailable();
            }
        };

        let Some((name, version)) = banner.lines().next().and_then(parse_version_line) else {
            warn!(
                executable = %executable,
                banner = %banner.lines().next().unwrap_or_default(),
                "Converter ran but its version could not be determined"
            );
            return ConverterCapabilities::unavailable();
        };

        let detected = match self.detect_formats().await {
            Ok(detected) => detected,
            Err(e) => {
                warn!(
                    executable = %executable,
                    version = %version,
                    error = %e,
                    "Unable to determine formats supported by the converter"
                );
                return ConverterCapabilities::unavailable();
            }
        };

        let supported = intersect_catalog(&detected, &version);
        let capabilities = ConverterCapabilities {
            available: true,
            name: Some(name),
            version: Some(version),
            supported,
        };

        info!(capabilities = %capabilities, "Converter detected");
        capabilities
    }
}

/// Split a version banner line into `(name, version)`.
pub fn parse_version_line(line: &str) -> Option<(String, String)> {
    let caps = VERSION_LINE.captures(line.trim_end())?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

/// Extract the comma-separated list from an `Output formats:` line.
///
/// pandoc 1.x wraps long lists onto indented continuation lines, which
/// are joined onto the first line before splitting.
pub fn parse_output_formats(help: &str) -> Option<Vec<String>> {
    let mut lines = help.lines();
    let mut joined = lines.by_ref().find_map(|line| {
        OUTPUT_FORMATS_LINE
            .captures(line.trim_end())
            .map(|caps| caps[1].trim().to_string())
    })?;

    let continuation = |line: &&str| line.starts_with(char::is_whitespace) && !line.trim().is_empty();
    for line in lines.take_while(continuation) {
        joined.push(' ');
        joined.push_str(line.trim());
    }

    Some(
        LIST_SEPARATOR
            .split(&joined)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// One identifier per line, as printed by `--list-output-formats`.
pub fn parse_format_list(list: &str) -> Vec<String> {
    list.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keep the catalog entries that appear in `detected`.
fn intersect_catalog(detected: &[String], version: &str) -> BTreeSet<OutputFormat> {
    OutputFormat::ALL
        .into_iter()
        .filter(|format| {
            let found = detected.iter().any(|id| id == format.identifier());
            if !found {
                warn!(
                    format = %format,
                    version = %version,
                    "Output format is known to the plugin but not supported by the installed converter"
                );
            }
            found
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_flags() {
        let caps = ConverterCapabilities::with_formats("1.9", [OutputFormat::Rtf]);
        let catalog = caps.catalog();
        assert_eq!(catalog.len(), OutputFormat::ALL.len());

        let rtf = catalog.iter().find(|f| f.identifier == "rtf").unwrap();
        assert!(rtf.supported);
        assert_eq!(rtf.extension, Some("rtf"));
        assert_eq!(catalog.iter().filter(|f| f.supported).count(), 1);

        let none = ConverterCapabilities::unavailable().catalog();
        assert!(none.iter().all(|f| !f.supported));
    }

    #[test]
    fn test_parse_version_line() {
        assert_eq!(
            parse_version_line("pandoc 1.9.4.2"),
            Some(("pandoc".to_string(), "1.9.4.2".to_string()))
        );
        assert_eq!(
            parse_version_line("pandoc.exe 3.1.11\r"),
            Some(("pandoc.exe".to_string(), "3.1.11".to_string()))
        );
        assert_eq!(parse_version_line("pandoc"), None);
        assert_eq!(parse_version_line("pandoc version unknown"), None);
        assert_eq!(parse_version_line(""), None);
    }

    #[test]
    fn test_parse_output_formats() {
        let help = "pandoc [OPTIONS] [FILES]\n\
                    Input formats:  native, markdown, html\n\
                    Output formats: native, json,html, latex,  rtf\n\
                    Options:\n";
        assert_eq!(
            parse_output_formats(help),
            Some(vec![
                "native".to_string(),
                "json".to_string(),
                "html".to_string(),
                "latex".to_string(),
                "rtf".to_string(),
            ])
        );
        assert_eq!(parse_output_formats("Usage: pandoc [OPTIONS]\n"), None);
    }

    #[test]
    fn test_parse_wrapped_output_formats() {
        let help = r#"pandoc [OPTIONS] [FILES]
Input formats:  native, json, markdown, markdown+lhs, textile, rst, rst+lhs,
                html, latex, latex+lhs
Output formats: native, json, html, html5, html+lhs, html5+lhs, s5, slidy,
                slideous, dzslides, docbook, opendocument, latex, latex+lhs,
                beamer, beamer+lhs, context, texinfo, man, markdown,
                markdown+lhs, plain, rst, rst+lhs, mediawiki, textile, rtf, org,
                asciidoc, odt, docx, epub
Options:
  -f FORMAT, -r FORMAT  --from=FORMAT, --read=FORMAT
"#;

        let detected = parse_output_formats(help).unwrap();
        assert_eq!(detected.first().map(String::as_str), Some("native"));
        assert_eq!(detected.last().map(String::as_str), Some("epub"));
        assert!(!detected.iter().any(|id| id.is_empty() || id.contains(' ')));
        assert!(!detected.iter().any(|id| id.starts_with('-')));

        let supported = intersect_catalog(&detected, "1.9.4.2");
        assert_eq!(supported.len(), OutputFormat::ALL.len());
        for format in [
            OutputFormat::Latex,
            OutputFormat::Rtf,
            OutputFormat::Man,
            OutputFormat::Markdown,
            OutputFormat::Plain,
            OutputFormat::Texinfo,
        ] {
            assert!(supported.contains(&format), "{format:?} missing");
        }
    }

    #[test]
    fn test_parse_format_list() {
        let list = "asciidoc\nlatex\n\nman\n  rtf  \n";
        assert_eq!(parse_format_list(list), vec!["asciidoc", "latex", "man", "rtf"]);
    }

    #[test]
    fn test_intersect_catalog_skips_unknown_and_missing() {
        let detected: Vec<String> = ["html5", "latex", "rtf", "s5"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let supported = intersect_catalog(&detected, "1.9");
        assert_eq!(
            supported.into_iter().collect::<Vec<_>>(),
            vec![OutputFormat::Latex, OutputFormat::Rtf]
        );
    }

    #[test]
    fn test_supports_requires_availability() {
        let mut caps = ConverterCapabilities::with_formats("2.0", [OutputFormat::Latex]);
        assert!(caps.supports(OutputFormat::Latex));
        assert!(!caps.supports(OutputFormat::Rtf));

        caps.available = false;
        assert!(!caps.supports(OutputFormat::Latex));
        assert!(!ConverterCapabilities::unavailable().supports(OutputFormat::Html));
    }

    #[tokio::test]
    async fn test_missing_executable_is_unavailable() {
        let prober = CapabilityProber::new("/nonexistent/docserve/pandoc", Duration::from_secs(2));
        let caps = prober.probe().await;
        assert!(!caps.available);
        assert!(caps.supported.is_empty());
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use crate::test_support::{PANDOC_PROBE_PREAMBLE, fake_converter, fake_pandoc};

        #[tokio::test]
        async fn test_probe_fake_pandoc() {
            let dir = tempfile::tempdir().unwrap();
            let exe = fake_pandoc(dir.path());
            let caps = CapabilityProber::new(exe.to_string_lossy(), Duration::from_secs(5))
                .probe()
                .await;

            assert!(caps.available);
            assert_eq!(caps.name.as_deref(), Some("pandoc"));
            assert_eq!(caps.version.as_deref(), Some("1.9.4.2"));
            let expected: BTreeSet<OutputFormat> = OutputFormat::ALL.into_iter().collect();
            assert_eq!(caps.supported, expected);
        }

        #[tokio::test]
        async fn test_probe_falls_back_to_format_list() {
            let dir = tempfile::tempdir().unwrap();
            let exe = fake_converter(
                dir.path(),
                r#"case "$1" in
  -v) echo "pandoc 3.1.11"; exit 0 ;;
  -h) echo "Usage: pandoc [OPTIONS] [FILES]"; exit 0 ;;
  --list-output-formats) printf 'asciidoc\nlatex\nmarkdown\nrtf\n'; exit 0 ;;
esac
exit 1"#,
            );
            let caps = CapabilityProber::new(exe.to_string_lossy(), Duration::from_secs(5))
                .probe()
                .await;

            assert!(caps.available);
            assert_eq!(caps.version.as_deref(), Some("3.1.11"));
            assert!(caps.supports(OutputFormat::Latex));
            assert!(caps.supports(OutputFormat::Markdown));
            assert!(!caps.supports(OutputFormat::Man));
        }

        #[tokio::test]
        async fn test_unparsable_version_is_unavailable() {
            let dir = tempfile::tempdir().unwrap();
            let exe = fake_converter(dir.path(), "echo 'something else entirely'");
            let caps = CapabilityProber::new(exe.to_string_lossy(), Duration::from_secs(5))
                .probe()
                .await;
            assert_eq!(caps, ConverterCapabilities::unavailable());
        }

        #[tokio::test]
        async fn test_hanging_probe_times_out() {
            let dir = tempfile::tempdir().unwrap();
            let exe = fake_converter(dir.path(), "exec sleep 30");
            let start = std::time::Instant::now();
            let caps = CapabilityProber::new(exe.to_string_lossy(), Duration::from_millis(200))
                .probe()
                .await;
            assert!(!caps.available);
            assert!(start.elapsed() < Duration::from_secs(5));
        }

        #[tokio::test]
        async fn test_missing_format_line_and_list_is_unavailable() {
            let dir = tempfile::tempdir().unwrap();
            let script = format!("{PANDOC_PROBE_PREAMBLE}exit 2");
            // -h succeeds via the preamble, so force the format line away.
            let script = script.replace("Output formats:", "Writers:");
            let exe = fake_converter(dir.path(), &script);
            let caps = CapabilityProber::new(exe.to_string_lossy(), Duration::from_secs(5))
                .probe()
                .await;
            assert!(!caps.available);
        }
    }
}
