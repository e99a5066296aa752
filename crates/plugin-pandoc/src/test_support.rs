//! Helpers for tests that need a converter executable.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Answers `-v` and `-h` like pandoc 1.x; anything else runs `$CONVERT`.
pub const PANDOC_PROBE_PREAMBLE: &str = r#"case "$1" in
  -v)
    echo "pandoc 1.9.4.2"
    echo "Compiled with citeproc-hs 0.3.4, texmath 0.6.0.6, highlighting-kate 0.5.1."
    exit 0
    ;;
  -h)
    echo "pandoc [OPTIONS] [FILES]"
    echo "Input formats:  native, json, markdown, markdown+lhs, textile, rst, rst+lhs,"
    echo "                html, latex, latex+lhs"
    echo "Output formats: native, json, html, html5, html+lhs, s5, slidy, docbook,"
    echo "                latex, context, texinfo, man, markdown, plain, rst,"
    echo "                mediawiki, textile, rtf, org, asciidoc, odt, docx, epub"
    echo "Options:"
    echo "  -f FORMAT, -r FORMAT  --from=FORMAT, --read=FORMAT"
    exit 0
    ;;
esac
"#;

/// Write an executable `/bin/sh` script named `pandoc` into `dir`.
pub fn fake_converter(dir: &Path, body: &str) -> PathBuf {
    write_script(dir, "pandoc", &format!("#!/bin/sh\n{body}\n"))
}

/// A fake converter that probes like pandoc 1.9 and converts by
/// prefixing the target flag to its input.
pub fn fake_pandoc(dir: &Path) -> PathBuf {
    let script = format!(
        "#!/bin/sh\n{PANDOC_PROBE_PREAMBLE}for last; do :; done\nprintf '%s\\n' \"$last\"\ncat\n"
    );
    write_script(dir, "pandoc", &script)
}

fn write_script(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fake converter");
    let mut perms = std::fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod fake converter");
    path
}
