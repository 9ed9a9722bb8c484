//! HTML dumps of pages where no product card matched, kept for selector
//! debugging.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::StoreError;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W+").expect("valid non-word regex"));

const MAX_SAFE_NAME_CHARS: usize = 30;

/// `debug_<safe>.html`, where `<safe>` is `site_name` with every run of
/// non-word characters replaced by `_`, cut to 30 characters.
#[must_use]
pub fn diagnostic_file_name(site_name: &str) -> String {
    let safe: String = NON_WORD
        .replace_all(site_name, "_")
        .chars()
        .take(MAX_SAFE_NAME_CHARS)
        .collect();
    format!("debug_{safe}.html")
}

/// Writes `html` to the site's diagnostic file under `out_dir`, replacing
/// any earlier dump for the same site.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the directory or file cannot be written.
pub fn write_diagnostic_html(
    out_dir: &Path,
    site_name: &str,
    html: &str,
) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(out_dir).map_err(|e| StoreError::io(out_dir, e))?;
    let path = out_dir.join(diagnostic_file_name(site_name));
    fs::write(&path, html).map_err(|e| StoreError::io(&path, e))?;
    Ok(path)
}
