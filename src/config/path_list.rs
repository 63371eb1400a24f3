//! Path list loading
//!
//! A path list is a text file with one source identifier per line.

use crate::{ReadBenchError, Result};
use std::fs;
use std::path::Path;

/// Load source identifiers from a path list file
///
/// Surrounding whitespace is trimmed; blank lines and `#` comments are
/// skipped. A missing file or a list with no sources is a configuration
/// error, raised before any source is opened.
pub fn load_path_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| {
        ReadBenchError::Config(format!(
            "Failed to read path list {}: {}",
            path.display(),
            e
        ))
    })?;

    let sources = parse_path_list(&content);
    if sources.is_empty() {
        return Err(ReadBenchError::Config(format!(
            "Path list {} contains no sources",
            path.display()
        )));
    }

    Ok(sources)
}

/// Parse path list content; order is preserved and duplicates are kept
pub fn parse_path_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
