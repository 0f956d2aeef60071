//! Proposal document discovery.

use std::fs;
use std::io;
use std::path::Path;

/// A proposal listed in the navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalDoc {
    /// Human-readable nav title
    pub title: String,

    /// Path relative to the docs directory, always `/`-separated
    pub path: String,
}

/// Derive a nav title from a filename stem.
///
/// Underscores and hyphens become spaces; letter case is left alone.
pub fn proposal_title(stem: &str) -> String {
    stem.replace(['_', '-'], " ").trim().to_string()
}

/// List the Markdown proposals directly inside `dir`.
///
/// `reserved` is skipped regardless of case. Results are ordered by
/// lowercased filename. `nav_prefix` is joined in front of each filename to
/// form the nav path.
pub fn discover_proposals(
    dir: &Path,
    reserved: &str,
    nav_prefix: &str,
) -> io::Result<Vec<ProposalDoc>> {
    let mut files: Vec<String> = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if ext != "md" {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!("Skipping proposal with non UTF-8 name: {}", path.display());
            continue;
        };

        if name.eq_ignore_ascii_case(reserved) {
            continue;
        }

        files.push(name.to_string());
    }

    files.sort_by_key(|name| name.to_lowercase());

    Ok(files
        .into_iter()
        .map(|name| {
            let stem = Path::new(&name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(&name)
                .to_string();
            ProposalDoc {
                title: proposal_title(&stem),
                path: format!("{}/{}", nav_prefix.trim_end_matches('/'), name),
            }
        })
        .collect())
}
