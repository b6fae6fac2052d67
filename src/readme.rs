//! Splicing generated Markdown into marker regions of a README.
//!
//! A region looks like:
//!
//! ```text
//! <!-- STATS:START -->
//! ...generated content...
//! <!-- STATS:END -->
//! ```
//!
//! Everything between the two comments is replaced, and the comments are
//! written back around the new content. Text outside a region is never
//! touched. A README missing a region is left as-is for that region.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::{NoExpand, Regex};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::render::Fragments;

static STATS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!-- STATS:START -->.*?<!-- STATS:END -->").expect("valid regex")
});
static NOTABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!-- NOTABLE:START -->.*?<!-- NOTABLE:END -->").expect("valid regex")
});
static UPDATED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!-- UPDATED:START -->.*?<!-- UPDATED:END -->").expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Stats,
    Notable,
    Updated,
}

impl Marker {
    pub const ALL: [Marker; 3] = [Marker::Stats, Marker::Notable, Marker::Updated];

    pub fn name(self) -> &'static str {
        match self {
            Marker::Stats => "STATS",
            Marker::Notable => "NOTABLE",
            Marker::Updated => "UPDATED",
        }
    }

    pub fn start(self) -> String {
        format!("<!-- {}:START -->", self.name())
    }

    pub fn end(self) -> String {
        format!("<!-- {}:END -->", self.name())
    }

    /// Start comment, shortest run of anything, end comment.
    fn pattern(self) -> &'static Regex {
        match self {
            Marker::Stats => &*STATS_RE,
            Marker::Notable => &*NOTABLE_RE,
            Marker::Updated => &*UPDATED_RE,
        }
    }
}

/// Replace the `marker` region(s) of `content` with `fragment`.
///
/// Returns `None` when `content` has no complete marker pair.
pub fn patch_region(content: &str, marker: Marker, fragment: &str) -> Option<String> {
    let re = marker.pattern();
    if !re.is_match(content) {
        return None;
    }
    let replacement = format!("{}\n{fragment}\n{}", marker.start(), marker.end());
    Some(re.replace_all(content, NoExpand(&replacement)).into_owned())
}

/// Result of patching a README in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patched {
    pub content: String,
    pub missing: Vec<Marker>,
}

/// Apply all three fragments to one copy of `content`.
pub fn patch_readme(content: &str, fragments: &Fragments) -> Patched {
    let mut content = content.to_string();
    let mut missing = Vec::new();

    for marker in Marker::ALL {
        let fragment = match marker {
            Marker::Stats => &fragments.stats,
            Marker::Notable => &fragments.notable,
            Marker::Updated => &fragments.updated,
        };
        match patch_region(&content, marker, fragment) {
            Some(next) => content = next,
            None => missing.push(marker),
        }
    }

    Patched { content, missing }
}

/// Rewrite the README at `path` in place. Returns whether the file changed.
pub fn update_readme(path: &Path, fragments: &Fragments) -> Result<bool> {
    let original = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let patched = patch_readme(&original, fragments);
    for marker in &patched.missing {
        warn!(
            marker = marker.name(),
            "{} has no {} ... {} pair; leaving that region unchanged",
            path.display(),
            marker.start(),
            marker.end()
        );
    }

    if patched.content == original {
        info!("{} already up to date", path.display());
        return Ok(false);
    }

    write_atomic(path, &patched.content)?;
    Ok(true)
}

/// Write through a temp file in the same directory, then rename over `path`.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    // The temp file starts out 0600; carry over the README's own mode.
    let permissions = fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .permissions();

    let mut tmp = NamedTempFile::new_in(&dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.as_file()
        .set_permissions(permissions)
        .context("Failed to copy README permissions")?;
    tmp.write_all(content.as_bytes())
        .context("Failed to write README contents")?;
    tmp.as_file()
        .sync_all()
        .context("Failed to flush README contents")?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
