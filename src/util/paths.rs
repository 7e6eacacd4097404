//! Path helpers for group-relative artifact locations.

use std::path::{Path, PathBuf};

/// Express `path` relative to `base`, falling back to the path unchanged
/// when no relative form exists (mixed absolute/relative inputs, different
/// drive prefixes on Windows).
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}
