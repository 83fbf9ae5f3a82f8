//! Content-addressed directory fingerprinting.
//!
//! The extraction cache keys on a digest of every covered source file's
//! `(relative_path, size, mtime)` triple. Hashing metadata instead of file
//! contents keeps invalidation cheap while still changing on any add, remove,
//! or edit that touches a covered file.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// Directory names pruned from every traversal (fingerprint and usage scan).
pub const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "vendor",
    "bin",
    "obj",
    "target",
    ".venv",
];

pub(crate) fn is_excluded_dir(name: &str) -> bool {
    EXCLUDED_DIRS.contains(&name)
}

/// Compute a lowercase hex fingerprint over files under `root` whose
/// extension matches `extensions` (entries accepted with or without a
/// leading dot). A missing directory yields the empty string.
pub fn compute_fingerprint(root: &Path, extensions: &[&str]) -> String {
    if !root.is_dir() {
        return String::new();
    }

    let wanted: BTreeSet<String> = extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
        .collect();

    let mut hasher = Sha256::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir()
                && e.file_name()
                    .to_str()
                    .is_some_and(|name| is_excluded_dir(name)))
        });

    for entry in walker.flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let ext = match entry.path().extension().and_then(|e| e.to_str()) {
            Some(e) => e.to_ascii_lowercase(),
            None => continue,
        };
        if !wanted.contains(&ext) {
            continue;
        }
        let meta = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        let mtime_ms = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis())
            .unwrap_or(0);

        hasher.update(relative.as_bytes());
        hasher.update(b"\n");
        hasher.update(meta.len().to_le_bytes());
        hasher.update(mtime_ms.to_le_bytes());
    }

    format!("{:x}", hasher.finalize())
}
