//! Source-tree language detection.
//!
//! Manifest files decide first (they are unambiguous); otherwise the
//! dominant source extension under the tree wins.

use std::collections::HashMap;
use std::path::Path;

use walkdir::WalkDir;

use crate::fingerprint::is_excluded_dir;
use crate::model::Language;

fn has_csproj(root: &Path) -> bool {
    std::fs::read_dir(root)
        .map(|entries| {
            entries
                .flatten()
                .any(|e| e.path().extension().and_then(|x| x.to_str()) == Some("csproj"))
        })
        .unwrap_or(false)
}

/// Detect the package's language from manifests, then from source files.
pub fn detect_language(root: &Path) -> Option<Language> {
    if has_csproj(root) || root.join("global.json").exists() {
        return Some(Language::DotNet);
    }
    if root.join("go.mod").exists() {
        return Some(Language::Go);
    }
    if root.join("pyproject.toml").exists() || root.join("setup.py").exists() {
        return Some(Language::Python);
    }
    if root.join("package.json").exists() {
        return Some(Language::TypeScript);
    }
    if root.join("pom.xml").exists()
        || root.join("build.gradle").exists()
        || root.join("build.gradle.kts").exists()
    {
        return Some(Language::Java);
    }
    dominant_extension(root)
}

fn dominant_extension(root: &Path) -> Option<Language> {
    let mut counts: HashMap<Language, usize> = HashMap::new();
    let walker = WalkDir::new(root)
        .max_depth(4)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir() && e.file_name().to_str().is_some_and(is_excluded_dir))
        });
    for entry in walker.flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let language = match ext {
            "cs" => Language::DotNet,
            "py" => Language::Python,
            "ts" | "tsx" => Language::TypeScript,
            "go" => Language::Go,
            "java" => Language::Java,
            _ => continue,
        };
        *counts.entry(language).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by_key(|(language, count)| (*count, language.as_str()))
        .map(|(language, _)| language)
}
