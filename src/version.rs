//! Package version and name detection from manifests, plus lenient semver
//! parsing for version sorts.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;

use crate::model::Language;

/// Parse a version string leniently: tolerates a leading `v`, pads missing
/// minor/patch components, and keeps any pre-release tag.
pub fn parse_semver(text: &str) -> Option<Version> {
    let trimmed = text.trim().trim_start_matches('v');
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(v) = Version::parse(trimmed) {
        return Some(v);
    }
    // Split off pre-release/build metadata before padding.
    let (core, rest) = match trimmed.find(['-', '+']) {
        Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
        None => (trimmed, ""),
    };
    let dots = core.matches('.').count();
    let padded = match dots {
        0 => format!("{}.0.0{}", core, rest),
        1 => format!("{}.0{}", core, rest),
        _ => return None,
    };
    Version::parse(&padded).ok()
}

/// Sort version strings descending by parsed version. Unparseable entries
/// sink to the end, keeping their relative order.
pub fn sort_versions_desc(versions: &mut [String]) {
    versions.sort_by(|a, b| match (parse_semver(a), parse_semver(b)) {
        (Some(va), Some(vb)) => vb.cmp(&va),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Package name and version detected from a source tree's manifest files.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageMeta {
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Detect package metadata for `language` under `root`. Absent or
/// unparseable manifests yield empty fields, never an error.
pub fn detect_package_meta(root: &Path, language: Language) -> PackageMeta {
    match language {
        Language::DotNet => detect_dotnet(root),
        Language::Python => detect_python(root),
        Language::TypeScript => detect_typescript(root),
        Language::Go => detect_go(root),
        Language::Java => detect_java(root),
    }
}

fn read(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}

fn regex_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn detect_dotnet(root: &Path) -> PackageMeta {
    static VERSION_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"<(?:Package)?Version>([^<]+)</(?:Package)?Version>").unwrap());
    static ID_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"<PackageId>([^<]+)</PackageId>").unwrap());

    let mut meta = PackageMeta::default();
    let entries = match std::fs::read_dir(root) {
        Ok(e) => e,
        Err(_) => return meta,
    };
    let mut csprojs: Vec<std::path::PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("csproj"))
        .collect();
    csprojs.sort();
    for csproj in csprojs {
        let Some(content) = read(&csproj) else { continue };
        if meta.version.is_none() {
            meta.version = regex_capture(&VERSION_RE, &content);
        }
        if meta.name.is_none() {
            meta.name = regex_capture(&ID_RE, &content).or_else(|| {
                csproj
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            });
        }
        if meta.name.is_some() && meta.version.is_some() {
            break;
        }
    }
    meta
}

fn detect_python(root: &Path) -> PackageMeta {
    let mut meta = PackageMeta::default();
    if let Some(content) = read(&root.join("pyproject.toml")) {
        if let Ok(doc) = content.parse::<toml::Table>() {
            if let Some(project) = doc.get("project").and_then(|v| v.as_table()) {
                meta.name = project
                    .get("name")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                meta.version = project
                    .get("version")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
            }
        }
    }
    if meta.version.is_none() {
        static SETUP_VERSION_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r#"version\s*=\s*["']([^"']+)["']"#).unwrap());
        if let Some(content) = read(&root.join("setup.py")) {
            meta.version = regex_capture(&SETUP_VERSION_RE, &content);
        }
    }
    meta
}

fn detect_typescript(root: &Path) -> PackageMeta {
    let mut meta = PackageMeta::default();
    if let Some(content) = read(&root.join("package.json")) {
        if let Ok(doc) = serde_json::from_str::<serde_json::Value>(&content) {
            meta.name = doc
                .get("name")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            meta.version = doc
                .get("version")
                .and_then(|v| v.as_str())
                .map(str::to_string);
        }
    }
    meta
}

fn detect_go(root: &Path) -> PackageMeta {
    let mut meta = PackageMeta::default();
    if let Some(content) = read(&root.join("go.mod")) {
        for line in content.lines() {
            let trimmed = line.trim();
            if let Some(module) = trimmed.strip_prefix("module ") {
                let module = module.trim().trim_matches('"');
                meta.name = Some(module.to_string());
                // A /vN suffix is the only version hint go.mod carries.
                if let Some(last) = module.rsplit('/').next() {
                    if let Some(major) = last.strip_prefix('v') {
                        if major.chars().all(|c| c.is_ascii_digit()) && !major.is_empty() {
                            meta.version = Some(format!("{}.0.0", major));
                        }
                    }
                }
                break;
            }
        }
    }
    meta
}

fn detect_java(root: &Path) -> PackageMeta {
    static ARTIFACT_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"<artifactId>([^<]+)</artifactId>").unwrap());
    static VERSION_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"<version>([^<]+)</version>").unwrap());
    static GRADLE_VERSION_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"(?m)^\s*version\s*=?\s*["']([^"']+)["']"#).unwrap());
    static GRADLE_NAME_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"rootProject\.name\s*=\s*["']([^"']+)["']"#).unwrap());

    let mut meta = PackageMeta::default();
    if let Some(content) = read(&root.join("pom.xml")) {
        // Skip the <parent> block so we read the project's own coordinates.
        let own = match content.find("</parent>") {
            Some(idx) => &content[idx..],
            None => content.as_str(),
        };
        meta.name = regex_capture(&ARTIFACT_RE, own);
        meta.version = regex_capture(&VERSION_RE, own);
        return meta;
    }
    if let Some(content) = read(&root.join("build.gradle"))
        .or_else(|| read(&root.join("build.gradle.kts")))
    {
        meta.version = regex_capture(&GRADLE_VERSION_RE, &content);
        meta.name = read(&root.join("settings.gradle"))
            .or_else(|| read(&root.join("settings.gradle.kts")))
            .and_then(|settings| regex_capture(&GRADLE_NAME_RE, &settings));
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn sorts_parsed_versions_descending() {
        let mut versions = vec![
            "9.0.0".to_string(),
            "10.0.0".to_string(),
            "1.2.3".to_string(),
            "2.0.0-preview.1".to_string(),
        ];
        sort_versions_desc(&mut versions);
        assert_eq!(versions, vec!["10.0.0", "9.0.0", "2.0.0-preview.1", "1.2.3"]);
    }

    #[test]
    fn lenient_parse_pads_and_strips_v() {
        assert_eq!(parse_semver("v2").unwrap().to_string(), "2.0.0");
        assert_eq!(parse_semver("1.4").unwrap().to_string(), "1.4.0");
        assert!(parse_semver("not-a-version").is_none());
        assert!(parse_semver("").is_none());
    }

    #[test]
    fn prerelease_sorts_below_release() {
        let a = parse_semver("2.0.0-preview.1").unwrap();
        let b = parse_semver("2.0.0").unwrap();
        assert!(a < b);
    }

    #[test]
    fn detects_python_pyproject() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"azure-widgets\"\nversion = \"1.2.3\"\n",
        )
        .unwrap();
        let meta = detect_package_meta(dir.path(), Language::Python);
        assert_eq!(meta.name.as_deref(), Some("azure-widgets"));
        assert_eq!(meta.version.as_deref(), Some("1.2.3"));
    }

    #[test]
    fn detects_typescript_package_json() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"name": "@acme/widgets", "version": "4.5.6"}"#,
        )
        .unwrap();
        let meta = detect_package_meta(dir.path(), Language::TypeScript);
        assert_eq!(meta.name.as_deref(), Some("@acme/widgets"));
        assert_eq!(meta.version.as_deref(), Some("4.5.6"));
    }

    #[test]
    fn detects_go_module_and_major_hint() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("go.mod"),
            "module github.com/acme/widgets/v3\n\ngo 1.22\n",
        )
        .unwrap();
        let meta = detect_package_meta(dir.path(), Language::Go);
        assert_eq!(meta.name.as_deref(), Some("github.com/acme/widgets/v3"));
        assert_eq!(meta.version.as_deref(), Some("3.0.0"));
    }

    #[test]
    fn detects_csproj_version() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Acme.Widgets.csproj"),
            "<Project><PropertyGroup><Version>7.8.9</Version></PropertyGroup></Project>",
        )
        .unwrap();
        let meta = detect_package_meta(dir.path(), Language::DotNet);
        assert_eq!(meta.name.as_deref(), Some("Acme.Widgets"));
        assert_eq!(meta.version.as_deref(), Some("7.8.9"));
    }

    #[test]
    fn detects_pom_outside_parent_block() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("pom.xml"),
            "<project><parent><artifactId>base</artifactId><version>0.1</version></parent>\
             <artifactId>acme-widgets</artifactId><version>2.0.0</version></project>",
        )
        .unwrap();
        let meta = detect_package_meta(dir.path(), Language::Java);
        assert_eq!(meta.name.as_deref(), Some("acme-widgets"));
        assert_eq!(meta.version.as_deref(), Some("2.0.0"));
    }

    #[test]
    fn missing_manifests_yield_empty_meta() {
        let dir = TempDir::new().unwrap();
        assert_eq!(detect_package_meta(dir.path(), Language::Java), PackageMeta::default());
    }
}
