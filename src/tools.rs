//! Executable resolution for external analyzer tooling.
//!
//! Order of attempts: `SDK_CHAT_{TOOL}_PATH` environment override, then each
//! candidate name on PATH. A candidate only counts when it answers the
//! validation invocation with exit code 0.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

/// Directories considered standard installation locations. Tools resolved
/// elsewhere still work but carry a non-fatal warning.
pub const STANDARD_LOCATIONS: &[&str] = &[
    "/bin",
    "/sbin",
    "/usr/bin",
    "/usr/sbin",
    "/usr/local/bin",
    "/opt",
    "/usr/lib",
    "C:\\Program Files",
    "C:\\Program Files (x86)",
    "C:\\Windows",
];

/// Outcome of the detailed resolution variant.
#[derive(Clone, Debug)]
pub struct ResolvedTool {
    /// Command usable as-is (override path or bare candidate name).
    pub command: String,
    /// Absolute location reported by `which`/`where`, when determinable.
    pub absolute_path: Option<PathBuf>,
    /// Non-fatal warning (non-standard location).
    pub warning: Option<String>,
}

/// Detailed resolution result: the tool (if any) plus warnings gathered on
/// the way, including an invalid environment override.
#[derive(Clone, Debug, Default)]
pub struct ToolResolution {
    pub tool: Option<ResolvedTool>,
    pub warnings: Vec<String>,
}

pub(crate) fn override_var_name(tool_name: &str) -> String {
    let upper: String = tool_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("SDK_CHAT_{}_PATH", upper)
}

fn responds(command: &str, validation_args: &[&str]) -> bool {
    Command::new(command)
        .args(validation_args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn locate(command: &str) -> Option<PathBuf> {
    let finder = if cfg!(windows) { "where" } else { "which" };
    let output = Command::new(finder)
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout);
    let first = text.lines().next()?.trim();
    if first.is_empty() {
        None
    } else {
        Some(PathBuf::from(first))
    }
}

fn location_warning(tool_name: &str, absolute: &Path, standard_locations: &[&str]) -> Option<String> {
    let inside = standard_locations
        .iter()
        .any(|loc| absolute.starts_with(loc));
    if inside {
        None
    } else {
        Some(format!(
            "{} resolved to non-standard location {}",
            tool_name,
            absolute.display()
        ))
    }
}

/// Resolve `tool_name` to a usable command string, or `None`.
///
/// An invalid environment override falls back to the PATH candidates
/// silently; use [`resolve_detailed`] to observe the warning.
pub fn resolve(tool_name: &str, candidates: &[&str], validation_args: &[&str]) -> Option<String> {
    let var = override_var_name(tool_name);
    if let Ok(override_path) = std::env::var(&var) {
        if !override_path.is_empty() && responds(&override_path, validation_args) {
            debug!(tool = tool_name, %override_path, "tool resolved via env override");
            return Some(override_path);
        }
    }
    for candidate in candidates {
        if responds(candidate, validation_args) {
            debug!(tool = tool_name, candidate, "tool resolved via PATH");
            return Some(candidate.to_string());
        }
    }
    None
}

/// Detailed variant: reports the absolute path and location warnings, and
/// treats an invalid environment override as a hard miss (the override names
/// a specific binary; quietly using another would mask a misconfiguration).
pub fn resolve_detailed(
    tool_name: &str,
    candidates: &[&str],
    validation_args: &[&str],
) -> ToolResolution {
    resolve_detailed_with_locations(tool_name, candidates, validation_args, STANDARD_LOCATIONS)
}

pub fn resolve_detailed_with_locations(
    tool_name: &str,
    candidates: &[&str],
    validation_args: &[&str],
    standard_locations: &[&str],
) -> ToolResolution {
    let mut resolution = ToolResolution::default();
    let var = override_var_name(tool_name);

    if let Ok(override_path) = std::env::var(&var) {
        if !override_path.is_empty() {
            if responds(&override_path, validation_args) {
                let absolute = PathBuf::from(&override_path);
                let warning = if absolute.is_absolute() {
                    location_warning(tool_name, &absolute, standard_locations)
                } else {
                    None
                };
                resolution.tool = Some(ResolvedTool {
                    command: override_path,
                    absolute_path: absolute.is_absolute().then_some(absolute),
                    warning,
                });
                return resolution;
            }
            let message = format!(
                "{} is set but does not point to a working {} executable",
                var, tool_name
            );
            warn!("{}", message);
            resolution.warnings.push(message);
            return resolution;
        }
    }

    for candidate in candidates {
        if !responds(candidate, validation_args) {
            continue;
        }
        let absolute = locate(candidate);
        let warning = absolute
            .as_deref()
            .and_then(|p| location_warning(tool_name, p, standard_locations));
        if let Some(w) = &warning {
            resolution.warnings.push(w.clone());
        }
        resolution.tool = Some(ResolvedTool {
            command: candidate.to_string(),
            absolute_path: absolute,
            warning,
        });
        return resolution;
    }

    resolution
}
