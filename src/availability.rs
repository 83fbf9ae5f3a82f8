//! Three-tier extractor availability: native binary, language runtime,
//! container image. Results are memoized process-wide per
//! `(language, native_binary_name, runtime_tool_name)`.

use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::model::Language;
use crate::tools;

/// Configuration for probing one language's extractor tooling.
#[derive(Clone, Debug)]
pub struct ExtractorConfig {
    pub language: Language,
    /// Precompiled extractor binary name (e.g. `api-extractor-go`).
    pub native_binary_name: String,
    /// Runtime that can execute the embedded analyzer (e.g. `python3`).
    pub runtime_tool_name: String,
    /// Candidate spellings of the runtime, tried in order.
    pub runtime_candidates: Vec<String>,
    pub native_validation_args: Vec<String>,
    pub runtime_validation_args: Vec<String>,
    /// Container image for the fallback tier; `SDK_CHAT_{LANG}_IMAGE`
    /// overrides it per process.
    pub docker_image: String,
}

impl ExtractorConfig {
    pub fn new(
        language: Language,
        native_binary_name: &str,
        runtime_tool_name: &str,
        runtime_candidates: &[&str],
    ) -> Self {
        Self {
            language,
            native_binary_name: native_binary_name.to_string(),
            runtime_tool_name: runtime_tool_name.to_string(),
            runtime_candidates: runtime_candidates.iter().map(|s| s.to_string()).collect(),
            native_validation_args: vec!["--help".to_string()],
            runtime_validation_args: vec!["--version".to_string()],
            docker_image: default_docker_image(language),
        }
    }
}

/// Default container image for a language's extractor.
pub fn default_docker_image(language: Language) -> String {
    format!("api-extractor-{}:latest", language.as_str())
}

/// Container image honoring the `SDK_CHAT_{LANG}_IMAGE` override.
pub fn docker_image_for(config: &ExtractorConfig) -> String {
    let var = format!(
        "SDK_CHAT_{}_IMAGE",
        config.language.as_str().to_ascii_uppercase()
    );
    match std::env::var(&var) {
        Ok(image) if !image.is_empty() => image,
        _ => config.docker_image.clone(),
    }
}

/// How (or whether) a language's extractor can run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Availability {
    Unavailable {
        reason: String,
    },
    NativeBinary {
        executable: String,
        warning: Option<String>,
    },
    RuntimeInterpreter {
        executable: String,
        warning: Option<String>,
    },
    Docker {
        image: String,
    },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        !matches!(self, Availability::Unavailable { .. })
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            Availability::NativeBinary { warning, .. }
            | Availability::RuntimeInterpreter { warning, .. } => warning.as_deref(),
            _ => None,
        }
    }
}

type CacheKey = (&'static str, String, String);

static AVAILABILITY_CACHE: Lazy<Mutex<HashMap<CacheKey, Availability>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn cache_key(config: &ExtractorConfig) -> CacheKey {
    (
        config.language.as_str(),
        config.native_binary_name.clone(),
        config.runtime_tool_name.clone(),
    )
}

/// Drop every memoized availability result.
pub fn clear_cache() {
    AVAILABILITY_CACHE.lock().expect("availability cache poisoned").clear();
}

/// Probe availability, honoring the process-wide cache.
pub fn check(config: &ExtractorConfig) -> Availability {
    check_with(config, false)
}

/// Probe availability. `force_recheck` bypasses the cache lookup for this
/// call; the fresh result is published for subsequent calls.
pub fn check_with(config: &ExtractorConfig, force_recheck: bool) -> Availability {
    let key = cache_key(config);
    if !force_recheck {
        if let Some(hit) = AVAILABILITY_CACHE
            .lock()
            .expect("availability cache poisoned")
            .get(&key)
        {
            return hit.clone();
        }
    }

    let result = probe(config);
    AVAILABILITY_CACHE
        .lock()
        .expect("availability cache poisoned")
        .insert(key, result.clone());
    result
}

fn probe(config: &ExtractorConfig) -> Availability {
    let native_args: Vec<&str> = config.native_validation_args.iter().map(String::as_str).collect();
    let native = tools::resolve_detailed(
        &config.native_binary_name,
        &[config.native_binary_name.as_str()],
        &native_args,
    );
    if let Some(tool) = native.tool {
        debug!(language = %config.language, executable = %tool.command, "native extractor located");
        return Availability::NativeBinary {
            executable: tool.command,
            warning: tool.warning,
        };
    }

    let runtime_args: Vec<&str> = config.runtime_validation_args.iter().map(String::as_str).collect();
    let candidates: Vec<&str> = config.runtime_candidates.iter().map(String::as_str).collect();
    let runtime = tools::resolve_detailed(&config.runtime_tool_name, &candidates, &runtime_args);
    let mut warnings = native.warnings;
    warnings.extend(runtime.warnings.iter().cloned());
    if let Some(tool) = runtime.tool {
        debug!(language = %config.language, executable = %tool.command, "runtime interpreter located");
        return Availability::RuntimeInterpreter {
            executable: tool.command,
            warning: tool.warning,
        };
    }

    if tools::resolve("docker", &["docker"], &["--version"]).is_some() {
        let image = docker_image_for(config);
        debug!(language = %config.language, image, "falling back to container image");
        return Availability::Docker { image };
    }

    let mut reason = format!(
        "no {} extractor found: install the {} binary, put {} on PATH, or make Docker available",
        config.language, config.native_binary_name, config.runtime_tool_name
    );
    if !warnings.is_empty() {
        reason.push_str(&format!(" ({})", warnings.join("; ")));
    }
    Availability::Unavailable { reason }
}
