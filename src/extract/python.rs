//! Python extractor: embedded `ast`-based analyzer run under the Python
//! runtime (or a native/container analyzer emitting the same JSON).

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{
    parse_raw, produce_raw_document, propagate_error_bases, DependencyCollector, Extractor,
    ExtractorResult,
};
use crate::availability::ExtractorConfig;
use crate::error::ExtractError;
use crate::model::python::{ApiIndex, ClassInfo, FunctionInfo, MethodInfo, ModuleInfo, PropertyInfo};
use crate::model::{Diagnostic, DiagnosticLevel, Language, PRIORITY_OTHER};
use crate::version::detect_package_meta;
use crate::xref;

const ANALYZER_SCRIPT: &str = include_str!("scripts/api_extractor.py");

const ERROR_ROOTS: &[&str] = &[
    "BaseException",
    "Exception",
    "ValueError",
    "TypeError",
    "RuntimeError",
    "KeyError",
    "OSError",
    "IOError",
    "LookupError",
    "ArithmeticError",
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawIndex {
    package: Option<String>,
    version: Option<String>,
    modules: Vec<RawModule>,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawModule {
    name: String,
    imports: Vec<RawImport>,
    classes: Vec<RawClass>,
    functions: Vec<RawFunction>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawImport {
    package: String,
    symbols: Vec<String>,
    alias: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawClass {
    name: String,
    id: Option<String>,
    base: Option<String>,
    doc: Option<String>,
    entry_point: bool,
    is_deprecated: bool,
    methods: Vec<RawMethod>,
    properties: Vec<RawProperty>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawMethod {
    name: String,
    signature: String,
    doc: Option<String>,
    is_async: bool,
    is_classmethod: bool,
    is_staticmethod: bool,
    ret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawProperty {
    name: String,
    #[serde(rename = "type")]
    ty: Option<String>,
    doc: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawFunction {
    name: String,
    signature: String,
    ret: Option<String>,
    is_async: bool,
    doc: Option<String>,
}

pub struct PythonExtractor {
    config: ExtractorConfig,
}

impl PythonExtractor {
    pub fn new() -> Self {
        Self {
            config: ExtractorConfig::new(
                Language::Python,
                "api-extractor-python",
                "python",
                &["python3", "python"],
            ),
        }
    }

    pub fn with_config(config: ExtractorConfig) -> Self {
        Self { config }
    }
}

impl Default for PythonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for PythonExtractor {
    type Index = ApiIndex;

    fn language(&self) -> Language {
        Language::Python
    }

    async fn extract(
        &self,
        source: &Path,
        cancel: &CancellationToken,
    ) -> Result<ExtractorResult<ApiIndex>, ExtractError> {
        let raw_doc = produce_raw_document(
            &self.config,
            Some(("api_extractor.py", ANALYZER_SCRIPT)),
            source,
            cancel,
        )
        .await?;
        let raw: RawIndex = parse_raw(Language::Python, &raw_doc.json)?;

        let mut index = convert(raw, source);
        if raw_doc.output_truncated {
            index.diagnostics.push(Diagnostic::new(
                "EXT001",
                DiagnosticLevel::Warning,
                None,
                "analyzer output was truncated at the capture cap",
            ));
        }
        Ok(ExtractorResult::success_with_warnings(index, raw_doc.warnings))
    }
}

/// Build an index straight from analyzer JSON (unknown fields are ignored).
/// `source` is only consulted for manifest metadata.
pub fn index_from_raw(json: &str, source: &Path) -> Result<ApiIndex, ExtractError> {
    let raw: RawIndex = parse_raw(Language::Python, json)?;
    Ok(convert(raw, source))
}

fn convert(raw: RawIndex, source: &Path) -> ApiIndex {
    let meta = detect_package_meta(source, Language::Python);
    let package = raw
        .package
        .or(meta.name)
        .or_else(|| {
            source
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown".to_string());
    let version = raw.version.or(meta.version);

    let known: HashSet<String> = raw
        .modules
        .iter()
        .flat_map(|m| m.classes.iter().map(|c| c.name.clone()))
        .collect();
    let mut collector = DependencyCollector::new(Language::Python, &package, known);
    for module in &raw.modules {
        for import in &module.imports {
            for symbol in &import.symbols {
                collector.add_named_import(symbol, &import.package);
            }
            if let Some(alias) = &import.alias {
                collector.add_package_import(alias, &import.package);
            }
        }
    }

    let mut modules = Vec::new();
    for raw_module in raw.modules {
        let mut classes = Vec::new();
        for raw_class in raw_module.classes {
            collector.offer_opt(raw_class.base.as_deref());
            for method in &raw_class.methods {
                collector.offer_signature(&method.signature);
                collector.offer_opt(method.ret.as_deref());
            }
            for property in &raw_class.properties {
                collector.offer_opt(property.ty.as_deref());
            }
            classes.push(ClassInfo {
                name: raw_class.name.clone(),
                id: raw_class
                    .id
                    .or_else(|| Some(format!("{}.{}", raw_module.name, raw_class.name))),
                base: raw_class.base,
                doc: raw_class.doc,
                methods: raw_class
                    .methods
                    .into_iter()
                    .map(|m| MethodInfo {
                        name: m.name,
                        signature: m.signature,
                        doc: m.doc,
                        is_async: m.is_async,
                        is_classmethod: m.is_classmethod,
                        is_staticmethod: m.is_staticmethod,
                        ret: m.ret,
                    })
                    .collect(),
                properties: raw_class
                    .properties
                    .into_iter()
                    .map(|p| PropertyInfo {
                        name: p.name,
                        ty: p.ty,
                        doc: p.doc,
                    })
                    .collect(),
                entry_point: raw_class.entry_point,
                is_deprecated: raw_class.is_deprecated,
                ..ClassInfo::default()
            });
        }
        let functions = raw_module
            .functions
            .into_iter()
            .map(|f| {
                collector.offer_signature(&f.signature);
                collector.offer_opt(f.ret.as_deref());
                FunctionInfo {
                    name: f.name,
                    signature: f.signature,
                    ret: f.ret,
                    is_async: f.is_async,
                    doc: f.doc,
                }
            })
            .collect();
        modules.push(ModuleInfo {
            name: raw_module.name,
            classes,
            functions,
        });
    }

    let mut index = ApiIndex {
        package,
        version,
        modules,
        dependencies: collector.finish(),
        diagnostics: raw.diagnostics,
    };
    post_process(&mut index);
    index
}

fn post_process(index: &mut ApiIndex) {
    let bases: Vec<(String, Option<String>)> = index
        .all_classes()
        .map(|c| (c.name.clone(), c.base.clone()))
        .collect();
    let errors = propagate_error_bases(&bases, |head| ERROR_ROOTS.contains(&head));

    for module in &mut index.modules {
        for class in &mut module.classes {
            class.is_error = errors.contains(&class.name);
            class.derived.is_client = class.entry_point && !class.methods.is_empty();
            class.derived.is_model = !class.properties.is_empty() && class.methods.is_empty();
            class.derived.priority = PRIORITY_OTHER;
        }
    }

    let priorities = xref::compute_priorities(index);
    for module in &mut index.modules {
        for class in &mut module.classes {
            if let Some(priority) = priorities.get(&class.name) {
                class.derived.priority = *priority;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PRIORITY_CLIENT, PRIORITY_ERROR, PRIORITY_MODEL};

    const RAW: &str = r#"
    {
      "modules": [
        {
          "name": "acme.widgets.client",
          "imports": [
            {"package": "azure.core", "symbols": ["Pipeline"]},
            {"package": "typing", "symbols": ["Optional"]},
            {"package": "requests", "symbols": [], "alias": "requests"}
          ],
          "classes": [
            {
              "name": "WidgetClient",
              "doc": "Client for widgets.",
              "entryPoint": true,
              "methods": [
                {"name": "get_widget", "signature": "(self, widget_id: str, pipeline: Pipeline)", "ret": "Widget"},
                {"name": "list_widgets", "signature": "(self, session: requests.Session)", "ret": "WidgetPage", "isAsync": true}
              ]
            },
            {
              "name": "Widget",
              "properties": [{"name": "name", "type": "str"}]
            },
            {
              "name": "WidgetPage",
              "properties": [{"name": "items", "type": "List[Widget]"}]
            },
            {
              "name": "WidgetError",
              "base": "Exception",
              "methods": []
            },
            {
              "name": "ErrorHandler",
              "properties": [{"name": "details", "type": "str"}]
            }
          ],
          "functions": [
            {"name": "connect", "signature": "(endpoint: str)", "ret": "WidgetClient"}
          ]
        }
      ]
    }
    "#;

    fn convert_raw() -> ApiIndex {
        let raw: RawIndex = serde_json::from_str(RAW).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"acme-widgets\"\nversion = \"0.9.0\"\n",
        )
        .unwrap();
        convert(raw, dir.path())
    }

    #[test]
    fn converts_and_post_processes() {
        let index = convert_raw();
        assert_eq!(index.package, "acme-widgets");
        assert_eq!(index.version.as_deref(), Some("0.9.0"));

        let client = index.find_class("WidgetClient").unwrap();
        assert!(client.derived.is_client);
        assert_eq!(client.derived.priority, PRIORITY_CLIENT);
        assert_eq!(
            client.id.as_deref(),
            Some("acme.widgets.client.WidgetClient")
        );

        let error = index.find_class("WidgetError").unwrap();
        assert!(error.is_error);
        assert_eq!(error.derived.priority, PRIORITY_ERROR);

        // Name alone is never evidence.
        assert!(!index.find_class("ErrorHandler").unwrap().is_error);

        let widget = index.find_class("Widget").unwrap();
        assert!(widget.derived.is_model);
        assert_eq!(widget.derived.priority, PRIORITY_MODEL);
    }

    #[test]
    fn dependencies_exclude_stdlib_and_package_types() {
        let index = convert_raw();
        let packages: Vec<&str> = index.dependencies.iter().map(|d| d.package.as_str()).collect();
        assert!(packages.contains(&"azure.core"));
        assert!(packages.contains(&"requests"));
        assert!(!packages.contains(&"typing"));

        let azure = index
            .dependencies
            .iter()
            .find(|d| d.package == "azure.core")
            .unwrap();
        assert_eq!(azure.types, vec!["Pipeline"]);
        let requests = index
            .dependencies
            .iter()
            .find(|d| d.package == "requests")
            .unwrap();
        assert_eq!(requests.types, vec!["Session"]);
    }

    #[test]
    fn malformed_json_is_a_malformed_error() {
        let err = parse_raw::<RawIndex>(Language::Python, "{not json").unwrap_err();
        assert!(matches!(err, ExtractError::Malformed { .. }));
    }

    #[test]
    fn unknown_raw_fields_are_ignored() {
        let raw: RawIndex = serde_json::from_str(
            r#"{"modules": [], "analyzerVersion": "9.9", "somethingNew": {"a": 1}}"#,
        )
        .unwrap();
        assert!(raw.modules.is_empty());
    }
}
