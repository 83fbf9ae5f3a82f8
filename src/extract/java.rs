//! Java extractor: embedded single-file analyzer run by the JDK launcher
//! (or a native/container analyzer emitting the same JSON).

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
use crate::model::java::{ApiIndex, ClassInfo, EnumInfo, FieldInfo, MethodInfo, PackageInfo};
use crate::model::{Diagnostic, DiagnosticLevel, Language, PRIORITY_OTHER};
use crate::version::detect_package_meta;
use crate::xref;

const ANALYZER_SOURCE: &str = include_str!("scripts/ApiExtractor.java");

const ERROR_ROOTS: &[&str] = &[
    "Throwable",
    "Exception",
    "RuntimeException",
    "Error",
    "IllegalArgumentException",
    "IllegalStateException",
    "UnsupportedOperationException",
    "IOException",
    "UncheckedIOException",
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawIndex {
    package: Option<String>,
    version: Option<String>,
    packages: Vec<RawPackage>,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawPackage {
    name: String,
    imports: Vec<String>,
    classes: Vec<RawClass>,
    interfaces: Vec<RawClass>,
    enums: Vec<RawEnum>,
    annotations: Vec<RawClass>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawClass {
    name: String,
    kind: String,
    extends: Option<String>,
    implements: Vec<String>,
    methods: Vec<RawMethod>,
    fields: Vec<RawField>,
    constructors: Vec<RawMethod>,
    is_deprecated: bool,
    doc: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawMethod {
    name: String,
    sig: String,
    ret: Option<String>,
    modifiers: Vec<String>,
    doc: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    ty: Option<String>,
    modifiers: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawEnum {
    name: String,
    values: Vec<String>,
    doc: Option<String>,
}

pub struct JavaExtractor {
    config: ExtractorConfig,
}

impl JavaExtractor {
    pub fn new() -> Self {
        Self {
            config: ExtractorConfig::new(Language::Java, "api-extractor-java", "java", &["java"]),
        }
    }

    pub fn with_config(config: ExtractorConfig) -> Self {
        Self { config }
    }
}

impl Default for JavaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for JavaExtractor {
    type Index = ApiIndex;

    fn language(&self) -> Language {
        Language::Java
    }

    async fn extract(
        &self,
        source: &Path,
        cancel: &CancellationToken,
    ) -> Result<ExtractorResult<ApiIndex>, ExtractError> {
        let raw_doc = produce_raw_document(
            &self.config,
            Some(("ApiExtractor.java", ANALYZER_SOURCE)),
            source,
            cancel,
        )
        .await?;
        let raw: RawIndex = parse_raw(Language::Java, &raw_doc.json)?;

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

fn convert_method(m: RawMethod) -> MethodInfo {
    MethodInfo {
        name: m.name,
        sig: m.sig,
        ret: m.ret,
        modifiers: m.modifiers,
        doc: m.doc,
    }
}

fn convert_class(raw: RawClass, default_kind: &str) -> ClassInfo {
    ClassInfo {
        name: raw.name,
        // Unknown kinds default to `class`; a compiled-metadata backend can
        // refine this through the same seam.
        kind: resolve_kind(&raw.kind, default_kind),
        extends: raw.extends,
        implements: raw.implements,
        methods: raw.methods.into_iter().map(convert_method).collect(),
        fields: raw
            .fields
            .into_iter()
            .map(|f| FieldInfo {
                name: f.name,
                ty: f.ty,
                modifiers: f.modifiers,
            })
            .collect(),
        constructors: raw.constructors.into_iter().map(convert_method).collect(),
        is_deprecated: raw.is_deprecated,
        doc: raw.doc,
        ..ClassInfo::default()
    }
}

/// Kind resolution seam for externally observed types.
pub(crate) fn resolve_kind(raw_kind: &str, default_kind: &str) -> String {
    match raw_kind {
        "class" | "interface" | "record" | "annotation" => raw_kind.to_string(),
        _ => default_kind.to_string(),
    }
}

/// Build an index straight from analyzer JSON; `source` is only consulted
/// for manifest metadata.
pub fn index_from_raw(json: &str, source: &Path) -> Result<ApiIndex, ExtractError> {
    let raw: RawIndex = parse_raw(Language::Java, json)?;
    Ok(convert(raw, source))
}

fn convert(raw: RawIndex, source: &Path) -> ApiIndex {
    let meta = detect_package_meta(source, Language::Java);
    let package = raw
        .package
        .or(meta.name)
        .or_else(|| raw.packages.first().map(|p| p.name.clone()))
        .unwrap_or_else(|| "unknown".to_string());
    let version = raw.version.or(meta.version);

    let known: HashSet<String> = raw
        .packages
        .iter()
        .flat_map(|p| {
            p.classes
                .iter()
                .chain(p.interfaces.iter())
                .chain(p.annotations.iter())
                .map(|c| c.name.clone())
                .chain(p.enums.iter().map(|e| e.name.clone()))
        })
        .collect();
    let mut collector = DependencyCollector::new(Language::Java, &package, known);
    for pkg in &raw.packages {
        for import in &pkg.imports {
            if let Some((home, symbol)) = import.rsplit_once('.') {
                collector.add_named_import(symbol, home);
            }
        }
    }

    let mut packages = Vec::new();
    for raw_pkg in raw.packages {
        for class in raw_pkg
            .classes
            .iter()
            .chain(raw_pkg.interfaces.iter())
            .chain(raw_pkg.annotations.iter())
        {
            collector.offer_opt(class.extends.as_deref());
            for iface in &class.implements {
                collector.offer_signature(iface);
            }
            for method in class.methods.iter().chain(class.constructors.iter()) {
                collector.offer_signature(&method.sig);
                collector.offer_opt(method.ret.as_deref());
            }
            for field in &class.fields {
                collector.offer_opt(field.ty.as_deref());
            }
        }

        packages.push(PackageInfo {
            name: raw_pkg.name,
            classes: raw_pkg
                .classes
                .into_iter()
                .map(|c| convert_class(c, "class"))
                .collect(),
            interfaces: raw_pkg
                .interfaces
                .into_iter()
                .map(|c| convert_class(c, "interface"))
                .collect(),
            enums: raw_pkg
                .enums
                .into_iter()
                .map(|e| EnumInfo {
                    name: e.name,
                    values: e.values,
                    doc: e.doc,
                    ..EnumInfo::default()
                })
                .collect(),
            annotations: raw_pkg
                .annotations
                .into_iter()
                .map(|c| convert_class(c, "annotation"))
                .collect(),
        });
    }

    let mut index = ApiIndex {
        package,
        version,
        packages,
        dependencies: collector.finish(),
        diagnostics: raw.diagnostics,
    };
    post_process(&mut index);
    index
}

fn post_process(index: &mut ApiIndex) {
    let bases: Vec<(String, Option<String>)> = index
        .all_classes()
        .map(|c| (c.name.clone(), c.extends.clone()))
        .collect();
    let errors = propagate_error_bases(&bases, |head| ERROR_ROOTS.contains(&head));

    let root_pkg = index
        .packages
        .iter()
        .map(|p| p.name.clone())
        .min_by_key(|n| n.len());

    for pkg in &mut index.packages {
        let is_root = Some(&pkg.name) == root_pkg.as_ref();
        for class in pkg
            .classes
            .iter_mut()
            .chain(pkg.interfaces.iter_mut())
            .chain(pkg.annotations.iter_mut())
        {
            class.is_error = errors.contains(&class.name);
            class.entry_point = is_root && !class.is_error && !class.methods.is_empty();
            class.derived.is_client = class.entry_point
                && (!class.methods.is_empty() || !class.constructors.is_empty());
            class.derived.is_model = !class.fields.is_empty() && class.methods.is_empty();
            class.derived.priority = PRIORITY_OTHER;
        }
        for e in &mut pkg.enums {
            e.derived.priority = PRIORITY_OTHER;
        }
    }

    let priorities = xref::compute_priorities(index);
    for pkg in &mut index.packages {
        for class in pkg
            .classes
            .iter_mut()
            .chain(pkg.interfaces.iter_mut())
            .chain(pkg.annotations.iter_mut())
        {
            if let Some(p) = priorities.get(&class.name) {
                class.derived.priority = *p;
            }
        }
        for e in &mut pkg.enums {
            if let Some(p) = priorities.get(&e.name) {
                e.derived.priority = *p;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PRIORITY_CLIENT, PRIORITY_ERROR};

    const RAW: &str = r#"
    {
      "packages": [
        {
          "name": "com.acme.widgets",
          "imports": ["com.azure.core.http.HttpPipeline", "java.util.List"],
          "classes": [
            {
              "name": "WidgetClient",
              "kind": "class",
              "constructors": [{"name": "WidgetClient", "sig": "(String endpoint, HttpPipeline pipeline)"}],
              "methods": [
                {"name": "getWidget", "sig": "(String id)", "ret": "Widget", "modifiers": ["public"]}
              ]
            },
            {
              "name": "Widget",
              "kind": "class",
              "fields": [{"name": "name", "type": "String", "modifiers": ["public"]}]
            },
            {
              "name": "WidgetException",
              "kind": "class",
              "extends": "RuntimeException"
            },
            {
              "name": "Mystery",
              "kind": "struct"
            }
          ],
          "interfaces": [
            {"name": "WidgetOperations", "kind": "interface",
             "methods": [{"name": "listWidgets", "sig": "()", "ret": "List<Widget>", "modifiers": ["public"]}]}
          ],
          "enums": [{"name": "WidgetColor", "values": ["RED", "BLUE"]}]
        }
      ]
    }
    "#;

    fn convert_raw() -> ApiIndex {
        let raw: RawIndex = serde_json::from_str(RAW).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        convert(raw, dir.path())
    }

    #[test]
    fn kinds_resolve_and_unknown_defaults_to_class() {
        let index = convert_raw();
        assert_eq!(index.find_class("WidgetClient").unwrap().kind, "class");
        assert_eq!(index.find_class("WidgetOperations").unwrap().kind, "interface");
        // Open question seam: unknown kinds collapse to class.
        assert_eq!(index.find_class("Mystery").unwrap().kind, "class");
    }

    #[test]
    fn flags_and_priorities() {
        let index = convert_raw();
        let client = index.find_class("WidgetClient").unwrap();
        assert!(client.entry_point);
        assert_eq!(client.derived.priority, PRIORITY_CLIENT);

        let exception = index.find_class("WidgetException").unwrap();
        assert!(exception.is_error);
        assert_eq!(exception.derived.priority, PRIORITY_ERROR);
    }

    #[test]
    fn fqn_imports_resolve_but_jdk_types_never_surface() {
        let index = convert_raw();
        assert_eq!(index.dependencies.len(), 1);
        assert_eq!(index.dependencies[0].package, "com.azure.core.http");
        assert_eq!(index.dependencies[0].types, vec!["HttpPipeline"]);
    }
}
