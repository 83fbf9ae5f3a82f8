//! TypeScript extractor: embedded Node analyzer (or native/container tier)
//! emitting the raw module JSON.

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
use crate::model::typescript::{
    ApiIndex, ClassInfo, ConstructorInfo, EnumInfo, FunctionInfo, InterfaceInfo, MethodInfo,
    ModuleInfo, PropertyInfo, TypeAliasInfo,
};
use crate::model::{Diagnostic, DiagnosticLevel, Language, PRIORITY_OTHER};
use crate::version::detect_package_meta;
use crate::xref;

const ANALYZER_SCRIPT: &str = include_str!("scripts/api_extractor.mjs");

const ERROR_ROOTS: &[&str] = &["Error", "TypeError", "RangeError", "SyntaxError", "EvalError"];

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
    interfaces: Vec<RawInterface>,
    enums: Vec<RawEnum>,
    types: Vec<RawAlias>,
    functions: Vec<RawFunction>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawImport {
    package: String,
    symbols: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawClass {
    name: String,
    export_path: Option<String>,
    extends: Option<String>,
    implements: Vec<String>,
    methods: Vec<RawMethod>,
    properties: Vec<RawProperty>,
    constructors: Vec<RawCtor>,
    entry_point: bool,
    is_deprecated: bool,
    doc: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawInterface {
    name: String,
    export_path: Option<String>,
    extends: Vec<String>,
    methods: Vec<RawMethod>,
    properties: Vec<RawProperty>,
    entry_point: bool,
    doc: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawEnum {
    name: String,
    values: Vec<String>,
    doc: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawAlias {
    name: String,
    #[serde(rename = "type")]
    ty: Option<String>,
    doc: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawMethod {
    name: String,
    sig: String,
    ret: Option<String>,
    is_async: bool,
    is_static: bool,
    doc: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawProperty {
    name: String,
    #[serde(rename = "type")]
    ty: Option<String>,
    is_static: bool,
    doc: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawCtor {
    sig: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawFunction {
    name: String,
    sig: String,
    ret: Option<String>,
    is_async: bool,
    doc: Option<String>,
}

pub struct TypeScriptExtractor {
    config: ExtractorConfig,
}

impl TypeScriptExtractor {
    pub fn new() -> Self {
        Self {
            config: ExtractorConfig::new(
                Language::TypeScript,
                "api-extractor-typescript",
                "node",
                &["node"],
            ),
        }
    }

    pub fn with_config(config: ExtractorConfig) -> Self {
        Self { config }
    }
}

impl Default for TypeScriptExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for TypeScriptExtractor {
    type Index = ApiIndex;

    fn language(&self) -> Language {
        Language::TypeScript
    }

    async fn extract(
        &self,
        source: &Path,
        cancel: &CancellationToken,
    ) -> Result<ExtractorResult<ApiIndex>, ExtractError> {
        let raw_doc = produce_raw_document(
            &self.config,
            Some(("api_extractor.mjs", ANALYZER_SCRIPT)),
            source,
            cancel,
        )
        .await?;
        let raw: RawIndex = parse_raw(Language::TypeScript, &raw_doc.json)?;

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

/// Build an index straight from analyzer JSON; `source` is only consulted
/// for manifest metadata.
pub fn index_from_raw(json: &str, source: &Path) -> Result<ApiIndex, ExtractError> {
    let raw: RawIndex = parse_raw(Language::TypeScript, json)?;
    Ok(convert(raw, source))
}

fn convert(raw: RawIndex, source: &Path) -> ApiIndex {
    let meta = detect_package_meta(source, Language::TypeScript);
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
        .flat_map(|m| {
            m.classes
                .iter()
                .map(|c| c.name.clone())
                .chain(m.interfaces.iter().map(|i| i.name.clone()))
                .chain(m.enums.iter().map(|e| e.name.clone()))
                .chain(m.types.iter().map(|t| t.name.clone()))
        })
        .collect();
    let mut collector = DependencyCollector::new(Language::TypeScript, &package, known);
    for module in &raw.modules {
        for import in &module.imports {
            for symbol in &import.symbols {
                collector.add_named_import(symbol, &import.package);
            }
        }
    }

    let mut modules = Vec::new();
    for raw_module in raw.modules {
        let mut module = ModuleInfo {
            name: raw_module.name,
            ..ModuleInfo::default()
        };
        for raw_class in raw_module.classes {
            collector.offer_opt(raw_class.extends.as_deref());
            for iface in &raw_class.implements {
                collector.offer_signature(iface);
            }
            for method in &raw_class.methods {
                collector.offer_signature(&method.sig);
                collector.offer_opt(method.ret.as_deref());
            }
            for property in &raw_class.properties {
                collector.offer_opt(property.ty.as_deref());
            }
            for ctor in &raw_class.constructors {
                collector.offer_signature(&ctor.sig);
            }
            module.classes.push(ClassInfo {
                name: raw_class.name,
                export_path: raw_class.export_path,
                extends: raw_class.extends,
                implements: raw_class.implements,
                methods: raw_class.methods.into_iter().map(convert_method).collect(),
                properties: raw_class
                    .properties
                    .into_iter()
                    .map(convert_property)
                    .collect(),
                constructors: raw_class
                    .constructors
                    .into_iter()
                    .map(|c| ConstructorInfo { sig: c.sig })
                    .collect(),
                entry_point: raw_class.entry_point,
                is_deprecated: raw_class.is_deprecated,
                doc: raw_class.doc,
                ..ClassInfo::default()
            });
        }
        for raw_iface in raw_module.interfaces {
            for method in &raw_iface.methods {
                collector.offer_signature(&method.sig);
                collector.offer_opt(method.ret.as_deref());
            }
            for property in &raw_iface.properties {
                collector.offer_opt(property.ty.as_deref());
            }
            module.interfaces.push(InterfaceInfo {
                name: raw_iface.name,
                export_path: raw_iface.export_path,
                extends: raw_iface.extends,
                methods: raw_iface.methods.into_iter().map(convert_method).collect(),
                properties: raw_iface
                    .properties
                    .into_iter()
                    .map(convert_property)
                    .collect(),
                entry_point: raw_iface.entry_point,
                doc: raw_iface.doc,
                ..InterfaceInfo::default()
            });
        }
        for raw_enum in raw_module.enums {
            module.enums.push(EnumInfo {
                name: raw_enum.name,
                values: raw_enum.values,
                doc: raw_enum.doc,
                ..EnumInfo::default()
            });
        }
        for raw_alias in raw_module.types {
            collector.offer_opt(raw_alias.ty.as_deref());
            module.types.push(TypeAliasInfo {
                name: raw_alias.name,
                ty: raw_alias.ty,
                doc: raw_alias.doc,
                ..TypeAliasInfo::default()
            });
        }
        for raw_fn in raw_module.functions {
            collector.offer_signature(&raw_fn.sig);
            collector.offer_opt(raw_fn.ret.as_deref());
            module.functions.push(FunctionInfo {
                name: raw_fn.name,
                sig: raw_fn.sig,
                ret: raw_fn.ret,
                is_async: raw_fn.is_async,
                doc: raw_fn.doc,
            });
        }
        modules.push(module);
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

fn convert_method(m: RawMethod) -> MethodInfo {
    MethodInfo {
        name: m.name,
        sig: m.sig,
        ret: m.ret,
        is_async: m.is_async,
        is_static: m.is_static,
        doc: m.doc,
    }
}

fn convert_property(p: RawProperty) -> PropertyInfo {
    PropertyInfo {
        name: p.name,
        ty: p.ty,
        is_static: p.is_static,
        doc: p.doc,
    }
}

fn post_process(index: &mut ApiIndex) {
    let bases: Vec<(String, Option<String>)> = index
        .all_classes()
        .map(|c| (c.name.clone(), c.extends.clone()))
        .collect();
    let errors = propagate_error_bases(&bases, |head| ERROR_ROOTS.contains(&head));

    for module in &mut index.modules {
        for class in &mut module.classes {
            class.is_error = errors.contains(&class.name);
            class.derived.is_client = class.entry_point
                && (!class.methods.is_empty() || !class.constructors.is_empty());
            class.derived.is_model = !class.properties.is_empty() && class.methods.is_empty();
            class.derived.priority = PRIORITY_OTHER;
        }
        for iface in &mut module.interfaces {
            iface.derived.is_client = iface.entry_point && !iface.methods.is_empty();
            iface.derived.is_model = !iface.properties.is_empty() && iface.methods.is_empty();
            iface.derived.priority = PRIORITY_OTHER;
        }
        for e in &mut module.enums {
            e.derived.priority = PRIORITY_OTHER;
        }
        for t in &mut module.types {
            t.derived.priority = PRIORITY_OTHER;
        }
    }

    let priorities = xref::compute_priorities(index);
    for module in &mut index.modules {
        for class in &mut module.classes {
            if let Some(p) = priorities.get(&class.name) {
                class.derived.priority = *p;
            }
        }
        for iface in &mut module.interfaces {
            if let Some(p) = priorities.get(&iface.name) {
                iface.derived.priority = *p;
            }
        }
        for e in &mut module.enums {
            if let Some(p) = priorities.get(&e.name) {
                e.derived.priority = *p;
            }
        }
        for t in &mut module.types {
            if let Some(p) = priorities.get(&t.name) {
                t.derived.priority = *p;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IndexBase, PRIORITY_CLIENT, PRIORITY_ERROR, PRIORITY_MODEL};

    const RAW: &str = r#"
    {
      "modules": [
        {
          "name": "src/client",
          "imports": [{"package": "@azure/core-auth", "symbols": ["TokenCredential"]}],
          "classes": [
            {
              "name": "WidgetClient",
              "exportPath": ".",
              "entryPoint": true,
              "constructors": [{"sig": "(endpoint: string, credential: TokenCredential)"}],
              "methods": [
                {"name": "getWidget", "sig": "(id: string)", "ret": "Promise<Widget>", "isAsync": true}
              ]
            },
            {
              "name": "WidgetError",
              "extends": "Error",
              "methods": []
            }
          ],
          "interfaces": [
            {
              "name": "Widget",
              "properties": [{"name": "id", "type": "string"}, {"name": "tags", "type": "WidgetTag[]"}]
            }
          ],
          "enums": [{"name": "WidgetTag", "values": ["Red", "Blue"]}],
          "types": [{"name": "WidgetId", "type": "string"}],
          "functions": [{"name": "createClient", "sig": "(endpoint: string)", "ret": "WidgetClient"}]
        }
      ]
    }
    "#;

    fn convert_raw() -> ApiIndex {
        let raw: RawIndex = serde_json::from_str(RAW).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"name": "@acme/widgets", "version": "3.0.0"}"#,
        )
        .unwrap();
        convert(raw, dir.path())
    }

    #[test]
    fn converts_all_type_shapes() {
        let index = convert_raw();
        assert_eq!(index.package, "@acme/widgets");
        assert_eq!(index.version.as_deref(), Some("3.0.0"));
        assert_eq!(index.types().len(), 5);

        let client = index.class_in_module("src/client", "WidgetClient").unwrap();
        assert!(client.derived.is_client);
        assert_eq!(client.derived.priority, PRIORITY_CLIENT);

        let error = index.class_in_module("src/client", "WidgetError").unwrap();
        assert!(error.is_error);
        assert_eq!(error.derived.priority, PRIORITY_ERROR);

        let widget = index.all_interfaces().find(|i| i.name == "Widget").unwrap();
        assert!(widget.derived.is_model);
        assert_eq!(widget.derived.priority, PRIORITY_MODEL);
    }

    #[test]
    fn external_symbols_land_in_dependencies() {
        let index = convert_raw();
        assert_eq!(index.dependencies.len(), 1);
        assert_eq!(index.dependencies[0].package, "@azure/core-auth");
        assert_eq!(index.dependencies[0].types, vec!["TokenCredential"]);
    }

    #[test]
    fn builtin_globals_never_become_dependencies() {
        let raw: RawIndex = serde_json::from_str(
            r#"{"modules": [{"name": "m", "imports": [],
                "functions": [{"name": "f", "sig": "(p: Promise<string>, m: Map<string, number>)"}]}]}"#,
        )
        .unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let index = convert(raw, dir.path());
        assert!(index.dependencies.is_empty());
    }
}
