//! Java API model.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{
    collect_head_ref, collect_opt_signature_refs, collect_signature_refs, is_false,
    DependencyInfo, Derived, Diagnostic, IndexBase, Language, NamedType, OperationView,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiIndex {
    pub package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub packages: Vec<PackageInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<ClassInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<ClassInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<EnumInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<ClassInfo>,
}

/// A named Java type. `kind` is one of `class`, `interface`, `record`,
/// `annotation`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassInfo {
    pub name: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constructors: Vec<MethodInfo>,
    #[serde(skip_serializing_if = "is_false")]
    pub entry_point: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_deprecated: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(skip)]
    pub derived: Derived,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MethodInfo {
    pub name: String,
    /// Parameter list as written, e.g. `(String id, RequestOptions options)`.
    pub sig: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ret: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnumInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(skip)]
    pub derived: Derived,
}

impl MethodInfo {
    pub fn is_static(&self) -> bool {
        self.modifiers.iter().any(|m| m == "static")
    }
}

impl NamedType for ClassInfo {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    fn is_entry_point(&self) -> bool {
        self.entry_point
    }

    fn is_deprecated(&self) -> bool {
        self.is_deprecated
    }

    fn is_error_type(&self) -> bool {
        self.is_error
    }

    fn operations(&self) -> Vec<OperationView> {
        self.methods
            .iter()
            .chain(self.constructors.iter())
            .map(|m| OperationView {
                name: m.name.clone(),
                signature: m.sig.clone(),
            })
            .collect()
    }

    fn append_referenced_types(&self, universe: &HashSet<String>, out: &mut HashSet<String>) {
        if let Some(extends) = &self.extends {
            collect_head_ref(extends, universe, out);
        }
        for iface in &self.implements {
            collect_head_ref(iface, universe, out);
        }
        for method in self.methods.iter().chain(self.constructors.iter()) {
            collect_signature_refs(&method.sig, universe, out);
            collect_opt_signature_refs(method.ret.as_deref(), universe, out);
        }
        for field in &self.fields {
            collect_opt_signature_refs(field.ty.as_deref(), universe, out);
        }
    }

    fn derived(&self) -> Derived {
        self.derived
    }
}

impl NamedType for EnumInfo {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "enum"
    }

    fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    fn is_entry_point(&self) -> bool {
        false
    }

    fn is_deprecated(&self) -> bool {
        false
    }

    fn is_error_type(&self) -> bool {
        false
    }

    fn operations(&self) -> Vec<OperationView> {
        Vec::new()
    }

    fn append_referenced_types(&self, _universe: &HashSet<String>, _out: &mut HashSet<String>) {}

    fn derived(&self) -> Derived {
        self.derived
    }
}

impl ApiIndex {
    pub fn new(package: &str) -> Self {
        Self {
            package: package.to_string(),
            ..Self::default()
        }
    }

    pub fn all_classes(&self) -> impl Iterator<Item = &ClassInfo> {
        self.packages
            .iter()
            .flat_map(|p| p.classes.iter().chain(p.interfaces.iter()).chain(p.annotations.iter()))
    }

    pub fn find_class(&self, name: &str) -> Option<&ClassInfo> {
        self.all_classes().find(|c| c.name == name)
    }

    pub fn with_diagnostics(&self, extra: Vec<Diagnostic>) -> Self {
        let mut next = self.clone();
        next.diagnostics.extend(extra);
        next
    }
}

impl IndexBase for ApiIndex {
    fn language(&self) -> Language {
        Language::Java
    }

    fn package(&self) -> &str {
        &self.package
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn dependencies(&self) -> &[DependencyInfo] {
        &self.dependencies
    }

    fn types(&self) -> Vec<&dyn NamedType> {
        let mut all: Vec<&dyn NamedType> = Vec::new();
        for package in &self.packages {
            all.extend(package.classes.iter().map(|c| c as &dyn NamedType));
            all.extend(package.interfaces.iter().map(|i| i as &dyn NamedType));
            all.extend(package.enums.iter().map(|e| e as &dyn NamedType));
            all.extend(package.annotations.iter().map(|a| a as &dyn NamedType));
        }
        all
    }

    fn to_json(&self, pretty: bool) -> String {
        if pretty {
            serde_json::to_string_pretty(self).unwrap_or_default()
        } else {
            serde_json::to_string(self).unwrap_or_default()
        }
    }
}
