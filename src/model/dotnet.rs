//! .NET (C#) API model.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{
    collect_head_ref, collect_signature_refs, is_false, DependencyInfo, Derived, Diagnostic,
    IndexBase, Language, NamedType, OperationView,
};

/// Root of a C# package's public API.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiIndex {
    pub package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub namespaces: Vec<NamespaceInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NamespaceInfo {
    pub name: String,
    pub types: Vec<TypeInfo>,
}

/// A named C# type. `kind` is one of `class`, `interface`, `struct`,
/// `record`, `enum`, `delegate`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeInfo {
    pub name: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<MemberInfo>,
    /// Enum member names, for `kind == "enum"`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub entry_point: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(skip)]
    pub derived: Derived,
}

/// A type member. `kind` is one of `method`, `property`, `field`, `ctor`,
/// `event`, `operator`, `const`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemberInfo {
    pub name: String,
    pub kind: String,
    pub signature: String,
    #[serde(skip_serializing_if = "is_false")]
    pub is_static: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_async: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl MemberInfo {
    pub fn is_behavior(&self) -> bool {
        matches!(self.kind.as_str(), "method" | "ctor" | "operator")
    }

    pub fn is_data(&self) -> bool {
        matches!(self.kind.as_str(), "property" | "field" | "const")
    }
}

impl TypeInfo {
    pub fn behavior_members(&self) -> impl Iterator<Item = &MemberInfo> {
        self.members.iter().filter(|m| m.is_behavior())
    }

    pub fn data_members(&self) -> impl Iterator<Item = &MemberInfo> {
        self.members.iter().filter(|m| m.is_data())
    }
}

impl NamedType for TypeInfo {
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
        self.behavior_members()
            .map(|m| OperationView {
                name: m.name.clone(),
                signature: m.signature.clone(),
            })
            .collect()
    }

    fn append_referenced_types(&self, universe: &HashSet<String>, out: &mut HashSet<String>) {
        if let Some(base) = &self.base {
            collect_head_ref(base, universe, out);
        }
        for iface in &self.interfaces {
            collect_head_ref(iface, universe, out);
        }
        for member in &self.members {
            collect_signature_refs(&member.signature, universe, out);
        }
    }

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

    /// All types across namespaces, in index order.
    pub fn all_types(&self) -> impl Iterator<Item = &TypeInfo> {
        self.namespaces.iter().flat_map(|ns| ns.types.iter())
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeInfo> {
        self.all_types().find(|t| t.name == name)
    }

    /// Namespace owning `name`, if any.
    pub fn namespace_of(&self, name: &str) -> Option<&str> {
        self.namespaces
            .iter()
            .find(|ns| ns.types.iter().any(|t| t.name == name))
            .map(|ns| ns.name.as_str())
    }

    /// Fresh index with `extra` diagnostics appended; the type tree is shared
    /// structurally via clone, never mutated.
    pub fn with_diagnostics(&self, extra: Vec<Diagnostic>) -> Self {
        let mut next = self.clone();
        next.diagnostics.extend(extra);
        next
    }
}

impl IndexBase for ApiIndex {
    fn language(&self) -> Language {
        Language::DotNet
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
        self.all_types().map(|t| t as &dyn NamedType).collect()
    }

    fn to_json(&self, pretty: bool) -> String {
        if pretty {
            serde_json::to_string_pretty(self).unwrap_or_default()
        } else {
            serde_json::to_string(self).unwrap_or_default()
        }
    }
}
