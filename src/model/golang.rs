//! Go API model.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{
    collect_head_ref, collect_opt_signature_refs, is_false, DependencyInfo, Derived, Diagnostic,
    IndexBase, Language, NamedType, OperationView,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiIndex {
    pub package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub packages: Vec<PackageApi>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageApi {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub structs: Vec<StructApi>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<IfaceApi>,
    /// Named type aliases.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<TypeApi>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FuncApi>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constants: Vec<ConstApi>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VarApi>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructApi {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldApi>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<FuncApi>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub entry_point: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_deprecated: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
    #[serde(skip)]
    pub derived: Derived,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IfaceApi {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<FuncApi>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub entry_point: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(skip)]
    pub derived: Derived,
}

/// A function or method. Methods carry a non-empty `receiver`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FuncApi {
    pub name: String,
    /// Parameter list as written, e.g. `(ctx context.Context, id string)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_method: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldApi {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeApi {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(skip)]
    pub derived: Derived,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConstApi {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VarApi {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
}

impl FuncApi {
    /// An `Error() string` method with no parameters - the structural
    /// evidence that makes the receiver an error type.
    pub fn is_error_method(&self) -> bool {
        self.name == "Error"
            && self.params.is_empty()
            && self.sig.as_deref().map_or(true, |s| {
                s.trim_matches(|c| c == '(' || c == ')').trim().is_empty()
            })
            && self.ret.as_deref() == Some("string")
    }
}

fn func_refs(func: &FuncApi, universe: &HashSet<String>, out: &mut HashSet<String>) {
    collect_opt_signature_refs(func.sig.as_deref(), universe, out);
    collect_opt_signature_refs(func.ret.as_deref(), universe, out);
    for param in &func.params {
        super::collect_signature_refs(param, universe, out);
    }
}

impl NamedType for StructApi {
    fn name(&self) -> &str {
        &self.name
    }

    fn qualified_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn kind(&self) -> &str {
        "struct"
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
            .map(|m| OperationView {
                name: m.name.clone(),
                signature: m.sig.clone().unwrap_or_default(),
            })
            .collect()
    }

    fn append_referenced_types(&self, universe: &HashSet<String>, out: &mut HashSet<String>) {
        for embed in &self.embeds {
            collect_head_ref(embed, universe, out);
        }
        for field in &self.fields {
            collect_opt_signature_refs(field.ty.as_deref(), universe, out);
        }
        for method in &self.methods {
            func_refs(method, universe, out);
        }
    }

    fn derived(&self) -> Derived {
        self.derived
    }
}

impl NamedType for IfaceApi {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "interface"
    }

    fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    fn is_entry_point(&self) -> bool {
        self.entry_point
    }

    fn is_deprecated(&self) -> bool {
        false
    }

    fn is_error_type(&self) -> bool {
        false
    }

    fn operations(&self) -> Vec<OperationView> {
        self.methods
            .iter()
            .map(|m| OperationView {
                name: m.name.clone(),
                signature: m.sig.clone().unwrap_or_default(),
            })
            .collect()
    }

    fn append_referenced_types(&self, universe: &HashSet<String>, out: &mut HashSet<String>) {
        for embed in &self.embeds {
            collect_head_ref(embed, universe, out);
        }
        for method in &self.methods {
            func_refs(method, universe, out);
        }
    }

    fn derived(&self) -> Derived {
        self.derived
    }
}

impl NamedType for TypeApi {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "alias"
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

    fn append_referenced_types(&self, universe: &HashSet<String>, out: &mut HashSet<String>) {
        collect_opt_signature_refs(self.ty.as_deref(), universe, out);
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

    pub fn all_structs(&self) -> impl Iterator<Item = &StructApi> {
        self.packages.iter().flat_map(|p| p.structs.iter())
    }

    pub fn all_interfaces(&self) -> impl Iterator<Item = &IfaceApi> {
        self.packages.iter().flat_map(|p| p.interfaces.iter())
    }

    pub fn find_struct(&self, name: &str) -> Option<&StructApi> {
        self.all_structs().find(|s| s.name == name)
    }

    pub fn with_diagnostics(&self, extra: Vec<Diagnostic>) -> Self {
        let mut next = self.clone();
        next.diagnostics.extend(extra);
        next
    }
}

impl IndexBase for ApiIndex {
    fn language(&self) -> Language {
        Language::Go
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
            all.extend(package.structs.iter().map(|s| s as &dyn NamedType));
            all.extend(package.interfaces.iter().map(|i| i as &dyn NamedType));
            all.extend(package.types.iter().map(|t| t as &dyn NamedType));
        }
        all
    }

    fn free_functions(&self) -> Vec<(String, OperationView)> {
        self.packages
            .iter()
            .flat_map(|p| {
                p.functions.iter().map(|f| {
                    (
                        p.name.clone(),
                        OperationView {
                            name: f.name.clone(),
                            signature: f.sig.clone().unwrap_or_default(),
                        },
                    )
                })
            })
            .collect()
    }

    fn to_json(&self, pretty: bool) -> String {
        if pretty {
            serde_json::to_string_pretty(self).unwrap_or_default()
        } else {
            serde_json::to_string(self).unwrap_or_default()
        }
    }
}
