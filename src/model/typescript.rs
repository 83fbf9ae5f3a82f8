//! TypeScript API model.

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
    pub modules: Vec<ModuleInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<ClassInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<InterfaceInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<EnumInfo>,
    /// Type aliases.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<TypeAliasInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionInfo>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassInfo {
    pub name: String,
    /// Subpath the symbol is exported from (`.` or `./rest`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constructors: Vec<ConstructorInfo>,
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
pub struct InterfaceInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyInfo>,
    #[serde(skip_serializing_if = "is_false")]
    pub entry_point: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(skip)]
    pub derived: Derived,
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

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeAliasInfo {
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
pub struct MethodInfo {
    pub name: String,
    /// Parameter list as written, e.g. `(message: ChatMessage)`.
    pub sig: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ret: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_async: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_static: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FunctionInfo {
    pub name: String,
    pub sig: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ret: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_async: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyInfo {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_static: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConstructorInfo {
    pub sig: String,
}

impl NamedType for ClassInfo {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "class"
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
                signature: m.sig.clone(),
            })
            .chain(self.constructors.iter().map(|c| OperationView {
                name: "constructor".to_string(),
                signature: c.sig.clone(),
            }))
            .collect()
    }

    fn append_referenced_types(&self, universe: &HashSet<String>, out: &mut HashSet<String>) {
        if let Some(extends) = &self.extends {
            collect_head_ref(extends, universe, out);
        }
        for iface in &self.implements {
            collect_head_ref(iface, universe, out);
        }
        for method in &self.methods {
            collect_signature_refs(&method.sig, universe, out);
            collect_opt_signature_refs(method.ret.as_deref(), universe, out);
        }
        for property in &self.properties {
            collect_opt_signature_refs(property.ty.as_deref(), universe, out);
        }
        for ctor in &self.constructors {
            collect_signature_refs(&ctor.sig, universe, out);
        }
    }

    fn derived(&self) -> Derived {
        self.derived
    }
}

impl NamedType for InterfaceInfo {
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
                signature: m.sig.clone(),
            })
            .collect()
    }

    fn append_referenced_types(&self, universe: &HashSet<String>, out: &mut HashSet<String>) {
        for base in &self.extends {
            collect_head_ref(base, universe, out);
        }
        for method in &self.methods {
            collect_signature_refs(&method.sig, universe, out);
            collect_opt_signature_refs(method.ret.as_deref(), universe, out);
        }
        for property in &self.properties {
            collect_opt_signature_refs(property.ty.as_deref(), universe, out);
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

impl NamedType for TypeAliasInfo {
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

    pub fn all_classes(&self) -> impl Iterator<Item = &ClassInfo> {
        self.modules.iter().flat_map(|m| m.classes.iter())
    }

    pub fn all_interfaces(&self) -> impl Iterator<Item = &InterfaceInfo> {
        self.modules.iter().flat_map(|m| m.interfaces.iter())
    }

    /// Module-qualified class lookup: duplicate names across modules stay
    /// distinct.
    pub fn class_in_module(&self, module: &str, name: &str) -> Option<&ClassInfo> {
        self.modules
            .iter()
            .find(|m| m.name == module)?
            .classes
            .iter()
            .find(|c| c.name == name)
    }

    pub fn with_diagnostics(&self, extra: Vec<Diagnostic>) -> Self {
        let mut next = self.clone();
        next.diagnostics.extend(extra);
        next
    }
}

impl IndexBase for ApiIndex {
    fn language(&self) -> Language {
        Language::TypeScript
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
        for module in &self.modules {
            all.extend(module.classes.iter().map(|c| c as &dyn NamedType));
            all.extend(module.interfaces.iter().map(|i| i as &dyn NamedType));
            all.extend(module.enums.iter().map(|e| e as &dyn NamedType));
            all.extend(module.types.iter().map(|t| t as &dyn NamedType));
        }
        all
    }

    fn free_functions(&self) -> Vec<(String, OperationView)> {
        self.modules
            .iter()
            .flat_map(|m| {
                m.functions.iter().map(|f| {
                    (
                        m.name.clone(),
                        OperationView {
                            name: f.name.clone(),
                            signature: f.sig.clone(),
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
