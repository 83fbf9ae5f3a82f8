//! Python API model.

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
    pub functions: Vec<FunctionInfo>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassInfo {
    pub name: String,
    /// Fully-qualified identifier (`package.module.Class`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyInfo>,
    #[serde(skip_serializing_if = "is_false")]
    pub entry_point: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_deprecated: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
    #[serde(skip)]
    pub derived: Derived,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MethodInfo {
    pub name: String,
    /// Parameter list as written, e.g. `(self, message: ChatMessage)`.
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_async: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_classmethod: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_staticmethod: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ret: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FunctionInfo {
    pub name: String,
    pub signature: String,
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl NamedType for ClassInfo {
    fn name(&self) -> &str {
        &self.name
    }

    fn qualified_id(&self) -> Option<&str> {
        self.id.as_deref()
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
                signature: m.signature.clone(),
            })
            .collect()
    }

    fn append_referenced_types(&self, universe: &HashSet<String>, out: &mut HashSet<String>) {
        if let Some(base) = &self.base {
            collect_head_ref(base, universe, out);
        }
        for method in &self.methods {
            collect_signature_refs(&method.signature, universe, out);
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
        Language::Python
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
        self.all_classes().map(|c| c as &dyn NamedType).collect()
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
                            signature: f.signature.clone(),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ret_and_dependencies_round_trip() {
        let index = ApiIndex {
            package: "acme-chat".to_string(),
            modules: vec![ModuleInfo {
                name: "acme.chat".to_string(),
                classes: vec![ClassInfo {
                    name: "ChatClient".to_string(),
                    methods: vec![MethodInfo {
                        name: "send".to_string(),
                        signature: "(self, message: ChatMessage)".to_string(),
                        ret: Some("ChatResponse".to_string()),
                        is_async: true,
                        ..MethodInfo::default()
                    }],
                    ..ClassInfo::default()
                }],
                functions: vec![FunctionInfo {
                    name: "connect".to_string(),
                    signature: "(endpoint: str)".to_string(),
                    ret: Some("ChatClient".to_string()),
                    ..FunctionInfo::default()
                }],
            }],
            dependencies: vec![DependencyInfo {
                package: "azure-core".to_string(),
                types: vec!["Pipeline".to_string()],
            }],
            ..ApiIndex::default()
        };

        let json = index.to_json(false);
        assert!(json.contains("\"ret\":\"ChatResponse\""));
        assert!(json.contains("\"dependencies\""));
        let back: ApiIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(index, back);
    }

    #[test]
    fn property_type_key_is_type() {
        let prop = PropertyInfo {
            name: "endpoint".to_string(),
            ty: Some("str".to_string()),
            doc: None,
        };
        assert_eq!(
            serde_json::to_string(&prop).unwrap(),
            r#"{"name":"endpoint","type":"str"}"#
        );
    }

    #[test]
    fn free_functions_carry_module_name() {
        let index = ApiIndex {
            package: "p".to_string(),
            modules: vec![ModuleInfo {
                name: "p.util".to_string(),
                functions: vec![FunctionInfo {
                    name: "helper".to_string(),
                    signature: "()".to_string(),
                    ..FunctionInfo::default()
                }],
                ..ModuleInfo::default()
            }],
            ..ApiIndex::default()
        };
        let funcs = IndexBase::free_functions(&index);
        assert_eq!(funcs.len(), 1);
        assert_eq!(funcs[0].0, "p.util");
        assert_eq!(funcs[0].1.name, "helper");
    }
}
