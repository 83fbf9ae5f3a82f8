//! TypeScript usage analysis.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::surface::{ApiSurface, AssignSource, FunctionSurface, SyntaxProfile, TypeSurface};
use super::UsageIndex;
use crate::model::generic_head;
use crate::model::typescript::ApiIndex;

static ASSIGN_NEW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:const|let|var)\s+(\w+)\s*=\s*new\s+([A-Za-z_]\w*)\s*\(").unwrap());

static ASSIGN_FACTORY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:const|let|var)\s+(\w+)\s*=\s*(?:await\s+)?([a-z_]\w*)\s*\(").unwrap()
});

static CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z_$]\w*(?:\.[A-Za-z_$]\w*)*)\.([A-Za-z_$]\w*)\s*\(").unwrap()
});

static CHAINED_CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([A-Za-z_$]\w*(?:\.[A-Za-z_$]\w*)*)\.([A-Za-z_$]\w*)\((?:[^()]*)\)\.([A-Za-z_$]\w*)\s*\(",
    )
    .unwrap()
});

static FREE_CALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[\s=(,\[])([a-z_]\w*)\s*\(").unwrap());

/// `Promise<Widget>` chains as `Widget`.
fn unwrap_promise(ret: &str) -> String {
    let head = generic_head(ret);
    if head == "Promise" && ret.contains('<') {
        let inner = &ret[ret.find('<').unwrap() + 1..ret.rfind('>').unwrap_or(ret.len())];
        return generic_head(inner).trim_end_matches("[]").to_string();
    }
    head.to_string()
}

fn build_surface(index: &ApiIndex) -> ApiSurface {
    let mut surface = ApiSurface::default();
    for module in &index.modules {
        for class in &module.classes {
            let mut entry = TypeSurface {
                implements: class
                    .implements
                    .iter()
                    .map(|i| generic_head(i).to_string())
                    .collect(),
                base: class.extends.clone(),
                entry: class.entry_point,
                ..TypeSurface::default()
            };
            for m in &class.methods {
                entry.operations.push((m.name.clone(), m.sig.clone()));
                if let Some(ret) = &m.ret {
                    entry.op_returns.insert(m.name.clone(), unwrap_promise(ret));
                }
            }
            for p in &class.properties {
                if let Some(ty) = &p.ty {
                    entry
                        .member_types
                        .insert(p.name.clone(), generic_head(ty).to_string());
                }
            }
            surface.insert(&class.name, entry);
        }
        for iface in &module.interfaces {
            let mut entry = TypeSurface {
                entry: iface.entry_point,
                ..TypeSurface::default()
            };
            for m in &iface.methods {
                entry.operations.push((m.name.clone(), m.sig.clone()));
                if let Some(ret) = &m.ret {
                    entry.op_returns.insert(m.name.clone(), unwrap_promise(ret));
                }
            }
            for p in &iface.properties {
                if let Some(ty) = &p.ty {
                    entry
                        .member_types
                        .insert(p.name.clone(), generic_head(ty).to_string());
                }
            }
            surface.insert(&iface.name, entry);
        }
        for function in &module.functions {
            surface.functions.push(FunctionSurface {
                container: module.name.clone(),
                name: function.name.clone(),
                signature: function.sig.clone(),
                ret: function.ret.as_deref().map(unwrap_promise),
            });
        }
    }
    surface.finalize();
    surface
}

fn profile() -> SyntaxProfile {
    SyntaxProfile {
        extensions: &[".ts", ".tsx", ".js", ".mjs"],
        assignments: vec![
            (ASSIGN_NEW_RE.clone(), AssignSource::TypeName),
            (ASSIGN_FACTORY_RE.clone(), AssignSource::FunctionReturn),
        ],
        call: CALL_RE.clone(),
        chained_call: Some(CHAINED_CALL_RE.clone()),
        free_call: Some(FREE_CALL_RE.clone()),
    }
}

/// Analyze a user source tree against a TypeScript API index.
pub fn analyze(source: &Path, index: &ApiIndex) -> UsageIndex {
    let surface = build_surface(index);
    super::surface::scan_source_tree(source, &surface, &profile())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::typescript::{
        ClassInfo, InterfaceInfo, MethodInfo, ModuleInfo, PropertyInfo,
    };
    use std::fs;
    use tempfile::TempDir;

    fn widget_index() -> ApiIndex {
        ApiIndex {
            package: "@acme/widgets".to_string(),
            modules: vec![ModuleInfo {
                name: "src/client".to_string(),
                classes: vec![
                    ClassInfo {
                        name: "WidgetClient".to_string(),
                        entry_point: true,
                        methods: vec![
                            MethodInfo {
                                name: "getWidget".to_string(),
                                sig: "(id: string)".to_string(),
                                ret: Some("Promise<Widget>".to_string()),
                                is_async: true,
                                ..MethodInfo::default()
                            },
                            MethodInfo {
                                name: "close".to_string(),
                                sig: "()".to_string(),
                                ..MethodInfo::default()
                            },
                        ],
                        properties: vec![PropertyInfo {
                            name: "admin".to_string(),
                            ty: Some("AdminOperations".to_string()),
                            ..PropertyInfo::default()
                        }],
                        ..ClassInfo::default()
                    },
                    ClassInfo {
                        name: "DefaultAdmin".to_string(),
                        implements: vec!["AdminOperations".to_string()],
                        methods: vec![MethodInfo {
                            name: "purge".to_string(),
                            sig: "()".to_string(),
                            ..MethodInfo::default()
                        }],
                        ..ClassInfo::default()
                    },
                ],
                interfaces: vec![InterfaceInfo {
                    name: "AdminOperations".to_string(),
                    methods: vec![MethodInfo {
                        name: "purge".to_string(),
                        sig: "()".to_string(),
                        ..MethodInfo::default()
                    }],
                    ..InterfaceInfo::default()
                }],
                ..ModuleInfo::default()
            }],
            ..ApiIndex::default()
        }
    }

    #[test]
    fn receiver_via_new_and_interface_subclient() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app.ts"),
            "const client = new WidgetClient(\"e\");\nawait client.getWidget(\"1\");\nclient.admin.purge();\n",
        )
        .unwrap();
        let usage = analyze(dir.path(), &widget_index());
        assert!(usage
            .covered_operations
            .iter()
            .any(|c| c.client_type == "WidgetClient" && c.operation == "getWidget"));
        // The property is typed as the interface; coverage lands on it.
        assert!(usage
            .covered_operations
            .iter()
            .any(|c| c.client_type == "AdminOperations" && c.operation == "purge"));
    }

    #[test]
    fn implementation_covers_the_interface_surface() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app.ts"),
            "const admin = new DefaultAdmin();\nadmin.purge();\n",
        )
        .unwrap();
        let usage = analyze(dir.path(), &widget_index());
        assert!(usage
            .covered_operations
            .iter()
            .any(|c| c.client_type == "AdminOperations" && c.operation == "purge"));
    }

    #[test]
    fn unknown_js_object_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app.ts"),
            "const thing = new EventEmitter();\nthing.close();\n",
        )
        .unwrap();
        let usage = analyze(dir.path(), &widget_index());
        assert!(usage.covered_operations.is_empty());
    }
}
