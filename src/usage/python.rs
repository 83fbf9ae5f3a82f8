//! Python usage analysis.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::surface::{ApiSurface, AssignSource, FunctionSurface, SyntaxProfile, TypeSurface};
use super::UsageIndex;
use crate::model::generic_head;
use crate::model::python::ApiIndex;

static ASSIGN_CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*=\s*([A-Z]\w*)\s*\(").unwrap());

static ASSIGN_FACTORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*=\s*(?:await\s+)?([a-z_]\w*)\s*\(").unwrap());

static CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)\.([A-Za-z_]\w*)\s*\(").unwrap()
});

static CHAINED_CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)\.([A-Za-z_]\w*)\((?:[^()]*)\)\.([A-Za-z_]\w*)\s*\(",
    )
    .unwrap()
});

static FREE_CALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[\s=(,\[])([a-z_]\w*)\s*\(").unwrap());

fn build_surface(index: &ApiIndex) -> ApiSurface {
    let mut surface = ApiSurface::default();
    for module in &index.modules {
        for class in &module.classes {
            let mut entry = TypeSurface {
                base: class.base.clone(),
                entry: class.entry_point,
                ..TypeSurface::default()
            };
            for method in &class.methods {
                if method.name == "__init__" {
                    continue;
                }
                entry
                    .operations
                    .push((method.name.clone(), method.signature.clone()));
                if let Some(ret) = &method.ret {
                    entry
                        .op_returns
                        .insert(method.name.clone(), generic_head(ret.trim_matches('"')).to_string());
                }
            }
            for property in &class.properties {
                if let Some(ty) = &property.ty {
                    entry
                        .member_types
                        .insert(property.name.clone(), generic_head(ty.trim_matches('"')).to_string());
                }
            }
            surface.insert(&class.name, entry);
        }
        for function in &module.functions {
            surface.functions.push(FunctionSurface {
                container: module.name.clone(),
                name: function.name.clone(),
                signature: function.signature.clone(),
                ret: function.ret.clone(),
            });
        }
    }
    surface.finalize();
    surface
}

fn profile() -> SyntaxProfile {
    SyntaxProfile {
        extensions: &[".py"],
        assignments: vec![
            (ASSIGN_CLASS_RE.clone(), AssignSource::TypeName),
            (ASSIGN_FACTORY_RE.clone(), AssignSource::FunctionReturn),
        ],
        call: CALL_RE.clone(),
        chained_call: Some(CHAINED_CALL_RE.clone()),
        free_call: Some(FREE_CALL_RE.clone()),
    }
}

/// Analyze a user source tree against a Python API index.
pub fn analyze(source: &Path, index: &ApiIndex) -> UsageIndex {
    let surface = build_surface(index);
    super::surface::scan_source_tree(source, &surface, &profile())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::python::{ClassInfo, FunctionInfo, MethodInfo, ModuleInfo, PropertyInfo};
    use std::fs;
    use tempfile::TempDir;

    fn method(name: &str, signature: &str, ret: Option<&str>) -> MethodInfo {
        MethodInfo {
            name: name.to_string(),
            signature: signature.to_string(),
            ret: ret.map(str::to_string),
            ..MethodInfo::default()
        }
    }

    fn widget_index() -> ApiIndex {
        ApiIndex {
            package: "acme-widgets".to_string(),
            modules: vec![ModuleInfo {
                name: "acme.widgets".to_string(),
                classes: vec![
                    ClassInfo {
                        name: "WidgetClient".to_string(),
                        entry_point: true,
                        methods: vec![
                            method("get_widget", "(self, widget_id: str)", Some("Widget")),
                            method("delete_widget", "(self, widget_id: str)", None),
                        ],
                        properties: vec![PropertyInfo {
                            name: "admin".to_string(),
                            ty: Some("AdminClient".to_string()),
                            doc: None,
                        }],
                        ..ClassInfo::default()
                    },
                    ClassInfo {
                        name: "AdminClient".to_string(),
                        methods: vec![method("purge", "(self)", None)],
                        ..ClassInfo::default()
                    },
                    ClassInfo {
                        name: "Widget".to_string(),
                        properties: vec![PropertyInfo {
                            name: "name".to_string(),
                            ty: Some("str".to_string()),
                            doc: None,
                        }],
                        ..ClassInfo::default()
                    },
                ],
                functions: vec![FunctionInfo {
                    name: "connect".to_string(),
                    signature: "(endpoint: str)".to_string(),
                    ret: Some("WidgetClient".to_string()),
                    ..FunctionInfo::default()
                }],
            }],
            ..ApiIndex::default()
        }
    }

    #[test]
    fn constructor_assignment_resolves_receiver() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app.py"),
            "client = WidgetClient(\"endpoint\")\nclient.get_widget(\"w1\")\n",
        )
        .unwrap();
        let usage = analyze(dir.path(), &widget_index());
        assert!(usage
            .covered_operations
            .iter()
            .any(|c| c.client_type == "WidgetClient" && c.operation == "get_widget"));
    }

    #[test]
    fn factory_function_tracks_both_function_and_receiver() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app.py"),
            "client = connect(\"endpoint\")\nclient.delete_widget(\"w1\")\n",
        )
        .unwrap();
        let usage = analyze(dir.path(), &widget_index());
        assert!(usage
            .covered_operations
            .iter()
            .any(|c| c.client_type == "acme.widgets" && c.operation == "connect"));
        assert!(usage
            .covered_operations
            .iter()
            .any(|c| c.client_type == "WidgetClient" && c.operation == "delete_widget"));
    }

    #[test]
    fn unique_method_name_matches_without_receiver_type() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app.py"),
            "def handle(client):\n    client.purge()\n",
        )
        .unwrap();
        let usage = analyze(dir.path(), &widget_index());
        assert!(usage
            .covered_operations
            .iter()
            .any(|c| c.client_type == "AdminClient" && c.operation == "purge"));
    }

    #[test]
    fn ambiguous_method_names_are_dropped() {
        let mut index = widget_index();
        // A second, unrelated class that also defines purge().
        index.modules[0].classes.push(ClassInfo {
            name: "CacheClient".to_string(),
            entry_point: true,
            methods: vec![method("purge", "(self)", None)],
            ..ClassInfo::default()
        });
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app.py"),
            "def handle(client):\n    client.purge()\n",
        )
        .unwrap();
        let usage = analyze(dir.path(), &index);
        assert!(usage
            .covered_operations
            .iter()
            .all(|c| c.operation != "purge"));
    }

    #[test]
    fn shared_root_attributes_to_the_root() {
        let mut index = widget_index();
        index.modules[0].classes.push(ClassInfo {
            name: "ScopedAdminClient".to_string(),
            base: Some("AdminClient".to_string()),
            methods: vec![method("purge", "(self)", None)],
            ..ClassInfo::default()
        });
        // Make the subclass reachable so it participates in the surface.
        index.modules[0].classes[0].properties.push(PropertyInfo {
            name: "scoped_admin".to_string(),
            ty: Some("ScopedAdminClient".to_string()),
            doc: None,
        });
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app.py"),
            "def handle(client):\n    client.purge()\n",
        )
        .unwrap();
        let usage = analyze(dir.path(), &index);
        assert!(usage
            .covered_operations
            .iter()
            .any(|c| c.client_type == "AdminClient" && c.operation == "purge"));
    }

    #[test]
    fn fluent_self_return_keeps_the_root() {
        let index = ApiIndex {
            package: "fluent".to_string(),
            modules: vec![ModuleInfo {
                name: "fluent".to_string(),
                classes: vec![ClassInfo {
                    name: "QueryBuilder".to_string(),
                    entry_point: true,
                    methods: vec![
                        method("filter", "(self, expr: str)", Some("QueryBuilder")),
                        method("run", "(self)", None),
                    ],
                    ..ClassInfo::default()
                }],
                ..ModuleInfo::default()
            }],
            ..ApiIndex::default()
        };
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app.py"),
            "q = QueryBuilder()\nq.filter(\"a\").run()\n",
        )
        .unwrap();
        let usage = analyze(dir.path(), &index);
        assert!(usage
            .covered_operations
            .iter()
            .any(|c| c.operation == "filter"));
        assert!(usage.covered_operations.iter().any(|c| c.operation == "run"));
    }
}
