//! Java usage analysis.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::surface::{ApiSurface, AssignSource, SyntaxProfile, TypeSurface};
use super::UsageIndex;
use crate::model::generic_head;
use crate::model::java::ApiIndex;

static ASSIGN_NEW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*=\s*new\s+([A-Za-z_]\w*)\s*[(<]").unwrap());

static CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)\.([A-Za-z_]\w*)\s*\(").unwrap()
});

static CHAINED_CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)\.([A-Za-z_]\w*)\((?:[^()]*)\)\.([A-Za-z_]\w*)\s*\(",
    )
    .unwrap()
});

fn build_surface(index: &ApiIndex) -> ApiSurface {
    let mut surface = ApiSurface::default();
    for pkg in &index.packages {
        for class in pkg
            .classes
            .iter()
            .chain(pkg.interfaces.iter())
            .chain(pkg.annotations.iter())
        {
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
            for method in &class.methods {
                entry.operations.push((method.name.clone(), method.sig.clone()));
                if let Some(ret) = &method.ret {
                    entry
                        .op_returns
                        .insert(method.name.clone(), generic_head(ret).to_string());
                }
            }
            for field in &class.fields {
                if let Some(ty) = &field.ty {
                    entry
                        .member_types
                        .insert(field.name.clone(), generic_head(ty).to_string());
                }
            }
            surface.insert(&class.name, entry);
        }
    }
    surface.finalize();
    surface
}

fn profile() -> SyntaxProfile {
    SyntaxProfile {
        extensions: &[".java"],
        assignments: vec![(ASSIGN_NEW_RE.clone(), AssignSource::TypeName)],
        call: CALL_RE.clone(),
        chained_call: Some(CHAINED_CALL_RE.clone()),
        free_call: None,
    }
}

/// Analyze a user source tree against a Java API index.
pub fn analyze(source: &Path, index: &ApiIndex) -> UsageIndex {
    let surface = build_surface(index);
    super::surface::scan_source_tree(source, &surface, &profile())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::java::{ClassInfo, MethodInfo, PackageInfo};
    use std::fs;
    use tempfile::TempDir;

    fn method(name: &str, sig: &str, ret: Option<&str>) -> MethodInfo {
        MethodInfo {
            name: name.to_string(),
            sig: sig.to_string(),
            ret: ret.map(str::to_string),
            modifiers: vec!["public".to_string()],
            ..MethodInfo::default()
        }
    }

    fn widget_index() -> ApiIndex {
        ApiIndex {
            package: "com.acme.widgets".to_string(),
            packages: vec![PackageInfo {
                name: "com.acme.widgets".to_string(),
                classes: vec![ClassInfo {
                    name: "WidgetClient".to_string(),
                    kind: "class".to_string(),
                    entry_point: true,
                    methods: vec![
                        method("getWidget", "(String id)", Some("Widget")),
                        method("getBuilder", "()", Some("WidgetBuilder")),
                    ],
                    ..ClassInfo::default()
                }],
                interfaces: vec![],
                enums: vec![],
                annotations: vec![],
            }],
            ..ApiIndex::default()
        }
    }

    #[test]
    fn typed_receiver_matches() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("App.java"),
            "WidgetClient client = new WidgetClient(endpoint);\nclient.getWidget(\"a\");\n",
        )
        .unwrap();
        let usage = analyze(dir.path(), &widget_index());
        assert!(usage
            .covered_operations
            .iter()
            .any(|c| c.client_type == "WidgetClient" && c.operation == "getWidget"));
    }

    #[test]
    fn foreign_receiver_is_dropped() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("App.java"),
            "StringBuilder sb = new StringBuilder();\nsb.getWidget(\"a\");\n",
        )
        .unwrap();
        let usage = analyze(dir.path(), &widget_index());
        assert!(usage.covered_operations.is_empty());
    }
}
