//! Java-flavored stub rendering.

use crate::model::java::{ApiIndex, ClassInfo, MethodInfo};
use crate::model::NamedType;
use crate::usage::UsageIndex;
use crate::xref;

use super::{coverage_summary, dependency_section, ContainerStyle, RenderPlan, TypeStub};

fn method_line(method: &MethodInfo, out: &mut String) {
    if let Some(doc) = &method.doc {
        out.push_str(&format!("    /** {} */\n", doc));
    }
    out.push_str("    ");
    let mods = if method.modifiers.is_empty() {
        "public".to_string()
    } else {
        method.modifiers.join(" ")
    };
    out.push_str(&mods);
    if let Some(ret) = &method.ret {
        out.push_str(&format!(" {}", ret));
    }
    out.push_str(&format!(" {}{};\n", method.name, method.sig));
}

fn render_class(class: &ClassInfo) -> String {
    let mut out = String::new();
    if let Some(doc) = &class.doc {
        out.push_str(&format!("/** {} */\n", doc));
    }
    if class.is_deprecated {
        out.push_str("@Deprecated\n");
    }
    // The declaration keyword always matches the type's kind; a class must
    // never surface as an interface.
    let keyword = match class.kind.as_str() {
        "interface" => "interface",
        "record" => "record",
        "annotation" => "@interface",
        _ => "class",
    };
    let mut decl = format!("public {} {}", keyword, class.name);
    if let Some(extends) = &class.extends {
        decl.push_str(&format!(" extends {}", extends));
    }
    if !class.implements.is_empty() {
        decl.push_str(&format!(" implements {}", class.implements.join(", ")));
    }
    out.push_str(&decl);
    out.push_str(" {\n");
    for ctor in &class.constructors {
        out.push_str(&format!("    public {}{};\n", ctor.name, ctor.sig));
    }
    for method in &class.methods {
        method_line(method, &mut out);
    }
    for field in &class.fields {
        out.push_str("    ");
        if field.modifiers.is_empty() {
            out.push_str("public");
        } else {
            out.push_str(&field.modifiers.join(" "));
        }
        if let Some(ty) = &field.ty {
            out.push_str(&format!(" {}", ty));
        }
        out.push_str(&format!(" {};\n", field.name));
    }
    out.push_str("}\n");
    out
}

fn build_plan(index: &ApiIndex) -> RenderPlan {
    let mut header = format!("// {}", index.package);
    if let Some(version) = &index.version {
        header.push_str(&format!(" {}", version));
    }

    let mut stubs = Vec::new();
    for pkg in &index.packages {
        for class in pkg
            .classes
            .iter()
            .chain(pkg.interfaces.iter())
            .chain(pkg.annotations.iter())
        {
            stubs.push(TypeStub {
                name: class.name.clone(),
                container: pkg.name.clone(),
                text: render_class(class),
                priority: class.truncation_priority(),
                is_client: class.derived.is_client,
                is_error: class.is_error,
                is_model: class.derived.is_model,
            });
        }
        for e in &pkg.enums {
            stubs.push(TypeStub {
                name: e.name.clone(),
                container: pkg.name.clone(),
                text: format!("public enum {} {{ {} }}\n", e.name, e.values.join(", ")),
                priority: e.truncation_priority(),
                is_client: false,
                is_error: false,
                is_model: false,
            });
        }
    }

    RenderPlan {
        header,
        stubs,
        dependency_section: dependency_section(&index.dependencies, "//"),
        style: ContainerStyle {
            open: |name| format!("package {};", name),
            close: None,
            indent: "",
        },
    }
}

/// Render the index as Java-flavored stubs, optionally under a budget.
pub fn format(index: &ApiIndex, budget: Option<usize>) -> String {
    let graph = xref::build_dependency_graph(index);
    super::render(build_plan(index), &graph, budget)
}

/// Coverage-aware variant.
pub fn format_with_coverage(
    index: &ApiIndex,
    usage: &UsageIndex,
    budget: Option<usize>,
) -> String {
    let mut out = coverage_summary(usage, "//");
    out.push_str(&format(index, budget));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::java::{EnumInfo, PackageInfo};

    fn sample_index() -> ApiIndex {
        ApiIndex {
            package: "com.acme.widgets".to_string(),
            packages: vec![PackageInfo {
                name: "com.acme.widgets".to_string(),
                classes: vec![ClassInfo {
                    name: "WidgetClient".to_string(),
                    kind: "class".to_string(),
                    doc: Some("Widget service client.".to_string()),
                    constructors: vec![MethodInfo {
                        name: "WidgetClient".to_string(),
                        sig: "(String endpoint)".to_string(),
                        ..MethodInfo::default()
                    }],
                    methods: vec![MethodInfo {
                        name: "getWidget".to_string(),
                        sig: "(String id)".to_string(),
                        ret: Some("Widget".to_string()),
                        modifiers: vec!["public".to_string()],
                        ..MethodInfo::default()
                    }],
                    ..ClassInfo::default()
                }],
                interfaces: vec![ClassInfo {
                    name: "WidgetOperations".to_string(),
                    kind: "interface".to_string(),
                    methods: vec![MethodInfo {
                        name: "listWidgets".to_string(),
                        sig: "()".to_string(),
                        ret: Some("List<Widget>".to_string()),
                        modifiers: vec!["public".to_string()],
                        ..MethodInfo::default()
                    }],
                    ..ClassInfo::default()
                }],
                enums: vec![EnumInfo {
                    name: "WidgetColor".to_string(),
                    values: vec!["RED".to_string(), "BLUE".to_string()],
                    ..EnumInfo::default()
                }],
                annotations: vec![ClassInfo {
                    name: "ServiceMethod".to_string(),
                    kind: "annotation".to_string(),
                    ..ClassInfo::default()
                }],
            }],
            ..ApiIndex::default()
        }
    }

    #[test]
    fn keywords_match_kinds() {
        let text = format(&sample_index(), None);
        assert!(text.contains("public class WidgetClient {"));
        assert!(text.contains("public interface WidgetOperations {"));
        assert!(text.contains("public @interface ServiceMethod {"));
        assert!(text.contains("public enum WidgetColor { RED, BLUE }"));
        // The class never surfaces with the wrong keyword.
        assert!(!text.contains("interface WidgetClient"));
    }

    #[test]
    fn members_and_package_header_render() {
        let text = format(&sample_index(), None);
        assert!(text.contains("package com.acme.widgets;"));
        assert!(text.contains("public WidgetClient(String endpoint);"));
        assert!(text.contains("public Widget getWidget(String id);"));
        assert!(text.contains("/** Widget service client. */"));
    }
}
