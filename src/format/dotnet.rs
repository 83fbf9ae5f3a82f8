//! C#-flavored stub rendering.

use crate::model::dotnet::{ApiIndex, MemberInfo, TypeInfo};
use crate::model::NamedType;
use crate::usage::UsageIndex;
use crate::xref;

use super::{coverage_summary, dependency_section, ContainerStyle, RenderPlan, TypeStub};

fn member_line(member: &MemberInfo, out: &mut String) {
    if let Some(doc) = &member.doc {
        out.push_str(&format!("    /// {}\n", doc));
    }
    if member.is_deprecated {
        out.push_str("    [Obsolete]\n");
    }
    out.push_str("    ");
    out.push_str(member.signature.trim());
    if !member.signature.trim_end().ends_with('}') {
        out.push(';');
    }
    out.push('\n');
}

fn render_type(ty: &TypeInfo) -> String {
    let mut out = String::new();
    if let Some(doc) = &ty.doc {
        out.push_str(&format!("/// {}\n", doc));
    }
    if ty.is_deprecated {
        out.push_str("[Obsolete]\n");
    }

    if ty.kind == "enum" {
        out.push_str(&format!("public enum {} {{ {} }}\n", ty.name, ty.values.join(", ")));
        return out;
    }
    if ty.kind == "delegate" {
        // The Invoke member carries the delegate shape.
        if let Some(invoke) = ty.members.iter().find(|m| m.name == "Invoke") {
            let shape = invoke.signature.replacen("Invoke", &ty.name, 1);
            out.push_str(&format!("public delegate {};\n", shape));
            return out;
        }
    }

    let mut decl = format!("public {} {}", ty.kind, ty.name);
    let mut bases: Vec<String> = Vec::new();
    if let Some(base) = &ty.base {
        bases.push(base.clone());
    }
    bases.extend(ty.interfaces.iter().cloned());
    if !bases.is_empty() {
        decl.push_str(&format!(" : {}", bases.join(", ")));
    }
    out.push_str(&decl);
    out.push_str(" {\n");

    // Declaration order for behavior members, then static properties ahead
    // of instance properties.
    for member in &ty.members {
        if member.kind != "property" {
            member_line(member, &mut out);
        }
    }
    for member in &ty.members {
        if member.kind == "property" && member.is_static {
            member_line(member, &mut out);
        }
    }
    for member in &ty.members {
        if member.kind == "property" && !member.is_static {
            member_line(member, &mut out);
        }
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
    for ns in &index.namespaces {
        for ty in &ns.types {
            stubs.push(TypeStub {
                name: ty.name.clone(),
                container: ns.name.clone(),
                text: render_type(ty),
                priority: ty.truncation_priority(),
                is_client: ty.derived.is_client,
                is_error: ty.is_error,
                is_model: ty.derived.is_model,
            });
        }
    }

    RenderPlan {
        header,
        stubs,
        dependency_section: dependency_section(&index.dependencies, "//"),
        style: ContainerStyle {
            open: |name| format!("namespace {} {{", name),
            close: Some("}"),
            indent: "    ",
        },
    }
}

/// Render the index as C#-flavored stubs, optionally under a budget.
pub fn format(index: &ApiIndex, budget: Option<usize>) -> String {
    let graph = xref::build_dependency_graph(index);
    super::render(build_plan(index), &graph, budget)
}

/// Coverage-aware variant: a commented summary block precedes the stubs.
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
    use crate::model::dotnet::{MemberInfo, NamespaceInfo};
    use crate::model::{Derived, PRIORITY_CLIENT, PRIORITY_MODEL};

    fn client_type() -> TypeInfo {
        TypeInfo {
            name: "ChatClient".to_string(),
            kind: "class".to_string(),
            entry_point: true,
            doc: Some("Entry point for chat.".to_string()),
            members: vec![
                MemberInfo {
                    name: "Send".to_string(),
                    kind: "method".to_string(),
                    signature: "ChatResponse Send(ChatMessage message)".to_string(),
                    ..MemberInfo::default()
                },
                MemberInfo {
                    name: "Endpoint".to_string(),
                    kind: "property".to_string(),
                    signature: "string Endpoint { get; set; }".to_string(),
                    ..MemberInfo::default()
                },
                MemberInfo {
                    name: "Version".to_string(),
                    kind: "property".to_string(),
                    signature: "static string Version { get; }".to_string(),
                    is_static: true,
                    ..MemberInfo::default()
                },
            ],
            derived: Derived {
                is_client: true,
                is_model: false,
                priority: PRIORITY_CLIENT,
            },
            ..TypeInfo::default()
        }
    }

    fn model_type(name: &str) -> TypeInfo {
        TypeInfo {
            name: name.to_string(),
            kind: "class".to_string(),
            members: vec![MemberInfo {
                name: "Text".to_string(),
                kind: "property".to_string(),
                signature: "string Text { get; set; }".to_string(),
                ..MemberInfo::default()
            }],
            derived: Derived {
                is_client: false,
                is_model: true,
                priority: PRIORITY_MODEL,
            },
            ..TypeInfo::default()
        }
    }

    fn index_with_models(extra_models: usize) -> ApiIndex {
        let mut types = vec![client_type(), model_type("ChatMessage")];
        for i in 0..extra_models {
            types.push(model_type(&format!("Unrelated{:02}", i)));
        }
        ApiIndex {
            package: "Acme.Chat".to_string(),
            namespaces: vec![NamespaceInfo {
                name: "Acme.Chat".to_string(),
                types,
            }],
            ..ApiIndex::default()
        }
    }

    #[test]
    fn groups_under_namespace_with_static_properties_first() {
        let text = format(&index_with_models(0), None);
        assert!(text.contains("namespace Acme.Chat {"));
        assert!(text.contains("/// Entry point for chat."));
        let static_pos = text.find("static string Version").unwrap();
        let instance_pos = text.find("string Endpoint").unwrap();
        assert!(static_pos < instance_pos);
    }

    #[test]
    fn small_budget_keeps_client_and_its_parameter_types() {
        // Scenario: one client, its message type, and 48 unrelated models.
        let index = index_with_models(48);
        let text = format(&index, Some(1500));
        assert!(text.contains("ChatClient"));
        assert!(text.contains("ChatMessage"));
        assert!(text.contains("truncated"));
        assert!(text.len() <= 1500 + super::super::TRUNCATION_MARKER.len() + 2);
    }

    #[test]
    fn enum_and_deprecated_render() {
        let mut index = index_with_models(0);
        index.namespaces[0].types.push(TypeInfo {
            name: "ChatRole".to_string(),
            kind: "enum".to_string(),
            values: vec!["System".to_string(), "User".to_string()],
            is_deprecated: true,
            ..TypeInfo::default()
        });
        let text = format(&index, None);
        assert!(text.contains("[Obsolete]"));
        assert!(text.contains("public enum ChatRole { System, User }"));
    }

    #[test]
    fn dependency_section_lists_external_types() {
        let mut index = index_with_models(0);
        index.dependencies.push(crate::model::DependencyInfo {
            package: "Azure.Core".to_string(),
            types: vec!["TokenCredential".to_string()],
        });
        let text = format(&index, None);
        assert!(text.contains("// Dependency Types"));
        assert!(text.contains("//   Azure.Core: TokenCredential"));
    }

    #[test]
    fn fully_covered_summary_reads_covered() {
        let index = index_with_models(0);
        let usage = UsageIndex::default();
        let text = format_with_coverage(&index, &usage, None);
        assert!(text.starts_with("// All operations are covered"));
    }
}
