//! C# usage analysis.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::surface::{ApiSurface, AssignSource, SyntaxProfile, TypeSurface};
use super::UsageIndex;
use crate::model::dotnet::ApiIndex;
use crate::model::generic_head;

static ASSIGN_NEW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*=\s*new\s+([A-Za-z_]\w*)\s*[({]").unwrap());

static CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)\.([A-Za-z_]\w*)\s*\(").unwrap()
});

static CHAINED_CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)\.([A-Za-z_]\w*)\((?:[^()]*)\)\.([A-Za-z_]\w*)\s*\(",
    )
    .unwrap()
});

/// `Task<ChatResponse>` chains as `ChatResponse`; bare `Task` chains as
/// nothing useful.
fn unwrap_async(ret: &str) -> String {
    let head = generic_head(ret);
    if (head == "Task" || head == "ValueTask") && ret.contains('<') {
        let inner = &ret[ret.find('<').unwrap() + 1..ret.rfind('>').unwrap_or(ret.len())];
        return generic_head(inner).to_string();
    }
    head.to_string()
}

/// Declared type of a member from its rendered signature: `Ret Name(...)`
/// for methods, `Type Name { get; ... }` for properties, `Type Name` for
/// fields.
fn declared_type(signature: &str, member_name: &str) -> Option<String> {
    let marker = format!(" {}", member_name);
    let idx = signature.find(&marker)?;
    let ty = signature[..idx].trim();
    if ty.is_empty() {
        None
    } else {
        Some(ty.to_string())
    }
}

fn build_surface(index: &ApiIndex) -> ApiSurface {
    let mut surface = ApiSurface::default();
    for ty in index.all_types() {
        let mut entry = TypeSurface {
            implements: ty.interfaces.iter().map(|i| generic_head(i).to_string()).collect(),
            base: ty.base.clone(),
            entry: ty.entry_point,
            ..TypeSurface::default()
        };
        for member in &ty.members {
            match member.kind.as_str() {
                "method" => {
                    entry
                        .operations
                        .push((member.name.clone(), member.signature.clone()));
                    if let Some(ret) = declared_type(&member.signature, &member.name) {
                        entry
                            .op_returns
                            .insert(member.name.clone(), unwrap_async(&ret));
                    }
                }
                "property" | "field" => {
                    if let Some(declared) = declared_type(&member.signature, &member.name) {
                        entry
                            .member_types
                            .insert(member.name.clone(), generic_head(&declared).to_string());
                    }
                }
                _ => {}
            }
        }
        surface.insert(&ty.name, entry);
    }
    surface.finalize();
    surface
}

fn profile() -> SyntaxProfile {
    SyntaxProfile {
        extensions: &[".cs"],
        assignments: vec![(ASSIGN_NEW_RE.clone(), AssignSource::TypeName)],
        call: CALL_RE.clone(),
        chained_call: Some(CHAINED_CALL_RE.clone()),
        free_call: None,
    }
}

/// Analyze a user source tree against a .NET API index.
pub fn analyze(source: &Path, index: &ApiIndex) -> UsageIndex {
    let surface = build_surface(index);
    super::surface::scan_source_tree(source, &surface, &profile())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dotnet::{MemberInfo, NamespaceInfo, TypeInfo};
    use std::fs;
    use tempfile::TempDir;

    fn method(name: &str, signature: &str) -> MemberInfo {
        MemberInfo {
            name: name.to_string(),
            kind: "method".to_string(),
            signature: signature.to_string(),
            ..MemberInfo::default()
        }
    }

    fn property(name: &str, signature: &str) -> MemberInfo {
        MemberInfo {
            name: name.to_string(),
            kind: "property".to_string(),
            signature: signature.to_string(),
            ..MemberInfo::default()
        }
    }

    fn chat_index() -> ApiIndex {
        ApiIndex {
            package: "Acme.Chat".to_string(),
            namespaces: vec![NamespaceInfo {
                name: "Acme.Chat".to_string(),
                types: vec![
                    TypeInfo {
                        name: "ChatClient".to_string(),
                        kind: "class".to_string(),
                        entry_point: true,
                        members: vec![
                            method(
                                "GetCompletionAsync",
                                "Task<ChatResponse> GetCompletionAsync(string prompt)",
                            ),
                            method("Close", "void Close()"),
                            property("Widgets", "WidgetsClient Widgets { get; }"),
                        ],
                        ..TypeInfo::default()
                    },
                    TypeInfo {
                        name: "WidgetsClient".to_string(),
                        kind: "class".to_string(),
                        members: vec![method("ListWidgets", "List<Widget> ListWidgets()")],
                        ..TypeInfo::default()
                    },
                    TypeInfo {
                        name: "ChatResponse".to_string(),
                        kind: "class".to_string(),
                        members: vec![property("Text", "string Text { get; }")],
                        ..TypeInfo::default()
                    },
                ],
            }],
            ..ApiIndex::default()
        }
    }

    #[test]
    fn dedupes_across_files_and_anchors_first_site() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("sample1.cs"),
            "var client = new ChatClient(\"e\");\nclient.GetCompletionAsync(\"x\");\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("sample2.cs"),
            "var client = new ChatClient(\"e\");\nclient.GetCompletionAsync(\"x\");\nclient.GetCompletionAsync(\"y\");\n",
        )
        .unwrap();

        let usage = analyze(dir.path(), &chat_index());
        assert_eq!(usage.file_count, 2);
        let completions: Vec<_> = usage
            .covered_operations
            .iter()
            .filter(|c| c.operation == "GetCompletionAsync")
            .collect();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].client_type, "ChatClient");
        assert_eq!(completions[0].file, "sample1.cs");
        assert_eq!(completions[0].line, 2);
    }

    #[test]
    fn chained_property_access_resolves_subclient() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("chain.cs"),
            "var client = new ChatClient(\"e\");\nclient.Widgets.ListWidgets();\n",
        )
        .unwrap();
        let usage = analyze(dir.path(), &chat_index());
        assert!(usage
            .covered_operations
            .iter()
            .any(|c| c.client_type == "WidgetsClient" && c.operation == "ListWidgets"));
    }

    #[test]
    fn non_sdk_receivers_never_match() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("foreign.cs"),
            "var o = new object();\no.Close();\nvar h = new HttpClient();\nh.GetCompletionAsync(\"x\");\n",
        )
        .unwrap();
        let usage = analyze(dir.path(), &chat_index());
        assert!(usage.covered_operations.is_empty());
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("case.cs"),
            "var client = new ChatClient(\"e\");\nclient.getCompletionAsync(\"x\");\n",
        )
        .unwrap();
        let usage = analyze(dir.path(), &chat_index());
        assert!(usage.covered_operations.is_empty());
    }

    #[test]
    fn uncovered_operations_carry_signatures() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("partial.cs"),
            "var client = new ChatClient(\"e\");\nclient.GetCompletionAsync(\"x\");\n",
        )
        .unwrap();
        let usage = analyze(dir.path(), &chat_index());
        let close = usage
            .uncovered_operations
            .iter()
            .find(|u| u.operation == "Close")
            .unwrap();
        assert_eq!(close.client_type, "ChatClient");
        assert_eq!(close.signature, "void Close()");
    }

    #[test]
    fn empty_container_client_lists_only_subclient() {
        let mut index = chat_index();
        // Strip the container's own methods; keep the Widgets property.
        index.namespaces[0].types[0]
            .members
            .retain(|m| m.kind == "property");

        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("sub.cs"),
            "var client = new ChatClient(\"e\");\nclient.Widgets.ListWidgets();\n",
        )
        .unwrap();
        let usage = analyze(dir.path(), &index);
        assert!(usage
            .covered_operations
            .iter()
            .all(|c| c.client_type != "ChatClient"));
        assert!(usage
            .covered_operations
            .iter()
            .any(|c| c.client_type == "WidgetsClient"));
        assert!(usage
            .uncovered_operations
            .iter()
            .all(|u| u.client_type != "ChatClient"));
    }
}
