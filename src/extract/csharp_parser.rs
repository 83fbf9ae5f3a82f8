//! In-process C# source parser.
//!
//! C# is the one language whose source parsing lives in the host process.
//! Lightweight line heuristics over the public surface: type declarations,
//! members, XML doc summaries, `[Obsolete]` markers, usings, and namespaces.
//! Non-public declarations are skipped entirely.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Clone, Debug, Default)]
pub(crate) struct CsFile {
    pub usings: Vec<String>,
    pub namespace: Option<String>,
    pub types: Vec<CsType>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct CsType {
    pub name: String,
    /// `class`, `interface`, `struct`, `record`, `enum`, `delegate`.
    pub kind: String,
    pub base: Option<String>,
    pub interfaces: Vec<String>,
    pub doc: Option<String>,
    pub deprecated: bool,
    pub members: Vec<CsMember>,
    pub values: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct CsMember {
    pub name: String,
    /// `method`, `property`, `field`, `ctor`, `event`, `operator`, `const`.
    pub kind: String,
    pub signature: String,
    pub is_static: bool,
    pub is_async: bool,
    pub deprecated: bool,
    pub doc: Option<String>,
}

static USING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^using\s+(?:static\s+)?([A-Za-z_][\w.]*)\s*;").unwrap());

static NAMESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^namespace\s+([A-Za-z_][\w.]*)\s*[;{]?").unwrap());

static TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^public\s+(?:static\s+|abstract\s+|sealed\s+|partial\s+|readonly\s+)*(class|interface|struct|record(?:\s+struct|\s+class)?|enum)\s+([A-Za-z_]\w*)(?:<[^>]*>)?\s*(?:\(([^)]*)\))?\s*(?::\s*([^{]+))?",
    )
    .unwrap()
});

static DELEGATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^public\s+delegate\s+(\S+)\s+([A-Za-z_]\w*)(?:<[^>]*>)?\s*\(([^)]*)\)\s*;").unwrap()
});

static METHOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^public\s+((?:static\s+|virtual\s+|override\s+|sealed\s+|abstract\s+|async\s+|new\s+|unsafe\s+)*)([A-Za-z_][\w.<>,\[\]? ]*?)\s+([A-Za-z_]\w*)(?:<[^>]*>)?\s*\(([^;{=]*)\)",
    )
    .unwrap()
});

static PROPERTY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^public\s+((?:static\s+|virtual\s+|override\s+|abstract\s+|new\s+|required\s+)*)([A-Za-z_][\w.<>,\[\]? ]*?)\s+([A-Za-z_]\w*)\s*\{\s*(get|set|init)",
    )
    .unwrap()
});

static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^public\s+((?:static\s+|readonly\s+|const\s+|volatile\s+)*)([A-Za-z_][\w.<>,\[\]? ]*?)\s+([A-Za-z_]\w*)\s*[;=]",
    )
    .unwrap()
});

static EVENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^public\s+((?:static\s+)*)event\s+([\w.<>,\[\]?]+)\s+([A-Za-z_]\w*)").unwrap()
});

static OPERATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^public\s+static\s+[\w.<>,\[\]? ]+\s+operator\s+(\S+)\s*\(([^)]*)\)").unwrap()
});

static ENUM_VALUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_]\w*)\s*(?:=\s*[^,]+)?\s*,?\s*$").unwrap());

static DOC_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").unwrap());

fn brace_delta(line: &str) -> i32 {
    let mut delta = 0i32;
    let mut in_string = false;
    let mut prev = '\0';
    for c in line.chars() {
        match c {
            '"' if prev != '\\' => in_string = !in_string,
            '{' if !in_string => delta += 1,
            '}' if !in_string => delta -= 1,
            _ => {}
        }
        prev = c;
    }
    delta
}

fn clean_doc(lines: &[String]) -> Option<String> {
    if lines.is_empty() {
        return None;
    }
    let joined = lines.join(" ");
    let stripped = DOC_TAG_RE.replace_all(&joined, "");
    let text = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn split_base_clause(clause: &str) -> (Option<String>, Vec<String>) {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in clause.chars() {
        match c {
            '<' | '(' | '[' => {
                depth += 1;
                current.push(c);
            }
            '>' | ')' | ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    let mut base = None;
    let mut interfaces = Vec::new();
    for (idx, part) in parts.into_iter().enumerate() {
        let head = crate::model::generic_head(&part).to_string();
        let is_interface_shaped = head.len() > 1
            && head.starts_with('I')
            && head.chars().nth(1).is_some_and(|c| c.is_ascii_uppercase());
        if idx == 0 && !is_interface_shaped {
            base = Some(part);
        } else {
            interfaces.push(part);
        }
    }
    (base, interfaces)
}

/// Parse one C# source file's public surface.
pub(crate) fn parse_cs_file(content: &str) -> CsFile {
    let mut file = CsFile::default();
    let mut doc_lines: Vec<String> = Vec::new();
    let mut pending_deprecated = false;
    let mut depth = 0i32;
    // Depth at which members of the current type live. C# nests types inside
    // a namespace block or at the top for file-scoped namespaces.
    let mut type_stack: Vec<(usize, i32)> = Vec::new();

    for raw_line in content.lines() {
        let line = raw_line.trim();

        if let Some(doc) = line.strip_prefix("///") {
            doc_lines.push(doc.trim().to_string());
            continue;
        }

        if line.starts_with("[Obsolete") || line.contains("[Obsolete(") {
            pending_deprecated = true;
            // Attribute lines may still carry the declaration after `]`.
            if !line.ends_with(']') {
                if let Some(rest) = line.split(']').nth(1) {
                    if rest.trim().is_empty() {
                        continue;
                    }
                }
            } else {
                continue;
            }
        } else if line.starts_with('[') && line.ends_with(']') {
            // Other attributes do not affect the surface.
            continue;
        }

        if let Some(captures) = USING_RE.captures(line) {
            file.usings.push(captures[1].to_string());
            continue;
        }

        if let Some(captures) = NAMESPACE_RE.captures(line) {
            file.namespace = Some(captures[1].to_string());
            depth += brace_delta(line);
            continue;
        }

        let before = depth;
        depth += brace_delta(line);

        while let Some((_, open_depth)) = type_stack.last() {
            if depth <= *open_depth {
                type_stack.pop();
            } else {
                break;
            }
        }

        if let Some(captures) = DELEGATE_RE.captures(line) {
            let ret = captures[1].to_string();
            let name = captures[2].to_string();
            let args = captures[3].to_string();
            file.types.push(CsType {
                name,
                kind: "delegate".to_string(),
                doc: clean_doc(&doc_lines),
                deprecated: pending_deprecated,
                members: vec![CsMember {
                    name: "Invoke".to_string(),
                    kind: "method".to_string(),
                    signature: format!("{} Invoke({})", ret, args),
                    ..CsMember::default()
                }],
                ..CsType::default()
            });
            doc_lines.clear();
            pending_deprecated = false;
            continue;
        }

        if let Some(captures) = TYPE_RE.captures(line) {
            let kind_raw = captures[1].to_string();
            let kind = if kind_raw.starts_with("record") {
                "record".to_string()
            } else {
                kind_raw
            };
            let name = captures[2].to_string();
            let (base, interfaces) = captures
                .get(4)
                .map(|m| split_base_clause(m.as_str()))
                .unwrap_or((None, Vec::new()));
            let mut cs_type = CsType {
                name,
                kind,
                base,
                interfaces,
                doc: clean_doc(&doc_lines),
                deprecated: pending_deprecated,
                ..CsType::default()
            };
            // Positional record parameters surface as properties.
            if let Some(params) = captures.get(3) {
                for param in params.as_str().split(',') {
                    let param = param.trim();
                    if param.is_empty() {
                        continue;
                    }
                    let mut pieces = param.rsplitn(2, ' ');
                    let pname = pieces.next().unwrap_or_default().trim();
                    let pty = pieces.next().unwrap_or_default().trim();
                    if pname.is_empty() || pty.is_empty() {
                        continue;
                    }
                    cs_type.members.push(CsMember {
                        name: pname.to_string(),
                        kind: "property".to_string(),
                        signature: format!("{} {} {{ get; }}", pty, pname),
                        ..CsMember::default()
                    });
                }
            }
            file.types.push(cs_type);
            type_stack.push((file.types.len() - 1, before));
            doc_lines.clear();
            pending_deprecated = false;
            continue;
        }

        let Some(&(type_idx, open_depth)) = type_stack.last() else {
            doc_lines.clear();
            pending_deprecated = false;
            continue;
        };
        // Members sit one level inside the type body, regardless of whether
        // the namespace is block- or file-scoped: `open_depth` was taken on
        // the declaration line, before the type's own brace.
        let member_depth = open_depth + 1;
        if before != member_depth {
            continue;
        }
        let current = &mut file.types[type_idx];

        if current.kind == "enum" {
            if let Some(captures) = ENUM_VALUE_RE.captures(line) {
                current.values.push(captures[1].to_string());
            }
            doc_lines.clear();
            continue;
        }

        let doc = clean_doc(&doc_lines);
        doc_lines.clear();
        let deprecated = pending_deprecated;
        pending_deprecated = false;

        if let Some(captures) = EVENT_RE.captures(line) {
            current.members.push(CsMember {
                name: captures[3].to_string(),
                kind: "event".to_string(),
                signature: format!("event {} {}", &captures[2], &captures[3]),
                is_static: captures[1].contains("static"),
                deprecated,
                doc,
                ..CsMember::default()
            });
            continue;
        }

        if let Some(captures) = OPERATOR_RE.captures(line) {
            current.members.push(CsMember {
                name: format!("operator {}", &captures[1]),
                kind: "operator".to_string(),
                signature: line.trim_start_matches("public ").trim_end_matches('{').trim().to_string(),
                is_static: true,
                deprecated,
                doc,
                ..CsMember::default()
            });
            continue;
        }

        // Constructor: `public TypeName(...)`.
        if let Some(rest) = line.strip_prefix("public ") {
            let ctor_prefix = format!("{}(", current.name);
            if rest.starts_with(&ctor_prefix) {
                let args = rest
                    .strip_prefix(&current.name.to_string())
                    .and_then(|r| r.strip_prefix('('))
                    .and_then(|r| r.split(')').next())
                    .unwrap_or_default();
                current.members.push(CsMember {
                    name: current.name.clone(),
                    kind: "ctor".to_string(),
                    signature: format!("{}({})", current.name, args),
                    deprecated,
                    doc,
                    ..CsMember::default()
                });
                continue;
            }
        }

        if let Some(captures) = PROPERTY_RE.captures(line) {
            let modifiers = captures[1].to_string();
            let accessors: String = line[line.find('{').unwrap_or(0)..].to_string();
            current.members.push(CsMember {
                name: captures[3].to_string(),
                kind: "property".to_string(),
                signature: format!("{} {} {}", &captures[2], &captures[3], accessors.trim()),
                is_static: modifiers.contains("static"),
                deprecated,
                doc,
                ..CsMember::default()
            });
            continue;
        }

        if let Some(captures) = METHOD_RE.captures(line) {
            let modifiers = captures[1].to_string();
            let ret = captures[2].trim().to_string();
            let name = captures[3].to_string();
            let args = captures[4].trim().to_string();
            // Keywords that pattern-match like a return type are not methods.
            if ret == "new" || name == current.name {
                continue;
            }
            current.members.push(CsMember {
                name: name.clone(),
                kind: "method".to_string(),
                signature: format!("{} {}({})", ret, name, args),
                is_static: modifiers.contains("static"),
                is_async: modifiers.contains("async") || ret.starts_with("Task") || ret.starts_with("ValueTask"),
                deprecated,
                doc,
                ..CsMember::default()
            });
            continue;
        }

        if let Some(captures) = FIELD_RE.captures(line) {
            let modifiers = captures[1].to_string();
            let kind = if modifiers.contains("const") { "const" } else { "field" };
            current.members.push(CsMember {
                name: captures[3].to_string(),
                kind: kind.to_string(),
                signature: format!("{} {}", captures[2].trim(), &captures[3]),
                is_static: modifiers.contains("static") || kind == "const",
                deprecated,
                doc,
                ..CsMember::default()
            });
        }
    }

    file
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
using System;
using System.Threading.Tasks;
using Azure.Core;

namespace Acme.Chat
{
    /// <summary>
    /// Client for the chat service.
    /// </summary>
    public class ChatClient : ClientBase, IDisposable
    {
        public ChatClient(string endpoint) { }

        /// <summary>Sends a message.</summary>
        public async Task<ChatResponse> SendAsync(ChatMessage message) { }

        [Obsolete("Use SendAsync")]
        public ChatResponse Send(ChatMessage message) { }

        public static string Version { get; }

        public string Endpoint { get; set; }

        public const int MaxRetries = 3;

        private void Hidden() { }
    }

    public enum ChatRole
    {
        System,
        User = 1,
        Assistant,
    }

    public delegate void ChatHandler(ChatMessage message);

    internal class Secret { }
}
"#;

    #[test]
    fn extracts_public_types_only() {
        let file = parse_cs_file(SAMPLE);
        let names: Vec<&str> = file.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["ChatClient", "ChatRole", "ChatHandler"]);
        assert_eq!(file.namespace.as_deref(), Some("Acme.Chat"));
        assert_eq!(file.usings, vec!["System", "System.Threading.Tasks", "Azure.Core"]);
    }

    #[test]
    fn reads_base_interfaces_doc_and_members() {
        let file = parse_cs_file(SAMPLE);
        let client = &file.types[0];
        assert_eq!(client.base.as_deref(), Some("ClientBase"));
        assert_eq!(client.interfaces, vec!["IDisposable"]);
        assert_eq!(client.doc.as_deref(), Some("Client for the chat service."));

        let member_names: Vec<&str> = client.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            member_names,
            vec!["ChatClient", "SendAsync", "Send", "Version", "Endpoint", "MaxRetries"]
        );

        let send_async = &client.members[1];
        assert_eq!(send_async.kind, "method");
        assert!(send_async.is_async);
        assert_eq!(send_async.doc.as_deref(), Some("Sends a message."));

        let send = &client.members[2];
        assert!(send.deprecated);

        let version = &client.members[3];
        assert_eq!(version.kind, "property");
        assert!(version.is_static);

        let max_retries = &client.members[5];
        assert_eq!(max_retries.kind, "const");
    }

    #[test]
    fn enum_values_and_delegate_shape() {
        let file = parse_cs_file(SAMPLE);
        let role = &file.types[1];
        assert_eq!(role.kind, "enum");
        assert_eq!(role.values, vec!["System", "User", "Assistant"]);

        let handler = &file.types[2];
        assert_eq!(handler.kind, "delegate");
        assert_eq!(handler.members[0].signature, "void Invoke(ChatMessage message)");
    }

    #[test]
    fn file_scoped_namespace_is_supported() {
        let src = "namespace Acme.Widgets;\n\npublic class Widget\n{\n    public string Name { get; set; }\n}\n";
        let file = parse_cs_file(src);
        assert_eq!(file.namespace.as_deref(), Some("Acme.Widgets"));
        assert_eq!(file.types.len(), 1);
        assert_eq!(file.types[0].members.len(), 1);
    }

    #[test]
    fn base_clause_splits_generic_interfaces_correctly() {
        let (base, interfaces) = split_base_clause("Dictionary<string, int>, IEnumerable<KeyValuePair<string, int>>");
        assert_eq!(base.as_deref(), Some("Dictionary<string, int>"));
        assert_eq!(interfaces, vec!["IEnumerable<KeyValuePair<string, int>>"]);
    }
}
