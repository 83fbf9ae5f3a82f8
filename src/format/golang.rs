//! Go-flavored stub rendering.

use crate::model::golang::{ApiIndex, FuncApi, IfaceApi, StructApi};
use crate::model::NamedType;
use crate::usage::UsageIndex;
use crate::xref;

use super::{coverage_summary, dependency_section, ContainerStyle, RenderPlan, TypeStub};

fn type_params(params: &[String]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!("[{}]", params.join(", "))
    }
}

/// `func Name(...) Ret` for constructors (no receiver), `func (Recv)
/// Name(...) Ret` for methods.
fn func_line(func: &FuncApi) -> String {
    let mut out = String::from("func ");
    if let Some(receiver) = func.receiver.as_deref().filter(|r| !r.is_empty()) {
        out.push_str(&format!("({}) ", receiver));
    }
    out.push_str(&func.name);
    out.push_str(&type_params(&func.type_params));
    out.push_str(func.sig.as_deref().unwrap_or("()"));
    if let Some(ret) = &func.ret {
        out.push_str(&format!(" {}", ret));
    }
    out.push('\n');
    out
}

fn render_struct(st: &StructApi) -> String {
    let mut out = String::new();
    if let Some(doc) = &st.doc {
        out.push_str(&format!("// {}\n", doc));
    }
    if st.is_deprecated {
        out.push_str("// Deprecated.\n");
    }
    out.push_str(&format!("type {}{} struct {{\n", st.name, type_params(&st.type_params)));
    for embed in &st.embeds {
        out.push_str(&format!("\t{}\n", embed));
    }
    for field in &st.fields {
        match &field.ty {
            Some(ty) => out.push_str(&format!("\t{} {}\n", field.name, ty)),
            None => out.push_str(&format!("\t{}\n", field.name)),
        }
    }
    out.push_str("}\n");
    for method in &st.methods {
        out.push_str(&func_line(method));
    }
    out
}

fn render_interface(iface: &IfaceApi) -> String {
    let mut out = String::new();
    if let Some(doc) = &iface.doc {
        out.push_str(&format!("// {}\n", doc));
    }
    out.push_str(&format!("type {} interface {{\n", iface.name));
    for embed in &iface.embeds {
        out.push_str(&format!("\t{}\n", embed));
    }
    for method in &iface.methods {
        let mut line = format!("\t{}{}", method.name, method.sig.as_deref().unwrap_or("()"));
        if let Some(ret) = &method.ret {
            line.push_str(&format!(" {}", ret));
        }
        out.push_str(&line);
        out.push('\n');
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
        for st in &pkg.structs {
            stubs.push(TypeStub {
                name: st.name.clone(),
                container: pkg.name.clone(),
                text: render_struct(st),
                priority: st.truncation_priority(),
                is_client: st.derived.is_client,
                is_error: st.is_error,
                is_model: st.derived.is_model,
            });
        }
        for iface in &pkg.interfaces {
            stubs.push(TypeStub {
                name: iface.name.clone(),
                container: pkg.name.clone(),
                text: render_interface(iface),
                priority: iface.truncation_priority(),
                is_client: iface.derived.is_client,
                is_error: false,
                is_model: false,
            });
        }
        for alias in &pkg.types {
            let target = alias.ty.as_deref().unwrap_or("any");
            stubs.push(TypeStub {
                name: alias.name.clone(),
                container: pkg.name.clone(),
                text: format!("type {} {}\n", alias.name, target),
                priority: alias.truncation_priority(),
                is_client: false,
                is_error: false,
                is_model: false,
            });
        }
        for func in &pkg.functions {
            stubs.push(TypeStub {
                name: func.name.clone(),
                container: pkg.name.clone(),
                text: func_line(func),
                priority: crate::model::PRIORITY_OTHER,
                is_client: false,
                is_error: false,
                is_model: false,
            });
        }
        if !pkg.constants.is_empty() {
            let mut text = String::from("const (\n");
            for c in &pkg.constants {
                match (&c.ty, &c.value) {
                    (Some(ty), Some(value)) => {
                        text.push_str(&format!("\t{} {} = {}\n", c.name, ty, value))
                    }
                    (Some(ty), None) => text.push_str(&format!("\t{} {}\n", c.name, ty)),
                    (None, Some(value)) => text.push_str(&format!("\t{} = {}\n", c.name, value)),
                    (None, None) => text.push_str(&format!("\t{}\n", c.name)),
                }
            }
            text.push_str(")\n");
            stubs.push(TypeStub {
                name: format!("{}.const", pkg.name),
                container: pkg.name.clone(),
                text,
                priority: crate::model::PRIORITY_OTHER,
                is_client: false,
                is_error: false,
                is_model: false,
            });
        }
        if !pkg.variables.is_empty() {
            let mut text = String::from("var (\n");
            for v in &pkg.variables {
                match &v.ty {
                    Some(ty) => text.push_str(&format!("\t{} {}\n", v.name, ty)),
                    None => text.push_str(&format!("\t{}\n", v.name)),
                }
            }
            text.push_str(")\n");
            stubs.push(TypeStub {
                name: format!("{}.var", pkg.name),
                container: pkg.name.clone(),
                text,
                priority: crate::model::PRIORITY_OTHER,
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
            open: |name| format!("package {}", name),
            close: None,
            indent: "",
        },
    }
}

/// Render the index as Go-flavored stubs, optionally under a budget.
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
    use crate::model::golang::{ConstApi, FieldApi, PackageApi, VarApi};

    fn sample_index() -> ApiIndex {
        ApiIndex {
            package: "github.com/acme/widgets".to_string(),
            packages: vec![PackageApi {
                name: "widgets".to_string(),
                structs: vec![StructApi {
                    name: "Client".to_string(),
                    type_params: vec!["T comparable".to_string()],
                    fields: vec![FieldApi {
                        name: "Endpoint".to_string(),
                        ty: Some("string".to_string()),
                        doc: None,
                    }],
                    methods: vec![FuncApi {
                        name: "GetWidget".to_string(),
                        sig: Some("(ctx context.Context, id string)".to_string()),
                        ret: Some("(*Widget, error)".to_string()),
                        receiver: Some("*Client".to_string()),
                        is_method: true,
                        ..FuncApi::default()
                    }],
                    ..StructApi::default()
                }],
                interfaces: vec![IfaceApi {
                    name: "Pager".to_string(),
                    methods: vec![FuncApi {
                        name: "Next".to_string(),
                        sig: Some("()".to_string()),
                        ret: Some("bool".to_string()),
                        ..FuncApi::default()
                    }],
                    ..IfaceApi::default()
                }],
                functions: vec![FuncApi {
                    name: "NewClient".to_string(),
                    sig: Some("(endpoint string)".to_string()),
                    ret: Some("*Client".to_string()),
                    ..FuncApi::default()
                }],
                constants: vec![ConstApi {
                    name: "DefaultLimit".to_string(),
                    ty: None,
                    value: Some("50".to_string()),
                }],
                variables: vec![VarApi {
                    name: "ErrNotFound".to_string(),
                    ty: Some("error".to_string()),
                }],
                ..PackageApi::default()
            }],
            ..ApiIndex::default()
        }
    }

    #[test]
    fn constructors_have_no_receiver_and_methods_do() {
        let text = format(&sample_index(), None);
        assert!(text.contains("func NewClient(endpoint string) *Client"));
        assert!(text.contains("func (*Client) GetWidget(ctx context.Context, id string) (*Widget, error)"));
        assert!(!text.contains("func () NewClient"));
    }

    #[test]
    fn type_params_render_between_name_and_fields() {
        let text = format(&sample_index(), None);
        assert!(text.contains("type Client[T comparable] struct {"));
    }

    #[test]
    fn const_and_var_groups_render() {
        let text = format(&sample_index(), None);
        assert!(text.contains("const (\n\tDefaultLimit = 50\n)"));
        assert!(text.contains("var (\n\tErrNotFound error\n)"));
    }

    #[test]
    fn interface_block_lists_method_set() {
        let text = format(&sample_index(), None);
        assert!(text.contains("type Pager interface {\n\tNext() bool\n}"));
    }
}
