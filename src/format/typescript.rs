//! TypeScript-flavored stub rendering.

use crate::model::typescript::{ApiIndex, ClassInfo, InterfaceInfo, MethodInfo};
use crate::model::NamedType;
use crate::usage::UsageIndex;
use crate::xref;

use super::{coverage_summary, dependency_section, ContainerStyle, RenderPlan, TypeStub};

/// Join the package name with an export subpath: a leading `./` (or a bare
/// `.`) is stripped before concatenation.
pub(crate) fn normalize_export_path(package: &str, export_path: &str) -> String {
    let trimmed = export_path.trim_start_matches("./").trim_start_matches('.');
    if trimmed.is_empty() {
        package.to_string()
    } else {
        format!("{}/{}", package, trimmed.trim_start_matches('/'))
    }
}

fn method_line(method: &MethodInfo, out: &mut String) {
    out.push_str("  ");
    if method.is_static {
        out.push_str("static ");
    }
    if method.is_async {
        out.push_str("async ");
    }
    out.push_str(&format!("{}{}", method.name, method.sig));
    if let Some(ret) = &method.ret {
        out.push_str(&format!(": {}", ret));
    }
    out.push_str(";\n");
}

fn render_class(package: &str, class: &ClassInfo) -> String {
    let mut out = String::new();
    if let Some(path) = &class.export_path {
        out.push_str(&format!("// from \"{}\"\n", normalize_export_path(package, path)));
    }
    if let Some(doc) = &class.doc {
        out.push_str(&format!("/** {} */\n", doc));
    }
    let mut decl = format!("export class {}", class.name);
    if let Some(extends) = &class.extends {
        decl.push_str(&format!(" extends {}", extends));
    }
    if !class.implements.is_empty() {
        decl.push_str(&format!(" implements {}", class.implements.join(", ")));
    }
    out.push_str(&decl);
    out.push_str(" {\n");
    for ctor in &class.constructors {
        out.push_str(&format!("  constructor{};\n", ctor.sig));
    }
    for method in &class.methods {
        method_line(method, &mut out);
    }
    for property in &class.properties {
        out.push_str("  ");
        if property.is_static {
            out.push_str("static ");
        }
        out.push_str(&property.name);
        if let Some(ty) = &property.ty {
            out.push_str(&format!(": {}", ty));
        }
        out.push_str(";\n");
    }
    out.push_str("}\n");
    out
}

fn render_interface(iface: &InterfaceInfo) -> String {
    let mut out = String::new();
    if let Some(doc) = &iface.doc {
        out.push_str(&format!("/** {} */\n", doc));
    }
    let mut decl = format!("export interface {}", iface.name);
    if !iface.extends.is_empty() {
        decl.push_str(&format!(" extends {}", iface.extends.join(", ")));
    }
    out.push_str(&decl);
    out.push_str(" {\n");
    for method in &iface.methods {
        method_line(method, &mut out);
    }
    for property in &iface.properties {
        out.push_str(&format!("  {}", property.name));
        if let Some(ty) = &property.ty {
            out.push_str(&format!(": {}", ty));
        }
        out.push_str(";\n");
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
    for module in &index.modules {
        for class in &module.classes {
            stubs.push(TypeStub {
                name: class.name.clone(),
                container: module.name.clone(),
                text: render_class(&index.package, class),
                priority: class.truncation_priority(),
                is_client: class.derived.is_client,
                is_error: class.is_error,
                is_model: class.derived.is_model,
            });
        }
        for iface in &module.interfaces {
            stubs.push(TypeStub {
                name: iface.name.clone(),
                container: module.name.clone(),
                text: render_interface(iface),
                priority: iface.truncation_priority(),
                is_client: iface.derived.is_client,
                is_error: false,
                is_model: iface.derived.is_model,
            });
        }
        for e in &module.enums {
            stubs.push(TypeStub {
                name: e.name.clone(),
                container: module.name.clone(),
                text: format!("export enum {} {{ {} }}\n", e.name, e.values.join(", ")),
                priority: e.truncation_priority(),
                is_client: false,
                is_error: false,
                is_model: false,
            });
        }
        for alias in &module.types {
            let target = alias.ty.as_deref().unwrap_or("unknown");
            stubs.push(TypeStub {
                name: alias.name.clone(),
                container: module.name.clone(),
                text: format!("export type {} = {};\n", alias.name, target),
                priority: alias.truncation_priority(),
                is_client: false,
                is_error: false,
                is_model: false,
            });
        }
        for function in &module.functions {
            let mut text = String::from("export ");
            if function.is_async {
                text.push_str("async ");
            }
            text.push_str(&format!("function {}{}", function.name, function.sig));
            if let Some(ret) = &function.ret {
                text.push_str(&format!(": {}", ret));
            }
            text.push_str(";\n");
            stubs.push(TypeStub {
                name: function.name.clone(),
                container: module.name.clone(),
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
            open: |name| format!("// module {}", name),
            close: None,
            indent: "",
        },
    }
}

/// Render the index as TypeScript-flavored stubs, optionally under a budget.
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
