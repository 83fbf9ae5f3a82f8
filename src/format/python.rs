//! Python-flavored stub rendering.

use crate::model::python::{ApiIndex, ClassInfo, FunctionInfo, MethodInfo};
use crate::model::NamedType;
use crate::usage::UsageIndex;
use crate::xref;

use super::{coverage_summary, dependency_section, ContainerStyle, RenderPlan, TypeStub};

fn method_lines(method: &MethodInfo, out: &mut String) {
    if method.is_classmethod {
        out.push_str("    @classmethod\n");
    }
    if method.is_staticmethod {
        out.push_str("    @staticmethod\n");
    }
    out.push_str("    ");
    if method.is_async {
        out.push_str("async ");
    }
    out.push_str(&format!("def {}{}", method.name, method.signature));
    if let Some(ret) = &method.ret {
        out.push_str(&format!(" -> {}", ret));
    }
    out.push_str(": ...\n");
}

fn render_class(class: &ClassInfo) -> String {
    let mut out = String::new();
    // The declaration always precedes the docstring; the docstring lives
    // inside the class body.
    match &class.base {
        Some(base) => out.push_str(&format!("class {}({}):\n", class.name, base)),
        None => out.push_str(&format!("class {}:\n", class.name)),
    }
    if let Some(doc) = &class.doc {
        out.push_str(&format!("    \"\"\"{}\"\"\"\n", doc));
    }
    if class.is_deprecated {
        out.push_str("    # deprecated\n");
    }
    for method in &class.methods {
        method_lines(method, &mut out);
    }
    for property in &class.properties {
        out.push_str("    @property\n");
        out.push_str(&format!("    def {}(self)", property.name));
        if let Some(ty) = &property.ty {
            out.push_str(&format!(" -> {}", ty));
        }
        out.push_str(": ...\n");
    }
    if class.methods.is_empty() && class.properties.is_empty() && class.doc.is_none() {
        out.push_str("    ...\n");
    }
    out
}

fn render_function(function: &FunctionInfo) -> String {
    let mut out = String::new();
    if function.is_async {
        out.push_str("async ");
    }
    out.push_str(&format!("def {}{}", function.name, function.signature));
    if let Some(ret) = &function.ret {
        out.push_str(&format!(" -> {}", ret));
    }
    out.push_str(": ...\n");
    out
}

fn build_plan(index: &ApiIndex) -> RenderPlan {
    let mut header = format!("# {}", index.package);
    if let Some(version) = &index.version {
        header.push_str(&format!(" {}", version));
    }

    let mut stubs = Vec::new();
    for module in &index.modules {
        for class in &module.classes {
            stubs.push(TypeStub {
                name: class.name.clone(),
                container: module.name.clone(),
                text: render_class(class),
                priority: class.truncation_priority(),
                is_client: class.derived.is_client,
                is_error: class.is_error,
                is_model: class.derived.is_model,
            });
        }
        for function in &module.functions {
            stubs.push(TypeStub {
                name: function.name.clone(),
                container: module.name.clone(),
                text: render_function(function),
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
        dependency_section: dependency_section(&index.dependencies, "#"),
        style: ContainerStyle {
            open: |name| format!("# module: {}", name),
            close: None,
            indent: "",
        },
    }
}

/// Render the index as Python-flavored stubs, optionally under a budget.
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
    let mut out = coverage_summary(usage, "#");
    out.push_str(&format(index, budget));
    out
}
