//! Budgeted, language-flavored stub rendering.
//!
//! Each language module turns its index into a header plus one stub per
//! type; the shared engine here selects stubs under a character budget in
//! priority tiers (clients, one-hop closure of clients, errors, models,
//! the rest), groups them by container, and appends a single truncation
//! marker when anything was dropped.

use std::collections::{HashMap, HashSet};

use crate::usage::UsageIndex;

pub mod dotnet;
pub mod golang;
pub mod java;
pub mod python;
pub mod typescript;

/// Marker appended exactly once when the budget truncated the rendering.
pub const TRUNCATION_MARKER: &str = "... truncated ...";

/// Headroom reserved for the truncation marker and its newlines.
const MARKER_HEADROOM: usize = TRUNCATION_MARKER.len() + 2;

/// One renderable type stub.
#[derive(Clone, Debug)]
pub(crate) struct TypeStub {
    pub name: String,
    pub container: String,
    /// Rendered stub text, unindented; may span many lines.
    pub text: String,
    pub priority: u8,
    pub is_client: bool,
    pub is_error: bool,
    pub is_model: bool,
}

/// Container formatting for one language.
pub(crate) struct ContainerStyle {
    pub open: fn(&str) -> String,
    pub close: Option<&'static str>,
    pub indent: &'static str,
}

pub(crate) struct RenderPlan {
    pub header: String,
    pub stubs: Vec<TypeStub>,
    pub dependency_section: Option<String>,
    pub style: ContainerStyle,
}

fn indented_len(text: &str, indent: &str) -> usize {
    text.lines().map(|l| l.len() + indent.len() + 1).sum()
}

fn container_cost(style: &ContainerStyle, container: &str) -> usize {
    let open = (style.open)(container);
    open.len() + 1 + style.close.map(|c| c.len() + 2).unwrap_or(0)
}

/// Pick the stub indices to include under `budget`, in tier order. Returns
/// `(included, truncated)`; `included` preserves index order.
fn select_for_budget(plan: &RenderPlan, graph: &HashMap<String, HashSet<String>>, budget: usize) -> (Vec<usize>, bool) {
    let clients: Vec<String> = plan
        .stubs
        .iter()
        .filter(|s| s.is_client)
        .map(|s| s.name.clone())
        .collect();
    let near_clients = crate::xref::one_hop(graph, clients);

    let tier_of = |stub: &TypeStub| -> u8 {
        if stub.is_client {
            0
        } else if near_clients.contains(&stub.name) && !stub.is_client {
            1
        } else if stub.is_error {
            2
        } else if stub.is_model {
            3
        } else {
            4
        }
    };

    let mut remaining = budget.saturating_sub(plan.header.len() + 1 + MARKER_HEADROOM);
    let mut included: Vec<usize> = Vec::new();
    let mut opened: HashSet<String> = HashSet::new();
    let mut truncated = false;

    'tiers: for tier in 0u8..=4 {
        for (idx, stub) in plan.stubs.iter().enumerate() {
            if tier_of(stub) != tier || included.contains(&idx) {
                continue;
            }
            let mut cost = indented_len(&stub.text, plan.style.indent);
            if !opened.contains(&stub.container) {
                cost += container_cost(&plan.style, &stub.container);
            }
            if cost > remaining {
                truncated = true;
                break 'tiers;
            }
            remaining -= cost;
            opened.insert(stub.container.clone());
            included.push(idx);
        }
    }

    if included.len() < plan.stubs.len() {
        truncated = true;
    }
    included.sort();
    (included, truncated)
}

/// Assemble the final text from a plan, optionally under a budget.
pub(crate) fn render(
    plan: RenderPlan,
    graph: &HashMap<String, HashSet<String>>,
    budget: Option<usize>,
) -> String {
    let (included, truncated) = match budget {
        Some(limit) => select_for_budget(&plan, graph, limit),
        None => ((0..plan.stubs.len()).collect(), false),
    };

    let mut containers: Vec<&str> = included
        .iter()
        .map(|i| plan.stubs[*i].container.as_str())
        .collect();
    containers.sort();
    containers.dedup();

    let mut out = String::new();
    out.push_str(&plan.header);
    out.push('\n');

    for container in containers {
        out.push_str(&(plan.style.open)(container));
        out.push('\n');
        for idx in &included {
            let stub = &plan.stubs[*idx];
            if stub.container != container {
                continue;
            }
            for line in stub.text.lines() {
                out.push_str(plan.style.indent);
                out.push_str(line);
                out.push('\n');
            }
        }
        if let Some(close) = plan.style.close {
            out.push_str(close);
            out.push('\n');
        }
    }

    if !truncated {
        if let Some(deps) = &plan.dependency_section {
            let fits = budget
                .map(|limit| out.len() + deps.len() <= limit)
                .unwrap_or(true);
            if fits {
                out.push_str(deps);
            }
        }
    }

    if truncated {
        out.push_str(TRUNCATION_MARKER);
        out.push('\n');
    }
    out
}

/// Render the dependency section for a language's comment prefix.
pub(crate) fn dependency_section(
    deps: &[crate::model::DependencyInfo],
    comment: &str,
) -> Option<String> {
    if deps.is_empty() {
        return None;
    }
    let mut out = String::new();
    out.push_str(&format!("{} Dependency Types\n", comment));
    for dep in deps {
        out.push_str(&format!("{}   {}: {}\n", comment, dep.package, dep.types.join(", ")));
    }
    Some(out)
}

/// Coverage summary block rendered ahead of the stubs.
pub(crate) fn coverage_summary(usage: &UsageIndex, comment: &str) -> String {
    let mut out = String::new();
    if usage.fully_covered() {
        out.push_str(&format!("{} All operations are covered\n\n", comment));
        return out;
    }

    if !usage.covered_operations.is_empty() {
        out.push_str(&format!("{} Covered operations:\n", comment));
        let mut order: Vec<&str> = Vec::new();
        let mut by_client: HashMap<&str, Vec<&str>> = HashMap::new();
        for op in &usage.covered_operations {
            let entry = by_client.entry(op.client_type.as_str()).or_default();
            if entry.is_empty() {
                order.push(op.client_type.as_str());
            }
            entry.push(op.operation.as_str());
        }
        for client in order {
            let ops = &by_client[client];
            let shown: Vec<&str> = ops.iter().take(10).copied().collect();
            let suffix = if ops.len() > 10 {
                format!(" (+{} more)", ops.len() - 10)
            } else {
                String::new()
            };
            out.push_str(&format!(
                "{}   {}: {}{}\n",
                comment,
                client,
                shown.join(", "),
                suffix
            ));
        }
    }

    if !usage.uncovered_operations.is_empty() {
        out.push_str(&format!("{} Uncovered API:\n", comment));
        for op in &usage.uncovered_operations {
            let sep = if op.signature.starts_with('(') { "" } else { ": " };
            out.push_str(&format!(
                "{}   {}.{}{}{}\n",
                comment, op.client_type, op.operation, sep, op.signature
            ));
        }
    }

    for error in &usage.errors {
        out.push_str(&format!("{} coverage error: {}\n", comment, error));
    }
    out.push('\n');
    out
}
