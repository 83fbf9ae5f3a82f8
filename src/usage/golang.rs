//! Go usage analysis.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::surface::{ApiSurface, AssignSource, FunctionSurface, SyntaxProfile, TypeSurface};
use super::UsageIndex;
use crate::model::generic_head;
use crate::model::golang::{ApiIndex, FuncApi};

static ASSIGN_LITERAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*:?=\s*&?(?:\w+\.)?([A-Z]\w*)\s*\{").unwrap());

static ASSIGN_FACTORY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\w+)(?:\s*,\s*\w+)*\s*:?=\s*(?:\w+\.)?([A-Z]\w*)\s*\(").unwrap()
});

static CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)\.([A-Za-z_]\w*)\s*\(").unwrap()
});

static CHAINED_CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)\.([A-Za-z_]\w*)\((?:[^()]*)\)\.([A-Za-z_]\w*)\s*\(",
    )
    .unwrap()
});

/// First element of a Go return tuple, stripped of pointers and parens:
/// `(*Widget, error)` resolves as `Widget`.
fn first_return(ret: &str) -> String {
    let trimmed = ret.trim().trim_start_matches('(');
    let first = trimmed.split(',').next().unwrap_or(trimmed).trim();
    generic_head(first.trim_start_matches(['*', '&']))
        .trim_end_matches(')')
        .to_string()
}

fn add_func(entry: &mut TypeSurface, func: &FuncApi) {
    entry
        .operations
        .push((func.name.clone(), func.sig.clone().unwrap_or_default()));
    if let Some(ret) = &func.ret {
        entry.op_returns.insert(func.name.clone(), first_return(ret));
    }
}

fn build_surface(index: &ApiIndex) -> ApiSurface {
    let mut surface = ApiSurface::default();
    for pkg in &index.packages {
        for st in &pkg.structs {
            let mut entry = TypeSurface {
                entry: st.entry_point,
                ..TypeSurface::default()
            };
            for embed in &st.embeds {
                entry.implements.push(generic_head(embed).to_string());
            }
            for method in &st.methods {
                add_func(&mut entry, method);
            }
            for field in &st.fields {
                if let Some(ty) = &field.ty {
                    entry.member_types.insert(
                        field.name.clone(),
                        first_return(ty),
                    );
                }
            }
            surface.insert(&st.name, entry);
        }
        for iface in &pkg.interfaces {
            let mut entry = TypeSurface {
                entry: iface.entry_point,
                ..TypeSurface::default()
            };
            for method in &iface.methods {
                add_func(&mut entry, method);
            }
            surface.insert(&iface.name, entry);
        }
        for func in &pkg.functions {
            surface.functions.push(FunctionSurface {
                container: pkg.name.clone(),
                name: func.name.clone(),
                signature: func.sig.clone().unwrap_or_default(),
                ret: func.ret.as_deref().map(first_return),
            });
        }
    }
    surface.finalize();
    surface
}

fn profile() -> SyntaxProfile {
    SyntaxProfile {
        extensions: &[".go"],
        assignments: vec![
            (ASSIGN_LITERAL_RE.clone(), AssignSource::TypeName),
            (ASSIGN_FACTORY_RE.clone(), AssignSource::FunctionReturn),
        ],
        call: CALL_RE.clone(),
        chained_call: Some(CHAINED_CALL_RE.clone()),
        free_call: None,
    }
}

/// Analyze a user source tree against a Go API index.
pub fn analyze(source: &Path, index: &ApiIndex) -> UsageIndex {
    let surface = build_surface(index);
    super::surface::scan_source_tree(source, &surface, &profile())
}
