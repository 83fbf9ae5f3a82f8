//! Language-neutral matching engine for usage analysis.
//!
//! Each per-language analyzer builds an [`ApiSurface`] from its concrete
//! index and a [`SyntaxProfile`] of call-site regexes; the scan loop,
//! receiver tracking, strategy layering, and deduplication live here so the
//! matching semantics are identical across languages.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use super::{CoverageBuilder, UncoveredOperation, UsageIndex};
use crate::fingerprint::is_excluded_dir;
use crate::model::generic_head;

/// One type's view for receiver resolution.
#[derive(Clone, Debug, Default)]
pub(crate) struct TypeSurface {
    /// Operations in declaration order: (name, signature).
    pub operations: Vec<(String, String)>,
    /// Property/field name to declared type head.
    pub member_types: HashMap<String, String>,
    /// Operation name to return type head, for chained access.
    pub op_returns: HashMap<String, String>,
    pub implements: Vec<String>,
    pub base: Option<String>,
    pub entry: bool,
}

impl TypeSurface {
    pub fn has_operation(&self, name: &str) -> bool {
        self.operations.iter().any(|(op, _)| op == name)
    }
}

/// A module/package-level function.
#[derive(Clone, Debug)]
pub(crate) struct FunctionSurface {
    pub container: String,
    pub name: String,
    pub signature: String,
    /// Declared return type, for factory-style receiver inference.
    pub ret: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ApiSurface {
    pub types: HashMap<String, TypeSurface>,
    /// Type names in index order, for deterministic uncovered listings.
    pub order: Vec<String>,
    pub functions: Vec<FunctionSurface>,
    /// Types whose operations form the coverage surface: entry points plus
    /// everything reachable from them through member and return types.
    listed: Vec<String>,
}

impl ApiSurface {
    pub fn insert(&mut self, name: &str, surface: TypeSurface) {
        if !self.types.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.types.insert(name.to_string(), surface);
    }

    /// Compute the coverage listing. Entry points seed a walk over member
    /// and return type edges; a reached type is listed iff it has
    /// operations, so empty container clients drop out while their
    /// subclients stay.
    pub fn finalize(&mut self) {
        let seeds: Vec<String> = self
            .order
            .iter()
            .filter(|n| self.types[*n].entry)
            .cloned()
            .collect();
        let seeds = if seeds.is_empty() {
            // Uncurated index: every operation-bearing type is the surface.
            self.order
                .iter()
                .filter(|n| !self.types[*n].operations.is_empty())
                .cloned()
                .collect()
        } else {
            seeds
        };

        let mut reached: Vec<String> = Vec::new();
        let mut queue = seeds;
        while let Some(name) = queue.pop() {
            if reached.contains(&name) {
                continue;
            }
            reached.push(name.clone());
            if let Some(surface) = self.types.get(&name) {
                let mut targets: Vec<String> = surface
                    .member_types
                    .values()
                    .chain(surface.op_returns.values())
                    .map(|t| generic_head(t).trim_start_matches(['*', '&']).to_string())
                    .collect();
                targets.sort();
                targets.dedup();
                for target in targets {
                    if self.types.contains_key(&target) && !reached.contains(&target) {
                        queue.push(target);
                    }
                }
            }
        }

        self.listed = self
            .order
            .iter()
            .filter(|n| reached.contains(n) && !self.types[*n].operations.is_empty())
            .cloned()
            .collect();
    }

    pub fn listed_types(&self) -> &[String] {
        &self.listed
    }

    fn is_listed(&self, name: &str) -> bool {
        self.listed.iter().any(|n| n == name)
    }

    /// The type a covered operation is attributed to: the receiver itself
    /// when listed, else an implemented interface that carries the
    /// operation in its surface.
    pub fn coverage_owner(&self, type_name: &str, operation: &str) -> Option<String> {
        let surface = self.types.get(type_name)?;
        if self.is_listed(type_name) && surface.has_operation(operation) {
            return Some(type_name.to_string());
        }
        for iface in &surface.implements {
            let head = generic_head(iface);
            if let Some(iface_surface) = self.types.get(head) {
                if self.is_listed(head) && iface_surface.has_operation(operation) {
                    return Some(head.to_string());
                }
            }
        }
        // Inherited surface through the base chain.
        let mut current = surface.base.clone();
        while let Some(base) = current {
            let head = generic_head(&base).to_string();
            match self.types.get(&head) {
                Some(base_surface) => {
                    if self.is_listed(&head) && base_surface.has_operation(operation) {
                        return Some(head);
                    }
                    current = base_surface.base.clone();
                }
                None => break,
            }
        }
        None
    }

    fn root_of(&self, name: &str) -> String {
        let mut current = name.to_string();
        let mut hops = 0;
        while let Some(base) = self.types.get(&current).and_then(|t| t.base.clone()) {
            let head = generic_head(&base).to_string();
            if !self.types.contains_key(&head) || hops > 16 {
                break;
            }
            current = head;
            hops += 1;
        }
        current
    }

    /// Strategy 2: attribute `operation` to the single listed type defining
    /// it, or to the unique root all definers share. Ambiguity drops the
    /// call.
    pub fn lookup_unique(&self, operation: &str) -> Option<String> {
        let definers: Vec<&String> = self
            .listed
            .iter()
            .filter(|n| self.types[*n].has_operation(operation))
            .collect();
        match definers.len() {
            0 => None,
            1 => Some(definers[0].clone()),
            _ => {
                let roots: Vec<String> = definers.iter().map(|n| self.root_of(n)).collect();
                let first = &roots[0];
                if roots.iter().all(|r| r == first) {
                    Some(first.clone())
                } else {
                    debug!(operation, "ambiguous method name dropped by strategy 2");
                    None
                }
            }
        }
    }

    /// Module-level function lookup by bare name.
    pub fn find_function(&self, name: &str) -> Option<&FunctionSurface> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// How an assignment's captured constructor resolves to a receiver type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AssignSource {
    /// The capture names the type directly (`new ChatClient(...)`,
    /// `ChatClient(...)` in Python).
    TypeName,
    /// The capture names a function whose declared return type is the
    /// receiver (`NewClient(...)` in Go, factory functions elsewhere).
    FunctionReturn,
}

/// Per-language scanning syntax.
pub(crate) struct SyntaxProfile {
    pub extensions: &'static [&'static str],
    /// Assignment regexes: capture 1 = variable, capture 2 = constructor.
    pub assignments: Vec<(Regex, AssignSource)>,
    /// Receiver call regex: capture 1 = dotted receiver chain,
    /// capture 2 = called operation.
    pub call: Regex,
    /// Chained call regex: capture 1 = receiver chain, 2 = first call,
    /// 3 = second call (`x.m1(...).m2(...)`).
    pub chained_call: Option<Regex>,
    /// Bare function call regex: capture 1 = name. `None` for languages
    /// without module-level functions.
    pub free_call: Option<Regex>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Receiver {
    Sdk(String),
    Foreign,
}

fn resolve_type_name(surface: &ApiSurface, ctor: &str) -> Receiver {
    if surface.types.contains_key(ctor) {
        Receiver::Sdk(ctor.to_string())
    } else {
        Receiver::Foreign
    }
}

/// Resolve a dotted receiver chain (`client.Widgets`) to an SDK type, a
/// known-foreign receiver, or nothing.
fn resolve_chain(
    surface: &ApiSurface,
    vars: &HashMap<String, Receiver>,
    chain: &str,
) -> Option<Receiver> {
    let mut segments = chain.split('.');
    let first = segments.next()?;

    let mut current = match vars.get(first) {
        Some(Receiver::Foreign) => return Some(Receiver::Foreign),
        Some(Receiver::Sdk(ty)) => ty.clone(),
        // Static/class-level access through the type name itself.
        None if surface.types.contains_key(first) => first.to_string(),
        None => return None,
    };

    for segment in segments {
        let surface_type = surface.types.get(&current)?;
        let next = surface_type
            .member_types
            .get(segment)
            .or_else(|| surface_type.op_returns.get(segment))?;
        let head = generic_head(next).trim_start_matches(['*', '&']).to_string();
        if !surface.types.contains_key(&head) {
            return None;
        }
        current = head;
    }
    Some(Receiver::Sdk(current))
}

/// Scan one file's content, feeding matches into the coverage builder.
fn scan_content(
    surface: &ApiSurface,
    profile: &SyntaxProfile,
    file: &str,
    content: &str,
    coverage: &mut CoverageBuilder,
) {
    let mut vars: HashMap<String, Receiver> = HashMap::new();

    for (line_idx, line) in content.lines().enumerate() {
        let line_no = line_idx + 1;

        for (regex, source) in &profile.assignments {
            for captures in regex.captures_iter(line) {
                let variable = captures[1].to_string();
                let ctor = captures[2].to_string();
                let receiver = match source {
                    AssignSource::FunctionReturn => match surface.find_function(&ctor) {
                        Some(func) => {
                            let head = func
                                .ret
                                .as_deref()
                                .map(|r| {
                                    generic_head(r.trim_start_matches('('))
                                        .trim_start_matches(['*', '&'])
                                        .to_string()
                                })
                                .unwrap_or_default();
                            if surface.types.contains_key(&head) {
                                Some(Receiver::Sdk(head))
                            } else {
                                Some(Receiver::Foreign)
                            }
                        }
                        // An unknown call is not evidence either way; leave
                        // the variable for strategy 2 - unless the captured
                        // name is itself a known type (Python class call).
                        None if surface.types.contains_key(&ctor) => {
                            Some(Receiver::Sdk(ctor.clone()))
                        }
                        None => None,
                    },
                    AssignSource::TypeName => Some(resolve_type_name(surface, &ctor)),
                };
                if let Some(receiver) = receiver {
                    vars.insert(variable, receiver);
                }
            }
        }

        if let Some(chained) = &profile.chained_call {
            for captures in chained.captures_iter(line) {
                let chain = &captures[1];
                let first_call = &captures[2];
                let second_call = &captures[3];
                if let Some(Receiver::Sdk(ty)) = resolve_chain(surface, &vars, chain) {
                    if let Some(owner) = surface.coverage_owner(&ty, first_call) {
                        coverage.record(&owner, first_call, file, line_no);
                    }
                    if let Some(ret) = surface
                        .types
                        .get(&ty)
                        .and_then(|t| t.op_returns.get(first_call))
                    {
                        let head = generic_head(ret).trim_start_matches(['*', '&']).to_string();
                        if let Some(owner) = surface.coverage_owner(&head, second_call) {
                            coverage.record(&owner, second_call, file, line_no);
                        }
                    }
                }
            }
        }

        for captures in profile.call.captures_iter(line) {
            let chain = &captures[1];
            let operation = &captures[2];
            match resolve_chain(surface, &vars, chain) {
                Some(Receiver::Foreign) => {}
                Some(Receiver::Sdk(ty)) => {
                    if let Some(owner) = surface.coverage_owner(&ty, operation) {
                        coverage.record(&owner, operation, file, line_no);
                    }
                }
                None => {
                    // Strategy 2: unique method name across client types.
                    if let Some(owner) = surface.lookup_unique(operation) {
                        coverage.record(&owner, operation, file, line_no);
                        continue;
                    }
                    // Qualified module function (`pkg.Connect(...)`).
                    if !chain.contains('.') {
                        if let Some(func) = surface.find_function(operation) {
                            let container = func.container.clone();
                            coverage.record(&container, operation, file, line_no);
                        }
                    }
                }
            }
        }

        if let Some(free_call) = &profile.free_call {
            for captures in free_call.captures_iter(line) {
                let name = &captures[1];
                if let Some(func) = surface.find_function(name) {
                    coverage.record(&func.container.clone(), name, file, line_no);
                }
            }
        }
    }
}

/// Walk `root` and analyze every covered file against the surface.
pub(crate) fn scan_source_tree(
    root: &Path,
    surface: &ApiSurface,
    profile: &SyntaxProfile,
) -> UsageIndex {
    let mut coverage = CoverageBuilder::new();
    let mut errors = Vec::new();
    let mut file_count = 0usize;

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir() && e.file_name().to_str().is_some_and(is_excluded_dir))
        });
    for entry in walker.flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let matches_ext = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                profile
                    .extensions
                    .iter()
                    .any(|want| want.trim_start_matches('.') == ext)
            });
        if !matches_ext {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        match std::fs::read_to_string(entry.path()) {
            Ok(content) => {
                file_count += 1;
                scan_content(surface, profile, &relative, &content, &mut coverage);
            }
            Err(err) => errors.push(format!("failed to read {}: {}", relative, err)),
        }
    }

    let mut uncovered = Vec::new();
    for name in surface.listed_types() {
        let ty = &surface.types[name];
        for (op, sig) in &ty.operations {
            if !coverage.covers(name, op) {
                uncovered.push(UncoveredOperation {
                    client_type: name.clone(),
                    operation: op.clone(),
                    signature: sig.clone(),
                });
            }
        }
    }
    for func in &surface.functions {
        if !coverage.covers(&func.container, &func.name) {
            uncovered.push(UncoveredOperation {
                client_type: func.container.clone(),
                operation: func.name.clone(),
                signature: func.signature.clone(),
            });
        }
    }

    UsageIndex {
        file_count,
        covered_operations: coverage.finish(),
        uncovered_operations: uncovered,
        errors,
    }
}
