//! Cross-reference resolution: the directed "type uses type" graph.
//!
//! References are found by tokenizing member signatures and the heads of
//! base/implements/embeds clauses against the index's own type names.
//! Cycles are expected (`A.method(B)` while `B.field: A`); the graph is a
//! name-keyed adjacency map, so no ownership between type entities exists
//! and closure walks use an explicit queue.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::model::{type_name_set, IndexBase, NamedType, PRIORITY_CLIENT, PRIORITY_ERROR, PRIORITY_MODEL, PRIORITY_OTHER};

/// Names from `universe` that `ty` syntactically references.
pub fn get_referenced_types(ty: &dyn NamedType, universe: &HashSet<String>) -> HashSet<String> {
    ty.referenced_types(universe)
}

/// Collect-into form: clears `out` before use so a single set serves a walk
/// over many types.
pub fn collect_referenced_types(
    ty: &dyn NamedType,
    universe: &HashSet<String>,
    out: &mut HashSet<String>,
) {
    ty.collect_referenced_types(universe, out);
}

/// Adjacency map from every known type name to the set of known type names
/// it references. Unknown tokens never appear.
pub fn build_dependency_graph(index: &dyn IndexBase) -> HashMap<String, HashSet<String>> {
    let universe = type_name_set(index);
    let mut graph = HashMap::new();
    for ty in index.types() {
        graph.insert(ty.name().to_string(), ty.referenced_types(&universe));
    }
    graph
}

/// Seeds plus every node reachable in exactly one hop.
pub fn one_hop(
    graph: &HashMap<String, HashSet<String>>,
    seeds: impl IntoIterator<Item = String>,
) -> HashSet<String> {
    let mut reached: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = seeds.into_iter().collect();
    while let Some(seed) = queue.pop_front() {
        if let Some(targets) = graph.get(&seed) {
            for target in targets {
                reached.insert(target.clone());
            }
        }
        reached.insert(seed);
    }
    reached
}

/// Truncation priorities for every type in the index, derived from
/// capability flags and client reachability - never from names.
pub fn compute_priorities(index: &dyn IndexBase) -> HashMap<String, u8> {
    let graph = build_dependency_graph(index);
    let clients: Vec<String> = index
        .types()
        .iter()
        .filter(|t| t.is_client_type())
        .map(|t| t.name().to_string())
        .collect();
    let near_clients = one_hop(&graph, clients);

    let mut priorities = HashMap::new();
    for ty in index.types() {
        let priority = if ty.is_client_type() {
            PRIORITY_CLIENT
        } else if ty.is_error_type() {
            PRIORITY_ERROR
        } else if ty.is_model_type() && near_clients.contains(ty.name()) {
            PRIORITY_MODEL
        } else {
            PRIORITY_OTHER
        };
        priorities.insert(ty.name().to_string(), priority);
    }
    priorities
}
