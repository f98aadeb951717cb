//! Emission Order
//!
//! Deterministic topological order over the SCC condensation. For every
//! plain edge X -> Y, Y is emitted before X. Ready components are taken by
//! anchor name and members of one component are emitted alphabetically.

use std::collections::BTreeSet;

use super::analysis::SccAnalysis;
use super::{EdgeTag, TypeGraph, TypeId};

/// Total emission order for every node of the graph
pub fn emission_order(graph: &TypeGraph, analysis: &SccAnalysis) -> Vec<TypeId> {
    let group_count = analysis.groups.len();
    let mut dependents: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); group_count];
    let mut blockers: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); group_count];

    for (from, to, tag) in graph.dependency_graph().edges() {
        let (from_group, to_group) = (analysis.group_of(from).id, analysis.group_of(to).id);
        if tag == EdgeTag::Plain && from_group != to_group {
            blockers[from_group].insert(to_group);
            dependents[to_group].insert(from_group);
        }
    }

    let anchor_name = |group: usize| graph.node(analysis.groups[group].anchor).name.clone();

    let mut ready: BTreeSet<(String, usize)> = (0..group_count)
        .filter(|g| blockers[*g].is_empty())
        .map(|g| (anchor_name(g), g))
        .collect();

    let mut emitted = vec![false; group_count];
    let mut order = Vec::with_capacity(graph.len());

    while let Some((_, group)) = ready.pop_first() {
        emitted[group] = true;
        order.extend(analysis.groups[group].members.iter().copied());

        for dependent in &dependents[group] {
            let remaining = &mut blockers[*dependent];
            remaining.remove(&group);
            if remaining.is_empty() {
                ready.insert((anchor_name(*dependent), *dependent));
            }
        }
    }

    // Unreachable once lazy edges are excluded, but never drop a node
    let mut leftover: Vec<usize> = (0..group_count).filter(|g| !emitted[*g]).collect();
    if !leftover.is_empty() {
        tracing::warn!(groups = leftover.len(), "plain edges still form a cycle; appending in name order");
        leftover.sort_by_key(|g| anchor_name(*g));
        for group in leftover {
            order.extend(analysis.groups[group].members.iter().copied());
        }
    }

    tracing::debug!(types = order.len(), "computed emission order");
    order
}
