//! Type Graph Analysis
//!
//! Computes strongly connected components (SCCs) over the dependency graph
//! and tags every reference that stays inside a cycle as lazy, so backends
//! that build values eagerly know where to defer.

use petgraph::algo::{is_cyclic_directed, tarjan_scc};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use super::{EdgeTag, Reference, TypeGraph, TypeId, TypeRef};

// =============================================================================
// SCC Group
// =============================================================================

/// A strongly connected component of the type graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SccGroup {
    /// Position in anchor-name order
    pub id: usize,
    /// Members sorted by name
    pub members: Vec<TypeId>,
    /// Member with the lexicographically smallest name
    pub anchor: TypeId,
    /// More than one member, or a member that references itself
    pub is_cyclic: bool,
    /// Single member that references itself
    pub is_self_referential: bool,
}

// =============================================================================
// Analysis Result
// =============================================================================

/// Complete SCC partition of a graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SccAnalysis {
    /// Every SCC, acyclic singletons included
    pub groups: Vec<SccGroup>,
    /// TypeId index -> group id
    membership: Vec<usize>,
}

impl SccAnalysis {
    pub fn group_of(&self, id: TypeId) -> &SccGroup {
        &self.groups[self.membership[id.0]]
    }

    pub fn is_cyclic(&self, id: TypeId) -> bool {
        self.group_of(id).is_cyclic
    }

    pub fn anchor_of(&self, id: TypeId) -> TypeId {
        self.group_of(id).anchor
    }

    pub fn same_group(&self, a: TypeId, b: TypeId) -> bool {
        self.membership[a.0] == self.membership[b.0]
    }

    /// Groups that actually form cycles
    pub fn cyclic_groups(&self) -> impl Iterator<Item = &SccGroup> {
        self.groups.iter().filter(|g| g.is_cyclic)
    }
}

// =============================================================================
// Analysis Functions
// =============================================================================

/// Partition the graph into SCCs and tag lazy references and edges in place
pub fn analyze_cycles(graph: &mut TypeGraph) -> SccAnalysis {
    let names: Vec<String> = graph.nodes().iter().map(|n| n.name.clone()).collect();
    let deps = &graph.dependencies.graph;

    let mut components: Vec<Vec<TypeId>> = tarjan_scc(deps)
        .into_iter()
        .map(|component| {
            let mut members: Vec<TypeId> = component.iter().map(|idx| deps[*idx]).collect();
            members.sort_by(|a, b| names[a.0].cmp(&names[b.0]));
            members
        })
        .collect();

    // Group ids follow anchor names so the partition is stable across runs
    components.sort_by(|a, b| names[a[0].0].cmp(&names[b[0].0]));

    let mut membership = vec![0; names.len()];
    let mut groups = Vec::with_capacity(components.len());

    for (id, members) in components.into_iter().enumerate() {
        let anchor = members[0];
        let is_self_referential = members.len() == 1
            && deps.contains_edge(NodeIndex::new(anchor.0), NodeIndex::new(anchor.0));

        for member in &members {
            membership[member.0] = id;
        }

        groups.push(SccGroup {
            id,
            is_cyclic: members.len() > 1 || is_self_referential,
            members,
            anchor,
            is_self_referential,
        });
    }

    let cyclic: Vec<bool> = groups.iter().map(|g| g.is_cyclic).collect();

    for node in graph.nodes_mut() {
        let group = membership[node.id.0];
        node.scc = cyclic[group].then_some(group);

        for reference in node.kind.references_mut() {
            tag_reference(reference, group, &membership, &cyclic);
        }
    }

    let deps = &mut graph.dependencies.graph;
    for edge in deps.edge_indices() {
        if let Some((from, to)) = deps.edge_endpoints(edge) {
            let group = membership[deps[from].0];
            let lazy = cyclic[group] && group == membership[deps[to].0];
            deps[edge] = if lazy { EdgeTag::Lazy } else { EdgeTag::Plain };
        }
    }

    tracing::debug!(
        groups = groups.len(),
        cycles = cyclic.iter().filter(|c| **c).count(),
        "analyzed cycles"
    );

    SccAnalysis { groups, membership }
}

/// A reference is lazy when anything it reaches sits in the owner's cycle
fn tag_reference(reference: &mut Reference, owner_group: usize, membership: &[usize], cyclic: &[bool]) {
    let lazy = cyclic[owner_group]
        && reference
            .named_targets()
            .iter()
            .any(|target| membership[target.0] == owner_group);
    reference.edge = if lazy { EdgeTag::Lazy } else { EdgeTag::Plain };

    match &mut reference.target {
        TypeRef::Array(inner) | TypeRef::Map(inner) => tag_reference(inner, owner_group, membership, cyclic),
        TypeRef::Named(_) | TypeRef::Primitive(_) => {}
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validation error for an edge whose tag disagrees with the partition
#[derive(Debug, Clone)]
pub struct LazyEdgeValidationError {
    pub from: TypeId,
    pub to: TypeId,
    pub reason: String,
}

/// Check the edge tags against the partition (diagnostic check)
pub fn validate_lazy_edges(graph: &TypeGraph, analysis: &SccAnalysis) -> Vec<LazyEdgeValidationError> {
    let mut errors = Vec::new();

    for (from, to, tag) in graph.dependency_graph().edges() {
        let inside = analysis.same_group(from, to) && analysis.is_cyclic(from);
        match (inside, tag) {
            (true, EdgeTag::Plain) => errors.push(LazyEdgeValidationError {
                from,
                to,
                reason: format!(
                    "edge {} -> {} stays inside cycle {} but is plain",
                    graph.node(from).name,
                    graph.node(to).name,
                    analysis.group_of(from).id
                ),
            }),
            (false, EdgeTag::Lazy) => errors.push(LazyEdgeValidationError {
                from,
                to,
                reason: format!(
                    "edge {} -> {} leaves its component but is lazy",
                    graph.node(from).name,
                    graph.node(to).name
                ),
            }),
            _ => {}
        }
    }

    errors
}

/// Whether removing lazy edges leaves a DAG
pub fn lazy_free_is_acyclic(graph: &TypeGraph) -> bool {
    let plain = graph
        .dependencies
        .graph
        .filter_map(|_, node| Some(*node), |_, tag| (*tag == EdgeTag::Plain).then_some(*tag));
    !is_cyclic_directed(&plain)
}
