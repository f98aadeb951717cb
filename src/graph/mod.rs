//! Canonical Type Graph
//!
//! The target-independent intermediate representation. The builder lowers a
//! JSON Schema document into a [`TypeGraph`]: an arena of named [`TypeNode`]s
//! plus a petgraph dependency graph over them. Later passes (cycle analysis,
//! ordering, shape classification, constraint mapping) annotate the same
//! graph, and every backend consumes it read-only.

pub mod analysis;
pub mod builder;
pub mod classify;
pub mod constraints;
pub mod diagnostics;
pub mod names;
pub mod order;
pub mod path;

// Re-export key types from submodules
pub use analysis::{analyze_cycles, SccAnalysis, SccGroup};
pub use builder::build_graph;
pub use classify::{classify_all, ShapeTag};
pub use constraints::{
    BoundKind, ConstraintDescriptor, ConstraintKind, ConstraintMapper, ConstraintSet,
    ConstraintSubject, ConstraintSupport, ConstraintTable, NamedFormat,
};
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use order::emission_order;
pub use path::{PathSegment, SchemaPath};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CompileError, Result};

// =============================================================================
// Identifiers and Primitives
// =============================================================================

/// Index of a node in its [`TypeGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeId(pub(crate) usize);

impl TypeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Scalar kinds every target understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Integer,
    Number,
    Boolean,
    Null,
    /// No usable type information (`{}`, `true`, degraded enums)
    Unknown,
}

impl PrimitiveKind {
    /// Map a JSON Schema `type` keyword. Structured types return `None`.
    pub fn from_json_type(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Number)
    }
}

// =============================================================================
// References
// =============================================================================

/// How a reference must be emitted with respect to cycles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeTag {
    /// Target is declared earlier (or is not a named type at all)
    #[default]
    Plain,
    /// Target sits in the same cycle group; the backend must defer resolution
    Lazy,
}

/// What a reference points at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeRef {
    Named(TypeId),
    Primitive(PrimitiveKind),
    Array(Box<Reference>),
    /// String-keyed map with uniform values
    Map(Box<Reference>),
}

/// A use of a type at one schema location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub target: TypeRef,
    pub nullable: bool,
    /// Single admissible value (`const`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<Value>,
    #[serde(default)]
    pub constraints: ConstraintSet,
    #[serde(default)]
    pub edge: EdgeTag,
    pub path: SchemaPath,
}

impl Reference {
    pub fn new(target: TypeRef, path: SchemaPath) -> Self {
        Self {
            target,
            nullable: false,
            literal: None,
            constraints: ConstraintSet::default(),
            edge: EdgeTag::Plain,
            path,
        }
    }

    pub fn named(id: TypeId, path: SchemaPath) -> Self {
        Self::new(TypeRef::Named(id), path)
    }

    pub fn primitive(kind: PrimitiveKind, path: SchemaPath) -> Self {
        Self::new(TypeRef::Primitive(kind), path)
    }

    pub fn is_lazy(&self) -> bool {
        self.edge == EdgeTag::Lazy
    }

    /// Named type directly referenced (not through a collection)
    pub fn as_named(&self) -> Option<TypeId> {
        match self.target {
            TypeRef::Named(id) => Some(id),
            _ => None,
        }
    }

    /// Every named type reachable through this reference, collections included
    pub fn named_targets(&self) -> Vec<TypeId> {
        let mut out = Vec::new();
        self.collect_named(&mut out);
        out
    }

    fn collect_named(&self, out: &mut Vec<TypeId>) {
        match &self.target {
            TypeRef::Named(id) => out.push(*id),
            TypeRef::Array(inner) | TypeRef::Map(inner) => inner.collect_named(out),
            TypeRef::Primitive(_) => {}
        }
    }
}

// =============================================================================
// Type Kinds
// =============================================================================

/// A named property of an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Property key exactly as written in the schema
    pub name: String,
    pub reference: Reference,
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub path: SchemaPath,
}

/// Object with fields sorted by property name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectType {
    pub fields: Vec<Field>,
}

impl ObjectType {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A scalar enum value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    String(String),
    Integer(i64),
}

impl EnumValue {
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Integer(i) => Value::from(*i),
        }
    }

    /// The value as text, without JSON quoting
    pub fn raw(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumVariant {
    pub value: EnumValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnumValueKind {
    String,
    Integer,
}

/// One value vs. a list of values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnumCardinality {
    Single,
    Multi,
}

/// Which schema idiom the variants came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnumOrigin {
    /// `enum: [...]`
    Flat,
    /// `oneOf`/`anyOf` of `{const, title}` branches
    ConstBranches,
    /// `enum` plus parallel `enumNames`
    EnumNames,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumType {
    pub variants: Vec<EnumVariant>,
    pub value_kind: EnumValueKind,
    /// `null` was one of the listed values
    pub nullable: bool,
    pub cardinality: EnumCardinality,
    pub origin: EnumOrigin,
    /// The enum schema itself carries a title
    pub titled_schema: bool,
    /// Item counts for multi-select enums
    #[serde(default)]
    pub constraints: ConstraintSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeTag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionMember {
    pub reference: Reference,
    /// Value of the discriminant field in this branch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionType {
    pub members: Vec<UnionMember>,
    /// Field whose constant value selects the member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeTag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayType {
    pub items: Reference,
    #[serde(default)]
    pub constraints: ConstraintSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapType {
    pub values: Reference,
}

/// A named scalar or a nullable wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasType {
    pub target: Reference,
    /// Nominal tag for branded scalars
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeKind {
    Object(ObjectType),
    Enum(EnumType),
    Union(UnionType),
    Array(ArrayType),
    Map(MapType),
    Alias(AliasType),
    Primitive(PrimitiveKind),
}

impl TypeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Enum(_) => "enum",
            Self::Union(_) => "union",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Alias(_) => "alias",
            Self::Primitive(_) => "primitive",
        }
    }

    /// References owned directly by this kind, in declaration order
    pub fn references(&self) -> Vec<&Reference> {
        match self {
            Self::Object(o) => o.fields.iter().map(|f| &f.reference).collect(),
            Self::Union(u) => u.members.iter().map(|m| &m.reference).collect(),
            Self::Array(a) => vec![&a.items],
            Self::Map(m) => vec![&m.values],
            Self::Alias(a) => vec![&a.target],
            Self::Enum(_) | Self::Primitive(_) => Vec::new(),
        }
    }

    pub(crate) fn references_mut(&mut self) -> Vec<&mut Reference> {
        match self {
            Self::Object(o) => o.fields.iter_mut().map(|f| &mut f.reference).collect(),
            Self::Union(u) => u.members.iter_mut().map(|m| &mut m.reference).collect(),
            Self::Array(a) => vec![&mut a.items],
            Self::Map(m) => vec![&mut m.values],
            Self::Alias(a) => vec![&mut a.target],
            Self::Enum(_) | Self::Primitive(_) => Vec::new(),
        }
    }
}

// =============================================================================
// Type Node
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeNode {
    pub id: TypeId,
    /// Canonical PascalCase name, unique within the graph
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Where the type was declared (or hoisted from)
    pub path: SchemaPath,
    pub kind: TypeKind,
    /// Cycle group, set only for members of a cycle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scc: Option<usize>,
}

impl TypeNode {
    pub fn shape(&self) -> Option<ShapeTag> {
        match &self.kind {
            TypeKind::Enum(e) => e.shape,
            TypeKind::Union(u) => u.shape,
            _ => None,
        }
    }

    pub fn is_cyclic(&self) -> bool {
        self.scc.is_some()
    }

    /// Named types this node depends on, sorted and deduplicated
    pub fn dependencies(&self) -> Vec<TypeId> {
        let set: BTreeSet<TypeId> = self
            .kind
            .references()
            .into_iter()
            .flat_map(Reference::named_targets)
            .collect();
        set.into_iter().collect()
    }
}

// =============================================================================
// Dependency Graph
// =============================================================================

/// petgraph view of node-to-node dependencies. Node indices mirror TypeIds.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    pub(crate) graph: DiGraph<TypeId, EdgeTag>,
}

impl DependencyGraph {
    fn from_nodes(nodes: &[TypeNode]) -> Self {
        let mut graph = DiGraph::with_capacity(nodes.len(), nodes.len());
        for node in nodes {
            graph.add_node(node.id);
        }
        for node in nodes {
            for target in node.dependencies() {
                graph.add_edge(NodeIndex::new(node.id.0), NodeIndex::new(target.0), EdgeTag::Plain);
            }
        }
        Self { graph }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All edges as (from, to, tag)
    pub fn edges(&self) -> Vec<(TypeId, TypeId, EdgeTag)> {
        self.graph
            .edge_references()
            .map(|e| (self.graph[e.source()], self.graph[e.target()], *e.weight()))
            .collect()
    }

    pub fn successors(&self, id: TypeId) -> Vec<TypeId> {
        let mut out: Vec<TypeId> = self
            .graph
            .neighbors(NodeIndex::new(id.0))
            .map(|n| self.graph[n])
            .collect();
        out.sort();
        out
    }
}

// =============================================================================
// Type Graph
// =============================================================================

/// The canonical IR: every named type of one input document
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    nodes: Vec<TypeNode>,
    by_name: BTreeMap<String, TypeId>,
    root: Option<TypeId>,
    pub(crate) dependencies: DependencyGraph,
}

impl TypeGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Claim a name before its definition is built, so forward and
    /// recursive references resolve.
    pub(crate) fn reserve(&mut self, name: &str, path: &SchemaPath) -> Result<TypeId> {
        if let Some(existing) = self.by_name.get(name) {
            return Err(CompileError::NamingCollision {
                name: name.to_string(),
                path: path.clone(),
                existing: self.nodes[existing.0].path.clone(),
            });
        }

        let id = TypeId(self.nodes.len());
        self.nodes.push(TypeNode {
            id,
            name: name.to_string(),
            title: None,
            description: None,
            path: path.clone(),
            kind: TypeKind::Primitive(PrimitiveKind::Unknown),
            scc: None,
        });
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub(crate) fn define(&mut self, id: TypeId, kind: TypeKind, title: Option<String>, description: Option<String>) {
        let node = &mut self.nodes[id.0];
        node.kind = kind;
        node.title = title;
        node.description = description;
    }

    pub(crate) fn set_root(&mut self, id: TypeId) {
        self.root = Some(id);
    }

    /// Recompute the petgraph view from the nodes' references
    pub(crate) fn rebuild_dependencies(&mut self) {
        self.dependencies = DependencyGraph::from_nodes(&self.nodes);
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [TypeNode] {
        &mut self.nodes
    }

    pub fn nodes(&self) -> &[TypeNode] {
        &self.nodes
    }

    /// Node by id. Ids are only ever handed out by this graph.
    pub fn node(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, name: &str) -> Option<&TypeNode> {
        self.by_name.get(name).map(|id| &self.nodes[id.0])
    }

    pub fn root(&self) -> Option<&TypeNode> {
        self.root.map(|id| &self.nodes[id.0])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn dependency_graph(&self) -> &DependencyGraph {
        &self.dependencies
    }

    /// Export the type dependency graph to GraphViz DOT format.
    ///
    /// Cycle groups become clusters; lazy edges are dashed.
    pub fn to_dot(&self) -> String {
        let mut output = String::new();

        output.push_str("digraph TypeGraph {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  bgcolor=\"#1e1e1e\";\n");
        output.push_str("  node [shape=box, style=\"filled,rounded\", fontname=\"Helvetica\", fontsize=10, fontcolor=\"white\", color=\"#404040\"];\n");
        output.push_str("  edge [color=\"#808080\"];\n\n");

        let color = |kind: &TypeKind| match kind {
            TypeKind::Object(_) => "#00BCD4",
            TypeKind::Enum(_) => "#FF5722",
            TypeKind::Union(_) => "#9C27B0",
            TypeKind::Array(_) | TypeKind::Map(_) => "#4CAF50",
            TypeKind::Alias(_) => "#2196F3",
            TypeKind::Primitive(_) => "#607D8B",
        };

        let mut clusters: BTreeMap<usize, Vec<&TypeNode>> = BTreeMap::new();
        for node in &self.nodes {
            match node.scc {
                Some(scc) => clusters.entry(scc).or_default().push(node),
                None => output.push_str(&format!(
                    "  \"{}\" [label=\"{}\\n({})\", fillcolor=\"{}\"];\n",
                    node.name,
                    node.name,
                    node.kind.label(),
                    color(&node.kind)
                )),
            }
        }

        for (scc, members) in &clusters {
            output.push_str(&format!("\n  subgraph cluster_scc_{} {{\n", scc));
            output.push_str(&format!("    label=\"cycle {}\";\n    color=\"#FF9800\";\n    fontcolor=\"#FF9800\";\n", scc));
            for node in members {
                output.push_str(&format!(
                    "    \"{}\" [label=\"{}\\n({})\", fillcolor=\"{}\"];\n",
                    node.name,
                    node.name,
                    node.kind.label(),
                    color(&node.kind)
                ));
            }
            output.push_str("  }\n");
        }

        output.push('\n');

        let mut edges = self.dependencies.edges();
        edges.sort_by_key(|(from, to, _)| (*from, *to));
        for (from, to, tag) in edges {
            let style = match tag {
                EdgeTag::Plain => "",
                EdgeTag::Lazy => " [style=dashed]",
            };
            output.push_str(&format!(
                "  \"{}\" -> \"{}\"{};\n",
                self.nodes[from.0].name, self.nodes[to.0].name, style
            ));
        }

        output.push_str("}\n");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(fields: Vec<(&str, Reference)>) -> TypeKind {
        TypeKind::Object(ObjectType {
            fields: fields
                .into_iter()
                .map(|(name, reference)| Field {
                    name: name.to_string(),
                    path: reference.path.clone(),
                    reference,
                    optional: false,
                    description: None,
                    default: None,
                })
                .collect(),
        })
    }

    #[test]
    fn test_reserve_detects_collisions() {
        let mut graph = TypeGraph::new();
        graph.reserve("User", &SchemaPath::root().keys(["$defs", "User"])).unwrap();
        let err = graph
            .reserve("User", &SchemaPath::root().keys(["$defs", "user"]))
            .unwrap_err();
        assert!(matches!(err, CompileError::NamingCollision { .. }));
        assert_eq!(err.path().unwrap().to_string(), "#/$defs/user");
    }

    #[test]
    fn test_dependencies_deduplicate_and_see_through_collections() {
        let mut graph = TypeGraph::new();
        let a = graph.reserve("A", &SchemaPath::root()).unwrap();
        let b = graph.reserve("B", &SchemaPath::root()).unwrap();
        let p = SchemaPath::root();
        let list = Reference::new(TypeRef::Array(Box::new(Reference::named(b, p.clone()))), p.clone());
        graph.define(a, object(vec![("one", Reference::named(b, p.clone())), ("many", list)]), None, None);
        graph.rebuild_dependencies();

        assert_eq!(graph.node(a).dependencies(), vec![b]);
        assert_eq!(graph.dependency_graph().edge_count(), 1);
        assert_eq!(graph.dependency_graph().successors(a), vec![b]);
    }

    #[test]
    fn test_to_dot_lists_nodes_and_edges() {
        let mut graph = TypeGraph::new();
        let a = graph.reserve("A", &SchemaPath::root()).unwrap();
        let b = graph.reserve("B", &SchemaPath::root()).unwrap();
        graph.define(a, object(vec![("b", Reference::named(b, SchemaPath::root()))]), None, None);
        graph.define(b, TypeKind::Primitive(PrimitiveKind::String), None, None);
        graph.rebuild_dependencies();

        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph TypeGraph {"));
        assert!(dot.contains("\"A\" -> \"B\";"));
        assert!(dot.contains("(object)"));
    }
}
