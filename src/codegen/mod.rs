//! Code Generation
//!
//! Turns a finalized type graph into per-target artifacts.
//!
//! Architecture:
//! - EmissionPlan: Immutable after build() - holds the graph, SCC partition and order
//! - Region: Pure projection of the plan for a single type
//! - Emitters: Target-specific backends behind the [`Emitter`] trait
//!
//! The key constraint: Emitters NEVER read raw schema JSON - only the IR.
//! Adding a target means implementing [`Emitter`] and registering it; the
//! builder, analyzer and classifier are untouched.

pub mod config;
pub mod golang;
pub mod names;
pub mod typescript;
pub mod zod;

pub use config::{GoFormat, GoOptionalStyle, GoOptions, TypeScriptOptions, ZodOptions};
pub use golang::GoEmitter;
pub use names::NameResolver;
pub use typescript::TypeScriptEmitter;
pub use zod::ZodEmitter;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::Serialize;
use serde_json::Value;

use crate::config::CompilerConfig;
use crate::error::{CompileError, Result};
use crate::graph::{
    analyze_cycles, build_graph, classify_all, emission_order, ConstraintMapper, ConstraintSupport,
    ConstraintTable, Diagnostics, SccAnalysis, SccGroup, ShapeTag, TypeGraph, TypeId, TypeNode,
};

/// First line of every artifact
pub const BANNER: &str = "// Code generated by schemac. DO NOT EDIT.";

// =============================================================================
// Region
// =============================================================================

/// A Region is a pure projection of the plan for a single type.
///
/// All classification and cycle decisions are made before extraction.
#[derive(Debug, Clone)]
pub struct Region<'a> {
    pub node: &'a TypeNode,

    /// The node's SCC (acyclic singletons included)
    pub group: &'a SccGroup,

    /// Immediate named dependencies
    pub deps: Vec<TypeId>,
}

impl Region<'_> {
    /// Member of a cycle; validated backends must defer within it
    pub fn is_cyclic(&self) -> bool {
        self.group.is_cyclic
    }

    pub fn shape(&self) -> Option<ShapeTag> {
        self.node.shape()
    }
}

// =============================================================================
// Emission Plan
// =============================================================================

/// Immutable plan - frozen after build().
///
/// Every backend receives the same plan; none can mutate it.
#[derive(Debug, Clone)]
pub struct EmissionPlan {
    graph: TypeGraph,
    analysis: SccAnalysis,
    order: Vec<TypeId>,
    diagnostics: Diagnostics,
}

impl EmissionPlan {
    /// Build, analyze, order and classify one document
    pub fn build(document: &Value) -> Result<Self> {
        let (graph, diagnostics) = build_graph(document)?;
        Ok(Self::from_graph(graph, diagnostics))
    }

    /// Finalize an already-built graph
    pub fn from_graph(mut graph: TypeGraph, diagnostics: Diagnostics) -> Self {
        let analysis = analyze_cycles(&mut graph);
        let order = emission_order(&graph, &analysis);
        classify_all(&mut graph);

        Self {
            graph,
            analysis,
            order,
            diagnostics,
        }
    }

    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    pub fn analysis(&self) -> &SccAnalysis {
        &self.analysis
    }

    /// Emission order (dependencies first)
    pub fn order(&self) -> &[TypeId] {
        &self.order
    }

    pub fn node(&self, id: TypeId) -> &TypeNode {
        self.graph.node(id)
    }

    /// Builder diagnostics
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn region(&self, id: TypeId) -> Region<'_> {
        let node = self.graph.node(id);
        Region {
            node,
            group: self.analysis.group_of(id),
            deps: node.dependencies(),
        }
    }

    /// Regions in emission order
    pub fn regions(&self) -> impl Iterator<Item = Region<'_>> + '_ {
        self.order.iter().map(|id| self.region(*id))
    }

    pub fn type_count(&self) -> usize {
        self.graph.len()
    }

    pub fn cycle_count(&self) -> usize {
        self.analysis.cyclic_groups().count()
    }
}

// =============================================================================
// Emitter
// =============================================================================

/// Output family of a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitStyle {
    /// Type declarations only
    Structural,
    /// Declarations paired with runtime validators
    Validated,
}

/// A code generation backend
pub trait Emitter: Send + Sync {
    /// Target name used on the command line and in config
    fn name(&self) -> &str;

    /// Language of the artifact
    fn language(&self) -> &str;

    fn style(&self) -> EmitStyle;

    /// Artifact file name
    fn filename(&self) -> &str;

    /// Constraints this backend renders. `None` means it renders none and
    /// no constraint warnings are raised for it.
    fn constraint_support(&self) -> Option<ConstraintSupport> {
        None
    }

    /// Emitted identifier for a canonical type name
    fn type_identifier(&self, canonical: &str) -> String {
        canonical.to_string()
    }

    /// Top-level names the artifact declares besides one per type (type
    /// guards, constants, helper interfaces), each with the node that
    /// introduces it. They are collision-checked with the type identifiers.
    fn companion_identifiers(&self, _plan: &EmissionPlan) -> Vec<(String, TypeId)> {
        Vec::new()
    }

    /// Render the whole artifact
    fn emit(&self, plan: &EmissionPlan, constraints: &ConstraintTable) -> String;
}

// =============================================================================
// Registry
// =============================================================================

/// Available backends, looked up by name
#[derive(Default)]
pub struct EmitterRegistry {
    emitters: Vec<Box<dyn Emitter>>,
}

impl EmitterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `typescript` and `zod`
    pub fn with_builtin(config: &CompilerConfig) -> Self {
        let mut registry = Self::new();
        registry.register(TypeScriptEmitter::new(config.typescript.clone()));
        registry.register(ZodEmitter::new(config.zod.clone()));
        registry.register(GoEmitter::new(config.go.clone()));
        registry
    }

    /// Add a backend, replacing any with the same name
    pub fn register(&mut self, emitter: impl Emitter + 'static) {
        self.emitters.retain(|e| e.name() != emitter.name());
        self.emitters.push(Box::new(emitter));
    }

    /// Registered target names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.emitters.iter().map(|e| e.name()).collect();
        names.sort_unstable();
        names
    }

    pub fn emitters(&self) -> impl Iterator<Item = &dyn Emitter> {
        self.emitters.iter().map(|e| e.as_ref())
    }

    pub fn get(&self, name: &str) -> Result<&dyn Emitter> {
        self.emitters
            .iter()
            .find(|e| e.name() == name)
            .map(|e| e.as_ref())
            .ok_or_else(|| CompileError::UnknownTarget {
                name: name.to_string(),
                suggestion: self.suggest(name),
            })
    }

    /// Closest registered name by fuzzy score
    pub fn suggest(&self, query: &str) -> Option<String> {
        let matcher = SkimMatcherV2::default();
        self.names()
            .into_iter()
            .filter_map(|candidate| matcher.fuzzy_match(candidate, query).map(|score| (score, candidate)))
            .max_by_key(|(score, _)| *score)
            .map(|(_, candidate)| candidate.to_string())
    }
}

// =============================================================================
// Public API
// =============================================================================

/// One generated file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub target: String,
    pub filename: String,
    pub contents: String,
}

/// Output from a successful compilation
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// One artifact per requested target, in request order
    pub artifacts: Vec<Artifact>,
    pub diagnostics: Diagnostics,
    pub type_count: usize,
}

impl CompileOutput {
    pub fn artifact(&self, target: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.target == target)
    }
}

/// Compile one document for the given targets.
///
/// Atomic: every target is resolved and every identifier checked before
/// any backend runs, and nothing is returned unless all of it succeeded.
pub fn compile<S: AsRef<str>>(document: &Value, registry: &EmitterRegistry, targets: &[S]) -> Result<CompileOutput> {
    let mut emitters: Vec<&dyn Emitter> = Vec::with_capacity(targets.len());
    for target in targets {
        let emitter = registry.get(target.as_ref())?;
        if !emitters.iter().any(|e| e.name() == emitter.name()) {
            emitters.push(emitter);
        }
    }

    let plan = EmissionPlan::build(document)?;
    tracing::debug!(types = plan.type_count(), cycles = plan.cycle_count(), "built emission plan");

    for emitter in &emitters {
        NameResolver::resolve(&plan, *emitter)?;
    }

    let mut diagnostics = plan.diagnostics().clone();
    let mut artifacts = Vec::with_capacity(emitters.len());

    for emitter in emitters {
        let constraints = match emitter.constraint_support() {
            Some(support) => ConstraintMapper::new(emitter.name(), &support).map_graph(plan.graph(), &mut diagnostics),
            None => ConstraintTable::default(),
        };

        let contents = emitter.emit(&plan, &constraints);
        tracing::debug!(target_name = emitter.name(), bytes = contents.len(), "emitted artifact");

        artifacts.push(Artifact {
            target: emitter.name().to_string(),
            filename: emitter.filename().to_string(),
            contents,
        });
    }

    Ok(CompileOutput {
        artifacts,
        diagnostics,
        type_count: plan.type_count(),
    })
}

// =============================================================================
// Shared rendering helpers
// =============================================================================

/// `// ` comment lines for a description and a default value
pub(crate) fn push_doc(out: &mut String, indent: &str, description: Option<&str>, default: Option<&Value>) {
    if let Some(description) = description {
        for line in description.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                out.push_str(indent);
                out.push_str("//\n");
            } else {
                out.push_str(&format!("{}// {}\n", indent, line));
            }
        }
    }
    if let Some(default) = default {
        out.push_str(&format!("{}// Defaults to {}.\n", indent, default));
    }
}

/// Number literal without a trailing `.0` for whole values
pub(crate) fn number_literal(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
