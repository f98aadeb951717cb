//! Schema Compiler
//!
//! Compiles JSON Schema documents into source artifacts for several targets
//! from one canonical type graph.
//!
//! ## Pipeline
//!
//! ```text
//! document ─► build_graph ─► analyze_cycles ─► emission_order ─► classify_all
//!                                                                     │
//!              ┌──────────────────────────────────────────────────────┘
//!              ▼
//!     per target: NameResolver ─► ConstraintMapper ─► Emitter::emit ─► Artifact
//! ```
//!
//! The build is atomic: any fatal [`CompileError`] aborts before a single
//! artifact is produced. Non-fatal findings are collected as [`Diagnostics`].
//!
//! ## Targets
//!
//! - `typescript`: interfaces, literal unions, enums and type guards
//! - `zod`: runtime validators paired with TypeScript types
//! - `go`: structs with `json` tags, constant enums and tagged union wrappers
//!
//! Further targets implement [`Emitter`] and are added to an
//! [`EmitterRegistry`]; nothing upstream of emission changes.
//!
//! ```no_run
//! use schema_compiler::{compile, CompilerConfig, EmitterRegistry};
//!
//! let document = serde_json::json!({
//!     "$defs": {"User": {"type": "object", "properties": {"name": {"type": "string"}}}}
//! });
//! let registry = EmitterRegistry::with_builtin(&CompilerConfig::default());
//! let output = compile(&document, &registry, &["typescript", "zod"])?;
//! for artifact in &output.artifacts {
//!     println!("{}/{}", artifact.target, artifact.filename);
//! }
//! # Ok::<(), schema_compiler::CompileError>(())
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod graph;
pub mod loader;
pub mod writer;

pub use codegen::{compile, Artifact, CompileOutput, EmissionPlan, EmitStyle, Emitter, EmitterRegistry};
pub use config::CompilerConfig;
pub use error::{CompileError, Result};
pub use graph::{build_graph, DiagnosticCode, DiagnosticItem, Diagnostics, SchemaPath, TypeGraph};
