//! Pipeline Tests
//!
//! End-to-end properties of the compiler: determinism, ordering, cycle
//! closure, atomic failure and backend independence.

use serde_json::{json, Value};

use schema_compiler::codegen::{EmissionPlan, EmitStyle, Emitter};
use schema_compiler::graph::analysis::{lazy_free_is_acyclic, validate_lazy_edges};
use schema_compiler::graph::{ConstraintTable, DiagnosticCode, ShapeTag, TypeKind};
use schema_compiler::{compile, CompileError, CompilerConfig, EmitterRegistry};

fn fixture(name: &str) -> Value {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn registry() -> EmitterRegistry {
    EmitterRegistry::with_builtin(&CompilerConfig::default())
}

// =============================================================================
// Determinism and Ordering
// =============================================================================

#[test]
fn test_compilation_is_deterministic() {
    for name in ["person.json", "events.json", "recursive.json"] {
        let doc = fixture(name);
        let first = compile(&doc, &registry(), &["typescript", "zod"]).unwrap();
        let second = compile(&doc, &registry(), &["typescript", "zod"]).unwrap();
        assert_eq!(first.artifacts, second.artifacts, "{} is not deterministic", name);
        assert_eq!(first.diagnostics, second.diagnostics);
    }
}

#[test]
fn test_field_order_is_alphabetical_in_every_style() {
    let doc = json!({
        "$defs": {
            "Record": {
                "type": "object",
                "properties": {
                    "zeta": {"type": "string"},
                    "alpha": {"type": "string"},
                    "mid": {"type": "integer"}
                }
            }
        }
    });
    let output = compile(&doc, &registry(), &["typescript", "zod"]).unwrap();

    for artifact in &output.artifacts {
        let alpha = artifact.contents.find("  alpha").unwrap();
        let mid = artifact.contents.find("  mid").unwrap();
        let zeta = artifact.contents.find("  zeta").unwrap();
        assert!(alpha < mid && mid < zeta, "unsorted fields in {}", artifact.target);
    }
}

#[test]
fn test_dependencies_precede_dependents() {
    let plan = EmissionPlan::build(&fixture("events.json")).unwrap();
    let position = |name: &str| {
        plan.order()
            .iter()
            .position(|id| plan.node(*id).name == name)
            .unwrap()
    };

    assert!(position("EventCreated") < position("Event"));
    assert!(position("EventUpdated") < position("Event"));
    assert!(position("EventDeleted") < position("Event"));
    assert_eq!(plan.order().len(), plan.graph().len());
}

// =============================================================================
// Cycles
// =============================================================================

#[test]
fn test_cycle_closure() {
    let plan = EmissionPlan::build(&fixture("recursive.json")).unwrap();
    assert!(validate_lazy_edges(plan.graph(), plan.analysis()).is_empty());
    assert!(lazy_free_is_acyclic(plan.graph()));
    assert_eq!(plan.cycle_count(), 2);

    for (from, to, tag) in plan.graph().dependency_graph().edges() {
        let inside = plan.analysis().same_group(from, to) && plan.analysis().is_cyclic(from);
        assert_eq!(inside, tag == schema_compiler::graph::EdgeTag::Lazy);
    }
}

#[test]
fn test_self_reference_scenario() {
    let plan = EmissionPlan::build(&fixture("recursive.json")).unwrap();
    let node = plan.graph().get("Node").unwrap();
    let group = plan.analysis().group_of(node.id);
    assert!(group.is_self_referential);
    assert_eq!(group.members.len(), 1);

    let output = compile(&fixture("recursive.json"), &registry(), &["typescript", "zod"]).unwrap();
    let ts = &output.artifact("typescript").unwrap().contents;
    let zod = &output.artifact("zod").unwrap().contents;

    assert!(ts.contains("export interface Node {\n  next?: Node;\n  value: number;\n}\n"));
    assert!(zod.contains("  get next(): z.ZodOptional<typeof NodeSchema> { return NodeSchema.optional(); },\n"));
}

#[test]
fn test_mutual_cycle_scenario() {
    let plan = EmissionPlan::build(&fixture("recursive.json")).unwrap();
    let a = plan.graph().get("A").unwrap().id;
    let b = plan.graph().get("B").unwrap().id;
    assert!(plan.analysis().same_group(a, b));
    assert_eq!(plan.analysis().anchor_of(b), a);

    let output = compile(&fixture("recursive.json"), &registry(), &["typescript", "zod"]).unwrap();
    let ts = &output.artifact("typescript").unwrap().contents;
    let zod = &output.artifact("zod").unwrap().contents;

    // Structural style refers both ways directly
    assert!(ts.contains("export interface A {\n  b?: B;\n}\n"));
    assert!(ts.contains("export interface B {\n  a?: A;\n  label?: string;\n}\n"));

    // Validated style declares the anchor first and defers the back-edge
    let a_decl = zod.find("export const ASchema").unwrap();
    let b_decl = zod.find("export const BSchema").unwrap();
    assert!(a_decl < b_decl);
    assert!(zod.contains("  get a(): z.ZodOptional<typeof ASchema> { return ASchema.optional(); },\n"));

    // Holder points into the cycle with a plain, eager field
    assert!(zod.contains("export const HolderSchema = z.object({\n  start: ASchema,\n});\n"));
    let holder_decl = zod.find("export const HolderSchema").unwrap();
    assert!(b_decl < holder_decl);
}

// =============================================================================
// Classification and Constraints
// =============================================================================

#[test]
fn test_discriminated_union_detection() {
    let plan = EmissionPlan::build(&fixture("events.json")).unwrap();
    let event = plan.graph().get("Event").unwrap();
    assert_eq!(event.shape(), Some(ShapeTag::DiscriminatedObjectUnion));

    let TypeKind::Union(union) = &event.kind else { panic!("expected union") };
    assert_eq!(union.discriminant.as_deref(), Some("type"));
    let literals: Vec<&Value> = union.members.iter().filter_map(|m| m.literal.as_ref()).collect();
    assert_eq!(literals, vec![&json!("created"), &json!("updated"), &json!("deleted")]);

    let output = compile(&fixture("events.json"), &registry(), &["typescript"]).unwrap();
    let ts = &output.artifacts[0].contents;
    assert_eq!(ts.matches("export function is").count(), 3);
    for (guard, member, literal) in [
        ("isEventCreated", "EventCreated", "created"),
        ("isEventUpdated", "EventUpdated", "updated"),
        ("isEventDeleted", "EventDeleted", "deleted"),
    ] {
        assert!(ts.contains(&format!(
            "export function {}(value: Event): value is {} {{\n  return value.type === \"{}\";\n}}\n",
            guard, member, literal
        )));
    }
}

#[test]
fn test_shared_union_members_get_scoped_guards() {
    let branch = |tag: &str| {
        json!({
            "type": "object",
            "properties": {"type": {"const": tag}, "id": {"type": "string"}},
            "required": ["type", "id"]
        })
    };
    let doc = json!({
        "$defs": {
            "Created": branch("created"),
            "Updated": branch("updated"),
            "Deleted": branch("deleted"),
            "Event": {"oneOf": [{"$ref": "#/$defs/Created"}, {"$ref": "#/$defs/Updated"}]},
            "AnyEvent": {"oneOf": [
                {"$ref": "#/$defs/Created"},
                {"$ref": "#/$defs/Updated"},
                {"$ref": "#/$defs/Deleted"}
            ]}
        }
    });

    let output = compile(&doc, &registry(), &["typescript", "zod"]).unwrap();
    let ts = &output.artifact("typescript").unwrap().contents;

    assert!(!ts.contains("function isCreated("));
    assert!(!ts.contains("function isUpdated("));
    for guard in ["isEventCreated", "isEventUpdated", "isAnyEventCreated", "isAnyEventUpdated"] {
        assert_eq!(ts.matches(&format!("function {}(", guard)).count(), 1, "{}", guard);
    }
    assert!(ts.contains(
        "export function isAnyEventCreated(value: AnyEvent): value is Created {\n  return value.type === \"created\";\n}\n"
    ));
    assert!(ts.contains(
        "export function isDeleted(value: AnyEvent): value is Deleted {\n  return value.type === \"deleted\";\n}\n"
    ));
    assert_eq!(ts.matches("export function is").count(), 5);
}

#[test]
fn test_constraint_boundaries() {
    let doc = fixture("person.json");
    let plan = EmissionPlan::build(&doc).unwrap();
    let person = plan.graph().get("Person").unwrap();
    let TypeKind::Object(object) = &person.kind else { panic!("expected object") };
    let age = &object.field("age").unwrap().reference;

    let registry = registry();
    let zod = registry.get("zod").unwrap();
    let support = zod.constraint_support().unwrap();
    let mut diagnostics = schema_compiler::Diagnostics::new();
    let table = schema_compiler::graph::ConstraintMapper::new("zod", &support).map_graph(plan.graph(), &mut diagnostics);

    let admits = |x: f64| table.get(&age.path).iter().all(|d| d.admits_number(x).unwrap_or(true));
    assert!(admits(0.0));
    assert!(admits(150.0));
    assert!(!admits(-1.0));
    assert!(!admits(151.0));

    let output = compile(&doc, &registry, &["zod"]).unwrap();
    assert!(output.artifacts[0].contents.contains("  age: z.number().int().min(0).max(150),\n"));
}

#[test]
fn test_ambiguous_discriminant_falls_back() {
    let doc = json!({
        "$defs": {
            "Shape": {"oneOf": [
                {"type": "object", "properties": {"radius": {"type": "number"}}, "required": ["radius"]},
                {"type": "object", "properties": {"side": {"type": "number"}}, "required": ["side"]}
            ]}
        }
    });

    let output = compile(&doc, &registry(), &["typescript", "zod"]).unwrap();
    assert_eq!(output.diagnostics.with_code(DiagnosticCode::AmbiguousDiscriminant).count(), 1);

    let ts = &output.artifact("typescript").unwrap().contents;
    assert!(ts.contains("export type Shape =\n  | ShapeVariant1\n  | ShapeVariant2;\n"));
    assert!(!ts.contains("function is"));

    let zod = &output.artifact("zod").unwrap().contents;
    assert!(zod.contains("export const ShapeSchema = z.union([\n  ShapeVariant1Schema,\n  ShapeVariant2Schema,\n]);\n"));
}

#[test]
fn test_unsupported_constraint_is_per_target() {
    let doc = json!({
        "$defs": {
            "Tags": {"type": "object", "properties": {
                "values": {"type": "array", "items": {"type": "string"}, "uniqueItems": true}
            }}
        }
    });

    let output = compile(&doc, &registry(), &["typescript", "zod"]).unwrap();
    let dropped: Vec<_> = output.diagnostics.with_code(DiagnosticCode::UnsupportedConstraint).collect();
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].target.as_deref(), Some("zod"));
}

// =============================================================================
// Fatal Errors
// =============================================================================

#[test]
fn test_unresolved_reference_aborts_with_path() {
    let doc = json!({
        "title": "Root",
        "type": "object",
        "properties": {
            "foo": {"oneOf": [{"type": "string"}, {"type": "integer"}, {"$ref": "#/$defs/Missing"}]}
        }
    });

    let err = compile(&doc, &registry(), &["typescript", "zod"]).unwrap_err();
    assert!(matches!(err, CompileError::UnresolvedReference { .. }));
    assert_eq!(err.path().unwrap().to_string(), "#/properties/foo/oneOf/2");
}

#[test]
fn test_emitted_identifier_collision_aborts() {
    let doc = json!({
        "$defs": {
            "Array": {"type": "array", "items": {"type": "string"}},
            "ArrayType": {"type": "string"}
        }
    });

    match compile(&doc, &registry(), &["typescript"]) {
        Err(CompileError::NamingCollision { name, path, existing }) => {
            assert_eq!(name, "ArrayType");
            assert_eq!(existing.to_string(), "#/$defs/Array");
            assert_eq!(path.to_string(), "#/$defs/ArrayType");
        }
        other => panic!("expected NamingCollision, got {:?}", other.map(|o| o.artifacts.len())),
    }
}

#[test]
fn test_canonical_name_collision_aborts() {
    let doc = json!({
        "$defs": {
            "TaskStatus": {"enum": ["open", "done"]},
            "task_status": {"enum": ["open", "closed"]}
        }
    });
    let err = compile(&doc, &registry(), &["typescript"]).unwrap_err();
    assert!(matches!(err, CompileError::NamingCollision { .. }));
}

/// Declares a `{Name}Values` constant next to every type
struct ValueLists;

impl Emitter for ValueLists {
    fn name(&self) -> &str {
        "lists"
    }

    fn language(&self) -> &str {
        "text"
    }

    fn style(&self) -> EmitStyle {
        EmitStyle::Structural
    }

    fn filename(&self) -> &str {
        "lists.txt"
    }

    fn companion_identifiers(&self, plan: &EmissionPlan) -> Vec<(String, schema_compiler::graph::TypeId)> {
        plan.graph().nodes().iter().map(|node| (format!("{}Values", node.name), node.id)).collect()
    }

    fn emit(&self, _plan: &EmissionPlan, _constraints: &ConstraintTable) -> String {
        String::new()
    }
}

#[test]
fn test_companion_identifier_collision_aborts() {
    let doc = json!({
        "$defs": {
            "Color": {"enum": ["red", "green"]},
            "ColorValues": {"type": "array", "items": {"$ref": "#/$defs/Color"}}
        }
    });

    let mut registry = registry();
    registry.register(ValueLists);
    match compile(&doc, &registry, &["lists"]) {
        Err(CompileError::NamingCollision { name, path, existing }) => {
            assert_eq!(name, "ColorValues");
            assert_eq!(path.to_string(), "#/$defs/Color");
            assert_eq!(existing.to_string(), "#/$defs/ColorValues");
        }
        other => panic!("expected NamingCollision, got {:?}", other.map(|o| o.artifacts.len())),
    }
}

// =============================================================================
// Backend Independence
// =============================================================================

/// Lists declarations in emission order
struct Manifest;

impl Emitter for Manifest {
    fn name(&self) -> &str {
        "typescript"
    }

    fn language(&self) -> &str {
        "text"
    }

    fn style(&self) -> EmitStyle {
        EmitStyle::Structural
    }

    fn filename(&self) -> &str {
        "manifest.txt"
    }

    fn emit(&self, plan: &EmissionPlan, _constraints: &ConstraintTable) -> String {
        plan.regions()
            .map(|region| {
                let lazy = if region.is_cyclic() { " (cyclic)" } else { "" };
                format!("{}{}\n", region.node.name, lazy)
            })
            .collect()
    }
}

#[test]
fn test_swapping_an_emitter_leaves_upstream_untouched() {
    let doc = fixture("recursive.json");
    let builtin = compile(&doc, &registry(), &["typescript", "zod"]).unwrap();

    let mut swapped = registry();
    swapped.register(Manifest);
    let output = compile(&doc, &swapped, &["typescript", "zod"]).unwrap();

    assert_eq!(output.type_count, builtin.type_count);
    assert_eq!(output.artifact("zod"), builtin.artifact("zod"));
    assert_eq!(
        output.artifact("typescript").unwrap().contents,
        "A (cyclic)\nB (cyclic)\nHolder\nNode (cyclic)\n"
    );
}
