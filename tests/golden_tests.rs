//! Golden Tests for Emitted Artifacts
//!
//! Compiles the fixtures under tests/fixtures and pins the generated
//! TypeScript and Zod text.

use schema_compiler::codegen::{EmissionPlan, TypeScriptOptions, ZodOptions};
use schema_compiler::graph::ShapeTag;
use schema_compiler::{compile, CompileOutput, CompilerConfig, EmitterRegistry};

fn fixture(source: &str) -> serde_json::Value {
    serde_json::from_str(source).unwrap()
}

fn compiled(source: &str) -> CompileOutput {
    let registry = EmitterRegistry::with_builtin(&CompilerConfig::default());
    compile(&fixture(source), &registry, &["typescript", "zod"]).unwrap()
}

fn contents<'a>(output: &'a CompileOutput, target: &str) -> &'a str {
    &output.artifact(target).unwrap().contents
}

// =============================================================================
// Person
// =============================================================================

#[test]
fn test_person_typescript() {
    let output = compiled(include_str!("fixtures/person.json"));

    let expected = r#"// Code generated by schemac. DO NOT EDIT.

export type PersonRole =
  | "admin"
  | "member"
  | "guest";

// A person on file
export interface Person {
  age: number;
  email?: string;
  // Full name
  name: string;
  nickname?: string | null;
  // Defaults to "member".
  role?: PersonRole;
}
"#;
    assert_eq!(contents(&output, "typescript"), expected);
}

#[test]
fn test_person_zod() {
    let output = compiled(include_str!("fixtures/person.json"));

    let expected = r#"// Code generated by schemac. DO NOT EDIT.

import { z } from "zod";

export const PersonRoleSchema = z.enum(["admin", "member", "guest"]);
export type PersonRole = z.infer<typeof PersonRoleSchema>;

// A person on file
export const PersonSchema = z.object({
  age: z.number().int().min(0).max(150),
  email: z.email().optional(),
  // Full name
  name: z.string().min(1),
  nickname: z.string().nullable().optional(),
  // Defaults to "member".
  role: PersonRoleSchema.optional(),
});
export type Person = z.infer<typeof PersonSchema>;
"#;
    assert_eq!(contents(&output, "zod"), expected);
}

#[test]
fn test_person_artifact_names() {
    let output = compiled(include_str!("fixtures/person.json"));

    let names: Vec<(&str, &str)> = output
        .artifacts
        .iter()
        .map(|a| (a.target.as_str(), a.filename.as_str()))
        .collect();
    assert_eq!(names, vec![("typescript", "types.ts"), ("zod", "schemas.ts")]);
    assert_eq!(output.type_count, 2);
}

// =============================================================================
// Events
// =============================================================================

#[test]
fn test_events_shapes() {
    let plan = EmissionPlan::build(&fixture(include_str!("fixtures/events.json"))).unwrap();

    assert_eq!(plan.graph().get("Event").unwrap().shape(), Some(ShapeTag::DiscriminatedObjectUnion));
    for branch in ["EventCreated", "EventUpdated", "EventDeleted"] {
        assert!(plan.graph().get(branch).is_some(), "missing branch {}", branch);
    }
}

#[test]
fn test_events_typescript() {
    let output = compiled(include_str!("fixtures/events.json"));
    let ts = contents(&output, "typescript");

    assert!(ts.contains("export interface EventUpdated {\n  fields?: string[];\n  id: string;\n  type: \"updated\";\n}\n"));
    assert!(ts.contains(
        "// Lifecycle event\nexport type Event =\n  | EventCreated\n  | EventUpdated\n  | EventDeleted;\n"
    ));
    assert!(ts.contains(
        "export function isEventDeleted(value: Event): value is EventDeleted {\n  return value.type === \"deleted\";\n}\n"
    ));
}

#[test]
fn test_events_zod() {
    let output = compiled(include_str!("fixtures/events.json"));
    let zod = contents(&output, "zod");

    assert!(zod.contains(
        "export const EventCreatedSchema = z.object({\n  id: z.uuid(),\n  type: z.literal(\"created\"),\n});\n"
    ));
    assert!(zod.contains(
        "export const EventSchema = z.discriminatedUnion(\"type\", [\n  EventCreatedSchema,\n  EventUpdatedSchema,\n  EventDeletedSchema,\n]);\n"
    ));
    assert!(zod.contains("export type Event = z.infer<typeof EventSchema>;\n"));
}

// =============================================================================
// Recursive
// =============================================================================

#[test]
fn test_recursive_zod_declarations() {
    let output = compiled(include_str!("fixtures/recursive.json"));
    let zod = contents(&output, "zod");

    assert!(zod.contains(
        "export const ASchema = z.object({\n  get b(): z.ZodOptional<typeof BSchema> { return BSchema.optional(); },\n});\nexport interface A {\n  b?: B;\n}\n"
    ));
    assert!(zod.contains("  label: z.string().optional(),\n"));
    assert!(!zod.contains("export type A = z.infer"));
    assert!(zod.contains("export type Holder = z.infer<typeof HolderSchema>;\n"));
}

// =============================================================================
// Options
// =============================================================================

#[test]
fn test_options_flow_from_config() {
    let mut config = CompilerConfig::default();
    config.typescript = TypeScriptOptions {
        null_optional: true,
        filename: "person.d.ts".to_string(),
        ..TypeScriptOptions::default()
    };
    config.zod = ZodOptions {
        export_types: false,
        ..ZodOptions::default()
    };

    let registry = EmitterRegistry::with_builtin(&config);
    let output = compile(&fixture(include_str!("fixtures/person.json")), &registry, &["typescript", "zod"]).unwrap();

    let ts = output.artifact("typescript").unwrap();
    assert_eq!(ts.filename, "person.d.ts");
    assert!(ts.contents.contains("  email: string | null;\n"));
    assert!(ts.contents.contains("  nickname: string | null;\n"));

    let zod = &output.artifact("zod").unwrap().contents;
    assert!(zod.contains("\nconst PersonSchema = z.object({"));
    assert!(!zod.contains("export "));
}
