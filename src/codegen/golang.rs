//! Go Code Emitter
//!
//! Structural style for Go: structs with `json` tags, string and integer
//! enums with a `const` block, and discriminated unions as an interface
//! plus a wrapper struct that dispatches on the discriminant when
//! unmarshalling. Any other union is `interface{}`.
//!
//! Go sizes structs eagerly, so a field that closes a cycle onto a struct
//! is always a pointer, and cyclic collections are defined types rather
//! than aliases.

use serde_json::Value;
use std::collections::BTreeSet;

use super::{push_doc, EmissionPlan, EmitStyle, Emitter, GoFormat, GoOptionalStyle, GoOptions, Region, BANNER};
use crate::graph::names::symbol_name;
use crate::graph::{
    ConstraintTable, EnumCardinality, EnumType, EnumValue, EnumValueKind, Field, PrimitiveKind, Reference, TypeId,
    TypeKind, TypeRef, UnionType,
};

const OPT_IMPORT: &str = "github.com/Southclaws/opt";

/// Import paths used by the artifact
type Imports = BTreeSet<String>;

fn builtin_format(format: &str) -> Option<GoFormat> {
    let (go_type, import) = match format {
        "byte" => ("[]byte", None),
        "date-time" | "date" => ("time.Time", Some("time")),
        "uuid" => ("uuid.UUID", Some("github.com/google/uuid")),
        "email" => ("mail.Address", Some("net/mail")),
        "uri" => ("url.URL", Some("net/url")),
        _ => return None,
    };
    Some(GoFormat::new(go_type, import))
}

/// One branch of a tagged union: member type and discriminant value
struct Variant {
    member: String,
    tag: String,
}

/// Structural Go backend
#[derive(Debug, Clone, Default)]
pub struct GoEmitter {
    options: GoOptions,
}

impl GoEmitter {
    pub fn new(options: GoOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GoOptions {
        &self.options
    }

    fn format(&self, name: &str) -> Option<GoFormat> {
        self.options
            .format_mappings
            .get(name)
            .cloned()
            .or_else(|| builtin_format(name))
    }

    // =========================================================================
    // References
    // =========================================================================

    /// Go type for a reference, without optional wrapping
    fn render_ref(&self, plan: &EmissionPlan, reference: &Reference, imports: &mut Imports) -> String {
        if let Some(literal) = &reference.literal {
            return match literal {
                Value::String(_) => "string",
                Value::Number(n) if n.is_i64() || n.is_u64() => "int",
                Value::Number(_) => "float64",
                Value::Bool(_) => "bool",
                _ => "interface{}",
            }
            .to_string();
        }

        match &reference.target {
            TypeRef::Named(id) => self.type_identifier(&plan.node(*id).name),
            TypeRef::Primitive(kind) => self.primitive(*kind, reference, imports),
            TypeRef::Array(items) => format!("[]{}", self.element(plan, items, imports)),
            TypeRef::Map(values) => format!("map[string]{}", self.element(plan, values, imports)),
        }
    }

    fn primitive(&self, kind: PrimitiveKind, reference: &Reference, imports: &mut Imports) -> String {
        match kind {
            PrimitiveKind::String => {
                let mapped = reference.constraints.format.as_deref().and_then(|f| self.format(f));
                match mapped {
                    Some(format) => {
                        if let Some(import) = format.import {
                            imports.insert(import);
                        }
                        format.go_type
                    }
                    None => "string".to_string(),
                }
            }
            PrimitiveKind::Integer => "int".to_string(),
            PrimitiveKind::Number => "float64".to_string(),
            PrimitiveKind::Boolean => "bool".to_string(),
            PrimitiveKind::Null | PrimitiveKind::Unknown => "interface{}".to_string(),
        }
    }

    /// Slice element or map value; nullable ones become pointers
    fn element(&self, plan: &EmissionPlan, reference: &Reference, imports: &mut Imports) -> String {
        let ty = self.render_ref(plan, reference, imports);
        if reference.nullable && wrappable(&ty) {
            format!("*{}", ty)
        } else {
            ty
        }
    }

    /// Type of a field or alias target, optional style applied
    fn field_type(&self, plan: &EmissionPlan, reference: &Reference, optional: bool, imports: &mut Imports) -> String {
        let ty = self.render_ref(plan, reference, imports);

        let closes_cycle = reference.is_lazy()
            && reference
                .as_named()
                .is_some_and(|id| matches!(plan.node(id).kind, TypeKind::Object(_)));
        if closes_cycle {
            return format!("*{}", ty);
        }

        if !(optional || reference.nullable) || !wrappable(&ty) || self.names_reference_type(plan, reference) {
            return ty;
        }

        match self.options.optional_style {
            GoOptionalStyle::Pointer => format!("*{}", ty),
            GoOptionalStyle::Opt => {
                imports.insert(OPT_IMPORT.to_string());
                format!("opt.Optional[{}]", ty)
            }
        }
    }

    /// Named slices, maps and `interface{}` unions already have a nil value
    fn names_reference_type(&self, plan: &EmissionPlan, reference: &Reference) -> bool {
        let Some(id) = reference.as_named() else {
            return false;
        };
        match &plan.node(id).kind {
            TypeKind::Array(_) | TypeKind::Map(_) => true,
            TypeKind::Union(union) => self.variants(plan, union).is_none(),
            TypeKind::Primitive(kind) => matches!(kind, PrimitiveKind::Null | PrimitiveKind::Unknown),
            TypeKind::Enum(enumeration) => enumeration.cardinality == EnumCardinality::Multi,
            TypeKind::Object(_) | TypeKind::Alias(_) => false,
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn declare(&self, plan: &EmissionPlan, region: &Region<'_>, imports: &mut Imports) -> String {
        let node = region.node;
        let name = self.type_identifier(&node.name);
        // Aliases cannot refer to themselves
        let assign = if region.is_cyclic() { "" } else { "= " };

        let mut out = String::new();
        push_doc(&mut out, "", node.description.as_deref(), None);

        match &node.kind {
            TypeKind::Object(object) => self.declare_struct(&mut out, plan, &name, &object.fields, imports),
            TypeKind::Enum(enumeration) => declare_enum(&mut out, &name, enumeration),
            TypeKind::Union(union) => match self.variants(plan, union) {
                Some(variants) => {
                    let discriminant = union.discriminant.as_deref().unwrap_or_default();
                    declare_tagged_union(&mut out, &name, discriminant, &variants);
                    imports.extend(["bytes", "encoding/json", "fmt"].map(str::to_string));
                }
                None => out.push_str(&format!("type {} = interface{{}}\n", name)),
            },
            TypeKind::Array(array) => {
                let items = self.element(plan, &array.items, imports);
                out.push_str(&format!("type {} {}[]{}\n", name, assign, items));
            }
            TypeKind::Map(map) => {
                let values = self.element(plan, &map.values, imports);
                out.push_str(&format!("type {} {}map[string]{}\n", name, assign, values));
            }
            TypeKind::Alias(alias) => {
                let target = self.field_type(plan, &alias.target, false, imports);
                out.push_str(&format!("type {} {}{}\n", name, assign, target));
            }
            TypeKind::Primitive(kind) => {
                let ty = self.primitive(*kind, &Reference::primitive(*kind, node.path.clone()), imports);
                out.push_str(&format!("type {} = {}\n", name, ty));
            }
        }

        out
    }

    /// `type X struct { ... }` with gofmt column alignment
    fn declare_struct(&self, out: &mut String, plan: &EmissionPlan, name: &str, fields: &[Field], imports: &mut Imports) {
        if fields.is_empty() {
            out.push_str(&format!("type {} struct{{}}\n", name));
            return;
        }

        let rows: Vec<(String, String, String)> = fields
            .iter()
            .zip(field_names(fields))
            .map(|(field, go_name)| {
                let ty = self.field_type(plan, &field.reference, field.optional, imports);
                let omit = if field.optional { ",omitempty" } else { "" };
                (go_name, ty, format!("`json:\"{}{}\"`", field.name, omit))
            })
            .collect();

        let name_width = rows.iter().map(|(n, _, _)| n.len()).max().unwrap_or(0);
        let type_width = rows.iter().map(|(_, t, _)| t.len()).max().unwrap_or(0);

        out.push_str(&format!("type {} struct {{\n", name));
        for (field, (go_name, ty, tag)) in fields.iter().zip(&rows) {
            push_doc(out, "\t", field.description.as_deref(), field.default.as_ref());
            out.push_str(&format!("\t{:<nw$} {:<tw$} {}\n", go_name, ty, tag, nw = name_width, tw = type_width));
        }
        out.push_str("}\n");
    }

    /// Branches of a union that can dispatch on a string discriminant:
    /// every member a named struct pinned to a string literal.
    fn variants(&self, plan: &EmissionPlan, union: &UnionType) -> Option<Vec<Variant>> {
        union.discriminant.as_ref()?;
        union
            .members
            .iter()
            .map(|member| {
                let id = member.reference.as_named().filter(|_| !member.reference.nullable)?;
                if !matches!(plan.node(id).kind, TypeKind::Object(_)) {
                    return None;
                }
                let tag = member.literal.as_ref()?.as_str()?.to_string();
                Some(Variant {
                    member: self.type_identifier(&plan.node(id).name),
                    tag,
                })
            })
            .collect()
    }
}

impl Emitter for GoEmitter {
    fn name(&self) -> &str {
        "go"
    }

    fn language(&self) -> &str {
        "go"
    }

    fn style(&self) -> EmitStyle {
        EmitStyle::Structural
    }

    fn filename(&self) -> &str {
        &self.options.filename
    }

    fn companion_identifiers(&self, plan: &EmissionPlan) -> Vec<(String, TypeId)> {
        let mut out = Vec::new();
        for node in plan.graph().nodes() {
            let name = self.type_identifier(&node.name);
            match &node.kind {
                TypeKind::Enum(enumeration) => {
                    if enumeration.cardinality == EnumCardinality::Multi {
                        out.push((format!("{}Item", name), node.id));
                    }
                    out.push((format!("{}Values", name), node.id));
                    out.extend(enum_constants(&name, enumeration).into_iter().map(|c| (c, node.id)));
                }
                TypeKind::Union(union) if self.variants(plan, union).is_some() => {
                    out.push((format!("{}Union", name), node.id));
                }
                _ => {}
            }
        }
        out
    }

    fn emit(&self, plan: &EmissionPlan, _constraints: &ConstraintTable) -> String {
        let mut imports = Imports::new();
        let blocks: Vec<String> = plan.regions().map(|r| self.declare(plan, &r, &mut imports)).collect();

        let mut out = String::new();
        out.push_str(BANNER);
        out.push_str("\n\n");
        out.push_str(&format!("package {}\n", self.options.package));

        match imports.len() {
            0 => {}
            1 => {
                for import in &imports {
                    out.push_str(&format!("\nimport \"{}\"\n", import));
                }
            }
            _ => {
                out.push_str("\nimport (\n");
                for import in &imports {
                    out.push_str(&format!("\t\"{}\"\n", import));
                }
                out.push_str(")\n");
            }
        }

        for block in blocks {
            out.push('\n');
            out.push_str(&block);
        }

        out
    }
}

// =============================================================================
// Enums
// =============================================================================

/// Constant names in variant order: type name plus the value in PascalCase
fn enum_constants(name: &str, enumeration: &EnumType) -> Vec<String> {
    let mut used = BTreeSet::new();
    enumeration
        .variants
        .iter()
        .enumerate()
        .map(|(i, variant)| {
            let suffix = match &variant.value {
                EnumValue::Integer(value) if *value < 0 => format!("Neg{}", value.unsigned_abs()),
                EnumValue::Integer(value) => value.to_string(),
                EnumValue::String(value) => match symbol_name(value) {
                    s if s.is_empty() => format!("Value{}", i + 1),
                    s => s,
                },
            };
            unique(&mut used, format!("{}{}", name, suffix))
        })
        .collect()
}

fn declare_enum(out: &mut String, name: &str, enumeration: &EnumType) {
    let base = match enumeration.value_kind {
        EnumValueKind::String => "string",
        EnumValueKind::Integer => "int",
    };
    let multi = enumeration.cardinality == EnumCardinality::Multi;
    let item = if multi { format!("{}Item", name) } else { name.to_string() };

    out.push_str(&format!("type {} {}\n", item, base));

    let constants = enum_constants(name, enumeration);
    let width = constants.iter().map(String::len).max().unwrap_or(0);

    out.push_str("\nconst (\n");
    for (constant, variant) in constants.iter().zip(&enumeration.variants) {
        push_doc(out, "\t", variant.description.as_deref().or(variant.title.as_deref()), None);
        out.push_str(&format!("\t{:<w$} {} = {}\n", constant, item, variant.value.to_json(), w = width));
    }
    out.push_str(")\n");

    out.push_str(&format!("\nvar {}Values = []{}{{\n", name, item));
    for constant in &constants {
        out.push_str(&format!("\t{},\n", constant));
    }
    out.push_str("}\n");

    if multi {
        out.push_str(&format!("\ntype {} []{}\n", name, item));
    }
}

// =============================================================================
// Tagged Unions
// =============================================================================

fn declare_tagged_union(out: &mut String, name: &str, discriminant: &str, variants: &[Variant]) {
    let union = format!("{}Union", name);
    let field = Value::String(discriminant.to_string());

    out.push_str(&format!(
        "type {union} interface {{\n\t{name}Type() string\n\tis{name}()\n}}\n\n\
         type {name} struct {{\n\t{union}\n}}\n\n\
         func (w {name}) MarshalJSON() ([]byte, error) {{\n\
         \tif w.{union} == nil {{\n\t\treturn []byte(\"null\"), nil\n\t}}\n\
         \treturn json.Marshal(w.{union})\n}}\n\n\
         func (w *{name}) UnmarshalJSON(data []byte) error {{\n\
         \tdata = bytes.TrimSpace(data)\n\
         \tif bytes.Equal(data, []byte(\"null\")) {{\n\t\tw.{union} = nil\n\t\treturn nil\n\t}}\n\n\
         \tvar peek struct {{\n\t\tType string `json:{field}`\n\t}}\n\
         \tif err := json.Unmarshal(data, &peek); err != nil {{\n\
         \t\treturn fmt.Errorf(\"{name}: invalid JSON: %w\", err)\n\t}}\n\
         \tif peek.Type == \"\" {{\n\
         \t\treturn fmt.Errorf(\"{name}: missing discriminator field %q\", {field})\n\t}}\n\n\
         \tvar v {union}\n\
         \tswitch peek.Type {{\n",
        union = union,
        name = name,
        field = field,
    ));

    for variant in variants {
        out.push_str(&format!(
            "\tcase {}:\n\t\tv = &{}{{}}\n",
            Value::String(variant.tag.clone()),
            variant.member
        ));
    }

    out.push_str(&format!(
        "\tdefault:\n\t\treturn fmt.Errorf(\"{name}: unknown type %q\", peek.Type)\n\t}}\n\n\
         \tif err := json.Unmarshal(data, v); err != nil {{\n\
         \t\treturn fmt.Errorf(\"{name}: invalid %q payload: %w\", peek.Type, err)\n\t}}\n\n\
         \tw.{union} = v\n\treturn nil\n}}\n",
        name = name,
        union = union,
    ));

    for variant in variants {
        out.push_str(&format!(
            "\nfunc ({member}) is{name}() {{}}\n\nfunc ({member}) {name}Type() string {{ return {tag} }}\n",
            member = variant.member,
            name = name,
            tag = Value::String(variant.tag.clone()),
        ));
    }
}

// =============================================================================
// Names
// =============================================================================

/// Exported Go field names, unique within the struct
fn field_names(fields: &[Field]) -> Vec<String> {
    let mut used = BTreeSet::new();
    fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let base = match symbol_name(&field.name) {
                name if name.is_empty() => format!("Field{}", i + 1),
                name => name,
            };
            unique(&mut used, base)
        })
        .collect()
}

fn unique(used: &mut BTreeSet<String>, base: String) -> String {
    let mut name = base.clone();
    let mut n = 2;
    while !used.insert(name.clone()) {
        name = format!("{}{}", base, n);
        n += 1;
    }
    name
}

/// Pointer or `opt.Optional` wrapping makes sense for this type
fn wrappable(ty: &str) -> bool {
    !(ty == "interface{}" || ty.starts_with("[]") || ty.starts_with("map[") || ty.starts_with('*'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::NameResolver;
    use crate::error::CompileError;
    use serde_json::json;

    fn emit(doc: serde_json::Value) -> String {
        emit_with(doc, GoOptions::default())
    }

    fn emit_with(doc: serde_json::Value, options: GoOptions) -> String {
        let plan = EmissionPlan::build(&doc).unwrap();
        GoEmitter::new(options).emit(&plan, &ConstraintTable::default())
    }

    fn event_defs() -> serde_json::Value {
        json!({
            "$defs": {
                "EventMetadata": {
                    "type": "object",
                    "properties": {
                        "timestamp": {"type": "string", "format": "date-time"},
                        "source": {"type": "string"}
                    },
                    "required": ["timestamp"]
                },
                "EventPayload": {
                    "type": "object",
                    "properties": {
                        "eventId": {"type": "string", "format": "uuid"},
                        "eventType": {"type": "string"},
                        "data": {"type": "object", "additionalProperties": true}
                    },
                    "required": ["eventId", "eventType"]
                },
                "EventHandler": {
                    "type": "object",
                    "properties": {
                        "handlerId": {"type": "string"},
                        "payload": {"$ref": "#/$defs/EventPayload"},
                        "metadata": {"$ref": "#/$defs/EventMetadata"},
                        "relatedPayloads": {"type": "array", "items": {"$ref": "#/$defs/EventPayload"}}
                    },
                    "required": ["handlerId", "payload"]
                }
            }
        })
    }

    #[test]
    fn test_structs_with_formats_and_pointers() {
        let expected = "// Code generated by schemac. DO NOT EDIT.

package generated

import (
\t\"github.com/google/uuid\"
\t\"time\"
)

type EventMetadata struct {
\tSource    *string   `json:\"source,omitempty\"`
\tTimestamp time.Time `json:\"timestamp\"`
}

type EventPayload struct {
\tData      map[string]interface{} `json:\"data,omitempty\"`
\tEventID   uuid.UUID              `json:\"eventId\"`
\tEventType string                 `json:\"eventType\"`
}

type EventHandler struct {
\tHandlerID       string         `json:\"handlerId\"`
\tMetadata        *EventMetadata `json:\"metadata,omitempty\"`
\tPayload         EventPayload   `json:\"payload\"`
\tRelatedPayloads []EventPayload `json:\"relatedPayloads,omitempty\"`
}
";
        assert_eq!(emit(event_defs()), expected);
    }

    #[test]
    fn test_opt_style() {
        let options = GoOptions {
            package: "events".to_string(),
            optional_style: GoOptionalStyle::Opt,
            ..GoOptions::default()
        };
        let out = emit_with(event_defs(), options);

        assert!(out.contains("package events\n"));
        assert!(out.contains("\t\"github.com/Southclaws/opt\"\n"));
        assert!(out.contains("\tSource    opt.Optional[string] `json:\"source,omitempty\"`\n"));
        assert!(out.contains("\tMetadata        opt.Optional[EventMetadata] `json:\"metadata,omitempty\"`\n"));
        // collections are never wrapped
        assert!(out.contains("\tRelatedPayloads []EventPayload              `json:\"relatedPayloads,omitempty\"`\n"));
    }

    #[test]
    fn test_format_mapping_override() {
        let mut options = GoOptions::default();
        options.format_mappings.insert("uuid".to_string(), GoFormat::new("string", None));
        options
            .format_mappings
            .insert("decimal".to_string(), GoFormat::new("decimal.Decimal", Some("github.com/shopspring/decimal")));

        let out = emit_with(
            json!({"$defs": {"Price": {
                "type": "object",
                "properties": {"id": {"type": "string", "format": "uuid"}, "amount": {"type": "string", "format": "decimal"}},
                "required": ["id", "amount"]
            }}}),
            options,
        );
        assert!(out.contains("\nimport \"github.com/shopspring/decimal\"\n"));
        assert!(out.contains("\tAmount decimal.Decimal `json:\"amount\"`\n"));
        assert!(out.contains("\tID     string          `json:\"id\"`\n"));
    }

    #[test]
    fn test_enums() {
        let out = emit(json!({
            "$defs": {
                "EventType": {"enum": ["thread_published", "thread_unpublished", "thread_updated", null]},
                "Level": {"enum": [1, -2]},
                "Tags": {"type": "array", "items": {"enum": ["a", "b"]}}
            }
        }));

        assert!(out.contains(
            "type EventType string

const (
\tEventTypeThreadPublished   EventType = \"thread_published\"
\tEventTypeThreadUnpublished EventType = \"thread_unpublished\"
\tEventTypeThreadUpdated     EventType = \"thread_updated\"
)

var EventTypeValues = []EventType{
\tEventTypeThreadPublished,
\tEventTypeThreadUnpublished,
\tEventTypeThreadUpdated,
}
"
        ));
        assert!(out.contains("type Level int\n\nconst (\n\tLevel1    Level = 1\n\tLevelNeg2 Level = -2\n)\n"));
        assert!(out.contains("type TagsItem string\n"));
        assert!(out.contains("\tTagsA TagsItem = \"a\"\n"));
        assert!(out.contains("\ntype Tags []TagsItem\n"));
    }

    #[test]
    fn test_tagged_union() {
        let out = emit(json!({
            "$defs": {
                "RPCRequestEvent": {
                    "type": "object",
                    "properties": {"method": {"const": "event"}, "id": {"type": "integer"}},
                    "required": ["method", "id"]
                },
                "RPCRequestOther": {
                    "type": "object",
                    "properties": {"method": {"const": "other"}, "id": {"type": "integer"}},
                    "required": ["method", "id"]
                },
                "RPCRequestToPlugin": {"oneOf": [
                    {"$ref": "#/$defs/RPCRequestEvent"},
                    {"$ref": "#/$defs/RPCRequestOther"}
                ]}
            }
        }));

        assert!(out.contains("import (\n\t\"bytes\"\n\t\"encoding/json\"\n\t\"fmt\"\n)\n"));
        assert!(out.contains(
            "type RPCRequestToPluginUnion interface {\n\tRPCRequestToPluginType() string\n\tisRPCRequestToPlugin()\n}\n\ntype RPCRequestToPlugin struct {\n\tRPCRequestToPluginUnion\n}\n"
        ));
        assert!(out.contains("\tvar peek struct {\n\t\tType string `json:\"method\"`\n\t}\n"));
        assert!(out.contains(
            "\t\treturn fmt.Errorf(\"RPCRequestToPlugin: missing discriminator field %q\", \"method\")\n"
        ));
        assert!(out.contains(
            "\tswitch peek.Type {\n\tcase \"event\":\n\t\tv = &RPCRequestEvent{}\n\tcase \"other\":\n\t\tv = &RPCRequestOther{}\n\tdefault:\n\t\treturn fmt.Errorf(\"RPCRequestToPlugin: unknown type %q\", peek.Type)\n\t}\n"
        ));
        assert!(out.contains("\nfunc (RPCRequestEvent) isRPCRequestToPlugin() {}\n"));
        assert!(out.contains("\nfunc (RPCRequestOther) RPCRequestToPluginType() string { return \"other\" }\n"));
        assert!(out.contains("\tID     int    `json:\"id\"`\n\tMethod string `json:\"method\"`\n"));
    }

    #[test]
    fn test_plain_union_and_recursion() {
        let out = emit(json!({
            "$defs": {
                "Value": {"oneOf": [{"type": "string"}, {"type": "number"}]},
                "Node": {
                    "type": "object",
                    "properties": {"next": {"$ref": "#/$defs/Node"}, "label": {"type": "string"}},
                    "required": ["next", "label"]
                },
                "Tree": {"type": "array", "items": {"$ref": "#/$defs/Branch"}},
                "Branch": {"type": "object", "properties": {"children": {"$ref": "#/$defs/Tree"}}}
            }
        }));

        assert!(out.contains("type Value = interface{}\n"));
        assert!(out.contains("\tLabel string `json:\"label\"`\n\tNext  *Node  `json:\"next\"`\n"));
        assert!(out.contains("type Tree []Branch\n"));
        assert!(out.contains("\tChildren Tree `json:\"children,omitempty\"`\n"));
        assert!(!out.contains("import"));
    }

    #[test]
    fn test_field_names_are_unique() {
        let out = emit(json!({
            "$defs": {"Flags": {
                "type": "object",
                "properties": {"a-b": {"type": "boolean"}, "a_b": {"type": "boolean"}, "日本": {"type": "string"}},
                "required": ["a-b", "a_b", "日本"]
            }}
        }));
        assert!(out.contains("\tAB     bool   `json:\"a-b\"`\n\tAB2    bool   `json:\"a_b\"`\n\tField3 string `json:\"日本\"`\n"));
    }

    #[test]
    fn test_enum_constant_collides_with_type() {
        let plan = EmissionPlan::build(&json!({
            "$defs": {
                "Status": {"enum": ["active", "closed"]},
                "StatusActive": {"type": "object", "properties": {"since": {"type": "string"}}}
            }
        }))
        .unwrap();

        match NameResolver::resolve(&plan, &GoEmitter::default()) {
            Err(CompileError::NamingCollision { name, path, existing }) => {
                assert_eq!(name, "StatusActive");
                assert_eq!(path.to_string(), "#/$defs/Status");
                assert_eq!(existing.to_string(), "#/$defs/StatusActive");
            }
            other => panic!("expected NamingCollision, got {:?}", other.map(|_| ())),
        }
    }
}
