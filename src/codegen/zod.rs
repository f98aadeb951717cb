//! Zod Code Emitter
//!
//! Validated style: one runtime schema value per type, paired with a
//! TypeScript type. Values are built eagerly, so every lazy edge goes
//! through a deferred accessor:
//!
//! - lazy object fields become getters with an explicit Zod return type
//! - cyclic aliases, arrays, maps and unions are wrapped in `z.lazy`
//! - cyclic nodes get a written-out TypeScript declaration, since
//!   `z.infer` cannot see through the indirection

use super::names::{avoid_global, property_key};
use super::{number_literal, push_doc, EmissionPlan, EmitStyle, Emitter, Region, TypeScriptEmitter, ZodOptions, BANNER};
use crate::graph::{
    BoundKind, ConstraintDescriptor, ConstraintKind, ConstraintSupport, ConstraintTable, EnumType, EnumValue,
    EnumValueKind, Field, NamedFormat, PrimitiveKind, Reference, SchemaPath, ShapeTag, TypeKind, TypeRef,
    UnionType,
};

/// Validated Zod backend
#[derive(Debug, Clone, Default)]
pub struct ZodEmitter {
    options: ZodOptions,
    /// Renders the explicit declarations of cyclic nodes
    structural: TypeScriptEmitter,
}

impl ZodEmitter {
    pub fn new(options: ZodOptions) -> Self {
        Self {
            options,
            structural: TypeScriptEmitter::default(),
        }
    }

    pub fn options(&self) -> &ZodOptions {
        &self.options
    }

    fn export(&self) -> &'static str {
        if self.options.export_types {
            "export "
        } else {
            ""
        }
    }

    fn schema_name(&self, canonical: &str) -> String {
        format!("{}Schema", self.type_identifier(canonical))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Validator expression for a reference, nullability included
    fn expr(&self, plan: &EmissionPlan, reference: &Reference, constraints: &ConstraintTable) -> String {
        let descriptors = constraints.get(&reference.path);

        let mut out = match (&reference.literal, &reference.target) {
            (Some(literal), _) => format!("z.literal({})", literal),
            (None, TypeRef::Named(id)) => self.schema_name(&plan.node(*id).name),
            (None, TypeRef::Primitive(kind)) => self.primitive(*kind, descriptors),
            (None, TypeRef::Array(items)) => format!("z.array({})", self.expr(plan, items, constraints)),
            (None, TypeRef::Map(values)) => {
                format!("z.record(z.string(), {})", self.expr(plan, values, constraints))
            }
        };

        for descriptor in descriptors {
            out.push_str(&refinement(descriptor));
        }

        if reference.nullable && !is_open(&out) {
            out.push_str(".nullable()");
        }
        out
    }

    fn primitive(&self, kind: PrimitiveKind, descriptors: &[ConstraintDescriptor]) -> String {
        match kind {
            PrimitiveKind::String => descriptors
                .iter()
                .find_map(|d| match d {
                    ConstraintDescriptor::Format(format) => Some(self.format(format)),
                    _ => None,
                })
                .unwrap_or_else(|| "z.string()".to_string()),
            PrimitiveKind::Integer => "z.number().int()".to_string(),
            PrimitiveKind::Number => "z.number()".to_string(),
            PrimitiveKind::Boolean => "z.boolean()".to_string(),
            PrimitiveKind::Null => "z.null()".to_string(),
            PrimitiveKind::Unknown => "z.unknown()".to_string(),
        }
    }

    /// Format validator; configured mappings win over the built-ins
    fn format(&self, format: &NamedFormat) -> String {
        if let Some(mapped) = self.options.format_mappings.get(format.keyword()) {
            return mapped.clone();
        }
        match format {
            NamedFormat::Email => "z.email()".to_string(),
            NamedFormat::Uuid => "z.uuid()".to_string(),
            NamedFormat::Url => "z.url()".to_string(),
            NamedFormat::DateTime => "z.iso.datetime()".to_string(),
            NamedFormat::Date => "z.iso.date()".to_string(),
            NamedFormat::Time => "z.iso.time()".to_string(),
            NamedFormat::Byte => "z.base64()".to_string(),
            // Unmapped custom formats are dropped by the mapper
            NamedFormat::Custom(_) => "z.string()".to_string(),
        }
    }

    /// Zod type of an expression, for getter return annotations
    fn zod_type(&self, plan: &EmissionPlan, reference: &Reference, constraints: &ConstraintTable) -> String {
        let descriptors = constraints.get(&reference.path);

        let base = match (&reference.literal, &reference.target) {
            (Some(literal), _) => format!("z.ZodLiteral<{}>", literal),
            (None, TypeRef::Named(id)) => format!("typeof {}", self.schema_name(&plan.node(*id).name)),
            (None, TypeRef::Primitive(_)) if descriptors.iter().any(|d| d.kind() == ConstraintKind::Format) => {
                "z.ZodType<string>".to_string()
            }
            (None, TypeRef::Primitive(kind)) => match kind {
                PrimitiveKind::String => "z.ZodString",
                PrimitiveKind::Integer | PrimitiveKind::Number => "z.ZodNumber",
                PrimitiveKind::Boolean => "z.ZodBoolean",
                PrimitiveKind::Null => "z.ZodNull",
                PrimitiveKind::Unknown => "z.ZodUnknown",
            }
            .to_string(),
            (None, TypeRef::Array(items)) => format!("z.ZodArray<{}>", self.zod_type(plan, items, constraints)),
            (None, TypeRef::Map(values)) => {
                format!("z.ZodRecord<z.ZodString, {}>", self.zod_type(plan, values, constraints))
            }
        };

        if reference.nullable && base != "z.ZodNull" && base != "z.ZodUnknown" {
            format!("z.ZodNullable<{}>", base)
        } else {
            base
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn declare(&self, plan: &EmissionPlan, region: &Region<'_>, constraints: &ConstraintTable) -> String {
        let node = region.node;
        let name = self.type_identifier(&node.name);
        let schema = self.schema_name(&node.name);
        let export = self.export();

        let mut out = String::new();
        push_doc(&mut out, "", node.description.as_deref(), None);

        match &node.kind {
            TypeKind::Object(object) => {
                out.push_str(&format!("{}const {} = z.object({{", export, schema));
                if object.fields.is_empty() {
                    out.push_str("});\n");
                } else {
                    out.push('\n');
                    for field in &object.fields {
                        push_doc(&mut out, "  ", field.description.as_deref(), field.default.as_ref());
                        out.push_str("  ");
                        out.push_str(&self.object_field(plan, field, constraints));
                        out.push('\n');
                    }
                    out.push_str("});\n");
                }

                if region.is_cyclic() {
                    out.push_str(&format!("{}interface {} {{\n", export, name));
                    out.push_str(&self.structural.render_fields(plan, &object.fields, false));
                    out.push_str("}\n");
                    return out;
                }
            }
            _ if region.is_cyclic() => {
                // Enums and primitives hold no references, so only these reach here
                let (expr, ty) = match &node.kind {
                    TypeKind::Union(union) => (
                        self.union_expr(plan, union, constraints, false),
                        union
                            .members
                            .iter()
                            .map(|m| self.structural.render_ref(plan, &m.reference))
                            .collect::<Vec<_>>()
                            .join(" | "),
                    ),
                    TypeKind::Array(array) => {
                        let mut expr = format!("z.array({})", self.expr(plan, &array.items, constraints));
                        for descriptor in constraints.get(&node.path) {
                            expr.push_str(&refinement(descriptor));
                        }
                        let items = self.structural.render_ref(plan, &array.items);
                        let ty = if items.contains(" | ") { format!("({})[]", items) } else { format!("{}[]", items) };
                        (expr, ty)
                    }
                    TypeKind::Map(map) => (
                        format!("z.record(z.string(), {})", self.expr(plan, &map.values, constraints)),
                        format!("Record<string, {}>", self.structural.render_ref(plan, &map.values)),
                    ),
                    TypeKind::Alias(alias) => (
                        self.expr(plan, &alias.target, constraints),
                        self.structural.render_ref(plan, &alias.target),
                    ),
                    _ => (self.value_expr(plan, &node.kind, &node.path, constraints), "unknown".to_string()),
                };

                out.push_str(&format!(
                    "{}const {}: z.ZodType<{}> = z.lazy(() => {});\n",
                    export, schema, name, expr
                ));
                out.push_str(&format!("{}type {} = {};\n", export, name, ty));
                return out;
            }
            kind => {
                let expr = self.value_expr(plan, kind, &node.path, constraints);
                out.push_str(&format!("{}const {} = {};\n", export, schema, expr));
            }
        }

        out.push_str(&format!("{}type {} = z.infer<typeof {}>;\n", export, name, schema));
        out
    }

    /// `key: expr,` or a getter for lazy fields
    fn object_field(&self, plan: &EmissionPlan, field: &Field, constraints: &ConstraintTable) -> String {
        let key = property_key(&field.name);
        let mut expr = self.expr(plan, &field.reference, constraints);
        if field.optional {
            expr.push_str(".optional()");
        }

        if field.reference.is_lazy() {
            let mut ty = self.zod_type(plan, &field.reference, constraints);
            if field.optional {
                ty = format!("z.ZodOptional<{}>", ty);
            }
            format!("get {}(): {} {{ return {}; }},", key, ty, expr)
        } else {
            format!("{}: {},", key, expr)
        }
    }

    /// Expression for a non-object, non-deferred node
    fn value_expr(
        &self,
        plan: &EmissionPlan,
        kind: &TypeKind,
        path: &SchemaPath,
        constraints: &ConstraintTable,
    ) -> String {
        match kind {
            TypeKind::Enum(enumeration) => self.enum_expr(enumeration, constraints.get(path)),
            TypeKind::Union(union) => self.union_expr(plan, union, constraints, true),
            TypeKind::Array(array) => {
                let mut expr = format!("z.array({})", self.expr(plan, &array.items, constraints));
                for descriptor in constraints.get(path) {
                    expr.push_str(&refinement(descriptor));
                }
                expr
            }
            TypeKind::Map(map) => format!("z.record(z.string(), {})", self.expr(plan, &map.values, constraints)),
            TypeKind::Alias(alias) => self.expr(plan, &alias.target, constraints),
            TypeKind::Primitive(PrimitiveKind::Null) => "z.null()".to_string(),
            TypeKind::Primitive(_) => "z.unknown()".to_string(),
            TypeKind::Object(_) => "z.object({})".to_string(),
        }
    }

    fn enum_expr(&self, enumeration: &EnumType, item_counts: &[ConstraintDescriptor]) -> String {
        let shape = enumeration.shape.unwrap_or(ShapeTag::PlainStringEnum);

        let literal = |value: &EnumValue, title: Option<&String>| {
            let mut out = format!("z.literal({})", value.to_json());
            if let Some(title) = title {
                out.push_str(&format!(".describe({})", serde_json::Value::String(title.clone())));
            }
            out
        };

        let strings: Vec<String> = enumeration.variants.iter().map(|v| v.value.to_json().to_string()).collect();
        let mut members: Vec<String> = enumeration
            .variants
            .iter()
            .map(|v| literal(&v.value, if shape.is_titled() { v.title.as_ref() } else { None }))
            .collect();

        let single = match shape {
            ShapeTag::PlainStringEnum | ShapeTag::UntitledSingleSelect | ShapeTag::UntitledMultiSelect
                if enumeration.value_kind == EnumValueKind::String =>
            {
                let expr = format!("z.enum([{}])", strings.join(", "));
                if enumeration.nullable {
                    format!("{}.nullable()", expr)
                } else {
                    expr
                }
            }
            _ => {
                if enumeration.nullable {
                    members.push("z.null()".to_string());
                }
                if members.len() == 1 {
                    members.remove(0)
                } else {
                    format!("z.union([{}])", members.join(", "))
                }
            }
        };

        if shape.is_multi() {
            let mut expr = format!("z.array({})", single);
            for descriptor in item_counts {
                expr.push_str(&refinement(descriptor));
            }
            expr
        } else {
            single
        }
    }

    /// `z.discriminatedUnion` when every member is a plain object schema,
    /// `z.union` otherwise
    fn union_expr(&self, plan: &EmissionPlan, union: &UnionType, constraints: &ConstraintTable, eager: bool) -> String {
        let members: Vec<String> = union.members.iter().map(|m| self.expr(plan, &m.reference, constraints)).collect();

        let dispatchable = eager
            && union.members.iter().all(|m| {
                !m.reference.is_lazy()
                    && !m.reference.nullable
                    && m.reference
                        .as_named()
                        .is_some_and(|id| matches!(plan.node(id).kind, TypeKind::Object(_)))
            });

        let opening = match (&union.discriminant, dispatchable) {
            (Some(field), true) => format!("z.discriminatedUnion({}, [", serde_json::Value::String(field.clone())),
            _ => "z.union([".to_string(),
        };

        let mut out = opening;
        out.push('\n');
        for member in members {
            out.push_str(&format!("  {},\n", member));
        }
        out.push_str("])");
        out
    }
}

impl Emitter for ZodEmitter {
    fn name(&self) -> &str {
        "zod"
    }

    fn language(&self) -> &str {
        "typescript"
    }

    fn style(&self) -> EmitStyle {
        EmitStyle::Validated
    }

    fn filename(&self) -> &str {
        &self.options.filename
    }

    fn constraint_support(&self) -> Option<ConstraintSupport> {
        let kinds = ConstraintKind::ALL
            .into_iter()
            .filter(|k| *k != ConstraintKind::UniqueItems);
        Some(ConstraintSupport::new(kinds).with_formats(self.options.format_mappings.keys().cloned()))
    }

    fn type_identifier(&self, canonical: &str) -> String {
        avoid_global(canonical)
    }

    fn emit(&self, plan: &EmissionPlan, constraints: &ConstraintTable) -> String {
        let mut out = String::new();
        out.push_str(BANNER);
        out.push_str("\n\nimport { z } from \"zod\";\n");

        for region in plan.regions() {
            out.push('\n');
            out.push_str(&self.declare(plan, &region, constraints));
        }

        out
    }
}

/// Chained method for one descriptor (formats are rendered as the base)
fn refinement(descriptor: &ConstraintDescriptor) -> String {
    match descriptor {
        ConstraintDescriptor::Format(_) | ConstraintDescriptor::UniqueItems => String::new(),
        ConstraintDescriptor::Length { bound: BoundKind::Lower, value }
        | ConstraintDescriptor::ItemCount { bound: BoundKind::Lower, value } => format!(".min({})", value),
        ConstraintDescriptor::Length { bound: BoundKind::Upper, value }
        | ConstraintDescriptor::ItemCount { bound: BoundKind::Upper, value } => format!(".max({})", value),
        ConstraintDescriptor::Pattern(pattern) => format!(".regex(/{}/)", escape_regex(pattern)),
        ConstraintDescriptor::Numeric { bound: BoundKind::Lower, inclusive: true, value } => {
            format!(".min({})", number_literal(*value))
        }
        ConstraintDescriptor::Numeric { bound: BoundKind::Upper, inclusive: true, value } => {
            format!(".max({})", number_literal(*value))
        }
        ConstraintDescriptor::Numeric { bound: BoundKind::Lower, inclusive: false, value } => {
            format!(".gt({})", number_literal(*value))
        }
        ConstraintDescriptor::Numeric { bound: BoundKind::Upper, inclusive: false, value } => {
            format!(".lt({})", number_literal(*value))
        }
        ConstraintDescriptor::MultipleOf(step) => format!(".multipleOf({})", number_literal(*step)),
    }
}

/// Escape unescaped `/` for a regex literal
fn escape_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut escaped = false;
    for c in pattern.chars() {
        if c == '/' && !escaped {
            out.push('\\');
        }
        escaped = c == '\\' && !escaped;
        out.push(c);
    }
    out
}

/// `z.null()` and `z.unknown()` already admit null
fn is_open(expr: &str) -> bool {
    expr == "z.null()" || expr == "z.unknown()"
}
