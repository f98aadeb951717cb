//! TypeScript Code Emitter
//!
//! Structural style: interfaces, type aliases and enums, with one type
//! guard per member of a discriminated union. References resolve in a
//! separate phase from construction here, so cycles need no special casing.

use std::collections::{BTreeMap, BTreeSet};

use super::names::{avoid_global, enum_member_key, integer_member_key, member_access, property_key};
use super::{push_doc, EmissionPlan, EmitStyle, Emitter, Region, TypeScriptOptions, BANNER};
use crate::graph::names::symbol_name;
use crate::graph::{
    ConstraintTable, EnumType, EnumValue, Field, PrimitiveKind, Reference, ShapeTag, TypeId, TypeKind, TypeRef,
    UnionType,
};

/// Guard function name per (union, member index)
type GuardNames = BTreeMap<(TypeId, usize), String>;

const BRAND_PREAMBLE: &str = "declare const __brand: unique symbol;\ntype Brand<B> = { [__brand]: B };\n";

/// Structural TypeScript backend
#[derive(Debug, Clone, Default)]
pub struct TypeScriptEmitter {
    options: TypeScriptOptions,
}

impl TypeScriptEmitter {
    pub fn new(options: TypeScriptOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TypeScriptOptions {
        &self.options
    }

    fn export(&self) -> &'static str {
        if self.options.export_types {
            "export "
        } else {
            ""
        }
    }

    // =========================================================================
    // References
    // =========================================================================

    /// Type expression for a reference, nullability included
    pub(crate) fn render_ref(&self, plan: &EmissionPlan, reference: &Reference) -> String {
        let base = match (&reference.literal, &reference.target) {
            (Some(literal), _) => literal.to_string(),
            (None, TypeRef::Named(id)) => self.type_identifier(&plan.node(*id).name),
            (None, TypeRef::Primitive(kind)) => self.primitive(*kind, reference),
            (None, TypeRef::Array(items)) => array_of(&self.render_ref(plan, items)),
            (None, TypeRef::Map(values)) => format!("Record<string, {}>", self.render_ref(plan, values)),
        };

        if reference.nullable && base != "null" && base != "unknown" {
            format!("{} | null", base)
        } else {
            base
        }
    }

    fn primitive(&self, kind: PrimitiveKind, reference: &Reference) -> String {
        match kind {
            PrimitiveKind::String => reference
                .constraints
                .format
                .as_ref()
                .and_then(|format| self.options.format_mappings.get(format))
                .cloned()
                .unwrap_or_else(|| "string".to_string()),
            PrimitiveKind::Integer | PrimitiveKind::Number => "number".to_string(),
            PrimitiveKind::Boolean => "boolean".to_string(),
            PrimitiveKind::Null => "null".to_string(),
            PrimitiveKind::Unknown => "unknown".to_string(),
        }
    }

    /// `name?: T;` (or `name: T | null;` under `null_optional`)
    pub(crate) fn render_field(&self, plan: &EmissionPlan, field: &Field, null_optional: bool) -> String {
        let key = property_key(&field.name);
        let ty = self.render_ref(plan, &field.reference);

        match (field.optional, null_optional) {
            (false, _) => format!("{}: {};", key, ty),
            (true, false) => format!("{}?: {};", key, ty),
            (true, true) if field.reference.nullable || ty == "unknown" => format!("{}: {};", key, ty),
            (true, true) => format!("{}: {} | null;", key, ty),
        }
    }

    /// Interface body with documented fields
    pub(crate) fn render_fields(&self, plan: &EmissionPlan, fields: &[Field], null_optional: bool) -> String {
        let mut out = String::new();
        for field in fields {
            push_doc(&mut out, "  ", field.description.as_deref(), field.default.as_ref());
            out.push_str("  ");
            out.push_str(&self.render_field(plan, field, null_optional));
            out.push('\n');
        }
        out
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn declare(&self, plan: &EmissionPlan, region: &Region<'_>, guards: &GuardNames, uses_brand: &mut bool) -> String {
        let node = region.node;
        let name = self.type_identifier(&node.name);
        let export = self.export();

        let mut out = String::new();
        push_doc(&mut out, "", node.description.as_deref(), None);

        match &node.kind {
            TypeKind::Object(object) if object.fields.is_empty() => {
                out.push_str(&format!("{}interface {} {{}}\n", export, name));
            }
            TypeKind::Object(object) => {
                out.push_str(&format!("{}interface {} {{\n", export, name));
                out.push_str(&self.render_fields(plan, &object.fields, self.options.null_optional));
                out.push_str("}\n");
            }
            TypeKind::Enum(enumeration) => self.declare_enum(&mut out, &name, enumeration),
            TypeKind::Union(union) => self.declare_union(&mut out, plan, node.id, &name, union, guards),
            TypeKind::Array(array) => {
                out.push_str(&format!("{}type {} = {};\n", export, name, array_of(&self.render_ref(plan, &array.items))));
            }
            TypeKind::Map(map) => {
                out.push_str(&format!(
                    "{}type {} = Record<string, {}>;\n",
                    export,
                    name,
                    self.render_ref(plan, &map.values)
                ));
            }
            TypeKind::Alias(alias) => {
                let branded = self.options.branded_primitives
                    && alias.brand.is_some()
                    && alias.target.literal.is_none()
                    && matches!(alias.target.target, TypeRef::Primitive(_));

                if let (true, Some(brand)) = (branded, &alias.brand) {
                    *uses_brand = true;
                    out.push_str(&format!(
                        "{}type {} = Branded<{}, {}>;\n",
                        export,
                        name,
                        self.render_ref(plan, &alias.target),
                        serde_json::Value::String(brand.clone())
                    ));
                } else {
                    out.push_str(&format!("{}type {} = {};\n", export, name, self.render_ref(plan, &alias.target)));
                }
            }
            TypeKind::Primitive(kind) => {
                let ty = match kind {
                    PrimitiveKind::Null => "null",
                    PrimitiveKind::String => "string",
                    PrimitiveKind::Integer | PrimitiveKind::Number => "number",
                    PrimitiveKind::Boolean => "boolean",
                    PrimitiveKind::Unknown => "unknown",
                };
                out.push_str(&format!("{}type {} = {};\n", export, name, ty));
            }
        }

        out
    }

    fn declare_enum(&self, out: &mut String, name: &str, enumeration: &EnumType) {
        let export = self.export();
        let literals: Vec<String> = enumeration.variants.iter().map(|v| v.value.to_json().to_string()).collect();

        match enumeration.shape.unwrap_or(ShapeTag::PlainStringEnum) {
            ShapeTag::UntitledMultiSelect | ShapeTag::TitledMultiSelect => {
                for variant in &enumeration.variants {
                    if let Some(title) = &variant.title {
                        out.push_str(&format!("// {}: {}\n", variant.value.to_json(), title));
                    }
                }
                let mut items = literals;
                if enumeration.nullable {
                    items.push("null".to_string());
                }
                out.push_str(&format!("{}type {} = ({})[];\n", export, name, items.join(" | ")));
            }
            ShapeTag::PlainIntegerUnion => {
                out.push_str(&format!("{}enum {} {{\n", export, name));
                for variant in &enumeration.variants {
                    push_doc(out, "  ", variant.description.as_deref(), None);
                    if let EnumValue::Integer(value) = variant.value {
                        out.push_str(&format!("  {} = {},\n", integer_member_key(value), value));
                    }
                }
                out.push_str("}\n");
            }
            ShapeTag::TitledSingleSelect | ShapeTag::LegacyTitledEnum => {
                out.push_str(&format!("{}enum {} {{\n", export, name));
                let mut used = BTreeSet::new();
                for variant in &enumeration.variants {
                    push_doc(out, "  ", variant.description.as_deref(), None);
                    let base = match (&variant.title, &variant.value) {
                        (Some(title), _) => enum_member_key(title),
                        (None, EnumValue::Integer(value)) => integer_member_key(*value),
                        (None, EnumValue::String(value)) => enum_member_key(value),
                    };
                    let key = unique_key(&mut used, base);
                    out.push_str(&format!("  {} = {},\n", key, variant.value.to_json()));
                }
                out.push_str("}\n");
            }
            _ => {
                out.push_str(&format!("{}type {} =\n", export, name));
                let mut members = literals;
                if enumeration.nullable {
                    members.push("null".to_string());
                }
                let last = members.len().saturating_sub(1);
                for (i, member) in members.iter().enumerate() {
                    let end = if i == last { ";" } else { "" };
                    out.push_str(&format!("  | {}{}\n", member, end));
                }
            }
        }
    }

    fn declare_union(
        &self,
        out: &mut String,
        plan: &EmissionPlan,
        id: TypeId,
        name: &str,
        union: &UnionType,
        guards: &GuardNames,
    ) {
        let export = self.export();
        let members: Vec<String> = union.members.iter().map(|m| self.render_ref(plan, &m.reference)).collect();

        out.push_str(&format!("{}type {} =\n", export, name));
        let last = members.len().saturating_sub(1);
        for (i, member) in members.iter().enumerate() {
            let end = if i == last { ";" } else { "" };
            out.push_str(&format!("  | {}{}\n", member, end));
        }

        let Some(discriminant) = &union.discriminant else {
            return;
        };

        for (i, (member, ty)) in union.members.iter().zip(&members).enumerate() {
            let (Some(literal), Some(guard)) = (&member.literal, guards.get(&(id, i))) else {
                continue;
            };
            out.push_str(&format!(
                "\n{}function {}(value: {}): value is {} {{\n  return {} === {};\n}}\n",
                export,
                guard,
                name,
                ty,
                member_access("value", discriminant),
                literal
            ));
        }
    }

    /// Guard names for every discriminated member. A member named type
    /// gets `is{Member}` unless several discriminated unions list it, in
    /// which case each guard is scoped as `is{Union}{Member}`.
    fn guard_names(&self, plan: &EmissionPlan) -> GuardNames {
        let discriminated: Vec<(TypeId, &UnionType)> = plan
            .graph()
            .nodes()
            .iter()
            .filter_map(|node| match &node.kind {
                TypeKind::Union(union) if union.discriminant.is_some() => Some((node.id, union)),
                _ => None,
            })
            .collect();

        let mut owners: BTreeMap<TypeId, usize> = BTreeMap::new();
        for (_, union) in &discriminated {
            let members: BTreeSet<TypeId> = union.members.iter().filter_map(|m| m.reference.as_named()).collect();
            for member in members {
                *owners.entry(member).or_default() += 1;
            }
        }

        let mut guards = GuardNames::new();
        for (id, union) in discriminated {
            let union_name = self.type_identifier(&plan.node(id).name);
            for (i, member) in union.members.iter().enumerate() {
                let Some(literal) = &member.literal else { continue };
                let guard = match member.reference.as_named() {
                    Some(target) if owners.get(&target).copied().unwrap_or(0) > 1 => {
                        format!("is{}{}", union_name, self.type_identifier(&plan.node(target).name))
                    }
                    Some(target) => format!("is{}", self.type_identifier(&plan.node(target).name)),
                    None => match symbol_name(&literal_text(literal)) {
                        suffix if suffix.is_empty() => format!("is{}Variant{}", union_name, i + 1),
                        suffix => format!("is{}{}", union_name, suffix),
                    },
                };
                guards.insert((id, i), guard);
            }
        }
        guards
    }
}

impl Emitter for TypeScriptEmitter {
    fn name(&self) -> &str {
        "typescript"
    }

    fn language(&self) -> &str {
        "typescript"
    }

    fn style(&self) -> EmitStyle {
        EmitStyle::Structural
    }

    fn filename(&self) -> &str {
        &self.options.filename
    }

    fn type_identifier(&self, canonical: &str) -> String {
        avoid_global(canonical)
    }

    fn companion_identifiers(&self, plan: &EmissionPlan) -> Vec<(String, TypeId)> {
        self.guard_names(plan).into_iter().map(|((id, _), guard)| (guard, id)).collect()
    }

    fn emit(&self, plan: &EmissionPlan, _constraints: &ConstraintTable) -> String {
        let guards = self.guard_names(plan);
        let mut uses_brand = false;
        let blocks: Vec<String> = plan
            .regions()
            .map(|r| self.declare(plan, &r, &guards, &mut uses_brand))
            .collect();

        let mut out = String::new();
        out.push_str(BANNER);
        out.push('\n');

        if uses_brand {
            out.push('\n');
            out.push_str(BRAND_PREAMBLE);
            out.push_str(&format!("{}type Branded<T, B> = T & Brand<B>;\n", self.export()));
        }

        for block in blocks {
            out.push('\n');
            out.push_str(&block);
        }

        out
    }
}

/// `T[]`, parenthesized when `T` is a union
fn array_of(items: &str) -> String {
    if items.contains(" | ") {
        format!("({})[]", items)
    } else {
        format!("{}[]", items)
    }
}

fn literal_text(literal: &serde_json::Value) -> String {
    match literal {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Suffix repeated enum keys with their position
fn unique_key(used: &mut BTreeSet<String>, base: String) -> String {
    let mut key = base.clone();
    let mut n = 2;
    while !used.insert(key.clone()) {
        key = format!("{}_{}", base, n);
        n += 1;
    }
    key
}
