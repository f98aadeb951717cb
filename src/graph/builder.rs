//! Type Graph Builder
//!
//! Lowers a JSON Schema document into a [`TypeGraph`]. Every definition is
//! reserved by name before any of them is built, so forward, self and mutual
//! references resolve without a second pass. Anonymous enums, unions and
//! objects are always hoisted into named nodes derived from their position.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use super::constraints::{unknown_keywords, ConstraintSet};
use super::diagnostics::{DiagnosticCode, Diagnostics};
use super::names::symbol_name;
use super::path::SchemaPath;
use super::{
    AliasType, ArrayType, EnumCardinality, EnumOrigin, EnumType, EnumValue, EnumValueKind,
    EnumVariant, Field, MapType, ObjectType, PrimitiveKind, Reference, TypeGraph, TypeId, TypeKind,
    TypeRef, UnionMember, UnionType,
};
use crate::error::{CompileError, Result};

/// Definition containers, in the order they are reserved
const DEFINITION_KEYS: [&str; 2] = ["$defs", "definitions"];

/// Build the canonical IR for one schema document
pub fn build_graph(document: &Value) -> Result<(TypeGraph, Diagnostics)> {
    let mut builder = Builder::new(document);
    builder.build()?;

    tracing::debug!(
        types = builder.graph.len(),
        diagnostics = builder.diagnostics.len(),
        "built type graph"
    );

    Ok((builder.graph, builder.diagnostics))
}

// =============================================================================
// Schema Shapes
// =============================================================================

/// What a schema node denotes, before any naming decisions
enum Shape<'s> {
    Unknown,
    Ref(&'s str),
    Const(&'s Value),
    /// Exactly one non-null alternative; `path` locates that alternative
    Nullable { inner: Value, path: SchemaPath },
    Enum(&'s [Value]),
    Choice { keyword: &'static str, branches: &'s [Value] },
    AllOf,
    Array,
    Object,
    Primitive(PrimitiveKind),
}

fn shape_of<'s>(schema: &'s Value, path: &SchemaPath) -> Result<Shape<'s>> {
    let obj = match schema {
        Value::Bool(true) => return Ok(Shape::Unknown),
        Value::Bool(false) => return Err(CompileError::invalid(path, "schema 'false' admits no value")),
        Value::Object(obj) => obj,
        _ => return Err(CompileError::invalid(path, "schema must be an object or a boolean")),
    };

    if let Some(reference) = obj.get("$ref") {
        let reference = reference
            .as_str()
            .ok_or_else(|| CompileError::invalid(&path.key("$ref"), "'$ref' must be a string"))?;
        return Ok(Shape::Ref(reference));
    }

    if let Some(value) = obj.get("const") {
        return Ok(Shape::Const(value));
    }

    // `type: [T, "null"]`
    if let Some(Value::Array(types)) = obj.get("type") {
        let mut names = Vec::new();
        for t in types {
            names.push(
                t.as_str()
                    .ok_or_else(|| CompileError::invalid(&path.key("type"), "'type' entries must be strings"))?,
            );
        }
        let has_null = names.contains(&"null");
        let rest: Vec<&str> = names.into_iter().filter(|t| *t != "null").collect();

        return Ok(match (rest.as_slice(), has_null) {
            ([], _) => Shape::Primitive(PrimitiveKind::Null),
            ([single], nullable) => {
                let mut inner = schema.clone();
                inner["type"] = Value::String((*single).to_string());
                if nullable {
                    Shape::Nullable { inner, path: path.clone() }
                } else {
                    return shape_of_owned(inner, path);
                }
            }
            _ => Shape::Unknown,
        });
    }

    if let Some(values) = obj.get("enum") {
        let values = values
            .as_array()
            .ok_or_else(|| CompileError::invalid(&path.key("enum"), "'enum' must be an array"))?;
        return Ok(Shape::Enum(values));
    }

    for keyword in ["oneOf", "anyOf"] {
        let Some(branches) = obj.get(keyword) else {
            continue;
        };
        let branches = branches
            .as_array()
            .ok_or_else(|| CompileError::invalid(&path.key(keyword), format!("'{}' must be an array", keyword)))?;

        if branches.len() == 2 {
            let nulls: Vec<bool> = branches.iter().map(is_null_schema).collect();
            if let Some(i) = nulls.iter().position(|n| !n) {
                if nulls.iter().filter(|n| **n).count() == 1 {
                    return Ok(Shape::Nullable {
                        inner: branches[i].clone(),
                        path: path.key(keyword).index(i),
                    });
                }
            }
        }

        return Ok(Shape::Choice { keyword, branches });
    }

    if let Some(members) = obj.get("allOf") {
        let members = members
            .as_array()
            .ok_or_else(|| CompileError::invalid(&path.key("allOf"), "'allOf' must be an array"))?;

        // allOf of a single $ref with nothing else to merge is just the $ref
        if let [only] = members.as_slice() {
            if let Some(Value::String(reference)) = only.get("$ref") {
                if !obj.contains_key("properties") {
                    return Ok(Shape::Ref(reference.as_str()));
                }
            }
        }
        return Ok(Shape::AllOf);
    }

    match obj.get("type").map(|t| t.as_str()) {
        Some(Some("array")) => Ok(Shape::Array),
        Some(Some("object")) => Ok(Shape::Object),
        Some(Some(name)) => PrimitiveKind::from_json_type(name)
            .map(Shape::Primitive)
            .ok_or_else(|| CompileError::invalid(&path.key("type"), format!("unknown type '{}'", name))),
        Some(None) => Err(CompileError::invalid(&path.key("type"), "'type' must be a string or an array")),
        None if obj.contains_key("properties") || obj.contains_key("additionalProperties") => Ok(Shape::Object),
        None if obj.contains_key("items") => Ok(Shape::Array),
        None => Ok(Shape::Unknown),
    }
}

/// Shape of a single-type rewrite of a `type` list. Only scalar and
/// structural types can come out of it, none of which borrow the input.
fn shape_of_owned(inner: Value, path: &SchemaPath) -> Result<Shape<'static>> {
    match inner.get("type").and_then(|t| t.as_str()) {
        Some("array") => Ok(Shape::Array),
        Some("object") => Ok(Shape::Object),
        Some(name) => PrimitiveKind::from_json_type(name)
            .map(Shape::Primitive)
            .ok_or_else(|| CompileError::invalid(&path.key("type"), format!("unknown type '{}'", name))),
        None => Ok(Shape::Unknown),
    }
}

fn is_null_schema(schema: &Value) -> bool {
    schema.get("type").and_then(|t| t.as_str()) == Some("null")
        || schema.get("const").is_some_and(Value::is_null)
}

fn has_properties(schema: &Value) -> bool {
    schema
        .get("properties")
        .and_then(|p| p.as_object())
        .is_some_and(|p| !p.is_empty())
}

fn is_object_schema(schema: &Value) -> bool {
    schema.get("type").and_then(|t| t.as_str()) == Some("object") || schema.get("properties").is_some()
}

/// Every branch is a `{const, title}` pair
fn is_titled_const_set(branches: &[Value]) -> bool {
    !branches.is_empty()
        && branches.iter().all(|b| {
            b.get("const").is_some() && b.get("title").and_then(|t| t.as_str()).is_some()
        })
}

fn string_field(schema: &Value, key: &str) -> Option<String> {
    schema.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

/// Literal reference for `const`. Only scalars can be literals.
fn literal_reference(value: &Value, path: &SchemaPath) -> Reference {
    let kind = match value {
        Value::String(_) => PrimitiveKind::String,
        Value::Number(n) if n.is_i64() || n.is_u64() => PrimitiveKind::Integer,
        Value::Number(_) => PrimitiveKind::Number,
        Value::Bool(_) => PrimitiveKind::Boolean,
        Value::Null => PrimitiveKind::Null,
        Value::Array(_) | Value::Object(_) => return Reference::primitive(PrimitiveKind::Unknown, path.clone()),
    };
    let mut reference = Reference::primitive(kind, path.clone());
    reference.literal = Some(value.clone());
    reference
}

/// Hoisting hint unique among its siblings. Empty hints take the fallback
/// and repeats get a numeric suffix (`AB`, `AB2`).
fn distinct_hint(taken: &mut BTreeSet<String>, hint: String, fallback: impl FnOnce() -> String) -> String {
    let base = if hint.is_empty() { fallback() } else { hint };
    let mut candidate = base.clone();
    let mut n = 2;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{}{}", base, n);
        n += 1;
    }
    candidate
}

/// Decode one JSON pointer token
fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

// =============================================================================
// Builder
// =============================================================================

/// A variant candidate before deduplication
struct RawVariant<'v> {
    value: &'v Value,
    title: Option<String>,
    description: Option<String>,
}

/// What discriminant detection learned about one branch
struct BranchInfo {
    literals: BTreeMap<String, Value>,
    required: BTreeSet<String>,
}

struct Builder<'a> {
    document: &'a Value,
    graph: TypeGraph,
    diagnostics: Diagnostics,
    /// (container, raw key) -> reserved node
    defs: BTreeMap<(&'static str, String), TypeId>,
    root: Option<TypeId>,
}

impl<'a> Builder<'a> {
    fn new(document: &'a Value) -> Self {
        Self {
            document,
            graph: TypeGraph::new(),
            diagnostics: Diagnostics::new(),
            defs: BTreeMap::new(),
            root: None,
        }
    }

    fn build(&mut self) -> Result<()> {
        let document = self.document;
        let root_path = SchemaPath::root();
        let mut pending: Vec<(TypeId, &'a Value, SchemaPath)> = Vec::new();

        // Reserve every definition first
        for container in DEFINITION_KEYS {
            let Some(defs) = document.get(container) else {
                continue;
            };
            let defs = defs
                .as_object()
                .ok_or_else(|| CompileError::invalid(&root_path.key(container), "definitions must be an object"))?;

            let mut keys: Vec<&String> = defs.keys().collect();
            keys.sort();

            for key in keys {
                let path = root_path.keys([container, key.as_str()]);
                let name = symbol_name(key);
                if name.is_empty() {
                    return Err(CompileError::invalid(
                        &path,
                        format!("definition key '{}' has no ASCII letters or digits to name a type", key),
                    ));
                }
                let id = self.graph.reserve(&name, &path)?;
                self.defs.insert((container, key.clone()), id);
                pending.push((id, &defs[key.as_str()], path));
            }
        }

        // Then the root, if it denotes a type of its own
        if let Some(Value::String(reference)) = document.get("$ref") {
            let id = self.resolve(reference, &root_path.key("$ref"))?;
            self.root = Some(id);
        } else if let Some(name) = self.root_name() {
            let id = self.graph.reserve(&name, &root_path)?;
            self.root = Some(id);
            pending.push((id, document, root_path.clone()));
        }

        tracing::debug!(reserved = pending.len(), "reserved named types");

        for (id, schema, path) in pending {
            self.define_named(id, schema, &path)?;
        }

        if let Some(root) = self.root {
            self.graph.set_root(root);
        }
        self.graph.rebuild_dependencies();
        Ok(())
    }

    /// Name of the root type, or None when the root is only a container
    fn root_name(&self) -> Option<String> {
        const TYPED_KEYS: [&str; 7] = ["properties", "oneOf", "anyOf", "allOf", "enum", "const", "items"];

        let doc = self.document;
        let typed = TYPED_KEYS.iter().any(|k| doc.get(k).is_some())
            || doc.get("type").is_some_and(|t| t.as_str() != Some("object"));
        if !typed {
            return None;
        }

        let name = doc
            .get("title")
            .and_then(|t| t.as_str())
            .map(symbol_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Root".to_string());
        Some(name)
    }

    // ========== Reference Resolution ==========

    fn split_pointer(reference: &str) -> Option<(&'static str, String)> {
        DEFINITION_KEYS.iter().find_map(|container| {
            let key = reference.strip_prefix("#/")?.strip_prefix(container)?.strip_prefix('/')?;
            (!key.contains('/')).then(|| (*container, unescape_token(key)))
        })
    }

    /// Resolve a `$ref` to a reserved node
    fn resolve(&self, reference: &str, path: &SchemaPath) -> Result<TypeId> {
        let unresolved = || CompileError::UnresolvedReference {
            path: path.clone(),
            reference: reference.to_string(),
        };

        if reference == "#" {
            return self.root.ok_or_else(unresolved);
        }

        let (container, key) = Self::split_pointer(reference).ok_or_else(unresolved)?;
        self.defs.get(&(container, key)).copied().ok_or_else(unresolved)
    }

    /// Resolve a `$ref` to its raw schema
    fn lookup(&self, reference: &str, path: &SchemaPath) -> Result<&'a Value> {
        let unresolved = || CompileError::UnresolvedReference {
            path: path.clone(),
            reference: reference.to_string(),
        };

        let document = self.document;
        if reference == "#" {
            return Ok(document);
        }

        let (container, key) = Self::split_pointer(reference).ok_or_else(unresolved)?;
        document
            .get(container)
            .and_then(|defs| defs.get(&key))
            .ok_or_else(unresolved)
    }

    /// Follow `$ref` chains and flatten `allOf`, yielding a plain schema
    fn resolve_raw(&self, schema: &Value, path: &SchemaPath) -> Result<Value> {
        self.resolve_raw_inner(schema, path, &mut Vec::new())
    }

    fn resolve_raw_inner(&self, schema: &Value, path: &SchemaPath, seen: &mut Vec<String>) -> Result<Value> {
        if let Some(reference) = schema.get("$ref") {
            let reference = reference
                .as_str()
                .ok_or_else(|| CompileError::invalid(&path.key("$ref"), "'$ref' must be a string"))?;
            if seen.iter().any(|s| s == reference) {
                return Err(CompileError::invalid(
                    path,
                    format!("'{}' refers back to itself without any structure in between", reference),
                ));
            }
            seen.push(reference.to_string());
            let target = self.lookup(reference, path)?;
            return self.resolve_raw_inner(target, path, seen);
        }

        match schema.get("allOf") {
            Some(Value::Array(members)) => self.merge_all_of(schema, members, path, seen),
            _ => Ok(schema.clone()),
        }
    }

    /// Shallow-merge allOf members: properties and required lists are
    /// unioned, later members override earlier ones, the owner comes last.
    fn merge_all_of(&self, owner: &Value, members: &[Value], path: &SchemaPath, seen: &[String]) -> Result<Value> {
        let mut merged = Map::new();
        let mut properties = Map::new();
        let mut required: Vec<Value> = Vec::new();

        let mut absorb = |schema: &Value, own: bool| {
            let Some(obj) = schema.as_object() else {
                return;
            };
            for (key, value) in obj {
                match key.as_str() {
                    "allOf" => {}
                    "title" | "description" if !own => {}
                    "properties" => {
                        if let Some(props) = value.as_object() {
                            for (name, prop) in props {
                                properties.insert(name.clone(), prop.clone());
                            }
                        }
                    }
                    "required" => {
                        for name in value.as_array().into_iter().flatten() {
                            if !required.contains(name) {
                                required.push(name.clone());
                            }
                        }
                    }
                    _ => {
                        merged.insert(key.clone(), value.clone());
                    }
                }
            }
        };

        for (i, member) in members.iter().enumerate() {
            let resolved = self.resolve_raw_inner(member, &path.key("allOf").index(i), &mut seen.to_vec())?;
            absorb(&resolved, false);
        }
        absorb(owner, true);

        if !properties.is_empty() {
            merged.insert("properties".to_string(), Value::Object(properties));
            merged.entry("type").or_insert_with(|| Value::String("object".to_string()));
        }
        if !required.is_empty() {
            merged.insert("required".to_string(), Value::Array(required));
        }

        Ok(Value::Object(merged))
    }

    // ========== Named Types ==========

    fn define_named(&mut self, id: TypeId, schema: &Value, path: &SchemaPath) -> Result<()> {
        let name = self.graph.node(id).name.clone();
        let kind = self.lower_named(&name, schema, path)?;

        tracing::trace!(name = %name, kind = kind.label(), path = %path, "defined type");

        self.graph.define(
            id,
            kind,
            string_field(schema, "title"),
            string_field(schema, "description"),
        );
        Ok(())
    }

    fn hoist(&mut self, name: String, schema: &Value, path: &SchemaPath) -> Result<TypeId> {
        let id = self.graph.reserve(&name, path)?;
        self.define_named(id, schema, path)?;
        Ok(id)
    }

    fn lower_named(&mut self, name: &str, schema: &Value, path: &SchemaPath) -> Result<TypeKind> {
        let shape = shape_of(schema, path)?;
        if !matches!(shape, Shape::Nullable { .. } | Shape::AllOf) {
            self.check_keywords(schema, path);
        }

        let kind = match shape {
            Shape::Unknown => TypeKind::Primitive(PrimitiveKind::Unknown),

            Shape::Ref(reference) => TypeKind::Alias(AliasType {
                target: Reference::named(self.resolve(reference, path)?, path.clone()),
                brand: None,
            }),

            Shape::Const(value) => TypeKind::Alias(AliasType {
                target: literal_reference(value, path),
                brand: None,
            }),

            Shape::Nullable { inner, path: inner_path } => {
                let mut target = self.reference(name, "Inner", &inner, &inner_path)?;
                target.nullable = true;
                TypeKind::Alias(AliasType { target, brand: None })
            }

            Shape::Enum(values) => {
                let variants = values
                    .iter()
                    .map(|value| RawVariant { value, title: None, description: None })
                    .collect();
                self.lower_flat_enum(variants, schema, path, EnumCardinality::Single, ConstraintSet::default())?
            }

            Shape::Choice { keyword, branches } => {
                if is_titled_const_set(branches) {
                    self.lower_const_branches(branches, schema, path, EnumCardinality::Single, ConstraintSet::default())
                } else {
                    TypeKind::Union(self.lower_union(name, keyword, branches, path)?)
                }
            }

            Shape::AllOf => {
                let merged = self.resolve_raw(schema, path)?;
                return self.lower_named(name, &merged, path);
            }

            Shape::Array => self.lower_array(name, schema, path)?,

            Shape::Object => self.lower_object(name, schema, path, true)?,

            Shape::Primitive(PrimitiveKind::Null) => TypeKind::Primitive(PrimitiveKind::Null),

            Shape::Primitive(kind) => {
                let mut target = Reference::primitive(kind, path.clone());
                target.constraints = ConstraintSet::from_schema(schema);
                TypeKind::Alias(AliasType {
                    target,
                    brand: Some(name.to_string()),
                })
            }
        };

        Ok(kind)
    }

    fn lower_object(&mut self, name: &str, schema: &Value, path: &SchemaPath, named: bool) -> Result<TypeKind> {
        let empty = Map::new();
        let properties = match schema.get("properties") {
            None => &empty,
            Some(Value::Object(props)) => props,
            Some(_) => return Err(CompileError::invalid(&path.key("properties"), "'properties' must be an object")),
        };

        let required: BTreeSet<&str> = match schema.get("required") {
            None => BTreeSet::new(),
            Some(Value::Array(names)) => names.iter().filter_map(|n| n.as_str()).collect(),
            Some(_) => return Err(CompileError::invalid(&path.key("required"), "'required' must be an array")),
        };

        let additional = schema.get("additionalProperties");
        let additional_path = path.key("additionalProperties");

        if properties.is_empty() {
            // Open maps stay distinct from the empty marker object
            let values = match additional {
                Some(value_schema @ Value::Object(values)) if !values.is_empty() => {
                    Some(self.reference(name, "Value", value_schema, &additional_path)?)
                }
                Some(Value::Bool(true)) | Some(Value::Object(_)) => {
                    Some(Reference::primitive(PrimitiveKind::Unknown, additional_path))
                }
                None if !named => Some(Reference::primitive(PrimitiveKind::Unknown, additional_path)),
                _ => None,
            };

            return Ok(match values {
                Some(values) => TypeKind::Map(MapType { values }),
                None => TypeKind::Object(ObjectType::default()),
            });
        }

        if additional.is_some_and(|a| a.as_object().is_some_and(|o| !o.is_empty())) {
            self.diagnostics.warning(
                additional_path,
                DiagnosticCode::UnknownKeyword,
                format!("Typed additionalProperties alongside properties in '{}' is not supported and was ignored", name),
            );
        }

        let mut keys: Vec<&String> = properties.keys().collect();
        keys.sort();

        let mut fields = Vec::with_capacity(keys.len());
        let mut hints = BTreeSet::new();
        for (i, key) in keys.into_iter().enumerate() {
            let prop = &properties[key.as_str()];
            let field_path = path.keys(["properties", key.as_str()]);
            let hint = distinct_hint(&mut hints, symbol_name(key), || format!("Property{}", i + 1));
            let reference = self.reference(name, &hint, prop, &field_path)?;

            fields.push(Field {
                name: key.clone(),
                reference,
                optional: !required.contains(key.as_str()),
                description: string_field(prop, "description"),
                default: prop.get("default").cloned(),
                path: field_path,
            });
        }

        Ok(TypeKind::Object(ObjectType { fields }))
    }

    fn lower_array(&mut self, name: &str, schema: &Value, path: &SchemaPath) -> Result<TypeKind> {
        let constraints = ConstraintSet::from_schema(schema);
        let items_path = path.key("items");

        let Some(items) = schema.get("items") else {
            return Ok(TypeKind::Array(ArrayType {
                items: Reference::primitive(PrimitiveKind::Unknown, items_path),
                constraints,
            }));
        };

        // Arrays of enum values are multi-select enums
        if let Some(Value::Array(values)) = items.get("enum") {
            let variants = values
                .iter()
                .map(|value| RawVariant { value, title: None, description: None })
                .collect();
            return self.lower_flat_enum(variants, items, &items_path, EnumCardinality::Multi, constraints.item_counts());
        }
        for keyword in ["anyOf", "oneOf"] {
            if let Some(Value::Array(branches)) = items.get(keyword) {
                if is_titled_const_set(branches) {
                    return Ok(self.lower_const_branches(
                        branches,
                        schema,
                        &items_path,
                        EnumCardinality::Multi,
                        constraints.item_counts(),
                    ));
                }
            }
        }

        Ok(TypeKind::Array(ArrayType {
            items: self.reference(name, "Item", items, &items_path)?,
            constraints,
        }))
    }

    // ========== Enums ==========

    fn lower_flat_enum(
        &mut self,
        mut variants: Vec<RawVariant<'_>>,
        schema: &Value,
        path: &SchemaPath,
        cardinality: EnumCardinality,
        constraints: ConstraintSet,
    ) -> Result<TypeKind> {
        if variants.is_empty() {
            return Err(CompileError::invalid(&path.key("enum"), "'enum' must list at least one value"));
        }

        let mut origin = EnumOrigin::Flat;
        if let Some(Value::Array(names)) = schema.get("enumNames") {
            if names.len() == variants.len() {
                origin = EnumOrigin::EnumNames;
                for (variant, title) in variants.iter_mut().zip(names) {
                    variant.title = title.as_str().map(str::to_string);
                }
            }
        }

        Ok(self.finish_enum(variants, schema, path, origin, cardinality, constraints))
    }

    fn lower_const_branches(
        &mut self,
        branches: &[Value],
        schema: &Value,
        path: &SchemaPath,
        cardinality: EnumCardinality,
        constraints: ConstraintSet,
    ) -> TypeKind {
        let variants = branches
            .iter()
            .filter_map(|b| {
                Some(RawVariant {
                    value: b.get("const")?,
                    title: string_field(b, "title"),
                    description: string_field(b, "description"),
                })
            })
            .collect();
        self.finish_enum(variants, schema, path, EnumOrigin::ConstBranches, cardinality, constraints)
    }

    /// Check value kinds, drop duplicates and assemble the enum.
    /// Mixed or non-scalar value lists degrade to `unknown`.
    fn finish_enum(
        &mut self,
        variants: Vec<RawVariant<'_>>,
        schema: &Value,
        path: &SchemaPath,
        origin: EnumOrigin,
        cardinality: EnumCardinality,
        constraints: ConstraintSet,
    ) -> TypeKind {
        let mut nullable = false;
        let mut value_kind: Option<EnumValueKind> = None;
        let mut seen: BTreeSet<EnumValue> = BTreeSet::new();
        let mut out = Vec::new();

        for raw in variants {
            let (value, kind) = match raw.value {
                Value::Null => {
                    nullable = true;
                    continue;
                }
                Value::String(s) => (EnumValue::String(s.clone()), EnumValueKind::String),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => (EnumValue::Integer(i), EnumValueKind::Integer),
                    None => return self.degrade_enum(path, "holds a non-integer number"),
                },
                other => {
                    let what = if other.is_boolean() { "a boolean" } else { "a structured value" };
                    return self.degrade_enum(path, &format!("holds {}", what));
                }
            };

            match value_kind {
                Some(existing) if existing != kind => {
                    return self.degrade_enum(path, "mixes strings and numbers");
                }
                _ => value_kind = Some(kind),
            }

            if !seen.insert(value.clone()) {
                self.diagnostics.warning(
                    path.clone(),
                    DiagnosticCode::DuplicateEnumValue,
                    format!("Duplicate enum value {} was dropped", value.to_json()),
                );
                continue;
            }

            out.push(EnumVariant {
                value,
                title: raw.title,
                description: raw.description,
            });
        }

        let Some(value_kind) = value_kind else {
            return TypeKind::Primitive(PrimitiveKind::Null);
        };

        TypeKind::Enum(EnumType {
            variants: out,
            value_kind,
            nullable,
            cardinality,
            origin,
            titled_schema: schema.get("title").is_some(),
            constraints,
            shape: None,
        })
    }

    fn degrade_enum(&mut self, path: &SchemaPath, reason: &str) -> TypeKind {
        self.diagnostics.warning(
            path.clone(),
            DiagnosticCode::MixedEnum,
            format!("Enum {}; emitting it as unknown", reason),
        );
        TypeKind::Primitive(PrimitiveKind::Unknown)
    }

    // ========== Unions ==========

    fn lower_union(&mut self, name: &str, keyword: &str, branches: &[Value], path: &SchemaPath) -> Result<UnionType> {
        if branches.is_empty() {
            return Err(CompileError::invalid(&path.key(keyword), format!("'{}' must list at least one schema", keyword)));
        }

        let discriminant = self.detect_discriminant(name, keyword, branches, path)?;

        let mut members = Vec::with_capacity(branches.len());
        let mut hints = BTreeSet::new();
        for (i, branch) in branches.iter().enumerate() {
            let branch_path = path.key(keyword).index(i);
            let literal = discriminant.as_ref().map(|(_, values)| values[i].clone());

            let hint = match &literal {
                Some(Value::String(s)) => symbol_name(s),
                Some(other) => symbol_name(&other.to_string()),
                None => format!("Variant{}", i + 1),
            };
            let hint = distinct_hint(&mut hints, hint, || format!("Variant{}", i + 1));

            members.push(UnionMember {
                reference: self.reference(name, &hint, branch, &branch_path)?,
                literal,
            });
        }

        Ok(UnionType {
            members,
            discriminant: discriminant.map(|(field, _)| field),
            shape: None,
        })
    }

    /// Find a field that is required in every branch and pinned to a
    /// distinct literal in each. Candidates are tried in name order.
    fn detect_discriminant(
        &mut self,
        name: &str,
        keyword: &str,
        branches: &[Value],
        path: &SchemaPath,
    ) -> Result<Option<(String, Vec<Value>)>> {
        if branches.len() < 2 {
            return Ok(None);
        }

        let mut infos = Vec::with_capacity(branches.len());
        for (i, branch) in branches.iter().enumerate() {
            let resolved = self.resolve_raw(branch, &path.key(keyword).index(i))?;
            if !is_object_schema(&resolved) {
                // Not a union of objects: plain union, nothing ambiguous about it
                return Ok(None);
            }
            infos.push(Self::branch_info(&resolved));
        }

        let candidates: Vec<&String> = infos[0].literals.keys().collect();
        for field in &candidates {
            let values: Option<Vec<Value>> = infos
                .iter()
                .map(|info| {
                    info.required
                        .contains(field.as_str())
                        .then(|| info.literals.get(field.as_str()).cloned())
                        .flatten()
                })
                .collect();

            let Some(values) = values else {
                continue;
            };

            let distinct: BTreeSet<String> = values.iter().map(Value::to_string).collect();
            if distinct.len() == values.len() {
                return Ok(Some(((*field).clone(), values)));
            }
        }

        let reason = if candidates.is_empty() {
            "no field is pinned to a literal value in the first branch".to_string()
        } else {
            format!(
                "candidate fields [{}] are missing, optional or repeated in some branch",
                candidates.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ")
            )
        };
        self.diagnostics.ambiguous_discriminant(path.clone(), name, &reason);
        Ok(None)
    }

    fn branch_info(schema: &Value) -> BranchInfo {
        let mut literals = BTreeMap::new();
        if let Some(props) = schema.get("properties").and_then(|p| p.as_object()) {
            for (key, prop) in props {
                let literal = match (prop.get("const"), prop.get("enum")) {
                    (Some(value), _) => Some(value.clone()),
                    (None, Some(Value::Array(values))) if values.len() == 1 => Some(values[0].clone()),
                    _ => None,
                };
                if let Some(literal) = literal.filter(|v| v.is_string() || v.is_number()) {
                    literals.insert(key.clone(), literal);
                }
            }
        }

        let required = schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|names| names.iter().filter_map(|n| n.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        BranchInfo { literals, required }
    }

    // ========== Inline References ==========

    /// Lower a schema used in place (property, item, branch). Anything
    /// that needs a declaration of its own is hoisted as `parent + hint`.
    fn reference(&mut self, parent: &str, hint: &str, schema: &Value, path: &SchemaPath) -> Result<Reference> {
        let hoisted = || format!("{}{}", parent, hint);

        let reference = match shape_of(schema, path)? {
            Shape::Nullable { inner, path: inner_path } => {
                let mut reference = self.reference(parent, hint, &inner, &inner_path)?;
                reference.nullable = true;
                reference
            }

            Shape::Enum(_) | Shape::Choice { .. } | Shape::AllOf => {
                Reference::named(self.hoist(hoisted(), schema, path)?, path.clone())
            }

            Shape::Object if has_properties(schema) => {
                Reference::named(self.hoist(hoisted(), schema, path)?, path.clone())
            }

            Shape::Array if Self::is_multi_select(schema) => {
                Reference::named(self.hoist(hoisted(), schema, path)?, path.clone())
            }

            Shape::Unknown => {
                self.check_keywords(schema, path);
                Reference::primitive(PrimitiveKind::Unknown, path.clone())
            }

            Shape::Ref(reference) => {
                self.check_keywords(schema, path);
                let mut named = Reference::named(self.resolve(reference, path)?, path.clone());
                named.constraints = ConstraintSet::from_schema(schema);
                named
            }

            Shape::Const(value) => {
                self.check_keywords(schema, path);
                literal_reference(value, path)
            }

            Shape::Object => {
                self.check_keywords(schema, path);
                match self.lower_object(&hoisted(), schema, path, false)? {
                    TypeKind::Map(map) => Reference::new(TypeRef::Map(Box::new(map.values)), path.clone()),
                    _ => Reference::new(
                        TypeRef::Map(Box::new(Reference::primitive(
                            PrimitiveKind::Unknown,
                            path.key("additionalProperties"),
                        ))),
                        path.clone(),
                    ),
                }
            }

            Shape::Array => {
                self.check_keywords(schema, path);
                let items_path = path.key("items");
                let items = match schema.get("items") {
                    Some(items) => self.reference(parent, &format!("{}Item", hint), items, &items_path)?,
                    None => Reference::primitive(PrimitiveKind::Unknown, items_path),
                };
                let mut array = Reference::new(TypeRef::Array(Box::new(items)), path.clone());
                array.constraints = ConstraintSet::from_schema(schema);
                array
            }

            Shape::Primitive(kind) => {
                self.check_keywords(schema, path);
                let mut primitive = Reference::primitive(kind, path.clone());
                primitive.constraints = ConstraintSet::from_schema(schema);
                primitive
            }
        };

        Ok(reference)
    }

    fn is_multi_select(schema: &Value) -> bool {
        let Some(items) = schema.get("items") else {
            return false;
        };
        items.get("enum").is_some_and(Value::is_array)
            || ["anyOf", "oneOf"].iter().any(|k| {
                items
                    .get(k)
                    .and_then(|b| b.as_array())
                    .is_some_and(|b| is_titled_const_set(b))
            })
    }

    fn check_keywords(&mut self, schema: &Value, path: &SchemaPath) {
        for keyword in unknown_keywords(schema) {
            self.diagnostics.warning(
                path.key(keyword),
                DiagnosticCode::UnknownKeyword,
                format!("Keyword '{}' is not supported and was ignored", keyword),
            );
        }
    }
}
