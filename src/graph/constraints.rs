//! Constraint Mapping
//!
//! Parses declarative validation keywords into a [`ConstraintSet`] and maps
//! them to target-agnostic [`ConstraintDescriptor`]s. Each target declares a
//! [`ConstraintSupport`]; anything outside it is dropped for that target with
//! an `UnsupportedConstraint` warning, never rewritten into other semantics.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::diagnostics::Diagnostics;
use super::path::SchemaPath;
use super::{PrimitiveKind, Reference, TypeGraph, TypeKind, TypeRef};

/// Keywords with no mapping in any target. The builder reports and ignores them.
pub const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "contains",
    "contentEncoding",
    "contentMediaType",
    "dependentRequired",
    "dependentSchemas",
    "else",
    "if",
    "maxContains",
    "maxProperties",
    "minContains",
    "minProperties",
    "not",
    "patternProperties",
    "prefixItems",
    "propertyNames",
    "then",
    "unevaluatedItems",
    "unevaluatedProperties",
];

/// Unsupported keywords present on a schema node, in keyword order
pub fn unknown_keywords(schema: &Value) -> Vec<&'static str> {
    UNSUPPORTED_KEYWORDS
        .iter()
        .copied()
        .filter(|k| schema.get(k).is_some())
        .collect()
}

// =============================================================================
// Constraint Set
// =============================================================================

/// Validation keywords attached to a field or scalar reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub format: Option<String>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    #[serde(default)]
    pub unique_items: bool,
}

impl ConstraintSet {
    /// Read the constraint keywords of one schema node
    pub fn from_schema(schema: &Value) -> Self {
        let number = |key: &str| schema.get(key).and_then(|v| v.as_f64());
        let count = |key: &str| schema.get(key).and_then(|v| v.as_u64());
        let string = |key: &str| schema.get(key).and_then(|v| v.as_str()).map(str::to_string);

        let mut set = Self {
            minimum: number("minimum"),
            maximum: number("maximum"),
            exclusive_minimum: number("exclusiveMinimum"),
            exclusive_maximum: number("exclusiveMaximum"),
            multiple_of: number("multipleOf"),
            min_length: count("minLength"),
            max_length: count("maxLength"),
            pattern: string("pattern"),
            format: string("format"),
            min_items: count("minItems"),
            max_items: count("maxItems"),
            unique_items: schema.get("uniqueItems").and_then(|v| v.as_bool()).unwrap_or(false),
        };

        // Draft 4 spelling: boolean exclusiveMinimum/Maximum modifies the plain bound
        if schema.get("exclusiveMinimum").and_then(|v| v.as_bool()) == Some(true) {
            set.exclusive_minimum = set.minimum.take();
        }
        if schema.get("exclusiveMaximum").and_then(|v| v.as_bool()) == Some(true) {
            set.exclusive_maximum = set.maximum.take();
        }

        set
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Only the collection-size keywords (for array-valued positions)
    pub fn item_counts(&self) -> Self {
        Self {
            min_items: self.min_items,
            max_items: self.max_items,
            unique_items: self.unique_items,
            ..Self::default()
        }
    }

    /// Everything except the collection-size keywords
    pub fn without_item_counts(&self) -> Self {
        Self {
            min_items: None,
            max_items: None,
            unique_items: false,
            ..self.clone()
        }
    }
}

// =============================================================================
// Descriptors
// =============================================================================

/// One constraint keyword, used for support tables and warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    Format,
    MinLength,
    MaxLength,
    Pattern,
    Minimum,
    Maximum,
    ExclusiveMinimum,
    ExclusiveMaximum,
    MultipleOf,
    MinItems,
    MaxItems,
    UniqueItems,
}

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 12] = [
        Self::Format,
        Self::MinLength,
        Self::MaxLength,
        Self::Pattern,
        Self::Minimum,
        Self::Maximum,
        Self::ExclusiveMinimum,
        Self::ExclusiveMaximum,
        Self::MultipleOf,
        Self::MinItems,
        Self::MaxItems,
        Self::UniqueItems,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Format => "format",
            Self::MinLength => "minLength",
            Self::MaxLength => "maxLength",
            Self::Pattern => "pattern",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::ExclusiveMinimum => "exclusiveMinimum",
            Self::ExclusiveMaximum => "exclusiveMaximum",
            Self::MultipleOf => "multipleOf",
            Self::MinItems => "minItems",
            Self::MaxItems => "maxItems",
            Self::UniqueItems => "uniqueItems",
        }
    }

    /// What kind of value the keyword constrains
    fn applies_to(&self, subject: ConstraintSubject) -> bool {
        match self {
            Self::Format | Self::MinLength | Self::MaxLength | Self::Pattern => {
                subject == ConstraintSubject::String
            }
            Self::Minimum
            | Self::Maximum
            | Self::ExclusiveMinimum
            | Self::ExclusiveMaximum
            | Self::MultipleOf => subject.is_numeric(),
            Self::MinItems | Self::MaxItems | Self::UniqueItems => subject == ConstraintSubject::Array,
        }
    }
}

/// Named string formats with well-known validators
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NamedFormat {
    Email,
    Uuid,
    Url,
    DateTime,
    Date,
    Time,
    Byte,
    Custom(String),
}

impl NamedFormat {
    pub fn from_keyword(format: &str) -> Self {
        match format {
            "email" => Self::Email,
            "uuid" => Self::Uuid,
            "uri" | "url" => Self::Url,
            "date-time" => Self::DateTime,
            "date" => Self::Date,
            "time" => Self::Time,
            "byte" => Self::Byte,
            other => Self::Custom(other.to_string()),
        }
    }

    pub fn keyword(&self) -> &str {
        match self {
            Self::Email => "email",
            Self::Uuid => "uuid",
            Self::Url => "uri",
            Self::DateTime => "date-time",
            Self::Date => "date",
            Self::Time => "time",
            Self::Byte => "byte",
            Self::Custom(name) => name,
        }
    }
}

/// Which end of a range a bound limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundKind {
    Lower,
    Upper,
}

/// Target-agnostic constraint, ready for a backend to render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstraintDescriptor {
    /// Named format validator
    Format(NamedFormat),
    /// String length bound (always inclusive)
    Length { bound: BoundKind, value: u64 },
    /// Regular-expression match
    Pattern(String),
    /// Numeric bound; `inclusive` distinguishes minimum from exclusiveMinimum
    Numeric { bound: BoundKind, inclusive: bool, value: f64 },
    /// Divisibility check
    MultipleOf(f64),
    /// Collection length bound (always inclusive)
    ItemCount { bound: BoundKind, value: u64 },
    /// All items distinct
    UniqueItems,
}

impl ConstraintDescriptor {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Self::Format(_) => ConstraintKind::Format,
            Self::Length { bound: BoundKind::Lower, .. } => ConstraintKind::MinLength,
            Self::Length { bound: BoundKind::Upper, .. } => ConstraintKind::MaxLength,
            Self::Pattern(_) => ConstraintKind::Pattern,
            Self::Numeric { bound: BoundKind::Lower, inclusive: true, .. } => ConstraintKind::Minimum,
            Self::Numeric { bound: BoundKind::Upper, inclusive: true, .. } => ConstraintKind::Maximum,
            Self::Numeric { bound: BoundKind::Lower, inclusive: false, .. } => {
                ConstraintKind::ExclusiveMinimum
            }
            Self::Numeric { bound: BoundKind::Upper, inclusive: false, .. } => {
                ConstraintKind::ExclusiveMaximum
            }
            Self::MultipleOf(_) => ConstraintKind::MultipleOf,
            Self::ItemCount { bound: BoundKind::Lower, .. } => ConstraintKind::MinItems,
            Self::ItemCount { bound: BoundKind::Upper, .. } => ConstraintKind::MaxItems,
            Self::UniqueItems => ConstraintKind::UniqueItems,
        }
    }

    /// Whether a number satisfies this descriptor. `None` for non-numeric descriptors.
    pub fn admits_number(&self, x: f64) -> Option<bool> {
        match *self {
            Self::Numeric { bound: BoundKind::Lower, inclusive, value } => {
                Some(if inclusive { x >= value } else { x > value })
            }
            Self::Numeric { bound: BoundKind::Upper, inclusive, value } => {
                Some(if inclusive { x <= value } else { x < value })
            }
            Self::MultipleOf(step) => Some(step != 0.0 && (x / step).fract() == 0.0),
            _ => None,
        }
    }
}

/// The kind of value a reference holds, as far as constraints care
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSubject {
    String,
    Integer,
    Number,
    Array,
    Other,
}

impl ConstraintSubject {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Number)
    }

    pub fn of(reference: &Reference) -> Self {
        if reference.literal.is_some() {
            return Self::Other;
        }
        match &reference.target {
            TypeRef::Primitive(PrimitiveKind::String) => Self::String,
            TypeRef::Primitive(PrimitiveKind::Integer) => Self::Integer,
            TypeRef::Primitive(PrimitiveKind::Number) => Self::Number,
            TypeRef::Array(_) => Self::Array,
            _ => Self::Other,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Integer => "an integer",
            Self::Number => "a number",
            Self::Array => "an array",
            Self::Other => "a value with no constraint slot",
        }
    }
}

// =============================================================================
// Target Support
// =============================================================================

/// Constraint kinds and format names a target can express
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSupport {
    kinds: BTreeSet<ConstraintKind>,
    formats: BTreeSet<String>,
}

impl ConstraintSupport {
    pub fn new(kinds: impl IntoIterator<Item = ConstraintKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
            formats: BTreeSet::new(),
        }
    }

    pub fn with_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.formats.extend(formats.into_iter().map(Into::into));
        self
    }

    pub fn supports(&self, kind: ConstraintKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn supports_format(&self, format: &str) -> bool {
        self.formats.contains(format)
    }
}

// =============================================================================
// Mapper
// =============================================================================

/// Descriptors per constraint-bearing location, for one target
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintTable {
    entries: BTreeMap<SchemaPath, Vec<ConstraintDescriptor>>,
}

impl ConstraintTable {
    /// Descriptors recorded for a location (empty when none)
    pub fn get(&self, path: &SchemaPath) -> &[ConstraintDescriptor] {
        self.entries.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Maps ConstraintSets for one target
pub struct ConstraintMapper<'a> {
    target: &'a str,
    support: &'a ConstraintSupport,
}

impl<'a> ConstraintMapper<'a> {
    pub fn new(target: &'a str, support: &'a ConstraintSupport) -> Self {
        Self { target, support }
    }

    /// Map one constraint set. Output order is fixed: format, string length,
    /// pattern, numeric bounds, multipleOf, item counts.
    pub fn map(
        &self,
        set: &ConstraintSet,
        subject: ConstraintSubject,
        path: &SchemaPath,
        diagnostics: &mut Diagnostics,
    ) -> Vec<ConstraintDescriptor> {
        let mut candidates = Vec::new();

        if let Some(format) = &set.format {
            candidates.push(ConstraintDescriptor::Format(NamedFormat::from_keyword(format)));
        }
        if let Some(v) = set.min_length {
            candidates.push(ConstraintDescriptor::Length { bound: BoundKind::Lower, value: v });
        }
        if let Some(v) = set.max_length {
            candidates.push(ConstraintDescriptor::Length { bound: BoundKind::Upper, value: v });
        }
        if let Some(p) = &set.pattern {
            candidates.push(ConstraintDescriptor::Pattern(p.clone()));
        }
        if let Some(v) = set.minimum {
            candidates.push(ConstraintDescriptor::Numeric { bound: BoundKind::Lower, inclusive: true, value: v });
        }
        if let Some(v) = set.maximum {
            candidates.push(ConstraintDescriptor::Numeric { bound: BoundKind::Upper, inclusive: true, value: v });
        }
        if let Some(v) = set.exclusive_minimum {
            candidates.push(ConstraintDescriptor::Numeric { bound: BoundKind::Lower, inclusive: false, value: v });
        }
        if let Some(v) = set.exclusive_maximum {
            candidates.push(ConstraintDescriptor::Numeric { bound: BoundKind::Upper, inclusive: false, value: v });
        }
        if let Some(v) = set.multiple_of {
            candidates.push(ConstraintDescriptor::MultipleOf(v));
        }
        if let Some(v) = set.min_items {
            candidates.push(ConstraintDescriptor::ItemCount { bound: BoundKind::Lower, value: v });
        }
        if let Some(v) = set.max_items {
            candidates.push(ConstraintDescriptor::ItemCount { bound: BoundKind::Upper, value: v });
        }
        if set.unique_items {
            candidates.push(ConstraintDescriptor::UniqueItems);
        }

        candidates
            .into_iter()
            .filter(|descriptor| self.accept(descriptor, subject, path, diagnostics))
            .collect()
    }

    fn accept(
        &self,
        descriptor: &ConstraintDescriptor,
        subject: ConstraintSubject,
        path: &SchemaPath,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        let kind = descriptor.kind();

        let reason = if !kind.applies_to(subject) {
            Some(format!("'{}' cannot apply to {}", kind.keyword(), subject.describe()))
        } else if !self.support.supports(kind) {
            Some(format!("target has no validator for '{}'", kind.keyword()))
        } else if let ConstraintDescriptor::Format(NamedFormat::Custom(name)) = descriptor {
            (!self.support.supports_format(name))
                .then(|| format!("no validator or mapping for format '{}'", name))
        } else {
            None
        };

        match reason {
            Some(reason) => {
                diagnostics.unsupported_constraint(path.clone(), self.target, kind.keyword(), &reason);
                false
            }
            None => true,
        }
    }

    /// Map every constraint-bearing location in the graph
    pub fn map_graph(&self, graph: &TypeGraph, diagnostics: &mut Diagnostics) -> ConstraintTable {
        let mut table = ConstraintTable::default();

        for node in graph.nodes() {
            match &node.kind {
                TypeKind::Object(object) => {
                    for field in &object.fields {
                        self.map_reference(&field.reference, &mut table, diagnostics);
                    }
                }
                TypeKind::Enum(enumeration) => {
                    if !enumeration.constraints.is_empty() {
                        let mapped = self.map(
                            &enumeration.constraints,
                            ConstraintSubject::Array,
                            &node.path,
                            diagnostics,
                        );
                        table.insert(&node.path, mapped);
                    }
                }
                TypeKind::Union(union) => {
                    for member in &union.members {
                        self.map_reference(&member.reference, &mut table, diagnostics);
                    }
                }
                TypeKind::Array(array) => {
                    if !array.constraints.is_empty() {
                        let mapped =
                            self.map(&array.constraints, ConstraintSubject::Array, &node.path, diagnostics);
                        table.insert(&node.path, mapped);
                    }
                    self.map_reference(&array.items, &mut table, diagnostics);
                }
                TypeKind::Map(map) => self.map_reference(&map.values, &mut table, diagnostics),
                TypeKind::Alias(alias) => self.map_reference(&alias.target, &mut table, diagnostics),
                TypeKind::Primitive(_) => {}
            }
        }

        tracing::debug!(target_name = self.target, entries = table.len(), "mapped constraints");
        table
    }

    fn map_reference(&self, reference: &Reference, table: &mut ConstraintTable, diagnostics: &mut Diagnostics) {
        if !reference.constraints.is_empty() {
            let mapped = self.map(
                &reference.constraints,
                ConstraintSubject::of(reference),
                &reference.path,
                diagnostics,
            );
            table.insert(&reference.path, mapped);
        }

        match &reference.target {
            TypeRef::Array(inner) | TypeRef::Map(inner) => self.map_reference(inner, table, diagnostics),
            TypeRef::Named(_) | TypeRef::Primitive(_) => {}
        }
    }
}

impl ConstraintTable {
    fn insert(&mut self, path: &SchemaPath, descriptors: Vec<ConstraintDescriptor>) {
        if !descriptors.is_empty() {
            self.entries.insert(path.clone(), descriptors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::diagnostics::DiagnosticCode;
    use serde_json::json;

    fn full_support() -> ConstraintSupport {
        ConstraintSupport::new(ConstraintKind::ALL)
    }

    #[test]
    fn test_from_schema_reads_keywords() {
        let set = ConstraintSet::from_schema(&json!({
            "type": "string", "minLength": 3, "maxLength": 20, "pattern": "^[a-z]+$", "format": "email"
        }));
        assert_eq!(set.min_length, Some(3));
        assert_eq!(set.max_length, Some(20));
        assert_eq!(set.pattern.as_deref(), Some("^[a-z]+$"));
        assert_eq!(set.format.as_deref(), Some("email"));
        assert!(set.minimum.is_none());
    }

    #[test]
    fn test_draft4_exclusive_flags() {
        let set = ConstraintSet::from_schema(&json!({
            "minimum": 0, "exclusiveMinimum": true, "maximum": 5
        }));
        assert_eq!(set.minimum, None);
        assert_eq!(set.exclusive_minimum, Some(0.0));
        assert_eq!(set.maximum, Some(5.0));
    }

    #[test]
    fn test_inclusive_bounds_admit_endpoints() {
        let set = ConstraintSet::from_schema(&json!({"minimum": 0, "maximum": 150}));
        let mut diags = Diagnostics::new();
        let support = full_support();
        let mapper = ConstraintMapper::new("zod", &support);
        let descriptors = mapper.map(&set, ConstraintSubject::Integer, &SchemaPath::root(), &mut diags);

        let admits = |x: f64| descriptors.iter().all(|d| d.admits_number(x).unwrap_or(true));
        assert!(admits(0.0));
        assert!(admits(150.0));
        assert!(!admits(-1.0));
        assert!(!admits(151.0));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_exclusive_bounds_reject_endpoints() {
        let set = ConstraintSet::from_schema(&json!({"exclusiveMinimum": 0, "exclusiveMaximum": 5}));
        let mut diags = Diagnostics::new();
        let support = full_support();
        let descriptors = ConstraintMapper::new("zod", &support).map(
            &set,
            ConstraintSubject::Number,
            &SchemaPath::root(),
            &mut diags,
        );
        let admits = |x: f64| descriptors.iter().all(|d| d.admits_number(x).unwrap_or(true));
        assert!(!admits(0.0));
        assert!(!admits(5.0));
        assert!(admits(2.5));
    }

    #[test]
    fn test_canonical_order() {
        let set = ConstraintSet::from_schema(&json!({
            "multipleOf": 0.5, "maximum": 100, "minimum": 0
        }));
        let mut diags = Diagnostics::new();
        let support = full_support();
        let kinds: Vec<_> = ConstraintMapper::new("zod", &support)
            .map(&set, ConstraintSubject::Number, &SchemaPath::root(), &mut diags)
            .iter()
            .map(|d| d.kind())
            .collect();
        assert_eq!(kinds, vec![ConstraintKind::Minimum, ConstraintKind::Maximum, ConstraintKind::MultipleOf]);
    }

    #[test]
    fn test_unsupported_kind_is_dropped_with_warning() {
        let set = ConstraintSet::from_schema(&json!({"minItems": 1, "uniqueItems": true}));
        let support = ConstraintSupport::new([ConstraintKind::MinItems, ConstraintKind::MaxItems]);
        let mut diags = Diagnostics::new();
        let path = SchemaPath::root().keys(["properties", "tags"]);
        let descriptors = ConstraintMapper::new("zod", &support).map(&set, ConstraintSubject::Array, &path, &mut diags);

        assert_eq!(descriptors, vec![ConstraintDescriptor::ItemCount { bound: BoundKind::Lower, value: 1 }]);
        let warning = diags.with_code(DiagnosticCode::UnsupportedConstraint).next().unwrap();
        assert_eq!(warning.path, path);
        assert_eq!(warning.target.as_deref(), Some("zod"));
    }

    #[test]
    fn test_mismatched_subject_is_not_mistranslated() {
        // minLength on a number must not become a numeric bound
        let set = ConstraintSet::from_schema(&json!({"minLength": 2}));
        let mut diags = Diagnostics::new();
        let support = full_support();
        let descriptors = ConstraintMapper::new("zod", &support).map(
            &set,
            ConstraintSubject::Number,
            &SchemaPath::root(),
            &mut diags,
        );
        assert!(descriptors.is_empty());
        assert_eq!(diags.warning_count(), 1);
    }

    #[test]
    fn test_custom_format_needs_mapping() {
        let set = ConstraintSet::from_schema(&json!({"format": "hostname"}));
        let mut diags = Diagnostics::new();

        let bare = full_support();
        let dropped = ConstraintMapper::new("zod", &bare).map(&set, ConstraintSubject::String, &SchemaPath::root(), &mut diags);
        assert!(dropped.is_empty());

        let mapped = full_support().with_formats(["hostname"]);
        let kept = ConstraintMapper::new("zod", &mapped).map(&set, ConstraintSubject::String, &SchemaPath::root(), &mut diags);
        assert_eq!(kept, vec![ConstraintDescriptor::Format(NamedFormat::Custom("hostname".into()))]);
    }

    #[test]
    fn test_unknown_keywords() {
        let schema = json!({"type": "object", "minProperties": 1, "not": {}});
        assert_eq!(unknown_keywords(&schema), vec!["minProperties", "not"]);
    }
}
