//! Shape Classification
//!
//! Assigns every enum and union node one [`ShapeTag`]. The tag is a pure
//! function of the already-normalized IR; backends use it to choose between
//! literal unions, named enumerations and discriminant dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{EnumCardinality, EnumOrigin, EnumType, EnumValueKind, TypeGraph, TypeKind, UnionType};

// =============================================================================
// Shape Tag
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeTag {
    /// `enum` of strings, no titles anywhere
    PlainStringEnum,
    /// `enum` of integers
    PlainIntegerUnion,
    /// Titled schema over an untitled string `enum`
    UntitledSingleSelect,
    /// `oneOf` of `{const, title}` pairs
    TitledSingleSelect,
    /// Array of an untitled `enum`
    UntitledMultiSelect,
    /// Array of `{const, title}` pairs
    TitledMultiSelect,
    /// `enum` with parallel `enumNames`
    LegacyTitledEnum,
    DiscriminatedObjectUnion,
    PlainObjectUnion,
}

impl ShapeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainStringEnum => "plain-string-enum",
            Self::PlainIntegerUnion => "plain-integer-union",
            Self::UntitledSingleSelect => "untitled-single-select",
            Self::TitledSingleSelect => "titled-single-select",
            Self::UntitledMultiSelect => "untitled-multi-select",
            Self::TitledMultiSelect => "titled-multi-select",
            Self::LegacyTitledEnum => "legacy-titled-enum",
            Self::DiscriminatedObjectUnion => "discriminated-object-union",
            Self::PlainObjectUnion => "plain-object-union",
        }
    }

    /// Variants carry display titles
    pub fn is_titled(&self) -> bool {
        matches!(
            self,
            Self::TitledSingleSelect | Self::TitledMultiSelect | Self::LegacyTitledEnum
        )
    }

    /// The value is a list of enum members
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::UntitledMultiSelect | Self::TitledMultiSelect)
    }
}

impl fmt::Display for ShapeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Classify one enum. Rules apply in priority order.
pub fn classify_enum(enumeration: &EnumType) -> ShapeTag {
    match (enumeration.origin, enumeration.cardinality) {
        (EnumOrigin::EnumNames, _) => ShapeTag::LegacyTitledEnum,
        (EnumOrigin::ConstBranches, EnumCardinality::Single) => ShapeTag::TitledSingleSelect,
        (EnumOrigin::ConstBranches, EnumCardinality::Multi) => ShapeTag::TitledMultiSelect,
        (EnumOrigin::Flat, EnumCardinality::Multi) => ShapeTag::UntitledMultiSelect,
        (EnumOrigin::Flat, EnumCardinality::Single) => match enumeration.value_kind {
            EnumValueKind::Integer => ShapeTag::PlainIntegerUnion,
            EnumValueKind::String if enumeration.titled_schema => ShapeTag::UntitledSingleSelect,
            EnumValueKind::String => ShapeTag::PlainStringEnum,
        },
    }
}

pub fn classify_union(union: &UnionType) -> ShapeTag {
    if union.discriminant.is_some() {
        ShapeTag::DiscriminatedObjectUnion
    } else {
        ShapeTag::PlainObjectUnion
    }
}

/// Tag every enum and union node in place
pub fn classify_all(graph: &mut TypeGraph) {
    let mut tagged = 0usize;

    for node in graph.nodes_mut() {
        match &mut node.kind {
            TypeKind::Enum(enumeration) => enumeration.shape = Some(classify_enum(enumeration)),
            TypeKind::Union(union) => union.shape = Some(classify_union(union)),
            _ => continue,
        }
        tagged += 1;
        tracing::trace!(name = %node.name, shape = ?node.shape(), "classified");
    }

    tracing::debug!(tagged, "classified enums and unions");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use serde_json::json;

    fn shapes(doc: serde_json::Value) -> Vec<(String, ShapeTag)> {
        let (mut graph, _) = build_graph(&doc).unwrap();
        classify_all(&mut graph);
        graph
            .nodes()
            .iter()
            .filter_map(|n| n.shape().map(|s| (n.name.clone(), s)))
            .collect()
    }

    fn shape_of(doc: serde_json::Value, name: &str) -> ShapeTag {
        shapes(doc)
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
            .unwrap_or_else(|| panic!("{} was not classified", name))
    }

    #[test]
    fn test_enum_shapes() {
        let doc = json!({
            "$defs": {
                "Color": {"enum": ["red", "green"]},
                "Level": {"enum": [1, 2, 3]},
                "Size": {"title": "Size", "type": "string", "enum": ["s", "m"]},
                "Theme": {"oneOf": [
                    {"const": "light", "title": "Light"},
                    {"const": "dark", "title": "Dark"}
                ]},
                "Tags": {"type": "array", "items": {"enum": ["a", "b"]}},
                "Perms": {"type": "array", "items": {"anyOf": [
                    {"const": "read", "title": "Read"},
                    {"const": "write", "title": "Write"}
                ]}},
                "Legacy": {"enum": ["x", "y"], "enumNames": ["Ex", "Why"]}
            }
        });

        assert_eq!(shape_of(doc.clone(), "Color"), ShapeTag::PlainStringEnum);
        assert_eq!(shape_of(doc.clone(), "Level"), ShapeTag::PlainIntegerUnion);
        assert_eq!(shape_of(doc.clone(), "Size"), ShapeTag::UntitledSingleSelect);
        assert_eq!(shape_of(doc.clone(), "Theme"), ShapeTag::TitledSingleSelect);
        assert_eq!(shape_of(doc.clone(), "Tags"), ShapeTag::UntitledMultiSelect);
        assert_eq!(shape_of(doc.clone(), "Perms"), ShapeTag::TitledMultiSelect);
        assert_eq!(shape_of(doc, "Legacy"), ShapeTag::LegacyTitledEnum);
    }

    #[test]
    fn test_union_shapes() {
        let doc = json!({
            "$defs": {
                "Tagged": {"oneOf": [
                    {"type": "object", "properties": {"kind": {"const": "a"}}, "required": ["kind"]},
                    {"type": "object", "properties": {"kind": {"const": "b"}}, "required": ["kind"]}
                ]},
                "Loose": {"anyOf": [{"type": "string"}, {"type": "integer"}]}
            }
        });
        assert_eq!(shape_of(doc.clone(), "Tagged"), ShapeTag::DiscriminatedObjectUnion);
        assert_eq!(shape_of(doc, "Loose"), ShapeTag::PlainObjectUnion);
    }

    #[test]
    fn test_tag_strings() {
        assert_eq!(ShapeTag::TitledMultiSelect.to_string(), "titled-multi-select");
        assert_eq!(
            serde_json::to_value(ShapeTag::PlainIntegerUnion).unwrap(),
            json!("plain-integer-union")
        );
        assert!(ShapeTag::LegacyTitledEnum.is_titled());
        assert!(ShapeTag::UntitledMultiSelect.is_multi());
    }
}
