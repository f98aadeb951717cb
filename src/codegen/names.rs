//! Emitted Identifiers
//!
//! Transliteration from canonical IR names to target spellings, and the
//! per-target check that no two nodes end up with the same identifier.
//! Casing and the acronym table live in `graph::names`; this module only
//! deals with what a target accepts.

use std::collections::BTreeMap;

use super::{EmissionPlan, Emitter};
use crate::error::{CompileError, Result};
use crate::graph::names::to_constant_case;
use crate::graph::TypeId;

/// Built-in global types a generated declaration must not shadow (sorted)
pub const TS_GLOBALS: &[&str] = &[
    "Array", "Boolean", "Date", "Error", "Function", "Map", "Number", "Object", "Promise",
    "Record", "Set", "String", "Symbol",
];

/// Valid JavaScript identifier (ASCII subset)
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Object key as written in a declaration: bare when possible, quoted otherwise
pub fn property_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        serde_json::Value::String(name.to_string()).to_string()
    }
}

/// Member access for a guard (`value.type` / `value["x-kind"]`)
pub fn member_access(target: &str, field: &str) -> String {
    if is_identifier(field) {
        format!("{}.{}", target, field)
    } else {
        format!("{}[{}]", target, property_key(field))
    }
}

/// Suffix names that would shadow a global type
pub fn avoid_global(name: &str) -> String {
    if TS_GLOBALS.binary_search(&name).is_ok() {
        format!("{}Type", name)
    } else {
        name.to_string()
    }
}

/// Enum member key from a display title or raw value
pub fn enum_member_key(text: &str) -> String {
    let key = to_constant_case(text);
    if key.is_empty() || key.starts_with(|c: char| c.is_ascii_digit()) {
        format!("VALUE_{}", key)
    } else {
        key
    }
}

/// Enum member key for an integer value
pub fn integer_member_key(value: i64) -> String {
    if value < 0 {
        format!("VALUE_NEG_{}", value.unsigned_abs())
    } else {
        format!("VALUE_{}", value)
    }
}

// =============================================================================
// Name Resolver
// =============================================================================

/// Emitted identifier per node for one target, collision-checked
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    resolved: BTreeMap<TypeId, String>,
}

impl NameResolver {
    /// Map every node through the emitter's transliteration. Two nodes
    /// landing on one identifier is a NamingCollision.
    pub fn resolve(plan: &EmissionPlan, emitter: &dyn Emitter) -> Result<Self> {
        let mut resolved = BTreeMap::new();
        let mut taken: BTreeMap<String, TypeId> = BTreeMap::new();

        for node in plan.graph().nodes() {
            let identifier = emitter.type_identifier(&node.name);

            if let Some(existing) = taken.get(&identifier) {
                return Err(CompileError::NamingCollision {
                    name: identifier,
                    path: node.path.clone(),
                    existing: plan.node(*existing).path.clone(),
                });
            }

            taken.insert(identifier.clone(), node.id);
            resolved.insert(node.id, identifier);
        }

        for (identifier, owner) in emitter.companion_identifiers(plan) {
            if let Some(existing) = taken.get(&identifier) {
                return Err(CompileError::NamingCollision {
                    name: identifier,
                    path: plan.node(owner).path.clone(),
                    existing: plan.node(*existing).path.clone(),
                });
            }
            taken.insert(identifier, owner);
        }

        tracing::debug!(target_name = emitter.name(), names = resolved.len(), "resolved identifiers");
        Ok(Self { resolved })
    }

    pub fn get(&self, id: TypeId) -> Option<&str> {
        self.resolved.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_globals_sorted() {
        assert!(TS_GLOBALS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_property_key() {
        assert_eq!(property_key("name"), "name");
        assert_eq!(property_key("$id"), "$id");
        assert_eq!(property_key("x-kind"), "\"x-kind\"");
        assert_eq!(property_key("2fa"), "\"2fa\"");
    }

    #[test]
    fn test_member_access() {
        assert_eq!(member_access("value", "type"), "value.type");
        assert_eq!(member_access("value", "x-kind"), "value[\"x-kind\"]");
    }

    #[test]
    fn test_avoid_global() {
        assert_eq!(avoid_global("Date"), "DateType");
        assert_eq!(avoid_global("User"), "User");
    }

    #[test]
    fn test_member_keys() {
        assert_eq!(enum_member_key("Light Mode"), "LIGHT_MODE");
        assert_eq!(enum_member_key("2x"), "VALUE_2X");
        assert_eq!(integer_member_key(3), "VALUE_3");
        assert_eq!(integer_member_key(-2), "VALUE_NEG_2");
    }
}
