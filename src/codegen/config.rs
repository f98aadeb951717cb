//! Codegen Configuration
//!
//! Per-target render options. Classification and cycle analysis are
//! config-free; only emission reads these.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// TypeScript (structural)
// =============================================================================

/// Options for the structural TypeScript backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeScriptOptions {
    /// Artifact file name
    pub filename: String,

    /// Prefix declarations with `export`
    pub export_types: bool,

    /// Render scalar definitions as `Branded<T, "Name">`
    pub branded_primitives: bool,

    /// Render optional fields as `name: T | null` instead of `name?: T`
    pub null_optional: bool,

    /// Format name -> TypeScript type (unlisted formats are `string`)
    pub format_mappings: BTreeMap<String, String>,
}

impl Default for TypeScriptOptions {
    fn default() -> Self {
        Self {
            filename: "types.ts".to_string(),
            export_types: true,
            branded_primitives: false,
            null_optional: false,
            format_mappings: BTreeMap::new(),
        }
    }
}

// =============================================================================
// Zod (validated)
// =============================================================================

/// Options for the validated Zod backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZodOptions {
    pub filename: String,

    pub export_types: bool,

    /// Format name -> Zod expression, overriding the built-in validators
    /// and enabling custom formats (e.g. `hostname = "z.string().regex(/^[a-z.-]+$/)"`)
    pub format_mappings: BTreeMap<String, String>,
}

impl Default for ZodOptions {
    fn default() -> Self {
        Self {
            filename: "schemas.ts".to_string(),
            export_types: true,
            format_mappings: BTreeMap::new(),
        }
    }
}

// =============================================================================
// Go (structural)
// =============================================================================

/// How optional fields are spelled in Go
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoOptionalStyle {
    /// `*T`
    #[default]
    Pointer,
    /// `opt.Optional[T]` from github.com/Southclaws/opt
    Opt,
}

/// A Go type for a string format, with the package it needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoFormat {
    #[serde(rename = "type")]
    pub go_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<String>,
}

impl GoFormat {
    pub fn new(go_type: &str, import: Option<&str>) -> Self {
        Self {
            go_type: go_type.to_string(),
            import: import.map(str::to_string),
        }
    }
}

/// Options for the structural Go backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoOptions {
    pub filename: String,

    /// `package` clause of the artifact
    pub package: String,

    pub optional_style: GoOptionalStyle,

    /// Format name -> Go type, layered over the built-in table
    /// (`uuid = { type = "string" }` turns a mapping off)
    pub format_mappings: BTreeMap<String, GoFormat>,
}

impl Default for GoOptions {
    fn default() -> Self {
        Self {
            filename: "generated.go".to_string(),
            package: "generated".to_string(),
            optional_style: GoOptionalStyle::Pointer,
            format_mappings: BTreeMap::new(),
        }
    }
}
