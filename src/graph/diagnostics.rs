//! Diagnostics
//!
//! Collects non-fatal findings during building, mapping and emission.
//! Fatal problems never land here; they abort the build as a `CompileError`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::path::SchemaPath;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// A constraint has no mapping for the requested target (dropped for that target)
    UnsupportedConstraint,
    /// A union of objects has no usable discriminant (falls back to a plain union)
    AmbiguousDiscriminant,
    /// An enum mixes value kinds or holds non-scalars (degrades to unknown)
    MixedEnum,
    /// A keyword the compiler does not understand at all (ignored)
    UnknownKeyword,
    /// A repeated enum value was dropped
    DuplicateEnumValue,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedConstraint => "W001",
            Self::AmbiguousDiscriminant => "W002",
            Self::MixedEnum => "W003",
            Self::UnknownKeyword => "W004",
            Self::DuplicateEnumValue => "I001",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::UnsupportedConstraint
            | Self::AmbiguousDiscriminant
            | Self::MixedEnum
            | Self::UnknownKeyword => Severity::Warning,

            Self::DuplicateEnumValue => Severity::Info,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Schema location that caused this diagnostic
    pub path: SchemaPath,
    pub code: DiagnosticCode,
    pub message: String,
    /// Target the finding applies to (None = every target)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Additional context (keyword names, candidate fields, ...)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(path: SchemaPath, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            path,
            code,
            message: message.into(),
            target: None,
            context: Vec::new(),
        }
    }

    pub fn for_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {} ({})", self.code, self.code.severity(), self.message, self.path)?;

        if let Some(target) = &self.target {
            write!(f, " [{}]", target)?;
        }

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of diagnostics from the pipeline passes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic item
    pub fn push(&mut self, item: DiagnosticItem) {
        tracing::warn!(code = %item.code, path = %item.path, "{}", item.message);
        self.items.push(item);
    }

    /// Add a warning
    pub fn warning(&mut self, path: SchemaPath, code: DiagnosticCode, message: impl Into<String>) {
        self.push(DiagnosticItem::new(path, code, message));
    }

    /// Record a constraint dropped for one target
    pub fn unsupported_constraint(
        &mut self,
        path: SchemaPath,
        target: &str,
        keyword: &str,
        reason: &str,
    ) {
        self.push(
            DiagnosticItem::new(
                path,
                DiagnosticCode::UnsupportedConstraint,
                format!("Constraint '{}' is not supported by target '{}' and was dropped", keyword, target),
            )
            .for_target(target)
            .with_context(reason.to_string()),
        );
    }

    /// Record a union that fell back to the plain encoding
    pub fn ambiguous_discriminant(&mut self, path: SchemaPath, union_name: &str, reason: &str) {
        self.push(
            DiagnosticItem::new(
                path,
                DiagnosticCode::AmbiguousDiscriminant,
                format!("Union '{}' has no usable discriminant field; emitting a plain union", union_name),
            )
            .with_context(reason.to_string()),
        );
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Warning)
    }

    /// Get all warnings
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    /// Items carrying a given code
    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(move |i| i.code == code)
    }

    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Merge another Diagnostics into this one
    pub fn merge(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Format all diagnostics for display
    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }

        if !self.is_empty() {
            output.push_str(&format!("\n{} warning(s)\n", self.warning_count()));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticItem;
    type IntoIter = std::vec::IntoIter<DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
