//! Centralized naming conventions for the viewer data contract.
//!
//! Every output-field name the geometries can emit, the identity fields the
//! composition engine seeds, the missing-value sentinel and the data-file
//! extension live here, so the vocabulary the external viewer understands is
//! defined in exactly one place.
//!
//! # Categories
//!
//! - **Identity fields**: entity/condition sequences seeded from grouping keys
//! - **Box fields**: stacked box-point fields with per-row validity rules
//! - **Scope marker**: the substring that routes a geometry to the
//!   metabolite-scoped grouping rather than the reaction-scoped one

// ============================================================================
// Identity fields (seeded from grouping keys, exempt from sanitization)
// ============================================================================

/// Reaction identifiers, one per row of the reaction grouping.
pub const REACTIONS: &str = "reactions";

/// Condition labels parallel to the reaction grouping.
pub const CONDITIONS: &str = "conditions";

/// Metabolite identifiers, one per row of the metabolite grouping.
pub const METABOLITES: &str = "metabolites";

/// Condition labels parallel to the metabolite grouping.
pub const MET_CONDITIONS: &str = "met_conditions";

/// Fields that carry entity identity and are passed through untouched.
pub const IDENTITY_FIELDS: &[&str] = &[REACTIONS, CONDITIONS, METABOLITES, MET_CONDITIONS];

// ============================================================================
// Box-point fields (per-row all-or-nothing validity)
// ============================================================================

/// Fields produced by the box-point geometry. A list cell in any of these is
/// kept only when every element is present; otherwise the whole row collapses
/// to a single-element sentinel list.
pub const BOX_FIELDS: &[&str] = &["box_y", "box_left_y", "box_variant", "box_left_variant"];

/// Box-point label fields, exempt from the numeric sentinel sweep.
pub const VARIANT_FIELDS: &[&str] = &["box_variant", "box_left_variant"];

// ============================================================================
// Scope and sentinel
// ============================================================================

/// Substring marking an output field as metabolite-scoped.
pub const METABOLITE_MARKER: &str = "met";

/// The string the viewer treats as "no data". JSON cannot encode a bare
/// floating NaN, so missing numerics are exported as this string.
pub const NAN_SENTINEL: &str = "NaN";

/// Double extension the viewer requires to recognise a data file.
pub const DATA_EXTENSION: &str = ".metabolism.json";

// ============================================================================
// Predicates and constructors
// ============================================================================

/// True if the field carries entity identity (never sanitized).
pub fn is_identity_field(field: &str) -> bool {
    IDENTITY_FIELDS.contains(&field)
}

/// True if the field follows the box-point per-row validity rule.
pub fn is_box_field(field: &str) -> bool {
    BOX_FIELDS.contains(&field)
}

/// True if the field holds box-point labels rather than numbers.
pub fn is_variant_field(field: &str) -> bool {
    VARIANT_FIELDS.contains(&field)
}

/// True if the field targets the metabolite-scoped grouping.
pub fn is_metabolite_field(field: &str) -> bool {
    field.contains(METABOLITE_MARKER)
}

/// Final path for an exported data file: `<base>.metabolism.json`.
///
/// # Example
/// ```
/// use ggmet::naming;
/// assert_eq!(naming::data_file_path("omics"), "omics.metabolism.json");
/// ```
pub fn data_file_path(base: &str) -> String {
    format!("{}{}", base, DATA_EXTENSION)
}
