//! Geometry variants: translators from aesthetic roles to viewer fields.
//!
//! Every geometry is a fixed table from [`Role`]s to output-field names plus a
//! type policy per entry. The variants form a closed set built through one
//! constructor per geometry; side/metabolite flags are baked into the mapping
//! table at construction time and are not runtime-mutable.
//!
//! A geometry may carry its own dataframe and/or its own aesthetic; those
//! override the plot-level ones during resolution.
//!
//! # Example
//!
//! ```rust,ignore
//! use ggmet::{Aes, Geom, Side};
//!
//! let kde = Geom::kde(Side::Left, false);
//! let circles = Geom::metabolite().with_aes(Aes::new().color("conc"))?;
//! ```

use crate::aes::{Aes, Role};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::{naming, GgmetError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Placement of a geometry relative to its reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    #[default]
    Right,
    Hover,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Hover => "hover",
        };
        write!(f, "{}", s)
    }
}

/// How a geometry validates and converts the columns it extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypePolicy {
    /// Cells must be lists of numbers (per-row distributions).
    Distribution,
    /// Cells must be numeric; list cells are collapsed to their arithmetic
    /// mean, with a diagnostic recorded.
    ScalarCoercible,
    /// Opaque grouping labels, coerced to strings and passed through.
    CategoricalPassthrough,
}

/// Enum of all geometry kinds for pattern matching and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeomKind {
    Hist,
    Kde,
    Arrow,
    Metabolite,
    Column,
    BoxPoint,
}

impl std::fmt::Display for GeomKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GeomKind::Hist => "hist",
            GeomKind::Kde => "kde",
            GeomKind::Arrow => "arrow",
            GeomKind::Metabolite => "metabolite",
            GeomKind::Column => "column",
            GeomKind::BoxPoint => "box_point",
        };
        write!(f, "{}", s)
    }
}

/// One row of a geometry's mapping table.
#[derive(Debug, Clone)]
struct MappingEntry {
    role: Role,
    field: String,
    policy: TypePolicy,
}

/// A configured geometry: a role → output-field table, a type policy per
/// entry, and optionally bound data and aesthetics.
#[derive(Debug, Clone)]
pub struct Geom {
    kind: GeomKind,
    mapping: Vec<MappingEntry>,
    data: Option<DataFrame>,
    aes: Option<Aes>,
}

impl Geom {
    /// Histograms beside (or hovering over) reactions, or on metabolites.
    pub fn hist(side: Side, mets: bool) -> Self {
        let field = if mets {
            "met_y"
        } else {
            match side {
                Side::Left => "left_y",
                Side::Hover => "hover_y",
                Side::Right => "y",
            }
        };
        Self::with_entries(
            GeomKind::Hist,
            vec![MappingEntry {
                role: Role::Y,
                field: field.to_string(),
                policy: TypePolicy::Distribution,
            }],
        )
    }

    /// Kernel-density curves; same placement flags as [`Geom::hist`].
    pub fn kde(side: Side, mets: bool) -> Self {
        let field = if mets {
            "kde_met_y"
        } else {
            match side {
                Side::Left => "kde_left_y",
                Side::Hover => "kde_hover_y",
                Side::Right => "kde_y",
            }
        };
        Self::with_entries(
            GeomKind::Kde,
            vec![MappingEntry {
                role: Role::Y,
                field: field.to_string(),
                policy: TypePolicy::Distribution,
            }],
        )
    }

    /// Reaction arrows: continuous color and size.
    pub fn arrow() -> Self {
        Self::with_entries(
            GeomKind::Arrow,
            vec![
                MappingEntry {
                    role: Role::Color,
                    field: "colors".to_string(),
                    policy: TypePolicy::ScalarCoercible,
                },
                MappingEntry {
                    role: Role::Size,
                    field: "sizes".to_string(),
                    policy: TypePolicy::ScalarCoercible,
                },
            ],
        )
    }

    /// Metabolite circles: continuous color and size.
    pub fn metabolite() -> Self {
        Self::with_entries(
            GeomKind::Metabolite,
            vec![
                MappingEntry {
                    role: Role::Color,
                    field: "met_colors".to_string(),
                    policy: TypePolicy::ScalarCoercible,
                },
                MappingEntry {
                    role: Role::Size,
                    field: "met_sizes".to_string(),
                    policy: TypePolicy::ScalarCoercible,
                },
            ],
        )
    }

    /// Column plots at the sides of reactions. `y` is the bar height; `ymin`
    /// and `ymax` are optional error bounds.
    pub fn column(side: Side) -> Self {
        let prefix = match side {
            Side::Left => "left_",
            _ => "",
        };
        let entries = [Role::Y, Role::Ymin, Role::Ymax]
            .into_iter()
            .map(|role| MappingEntry {
                field: format!("{}column_{}", prefix, role),
                role,
                policy: TypePolicy::ScalarCoercible,
            })
            .collect();
        Self::with_entries(GeomKind::Column, entries)
    }

    /// Stacked colored boxes. `color` is continuous per box; `stack` labels
    /// control horizontal stacking for the same reaction and condition.
    pub fn box_point(side: Side) -> Self {
        let (y_field, variant_field) = match side {
            Side::Left => ("box_left_y", "box_left_variant"),
            _ => ("box_y", "box_variant"),
        };
        Self::with_entries(
            GeomKind::BoxPoint,
            vec![
                MappingEntry {
                    role: Role::Color,
                    field: y_field.to_string(),
                    policy: TypePolicy::Distribution,
                },
                MappingEntry {
                    role: Role::Stack,
                    field: variant_field.to_string(),
                    policy: TypePolicy::CategoricalPassthrough,
                },
            ],
        )
    }

    fn with_entries(kind: GeomKind, mapping: Vec<MappingEntry>) -> Self {
        Self {
            kind,
            mapping,
            data: None,
            aes: None,
        }
    }

    pub fn kind(&self) -> GeomKind {
        self.kind
    }

    /// Bind a pre-aggregated dataframe; resolution will use it instead of the
    /// plot's grouped table.
    pub fn with_data(mut self, data: DataFrame) -> Self {
        self.data = Some(data);
        self
    }

    /// Bind an aesthetic; resolution will use it instead of the plot's.
    ///
    /// Fails with a configuration error when the aesthetic maps a role this
    /// geometry does not support (reaction and metabolite are always allowed:
    /// they select entities rather than map data).
    pub fn with_aes(mut self, aes: Aes) -> Result<Self> {
        self.validate(&aes)?;
        self.aes = Some(aes);
        Ok(self)
    }

    fn validate(&self, aes: &Aes) -> Result<()> {
        for (role, _) in aes.roles() {
            if matches!(role, Role::Reaction | Role::Metabolite) {
                continue;
            }
            if !self.mapping.iter().any(|entry| entry.role == role) {
                return Err(GgmetError::ConfigError(format!(
                    "aesthetic role '{}' is incompatible with the {} geometry; supported: {}",
                    role,
                    self.kind,
                    self.supported_roles()
                )));
            }
        }
        Ok(())
    }

    fn supported_roles(&self) -> String {
        self.mapping
            .iter()
            .map(|entry| entry.role.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn data(&self) -> Option<&DataFrame> {
        self.data.as_ref()
    }

    pub fn aes(&self) -> Option<&Aes> {
        self.aes.as_ref()
    }

    /// Which grouping this geometry targets. A static property of the mapping
    /// table, decided by the metabolite marker in the output-field names.
    pub fn is_metabolite_scoped(&self) -> bool {
        self.mapping
            .iter()
            .any(|entry| naming::is_metabolite_field(&entry.field))
    }

    /// Extract and type-check the mapped columns from the effective table.
    ///
    /// The effective table is the geometry's bound dataframe if present, else
    /// `table`; likewise for the aesthetic. Each role present in both the
    /// mapping and the effective aesthetic contributes one output column.
    pub fn resolve(
        &self,
        table: Option<&DataFrame>,
        aes: &Aes,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<(String, Series)>> {
        let table = self.data.as_ref().or(table).ok_or_else(|| {
            GgmetError::ConfigError(format!(
                "no table available for the {} geometry; the plot never established its {} grouping",
                self.kind,
                if self.is_metabolite_scoped() { "metabolite" } else { "reaction" },
            ))
        })?;
        let aes = self.aes.as_ref().unwrap_or(aes);

        if !self.mapping.iter().any(|entry| aes.contains(entry.role)) {
            return Err(GgmetError::ConfigError(format!(
                "the {} geometry requires at least one of its roles ({}) in the aesthetic",
                self.kind,
                self.supported_roles()
            )));
        }

        let mut resolved = Vec::new();
        for entry in &self.mapping {
            let Some(column) = aes.get(entry.role) else {
                continue;
            };
            let series = table
                .column(column)
                .map_err(|e| {
                    GgmetError::DataError(format!(
                        "column '{}' mapped to role '{}' is missing: {}",
                        column, entry.role, e
                    ))
                })?
                .as_materialized_series()
                .clone();
            let series = apply_policy(entry, series, diagnostics)?;
            resolved.push((entry.field.clone(), series));
        }
        Ok(resolved)
    }
}

// ============================================================================
// Type policies
// ============================================================================

fn apply_policy(
    entry: &MappingEntry,
    series: Series,
    diagnostics: &mut Diagnostics,
) -> Result<Series> {
    match entry.policy {
        TypePolicy::Distribution => match series.dtype() {
            DataType::List(inner) if is_numeric_dtype(inner) => Ok(series),
            DataType::List(inner) => Err(GgmetError::TypeError(format!(
                "field '{}' expects lists of numbers, found lists of {}",
                entry.field, inner
            ))),
            other => Err(GgmetError::TypeError(format!(
                "field '{}' expects list-valued cells (one distribution per row), found {}",
                entry.field, other
            ))),
        },
        TypePolicy::ScalarCoercible => {
            let series = if let DataType::List(inner) = series.dtype() {
                if !is_numeric_dtype(inner) {
                    return Err(GgmetError::TypeError(format!(
                        "field '{}' expects numeric cells, found lists of {}",
                        entry.field, inner
                    )));
                }
                diagnostics.record(Diagnostic::DistributionCoerced {
                    field: entry.field.clone(),
                });
                mean_per_row(&series)?
            } else {
                series
            };
            if is_numeric_dtype(series.dtype()) {
                Ok(series)
            } else {
                Err(GgmetError::TypeError(format!(
                    "field '{}' expects numeric cells, found {}",
                    entry.field,
                    series.dtype()
                )))
            }
        }
        TypePolicy::CategoricalPassthrough => {
            let target = match series.dtype() {
                DataType::List(_) => DataType::List(Box::new(DataType::String)),
                _ => DataType::String,
            };
            if series.dtype() == &target {
                Ok(series)
            } else {
                series.cast(&target).map_err(|e| {
                    GgmetError::TypeError(format!(
                        "could not coerce stack labels for field '{}' to strings: {}",
                        entry.field, e
                    ))
                })
            }
        }
    }
}

fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Collapse a list column to per-row arithmetic means. A row whose list
/// contains any missing element collapses to missing (NaN-propagating mean).
fn mean_per_row(series: &Series) -> Result<Series> {
    let lists = series.list().map_err(|e| {
        GgmetError::DataError(format!("expected a list column for mean coercion: {}", e))
    })?;
    let means: Vec<Option<f64>> = lists
        .into_iter()
        .map(|cell| {
            cell.and_then(|values| {
                if values.null_count() > 0 {
                    None
                } else {
                    values.mean()
                }
            })
        })
        .collect();
    Ok(Float64Chunked::from_iter_options(series.name().clone(), means.into_iter()).into_series())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grouped_like_df() -> DataFrame {
        // shaped like a grouped table: identity column plus list columns
        let flux = Series::new(
            "flux".into(),
            [
                Series::new("".into(), [1.0f64, 2.0]),
                Series::new("".into(), [3.0f64]),
            ],
        );
        let labels = Series::new(
            "iso".into(),
            [
                Series::new("".into(), ["p1", "p2"]),
                Series::new("".into(), ["p1"]),
            ],
        );
        DataFrame::new(vec![
            Series::new("r".into(), ["a", "b"]).into(),
            flux.into(),
            labels.into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_hist_field_table() {
        let cases = [
            (Side::Right, false, "y"),
            (Side::Left, false, "left_y"),
            (Side::Hover, false, "hover_y"),
            (Side::Right, true, "met_y"),
        ];
        for (side, mets, expected) in cases {
            let geom = Geom::hist(side, mets);
            assert_eq!(geom.mapping[0].field, expected);
        }
        assert_eq!(Geom::kde(Side::Hover, false).mapping[0].field, "kde_hover_y");
        assert_eq!(Geom::kde(Side::Left, true).mapping[0].field, "kde_met_y");
    }

    #[test]
    fn test_column_field_table() {
        let left = Geom::column(Side::Left);
        let fields: Vec<&str> = left.mapping.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["left_column_y", "left_column_ymin", "left_column_ymax"]);
        let right = Geom::column(Side::Right);
        assert_eq!(right.mapping[0].field, "column_y");
    }

    #[test]
    fn test_scope_is_a_static_property() {
        assert!(Geom::metabolite().is_metabolite_scoped());
        assert!(Geom::hist(Side::Right, true).is_metabolite_scoped());
        assert!(!Geom::hist(Side::Left, false).is_metabolite_scoped());
        assert!(!Geom::arrow().is_metabolite_scoped());
        assert!(!Geom::box_point(Side::Right).is_metabolite_scoped());
    }

    #[test]
    fn test_with_aes_rejects_unsupported_role() {
        let err = Geom::metabolite()
            .with_aes(Aes::new().color("conc").condition("cond"))
            .unwrap_err();
        assert!(matches!(err, GgmetError::ConfigError(_)));
    }

    #[test]
    fn test_with_aes_allows_entity_roles() {
        // reaction/metabolite select entities, they are always accepted
        assert!(Geom::metabolite()
            .with_aes(Aes::new().color("conc").metabolite("m"))
            .is_ok());
        assert!(Geom::arrow().with_aes(Aes::new().reaction("r").size("flux")).is_ok());
    }

    #[test]
    fn test_resolve_requires_overlapping_role() {
        let mut diagnostics = Diagnostics::new();
        let df = grouped_like_df();
        let err = Geom::hist(Side::Right, false)
            .resolve(Some(&df), &Aes::new().reaction("r"), &mut diagnostics)
            .unwrap_err();
        assert!(matches!(err, GgmetError::ConfigError(_)));
    }

    #[test]
    fn test_resolve_key_set_matches_mapped_roles() {
        let mut diagnostics = Diagnostics::new();
        let df = grouped_like_df();
        let resolved = Geom::arrow()
            .resolve(Some(&df), &Aes::new().reaction("r").color("flux"), &mut diagnostics)
            .unwrap();
        let fields: Vec<&str> = resolved.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(fields, vec!["colors"]); // size not mapped, so no "sizes"
    }

    #[test]
    fn test_distribution_rejects_non_list_column() {
        let mut diagnostics = Diagnostics::new();
        let df = df!("r" => ["a", "b"], "kcat" => [1.0, 2.0]).unwrap();
        let err = Geom::hist(Side::Right, false)
            .resolve(Some(&df), &Aes::new().y("kcat"), &mut diagnostics)
            .unwrap_err();
        assert!(matches!(err, GgmetError::TypeError(_)));
    }

    #[test]
    fn test_distribution_rejects_non_numeric_lists() {
        let mut diagnostics = Diagnostics::new();
        let df = grouped_like_df();
        let err = Geom::hist(Side::Right, false)
            .resolve(Some(&df), &Aes::new().y("iso"), &mut diagnostics)
            .unwrap_err();
        assert!(matches!(err, GgmetError::TypeError(_)));
    }

    #[test]
    fn test_scalar_coerces_lists_to_means() {
        let mut diagnostics = Diagnostics::new();
        let df = grouped_like_df();
        let resolved = Geom::arrow()
            .resolve(Some(&df), &Aes::new().color("flux"), &mut diagnostics)
            .unwrap();
        let (_, series) = &resolved[0];
        let means = series.f64().unwrap();
        assert_eq!(means.get(0), Some(1.5));
        assert_eq!(means.get(1), Some(3.0));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_scalar_rejects_string_column() {
        let mut diagnostics = Diagnostics::new();
        let df = df!("r" => ["a", "b"], "label" => ["x", "y"]).unwrap();
        let err = Geom::arrow()
            .resolve(Some(&df), &Aes::new().color("label"), &mut diagnostics)
            .unwrap_err();
        assert!(matches!(err, GgmetError::TypeError(_)));
    }

    #[test]
    fn test_box_point_stack_labels_pass_through_as_strings() {
        let mut diagnostics = Diagnostics::new();
        let df = grouped_like_df();
        let resolved = Geom::box_point(Side::Right)
            .resolve(Some(&df), &Aes::new().color("flux").stack("iso"), &mut diagnostics)
            .unwrap();
        let fields: Vec<&str> = resolved.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(fields, vec!["box_y", "box_variant"]);
        let (_, variants) = &resolved[1];
        assert!(matches!(variants.dtype(), DataType::List(inner) if **inner == DataType::String));
    }

    #[test]
    fn test_box_point_stack_numbers_are_coerced_to_strings() {
        let mut diagnostics = Diagnostics::new();
        let df = df!("iso" => [1i64, 2]).unwrap();
        let resolved = Geom::box_point(Side::Left)
            .resolve(Some(&df), &Aes::new().stack("iso"), &mut diagnostics)
            .unwrap();
        let (field, series) = &resolved[0];
        assert_eq!(field, "box_left_variant");
        assert_eq!(series.dtype(), &DataType::String);
    }

    #[test]
    fn test_bound_table_overrides_caller_table() {
        let mut diagnostics = Diagnostics::new();
        let bound = df!("conc" => [4.0, 10.0]).unwrap();
        let resolved = Geom::metabolite()
            .with_data(bound)
            .resolve(None, &Aes::new().color("conc"), &mut diagnostics)
            .unwrap();
        let (_, series) = &resolved[0];
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_resolve_without_any_table_is_config_error() {
        let mut diagnostics = Diagnostics::new();
        let err = Geom::metabolite()
            .resolve(None, &Aes::new().color("conc"), &mut diagnostics)
            .unwrap_err();
        assert!(matches!(err, GgmetError::ConfigError(_)));
    }
}
