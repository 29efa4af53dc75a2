//! The composition engine: grouping, geometry composition, and merging.
//!
//! [`PlotData`] binds a tidy source dataframe to a governing aesthetic. At
//! construction it derives up to two grouped tables (one row per reaction or
//! metabolite, optionally crossed with condition, every other column imploded
//! into an ordered list) and seeds the output map with the identity fields.
//! Each composed geometry resolves against the grouped table its mapping
//! targets and merges its output fields in, overwriting by key.
//!
//! Composition is atomic: all fallible work for one geometry is staged and
//! committed only on success, so a failed compose leaves the output map
//! untouched.
//!
//! # Example
//!
//! ```rust,ignore
//! use ggmet::{Aes, Geom, PlotData};
//! use polars::prelude::*;
//!
//! let df = df!("r" => ["PFK", "ENO"], "flux" => [2.0, 4.0])?;
//! let plot = (PlotData::new(df, Aes::new().reaction("r").color("flux"))? + Geom::arrow())?;
//! let doc = plot.to_document()?;
//! ```

use crate::aes::{Aes, Role};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::geom::Geom;
use crate::writer::{self, OutputDocument};
use crate::{naming, GgmetError, Result};
use polars::prelude::*;
use std::collections::HashMap;

/// The accumulating plot state: source data, grouped tables, output map.
#[derive(Debug, Clone)]
pub struct PlotData {
    df: DataFrame,
    aes: Aes,
    df_reac: Option<DataFrame>,
    df_met: Option<DataFrame>,
    plotting_data: HashMap<String, Series>,
    diagnostics: Diagnostics,
}

impl PlotData {
    /// Bind a tidy dataframe to an aesthetic.
    ///
    /// When the reaction role is mapped, the source is grouped on the
    /// reaction column (and the condition column, when mapped) and the
    /// `reactions`/`conditions` identity fields are seeded from the grouping
    /// keys. Symmetrically for the metabolite role.
    pub fn new(df: DataFrame, aes: Aes) -> Result<Self> {
        let mut plot = Self {
            df,
            aes,
            df_reac: None,
            df_met: None,
            plotting_data: HashMap::new(),
            diagnostics: Diagnostics::new(),
        };

        if plot.aes.contains(Role::Reaction) {
            let keys = plot.grouping_keys(Role::Reaction);
            let grouped = group_into_lists(&plot.df, &keys)?;
            plot.plotting_data
                .insert(naming::REACTIONS.to_string(), column_of(&grouped, &keys[0])?);
            if let Some(condition) = keys.get(1) {
                plot.plotting_data
                    .insert(naming::CONDITIONS.to_string(), column_of(&grouped, condition)?);
            }
            plot.df_reac = Some(grouped);
        }
        if plot.aes.contains(Role::Metabolite) {
            let keys = plot.grouping_keys(Role::Metabolite);
            let grouped = group_into_lists(&plot.df, &keys)?;
            plot.plotting_data
                .insert(naming::METABOLITES.to_string(), column_of(&grouped, &keys[0])?);
            if let Some(condition) = keys.get(1) {
                plot.plotting_data.insert(
                    naming::MET_CONDITIONS.to_string(),
                    column_of(&grouped, condition)?,
                );
            }
            plot.df_met = Some(grouped);
        }
        Ok(plot)
    }

    fn grouping_keys(&self, entity: Role) -> Vec<String> {
        [entity, Role::Condition]
            .into_iter()
            .filter_map(|role| self.aes.get(role).map(str::to_string))
            .collect()
    }

    /// Compose a geometry into the plot.
    ///
    /// The target scope is decided by the geometry's mapping table. All
    /// staged output entries (including identity fields refreshed by a
    /// geometry-borne entity aesthetic) are committed only after the geometry
    /// resolves successfully.
    pub fn add_geom(&mut self, geom: &Geom) -> Result<()> {
        if geom.is_metabolite_scoped() {
            self.compose_metabolite(geom)
        } else {
            self.compose_reaction(geom)
        }
    }

    fn compose_metabolite(&mut self, geom: &Geom) -> Result<()> {
        let mut staged: Vec<(String, Series)> = Vec::new();
        let mut regrouped: Option<DataFrame> = None;

        if let Some(geom_aes) = geom.aes() {
            if let Some(met_column) = geom_aes.get(Role::Metabolite) {
                if self.aes.contains(Role::Metabolite) {
                    self.diagnostics.record(Diagnostic::AestheticOverwritten {
                        role: Role::Metabolite,
                    });
                }
                if let Some(bound) = geom.data() {
                    // the geometry's own table is assumed pre-aggregated
                    staged.push((naming::METABOLITES.to_string(), column_of(bound, met_column)?));
                } else {
                    // a geometry introduced later establishes the metabolite
                    // grouping over the shared source table; condition falls
                    // back from the geometry's aesthetic to the plot's
                    let mut keys = vec![met_column.to_string()];
                    if let Some(condition) = geom_aes
                        .get(Role::Condition)
                        .or_else(|| self.aes.get(Role::Condition))
                    {
                        keys.push(condition.to_string());
                    }
                    let grouped = group_into_lists(&self.df, &keys)?;
                    staged.push((naming::METABOLITES.to_string(), column_of(&grouped, &keys[0])?));
                    if let Some(condition) = keys.get(1) {
                        staged.push((
                            naming::MET_CONDITIONS.to_string(),
                            column_of(&grouped, condition)?,
                        ));
                    }
                    regrouped = Some(grouped);
                }
            }
        }

        let table = regrouped.as_ref().or(self.df_met.as_ref());
        let resolved = geom.resolve(table, &self.aes, &mut self.diagnostics)?;

        if let Some(grouped) = regrouped {
            self.df_met = Some(grouped);
        }
        self.commit(staged, resolved);
        Ok(())
    }

    fn compose_reaction(&mut self, geom: &Geom) -> Result<()> {
        let mut staged: Vec<(String, Series)> = Vec::new();

        if let Some(geom_aes) = geom.aes() {
            if let Some(reac_column) = geom_aes.get(Role::Reaction) {
                if self.aes.contains(Role::Reaction) {
                    self.diagnostics.record(Diagnostic::AestheticOverwritten {
                        role: Role::Reaction,
                    });
                }
                if let Some(bound) = geom.data() {
                    staged.push((naming::REACTIONS.to_string(), column_of(bound, reac_column)?));
                } else {
                    let grouped = self.df_reac.as_ref().ok_or_else(|| {
                        GgmetError::ConfigError(
                            "a geometry re-specified the reaction aesthetic but the plot never \
                             established its reaction grouping"
                                .to_string(),
                        )
                    })?;
                    let own_column = self.aes.get(Role::Reaction).ok_or_else(|| {
                        GgmetError::ConfigError(
                            "cannot refresh reaction identity: the plot aesthetic does not map \
                             the reaction role"
                                .to_string(),
                        )
                    })?;
                    staged.push((naming::REACTIONS.to_string(), column_of(grouped, own_column)?));
                }
            }
        }

        let resolved = geom.resolve(self.df_reac.as_ref(), &self.aes, &mut self.diagnostics)?;
        self.commit(staged, resolved);
        Ok(())
    }

    fn commit(&mut self, staged: Vec<(String, Series)>, resolved: Vec<(String, Series)>) {
        for (field, series) in staged.into_iter().chain(resolved) {
            self.plotting_data.insert(field, series);
        }
    }

    /// Union another plot's output map into this one, overwriting on key
    /// collision. Row counts stay independent per scope; no cross-scope
    /// validation is performed.
    pub fn merge(mut self, other: PlotData) -> PlotData {
        self.plotting_data.extend(other.plotting_data);
        self.diagnostics.extend(other.diagnostics);
        self
    }

    /// The accumulated output map.
    pub fn output(&self) -> &HashMap<String, Series> {
        &self.plotting_data
    }

    /// Diagnostics recorded so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Sanitize the output map into a JSON-ready document.
    pub fn to_document(&self) -> Result<OutputDocument> {
        writer::document_from(&self.plotting_data)
    }
}

/// `plot + geom` composes a geometry, propagating composition errors.
impl std::ops::Add<Geom> for PlotData {
    type Output = Result<PlotData>;

    fn add(mut self, geom: Geom) -> Result<PlotData> {
        self.add_geom(&geom)?;
        Ok(self)
    }
}

/// `plot / plot` combines two independently built plots into one export.
impl std::ops::Div for PlotData {
    type Output = PlotData;

    fn div(self, other: PlotData) -> PlotData {
        self.merge(other)
    }
}

// ============================================================================
// Grouping helpers
// ============================================================================

/// Group `df` on `keys`, imploding every other column into an ordered list.
///
/// Rows with a missing value in any key column are excluded; groups are
/// emitted sorted by key, one row per distinct key combination.
fn group_into_lists(df: &DataFrame, keys: &[String]) -> Result<DataFrame> {
    let mut lf = df.clone().lazy();
    for key in keys {
        lf = lf.filter(col(key.as_str()).is_not_null());
    }
    let key_exprs: Vec<Expr> = keys.iter().map(|key| col(key.as_str())).collect();
    lf.group_by_stable(&key_exprs)
        .agg([col("*")])
        .sort_by_exprs(&key_exprs, SortMultipleOptions::default())
        .collect()
        .map_err(|e| {
            GgmetError::DataError(format!("failed to group by [{}]: {}", keys.join(", "), e))
        })
}

fn column_of(df: &DataFrame, name: &str) -> Result<Series> {
    Ok(df
        .column(name)
        .map_err(|e| GgmetError::DataError(format!("missing column '{}': {}", name, e)))?
        .as_materialized_series()
        .clone())
}
