//! Typed diagnostic events.
//!
//! Non-fatal conditions during composition are recorded as values on the
//! owning [`PlotData`](crate::PlotData) instead of being written to a global
//! logger, so callers and tests can observe exactly which warnings a
//! composition produced.

use crate::aes::Role;

/// A non-fatal condition observed during composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Reaction or metabolite identity was re-specified; entity identity has
    /// to be unique across the whole map, so the old value is overwritten.
    AestheticOverwritten { role: Role },

    /// A list-valued column fed to a scalar geometry was collapsed to per-row
    /// arithmetic means.
    DistributionCoerced { field: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::AestheticOverwritten { role } => write!(
                f,
                "overwriting {role} aesthetics; {role} identity has to be unique in the map"
            ),
            Diagnostic::DistributionCoerced { field } => {
                write!(f, "distribution data coerced to means for field '{field}'")
            }
        }
    }
}

/// An ordered collection of diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    events: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: Diagnostic) {
        self.events.push(event);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Append all events from another collection, preserving order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.events.extend(other.events);
    }
}
