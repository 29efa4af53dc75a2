/*!
# ggmet - Grammar of Metabolic Maps

A declarative data-mapping layer that turns a tidy [`DataFrame`] into the JSON
payload consumed by an external metabolic-map viewer.

Users describe an aesthetic mapping from dataframe columns to semantic roles
(reaction, metabolite, condition, color, ...), attach geometries that translate
those roles into concrete output-field names, and compose several such mappings
into one export. ggmet prepares structured data for the renderer; it never
draws anything itself.

## Example

```rust,ignore
use ggmet::{Aes, Geom, PlotData};
use polars::prelude::*;

let df = df!("reaction" => ["PFK", "ENO"], "flux" => [2.0, 4.0])?;
let doc = (PlotData::new(df, Aes::new().reaction("reaction").color("flux"))?
    + Geom::arrow())?
    .to_document()?;
doc.write("shu_data")?; // writes shu_data.metabolism.json
```

## Architecture

- [`aes`] - the closed set of aesthetic roles and the `Aes` record
- [`geom`] - geometry variants: role → output-field tables plus type policies
- [`plot`] - the composition engine grouping rows and merging geometry output
- [`writer`] - JSON sanitization (missing-value sentinels) and file export
- [`viewer`] - the thin boundary towards a running external viewer
- [`diagnostics`] - typed, inspectable warnings instead of a global logger
*/

pub mod aes;
pub mod diagnostics;
pub mod geom;
pub mod naming;
pub mod plot;
pub mod viewer;
pub mod writer;

// Re-export key types for convenience
pub use aes::{Aes, Role};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use geom::{Geom, Side, TypePolicy};
pub use plot::PlotData;
pub use viewer::{DisplayChannel, Viewer, ViewerEvent};
pub use writer::OutputDocument;

// DataFrame abstraction (wraps Polars)
pub use polars::prelude::DataFrame;

/// Main library error type
#[derive(thiserror::Error, Debug)]
pub enum GgmetError {
    /// A usage mistake: unsupported role for a geometry, no overlapping role
    /// between geometry and aesthetic, or composing against a scope that was
    /// never established. Never retried.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A column's cell shape or element type violates a geometry's type policy.
    #[error("Type error: {0}")]
    TypeError(String),

    /// A dataframe-level failure (missing column, grouping or cast failure).
    #[error("Data error: {0}")]
    DataError(String),

    /// Viewer adapter misuse, e.g. pushing data before a channel exists.
    #[error("Viewer error: {0}")]
    ViewerError(String),

    /// File export failure.
    #[error("Export error: {0}")]
    IoError(String),
}

pub type Result<T> = std::result::Result<T, GgmetError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
