//! `meterroute-recon`: period-over-period audit of utility-meter billing routes.
//!
//! Pure engine crate: receives the text of two CSV exports, returns the
//! merged, aggregated and classified result. No CLI or IO dependencies.

pub mod aggregate;
pub mod classify;
pub mod columns;
pub mod config;
pub mod decode;
pub mod divergence;
pub mod engine;
pub mod error;
pub mod lookup;
pub mod merge;
pub mod model;
pub mod narrative;
pub mod natural;
pub mod query;
pub mod recurrence;
pub mod summary;

pub use config::{AuditConfig, DuplicatePolicy};
pub use engine::{analyze, compare, compare_with};
pub use error::AuditError;
pub use model::{
    AnalysisResult, AnomalyTag, DivergenceEntry, DivergenceStatus, EnrichedUnitRecord, MicroGeneration, Period,
    RecurringOccurrence, RouteComparisonRow, RouteUnitSummary, UnitRecord,
};
pub use narrative::{narrate_or_placeholder, NarrativeBrief, Narrator};
pub use query::{GdFilter, SortDirection, UnitQuery, UnitSortKey};
