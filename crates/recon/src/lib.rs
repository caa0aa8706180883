//! `skylog-recon`: per-data-part sky-condition reconciliation engine.
//!
//! Pure engine crate: receives parsed run-log events, returns one reconciled
//! sky-condition code per data part. No CLI or IO dependencies.

pub mod assign;
pub mod classify;
pub mod config;
pub mod corrections;
pub mod engine;
pub mod error;
pub mod model;
pub mod sky;
pub mod summary;
pub mod timeline;

pub use config::ReconConfig;
pub use engine::run;
pub use error::ReconError;
pub use model::{AlarmKind, LogEvent, PartRecord, ReconResult, RunSegment};
pub use sky::{CompareMode, SkyCondition};
