//! Fix-distance correlation engine.
//!
//! Correlates issue-tracker records with version-control history to
//! estimate how many days, and how many releases, elapsed between a defect
//! being reported and its fix being released. Tracker and vcs distances are
//! computed independently and reconciled under a fixed trust policy.
//!
//! No network, no DB; a pure transform over a read-only snapshot.

pub mod batch;
pub mod classify;
pub mod config;
pub mod distance;
pub mod earliest;
pub mod error;
pub mod history;
pub mod metrics;
pub mod resolve;
pub mod sequence;
pub mod store;
pub mod types;

pub use batch::{run_batch, run_batch_parallel, BatchFailure, BatchOutcome};
pub use config::{Catalog, Config, Project, ProjectConfig};
pub use error::EngineError;
pub use metrics::{compute_issue_metrics, ProjectContext};
pub use store::{MemoryStore, RejectedIssue, Snapshot};
pub use types::{Issue, MetricsRecord, Release, Source};
