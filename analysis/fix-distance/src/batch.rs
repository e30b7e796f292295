//! Batch driver: walks every issue of every project.
//!
//! One issue failing never blocks the rest; the failure is logged, recorded
//! and the batch moves on. Project timelines are loaded once per project and
//! shared read-only, so the parallel variant needs no locking.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{Config, Project};
use crate::metrics::ProjectContext;
use crate::store::{RejectedIssue, Store};
use crate::types::{ErrorOutput, MetricsRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
  pub project_id: String,
  pub issue_key: String,
  pub message: String,
}

impl From<&BatchFailure> for ErrorOutput {
  fn from(f: &BatchFailure) -> Self {
    ErrorOutput::new(f.message.clone()).with_issue(f.project_id.clone(), f.issue_key.clone())
  }
}

impl From<RejectedIssue> for BatchFailure {
  fn from(r: RejectedIssue) -> Self {
    BatchFailure {
      project_id: r.project_id,
      issue_key: r.issue_key,
      message: r.reason,
    }
  }
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
  pub records: Vec<MetricsRecord>,
  pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
  /// Starts with the issue rows the store could not ingest.
  fn for_store<S: Store + ?Sized>(store: &S) -> Self {
    BatchOutcome {
      records: Vec::new(),
      failures: store.rejected_issues().into_iter().map(BatchFailure::from).collect(),
    }
  }

  fn push(&mut self, result: Result<MetricsRecord, BatchFailure>) {
    match result {
      Ok(record) => self.records.push(record),
      Err(failure) => self.failures.push(failure),
    }
  }
}

fn process_issue<S: Store + ?Sized>(
  ctx: &ProjectContext<'_, S>,
  store: &S,
  key: &str,
) -> Result<MetricsRecord, BatchFailure> {
  let project_id = ctx.project().id();
  let fail = |reason: String| {
    warn!(project_id, issue_key = key, %reason, "issue skipped");
    BatchFailure {
      project_id: project_id.to_string(),
      issue_key: key.to_string(),
      message: reason,
    }
  };

  let issue = store.issue(key).map_err(|e| fail(e.to_string()))?;
  if issue.project_id != project_id {
    return Err(fail(format!(
      "issue belongs to project {}, not {}",
      issue.project_id, project_id
    )));
  }

  debug!(project_id, issue_key = key, "computing metrics");
  Ok(ctx.compute(&issue))
}

/// Sequential batch, one issue at a time, in project then issue-key order.
pub fn run_batch<S: Store + ?Sized>(store: &S, projects: &[Project], config: &Config) -> BatchOutcome {
  let mut outcome = BatchOutcome::for_store(store);

  for project in projects {
    let ctx = ProjectContext::load(store, project, config);
    let keys = store.issue_keys(project.id());
    info!(
      project_id = project.id(),
      issues = keys.len(),
      tracker_releases = ctx.tracker().releases().len(),
      vcs_releases = ctx.vcs().releases().len(),
      "processing project"
    );

    for key in &keys {
      outcome.push(process_issue(&ctx, store, key));
    }
  }

  info!(
    records = outcome.records.len(),
    failures = outcome.failures.len(),
    "batch finished"
  );
  outcome
}

/// Same output as [`run_batch`], with each project's issues fanned out
/// across the rayon pool.
pub fn run_batch_parallel<S: Store + Sync + ?Sized>(
  store: &S,
  projects: &[Project],
  config: &Config,
) -> BatchOutcome {
  let mut outcome = BatchOutcome::for_store(store);

  for project in projects {
    let ctx = ProjectContext::load(store, project, config);
    let keys = store.issue_keys(project.id());
    info!(project_id = project.id(), issues = keys.len(), "processing project in parallel");

    let results: Vec<_> = keys
      .par_iter()
      .map(|key| process_issue(&ctx, store, key))
      .collect();
    for result in results {
      outcome.push(result);
    }
  }

  info!(
    records = outcome.records.len(),
    failures = outcome.failures.len(),
    "batch finished"
  );
  outcome
}
