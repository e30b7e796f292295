//! Commit-to-tag resolution: which classified releases contain a commit.
//!
//! Containment itself is established at ingestion; this only filters the
//! pre-linked tag set through the project's classifier.

use crate::config::Project;
use crate::sequence::chronological;
use crate::store::CommitTagStore;
use crate::types::{Commit, Release};

/// Classified releases known to contain `commit`, in chronological order.
pub fn tags_for_commit<S: CommitTagStore + ?Sized>(
  store: &S,
  project: &Project,
  commit: &Commit,
) -> Vec<Release> {
  let mut tags: Vec<Release> = store
    .tags_for_commit(project.id(), &commit.repository, &commit.sha)
    .into_iter()
    .filter(|t| project.classifies(t))
    .collect();
  tags.sort_by(chronological);
  tags.dedup_by(|a, b| a.identity() == b.identity());
  tags
}

/// One classified tag set per commit, aligned with `commits`.
pub fn tags_per_commit<S: CommitTagStore + ?Sized>(
  store: &S,
  project: &Project,
  commits: &[Commit],
) -> Vec<Vec<Release>> {
  commits
    .iter()
    .map(|c| tags_for_commit(store, project, c))
    .collect()
}
