//! Earliest-release selection across an issue's fixing commits.

use std::collections::HashSet;

use crate::sequence::chronological;
use crate::types::Release;

/// Pick the earliest release from the union of per-commit tag sets.
///
/// A fix counts as released once any tag contains at least one of its
/// commits, so this takes the union, not the intersection. Undated tags
/// cannot be ordered and are skipped; if nothing dated remains the result is
/// `None`. Equal dates fall back to lexical name order.
pub fn earliest(tags_per_commit: &[Vec<Release>]) -> Option<Release> {
  let mut seen = HashSet::new();
  tags_per_commit
    .iter()
    .flatten()
    .filter(|r| r.date.is_some())
    .filter(|r| seen.insert(r.identity()))
    .min_by(|a, b| chronological(a, b))
    .cloned()
}

/// Earliest and latest of a version set (affected or fix versions).
///
/// Dated versions take precedence; an all-undated set falls back to name
/// order so the names are still reported.
pub fn first_last(versions: &[Release]) -> (Option<&Release>, Option<&Release>) {
  let mut sorted: Vec<&Release> = versions.iter().collect();
  sorted.sort_by(|a, b| chronological(a, b));

  let dated: Vec<&Release> = sorted.iter().copied().filter(|r| r.date.is_some()).collect();
  if dated.is_empty() {
    (sorted.first().copied(), sorted.last().copied())
  } else {
    (dated.first().copied(), dated.last().copied())
  }
}
