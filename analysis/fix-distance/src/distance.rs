//! Signed release distances per source, and the cross-source trust policy.

use tracing::warn;

use crate::sequence::VersionSequencer;
use crate::types::{DistanceUnit, Distances, Release};

/// Signed distance from `one` to `other` within a single source's timeline.
///
/// - `Days`: whole days between the release dates (truncated toward zero).
/// - `Releases`: difference of the two ranks in `timeline`.
///
/// Negative when `other` precedes `one`; argument order is the caller's
/// responsibility. `None` when either release or a needed date is missing,
/// or when a release does not belong to the timeline's project and source.
pub fn distance(
  timeline: &VersionSequencer,
  one: Option<&Release>,
  other: Option<&Release>,
  unit: DistanceUnit,
) -> Option<i64> {
  let (one, other) = (one?, other?);

  for release in [one, other] {
    if release.source != timeline.source() || release.project_id != timeline.project_id() {
      warn!(
        release = %release.name,
        release_source = %release.source,
        timeline_source = %timeline.source(),
        project_id = timeline.project_id(),
        "release does not belong to timeline; distance skipped"
      );
      return None;
    }
  }

  match unit {
    DistanceUnit::Days => Some((other.date? - one.date?).num_days()),
    DistanceUnit::Releases => Some(timeline.rank(other.date)? - timeline.rank(one.date)?),
  }
}

/// Both units at once.
pub fn distances(timeline: &VersionSequencer, one: Option<&Release>, other: Option<&Release>) -> Distances {
  Distances {
    days: distance(timeline, one, other, DistanceUnit::Days),
    releases: distance(timeline, one, other, DistanceUnit::Releases),
  }
}

/// Pick one trusted distance from the tracker- and vcs-derived values.
///
/// Vcs tag dates are ground truth, so a vcs value always wins, zero and
/// negatives included. Tracker release dates are prone to backdating, so a
/// tracker value is only used when non-negative.
pub fn reconcile(tracker: Option<i64>, vcs: Option<i64>) -> Option<i64> {
  match (tracker, vcs) {
    (_, Some(v)) => Some(v),
    (Some(t), None) if t >= 0 => Some(t),
    _ => None,
  }
}

pub fn reconcile_distances(tracker: Distances, vcs: Distances) -> Distances {
  Distances {
    days: reconcile(tracker.days, vcs.days),
    releases: reconcile(tracker.releases, vcs.releases),
  }
}
