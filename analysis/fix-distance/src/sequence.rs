//! Chronological release timelines per (project, source).
//!
//! A timeline holds only classified releases that carry a date. It is built
//! once per batch and never mutated, so it can be shared across workers.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::config::Project;
use crate::store::ReleaseStore;
use crate::types::{Release, Source};

/// Total chronological order: date ascending, undated last, then name,
/// then repository. Equal dates are broken by lexical name.
pub fn chronological(a: &Release, b: &Release) -> Ordering {
  (a.date.is_none(), a.date, &a.name, &a.repository).cmp(&(b.date.is_none(), b.date, &b.name, &b.repository))
}

#[derive(Debug, Clone)]
pub struct VersionSequencer {
  project_id: String,
  source: Source,
  ordered: Vec<Release>,
  dates: Vec<DateTime<Utc>>,
}

impl VersionSequencer {
  pub fn load<S: ReleaseStore + ?Sized>(store: &S, project: &Project, source: Source) -> Self {
    Self::from_releases(project, source, store.releases_for_project(project.id(), source))
  }

  pub fn from_releases(
    project: &Project,
    source: Source,
    releases: impl IntoIterator<Item = Release>,
  ) -> Self {
    let mut ordered: Vec<Release> = releases
      .into_iter()
      .filter(|r| r.source == source && r.date.is_some() && project.classifies(r))
      .collect();
    ordered.sort_by(chronological);
    let dates = ordered.iter().filter_map(|r| r.date).collect();

    Self {
      project_id: project.id().to_string(),
      source,
      ordered,
      dates,
    }
  }

  pub fn project_id(&self) -> &str {
    &self.project_id
  }

  pub fn source(&self) -> Source {
    self.source
  }

  /// Classified, dated releases in chronological order.
  pub fn releases(&self) -> &[Release] {
    &self.ordered
  }

  /// Ordinal position of `date` in the timeline.
  ///
  /// Right-biased: a date equal to existing release dates ranks after all of
  /// them, so releases sharing a date share a rank. `None` in, `None` out.
  pub fn rank(&self, date: Option<DateTime<Utc>>) -> Option<i64> {
    let date = date?;
    Some(self.dates.partition_point(|d| *d <= date) as i64)
  }

  /// First release dated strictly after `date`.
  pub fn closest_after(&self, date: Option<DateTime<Utc>>) -> Option<&Release> {
    let date = date?;
    let idx = self.dates.partition_point(|d| *d <= date);
    self.ordered.get(idx)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ProjectConfig;
  use chrono::TimeZone;
  use proptest::prelude::*;

  fn project() -> Project {
    Project::compile(ProjectConfig {
      project_id: "p".into(),
      project_key: None,
      release_name_pattern: r"^(\d+\.)?(\d+\.)?(\*|\d+)$".into(),
      tracker_release_pattern: None,
      repositories: vec!["core".into()],
      accepted_resolution_values: Default::default(),
    })
    .unwrap()
  }

  fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 3, d, 0, 0, 0).unwrap()
  }

  fn tag(name: &str, date: Option<DateTime<Utc>>) -> Release {
    Release {
      project_id: "p".into(),
      source: Source::Vcs,
      name: name.into(),
      date,
      repository: Some("core".into()),
    }
  }

  fn timeline() -> VersionSequencer {
    VersionSequencer::from_releases(
      &project(),
      Source::Vcs,
      vec![
        tag("1.2", Some(day(20))),
        tag("1.0", Some(day(1))),
        tag("1.1-rc1", Some(day(5))),
        tag("1.1", Some(day(10))),
        tag("1.1.1", Some(day(10))),
        tag("2.0", None),
      ],
    )
  }

  #[test]
  fn unclassified_and_undated_releases_are_dropped() {
    let names: Vec<_> = timeline().releases().iter().map(|r| r.name.clone()).collect();
    assert_eq!(names, vec!["1.0", "1.1", "1.1.1", "1.2"]);
  }

  #[test]
  fn rank_is_right_biased() {
    let t = timeline();
    assert_eq!(t.rank(Some(day(1))), Some(1));
    assert_eq!(t.rank(Some(day(10))), Some(3));
    assert_eq!(t.rank(Some(day(15))), Some(3));
    assert_eq!(t.rank(Some(Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap())), Some(0));
  }

  #[test]
  fn null_date_ranks_null() {
    assert_eq!(timeline().rank(None), None);
  }

  #[test]
  fn equal_dates_share_a_rank() {
    let t = timeline();
    let a = t.releases().iter().find(|r| r.name == "1.1").unwrap();
    let b = t.releases().iter().find(|r| r.name == "1.1.1").unwrap();
    assert_eq!(t.rank(a.date), t.rank(b.date));
  }

  #[test]
  fn closest_after_is_strict() {
    let t = timeline();
    assert_eq!(t.closest_after(Some(day(1))).unwrap().name, "1.1");
    assert_eq!(t.closest_after(Some(day(2))).unwrap().name, "1.1");
    assert!(t.closest_after(Some(day(25))).is_none());
    assert!(t.closest_after(None).is_none());
  }

  #[test]
  fn other_source_releases_are_ignored() {
    let mut tracker = tag("1.5", Some(day(3)));
    tracker.source = Source::Tracker;
    let t = VersionSequencer::from_releases(&project(), Source::Vcs, vec![tracker]);
    assert!(t.releases().is_empty());
    assert_eq!(t.source(), Source::Vcs);
    assert_eq!(t.project_id(), "p");
  }

  proptest! {
    #[test]
    fn rank_is_monotonic_in_date(a in 0i64..40, b in 0i64..40) {
      let t = timeline();
      let base = Utc.with_ymd_and_hms(2020, 2, 20, 0, 0, 0).unwrap();
      let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
      let r_lo = t.rank(Some(base + chrono::Duration::days(lo))).unwrap();
      let r_hi = t.rank(Some(base + chrono::Duration::days(hi))).unwrap();
      prop_assert!(r_lo <= r_hi);
    }
  }
}
