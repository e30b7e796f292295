//! Change-log scanners: latest resolution, latest priority change, reopens.
//!
//! Scanners never trust storage order; they re-derive newest-first order
//! from timestamps. Events sharing a timestamp keep their log position, the
//! later entry counting as newer.

use crate::config::{Config, Project};
use crate::types::ChangeEvent;

/// Change log ordered newest-first.
pub fn newest_first(change_log: &[ChangeEvent]) -> Vec<&ChangeEvent> {
  let mut indexed: Vec<(usize, &ChangeEvent)> = change_log.iter().enumerate().collect();
  indexed.sort_by(|(i, a), (j, b)| b.timestamp.cmp(&a.timestamp).then(j.cmp(i)));
  indexed.into_iter().map(|(_, e)| e).collect()
}

fn is_field(event: &ChangeEvent, field: &str) -> bool {
  event.field == field
}

/// Latest event setting the resolution to an accepted value.
pub fn resolution_event<'a>(
  change_log: &'a [ChangeEvent],
  project: &Project,
  config: &Config,
) -> Option<&'a ChangeEvent> {
  newest_first(change_log).into_iter().find(|e| {
    is_field(e, &config.resolution_field)
      && e
        .to_value
        .as_deref()
        .is_some_and(|v| project.accepts_resolution(v))
  })
}

/// Latest priority change, whatever its direction.
pub fn priority_event<'a>(change_log: &'a [ChangeEvent], config: &Config) -> Option<&'a ChangeEvent> {
  newest_first(change_log)
    .into_iter()
    .find(|e| is_field(e, &config.priority_field))
}

pub fn priority_change_count(change_log: &[ChangeEvent], config: &Config) -> u32 {
  change_log
    .iter()
    .filter(|e| is_field(e, &config.priority_field))
    .count() as u32
}

/// Every transition into the reopened status, not just the latest.
pub fn reopen_count(change_log: &[ChangeEvent], config: &Config) -> u32 {
  change_log
    .iter()
    .filter(|e| is_field(e, &config.status_field) && e.to_value.as_deref() == Some(config.reopened_status.as_str()))
    .count() as u32
}
