//! In-memory channel catalog
//!
//! Holds the current channel sequence and a group index derived from it. The
//! index is rebuilt on every replacement, never patched. A generation counter
//! identifies each replacement so that asynchronous probe results issued
//! against an older catalog can be recognised and dropped.

pub mod dedup;

pub use dedup::deduplicate;

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::models::{Channel, ChannelStatus, Program};
use crate::services::stream_prober::{ProbeJob, ProbeReport, ProbeTarget};

/// Channel counts by reachability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlaylistStats {
    pub total: usize,
    pub active: usize,
    pub offline: usize,
    pub unknown: usize,
}

#[derive(Debug, Default)]
pub struct Catalog {
    channels: Vec<Channel>,
    group_index: BTreeMap<String, Vec<usize>>,
    generation: u64,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a whole new channel sequence
    pub fn replace(&mut self, channels: Vec<Channel>) {
        self.channels = channels;
        self.rebuild_index();
        self.generation += 1;
        debug!(
            "Catalog replaced: {} channels in {} groups (generation {})",
            self.channels.len(),
            self.group_index.len(),
            self.generation
        );
    }

    /// Empty the catalog. Favorites live elsewhere and are untouched.
    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn find_by_url(&self, url: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.url == url)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.group_index.keys().map(String::as_str)
    }

    /// Channels of `group` in catalog order
    pub fn group(&self, group: &str) -> Vec<&Channel> {
        self.group_index
            .get(group)
            .map(|indices| indices.iter().map(|&i| &self.channels[i]).collect())
            .unwrap_or_default()
    }

    /// Every group with its channels, groups in name order
    pub fn groups(&self) -> Vec<(&str, Vec<&Channel>)> {
        self.group_index
            .iter()
            .map(|(name, indices)| {
                (
                    name.as_str(),
                    indices.iter().map(|&i| &self.channels[i]).collect(),
                )
            })
            .collect()
    }

    /// Snapshot of what needs probing, stamped with the current generation
    pub fn probe_targets(&self) -> ProbeJob {
        ProbeJob {
            generation: self.generation,
            targets: self
                .channels
                .iter()
                .map(|c| ProbeTarget {
                    url: c.url.clone(),
                    title: c.title.clone(),
                })
                .collect(),
        }
    }

    /// Write probe results onto matching channels
    ///
    /// The whole report is dropped when it was issued against another
    /// generation. Returns whether it was applied.
    pub fn apply_statuses(&mut self, report: &ProbeReport) -> bool {
        if report.generation != self.generation {
            debug!(
                "Discarding probe report for generation {} (current {})",
                report.generation, self.generation
            );
            return false;
        }

        let statuses: HashMap<(&str, &str), ChannelStatus> = report
            .outcomes
            .iter()
            .map(|o| ((o.url.as_str(), o.title.as_str()), o.status))
            .collect();

        for channel in &mut self.channels {
            if let Some(status) = statuses.get(&(channel.url.as_str(), channel.title.as_str())) {
                channel.status = *status;
            }
        }
        true
    }

    /// Put every channel back to `Unknown` and invalidate in-flight probes
    pub fn reset_statuses(&mut self) {
        for channel in &mut self.channels {
            channel.status = ChannelStatus::Unknown;
        }
        self.generation += 1;
    }

    /// Set each channel's programmes to those whose guide channel equals its id
    pub fn attach_programs(&mut self, programs: &[Program]) {
        for channel in &mut self.channels {
            channel.programs = programs
                .iter()
                .filter(|p| p.channel == channel.id)
                .cloned()
                .collect();
        }
    }

    pub fn stats(&self) -> PlaylistStats {
        self.channels
            .iter()
            .fold(
                PlaylistStats {
                    total: self.channels.len(),
                    ..PlaylistStats::default()
                },
                |mut stats, channel| {
                    match channel.status {
                        ChannelStatus::Active => stats.active += 1,
                        ChannelStatus::Offline => stats.offline += 1,
                        ChannelStatus::Unknown => stats.unknown += 1,
                    }
                    stats
                },
            )
    }

    fn rebuild_index(&mut self) {
        self.group_index.clear();
        for (i, channel) in self.channels.iter().enumerate() {
            self.group_index
                .entry(channel.group.clone())
                .or_default()
                .push(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::stream_prober::ProbeOutcome;
    use chrono::{TimeZone, Utc};

    fn channel(title: &str, url: &str, group: &str) -> Channel {
        Channel::new(title, url, "L").with_group(group)
    }

    fn outcome(url: &str, title: &str, status: ChannelStatus) -> ProbeOutcome {
        ProbeOutcome {
            url: url.to_string(),
            title: title.to_string(),
            status,
            error: None,
        }
    }

    #[test]
    fn test_replace_rebuilds_groups() {
        let mut catalog = Catalog::new();
        catalog.replace(vec![
            channel("A", "u1", "News"),
            channel("B", "u2", "Sport"),
            channel("C", "u3", "News"),
        ]);
        assert_eq!(catalog.group_names().collect::<Vec<_>>(), vec!["News", "Sport"]);
        let news: Vec<_> = catalog.group("News").iter().map(|c| c.title.as_str()).collect();
        assert_eq!(news, vec!["A", "C"]);

        catalog.replace(vec![channel("D", "u4", "Kids")]);
        assert_eq!(catalog.group_names().collect::<Vec<_>>(), vec!["Kids"]);
        assert!(catalog.group("News").is_empty());
    }

    #[test]
    fn test_generation_advances() {
        let mut catalog = Catalog::new();
        assert_eq!(catalog.generation(), 0);
        catalog.replace(vec![channel("A", "u1", "G")]);
        assert_eq!(catalog.generation(), 1);
        catalog.clear();
        assert_eq!(catalog.generation(), 2);
        assert!(catalog.is_empty());
        assert!(catalog.groups().is_empty());
    }

    #[test]
    fn test_apply_statuses_for_current_generation() {
        let mut catalog = Catalog::new();
        catalog.replace(vec![channel("A", "u1", "G"), channel("B", "u2", "G")]);
        let job = catalog.probe_targets();
        assert_eq!(job.targets.len(), 2);

        let report = ProbeReport {
            generation: job.generation,
            outcomes: vec![
                outcome("u1", "A", ChannelStatus::Active),
                outcome("u2", "B", ChannelStatus::Offline),
            ],
        };
        assert!(catalog.apply_statuses(&report));
        assert_eq!(
            catalog.stats(),
            PlaylistStats {
                total: 2,
                active: 1,
                offline: 1,
                unknown: 0
            }
        );
    }

    #[test]
    fn test_stale_report_is_discarded() {
        let mut catalog = Catalog::new();
        catalog.replace(vec![channel("A", "u1", "G")]);
        let job = catalog.probe_targets();

        catalog.replace(vec![channel("A", "u1", "G")]);
        let report = ProbeReport {
            generation: job.generation,
            outcomes: vec![outcome("u1", "A", ChannelStatus::Active)],
        };
        assert!(!catalog.apply_statuses(&report));
        assert_eq!(catalog.channels()[0].status, ChannelStatus::Unknown);
    }

    #[test]
    fn test_reset_statuses_invalidates_in_flight_job() {
        let mut catalog = Catalog::new();
        catalog.replace(vec![channel("A", "u1", "G")]);
        let job = catalog.probe_targets();
        catalog.reset_statuses();

        let report = ProbeReport {
            generation: job.generation,
            outcomes: vec![outcome("u1", "A", ChannelStatus::Active)],
        };
        assert!(!catalog.apply_statuses(&report));
        assert_eq!(catalog.stats().unknown, 1);
    }

    #[test]
    fn test_attach_programs_by_id() {
        let mut catalog = Catalog::new();
        catalog.replace(vec![
            channel("A", "u1", "G").with_id("a.tv"),
            channel("B", "u2", "G"),
        ]);
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let program = |id: &str| Program {
            channel: id.to_string(),
            start_time: start,
            end_time: start,
            title: "T".to_string(),
            description: "D".to_string(),
            category: "C".to_string(),
        };
        catalog.attach_programs(&[program("a.tv"), program("other"), program("a.tv")]);
        assert_eq!(catalog.channels()[0].programs.len(), 2);
        assert!(catalog.channels()[1].programs.is_empty());
    }

    #[test]
    fn test_find_by_url() {
        let mut catalog = Catalog::new();
        catalog.replace(vec![channel("A", "u1", "G")]);
        assert_eq!(catalog.find_by_url("u1").map(|c| c.title.as_str()), Some("A"));
        assert!(catalog.find_by_url("u2").is_none());
    }
}
