//! Guide state and programme lookups
//!
//! The guide is replaced wholesale on every successful feed load. Lookups
//! trust the feed order: `current` and `next` return the first match in list
//! order, so overlapping or unsorted feeds resolve to whichever entry comes
//! first.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::catalog::Catalog;
use crate::models::{Channel, Program};

/// The most recently loaded guide feed
#[derive(Debug, Default)]
pub struct EpgGuide {
    programs: Vec<Program>,
    source: Option<String>,
    loaded_at: Option<DateTime<Utc>>,
}

impl EpgGuide {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the previous programmes and keep these instead
    pub fn replace(&mut self, programs: Vec<Program>, source: impl Into<String>) {
        self.programs = programs;
        self.source = Some(source.into());
        self.loaded_at = Some(Utc::now());
    }

    pub fn clear(&mut self) {
        self.programs.clear();
        self.source = None;
        self.loaded_at = None;
    }

    /// Flat programme list, including programmes no channel claims
    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Give every catalog channel the programmes carrying its id
    pub fn attach(&self, catalog: &mut Catalog) {
        catalog.attach_programs(&self.programs);
        let matched = catalog
            .channels()
            .iter()
            .filter(|c| !c.programs.is_empty())
            .count();
        debug!(
            "Attached {} programmes to {} of {} channels",
            self.programs.len(),
            matched,
            catalog.len()
        );
    }
}

/// First programme airing at `now`, bounds inclusive
pub fn current(channel: &Channel, now: DateTime<Utc>) -> Option<&Program> {
    channel.programs.iter().find(|p| p.is_airing(now))
}

/// First programme starting after `now`, independent of [`current`]
pub fn next(channel: &Channel, now: DateTime<Utc>) -> Option<&Program> {
    channel.programs.iter().find(|p| p.starts_after(now))
}

/// What the guide panel shows for one channel at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpgSnapshot {
    pub current: Option<Program>,
    pub next: Option<Program>,
    /// Progress through `current`, 0 when nothing is airing
    pub progress_percent: f64,
}

impl EpgSnapshot {
    pub fn for_channel(channel: &Channel, now: DateTime<Utc>) -> Self {
        let current = current(channel, now);
        Self {
            progress_percent: current.map_or(0.0, |p| p.progress_percent(now)),
            current: current.cloned(),
            next: next(channel, now).cloned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.next.is_none()
    }
}
