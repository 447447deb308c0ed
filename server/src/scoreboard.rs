//! Rank-sorted view of every known player.
//!
//! Standings cover both connected players and scores restored from the
//! store. The ranking is derived: it is rebuilt from the standings by
//! [`Scoreboard::recompute`], which reports whether anything a viewer or the
//! notifier cares about moved.

use crate::grid::PlayerId;
use crate::store::ScoreRecord;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub identity: String,
    pub name: String,
    pub kills: u32,
    pub deaths: u32,
    pub rank: u32,
    /// Slot id while connected.
    pub online: Option<PlayerId>,
}

/// Kills descending, deaths ascending, then identity for a stable order.
pub fn compare_scores(a: &RankedEntry, b: &RankedEntry) -> Ordering {
    b.kills
        .cmp(&a.kills)
        .then(a.deaths.cmp(&b.deaths))
        .then_with(|| a.identity.cmp(&b.identity))
}

/// Sorts entries and assigns dense ranks: equal (kills, deaths) pairs share
/// a rank and the next distinct pair is one higher.
pub fn assign_ranks(entries: &mut [RankedEntry]) {
    entries.sort_by(compare_scores);
    let mut previous: Option<(u32, u32, u32)> = None;
    for entry in entries.iter_mut() {
        entry.rank = match previous {
            Some((kills, deaths, rank)) if kills == entry.kills && deaths == entry.deaths => rank,
            Some((_, _, rank)) => rank + 1,
            None => 1,
        };
        previous = Some((entry.kills, entry.deaths, entry.rank));
    }
}

#[derive(Debug, Default)]
pub struct Scoreboard {
    standings: HashMap<String, RankedEntry>,
    ranked: Vec<RankedEntry>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds standings from persisted records. Connected players are left
    /// untouched.
    pub fn restore(&mut self, records: impl IntoIterator<Item = (String, ScoreRecord)>) {
        for (identity, record) in records {
            self.standings
                .entry(identity.clone())
                .or_insert_with(|| RankedEntry {
                    identity,
                    name: record.name,
                    kills: record.kills,
                    deaths: record.deaths,
                    rank: 0,
                    online: None,
                });
        }
    }

    /// Inserts or updates one player's standing.
    pub fn record(
        &mut self,
        identity: &str,
        name: &str,
        kills: u32,
        deaths: u32,
        online: Option<PlayerId>,
    ) {
        let entry = self
            .standings
            .entry(identity.to_string())
            .or_insert_with(|| RankedEntry {
                identity: identity.to_string(),
                name: String::new(),
                kills: 0,
                deaths: 0,
                rank: 0,
                online: None,
            });
        entry.name = name.to_string();
        entry.kills = kills;
        entry.deaths = deaths;
        entry.online = online;
    }

    pub fn set_offline(&mut self, identity: &str) {
        if let Some(entry) = self.standings.get_mut(identity) {
            entry.online = None;
        }
    }

    pub fn standing(&self, identity: &str) -> Option<&RankedEntry> {
        self.standings.get(identity)
    }

    /// Rebuilds the ranking. Returns true when it differs from the previous
    /// one in order, rank, score or connection state.
    pub fn recompute(&mut self) -> bool {
        let mut ranked: Vec<RankedEntry> = self.standings.values().cloned().collect();
        assign_ranks(&mut ranked);
        let changed = ranked != self.ranked;
        self.ranked = ranked;
        changed
    }

    pub fn ranked(&self) -> &[RankedEntry] {
        &self.ranked
    }

    pub fn rank_of(&self, identity: &str) -> Option<u32> {
        self.ranked
            .iter()
            .find(|e| e.identity == identity)
            .map(|e| e.rank)
    }

    pub fn leader(&self) -> Option<&RankedEntry> {
        self.ranked.first()
    }
}
