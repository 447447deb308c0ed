//! Rank-change notifications for chat integrations.

use crate::scoreboard::RankedEntry;
use log::info;

/// How many entries go into a score summary.
pub const TOP_PLAYERS: usize = 10;

/// Receives the full ranking whenever it changes.
pub trait RankNotifier: Send {
    fn on_rank_change(&mut self, ranked: &[RankedEntry]);
}

/// Announces a new leader when the top entry changes identity and has at
/// least one kill. Also keeps a rendered top-N summary for on-demand
/// queries.
pub struct LeaderAnnouncer {
    leader: Option<String>,
    summary: String,
    sink: Box<dyn FnMut(&str) + Send>,
}

impl LeaderAnnouncer {
    /// Announces through the log.
    pub fn new() -> Self {
        Self::with_sink(|message| info!("{}", message))
    }

    pub fn with_sink(sink: impl FnMut(&str) + Send + 'static) -> Self {
        Self {
            leader: None,
            summary: String::new(),
            sink: Box::new(sink),
        }
    }

    /// Identity of the last announced leader.
    pub fn leader(&self) -> Option<&str> {
        self.leader.as_deref()
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }
}

impl Default for LeaderAnnouncer {
    fn default() -> Self {
        Self::new()
    }
}

impl RankNotifier for LeaderAnnouncer {
    fn on_rank_change(&mut self, ranked: &[RankedEntry]) {
        self.summary = ranked
            .iter()
            .take(TOP_PLAYERS)
            .map(|e| format!("#{} {} {} kills\n", e.rank, e.name, e.kills))
            .collect();

        let Some(top) = ranked.first().filter(|e| e.kills > 0) else {
            return;
        };
        if self.leader.as_deref() == Some(top.identity.as_str()) {
            return;
        }
        self.leader = Some(top.identity.clone());
        let message = format!("{} has taken the lead!\n\n{}", top.name, self.summary);
        (self.sink)(&message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn entry(identity: &str, kills: u32, rank: u32) -> RankedEntry {
        RankedEntry {
            identity: identity.to_string(),
            name: format!("{}-name", identity),
            kills,
            deaths: 0,
            rank,
            online: None,
        }
    }

    fn recording() -> (LeaderAnnouncer, Arc<Mutex<Vec<String>>>) {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        let announcer = LeaderAnnouncer::with_sink(move |m| sink.lock().unwrap().push(m.to_string()));
        (announcer, messages)
    }

    #[test]
    fn test_no_announcement_without_kills() {
        let (mut announcer, messages) = recording();
        announcer.on_rank_change(&[entry("a", 0, 1), entry("b", 0, 1)]);
        assert!(messages.lock().unwrap().is_empty());
        assert_eq!(announcer.leader(), None);
        assert_eq!(announcer.summary(), "#1 a-name 0 kills\n#1 b-name 0 kills\n");
    }

    #[test]
    fn test_announces_only_on_leader_change() {
        let (mut announcer, messages) = recording();

        announcer.on_rank_change(&[entry("a", 1, 1), entry("b", 0, 2)]);
        announcer.on_rank_change(&[entry("a", 2, 1), entry("b", 0, 2)]);
        announcer.on_rank_change(&[entry("b", 3, 1), entry("a", 2, 2)]);

        let messages = messages.lock().unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("a-name has taken the lead!"));
        assert!(messages[1].starts_with("b-name has taken the lead!"));
        assert_eq!(announcer.leader(), Some("b"));
    }

    #[test]
    fn test_summary_is_capped() {
        let (mut announcer, _) = recording();
        let ranked: Vec<_> = (0..15)
            .map(|i| entry(&format!("p{}", i), 15 - i, i + 1))
            .collect();
        announcer.on_rank_change(&ranked);
        assert_eq!(announcer.summary().lines().count(), TOP_PLAYERS);
    }
}
