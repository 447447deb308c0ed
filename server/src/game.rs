//! The authoritative simulation.
//!
//! [`GameState`] is the only writer of the grid. Connection tasks never touch
//! it directly; the network layer feeds it joins, inputs and departures as
//! messages and calls [`GameState::tick`] on a fixed interval. A tick applies
//! any trail cleanups that have come due, moves every live player one cell,
//! then rebuilds the scoreboard and sidebar. Rendering happens afterwards
//! through [`GameState::render_frames`], so no viewer sees a half-updated
//! board.

use crate::config::{ConfigError, GameConfig};
use crate::error::GameError;
use crate::grid::{Cell, Grid, PlayerId};
use crate::id_pool::IdPool;
use crate::player::Player;
use crate::render::Scene;
use crate::scoreboard::{RankedEntry, Scoreboard};
use crate::sidebar::{Sidebar, SidebarEntry};
use crate::store::ScoreRecord;
use log::{debug, info};
use rand::Rng;
use shared::Heading;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kill {
    pub killer: PlayerId,
    pub victim: PlayerId,
}

/// Everything a tick changed that the outside world reacts to.
#[derive(Debug, Default)]
pub struct TickReport {
    pub tick: u64,
    pub kills: Vec<Kill>,
    pub deaths: Vec<PlayerId>,
    /// Ids returned to the pool this tick.
    pub released: Vec<PlayerId>,
    /// Players removed for reaching the death limit.
    pub kicked: Vec<PlayerId>,
    /// The full ranking, present only when it changed.
    pub ranking: Option<Vec<RankedEntry>>,
    /// Scores to persist.
    pub dirty_scores: Vec<(String, ScoreRecord)>,
}

impl TickReport {
    pub fn ranking_changed(&self) -> bool {
        self.ranking.is_some()
    }
}

/// What the score store returned for a joining player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredScore {
    Found(ScoreRecord),
    /// Nothing saved under the identity. A standing restored at startup still
    /// applies.
    Missing,
    /// The lookup failed. The player starts from zero.
    Unavailable,
}

/// A queued request to wipe a player's trail.
#[derive(Debug, Clone, Copy)]
struct Cleanup {
    id: PlayerId,
    due: Instant,
    /// Return the id to the pool once the cells are gone.
    release: bool,
}

pub struct GameState {
    config: GameConfig,
    grid: Grid,
    players: BTreeMap<PlayerId, Player>,
    cleanups: Vec<Cleanup>,
    scoreboard: Scoreboard,
    sidebar: Sidebar,
    pool: Arc<IdPool>,
    tick: u64,
}

impl GameState {
    pub fn new(config: GameConfig, pool: Arc<IdPool>) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = Grid::new(config.width, config.height)?;
        let sidebar = Sidebar::new(config.required_rows() - 2);
        Ok(Self {
            config,
            grid,
            players: BTreeMap::new(),
            cleanups: Vec::new(),
            scoreboard: Scoreboard::new(),
            sidebar,
            pool,
            tick: 0,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn sidebar(&self) -> &Sidebar {
        &self.sidebar
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Seeds the scoreboard with persisted scores.
    pub fn restore_scores(&mut self, records: Vec<(String, ScoreRecord)>) {
        info!("Restoring {} persisted scores", records.len());
        self.scoreboard.restore(records);
        self.scoreboard.recompute();
    }

    pub fn is_connected(&self, identity: &str) -> bool {
        self.players.values().any(|p| p.identity == identity)
    }

    /// Creates a player for a freshly acquired id.
    pub fn add_player(
        &mut self,
        id: PlayerId,
        identity: &str,
        name: &str,
        stored: StoredScore,
    ) -> Result<(), GameError> {
        if self.is_connected(identity) {
            return Err(GameError::DuplicateSession(identity.to_string()));
        }

        let mut player = Player::new(id, identity, name);
        match stored {
            StoredScore::Found(record) => {
                player.kills = record.kills;
                player.deaths = record.deaths;
            }
            StoredScore::Missing => {
                if let Some(standing) = self.scoreboard.standing(identity) {
                    player.kills = standing.kills;
                    player.deaths = standing.deaths;
                }
            }
            StoredScore::Unavailable => {}
        }

        info!(
            "Player {} ({}) joined with {} kills, {} deaths",
            id, player.name, player.kills, player.deaths
        );
        self.players.insert(id, player);
        Ok(())
    }

    /// Drops a departed player. The id stays out of the pool until the trail
    /// has been cleared; returns the final score to persist.
    pub fn remove_player(&mut self, id: PlayerId, now: Instant) -> Option<(String, ScoreRecord)> {
        let player = self.players.remove(&id)?;
        self.scoreboard.set_offline(&player.identity);

        if let Some(pending) = self.cleanups.iter_mut().find(|c| c.id == id) {
            pending.release = true;
        } else {
            let due = if player.alive {
                now + self.config.respawn_delay
            } else {
                now
            };
            self.cleanups.push(Cleanup {
                id,
                due,
                release: true,
            });
        }

        info!("Player {} ({}) left", id, player.name);
        Some((
            player.identity,
            ScoreRecord {
                name: player.name,
                kills: player.kills,
                deaths: player.deaths,
            },
        ))
    }

    /// Applies a terminal size change and returns the bytes to send back.
    pub fn resize(&mut self, id: PlayerId, cols: usize, rows: usize) -> Option<Vec<u8>> {
        let (need_cols, need_rows) = (self.config.required_cols(), self.config.required_rows());
        let player = self.players.get_mut(&id)?;
        let out = player.resize(cols, rows, need_cols, need_rows);
        if !player.is_ready() {
            debug!(
                "Player {} terminal {}x{} too small, need {}x{}",
                id, cols, rows, need_cols, need_rows
            );
        }
        Some(out)
    }

    pub fn steer(&mut self, id: PlayerId, heading: Heading) -> bool {
        self.players
            .get_mut(&id)
            .map_or(false, |p| p.steer(heading))
    }

    pub fn invalidate_frame(&mut self, id: PlayerId) {
        if let Some(player) = self.players.get_mut(&id) {
            player.invalidate_frame();
        }
    }

    pub fn respawn(&mut self, id: PlayerId) -> bool {
        self.respawn_with(id, &mut rand::thread_rng())
    }

    /// Tries random positions until one has a clear run ahead. Leaves the
    /// player dead if none is found within the attempt limit.
    pub fn respawn_with(&mut self, id: PlayerId, rng: &mut impl Rng) -> bool {
        match self.players.get(&id) {
            Some(player) if player.can_respawn() => {}
            _ => return false,
        }

        let (width, height) = (self.grid.width(), self.grid.height());
        for _ in 0..self.config.respawn_attempts {
            let x = rng.gen_range(1..width - 1);
            let y = rng.gen_range(1..height - 1);
            let heading = Heading::ALL[rng.gen_range(0..Heading::ALL.len())];
            if self.path_clear(x, y, heading) {
                self.spawn_at(id, x, y, heading);
                return true;
            }
        }

        debug!(
            "No clear respawn spot for player {} after {} attempts",
            id, self.config.respawn_attempts
        );
        false
    }

    fn path_clear(&self, x: usize, y: usize, heading: Heading) -> bool {
        if self.grid.get(x, y) != Some(Cell::Empty) {
            return false;
        }
        let (mut cx, mut cy) = (x, y);
        for _ in 0..self.config.respawn_lookahead {
            match self.grid.step(cx, cy, heading) {
                Some((nx, ny)) if self.grid.get(nx, ny) == Some(Cell::Empty) => {
                    cx = nx;
                    cy = ny;
                }
                _ => return false,
            }
        }
        true
    }

    /// Places a player at an exact spot, alive. The spawn cell is not
    /// claimed; the trail starts with the first move.
    pub fn spawn_at(&mut self, id: PlayerId, x: usize, y: usize, heading: Heading) {
        if let Some(player) = self.players.get_mut(&id) {
            player.x = x;
            player.y = y;
            player.heading = heading;
            player.next_heading = heading;
            player.alive = true;
            player.waiting_respawn = false;
            player.died_at = None;
            info!("Player {} ({}) spawned at ({}, {})", id, player.name, x, y);
        }
    }

    /// Advances the game by one step.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        self.apply_cleanups(now, &mut report);
        self.move_players(now, &mut report);

        let mut dirty = BTreeSet::new();
        for kill in &report.kills {
            dirty.insert(kill.killer);
        }
        dirty.extend(report.deaths.iter().copied());
        report.dirty_scores = dirty
            .into_iter()
            .filter_map(|id| self.players.get(&id))
            .map(|p| {
                (
                    p.identity.clone(),
                    ScoreRecord {
                        name: p.name.clone(),
                        kills: p.kills,
                        deaths: p.deaths,
                    },
                )
            })
            .collect();

        if self.update_scoreboard() {
            report.ranking = Some(self.scoreboard.ranked().to_vec());
        }
        self.update_sidebar(now);
        report
    }

    fn apply_cleanups(&mut self, now: Instant, report: &mut TickReport) {
        let (due, pending): (Vec<Cleanup>, Vec<Cleanup>) =
            self.cleanups.drain(..).partition(|c| c.due <= now);
        self.cleanups = pending;

        for cleanup in due {
            let cleared = self.grid.clear_owner(cleanup.id);
            debug!("Cleared {} cells of player {}", cleared, cleanup.id);

            if cleanup.release {
                self.pool.release(cleanup.id);
                report.released.push(cleanup.id);
                continue;
            }

            let Some(player) = self.players.get_mut(&cleanup.id) else {
                continue;
            };
            player.waiting_respawn = false;

            let over_limit = self
                .config
                .max_deaths
                .map_or(false, |max| player.session_deaths >= max);
            if over_limit {
                info!(
                    "Player {} ({}) reached {} deaths and is kicked",
                    player.id, player.name, player.session_deaths
                );
                let identity = player.identity.clone();
                self.players.remove(&cleanup.id);
                self.scoreboard.set_offline(&identity);
                self.pool.release(cleanup.id);
                report.kicked.push(cleanup.id);
                report.released.push(cleanup.id);
            }
        }
    }

    fn move_players(&mut self, now: Instant, report: &mut TickReport) {
        let ids: Vec<PlayerId> = self.players.keys().copied().collect();

        for id in ids {
            let Some(player) = self.players.get_mut(&id) else {
                continue;
            };
            if !player.alive {
                continue;
            }
            player.heading = player.next_heading;

            let target = self
                .grid
                .step(player.x, player.y, player.heading)
                .map(|(x, y)| ((x, y), self.grid.get(x, y).unwrap_or(Cell::Wall)));

            match target {
                Some(((x, y), Cell::Empty)) => {
                    player.x = x;
                    player.y = y;
                    self.grid.set(x, y, Cell::Owned(id));
                }
                Some((_, Cell::Owned(owner))) if owner != id => {
                    self.kill(id, Some(owner), now, report);
                }
                _ => self.kill(id, None, now, report),
            }
        }
    }

    fn kill(&mut self, victim: PlayerId, owner: Option<PlayerId>, now: Instant, report: &mut TickReport) {
        let killer = owner.and_then(|owner| match self.players.get_mut(&owner) {
            Some(killer) if killer.alive => {
                killer.kills += 1;
                Some(killer.id)
            }
            _ => None,
        });

        let Some(player) = self.players.get_mut(&victim) else {
            return;
        };
        player.alive = false;
        player.waiting_respawn = true;
        player.died_at = Some(now);
        player.deaths += 1;
        player.session_deaths += 1;

        match killer {
            Some(killer) => {
                info!("Player {} ({}) was killed by player {}", victim, player.name, killer);
                report.kills.push(Kill { killer, victim });
            }
            None => info!("Player {} ({}) crashed", victim, player.name),
        }
        report.deaths.push(victim);

        self.cleanups.push(Cleanup {
            id: victim,
            due: now + self.config.respawn_delay,
            release: false,
        });
    }

    /// Feeds live scores into the scoreboard and copies ranks back.
    fn update_scoreboard(&mut self) -> bool {
        for player in self.players.values() {
            self.scoreboard.record(
                &player.identity,
                &player.name,
                player.kills,
                player.deaths,
                Some(player.id),
            );
        }
        let changed = self.scoreboard.recompute();
        for player in self.players.values_mut() {
            if let Some(rank) = self.scoreboard.rank_of(&player.identity) {
                player.rank = rank;
            }
        }
        changed
    }

    fn update_sidebar(&mut self, now: Instant) -> bool {
        let delay = self.config.respawn_delay;
        let entries: Vec<SidebarEntry> = self
            .scoreboard
            .ranked()
            .iter()
            .filter_map(|entry| {
                let player = self.players.get(&entry.online?)?;
                Some(SidebarEntry {
                    id: player.id,
                    rank: entry.rank,
                    name: player.name.clone(),
                    status: player.status(now, delay),
                    kills: player.kills,
                    deaths: player.deaths,
                })
            })
            .collect();
        self.sidebar.update(&entries)
    }

    /// Diffs the current board for every ready player. `force_sidebar`
    /// repaints all sidebar text. Players with nothing to draw are left out.
    pub fn render_frames(&mut self, force_sidebar: bool) -> Vec<(PlayerId, Vec<u8>)> {
        let scene = Scene::new(&self.grid, &self.sidebar, force_sidebar);
        self.players
            .values_mut()
            .filter(|p| p.is_ready())
            .filter_map(|p| {
                let bytes = p.render(&scene);
                (!bytes.is_empty()).then(|| (p.id, bytes))
            })
            .collect()
    }
}
