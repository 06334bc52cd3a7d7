//! Game state and its reducer.
//!
//! Local operations and pushes from other devices both end up here as
//! `GameEvent`s, so there is exactly one code path that mutates the
//! in-memory view of a game.

use log::debug;

use crate::ledger::PlayTimeLedger;
use crate::models::{
    lineup_from_assignments, Game, GamePlan, Lineup, LineupAssignment, PlannedRotation,
    PlayTimeRecord, PlayerAvailability, PlayerId, PositionId, Substitution,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Written by this session.
    Local,
    /// Pushed by the store, possibly from another device.
    Remote,
}

/// Change to one entity collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Change<T> {
    Upsert(T),
    Remove(String),
    /// Full current result set.
    Snapshot(Vec<T>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Game { game: Game, origin: Origin },
    PlayTime(Change<PlayTimeRecord>),
    Lineup(Change<LineupAssignment>),
    Substitution(Change<Substitution>),
    Availability(Change<PlayerAvailability>),
    Plan(Change<GamePlan>),
    Rotation(Change<PlannedRotation>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub game: Game,
    pub ledger: PlayTimeLedger,
    pub lineup: Vec<LineupAssignment>,
    pub substitutions: Vec<Substitution>,
    pub availability: Vec<PlayerAvailability>,
    pub plan: Option<GamePlan>,
    pub rotations: Vec<PlannedRotation>,
    /// This session started the running clock and keeps its own tick.
    clock_owner: bool,
}

impl GameState {
    pub fn new(game: Game) -> Self {
        let ledger = PlayTimeLedger::new(game.id.clone());
        Self {
            game,
            ledger,
            lineup: Vec::new(),
            substitutions: Vec::new(),
            availability: Vec::new(),
            plan: None,
            rotations: Vec::new(),
            clock_owner: false,
        }
    }

    pub fn owns_clock(&self) -> bool {
        self.clock_owner
    }

    pub fn lineup_map(&self) -> Lineup {
        lineup_from_assignments(&self.lineup)
    }

    pub fn assignment_at(&self, position_id: &PositionId) -> Option<&LineupAssignment> {
        self.lineup.iter().find(|a| &a.position_id == position_id)
    }

    pub fn position_of(&self, player_id: &PlayerId) -> Option<&PositionId> {
        self.lineup.iter().find(|a| &a.player_id == player_id).map(|a| &a.position_id)
    }

    pub fn availability_of(&self, player_id: &PlayerId) -> Option<&PlayerAvailability> {
        self.availability.iter().find(|a| &a.player_id == player_id)
    }

    pub fn reduce(mut self, event: GameEvent) -> Self {
        self.apply(event);
        self
    }

    pub fn apply(&mut self, event: GameEvent) {
        match event {
            GameEvent::Game { game, origin } => self.apply_game(game, origin),
            GameEvent::PlayTime(change) => match change {
                Change::Upsert(record) => self.ledger.upsert(record),
                Change::Remove(key) => self.ledger.remove(&key),
                Change::Snapshot(records) => self.ledger.replace_all(records),
            },
            GameEvent::Lineup(change) => {
                apply_change(&mut self.lineup, change, |a| a.id.as_str());
                self.lineup.sort_by(|a, b| a.position_id.cmp(&b.position_id));
            }
            GameEvent::Substitution(change) => {
                apply_change(&mut self.substitutions, change, |s| s.id.as_str());
                self.substitutions
                    .sort_by(|a, b| a.game_seconds.cmp(&b.game_seconds).then(a.id.cmp(&b.id)));
            }
            GameEvent::Availability(change) => {
                apply_change(&mut self.availability, change, |a| a.id.as_str())
            }
            GameEvent::Plan(change) => match change {
                Change::Upsert(plan) => self.plan = Some(plan),
                Change::Remove(key) => {
                    if self.plan.as_ref().is_some_and(|p| p.id.as_str() == key) {
                        self.plan = None;
                    }
                }
                Change::Snapshot(mut plans) => {
                    plans.sort_by(|a, b| a.id.cmp(&b.id));
                    self.plan = plans.into_iter().next();
                }
            },
            GameEvent::Rotation(change) => {
                apply_change(&mut self.rotations, change, |r| r.id.as_str());
                self.rotations.sort_by_key(|r| r.rotation_number);
            }
        }
    }

    fn apply_game(&mut self, game: Game, origin: Origin) {
        if game.id != self.game.id {
            return;
        }

        match origin {
            Origin::Local => {
                self.clock_owner = game.is_running();
                self.game = game;
            }
            Origin::Remote => self.adopt_remote_game(game),
        }
    }

    /// Remote snapshots may be stale echoes of our own writes. They are
    /// dropped when they would move the match backwards. While this session
    /// runs the clock and the remote is in the same phase, only the non-clock
    /// fields are taken.
    fn adopt_remote_game(&mut self, remote: Game) {
        let local = &self.game;
        if remote.phase_rank() < local.phase_rank() || remote.elapsed_seconds < local.elapsed_seconds
        {
            debug!(
                "Dropping stale snapshot of game {} ({} at {}s, local {} at {}s)",
                remote.id, remote.status, remote.elapsed_seconds, local.status, local.elapsed_seconds
            );
            return;
        }

        let same_phase =
            remote.phase_rank() == local.phase_rank() && remote.is_running() == local.is_running();

        if self.clock_owner && same_phase {
            let mut merged = remote;
            merged.elapsed_seconds = self.game.elapsed_seconds;
            merged.last_start_time = self.game.last_start_time;
            self.game = merged;
            return;
        }

        if self.clock_owner {
            debug!("Game {} changed phase on another device; releasing clock", remote.id);
        }
        self.clock_owner = false;
        self.game = remote;
    }
}

fn apply_change<T, K>(items: &mut Vec<T>, change: Change<T>, key: K)
where
    K: Fn(&T) -> &str,
{
    match change {
        Change::Upsert(item) => match items.iter_mut().find(|i| key(&**i) == key(&item)) {
            Some(existing) => *existing = item,
            None => items.push(item),
        },
        Change::Remove(id) => items.retain(|i| key(i) != id),
        Change::Snapshot(all) => *items = all,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameStatus, Half, RecordId};
    use chrono::{TimeZone, Utc};

    fn running_game(elapsed: u32) -> Game {
        let mut game = Game::scheduled("g1", "t1");
        game.status = GameStatus::InProgress;
        game.elapsed_seconds = elapsed;
        game.last_start_time = Some(Utc.with_ymd_and_hms(2024, 9, 14, 10, 0, 0).unwrap());
        game
    }

    fn assignment(id: &str, pos: &str, player: &str) -> LineupAssignment {
        LineupAssignment {
            id: RecordId::from(id),
            game_id: "g1".into(),
            position_id: pos.into(),
            player_id: player.into(),
            is_starter: true,
        }
    }

    #[test]
    fn test_local_running_game_takes_clock_ownership() {
        let state = GameState::new(Game::scheduled("g1", "t1"))
            .reduce(GameEvent::Game { game: running_game(0), origin: Origin::Local });
        assert!(state.owns_clock());
    }

    #[test]
    fn test_remote_echo_does_not_clobber_running_clock() {
        let mut state = GameState::new(Game::scheduled("g1", "t1"));
        state.apply(GameEvent::Game { game: running_game(40), origin: Origin::Local });

        let mut echo = running_game(45);
        echo.our_score = 1;
        echo.last_start_time = Some(Utc.with_ymd_and_hms(2024, 9, 14, 10, 0, 3).unwrap());
        state.apply(GameEvent::Game { game: echo, origin: Origin::Remote });

        assert_eq!(state.game.elapsed_seconds, 40);
        assert_eq!(state.game.our_score, 1);
        assert!(state.owns_clock());
    }

    #[test]
    fn test_observer_adopts_remote_clock() {
        let mut state = GameState::new(Game::scheduled("g1", "t1"));
        state.apply(GameEvent::Game { game: running_game(300), origin: Origin::Remote });
        assert_eq!(state.game.elapsed_seconds, 300);
        assert!(!state.owns_clock());
    }

    #[test]
    fn test_remote_phase_change_releases_clock() {
        let mut state = GameState::new(Game::scheduled("g1", "t1"));
        state.apply(GameEvent::Game { game: running_game(100), origin: Origin::Local });

        let mut paused = running_game(130);
        paused.last_start_time = None;
        state.apply(GameEvent::Game { game: paused.clone(), origin: Origin::Remote });
        assert_eq!(state.game, paused);
        assert!(!state.owns_clock());
    }

    #[test]
    fn test_stale_remote_snapshot_dropped() {
        let mut state = GameState::new(Game::scheduled("g1", "t1"));
        let mut halftime = running_game(1800);
        halftime.status = GameStatus::Halftime;
        halftime.last_start_time = None;
        state.apply(GameEvent::Game { game: halftime.clone(), origin: Origin::Local });

        state.apply(GameEvent::Game { game: running_game(1795), origin: Origin::Remote });
        assert_eq!(state.game, halftime);

        let mut second = halftime.clone();
        second.status = GameStatus::InProgress;
        second.current_half = Half::Second;
        state.apply(GameEvent::Game { game: second.clone(), origin: Origin::Remote });
        assert_eq!(state.game, second);
    }

    #[test]
    fn test_duplicate_snapshot_delivery_is_noop() {
        let lineup = vec![assignment("a1", "CB", "p1"), assignment("a2", "GK", "p2")];
        let once = GameState::new(Game::scheduled("g1", "t1"))
            .reduce(GameEvent::Lineup(Change::Snapshot(lineup.clone())));
        let twice = once.clone().reduce(GameEvent::Lineup(Change::Snapshot(lineup)));
        assert_eq!(once, twice);
        assert_eq!(once.position_of(&"p2".into()), Some(&PositionId::from("GK")));
    }

    #[test]
    fn test_upsert_and_remove_by_id() {
        let mut state = GameState::new(Game::scheduled("g1", "t1"));
        state.apply(GameEvent::Lineup(Change::Upsert(assignment("a1", "CB", "p1"))));
        state.apply(GameEvent::Lineup(Change::Upsert(assignment("a1", "CB", "p9"))));
        assert_eq!(state.lineup.len(), 1);
        assert_eq!(state.lineup[0].player_id, PlayerId::from("p9"));

        state.apply(GameEvent::Lineup(Change::Remove("a1".to_string())));
        assert!(state.lineup.is_empty());
    }
}
