//! Game clock state machine.
//!
//! `scheduled -> in-progress -> halftime -> in-progress -> completed`, with
//! pause/resume inside in-progress tracked by `last_start_time`. Every
//! transition is a pure function from a `Game` snapshot to the next snapshot
//! plus the ledger work it implies; persisting either is the caller's job.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::models::{Game, GameStatus, Half};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOperation {
    Start,
    Pause,
    Resume,
    Halftime,
    StartSecondHalf,
    End,
    Substitute,
    RecordScore,
}

impl fmt::Display for GameOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameOperation::Start => "start",
            GameOperation::Pause => "pause",
            GameOperation::Resume => "resume",
            GameOperation::Halftime => "go to halftime",
            GameOperation::StartSecondHalf => "start second half",
            GameOperation::End => "end",
            GameOperation::Substitute => "substitute",
            GameOperation::RecordScore => "record score",
        };
        f.write_str(name)
    }
}

/// Ledger work implied by a clock transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEffect {
    None,
    /// Open an interval for every starter that has none.
    OpenStarters { at: u32 },
    /// Open an interval for every lineup player that has none.
    OpenLineup { at: u32 },
    /// Close every open interval. Must happen before the status change is
    /// persisted.
    CloseAll { at: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub game: Game,
    pub effect: LedgerEffect,
}

/// Transition fired by the clock itself rather than the coach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoTransition {
    Halftime { at: u32 },
    End { at: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameClock {
    config: GameConfig,
}

impl GameClock {
    pub fn new(config: &GameConfig) -> Self {
        Self { config: config.clone() }
    }

    pub fn max_game_seconds(&self) -> u32 {
        self.config.max_game_seconds
    }

    /// Authoritative game seconds for `game` observed at `now`.
    ///
    /// A `now` earlier than `last_start_time` (clock skew between devices)
    /// contributes nothing rather than going backwards.
    pub fn current_game_seconds(game: &Game, now: DateTime<Utc>) -> u32 {
        match (game.status, game.last_start_time) {
            (GameStatus::InProgress, Some(started)) => {
                let running = (now - started).num_seconds().max(0);
                let running = u32::try_from(running).unwrap_or(u32::MAX);
                game.elapsed_seconds.saturating_add(running)
            }
            _ => game.elapsed_seconds,
        }
    }

    pub fn start(&self, game: &Game, now: DateTime<Utc>) -> Result<Transition> {
        if game.status != GameStatus::Scheduled {
            return Err(invalid(GameOperation::Start, game));
        }
        self.config.require_half_length()?;

        let mut next = game.clone();
        next.status = GameStatus::InProgress;
        next.current_half = Half::First;
        next.elapsed_seconds = 0;
        next.last_start_time = Some(now);
        Ok(Transition { game: next, effect: LedgerEffect::OpenStarters { at: 0 } })
    }

    pub fn pause(&self, game: &Game, now: DateTime<Utc>) -> Result<Transition> {
        if !game.is_running() {
            return Err(invalid(GameOperation::Pause, game));
        }

        let mut next = game.clone();
        next.elapsed_seconds = Self::current_game_seconds(game, now);
        next.last_start_time = None;
        Ok(Transition { game: next, effect: LedgerEffect::None })
    }

    pub fn resume(&self, game: &Game, now: DateTime<Utc>) -> Result<Transition> {
        if !game.is_paused() {
            return Err(invalid(GameOperation::Resume, game));
        }

        let mut next = game.clone();
        next.last_start_time = Some(now);
        Ok(Transition { game: next, effect: LedgerEffect::None })
    }

    pub fn go_to_halftime(&self, game: &Game, now: DateTime<Utc>) -> Result<Transition> {
        self.halftime_at(game, Self::current_game_seconds(game, now))
    }

    fn halftime_at(&self, game: &Game, at: u32) -> Result<Transition> {
        if game.status != GameStatus::InProgress || game.current_half != Half::First {
            return Err(invalid(GameOperation::Halftime, game));
        }

        let mut next = game.clone();
        next.status = GameStatus::Halftime;
        next.elapsed_seconds = at.max(game.elapsed_seconds);
        next.last_start_time = None;
        let at = next.elapsed_seconds;
        Ok(Transition { game: next, effect: LedgerEffect::CloseAll { at } })
    }

    /// The clock carries on from the halftime reading; it is never reset.
    pub fn start_second_half(&self, game: &Game, now: DateTime<Utc>) -> Result<Transition> {
        if game.status != GameStatus::Halftime {
            return Err(invalid(GameOperation::StartSecondHalf, game));
        }

        let mut next = game.clone();
        next.status = GameStatus::InProgress;
        next.current_half = Half::Second;
        next.last_start_time = Some(now);
        Ok(Transition { game: next, effect: LedgerEffect::OpenLineup { at: game.elapsed_seconds } })
    }

    pub fn end(&self, game: &Game, now: DateTime<Utc>) -> Result<Transition> {
        self.end_at(game, Self::current_game_seconds(game, now))
    }

    fn end_at(&self, game: &Game, at: u32) -> Result<Transition> {
        if !matches!(game.status, GameStatus::InProgress | GameStatus::Halftime) {
            return Err(invalid(GameOperation::End, game));
        }

        let mut next = game.clone();
        next.status = GameStatus::Completed;
        next.elapsed_seconds = at.max(game.elapsed_seconds);
        next.last_start_time = None;
        let at = next.elapsed_seconds;
        Ok(Transition { game: next, effect: LedgerEffect::CloseAll { at } })
    }

    /// Auto transition due at `now`, if any.
    ///
    /// The ceiling wins over halftime. The captured game seconds are pinned to
    /// the boundary, so a late tick does not stretch the half.
    pub fn due_auto_transition(
        &self,
        game: &Game,
        now: DateTime<Utc>,
    ) -> Result<Option<AutoTransition>> {
        if !game.is_running() {
            return Ok(None);
        }

        let seconds = Self::current_game_seconds(game, now);
        let ceiling = self.max_game_seconds();
        if seconds >= ceiling {
            return Ok(Some(AutoTransition::End { at: ceiling.max(game.elapsed_seconds) }));
        }

        if game.current_half == Half::First {
            let half = self.config.require_half_length()?;
            if seconds >= half {
                return Ok(Some(AutoTransition::Halftime { at: half.max(game.elapsed_seconds) }));
            }
        }

        Ok(None)
    }

    pub fn apply_auto(&self, game: &Game, auto: AutoTransition) -> Result<Transition> {
        match auto {
            AutoTransition::Halftime { at } => self.halftime_at(game, at),
            AutoTransition::End { at } => self.end_at(game, at),
        }
    }

    /// Fold whole running seconds into `elapsed_seconds` and move
    /// `last_start_time` forward by exactly that amount, so repeated
    /// checkpoints never lose the sub-second remainder.
    pub fn checkpoint(game: &Game, now: DateTime<Utc>) -> Game {
        let mut next = game.clone();
        if let (true, Some(started)) = (game.is_running(), game.last_start_time) {
            let current = Self::current_game_seconds(game, now);
            let folded = current - game.elapsed_seconds;
            next.elapsed_seconds = current;
            next.last_start_time = Some(started + chrono::Duration::seconds(i64::from(folded)));
        }
        next
    }
}

fn invalid(operation: GameOperation, game: &Game) -> GameError {
    GameError::InvalidTransition {
        operation,
        status: game.status,
        half: game.current_half,
        running: game.is_running(),
    }
}
