//! Play-time report used for rotation fairness.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::clock::GameClock;
use crate::models::PlayerId;
use crate::state::GameState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPlayTime {
    pub player_id: PlayerId,
    pub seconds: u32,
    pub on_field: bool,
    pub stints: usize,
    pub subs_in: usize,
    pub subs_out: usize,
    /// Fraction of elapsed game time spent on the field, 0.0 before kickoff.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayTimeReport {
    pub game_seconds: u32,
    /// Least played first.
    pub players: Vec<PlayerPlayTime>,
}

impl PlayTimeReport {
    /// Everyone with a ledger record, a lineup spot or a substitution entry.
    pub fn build(state: &GameState, now: DateTime<Utc>) -> Self {
        let game_seconds = GameClock::current_game_seconds(&state.game, now);

        let mut roster: BTreeSet<PlayerId> = state.ledger.players().into_iter().collect();
        roster.extend(state.lineup.iter().map(|a| a.player_id.clone()));
        for sub in &state.substitutions {
            roster.insert(sub.player_in_id.clone());
            roster.extend(sub.player_out_id.clone());
        }

        let mut players: Vec<PlayerPlayTime> = roster
            .into_iter()
            .map(|player_id| {
                let seconds = state.ledger.cumulative_play_time(&player_id, game_seconds);
                let share = if game_seconds == 0 {
                    0.0
                } else {
                    f64::from(seconds) / f64::from(game_seconds)
                };
                PlayerPlayTime {
                    on_field: state.ledger.is_on_field(&player_id),
                    stints: state.ledger.stints(&player_id),
                    subs_in: state
                        .substitutions
                        .iter()
                        .filter(|s| s.player_in_id == player_id)
                        .count(),
                    subs_out: state
                        .substitutions
                        .iter()
                        .filter(|s| s.player_out_id.as_ref() == Some(&player_id))
                        .count(),
                    seconds,
                    share,
                    player_id,
                }
            })
            .collect();

        players.sort_by(|a, b| a.seconds.cmp(&b.seconds).then_with(|| a.player_id.cmp(&b.player_id)));
        Self { game_seconds, players }
    }

    /// Gap between the most and least played, in seconds.
    pub fn fairness_spread(&self) -> u32 {
        match (self.players.first(), self.players.last()) {
            (Some(least), Some(most)) => most.seconds - least.seconds,
            _ => 0,
        }
    }

    pub fn least_played(&self, count: usize) -> &[PlayerPlayTime] {
        &self.players[..count.min(self.players.len())]
    }
}
