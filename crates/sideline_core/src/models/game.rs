use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{GameId, TeamId};

/// Match phase as persisted in `Game.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
#[serde(rename_all = "kebab-case")]
pub enum GameStatus {
    Scheduled,
    InProgress,
    Halftime,
    Completed,
}

impl GameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Scheduled => "scheduled",
            GameStatus::InProgress => "in-progress",
            GameStatus::Halftime => "halftime",
            GameStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half of play. Persisted as the integer 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Half {
    First,
    Second,
}

impl Half {
    pub fn number(self) -> u8 {
        match self {
            Half::First => 1,
            Half::Second => 2,
        }
    }
}

impl From<Half> for u8 {
    fn from(half: Half) -> Self {
        half.number()
    }
}

impl TryFrom<u8> for Half {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Half::First),
            2 => Ok(Half::Second),
            other => Err(format!("half must be 1 or 2, got {}", other)),
        }
    }
}

impl fmt::Display for Half {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// One scheduled match and its clock checkpoint.
///
/// While `status` is in-progress and `last_start_time` is set, the live game
/// seconds are `elapsed_seconds + floor(now - last_start_time)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    pub team_id: TeamId,
    pub status: GameStatus,
    #[schemars(with = "u8")]
    pub current_half: Half,
    pub elapsed_seconds: u32,
    pub last_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub our_score: u32,
    #[serde(default)]
    pub opponent_score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent: Option<String>,
}

impl Game {
    pub fn scheduled(id: impl Into<GameId>, team_id: impl Into<TeamId>) -> Self {
        Self {
            id: id.into(),
            team_id: team_id.into(),
            status: GameStatus::Scheduled,
            current_half: Half::First,
            elapsed_seconds: 0,
            last_start_time: None,
            our_score: 0,
            opponent_score: 0,
            opponent: None,
        }
    }

    /// Clock is advancing right now.
    pub fn is_running(&self) -> bool {
        self.status == GameStatus::InProgress && self.last_start_time.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.status == GameStatus::InProgress && self.last_start_time.is_none()
    }

    /// Position of this snapshot along the match timeline. Never decreases for
    /// a well-behaved game, which lets remote snapshots be ordered.
    pub fn phase_rank(&self) -> u8 {
        match (self.status, self.current_half) {
            (GameStatus::Scheduled, _) => 0,
            (GameStatus::InProgress, Half::First) => 1,
            (GameStatus::Halftime, _) => 2,
            (GameStatus::InProgress, Half::Second) => 3,
            (GameStatus::Completed, _) => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use strum::IntoEnumIterator;

    #[test]
    fn test_status_round_trips_through_store_strings() {
        for status in GameStatus::iter() {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            let back: GameStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn test_half_rejects_out_of_range_numbers() {
        assert_eq!(serde_json::from_str::<Half>("2").unwrap(), Half::Second);
        assert!(serde_json::from_str::<Half>("3").is_err());
        assert!(serde_json::from_str::<Half>("0").is_err());
    }

    #[test]
    fn test_game_uses_persisted_field_names() {
        let mut game = Game::scheduled("g1", "t1");
        game.status = GameStatus::InProgress;
        game.elapsed_seconds = 125;
        game.last_start_time = Some(Utc.with_ymd_and_hms(2024, 9, 14, 10, 0, 0).unwrap());

        let value = serde_json::to_value(&game).unwrap();
        assert_eq!(value["elapsedSeconds"], 125);
        assert_eq!(value["currentHalf"], 1);
        assert_eq!(value["status"], "in-progress");
        assert_eq!(value["lastStartTime"], "2024-09-14T10:00:00Z");

        let back: Game = serde_json::from_value(value).unwrap();
        assert_eq!(back, game);
    }

    #[test]
    fn test_phase_rank_follows_match_timeline() {
        let mut game = Game::scheduled("g1", "t1");
        let mut ranks = vec![game.phase_rank()];
        game.status = GameStatus::InProgress;
        ranks.push(game.phase_rank());
        game.status = GameStatus::Halftime;
        ranks.push(game.phase_rank());
        game.status = GameStatus::InProgress;
        game.current_half = Half::Second;
        ranks.push(game.phase_rank());
        game.status = GameStatus::Completed;
        ranks.push(game.phase_rank());
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
    }
}
