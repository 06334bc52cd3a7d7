use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::game::Half;
use super::ids::{GameId, PlayerId, PositionId, RecordId};

/// Audit entry for an executed substitution. Written once, never edited.
///
/// `player_out_id` is empty when a vacant position was filled while the
/// clock was running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    pub id: RecordId,
    pub game_id: GameId,
    pub player_out_id: Option<PlayerId>,
    pub player_in_id: PlayerId,
    pub position_id: PositionId,
    pub game_seconds: u32,
    #[schemars(with = "u8")]
    pub half: Half,
    pub timestamp: DateTime<Utc>,
}

impl Substitution {
    /// Same on-field change, regardless of row id and wall-clock timestamp.
    pub fn describes_same_change(&self, other: &Substitution) -> bool {
        self.player_out_id == other.player_out_id
            && self.player_in_id == other.player_in_id
            && self.position_id == other.position_id
            && self.game_seconds == other.game_seconds
    }
}
