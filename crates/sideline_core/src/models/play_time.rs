use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ids::{GameId, PlayerId, PositionId, RecordId};

/// One continuous on-field stint. `end_game_seconds == None` means the
/// player is on the field right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayTimeRecord {
    pub id: RecordId,
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub position_id: PositionId,
    pub start_game_seconds: u32,
    pub end_game_seconds: Option<u32>,
}

impl PlayTimeRecord {
    pub fn open(
        game_id: GameId,
        player_id: PlayerId,
        position_id: PositionId,
        start_game_seconds: u32,
    ) -> Self {
        Self {
            id: RecordId::generate(),
            game_id,
            player_id,
            position_id,
            start_game_seconds,
            end_game_seconds: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_game_seconds.is_none()
    }

    /// Seconds covered by this stint as seen at `current_game_seconds`.
    /// Open stints observed before their start count as zero.
    pub fn duration_at(&self, current_game_seconds: u32) -> u32 {
        let end = self.end_game_seconds.unwrap_or(current_game_seconds);
        end.saturating_sub(self.start_game_seconds)
    }
}
