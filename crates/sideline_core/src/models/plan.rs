use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::game::Half;
use super::ids::{GameId, PlayerId, PositionId, RecordId};
use super::lineup::Lineup;

/// Pre-game plan: the intended starting lineup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GamePlan {
    pub id: RecordId,
    pub game_id: GameId,
    pub starting_lineup: Lineup,
}

/// One position change inside a planned rotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlannedSubstitution {
    pub player_out_id: PlayerId,
    pub player_in_id: PlayerId,
    pub position_id: PositionId,
}

/// Time-indexed batch of planned substitutions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlannedRotation {
    pub id: RecordId,
    pub game_id: GameId,
    pub plan_id: RecordId,
    pub rotation_number: u32,
    pub game_minute: u32,
    #[schemars(with = "u8")]
    pub half: Half,
    pub substitutions: Vec<PlannedSubstitution>,
    pub viewed_at: Option<DateTime<Utc>>,
}
