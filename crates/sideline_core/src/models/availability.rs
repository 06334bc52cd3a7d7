use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{GameId, PlayerId, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
#[serde(rename_all = "kebab-case")]
pub enum AvailabilityStatus {
    Available,
    Absent,
    LateArrival,
    Injured,
}

impl AvailabilityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "available",
            AvailabilityStatus::Absent => "absent",
            AvailabilityStatus::LateArrival => "late-arrival",
            AvailabilityStatus::Injured => "injured",
        }
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-player, per-game availability. One row per `(game_id, player_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAvailability {
    pub id: RecordId,
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub status: AvailabilityStatus,
    pub available_from_minute: Option<u32>,
    pub available_until_minute: Option<u32>,
    #[serde(default)]
    pub note: Option<String>,
}

impl PlayerAvailability {
    pub fn available(game_id: GameId, player_id: PlayerId) -> Self {
        Self {
            id: RecordId::generate(),
            game_id,
            player_id,
            status: AvailabilityStatus::Available,
            available_from_minute: None,
            available_until_minute: None,
            note: None,
        }
    }
}
