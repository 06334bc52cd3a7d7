use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ids::{GameId, PlayerId, PositionId, RecordId};

/// Snapshot of who stands where: position -> player.
pub type Lineup = BTreeMap<PositionId, PlayerId>;

/// Current occupant of one field position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineupAssignment {
    pub id: RecordId,
    pub game_id: GameId,
    pub position_id: PositionId,
    pub player_id: PlayerId,
    pub is_starter: bool,
}

impl LineupAssignment {
    pub fn new(
        game_id: GameId,
        position_id: PositionId,
        player_id: PlayerId,
        is_starter: bool,
    ) -> Self {
        Self { id: RecordId::generate(), game_id, position_id, player_id, is_starter }
    }
}

/// Collapse stored assignments into a lineup map.
pub fn lineup_from_assignments(assignments: &[LineupAssignment]) -> Lineup {
    assignments.iter().map(|a| (a.position_id.clone(), a.player_id.clone())).collect()
}
