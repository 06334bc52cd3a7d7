//! Persisted entities and their store contract.
//!
//! Field names are camelCase on the wire and must stay compatible with
//! existing stores (`elapsedSeconds`, `lastStartTime`, `currentHalf`,
//! `startGameSeconds`, `endGameSeconds`, ...).

pub mod availability;
pub mod game;
pub mod ids;
pub mod lineup;
pub mod plan;
pub mod play_time;
pub mod substitution;

pub use availability::{AvailabilityStatus, PlayerAvailability};
pub use game::{Game, GameStatus, Half};
pub use ids::{GameId, PlayerId, PositionId, RecordId, TeamId};
pub use lineup::{lineup_from_assignments, Lineup, LineupAssignment};
pub use plan::{GamePlan, PlannedRotation, PlannedSubstitution};
pub use play_time::PlayTimeRecord;
pub use substitution::Substitution;

use schemars::schema::RootSchema;
use schemars::schema_for;
use std::collections::BTreeMap;

/// JSON schemas for every persisted entity, keyed by entity name.
pub fn contract_schema() -> BTreeMap<&'static str, RootSchema> {
    let mut schemas = BTreeMap::new();
    schemas.insert("Game", schema_for!(Game));
    schemas.insert("PlayTimeRecord", schema_for!(PlayTimeRecord));
    schemas.insert("LineupAssignment", schema_for!(LineupAssignment));
    schemas.insert("Substitution", schema_for!(Substitution));
    schemas.insert("PlayerAvailability", schema_for!(PlayerAvailability));
    schemas.insert("GamePlan", schema_for!(GamePlan));
    schemas.insert("PlannedRotation", schema_for!(PlannedRotation));
    schemas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties(schema: &RootSchema) -> Vec<String> {
        schema
            .schema
            .object
            .as_ref()
            .map(|o| o.properties.keys().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_contract_schema_lists_persisted_fields() {
        let schemas = contract_schema();
        assert_eq!(schemas.len(), 7);

        let game = properties(&schemas["Game"]);
        for field in ["elapsedSeconds", "lastStartTime", "currentHalf", "status"] {
            assert!(game.iter().any(|f| f == field), "Game schema missing {}", field);
        }

        let record = properties(&schemas["PlayTimeRecord"]);
        assert!(record.iter().any(|f| f == "startGameSeconds"));
        assert!(record.iter().any(|f| f == "endGameSeconds"));

        let sub = properties(&schemas["Substitution"]);
        for field in ["gameSeconds", "half", "timestamp"] {
            assert!(sub.iter().any(|f| f == field), "Substitution schema missing {}", field);
        }
    }

    #[test]
    fn test_open_record_duration_clamps_to_zero() {
        let record = PlayTimeRecord::open("g".into(), "p".into(), "CB".into(), 300);
        assert_eq!(record.duration_at(300), 0);
        assert_eq!(record.duration_at(290), 0);
        assert_eq!(record.duration_at(360), 60);
    }
}
