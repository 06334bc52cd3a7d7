//! Change feed for one game.
//!
//! Holds a subscription per entity and turns whatever the store pushed since
//! the last poll into `GameEvent`s. Only the newest result set per entity is
//! kept; older ones are superseded by it.

use log::{debug, warn};

use crate::error::Result;
use crate::models::{
    Game, GameId, GamePlan, LineupAssignment, PlannedRotation, PlayTimeRecord,
    PlayerAvailability, Substitution,
};
use crate::repository::{Filter, Record, Store, Subscription};
use crate::state::{Change, GameEvent, Origin};

#[derive(Debug)]
pub struct ChangeFeed {
    game_id: GameId,
    games: Subscription<Game>,
    play_time: Subscription<PlayTimeRecord>,
    lineup: Subscription<LineupAssignment>,
    substitutions: Subscription<Substitution>,
    availability: Subscription<PlayerAvailability>,
    plans: Subscription<GamePlan>,
    rotations: Subscription<PlannedRotation>,
}

impl ChangeFeed {
    pub fn connect(store: &Store, game_id: &GameId) -> Result<Self> {
        let filter = Filter::game(game_id);
        let feed = Self {
            game_id: game_id.clone(),
            games: store.games.subscribe(filter.clone())?,
            play_time: store.play_time.subscribe(filter.clone())?,
            lineup: store.lineup.subscribe(filter.clone())?,
            substitutions: store.substitutions.subscribe(filter.clone())?,
            availability: store.availability.subscribe(filter.clone())?,
            plans: store.plans.subscribe(filter.clone())?,
            rotations: store.rotations.subscribe(filter)?,
        };
        debug!("Change feed connected for game {}", game_id);
        Ok(feed)
    }

    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    /// Drain pending pushes without blocking. The game comes first so the
    /// reducer sees the phase before the records that follow from it.
    pub fn poll(&self) -> Result<Vec<GameEvent>> {
        let mut events = Vec::new();

        if let Some(games) = self.games.latest()? {
            match games.into_iter().find(|g| g.id == self.game_id) {
                Some(game) => events.push(GameEvent::Game { game, origin: Origin::Remote }),
                None => warn!("Game {} disappeared from the store", self.game_id),
            }
        }

        push_snapshot(&mut events, &self.play_time, GameEvent::PlayTime)?;
        push_snapshot(&mut events, &self.lineup, GameEvent::Lineup)?;
        push_snapshot(&mut events, &self.substitutions, GameEvent::Substitution)?;
        push_snapshot(&mut events, &self.availability, GameEvent::Availability)?;
        push_snapshot(&mut events, &self.plans, GameEvent::Plan)?;
        push_snapshot(&mut events, &self.rotations, GameEvent::Rotation)?;

        if !events.is_empty() {
            debug!("Change feed for game {} yielded {} events", self.game_id, events.len());
        }
        Ok(events)
    }
}

fn push_snapshot<T: Record>(
    events: &mut Vec<GameEvent>,
    subscription: &Subscription<T>,
    wrap: fn(Change<T>) -> GameEvent,
) -> Result<()> {
    if let Some(set) = subscription.latest()? {
        events.push(wrap(Change::Snapshot(set)));
    }
    Ok(())
}
