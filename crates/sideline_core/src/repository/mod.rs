//! Storage port.
//!
//! The core only ever talks to a `Repository` per entity. Writes are assumed
//! to be eventually delivered; subscriptions push the full current result set
//! at least once per change, so consumers must treat repeats as no-ops.

pub mod memory;

use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;

use crate::error::StoreError;
use crate::models::{
    Game, GameId, GamePlan, LineupAssignment, PlannedRotation, PlayTimeRecord,
    PlayerAvailability, Substitution,
};

pub use memory::{InMemoryRepository, InMemoryStore, Operation};

/// Row that can live in a repository.
pub trait Record: Clone + PartialEq + Send + 'static {
    const ENTITY: &'static str;

    fn key(&self) -> &str;
    fn game_id(&self) -> &GameId;
}

/// Every query in this crate is scoped to one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub game_id: GameId,
}

impl Filter {
    pub fn game(game_id: &GameId) -> Self {
        Self { game_id: game_id.clone() }
    }

    pub fn matches<T: Record>(&self, record: &T) -> bool {
        record.game_id() == &self.game_id
    }
}

/// Push stream of result sets.
#[derive(Debug)]
pub struct Subscription<T> {
    receiver: Receiver<Vec<T>>,
}

impl<T> Subscription<T> {
    pub fn new(receiver: Receiver<Vec<T>>) -> Self {
        Self { receiver }
    }

    /// Most recent pending result set, skipping older ones. `Ok(None)` when
    /// nothing new has arrived.
    pub fn latest(&self) -> Result<Option<Vec<T>>, StoreError> {
        let mut latest = None;
        loop {
            match self.receiver.try_recv() {
                Ok(set) => latest = Some(set),
                Err(TryRecvError::Empty) => return Ok(latest),
                Err(TryRecvError::Disconnected) => {
                    return match latest {
                        Some(set) => Ok(Some(set)),
                        None => Err(StoreError::Unavailable("subscription closed".to_string())),
                    };
                }
            }
        }
    }
}

pub trait Repository<T: Record>: Send + Sync {
    /// Creating a row identical to an existing one is accepted as a replay.
    fn create(&self, record: T) -> Result<T, StoreError>;
    fn update(&self, record: T) -> Result<T, StoreError>;
    /// Deleting a missing row is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
    fn get(&self, key: &str) -> Result<Option<T>, StoreError>;
    fn list(&self, filter: &Filter) -> Result<Vec<T>, StoreError>;
    /// The current result set is pushed immediately, then after every change.
    fn subscribe(&self, filter: Filter) -> Result<Subscription<T>, StoreError>;
}

/// One repository handle per entity, injected into the session.
#[derive(Clone)]
pub struct Store {
    pub games: Arc<dyn Repository<Game>>,
    pub play_time: Arc<dyn Repository<PlayTimeRecord>>,
    pub lineup: Arc<dyn Repository<LineupAssignment>>,
    pub substitutions: Arc<dyn Repository<Substitution>>,
    pub availability: Arc<dyn Repository<PlayerAvailability>>,
    pub plans: Arc<dyn Repository<GamePlan>>,
    pub rotations: Arc<dyn Repository<PlannedRotation>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Record for Game {
    const ENTITY: &'static str = "Game";

    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn game_id(&self) -> &GameId {
        &self.id
    }
}

macro_rules! game_scoped_record {
    ($ty:ty, $entity:literal) => {
        impl Record for $ty {
            const ENTITY: &'static str = $entity;

            fn key(&self) -> &str {
                self.id.as_str()
            }

            fn game_id(&self) -> &GameId {
                &self.game_id
            }
        }
    };
}

game_scoped_record!(PlayTimeRecord, "PlayTimeRecord");
game_scoped_record!(LineupAssignment, "LineupAssignment");
game_scoped_record!(Substitution, "Substitution");
game_scoped_record!(PlayerAvailability, "PlayerAvailability");
game_scoped_record!(GamePlan, "GamePlan");
game_scoped_record!(PlannedRotation, "PlannedRotation");
