//! In-memory repository used by tests and by hosts without a backend.
//!
//! Behaves like a push-based store: every write fans the new result set out
//! to matching subscribers. Failures can be scripted per operation to
//! exercise partial-write paths.

use std::collections::BTreeMap;
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Filter, Record, Repository, Store, Subscription};
use crate::error::StoreError;
use crate::models::{
    Game, GamePlan, LineupAssignment, PlannedRotation, PlayTimeRecord, PlayerAvailability,
    Substitution,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
    Get,
    List,
    Subscribe,
}

#[derive(Debug)]
struct ScriptedFailure {
    operation: Operation,
    skip: usize,
}

struct Inner<T> {
    records: BTreeMap<String, T>,
    subscribers: Vec<(Filter, Sender<Vec<T>>)>,
    failures: Vec<ScriptedFailure>,
}

pub struct InMemoryRepository<T> {
    inner: Mutex<Inner<T>>,
}

impl<T: Record> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: BTreeMap::new(),
                subscribers: Vec::new(),
                failures: Vec::new(),
            }),
        }
    }

    /// Let `skip` calls of `operation` succeed, then fail the next one once.
    pub fn fail_next(&self, operation: Operation, skip: usize) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failures.push(ScriptedFailure { operation, skip });
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored row, in key order.
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.lock().map(|inner| inner.records.values().cloned().collect()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner<T>>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable(format!("{} store lock poisoned", T::ENTITY)))
    }
}

impl<T: Record> Inner<T> {
    fn check_failure(&mut self, operation: Operation) -> Result<(), StoreError> {
        let Some(index) = self.failures.iter().position(|f| f.operation == operation) else {
            return Ok(());
        };
        if self.failures[index].skip > 0 {
            self.failures[index].skip -= 1;
            return Ok(());
        }
        self.failures.remove(index);
        Err(StoreError::Unavailable(format!("scripted {:?} failure on {}", operation, T::ENTITY)))
    }

    fn result_set(&self, filter: &Filter) -> Vec<T> {
        self.records.values().filter(|r| filter.matches(*r)).cloned().collect()
    }

    fn publish(&mut self, changed: &T) {
        let sets: Vec<Option<Vec<T>>> = self
            .subscribers
            .iter()
            .map(|(filter, _)| filter.matches(changed).then(|| self.result_set(filter)))
            .collect();

        let mut index = 0;
        self.subscribers.retain(|(_, sender)| {
            let keep = match &sets[index] {
                Some(set) => sender.send(set.clone()).is_ok(),
                None => true,
            };
            index += 1;
            keep
        });
    }
}

impl<T: Record> Repository<T> for InMemoryRepository<T> {
    fn create(&self, record: T) -> Result<T, StoreError> {
        let mut inner = self.lock()?;
        inner.check_failure(Operation::Create)?;

        if let Some(existing) = inner.records.get(record.key()) {
            if existing == &record {
                return Ok(record);
            }
            return Err(StoreError::Conflict { entity: T::ENTITY, key: record.key().to_string() });
        }

        inner.records.insert(record.key().to_string(), record.clone());
        inner.publish(&record);
        Ok(record)
    }

    fn update(&self, record: T) -> Result<T, StoreError> {
        let mut inner = self.lock()?;
        inner.check_failure(Operation::Update)?;

        if !inner.records.contains_key(record.key()) {
            return Err(StoreError::NotFound { entity: T::ENTITY, key: record.key().to_string() });
        }

        inner.records.insert(record.key().to_string(), record.clone());
        inner.publish(&record);
        Ok(record)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.check_failure(Operation::Delete)?;

        if let Some(removed) = inner.records.remove(key) {
            inner.publish(&removed);
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<T>, StoreError> {
        let mut inner = self.lock()?;
        inner.check_failure(Operation::Get)?;
        Ok(inner.records.get(key).cloned())
    }

    fn list(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        let mut inner = self.lock()?;
        inner.check_failure(Operation::List)?;
        Ok(inner.result_set(filter))
    }

    fn subscribe(&self, filter: Filter) -> Result<Subscription<T>, StoreError> {
        let mut inner = self.lock()?;
        inner.check_failure(Operation::Subscribe)?;

        let (sender, receiver) = channel();
        let initial = inner.result_set(&filter);
        // The receiver is still in scope, so this cannot fail.
        let _ = sender.send(initial);
        inner.subscribers.push((filter, sender));
        Ok(Subscription::new(receiver))
    }
}

/// Typed handles to one in-memory repository per entity.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    pub games: Arc<InMemoryRepository<Game>>,
    pub play_time: Arc<InMemoryRepository<PlayTimeRecord>>,
    pub lineup: Arc<InMemoryRepository<LineupAssignment>>,
    pub substitutions: Arc<InMemoryRepository<Substitution>>,
    pub availability: Arc<InMemoryRepository<PlayerAvailability>>,
    pub plans: Arc<InMemoryRepository<GamePlan>>,
    pub rotations: Arc<InMemoryRepository<PlannedRotation>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Port view over the same repositories.
    pub fn store(&self) -> Store {
        Store {
            games: self.games.clone(),
            play_time: self.play_time.clone(),
            lineup: self.lineup.clone(),
            substitutions: self.substitutions.clone(),
            availability: self.availability.clone(),
            plans: self.plans.clone(),
            rotations: self.rotations.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GameId;

    fn record(id: &str, game: &str) -> PlayTimeRecord {
        let mut record = PlayTimeRecord::open(GameId::from(game), "p1".into(), "CB".into(), 0);
        record.id = id.into();
        record
    }

    #[test]
    fn test_create_replay_is_accepted_but_conflict_is_not() {
        let repo = InMemoryRepository::new();
        repo.create(record("r1", "g1")).unwrap();
        assert!(repo.create(record("r1", "g1")).is_ok());

        let mut changed = record("r1", "g1");
        changed.start_game_seconds = 10;
        assert!(matches!(repo.create(changed), Err(StoreError::Conflict { .. })));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_update_missing_is_not_found_and_delete_missing_is_ok() {
        let repo = InMemoryRepository::new();
        assert!(matches!(repo.update(record("r1", "g1")), Err(StoreError::NotFound { .. })));
        assert!(repo.delete("r1").is_ok());
    }

    #[test]
    fn test_subscription_pushes_initial_and_filtered_changes() {
        let repo = InMemoryRepository::new();
        repo.create(record("r1", "g1")).unwrap();
        let sub = repo.subscribe(Filter::game(&GameId::from("g1"))).unwrap();
        assert_eq!(sub.latest().unwrap().map(|s| s.len()), Some(1));

        repo.create(record("r2", "g2")).unwrap();
        assert_eq!(sub.latest().unwrap(), None);

        repo.create(record("r3", "g1")).unwrap();
        repo.delete("r1").unwrap();
        let latest = sub.latest().unwrap().unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].id.as_str(), "r3");
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let repo = InMemoryRepository::new();
        let sub = repo.subscribe(Filter::game(&GameId::from("g1"))).unwrap();
        drop(sub);
        repo.create(record("r1", "g1")).unwrap();
        assert_eq!(repo.inner.lock().unwrap().subscribers.len(), 0);
    }

    #[test]
    fn test_scripted_failure_fires_once_after_skips() {
        let repo = InMemoryRepository::new();
        repo.fail_next(Operation::Create, 1);
        assert!(repo.create(record("r1", "g1")).is_ok());
        assert!(matches!(repo.create(record("r2", "g1")), Err(StoreError::Unavailable(_))));
        assert!(repo.create(record("r2", "g1")).is_ok());
    }
}
