//! Substitution protocol.
//!
//! A substitution is four persisted steps: close the outgoing interval,
//! move the lineup assignment, open the incoming interval, append the audit
//! row. Each step is re-entrant, so a substitution that stopped half-way can
//! simply be presented again.

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use std::fmt;
use thiserror::Error;

use crate::availability::{check_eligibility, Ineligibility};
use crate::clock::GameOperation;
use crate::error::{GameError, Result};
use crate::models::{
    GameStatus, Half, LineupAssignment, PlayerId, PositionId, RecordId, Substitution,
};
use crate::repository::Store;
use crate::state::{Change, GameEvent, GameState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionRequest {
    pub position_id: PositionId,
    pub player_out_id: PlayerId,
    pub player_in_id: PlayerId,
    pub game_seconds: u32,
    pub half: Half,
}

impl fmt::Display for SubstitutionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} at {} ({}s, half {})",
            self.player_out_id, self.player_in_id, self.position_id, self.game_seconds, self.half
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstitutionStep {
    CloseOutgoing,
    ReplaceAssignment,
    OpenIncoming,
    RecordAudit,
}

impl fmt::Display for SubstitutionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubstitutionStep::CloseOutgoing => "close outgoing interval",
            SubstitutionStep::ReplaceAssignment => "replace lineup assignment",
            SubstitutionStep::OpenIncoming => "open incoming interval",
            SubstitutionStep::RecordAudit => "record substitution",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionOutcome {
    pub request: SubstitutionRequest,
    /// Audit row, absent when the game has not kicked off yet.
    pub substitution: Option<Substitution>,
    /// Steps that changed something on this run. Steps found already applied
    /// by an earlier attempt are not listed.
    pub applied: Vec<SubstitutionStep>,
}

/// A batch stopped at `failed_index`. Entries before it were fully applied;
/// entries after it were never attempted. `failed` can be re-presented as-is.
#[derive(Error, Debug)]
#[error("Substitution batch stopped at entry {failed_index} ({} applied): {error}", .applied.len())]
pub struct BatchFailure {
    pub applied: Vec<SubstitutionOutcome>,
    pub failed_index: usize,
    pub failed: SubstitutionRequest,
    pub error: GameError,
    pub not_attempted: Vec<SubstitutionRequest>,
}

/// Runs substitutions against a `GameState` and writes every step through
/// the store before applying it locally.
#[derive(Debug, Clone)]
pub struct SubstitutionExecutor {
    store: Store,
    players_on_field: Option<u32>,
}

impl SubstitutionExecutor {
    pub fn new(store: Store) -> Self {
        Self { store, players_on_field: None }
    }

    /// Cap on filled positions enforced by `assign_position`.
    pub fn with_players_on_field(mut self, limit: Option<u32>) -> Self {
        self.players_on_field = limit;
        self
    }

    /// Rejects before any mutation when the outgoing player does not hold the
    /// position or the incoming player may not enter.
    pub fn validate(&self, state: &GameState, request: &SubstitutionRequest) -> Result<()> {
        if state.game.status == GameStatus::Completed {
            return Err(GameError::InvalidTransition {
                operation: GameOperation::Substitute,
                status: state.game.status,
                half: state.game.current_half,
                running: false,
            });
        }

        let violation = |reason| GameError::EligibilityViolation {
            player_id: request.player_in_id.clone(),
            reason,
        };

        if request.player_in_id == request.player_out_id {
            return Err(violation(Ineligibility::SamePlayer));
        }

        let resuming = is_resuming(state, request);
        let occupant = state.assignment_at(&request.position_id).map(|a| &a.player_id);
        if occupant != Some(&request.player_out_id) && !resuming {
            return Err(GameError::PositionMismatch {
                position_id: request.position_id.clone(),
                player_id: request.player_out_id.clone(),
                occupant: occupant.cloned(),
            });
        }

        if let Some(position) = state.position_of(&request.player_in_id) {
            if position != &request.position_id {
                return Err(violation(Ineligibility::AlreadyAssigned { position_id: position.clone() }));
            }
        }
        if state.ledger.is_on_field(&request.player_in_id) && !resuming {
            return Err(violation(Ineligibility::AlreadyOnField));
        }

        check_eligibility(state.availability_of(&request.player_in_id), request.game_seconds / 60)
            .map_err(violation)
    }

    pub fn execute_substitution(
        &self,
        state: &mut GameState,
        request: &SubstitutionRequest,
        now: DateTime<Utc>,
    ) -> Result<SubstitutionOutcome> {
        self.validate(state, request)?;

        let tracks_time = tracks_play_time(state.game.status);
        let mut applied = Vec::new();

        // Nothing is written yet if closing fails, so its error is returned as-is.
        if tracks_time && self.close_outgoing(state, request)? {
            applied.push(SubstitutionStep::CloseOutgoing);
        }

        let mut completed = Vec::new();
        if tracks_time {
            completed.push(SubstitutionStep::CloseOutgoing);
        }
        let partial = |step: SubstitutionStep, completed: &[SubstitutionStep], source: GameError| {
            error!("Substitution {} failed at {}: {}", request, step, source);
            GameError::PartialSubstitutionFailure {
                request: request.clone(),
                completed: completed.to_vec(),
                failed_step: step,
                source: Box::new(source),
            }
        };

        if self.replace_assignment(state, request).map_err(|e| {
            partial(SubstitutionStep::ReplaceAssignment, &completed, e)
        })? {
            applied.push(SubstitutionStep::ReplaceAssignment);
        }
        completed.push(SubstitutionStep::ReplaceAssignment);

        if tracks_time
            && self
                .open_incoming(state, &request.player_in_id, &request.position_id, request.game_seconds)
                .map_err(|e| partial(SubstitutionStep::OpenIncoming, &completed, e))?
        {
            applied.push(SubstitutionStep::OpenIncoming);
        }
        completed.push(SubstitutionStep::OpenIncoming);

        let substitution = if state.game.status == GameStatus::Scheduled {
            None
        } else {
            let audit = Substitution {
                id: RecordId::generate(),
                game_id: state.game.id.clone(),
                player_out_id: Some(request.player_out_id.clone()),
                player_in_id: request.player_in_id.clone(),
                position_id: request.position_id.clone(),
                game_seconds: request.game_seconds,
                half: request.half,
                timestamp: now,
            };
            let (row, written) = self
                .record_audit(state, audit)
                .map_err(|e| partial(SubstitutionStep::RecordAudit, &completed, e))?;
            if written {
                applied.push(SubstitutionStep::RecordAudit);
            }
            Some(row)
        };

        info!("Substitution {} applied ({:?})", request, applied);
        Ok(SubstitutionOutcome { request: request.clone(), substitution, applied })
    }

    /// Apply in order; the first failure aborts the rest.
    pub fn execute_batch(
        &self,
        state: &mut GameState,
        requests: &[SubstitutionRequest],
        now: DateTime<Utc>,
    ) -> std::result::Result<Vec<SubstitutionOutcome>, BatchFailure> {
        let mut applied = Vec::with_capacity(requests.len());
        for (index, request) in requests.iter().enumerate() {
            match self.execute_substitution(state, request, now) {
                Ok(outcome) => applied.push(outcome),
                Err(error) => {
                    return Err(BatchFailure {
                        applied,
                        failed_index: index,
                        failed: request.clone(),
                        error,
                        not_attempted: requests[index + 1..].to_vec(),
                    });
                }
            }
        }
        Ok(applied)
    }

    /// Fill a vacant position. Opens an interval once the game has kicked off
    /// and writes an audit row only while the clock is running.
    pub fn assign_position(
        &self,
        state: &mut GameState,
        position_id: &PositionId,
        player_id: &PlayerId,
        game_seconds: u32,
        now: DateTime<Utc>,
    ) -> Result<LineupAssignment> {
        if state.game.status == GameStatus::Completed {
            return Err(GameError::InvalidTransition {
                operation: GameOperation::Substitute,
                status: state.game.status,
                half: state.game.current_half,
                running: false,
            });
        }

        if let Some(existing) = state.assignment_at(position_id) {
            if &existing.player_id == player_id {
                return Ok(existing.clone());
            }
            return Err(GameError::PositionOccupied {
                position_id: position_id.clone(),
                player_id: existing.player_id.clone(),
            });
        }

        if let Some(limit) = self.players_on_field {
            if state.lineup.len() >= limit as usize {
                return Err(GameError::LineupFull { position_id: position_id.clone(), limit });
            }
        }

        let violation = |reason| GameError::EligibilityViolation { player_id: player_id.clone(), reason };
        if let Some(position) = state.position_of(player_id) {
            return Err(violation(Ineligibility::AlreadyAssigned { position_id: position.clone() }));
        }
        if state.ledger.is_on_field(player_id) {
            return Err(violation(Ineligibility::AlreadyOnField));
        }
        check_eligibility(state.availability_of(player_id), game_seconds / 60).map_err(violation)?;

        let assignment = LineupAssignment::new(
            state.game.id.clone(),
            position_id.clone(),
            player_id.clone(),
            state.game.status == GameStatus::Scheduled,
        );
        let assignment = self.store.lineup.create(assignment)?;
        state.apply(GameEvent::Lineup(Change::Upsert(assignment.clone())));

        if tracks_play_time(state.game.status) {
            self.open_incoming(state, player_id, position_id, game_seconds)?;
        }

        if state.game.is_running() {
            let audit = Substitution {
                id: RecordId::generate(),
                game_id: state.game.id.clone(),
                player_out_id: None,
                player_in_id: player_id.clone(),
                position_id: position_id.clone(),
                game_seconds,
                half: state.game.current_half,
                timestamp: now,
            };
            self.record_audit(state, audit)?;
        }

        debug!("Assigned {} to {}", player_id, position_id);
        Ok(assignment)
    }

    /// Take a player off the field without a replacement: close their
    /// interval and free their position.
    pub fn vacate_player(
        &self,
        state: &mut GameState,
        player_id: &PlayerId,
        game_seconds: u32,
    ) -> Result<()> {
        if let Some(closed) = state.ledger.closing(player_id, game_seconds) {
            let closed = self.store.play_time.update(closed)?;
            state.apply(GameEvent::PlayTime(Change::Upsert(closed)));
        }

        let assignment_ids: Vec<RecordId> = state
            .lineup
            .iter()
            .filter(|a| &a.player_id == player_id)
            .map(|a| a.id.clone())
            .collect();
        for id in assignment_ids {
            self.store.lineup.delete(id.as_str())?;
            state.apply(GameEvent::Lineup(Change::Remove(id.as_str().to_string())));
        }
        Ok(())
    }

    /// Returns whether anything was written.
    fn close_outgoing(&self, state: &mut GameState, request: &SubstitutionRequest) -> Result<bool> {
        let Some(closed) = state.ledger.closing(&request.player_out_id, request.game_seconds) else {
            return Ok(false);
        };
        let closed = self.store.play_time.update(closed)?;
        state.apply(GameEvent::PlayTime(Change::Upsert(closed)));
        Ok(true)
    }

    fn replace_assignment(&self, state: &mut GameState, request: &SubstitutionRequest) -> Result<bool> {
        let Some(current) = state.assignment_at(&request.position_id) else {
            return Err(GameError::PositionMismatch {
                position_id: request.position_id.clone(),
                player_id: request.player_out_id.clone(),
                occupant: None,
            });
        };
        if current.player_id == request.player_in_id {
            return Ok(false);
        }

        let mut next = current.clone();
        next.player_id = request.player_in_id.clone();
        next.is_starter = state.game.status == GameStatus::Scheduled;
        let updated = self.store.lineup.update(next)?;
        state.apply(GameEvent::Lineup(Change::Upsert(updated)));
        Ok(true)
    }

    /// An already-open interval counts as done.
    pub(crate) fn open_incoming(
        &self,
        state: &mut GameState,
        player_id: &PlayerId,
        position_id: &PositionId,
        at: u32,
    ) -> Result<bool> {
        let record = match state.ledger.opening(player_id, position_id, at) {
            Ok(record) => record,
            Err(GameError::DuplicateOpenInterval { record_id, .. }) => {
                debug!("{} already on field via {}, treating open as applied", player_id, record_id);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        let record = self.store.play_time.create(record)?;
        state.apply(GameEvent::PlayTime(Change::Upsert(record)));
        Ok(true)
    }

    pub(crate) fn record_audit(
        &self,
        state: &mut GameState,
        audit: Substitution,
    ) -> Result<(Substitution, bool)> {
        if let Some(existing) = state.substitutions.iter().find(|s| s.describes_same_change(&audit)) {
            return Ok((existing.clone(), false));
        }
        let audit = self.store.substitutions.create(audit)?;
        state.apply(GameEvent::Substitution(Change::Upsert(audit.clone())));
        Ok((audit, true))
    }
}

/// Intervals are only opened or closed once the game has kicked off.
fn tracks_play_time(status: GameStatus) -> bool {
    matches!(status, GameStatus::InProgress | GameStatus::Halftime)
}

/// The incoming player already holds the target position and the outgoing
/// player is off the field: an earlier attempt got past the lineup step.
fn is_resuming(state: &GameState, request: &SubstitutionRequest) -> bool {
    state
        .assignment_at(&request.position_id)
        .is_some_and(|a| a.player_id == request.player_in_id)
        && !state.ledger.is_on_field(&request.player_out_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvailabilityStatus, Game, PlayTimeRecord, PlayerAvailability};
    use crate::repository::{InMemoryStore, Operation, Repository};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 14, 10, 10, 0).unwrap()
    }

    struct Fixture {
        backend: InMemoryStore,
        executor: SubstitutionExecutor,
        state: GameState,
    }

    /// Running game with p1..=p3 on the field at CB/LB/ST since kickoff.
    fn fixture() -> Fixture {
        let backend = InMemoryStore::new();
        let executor = SubstitutionExecutor::new(backend.store());

        let mut game = Game::scheduled("g1", "t1");
        game.status = GameStatus::InProgress;
        game.last_start_time = Some(now());
        let mut state = GameState::new(game);

        for (n, pos) in [(1, "CB"), (2, "LB"), (3, "ST")] {
            let player = PlayerId::new(format!("p{}", n));
            let assignment =
                LineupAssignment::new("g1".into(), pos.into(), player.clone(), true);
            backend.lineup.create(assignment.clone()).unwrap();
            state.apply(GameEvent::Lineup(Change::Upsert(assignment)));

            let record = PlayTimeRecord::open("g1".into(), player, pos.into(), 0);
            backend.play_time.create(record.clone()).unwrap();
            state.apply(GameEvent::PlayTime(Change::Upsert(record)));
        }

        Fixture { backend, executor, state }
    }

    fn request(out: &str, inn: &str, pos: &str, at: u32) -> SubstitutionRequest {
        SubstitutionRequest {
            position_id: pos.into(),
            player_out_id: out.into(),
            player_in_id: inn.into(),
            game_seconds: at,
            half: Half::First,
        }
    }

    #[test]
    fn test_substitution_swaps_intervals_and_records_audit() {
        let Fixture { backend, executor, mut state } = fixture();
        let outcome = executor
            .execute_substitution(&mut state, &request("p1", "p4", "CB", 600), now())
            .unwrap();

        assert_eq!(outcome.applied.len(), 4);
        let p1 = PlayerId::from("p1");
        let p4 = PlayerId::from("p4");
        assert!(!state.ledger.is_on_field(&p1));
        assert_eq!(state.ledger.cumulative_play_time(&p1, 900), 600);
        assert_eq!(state.ledger.open_record(&p4).map(|r| r.start_game_seconds), Some(600));
        assert_eq!(state.assignment_at(&"CB".into()).map(|a| a.player_id.clone()), Some(p4));

        let audits = backend.substitutions.snapshot();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].game_seconds, 600);
        assert_eq!(backend.lineup.len(), 3);
    }

    #[test]
    fn test_incoming_player_already_on_field_is_rejected_untouched() {
        let Fixture { backend, executor, mut state } = fixture();
        let before = state.clone();
        let err = executor
            .execute_substitution(&mut state, &request("p1", "p2", "CB", 600), now())
            .unwrap_err();
        assert!(matches!(
            err,
            GameError::EligibilityViolation { reason: Ineligibility::AlreadyAssigned { .. }, .. }
        ));
        assert_eq!(state, before);
        assert!(backend.substitutions.is_empty());
    }

    #[test]
    fn test_outgoing_player_must_hold_the_position() {
        let Fixture { backend, executor, mut state } = fixture();
        let before = state.clone();

        let err = executor
            .execute_substitution(&mut state, &request("p1", "p4", "LB", 600), now())
            .unwrap_err();
        match err {
            GameError::PositionMismatch { position_id, player_id, occupant } => {
                assert_eq!(position_id, PositionId::from("LB"));
                assert_eq!(player_id, PlayerId::from("p1"));
                assert_eq!(occupant, Some(PlayerId::from("p2")));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(state, before);
        assert!(backend.play_time.snapshot().iter().all(|r| r.is_open()));
        assert!(backend.substitutions.is_empty());

        executor.vacate_player(&mut state, &"p3".into(), 300).unwrap();
        let err = executor
            .execute_substitution(&mut state, &request("p3", "p4", "ST", 600), now())
            .unwrap_err();
        assert!(matches!(err, GameError::PositionMismatch { occupant: None, .. }));
    }

    #[test]
    fn test_unavailable_player_is_rejected() {
        let Fixture { executor, mut state, .. } = fixture();
        let mut absent = PlayerAvailability::available("g1".into(), "p4".into());
        absent.status = AvailabilityStatus::Absent;
        state.apply(GameEvent::Availability(Change::Upsert(absent)));

        let err = executor
            .execute_substitution(&mut state, &request("p1", "p4", "CB", 600), now())
            .unwrap_err();
        assert!(matches!(
            err,
            GameError::EligibilityViolation { reason: Ineligibility::Absent, .. }
        ));
        assert!(state.ledger.is_on_field(&"p1".into()));
    }

    #[test]
    fn test_resubmitting_completed_substitution_changes_nothing() {
        let Fixture { backend, executor, mut state } = fixture();
        let req = request("p1", "p4", "CB", 600);
        executor.execute_substitution(&mut state, &req, now()).unwrap();
        let again = executor.execute_substitution(&mut state, &req, now()).unwrap();

        assert!(again.applied.is_empty());
        assert_eq!(backend.substitutions.len(), 1);
        assert_eq!(backend.play_time.len(), 4);
    }

    #[test]
    fn test_batch_failure_reports_partial_progress_and_retry_recovers() {
        let Fixture { backend, executor, mut state } = fixture();
        // First lineup update succeeds, second fails.
        backend.lineup.fail_next(Operation::Update, 1);

        let batch = vec![
            request("p1", "p4", "CB", 600),
            request("p2", "p5", "LB", 600),
            request("p3", "p6", "ST", 600),
        ];
        let failure = executor.execute_batch(&mut state, &batch, now()).unwrap_err();

        assert_eq!(failure.applied.len(), 1);
        assert_eq!(failure.failed_index, 1);
        assert_eq!(failure.not_attempted, vec![batch[2].clone()]);
        match &failure.error {
            GameError::PartialSubstitutionFailure { completed, failed_step, .. } => {
                assert_eq!(completed, &vec![SubstitutionStep::CloseOutgoing]);
                assert_eq!(*failed_step, SubstitutionStep::ReplaceAssignment);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(!state.ledger.is_on_field(&"p2".into()));
        assert!(!state.ledger.is_on_field(&"p5".into()));
        assert!(state.ledger.is_on_field(&"p3".into()));

        let retry = executor.execute_substitution(&mut state, &batch[1], now()).unwrap();
        assert!(!retry.applied.contains(&SubstitutionStep::CloseOutgoing));
        let p2_closed: Vec<_> = backend
            .play_time
            .snapshot()
            .into_iter()
            .filter(|r| r.player_id.as_str() == "p2")
            .collect();
        assert_eq!(p2_closed.len(), 1);
        assert_eq!(p2_closed[0].end_game_seconds, Some(600));
        assert!(state.ledger.is_on_field(&"p5".into()));
        assert_eq!(backend.substitutions.len(), 2);
    }

    #[test]
    fn test_retry_after_open_succeeded_but_audit_failed() {
        let Fixture { backend, executor, mut state } = fixture();
        backend.substitutions.fail_next(Operation::Create, 0);
        let req = request("p1", "p4", "CB", 600);

        let err = executor.execute_substitution(&mut state, &req, now()).unwrap_err();
        assert!(matches!(
            err,
            GameError::PartialSubstitutionFailure { failed_step: SubstitutionStep::RecordAudit, .. }
        ));

        let retry = executor.execute_substitution(&mut state, &req, now()).unwrap();
        assert_eq!(retry.applied, vec![SubstitutionStep::RecordAudit]);
        assert_eq!(backend.play_time.len(), 4);
    }

    #[test]
    fn test_pre_kickoff_swap_only_touches_lineup() {
        let backend = InMemoryStore::new();
        let executor = SubstitutionExecutor::new(backend.store());
        let mut state = GameState::new(Game::scheduled("g1", "t1"));

        let assigned = executor
            .assign_position(&mut state, &"GK".into(), &"p1".into(), 0, now())
            .unwrap();
        assert!(assigned.is_starter);

        let outcome = executor
            .execute_substitution(&mut state, &request("p1", "p2", "GK", 0), now())
            .unwrap();
        assert!(outcome.substitution.is_none());
        assert!(backend.play_time.is_empty());
        assert!(backend.substitutions.is_empty());
        assert_eq!(state.lineup_map().get(&PositionId::from("GK")), Some(&PlayerId::from("p2")));
    }

    #[test]
    fn test_pre_kickoff_failure_reports_only_steps_that_ran() {
        let backend = InMemoryStore::new();
        let executor = SubstitutionExecutor::new(backend.store());
        let mut state = GameState::new(Game::scheduled("g1", "t1"));
        executor.assign_position(&mut state, &"GK".into(), &"p1".into(), 0, now()).unwrap();
        backend.lineup.fail_next(Operation::Update, 0);

        let err = executor
            .execute_substitution(&mut state, &request("p1", "p2", "GK", 0), now())
            .unwrap_err();
        match err {
            GameError::PartialSubstitutionFailure { completed, failed_step, .. } => {
                assert!(completed.is_empty());
                assert_eq!(failed_step, SubstitutionStep::ReplaceAssignment);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_assign_position_respects_players_on_field() {
        let Fixture { backend, mut state, .. } = fixture();
        let executor = SubstitutionExecutor::new(backend.store()).with_players_on_field(Some(3));

        let err = executor
            .assign_position(&mut state, &"RB".into(), &"p4".into(), 300, now())
            .unwrap_err();
        assert!(matches!(err, GameError::LineupFull { limit: 3, .. }));
        assert_eq!(backend.lineup.len(), 3);
        assert!(!state.ledger.is_on_field(&"p4".into()));

        executor.vacate_player(&mut state, &"p3".into(), 300).unwrap();
        executor.assign_position(&mut state, &"RB".into(), &"p4".into(), 300, now()).unwrap();
        assert_eq!(backend.lineup.len(), 3);
    }

    #[test]
    fn test_assign_position_while_running_opens_and_audits() {
        let Fixture { backend, executor, mut state } = fixture();
        executor.vacate_player(&mut state, &"p3".into(), 300).unwrap();
        assert!(state.assignment_at(&"ST".into()).is_none());

        executor.assign_position(&mut state, &"ST".into(), &"p7".into(), 320, now()).unwrap();
        assert_eq!(state.ledger.open_record(&"p7".into()).map(|r| r.start_game_seconds), Some(320));
        let audits = backend.substitutions.snapshot();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].player_out_id, None);

        let err = executor
            .assign_position(&mut state, &"ST".into(), &"p8".into(), 330, now())
            .unwrap_err();
        assert!(matches!(err, GameError::PositionOccupied { .. }));
    }
}
