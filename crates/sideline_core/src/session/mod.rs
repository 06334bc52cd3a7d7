//! Live game session.
//!
//! Drives one game for one coach. Clock transitions, substitutions,
//! availability changes and rotations are written through the injected
//! `Store` first and then folded into the local `GameState`, so a failed
//! write never leaves the local view ahead of the store.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};

use crate::availability::{AvailabilityTracker, MatchMoment};
use crate::clock::{AutoTransition, GameClock, GameOperation, LedgerEffect, Transition};
use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::feed::ChangeFeed;
use crate::models::{
    AvailabilityStatus, Game, GameId, GameStatus, Lineup, LineupAssignment, PlannedRotation,
    PlannedSubstitution, PlayerAvailability, PlayerId, PositionId, RecordId,
};
use crate::repository::{Filter, Store};
use crate::report::PlayTimeReport;
use crate::resume::{ResumeDecision, ResumeRecord};
use crate::rotation;
use crate::state::{Change, GameEvent, GameState, Origin};
use crate::substitution::{SubstitutionExecutor, SubstitutionOutcome, SubstitutionRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSide {
    Ours,
    Opponent,
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub game_seconds: u32,
    pub auto_transition: Option<AutoTransition>,
    pub checkpointed: bool,
    /// Rotations to announce now, one minute ahead.
    pub due_rotations: Vec<PlannedRotation>,
}

#[derive(Debug)]
pub struct LiveGameSession {
    store: Store,
    config: GameConfig,
    clock: GameClock,
    tracker: AvailabilityTracker,
    executor: SubstitutionExecutor,
    state: GameState,
    feed: Option<ChangeFeed>,
    last_checkpoint: Option<DateTime<Utc>>,
}

impl LiveGameSession {
    /// Persist a new game and open a session on it.
    pub fn schedule(store: Store, game: Game, config: GameConfig) -> Result<Self> {
        let game = store.games.create(game)?;
        Self::load(store, &game.id, config)
    }

    /// Re-hydrate everything stored for `game_id`. A loaded session does not
    /// own a running clock until it writes the clock itself.
    pub fn load(store: Store, game_id: &GameId, config: GameConfig) -> Result<Self> {
        config.ensure_valid()?;

        let game = store
            .games
            .get(game_id.as_str())?
            .ok_or_else(|| GameError::NotFound { entity: "Game", key: game_id.to_string() })?;

        let filter = Filter::game(game_id);
        let mut state = GameState::new(game);
        state.apply(GameEvent::PlayTime(Change::Snapshot(store.play_time.list(&filter)?)));
        state.apply(GameEvent::Lineup(Change::Snapshot(store.lineup.list(&filter)?)));
        state.apply(GameEvent::Substitution(Change::Snapshot(store.substitutions.list(&filter)?)));
        state.apply(GameEvent::Availability(Change::Snapshot(store.availability.list(&filter)?)));
        state.apply(GameEvent::Plan(Change::Snapshot(store.plans.list(&filter)?)));
        state.apply(GameEvent::Rotation(Change::Snapshot(store.rotations.list(&filter)?)));

        info!(
            "Loaded game {} ({} at {}s, {} play-time records)",
            state.game.id,
            state.game.status,
            state.game.elapsed_seconds,
            state.ledger.records().len()
        );

        Ok(Self {
            clock: GameClock::new(&config),
            tracker: AvailabilityTracker::new(&config),
            executor: SubstitutionExecutor::new(store.clone())
                .with_players_on_field(config.players_on_field),
            store,
            config,
            state,
            feed: None,
            last_checkpoint: None,
        })
    }

    /// Pick up the game named by a resume pointer. `Ok(None)` when the
    /// pointer should be thrown away.
    pub fn from_resume_record(
        store: Store,
        record: ResumeRecord,
        now: DateTime<Utc>,
        config: GameConfig,
    ) -> Result<Option<Self>> {
        let game_id = record.game_id.clone();
        let game = store.games.get(game_id.as_str())?;
        let max_age = Duration::seconds(i64::from(config.resume_max_age_seconds));

        match record.resolve(game.as_ref(), now, max_age) {
            ResumeDecision::Resume(_) => Self::load(store, &game_id, config).map(Some),
            ResumeDecision::Discard(reason) => {
                info!("Discarding resume pointer for game {}: {}", game_id, reason);
                Ok(None)
            }
        }
    }

    pub fn resume_record(&self, now: DateTime<Utc>) -> ResumeRecord {
        ResumeRecord::new(self.state.game.id.clone(), self.state.game.team_id.clone(), now)
    }

    pub fn connect_feed(&mut self) -> Result<()> {
        self.feed = Some(ChangeFeed::connect(&self.store, &self.state.game.id)?);
        Ok(())
    }

    /// Apply whatever other devices wrote since the last poll. Returns the
    /// number of events folded in.
    pub fn poll_remote(&mut self) -> Result<usize> {
        let Some(feed) = &self.feed else {
            return Ok(0);
        };
        let events = feed.poll()?;
        let count = events.len();
        for event in events {
            self.state.apply(event);
        }
        Ok(count)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn game(&self) -> &Game {
        &self.state.game
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn game_seconds(&self, now: DateTime<Utc>) -> u32 {
        GameClock::current_game_seconds(&self.state.game, now)
    }

    pub fn moment(&self, now: DateTime<Utc>) -> MatchMoment {
        MatchMoment { half: self.state.game.current_half, game_seconds: self.game_seconds(now) }
    }

    pub fn report(&self, now: DateTime<Utc>) -> PlayTimeReport {
        PlayTimeReport::build(&self.state, now)
    }

    // ============================================
    // Clock
    // ============================================

    #[tracing::instrument(skip_all, fields(game = %self.state.game.id))]
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        let transition = self.clock.start(&self.state.game, now)?;
        self.commit(transition, now)?;
        info!(
            "Game {} kicked off with {} players on the field",
            self.state.game.id,
            self.state.ledger.on_field_players().len()
        );
        Ok(())
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<()> {
        let transition = self.clock.pause(&self.state.game, now)?;
        self.commit(transition, now)?;
        info!("Game {} paused at {}s", self.state.game.id, self.state.game.elapsed_seconds);
        Ok(())
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<()> {
        let transition = self.clock.resume(&self.state.game, now)?;
        self.commit(transition, now)?;
        info!("Game {} resumed at {}s", self.state.game.id, self.state.game.elapsed_seconds);
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(game = %self.state.game.id))]
    pub fn go_to_halftime(&mut self, now: DateTime<Utc>) -> Result<()> {
        let transition = self.clock.go_to_halftime(&self.state.game, now)?;
        self.commit(transition, now)?;
        info!("Game {} at halftime after {}s", self.state.game.id, self.state.game.elapsed_seconds);
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(game = %self.state.game.id))]
    pub fn start_second_half(&mut self, now: DateTime<Utc>) -> Result<()> {
        let transition = self.clock.start_second_half(&self.state.game, now)?;
        self.commit(transition, now)?;
        info!("Game {} second half under way", self.state.game.id);
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(game = %self.state.game.id))]
    pub fn end(&mut self, now: DateTime<Utc>) -> Result<()> {
        let transition = self.clock.end(&self.state.game, now)?;
        self.commit(transition, now)?;
        info!(
            "Game {} ended at {}s ({}-{})",
            self.state.game.id,
            self.state.game.elapsed_seconds,
            self.state.game.our_score,
            self.state.game.opponent_score
        );
        Ok(())
    }

    /// Advance the clock: fire a due auto transition, otherwise persist a
    /// checkpoint when one is due. Checkpoint write failures are logged and
    /// the local clock carries on.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<TickOutcome> {
        let mut auto_transition = None;
        let mut checkpointed = false;

        if let Some(auto) = self.clock.due_auto_transition(&self.state.game, now)? {
            info!("Game {} auto transition {:?}", self.state.game.id, auto);
            let transition = self.clock.apply_auto(&self.state.game, auto)?;
            self.commit(transition, now)?;
            auto_transition = Some(auto);
        } else if self.checkpoint_due(now) {
            checkpointed = self.checkpoint(now);
        }

        let game_seconds = self.game_seconds(now);
        let due_rotations: Vec<PlannedRotation> =
            self.due_rotations(now).into_iter().cloned().collect();
        debug!("Tick {}s (checkpointed: {})", game_seconds, checkpointed);

        Ok(TickOutcome { game_seconds, auto_transition, checkpointed, due_rotations })
    }

    fn checkpoint_due(&self, now: DateTime<Utc>) -> bool {
        if !self.state.game.is_running() {
            return false;
        }
        let interval = Duration::seconds(i64::from(self.config.checkpoint_interval_seconds));
        self.last_checkpoint.map_or(true, |last| now - last >= interval)
    }

    /// Returns whether the store accepted the checkpoint.
    fn checkpoint(&mut self, now: DateTime<Utc>) -> bool {
        self.last_checkpoint = Some(now);
        let next = GameClock::checkpoint(&self.state.game, now);
        if next == self.state.game {
            return false;
        }

        let written = self
            .with_stored_fields(next.clone())
            .and_then(|merged| Ok(self.store.games.update(merged)?));
        match written {
            Ok(game) => {
                self.state.apply(GameEvent::Game { game, origin: Origin::Local });
                true
            }
            Err(e) => {
                warn!("Checkpoint for game {} at {}s failed: {}", next.id, next.elapsed_seconds, e);
                self.state.apply(GameEvent::Game { game: next, origin: Origin::Local });
                false
            }
        }
    }

    /// Take the fields this session does not own (score, opponent) from the
    /// stored game, so a clock write never rolls back another device's edit.
    fn with_stored_fields(&self, mut next: Game) -> Result<Game> {
        if let Some(stored) = self.store.games.get(next.id.as_str())? {
            next.our_score = stored.our_score;
            next.opponent_score = stored.opponent_score;
            next.opponent = stored.opponent;
        }
        Ok(next)
    }

    /// Ledger first, then the game. Closes therefore always land before the
    /// status change, and a retried start finds its intervals already open.
    fn commit(&mut self, transition: Transition, now: DateTime<Utc>) -> Result<()> {
        let Transition { game, effect } = transition;
        match effect {
            LedgerEffect::None => {}
            LedgerEffect::OpenStarters { at } => self.open_lineup(at, true)?,
            LedgerEffect::OpenLineup { at } => self.open_lineup(at, false)?,
            LedgerEffect::CloseAll { at } => self.close_all(at)?,
        }

        let game = self.store.games.update(self.with_stored_fields(game)?)?;
        self.state.apply(GameEvent::Game { game, origin: Origin::Local });
        self.last_checkpoint = Some(now);
        Ok(())
    }

    fn open_lineup(&mut self, at: u32, starters_only: bool) -> Result<()> {
        let entering: Vec<(PlayerId, PositionId)> = self
            .state
            .lineup
            .iter()
            .filter(|a| a.is_starter || !starters_only)
            .map(|a| (a.player_id.clone(), a.position_id.clone()))
            .collect();

        for (player_id, position_id) in entering {
            self.executor.open_incoming(&mut self.state, &player_id, &position_id, at)?;
        }
        Ok(())
    }

    fn close_all(&mut self, at: u32) -> Result<()> {
        for record in self.state.ledger.closing_all(None, at) {
            let record = self.store.play_time.update(record)?;
            self.state.apply(GameEvent::PlayTime(Change::Upsert(record)));
        }
        Ok(())
    }

    // ============================================
    // Score
    // ============================================

    pub fn record_goal(&mut self, side: ScoreSide, now: DateTime<Utc>) -> Result<()> {
        self.write_score(now, |game| match side {
            ScoreSide::Ours => game.our_score += 1,
            ScoreSide::Opponent => game.opponent_score += 1,
        })
    }

    pub fn set_score(&mut self, ours: u32, theirs: u32, now: DateTime<Utc>) -> Result<()> {
        self.write_score(now, |game| {
            game.our_score = ours;
            game.opponent_score = theirs;
        })
    }

    /// The clock is folded in first so the written snapshot is never behind
    /// what other devices already hold. Goals count from the stored score.
    fn write_score(&mut self, now: DateTime<Utc>, update: impl FnOnce(&mut Game)) -> Result<()> {
        if self.state.game.status == GameStatus::Scheduled {
            return Err(GameError::InvalidTransition {
                operation: GameOperation::RecordScore,
                status: self.state.game.status,
                half: self.state.game.current_half,
                running: false,
            });
        }

        let mut next = self.with_stored_fields(GameClock::checkpoint(&self.state.game, now))?;
        update(&mut next);
        let game = self.store.games.update(next)?;
        info!("Game {} score {}-{}", game.id, game.our_score, game.opponent_score);
        self.state.apply(GameEvent::Game { game, origin: Origin::Local });
        Ok(())
    }

    // ============================================
    // Substitutions
    // ============================================

    pub fn substitution_request(
        &self,
        position_id: &PositionId,
        player_out_id: &PlayerId,
        player_in_id: &PlayerId,
        now: DateTime<Utc>,
    ) -> SubstitutionRequest {
        SubstitutionRequest {
            position_id: position_id.clone(),
            player_out_id: player_out_id.clone(),
            player_in_id: player_in_id.clone(),
            game_seconds: self.game_seconds(now),
            half: self.state.game.current_half,
        }
    }

    #[tracing::instrument(skip_all, fields(game = %self.state.game.id, position = %position_id))]
    pub fn substitute(
        &mut self,
        position_id: &PositionId,
        player_out_id: &PlayerId,
        player_in_id: &PlayerId,
        now: DateTime<Utc>,
    ) -> Result<SubstitutionOutcome> {
        let request = self.substitution_request(position_id, player_out_id, player_in_id, now);
        self.executor.execute_substitution(&mut self.state, &request, now)
    }

    /// Run a request exactly as given, game seconds included. Used to
    /// re-present a substitution that stopped part-way.
    pub fn execute_request(
        &mut self,
        request: &SubstitutionRequest,
        now: DateTime<Utc>,
    ) -> Result<SubstitutionOutcome> {
        self.executor.execute_substitution(&mut self.state, request, now)
    }

    /// All entries share the current game second. Failures come back as
    /// `GameError::Batch`.
    #[tracing::instrument(skip_all, fields(game = %self.state.game.id, size = substitutions.len()))]
    pub fn execute_batch(
        &mut self,
        substitutions: &[PlannedSubstitution],
        now: DateTime<Utc>,
    ) -> Result<Vec<SubstitutionOutcome>> {
        let requests: Vec<SubstitutionRequest> = substitutions
            .iter()
            .map(|s| self.substitution_request(&s.position_id, &s.player_out_id, &s.player_in_id, now))
            .collect();
        Ok(self.executor.execute_batch(&mut self.state, &requests, now)?)
    }

    pub fn assign_position(
        &mut self,
        position_id: &PositionId,
        player_id: &PlayerId,
        now: DateTime<Utc>,
    ) -> Result<LineupAssignment> {
        let at = self.game_seconds(now);
        self.executor.assign_position(&mut self.state, position_id, player_id, at, now)
    }

    /// Fill every empty position named in `lineup`. Positions already held
    /// are left alone.
    pub fn assign_lineup(
        &mut self,
        lineup: &Lineup,
        now: DateTime<Utc>,
    ) -> Result<Vec<LineupAssignment>> {
        let mut assigned = Vec::new();
        for (position_id, player_id) in lineup {
            if self.state.assignment_at(position_id).is_some() {
                continue;
            }
            assigned.push(self.assign_position(position_id, player_id, now)?);
        }
        Ok(assigned)
    }

    // ============================================
    // Availability
    // ============================================

    /// Stored row, or a fresh "available" row when none exists yet.
    pub fn availability(&self, player_id: &PlayerId) -> PlayerAvailability {
        self.state.availability_of(player_id).cloned().unwrap_or_else(|| {
            PlayerAvailability::available(self.state.game.id.clone(), player_id.clone())
        })
    }

    pub fn cycle_availability(
        &mut self,
        player_id: &PlayerId,
        now: DateTime<Utc>,
    ) -> Result<PlayerAvailability> {
        let next = self.tracker.cycle(&self.availability(player_id), self.moment(now))?;
        self.write_availability(next, now)
    }

    pub fn set_availability(
        &mut self,
        player_id: &PlayerId,
        status: AvailabilityStatus,
        now: DateTime<Utc>,
    ) -> Result<PlayerAvailability> {
        let next = self.tracker.set_status(&self.availability(player_id), status, self.moment(now))?;
        self.write_availability(next, now)
    }

    pub fn mark_arrived(
        &mut self,
        player_id: &PlayerId,
        now: DateTime<Utc>,
    ) -> Result<PlayerAvailability> {
        let next = self.tracker.mark_arrived(&self.availability(player_id), self.moment(now));
        self.write_availability(next, now)
    }

    pub fn set_availability_note(
        &mut self,
        player_id: &PlayerId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<PlayerAvailability> {
        let mut next = self.availability(player_id);
        next.note = note;
        self.write_availability(next, now)
    }

    /// Absent or injured players still on the field are taken off and their
    /// position freed.
    fn write_availability(
        &mut self,
        row: PlayerAvailability,
        now: DateTime<Utc>,
    ) -> Result<PlayerAvailability> {
        let row = if self.state.availability.iter().any(|a| a.id == row.id) {
            self.store.availability.update(row)?
        } else {
            self.store.availability.create(row)?
        };
        self.state.apply(GameEvent::Availability(Change::Upsert(row.clone())));
        debug!("Player {} is now {}", row.player_id, row.status);

        let fielded = self.state.position_of(&row.player_id).is_some()
            || self.state.ledger.is_on_field(&row.player_id);
        if row.status.removes_from_field()
            && fielded
            && self.state.game.status != GameStatus::Completed
        {
            let at = self.game_seconds(now);
            self.executor.vacate_player(&mut self.state, &row.player_id, at)?;
            info!("Player {} taken off at {}s ({})", row.player_id, at, row.status);
        }
        Ok(row)
    }

    // ============================================
    // Rotations
    // ============================================

    pub fn due_rotations(&self, now: DateTime<Utc>) -> Vec<&PlannedRotation> {
        if self.state.game.status == GameStatus::Completed {
            return Vec::new();
        }
        rotation::due_rotations(
            &self.state.rotations,
            self.game_seconds(now),
            self.state.game.current_half,
        )
    }

    /// Stamp `viewedAt` so the rotation never triggers again. `Ok(None)` if
    /// it was already seen.
    pub fn mark_rotation_viewed(
        &mut self,
        rotation_id: &RecordId,
        now: DateTime<Utc>,
    ) -> Result<Option<PlannedRotation>> {
        let Some(viewed) = rotation::mark_viewed(self.rotation(rotation_id)?, now) else {
            return Ok(None);
        };
        let viewed = self.store.rotations.update(viewed)?;
        self.state.apply(GameEvent::Rotation(Change::Upsert(viewed.clone())));
        Ok(Some(viewed))
    }

    pub fn lineup_at_rotation(&self, rotation_number: u32) -> Result<Lineup> {
        Ok(rotation::compute_lineup_at_rotation(
            self.starting_lineup()?,
            &self.state.rotations,
            rotation_number,
        ))
    }

    pub fn planned_substitutions_for(&self, rotation_number: u32) -> Result<Vec<PlannedSubstitution>> {
        Ok(rotation::planned_substitutions_for(
            self.starting_lineup()?,
            &self.state.rotations,
            rotation_number,
        ))
    }

    /// Move the live lineup to the planned lineup at `rotation_number` and
    /// mark that rotation viewed. Only the positions that differ are
    /// substituted, so earlier deviations from the plan are corrected too.
    #[tracing::instrument(skip_all, fields(game = %self.state.game.id, rotation = rotation_number))]
    pub fn apply_rotation(
        &mut self,
        rotation_number: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<SubstitutionOutcome>> {
        let target = self.lineup_at_rotation(rotation_number)?;
        let current = self.state.lineup_map();
        let changes = rotation::order_for_execution(
            &current,
            rotation::compute_lineup_diff(&current, &target),
        );

        let outcomes = self.execute_batch(&changes, now)?;

        let rotation_ids: Vec<RecordId> = self
            .state
            .rotations
            .iter()
            .filter(|r| r.rotation_number == rotation_number)
            .map(|r| r.id.clone())
            .collect();
        for id in rotation_ids {
            self.mark_rotation_viewed(&id, now)?;
        }

        info!("Rotation {} applied with {} substitutions", rotation_number, outcomes.len());
        Ok(outcomes)
    }

    fn rotation(&self, rotation_id: &RecordId) -> Result<&PlannedRotation> {
        self.state.rotations.iter().find(|r| &r.id == rotation_id).ok_or_else(|| {
            GameError::NotFound { entity: "PlannedRotation", key: rotation_id.to_string() }
        })
    }

    fn starting_lineup(&self) -> Result<&Lineup> {
        self.state.plan.as_ref().map(|plan| &plan.starting_lineup).ok_or_else(|| {
            GameError::NotFound { entity: "GamePlan", key: self.state.game.id.to_string() }
        })
    }
}
