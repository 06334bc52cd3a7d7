//! # sideline_core - Game Clock & Substitution Ledger
//!
//! Match clock, per-player play-time ledger and substitution protocol for a
//! coach running a live youth match from the sideline.
//!
//! ## Features
//! - Pure clock state machine (scheduled, in-progress, halftime, completed)
//! - At most one open play-time interval per player, always
//! - Re-entrant substitutions that survive partial writes
//! - Rotation plans, availability windows and play-time fairness reports
//! - Storage behind an injected repository with push subscriptions
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use sideline_core::{GameConfig, InMemoryStore, LiveGameSession};
//! use sideline_core::models::Game;
//!
//! let backend = InMemoryStore::new();
//! let kickoff = Utc.with_ymd_and_hms(2024, 9, 14, 10, 0, 0).unwrap();
//! let mut session = LiveGameSession::schedule(
//!     backend.store(),
//!     Game::scheduled("g1", "t1"),
//!     GameConfig::youth(),
//! )
//! .unwrap();
//! session.assign_position(&"GK".into(), &"p1".into(), kickoff).unwrap();
//! session.start(kickoff).unwrap();
//! assert!(session.state().ledger.is_on_field(&"p1".into()));
//! ```

pub mod availability;
pub mod clock;
pub mod config;
pub mod error;
pub mod feed;
pub mod ledger;
pub mod models;
pub mod report;
pub mod repository;
pub mod resume;
pub mod rotation;
pub mod session;
pub mod state;
pub mod substitution;

pub use availability::{check_eligibility, is_eligible, AvailabilityTracker, Ineligibility};
pub use clock::{AutoTransition, GameClock, GameOperation, LedgerEffect, Transition};
pub use config::GameConfig;
pub use error::{GameError, Result, StoreError};
pub use feed::ChangeFeed;
pub use ledger::PlayTimeLedger;
pub use report::{PlayTimeReport, PlayerPlayTime};
pub use repository::{InMemoryRepository, InMemoryStore, Repository, Store};
pub use resume::{DiscardReason, ResumeDecision, ResumeError, ResumeRecord};
pub use session::{LiveGameSession, ScoreSide, TickOutcome};
pub use state::{GameEvent, GameState, Origin};
pub use substitution::{
    BatchFailure, SubstitutionExecutor, SubstitutionOutcome, SubstitutionRequest,
    SubstitutionStep,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the persisted field contract exported by
/// `models::contract_schema`.
pub const SCHEMA_VERSION: &str = "v1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(SCHEMA_VERSION, "v1");
    }
}
