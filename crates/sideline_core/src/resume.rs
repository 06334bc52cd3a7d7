//! Session resume pointer.
//!
//! The host keeps a small record naming the game a coach was running so a
//! reload can re-fetch and re-subscribe. Where the host stores it is its own
//! business; this module owns the format, its migration and when a record is
//! too old to trust.

use chrono::{DateTime, Duration, Utc};
use rmp_serde::{from_slice, to_vec_named};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

use crate::models::{Game, GameId, GameStatus, TeamId};

pub const RESUME_VERSION: u32 = 1;

/// Records captured further than this in the future are treated as corrupt
/// device clocks rather than trusted.
pub const MAX_CLOCK_SKEW_SECONDS: i64 = 5 * 60;

const CHECKSUM_LEN: usize = 32;

#[derive(Error, Debug)]
pub enum ResumeError {
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("Deserialization error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("Checksum mismatch")]
    ChecksumMismatch,

    #[error("Corrupted resume record: {0}")]
    Corrupted(String),
}

impl ResumeError {
    /// Writing can be retried. A record that fails to read should be dropped
    /// and the coach sent back to the game list.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ResumeError::Json(_) | ResumeError::Encode(_) => true,
            ResumeError::Decode(_) => false,
            ResumeError::ChecksumMismatch => false,
            ResumeError::Corrupted(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub version: u32,
    pub game_id: GameId,
    pub team_id: TeamId,
    pub captured_at: DateTime<Utc>,
}

/// Pointer written before records were versioned.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyPointer {
    game_id: GameId,
    team_id: TeamId,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredRecord {
    Versioned(ResumeRecord),
    Legacy(LegacyPointer),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    Stale { age_seconds: i64 },
    FutureTimestamp { ahead_seconds: i64 },
    GameCompleted,
    GameMissing,
    TeamMismatch { expected: TeamId, found: TeamId },
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscardReason::Stale { age_seconds } => write!(f, "captured {}s ago", age_seconds),
            DiscardReason::FutureTimestamp { ahead_seconds } => {
                write!(f, "captured {}s in the future", ahead_seconds)
            }
            DiscardReason::GameCompleted => f.write_str("game already completed"),
            DiscardReason::GameMissing => f.write_str("game no longer exists"),
            DiscardReason::TeamMismatch { expected, found } => {
                write!(f, "game belongs to team {} not {}", found, expected)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeDecision {
    Resume(ResumeRecord),
    Discard(DiscardReason),
}

impl ResumeRecord {
    pub fn new(game_id: GameId, team_id: TeamId, captured_at: DateTime<Utc>) -> Self {
        Self { version: RESUME_VERSION, game_id, team_id, captured_at }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.captured_at
    }

    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age(now) > max_age
    }

    /// Decide whether to pick the game back up. `game` is the store's current
    /// copy, `None` if it is gone.
    pub fn resolve(
        self,
        game: Option<&Game>,
        now: DateTime<Utc>,
        max_age: Duration,
    ) -> ResumeDecision {
        let age = self.age(now);
        if age < -Duration::seconds(MAX_CLOCK_SKEW_SECONDS) {
            return ResumeDecision::Discard(DiscardReason::FutureTimestamp {
                ahead_seconds: -age.num_seconds(),
            });
        }
        if age > max_age {
            return ResumeDecision::Discard(DiscardReason::Stale { age_seconds: age.num_seconds() });
        }

        let Some(game) = game else {
            return ResumeDecision::Discard(DiscardReason::GameMissing);
        };
        if game.team_id != self.team_id {
            return ResumeDecision::Discard(DiscardReason::TeamMismatch {
                expected: self.team_id,
                found: game.team_id.clone(),
            });
        }
        if game.status == GameStatus::Completed {
            return ResumeDecision::Discard(DiscardReason::GameCompleted);
        }

        ResumeDecision::Resume(self)
    }

    pub fn to_json(&self) -> Result<String, ResumeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Accepts the current shape and the legacy `{gameId, teamId}` blob.
    /// Legacy pointers carry no timestamp and are stamped with `now`.
    pub fn from_json(content: &str, now: DateTime<Utc>) -> Result<Self, ResumeError> {
        let stored: StoredRecord =
            serde_json::from_str(content).map_err(|e| ResumeError::Corrupted(e.to_string()))?;
        let record = match stored {
            StoredRecord::Versioned(record) => record,
            StoredRecord::Legacy(legacy) => ResumeRecord {
                version: 0,
                game_id: legacy.game_id,
                team_id: legacy.team_id,
                captured_at: now,
            },
        };
        Ok(migrate(record))
    }

    /// MessagePack body followed by its SHA-256.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ResumeError> {
        let mut bytes = to_vec_named(self)?;
        let checksum = Sha256::digest(&bytes);
        bytes.extend_from_slice(&checksum);
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ResumeError> {
        if bytes.len() <= CHECKSUM_LEN {
            return Err(ResumeError::Corrupted(format!("{} bytes is too short", bytes.len())));
        }

        let (payload, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
        if Sha256::digest(payload).as_slice() != checksum {
            return Err(ResumeError::ChecksumMismatch);
        }

        let record: ResumeRecord = from_slice(payload)?;
        Ok(migrate(record))
    }
}

fn migrate(mut record: ResumeRecord) -> ResumeRecord {
    let original_version = record.version;
    match record.version {
        0 => log::warn!(
            "Resume pointer for game {} has no capture time, assuming {}",
            record.game_id,
            record.captured_at
        ),
        RESUME_VERSION => {}
        v => log::warn!(
            "Loading resume record from future version {} (current: {})",
            v,
            RESUME_VERSION
        ),
    }
    record.version = RESUME_VERSION;

    if original_version != RESUME_VERSION {
        log::info!("Migrated resume record from version {} to {}", original_version, RESUME_VERSION);
    }
    record
}
