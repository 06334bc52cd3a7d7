//! Player availability cycling and eligibility windows.

use thiserror::Error;

use crate::config::GameConfig;
use crate::error::Result;
use crate::models::{AvailabilityStatus, Half, PlayerAvailability, PositionId};

/// Why a player may not enter the lineup right now.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Ineligibility {
    #[error("marked absent")]
    Absent,

    #[error("injured (available until minute {until_minute:?})")]
    Injured { until_minute: Option<u32> },

    #[error("not available before minute {from_minute}")]
    NotYetAvailable { from_minute: u32 },

    #[error("not available after minute {until_minute}")]
    NoLongerAvailable { until_minute: u32 },

    #[error("already on the field")]
    AlreadyOnField,

    #[error("already assigned to {position_id}")]
    AlreadyAssigned { position_id: PositionId },

    #[error("cannot replace a player with themselves")]
    SamePlayer,
}

impl AvailabilityStatus {
    /// Fixed cycle: available -> absent -> late-arrival -> injured -> available.
    pub fn next(self) -> Self {
        match self {
            AvailabilityStatus::Available => AvailabilityStatus::Absent,
            AvailabilityStatus::Absent => AvailabilityStatus::LateArrival,
            AvailabilityStatus::LateArrival => AvailabilityStatus::Injured,
            AvailabilityStatus::Injured => AvailabilityStatus::Available,
        }
    }

    /// Statuses that take a player off the field immediately.
    pub fn removes_from_field(self) -> bool {
        matches!(self, AvailabilityStatus::Absent | AvailabilityStatus::Injured)
    }
}

/// Game position the tracker needs to derive windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchMoment {
    pub half: Half,
    pub game_seconds: u32,
}

impl MatchMoment {
    pub fn minute(&self) -> u32 {
        self.game_seconds / 60
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityTracker {
    config: GameConfig,
}

impl AvailabilityTracker {
    pub fn new(config: &GameConfig) -> Self {
        Self { config: config.clone() }
    }

    /// Advance `current` one step along the status cycle and derive the new
    /// window.
    pub fn cycle(
        &self,
        current: &PlayerAvailability,
        moment: MatchMoment,
    ) -> Result<PlayerAvailability> {
        self.set_status(current, current.status.next(), moment)
    }

    pub fn set_status(
        &self,
        current: &PlayerAvailability,
        status: AvailabilityStatus,
        moment: MatchMoment,
    ) -> Result<PlayerAvailability> {
        let mut next = current.clone();
        next.status = status;
        match status {
            AvailabilityStatus::Available | AvailabilityStatus::Absent => {
                next.available_from_minute = None;
                next.available_until_minute = None;
            }
            AvailabilityStatus::LateArrival => {
                next.available_from_minute = Some(self.half_boundary_minute(moment.half)?);
                next.available_until_minute = None;
            }
            AvailabilityStatus::Injured => {
                next.available_from_minute = None;
                next.available_until_minute = Some(moment.minute());
            }
        }
        Ok(next)
    }

    /// A late arrival showed up: they may play from the current minute on.
    pub fn mark_arrived(
        &self,
        current: &PlayerAvailability,
        moment: MatchMoment,
    ) -> PlayerAvailability {
        let mut next = current.clone();
        if next.status == AvailabilityStatus::LateArrival {
            next.available_from_minute = Some(moment.minute());
        }
        next
    }

    /// Minute at which the current half ends.
    fn half_boundary_minute(&self, half: Half) -> Result<u32> {
        let half_length = self.config.require_half_length()?;
        Ok(half_length / 60 * u32::from(half.number()))
    }
}

/// Whether a player with the given availability row may enter at `minute`.
/// No row means available.
///
/// An injured player is eligible only up to the minute of the injury.
pub fn check_eligibility(
    availability: Option<&PlayerAvailability>,
    minute: u32,
) -> std::result::Result<(), Ineligibility> {
    let Some(availability) = availability else {
        return Ok(());
    };

    match availability.status {
        AvailabilityStatus::Absent => return Err(Ineligibility::Absent),
        AvailabilityStatus::Injured => match availability.available_until_minute {
            Some(until) if minute <= until => {}
            until_minute => return Err(Ineligibility::Injured { until_minute }),
        },
        AvailabilityStatus::Available | AvailabilityStatus::LateArrival => {}
    }

    if let Some(from_minute) = availability.available_from_minute {
        if minute < from_minute {
            return Err(Ineligibility::NotYetAvailable { from_minute });
        }
    }
    if let Some(until_minute) = availability.available_until_minute {
        if minute > until_minute {
            return Err(Ineligibility::NoLongerAvailable { until_minute });
        }
    }
    Ok(())
}

pub fn is_eligible(availability: Option<&PlayerAvailability>, minute: u32) -> bool {
    check_eligibility(availability, minute).is_ok()
}
