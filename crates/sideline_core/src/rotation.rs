//! Rotation planning: pure functions over lineup snapshots.
//!
//! Nothing here touches the ledger. The same inputs always produce the same
//! lineup, so these are safe to recompute on every tick.

use chrono::{DateTime, Utc};

use crate::models::{Half, Lineup, PlannedRotation, PlannedSubstitution};

/// Lineup after replaying every rotation numbered `<= target`, in ascending
/// rotation order. `target == 0` yields `starting` unchanged.
pub fn compute_lineup_at_rotation(
    starting: &Lineup,
    rotations: &[PlannedRotation],
    target: u32,
) -> Lineup {
    let mut ordered: Vec<&PlannedRotation> =
        rotations.iter().filter(|r| r.rotation_number <= target).collect();
    ordered.sort_by_key(|r| r.rotation_number);

    let mut lineup = starting.clone();
    for rotation in ordered {
        for sub in &rotation.substitutions {
            apply_planned(&mut lineup, sub);
        }
    }
    lineup
}

fn apply_planned(lineup: &mut Lineup, sub: &PlannedSubstitution) {
    // Incoming player leaves any other slot first so nobody is listed twice.
    lineup.retain(|position, player| position == &sub.position_id || player != &sub.player_in_id);
    lineup.insert(sub.position_id.clone(), sub.player_in_id.clone());
}

/// Substitutions that turn `previous` into `next`. Positions missing from
/// `previous` are plain assignments, not substitutions, and are skipped.
pub fn compute_lineup_diff(previous: &Lineup, next: &Lineup) -> Vec<PlannedSubstitution> {
    previous
        .iter()
        .filter_map(|(position, player_out)| {
            let player_in = next.get(position)?;
            (player_in != player_out).then(|| PlannedSubstitution {
                player_out_id: player_out.clone(),
                player_in_id: player_in.clone(),
                position_id: position.clone(),
            })
        })
        .collect()
}

/// Changes between checkpoint `rotation_number - 1` and `rotation_number`.
pub fn planned_substitutions_for(
    starting: &Lineup,
    rotations: &[PlannedRotation],
    rotation_number: u32,
) -> Vec<PlannedSubstitution> {
    let before = compute_lineup_at_rotation(starting, rotations, rotation_number.saturating_sub(1));
    let after = compute_lineup_at_rotation(starting, rotations, rotation_number);
    compute_lineup_diff(&before, &after)
}

/// Order `substitutions` so each incoming player has left any other position
/// before they are moved in. `A -> B at CB, C -> A at ST` must run CB first.
/// Entries that can never be satisfied (a straight swap) keep their relative
/// order at the end and are left for the executor to reject.
pub fn order_for_execution(
    current: &Lineup,
    substitutions: Vec<PlannedSubstitution>,
) -> Vec<PlannedSubstitution> {
    let mut working = current.clone();
    let mut pending = substitutions;
    let mut ordered = Vec::with_capacity(pending.len());

    while let Some(index) = pending.iter().position(|sub| {
        !working.iter().any(|(position, player)| {
            player == &sub.player_in_id && position != &sub.position_id
        })
    }) {
        let sub = pending.remove(index);
        working.insert(sub.position_id.clone(), sub.player_in_id.clone());
        ordered.push(sub);
    }

    ordered.extend(pending);
    ordered
}

/// Rotations that should be announced at `game_seconds`: one minute ahead of
/// their planned minute, same half, never announced before. Sorted by minute.
pub fn due_rotations(
    rotations: &[PlannedRotation],
    game_seconds: u32,
    half: Half,
) -> Vec<&PlannedRotation> {
    let minute = game_seconds / 60;
    let mut due: Vec<&PlannedRotation> = rotations
        .iter()
        .filter(|r| r.viewed_at.is_none() && r.half == half)
        .filter(|r| r.game_minute.checked_sub(1) == Some(minute))
        .collect();
    due.sort_by_key(|r| (r.game_minute, r.rotation_number));
    due
}

/// Stamp `viewed_at`. Returns `None` when the rotation was already seen.
pub fn mark_viewed(rotation: &PlannedRotation, now: DateTime<Utc>) -> Option<PlannedRotation> {
    if rotation.viewed_at.is_some() {
        return None;
    }
    let mut viewed = rotation.clone();
    viewed.viewed_at = Some(now);
    Some(viewed)
}
