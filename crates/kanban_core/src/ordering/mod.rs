//! Fractional-priority ordering for sibling groups.
//!
//! # Responsibility
//! - Map a client-supplied target index onto a valid sibling slot.
//! - Compute a new priority that re-sorts a moved entity into that slot
//!   without touching any other sibling.
//!
//! # Invariants
//! - Functions here are pure; reading siblings and persisting the result is
//!   the caller's job (see `service::reorder_service`).
//! - A reassigned priority lies strictly between its two bounds for distinct
//!   finite inputs. Repeated moves into one gap halve it each time; running
//!   out of f64 precision is not guarded against.

use crate::model::board::EntityKind;
use std::fmt::{Debug, Display};

/// Entity that lives in an ordered sibling group.
pub trait OrderedEntity {
    /// Id of the container that defines the sibling group.
    type ContainerId: Copy + Eq + Debug + Display;

    /// Record category for errors and log events.
    const KIND: EntityKind;

    fn id(&self) -> i64;
    fn container_id(&self) -> Self::ContainerId;
    fn priority(&self) -> f64;
}

/// Result of interpolating a move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// The mover already occupies the target slot; keep its priority.
    Unchanged,
    /// Persist this priority for the mover.
    Reassigned(f64),
}

/// Maps `target_index` onto `[0, sibling_count - 1]`.
///
/// Any index at or past the last slot maps to the last slot; negative
/// indexes map to the first. Callers skip groups with fewer than two members.
pub fn clamp_position(target_index: i64, sibling_count: usize) -> usize {
    let last = sibling_count.saturating_sub(1);
    if target_index < 0 {
        return 0;
    }
    match usize::try_from(target_index) {
        Ok(index) if index < last => index,
        _ => last,
    }
}

/// Computes the mover's new priority for slot `position`.
///
/// `priorities` is the whole sibling group, mover included, sorted
/// ascending. `current` is the mover's priority before the move.
///
/// Edge slots step one unit past the occupant. Interior slots take the
/// midpoint between the occupant and the neighbor on the far side of it,
/// as seen from the mover. When the occupant's priority equals `current`
/// the mover is treated as already in place.
pub fn interpolate_priority(priorities: &[f64], position: usize, current: f64) -> Placement {
    let last = match priorities.len().checked_sub(1) {
        Some(last) if last > 0 => last,
        _ => return Placement::Unchanged,
    };
    let position = position.min(last);
    let from = priorities[position];

    let to = if position == 0 {
        from - 1.0
    } else if position == last {
        from + 1.0
    } else if from > current {
        priorities[position + 1]
    } else if from < current {
        priorities[position - 1]
    } else {
        return Placement::Unchanged;
    };

    Placement::Reassigned(midpoint(from, to))
}

fn midpoint(from: f64, to: f64) -> f64 {
    (from + to) / 2.0
}
