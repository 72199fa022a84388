//! Resumable movement animation.

use std::collections::VecDeque;

use crate::abilities::AbilityKind;
use crate::cell::CellId;
use crate::math::{fixed_sqrt, Fixed, Vec2Fixed};

/// Progress of a resumable task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Needs more ticks.
    Running,
    /// Finished.
    Done,
}

/// Walks a unit through the world positions of its path.
///
/// The host tick drives [`MovementTask::step`] until it reports
/// [`TaskStatus::Done`]. Cells are reported as entered once the unit
/// reaches their centre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementTask {
    waypoints: VecDeque<(CellId, Vec2Fixed)>,
    entered: Vec<CellId>,
    destination: CellId,
    collected: Vec<AbilityKind>,
}

impl MovementTask {
    /// Create a task walking through `waypoints` in order.
    #[must_use]
    pub fn new(waypoints: Vec<(CellId, Vec2Fixed)>, destination: CellId) -> Self {
        Self {
            waypoints: waypoints.into(),
            entered: Vec::new(),
            destination,
            collected: Vec::new(),
        }
    }

    /// Final cell of the move.
    #[must_use]
    pub const fn destination(&self) -> CellId {
        self.destination
    }

    /// Whether every waypoint has been reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Advance `position` by up to `speed * dt`.
    ///
    /// A non-positive speed completes the whole walk in one step.
    pub fn step(&mut self, position: &mut Vec2Fixed, speed: Fixed, dt: Fixed) -> TaskStatus {
        if speed <= Fixed::ZERO {
            while let Some((cell, target)) = self.waypoints.pop_front() {
                *position = target;
                self.entered.push(cell);
            }
            return TaskStatus::Done;
        }

        let mut budget = speed.saturating_mul(dt);
        while let Some(&(cell, target)) = self.waypoints.front() {
            let remaining = position.distance_squared(target);
            if remaining > budget.saturating_mul(budget) {
                *position = position.move_towards(target, budget);
                return TaskStatus::Running;
            }
            budget -= fixed_sqrt(remaining);
            *position = target;
            self.entered.push(cell);
            self.waypoints.pop_front();
        }
        TaskStatus::Done
    }

    /// Cells reached since the last call.
    pub fn take_entered(&mut self) -> Vec<CellId> {
        std::mem::take(&mut self.entered)
    }

    /// Record an ability kind collected along the way.
    pub fn collect(&mut self, kind: AbilityKind) {
        self.collected.push(kind);
    }

    /// Ability kinds collected so far, in entry order.
    #[must_use]
    pub fn collected(&self) -> &[AbilityKind] {
        &self.collected
    }
}
