//! Projectiles.
//!
//! A shot flies in a straight line from where it was fired toward the
//! pixel position its target had at that moment. It does not home. Shots
//! live in screen space, so when the camera pans both the shot and its aim
//! point slide by the same amount.

use serde::{Deserialize, Serialize};

use crate::catalog::ShotKind;
use crate::math::{Fixed, Vec2Fixed};
use crate::player::PlayerId;
use crate::unit::UnitId;

/// Unique identifier for shots.
pub type ShotId = u64;

/// Result of advancing a shot one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotStatus {
    /// Still travelling.
    InFlight,
    /// Within the collision threshold at this pixel position.
    Arrived(Vec2Fixed),
}

/// An in-flight projectile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shot {
    /// Arena id.
    pub id: ShotId,
    /// Unit that fired.
    pub source: UnitId,
    /// Unit that was aimed at, if any. Not consulted on impact.
    pub target_unit: Option<UnitId>,
    /// Player of the firing unit.
    pub owner: PlayerId,
    /// Visual kind.
    pub kind: ShotKind,
    /// Where the shot was fired from.
    pub origin: Vec2Fixed,
    /// Current position.
    pub position: Vec2Fixed,
    /// Aim point.
    pub target: Vec2Fixed,
    /// Pixels travelled per 1000 time units.
    pub velocity: Vec2Fixed,
    /// Pan offset seen on the previous advance.
    pub last_pan: Vec2Fixed,
}

/// Parameters for firing a shot.
#[derive(Debug, Clone, Copy)]
pub struct ShotParams {
    /// Firing unit.
    pub source: UnitId,
    /// Aimed-at unit, if any.
    pub target_unit: Option<UnitId>,
    /// Firing unit's player.
    pub owner: PlayerId,
    /// Visual kind.
    pub kind: ShotKind,
    /// Launch position.
    pub origin: Vec2Fixed,
    /// Aim point.
    pub target: Vec2Fixed,
    /// Speed in pixels per 1000 time units.
    pub speed: Fixed,
    /// Pan offset at launch.
    pub pan: Vec2Fixed,
}

impl Shot {
    /// Launch a shot along the origin-to-target direction.
    #[must_use]
    pub fn new(id: ShotId, params: ShotParams) -> Self {
        let heading = (params.target - params.origin).normalize();
        Self {
            id,
            source: params.source,
            target_unit: params.target_unit,
            owner: params.owner,
            kind: params.kind,
            origin: params.origin,
            position: params.origin,
            target: params.target,
            velocity: heading.scale(params.speed),
            last_pan: params.pan,
        }
    }

    /// Move the shot by `delta` time units.
    ///
    /// `pan` is the current pan offset; any change since the previous call
    /// shifts both position and aim point. A shot that would overshoot its
    /// aim point stops on it.
    pub fn advance(&mut self, delta: u32, pan: Vec2Fixed, threshold: Fixed) -> ShotStatus {
        let drift = pan - self.last_pan;
        self.position += drift;
        self.target += drift;
        self.last_pan = pan;

        let remaining = self.position.distance(self.target);
        if remaining < threshold {
            return ShotStatus::Arrived(self.position);
        }

        let elapsed = Fixed::from_num(delta);
        let per_mille = Fixed::from_num(1000);
        let step = Vec2Fixed::new(
            self.velocity.x * elapsed / per_mille,
            self.velocity.y * elapsed / per_mille,
        );
        if step.length() >= remaining {
            self.position = self.target;
        } else {
            self.position += step;
        }

        if self.position.distance(self.target) < threshold {
            ShotStatus::Arrived(self.position)
        } else {
            ShotStatus::InFlight
        }
    }
}
