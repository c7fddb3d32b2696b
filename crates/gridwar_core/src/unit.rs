//! The unit record.
//!
//! Every entity on the grid, from a wall to a roaming mob, is one [`Unit`]
//! carrying shared fields (health, position, resource shares) plus a tagged
//! [`Behavior`] that decides what it does each tick. Per-tick logic lives in
//! [`crate::behavior`] and dispatches on that tag.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{BehaviorTemplate, UnitStats};
use crate::grid::GridCoord;
use crate::player::PlayerId;

/// Unique identifier for units. Assigned in registration order.
pub type UnitId = u64;

/// Kind of unit, doubling as the build-menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    /// Control structure; the only kind that holds points after redistribution.
    ControlTower,
    /// High-health blocker.
    WallTower,
    /// Passive storage structure.
    StorageTower,
    /// Long-sight structure.
    WatchTower,
    /// Extracts deposits from its cell.
    DrillTower,
    /// Static ranged combat structure.
    GunTower,
    /// Player-owned mobile combat unit.
    BasicUnit,
    /// Hostile roaming unit. Never links, never pays for ammunition.
    Mob,
}

impl UnitKind {
    /// Every kind in catalog order.
    pub const ALL: [Self; 8] = [
        Self::ControlTower,
        Self::WallTower,
        Self::StorageTower,
        Self::WatchTower,
        Self::DrillTower,
        Self::GunTower,
        Self::BasicUnit,
        Self::Mob,
    ];

    /// Check if this is the control structure kind.
    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(self, Self::ControlTower)
    }

    /// Check if this is the roaming mob kind.
    #[must_use]
    pub const fn is_mob(self) -> bool {
        matches!(self, Self::Mob)
    }

    /// Short display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ControlTower => "control",
            Self::WallTower => "wall",
            Self::StorageTower => "storage",
            Self::WatchTower => "watch",
            Self::DrillTower => "driller",
            Self::GunTower => "gun",
            Self::BasicUnit => "basic",
            Self::Mob => "mob",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Who a unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    /// A real unit controlled by a player.
    Player(PlayerId),
    /// A placement preview shown to the given player.
    ///
    /// Ghosts never occupy a cell, never tick, never take damage and never
    /// hold resources.
    Ghost(PlayerId),
}

impl Owner {
    /// The owning player, if this is a real unit.
    #[must_use]
    pub const fn player(self) -> Option<PlayerId> {
        match self {
            Self::Player(id) => Some(id),
            Self::Ghost(_) => None,
        }
    }

    /// The player this unit is drawn for, real or preview.
    #[must_use]
    pub const fn viewer(self) -> PlayerId {
        match self {
            Self::Player(id) | Self::Ghost(id) => id,
        }
    }

    /// Check for the preview sentinel.
    #[must_use]
    pub const fn is_ghost(self) -> bool {
        matches!(self, Self::Ghost(_))
    }
}

/// Cardinal facing of a mobile unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Toward negative y.
    #[default]
    North,
    /// Toward positive x.
    East,
    /// Toward positive y.
    South,
    /// Toward negative x.
    West,
}

impl Facing {
    /// Sprite rotation in degrees, clockwise from north.
    #[must_use]
    pub const fn degrees(self) -> u16 {
        match self {
            Self::North => 0,
            Self::East => 90,
            Self::South => 180,
            Self::West => 270,
        }
    }

    /// Facing for a single grid step.
    #[must_use]
    pub const fn from_step(dx: i32, dy: i32) -> Self {
        if dx > 0 {
            Self::East
        } else if dx < 0 {
            Self::West
        } else if dy > 0 {
            Self::South
        } else {
            Self::North
        }
    }
}

/// Tagged per-tick behavior with its own timers.
///
/// All timers count down in simulation time units (the `delta` passed to
/// each tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Behavior {
    /// Passive structure.
    Structure,
    /// Static ranged unit.
    Combat {
        /// Time left before the next shot.
        shot_cooldown: u32,
    },
    /// Roaming combat unit.
    Mobile {
        /// Time left before the next shot.
        shot_cooldown: u32,
        /// Time left before the next grid step.
        move_cooldown: u32,
        /// Random destination used while no enemy is known.
        wander_target: Option<GridCoord>,
        /// Direction of the last step.
        facing: Facing,
    },
    /// Stationary extractor.
    Drill {
        /// Time left before the next extraction.
        mine_cooldown: u32,
    },
}

impl Behavior {
    /// Fresh behavior state for a catalog entry.
    #[must_use]
    pub fn from_template(stats: &UnitStats, shot_interval: u32, mine_interval: u32) -> Self {
        match stats.behavior {
            BehaviorTemplate::Structure => Self::Structure,
            BehaviorTemplate::Combat => Self::Combat {
                shot_cooldown: shot_interval,
            },
            BehaviorTemplate::Mobile => Self::Mobile {
                shot_cooldown: shot_interval,
                move_cooldown: stats.base_speed,
                wander_target: None,
                facing: Facing::default(),
            },
            BehaviorTemplate::Drill => Self::Drill {
                mine_cooldown: mine_interval,
            },
        }
    }

    /// Check if this behavior can fire shots.
    #[must_use]
    pub const fn is_combat_capable(&self) -> bool {
        matches!(self, Self::Combat { .. } | Self::Mobile { .. })
    }
}

/// Health for damageable units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if the unit is dead (health == 0).
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Check if the unit is at full health.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Apply damage, returning the amount actually removed.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current -= actual;
        actual
    }

    /// Heal up to max, returning the amount actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.max.saturating_sub(self.current));
        self.current += actual;
        actual
    }
}

/// A unit on the grid (or a ghost preview above it).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Arena id.
    pub id: UnitId,
    /// Catalog kind.
    pub kind: UnitKind,
    /// Owning player or ghost sentinel.
    pub owner: Owner,
    /// Cell this unit occupies. Mirrors the grid's occupant sets.
    pub grid_position: GridCoord,
    /// Health; never above max.
    pub health: Health,
    /// This unit's share of the owner's resource pool.
    pub resources: u32,
    /// This unit's share of the owner's point pool.
    pub points: u32,
    /// Time accumulated toward the next regeneration point.
    pub regen_timer: u32,
    /// Number of edges touching this unit.
    pub link_count: u32,
    /// Pixel radius used when linking to other units.
    pub link_radius: u32,
    /// Type-specific tick state.
    pub behavior: Behavior,
}

impl Unit {
    /// Check if this is a placement preview.
    #[must_use]
    pub const fn is_ghost(&self) -> bool {
        self.owner.is_ghost()
    }

    /// Check if the unit still has health.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.health.is_dead()
    }

    /// Facing of a mobile unit; structures always face north.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        match self.behavior {
            Behavior::Mobile { facing, .. } => facing,
            _ => Facing::North,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage_and_heal() {
        let mut h = Health::new(10);
        assert_eq!(h.apply_damage(4), 4);
        assert_eq!(h.current, 6);
        assert_eq!(h.heal(10), 4);
        assert!(h.is_full());
        assert_eq!(h.apply_damage(50), 10);
        assert!(h.is_dead());
    }

    #[test]
    fn test_owner_sentinel() {
        assert_eq!(Owner::Player(2).player(), Some(2));
        assert_eq!(Owner::Ghost(2).player(), None);
        assert_eq!(Owner::Ghost(2).viewer(), 2);
        assert!(Owner::Ghost(0).is_ghost());
    }

    #[test]
    fn test_facing_from_step() {
        assert_eq!(Facing::from_step(1, 0), Facing::East);
        assert_eq!(Facing::from_step(-1, 0), Facing::West);
        assert_eq!(Facing::from_step(0, 1), Facing::South);
        assert_eq!(Facing::from_step(0, -1), Facing::North);
        assert_eq!(Facing::South.degrees(), 180);
    }
}
