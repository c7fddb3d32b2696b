//! Data-driven unit catalog.
//!
//! Each [`UnitKind`] maps to one [`UnitStats`] entry. The built-in table is
//! always complete; a RON document can override individual entries.
//!
//! # Example RON
//!
//! ```ron
//! {
//!     GunTower: (
//!         max_health: 120,
//!         cost: 150,
//!         link_radius: 100,
//!         behavior: Combat,
//!         range: 7,
//!         base_speed: 0,
//!         shot_kind: Bolt,
//!         vision: 7,
//!     ),
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::unit::UnitKind;

/// Which [`crate::unit::Behavior`] variant a kind starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorTemplate {
    /// Passive structure.
    Structure,
    /// Static ranged unit.
    Combat,
    /// Roaming combat unit.
    Mobile,
    /// Deposit extractor.
    Drill,
}

/// Visual kind of projectile a unit fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShotKind {
    /// Tower bolt.
    #[default]
    Bolt,
    /// Mob spit.
    Spit,
}

/// Static stats for one unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Maximum (and starting) health.
    pub max_health: u32,
    /// Resource cost when placed without `force`.
    pub cost: u32,
    /// Pixel radius for edge creation.
    pub link_radius: u32,
    /// Behavior variant.
    pub behavior: BehaviorTemplate,
    /// Firing reach in grid steps (Manhattan).
    #[serde(default)]
    pub range: u32,
    /// Base move cooldown for mobile kinds, scaled by terrain cost.
    #[serde(default)]
    pub base_speed: u32,
    /// Projectile visual.
    #[serde(default)]
    pub shot_kind: ShotKind,
    /// Sight radius in grid steps (Manhattan).
    #[serde(default)]
    pub vision: u32,
}

impl UnitStats {
    /// Built-in entry for a kind.
    #[must_use]
    pub const fn builtin(kind: UnitKind) -> Self {
        use BehaviorTemplate::{Combat, Drill, Mobile, Structure};

        let (max_health, cost, link_radius, behavior, range, base_speed, shot_kind, vision) =
            match kind {
                UnitKind::ControlTower => (250, 300, 500, Structure, 0, 0, ShotKind::Bolt, 4),
                UnitKind::WallTower => (500, 50, 100, Structure, 0, 0, ShotKind::Bolt, 1),
                UnitKind::StorageTower => (100, 75, 100, Structure, 0, 0, ShotKind::Bolt, 1),
                UnitKind::WatchTower => (100, 100, 100, Structure, 0, 0, ShotKind::Bolt, 5),
                UnitKind::DrillTower => (100, 100, 100, Drill, 0, 0, ShotKind::Bolt, 2),
                UnitKind::GunTower => (100, 100, 100, Combat, 6, 0, ShotKind::Bolt, 6),
                UnitKind::BasicUnit => (50, 50, 100, Mobile, 2, 500, ShotKind::Bolt, 3),
                UnitKind::Mob => (20, 0, 0, Mobile, 2, 800, ShotKind::Spit, 3),
            };

        Self {
            max_health,
            cost,
            link_radius,
            behavior,
            range,
            base_speed,
            shot_kind,
            vision,
        }
    }
}

/// Lookup table from unit kind to stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitCatalog {
    entries: BTreeMap<UnitKind, UnitStats>,
}

impl Default for UnitCatalog {
    fn default() -> Self {
        Self {
            entries: UnitKind::ALL
                .iter()
                .map(|&kind| (kind, UnitStats::builtin(kind)))
                .collect(),
        }
    }
}

impl UnitCatalog {
    /// Stats for a kind; falls back to the built-in entry.
    #[must_use]
    pub fn stats(&self, kind: UnitKind) -> UnitStats {
        self.entries
            .get(&kind)
            .copied()
            .unwrap_or_else(|| UnitStats::builtin(kind))
    }

    /// Replace the stats for a kind.
    pub fn set(&mut self, kind: UnitKind, stats: UnitStats) {
        self.entries.insert(kind, stats);
    }

    /// Apply overrides from a RON map on top of the built-in table.
    pub fn from_ron_str(ron_text: &str) -> Result<Self> {
        let overrides: BTreeMap<UnitKind, UnitStats> =
            ron::from_str(ron_text).map_err(|e| GameError::DataParseError {
                source_name: "unit catalog".to_string(),
                message: e.to_string(),
            })?;

        let mut catalog = Self::default();
        for (kind, stats) in overrides {
            catalog.set(kind, stats);
        }
        Ok(catalog)
    }
}
