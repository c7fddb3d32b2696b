//! Players and their interaction state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::grid::GridCoord;
use crate::math::Vec2Fixed;
use crate::unit::{UnitId, UnitKind};

/// Unique identifier for players. Assigned in registration order from 0.
pub type PlayerId = u32;

/// Pointer and build-menu state for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Selection {
    /// Cell under the pointer.
    pub hovered: Option<GridCoord>,
    /// Cell where the pointer was last pressed.
    pub selected: Option<GridCoord>,
    /// Kind chosen from the build menu.
    pub build_kind: Option<UnitKind>,
}

/// A participant in the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Arena id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Owned units in creation order. Ghosts are never listed here.
    pub units: Vec<UnitId>,
    /// Camera pan offset applied to pixel conversions.
    pub pan_offset: Vec2Fixed,
    /// Placement preview, if one is showing.
    pub ghost: Option<UnitId>,
    /// Pointer and build-menu state.
    pub selection: Selection,
    /// Cells visible regardless of unit vision.
    pub revealed: BTreeSet<GridCoord>,
}

impl Player {
    /// New player with no units and no pan.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            units: Vec::new(),
            pan_offset: Vec2Fixed::ZERO,
            ghost: None,
            selection: Selection::default(),
            revealed: BTreeSet::new(),
        }
    }

    /// Check whether the player owns a unit.
    #[must_use]
    pub fn owns(&self, unit: UnitId) -> bool {
        self.units.contains(&unit)
    }

    /// Drop a unit from the roster. No-op if absent.
    pub fn remove_unit(&mut self, unit: UnitId) {
        self.units.retain(|&id| id != unit);
    }
}
