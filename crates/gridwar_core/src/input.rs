//! Pointer and key input.
//!
//! The host feeds raw pixel-space events; the simulation turns them into
//! selection changes and the ghost placement flow:
//!
//! 1. [`Simulation::select_build_kind`] picks what to build
//! 2. pointer moves drag a ghost preview across the grid
//! 3. pointer up places the real unit, paying its cost
//! 4. [`Key::Cancel`] drops the preview

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::GridCoord;
use crate::math::Vec2Fixed;
use crate::player::PlayerId;
use crate::simulation::{Simulation, UnitSpawnParams};
use crate::unit::{Owner, UnitId, UnitKind};

/// Keys the simulation reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Abort the current placement.
    Cancel,
    /// Any other key; ignored.
    Other,
}

/// A raw input event in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Pointer pressed.
    PointerDown(Vec2Fixed),
    /// Pointer released.
    PointerUp(Vec2Fixed),
    /// Pointer moved.
    PointerMove(Vec2Fixed),
    /// Key released.
    KeyUp(Key),
}

/// What an input event changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Selection state only.
    Nothing,
    /// A ghost preview appeared.
    GhostShown(UnitId),
    /// A real unit was placed.
    Placed(UnitId),
    /// The placement was aborted.
    Cancelled,
}

impl Simulation {
    /// Choose a build-menu entry, or clear it with `None`.
    ///
    /// Any existing ghost is discarded; a new one appears under the pointer
    /// if the pointer is over the grid.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PlayerNotFound`] for an unknown id.
    pub fn select_build_kind(&mut self, player: PlayerId, kind: Option<UnitKind>) -> Result<()> {
        self.clear_ghost(player)?;
        let hovered = {
            let p = self.player_mut(player)?;
            p.selection.build_kind = kind;
            p.selection.hovered
        };
        if let (Some(kind), Some(cell)) = (kind, hovered) {
            self.show_ghost(player, kind, cell)?;
        }
        Ok(())
    }

    /// Apply one input event for a player.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PlayerNotFound`] for an unknown id, or the
    /// placement error when a pointer release cannot place the unit.
    pub fn handle_input(&mut self, player: PlayerId, event: InputEvent) -> Result<InputOutcome> {
        let pan = self
            .player(player)
            .ok_or(GameError::PlayerNotFound(player))?
            .pan_offset;

        match event {
            InputEvent::PointerMove(pixel) => {
                let cell = self.grid().pixel_to_grid(pixel, pan);
                let (ghost, build_kind) = {
                    let p = self.player_mut(player)?;
                    p.selection.hovered = cell;
                    (p.ghost, p.selection.build_kind)
                };
                match (cell, ghost, build_kind) {
                    (Some(cell), Some(ghost), _) => {
                        self.move_ghost(ghost, cell);
                        Ok(InputOutcome::Nothing)
                    }
                    (Some(cell), None, Some(kind)) => {
                        self.show_ghost(player, kind, cell).map(InputOutcome::GhostShown)
                    }
                    _ => Ok(InputOutcome::Nothing),
                }
            }
            InputEvent::PointerDown(pixel) => {
                let cell = self.grid().pixel_to_grid(pixel, pan);
                self.player_mut(player)?.selection.selected = cell;
                Ok(InputOutcome::Nothing)
            }
            InputEvent::PointerUp(pixel) => {
                let cell = self.grid().pixel_to_grid(pixel, pan);
                let build_kind = self.player_mut(player)?.selection.build_kind;
                let (Some(cell), Some(kind)) = (cell, build_kind) else {
                    return Ok(InputOutcome::Nothing);
                };
                self.place(player, kind, cell)
            }
            InputEvent::KeyUp(Key::Cancel) => {
                self.clear_ghost(player)?;
                let p = self.player_mut(player)?;
                p.selection.build_kind = None;
                p.selection.selected = None;
                Ok(InputOutcome::Cancelled)
            }
            InputEvent::KeyUp(Key::Other) => Ok(InputOutcome::Nothing),
        }
    }

    /// Replace the ghost with a real unit. On failure the ghost comes back.
    fn place(&mut self, player: PlayerId, kind: UnitKind, cell: GridCoord) -> Result<InputOutcome> {
        self.clear_ghost(player)?;
        let placed = self.create_unit(UnitSpawnParams {
            kind,
            owner: Owner::Player(player),
            position: cell,
            ..Default::default()
        });

        match placed {
            Ok(id) => {
                self.player_mut(player)?.selection.build_kind = None;
                Ok(InputOutcome::Placed(id))
            }
            Err(e) => {
                self.show_ghost(player, kind, cell)?;
                Err(e)
            }
        }
    }

    fn show_ghost(&mut self, player: PlayerId, kind: UnitKind, cell: GridCoord) -> Result<UnitId> {
        let id = self.create_unit(UnitSpawnParams {
            kind,
            owner: Owner::Ghost(player),
            position: cell,
            force: true,
            ..Default::default()
        })?;
        self.player_mut(player)?.ghost = Some(id);
        Ok(id)
    }

    fn clear_ghost(&mut self, player: PlayerId) -> Result<()> {
        if let Some(ghost) = self.player_mut(player)?.ghost.take() {
            self.destroy_unit(ghost)?;
        }
        Ok(())
    }
}
