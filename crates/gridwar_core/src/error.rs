//! Error types for the grid simulation.
//!
//! Most failure paths inside a tick are silent by contract (an off-grid move
//! is dropped, a missing target is a normal `None`). These errors cover the
//! caller-facing operations: placing units, addressing players and units by
//! id, and parsing configuration data.

use thiserror::Error;

use crate::grid::GridCoord;
use crate::player::PlayerId;
use crate::unit::UnitId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    /// Coordinate lies outside the grid.
    #[error("Coordinate ({}, {}) is outside the grid", .0.x, .0.y)]
    InvalidCoordinate(GridCoord),

    /// The owning player cannot pay for a unit.
    #[error("Insufficient resources: need {required}, have {available}")]
    InsufficientResources {
        /// Amount required.
        required: u32,
        /// Amount the player holds across all units.
        available: u32,
    },

    /// Invalid unit identifier.
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    /// Invalid player identifier.
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// Catalog or config refers to a unit kind that does not exist.
    #[error("Unknown unit kind: {0}")]
    UnknownUnitKind(String),

    /// Data file parsing error.
    #[error("Failed to parse data '{source_name}': {message}")]
    DataParseError {
        /// Name of the document that failed to parse.
        source_name: String,
        /// Error message.
        message: String,
    },

    /// Invalid simulation state.
    #[error("Invalid simulation state: {0}")]
    InvalidState(String),
}
