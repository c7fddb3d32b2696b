//! The simulation grid.
//!
//! The grid owns its cells, each cell's terrain, and the set of units
//! standing on each cell. Occupancy is membership only: the unit arena owns
//! the units, the grid just records which cell each one stands on.
//!
//! Every mutation here is confined to occupant sets and silently ignores
//! coordinates outside the grid.

use std::collections::BTreeSet;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};
use crate::terrain::{Terrain, TerrainGenerator};
use crate::unit::UnitId;

/// Integer (column, row) index into the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GridCoord {
    /// Column.
    pub x: i32,
    /// Row, growing downward.
    pub y: i32,
}

impl GridCoord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinate shifted by a delta.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Signed (dx, dy) from `self` to `other`.
    #[must_use]
    pub const fn delta_to(self, other: Self) -> (i32, i32) {
        (other.x - self.x, other.y - self.y)
    }

    /// Manhattan distance in cells.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The four axis-aligned neighbours, in east, west, south, north order.
    #[must_use]
    pub const fn neighbors4(self) -> [Self; 4] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
        ]
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One grid cell.
#[derive(Debug, Clone)]
pub struct Cell {
    coord: GridCoord,
    terrain: Terrain,
    occupants: BTreeSet<UnitId>,
}

impl Cell {
    /// Coordinate of this cell.
    #[must_use]
    pub const fn coord(&self) -> GridCoord {
        self.coord
    }

    /// Terrain assigned at construction.
    #[must_use]
    pub const fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Units currently standing on this cell, in id order.
    pub fn occupants(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.occupants.iter().copied()
    }

    /// Check whether a unit stands here.
    #[must_use]
    pub fn contains(&self, unit: UnitId) -> bool {
        self.occupants.contains(&unit)
    }

    /// Check whether the cell is empty.
    #[must_use]
    pub fn is_vacant(&self) -> bool {
        self.occupants.is_empty()
    }
}

/// Rectangular grid of cells.
#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    /// Side length of a cell in pixels.
    cell_size: Fixed,
    /// Row-major cell storage.
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a grid and assign terrain to every cell.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero, or if `cell_size` is not positive.
    pub fn new<R: Rng + ?Sized>(
        width: u32,
        height: u32,
        cell_size: Fixed,
        generator: &TerrainGenerator,
        rng: &mut R,
    ) -> Self {
        assert!(width > 0, "Grid width must be positive");
        assert!(height > 0, "Grid height must be positive");
        assert!(cell_size > Fixed::ZERO, "Grid cell_size must be positive");

        let mut cells = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let coord = GridCoord::new(x, y);
                cells.push(Cell {
                    coord,
                    terrain: generator.generate(coord, rng),
                    occupants: BTreeSet::new(),
                });
            }
        }

        Self {
            width,
            height,
            cell_size,
            cells,
        }
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Cell side length in pixels.
    #[must_use]
    pub const fn cell_size(&self) -> Fixed {
        self.cell_size
    }

    /// Check if a coordinate lies inside `[0, width) x [0, height)`.
    #[must_use]
    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as u32) < self.width
            && (coord.y as u32) < self.height
    }

    fn index(&self, coord: GridCoord) -> Option<usize> {
        self.in_bounds(coord)
            .then(|| (coord.y as usize) * (self.width as usize) + (coord.x as usize))
    }

    /// Cell at a coordinate, or `None` if out of bounds.
    #[must_use]
    pub fn cell_at(&self, coord: GridCoord) -> Option<&Cell> {
        self.index(coord).map(|i| &self.cells[i])
    }

    fn cell_at_mut(&mut self, coord: GridCoord) -> Option<&mut Cell> {
        self.index(coord).map(move |i| &mut self.cells[i])
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Terrain movement-cost multiplier at a coordinate.
    #[must_use]
    pub fn movement_cost(&self, coord: GridCoord) -> Option<Fixed> {
        self.cell_at(coord).map(|c| c.terrain.movement_cost)
    }

    /// Convert a pixel position to the grid cell under it.
    ///
    /// The pan offset is subtracted first. Returns `None` outside the grid.
    #[must_use]
    pub fn pixel_to_grid(&self, pixel: Vec2Fixed, pan: Vec2Fixed) -> Option<GridCoord> {
        let local = pixel - pan;
        let x = (local.x / self.cell_size).floor().to_num::<i64>();
        let y = (local.y / self.cell_size).floor().to_num::<i64>();

        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(GridCoord::new(x as i32, y as i32))
    }

    /// Pixel position of a cell's centre, shifted by the pan offset.
    #[must_use]
    pub fn grid_to_pixel_center(&self, coord: GridCoord, pan: Vec2Fixed) -> Vec2Fixed {
        let half = self.cell_size / Fixed::from_num(2);
        Vec2Fixed::new(
            Fixed::from_num(coord.x) * self.cell_size + half + pan.x,
            Fixed::from_num(coord.y) * self.cell_size + half + pan.y,
        )
    }

    /// Record a unit on a cell. No-op if the coordinate is invalid.
    pub fn add_unit(&mut self, unit: UnitId, coord: GridCoord) {
        if let Some(cell) = self.cell_at_mut(coord) {
            cell.occupants.insert(unit);
        }
    }

    /// Remove a unit from a cell. No-op if the coordinate is invalid.
    pub fn remove_unit(&mut self, unit: UnitId, coord: GridCoord) {
        if let Some(cell) = self.cell_at_mut(coord) {
            cell.occupants.remove(&unit);
        }
    }

    /// Transfer occupancy between cells.
    ///
    /// No-op unless both coordinates are on the grid.
    pub fn move_unit(&mut self, unit: UnitId, old: GridCoord, new: GridCoord) {
        if !self.in_bounds(old) || !self.in_bounds(new) {
            return;
        }
        self.remove_unit(unit, old);
        self.add_unit(unit, new);
    }

    /// Units standing on a cell (empty for invalid coordinates).
    #[must_use]
    pub fn occupants(&self, coord: GridCoord) -> Vec<UnitId> {
        self.cell_at(coord)
            .map(|c| c.occupants().collect())
            .unwrap_or_default()
    }

    /// Uniformly random on-grid coordinate.
    pub fn random_coord<R: Rng + ?Sized>(&self, rng: &mut R) -> GridCoord {
        GridCoord::new(
            rng.gen_range(0..self.width) as i32,
            rng.gen_range(0..self.height) as i32,
        )
    }

    /// Uniformly random on-grid coordinate other than `except`.
    ///
    /// `None` when the grid has no other cell.
    pub fn random_coord_except<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        except: GridCoord,
    ) -> Option<GridCoord> {
        let total = self.width * self.height;
        let Some(skip) = self.index_of(except) else {
            return Some(self.random_coord(rng));
        };
        if total <= 1 {
            return None;
        }
        let mut index = rng.gen_range(0..total - 1);
        if index >= skip {
            index += 1;
        }
        Some(GridCoord::new(
            (index % self.width) as i32,
            (index / self.width) as i32,
        ))
    }

    fn index_of(&self, coord: GridCoord) -> Option<u32> {
        self.in_bounds(coord)
            .then(|| coord.y as u32 * self.width + coord.x as u32)
    }
}
