//! Terrain catalog and generators.
//!
//! Every cell gets exactly one [`Terrain`] value when the grid is built.
//! Terrain never changes afterwards: there is no erosion and no destruction.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grid::GridCoord;
use crate::math::{fixed_serde, Fixed};

/// Visual and mechanical terrain category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Open ground, base movement speed.
    #[default]
    Grass,
    /// Loose ground, slightly slower.
    Sand,
    /// Raised rocky ground.
    Rock,
    /// Waterlogged ground, slowest.
    Swamp,
}

impl TerrainKind {
    /// All terrain kinds in catalog order.
    pub const ALL: [Self; 4] = [Self::Grass, Self::Sand, Self::Rock, Self::Swamp];

    /// Static catalog lookup for this kind, with no deposits.
    #[must_use]
    pub fn terrain(self) -> Terrain {
        let (cost_percent, elevation) = match self {
            Self::Grass => (100, 0),
            Self::Sand => (125, 0),
            Self::Rock => (150, 2),
            Self::Swamp => (200, 0),
        };
        Terrain {
            kind: self,
            movement_cost: Fixed::from_num(cost_percent) / Fixed::from_num(100),
            elevation,
            deposits: Deposits::NONE,
        }
    }
}

/// Resource deposits a drill can extract from a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Deposits {
    /// Iron vein: drills yield resources.
    pub iron: bool,
    /// Crystal field: drills yield points.
    pub crystal: bool,
}

impl Deposits {
    /// No deposits.
    pub const NONE: Self = Self {
        iron: false,
        crystal: false,
    };

    /// Check whether any deposit is present.
    #[must_use]
    pub const fn any(self) -> bool {
        self.iron || self.crystal
    }
}

/// Immutable per-cell terrain data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Terrain {
    /// Display category.
    pub kind: TerrainKind,
    /// Multiplier applied to a mobile unit's base move cooldown.
    #[serde(with = "fixed_serde")]
    pub movement_cost: Fixed,
    /// Height level, used by the renderer for shading.
    pub elevation: u8,
    /// Extractable deposits.
    pub deposits: Deposits,
}

impl Terrain {
    /// Attach deposits to this terrain value.
    #[must_use]
    pub const fn with_deposits(mut self, deposits: Deposits) -> Self {
        self.deposits = deposits;
        self
    }
}

impl Default for Terrain {
    fn default() -> Self {
        TerrainKind::Grass.terrain()
    }
}

/// Strategy used to assign terrain when a grid is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainGenerator {
    /// Every cell gets the same kind and no deposits.
    Uniform(TerrainKind),
    /// Deterministic category from the coordinate alone.
    ///
    /// Kinds come in diagonal bands; deposits sit on a sparse lattice.
    Banded,
    /// Seeded random category and deposits.
    Random {
        /// Chance (0-100) that a cell holds iron.
        iron_percent: u8,
        /// Chance (0-100) that a cell holds crystal.
        crystal_percent: u8,
    },
}

impl Default for TerrainGenerator {
    fn default() -> Self {
        Self::Random {
            iron_percent: 10,
            crystal_percent: 5,
        }
    }
}

impl TerrainGenerator {
    /// Produce the terrain for one cell.
    pub fn generate<R: Rng + ?Sized>(&self, coord: GridCoord, rng: &mut R) -> Terrain {
        match *self {
            Self::Uniform(kind) => kind.terrain(),
            Self::Banded => {
                let band = (coord.x / 4 + coord.y / 3).rem_euclid(4) as usize;
                let deposits = Deposits {
                    iron: (coord.x * 7 + coord.y * 13).rem_euclid(11) == 0,
                    crystal: (coord.x * 5 + coord.y * 3).rem_euclid(17) == 0,
                };
                TerrainKind::ALL[band].terrain().with_deposits(deposits)
            }
            Self::Random {
                iron_percent,
                crystal_percent,
            } => {
                let kind = TerrainKind::ALL[rng.gen_range(0..TerrainKind::ALL.len())];
                let deposits = Deposits {
                    iron: rng.gen_range(0..100u8) < iron_percent,
                    crystal: rng.gen_range(0..100u8) < crystal_percent,
                };
                kind.terrain().with_deposits(deposits)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_catalog_costs_are_positive() {
        for kind in TerrainKind::ALL {
            assert!(kind.terrain().movement_cost > Fixed::ZERO);
        }
        assert_eq!(TerrainKind::Grass.terrain().movement_cost, Fixed::ONE);
        assert_eq!(TerrainKind::Swamp.terrain().movement_cost, Fixed::from_num(2));
    }

    #[test]
    fn test_uniform_has_no_deposits() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let t = TerrainGenerator::Uniform(TerrainKind::Sand).generate(GridCoord::new(3, 4), &mut rng);
        assert_eq!(t.kind, TerrainKind::Sand);
        assert!(!t.deposits.any());
    }

    #[test]
    fn test_banded_is_deterministic() {
        let mut rng_a = ChaCha8Rng::seed_from_u64(1);
        let mut rng_b = ChaCha8Rng::seed_from_u64(99);
        for x in 0..16 {
            for y in 0..12 {
                let c = GridCoord::new(x, y);
                assert_eq!(
                    TerrainGenerator::Banded.generate(c, &mut rng_a),
                    TerrainGenerator::Banded.generate(c, &mut rng_b)
                );
            }
        }
        let origin = TerrainGenerator::Banded.generate(GridCoord::new(0, 0), &mut rng_a);
        assert!(origin.deposits.iron);
        assert!(origin.deposits.crystal);
    }

    #[test]
    fn test_random_respects_zero_chances() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let generator = TerrainGenerator::Random {
            iron_percent: 0,
            crystal_percent: 0,
        };
        for x in 0..20 {
            let t = generator.generate(GridCoord::new(x, 0), &mut rng);
            assert!(!t.deposits.any());
        }
    }
}
