//! Nearest-enemy search with a use-counted cache.
//!
//! Combat units ask "which unit of player P is closest to my cell?" every
//! tick. The answer comes from a breadth-first sweep over grid cells capped
//! at a fixed number of expansion rounds, and is cached per
//! `(origin, owner)` for a number of lookups so that a crowd of idle towers
//! does not re-run the sweep each tick.
//!
//! A cached miss is remembered just like a hit. A cached hit is dropped as
//! soon as the unit it names is gone.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::grid::{Grid, GridCoord};
use crate::player::PlayerId;
use crate::simulation::UnitStorage;
use crate::unit::UnitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheEntry {
    result: Option<UnitId>,
    ttl: u32,
}

/// Cached nearest-owned-unit lookups.
#[derive(Debug, Clone)]
pub struct TargetingCache {
    entries: BTreeMap<(GridCoord, PlayerId), CacheEntry>,
    ttl: u32,
    max_rounds: u32,
    debug_halt: bool,
    bfs_invocations: u64,
}

impl TargetingCache {
    /// Empty cache with the given entry lifetime and BFS round cap.
    #[must_use]
    pub const fn new(ttl: u32, max_rounds: u32) -> Self {
        Self {
            entries: BTreeMap::new(),
            ttl,
            max_rounds,
            debug_halt: false,
            bfs_invocations: 0,
        }
    }

    /// Number of breadth-first sweeps run so far.
    #[must_use]
    pub const fn bfs_invocations(&self) -> u64 {
        self.bfs_invocations
    }

    /// Make every lookup return `None` without searching.
    pub fn set_debug_halt(&mut self, halt: bool) {
        self.debug_halt = halt;
    }

    /// Number of live cache entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check for an empty cache.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every cached result.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Closest unit from `roster` to `origin`, cached.
    ///
    /// `roster` is the unit list of the player being searched for; a cell
    /// matches when one of its occupants is on that list.
    pub fn find_nearest_owned(
        &mut self,
        origin: GridCoord,
        owner: PlayerId,
        roster: &[UnitId],
        grid: &Grid,
        storage: &UnitStorage,
    ) -> Option<UnitId> {
        if self.debug_halt {
            return None;
        }

        let key = (origin, owner);
        if let Some(entry) = self.entries.get_mut(&key) {
            let still_valid = entry.ttl > 0
                && entry
                    .result
                    .map_or(true, |id| storage.get(id).is_some_and(|u| u.is_alive()));
            if still_valid {
                entry.ttl -= 1;
                trace!(?origin, owner, result = ?entry.result, ttl = entry.ttl, "targeting cache hit");
                return entry.result;
            }
            self.entries.remove(&key);
        }

        let result = self.sweep(origin, roster, grid);
        self.entries.insert(
            key,
            CacheEntry {
                result,
                ttl: self.ttl,
            },
        );
        result
    }

    /// Layer-capped breadth-first sweep. The origin cell counts as layer 0.
    fn sweep(&mut self, origin: GridCoord, roster: &[UnitId], grid: &Grid) -> Option<UnitId> {
        self.bfs_invocations += 1;

        let owned: BTreeSet<UnitId> = roster.iter().copied().collect();
        let holder = |coord: GridCoord| {
            grid.cell_at(coord)
                .and_then(|cell| cell.occupants().find(|id| owned.contains(id)))
        };

        if let Some(found) = holder(origin) {
            debug!(?origin, found, rounds = 0, "targeting sweep");
            return Some(found);
        }

        let mut searched: BTreeSet<GridCoord> = BTreeSet::new();
        let mut queued: BTreeSet<GridCoord> = BTreeSet::from([origin]);
        let mut frontier = vec![origin];

        for round in 1..=self.max_rounds {
            let mut next = Vec::new();
            for &cell in &frontier {
                searched.insert(cell);
                for neighbour in cell.neighbors4() {
                    if grid.in_bounds(neighbour)
                        && !searched.contains(&neighbour)
                        && queued.insert(neighbour)
                    {
                        next.push(neighbour);
                    }
                }
            }

            if let Some(found) = next.iter().find_map(|&c| holder(c)) {
                debug!(?origin, found, rounds = round, "targeting sweep");
                return Some(found);
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        debug!(?origin, "targeting sweep found nothing");
        None
    }
}
