//! Player resource and point pools.
//!
//! A player's wealth is not a single counter: each unit carries a share in
//! `resources` and `points`, and these functions keep the shares balanced.
//! All arithmetic is integer; remainders go out one at a time in the
//! player's unit-list order.

use crate::simulation::UnitStorage;
use crate::unit::UnitId;

/// Equal share of `total` for the unit at `index` out of `count`.
///
/// The first `total % count` units get one extra.
const fn share(total: u32, count: u32, index: u32) -> u32 {
    let base = total / count;
    if index < total % count {
        base + 1
    } else {
        base
    }
}

/// Sum of resource shares across a unit list.
#[must_use]
pub fn total_resources(units: &[UnitId], storage: &UnitStorage) -> u32 {
    units
        .iter()
        .filter_map(|&id| storage.get(id))
        .map(|u| u.resources)
        .sum()
}

/// Sum of point shares across a unit list.
#[must_use]
pub fn total_points(units: &[UnitId], storage: &UnitStorage) -> u32 {
    units
        .iter()
        .filter_map(|&id| storage.get(id))
        .map(|u| u.points)
        .sum()
}

/// Spread the pooled resources evenly over every unit in the list.
pub fn redistribute_resources(units: &[UnitId], storage: &mut UnitStorage) {
    let live: Vec<UnitId> = units
        .iter()
        .copied()
        .filter(|&id| storage.contains(id))
        .collect();
    if live.is_empty() {
        return;
    }

    let total = total_resources(&live, storage);
    let count = live.len() as u32;
    for (index, id) in live.into_iter().enumerate() {
        if let Some(unit) = storage.get_mut(id) {
            unit.resources = share(total, count, index as u32);
        }
    }
}

/// Move the pooled points onto the control structures in the list.
///
/// With no control structure present the shares are left untouched, so
/// points are never destroyed by redistribution.
pub fn redistribute_points(units: &[UnitId], storage: &mut UnitStorage) {
    let holders: Vec<UnitId> = units
        .iter()
        .copied()
        .filter(|&id| storage.get(id).is_some_and(|u| u.kind.is_control()))
        .collect();
    if holders.is_empty() {
        return;
    }

    let total = total_points(units, storage);
    for &id in units {
        if let Some(unit) = storage.get_mut(id) {
            unit.points = 0;
        }
    }

    let count = holders.len() as u32;
    for (index, id) in holders.into_iter().enumerate() {
        if let Some(unit) = storage.get_mut(id) {
            unit.points = share(total, count, index as u32);
        }
    }
}

/// Take `amount` resources from the pool.
///
/// Fails without touching any share if the pool holds less than `amount`.
/// Otherwise one resource at a time is taken round-robin from units that
/// still hold some, then the pool is rebalanced.
pub fn spend_resources(units: &[UnitId], storage: &mut UnitStorage, amount: u32) -> bool {
    let available = total_resources(units, storage);
    if available < amount {
        return false;
    }
    if amount == 0 {
        return true;
    }

    let live: Vec<UnitId> = units
        .iter()
        .copied()
        .filter(|&id| storage.contains(id))
        .collect();

    let mut remaining = amount;
    let mut cursor = 0;
    while remaining > 0 {
        if let Some(unit) = storage.get_mut(live[cursor % live.len()]) {
            if unit.resources > 0 {
                unit.resources -= 1;
                remaining -= 1;
            }
        }
        cursor += 1;
    }

    redistribute_resources(&live, storage);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridCoord;
    use crate::simulation::UnitSpawnParams;
    use crate::unit::{Owner, UnitKind};

    fn storage_with(kinds: &[UnitKind], resources: &[u32]) -> (UnitStorage, Vec<UnitId>) {
        let mut storage = UnitStorage::new();
        let catalog = crate::catalog::UnitCatalog::default();
        let config = crate::config::SimConfig::default();
        let ids = kinds
            .iter()
            .zip(resources)
            .map(|(&kind, &res)| {
                let params = UnitSpawnParams {
                    kind,
                    owner: Owner::Player(0),
                    position: GridCoord::new(0, 0),
                    resources: res,
                    ..Default::default()
                };
                storage.insert(params.build(&catalog.stats(kind), &config))
            })
            .collect();
        (storage, ids)
    }

    fn shares(storage: &UnitStorage, ids: &[UnitId]) -> Vec<u32> {
        ids.iter().map(|&id| storage.get(id).unwrap().resources).collect()
    }

    #[test]
    fn test_share_hands_out_remainder_in_order() {
        assert_eq!(share(10, 3, 0), 4);
        assert_eq!(share(10, 3, 1), 3);
        assert_eq!(share(10, 3, 2), 3);
    }

    #[test]
    fn test_redistribute_resources() {
        let kinds = [UnitKind::WallTower; 3];
        let (mut storage, ids) = storage_with(&kinds, &[10, 0, 1]);
        redistribute_resources(&ids, &mut storage);
        assert_eq!(shares(&storage, &ids), vec![4, 4, 3]);

        redistribute_resources(&ids, &mut storage);
        assert_eq!(shares(&storage, &ids), vec![4, 4, 3]);
    }

    #[test]
    fn test_redistribute_points_to_control_only() {
        let kinds = [UnitKind::ControlTower, UnitKind::DrillTower, UnitKind::ControlTower];
        let (mut storage, ids) = storage_with(&kinds, &[0, 0, 0]);
        storage.get_mut(ids[1]).unwrap().points = 7;

        redistribute_points(&ids, &mut storage);

        let points: Vec<u32> = ids.iter().map(|&id| storage.get(id).unwrap().points).collect();
        assert_eq!(points, vec![4, 0, 3]);
    }

    #[test]
    fn test_redistribute_points_without_control_keeps_points() {
        let kinds = [UnitKind::DrillTower, UnitKind::WallTower];
        let (mut storage, ids) = storage_with(&kinds, &[0, 0]);
        storage.get_mut(ids[0]).unwrap().points = 5;

        redistribute_points(&ids, &mut storage);
        assert_eq!(storage.get(ids[0]).unwrap().points, 5);
    }

    #[test]
    fn test_spend_resources_exact() {
        let kinds = [UnitKind::WallTower; 3];
        let (mut storage, ids) = storage_with(&kinds, &[5, 0, 2]);

        assert!(spend_resources(&ids, &mut storage, 6));
        assert_eq!(total_resources(&ids, &storage), 1);
    }

    #[test]
    fn test_spend_resources_insufficient_is_noop() {
        let kinds = [UnitKind::WallTower; 2];
        let (mut storage, ids) = storage_with(&kinds, &[3, 2]);

        assert!(!spend_resources(&ids, &mut storage, 6));
        assert_eq!(shares(&storage, &ids), vec![3, 2]);
    }
}
