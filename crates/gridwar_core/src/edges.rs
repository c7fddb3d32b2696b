//! Link network between a player's units.
//!
//! Edges are topology only. Nothing routes resources along them, but they
//! must never outlive either endpoint.

use serde::{Deserialize, Serialize};

use crate::unit::UnitId;

/// Undirected link between two units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// First endpoint (the older unit).
    pub a: UnitId,
    /// Second endpoint (the unit whose creation made the link).
    pub b: UnitId,
    /// Set when one endpoint is a placement preview.
    pub ghost: bool,
}

impl Edge {
    /// Check whether this edge touches a unit.
    #[must_use]
    pub const fn touches(&self, unit: UnitId) -> bool {
        self.a == unit || self.b == unit
    }

    /// The endpoint opposite `unit`, if `unit` is an endpoint.
    #[must_use]
    pub const fn other(&self, unit: UnitId) -> Option<UnitId> {
        if self.a == unit {
            Some(self.b)
        } else if self.b == unit {
            Some(self.a)
        } else {
            None
        }
    }
}

/// All edges in the simulation, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LinkNetwork {
    edges: Vec<Edge>,
}

impl LinkNetwork {
    /// Empty network.
    #[must_use]
    pub const fn new() -> Self {
        Self { edges: Vec::new() }
    }

    /// Link two units. Self-links and duplicates are ignored.
    ///
    /// Returns `true` if a new edge was recorded.
    pub fn add_edge(&mut self, a: UnitId, b: UnitId, ghost: bool) -> bool {
        if a == b || self.linked(a, b) {
            return false;
        }
        self.edges.push(Edge { a, b, ghost });
        true
    }

    /// Drop every edge touching `unit` in one filtered pass.
    ///
    /// Returns the opposite endpoints of the removed edges so callers can
    /// update their link counts.
    pub fn remove_all_edges_from_unit(&mut self, unit: UnitId) -> Vec<UnitId> {
        let mut neighbours = Vec::new();
        self.edges.retain(|edge| match edge.other(unit) {
            Some(other) => {
                neighbours.push(other);
                false
            }
            None => true,
        });
        neighbours
    }

    /// Check whether two units share an edge.
    #[must_use]
    pub fn linked(&self, a: UnitId, b: UnitId) -> bool {
        self.edges
            .iter()
            .any(|e| (e.a == a && e.b == b) || (e.a == b && e.b == a))
    }

    /// Edges touching a unit.
    pub fn edges_of(&self, unit: UnitId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.touches(unit))
    }

    /// All edges.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Check for an empty network.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_edge_ignores_duplicates() {
        let mut net = LinkNetwork::new();
        assert!(net.add_edge(1, 2, false));
        assert!(!net.add_edge(2, 1, false));
        assert!(!net.add_edge(3, 3, false));
        assert_eq!(net.len(), 1);
        assert!(net.linked(2, 1));
    }

    #[test]
    fn test_remove_all_edges_from_unit() {
        let mut net = LinkNetwork::new();
        net.add_edge(1, 2, false);
        net.add_edge(2, 3, false);
        net.add_edge(3, 4, true);

        let mut removed = net.remove_all_edges_from_unit(2);
        removed.sort_unstable();
        assert_eq!(removed, vec![1, 3]);
        assert!(net.edges().iter().all(|e| !e.touches(2)));
        assert_eq!(net.len(), 1);
        assert!(net.edges_of(4).all(|e| e.ghost));
    }
}
