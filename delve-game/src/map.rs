//! Layered dungeon map generation and validation.
//!
//! A map is a stack of depth layers. Every node at depth `d` links only to
//! nodes at `d + 1`; the deepest layer is terminal. The graph is generated
//! once per run and only `is_revealed` changes afterward.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::constants::{DEFAULT_NODES_PER_DEPTH, EXTRA_CONNECTION_CHANCE};
use crate::encounters::EncounterKind;
use crate::energy::{calculate_node_energy_cost, calculate_return_cost};
use crate::error::DelveError;

pub type Connections = SmallVec<[String; 2]>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonNode {
    pub id: String,
    pub depth: u32,
    pub position: u32,
    #[serde(rename = "type")]
    pub kind: EncounterKind,
    pub energy_cost: u32,
    pub return_cost: u32,
    #[serde(default)]
    pub is_revealed: bool,
    #[serde(default)]
    pub connections: Connections,
}

impl DungeonNode {
    #[must_use]
    pub fn node_id(depth: u32, position: u32) -> String {
        format!("node-{depth}-{position}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapValidationError {
    #[error("map has no nodes")]
    Empty,
    #[error("depth {depth} has no nodes")]
    MissingDepth { depth: u32 },
    #[error("node {node_id} has no incoming connection")]
    Orphan { node_id: String },
    #[error("node {node_id} has no forward connection")]
    DeadEnd { node_id: String },
    #[error("node {from} links to unknown node {to}")]
    UnknownConnection { from: String, to: String },
    #[error("node {from} links to {to}, which is not one level deeper")]
    NonAdjacentConnection { from: String, to: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonMap {
    pub run_id: String,
    pub max_depth: u32,
    pub nodes: Vec<DungeonNode>,
}

impl DungeonMap {
    #[must_use]
    pub fn node(&self, node_id: &str) -> Option<&DungeonNode> {
        self.nodes.iter().find(|node| node.id == node_id)
    }

    pub fn nodes_at_depth(&self, depth: u32) -> impl Iterator<Item = &DungeonNode> {
        self.nodes.iter().filter(move |node| node.depth == depth)
    }

    /// Mark a node visible to the player.
    ///
    /// # Errors
    ///
    /// `NodeNotFound` for an unknown id.
    pub fn reveal(&mut self, node_id: &str) -> Result<(), DelveError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|node| node.id == node_id)
            .ok_or_else(|| DelveError::NodeNotFound {
                id: node_id.to_string(),
            })?;
        node.is_revealed = true;
        Ok(())
    }
}

/// Relative odds of each kind appearing at `depth`.
fn kind_weight(kind: EncounterKind, depth: u32) -> u32 {
    match kind {
        EncounterKind::PuzzleChamber | EncounterKind::DiscoverySite => {
            16_u32.saturating_sub(depth).max(4)
        }
        EncounterKind::TradeOpportunity => 12,
        EncounterKind::RestSite => 10,
        EncounterKind::SafePassage => 6,
        EncounterKind::Hazard => (8 + 2 * depth).min(30),
        EncounterKind::RiskEvent => (6 + 2 * depth).min(28),
        EncounterKind::Scoundrel => (6 + depth).min(14),
    }
}

fn pick_kind<R>(depth: u32, rng: &mut R) -> EncounterKind
where
    R: Rng + ?Sized,
{
    let total: u32 = EncounterKind::ALL
        .iter()
        .map(|&kind| kind_weight(kind, depth))
        .sum();
    let mut remaining = rng.gen_range(0..total);
    for kind in EncounterKind::ALL {
        let weight = kind_weight(kind, depth);
        if remaining < weight {
            return kind;
        }
        remaining -= weight;
    }
    EncounterKind::SafePassage
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DungeonMapGenerator {
    nodes_per_depth: u32,
}

impl Default for DungeonMapGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_NODES_PER_DEPTH)
    }
}

impl DungeonMapGenerator {
    #[must_use]
    pub const fn new(nodes_per_depth: u32) -> Self {
        Self {
            nodes_per_depth: if nodes_per_depth == 0 {
                1
            } else {
                nodes_per_depth
            },
        }
    }

    /// Nodes for a single layer, without connections.
    pub fn generate_depth_level<R>(&self, depth: u32, rng: &mut R) -> Vec<DungeonNode>
    where
        R: Rng + ?Sized,
    {
        let return_cost = calculate_return_cost(depth, &[]);
        (0..self.nodes_per_depth)
            .map(|position| {
                let kind = pick_kind(depth, rng);
                DungeonNode {
                    id: DungeonNode::node_id(depth, position),
                    depth,
                    position,
                    kind,
                    energy_cost: calculate_node_energy_cost(depth, kind),
                    return_cost,
                    is_revealed: depth == 1,
                    connections: Connections::new(),
                }
            })
            .collect()
    }

    /// Build and wire every layer from 1 to `max_depth`.
    pub fn generate_full_map<R>(&self, run_id: &str, max_depth: u32, rng: &mut R) -> DungeonMap
    where
        R: Rng + ?Sized,
    {
        let max_depth = max_depth.max(1);
        let mut layers: Vec<Vec<DungeonNode>> = (1..=max_depth)
            .map(|depth| self.generate_depth_level(depth, rng))
            .collect();
        for idx in 1..layers.len() {
            let (upper, lower) = layers.split_at_mut(idx);
            if let Some(upper) = upper.last_mut() {
                link_layers(upper, &lower[0], rng);
            }
        }
        let nodes: Vec<DungeonNode> = layers.into_iter().flatten().collect();
        log::debug!(
            "generated map for {run_id}: {} nodes over {max_depth} levels",
            nodes.len()
        );
        DungeonMap {
            run_id: run_id.to_string(),
            max_depth,
            nodes,
        }
    }
}

/// Wire `upper` into `lower`: the aligned node, maybe a neighbour of it, then
/// patch any lower node nobody reaches from the closest upper node.
fn link_layers<R>(upper: &mut [DungeonNode], lower: &[DungeonNode], rng: &mut R)
where
    R: Rng + ?Sized,
{
    if lower.is_empty() {
        return;
    }
    let upper_len = upper.len();
    let lower_len = lower.len();
    for (idx, node) in upper.iter_mut().enumerate() {
        let aligned = idx * lower_len / upper_len.max(1);
        node.connections.push(lower[aligned].id.clone());
        if lower_len > 1 && rng.gen_bool(EXTRA_CONNECTION_CHANCE) {
            let neighbour = if aligned == 0 {
                1
            } else if aligned + 1 == lower_len || rng.gen_bool(0.5) {
                aligned - 1
            } else {
                aligned + 1
            };
            node.connections.push(lower[neighbour].id.clone());
        }
    }

    for (idx, target) in lower.iter().enumerate() {
        let reached = upper
            .iter()
            .any(|node| node.connections.contains(&target.id));
        if reached {
            continue;
        }
        let nearest = (idx * upper_len / lower_len).min(upper_len - 1);
        upper[nearest].connections.push(target.id.clone());
    }
}

/// Check the structural rules every generated map must satisfy.
///
/// # Errors
///
/// The first violated rule, as a [`MapValidationError`].
pub fn validate_map(map: &DungeonMap) -> Result<(), MapValidationError> {
    if map.nodes.is_empty() {
        return Err(MapValidationError::Empty);
    }
    let deepest = map.nodes.iter().map(|node| node.depth).max().unwrap_or(0);
    for depth in 1..=deepest {
        if map.nodes_at_depth(depth).next().is_none() {
            return Err(MapValidationError::MissingDepth { depth });
        }
    }
    if map.nodes.iter().any(|node| node.depth == 0) {
        return Err(MapValidationError::MissingDepth { depth: 1 });
    }

    let mut reached: HashSet<&str> = HashSet::new();
    for node in &map.nodes {
        if node.depth < deepest && node.connections.is_empty() {
            return Err(MapValidationError::DeadEnd {
                node_id: node.id.clone(),
            });
        }
        for target_id in &node.connections {
            let target = map.node(target_id).ok_or_else(|| {
                MapValidationError::UnknownConnection {
                    from: node.id.clone(),
                    to: target_id.clone(),
                }
            })?;
            if target.depth != node.depth + 1 {
                return Err(MapValidationError::NonAdjacentConnection {
                    from: node.id.clone(),
                    to: target_id.clone(),
                });
            }
            reached.insert(target.id.as_str());
        }
    }

    if let Some(orphan) = map
        .nodes
        .iter()
        .find(|node| node.depth > 1 && !reached.contains(node.id.as_str()))
    {
        return Err(MapValidationError::Orphan {
            node_id: orphan.id.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn generated_maps_validate() {
        for seed in 0..20 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let map = DungeonMapGenerator::default().generate_full_map("run-t", 12, &mut rng);
            assert_eq!(map.nodes.len(), 36);
            validate_map(&map).unwrap();
            assert!(map.nodes_at_depth(12).all(|n| n.connections.is_empty()));
            assert!(map.nodes_at_depth(1).all(|n| n.is_revealed));
            assert!(map.nodes_at_depth(2).all(|n| !n.is_revealed));
        }
    }

    #[test]
    fn nodes_carry_costs_and_ids() {
        let mut rng = SmallRng::seed_from_u64(4);
        let layer = DungeonMapGenerator::new(4).generate_depth_level(3, &mut rng);
        assert_eq!(layer.len(), 4);
        for node in &layer {
            assert_eq!(node.id, format!("node-3-{}", node.position));
            assert_eq!(node.return_cost, calculate_return_cost(3, &[]));
            assert_eq!(node.energy_cost, calculate_node_energy_cost(3, node.kind));
        }
    }

    #[test]
    fn deeper_levels_favour_danger() {
        assert!(kind_weight(EncounterKind::Hazard, 10) > kind_weight(EncounterKind::Hazard, 1));
        assert!(
            kind_weight(EncounterKind::PuzzleChamber, 10)
                < kind_weight(EncounterKind::PuzzleChamber, 1)
        );
        assert_eq!(kind_weight(EncounterKind::DiscoverySite, 40), 4);
        assert_eq!(kind_weight(EncounterKind::RestSite, 40), 10);
    }

    #[test]
    fn linking_patches_orphans_in_wider_layers() {
        let mut rng = SmallRng::seed_from_u64(8);
        let mut upper = DungeonMapGenerator::new(2).generate_depth_level(4, &mut rng);
        let lower = DungeonMapGenerator::new(5).generate_depth_level(5, &mut rng);
        link_layers(&mut upper, &lower, &mut rng);
        for target in &lower {
            assert!(upper.iter().any(|n| n.connections.contains(&target.id)));
        }
    }

    #[test]
    fn validation_catches_broken_graphs() {
        let mut rng = SmallRng::seed_from_u64(1);
        let map = DungeonMapGenerator::default().generate_full_map("run-t", 3, &mut rng);

        let empty = DungeonMap {
            nodes: Vec::new(),
            ..map.clone()
        };
        assert_eq!(validate_map(&empty), Err(MapValidationError::Empty));

        let mut dead_end = map.clone();
        dead_end.nodes[0].connections.clear();
        assert!(matches!(
            validate_map(&dead_end),
            Err(MapValidationError::DeadEnd { .. } | MapValidationError::Orphan { .. })
        ));

        let mut dangling = map.clone();
        dangling.nodes[0].connections.push("node-9-9".into());
        assert!(matches!(
            validate_map(&dangling),
            Err(MapValidationError::UnknownConnection { .. })
        ));

        let mut skipping = map.clone();
        skipping.nodes[0].connections.push("node-3-0".into());
        assert!(matches!(
            validate_map(&skipping),
            Err(MapValidationError::NonAdjacentConnection { .. })
        ));

        let mut gap = map;
        gap.nodes.retain(|n| n.depth != 2);
        assert_eq!(
            validate_map(&gap),
            Err(MapValidationError::MissingDepth { depth: 2 })
        );
    }

    #[test]
    fn reveal_flips_visibility() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut map = DungeonMapGenerator::default().generate_full_map("run-t", 2, &mut rng);
        map.reveal("node-2-1").unwrap();
        assert!(map.node("node-2-1").unwrap().is_revealed);
        assert!(matches!(map.reveal("node-7-0"), Err(DelveError::NodeNotFound { .. })));
    }
}
