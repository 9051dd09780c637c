use std::collections::hash_map::Entry;

use glam::IVec3;

use crate::core::TreeConfig;
use crate::voxel::VoxelValue;

use super::node::{empty_child, uniform_child};
use super::{InternalNode, Node, RootNode, RootSlot, Slot};

/// Sparse multi-resolution voxel tree.
///
/// A tree owns exactly one root node and the background value returned for
/// every coordinate not covered by an active tile or voxel. Its shape is
/// fixed by a [`TreeConfig`]; trees are only compatible for combination when
/// their configurations compare equal.
#[derive(Clone, PartialEq, Debug)]
pub struct Tree<V> {
    config: TreeConfig,
    root: RootNode<V>,
}

/// Result of descending to the entry defining a coordinate.
enum Resolved<V> {
    /// No entry covers the coordinate.
    Background,
    /// A constant tile stored in a node at `level`.
    Tile { value: V, active: bool, level: u32 },
    /// A voxel of a leaf node.
    Voxel { value: V, active: bool },
}

impl<V: VoxelValue> Tree<V> {
    #[must_use]
    pub fn new(config: TreeConfig, background: V) -> Self {
        Self {
            root: RootNode::new(background),
            config,
        }
    }

    #[must_use]
    #[inline(always)]
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    #[must_use]
    #[inline(always)]
    pub fn background(&self) -> V {
        self.root.background()
    }

    #[must_use]
    pub fn root(&self) -> &RootNode<V> {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut RootNode<V> {
        &mut self.root
    }

    /// `true` if the tree has no tiles and no nodes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Value at `coord`: the stored value of the active tile or voxel
    /// covering it, else the background.
    #[must_use]
    pub fn value_at(&self, coord: IVec3) -> V {
        match self.resolve(coord) {
            Resolved::Tile {
                value,
                active: true,
                ..
            }
            | Resolved::Voxel {
                value,
                active: true,
            } => value,
            _ => self.root.background(),
        }
    }

    /// `true` if an active tile or voxel covers `coord`.
    #[must_use]
    pub fn active_at(&self, coord: IVec3) -> bool {
        matches!(
            self.resolve(coord),
            Resolved::Tile { active: true, .. } | Resolved::Voxel { active: true, .. }
        )
    }

    /// Depth of the node holding the active entry covering `coord`, counted
    /// from the root: a root tile reports 0, a leaf voxel the deepest
    /// value. Returns -1 when no active entry covers the coordinate.
    #[must_use]
    pub fn value_depth(&self, coord: IVec3) -> i32 {
        match self.resolve(coord) {
            Resolved::Tile {
                active: true,
                level,
                ..
            } => self.config.depth_of(level),
            Resolved::Voxel { active: true, .. } => self.config.depth_of(0),
            _ => -1,
        }
    }

    /// Looks up the node with exactly `origin` and `level`, descending
    /// through expanded children only. Returns `None` across tiles, empty
    /// regions, and unaligned origins.
    #[must_use]
    pub fn probe_node(&self, origin: IVec3, level: u32) -> Option<&Node<V>> {
        let top = self.config.internal_levels();
        assert!(level <= top, "node level {level} outside tree configuration");

        let slot = self.root.get(self.config.root_origin(origin))?;
        let RootSlot::Node(node) = slot else {
            return None;
        };

        let mut current: &Node<V> = node;
        loop {
            if current.level() == level {
                return (current.origin() == origin).then_some(current);
            }
            let Node::Internal(inner) = current else {
                return None;
            };
            match inner.slot(inner.index_of(origin)) {
                Slot::Node(child) => current = child,
                _ => return None,
            }
        }
    }

    /// Writes `value` at `coord` and activates the voxel, expanding tiles
    /// and allocating nodes along the way as needed.
    pub fn set_value(&mut self, coord: IVec3, value: V) {
        let background = self.root.background();
        let config = &self.config;
        let root_origin = config.root_origin(coord);
        let top = config.internal_levels();

        let slot = root_child_mut(&mut self.root, config, root_origin, top, background);
        let RootSlot::Node(node) = slot else {
            unreachable!()
        };

        let mut current: &mut Node<V> = node.as_mut();
        loop {
            match current {
                Node::Leaf(leaf) => {
                    let index = leaf.index_of(coord);
                    leaf.set_value(index, value);
                    return;
                }
                Node::Internal(inner) => {
                    let index = inner.index_of(coord);
                    ensure_child(config, background, inner, index);
                    let Slot::Node(child) = inner.slot_mut(index) else {
                        unreachable!()
                    };
                    current = child.as_mut();
                }
            }
        }
    }

    /// Inserts a constant tile at the given value level (1 = finest tile,
    /// `root_level()` = root tile), replacing whatever occupied that entry.
    pub fn add_tile(&mut self, level: u32, coord: IVec3, value: V, active: bool) {
        let root_level = self.config.root_level();
        assert!(
            level >= 1 && level <= root_level,
            "tile level {level} outside tree configuration"
        );

        let root_origin = self.config.root_origin(coord);
        if level == root_level {
            self.root.insert(root_origin, RootSlot::Tile { value, active });
            return;
        }

        let background = self.root.background();
        let config = &self.config;
        let top = config.internal_levels();

        let slot = root_child_mut(&mut self.root, config, root_origin, top, background);
        let RootSlot::Node(node) = slot else {
            unreachable!()
        };

        let mut current: &mut Node<V> = node.as_mut();
        loop {
            let Node::Internal(inner) = current else {
                unreachable!("leaf reached above tile level");
            };
            let index = inner.index_of(coord);
            if inner.level() == level {
                *inner.slot_mut(index) = Slot::Tile { value, active };
                return;
            }
            ensure_child(config, background, inner, index);
            let Slot::Node(child) = inner.slot_mut(index) else {
                unreachable!()
            };
            current = child.as_mut();
        }
    }

    /// Number of active tiles at every level.
    #[must_use]
    pub fn active_tile_count(&self) -> usize {
        self.root
            .iter()
            .map(|(_, slot)| match slot {
                RootSlot::Tile { active: true, .. } => 1,
                RootSlot::Tile { .. } => 0,
                RootSlot::Node(node) => node_tile_count(node),
            })
            .sum()
    }

    /// Number of leaf nodes.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.root
            .iter()
            .map(|(_, slot)| match slot {
                RootSlot::Tile { .. } => 0,
                RootSlot::Node(node) => node_leaf_count(node),
            })
            .sum()
    }

    /// Number of active voxels, counting every voxel an active tile
    /// represents.
    #[must_use]
    pub fn active_voxel_count(&self) -> u64 {
        let top = self.config.internal_levels();
        self.root
            .iter()
            .map(|(_, slot)| match slot {
                RootSlot::Tile { active: true, .. } => cube(self.config.span(top)),
                RootSlot::Tile { .. } => 0,
                RootSlot::Node(node) => node_voxel_count(&self.config, node),
            })
            .sum()
    }

    fn resolve(&self, coord: IVec3) -> Resolved<V> {
        let Some(slot) = self.root.get(self.config.root_origin(coord)) else {
            return Resolved::Background;
        };

        let mut current: &Node<V> = match slot {
            RootSlot::Tile { value, active } => {
                return Resolved::Tile {
                    value: *value,
                    active: *active,
                    level: self.config.root_level(),
                };
            }
            RootSlot::Node(node) => node,
        };

        loop {
            match current {
                Node::Leaf(leaf) => {
                    let index = leaf.index_of(coord);
                    return Resolved::Voxel {
                        value: leaf.value(index),
                        active: leaf.active(index),
                    };
                }
                Node::Internal(inner) => match inner.slot(inner.index_of(coord)) {
                    Slot::Empty => return Resolved::Background,
                    Slot::Tile { value, active } => {
                        return Resolved::Tile {
                            value: *value,
                            active: *active,
                            level: inner.level(),
                        };
                    }
                    Slot::Node(child) => current = child,
                },
            }
        }
    }
}

/// Returns the root slot at `origin` as a child node, inserting an empty
/// child or expanding an existing root tile first if necessary.
fn root_child_mut<'a, V: VoxelValue>(
    root: &'a mut RootNode<V>,
    config: &TreeConfig,
    origin: IVec3,
    top: u32,
    background: V,
) -> &'a mut RootSlot<V> {
    match root.entry(origin) {
        Entry::Vacant(entry) => entry.insert(RootSlot::Node(Box::new(empty_child(
            config, top, origin, background,
        )))),
        Entry::Occupied(entry) => {
            let slot = entry.into_mut();
            if let RootSlot::Tile { value, active } = slot {
                let (value, active) = (*value, *active);
                *slot = RootSlot::Node(Box::new(uniform_child(
                    config, top, origin, value, active,
                )));
            }
            slot
        }
    }
}

/// Replaces an empty or tile slot with an expanded child node so descent can
/// continue through it.
fn ensure_child<V: VoxelValue>(
    config: &TreeConfig,
    background: V,
    node: &mut InternalNode<V>,
    index: usize,
) {
    let level = node.level();
    let origin = node.origin_of_slot(index);
    let slot = node.slot_mut(index);
    match slot {
        Slot::Node(_) => {}
        Slot::Empty => {
            *slot = Slot::Node(Box::new(empty_child(config, level - 1, origin, background)));
        }
        Slot::Tile { value, active } => {
            let (value, active) = (*value, *active);
            *slot = Slot::Node(Box::new(uniform_child(
                config,
                level - 1,
                origin,
                value,
                active,
            )));
        }
    }
}

fn node_tile_count<V: VoxelValue>(node: &Node<V>) -> usize {
    match node {
        Node::Leaf(_) => 0,
        Node::Internal(inner) => inner
            .slots()
            .iter()
            .map(|slot| match slot {
                Slot::Tile { active: true, .. } => 1,
                Slot::Node(child) => node_tile_count(child),
                _ => 0,
            })
            .sum(),
    }
}

fn node_leaf_count<V: VoxelValue>(node: &Node<V>) -> usize {
    match node {
        Node::Leaf(_) => 1,
        Node::Internal(inner) => inner
            .slots()
            .iter()
            .map(|slot| match slot {
                Slot::Node(child) => node_leaf_count(child),
                _ => 0,
            })
            .sum(),
    }
}

fn node_voxel_count<V: VoxelValue>(config: &TreeConfig, node: &Node<V>) -> u64 {
    match node {
        Node::Leaf(leaf) => leaf.active_count() as u64,
        Node::Internal(inner) => {
            let child_span = config.span(inner.level() - 1);
            inner
                .slots()
                .iter()
                .map(|slot| match slot {
                    Slot::Tile { active: true, .. } => cube(child_span),
                    Slot::Node(child) => node_voxel_count(config, child),
                    _ => 0,
                })
                .sum()
        }
    }
}

#[inline(always)]
fn cube(span: i32) -> u64 {
    let span = span as u64;
    span * span * span
}
