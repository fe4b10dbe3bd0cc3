use std::collections::BTreeMap;

use egui::{Rect, pos2};

use crate::docking::Zone;

/// Split direction with Dear ImGui `DockBuilder::SplitNode`-like semantics.
///
/// The direction indicates where the *side* node is placed relative to the *main* node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitDirection {
    Left,
    Right,
    Up,
    Down,
}

impl SplitDirection {
    /// The container edge a side node split off in this direction hugs.
    pub fn zone(self) -> Zone {
        match self {
            Self::Left => Zone::Left,
            Self::Right => Zone::Right,
            Self::Up => Zone::Top,
            Self::Down => Zone::Bottom,
        }
    }

    /// Split `rect` into `(side, main)`, giving `side_fraction` of the extent to `side`.
    pub fn split_rect(self, rect: Rect, side_fraction: f32) -> (Rect, Rect) {
        let w = rect.width() * side_fraction;
        let h = rect.height() * side_fraction;
        match self {
            Self::Left => {
                let x = rect.min.x + w;
                (
                    Rect::from_min_max(rect.min, pos2(x, rect.max.y)),
                    Rect::from_min_max(pos2(x, rect.min.y), rect.max),
                )
            }
            Self::Right => {
                let x = rect.max.x - w;
                (
                    Rect::from_min_max(pos2(x, rect.min.y), rect.max),
                    Rect::from_min_max(rect.min, pos2(x, rect.max.y)),
                )
            }
            Self::Up => {
                let y = rect.min.y + h;
                (
                    Rect::from_min_max(rect.min, pos2(rect.max.x, y)),
                    Rect::from_min_max(pos2(rect.min.x, y), rect.max),
                )
            }
            Self::Down => {
                let y = rect.max.y - h;
                (
                    Rect::from_min_max(pos2(rect.min.x, y), rect.max),
                    Rect::from_min_max(rect.min, pos2(rect.max.x, y)),
                )
            }
        }
    }
}

/// A logical node id used by [`DockBuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DockNodeId(u64);

#[derive(Clone, Debug)]
enum Node<Pane> {
    Leaf {
        panes: Vec<Pane>,
    },
    Split {
        dir: SplitDirection,
        side_fraction: f32,
        main: DockNodeId,
        side: DockNodeId,
    },
}

/// One leaf of a finished [`DockBuilder`] layout.
#[derive(Clone, Debug, PartialEq)]
pub struct DockLeaf<Pane> {
    pub node: DockNodeId,
    pub rect: Rect,

    /// Edge the leaf was split off towards, [`Zone::Center`] for the remainder of the root.
    pub zone: Zone,

    /// Panes docked into this leaf. More than one means they are tabbed together.
    pub panes: Vec<Pane>,
}

/// Scripted layout builder that feels close to Dear ImGui's `DockBuilder`:
/// you create empty nodes, split them, then dock panes into leaf nodes, and finally `finish()`
/// against a container rectangle.
///
/// Nodes are allowed to be empty; an empty leaf is a reserved area.
pub struct DockBuilder<Pane> {
    next_node_id: u64,
    nodes: BTreeMap<DockNodeId, Node<Pane>>,
}

impl<Pane> Default for DockBuilder<Pane> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Pane> DockBuilder<Pane> {
    pub fn new() -> Self {
        Self {
            next_node_id: 1,
            nodes: BTreeMap::new(),
        }
    }

    fn alloc_node_id(&mut self) -> DockNodeId {
        let id = DockNodeId(self.next_node_id);
        self.next_node_id = self.next_node_id.saturating_add(1);
        id
    }

    /// Create an empty leaf node.
    #[must_use]
    pub fn add_node(&mut self) -> DockNodeId {
        let id = self.alloc_node_id();
        self.nodes.insert(id, Node::Leaf { panes: Vec::new() });
        id
    }

    /// Split an existing node and return `(side, main)` (Dear ImGui semantics).
    ///
    /// The `node` itself becomes the split, and its original content is moved into the returned
    /// `main` child node. `side_fraction` is clamped to `0.0..=1.0`.
    #[must_use]
    pub fn split_node(
        &mut self,
        node: DockNodeId,
        dir: SplitDirection,
        side_fraction: f32,
    ) -> (DockNodeId, DockNodeId) {
        let side_fraction = if side_fraction.is_finite() {
            side_fraction.clamp(0.0, 1.0)
        } else {
            0.5
        };

        let old = self
            .nodes
            .remove(&node)
            .unwrap_or(Node::Leaf { panes: Vec::new() });
        let main = self.alloc_node_id();
        self.nodes.insert(main, old);

        let side = self.add_node();

        self.nodes.insert(
            node,
            Node::Split {
                dir,
                side_fraction,
                main,
                side,
            },
        );

        (side, main)
    }

    /// Dock a pane into a leaf node. Returns `false` (dropping the pane) if `node` is a split or
    /// does not exist.
    pub fn dock_pane(&mut self, pane: Pane, node: DockNodeId) -> bool {
        match self.nodes.get_mut(&node) {
            Some(Node::Leaf { panes }) => {
                panes.push(pane);
                true
            }
            Some(Node::Split { .. }) => {
                log::warn!("dock_pane: node {node:?} is not a leaf");
                false
            }
            None => {
                log::warn!("dock_pane: node {node:?} does not exist");
                false
            }
        }
    }

    /// Dock multiple panes into a leaf node (tabbed together).
    pub fn dock_panes(&mut self, panes: impl IntoIterator<Item = Pane>, node: DockNodeId) -> bool {
        let mut ok = true;
        for pane in panes {
            ok &= self.dock_pane(pane, node);
        }
        ok
    }

    /// Finish building, assigning every leaf reachable from `root` its rectangle inside `bounds`.
    ///
    /// Leaves come out in depth-first order, main child before side child.
    pub fn finish(self, root: DockNodeId, bounds: Rect) -> Vec<DockLeaf<Pane>> {
        self.finish_map(root, bounds, Some)
    }

    /// Like [`Self::finish`], mapping docked items along the way.
    ///
    /// Returning `None` drops that item from the output.
    pub fn finish_map<OutPane>(
        self,
        root: DockNodeId,
        bounds: Rect,
        mut map: impl FnMut(Pane) -> Option<OutPane>,
    ) -> Vec<DockLeaf<OutPane>> {
        fn build_leaves<Pane, OutPane>(
            node_id: DockNodeId,
            rect: Rect,
            zone: Zone,
            nodes: &mut BTreeMap<DockNodeId, Node<Pane>>,
            out: &mut Vec<DockLeaf<OutPane>>,
            map: &mut impl FnMut(Pane) -> Option<OutPane>,
        ) {
            match nodes.remove(&node_id) {
                Some(Node::Leaf { panes }) => out.push(DockLeaf {
                    node: node_id,
                    rect,
                    zone,
                    panes: panes.into_iter().filter_map(|p| map(p)).collect(),
                }),
                Some(Node::Split {
                    dir,
                    side_fraction,
                    main,
                    side,
                }) => {
                    let (side_rect, main_rect) = dir.split_rect(rect, side_fraction);
                    build_leaves(main, main_rect, zone, nodes, out, map);
                    build_leaves(side, side_rect, dir.zone(), nodes, out, map);
                }
                None => out.push(DockLeaf {
                    node: node_id,
                    rect,
                    zone,
                    panes: Vec::new(),
                }),
            }
        }

        let mut nodes = self.nodes;
        let mut out = Vec::new();
        build_leaves(root, bounds, Zone::Center, &mut nodes, &mut out, &mut map);
        out
    }
}
