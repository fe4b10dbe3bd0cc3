use std::collections::BTreeMap;

use egui::{Pos2, Rect, Vec2};

pub type PanelId = String;
pub type TabGroupId = String;

/// How a panel is currently attached to the container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DockState {
    #[default]
    Docked,
    Floating,
    Tabbed,
    Minimized,
}

/// Named region of the container used to decide where a dragged panel attaches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    #[default]
    None,
    Left,
    Right,
    Top,
    Bottom,
    Center,
    TabGroup,
}

impl Zone {
    /// `true` for the four container edges.
    pub fn is_edge(self) -> bool {
        matches!(self, Self::Left | Self::Right | Self::Top | Self::Bottom)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    pub id: PanelId,
    pub title: String,
    pub state: DockState,
    pub position: Pos2,
    pub size: Vec2,
    pub min_size: Vec2,
    pub max_size: Vec2,
    pub dock_zone: Zone,
    pub tab_group_id: Option<TabGroupId>,
    pub minimized: bool,
    pub z_index: i32,

    /// State to return to on restore. Only `Some` while minimized.
    pub restore_state: Option<DockState>,
}

impl Panel {
    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.position, self.size)
    }

    pub(crate) fn clamp_size(&self, size: Vec2) -> Vec2 {
        clamp_size(size, self.min_size, self.max_size)
    }

    /// Whether the panel takes part in the layout pass (not minimized, not hidden in a tab group).
    pub fn is_laid_out(&self) -> bool {
        !self.minimized && self.state != DockState::Tabbed
    }
}

/// Clamp `size` into `[min, max]` per axis. A `max` below `min` is treated as `min`.
pub(crate) fn clamp_size(size: Vec2, min: Vec2, max: Vec2) -> Vec2 {
    Vec2::new(
        size.x.max(min.x).min(max.x.max(min.x)),
        size.y.max(min.y).min(max.y.max(min.y)),
    )
}

#[derive(Clone, Debug, PartialEq)]
pub struct TabGroup {
    pub id: TabGroupId,
    pub title: String,
    pub panel_ids: Vec<PanelId>,
    pub active_panel: PanelId,
    pub position: Pos2,
    pub size: Vec2,
}

impl TabGroup {
    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.position, self.size)
    }

    pub fn contains(&self, panel_id: &str) -> bool {
        self.panel_ids.iter().any(|id| id == panel_id)
    }
}

/// Transient state of the one active drag. Never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct DragState {
    pub panel_id: PanelId,
    pub start_position: Pos2,
    pub current_position: Pos2,
    pub is_dragging: bool,
    pub hovered_zone: Zone,

    /// Panel position when the drag started.
    pub(crate) panel_origin: Pos2,
}

impl DragState {
    /// Where the panel's top-left corner would be if it was dropped right now.
    pub fn drop_position(&self) -> Pos2 {
        self.panel_origin + (self.current_position - self.start_position)
    }
}

/// What [`super::DockingManager::end_drag`] did with the dragged panel.
#[derive(Clone, Debug, PartialEq)]
pub enum DropOutcome {
    Docked { panel_id: PanelId, zone: Zone },
    Floating { panel_id: PanelId, position: Pos2 },
    Tabbed { panel_id: PanelId, group_id: TabGroupId },
}

impl DropOutcome {
    pub fn panel_id(&self) -> &str {
        match self {
            Self::Docked { panel_id, .. }
            | Self::Floating { panel_id, .. }
            | Self::Tabbed { panel_id, .. } => panel_id,
        }
    }
}

/// State-change notifications published by [`super::DockingManager`].
#[derive(Clone, Debug)]
pub enum DockEvent {
    Panels(BTreeMap<PanelId, Panel>),
    TabGroups(BTreeMap<TabGroupId, TabGroup>),
    Drag(Option<DragState>),
}
