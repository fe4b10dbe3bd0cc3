use std::collections::{BTreeMap, VecDeque};
use std::sync::mpsc::Receiver;

use egui::{Pos2, Rect, Vec2};

use crate::events::EventBus;
use crate::layout::{LayoutAdjustment, LayoutItem};

mod debug;
mod drag_state;
mod geometry;
mod integrity;
mod options;
mod tabs;
mod types;

#[cfg(test)]
mod model_tests;

pub use geometry::{DockZones, docked_rect};
pub use options::DockingOptions;
pub use types::{
    DockEvent, DockState, DragState, DropOutcome, Panel, PanelId, TabGroup, TabGroupId, Zone,
};

pub(crate) use types::clamp_size;

/// Owns the authoritative panel and tab-group maps and runs the drag state machine.
///
/// All mutations happen on the UI thread. Operations that name an unknown panel or tab group are
/// no-ops that report `false`/`None`: events for a panel that is being torn down are expected to
/// arrive out of order.
#[derive(Debug)]
pub struct DockingManager {
    pub options: DockingOptions,

    panels: BTreeMap<PanelId, Panel>,
    tab_groups: BTreeMap<TabGroupId, TabGroup>,
    drag: Option<DragState>,

    container: Rect,
    zones: DockZones,

    next_tab_group_serial: u64,
    next_z_index: i32,
    revision: u64,

    events: EventBus<DockEvent>,

    debug_log: VecDeque<String>,
    debug_seq: u64,
    debug_last_integrity_hash: u64,
}

impl Default for DockingManager {
    fn default() -> Self {
        Self::new(DockingOptions::default())
    }
}

impl DockingManager {
    pub fn new(options: DockingOptions) -> Self {
        let container = options.default_container;
        let zones = DockZones::new(container, options.zone_threshold);
        Self {
            options,
            panels: BTreeMap::new(),
            tab_groups: BTreeMap::new(),
            drag: None,
            container,
            zones,
            next_tab_group_serial: 1,
            next_z_index: 1,
            revision: 0,
            events: EventBus::default(),
            debug_log: VecDeque::new(),
            debug_seq: 0,
            debug_last_integrity_hash: 0,
        }
    }

    // ------------------------------------------------------------------------------------------
    // Queries

    pub fn panels(&self) -> &BTreeMap<PanelId, Panel> {
        &self.panels
    }

    pub fn panel(&self, id: &str) -> Option<&Panel> {
        self.panels.get(id)
    }

    pub fn tab_groups(&self) -> &BTreeMap<TabGroupId, TabGroup> {
        &self.tab_groups
    }

    pub fn tab_group(&self, id: &str) -> Option<&TabGroup> {
        self.tab_groups.get(id)
    }

    pub fn drag_state(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn container_bounds(&self) -> Rect {
        self.container
    }

    pub fn zones(&self) -> &DockZones {
        &self.zones
    }

    /// Bumped by every panel, tab-group or container change. Drag updates do not count.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Rectangles of every panel that takes part in the layout pass, for
    /// [`crate::layout::PanelLayoutCoordinator`].
    pub fn layout_items(&self) -> Vec<LayoutItem> {
        self.panels
            .values()
            .filter(|p| p.is_laid_out())
            .map(|p| LayoutItem {
                id: p.id.clone(),
                rect: p.rect(),
                min_size: p.min_size,
                max_size: p.max_size,
            })
            .collect()
    }

    // ------------------------------------------------------------------------------------------
    // Observers

    pub fn subscribe(&mut self) -> Receiver<DockEvent> {
        self.events.subscribe()
    }

    fn notify_panels(&mut self) {
        self.revision += 1;
        let panels = &self.panels;
        self.events.emit_with(|| DockEvent::Panels(panels.clone()));
    }

    fn notify_tab_groups(&mut self) {
        self.revision += 1;
        let groups = &self.tab_groups;
        self.events.emit_with(|| DockEvent::TabGroups(groups.clone()));
    }

    fn notify_drag(&mut self) {
        let drag = &self.drag;
        self.events.emit_with(|| DockEvent::Drag(drag.clone()));
    }

    /// Publish panel + tab-group state and run the optional integrity check.
    fn commit(&mut self, what: &str) {
        self.notify_panels();
        self.notify_tab_groups();
        self.debug_check_integrity(what);
    }

    // ------------------------------------------------------------------------------------------
    // Registration

    /// Insert a new panel. Returns `false` (and changes nothing) if the id is already registered.
    ///
    /// `TABBED` needs a tab group and is registered as `FLOATING`; use
    /// [`Self::create_tab_group`] afterwards.
    pub fn register_panel(
        &mut self,
        id: impl Into<PanelId>,
        title: impl Into<String>,
        position: Pos2,
        size: Vec2,
        state: DockState,
    ) -> bool {
        let id = id.into();
        if self.panels.contains_key(&id) {
            log::trace!("register_panel: {id:?} already registered");
            return false;
        }

        let min_size = self.options.default_min_size;
        let max_size = self.options.default_max_size;
        let (state, restore_state, minimized) = match state {
            DockState::Tabbed => (DockState::Floating, None, false),
            DockState::Minimized => (DockState::Minimized, Some(DockState::Floating), true),
            other => (other, None, false),
        };
        let z_index = self.allocate_z_index();

        let panel = Panel {
            id: id.clone(),
            title: title.into(),
            state,
            position,
            size: clamp_size(size, min_size, max_size),
            min_size,
            max_size,
            dock_zone: Zone::None,
            tab_group_id: None,
            minimized,
            z_index,
            restore_state,
        };

        log::debug!("register_panel {id:?} state={state:?}");
        self.debug_log_event(format!("register {id} state={state:?}"));
        self.panels.insert(id, panel);
        self.commit("register_panel");
        true
    }

    /// Set size constraints for a panel and re-clamp its current size.
    pub fn set_size_constraints(&mut self, id: &str, min_size: Vec2, max_size: Vec2) -> bool {
        let Some(panel) = self.panels.get_mut(id) else {
            return false;
        };
        panel.min_size = min_size;
        panel.max_size = max_size;
        panel.size = panel.clamp_size(panel.size);
        self.commit("set_size_constraints");
        true
    }

    /// Remove a panel, detaching it from its tab group first.
    pub fn unregister_panel(&mut self, id: &str) -> Option<Panel> {
        if !self.panels.contains_key(id) {
            log::trace!("unregister_panel: unknown {id:?}");
            return None;
        }
        if self.drag.as_ref().is_some_and(|d| d.panel_id == id) {
            self.drag = None;
            self.notify_drag();
        }
        self.detach_from_tab_group(id);
        let removed = self.panels.remove(id);

        log::debug!("unregister_panel {id:?}");
        self.debug_log_event(format!("unregister {id}"));
        self.commit("unregister_panel");
        removed
    }

    /// Unregister everything. Used by destructive layout loads.
    pub fn clear(&mut self) {
        let ids: Vec<PanelId> = self.panels.keys().cloned().collect();
        for id in ids {
            self.unregister_panel(&id);
        }
        self.next_tab_group_serial = 1;
        self.next_z_index = 1;
    }

    // ------------------------------------------------------------------------------------------
    // Placement

    /// Dock a panel to a container edge.
    ///
    /// The panel claims `options.dock_fraction` of the container along the docking axis,
    /// clamped to its size constraints. Non-edge zones make the panel float where it is.
    pub fn dock_panel(&mut self, id: &str, zone: Zone) -> bool {
        if !self.panels.contains_key(id) {
            return false;
        }
        let Some(rect) = docked_rect(self.container, zone, self.options.dock_fraction) else {
            let position = self.panels[id].position;
            return self.float_panel(id, position);
        };

        self.detach_from_tab_group(id);
        let Some(panel) = self.panels.get_mut(id) else {
            return false;
        };
        let size = panel.clamp_size(rect.size());
        // Right/bottom docks stay flush with the far edge after clamping.
        let position = match zone {
            Zone::Right => egui::pos2(rect.max.x - size.x, rect.min.y),
            Zone::Bottom => egui::pos2(rect.min.x, rect.max.y - size.y),
            _ => rect.min,
        };
        panel.state = DockState::Docked;
        panel.dock_zone = zone;
        panel.position = position;
        panel.size = size;
        panel.minimized = false;
        panel.restore_state = None;

        log::debug!("dock_panel {id:?} zone={zone:?}");
        self.debug_log_event(format!("dock {id} zone={zone:?} rect={:?}", panel_rect(position, size)));
        self.commit("dock_panel");
        true
    }

    /// Make a panel free-floating at `position`.
    pub fn float_panel(&mut self, id: &str, position: Pos2) -> bool {
        if !self.panels.contains_key(id) {
            return false;
        }
        self.detach_from_tab_group(id);
        let z_index = self.allocate_z_index();
        let Some(panel) = self.panels.get_mut(id) else {
            return false;
        };
        panel.state = DockState::Floating;
        panel.dock_zone = Zone::Center;
        panel.position = position;
        panel.minimized = false;
        panel.restore_state = None;
        panel.z_index = z_index;

        log::debug!("float_panel {id:?} at {position:?}");
        self.debug_log_event(format!("float {id} at {position:?}"));
        self.commit("float_panel");
        true
    }

    /// Raise a panel above every other panel.
    pub fn bring_to_front(&mut self, id: &str) -> bool {
        if !self.panels.contains_key(id) {
            return false;
        }
        let z_index = self.allocate_z_index();
        if let Some(panel) = self.panels.get_mut(id) {
            panel.z_index = z_index;
        }
        self.notify_panels();
        true
    }

    /// Hide a panel. Its content stays registered but is not laid out.
    ///
    /// A tabbed panel leaves its tab group first and restores as floating.
    pub fn minimize_panel(&mut self, id: &str) -> bool {
        match self.panels.get(id) {
            None => return false,
            Some(panel) if panel.minimized => return true,
            Some(_) => {}
        }

        let was_tabbed = self.detach_from_tab_group(id);
        let Some(panel) = self.panels.get_mut(id) else {
            return false;
        };
        let prior = if was_tabbed {
            DockState::Floating
        } else {
            panel.state
        };
        panel.restore_state = Some(prior);
        panel.state = DockState::Minimized;
        panel.minimized = true;

        log::debug!("minimize_panel {id:?} (restore to {prior:?})");
        self.debug_log_event(format!("minimize {id} prior={prior:?}"));
        self.commit("minimize_panel");
        true
    }

    /// Undo [`Self::minimize_panel`], returning the panel to its prior state.
    pub fn restore_panel(&mut self, id: &str) -> bool {
        match self.panels.get(id) {
            None => return false,
            Some(panel) if !panel.minimized => return true,
            Some(_) => {}
        }
        let z_index = self.allocate_z_index();
        let Some(panel) = self.panels.get_mut(id) else {
            return false;
        };
        let state = match panel.restore_state.take() {
            Some(DockState::Minimized | DockState::Tabbed) | None => DockState::Floating,
            Some(state) => state,
        };
        panel.state = state;
        panel.minimized = false;
        panel.z_index = z_index;

        log::debug!("restore_panel {id:?} -> {state:?}");
        self.debug_log_event(format!("restore {id} state={state:?}"));
        self.commit("restore_panel");
        true
    }

    // ------------------------------------------------------------------------------------------
    // Container

    /// Recompute the dock zones for subsequent drags. Already docked panels are not moved.
    ///
    /// Also picks up edits to `options.zone_threshold` when the bounds are unchanged.
    pub fn update_container_bounds(&mut self, bounds: Rect) {
        let zones = DockZones::new(bounds, self.options.zone_threshold);
        if bounds == self.container {
            if zones != self.zones {
                log::debug!("zone threshold -> {}", zones.threshold);
                self.zones = zones;
            }
            return;
        }
        self.container = bounds;
        self.zones = zones;
        self.revision += 1;
        log::debug!("container bounds -> {bounds:?}");
        self.debug_log_event(format!("container {bounds:?}"));
    }

    /// Change the edge distance that counts as a dock zone and rebuild the zones.
    pub fn set_zone_threshold(&mut self, threshold: f32) {
        self.options.zone_threshold = threshold;
        self.zones = DockZones::new(self.container, threshold);
        self.debug_log_event(format!("zone threshold {}", self.zones.threshold));
    }

    /// Apply geometry computed by [`crate::layout::PanelLayoutCoordinator`].
    ///
    /// Adjustments for unknown panels are skipped. Returns the number applied.
    pub fn apply_adjustments(&mut self, adjustments: &[LayoutAdjustment]) -> usize {
        let mut applied = 0;
        for adj in adjustments {
            let Some(panel) = self.panels.get_mut(&adj.panel_id) else {
                continue;
            };
            panel.position = egui::pos2(adj.new_x, adj.new_y);
            panel.size = Vec2::new(adj.new_width, adj.new_height);
            applied += 1;
        }
        if applied > 0 {
            self.debug_log_event(format!("applied {applied} layout adjustments"));
            self.commit("apply_adjustments");
        }
        applied
    }

    // ------------------------------------------------------------------------------------------
    // Bulk replace (layout restore)

    /// Replace all state with the given panels and tab groups.
    ///
    /// Input is sanitized so the result upholds the tab-group invariants: groups keep only
    /// known, distinct panels; empty groups are dropped; panels claiming an unknown group float.
    pub(crate) fn replace_all(
        &mut self,
        panels: Vec<Panel>,
        tab_groups: Vec<TabGroup>,
        container: Rect,
    ) {
        self.clear();
        self.update_container_bounds(container);

        for panel in panels {
            if self.panels.contains_key(&panel.id) {
                log::warn!("replace_all: duplicate panel id {:?} ignored", panel.id);
                continue;
            }
            self.next_z_index = self.next_z_index.max(panel.z_index.saturating_add(1));
            self.panels.insert(panel.id.clone(), panel);
        }

        for mut group in tab_groups {
            let mut seen = Vec::with_capacity(group.panel_ids.len());
            for id in group.panel_ids.drain(..) {
                let claims = self
                    .panels
                    .get(&id)
                    .is_some_and(|p| !p.minimized && p.tab_group_id.as_deref() == Some(group.id.as_str()));
                if claims && !seen.contains(&id) {
                    seen.push(id);
                }
            }
            group.panel_ids = seen;
            let Some(first) = group.panel_ids.first().cloned() else {
                log::warn!("replace_all: dropping empty tab group {:?}", group.id);
                continue;
            };
            if !group.contains(&group.active_panel) {
                group.active_panel = first;
            }
            self.tab_groups.insert(group.id.clone(), group);
        }

        let tab_groups = &self.tab_groups;
        for panel in self.panels.values_mut() {
            let member = panel
                .tab_group_id
                .as_deref()
                .is_some_and(|gid| tab_groups.get(gid).is_some_and(|g| g.contains(&panel.id)));
            if member {
                panel.state = DockState::Tabbed;
            } else {
                panel.tab_group_id = None;
                if panel.state == DockState::Tabbed {
                    panel.state = DockState::Floating;
                }
                if panel.minimized {
                    panel.state = DockState::Minimized;
                    if matches!(panel.restore_state, None | Some(DockState::Tabbed | DockState::Minimized)) {
                        panel.restore_state = Some(DockState::Floating);
                    }
                } else {
                    panel.restore_state = None;
                    if panel.state == DockState::Minimized {
                        panel.state = DockState::Floating;
                    }
                }
            }
        }
        self.tab_groups.retain(|_, g| !g.panel_ids.is_empty());
        self.next_tab_group_serial = self.next_tab_group_serial.max(self.tab_groups.len() as u64 + 1);

        log::debug!(
            "replace_all: {} panels, {} tab groups",
            self.panels.len(),
            self.tab_groups.len()
        );
        self.debug_log_event(format!(
            "replace_all panels={} tab_groups={}",
            self.panels.len(),
            self.tab_groups.len()
        ));
        self.commit("replace_all");
    }

    fn allocate_z_index(&mut self) -> i32 {
        let z = self.next_z_index;
        self.next_z_index = self.next_z_index.saturating_add(1);
        z
    }
}

fn panel_rect(position: Pos2, size: Vec2) -> Rect {
    Rect::from_min_size(position, size)
}
