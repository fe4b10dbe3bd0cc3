use egui::{Pos2, Vec2};

use super::types::{DockState, Panel, PanelId, TabGroup, TabGroupId, Zone};
use super::DockingManager;

impl DockingManager {
    /// Put the given panels into a new tab group, in order. The first panel becomes active.
    ///
    /// Unknown ids and duplicates are skipped; panels already in another group move over.
    /// Returns `None` if no listed panel is registered.
    pub fn create_tab_group(
        &mut self,
        panel_ids: &[PanelId],
        position: Pos2,
        size: Vec2,
    ) -> Option<TabGroupId> {
        let mut members: Vec<PanelId> = Vec::with_capacity(panel_ids.len());
        for id in panel_ids {
            if self.panels.contains_key(id) && !members.contains(id) {
                members.push(id.clone());
            }
        }
        let active_panel = members.first()?.clone();

        for id in &members {
            self.detach_from_tab_group(id);
        }

        let group_id = self.allocate_tab_group_id();
        let title = self
            .panels
            .get(&active_panel)
            .map(|p| p.title.clone())
            .unwrap_or_default();

        for id in &members {
            if let Some(panel) = self.panels.get_mut(id) {
                join_group(panel, &group_id, position, size);
            }
        }
        self.tab_groups.insert(
            group_id.clone(),
            TabGroup {
                id: group_id.clone(),
                title,
                panel_ids: members,
                active_panel,
                position,
                size,
            },
        );

        log::debug!("create_tab_group {group_id:?}");
        self.debug_log_event(format!("tabs CREATE {group_id}"));
        self.commit("create_tab_group");
        Some(group_id)
    }

    /// Append a panel to an existing tab group and make it the active tab.
    pub fn add_to_tab_group(&mut self, group_id: &str, panel_id: &str) -> bool {
        if !self.tab_groups.contains_key(group_id) || !self.panels.contains_key(panel_id) {
            return false;
        }
        if self.tab_groups[group_id].contains(panel_id) {
            return self.set_active_tab_panel(group_id, panel_id);
        }

        self.detach_from_tab_group(panel_id);
        let Some(group) = self.tab_groups.get_mut(group_id) else {
            return false;
        };
        group.panel_ids.push(panel_id.to_owned());
        group.active_panel = panel_id.to_owned();
        let (position, size) = (group.position, group.size);
        if let Some(panel) = self.panels.get_mut(panel_id) {
            join_group(panel, group_id, position, size);
        }

        log::debug!("add_to_tab_group {panel_id:?} -> {group_id:?}");
        self.debug_log_event(format!("tabs ADD {panel_id} -> {group_id}"));
        self.commit("add_to_tab_group");
        true
    }

    /// Take a panel out of its tab group; it floats at the group's position.
    pub fn remove_from_tab_group(&mut self, panel_id: &str) -> bool {
        let Some(position) = self
            .panels
            .get(panel_id)
            .and_then(|p| p.tab_group_id.as_ref())
            .and_then(|gid| self.tab_groups.get(gid))
            .map(|g| g.position)
        else {
            return false;
        };
        self.float_panel(panel_id, position)
    }

    pub fn set_active_tab_panel(&mut self, group_id: &str, panel_id: &str) -> bool {
        let Some(group) = self.tab_groups.get_mut(group_id) else {
            return false;
        };
        if !group.contains(panel_id) {
            return false;
        }
        if group.active_panel != panel_id {
            group.active_panel = panel_id.to_owned();
            self.notify_tab_groups();
        }
        true
    }

    /// Move a tab `offset` places within its group. The target index is clamped to the list,
    /// there is no wraparound.
    pub fn move_tab(&mut self, group_id: &str, panel_id: &str, offset: isize) -> bool {
        let Some(group) = self.tab_groups.get_mut(group_id) else {
            return false;
        };
        let Some(from) = group.panel_ids.iter().position(|id| id == panel_id) else {
            return false;
        };
        let last = group.panel_ids.len() as isize - 1;
        let to = (from as isize).saturating_add(offset).clamp(0, last) as usize;
        if to != from {
            let id = group.panel_ids.remove(from);
            group.panel_ids.insert(to, id);
            self.debug_log_event(format!("tabs MOVE {panel_id} in {group_id}: {from} -> {to}"));
            self.notify_tab_groups();
        }
        true
    }

    /// Move/resize a whole tab group, keeping its members in sync.
    pub fn set_tab_group_geometry(&mut self, group_id: &str, position: Pos2, size: Vec2) -> bool {
        let Some(group) = self.tab_groups.get_mut(group_id) else {
            return false;
        };
        group.position = position;
        group.size = size;
        for id in &group.panel_ids {
            if let Some(panel) = self.panels.get_mut(id) {
                panel.position = position;
                panel.size = panel.clamp_size(size);
            }
        }
        self.commit("set_tab_group_geometry");
        true
    }

    /// Remove `panel_id` from its tab group, if any. Returns whether it was tabbed.
    ///
    /// Empty groups are deleted; when the active tab leaves, the first remaining tab becomes
    /// active. The panel itself is left `FLOATING` with no group.
    pub(super) fn detach_from_tab_group(&mut self, panel_id: &str) -> bool {
        let Some(group_id) = self
            .panels
            .get_mut(panel_id)
            .and_then(|p| p.tab_group_id.take())
        else {
            return false;
        };
        if let Some(panel) = self.panels.get_mut(panel_id) {
            if panel.state == DockState::Tabbed {
                panel.state = DockState::Floating;
            }
        }

        let Some(group) = self.tab_groups.get_mut(&group_id) else {
            return true;
        };
        group.panel_ids.retain(|id| id != panel_id);
        match group.panel_ids.first().cloned() {
            None => {
                self.tab_groups.remove(&group_id);
                log::debug!("tab group {group_id:?} emptied and removed");
                self.debug_log_event(format!("tabs DELETE {group_id}"));
            }
            Some(first) => {
                if group.active_panel == panel_id {
                    group.active_panel = first;
                }
            }
        }
        true
    }

    fn allocate_tab_group_id(&mut self) -> TabGroupId {
        loop {
            let serial = self.next_tab_group_serial;
            self.next_tab_group_serial = serial.saturating_add(1);
            let id = format!("tabs-{serial}");
            if !self.tab_groups.contains_key(&id) {
                return id;
            }
        }
    }
}

fn join_group(panel: &mut Panel, group_id: &str, position: Pos2, size: Vec2) {
    panel.state = DockState::Tabbed;
    panel.tab_group_id = Some(group_id.to_owned());
    panel.dock_zone = Zone::TabGroup;
    panel.minimized = false;
    panel.restore_state = None;
    panel.position = position;
    panel.size = panel.clamp_size(size);
}
