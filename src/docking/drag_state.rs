use egui::Pos2;

use super::types::{DockState, DragState, DropOutcome, PanelId, Zone};
use super::DockingManager;

impl DockingManager {
    /// Begin dragging a panel.
    ///
    /// A tabbed panel is first pulled out of its tab group and floats at the drag start point.
    /// Starting a new drag while another is active abandons the old one without committing it.
    pub fn start_drag(&mut self, id: &str, pointer: Pos2) -> bool {
        let Some((minimized, tabbed)) = self
            .panels
            .get(id)
            .map(|p| (p.minimized, p.state == DockState::Tabbed))
        else {
            log::trace!("start_drag: unknown {id:?}");
            return false;
        };
        if minimized {
            return false;
        }
        if let Some(prev) = self.drag.take() {
            log::debug!("start_drag: abandoning drag of {:?}", prev.panel_id);
            self.debug_log_event(format!("drag ABANDON {}", prev.panel_id));
        }

        if tabbed {
            self.float_panel(id, pointer);
        } else {
            self.bring_to_front(id);
        }

        let panel_origin = self.panels.get(id).map_or(pointer, |p| p.position);
        let hovered_zone = self.hover_zone_at(id, pointer);
        self.drag = Some(DragState {
            panel_id: id.to_owned(),
            start_position: pointer,
            current_position: pointer,
            is_dragging: true,
            hovered_zone,
            panel_origin,
        });

        log::debug!("drag START {id:?} at {pointer:?}");
        self.debug_log_event(format!("drag START {id} at {pointer:?} zone={hovered_zone:?}"));
        self.notify_drag();
        true
    }

    /// Track the pointer and recompute the hovered zone. Returns the zone, or `None` when no
    /// drag is active.
    pub fn update_drag(&mut self, pointer: Pos2) -> Option<Zone> {
        let panel_id = self.drag.as_ref()?.panel_id.clone();
        let zone = self.hover_zone_at(&panel_id, pointer);
        let drag = self.drag.as_mut()?;
        let zone_changed = drag.hovered_zone != zone;
        drag.current_position = pointer;
        drag.hovered_zone = zone;

        if zone_changed {
            self.debug_log_event(format!("drag HOVER {panel_id} zone={zone:?}"));
        }
        self.notify_drag();
        Some(zone)
    }

    /// Commit the active drag according to the hovered zone. The drag state is always cleared.
    pub fn end_drag(&mut self) -> Option<DropOutcome> {
        let drag = self.drag.take()?;
        let id = drag.panel_id.clone();
        if !self.panels.contains_key(&id) {
            self.notify_drag();
            return None;
        }

        let drop_position = drag.drop_position();
        let outcome = match drag.hovered_zone {
            zone if zone.is_edge() => {
                self.dock_panel(&id, zone);
                DropOutcome::Docked { panel_id: id, zone }
            }
            Zone::TabGroup => match self.tab_on_drop(&id, drag.current_position) {
                Some(group_id) => DropOutcome::Tabbed {
                    panel_id: id,
                    group_id,
                },
                None => {
                    self.float_panel(&id, drop_position);
                    DropOutcome::Floating {
                        panel_id: id,
                        position: drop_position,
                    }
                }
            },
            _ => {
                self.float_panel(&id, drop_position);
                DropOutcome::Floating {
                    panel_id: id,
                    position: drop_position,
                }
            }
        };

        log::debug!("drag END {outcome:?}");
        self.debug_log_event(format!("drag END {outcome:?}"));
        self.notify_drag();
        Some(outcome)
    }

    /// Drop the active drag without changing any panel.
    pub fn cancel_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        self.debug_log_event(format!("drag CANCEL {}", drag.panel_id));
        self.notify_drag();
        true
    }

    /// Zone under `pointer` for a drag of `dragged`.
    ///
    /// Outside the container nothing is hovered. In the center zone, hovering an existing tab
    /// group or another floating panel offers tabbing.
    fn hover_zone_at(&self, dragged: &str, pointer: Pos2) -> Zone {
        if !self.container.contains(pointer) {
            return Zone::None;
        }
        let zone = self.zones.classify(pointer);
        if zone == Zone::Center && self.tab_target_at(dragged, pointer) {
            return Zone::TabGroup;
        }
        zone
    }

    fn tab_target_at(&self, dragged: &str, pointer: Pos2) -> bool {
        self.tab_group_at(dragged, pointer).is_some()
            || self
                .panels
                .values()
                .any(|p| p.id != dragged && p.state == DockState::Floating && p.rect().contains(pointer))
    }

    /// Topmost tab group under `pointer` that `dragged` is not already part of.
    fn tab_group_at(&self, dragged: &str, pointer: Pos2) -> Option<&str> {
        self.tab_groups
            .values()
            .filter(|g| !g.contains(dragged) && g.rect().contains(pointer))
            .max_by_key(|g| {
                g.panel_ids
                    .iter()
                    .filter_map(|id| self.panels.get(id))
                    .map(|p| p.z_index)
                    .max()
                    .unwrap_or(i32::MIN)
            })
            .map(|g| g.id.as_str())
    }

    /// Tab `id` into whatever is under the drop point.
    ///
    /// Prefers an existing tab group; otherwise gathers floating panels within
    /// `options.tab_group_radius` of the drop point into a new group.
    fn tab_on_drop(&mut self, id: &str, drop_point: Pos2) -> Option<String> {
        if let Some(group_id) = self.tab_group_at(id, drop_point).map(str::to_owned) {
            return self.add_to_tab_group(&group_id, id).then_some(group_id);
        }

        let radius = self.options.tab_group_radius.max(0.0);
        let mut nearby: Vec<(f32, PanelId)> = self
            .panels
            .values()
            .filter(|p| p.id != id && p.state == DockState::Floating)
            .map(|p| (p.rect().distance_to_pos(drop_point), p.id.clone()))
            .filter(|(d, _)| *d <= radius)
            .collect();
        if nearby.is_empty() {
            return None;
        }
        nearby.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        // The group takes the place of the panel closest to the drop point.
        let anchor = self.panels.get(&nearby[0].1)?;
        let (position, size) = (anchor.position, anchor.size);

        let mut members = Vec::with_capacity(nearby.len() + 1);
        members.push(id.to_owned());
        members.extend(nearby.into_iter().map(|(_, pid)| pid));
        self.create_tab_group(&members, position, size)
    }
}
