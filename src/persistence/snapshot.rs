use std::collections::HashSet;

use chrono::{DateTime, Utc};
use egui::{Rect, pos2, vec2};
use uuid::Uuid;

use crate::docking::{DockState, DockingManager, Panel, PanelId, TabGroup, TabGroupId, Zone};

use super::error::{LayoutPersistenceError, LayoutResult};
use super::templates::LayoutTemplate;

/// Newest snapshot format this crate reads and the one it writes.
pub const LAYOUT_SNAPSHOT_VERSION: u32 = 1;

/// Versioned, immutable record of the full panel/tab-group arrangement.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSnapshot {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub template: Option<LayoutTemplate>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub version: u32,
    pub panels: Vec<PanelRecord>,
    #[serde(default)]
    pub tab_groups: Vec<TabGroupRecord>,
    pub container_bounds: ContainerBounds,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelRecord {
    pub id: PanelId,
    pub title: String,
    pub state: DockState,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_width: f32,
    pub min_height: f32,
    pub max_width: f32,
    pub max_height: f32,
    #[serde(default)]
    pub dock_zone: Zone,
    #[serde(default)]
    pub tab_group_id: Option<TabGroupId>,
    #[serde(default)]
    pub is_minimized: bool,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_state: Option<DockState>,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabGroupRecord {
    pub id: TabGroupId,
    pub title: String,
    pub panel_ids: Vec<PanelId>,
    pub active_panel: PanelId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ContainerBounds {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl From<Rect> for ContainerBounds {
    fn from(rect: Rect) -> Self {
        Self {
            left: rect.min.x,
            top: rect.min.y,
            right: rect.max.x,
            bottom: rect.max.y,
        }
    }
}

impl ContainerBounds {
    pub fn rect(&self) -> Rect {
        Rect::from_min_max(pos2(self.left, self.top), pos2(self.right, self.bottom))
    }
}

/// JSON has no infinity; unbounded maxima are stored as `f32::MAX`.
fn finite_max(v: f32) -> f32 {
    if v.is_finite() { v } else { f32::MAX }
}

impl From<&Panel> for PanelRecord {
    fn from(p: &Panel) -> Self {
        Self {
            id: p.id.clone(),
            title: p.title.clone(),
            state: p.state,
            x: p.position.x,
            y: p.position.y,
            width: p.size.x,
            height: p.size.y,
            min_width: p.min_size.x,
            min_height: p.min_size.y,
            max_width: finite_max(p.max_size.x),
            max_height: finite_max(p.max_size.y),
            dock_zone: p.dock_zone,
            tab_group_id: p.tab_group_id.clone(),
            is_minimized: p.minimized,
            z_index: p.z_index,
            restore_state: p.restore_state,
        }
    }
}

impl PanelRecord {
    pub fn to_panel(&self) -> Panel {
        Panel {
            id: self.id.clone(),
            title: self.title.clone(),
            state: self.state,
            position: pos2(self.x, self.y),
            size: vec2(self.width, self.height),
            min_size: vec2(self.min_width, self.min_height),
            max_size: vec2(self.max_width, self.max_height),
            dock_zone: self.dock_zone,
            tab_group_id: self.tab_group_id.clone(),
            minimized: self.is_minimized,
            z_index: self.z_index,
            restore_state: self.restore_state,
        }
    }

    fn numbers(&self) -> [f32; 8] {
        [
            self.x,
            self.y,
            self.width,
            self.height,
            self.min_width,
            self.min_height,
            self.max_width,
            self.max_height,
        ]
    }
}

impl From<&TabGroup> for TabGroupRecord {
    fn from(g: &TabGroup) -> Self {
        Self {
            id: g.id.clone(),
            title: g.title.clone(),
            panel_ids: g.panel_ids.clone(),
            active_panel: g.active_panel.clone(),
            x: g.position.x,
            y: g.position.y,
            width: g.size.x,
            height: g.size.y,
        }
    }
}

impl TabGroupRecord {
    pub fn to_tab_group(&self) -> TabGroup {
        TabGroup {
            id: self.id.clone(),
            title: self.title.clone(),
            panel_ids: self.panel_ids.clone(),
            active_panel: self.active_panel.clone(),
            position: pos2(self.x, self.y),
            size: vec2(self.width, self.height),
        }
    }
}

impl LayoutSnapshot {
    /// Capture the current state of `dock` under a fresh id.
    pub fn capture(
        name: impl Into<String>,
        description: impl Into<String>,
        template: Option<LayoutTemplate>,
        dock: &DockingManager,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            template,
            created_at: now,
            modified_at: now,
            version: LAYOUT_SNAPSHOT_VERSION,
            panels: dock.panels().values().map(PanelRecord::from).collect(),
            tab_groups: dock.tab_groups().values().map(TabGroupRecord::from).collect(),
            container_bounds: dock.container_bounds().into(),
        }
    }

    /// Fails if the snapshot was written by a newer format than this crate supports.
    pub fn check_version(&self) -> LayoutResult<()> {
        if self.version > LAYOUT_SNAPSHOT_VERSION {
            return Err(LayoutPersistenceError::VersionMismatch {
                found: self.version,
                supported: LAYOUT_SNAPSHOT_VERSION,
            });
        }
        Ok(())
    }

    /// Version check plus structural checks that the docking model cannot repair on its own.
    pub fn validate(&self) -> LayoutResult<()> {
        self.check_version()?;

        let mut seen: HashSet<&str> = HashSet::new();
        for panel in &self.panels {
            if panel.id.is_empty() {
                return Err(LayoutPersistenceError::validation("panel with empty id"));
            }
            if !seen.insert(panel.id.as_str()) {
                return Err(LayoutPersistenceError::validation(format!(
                    "duplicate panel id {:?}",
                    panel.id
                )));
            }
            if panel.numbers().iter().any(|v| !v.is_finite()) {
                return Err(LayoutPersistenceError::validation(format!(
                    "panel {:?} has non-finite geometry",
                    panel.id
                )));
            }
        }

        let b = &self.container_bounds;
        if ![b.left, b.top, b.right, b.bottom].iter().all(|v| v.is_finite()) {
            return Err(LayoutPersistenceError::validation("non-finite container bounds"));
        }
        Ok(())
    }

    /// Destructively replace everything in `dock` with this snapshot.
    ///
    /// Validation happens first; on error `dock` is untouched.
    pub fn apply_to(&self, dock: &mut DockingManager) -> LayoutResult<()> {
        self.validate()?;
        dock.replace_all(
            self.panels.iter().map(PanelRecord::to_panel).collect(),
            self.tab_groups.iter().map(TabGroupRecord::to_tab_group).collect(),
            self.container_bounds.rect(),
        );
        Ok(())
    }

    /// Same arrangement under a new id and name, with fresh timestamps.
    pub fn duplicate_as(&self, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: now,
            modified_at: now,
            ..self.clone()
        }
    }

    pub fn panel(&self, id: &str) -> Option<&PanelRecord> {
        self.panels.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use egui::{Pos2, vec2};

    use super::*;

    fn sample_dock() -> DockingManager {
        let mut dock = DockingManager::default();
        dock.register_panel("a", "A", pos2(10.0, 20.0), vec2(300.0, 200.0), DockState::Floating);
        dock.register_panel("b", "B", Pos2::ZERO, vec2(300.0, 200.0), DockState::Floating);
        dock.register_panel("c", "C", Pos2::ZERO, vec2(300.0, 200.0), DockState::Floating);
        dock.create_tab_group(&["b".to_owned(), "c".to_owned()], pos2(400.0, 0.0), vec2(300.0, 300.0));
        dock.minimize_panel("a");
        dock
    }

    #[test]
    fn json_uses_camel_case_schema() {
        let snapshot = LayoutSnapshot::capture("Mine", "", None, &sample_dock());
        let value = serde_json::to_value(&snapshot).unwrap();

        for key in ["id", "name", "createdAt", "modifiedAt", "version", "panels", "tabGroups", "containerBounds"] {
            assert!(value.get(key).is_some(), "missing {key}: {value}");
        }
        let panel = &value["panels"][0];
        for key in ["minWidth", "maxHeight", "dockZone", "tabGroupId", "isMinimized", "zIndex"] {
            assert!(panel.get(key).is_some(), "missing {key}: {panel}");
        }
        assert_eq!(panel["state"], "MINIMIZED");
        assert_eq!(value["tabGroups"][0]["panelIds"][1], "c");
        assert_eq!(value["containerBounds"]["right"], 1280.0);
    }

    #[test]
    fn apply_restores_identical_panels() {
        let source = sample_dock();
        let snapshot = LayoutSnapshot::capture("Mine", "", None, &source);

        let mut target = DockingManager::default();
        target.register_panel("other", "Other", Pos2::ZERO, vec2(200.0, 200.0), DockState::Docked);
        snapshot.apply_to(&mut target).unwrap();

        assert_eq!(target.panels(), source.panels());
        assert_eq!(target.tab_groups(), source.tab_groups());
        assert!(target.integrity_issues().is_empty());
    }

    #[test]
    fn newer_version_is_rejected_without_touching_state() {
        let mut snapshot = LayoutSnapshot::capture("Mine", "", None, &sample_dock());
        snapshot.version = LAYOUT_SNAPSHOT_VERSION + 1;

        let mut target = DockingManager::default();
        target.register_panel("keep", "Keep", Pos2::ZERO, vec2(200.0, 200.0), DockState::Docked);
        let err = snapshot.apply_to(&mut target).unwrap_err();
        assert!(matches!(
            err,
            LayoutPersistenceError::VersionMismatch { found, supported }
                if found == LAYOUT_SNAPSHOT_VERSION + 1 && supported == LAYOUT_SNAPSHOT_VERSION
        ));
        assert!(target.panel("keep").is_some());
    }

    #[test]
    fn duplicate_panel_ids_fail_validation() {
        let mut snapshot = LayoutSnapshot::capture("Mine", "", None, &sample_dock());
        let dup = snapshot.panels[0].clone();
        snapshot.panels.push(dup);
        assert!(matches!(
            snapshot.validate(),
            Err(LayoutPersistenceError::Validation { .. })
        ));
    }

    #[test]
    fn dangling_tab_group_references_are_repaired_on_apply() {
        let mut snapshot = LayoutSnapshot::capture("Mine", "", None, &sample_dock());
        snapshot.tab_groups.clear();

        let mut dock = DockingManager::default();
        snapshot.apply_to(&mut dock).unwrap();
        assert!(dock.integrity_issues().is_empty());
        assert_eq!(dock.panel("b").unwrap().state, DockState::Floating);
        assert_eq!(dock.panel("b").unwrap().tab_group_id, None);
    }
}
