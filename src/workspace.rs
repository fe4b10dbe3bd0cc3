//! [`DockWorkspace`]: the context object an application creates once and passes to everything
//! that arranges, persists or scrolls panels.
//!
//! Pointer-driven changes go through the workspace so that drops and resizes are post-processed by
//! the [`PanelLayoutCoordinator`]. Any mutation of the docking model, however it was made, marks
//! the auto-save dirty on the next [`DockWorkspace::tick`].

use std::path::Path;
use std::time::Duration;

use egui::{Rect, Vec2};
use uuid::Uuid;

use crate::docking::{DockState, DockingManager, DockingOptions, DropOutcome, Panel, Zone};
use crate::layout::{LayoutAdjustment, LayoutItem, LayoutOptions, PanelLayoutCoordinator};
use crate::persistence::{
    AutoSave, HistoryOutcome, LayoutPersistenceError, LayoutPersistenceManager, LayoutResult, LayoutSnapshot,
    LayoutTemplate, PersistenceOptions, pretty_ron_config,
};
use crate::scroll::{ScrollCoordinator, ScrollOptions, ScrollUpdate};

/// Every tunable of a [`DockWorkspace`], loadable from a RON file. Missing fields keep their
/// defaults.
///
/// ```text
/// (
///     docking: (zone_threshold: 40.0),
///     scroll: (min_velocity: 80.0),
///     persistence: (root_dir: "/home/me/.config/app", auto_save_interval_secs: 30),
/// )
/// ```
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct WorkspaceOptions {
    pub docking: DockingOptions,
    pub layout: LayoutOptions,
    pub scroll: ScrollOptions,
    pub persistence: PersistenceOptions,
}

impl WorkspaceOptions {
    /// # Errors
    /// [`LayoutPersistenceError::Validation`] if `text` is not valid RON for these options.
    pub fn from_ron_str(text: &str) -> LayoutResult<Self> {
        Ok(ron::from_str(text)?)
    }

    /// # Errors
    /// [`LayoutPersistenceError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_ron_str`].
    pub fn from_ron_file(path: &Path) -> LayoutResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| LayoutPersistenceError::io("read", path, e))?;
        Self::from_ron_str(&text)
    }

    pub fn to_ron_string(&self) -> LayoutResult<String> {
        Ok(ron::ser::to_string_pretty(self, pretty_ron_config())?)
    }
}

pub struct DockWorkspace {
    docking: DockingManager,
    pub layout: PanelLayoutCoordinator,
    pub scroll: ScrollCoordinator,
    persistence: LayoutPersistenceManager,
    auto_save: AutoSave,
    seen_revision: u64,
}

impl DockWorkspace {
    /// Open the layout store (creating directories and templates as needed) and build the four
    /// engines.
    ///
    /// # Errors
    /// [`LayoutPersistenceError::Io`] if the layout directory cannot be created or listed.
    pub fn open(options: WorkspaceOptions) -> LayoutResult<Self> {
        let persistence = LayoutPersistenceManager::open(options.persistence, &options.docking)?;
        let auto_save = persistence.auto_save();
        let docking = DockingManager::new(options.docking);
        Ok(Self {
            seen_revision: docking.revision(),
            docking,
            layout: PanelLayoutCoordinator::new(options.layout),
            scroll: ScrollCoordinator::new(options.scroll),
            persistence,
            auto_save,
        })
    }

    pub fn docking(&self) -> &DockingManager {
        &self.docking
    }

    /// Direct access for operations without a workspace wrapper (tab groups, minimize, …).
    pub fn docking_mut(&mut self) -> &mut DockingManager {
        &mut self.docking
    }

    pub fn persistence(&self) -> &LayoutPersistenceManager {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut LayoutPersistenceManager {
        &mut self.persistence
    }

    pub fn auto_save(&self) -> &AutoSave {
        &self.auto_save
    }

    /// Whether changes are waiting for the next auto-save.
    pub fn is_dirty(&mut self) -> bool {
        self.sync_dirty();
        self.auto_save.is_dirty()
    }

    fn sync_dirty(&mut self) {
        let revision = self.docking.revision();
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.auto_save.mark_dirty();
        }
    }

    // ------------------------------------------------------------------------------------------
    // Panels

    pub fn register_panel(
        &mut self,
        id: &str,
        title: &str,
        position: egui::Pos2,
        size: Vec2,
        state: DockState,
    ) -> bool {
        self.docking.register_panel(id, title, position, size, state)
    }

    /// Remove the panel from the docking model and its scroll registration (remembering the
    /// offset when configured to).
    pub fn unregister_panel(&mut self, id: &str) -> Option<Panel> {
        self.scroll.unregister_scrollable(id);
        self.docking.unregister_panel(id)
    }

    // ------------------------------------------------------------------------------------------
    // Pointer-driven geometry

    pub fn start_drag(&mut self, id: &str, pointer: egui::Pos2) -> bool {
        self.docking.start_drag(id, pointer)
    }

    pub fn update_drag(&mut self, pointer: egui::Pos2) -> Option<Zone> {
        self.docking.update_drag(pointer)
    }

    /// Commit the drag. A panel dropped as floating pushes overlapping floating panels aside.
    pub fn end_drag(&mut self) -> Option<DropOutcome> {
        let outcome = self.docking.end_drag()?;
        if let DropOutcome::Floating { panel_id, .. } = &outcome {
            if let Some(size) = self.docking.panel(panel_id).map(|p| p.size) {
                self.resize_panel(panel_id, size);
            }
        }
        self.sync_dirty();
        Some(outcome)
    }

    pub fn cancel_drag(&mut self) -> bool {
        self.docking.cancel_drag()
    }

    /// Resize a panel within its constraints and push floating panels it now overlaps.
    ///
    /// Returns the number of panels whose geometry changed.
    pub fn resize_panel(&mut self, id: &str, size: Vec2) -> usize {
        let items = self.coordinated_items(Some(id));
        let adjustments = self.layout.resolve_resize(id, size, &items);
        self.docking.apply_adjustments(&adjustments)
    }

    /// Change the minimum gap between floating panels and re-space them.
    pub fn set_spacing(&mut self, spacing: f32) -> usize {
        let items = self.coordinated_items(None);
        let adjustments = self.layout.enforce_spacing(spacing, &items);
        self.docking.apply_adjustments(&adjustments)
    }

    /// New container bounds from the host. Floating panels are pulled back inside.
    pub fn update_container_bounds(&mut self, bounds: Rect) -> usize {
        self.docking.update_container_bounds(bounds);

        let origin = bounds.min.to_vec2();
        let local: Vec<LayoutItem> = self
            .coordinated_items(None)
            .into_iter()
            .map(|mut item| {
                item.rect = item.rect.translate(-origin);
                item
            })
            .collect();
        let adjustments: Vec<LayoutAdjustment> = self
            .layout
            .validate_layout(bounds.width(), bounds.height(), &local)
            .into_iter()
            .map(|adj| {
                let rect = adj.rect().translate(origin);
                LayoutAdjustment::new(adj.panel_id, rect)
            })
            .collect();
        self.docking.apply_adjustments(&adjustments)
    }

    /// Floating panels, plus `subject` whatever its state. Docked geometry is owned by zones.
    fn coordinated_items(&self, subject: Option<&str>) -> Vec<LayoutItem> {
        self.docking
            .layout_items()
            .into_iter()
            .filter(|item| {
                subject == Some(item.id.as_str())
                    || self
                        .docking
                        .panel(&item.id)
                        .is_some_and(|p| p.state == DockState::Floating)
            })
            .collect()
    }

    // ------------------------------------------------------------------------------------------
    // Layouts

    /// Snapshot of the current arrangement, for writing on a worker with a cloned
    /// [`LayoutStore`](crate::persistence::LayoutStore).
    pub fn capture_layout(
        &self,
        name: &str,
        description: &str,
        template: Option<LayoutTemplate>,
    ) -> LayoutSnapshot {
        LayoutSnapshot::capture(name, description, template, &self.docking)
    }

    /// Apply a snapshot read elsewhere, e.g. by a worker. Cancels any drag in progress.
    ///
    /// # Errors
    /// See [`LayoutSnapshot::apply_to`]; nothing changes on error.
    pub fn apply_snapshot(&mut self, snapshot: &LayoutSnapshot) -> LayoutResult<()> {
        snapshot.validate()?;
        self.docking.cancel_drag();
        snapshot.apply_to(&mut self.docking)?;
        self.release_removed_scrollables();
        Ok(())
    }

    /// # Errors
    /// See [`LayoutPersistenceManager::save_layout`].
    pub fn save_layout(
        &mut self,
        name: &str,
        description: &str,
        template: Option<LayoutTemplate>,
    ) -> LayoutResult<Uuid> {
        let snapshot = self.capture_layout(name, description, template);
        self.persistence.save_snapshot(snapshot)
    }

    /// # Errors
    /// See [`LayoutPersistenceManager::load_layout`].
    pub fn load_layout(&mut self, id: Uuid) -> LayoutResult<LayoutSnapshot> {
        let snapshot = self.persistence.load_layout(id, &mut self.docking)?;
        self.release_removed_scrollables();
        Ok(snapshot)
    }

    /// # Errors
    /// See [`LayoutPersistenceManager::delete_layout`].
    pub fn delete_layout(&mut self, id: Uuid) -> LayoutResult<LayoutSnapshot> {
        self.persistence.delete_layout(id)
    }

    /// # Errors
    /// See [`LayoutPersistenceManager::load_template`].
    pub fn load_template(&mut self, template: LayoutTemplate) -> LayoutResult<LayoutSnapshot> {
        let snapshot = self.persistence.load_template(template, &mut self.docking)?;
        self.release_removed_scrollables();
        Ok(snapshot)
    }

    /// Record the current arrangement as an undo step.
    pub fn checkpoint(&mut self, description: impl Into<String>) {
        self.persistence.record_change(description, &self.docking);
    }

    /// # Errors
    /// See [`LayoutPersistenceManager::undo`].
    pub fn undo(&mut self) -> LayoutResult<HistoryOutcome> {
        self.docking.cancel_drag();
        let outcome = self.persistence.undo(&mut self.docking)?;
        self.release_removed_scrollables();
        Ok(outcome)
    }

    /// # Errors
    /// See [`LayoutPersistenceManager::redo`].
    pub fn redo(&mut self) -> LayoutResult<HistoryOutcome> {
        self.docking.cancel_drag();
        let outcome = self.persistence.redo(&mut self.docking)?;
        self.release_removed_scrollables();
        Ok(outcome)
    }

    /// # Errors
    /// See [`LayoutPersistenceManager::export_layout`].
    pub fn export_layout(&self, id: Uuid, path: &Path) -> LayoutResult<()> {
        self.persistence.export_layout(id, path)
    }

    /// # Errors
    /// See [`LayoutPersistenceManager::import_layout`].
    pub fn import_layout(&mut self, path: &Path) -> LayoutResult<Uuid> {
        self.persistence.import_layout(path)
    }

    /// Apply the last auto-save, if any. The restored state counts as saved.
    ///
    /// # Errors
    /// See [`LayoutPersistenceManager::load_autosave`].
    pub fn restore_autosave(&mut self) -> LayoutResult<bool> {
        let restored = self.persistence.load_autosave(&mut self.docking)?.is_some();
        if restored {
            self.seen_revision = self.docking.revision();
            self.release_removed_scrollables();
        }
        Ok(restored)
    }

    /// After a destructive load: unregister scroll areas whose panel is gone, so their offsets go
    /// to scroll memory.
    fn release_removed_scrollables(&mut self) {
        let gone: Vec<String> = self
            .scroll
            .scrollables()
            .keys()
            .filter(|id| self.docking.panel(id).is_none())
            .cloned()
            .collect();
        for id in gone {
            self.scroll.unregister_scrollable(&id);
        }
    }

    // ------------------------------------------------------------------------------------------
    // Frame

    /// Per-frame driver: picks up model changes for auto-save, runs the auto-save timer and
    /// advances scroll animations.
    pub fn tick(&mut self, dt: Duration) -> Vec<ScrollUpdate> {
        self.sync_dirty();
        for report in self.auto_save.poll_reports() {
            if let Err(err) = &report.result {
                log::warn!("auto-save to {} failed: {err}", report.path.display());
            }
        }
        self.auto_save.tick(dt, &self.docking);
        self.scroll.tick(dt)
    }

    /// Stop background work and write a final auto-save if anything changed.
    ///
    /// # Errors
    /// [`LayoutPersistenceError::Io`] if the final write fails.
    pub fn shutdown(&mut self) -> LayoutResult<bool> {
        self.docking.cancel_drag();
        self.sync_dirty();
        self.auto_save.shutdown(&self.docking)
    }
}

#[cfg(test)]
mod tests {
    use egui::{Pos2, pos2, vec2};

    use super::*;
    use crate::persistence::PARAMETERS_PANEL;

    fn workspace(dir: &tempfile::TempDir) -> DockWorkspace {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut options = WorkspaceOptions::default();
        options.persistence.root_dir = dir.path().to_path_buf();
        options.persistence.background_auto_save = false;
        options.persistence.auto_save_interval_secs = 1;
        DockWorkspace::open(options).unwrap()
    }

    fn floating(ws: &mut DockWorkspace, id: &str, x: f32, y: f32) {
        ws.register_panel(id, id, pos2(x, y), vec2(200.0, 150.0), DockState::Floating);
    }

    #[test]
    fn options_from_partial_ron() {
        let options = WorkspaceOptions::from_ron_str(
            "(scroll: (min_velocity: 80.0), persistence: (auto_save_interval_secs: 30))",
        )
        .unwrap();
        assert_eq!(options.scroll.min_velocity, 80.0);
        assert_eq!(options.scroll.damping_factor, ScrollOptions::default().damping_factor);
        assert_eq!(options.persistence.auto_save_interval_secs, 30);
        assert_eq!(options.docking, DockingOptions::default());

        let text = options.to_ron_string().unwrap();
        assert_eq!(WorkspaceOptions::from_ron_str(&text).unwrap(), options);

        assert!(matches!(
            WorkspaceOptions::from_ron_str("(scroll: oops)"),
            Err(LayoutPersistenceError::Validation { .. })
        ));
    }

    #[test]
    fn options_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workspace.ron");
        std::fs::write(&path, "(layout: (spacing: 16.0))").unwrap();
        assert_eq!(WorkspaceOptions::from_ron_file(&path).unwrap().layout.spacing, 16.0);
        assert!(matches!(
            WorkspaceOptions::from_ron_file(&dir.path().join("missing.ron")),
            Err(LayoutPersistenceError::Io { .. })
        ));
    }

    #[test]
    fn floating_drop_pushes_overlapped_panel() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = workspace(&dir);
        floating(&mut ws, "a", 100.0, 100.0);
        floating(&mut ws, "b", 400.0, 100.0);

        assert!(ws.start_drag("a", pos2(110.0, 110.0)));
        assert_eq!(ws.update_drag(pos2(310.0, 110.0)), Some(Zone::Center));
        let outcome = ws.end_drag().unwrap();
        assert!(matches!(outcome, DropOutcome::Floating { .. }));

        let a = ws.docking().panel("a").unwrap().rect();
        let b = ws.docking().panel("b").unwrap().rect();
        assert_eq!(a.min, pos2(300.0, 100.0));
        assert_eq!(b.min.x, a.max.x + ws.layout.spacing());
        assert!(ws.is_dirty());
    }

    #[test]
    fn docked_panels_are_not_pushed() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = workspace(&dir);
        floating(&mut ws, "f", 100.0, 100.0);
        floating(&mut ws, "d", 0.0, 0.0);
        ws.docking_mut().dock_panel("d", Zone::Left);
        let docked = ws.docking().panel("d").unwrap().rect();

        assert_eq!(ws.resize_panel("f", vec2(400.0, 300.0)), 1);
        assert_eq!(ws.docking().panel("d").unwrap().rect(), docked);
        assert_eq!(ws.docking().panel("f").unwrap().size, vec2(400.0, 300.0));
    }

    #[test]
    fn shrinking_container_pulls_floating_panels_inside() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = workspace(&dir);
        floating(&mut ws, "a", 1000.0, 600.0);

        let bounds = Rect::from_min_size(pos2(20.0, 40.0), vec2(800.0, 600.0));
        assert_eq!(ws.update_container_bounds(bounds), 1);
        let a = ws.docking().panel("a").unwrap().rect();
        assert!(bounds.contains_rect(a), "{a:?}");
        assert_eq!(ws.docking().container_bounds(), bounds);
    }

    #[test]
    fn tick_autosaves_model_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = workspace(&dir);
        assert!(!ws.is_dirty());
        ws.tick(Duration::from_secs(2));
        assert!(!ws.persistence().store().autosave_path().exists());

        floating(&mut ws, "a", 10.0, 10.0);
        ws.tick(Duration::from_secs(2));
        assert!(!ws.is_dirty());
        assert!(ws.persistence().store().autosave_path().exists());

        let mut fresh = workspace(&dir);
        assert!(fresh.restore_autosave().unwrap());
        assert!(fresh.docking().panel("a").is_some());
        assert!(!fresh.is_dirty(), "restored state is already on disk");
    }

    #[test]
    fn shutdown_flushes_pending_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = workspace(&dir);
        floating(&mut ws, "a", 10.0, 10.0);
        assert!(ws.shutdown().unwrap());
        assert!(!ws.shutdown().unwrap());
    }

    #[test]
    fn template_load_keeps_scroll_memory_of_replaced_panels() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = workspace(&dir);
        floating(&mut ws, "log", 10.0, 10.0);
        ws.scroll.register_scrollable("log", 0.0, 500.0);
        ws.scroll.set_offset("log", 200.0);

        ws.load_template(LayoutTemplate::Development).unwrap();
        assert!(ws.docking().panel("log").is_none());
        assert!(ws.docking().panel(PARAMETERS_PANEL).is_some());
        assert!(ws.scroll.registration("log").is_none());
        assert_eq!(ws.scroll.memory().get("log"), Some(200.0));
    }

    #[test]
    fn save_undo_redo_through_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = workspace(&dir);
        floating(&mut ws, "a", 10.0, 10.0);
        ws.save_layout("one", "", None).unwrap();
        ws.docking_mut().dock_panel("a", Zone::Top);
        let two = ws.save_layout("two", "", None).unwrap();

        assert!(matches!(ws.undo().unwrap(), HistoryOutcome::Applied(_)));
        assert_eq!(ws.docking().panel("a").unwrap().position, Pos2::new(10.0, 10.0));
        assert!(matches!(ws.redo().unwrap(), HistoryOutcome::Applied(_)));
        assert_eq!(ws.docking().panel("a").unwrap().dock_zone, Zone::Top);

        ws.delete_layout(two).unwrap();
        assert!(matches!(ws.load_layout(two), Err(LayoutPersistenceError::NotFound { .. })));
    }

    #[test]
    fn snapshot_read_on_worker_applies_on_caller() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = workspace(&dir);
        floating(&mut ws, "log", 10.0, 10.0);
        ws.scroll.register_scrollable("log", 0.0, 500.0);
        ws.scroll.set_offset("log", 120.0);

        let mut broken = ws.capture_layout("broken", "", None);
        broken.panels.push(broken.panels[0].clone());
        assert!(ws.apply_snapshot(&broken).is_err());
        assert!(ws.docking().panel("log").is_some());
        assert_eq!(ws.scroll.offset("log"), Some(120.0));

        let store = ws.persistence().store().clone();
        let template = std::thread::spawn(move || store.read_template(LayoutTemplate::Development))
            .join()
            .unwrap()
            .unwrap();
        ws.apply_snapshot(&template).unwrap();
        assert!(ws.docking().panel(PARAMETERS_PANEL).is_some());
        assert!(ws.scroll.registration("log").is_none());
        assert_eq!(ws.scroll.memory().get("log"), Some(120.0));
    }
}
