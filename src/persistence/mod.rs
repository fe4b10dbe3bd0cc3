//! Named layouts, built-in templates, undo/redo history and auto-save.
//!
//! File access is blocking. Each save or load comes in two halves so the I/O can run elsewhere:
//!
//! - saving: [`LayoutSnapshot::capture`] on the UI thread, [`LayoutStore::save`] on a worker with a
//!   cloned [`LayoutStore`], then [`LayoutPersistenceManager::record_saved`] back on the UI thread.
//! - loading: [`LayoutStore::read_template`] or [`LayoutStore::read_autosave`] on a worker, then
//!   [`LayoutSnapshot::apply_to`] on the UI thread.
//!
//! The one-call methods (`save_layout`, `load_template`, `load_autosave`) run both halves on the
//! calling thread. Auto-save already writes through its own worker.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;

use uuid::Uuid;

use crate::docking::{DockingManager, DockingOptions};
use crate::events::EventBus;

mod autosave;
mod error;
mod history;
mod snapshot;
mod store;
mod templates;


pub use autosave::{AutoSave, DirtyTracker, SaveReport};
pub use error::{LayoutPersistenceError, LayoutResult};
pub use history::{HistoryAction, HistoryEntry, HistoryOutcome, LayoutHistory};
pub use snapshot::{ContainerBounds, LAYOUT_SNAPSHOT_VERSION, LayoutSnapshot, PanelRecord, TabGroupRecord};
pub use store::{LayoutStore, SnapshotFormat, sanitize_name};
pub(crate) use store::pretty_ron_config;
pub use templates::{ANIMATION_PANEL, DATA_PANEL, LayoutTemplate, PARAMETERS_PANEL, PLOTS_PANEL};

/// Options for [`LayoutPersistenceManager`] and [`AutoSave`].
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct PersistenceOptions {
    /// Directory that holds `layouts/`.
    pub root_dir: PathBuf,

    /// Oldest history entries are evicted beyond this many.
    pub history_capacity: usize,

    /// Seconds between auto-save checks. Nothing is written unless something changed.
    pub auto_save_interval_secs: u64,

    /// Write auto-saves on a worker thread instead of the thread calling `tick`.
    pub background_auto_save: bool,

    /// Write the built-in templates on startup when their files are missing.
    pub generate_templates: bool,
}

impl Default for PersistenceOptions {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            history_capacity: 100,
            auto_save_interval_secs: 60,
            background_auto_save: true,
            generate_templates: true,
        }
    }
}

/// Summary of one known named layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutSummary {
    pub id: Uuid,
    pub name: String,
    pub template: Option<LayoutTemplate>,
}

/// State-change notifications published by [`LayoutPersistenceManager`].
#[derive(Clone, Debug, PartialEq)]
pub enum PersistenceEvent {
    History {
        index: Option<usize>,
        len: usize,
        can_undo: bool,
        can_redo: bool,
    },
    Layouts(Vec<LayoutSummary>),
}

#[derive(Clone, Debug)]
struct KnownLayout {
    path: PathBuf,
    snapshot: LayoutSnapshot,
}

pub struct LayoutPersistenceManager {
    options: PersistenceOptions,
    template_options: DockingOptions,
    store: LayoutStore,
    layouts: BTreeMap<Uuid, KnownLayout>,
    history: LayoutHistory,
    events: EventBus<PersistenceEvent>,
}

impl LayoutPersistenceManager {
    /// Create the directory structure, scan existing layouts and generate missing templates.
    ///
    /// Templates are laid out for `docking.default_container`.
    pub fn open(options: PersistenceOptions, docking: &DockingOptions) -> LayoutResult<Self> {
        let store = LayoutStore::new(&options.root_dir);
        store.ensure_dirs()?;

        let mut layouts = BTreeMap::new();
        for (path, snapshot) in store.scan()? {
            if let Some(dup) = layouts.insert(snapshot.id, KnownLayout { path, snapshot }) {
                log::warn!("layout id {} found twice, keeping {}", dup.snapshot.id, dup.path.display());
                layouts.insert(dup.snapshot.id, dup);
            }
        }
        log::info!(
            "opened layout store at {} ({} layouts)",
            store.root().display(),
            layouts.len()
        );

        let manager = Self {
            history: LayoutHistory::new(options.history_capacity),
            options,
            template_options: docking.clone(),
            store,
            layouts,
            events: EventBus::default(),
        };
        if manager.options.generate_templates {
            manager.generate_missing_templates();
        }
        Ok(manager)
    }

    fn generate_missing_templates(&self) {
        let bounds = self.template_options.default_container;
        for template in LayoutTemplate::ALL {
            let path = self.store.template_path(template);
            if path.exists() {
                continue;
            }
            let snapshot = template.snapshot(bounds, &self.template_options);
            match self.store.write(&path, &snapshot) {
                Ok(()) => log::info!("generated {template:?} template at {}", path.display()),
                Err(err) => log::warn!("cannot generate {template:?} template: {err}"),
            }
        }
    }

    pub fn options(&self) -> &PersistenceOptions {
        &self.options
    }

    pub fn store(&self) -> &LayoutStore {
        &self.store
    }

    pub fn history(&self) -> &LayoutHistory {
        &self.history
    }

    pub fn layout(&self, id: Uuid) -> Option<&LayoutSnapshot> {
        self.layouts.get(&id).map(|l| &l.snapshot)
    }

    pub fn layout_path(&self, id: Uuid) -> Option<&Path> {
        self.layouts.get(&id).map(|l| l.path.as_path())
    }

    /// Known named layouts, ordered by id.
    pub fn layouts(&self) -> Vec<LayoutSummary> {
        self.layouts
            .values()
            .map(|l| LayoutSummary {
                id: l.snapshot.id,
                name: l.snapshot.name.clone(),
                template: l.snapshot.template,
            })
            .collect()
    }

    pub fn subscribe(&mut self) -> Receiver<PersistenceEvent> {
        self.events.subscribe()
    }

    fn notify_history(&mut self) {
        let history = &self.history;
        self.events.emit_with(|| PersistenceEvent::History {
            index: history.current_index(),
            len: history.len(),
            can_undo: history.can_undo(),
            can_redo: history.can_redo(),
        });
    }

    fn notify_layouts(&mut self) {
        if self.events.has_subscribers() {
            let layouts = self.layouts();
            self.events.emit(PersistenceEvent::Layouts(layouts));
        }
    }

    // ------------------------------------------------------------------------------------------
    // Named layouts

    /// Save the current arrangement of `dock` as a new named layout. Blocks on the write.
    ///
    /// # Errors
    /// [`LayoutPersistenceError::Io`] if the file cannot be written; nothing is recorded then.
    pub fn save_layout(
        &mut self,
        name: &str,
        description: &str,
        template: Option<LayoutTemplate>,
        dock: &DockingManager,
    ) -> LayoutResult<Uuid> {
        self.save_snapshot(LayoutSnapshot::capture(name, description, template, dock))
    }

    /// Write an already captured snapshot and record it as a named layout. Blocks on the write.
    ///
    /// # Errors
    /// [`LayoutPersistenceError::Io`] if the file cannot be written; nothing is recorded then.
    pub fn save_snapshot(&mut self, snapshot: LayoutSnapshot) -> LayoutResult<Uuid> {
        let path = self.store.save(&snapshot)?;
        Ok(self.record_saved(path, snapshot))
    }

    /// Record a snapshot that [`LayoutStore::save`] already wrote to `path`. No I/O.
    pub fn record_saved(&mut self, path: PathBuf, snapshot: LayoutSnapshot) -> Uuid {
        let id = snapshot.id;
        log::info!("saved layout {:?} ({id}) to {}", snapshot.name, path.display());
        self.history.push(HistoryAction::Save { layout_id: id }, snapshot.clone());
        self.layouts.insert(id, KnownLayout { path, snapshot });
        self.notify_layouts();
        self.notify_history();
        id
    }

    /// Destructively replace the contents of `dock` with layout `id`.
    ///
    /// # Errors
    /// [`LayoutPersistenceError::NotFound`] for an unknown id,
    /// [`LayoutPersistenceError::VersionMismatch`] for a snapshot from a newer format. `dock` is
    /// untouched on error.
    pub fn load_layout(&mut self, id: Uuid, dock: &mut DockingManager) -> LayoutResult<LayoutSnapshot> {
        let snapshot = self
            .layout(id)
            .cloned()
            .ok_or(LayoutPersistenceError::NotFound { id })?;
        snapshot.apply_to(dock)?;
        log::info!("loaded layout {:?} ({id})", snapshot.name);
        Ok(snapshot)
    }

    /// Remove layout `id` from disk and memory. The removed arrangement stays in history.
    ///
    /// # Errors
    /// [`LayoutPersistenceError::NotFound`] or [`LayoutPersistenceError::Io`].
    pub fn delete_layout(&mut self, id: Uuid) -> LayoutResult<LayoutSnapshot> {
        let path = self
            .layouts
            .get(&id)
            .map(|l| l.path.clone())
            .ok_or(LayoutPersistenceError::NotFound { id })?;
        self.store.remove(&path)?;

        let Some(removed) = self.layouts.remove(&id) else {
            return Err(LayoutPersistenceError::NotFound { id });
        };
        log::info!("deleted layout {:?} ({id})", removed.snapshot.name);
        self.history
            .push(HistoryAction::Delete { layout_id: id }, removed.snapshot.clone());
        self.notify_layouts();
        self.notify_history();
        Ok(removed.snapshot)
    }

    /// Read a built-in template without touching any panels. Blocking.
    ///
    /// # Errors
    /// [`LayoutPersistenceError::Io`] if the template file is missing or unreadable.
    pub fn read_template(&self, template: LayoutTemplate) -> LayoutResult<LayoutSnapshot> {
        self.store.read_template(template)
    }

    /// Read and apply a built-in template to `dock`.
    ///
    /// # Errors
    /// As for [`Self::read_template`]; `dock` is untouched on error.
    pub fn load_template(
        &mut self,
        template: LayoutTemplate,
        dock: &mut DockingManager,
    ) -> LayoutResult<LayoutSnapshot> {
        let snapshot = self.read_template(template)?;
        snapshot.apply_to(dock)?;
        log::info!("loaded {template:?} template");
        Ok(snapshot)
    }

    // ------------------------------------------------------------------------------------------
    // History

    /// Record the current arrangement as a history checkpoint without writing a file.
    pub fn record_change(&mut self, description: impl Into<String>, dock: &DockingManager) {
        let description = description.into();
        let snapshot = LayoutSnapshot::capture("Checkpoint", description.as_str(), None, dock);
        log::debug!("history checkpoint {description:?}");
        self.history.push(HistoryAction::Edit { description }, snapshot);
        self.notify_history();
    }

    /// Step back one history entry and apply it to `dock`.
    ///
    /// # Errors
    /// Only if the stored snapshot fails validation; the history index is restored then.
    pub fn undo(&mut self, dock: &mut DockingManager) -> LayoutResult<HistoryOutcome> {
        let Some(snapshot) = self.history.undo().map(|e| e.snapshot.clone()) else {
            return Ok(HistoryOutcome::NothingToUndo);
        };
        if let Err(err) = snapshot.apply_to(dock) {
            self.history.redo();
            return Err(err);
        }
        log::debug!("undo -> history index {:?}", self.history.current_index());
        self.notify_history();
        Ok(HistoryOutcome::Applied(Box::new(snapshot)))
    }

    /// Step forward one history entry and apply it to `dock`.
    ///
    /// # Errors
    /// Only if the stored snapshot fails validation; the history index is restored then.
    pub fn redo(&mut self, dock: &mut DockingManager) -> LayoutResult<HistoryOutcome> {
        let Some(snapshot) = self.history.redo().map(|e| e.snapshot.clone()) else {
            return Ok(HistoryOutcome::NothingToRedo);
        };
        if let Err(err) = snapshot.apply_to(dock) {
            self.history.undo();
            return Err(err);
        }
        log::debug!("redo -> history index {:?}", self.history.current_index());
        self.notify_history();
        Ok(HistoryOutcome::Applied(Box::new(snapshot)))
    }

    // ------------------------------------------------------------------------------------------
    // Import / export

    /// Write layout `id` to an external file: RON for `.ron`, JSON otherwise.
    ///
    /// # Errors
    /// [`LayoutPersistenceError::NotFound`] or [`LayoutPersistenceError::Io`].
    pub fn export_layout(&self, id: Uuid, path: &Path) -> LayoutResult<()> {
        let snapshot = self.layout(id).ok_or(LayoutPersistenceError::NotFound { id })?;
        self.store.write(path, snapshot)?;
        log::info!("exported layout {:?} to {}", snapshot.name, path.display());
        Ok(())
    }

    /// Read an external layout file and add it as a new named layout.
    ///
    /// The imported layout always gets a fresh id and an `" (Imported)"` suffix.
    ///
    /// # Errors
    /// [`LayoutPersistenceError::Io`], [`LayoutPersistenceError::Validation`] for malformed
    /// files, [`LayoutPersistenceError::VersionMismatch`] for newer formats.
    pub fn import_layout(&mut self, path: &Path) -> LayoutResult<Uuid> {
        let source = self.store.read(path)?;
        let snapshot = source.duplicate_as(format!("{} (Imported)", source.name));
        let target = self.store.layout_path(&snapshot);
        self.store.write(&target, &snapshot)?;

        let id = snapshot.id;
        log::info!("imported {} as {:?} ({id})", path.display(), snapshot.name);
        self.history.push(HistoryAction::Import { layout_id: id }, snapshot.clone());
        self.layouts.insert(id, KnownLayout { path: target, snapshot });
        self.notify_layouts();
        self.notify_history();
        Ok(id)
    }

    // ------------------------------------------------------------------------------------------
    // Auto-save

    /// An [`AutoSave`] writing into this manager's store.
    pub fn auto_save(&self) -> AutoSave {
        AutoSave::new(
            self.store.clone(),
            std::time::Duration::from_secs(self.options.auto_save_interval_secs),
            self.options.background_auto_save,
        )
    }

    /// Read the last auto-save without touching any panels. Blocking.
    ///
    /// # Errors
    /// [`LayoutPersistenceError::Io`], or [`LayoutPersistenceError::Validation`] for a corrupt
    /// file.
    pub fn read_autosave(&self) -> LayoutResult<Option<LayoutSnapshot>> {
        self.store.read_autosave()
    }

    /// Read and apply the last auto-save to `dock`. `Ok(None)` if there is none.
    ///
    /// # Errors
    /// As for [`Self::read_autosave`], plus [`LayoutPersistenceError::VersionMismatch`].
    pub fn load_autosave(&mut self, dock: &mut DockingManager) -> LayoutResult<Option<LayoutSnapshot>> {
        let Some(snapshot) = self.read_autosave()? else {
            return Ok(None);
        };
        snapshot.apply_to(dock)?;
        log::info!("restored auto-save from {}", self.store.autosave_path().display());
        Ok(Some(snapshot))
    }
}
