//! Panel docking, layout persistence and scroll coordination for desktop apps built from
//! resizable content panels.
//!
//! The crate does not render anything. A host feeds it pointer events, container bounds and frame
//! ticks, and reads back panel geometry and scroll offsets:
//!
//! - [`DockingManager`] owns panels and tab groups and runs the drag state machine.
//! - [`PanelLayoutCoordinator`] keeps independently resizable panels from overlapping.
//! - [`LayoutPersistenceManager`] saves named layouts, templates and undo/redo history.
//! - [`ScrollCoordinator`] handles momentum, sync groups and remembered offsets.
//! - [`DockWorkspace`] wires all of them together with auto-save.

#![forbid(unsafe_code)]

pub mod dock_builder;
pub mod docking;
pub mod events;
pub mod layout;
pub mod persistence;
pub mod scroll;
pub mod workspace;

pub use dock_builder::{DockBuilder, DockLeaf, DockNodeId, SplitDirection};
pub use docking::{
    DockEvent, DockState, DockingManager, DockingOptions, DragState, DropOutcome, Panel, PanelId, TabGroup,
    TabGroupId, Zone,
};
pub use events::EventBus;
pub use layout::{LayoutAdjustment, LayoutItem, LayoutOptions, PanelLayoutCoordinator};
pub use persistence::{
    HistoryOutcome, LAYOUT_SNAPSHOT_VERSION, LayoutPersistenceError, LayoutPersistenceManager, LayoutResult,
    LayoutSnapshot, LayoutTemplate, PersistenceEvent, PersistenceOptions,
};
pub use scroll::{ScrollCoordinator, ScrollOptions, ScrollSource, ScrollUpdate, SyncMode};
pub use workspace::{DockWorkspace, WorkspaceOptions};
