use egui::{Pos2, Rect, Vec2};

/// Options for [`super::DockingManager`].
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct DockingOptions {
    /// Distance from a container edge (in points) inside which a drop docks to that edge.
    pub zone_threshold: f32,

    /// Fraction of the container a panel docked to an edge claims along the docking axis.
    pub dock_fraction: f32,

    /// Radius (in points) around the drop point in which other floating panels are collected
    /// into a new tab group when a drag ends over the `TAB_GROUP` zone.
    ///
    /// Only `FLOATING` panels are considered.
    pub tab_group_radius: f32,

    /// Container bounds used until the host reports real ones via
    /// [`super::DockingManager::update_container_bounds`].
    pub default_container: Rect,

    /// Minimum size given to panels registered without explicit constraints.
    pub default_min_size: Vec2,

    /// Maximum size given to panels registered without explicit constraints.
    ///
    /// `f32::MAX` means unbounded (and stays representable in JSON).
    pub default_max_size: Vec2,

    /// If true, record state transitions in a small ring buffer (see
    /// [`super::DockingManager::debug_log_text`]).
    pub debug_event_log: bool,

    /// Maximum number of debug log lines to keep (ring buffer).
    pub debug_event_log_capacity: usize,

    /// If true, check panel/tab-group integrity after every mutation (debug-only).
    pub debug_integrity: bool,

    /// If true, panic on integrity issues (debug-only).
    pub debug_integrity_panic: bool,
}

impl Default for DockingOptions {
    fn default() -> Self {
        Self {
            zone_threshold: 50.0,
            dock_fraction: 0.3,
            tab_group_radius: 100.0,
            default_container: Rect::from_min_size(Pos2::ZERO, Vec2::new(1280.0, 800.0)),
            default_min_size: Vec2::new(120.0, 80.0),
            default_max_size: Vec2::splat(f32::MAX),
            debug_event_log: false,
            debug_event_log_capacity: 200,
            debug_integrity: false,
            debug_integrity_panic: false,
        }
    }
}

impl DockingOptions {
    pub(crate) fn debug_log_capacity(&self) -> usize {
        self.debug_event_log_capacity.clamp(1, 10_000)
    }
}
