//! Per-panel scroll offsets, momentum and programmatic animations, sync groups, and a scroll
//! position memory that outlives panel registration.
//!
//! Offsets are vertical and clamped to `0..=max_offset`. The host drives animations by calling
//! [`ScrollCoordinator::tick`] once per frame and applies the returned [`ScrollUpdate`]s to its
//! scroll areas. Direct changes (`set_offset`, `scroll_by`, …) queue updates that the next
//! `tick` (or [`ScrollCoordinator::take_updates`]) hands out.
//!
//! Sync propagation is one level deep: when panel `A` moves, every other member of `A`'s group
//! is set to the same clamped offset, and those followers do not propagate further. A panel with
//! an animation in flight ignores incoming sync updates but still drives its followers.

use std::collections::BTreeMap;
use std::time::Duration;

use itertools::Itertools as _;

use crate::docking::PanelId;

mod animation;
mod sync;


pub use animation::{AnimationKind, ScrollAnimation, ease_out_cubic};
pub use sync::{SyncGroup, SyncGroupId, SyncMode};

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ScrollOptions {
    /// Flings slower than this (px/s) are ignored.
    pub min_velocity: f32,

    /// Momentum travel is `velocity * damping_factor`.
    pub damping_factor: f32,

    /// Momentum lasts `|velocity|` milliseconds, clamped to these bounds.
    pub min_momentum_duration_ms: u64,
    pub max_momentum_duration_ms: u64,

    /// Duration of `scroll_to_progress` and restore animations.
    pub programmatic_duration_ms: u64,

    /// Remember a panel's offset when it is unregistered.
    pub remember_on_unregister: bool,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            min_velocity: 50.0,
            damping_factor: 0.3,
            min_momentum_duration_ms: 200,
            max_momentum_duration_ms: 1200,
            programmatic_duration_ms: 300,
            remember_on_unregister: true,
        }
    }
}

impl ScrollOptions {
    fn momentum_duration(&self, velocity: f32) -> Duration {
        let lo = self.min_momentum_duration_ms.min(self.max_momentum_duration_ms);
        let hi = self.max_momentum_duration_ms.max(lo);
        let natural = Duration::try_from_secs_f32(velocity.abs() / 1000.0).unwrap_or(Duration::MAX);
        natural.clamp(Duration::from_millis(lo), Duration::from_millis(hi))
    }

    fn programmatic_duration(&self) -> Duration {
        Duration::from_millis(self.programmatic_duration_ms)
    }
}

/// Live scroll state of one mounted panel.
#[derive(Clone, Debug, PartialEq)]
pub struct ScrollRegistration {
    pub panel_id: PanelId,
    pub offset: f32,

    /// Content extent minus viewport extent.
    pub max_offset: f32,
}

impl ScrollRegistration {
    /// `offset / max_offset`, or `0` when nothing can scroll.
    pub fn progress(&self) -> f32 {
        if self.max_offset > 0.0 {
            self.offset / self.max_offset
        } else {
            0.0
        }
    }
}

/// Why an offset changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScrollSource {
    User,
    Momentum,
    Programmatic,

    /// Followed `from` through a sync group.
    Sync { from: PanelId },
}

/// One offset change the host should apply.
#[derive(Clone, Debug, PartialEq)]
pub struct ScrollUpdate {
    pub panel_id: PanelId,
    pub offset: f32,
    pub source: ScrollSource,
}

/// Remembered offsets keyed by panel id. Independent of registration.
#[derive(Clone, Debug, Default)]
pub struct ScrollPositionMemory {
    offsets: ahash::HashMap<PanelId, f32>,
}

impl ScrollPositionMemory {
    pub fn save(&mut self, panel_id: impl Into<PanelId>, offset: f32) {
        if offset.is_finite() {
            self.offsets.insert(panel_id.into(), offset.max(0.0));
        }
    }

    pub fn get(&self, panel_id: &str) -> Option<f32> {
        self.offsets.get(panel_id).copied()
    }

    pub fn remove(&mut self, panel_id: &str) -> Option<f32> {
        self.offsets.remove(panel_id)
    }

    pub fn clear(&mut self) {
        self.offsets.clear();
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ScrollCoordinator {
    pub options: ScrollOptions,
    scrollables: BTreeMap<PanelId, ScrollRegistration>,
    animations: ahash::HashMap<PanelId, ScrollAnimation>,
    groups: BTreeMap<SyncGroupId, SyncGroup>,
    membership: ahash::HashMap<PanelId, SyncGroupId>,
    memory: ScrollPositionMemory,
    pending: Vec<ScrollUpdate>,
}

impl ScrollCoordinator {
    pub fn new(options: ScrollOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    // ------------------------------------------------------------------------------------------
    // Queries

    pub fn scrollables(&self) -> &BTreeMap<PanelId, ScrollRegistration> {
        &self.scrollables
    }

    pub fn registration(&self, panel_id: &str) -> Option<&ScrollRegistration> {
        self.scrollables.get(panel_id)
    }

    pub fn offset(&self, panel_id: &str) -> Option<f32> {
        self.scrollables.get(panel_id).map(|r| r.offset)
    }

    /// Current offset as a fraction of the maximum, for minimaps.
    pub fn scroll_progress(&self, panel_id: &str) -> Option<f32> {
        self.scrollables.get(panel_id).map(ScrollRegistration::progress)
    }

    pub fn is_animating(&self, panel_id: &str) -> bool {
        self.animations.contains_key(panel_id)
    }

    pub fn animation(&self, panel_id: &str) -> Option<&ScrollAnimation> {
        self.animations.get(panel_id)
    }

    pub fn memory(&self) -> &ScrollPositionMemory {
        &self.memory
    }

    pub fn sync_groups(&self) -> &BTreeMap<SyncGroupId, SyncGroup> {
        &self.groups
    }

    pub fn sync_group(&self, group_id: &str) -> Option<&SyncGroup> {
        self.groups.get(group_id)
    }

    pub fn sync_group_of(&self, panel_id: &str) -> Option<&SyncGroup> {
        self.membership.get(panel_id).and_then(|g| self.groups.get(g))
    }

    // ------------------------------------------------------------------------------------------
    // Registration

    /// Start tracking `panel_id`. If an offset is remembered for it, animate there.
    ///
    /// Registering an already-registered panel only updates its `max_offset`. Returns `true` for a
    /// new registration.
    pub fn register_scrollable(&mut self, panel_id: impl Into<PanelId>, initial_offset: f32, max_offset: f32) -> bool {
        let panel_id = panel_id.into();
        if self.scrollables.contains_key(&panel_id) {
            self.set_max_offset(&panel_id, max_offset);
            return false;
        }

        let max_offset = sanitize(max_offset);
        let offset = sanitize(initial_offset).min(max_offset);
        self.scrollables.insert(
            panel_id.clone(),
            ScrollRegistration {
                panel_id: panel_id.clone(),
                offset,
                max_offset,
            },
        );
        log::debug!("scroll: registered {panel_id:?} at {offset}/{max_offset}");

        if let Some(remembered) = self.memory.get(&panel_id) {
            let duration = self.options.programmatic_duration();
            self.animate_to(&panel_id, remembered, AnimationKind::Programmatic, duration);
        }
        true
    }

    /// Stop tracking `panel_id`, remembering its offset when configured to. Sync group membership
    /// is kept so a remounted panel rejoins its group.
    pub fn unregister_scrollable(&mut self, panel_id: &str) -> Option<ScrollRegistration> {
        let registration = self.scrollables.remove(panel_id)?;
        self.animations.remove(panel_id);
        self.pending.retain(|u| u.panel_id != panel_id);
        if self.options.remember_on_unregister {
            self.memory.save(panel_id, registration.offset);
        }
        log::debug!("scroll: unregistered {panel_id:?} at {}", registration.offset);
        Some(registration)
    }

    /// Update the scrollable extent (e.g. after a resize). The offset and any animation target are
    /// clamped into the new range.
    pub fn set_max_offset(&mut self, panel_id: &str, max_offset: f32) -> bool {
        let Some(registration) = self.scrollables.get_mut(panel_id) else {
            return false;
        };
        registration.max_offset = sanitize(max_offset);
        let max = registration.max_offset;
        let offset = registration.offset;
        if let Some(anim) = self.animations.get_mut(panel_id) {
            anim.clamp_target(max);
        }
        if offset > max {
            self.apply_offset(panel_id, max, ScrollSource::User);
        }
        true
    }

    // ------------------------------------------------------------------------------------------
    // Scrolling

    /// Direct user scroll. Cancels any animation of this panel.
    pub fn set_offset(&mut self, panel_id: &str, offset: f32) -> bool {
        if !self.scrollables.contains_key(panel_id) || !offset.is_finite() {
            return false;
        }
        self.animations.remove(panel_id);
        self.apply_offset(panel_id, offset, ScrollSource::User);
        true
    }

    pub fn scroll_by(&mut self, panel_id: &str, delta: f32) -> bool {
        match self.offset(panel_id) {
            Some(offset) => self.set_offset(panel_id, offset + delta),
            None => false,
        }
    }

    /// Fling with `velocity` px/s. Slow flings are ignored.
    ///
    /// The panel eases towards `offset + velocity * damping_factor`, clamped. Replaces any running
    /// animation of this panel. Returns whether an animation started.
    pub fn perform_momentum_scroll(&mut self, panel_id: &str, velocity: f32) -> bool {
        if !velocity.is_finite() || velocity.abs() < self.options.min_velocity {
            return false;
        }
        let Some(offset) = self.offset(panel_id) else {
            return false;
        };
        let target = offset + velocity * self.options.damping_factor;
        let duration = self.options.momentum_duration(velocity);
        self.animate_to(panel_id, target, AnimationKind::Momentum, duration)
    }

    /// Animate to `progress` (clamped to `0..=1`) of the scrollable range.
    pub fn scroll_to_progress(&mut self, panel_id: &str, progress: f32) -> bool {
        if progress.is_nan() {
            return false;
        }
        let Some(max) = self.scrollables.get(panel_id).map(|r| r.max_offset) else {
            return false;
        };
        let duration = self.options.programmatic_duration();
        self.animate_to(panel_id, max * progress.clamp(0.0, 1.0), AnimationKind::Programmatic, duration)
    }

    fn animate_to(&mut self, panel_id: &str, target: f32, kind: AnimationKind, duration: Duration) -> bool {
        let Some(registration) = self.scrollables.get(panel_id) else {
            return false;
        };
        let target = target.clamp(0.0, registration.max_offset);
        let from = registration.offset;
        if target == from {
            self.animations.remove(panel_id);
            return false;
        }

        log::trace!("scroll: {kind:?} {panel_id:?} {from} -> {target} over {duration:?}");
        self.animations
            .insert(panel_id.to_owned(), ScrollAnimation::new(kind, from, target, duration));
        true
    }

    /// Advance all animations by `dt` and return every offset change since the last call.
    pub fn tick(&mut self, dt: Duration) -> Vec<ScrollUpdate> {
        let ids: Vec<PanelId> = self.animations.keys().cloned().sorted().collect();
        for id in ids {
            let Some(anim) = self.animations.get_mut(&id) else {
                continue;
            };
            let value = anim.advance(dt);
            let source = match anim.kind {
                AnimationKind::Momentum => ScrollSource::Momentum,
                AnimationKind::Programmatic => ScrollSource::Programmatic,
            };
            if anim.is_finished() {
                self.animations.remove(&id);
            }
            self.apply_offset(&id, value, source);
        }
        self.take_updates()
    }

    /// Drain queued offset changes without advancing animations.
    pub fn take_updates(&mut self) -> Vec<ScrollUpdate> {
        std::mem::take(&mut self.pending)
    }

    fn apply_offset(&mut self, panel_id: &str, offset: f32, source: ScrollSource) {
        let Some(registration) = self.scrollables.get_mut(panel_id) else {
            return;
        };
        let offset = offset.clamp(0.0, registration.max_offset);
        if offset == registration.offset {
            return;
        }
        registration.offset = offset;
        self.pending.push(ScrollUpdate {
            panel_id: panel_id.to_owned(),
            offset,
            source,
        });
        self.propagate(panel_id, offset);
    }

    fn propagate(&mut self, from: &str, offset: f32) {
        let Some(group) = self.membership.get(from).and_then(|g| self.groups.get(g)) else {
            return;
        };
        for follower in group.followers(from) {
            if self.animations.contains_key(follower) {
                continue;
            }
            let Some(registration) = self.scrollables.get_mut(follower) else {
                continue;
            };
            let target = offset.clamp(0.0, registration.max_offset);
            if target == registration.offset {
                continue;
            }
            registration.offset = target;
            log::trace!("scroll: sync {from:?} -> {follower:?} at {target}");
            self.pending.push(ScrollUpdate {
                panel_id: follower.clone(),
                offset: target,
                source: ScrollSource::Sync { from: from.to_owned() },
            });
        }
    }

    // ------------------------------------------------------------------------------------------
    // Sync groups

    /// Create (or replace) sync group `group_id` with `members`.
    ///
    /// A panel is in at most one group: members of another group move to this one.
    pub fn create_sync_group<I, S>(&mut self, group_id: impl Into<SyncGroupId>, members: I, mode: SyncMode)
    where
        I: IntoIterator<Item = S>,
        S: Into<PanelId>,
    {
        let group_id = group_id.into();
        self.remove_sync_group(&group_id);
        self.groups.insert(group_id.clone(), SyncGroup::new(group_id.clone(), mode));
        for member in members {
            self.add_to_sync_group(&group_id, member);
        }
        log::debug!("scroll: created sync group {group_id:?} ({mode:?})");
    }

    /// Add `panel_id` to an existing group, leaving any previous group.
    pub fn add_to_sync_group(&mut self, group_id: &str, panel_id: impl Into<PanelId>) -> bool {
        let panel_id = panel_id.into();
        if !self.groups.contains_key(group_id) {
            return false;
        }
        if let Some(previous) = self.membership.get(&panel_id) {
            if previous == group_id {
                return true;
            }
            log::warn!("scroll: {panel_id:?} moves from sync group {previous:?} to {group_id:?}");
            self.remove_from_sync_group(&panel_id);
        }
        if let Some(group) = self.groups.get_mut(group_id) {
            group.members.insert(panel_id.clone());
            self.membership.insert(panel_id, group_id.to_owned());
        }
        true
    }

    /// Returns the group `panel_id` left.
    pub fn remove_from_sync_group(&mut self, panel_id: &str) -> Option<SyncGroupId> {
        let group_id = self.membership.remove(panel_id)?;
        if let Some(group) = self.groups.get_mut(&group_id) {
            group.members.remove(panel_id);
        }
        Some(group_id)
    }

    pub fn remove_sync_group(&mut self, group_id: &str) -> Option<SyncGroup> {
        let group = self.groups.remove(group_id)?;
        for member in &group.members {
            self.membership.remove(member);
        }
        Some(group)
    }

    // ------------------------------------------------------------------------------------------
    // Memory

    /// Remember the live offset of `panel_id`.
    pub fn save_scroll_position(&mut self, panel_id: &str) -> bool {
        let Some(offset) = self.offset(panel_id) else {
            return false;
        };
        self.memory.save(panel_id, offset);
        true
    }

    /// Animate `panel_id` back to its remembered offset.
    pub fn restore_scroll_position(&mut self, panel_id: &str) -> bool {
        match self.memory.get(panel_id) {
            Some(offset) => {
                let duration = self.options.programmatic_duration();
                self.animate_to(panel_id, offset, AnimationKind::Programmatic, duration)
            }
            None => false,
        }
    }

    /// Forget one panel's remembered offset, or all of them with `None`.
    pub fn clear_scroll_memory(&mut self, panel_id: Option<&str>) {
        match panel_id {
            Some(id) => {
                self.memory.remove(id);
            }
            None => self.memory.clear(),
        }
    }
}

fn sanitize(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}
