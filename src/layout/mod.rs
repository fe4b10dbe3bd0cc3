//! Overlap resolution and spacing for independently resizable panels.
//!
//! The coordinator is pure: it reads [`LayoutItem`]s and returns [`LayoutAdjustment`]s. The
//! caller (usually [`crate::DockWorkspace`]) applies them with
//! [`crate::docking::DockingManager::apply_adjustments`].

use std::collections::{BTreeMap, VecDeque};

use egui::{Pos2, Rect, Vec2};
use itertools::Itertools as _;

use crate::docking::{PanelId, clamp_size};


/// Options for [`PanelLayoutCoordinator`].
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Gap (in points) kept between a resized panel and the panels it pushes away.
    pub spacing: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self { spacing: 8.0 }
    }
}

/// A panel as seen by the coordinator.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutItem {
    pub id: PanelId,
    pub rect: Rect,
    pub min_size: Vec2,
    pub max_size: Vec2,
}

/// New geometry for one panel.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutAdjustment {
    pub panel_id: PanelId,
    pub new_x: f32,
    pub new_y: f32,
    pub new_width: f32,
    pub new_height: f32,
}

impl LayoutAdjustment {
    pub fn new(panel_id: PanelId, rect: Rect) -> Self {
        Self {
            panel_id,
            new_x: rect.min.x,
            new_y: rect.min.y,
            new_width: rect.width(),
            new_height: rect.height(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_min_size(
            egui::pos2(self.new_x, self.new_y),
            Vec2::new(self.new_width, self.new_height),
        )
    }
}

/// Two rectangles overlap iff both their x- and y-intervals intersect (touching edges do not
/// count).
pub fn overlaps(a: Rect, b: Rect) -> bool {
    a.min.x < b.max.x && b.min.x < a.max.x && a.min.y < b.max.y && b.min.y < a.max.y
}

/// Like [`overlaps`], but with `spacing` added to the far edges: true when `a` and `b` are
/// closer than `spacing` on both axes.
fn closer_than(a: Rect, b: Rect, spacing: f32) -> bool {
    a.min.x < b.max.x + spacing
        && b.min.x < a.max.x + spacing
        && a.min.y < b.max.y + spacing
        && b.min.y < a.max.y + spacing
}

/// Move `other` clear of `anchor`: to the right if `anchor` starts further left, otherwise
/// below. The new edge is set directly (not via a delta) so float rounding cannot leave a
/// sliver of overlap.
fn displace(anchor: Rect, other: Rect, spacing: f32) -> Rect {
    let min = if anchor.min.x < other.min.x {
        egui::pos2(anchor.max.x + spacing, other.min.y)
    } else {
        egui::pos2(other.min.x, anchor.max.y + spacing)
    };
    Rect::from_min_size(min, other.size())
}

#[derive(Clone, Debug, Default)]
pub struct PanelLayoutCoordinator {
    pub options: LayoutOptions,
}

impl PanelLayoutCoordinator {
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    pub fn spacing(&self) -> f32 {
        sanitize_spacing(self.options.spacing)
    }

    /// Resize `panel_id` to `proposed` (clamped to its constraints) and push every panel it now
    /// overlaps out of the way, cascading to panels those land on.
    ///
    /// The first adjustment is for the resized panel when its rect changed.
    pub fn resolve_resize(
        &self,
        panel_id: &str,
        proposed: Vec2,
        items: &[LayoutItem],
    ) -> Vec<LayoutAdjustment> {
        let Some(target) = items.iter().find(|i| i.id == panel_id) else {
            return Vec::new();
        };
        let spacing = self.spacing();
        let size = clamp_size(proposed, target.min_size, target.max_size);
        let resized = Rect::from_min_size(target.rect.min, size);

        let mut changes: BTreeMap<PanelId, Rect> = BTreeMap::new();
        if resized != target.rect {
            changes.insert(target.id.clone(), resized);
        }

        let mut rects: BTreeMap<&str, Rect> = items
            .iter()
            .map(|i| (i.id.as_str(), if i.id == panel_id { resized } else { i.rect }))
            .collect();
        let mut settled: Vec<&str> = vec![target.id.as_str()];
        let mut queue: VecDeque<&str> = VecDeque::from([target.id.as_str()]);

        while let Some(anchor_id) = queue.pop_front() {
            let anchor = rects[anchor_id];
            let hits: Vec<&str> = items
                .iter()
                .map(|i| i.id.as_str())
                .filter(|id| !settled.contains(id) && overlaps(anchor, rects[id]))
                .collect();

            for id in hits {
                let mut moved = displace(anchor, rects[id], spacing);
                // Moves only go right/down, so each settled rect needs clearing at most once.
                for _ in 0..settled.len() {
                    let Some(&blocker) = settled.iter().find(|s| overlaps(rects[**s], moved)) else {
                        break;
                    };
                    moved = displace(rects[blocker], moved, spacing);
                }
                log::debug!("resolve_resize: {panel_id:?} pushes {id:?} to {:?}", moved.min);
                rects.insert(id, moved);
                changes.insert(id.to_owned(), moved);
                settled.push(id);
                queue.push_back(id);
            }
        }

        order_adjustments(panel_id, changes)
    }

    /// Change the global spacing and push apart every pair of panels that is now too close.
    ///
    /// Panels are visited top-left first; the later panel of a pair is the one that moves.
    pub fn enforce_spacing(&mut self, spacing: f32, items: &[LayoutItem]) -> Vec<LayoutAdjustment> {
        self.options.spacing = sanitize_spacing(spacing);
        let spacing = self.options.spacing;

        let order: Vec<&LayoutItem> = items
            .iter()
            .sorted_by(|a, b| {
                a.rect
                    .min
                    .y
                    .total_cmp(&b.rect.min.y)
                    .then(a.rect.min.x.total_cmp(&b.rect.min.x))
                    .then_with(|| a.id.cmp(&b.id))
            })
            .collect();
        let mut rects: Vec<Rect> = order.iter().map(|i| i.rect).collect();

        // Every displacement moves right/down, so this settles within `n` passes.
        for _ in 0..=rects.len() {
            let mut moved_any = false;
            for (a, b) in (0..rects.len()).tuple_combinations() {
                if closer_than(rects[a], rects[b], spacing) {
                    rects[b] = displace(rects[a], rects[b], spacing);
                    moved_any = true;
                }
            }
            if !moved_any {
                break;
            }
        }

        let adjustments: Vec<LayoutAdjustment> = order
            .iter()
            .zip(&rects)
            .filter(|(item, rect)| item.rect != **rect)
            .map(|(item, rect)| LayoutAdjustment::new(item.id.clone(), *rect))
            .collect();
        log::debug!("enforce_spacing({spacing}): {} adjustments", adjustments.len());
        adjustments
    }

    /// Clamp every panel into a `container_width` × `container_height` container at the origin.
    ///
    /// Oversized panels shrink first (container beats minimum size); then panels are translated
    /// so they start at non-negative coordinates and end inside the container.
    pub fn validate_layout(
        &self,
        container_width: f32,
        container_height: f32,
        items: &[LayoutItem],
    ) -> Vec<LayoutAdjustment> {
        let container = Vec2::new(container_width.max(0.0), container_height.max(0.0));
        let mut adjustments = Vec::new();

        for item in items {
            let size = item.rect.size().min(container);
            let mut min = item.rect.min.max(Pos2::ZERO);
            min.x = min.x.min(container.x - size.x);
            min.y = min.y.min(container.y - size.y);
            let rect = Rect::from_min_size(min, size);
            if rect != item.rect {
                adjustments.push(LayoutAdjustment::new(item.id.clone(), rect));
            }
        }
        adjustments
    }
}

fn sanitize_spacing(spacing: f32) -> f32 {
    if spacing.is_finite() { spacing.max(0.0) } else { 0.0 }
}

/// Resized panel first, then the displaced ones in id order.
fn order_adjustments(panel_id: &str, mut changes: BTreeMap<PanelId, Rect>) -> Vec<LayoutAdjustment> {
    let mut out = Vec::with_capacity(changes.len());
    if let Some(rect) = changes.remove(panel_id) {
        out.push(LayoutAdjustment::new(panel_id.to_owned(), rect));
    }
    out.extend(changes.into_iter().map(|(id, rect)| LayoutAdjustment::new(id, rect)));
    out
}
