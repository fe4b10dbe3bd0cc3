use egui::{Pos2, Rect, Vec2};

use super::types::Zone;

/// The five dock-zone rectangles of a container.
///
/// Built from the container bounds and a threshold distance `T`:
///
/// ```text
/// LEFT   = [0,0]-[T,H]      RIGHT  = [W-T,0]-[W,H]
/// TOP    = [0,0]-[W,T]      BOTTOM = [0,H-T]-[W,H]
/// CENTER = [T,T]-[W-T,H-T]
/// ```
///
/// Coordinates above are relative to `bounds.min`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DockZones {
    pub bounds: Rect,
    pub threshold: f32,
    pub left: Rect,
    pub right: Rect,
    pub top: Rect,
    pub bottom: Rect,
    pub center: Rect,
}

impl DockZones {
    pub fn new(bounds: Rect, threshold: f32) -> Self {
        let bounds = sanitize_bounds(bounds);
        let w = bounds.width();
        let h = bounds.height();
        let t = if threshold.is_finite() {
            threshold.clamp(0.0, 0.5 * w.min(h))
        } else {
            0.0
        };

        let at = |x0: f32, y0: f32, x1: f32, y1: f32| {
            Rect::from_min_max(bounds.min + Vec2::new(x0, y0), bounds.min + Vec2::new(x1, y1))
        };

        Self {
            bounds,
            threshold: t,
            left: at(0.0, 0.0, t, h),
            right: at(w - t, 0.0, w, h),
            top: at(0.0, 0.0, w, t),
            bottom: at(0.0, h - t, w, h),
            center: at(t, t, w - t, h - t),
        }
    }

    /// Classify a point. Horizontal edges are tested before vertical ones, so corners
    /// belong to LEFT/RIGHT.
    pub fn classify(&self, pos: Pos2) -> Zone {
        let local = pos - self.bounds.min;
        let (w, h, t) = (self.bounds.width(), self.bounds.height(), self.threshold);

        if local.x < t {
            Zone::Left
        } else if local.x > w - t {
            Zone::Right
        } else if local.y < t {
            Zone::Top
        } else if local.y > h - t {
            Zone::Bottom
        } else {
            Zone::Center
        }
    }

    pub fn zone_rect(&self, zone: Zone) -> Option<Rect> {
        match zone {
            Zone::Left => Some(self.left),
            Zone::Right => Some(self.right),
            Zone::Top => Some(self.top),
            Zone::Bottom => Some(self.bottom),
            Zone::Center => Some(self.center),
            Zone::None | Zone::TabGroup => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Zone, Rect)> {
        [
            (Zone::Left, self.left),
            (Zone::Right, self.right),
            (Zone::Top, self.top),
            (Zone::Bottom, self.bottom),
            (Zone::Center, self.center),
        ]
        .into_iter()
    }
}

/// Rectangle a panel docked to `zone` claims: `fraction` of the container along the docking
/// axis, the full extent across it.
///
/// Returns `None` for non-edge zones.
pub fn docked_rect(bounds: Rect, zone: Zone, fraction: f32) -> Option<Rect> {
    let bounds = sanitize_bounds(bounds);
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let span_x = bounds.width() * fraction;
    let span_y = bounds.height() * fraction;

    let rect = match zone {
        Zone::Left => Rect::from_min_max(bounds.min, egui::pos2(bounds.min.x + span_x, bounds.max.y)),
        Zone::Right => Rect::from_min_max(egui::pos2(bounds.max.x - span_x, bounds.min.y), bounds.max),
        Zone::Top => Rect::from_min_max(bounds.min, egui::pos2(bounds.max.x, bounds.min.y + span_y)),
        Zone::Bottom => Rect::from_min_max(egui::pos2(bounds.min.x, bounds.max.y - span_y), bounds.max),
        Zone::None | Zone::Center | Zone::TabGroup => return None,
    };
    Some(rect)
}

/// Non-finite or inverted bounds collapse to an empty rect at the origin.
fn sanitize_bounds(bounds: Rect) -> Rect {
    if !(bounds.min.is_finite() && bounds.max.is_finite()) {
        return Rect::from_min_size(Pos2::ZERO, Vec2::ZERO);
    }
    Rect::from_min_max(bounds.min, bounds.max.max(bounds.min))
}
