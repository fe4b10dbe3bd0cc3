use std::time::Duration;

/// What started a [`ScrollAnimation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationKind {
    /// Deceleration after a fling.
    Momentum,

    /// `scroll_to_progress`, restoring a remembered offset, and similar requests.
    Programmatic,
}

/// Cubic ease-out on `t` in `0..=1`.
pub fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

/// A single eased transition of one panel's offset.
#[derive(Clone, Debug, PartialEq)]
pub struct ScrollAnimation {
    pub kind: AnimationKind,
    from: f32,
    to: f32,
    duration: Duration,
    elapsed: Duration,
}

impl ScrollAnimation {
    pub fn new(kind: AnimationKind, from: f32, to: f32, duration: Duration) -> Self {
        Self {
            kind,
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
        }
    }

    pub fn from(&self) -> f32 {
        self.from
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Offset at the current time.
    pub fn value(&self) -> f32 {
        if self.duration.is_zero() || self.is_finished() {
            return self.to;
        }
        let t = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.from + (self.to - self.from) * ease_out_cubic(t)
    }

    /// Move the clock forward and return the new offset. The last step lands exactly on the
    /// target.
    pub fn advance(&mut self, dt: Duration) -> f32 {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.value()
    }

    /// Clamp the target into `0..=max`, e.g. after the content shrank mid-flight.
    pub(super) fn clamp_target(&mut self, max: f32) {
        self.to = self.to.clamp(0.0, max);
    }
}
