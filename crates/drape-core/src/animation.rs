#![forbid(unsafe_code)]

//! Animation descriptions and the driver capability that runs them.
//!
//! An [`Animation`] is a set of per-layer [`Track`]s sharing one duration
//! and easing curve. It is handed to an [`AnimationDriver`] together with a
//! completion callback. The engine never interpolates by itself; the driver
//! (a host frame loop, or the deterministic [`Timeline`](crate::Timeline))
//! owns time.
//!
//! # Driver contract
//!
//! 1. `on_complete` runs exactly once, after every track reached its target.
//! 2. `on_complete` should be delivered on a later turn of the host loop.
//!    A driver that skips animation (reduced motion, headless hosts) may
//!    call it from inside `animate`; callers must not hold state borrowed
//!    across `animate` that the completion needs.

use web_time::Duration;

use crate::layer::{Layer, LayerProps, Offset};

/// One-shot completion callback.
pub type Completion = Box<dyn FnOnce()>;

/// Easing curve applied to animation progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    /// Linear interpolation.
    Linear,
    /// Smooth ease-out (decelerating).
    #[default]
    EaseOut,
    /// Smooth ease-in (accelerating).
    EaseIn,
    /// Smooth S-curve.
    EaseInOut,
}

impl Easing {
    /// Apply the easing function to a progress value (0.0 to 1.0).
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseOut => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
            Self::EaseIn => t * t * t,
            Self::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let inv = -2.0 * t + 2.0;
                    1.0 - inv * inv * inv / 2.0
                }
            }
        }
    }
}

/// Target values for a layer; `None` leaves a property untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayerTarget {
    pub opacity: Option<f32>,
    pub scale: Option<f32>,
    pub offset: Option<Offset>,
}

impl LayerTarget {
    pub const fn new() -> Self {
        Self {
            opacity: None,
            scale: None,
            offset: None,
        }
    }

    #[must_use]
    pub const fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    #[must_use]
    pub const fn scale(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: Offset) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Apply the interpolation between `from` and this target at eased
    /// progress `p` to `layer`.
    pub fn apply_at(&self, layer: &Layer, from: &LayerProps, p: f64) {
        let lerp = |a: f32, b: f32| a + (b - a) * p as f32;
        if let Some(opacity) = self.opacity {
            layer.set_opacity(lerp(from.opacity, opacity));
        }
        if let Some(scale) = self.scale {
            layer.set_scale(lerp(from.scale, scale));
        }
        if let Some(offset) = self.offset {
            layer.set_offset(Offset::new(
                lerp(from.offset.dx, offset.dx),
                lerp(from.offset.dy, offset.dy),
            ));
        }
    }
}

/// A layer and the values it animates towards.
#[derive(Debug, Clone)]
pub struct Track {
    pub layer: Layer,
    pub target: LayerTarget,
}

/// A group of tracks sharing duration and easing.
#[derive(Debug, Clone)]
pub struct Animation {
    pub duration: Duration,
    pub easing: Easing,
    pub tracks: Vec<Track>,
}

impl Animation {
    pub fn new(duration: Duration, easing: Easing) -> Self {
        Self {
            duration,
            easing,
            tracks: Vec::new(),
        }
    }

    /// Add a track for `layer`.
    #[must_use]
    pub fn track(mut self, layer: &Layer, target: LayerTarget) -> Self {
        self.tracks.push(Track {
            layer: layer.clone(),
            target,
        });
        self
    }
}

/// Host capability that runs animations over time.
///
/// Completion may be synchronous: `on_complete` is allowed to run before
/// `animate` returns.
pub trait AnimationDriver {
    /// Start `animation` from each layer's current properties and call
    /// `on_complete` once it has finished.
    fn animate(&self, animation: Animation, on_complete: Completion);
}
