#![forbid(unsafe_code)]

//! Show/dismiss transition strategies.
//!
//! An [`Animator`] turns a [`TransitionContext`] into one [`Animation`] on
//! the context's driver. Side effects are purely visual: opacity, scale and
//! offset of the container and backdrop layers.
//!
//! Two stock strategies ship with the crate:
//!
//! - [`ScaleFadeAnimator`]: container pops from a smaller scale while fading
//!   in (alerts).
//! - [`SlideFadeAnimator`]: container slides in from a host edge while
//!   fading in (sheets, toasts).
//!
//! Both fade the backdrop between fully transparent and its resting opacity.

use drape_core::{
    Animation, AnimationDriver, Completion, Easing, Layer, LayerTarget, Offset, Rect,
};
use web_time::Duration;

/// Default transition duration.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(250);

/// Everything an animator needs for one transition.
pub struct TransitionContext<'a> {
    pub container: &'a Layer,
    pub backdrop: &'a Layer,
    /// Resolved resting frame of the container.
    pub frame: Rect,
    pub host_bounds: Rect,
    pub driver: &'a dyn AnimationDriver,
}

/// Strategy driving container and backdrop between hidden and visible.
///
/// Implementations must call `on_complete` exactly once, after the visual
/// transition finished. Handing it to the driver satisfies this.
pub trait Animator {
    /// Hidden to resting visible state.
    fn show(&self, cx: &TransitionContext<'_>, on_complete: Completion);

    /// Resting visible state back to the pre-show hidden state.
    fn dismiss(&self, cx: &TransitionContext<'_>, on_complete: Completion);
}

/// Scale + fade transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFadeAnimator {
    pub duration: Duration,
    pub easing: Easing,
    /// Scale of the hidden container.
    pub from_scale: f32,
}

impl Default for ScaleFadeAnimator {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            easing: Easing::EaseOut,
            from_scale: 0.9,
        }
    }
}

impl ScaleFadeAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn from_scale(mut self, scale: f32) -> Self {
        self.from_scale = scale;
        self
    }

    fn hidden(&self) -> LayerTarget {
        LayerTarget::new().opacity(0.0).scale(self.from_scale)
    }
}

impl Animator for ScaleFadeAnimator {
    fn show(&self, cx: &TransitionContext<'_>, on_complete: Completion) {
        cx.container.set_opacity(0.0);
        cx.container.set_scale(self.from_scale);
        cx.container.set_offset(Offset::ZERO);
        cx.backdrop.set_opacity(0.0);

        let animation = Animation::new(self.duration, self.easing)
            .track(cx.container, LayerTarget::new().opacity(1.0).scale(1.0))
            .track(cx.backdrop, LayerTarget::new().opacity(1.0));
        cx.driver.animate(animation, on_complete);
    }

    fn dismiss(&self, cx: &TransitionContext<'_>, on_complete: Completion) {
        let animation = Animation::new(self.duration, self.easing)
            .track(cx.container, self.hidden())
            .track(cx.backdrop, LayerTarget::new().opacity(0.0));
        cx.driver.animate(animation, on_complete);
    }
}

/// Host edge a sliding container enters from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlideEdge {
    #[default]
    Bottom,
    Top,
}

/// Slide-from-edge + fade transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideFadeAnimator {
    pub duration: Duration,
    pub easing: Easing,
    pub edge: SlideEdge,
}

impl Default for SlideFadeAnimator {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            easing: Easing::EaseOut,
            edge: SlideEdge::Bottom,
        }
    }
}

impl SlideFadeAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn edge(mut self, edge: SlideEdge) -> Self {
        self.edge = edge;
        self
    }

    /// Offset that moves `frame` completely past the host edge.
    pub fn hidden_offset(&self, frame: Rect, host_bounds: Rect) -> Offset {
        let dy = match self.edge {
            SlideEdge::Bottom => host_bounds.bottom() - frame.y,
            SlideEdge::Top => host_bounds.y - frame.bottom(),
        };
        Offset::new(0.0, dy as f32)
    }
}

impl Animator for SlideFadeAnimator {
    fn show(&self, cx: &TransitionContext<'_>, on_complete: Completion) {
        cx.container.set_opacity(0.0);
        cx.container.set_scale(1.0);
        cx.container
            .set_offset(self.hidden_offset(cx.frame, cx.host_bounds));
        cx.backdrop.set_opacity(0.0);

        let animation = Animation::new(self.duration, self.easing)
            .track(
                cx.container,
                LayerTarget::new().opacity(1.0).offset(Offset::ZERO),
            )
            .track(cx.backdrop, LayerTarget::new().opacity(1.0));
        cx.driver.animate(animation, on_complete);
    }

    fn dismiss(&self, cx: &TransitionContext<'_>, on_complete: Completion) {
        let hidden = self.hidden_offset(cx.frame, cx.host_bounds);
        let animation = Animation::new(self.duration, self.easing)
            .track(cx.container, LayerTarget::new().opacity(0.0).offset(hidden))
            .track(cx.backdrop, LayerTarget::new().opacity(0.0));
        cx.driver.animate(animation, on_complete);
    }
}
