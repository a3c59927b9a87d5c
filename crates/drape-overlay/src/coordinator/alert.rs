#![forbid(unsafe_code)]

//! Centered alert coordinator.

use drape_core::{Completion, Size};

use super::{TransitionCoordinator, assert_ratio, scaled};
use crate::animator::{Animator, ScaleFadeAnimator, TransitionContext};
use crate::layout::{LayoutContext, LayoutGuide, ResolvedLayout};

/// Centers the container in the available region.
///
/// Width is the guide's fixed width or the content's natural width, capped
/// at `max_width_ratio` of the region. Height is measured at that width and
/// capped at `max_height_ratio`.
pub struct AlertCoordinator {
    guide: LayoutGuide,
    animator: Box<dyn Animator>,
    max_width_ratio: f32,
    max_height_ratio: f32,
    resolved: Option<ResolvedLayout>,
}

impl Default for AlertCoordinator {
    fn default() -> Self {
        Self::new(ScaleFadeAnimator::default())
    }
}

impl AlertCoordinator {
    pub const DEFAULT_MAX_WIDTH_RATIO: f32 = 0.8;
    pub const DEFAULT_MAX_HEIGHT_RATIO: f32 = 0.85;

    pub fn new(animator: impl Animator + 'static) -> Self {
        Self {
            guide: LayoutGuide::default(),
            animator: Box::new(animator),
            max_width_ratio: Self::DEFAULT_MAX_WIDTH_RATIO,
            max_height_ratio: Self::DEFAULT_MAX_HEIGHT_RATIO,
            resolved: None,
        }
    }

    pub fn layout_guide(mut self, guide: LayoutGuide) -> Self {
        self.guide = guide;
        self
    }

    /// # Panics
    ///
    /// Panics if `ratio` is not in `(0, 1]`.
    pub fn max_width_ratio(mut self, ratio: f32) -> Self {
        assert_ratio("max_width_ratio", ratio);
        self.max_width_ratio = ratio;
        self
    }

    /// # Panics
    ///
    /// Panics if `ratio` is not in `(0, 1]`.
    pub fn max_height_ratio(mut self, ratio: f32) -> Self {
        assert_ratio("max_height_ratio", ratio);
        self.max_height_ratio = ratio;
        self
    }
}

impl TransitionCoordinator for AlertCoordinator {
    fn layout_guide(&self) -> LayoutGuide {
        self.guide
    }

    fn set_layout_guide(&mut self, guide: LayoutGuide) {
        self.guide = guide;
    }

    fn update(&mut self, cx: &LayoutContext<'_>) -> ResolvedLayout {
        let available = self.guide.available(&cx.metrics);
        let max = Size::new(
            scaled(available.width, self.max_width_ratio),
            scaled(available.height, self.max_height_ratio),
        );
        let width = self.guide.width.map_or(max.width, |w| w.min(max.width));
        let natural = cx.measure(Size::new(width, max.height));
        let size = Size::new(
            if self.guide.width.is_some() {
                width
            } else {
                natural.width.min(max.width)
            },
            natural.height.min(max.height),
        );
        let resolved = ResolvedLayout {
            frame: available.center(size),
            orientation: cx.metrics.orientation,
        };
        self.resolved = Some(resolved);
        resolved
    }

    fn resolved(&self) -> Option<ResolvedLayout> {
        self.resolved
    }

    fn show(&self, cx: &TransitionContext<'_>, on_complete: Completion) {
        self.animator.show(cx, on_complete);
    }

    fn dismiss(&self, cx: &TransitionContext<'_>, on_complete: Completion) {
        self.animator.dismiss(cx, on_complete);
    }
}
