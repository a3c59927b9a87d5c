#![forbid(unsafe_code)]

//! Bottom-anchored sheet coordinator.

use drape_core::{Completion, Rect, Size};

use super::TransitionCoordinator;
use crate::animator::{Animator, SlideFadeAnimator, TransitionContext};
use crate::layout::{LayoutContext, LayoutGuide, ResolvedLayout};

/// Anchors the container's bottom edge to the bottom of the available
/// region: host bottom, minus the bottom inset, minus the bottom safe-area
/// inset when the guide participates in the safe area.
///
/// Width is the guide width, the full available width, or (with
/// `fit_content`) the measured natural width; narrower sheets are centered
/// horizontally. Height is measured and capped at the available height.
pub struct SheetCoordinator {
    guide: LayoutGuide,
    animator: Box<dyn Animator>,
    fit_content: bool,
    resolved: Option<ResolvedLayout>,
}

impl Default for SheetCoordinator {
    fn default() -> Self {
        Self::new(SlideFadeAnimator::default())
    }
}

impl SheetCoordinator {
    pub fn new(animator: impl Animator + 'static) -> Self {
        Self {
            guide: LayoutGuide::default(),
            animator: Box::new(animator),
            fit_content: false,
            resolved: None,
        }
    }

    pub fn layout_guide(mut self, guide: LayoutGuide) -> Self {
        self.guide = guide;
        self
    }

    /// Size the sheet to its content's natural width.
    pub fn fit_content(mut self, fit: bool) -> Self {
        self.fit_content = fit;
        self
    }
}

impl TransitionCoordinator for SheetCoordinator {
    fn layout_guide(&self) -> LayoutGuide {
        self.guide
    }

    fn set_layout_guide(&mut self, guide: LayoutGuide) {
        self.guide = guide;
    }

    fn update(&mut self, cx: &LayoutContext<'_>) -> ResolvedLayout {
        let available = self.guide.available(&cx.metrics);
        let proposed_width = self
            .guide
            .width
            .map_or(available.width, |w| w.min(available.width));
        let natural = cx.measure(Size::new(proposed_width, available.height));
        let width = if self.fit_content && self.guide.width.is_none() {
            natural.width.min(available.width)
        } else {
            proposed_width
        };
        let height = natural.height.min(available.height);
        let x = available.x + (available.width - width) / 2;
        let frame = Rect::new(x, available.bottom() - height, width, height);
        let resolved = ResolvedLayout {
            frame,
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
