#![forbid(unsafe_code)]

//! Transition coordinators: geometry resolution plus animation sequencing.
//!
//! A [`TransitionCoordinator`] owns a [`LayoutGuide`] and an [`Animator`].
//! `update` resolves the container frame from the guide and the host
//! metrics; `show`/`dismiss` run the animator against the last resolved
//! geometry.
//!
//! - [`AlertCoordinator`]: centered, constrained by width/height ratios.
//! - [`SheetCoordinator`]: anchored to the bottom edge.
//! - [`CoordinatorDecorator`]: wraps any coordinator and re-flows registered
//!   [`LayoutParticipant`]s after every `update`.
//!
//! # Invariants
//!
//! - `update` is idempotent: same guide, metrics and measurements yield the
//!   same frame.
//! - The resolved frame never exceeds the guide's available region, except
//!   where negative insets deliberately overscan the host.

mod alert;
mod decorator;
mod sheet;

pub use alert::AlertCoordinator;
pub use decorator::{CoordinatorDecorator, LayoutParticipant};
pub use sheet::SheetCoordinator;

use drape_core::Completion;

use crate::animator::TransitionContext;
use crate::layout::{LayoutContext, LayoutGuide, ResolvedLayout};

/// Geometry + transition strategy for one overlay.
pub trait TransitionCoordinator {
    /// Current guide (a copy).
    fn layout_guide(&self) -> LayoutGuide;

    /// Replace the guide. Takes effect on the next `update`.
    fn set_layout_guide(&mut self, guide: LayoutGuide);

    /// Recompute the container frame.
    fn update(&mut self, cx: &LayoutContext<'_>) -> ResolvedLayout;

    /// Result of the last `update`, if any.
    fn resolved(&self) -> Option<ResolvedLayout>;

    /// Run the show transition.
    fn show(&self, cx: &TransitionContext<'_>, on_complete: Completion);

    /// Run the dismiss transition.
    fn dismiss(&self, cx: &TransitionContext<'_>, on_complete: Completion);
}

/// Scale `extent` by `ratio`, rounding down.
fn scaled(extent: i32, ratio: f32) -> i32 {
    (extent as f32 * ratio).floor() as i32
}

fn assert_ratio(name: &str, ratio: f32) {
    assert!(
        ratio.is_finite() && ratio > 0.0 && ratio <= 1.0,
        "{name} must be in (0, 1], got {ratio}"
    );
}
