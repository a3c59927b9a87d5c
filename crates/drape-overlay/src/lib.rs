#![forbid(unsafe_code)]

//! Alert, sheet and toast presentation for Drape.
//!
//! An [`Overlay`] hosts content over a [`drape_core::HostView`] with a
//! dimming [`Backdrop`], a swappable [`TransitionCoordinator`] deciding
//! where the container goes and how it animates, and an [`ActionGroup`]
//! that re-flows with the container width. [`ToastPresenter`] keeps a
//! single auto-dismissing toast on screen.

pub mod action;
pub mod animator;
pub mod backdrop;
pub mod config;
pub mod content;
pub mod coordinator;
pub mod layout;
pub mod overlay;
pub mod toast;

pub use action::{Action, ActionAxis, ActionGroup, ActionId, ActionRejected, ActionStyle, ActionView};
pub use animator::{
    Animator, DEFAULT_DURATION, ScaleFadeAnimator, SlideEdge, SlideFadeAnimator, TransitionContext,
};
pub use backdrop::{
    Backdrop, BackdropConfig, Dimming, Penetration, TouchDisposition, TouchRegion,
};
pub use config::{
    ActionLayoutType, ActionViewType, AlertDefaults, Alignment, MessageAlertOptions,
    MessageAlertStyle, TextAttrs,
};
pub use content::{FixedContent, MessageContent, OverlayContent};
pub use coordinator::{
    AlertCoordinator, CoordinatorDecorator, LayoutParticipant, SheetCoordinator,
    TransitionCoordinator,
};
pub use layout::{LayoutContext, LayoutGuide, ResolvedLayout};
pub use overlay::{
    Overlay, OverlayBuilder, OverlayId, OverlayKind, PresentationState, TOAST_BOTTOM_INSET,
};
pub use toast::{ToastPresenter, toast_duration};
