#![forbid(unsafe_code)]

//! Overlay lifecycle controller.
//!
//! An [`Overlay`] owns a container layer, a [`Backdrop`], a transition
//! coordinator and its content, and moves through
//! `Idle → Showing → Visible → Dismissing → Idle`.
//!
//! # Requests
//!
//! `show`/`dismiss` return immediately. Requests are kept as a FIFO of
//! pending transitions:
//!
//! - a request of the same kind as the latest pending (or in-flight)
//!   transition joins its callback list;
//! - an opposite request is appended and starts once everything before it
//!   settled;
//! - with nothing pending, `show` while Visible and `dismiss` while Idle run
//!   their callback at once.
//!
//! # Invariants
//!
//! 1. At most one show/dismiss animation runs at a time.
//! 2. Every callback runs exactly once, after the visual work of its
//!    transition completed, in registration order.
//! 3. After a show settles the backdrop is attached; after a dismiss settles
//!    it is detached.
//! 4. No internal borrow is held while callbacks run, so callbacks may
//!    issue new requests.
//! 5. While attached, each host metrics change produces exactly one layout
//!    pass.
//! 6. A driver that completes from inside `animate` settles the transition
//!    only after `animate` returned.
//!
//! # Failure Modes
//!
//! - Dropping every handle while a transition is in flight drops its
//!   pending callbacks without running them.
//! - Content closures passed to [`Overlay::with_content`] must not call back
//!   into the same overlay.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use drape_core::{
    AnimationDriver, Completion, HostView, Insets, Layer, Point, Rect, Size, Subscription,
};

use crate::action::{Action, ActionGroup, ActionRejected};
use crate::animator::TransitionContext;
use crate::backdrop::{
    Backdrop, BackdropConfig, Dimming, Penetration, TouchDisposition, TouchRegion,
};
use crate::config::{ActionLayoutType, ActionViewType, AlertDefaults, MessageAlertOptions};
use crate::content::{MessageContent, OverlayContent};
use crate::coordinator::{
    AlertCoordinator, CoordinatorDecorator, LayoutParticipant, SheetCoordinator,
    TransitionCoordinator,
};
use crate::layout::{LayoutContext, LayoutGuide};

/// Global counter for unique overlay IDs.
static OVERLAY_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Bottom inset of toast overlays.
pub const TOAST_BOTTOM_INSET: i32 = 2;

/// Unique identifier for an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(u64);

impl OverlayId {
    fn next() -> Self {
        Self(OVERLAY_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Overlay flavor; decides default coordinator, backdrop and whether actions
/// are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    /// Centered, modal, scale + fade.
    Alert,
    /// Bottom-anchored, modal, slide + fade.
    Sheet,
    /// Bottom-anchored, sized to content, non-modal, no actions.
    Toast,
}

impl OverlayKind {
    #[inline]
    pub const fn accepts_actions(self) -> bool {
        !matches!(self, Self::Toast)
    }

    fn default_coordinator(self) -> Box<dyn TransitionCoordinator> {
        match self {
            Self::Alert => Box::new(AlertCoordinator::default()),
            Self::Sheet => Box::new(SheetCoordinator::default()),
            Self::Toast => Box::new(
                SheetCoordinator::default()
                    .fit_content(true)
                    .layout_guide(LayoutGuide::new().insets(Insets::bottom(TOAST_BOTTOM_INSET))),
            ),
        }
    }

    fn default_backdrop(self) -> BackdropConfig {
        match self {
            Self::Alert | Self::Sheet => BackdropConfig::default(),
            Self::Toast => BackdropConfig::new(Dimming::Clear, Penetration::all()),
        }
    }
}

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationState {
    #[default]
    Idle,
    Showing,
    Visible,
    Dismissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransitionKind {
    Show,
    Dismiss,
}

struct Transition {
    kind: TransitionKind,
    callbacks: Vec<Completion>,
}

impl Transition {
    fn new(kind: TransitionKind, callback: Option<Completion>) -> Self {
        Self {
            kind,
            callbacks: callback.into_iter().collect(),
        }
    }
}

/// Builder for [`Overlay`].
pub struct OverlayBuilder {
    kind: OverlayKind,
    content: Box<dyn OverlayContent>,
    coordinator: Option<Box<dyn TransitionCoordinator>>,
    backdrop: Option<BackdropConfig>,
    action_layout: ActionLayoutType,
    action_view: ActionViewType,
}

impl OverlayBuilder {
    pub fn new(kind: OverlayKind, content: impl OverlayContent) -> Self {
        Self {
            kind,
            content: Box::new(content),
            coordinator: None,
            backdrop: None,
            action_layout: ActionLayoutType::default(),
            action_view: ActionViewType::default(),
        }
    }

    /// Title + message content styled from `options`, falling back to the
    /// current [`AlertDefaults::global`].
    ///
    /// # Panics
    ///
    /// Panics if both `title` and `message` are `None`.
    pub fn message(
        kind: OverlayKind,
        title: Option<&str>,
        message: Option<&str>,
        options: &MessageAlertOptions,
    ) -> Self {
        Self::message_with_defaults(kind, title, message, options, &AlertDefaults::global())
    }

    /// Like [`OverlayBuilder::message`], with unset options filled from
    /// `defaults` instead of the thread's global defaults.
    ///
    /// # Panics
    ///
    /// Panics if both `title` and `message` are `None`.
    pub fn message_with_defaults(
        kind: OverlayKind,
        title: Option<&str>,
        message: Option<&str>,
        options: &MessageAlertOptions,
        defaults: &AlertDefaults,
    ) -> Self {
        let style = options.resolve(defaults);
        let content = MessageContent::new(
            title.map(str::to_owned),
            message.map(str::to_owned),
            style,
        );
        Self::new(kind, content).action_layout(style.action_layout_type, style.action_view_type)
    }

    pub fn coordinator(mut self, coordinator: impl TransitionCoordinator + 'static) -> Self {
        self.coordinator = Some(Box::new(coordinator));
        self
    }

    pub fn backdrop(mut self, config: BackdropConfig) -> Self {
        self.backdrop = Some(config);
        self
    }

    pub fn action_layout(mut self, layout: ActionLayoutType, view: ActionViewType) -> Self {
        self.action_layout = layout;
        self.action_view = view;
        self
    }

    /// Build an idle overlay presenting over `host`.
    pub fn build(self, host: &HostView, driver: Rc<dyn AnimationDriver>) -> Overlay {
        let actions = Rc::new(RefCell::new(ActionGroup::new(
            self.action_layout,
            self.action_view,
        )));
        let coordinator = self
            .coordinator
            .unwrap_or_else(|| self.kind.default_coordinator());
        let coordinator = install_coordinator(coordinator, self.kind, &actions);
        let backdrop = self
            .backdrop
            .unwrap_or_else(|| self.kind.default_backdrop());

        let container = Layer::new();
        container.set_opacity(0.0);
        let inner = OverlayInner {
            id: OverlayId::next(),
            kind: self.kind,
            host: host.clone(),
            driver,
            container,
            backdrop: RefCell::new(Backdrop::new(backdrop)),
            coordinator: RefCell::new(coordinator),
            content: RefCell::new(self.content),
            actions,
            state: Cell::new(PresentationState::Idle),
            in_flight: RefCell::new(None),
            queue: RefCell::new(VecDeque::new()),
            needs_layout: Cell::new(true),
            pending_frame: Cell::new(None),
            host_subscription: RefCell::new(None),
            layout_passes: Cell::new(0),
            animating: Cell::new(false),
            finish_deferred: Cell::new(false),
        };
        tracing::debug!(overlay.id = inner.id.0, kind = ?inner.kind, "overlay created");
        Overlay {
            inner: Rc::new(inner),
        }
    }
}

/// Wrap `coordinator` in a decorator that re-flows the action group when the
/// overlay kind accepts actions.
fn install_coordinator(
    coordinator: Box<dyn TransitionCoordinator>,
    kind: OverlayKind,
    actions: &Rc<RefCell<ActionGroup>>,
) -> Box<dyn TransitionCoordinator> {
    if !kind.accepts_actions() {
        return coordinator;
    }
    let mut decorator = CoordinatorDecorator::new(coordinator);
    let participant: Rc<RefCell<dyn LayoutParticipant>> = actions.clone();
    decorator.add_participant(&participant);
    Box::new(decorator)
}

struct OverlayInner {
    id: OverlayId,
    kind: OverlayKind,
    host: HostView,
    driver: Rc<dyn AnimationDriver>,
    container: Layer,
    backdrop: RefCell<Backdrop>,
    coordinator: RefCell<Box<dyn TransitionCoordinator>>,
    content: RefCell<Box<dyn OverlayContent>>,
    actions: Rc<RefCell<ActionGroup>>,
    state: Cell<PresentationState>,
    in_flight: RefCell<Option<Transition>>,
    queue: RefCell<VecDeque<Transition>>,
    needs_layout: Cell<bool>,
    /// Frame resolved mid-transition, applied once it settles.
    pending_frame: Cell<Option<Rect>>,
    host_subscription: RefCell<Option<Subscription>>,
    layout_passes: Cell<u64>,
    /// Set while the coordinator is handing an animation to the driver.
    animating: Cell<bool>,
    /// A completion arrived synchronously and waits for the driver to return.
    finish_deferred: Cell<bool>,
}

impl OverlayInner {
    fn set_state(&self, state: PresentationState) {
        let from = self.state.replace(state);
        tracing::debug!(overlay.id = self.id.0, ?from, to = ?state, "presentation state");
    }

    fn is_transitioning(&self) -> bool {
        matches!(
            self.state.get(),
            PresentationState::Showing | PresentationState::Dismissing
        )
    }

    fn needs_layout(&self) -> bool {
        self.needs_layout.get() || self.actions.borrow().needs_layout()
    }

    fn request(self: &Rc<Self>, kind: TransitionKind, callback: Option<Completion>) {
        let queued = self.queue.borrow().back().map(|t| t.kind);
        let in_flight = self.in_flight.borrow().as_ref().map(|t| t.kind);

        match queued.or(in_flight) {
            Some(latest) if latest == kind => {
                if let Some(callback) = callback {
                    if queued.is_some() {
                        if let Some(last) = self.queue.borrow_mut().back_mut() {
                            last.callbacks.push(callback);
                        }
                    } else if let Some(current) = self.in_flight.borrow_mut().as_mut() {
                        current.callbacks.push(callback);
                    }
                }
                tracing::debug!(overlay.id = self.id.0, ?kind, "joined pending transition");
            }
            Some(_) => {
                self.queue
                    .borrow_mut()
                    .push_back(Transition::new(kind, callback));
                tracing::debug!(overlay.id = self.id.0, ?kind, "transition queued");
            }
            None => self.start_or_settle(Transition::new(kind, callback)),
        }
    }

    /// Start `transition`, or run its callbacks now if the overlay is
    /// already in the requested end state.
    fn start_or_settle(self: &Rc<Self>, transition: Transition) {
        let settled = matches!(
            (transition.kind, self.state.get()),
            (TransitionKind::Show, PresentationState::Visible)
                | (TransitionKind::Dismiss, PresentationState::Idle)
        );
        if settled {
            tracing::debug!(
                overlay.id = self.id.0,
                kind = ?transition.kind,
                "already settled, completing immediately"
            );
            for callback in transition.callbacks {
                callback();
            }
            return;
        }

        let kind = transition.kind;
        *self.in_flight.borrow_mut() = Some(transition);
        match kind {
            TransitionKind::Show => {
                self.subscribe_host();
                self.backdrop.borrow_mut().attach(&self.host);
                self.host.add_layer(&self.container);
                self.layout();
                self.set_state(PresentationState::Showing);
            }
            TransitionKind::Dismiss => self.set_state(PresentationState::Dismissing),
        }
        self.run_animator(kind);
    }

    fn run_animator(self: &Rc<Self>, kind: TransitionKind) {
        let weak = Rc::downgrade(self);
        let on_complete: Completion = Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.animating.get() {
                inner.finish_deferred.set(true);
            } else {
                inner.finish();
            }
        });
        let backdrop = self.backdrop.borrow().layer().clone();

        self.animating.set(true);
        {
            let cx = TransitionContext {
                container: &self.container,
                backdrop: &backdrop,
                frame: self.container.frame(),
                host_bounds: self.host.bounds(),
                driver: self.driver.as_ref(),
            };
            let coordinator = self.coordinator.borrow();
            match kind {
                TransitionKind::Show => coordinator.show(&cx, on_complete),
                TransitionKind::Dismiss => coordinator.dismiss(&cx, on_complete),
            }
        }
        self.animating.set(false);

        // Driver completed inside `animate`; settle now that the
        // coordinator borrow is released.
        if self.finish_deferred.replace(false) {
            tracing::trace!(overlay.id = self.id.0, ?kind, "driver completed synchronously");
            self.finish();
        }
    }

    fn finish(self: &Rc<Self>) {
        let Some(transition) = self.in_flight.borrow_mut().take() else {
            return;
        };
        match transition.kind {
            TransitionKind::Show => {
                self.set_state(PresentationState::Visible);
                if let Some(frame) = self.pending_frame.take() {
                    self.apply_frame(frame);
                }
            }
            TransitionKind::Dismiss => {
                self.backdrop.borrow_mut().detach();
                self.host.remove_layer(&self.container);
                let subscription = self.host_subscription.borrow_mut().take();
                drop(subscription);
                self.pending_frame.set(None);
                self.set_state(PresentationState::Idle);
            }
        }

        for callback in transition.callbacks {
            callback();
        }
        self.advance_queue();
    }

    fn advance_queue(self: &Rc<Self>) {
        while self.in_flight.borrow().is_none() {
            let Some(next) = self.queue.borrow_mut().pop_front() else {
                return;
            };
            self.start_or_settle(next);
        }
    }

    fn subscribe_host(self: &Rc<Self>) {
        if self.host_subscription.borrow().is_some() {
            return;
        }
        let weak = Rc::downgrade(self);
        let subscription = self.host.observe(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.layout();
            }
        });
        *self.host_subscription.borrow_mut() = Some(subscription);
    }

    fn layout(&self) {
        let metrics = self.host.metrics();
        let _span = tracing::debug_span!(
            "overlay_layout",
            overlay.id = self.id.0,
            orientation = ?metrics.orientation
        )
        .entered();

        self.backdrop.borrow().fit(metrics.bounds);
        let resolved = {
            let content = self.content.borrow();
            let actions = &self.actions;
            let measure = |proposed: Size| {
                let natural = content.measure(proposed);
                let group = actions.borrow();
                let width = natural.width.max(group.natural_width()).min(proposed.width);
                Size::new(width, natural.height + group.height_for(width))
            };
            self.coordinator
                .borrow_mut()
                .update(&LayoutContext::new(metrics, &measure))
        };

        if self.is_transitioning() {
            self.pending_frame.set(Some(resolved.frame));
        } else {
            self.apply_frame(resolved.frame);
        }
        self.needs_layout.set(false);
        self.actions.borrow().take_needs_layout();
        self.layout_passes.set(self.layout_passes.get() + 1);
        tracing::trace!(frame = ?resolved.frame, deferred = self.is_transitioning(), "layout pass");
    }

    fn apply_frame(&self, frame: Rect) {
        self.container.set_frame(frame);
        self.content.borrow_mut().layout(frame);
    }
}

impl Drop for OverlayInner {
    fn drop(&mut self) {
        self.host.remove_layer(&self.container);
    }
}

/// Handle to an overlay. Clones refer to the same overlay.
#[derive(Clone)]
pub struct Overlay {
    inner: Rc<OverlayInner>,
}

impl Overlay {
    pub fn builder(kind: OverlayKind, content: impl OverlayContent) -> OverlayBuilder {
        OverlayBuilder::new(kind, content)
    }

    #[inline]
    pub fn id(&self) -> OverlayId {
        self.inner.id
    }

    #[inline]
    pub fn kind(&self) -> OverlayKind {
        self.inner.kind
    }

    pub fn state(&self) -> PresentationState {
        self.inner.state.get()
    }

    pub fn is_visible(&self) -> bool {
        self.state() == PresentationState::Visible
    }

    pub fn host(&self) -> &HostView {
        &self.inner.host
    }

    /// The container layer the content is drawn into.
    pub fn container(&self) -> &Layer {
        &self.inner.container
    }

    pub fn backdrop_layer(&self) -> Layer {
        self.inner.backdrop.borrow().layer().clone()
    }

    pub fn is_backdrop_attached(&self) -> bool {
        self.inner.backdrop.borrow().is_attached()
    }

    /// Current container frame.
    pub fn frame(&self) -> Rect {
        self.inner.container.frame()
    }

    /// Present the overlay.
    pub fn show(&self) {
        self.inner.request(TransitionKind::Show, None);
    }

    /// Present the overlay and run `on_complete` once it is visible.
    pub fn show_with(&self, on_complete: impl FnOnce() + 'static) {
        self.inner
            .request(TransitionKind::Show, Some(Box::new(on_complete)));
    }

    /// Dismiss the overlay.
    pub fn dismiss(&self) {
        self.inner.request(TransitionKind::Dismiss, None);
    }

    /// Dismiss the overlay and run `on_complete` once it is gone.
    pub fn dismiss_with(&self, on_complete: impl FnOnce() + 'static) {
        self.inner
            .request(TransitionKind::Dismiss, Some(Box::new(on_complete)));
    }

    /// Transitions in flight or queued.
    pub fn pending_transitions(&self) -> usize {
        self.inner.queue.borrow().len() + usize::from(self.inner.in_flight.borrow().is_some())
    }

    /// Whether a dismiss is running or waiting behind the current transition.
    pub fn is_dismiss_pending(&self) -> bool {
        let queued = self
            .inner
            .queue
            .borrow()
            .iter()
            .any(|t| t.kind == TransitionKind::Dismiss);
        queued
            || self
                .inner
                .in_flight
                .borrow()
                .as_ref()
                .is_some_and(|t| t.kind == TransitionKind::Dismiss)
    }

    /// Add an action; layout is marked dirty.
    ///
    /// # Panics
    ///
    /// Panics on toast overlays, which never carry actions.
    pub fn add_action(&self, action: Action) -> Result<(), ActionRejected> {
        assert!(
            self.inner.kind.accepts_actions(),
            "toast overlays do not accept actions"
        );
        self.inner.actions.borrow_mut().add_action(action)
    }

    /// Remove an action. Returns whether it was a member.
    pub fn remove_action(&self, action: &Action) -> bool {
        self.inner.actions.borrow_mut().remove_action(action)
    }

    /// Actions in on-screen order.
    pub fn actions(&self) -> Vec<Action> {
        self.inner.actions.borrow().actions()
    }

    /// Inspect the action group.
    pub fn with_actions<R>(&self, f: impl FnOnce(&ActionGroup) -> R) -> R {
        f(&self.inner.actions.borrow())
    }

    /// Dismiss, then run `action`'s handler.
    ///
    /// Returns `false` (and does nothing) if the action is disabled or not a
    /// member of this overlay.
    pub fn perform(&self, action: &Action) -> bool {
        let member = self.inner.actions.borrow().contains(action);
        if !member || !action.is_enabled() {
            tracing::debug!(
                overlay.id = self.inner.id.0,
                action.id = action.id().id(),
                member,
                "perform ignored"
            );
            return false;
        }
        let action = action.clone();
        self.dismiss_with(move || {
            action.trigger();
        });
        true
    }

    /// Route a touch at `point` through the backdrop's penetration scope.
    pub fn handle_touch(&self, point: Point) -> TouchDisposition {
        let state = self.state();
        if state == PresentationState::Idle {
            return TouchDisposition::Forwarded;
        }
        let region = if self.inner.container.frame().contains(point) {
            TouchRegion::Container
        } else {
            TouchRegion::Backdrop
        };
        let (disposition, dismiss_on_tap) = {
            let backdrop = self.inner.backdrop.borrow();
            (backdrop.route_touch(region), backdrop.dismiss_on_tap())
        };
        if region == TouchRegion::Backdrop
            && disposition == TouchDisposition::Consumed
            && dismiss_on_tap
            && matches!(
                state,
                PresentationState::Showing | PresentationState::Visible
            )
        {
            self.dismiss();
        }
        disposition
    }

    pub fn dimming(&self) -> Dimming {
        self.inner.backdrop.borrow().dimming()
    }

    pub fn set_dimming(&self, dimming: Dimming) {
        self.inner.backdrop.borrow_mut().set_dimming(dimming);
    }

    pub fn penetration(&self) -> Penetration {
        self.inner.backdrop.borrow().penetration()
    }

    pub fn set_penetration(&self, penetration: Penetration) {
        self.inner.backdrop.borrow_mut().set_penetration(penetration);
    }

    pub fn set_dismiss_on_tap(&self, dismiss: bool) {
        self.inner.backdrop.borrow_mut().set_dismiss_on_tap(dismiss);
    }

    pub fn layout_guide(&self) -> LayoutGuide {
        self.inner.coordinator.borrow().layout_guide()
    }

    /// Replace the layout guide; takes effect on the next layout pass.
    pub fn set_layout_guide(&self, guide: LayoutGuide) {
        self.inner.coordinator.borrow_mut().set_layout_guide(guide);
        self.inner.needs_layout.set(true);
    }

    /// Replace the coordinator. Only allowed while Idle with nothing
    /// pending; otherwise ignored and `false` is returned.
    pub fn set_coordinator(&self, coordinator: impl TransitionCoordinator + 'static) -> bool {
        if self.state() != PresentationState::Idle || self.pending_transitions() > 0 {
            tracing::warn!(
                overlay.id = self.inner.id.0,
                state = ?self.state(),
                "coordinator can only be replaced while idle"
            );
            return false;
        }
        let coordinator =
            install_coordinator(Box::new(coordinator), self.inner.kind, &self.inner.actions);
        *self.inner.coordinator.borrow_mut() = coordinator;
        self.inner.needs_layout.set(true);
        true
    }

    /// Mutate the content if it is a `T`; layout is marked dirty.
    pub fn with_content<T: OverlayContent, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let result = {
            let mut content = self.inner.content.borrow_mut();
            content.as_any_mut().downcast_mut::<T>().map(f)
        };
        if result.is_some() {
            self.inner.needs_layout.set(true);
        }
        result
    }

    pub fn set_needs_layout(&self) {
        self.inner.needs_layout.set(true);
    }

    /// Whether the overlay or its action group changed since the last pass.
    pub fn needs_layout(&self) -> bool {
        self.inner.needs_layout()
    }

    /// Run a layout pass if one is needed. Returns whether it ran.
    pub fn layout_if_needed(&self) -> bool {
        if !self.inner.needs_layout() {
            return false;
        }
        self.inner.layout();
        true
    }

    /// Layout passes run so far.
    pub fn layout_pass_count(&self) -> u64 {
        self.inner.layout_passes.get()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overlay")
            .field("id", &self.inner.id.0)
            .field("kind", &self.inner.kind)
            .field("state", &self.state())
            .field("frame", &self.frame())
            .field("pending", &self.pending_transitions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::DEFAULT_DURATION;
    use crate::content::FixedContent;
    use crate::config::Alignment;
    use drape_core::{Animation, Timeline};
    use tracing_test::traced_test;

    fn setup(kind: OverlayKind) -> (HostView, Timeline, Overlay) {
        let host = HostView::with_size(Size::new(80, 24));
        let timeline = Timeline::new();
        let overlay = Overlay::builder(kind, FixedContent::new(Size::new(20, 6)))
            .build(&host, Rc::new(timeline.clone()));
        (host, timeline, overlay)
    }

    /// Jumps every track to its target and completes before returning.
    struct Immediate;

    impl AnimationDriver for Immediate {
        fn animate(&self, animation: Animation, on_complete: Completion) {
            for track in &animation.tracks {
                track
                    .target
                    .apply_at(&track.layer, &track.layer.props(), 1.0);
            }
            on_complete();
        }
    }

    fn log() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Completion) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let push = move |name: &'static str| -> Completion {
            let l = Rc::clone(&l);
            Box::new(move || l.borrow_mut().push(name))
        };
        (log, push)
    }

    #[test]
    fn show_attaches_and_settles() {
        let (host, timeline, overlay) = setup(OverlayKind::Alert);
        let (log, push) = log();
        overlay.show_with(push("shown"));

        assert_eq!(overlay.state(), PresentationState::Showing);
        assert!(overlay.is_backdrop_attached());
        assert!(host.contains_layer(overlay.container()));
        assert_eq!(overlay.frame(), Rect::new(30, 9, 20, 6));
        assert!(log.borrow().is_empty());

        timeline.advance(DEFAULT_DURATION);
        assert!(overlay.is_visible());
        assert_eq!(*log.borrow(), ["shown"]);
        assert_eq!(overlay.container().opacity(), 1.0);
    }

    #[test]
    fn backdrop_sits_below_container() {
        let (host, _timeline, overlay) = setup(OverlayKind::Alert);
        overlay.show();
        let layers = host.layers();
        assert_eq!(layers.len(), 2);
        assert!(layers[0].ptr_eq(&overlay.backdrop_layer()));
        assert!(layers[1].ptr_eq(overlay.container()));
    }

    #[test]
    fn show_while_visible_completes_immediately() {
        let (_host, timeline, overlay) = setup(OverlayKind::Sheet);
        overlay.show();
        timeline.advance(DEFAULT_DURATION);
        let started = timeline.animations_started();

        let (log, push) = log();
        overlay.show_with(push("again"));
        assert_eq!(*log.borrow(), ["again"]);
        assert_eq!(timeline.animations_started(), started);
    }

    #[test]
    fn dismiss_while_idle_completes_immediately() {
        let (host, timeline, overlay) = setup(OverlayKind::Alert);
        let (log, push) = log();
        overlay.dismiss_with(push("noop"));
        assert_eq!(*log.borrow(), ["noop"]);
        assert_eq!(timeline.animations_started(), 0);
        assert!(host.layers().is_empty());
    }

    #[test]
    fn show_during_dismiss_is_queued() {
        let (_host, timeline, overlay) = setup(OverlayKind::Alert);
        overlay.show();
        timeline.advance(DEFAULT_DURATION);

        let (log, push) = log();
        overlay.dismiss_with(push("dismissed"));
        overlay.show_with(push("shown"));
        assert_eq!(overlay.state(), PresentationState::Dismissing);
        assert_eq!(overlay.pending_transitions(), 2);

        timeline.advance(DEFAULT_DURATION);
        assert_eq!(*log.borrow(), ["dismissed"]);
        assert_eq!(overlay.state(), PresentationState::Showing);

        timeline.advance(DEFAULT_DURATION);
        assert_eq!(*log.borrow(), ["dismissed", "shown"]);
        assert!(overlay.is_visible());
    }

    #[test]
    fn callbacks_may_issue_new_requests() {
        let (_host, timeline, overlay) = setup(OverlayKind::Alert);
        let handle = overlay.clone();
        overlay.show_with(move || handle.dismiss());

        timeline.advance(DEFAULT_DURATION);
        assert_eq!(overlay.state(), PresentationState::Dismissing);
        timeline.advance(DEFAULT_DURATION);
        assert_eq!(overlay.state(), PresentationState::Idle);
    }

    #[test]
    fn rotation_mid_show_applies_after_settle() {
        let (host, timeline, overlay) = setup(OverlayKind::Alert);
        overlay.show();
        let before = overlay.frame();

        host.rotate();
        assert_eq!(overlay.frame(), before);
        assert_eq!(overlay.layout_pass_count(), 2);

        timeline.advance(DEFAULT_DURATION);
        // 80% of the new 24-column width caps the content at 19.
        assert_eq!(overlay.frame(), Rect::new(2, 37, 19, 6));
    }

    #[test]
    fn metrics_are_ignored_once_dismissed() {
        let (host, timeline, overlay) = setup(OverlayKind::Alert);
        overlay.show();
        timeline.advance(DEFAULT_DURATION);
        overlay.dismiss();
        timeline.advance(DEFAULT_DURATION);
        let passes = overlay.layout_pass_count();

        host.rotate();
        assert_eq!(overlay.layout_pass_count(), passes);
    }

    #[test]
    fn backdrop_tap_dismisses_when_enabled() {
        let (_host, timeline, overlay) = setup(OverlayKind::Alert);
        overlay.set_dismiss_on_tap(true);
        overlay.show();
        timeline.advance(DEFAULT_DURATION);

        assert_eq!(
            overlay.handle_touch(Point::new(31, 10)),
            TouchDisposition::Consumed
        );
        assert!(overlay.is_visible());

        assert_eq!(
            overlay.handle_touch(Point::new(0, 0)),
            TouchDisposition::Consumed
        );
        assert_eq!(overlay.state(), PresentationState::Dismissing);
    }

    #[test]
    fn idle_overlay_forwards_touches() {
        let (_host, _timeline, overlay) = setup(OverlayKind::Alert);
        assert_eq!(
            overlay.handle_touch(Point::new(0, 0)),
            TouchDisposition::Forwarded
        );
    }

    #[test]
    fn perform_runs_handler_after_dismissal() {
        let (_host, timeline, overlay) = setup(OverlayKind::Alert);
        let ran = Rc::new(Cell::new(false));
        let r = Rc::clone(&ran);
        let action = Action::new("OK", crate::action::ActionStyle::Default)
            .with_handler(move || r.set(true));
        overlay.add_action(action.clone()).unwrap();
        overlay.show();
        timeline.advance(DEFAULT_DURATION);

        assert!(overlay.perform(&action));
        assert!(!ran.get());
        timeline.advance(DEFAULT_DURATION);
        assert!(ran.get());
        assert_eq!(overlay.state(), PresentationState::Idle);
    }

    #[test]
    fn perform_ignores_disabled_actions() {
        let (_host, _timeline, overlay) = setup(OverlayKind::Alert);
        let action = Action::new("OK", crate::action::ActionStyle::Default);
        overlay.add_action(action.clone()).unwrap();
        action.set_enabled(false);
        assert!(!overlay.perform(&action));
        assert!(!overlay.perform(&Action::cancel("stranger")));
    }

    #[test]
    fn actions_grow_the_measured_frame() {
        let (_host, timeline, overlay) = setup(OverlayKind::Alert);
        overlay.show();
        assert_eq!(overlay.frame().height, 6);

        overlay
            .add_action(Action::new("OK", crate::action::ActionStyle::Default))
            .unwrap();
        assert!(overlay.needs_layout());
        assert!(overlay.layout_if_needed());
        assert!(!overlay.layout_if_needed());
        assert_eq!(overlay.frame().height, 6);

        timeline.advance(DEFAULT_DURATION);
        assert_eq!(overlay.frame().height, 7);
    }

    #[test]
    #[should_panic(expected = "toast overlays do not accept actions")]
    fn toast_rejects_actions() {
        let (_host, _timeline, overlay) = setup(OverlayKind::Toast);
        let _ = overlay.add_action(Action::cancel("x"));
    }

    #[test]
    fn toast_defaults_are_non_modal() {
        let (_host, _timeline, overlay) = setup(OverlayKind::Toast);
        assert_eq!(overlay.dimming(), Dimming::Clear);
        assert_eq!(overlay.penetration(), Penetration::all());
        assert_eq!(
            overlay.layout_guide().insets,
            Insets::bottom(TOAST_BOTTOM_INSET)
        );
    }

    #[test]
    #[traced_test]
    fn coordinator_swap_is_refused_while_presented() {
        let (_host, timeline, overlay) = setup(OverlayKind::Sheet);
        overlay.show();
        assert!(!overlay.set_coordinator(SheetCoordinator::default()));
        assert!(logs_contain("coordinator can only be replaced while idle"));

        timeline.advance(DEFAULT_DURATION);
        overlay.dismiss();
        timeline.advance(DEFAULT_DURATION);
        assert!(overlay.set_coordinator(AlertCoordinator::default()));
    }

    #[test]
    #[traced_test]
    fn queued_requests_are_logged() {
        let (_host, _timeline, overlay) = setup(OverlayKind::Alert);
        overlay.show();
        overlay.dismiss();
        assert!(logs_contain("transition queued"));
        overlay.dismiss();
        assert!(logs_contain("joined pending transition"));
    }

    #[test]
    fn dropping_the_overlay_clears_the_host() {
        let (host, _timeline, overlay) = setup(OverlayKind::Alert);
        overlay.show();
        drop(overlay);
        assert!(host.layers().is_empty());
    }

    #[test]
    fn synchronous_driver_callbacks_may_touch_the_coordinator() {
        let host = HostView::with_size(Size::new(80, 24));
        let overlay = Overlay::builder(OverlayKind::Alert, FixedContent::new(Size::new(20, 6)))
            .build(&host, Rc::new(Immediate));

        let guide = LayoutGuide::new().insets(Insets::uniform(2));
        let handle = overlay.clone();
        overlay.show_with(move || handle.set_layout_guide(guide));
        assert_eq!(overlay.state(), PresentationState::Visible);
        assert_eq!(overlay.layout_guide(), guide);
        assert!(overlay.is_backdrop_attached());
        assert_eq!(overlay.container().opacity(), 1.0);

        let swapped = Rc::new(Cell::new(false));
        let s = Rc::clone(&swapped);
        let handle = overlay.clone();
        overlay.dismiss_with(move || s.set(handle.set_coordinator(SheetCoordinator::default())));
        assert_eq!(overlay.state(), PresentationState::Idle);
        assert!(swapped.get());
        assert!(host.layers().is_empty());
    }

    #[test]
    fn synchronous_driver_runs_chained_requests_in_order() {
        let host = HostView::with_size(Size::new(80, 24));
        let overlay = Overlay::builder(OverlayKind::Sheet, FixedContent::new(Size::new(20, 6)))
            .build(&host, Rc::new(Immediate));
        let (log, push) = log();

        let handle = overlay.clone();
        let dismissed = push("dismissed");
        let shown = push("shown");
        overlay.show_with(move || {
            shown();
            handle.dismiss_with(dismissed);
        });
        assert_eq!(*log.borrow(), ["shown", "dismissed"]);
        assert_eq!(overlay.state(), PresentationState::Idle);
        assert_eq!(overlay.pending_transitions(), 0);
    }

    #[test]
    fn dismiss_pending_tracks_queue_and_flight() {
        let (_host, timeline, overlay) = setup(OverlayKind::Alert);
        overlay.show();
        assert!(!overlay.is_dismiss_pending());
        overlay.dismiss();
        assert!(overlay.is_dismiss_pending());

        timeline.advance(DEFAULT_DURATION);
        assert_eq!(overlay.state(), PresentationState::Dismissing);
        assert!(overlay.is_dismiss_pending());

        timeline.advance(DEFAULT_DURATION);
        assert!(!overlay.is_dismiss_pending());
    }

    #[test]
    fn message_with_defaults_ignores_global_defaults() {
        let defaults = AlertDefaults {
            message_alignment: Alignment::Left,
            action_layout_type: ActionLayoutType::Vertical,
            ..AlertDefaults::default()
        };
        let host = HostView::with_size(Size::new(80, 24));
        let overlay = OverlayBuilder::message_with_defaults(
            OverlayKind::Alert,
            Some("Title"),
            None,
            &MessageAlertOptions::new().corner_radius(4),
            &defaults,
        )
        .build(&host, Rc::new(Timeline::new()));

        let style = overlay
            .with_content(|content: &mut MessageContent| *content.style())
            .unwrap();
        assert_eq!(style.message_alignment, Alignment::Left);
        assert_eq!(style.corner_radius, 4);
        assert_eq!(
            overlay.with_actions(|group| group.layout_type()),
            ActionLayoutType::Vertical
        );
        assert_ne!(AlertDefaults::global(), defaults);
    }
}
