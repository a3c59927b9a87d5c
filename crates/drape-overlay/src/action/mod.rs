#![forbid(unsafe_code)]

//! Actions (buttons) and the views bound to them.
//!
//! An [`Action`] is a shared handle; identity is the instance. Its enabled
//! flag is an [`Observable`], and every [`ActionView`] is a projection that
//! stays subscribed to it for as long as the view lives.
//!
//! # Invariants
//!
//! - `action.is_enabled() == view.is_enabled()` after every mutation, with
//!   no explicit sync step.
//! - Toggling the flag to its current value notifies nobody.

mod group;

pub use group::{ActionAxis, ActionGroup, ActionRejected};

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use drape_core::{Observable, Subscription};
use unicode_width::UnicodeWidthStr;

use crate::config::ActionViewType;

/// Global counter for unique action IDs.
static ACTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(u64);

impl ActionId {
    fn next() -> Self {
        Self(ACTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Visual and semantic role of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum ActionStyle {
    #[default]
    Default,
    Destructive,
    /// At most one per group; always laid out last.
    Cancel,
}

type Handler = Rc<dyn Fn()>;

struct ActionInner {
    id: ActionId,
    title: Option<String>,
    style: ActionStyle,
    enabled: Observable<bool>,
    handler: RefCell<Option<Handler>>,
}

/// Shared action handle. Clones refer to the same action.
#[derive(Clone)]
pub struct Action {
    inner: Rc<ActionInner>,
}

impl Action {
    /// Create an enabled action.
    pub fn new(title: impl Into<String>, style: ActionStyle) -> Self {
        Self::build(Some(title.into()), style)
    }

    /// Create an action without a title.
    pub fn untitled(style: ActionStyle) -> Self {
        Self::build(None, style)
    }

    /// Shorthand for a [`ActionStyle::Cancel`] action.
    pub fn cancel(title: impl Into<String>) -> Self {
        Self::new(title, ActionStyle::Cancel)
    }

    /// Shorthand for a [`ActionStyle::Destructive`] action.
    pub fn destructive(title: impl Into<String>) -> Self {
        Self::new(title, ActionStyle::Destructive)
    }

    fn build(title: Option<String>, style: ActionStyle) -> Self {
        Self {
            inner: Rc::new(ActionInner {
                id: ActionId::next(),
                title,
                style,
                enabled: Observable::new(true),
                handler: RefCell::new(None),
            }),
        }
    }

    /// Set the callback run when the action is performed.
    #[must_use]
    pub fn with_handler(self, handler: impl Fn() + 'static) -> Self {
        *self.inner.handler.borrow_mut() = Some(Rc::new(handler));
        self
    }

    #[inline]
    pub fn id(&self) -> ActionId {
        self.inner.id
    }

    pub fn title(&self) -> Option<&str> {
        self.inner.title.as_deref()
    }

    #[inline]
    pub fn style(&self) -> ActionStyle {
        self.inner.style
    }

    #[inline]
    pub fn is_cancel(&self) -> bool {
        self.inner.style == ActionStyle::Cancel
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.get()
    }

    /// Enable or disable the action. Bound views update synchronously.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.set(enabled);
    }

    /// Run the handler if the action is enabled. Returns whether it ran.
    pub fn trigger(&self) -> bool {
        if !self.is_enabled() {
            return false;
        }
        // Clone out so the handler may replace itself.
        let handler = self.inner.handler.borrow().clone();
        if let Some(handler) = handler {
            handler();
        }
        true
    }

    /// Identity comparison.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn subscribe_enabled(&self, callback: impl Fn(&bool) + 'static) -> Subscription {
        self.inner.enabled.subscribe(callback)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.inner.id.0)
            .field("title", &self.inner.title)
            .field("style", &self.inner.style)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Content view bound to one action.
///
/// Created by the owning [`ActionGroup`]; holds a subscription to the
/// action's enabled flag.
pub struct ActionView {
    action_id: ActionId,
    title: Option<String>,
    style: ActionStyle,
    view_type: ActionViewType,
    enabled: Rc<Cell<bool>>,
    _subscription: Subscription,
}

impl ActionView {
    /// Bind a view to `action`. `on_change` runs after every enabled toggle.
    fn bind(action: &Action, view_type: ActionViewType, on_change: impl Fn() + 'static) -> Self {
        let enabled = Rc::new(Cell::new(action.is_enabled()));
        let cell = Rc::clone(&enabled);
        let subscription = action.subscribe_enabled(move |value| {
            cell.set(*value);
            on_change();
        });
        Self {
            action_id: action.id(),
            title: action.title().map(str::to_owned),
            style: action.style(),
            view_type,
            enabled,
            _subscription: subscription,
        }
    }

    #[inline]
    pub fn action_id(&self) -> ActionId {
        self.action_id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[inline]
    pub fn style(&self) -> ActionStyle {
        self.style
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Display width in cells, including the view's chrome.
    pub fn width(&self) -> i32 {
        let label = self.title.as_deref().map_or(0, UnicodeWidthStr::width);
        i32::try_from(label)
            .unwrap_or(i32::MAX)
            .saturating_add(self.view_type.chrome_width())
    }
}

impl fmt::Debug for ActionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionView")
            .field("action_id", &self.action_id.0)
            .field("title", &self.title)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
