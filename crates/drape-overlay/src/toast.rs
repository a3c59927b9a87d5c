#![forbid(unsafe_code)]

//! Single active toast with cancel-replace auto-dismiss.
//!
//! A [`ToastPresenter`] owns one slot. `present` while a toast is showing
//! or visible replaces its text in place and re-arms the auto-dismiss timer.
//! A toast that is dismissing, or has a dismiss queued behind its show, is
//! left to finish and a fresh toast overlay is built and shown instead.
//!
//! # Invariants
//!
//! 1. At most one toast is current.
//! 2. The previous timer is cancelled before a replacement is armed, and
//!    text is never written into a toast with a dismiss pending, so a stale
//!    dismiss never tears down updated text.
//! 3. A dismissed toast clears the slot only if it is still the current one.
//! 4. No slot borrow is held while overlay methods run.
//!
//! A thread-local presenter can be installed with
//! [`ToastPresenter::install`] and driven through [`present`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use drape_core::{AnimationDriver, HostView, Scheduler, TaskHandle};
use unicode_segmentation::UnicodeSegmentation;
use web_time::Duration;

use crate::config::{AlertDefaults, MessageAlertOptions};
use crate::content::MessageContent;
use crate::overlay::{Overlay, OverlayBuilder, OverlayKind, PresentationState};

thread_local! {
    static INSTALLED: RefCell<Option<ToastPresenter>> = const { RefCell::new(None) };
}

/// Messages up to this many graphemes stay for the base duration.
const SHORT_MESSAGE_LEN: usize = 7;

/// Display duration for `message`.
///
/// Up to 7 grapheme clusters: 1 s. Longer messages:
/// `1 + log10((len - 7) * 1.13) * 1.25` seconds.
pub fn toast_duration(message: &str) -> Duration {
    let len = message.graphemes(true).count();
    if len <= SHORT_MESSAGE_LEN {
        return Duration::from_secs(1);
    }
    let extra = ((len - SHORT_MESSAGE_LEN) as f64 * 1.13).log10() * 1.25;
    Duration::from_secs_f64(1.0 + extra.max(0.0))
}

struct ActiveToast {
    overlay: Overlay,
    timer: TaskHandle,
}

struct PresenterInner {
    host: HostView,
    driver: Rc<dyn AnimationDriver>,
    scheduler: Rc<dyn Scheduler>,
    options: MessageAlertOptions,
    defaults: AlertDefaults,
    current: RefCell<Option<ActiveToast>>,
    presented: Cell<u64>,
}

impl PresenterInner {
    fn arm(self: &Rc<Self>, overlay: &Overlay, duration: Duration) -> TaskHandle {
        let weak = Rc::downgrade(self);
        let target = overlay.clone();
        tracing::debug!(overlay.id = overlay.id().id(), ?duration, "toast timer armed");
        self.scheduler.schedule(
            duration,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.dismiss(&target);
                }
            }),
        )
    }

    fn dismiss(self: &Rc<Self>, target: &Overlay) {
        let weak: Weak<Self> = Rc::downgrade(self);
        let dismissed = target.clone();
        target.dismiss_with(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut slot = inner.current.borrow_mut();
            if slot
                .as_ref()
                .is_some_and(|active| active.overlay.ptr_eq(&dismissed))
            {
                *slot = None;
                tracing::debug!(overlay.id = dismissed.id().id(), "toast slot cleared");
            }
        });
    }
}

/// Owner of the single active toast.
///
/// Cloning yields another handle to the same presenter.
#[derive(Clone)]
pub struct ToastPresenter {
    inner: Rc<PresenterInner>,
}

impl ToastPresenter {
    pub fn new(
        host: &HostView,
        driver: Rc<dyn AnimationDriver>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        Self::with_options(host, driver, scheduler, MessageAlertOptions::default())
    }

    /// Presenter whose toasts are styled from `options`, falling back to a
    /// snapshot of [`AlertDefaults::global`] taken now.
    pub fn with_options(
        host: &HostView,
        driver: Rc<dyn AnimationDriver>,
        scheduler: Rc<dyn Scheduler>,
        options: MessageAlertOptions,
    ) -> Self {
        Self::with_defaults(host, driver, scheduler, options, AlertDefaults::global())
    }

    /// Presenter whose toasts are styled from `options`, falling back to
    /// `defaults`.
    pub fn with_defaults(
        host: &HostView,
        driver: Rc<dyn AnimationDriver>,
        scheduler: Rc<dyn Scheduler>,
        options: MessageAlertOptions,
        defaults: AlertDefaults,
    ) -> Self {
        Self {
            inner: Rc::new(PresenterInner {
                host: host.clone(),
                driver,
                scheduler,
                options,
                defaults,
                current: RefCell::new(None),
                presented: Cell::new(0),
            }),
        }
    }

    /// Show `message`, or replace the text of the toast already on screen.
    ///
    /// A zero `duration` is computed with [`toast_duration`].
    pub fn present(&self, message: &str, duration: Duration) {
        let duration = if duration.is_zero() {
            toast_duration(message)
        } else {
            duration
        };

        let active = self
            .inner
            .current
            .borrow()
            .as_ref()
            .map(|a| (a.overlay.clone(), a.timer.clone()));

        if let Some((overlay, timer)) = active
            && matches!(
                overlay.state(),
                PresentationState::Showing | PresentationState::Visible
            )
            && !overlay.is_dismiss_pending()
        {
            timer.cancel();
            overlay.with_content(|content: &mut MessageContent| content.set_message(message));
            overlay.layout_if_needed();
            let timer = self.inner.arm(&overlay, duration);
            if let Some(active) = self.inner.current.borrow_mut().as_mut() {
                active.timer = timer;
            }
            tracing::debug!(overlay.id = overlay.id().id(), "toast text replaced");
            return;
        }

        let overlay = OverlayBuilder::message_with_defaults(
            OverlayKind::Toast,
            None,
            Some(message),
            &self.inner.options,
            &self.inner.defaults,
        )
        .build(&self.inner.host, Rc::clone(&self.inner.driver));
        let timer = self.inner.arm(&overlay, duration);
        let previous = self.inner.current.borrow_mut().replace(ActiveToast {
            overlay: overlay.clone(),
            timer,
        });
        if let Some(previous) = previous {
            previous.timer.cancel();
        }
        self.inner.presented.set(self.inner.presented.get() + 1);
        overlay.show();
    }

    /// Cancel the timer and dismiss the current toast now.
    pub fn dismiss_current(&self) {
        let active = self
            .inner
            .current
            .borrow()
            .as_ref()
            .map(|a| (a.overlay.clone(), a.timer.clone()));
        if let Some((overlay, timer)) = active {
            timer.cancel();
            self.inner.dismiss(&overlay);
        }
    }

    /// The current toast, if any.
    pub fn current(&self) -> Option<Overlay> {
        self.inner
            .current
            .borrow()
            .as_ref()
            .map(|a| a.overlay.clone())
    }

    /// Text of the current toast.
    pub fn current_message(&self) -> Option<String> {
        self.current()?
            .with_content(|content: &mut MessageContent| content.message().map(str::to_owned))
            .flatten()
    }

    /// Number of toast overlays built so far.
    pub fn presented_count(&self) -> u64 {
        self.inner.presented.get()
    }

    /// Make this presenter the thread's global one, returning the previous.
    pub fn install(self) -> Option<Self> {
        INSTALLED.with(|slot| slot.borrow_mut().replace(self))
    }

    /// Remove the thread's global presenter.
    pub fn uninstall() -> Option<Self> {
        INSTALLED.with(|slot| slot.borrow_mut().take())
    }

    /// The thread's global presenter, if installed.
    pub fn installed() -> Option<Self> {
        INSTALLED.with(|slot| slot.borrow().clone())
    }
}

impl fmt::Debug for ToastPresenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToastPresenter")
            .field("current", &self.current())
            .field("presented", &self.presented_count())
            .finish()
    }
}

/// Present through the installed presenter. Returns `false` when none is
/// installed.
pub fn present(message: &str, duration: Duration) -> bool {
    let Some(presenter) = ToastPresenter::installed() else {
        tracing::warn!("no toast presenter installed");
        return false;
    };
    presenter.present(message, duration);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::DEFAULT_DURATION;
    use drape_core::{Size, Timeline};

    fn presenter() -> (HostView, Timeline, ToastPresenter) {
        let host = HostView::with_size(Size::new(80, 24));
        let timeline = Timeline::new();
        let presenter = ToastPresenter::new(
            &host,
            Rc::new(timeline.clone()),
            Rc::new(timeline.clone()),
        );
        (host, timeline, presenter)
    }

    #[test]
    fn short_messages_last_one_second() {
        assert_eq!(toast_duration(""), Duration::from_secs(1));
        assert_eq!(toast_duration("1234567"), Duration::from_secs(1));
    }

    #[test]
    fn long_messages_follow_log_curve() {
        let message = "x".repeat(107);
        let expected = 1.0 + (100.0_f64 * 1.13).log10() * 1.25;
        let actual = toast_duration(&message).as_secs_f64();
        assert!((actual - expected).abs() < 1e-6);
        assert!((actual - 3.52).abs() < 0.06);
    }

    #[test]
    fn length_counts_graphemes() {
        // Seven family emoji, each a single grapheme of several scalars.
        let message = "👨‍👩‍👧".repeat(7);
        assert_eq!(toast_duration(&message), Duration::from_secs(1));
    }

    #[test]
    fn toast_is_centered_above_bottom_inset() {
        let (_host, timeline, presenter) = presenter();
        presenter.present("Saved", Duration::from_secs(2));
        timeline.advance(DEFAULT_DURATION);

        let toast = presenter.current().unwrap();
        assert!(toast.is_visible());
        // "Saved" + 2 columns padding per side, 1 row + 1 row padding each way.
        assert_eq!(toast.frame().size(), Size::new(9, 3));
        assert_eq!(toast.frame().bottom(), 22);
        assert_eq!(toast.frame().x, (80 - 9) / 2);
    }

    #[test]
    fn auto_dismiss_clears_slot() {
        let (host, timeline, presenter) = presenter();
        presenter.present("Saved", Duration::ZERO);
        timeline.advance(Duration::from_millis(999));
        assert!(presenter.current().is_some());

        timeline.advance(Duration::from_millis(1));
        timeline.advance(DEFAULT_DURATION);
        assert!(presenter.current().is_none());
        assert!(host.layers().is_empty());
    }

    #[test]
    fn dismiss_current_cancels_timer() {
        let (_host, timeline, presenter) = presenter();
        presenter.present("Saved", Duration::from_secs(5));
        timeline.advance(DEFAULT_DURATION);
        presenter.dismiss_current();
        timeline.advance(DEFAULT_DURATION);
        assert!(presenter.current().is_none());
        assert_eq!(timeline.pending_tasks(), 0);
    }

    #[test]
    fn present_while_dismissing_starts_fresh_toast() {
        let (_host, timeline, presenter) = presenter();
        presenter.present("first", Duration::from_secs(1));
        timeline.advance(Duration::from_secs(1));
        let first = presenter.current().unwrap();
        assert_eq!(first.state(), PresentationState::Dismissing);

        presenter.present("second", Duration::from_secs(1));
        let second = presenter.current().unwrap();
        assert!(!second.ptr_eq(&first));

        timeline.advance(DEFAULT_DURATION);
        assert_eq!(first.state(), PresentationState::Idle);
        assert!(presenter.current().is_some_and(|c| c.ptr_eq(&second)));
        assert_eq!(presenter.presented_count(), 2);
    }

    #[test]
    fn explicit_defaults_win_over_global() {
        let host = HostView::with_size(Size::new(80, 24));
        let timeline = Timeline::new();
        let defaults = AlertDefaults {
            corner_radius: 0,
            ..AlertDefaults::default()
        };
        let presenter = ToastPresenter::with_defaults(
            &host,
            Rc::new(timeline.clone()),
            Rc::new(timeline.clone()),
            MessageAlertOptions::new(),
            defaults,
        );

        let before = AlertDefaults::global();
        AlertDefaults::update_global(|d| d.corner_radius = 5);
        presenter.present("styled", Duration::from_secs(1));
        AlertDefaults::set_global(before);

        let radius = presenter
            .current()
            .and_then(|t| t.with_content(|c: &mut MessageContent| c.style().corner_radius));
        assert_eq!(radius, Some(0));
    }

    #[test]
    fn global_present_requires_installation() {
        let _ = ToastPresenter::uninstall();
        assert!(!present("nobody home", Duration::ZERO));

        let (_host, _timeline, presenter) = presenter();
        assert!(presenter.clone().install().is_none());
        assert!(present("hello", Duration::ZERO));
        assert_eq!(presenter.current_message().as_deref(), Some("hello"));
        let _ = ToastPresenter::uninstall();
    }
}
