//! Host metric changes: one layout pass and one action reflow per change,
//! and the frames each coordinator resolves afterwards.

#![forbid(unsafe_code)]

use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use drape_core::{HostView, Insets, Orientation, Rect, Size, Timeline};
use drape_overlay::{
    Action, ActionAxis, ActionStyle, DEFAULT_DURATION, FixedContent, LayoutGuide, Overlay,
    OverlayKind,
};
use tracing::Subscriber;
use tracing::span::{Attributes, Id};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

/// Counts `overlay_layout` spans.
#[derive(Clone, Default)]
struct LayoutSpans(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for LayoutSpans {
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _cx: Context<'_, S>) {
        if attrs.metadata().name() == "overlay_layout" {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }
}

fn visible(kind: OverlayKind, with_actions: bool) -> (HostView, Timeline, Overlay) {
    let host = HostView::with_size(Size::new(80, 24));
    let timeline = Timeline::new();
    let overlay = Overlay::builder(kind, FixedContent::new(Size::new(20, 6)))
        .build(&host, Rc::new(timeline.clone()));
    if with_actions {
        overlay.add_action(Action::cancel("Cancel")).unwrap();
        overlay
            .add_action(Action::new("Confirm", ActionStyle::Default))
            .unwrap();
    }
    overlay.show();
    timeline.advance(DEFAULT_DURATION);
    (host, timeline, overlay)
}

fn counts(overlay: &Overlay) -> (u64, u64) {
    let reflows = overlay.with_actions(|group| group.reflow_count());
    (overlay.layout_pass_count(), reflows)
}

#[test]
fn each_metric_change_is_one_pass_and_one_reflow() {
    let (host, _timeline, overlay) = visible(OverlayKind::Alert, true);
    let (passes, reflows) = counts(&overlay);

    host.rotate();
    assert_eq!(counts(&overlay), (passes + 1, reflows + 1));

    host.resize(Rect::new(0, 0, 100, 30));
    assert_eq!(counts(&overlay), (passes + 2, reflows + 2));

    host.set_safe_area(Insets::bottom(1));
    assert_eq!(counts(&overlay), (passes + 3, reflows + 3));

    host.resize(Rect::new(0, 0, 100, 30));
    assert_eq!(counts(&overlay), (passes + 3, reflows + 3));
}

#[test]
fn rotation_switches_action_axis() {
    let (host, _timeline, overlay) = visible(OverlayKind::Alert, true);
    // Buttons: [ Cancel ] + [ Confirm ] + spacing = 22 columns.
    assert_eq!(overlay.frame(), Rect::new(29, 8, 22, 7));
    assert_eq!(overlay.with_actions(|g| g.axis()), ActionAxis::Horizontal);

    host.rotate();
    // 80% of 24 columns leaves 19: the buttons stack.
    assert_eq!(overlay.with_actions(|g| g.axis()), ActionAxis::Vertical);
    assert_eq!(
        overlay.with_actions(|g| g.last_reflow()),
        Some((19, Orientation::Portrait))
    );
    assert_eq!(overlay.frame(), Rect::new(2, 36, 19, 8));
}

#[test]
fn sheet_stays_anchored_to_the_bottom() {
    let (host, _timeline, overlay) = visible(OverlayKind::Sheet, false);
    assert_eq!(overlay.frame(), Rect::new(0, 18, 80, 6));

    host.rotate();
    assert_eq!(overlay.frame(), Rect::new(0, 74, 24, 6));

    host.set_safe_area(Insets::bottom(2));
    assert_eq!(overlay.frame(), Rect::new(0, 72, 24, 6));
}

#[test]
fn layout_guide_change_applies_on_next_pass() {
    let (_host, _timeline, overlay) = visible(OverlayKind::Sheet, false);
    overlay.set_layout_guide(LayoutGuide::new().width(40).insets(Insets::bottom(3)));
    assert!(overlay.needs_layout());
    assert_eq!(overlay.frame(), Rect::new(0, 18, 80, 6));

    assert!(overlay.layout_if_needed());
    assert_eq!(overlay.frame(), Rect::new(20, 15, 40, 6));
}

#[test]
fn toast_reflows_without_an_action_group() {
    let (host, _timeline, overlay) = visible(OverlayKind::Toast, false);
    let (passes, reflows) = counts(&overlay);
    assert_eq!(reflows, 0);

    host.rotate();
    assert_eq!(counts(&overlay), (passes + 1, 0));
    assert_eq!(overlay.frame(), Rect::new(2, 72, 20, 6));
}

#[test]
fn each_pass_opens_one_layout_span() {
    let spans = LayoutSpans::default();
    let count = Arc::clone(&spans.0);
    let subscriber = tracing_subscriber::registry().with(spans);

    tracing::subscriber::with_default(subscriber, || {
        let (host, _timeline, overlay) = visible(OverlayKind::Alert, true);
        assert_eq!(count.load(Ordering::Relaxed), 1);

        host.rotate();
        host.rotate();
        assert_eq!(count.load(Ordering::Relaxed), 3);
        assert_eq!(overlay.layout_pass_count(), 3);
    });
}
