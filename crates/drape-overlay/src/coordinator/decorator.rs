#![forbid(unsafe_code)]

//! Coordinator wrapper that re-flows layout participants.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use drape_core::{Completion, Orientation};

use super::TransitionCoordinator;
use crate::animator::TransitionContext;
use crate::layout::{LayoutContext, LayoutGuide, ResolvedLayout};

/// Something whose internal arrangement depends on the container width.
pub trait LayoutParticipant {
    /// Re-arrange for a container of `width` in `orientation`.
    fn reflow(&mut self, width: i32, orientation: Orientation);
}

type Participant = Weak<RefCell<dyn LayoutParticipant>>;

/// Forwards everything to the wrapped coordinator and, after each `update`,
/// notifies every live participant with the resolved width and orientation.
///
/// Participants are held weakly; dropped ones are pruned on the next update.
pub struct CoordinatorDecorator {
    inner: Box<dyn TransitionCoordinator>,
    participants: Vec<Participant>,
}

impl CoordinatorDecorator {
    pub fn new(inner: Box<dyn TransitionCoordinator>) -> Self {
        Self {
            inner,
            participants: Vec::new(),
        }
    }

    /// Register a participant. Registering the same one twice is a no-op.
    pub fn add_participant(&mut self, participant: &Rc<RefCell<dyn LayoutParticipant>>) {
        let weak = Rc::downgrade(participant);
        if !self.participants.iter().any(|p| p.ptr_eq(&weak)) {
            self.participants.push(weak);
        }
    }

    /// Number of participants still alive.
    pub fn participant_count(&self) -> usize {
        self.participants
            .iter()
            .filter(|p| p.strong_count() > 0)
            .count()
    }

    pub fn inner(&self) -> &dyn TransitionCoordinator {
        self.inner.as_ref()
    }

    pub fn into_inner(self) -> Box<dyn TransitionCoordinator> {
        self.inner
    }
}

impl TransitionCoordinator for CoordinatorDecorator {
    fn layout_guide(&self) -> LayoutGuide {
        self.inner.layout_guide()
    }

    fn set_layout_guide(&mut self, guide: LayoutGuide) {
        self.inner.set_layout_guide(guide);
    }

    fn update(&mut self, cx: &LayoutContext<'_>) -> ResolvedLayout {
        let resolved = self.inner.update(cx);
        self.participants.retain(|p| p.strong_count() > 0);
        for participant in &self.participants {
            if let Some(participant) = participant.upgrade() {
                participant
                    .borrow_mut()
                    .reflow(resolved.frame.width, resolved.orientation);
            }
        }
        tracing::trace!(
            width = resolved.frame.width,
            orientation = ?resolved.orientation,
            participants = self.participants.len(),
            "reflowed participants"
        );
        resolved
    }

    fn resolved(&self) -> Option<ResolvedLayout> {
        self.inner.resolved()
    }

    fn show(&self, cx: &TransitionContext<'_>, on_complete: Completion) {
        self.inner.show(cx, on_complete);
    }

    fn dismiss(&self, cx: &TransitionContext<'_>, on_complete: Completion) {
        self.inner.dismiss(cx, on_complete);
    }
}
