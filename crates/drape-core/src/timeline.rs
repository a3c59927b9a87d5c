#![forbid(unsafe_code)]

//! Deterministic, manually-advanced clock driving animations and tasks.
//!
//! [`Timeline`] implements both [`AnimationDriver`] and [`Scheduler`]. Time
//! only moves when the owner calls [`Timeline::advance`], which makes it the
//! reference driver for tests and for hosts that already own a frame loop
//! (call `advance(frame_delta)` once per frame).
//!
//! # Invariants
//!
//! 1. Completions and tasks never run from inside `animate`/`schedule`.
//! 2. Within one `advance`, due work runs in deadline order; ties run in
//!    submission order.
//! 3. No internal borrow is held while completions or tasks run, so they may
//!    submit new work. Work submitted during `advance` is measured from the
//!    deadline of the item that submitted it, and runs within the same call
//!    if it falls due before the end of the advanced interval.
//! 4. A zero-duration animation completes on the next `advance`, even
//!    `advance(Duration::ZERO)`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use web_time::Duration;

use crate::animation::{Animation, AnimationDriver, Completion};
use crate::layer::LayerProps;
use crate::scheduler::{Scheduler, Task, TaskHandle};

struct RunningAnimation {
    animation: Animation,
    from: Vec<LayerProps>,
    started: Duration,
    on_complete: Option<Completion>,
}

struct PendingTask {
    deadline: Duration,
    handle: TaskHandle,
    task: Task,
}

enum Work {
    Animation(RunningAnimation),
    Task(PendingTask),
}

impl Work {
    fn deadline(&self) -> Duration {
        match self {
            Self::Animation(a) => a.started + a.animation.duration,
            Self::Task(t) => t.deadline,
        }
    }
}

#[derive(Default)]
struct TimelineState {
    now: Duration,
    next_seq: u64,
    work: AHashMap<u64, Work>,
    animations_started: u64,
}

/// Manually-advanced clock. Cloning yields another handle to the same clock.
#[derive(Clone, Default)]
pub struct Timeline {
    state: Rc<RefCell<TimelineState>>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed time since creation.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Number of animations currently running.
    pub fn running_animations(&self) -> usize {
        self.state
            .borrow()
            .work
            .values()
            .filter(|w| matches!(w, Work::Animation(_)))
            .count()
    }

    /// Number of tasks waiting for their deadline (cancelled ones excluded).
    pub fn pending_tasks(&self) -> usize {
        self.state
            .borrow()
            .work
            .values()
            .filter(|w| matches!(w, Work::Task(t) if !t.handle.is_cancelled()))
            .count()
    }

    /// Total animations ever submitted.
    pub fn animations_started(&self) -> u64 {
        self.state.borrow().animations_started
    }

    /// Whether nothing is running or waiting.
    pub fn is_idle(&self) -> bool {
        self.running_animations() == 0 && self.pending_tasks() == 0
    }

    /// Move time forward by `delta`, interpolating animations and running
    /// everything that falls due.
    pub fn advance(&self, delta: Duration) {
        let end = self.state.borrow().now + delta;
        loop {
            let Some((seq, deadline)) = self.next_due(end) else {
                break;
            };
            self.state.borrow_mut().now = deadline;
            self.interpolate(deadline);
            let work = self.state.borrow_mut().work.remove(&seq);
            match work {
                Some(Work::Animation(mut running)) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(seq, tracks = running.animation.tracks.len(), "animation finished");
                    if let Some(done) = running.on_complete.take() {
                        done();
                    }
                }
                Some(Work::Task(pending)) => {
                    if !pending.handle.is_cancelled() {
                        pending.handle.mark_finished();
                        (pending.task)();
                    }
                }
                None => {}
            }
        }
        self.state.borrow_mut().now = end;
        self.interpolate(end);
    }

    /// Advance in `step` increments until no animation or task remains.
    ///
    /// Stops after `max_steps` to guard against work that keeps
    /// rescheduling itself.
    pub fn run_until_idle(&self, step: Duration, max_steps: usize) {
        for _ in 0..max_steps {
            if self.is_idle() {
                return;
            }
            self.advance(step);
        }
    }

    fn next_due(&self, end: Duration) -> Option<(u64, Duration)> {
        let state = self.state.borrow();
        state
            .work
            .iter()
            .map(|(seq, work)| (*seq, work.deadline()))
            .filter(|(_, deadline)| *deadline <= end)
            .min_by_key(|(seq, deadline)| (*deadline, *seq))
    }

    fn interpolate(&self, at: Duration) {
        let state = self.state.borrow();
        for work in state.work.values() {
            let Work::Animation(running) = work else {
                continue;
            };
            let elapsed = at.saturating_sub(running.started);
            let progress = if running.animation.duration.is_zero() {
                1.0
            } else {
                (elapsed.as_secs_f64() / running.animation.duration.as_secs_f64()).min(1.0)
            };
            let eased = running.animation.easing.apply(progress);
            for (track, from) in running.animation.tracks.iter().zip(&running.from) {
                track.target.apply_at(&track.layer, from, eased);
            }
        }
    }

    fn push(&self, work: Work) {
        let mut state = self.state.borrow_mut();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.work.insert(seq, work);
    }
}

impl AnimationDriver for Timeline {
    fn animate(&self, animation: Animation, on_complete: Completion) {
        let from = animation.tracks.iter().map(|t| t.layer.props()).collect();
        let started = {
            let mut state = self.state.borrow_mut();
            state.animations_started += 1;
            state.now
        };
        self.push(Work::Animation(RunningAnimation {
            animation,
            from,
            started,
            on_complete: Some(on_complete),
        }));
    }
}

impl Scheduler for Timeline {
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle {
        let handle = TaskHandle::new();
        let deadline = self.now() + delay;
        self.push(Work::Task(PendingTask {
            deadline,
            handle: handle.clone(),
            task,
        }));
        handle
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("now", &self.now())
            .field("running_animations", &self.running_animations())
            .field("pending_tasks", &self.pending_tasks())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{Easing, LayerTarget};
    use crate::layer::Layer;
    use std::cell::Cell;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn animation_interpolates_and_completes_once() {
        let timeline = Timeline::new();
        let layer = Layer::new();
        layer.set_opacity(0.0);
        let done = Rc::new(Cell::new(0));
        let d = Rc::clone(&done);

        timeline.animate(
            Animation::new(ms(100), Easing::Linear).track(&layer, LayerTarget::new().opacity(1.0)),
            Box::new(move || d.set(d.get() + 1)),
        );
        assert_eq!(done.get(), 0, "completion must not run synchronously");

        timeline.advance(ms(50));
        assert!((layer.opacity() - 0.5).abs() < 1e-6);
        assert_eq!(done.get(), 0);

        timeline.advance(ms(60));
        assert_eq!(layer.opacity(), 1.0);
        assert_eq!(done.get(), 1);

        timeline.advance(ms(500));
        assert_eq!(done.get(), 1);
        assert!(timeline.is_idle());
    }

    #[test]
    fn zero_duration_completes_on_next_advance() {
        let timeline = Timeline::new();
        let layer = Layer::new();
        let done = Rc::new(Cell::new(false));
        let d = Rc::clone(&done);
        timeline.animate(
            Animation::new(Duration::ZERO, Easing::EaseOut)
                .track(&layer, LayerTarget::new().scale(2.0)),
            Box::new(move || d.set(true)),
        );
        assert!(!done.get());
        timeline.advance(Duration::ZERO);
        assert!(done.get());
        assert_eq!(layer.scale(), 2.0);
    }

    #[test]
    fn cancelled_task_never_runs() {
        let timeline = Timeline::new();
        let ran = Rc::new(Cell::new(false));
        let r = Rc::clone(&ran);
        let handle = timeline.schedule(ms(100), Box::new(move || r.set(true)));
        handle.cancel();
        timeline.advance(ms(200));
        assert!(!ran.get());
        assert!(!handle.is_finished());
    }

    #[test]
    fn tasks_run_in_deadline_order() {
        let timeline = Timeline::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (name, delay) in [("late", 30), ("early", 10), ("mid", 20), ("mid2", 20)] {
            let l = Rc::clone(&log);
            let _ = timeline.schedule(ms(delay), Box::new(move || l.borrow_mut().push(name)));
        }
        timeline.advance(ms(100));
        assert_eq!(*log.borrow(), vec!["early", "mid", "mid2", "late"]);
    }

    #[test]
    fn work_scheduled_from_a_task_runs_within_the_same_advance() {
        let timeline = Timeline::new();
        let ran_at = Rc::new(Cell::new(None));
        let tl = timeline.clone();
        let r = Rc::clone(&ran_at);
        let _ = timeline.schedule(
            ms(10),
            Box::new(move || {
                let tl2 = tl.clone();
                let r2 = Rc::clone(&r);
                let _ = tl.schedule(ms(10), Box::new(move || r2.set(Some(tl2.now()))));
            }),
        );
        timeline.advance(ms(50));
        assert_eq!(ran_at.get(), Some(ms(20)));
        assert_eq!(timeline.now(), ms(50));
    }

    #[test]
    fn run_until_idle_drains_everything() {
        let timeline = Timeline::new();
        let layer = Layer::new();
        timeline.animate(
            Animation::new(ms(250), Easing::EaseOut).track(&layer, LayerTarget::new().opacity(0.0)),
            Box::new(|| {}),
        );
        let _ = timeline.schedule(ms(900), Box::new(|| {}));
        timeline.run_until_idle(ms(16), 1_000);
        assert!(timeline.is_idle());
        assert_eq!(layer.opacity(), 0.0);
    }
}
