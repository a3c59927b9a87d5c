#![forbid(unsafe_code)]

//! Host-boundary primitives for Drape.
//!
//! This crate provides:
//! - [`geometry`]: integer points, sizes, insets and rectangles
//! - [`PackedRgba`] colors
//! - [`Observable`] values with RAII [`Subscription`]s
//! - [`Layer`] and [`HostView`] handles the host framework renders
//! - [`Animation`] descriptions and the [`AnimationDriver`] capability
//! - [`Scheduler`] for one-shot deferred tasks with [`TaskHandle`] tokens
//! - [`Timeline`], a deterministic driver + scheduler advanced by hand

pub mod animation;
pub mod color;
pub mod geometry;
pub mod layer;
pub mod reactive;
pub mod scheduler;
pub mod timeline;

pub use animation::{Animation, AnimationDriver, Completion, Easing, LayerTarget, Track};
pub use color::PackedRgba;
pub use geometry::{Insets, Orientation, Point, Rect, Size};
pub use layer::{Fill, HostMetrics, HostView, Layer, LayerId, LayerProps, Offset};
pub use reactive::{Observable, Subscription};
pub use scheduler::{Scheduler, Task, TaskHandle};
pub use timeline::Timeline;
