#![forbid(unsafe_code)]

//! Layer handles and the host view they are attached to.
//!
//! A [`Layer`] is the engine's handle to a visual surface owned by the host
//! framework. The engine only mutates layer properties (frame, opacity,
//! scale, offset, fill); the host reads them when it renders.
//!
//! A [`HostView`] is the host's root surface. It publishes its metrics
//! (bounds, safe-area insets, orientation) as an [`Observable`] so overlays
//! can re-layout on rotation or resize, and keeps the z-ordered list of
//! attached layers.
//!
//! # Invariants
//!
//! - Layer handles compare by identity, never by property values.
//! - A layer appears at most once in a host's layer list; attaching twice is
//!   a no-op.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::color::PackedRgba;
use crate::geometry::{Insets, Orientation, Point, Rect, Size};
use crate::reactive::{Observable, Subscription};

/// Global counter for unique layer IDs.
static LAYER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(u64);

impl LayerId {
    fn next() -> Self {
        Self(LAYER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Translation applied on top of a layer's frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub dx: f32,
    pub dy: f32,
}

impl Offset {
    pub const ZERO: Self = Self { dx: 0.0, dy: 0.0 };

    #[inline]
    pub const fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }
}

/// How a layer's background is painted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Fill {
    #[default]
    None,
    Color(PackedRgba),
    Blur {
        radius: u8,
    },
}

/// Snapshot of a layer's visual properties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerProps {
    pub frame: Rect,
    pub opacity: f32,
    pub scale: f32,
    pub offset: Offset,
    pub fill: Fill,
}

impl Default for LayerProps {
    fn default() -> Self {
        Self {
            frame: Rect::ZERO,
            opacity: 1.0,
            scale: 1.0,
            offset: Offset::ZERO,
            fill: Fill::None,
        }
    }
}

/// Shared handle to a host-rendered surface.
#[derive(Clone)]
pub struct Layer {
    id: LayerId,
    props: Rc<RefCell<LayerProps>>,
}

impl Layer {
    /// Create a layer with default properties (identity transform, opaque).
    pub fn new() -> Self {
        Self {
            id: LayerId::next(),
            props: Rc::new(RefCell::new(LayerProps::default())),
        }
    }

    #[inline]
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Copy out the current properties.
    #[must_use]
    pub fn props(&self) -> LayerProps {
        *self.props.borrow()
    }

    pub fn frame(&self) -> Rect {
        self.props.borrow().frame
    }

    pub fn set_frame(&self, frame: Rect) {
        self.props.borrow_mut().frame = frame;
    }

    pub fn opacity(&self) -> f32 {
        self.props.borrow().opacity
    }

    pub fn set_opacity(&self, opacity: f32) {
        self.props.borrow_mut().opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn scale(&self) -> f32 {
        self.props.borrow().scale
    }

    pub fn set_scale(&self, scale: f32) {
        self.props.borrow_mut().scale = scale;
    }

    pub fn offset(&self) -> Offset {
        self.props.borrow().offset
    }

    pub fn set_offset(&self, offset: Offset) {
        self.props.borrow_mut().offset = offset;
    }

    pub fn fill(&self) -> Fill {
        self.props.borrow().fill
    }

    pub fn set_fill(&self, fill: Fill) {
        self.props.borrow_mut().fill = fill;
    }

    /// Reset scale and offset to identity.
    pub fn reset_transform(&self) {
        let mut props = self.props.borrow_mut();
        props.scale = 1.0;
        props.offset = Offset::ZERO;
    }

    /// Identity comparison.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.props, &other.props)
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("id", &self.id.0)
            .field("props", &*self.props.borrow())
            .finish()
    }
}

/// Geometry the host reports to overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostMetrics {
    /// Host bounds in host coordinates.
    pub bounds: Rect,
    /// System insets (notches, home indicators, status lines).
    pub safe_area: Insets,
    pub orientation: Orientation,
}

impl HostMetrics {
    /// Metrics for `bounds` with no safe-area insets and a derived orientation.
    #[must_use]
    pub const fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            safe_area: Insets::ZERO,
            orientation: Orientation::from_size(bounds.size()),
        }
    }

    #[must_use]
    pub const fn safe_area(mut self, insets: Insets) -> Self {
        self.safe_area = insets;
        self
    }

    #[must_use]
    pub const fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }
}

struct HostInner {
    metrics: Observable<HostMetrics>,
    layers: RefCell<Vec<Layer>>,
}

/// The host's root surface.
///
/// Cloning yields another handle to the same host.
#[derive(Clone)]
pub struct HostView {
    inner: Rc<HostInner>,
}

impl HostView {
    pub fn new(metrics: HostMetrics) -> Self {
        Self {
            inner: Rc::new(HostInner {
                metrics: Observable::new(metrics),
                layers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Host of the given size at the origin.
    pub fn with_size(size: Size) -> Self {
        Self::new(HostMetrics::new(Rect::from_size(size)))
    }

    #[must_use]
    pub fn metrics(&self) -> HostMetrics {
        self.inner.metrics.get()
    }

    pub fn bounds(&self) -> Rect {
        self.metrics().bounds
    }

    /// Publish new metrics. Equal metrics produce no notification.
    pub fn set_metrics(&self, metrics: HostMetrics) {
        self.inner.metrics.set(metrics);
    }

    /// Resize the host, deriving orientation from the new bounds.
    pub fn resize(&self, bounds: Rect) {
        let safe_area = self.metrics().safe_area;
        self.set_metrics(HostMetrics::new(bounds).safe_area(safe_area));
    }

    /// Rotate the host: swaps width/height and flips orientation.
    pub fn rotate(&self) {
        let current = self.metrics();
        let bounds = Rect::new(
            current.bounds.x,
            current.bounds.y,
            current.bounds.height,
            current.bounds.width,
        );
        let orientation = match current.orientation {
            Orientation::Portrait => Orientation::Landscape,
            Orientation::Landscape => Orientation::Portrait,
        };
        self.set_metrics(
            HostMetrics::new(bounds)
                .safe_area(current.safe_area)
                .orientation(orientation),
        );
    }

    pub fn set_safe_area(&self, insets: Insets) {
        self.inner.metrics.update(|m| m.safe_area = insets);
    }

    /// Observe metric changes (rotation, resize, safe-area).
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn observe(&self, callback: impl Fn(&HostMetrics) + 'static) -> Subscription {
        self.inner.metrics.subscribe(callback)
    }

    /// Attach a layer on top of the existing ones. Idempotent.
    pub fn add_layer(&self, layer: &Layer) {
        let mut layers = self.inner.layers.borrow_mut();
        if !layers.iter().any(|l| l.ptr_eq(layer)) {
            layers.push(layer.clone());
        }
    }

    /// Detach a layer. Idempotent.
    pub fn remove_layer(&self, layer: &Layer) {
        self.inner
            .layers
            .borrow_mut()
            .retain(|l| !l.ptr_eq(layer));
    }

    pub fn contains_layer(&self, layer: &Layer) -> bool {
        self.inner.layers.borrow().iter().any(|l| l.ptr_eq(layer))
    }

    /// Attached layers, bottom to top.
    #[must_use]
    pub fn layers(&self) -> Vec<Layer> {
        self.inner.layers.borrow().clone()
    }

    /// Topmost attached layer whose frame contains `point`.
    pub fn hit_test(&self, point: Point) -> Option<Layer> {
        self.inner
            .layers
            .borrow()
            .iter()
            .rev()
            .find(|l| l.frame().contains(point))
            .cloned()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for HostView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostView")
            .field("metrics", &self.metrics())
            .field("layers", &self.inner.layers.borrow().len())
            .finish()
    }
}
