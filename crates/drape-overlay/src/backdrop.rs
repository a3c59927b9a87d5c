#![forbid(unsafe_code)]

//! Dimming surface behind an overlay and its touch-routing policy.
//!
//! The backdrop owns one [`Layer`] that covers the host bounds while
//! attached. Its [`Dimming`] style maps onto the layer fill; its
//! [`Penetration`] scope decides, per touched region, whether a touch is
//! consumed by the overlay (modal) or forwarded to the host underneath.
//!
//! Every operation is idempotent and style changes apply immediately, also
//! while the backdrop is visible.

use bitflags::bitflags;
use drape_core::{Fill, HostView, Layer, PackedRgba, Rect};

/// Visual style of the backdrop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimming {
    /// Tinted color; the alpha channel carries the dimming strength.
    Color(PackedRgba),
    /// Blur the host content underneath.
    Blur { radius: u8 },
    /// No visual effect.
    Clear,
}

impl Default for Dimming {
    fn default() -> Self {
        Self::Color(PackedRgba::rgba(0, 0, 0, 102))
    }
}

impl Dimming {
    /// Tint with `color` scaled to `opacity`.
    pub fn tint(color: PackedRgba, opacity: f32) -> Self {
        Self::Color(color.with_opacity(opacity))
    }

    fn fill(self) -> Fill {
        match self {
            Self::Color(color) => Fill::Color(color),
            Self::Blur { radius } => Fill::Blur { radius },
            Self::Clear => Fill::None,
        }
    }
}

bitflags! {
    /// Regions whose touches pass through to the host.
    ///
    /// `empty()` is fully modal; `all()` lets every touch through.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Penetration: u8 {
        /// Area outside the container.
        const BACKDROP  = 0b01;
        /// The container itself.
        const CONTAINER = 0b10;
    }
}

/// Region of the overlay a touch landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchRegion {
    Backdrop,
    Container,
}

/// Outcome of routing a touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchDisposition {
    /// The overlay handles the touch.
    Consumed,
    /// The touch passes through to the host.
    Forwarded,
}

/// Backdrop configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackdropConfig {
    pub dimming: Dimming,
    pub penetration: Penetration,
    /// Dismiss the overlay when a consumed touch lands on the backdrop.
    pub dismiss_on_tap: bool,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            dimming: Dimming::default(),
            penetration: Penetration::empty(),
            dismiss_on_tap: false,
        }
    }
}

impl BackdropConfig {
    pub fn new(dimming: Dimming, penetration: Penetration) -> Self {
        Self {
            dimming,
            penetration,
            dismiss_on_tap: false,
        }
    }

    pub fn dimming(mut self, dimming: Dimming) -> Self {
        self.dimming = dimming;
        self
    }

    pub fn penetration(mut self, penetration: Penetration) -> Self {
        self.penetration = penetration;
        self
    }

    pub fn dismiss_on_tap(mut self, dismiss: bool) -> Self {
        self.dismiss_on_tap = dismiss;
        self
    }
}

/// Dimming surface owned by one overlay.
#[derive(Debug)]
pub struct Backdrop {
    layer: Layer,
    config: BackdropConfig,
    host: Option<HostView>,
}

impl Backdrop {
    pub fn new(config: BackdropConfig) -> Self {
        let layer = Layer::new();
        layer.set_fill(config.dimming.fill());
        Self {
            layer,
            config,
            host: None,
        }
    }

    #[inline]
    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    #[inline]
    pub fn config(&self) -> BackdropConfig {
        self.config
    }

    pub fn is_attached(&self) -> bool {
        self.host.is_some()
    }

    /// Cover `host` and insert the layer on top of its current layers.
    pub fn attach(&mut self, host: &HostView) {
        if self.host.as_ref().is_some_and(|h| h.ptr_eq(host)) {
            return;
        }
        self.detach();
        self.layer.set_frame(host.bounds());
        host.add_layer(&self.layer);
        self.host = Some(host.clone());
    }

    pub fn detach(&mut self) {
        if let Some(host) = self.host.take() {
            host.remove_layer(&self.layer);
        }
    }

    /// Resize to new host bounds.
    pub fn fit(&self, bounds: Rect) {
        self.layer.set_frame(bounds);
    }

    pub fn dimming(&self) -> Dimming {
        self.config.dimming
    }

    pub fn set_dimming(&mut self, dimming: Dimming) {
        self.config.dimming = dimming;
        self.layer.set_fill(dimming.fill());
    }

    pub fn penetration(&self) -> Penetration {
        self.config.penetration
    }

    pub fn set_penetration(&mut self, penetration: Penetration) {
        self.config.penetration = penetration;
    }

    pub fn dismiss_on_tap(&self) -> bool {
        self.config.dismiss_on_tap
    }

    pub fn set_dismiss_on_tap(&mut self, dismiss: bool) {
        self.config.dismiss_on_tap = dismiss;
    }

    /// Decide whether a touch on `region` is consumed or forwarded.
    pub fn route_touch(&self, region: TouchRegion) -> TouchDisposition {
        let flag = match region {
            TouchRegion::Backdrop => Penetration::BACKDROP,
            TouchRegion::Container => Penetration::CONTAINER,
        };
        if self.config.penetration.contains(flag) {
            TouchDisposition::Forwarded
        } else {
            TouchDisposition::Consumed
        }
    }
}

impl Drop for Backdrop {
    fn drop(&mut self) {
        self.detach();
    }
}
