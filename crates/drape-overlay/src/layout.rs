#![forbid(unsafe_code)]

//! Declarative overlay geometry and the inputs a coordinator resolves it from.

use drape_core::{HostMetrics, Insets, Orientation, Rect, Size};

/// Insets, safe-area participation and optional fixed width.
///
/// A plain value: coordinators copy it, so later edits to a guide the caller
/// still holds have no effect until it is assigned again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutGuide {
    /// Margins from the host edges. Negative values overscan.
    pub insets: Insets,
    /// Whether the host's bottom safe-area inset shrinks the available
    /// region. Top and side safe-area insets are left to `insets`.
    pub respects_safe_area: bool,
    /// Fixed container width; `None` lets the coordinator decide.
    pub width: Option<i32>,
}

impl Default for LayoutGuide {
    fn default() -> Self {
        Self {
            insets: Insets::ZERO,
            respects_safe_area: true,
            width: None,
        }
    }
}

impl LayoutGuide {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insets(mut self, insets: Insets) -> Self {
        self.insets = insets;
        self
    }

    pub fn respects_safe_area(mut self, respects: bool) -> Self {
        self.respects_safe_area = respects;
        self
    }

    pub fn width(mut self, width: i32) -> Self {
        self.width = Some(width.max(0));
        self
    }

    /// Region of `metrics.bounds` left after insets and, when enabled, the
    /// bottom safe-area inset.
    pub fn available(&self, metrics: &HostMetrics) -> Rect {
        let region = metrics.bounds.inset_by(self.insets);
        if self.respects_safe_area {
            region.inset_by(Insets::bottom(metrics.safe_area.bottom))
        } else {
            region
        }
    }
}

/// Input to a layout pass.
pub struct LayoutContext<'a> {
    pub metrics: HostMetrics,
    /// Natural size of the container content bounded by the proposed size.
    pub measure: &'a dyn Fn(Size) -> Size,
}

impl<'a> LayoutContext<'a> {
    pub fn new(metrics: HostMetrics, measure: &'a dyn Fn(Size) -> Size) -> Self {
        Self { metrics, measure }
    }

    #[inline]
    pub fn measure(&self, proposed: Size) -> Size {
        (self.measure)(proposed)
    }
}

/// Output of a layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLayout {
    pub frame: Rect,
    pub orientation: Orientation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_region_honors_safe_area_flag() {
        let metrics = HostMetrics::new(Rect::new(0, 0, 80, 24)).safe_area(Insets::bottom(2));
        let guide = LayoutGuide::new().insets(Insets::uniform(1));
        assert_eq!(guide.available(&metrics), Rect::new(1, 1, 78, 20));

        let guide = guide.respects_safe_area(false);
        assert_eq!(guide.available(&metrics), Rect::new(1, 1, 78, 22));
    }

    #[test]
    fn only_bottom_safe_area_participates() {
        let metrics = HostMetrics::new(Rect::new(0, 0, 80, 24)).safe_area(Insets::new(3, 2, 1, 2));
        let guide = LayoutGuide::new();
        assert_eq!(guide.available(&metrics), Rect::new(0, 0, 80, 23));

        let guide = guide.respects_safe_area(false);
        assert_eq!(guide.available(&metrics), Rect::new(0, 0, 80, 24));
    }

    #[test]
    fn negative_insets_overscan() {
        let metrics = HostMetrics::new(Rect::new(0, 0, 10, 10));
        let guide = LayoutGuide::new().insets(Insets::new(0, -2, 0, -2));
        assert_eq!(guide.available(&metrics), Rect::new(-2, 0, 14, 10));
    }
}
