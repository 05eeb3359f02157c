//! Drawing primitives the host provides.

use crate::element::ResolvedOptions;

/// A pixel-space point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The plotting area of the chart, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChartArea {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl ChartArea {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self { left, top, right, bottom }
    }
}

/// The canvas the elements draw on.
///
/// Styling is carried by the element's resolved options; the context decides
/// which option names it understands.
pub trait DrawContext {
    /// Restrict drawing to `area` until [`unclip`](Self::unclip).
    fn clip(&mut self, area: &ChartArea);

    /// Lift the last clip.
    fn unclip(&mut self);

    /// Stroke an open polyline.
    fn polyline(&mut self, points: &[PixelPoint], options: &ResolvedOptions);

    /// Fill a closed polygon.
    fn polygon(&mut self, points: &[PixelPoint], options: &ResolvedOptions);

    /// Draw a point marker of the given radius.
    fn point(&mut self, center: PixelPoint, radius: f64, options: &ResolvedOptions);
}
