//! Axis scales.
//!
//! The controller never computes pixel positions itself; it asks the x and
//! y [`Scale`] of the chart. [`LinearScale`] is the scale graph charts use by
//! default.

/// Maps data values on one axis to pixels.
pub trait Scale {
    /// Pixel position of `value`. `index` is the data index being mapped.
    fn pixel_for_value(&self, value: f64, index: usize) -> f64;

    /// Pixel position of the axis baseline, where reset-mode geometry starts.
    fn base_pixel(&self) -> f64;

    /// Drop any cached mapping; called whenever the parsed data changes.
    fn invalidate_caches(&mut self) {}
}

/// A linear mapping from a data range onto a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub min: f64,
    pub max: f64,
    /// Pixel position of `min`.
    pub start: f64,
    /// Pixel position of `max`. May be smaller than `start` (y axes).
    pub end: f64,
}

impl LinearScale {
    pub fn new(min: f64, max: f64, start: f64, end: f64) -> Self {
        Self { min, max, start, end }
    }

    /// A scale spanning `values`, falling back to `[-1, 1]` when there are
    /// none.
    pub fn fit<I>(values: I, start: f64, end: f64) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if min > max {
            return Self::new(-1.0, 1.0, start, end);
        }
        Self::new(min, max, start, end)
    }

    /// The value the baseline sits at: zero when it is in range, otherwise
    /// the end of the range closest to zero.
    pub fn base_value(&self) -> f64 {
        if self.min < 0.0 && self.max < 0.0 {
            self.max
        } else if self.min > 0.0 && self.max > 0.0 {
            self.min
        } else {
            0.0
        }
    }
}

impl Scale for LinearScale {
    fn pixel_for_value(&self, value: f64, _index: usize) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            return (self.start + self.end) / 2.0;
        }
        self.start + (value - self.min) / span * (self.end - self.start)
    }

    fn base_pixel(&self) -> f64 {
        self.pixel_for_value(self.base_value(), 0)
    }
}
