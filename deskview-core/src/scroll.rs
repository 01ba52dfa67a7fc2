/// Scroll progress and the camera azimuth derived from it
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Raw page measurements read on each scroll event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_y: f64,
    pub document_height: f64,
    pub window_height: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_y: f64, document_height: f64, window_height: f64) -> Self {
        Self {
            scroll_y,
            document_height,
            window_height,
        }
    }

    /// Largest offset the page can scroll to
    pub fn max_scroll(&self) -> f64 {
        (self.document_height - self.window_height).max(0.0)
    }
}

/// How far through the page the user has scrolled, always in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct ScrollProgress(f32);

impl ScrollProgress {
    pub const START: Self = Self(0.0);
    pub const END: Self = Self(1.0);

    /// Clamp an arbitrary value into [0, 1]; NaN becomes 0
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            Self::START
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// A page no taller than its window has nowhere to scroll, so progress is 0
    pub fn from_metrics(metrics: &ScrollMetrics) -> Self {
        let scrollable = metrics.document_height - metrics.window_height;
        if !(scrollable > 0.0) {
            return Self::START;
        }

        let ratio = metrics.scroll_y / scrollable;
        if ratio.is_nan() {
            return Self::START;
        }

        Self(ratio.clamp(0.0, 1.0) as f32)
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

/// Linear map from scroll progress to azimuth, plus the band it is clamped into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AzimuthRange {
    /// Radians swept between progress 0 and progress 1
    pub span: f32,
    /// Subtracted after scaling by `span`
    pub offset: f32,
    pub min: f32,
    pub max: f32,
}

impl Default for AzimuthRange {
    fn default() -> Self {
        Self {
            span: PI / 4.0,
            offset: PI / 18.0,
            min: -PI / 18.0,
            max: PI / 4.0,
        }
    }
}

impl AzimuthRange {
    /// Clamp into the band; reversed bounds are swapped and a NaN bound is ignored
    pub fn clamp(&self, angle: f32) -> f32 {
        let low = self.min.min(self.max);
        let high = self.max.max(self.min);
        angle.max(low).min(high)
    }

    pub fn contains(&self, angle: f32) -> bool {
        angle >= self.min && angle <= self.max
    }
}

/// Horizontal orbit angle of the camera, in radians
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct CameraAzimuth(f32);

impl CameraAzimuth {
    /// The value at mount, before any scroll event arrives
    pub fn initial(range: &AzimuthRange) -> Self {
        Self(range.min)
    }

    pub fn from_progress(progress: ScrollProgress, range: &AzimuthRange) -> Self {
        let angle = range.span * progress.value() - range.offset;
        Self(range.clamp(angle))
    }

    /// An arbitrary angle, clamped into the band
    pub fn from_radians(angle: f32, range: &AzimuthRange) -> Self {
        Self(range.clamp(angle))
    }

    pub fn from_metrics(metrics: &ScrollMetrics, range: &AzimuthRange) -> Self {
        Self::from_progress(ScrollProgress::from_metrics(metrics), range)
    }

    pub fn radians(self) -> f32 {
        self.0
    }
}
