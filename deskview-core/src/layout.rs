/// Breakpoint and layout mode derivation
use serde::{Deserialize, Serialize};

/// Viewport-width threshold separating compact from standard layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Inclusive upper bound of the compact range, in CSS pixels
    pub max_width_px: u32,
}

impl Breakpoint {
    pub fn new(max_width_px: u32) -> Self {
        Self { max_width_px }
    }

    /// The media query a browser host subscribes to
    pub fn media_query(&self) -> String {
        format!("(max-width: {}px)", self.max_width_px)
    }

    /// Evaluate the query against a known viewport width
    pub fn matches(&self, width_px: f64) -> bool {
        width_px <= self.max_width_px as f64
    }
}

impl Default for Breakpoint {
    fn default() -> Self {
        Self::new(500)
    }
}

/// Which preset the scene renderer applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayoutMode {
    Compact,
    #[default]
    Standard,
}

impl LayoutMode {
    /// Map a breakpoint match to a layout
    pub fn from_matches(matches: bool) -> Self {
        if matches {
            LayoutMode::Compact
        } else {
            LayoutMode::Standard
        }
    }

    pub fn is_compact(self) -> bool {
        self == LayoutMode::Compact
    }
}
