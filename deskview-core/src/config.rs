/// Scene configuration, loadable from JSON
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::asset::DEFAULT_MODEL_PATH;
use crate::error::{Error, Result};
use crate::layout::Breakpoint;
use crate::lighting::LightRig;
use crate::projection::CameraConfig;
use crate::scroll::AzimuthRange;
use crate::transform::ModelPreset;

/// When the renderer redraws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameLoop {
    /// Every draw call produces a frame
    Always,
    /// Only when render inputs changed or a redraw was requested
    #[default]
    Demand,
    /// Only on explicit invalidation
    Never,
}

/// Drawing-surface settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub frame_loop: FrameLoop,
    pub shadows: bool,
    /// Device-pixel-ratio range, [min, max]
    pub dpr: [f32; 2],
    pub camera: CameraConfig,
    pub preserve_drawing_buffer: bool,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            frame_loop: FrameLoop::Demand,
            shadows: true,
            dpr: [1.0, 2.0],
            camera: CameraConfig::default(),
            preserve_drawing_buffer: true,
        }
    }
}

impl CanvasConfig {
    /// Clamp the device's pixel ratio into the configured range
    pub fn effective_dpr(&self, device_ratio: f64) -> f64 {
        let [a, b] = self.dpr;
        let low = a.min(b) as f64;
        let high = a.max(b) as f64;
        if !(low.is_finite() && low > 0.0) {
            return 1.0;
        }
        if device_ratio.is_finite() {
            device_ratio.max(low).min(high)
        } else {
            low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub breakpoint: Breakpoint,
    pub azimuth: AzimuthRange,
    pub compact: ModelPreset,
    pub standard: ModelPreset,
    pub lights: LightRig,
    pub canvas: CanvasConfig,
    pub model_path: String,
    /// Height of the emulated page in window heights (terminal host)
    pub page_screens: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            breakpoint: Breakpoint::default(),
            azimuth: AzimuthRange::default(),
            compact: ModelPreset::compact(),
            standard: ModelPreset::standard(),
            lights: LightRig::default(),
            canvas: CanvasConfig::default(),
            model_path: DEFAULT_MODEL_PATH.to_string(),
            page_screens: 4.0,
        }
    }
}

impl SceneConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: SceneConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        log::info!("loaded scene config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let az = &self.azimuth;
        if ![az.span, az.offset, az.min, az.max].iter().all(|v| v.is_finite()) {
            return invalid("azimuth values must be finite");
        }
        if az.min > az.max {
            return invalid(format!("azimuth min {} exceeds max {}", az.min, az.max));
        }
        if az.span < 0.0 {
            return invalid("azimuth span must not be negative");
        }

        let camera = &self.canvas.camera;
        if !(camera.fov > 0.0 && camera.fov < 180.0) {
            return invalid(format!("camera fov {} outside (0, 180)", camera.fov));
        }
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return invalid("camera clip planes must satisfy 0 < near < far");
        }
        if !camera.position.iter().all(|c| c.is_finite()) {
            return invalid("camera position must be finite");
        }

        let [dpr_min, dpr_max] = self.canvas.dpr;
        if !(dpr_min > 0.0 && dpr_min <= dpr_max) {
            return invalid(format!("dpr range [{}, {}] is empty", dpr_min, dpr_max));
        }

        if !self.compact.is_finite() || !self.standard.is_finite() {
            return invalid("layout presets must be finite");
        }
        if self.breakpoint.max_width_px == 0 {
            return invalid("breakpoint width must be positive");
        }
        if !(self.page_screens >= 1.0) {
            return invalid("page_screens must be at least 1");
        }
        Ok(())
    }
}

fn invalid<T>(message: impl Into<String>) -> Result<T> {
    Err(Error::InvalidConfig(message.into()))
}
