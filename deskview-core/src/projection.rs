/// Camera, projection and the restricted orbit controls
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

use crate::scroll::{AzimuthRange, CameraAzimuth};

/// Camera parameters as they appear in configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [20.0, 3.0, 5.0],
            fov: 25.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

/// Perspective camera looking at `target`
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            position: Point3::from(config.position),
            target: Point3::origin(),
            up: Vector3::y(),
            fov: config.fov.to_radians(),
            aspect,
            near: config.near,
            far: config.far,
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Map a world point through `mvp` to screen space.
    ///
    /// Returns `(x, y, depth)` with depth in NDC (-1 near, 1 far). Points
    /// behind the camera or past the far plane yield `None`. Points outside
    /// the screen rectangle are kept so the rasterizer can clip partially
    /// visible triangles.
    pub fn project_to_screen(
        mvp: &Matrix4<f32>,
        point: &Point3<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let clip = mvp * point.to_homogeneous();

        // Prevent division by near-zero depth values
        if clip.w < 1e-6 {
            return None;
        }

        let ndc = clip.xyz() / clip.w;
        if !(-1.0..=1.0).contains(&ndc.z) {
            return None;
        }

        let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

        Some((screen_x, screen_y, ndc.z))
    }
}

/// Orbit controls with zoom disabled, a locked polar angle and a clamped azimuth.
///
/// The azimuth follows three.js conventions: 0 looks down -Z from +Z and
/// positive angles swing the camera towards +X.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub enable_zoom: bool,
    radius: f32,
    polar: f32,
    azimuth: f32,
    range: AzimuthRange,
    last_bound: Option<f32>,
}

impl OrbitControls {
    pub fn new(camera: &Camera, range: AzimuthRange) -> Self {
        let offset = camera.position - camera.target;
        Self {
            target: camera.target,
            enable_zoom: false,
            radius: offset.norm(),
            polar: FRAC_PI_2,
            azimuth: range.clamp(offset.x.atan2(offset.z)),
            range,
            last_bound: None,
        }
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn polar(&self) -> f32 {
        self.polar
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Apply the state-bound azimuth if it changed since the last sync.
    ///
    /// A user drag stays in effect until the bound value moves again.
    pub fn sync(&mut self, bound: CameraAzimuth) -> bool {
        let angle = bound.radians();
        if self.last_bound == Some(angle) {
            return false;
        }
        self.last_bound = Some(angle);
        let clamped = self.range.clamp(angle);
        let changed = clamped != self.azimuth;
        self.azimuth = clamped;
        changed
    }

    /// Rotate by a horizontal pointer delta; a full viewport height is one turn
    pub fn drag(&mut self, dx_px: f32, viewport_height_px: f32) -> bool {
        if !(viewport_height_px > 0.0) || !dx_px.is_finite() {
            return false;
        }
        let next = self.range.clamp(self.azimuth - 2.0 * PI * dx_px / viewport_height_px);
        let changed = next != self.azimuth;
        self.azimuth = next;
        changed
    }

    pub fn camera_position(&self) -> Point3<f32> {
        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        self.target
            + Vector3::new(
                self.radius * sin_polar * sin_az,
                self.radius * cos_polar,
                self.radius * sin_polar * cos_az,
            )
    }

    pub fn update(&self, camera: &mut Camera) {
        camera.target = self.target;
        camera.position = self.camera_position();
    }
}
