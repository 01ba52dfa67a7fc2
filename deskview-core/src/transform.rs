/// Model transforms and the two layout presets
use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Euler rotation in radians, applied in X, Y, Z order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EulerRotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl EulerRotation {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Default for EulerRotation {
    fn default() -> Self {
        Self::zero()
    }
}

/// Scale, position and rotation applied to the loaded model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPreset {
    pub scale: f32,
    pub position: [f32; 3],
    pub rotation: EulerRotation,
}

impl ModelPreset {
    /// Narrow viewports: model shrunk and pulled back
    pub fn compact() -> Self {
        Self {
            scale: 0.13,
            position: [0.0, -3.0, -2.2],
            rotation: EulerRotation::new(0.0, PI / 4.0, 0.0),
        }
    }

    pub fn standard() -> Self {
        Self {
            scale: 0.3,
            position: [-1.25, -1.25, 10.0],
            rotation: EulerRotation::new(-0.01, -0.2, -0.1),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.scale.is_finite() && self.position.iter().all(|c| c.is_finite()) && self.rotation.is_finite()
    }

    /// T * R * S
    pub fn model_matrix(&self) -> Matrix4<f32> {
        let [x, y, z] = self.position;
        Transform::translation_matrix(x, y, z)
            * Transform::rotation_matrix(&self.rotation)
            * Transform::scale_matrix(self.scale, self.scale, self.scale)
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    pub fn rotation_matrix(rotation: &EulerRotation) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(rotation.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, rotation.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, rotation.z));

        rx * ry * rz
    }

    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }
}
