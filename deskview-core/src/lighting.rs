/// The fixed lighting rig: hemisphere fill, shadow-casting spot, point light
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Sky/ground gradient fill light
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HemisphereLight {
    pub intensity: f32,
    /// Linear RGB in 0..1
    pub sky_color: [f32; 3],
    pub ground_color: [f32; 3],
}

impl Default for HemisphereLight {
    fn default() -> Self {
        Self {
            intensity: 0.001,
            sky_color: [1.0, 1.0, 1.0],
            ground_color: [0.0, 0.0, 0.0],
        }
    }
}

impl HemisphereLight {
    pub fn irradiance(&self, normal: &Vector3<f32>) -> f32 {
        let t = 0.5 * (normal.y + 1.0);
        let sky = luminance(self.sky_color);
        let ground = luminance(self.ground_color);
        self.intensity * (ground + (sky - ground) * t)
    }
}

/// Cone light aimed at `target`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    pub position: [f32; 3],
    pub target: [f32; 3],
    /// Half-angle of the outer cone, radians
    pub angle: f32,
    /// Fraction of the cone that fades out, 0..1
    pub penumbra: f32,
    pub intensity: f32,
    pub cast_shadow: bool,
    pub shadow_map_size: u32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            position: [-20.0, 50.0, 10.0],
            target: [0.0, 0.0, 0.0],
            angle: 0.12,
            penumbra: 1.0,
            intensity: 1.0,
            cast_shadow: true,
            shadow_map_size: 1024,
        }
    }
}

impl SpotLight {
    /// Cone attenuation in 0..1 for a world-space point
    pub fn cone_factor(&self, point: &Point3<f32>) -> f32 {
        let position = Point3::from(self.position);
        let axis = match (Point3::from(self.target) - position).try_normalize(f32::EPSILON) {
            Some(axis) => axis,
            None => return 0.0,
        };
        let to_point = match (point - position).try_normalize(f32::EPSILON) {
            Some(dir) => dir,
            None => return 1.0,
        };

        let outer = self.angle.cos();
        let inner = (self.angle * (1.0 - self.penumbra.clamp(0.0, 1.0))).cos();
        smoothstep(outer, inner, axis.dot(&to_point))
    }

    pub fn irradiance(&self, point: &Point3<f32>, normal: &Vector3<f32>) -> f32 {
        let to_light = Point3::from(self.position) - point;
        let lambert = to_light
            .try_normalize(f32::EPSILON)
            .map_or(1.0, |l| normal.dot(&l).max(0.0));
        self.intensity * self.cone_factor(point) * lambert
    }
}

/// Omnidirectional light without distance falloff
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: [f32; 3],
    pub intensity: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            intensity: 1.0,
        }
    }
}

impl PointLight {
    pub fn irradiance(&self, point: &Point3<f32>, normal: &Vector3<f32>) -> f32 {
        let to_light = Point3::from(self.position) - point;
        let lambert = to_light
            .try_normalize(f32::EPSILON)
            .map_or(1.0, |l| normal.dot(&l).max(0.0));
        self.intensity * lambert
    }
}

/// All three lights, independent of layout and scroll state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LightRig {
    pub hemisphere: HemisphereLight,
    pub spot: SpotLight,
    pub point: PointLight,
}

impl LightRig {
    /// Summed Lambert irradiance at a world-space surface point
    pub fn irradiance(&self, point: &Point3<f32>, normal: &Vector3<f32>) -> f32 {
        self.hemisphere.irradiance(normal)
            + self.spot.irradiance(point, normal)
            + self.point.irradiance(point, normal)
    }

    pub fn casts_shadows(&self) -> bool {
        self.spot.cast_shadow
    }
}

fn luminance([r, g, b]: [f32; 3]) -> f32 {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x >= edge0 { 1.0 } else { 0.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
