/// Geometry primitives for the loaded scene
use nalgebra::{Matrix4, Point3, Vector3};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }

    pub fn from_parts(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Face normal from the counter-clockwise winding; degenerate faces get +Y
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let [v0, v1, v2] = self.vertices.map(|v| v.position);
        (v1 - v0)
            .cross(&(v2 - v0))
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::y)
    }

    pub fn centroid(&self) -> Point3<f32> {
        let [a, b, c] = self.vertices.map(|v| v.position.coords);
        Point3::from((a + b + c) / 3.0)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Bounds {
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn extend(&mut self, other: Mesh) {
        self.triangles.extend(other.triangles);
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self
            .triangles
            .iter()
            .flat_map(|t| t.vertices.iter().map(|v| v.position));
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| {
            (min.inf(&p), max.sup(&p))
        });
        Some(Bounds { min, max })
    }

    /// Apply an affine transform; normals use the inverse transpose
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Mesh {
        let normal_matrix = matrix
            .fixed_view::<3, 3>(0, 0)
            .into_owned()
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or_else(nalgebra::Matrix3::identity);

        let triangles = self
            .triangles
            .iter()
            .map(|t| {
                let vertices = t.vertices.map(|v| {
                    let normal = (normal_matrix * v.normal)
                        .try_normalize(f32::EPSILON)
                        .unwrap_or(v.normal);
                    Vertex::from_parts(matrix.transform_point(&v.position), normal)
                });
                Triangle { vertices }
            })
            .collect();

        Mesh { triangles }
    }

    /// Axis-aligned box centred on `center`
    pub fn cuboid(center: Point3<f32>, size: Vector3<f32>) -> Self {
        let h = size / 2.0;
        let (cx, cy, cz) = (center.x, center.y, center.z);
        let mut mesh = Self::with_capacity(12);

        // (normal, four corners counter-clockwise seen from outside)
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0], [[-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]]),
            ([0.0, 0.0, -1.0], [[1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [1.0, 1.0, -1.0]]),
            ([0.0, 1.0, 0.0], [[-1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0]]),
            ([0.0, -1.0, 0.0], [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]]),
            ([1.0, 0.0, 0.0], [[1.0, -1.0, 1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0]]),
            ([-1.0, 0.0, 0.0], [[-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0]]),
        ];

        for ([nx, ny, nz], corners) in faces {
            let v = corners.map(|[sx, sy, sz]| {
                Vertex::new(cx + sx * h.x, cy + sy * h.y, cz + sz * h.z, nx, ny, nz)
            });
            mesh.add_triangle(Triangle::new(v[0], v[1], v[2]));
            mesh.add_triangle(Triangle::new(v[0], v[2], v[3]));
        }

        mesh
    }

    /// Stand-in desktop computer built from boxes, in the asset's units
    pub fn desktop_computer() -> Self {
        let parts = [
            // desk top
            ([0.0, -0.5, 0.0], [26.0, 1.0, 14.0]),
            // monitor panel, stand, foot
            ([0.0, 8.5, -3.0], [14.0, 9.0, 1.0]),
            ([0.0, 2.5, -3.0], [1.5, 3.0, 1.0]),
            ([0.0, 0.35, -3.0], [5.0, 0.7, 3.0]),
            // keyboard
            ([0.0, 0.3, 2.5], [10.0, 0.6, 3.5]),
            // tower beside the monitor
            ([10.0, 4.5, -2.0], [4.0, 9.0, 8.0]),
        ];

        let mut mesh = Self::with_capacity(parts.len() * 12);
        for ([x, y, z], [w, h, d]) in parts {
            mesh.extend(Self::cuboid(Point3::new(x, y, z), Vector3::new(w, h, d)));
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_winding_matches_normals() {
        let mesh = Mesh::cuboid(Point3::origin(), Vector3::new(2.0, 2.0, 2.0));
        assert_eq!(mesh.triangles.len(), 12);
        for triangle in &mesh.triangles {
            let stored = triangle.vertices[0].normal;
            assert!((triangle.calculate_normal() - stored).norm() < 1e-6);
        }
    }

    #[test]
    fn test_bounds() {
        let mesh = Mesh::cuboid(Point3::new(1.0, 2.0, 3.0), Vector3::new(2.0, 4.0, 6.0));
        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.max, Point3::new(2.0, 4.0, 6.0));
        assert_eq!(bounds.center(), Point3::new(1.0, 2.0, 3.0));
        assert!(Mesh::new().bounds().is_none());
    }

    #[test]
    fn test_transformed_keeps_unit_normals() {
        let mesh = Mesh::cuboid(Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
        let scaled = mesh.transformed(&Matrix4::new_nonuniform_scaling(&Vector3::new(3.0, 1.0, 0.5)));
        for triangle in &scaled.triangles {
            for v in &triangle.vertices {
                assert!((v.normal.norm() - 1.0).abs() < 1e-5);
            }
        }
        let bounds = scaled.bounds().unwrap();
        assert!((bounds.size() - Vector3::new(3.0, 1.0, 0.5)).norm() < 1e-6);
    }

    #[test]
    fn test_degenerate_triangle_normal() {
        let v = Vertex::new(1.0, 1.0, 1.0, 0.0, 0.0, 0.0);
        assert_eq!(Triangle::new(v, v, v).calculate_normal(), Vector3::y());
    }

    #[test]
    fn test_desktop_computer_has_geometry() {
        let mesh = Mesh::desktop_computer();
        assert!(!mesh.is_empty());
        assert_eq!(mesh.triangles.len() % 12, 0);
    }
}
