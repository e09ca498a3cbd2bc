//! CPU-side geometry: primitives, transformations, and model file parsing.
//!
//! Geometry stays on the CPU inside the scene graph so scenes can be built and
//! animated headlessly. The renderer uploads each [`RawGeometry`] once, the
//! first time it is drawn.
//!
//! # Supported Formats
//!
//! | Format | Extensions | Notes |
//! |--------|------------|-------|
//! | STL    | `.stl`     | Binary and ASCII, no UV coordinates |

use crate::mesh::Vertex3d;
use glam::{Quat, Vec3};
use std::path::Path;

/// Errors raised while fetching or parsing a model file.
#[derive(Debug)]
pub enum AssetLoadError {
    /// File could not be read.
    Io(std::io::Error),
    /// File format could not be determined from extension.
    UnknownFormat(String),
    /// The geometry data was invalid or corrupt.
    Parse(String),
}

impl std::fmt::Display for AssetLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetLoadError::Io(e) => write!(f, "IO error: {}", e),
            AssetLoadError::UnknownFormat(ext) => {
                write!(f, "Unknown geometry format: '{}'", ext)
            }
            AssetLoadError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for AssetLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetLoadError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AssetLoadError {
    fn from(e: std::io::Error) -> Self {
        AssetLoadError::Io(e)
    }
}

/// One face of an axis-aligned box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoxFace {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl BoxFace {
    pub const ALL: [BoxFace; 6] = [
        BoxFace::PosX,
        BoxFace::NegX,
        BoxFace::PosY,
        BoxFace::NegY,
        BoxFace::PosZ,
        BoxFace::NegZ,
    ];

    /// Outward normal plus the two in-plane axes, with `u × v == normal`.
    fn basis(self) -> (Vec3, Vec3, Vec3) {
        match self {
            BoxFace::PosX => (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            BoxFace::NegX => (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            BoxFace::PosY => (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            BoxFace::NegY => (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            BoxFace::PosZ => (Vec3::Z, Vec3::X, Vec3::Y),
            BoxFace::NegZ => (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        }
    }
}

/// Raw triangle geometry before GPU upload.
///
/// All primitives use counter-clockwise winding for front faces.
#[derive(Clone, Debug, Default)]
pub struct RawGeometry {
    /// Vertex positions, normals, and UVs.
    pub vertices: Vec<Vertex3d>,
    /// Triangle indices.
    pub indices: Vec<u32>,
}

impl RawGeometry {
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// A box of the given full size, centered at the origin.
    pub fn cuboid(size: Vec3) -> Self {
        Self::cuboid_faces(size, &BoxFace::ALL)
    }

    /// Only the listed faces of a box, each with its own four vertices.
    ///
    /// Used where faces need different materials, like a skybox floor.
    pub fn cuboid_faces(size: Vec3, faces: &[BoxFace]) -> Self {
        let half = size * 0.5;
        let mut vertices = Vec::with_capacity(faces.len() * 4);
        let mut indices = Vec::with_capacity(faces.len() * 6);

        for face in faces {
            let (normal, u, v) = face.basis();
            let base = vertices.len() as u32;
            for (su, sv, uv) in [
                (-1.0, -1.0, [0.0, 1.0]),
                (1.0, -1.0, [1.0, 1.0]),
                (1.0, 1.0, [1.0, 0.0]),
                (-1.0, 1.0, [0.0, 0.0]),
            ] {
                let corner = (normal + u * su + v * sv) * half;
                vertices.push(Vertex3d::new(corner.into(), normal.into(), uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Self::new(vertices, indices)
    }

    /// A UV sphere centered at the origin.
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for seg in 0..=segments {
                let theta = 2.0 * std::f32::consts::PI * seg as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();

                vertices.push(Vertex3d::new(
                    [x * radius, y * radius, z * radius],
                    [x, y, z],
                    [seg as f32 / segments as f32, ring as f32 / rings as f32],
                ));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;

                indices.extend_from_slice(&[current, current + 1, next]);
                indices.extend_from_slice(&[current + 1, next + 1, next]);
            }
        }

        Self::new(vertices, indices)
    }

    /// A capped cylinder along Y, centered at the origin.
    pub fn cylinder(radius: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let half = height * 0.5;
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        // Side wall: a top and a bottom vertex per segment boundary.
        for seg in 0..=segments {
            let t = seg as f32 / segments as f32;
            let theta = t * std::f32::consts::TAU;
            let (sin, cos) = theta.sin_cos();
            let normal = [sin, 0.0, cos];
            vertices.push(Vertex3d::new([radius * sin, half, radius * cos], normal, [t, 0.0]));
            vertices.push(Vertex3d::new([radius * sin, -half, radius * cos], normal, [t, 1.0]));
        }
        for seg in 0..segments {
            let top = seg * 2;
            let bottom = top + 1;
            let next_top = top + 2;
            let next_bottom = top + 3;
            indices.extend_from_slice(&[top, bottom, next_bottom, next_bottom, next_top, top]);
        }

        for (y, normal_y) in [(half, 1.0f32), (-half, -1.0)] {
            let center = vertices.len() as u32;
            vertices.push(Vertex3d::new([0.0, y, 0.0], [0.0, normal_y, 0.0], [0.5, 0.5]));
            for seg in 0..=segments {
                let theta = seg as f32 / segments as f32 * std::f32::consts::TAU;
                let (sin, cos) = theta.sin_cos();
                vertices.push(Vertex3d::new(
                    [radius * sin, y, radius * cos],
                    [0.0, normal_y, 0.0],
                    [0.5 + sin * 0.5, 0.5 + cos * 0.5],
                ));
            }
            for seg in 0..segments {
                let a = center + 1 + seg;
                let b = a + 1;
                if normal_y > 0.0 {
                    indices.extend_from_slice(&[center, a, b]);
                } else {
                    indices.extend_from_slice(&[center, b, a]);
                }
            }
        }

        Self::new(vertices, indices)
    }

    /// Flips winding and normals so the surface faces inward.
    pub fn inverted(mut self) -> Self {
        for tri in self.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
        for v in &mut self.vertices {
            v.normal = (-Vec3::from(v.normal)).into();
        }
        self
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Computes the axis-aligned bounding box as `(min, max)`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for v in &self.vertices {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }

        (min, max)
    }

    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    pub fn translate(&mut self, offset: Vec3) {
        for v in &mut self.vertices {
            v.position = (Vec3::from(v.position) + offset).into();
        }
    }

    /// Rotates all vertices and normals by the given quaternion.
    pub fn rotate(&mut self, rotation: Quat) {
        for v in &mut self.vertices {
            v.position = (rotation * Vec3::from(v.position)).into();
            v.normal = (rotation * Vec3::from(v.normal)).into();
        }
    }

    /// Centers the geometry at the origin.
    pub fn recenter(&mut self) {
        let center = self.center();
        self.translate(-center);
    }

    /// Recalculates smooth vertex normals from face geometry.
    pub fn recalculate_normals(&mut self) {
        for v in &mut self.vertices {
            v.normal = [0.0, 0.0, 0.0];
        }

        for tri in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let p0 = Vec3::from(self.vertices[i0].position);
            let p1 = Vec3::from(self.vertices[i1].position);
            let p2 = Vec3::from(self.vertices[i2].position);

            // Weighted by face area, which is |cross product|
            let face_normal = (p1 - p0).cross(p2 - p0);
            for i in [i0, i1, i2] {
                let n = Vec3::from(self.vertices[i].normal) + face_normal;
                self.vertices[i].normal = n.into();
            }
        }

        for v in &mut self.vertices {
            v.normal = Vec3::from(v.normal).normalize_or_zero().into();
        }
    }

    fn has_missing_normals(&self) -> bool {
        self.vertices
            .iter()
            .any(|v| Vec3::from(v.normal).length_squared() < 1e-12)
    }

    /// Loads geometry from a file, detecting format from the extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AssetLoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, &extension_of(path))
    }

    /// Parses geometry already read into memory. `extension` picks the format.
    pub fn from_bytes(bytes: &[u8], extension: &str) -> Result<Self, AssetLoadError> {
        match extension.to_lowercase().as_str() {
            "stl" => Self::parse_stl_bytes(bytes),
            other => Err(AssetLoadError::UnknownFormat(other.to_string())),
        }
    }

    fn parse_stl<R: std::io::Read + std::io::Seek>(reader: &mut R) -> Result<Self, AssetLoadError> {
        let stl = stl_io::read_stl(reader)
            .map_err(|e| AssetLoadError::Parse(format!("STL parse error: {}", e)))?;

        let mut vertices = Vec::with_capacity(stl.faces.len() * 3);
        let mut indices = Vec::with_capacity(stl.faces.len() * 3);

        // stl_io returns an IndexedMesh with a vertex list and indexed triangles
        for (i, face) in stl.faces.iter().enumerate() {
            let normal: [f32; 3] = face.normal.into();

            for &vertex_idx in &face.vertices {
                let vertex = stl.vertices.get(vertex_idx).ok_or_else(|| {
                    AssetLoadError::Parse(format!("face {} references missing vertex {}", i, vertex_idx))
                })?;
                let position: [f32; 3] = (*vertex).into();
                vertices.push(Vertex3d::new(position, normal, [0.0, 0.0]));
            }

            let base = (i * 3) as u32;
            indices.extend_from_slice(&[base, base + 1, base + 2]);
        }

        let mut geometry = Self::new(vertices, indices);
        // Some exporters leave facet normals zeroed.
        if geometry.has_missing_normals() {
            geometry.recalculate_normals();
        }
        Ok(geometry)
    }

    fn parse_stl_bytes(bytes: &[u8]) -> Result<Self, AssetLoadError> {
        let mut cursor = std::io::Cursor::new(bytes);
        Self::parse_stl(&mut cursor)
    }
}

/// Lowercased file extension, or an empty string.
pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A one-triangle ASCII STL with a zeroed facet normal.
    pub(crate) const TRIANGLE_STL: &str = "solid tri
facet normal 0 0 0
  outer loop
    vertex 0 0 0
    vertex 1 0 0
    vertex 0 1 0
  endloop
endfacet
endsolid tri
";

    fn face_normal(g: &RawGeometry, tri: usize) -> Vec3 {
        let idx = &g.indices[tri * 3..tri * 3 + 3];
        let p = |i: u32| Vec3::from(g.vertices[i as usize].position);
        (p(idx[1]) - p(idx[0])).cross(p(idx[2]) - p(idx[0]))
    }

    fn assert_outward(g: &RawGeometry) {
        let center = g.center();
        for tri in 0..g.triangle_count() {
            let idx = &g.indices[tri * 3..tri * 3 + 3];
            let centroid = idx
                .iter()
                .map(|&i| Vec3::from(g.vertices[i as usize].position))
                .sum::<Vec3>()
                / 3.0;
            let n = face_normal(g, tri);
            if n.length_squared() < 1e-12 {
                continue; // degenerate pole triangles
            }
            assert!(n.dot(centroid - center) > 0.0, "triangle {} faces inward", tri);
        }
    }

    #[test]
    fn cuboid_bounds_match_size() {
        let g = RawGeometry::cuboid(Vec3::new(1.0, 0.2, 1.0));
        let (min, max) = g.bounds();
        assert!(min.abs_diff_eq(Vec3::new(-0.5, -0.1, -0.5), 1e-6));
        assert!(max.abs_diff_eq(Vec3::new(0.5, 0.1, 0.5), 1e-6));
        assert_eq!(g.triangle_count(), 12);
    }

    #[test]
    fn primitives_wind_outward() {
        assert_outward(&RawGeometry::cuboid(Vec3::splat(2.0)));
        assert_outward(&RawGeometry::sphere(0.3, 16, 16));
        assert_outward(&RawGeometry::cylinder(0.5, 0.2, 32));
    }

    #[test]
    fn inverted_box_faces_inward() {
        let g = RawGeometry::cuboid(Vec3::splat(80.0)).inverted();
        for tri in 0..g.triangle_count() {
            let idx = &g.indices[tri * 3..tri * 3 + 3];
            let centroid = idx
                .iter()
                .map(|&i| Vec3::from(g.vertices[i as usize].position))
                .sum::<Vec3>()
                / 3.0;
            assert!(face_normal(&g, tri).dot(centroid) < 0.0);
        }
    }

    #[test]
    fn partial_cuboid_keeps_only_requested_faces() {
        let g = RawGeometry::cuboid_faces(Vec3::splat(2.0), &[BoxFace::NegY]);
        assert_eq!(g.vertices.len(), 4);
        assert!(g.vertices.iter().all(|v| v.position[1] == -1.0));
    }

    #[test]
    fn recenter_moves_bounds_to_origin() {
        let mut g = RawGeometry::cuboid(Vec3::ONE);
        g.translate(Vec3::new(3.0, 4.0, 5.0));
        g.recenter();
        assert!(g.center().abs_diff_eq(Vec3::ZERO, 1e-5));
    }

    #[test]
    fn stl_with_zero_normals_gets_recomputed() {
        let g = RawGeometry::from_bytes(TRIANGLE_STL.as_bytes(), "STL").unwrap();
        assert_eq!(g.triangle_count(), 1);
        for v in &g.vertices {
            assert!(Vec3::from(v.normal).abs_diff_eq(Vec3::Z, 1e-6));
        }
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = RawGeometry::from_bytes(b"o car", "obj").unwrap_err();
        assert!(matches!(err, AssetLoadError::UnknownFormat(ext) if ext == "obj"));
    }
}
