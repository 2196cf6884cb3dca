//! CPU-side triangle mesh and the processing that prepares it for drawing
//!
//! Meshes come either from a wavefront (.obj) file or from the procedural
//! shapes, then run through [`TriangleMesh::preprocess`] which derives
//! normals, uv coordinates and tangent frames. A finalized mesh is turned into
//! device buffers with [`TriangleMesh::build`].
pub mod shapes;
mod synthesis;
mod upload;
mod wavefront;

use cgmath::{Vector2, Vector3, Zero};

pub use synthesis::{Projector, STRETCH_LIMIT};
pub use upload::{DebugLines, DEBUG_LINE_SCALE};
pub use wavefront::MeshLoader;

use upload::MeshBuffers;

/// A single mesh vertex with every attribute the shading programs read.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub tangent: Vector3<f32>,
    pub bitangent: Vector3<f32>,
    pub uv: Vector2<f32>,
}

impl Vertex {
    /// Vertex at `position` with all derived attributes zeroed.
    pub fn new(position: Vector3<f32>) -> Self {
        Vertex {
            position,
            normal: Vector3::zero(),
            tangent: Vector3::zero(),
            bitangent: Vector3::zero(),
            uv: Vector2::zero(),
        }
    }
}

/// Three indices into the vertex list, counter-clockwise when seen from the
/// front face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Triangle {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Triangle {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Triangle { a, b, c }
    }

    pub fn indices(&self) -> [u32; 3] {
        [self.a, self.b, self.c]
    }
}

/// Geometry container shaped after the wavefront format: an ordered vertex
/// list, an ordered triangle list and the attributes derived from both.
///
/// Per-vertex normals, tangents, bitangents and uvs stay zero until
/// [`TriangleMesh::preprocess`] runs. Device buffers built from the mesh are
/// owned by it and replaced wholesale on every [`TriangleMesh::build`].
#[derive(Debug)]
pub struct TriangleMesh {
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
    triangle_normals: Vec<Vector3<f32>>,
    triangle_tangents: Vec<Vector3<f32>>,
    triangle_bitangents: Vec<Vector3<f32>>,
    bound_min: Vector3<f32>,
    bound_max: Vector3<f32>,
    projector: Projector,
    buffers: Option<MeshBuffers>,
}

impl Default for TriangleMesh {
    fn default() -> Self {
        TriangleMesh {
            vertices: Vec::new(),
            triangles: Vec::new(),
            triangle_normals: Vec::new(),
            triangle_tangents: Vec::new(),
            triangle_bitangents: Vec::new(),
            bound_min: Vector3::zero(),
            bound_max: Vector3::zero(),
            projector: Projector::Cylindrical,
            buffers: None,
        }
    }
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a vertex. Its index is the number of vertices added before it.
    pub fn add_vertex(&mut self, x: f32, y: f32, z: f32) {
        self.vertices.push(Vertex::new(Vector3::new(x, y, z)));
    }

    /// Appends a triangle. Indices are not validated beyond debug builds.
    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        debug_assert!(
            [a, b, c].iter().all(|&i| (i as usize) < self.vertices.len()),
            "triangle ({}, {}, {}) references a vertex past {}",
            a,
            b,
            c,
            self.vertices.len()
        );
        self.triangles.push(Triangle::new(a, b, c));
    }

    pub fn set_projector(&mut self, projector: Projector) {
        self.projector = projector;
    }

    pub fn projector(&self) -> Projector {
        self.projector
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn vertex(&self, vidx: usize) -> &Vertex {
        assert!(
            vidx < self.vertices.len(),
            "vertex index out of bounds: {}",
            vidx
        );
        &self.vertices[vidx]
    }

    pub fn vertex_mut(&mut self, vidx: usize) -> &mut Vertex {
        assert!(
            vidx < self.vertices.len(),
            "vertex index out of bounds: {}",
            vidx
        );
        &mut self.vertices[vidx]
    }

    pub fn triangle(&self, tidx: usize) -> &Triangle {
        assert!(
            tidx < self.triangles.len(),
            "triangle index out of bounds: {}",
            tidx
        );
        &self.triangles[tidx]
    }

    /// Index of the `corner`-th vertex (0, 1 or 2) of triangle `tidx`.
    pub fn polygon_index(&self, tidx: usize, corner: usize) -> u32 {
        assert!(
            corner < 3,
            "vertex index within triangle out of bounds: {} (expected 0 <= vertex < 3)",
            corner
        );
        self.triangle(tidx).indices()[corner]
    }

    /// Face normal of triangle `tidx`. Only exists once the mesh is preprocessed.
    pub fn polygon_normal(&self, tidx: usize) -> Vector3<f32> {
        assert!(
            tidx < self.triangle_normals.len(),
            "triangle normal index out of bounds: {}",
            tidx
        );
        self.triangle_normals[tidx]
    }

    pub fn polygon_tangent(&self, tidx: usize) -> Vector3<f32> {
        assert!(
            tidx < self.triangle_tangents.len(),
            "triangle tangent index out of bounds: {}",
            tidx
        );
        self.triangle_tangents[tidx]
    }

    pub fn polygon_bitangent(&self, tidx: usize) -> Vector3<f32> {
        assert!(
            tidx < self.triangle_bitangents.len(),
            "triangle bitangent index out of bounds: {}",
            tidx
        );
        self.triangle_bitangents[tidx]
    }

    /// The average of the three corners, always inside the triangle.
    pub fn triangle_centroid(&self, tidx: usize) -> Vector3<f32> {
        let tri = self.triangle(tidx);
        let centroid = self.vertices[tri.a as usize].position
            + self.vertices[tri.b as usize].position
            + self.vertices[tri.c as usize].position;
        centroid * (1. / 3.)
    }

    /// Model space minimum corner, valid after preprocessing.
    pub fn bound_min(&self) -> Vector3<f32> {
        self.bound_min
    }

    /// Model space maximum corner, valid after preprocessing.
    pub fn bound_max(&self) -> Vector3<f32> {
        self.bound_max
    }
}
