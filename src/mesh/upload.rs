// turns a preprocessed mesh into device buffers

use cgmath::Vector3;

use super::TriangleMesh;
use crate::gpu::{Device, GpuVertex, ShaderProgram, Topology, VertexArray};

/// Length factor applied to every debug line direction.
pub const DEBUG_LINE_SCALE: f32 = 0.1;

/// The line sets a built mesh can draw besides its surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DebugLines {
    VertexNormals,
    VertexTangents,
    VertexBitangents,
    FaceNormals,
}

impl DebugLines {
    pub const ALL: [DebugLines; 4] = [
        DebugLines::VertexNormals,
        DebugLines::VertexTangents,
        DebugLines::VertexBitangents,
        DebugLines::FaceNormals,
    ];
}

#[derive(Debug)]
pub(crate) struct MeshBuffers {
    surface: VertexArray,
    vertex_normals: VertexArray,
    vertex_tangents: VertexArray,
    vertex_bitangents: VertexArray,
    face_normals: VertexArray,
}

impl MeshBuffers {
    fn lines(&self, lines: DebugLines) -> &VertexArray {
        match lines {
            DebugLines::VertexNormals => &self.vertex_normals,
            DebugLines::VertexTangents => &self.vertex_tangents,
            DebugLines::VertexBitangents => &self.vertex_bitangents,
            DebugLines::FaceNormals => &self.face_normals,
        }
    }

    fn arrays_mut(&mut self) -> [&mut VertexArray; 5] {
        [
            &mut self.surface,
            &mut self.vertex_normals,
            &mut self.vertex_tangents,
            &mut self.vertex_bitangents,
            &mut self.face_normals,
        ]
    }
}

/// Appends the segment `origin -> origin + direction * scale` as line `index`.
/// Whether both end indices of `count` line segments fit in a `u32`.
fn fits_line_indices(count: usize) -> bool {
    count
        .checked_mul(2)
        .map_or(false, |n| u32::try_from(n).is_ok())
}

fn add_segment(array: &mut VertexArray, index: u32, origin: Vector3<f32>, direction: Vector3<f32>) -> bool {
    let vbo = array.vertex_buffer_mut();
    let written = vbo.add_vertex(GpuVertex::at(origin))
        && vbo.add_vertex(GpuVertex::at(origin + direction * DEBUG_LINE_SCALE));
    written && array.index_buffer_mut().add_line(index * 2, index * 2 + 1)
}

impl TriangleMesh {
    /// Uploads the mesh surface and its debug line sets to `device`.
    ///
    /// Buffers from an earlier build are destroyed first; nothing is patched
    /// in place. Each staging buffer is sized exactly from the vertex and
    /// triangle counts, so every insertion below fits.
    pub fn build(&mut self, device: &mut dyn Device) {
        self.release(device);

        let vertex_count = self.vertices.len();
        let triangle_count = self.triangles.len();
        assert!(
            fits_line_indices(vertex_count) && fits_line_indices(triangle_count),
            "mesh too large for 32-bit indices: {} vertices, {} triangles",
            vertex_count,
            triangle_count
        );
        let mut buffers = MeshBuffers {
            surface: VertexArray::new(vertex_count, triangle_count, Topology::Triangles),
            vertex_normals: VertexArray::new(vertex_count * 2, vertex_count, Topology::Lines),
            vertex_tangents: VertexArray::new(vertex_count * 2, vertex_count, Topology::Lines),
            vertex_bitangents: VertexArray::new(vertex_count * 2, vertex_count, Topology::Lines),
            face_normals: VertexArray::new(triangle_count * 2, triangle_count, Topology::Lines),
        };

        let mut complete = true;
        for (i, vertex) in self.vertices.iter().enumerate() {
            let i = i as u32;
            complete &= buffers.surface.vertex_buffer_mut().add_vertex(vertex.into());
            complete &= add_segment(&mut buffers.vertex_normals, i, vertex.position, vertex.normal);
            complete &= add_segment(&mut buffers.vertex_tangents, i, vertex.position, vertex.tangent);
            complete &= add_segment(
                &mut buffers.vertex_bitangents,
                i,
                vertex.position,
                vertex.bitangent,
            );
        }

        for (i, tri) in self.triangles.iter().enumerate() {
            complete &= buffers.surface.index_buffer_mut().add_triangle(tri.a, tri.b, tri.c);
            let normal = self
                .triangle_normals
                .get(i)
                .copied()
                .unwrap_or_else(|| Vector3::new(0., 0., 0.));
            complete &= add_segment(
                &mut buffers.face_normals,
                i as u32,
                self.triangle_centroid(i),
                normal,
            );
        }
        debug_assert!(complete, "mesh staging buffers were sized too small");

        for array in buffers.arrays_mut() {
            array.build(device);
        }

        log::debug!(
            "built mesh buffers: {} vertices, {} triangles",
            vertex_count,
            triangle_count
        );
        self.buffers = Some(buffers);
    }

    pub fn is_built(&self) -> bool {
        self.buffers.is_some()
    }

    /// Draws the shaded surface. Does nothing before [`TriangleMesh::build`].
    pub fn render(&self, device: &mut dyn Device, program: &dyn ShaderProgram) {
        if let Some(buffers) = &self.buffers {
            draw(&buffers.surface, device, program);
        }
    }

    /// Draws one of the debug line sets. Does nothing before a build.
    pub fn render_debug(&self, device: &mut dyn Device, program: &dyn ShaderProgram, lines: DebugLines) {
        if let Some(buffers) = &self.buffers {
            draw(buffers.lines(lines), device, program);
        }
    }

    /// Destroys every device buffer this mesh owns.
    pub fn release(&mut self, device: &mut dyn Device) {
        if let Some(mut buffers) = self.buffers.take() {
            for array in buffers.arrays_mut() {
                array.destroy(device);
            }
        }
    }

    /// The vertex array holding the surface, if built.
    pub fn surface_array(&self) -> Option<&VertexArray> {
        self.buffers.as_ref().map(|b| &b.surface)
    }

    /// The vertex array holding a debug line set, if built.
    pub fn debug_array(&self, lines: DebugLines) -> Option<&VertexArray> {
        self.buffers.as_ref().map(|b| b.lines(lines))
    }
}

fn draw(array: &VertexArray, device: &mut dyn Device, program: &dyn ShaderProgram) {
    if !array.is_built() {
        return;
    }
    array.bind(device);
    array.render(device, program);
    array.unbind(device);
}
