//! Device-side buffer objects and the interfaces a graphics backend provides
//!
//! Meshes never talk to a graphics API directly. They fill fixed-capacity
//! [`VertexBuffer`] and [`IndexBuffer`] staging arrays, pair them in a
//! [`VertexArray`] and hand the bytes to whatever implements [`Device`].
mod buffers;
mod staging;
mod vertex_array;

use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use cgmath::{Matrix4, Vector3, Vector4};

use crate::lighting::Color;
use crate::mesh::Vertex;
use crate::texture::Texture;

pub use buffers::{IndexBuffer, VertexBuffer};
pub use staging::StagingBuffer;
pub use vertex_array::VertexArray;

/// Number of texture units a device exposes.
pub const TEXTURE_UNITS: usize = 8;

/// Primitive assembled from consecutive indices. The discriminant is the
/// number of indices one primitive consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topology {
    Lines = 2,
    Triangles = 3,
}

impl Topology {
    pub fn indices_per_primitive(self) -> usize {
        self as usize
    }
}

/// Binding point of a device buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data.
    Array,
    /// Indices into the bound array buffer.
    ElementArray,
}

/// Opaque name of a buffer living on the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// The capabilities meshes need from a graphics backend.
pub trait Device {
    /// Uploads `data` into a new buffer. `None` when the device cannot
    /// allocate one.
    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> Option<BufferHandle>;

    fn delete_buffer(&mut self, handle: BufferHandle);

    /// Binds `handle` to `target`, or clears the binding with `None`.
    fn bind_buffer(&mut self, target: BufferTarget, handle: Option<BufferHandle>);

    fn bind_texture(&mut self, slot: u8, texture: Option<Rc<Texture>>);

    /// Draws `index_count` indices of the bound element buffer, reading
    /// vertices from the bound array buffer.
    fn draw_elements(&mut self, topology: Topology, index_count: usize, program: &dyn ShaderProgram);
}

/// Value stored under a uniform name.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Uniform {
    Float(f32),
    UInt(u32),
    Vec3(Vector3<f32>),
    Vec4(Vector4<f32>),
    Mat4(Matrix4<f32>),
    Color(Color),
}

/// A bound program seen as a sink of named uniform values.
pub trait ShaderProgram {
    fn set_uniform(&mut self, name: &str, value: Uniform);

    fn uniform(&self, name: &str) -> Option<Uniform>;

    fn has_uniform(&self, name: &str) -> bool {
        self.uniform(name).is_some()
    }
}

/// Common interface of vertex and index buffers.
pub trait BufferObject {
    /// Size in bytes of the whole staging buffer, filled or not.
    fn byte_size(&self) -> usize;

    /// Uploads the staging contents to the device. Building twice is a bug.
    fn build(&mut self, device: &mut dyn Device);

    fn bind(&self, device: &mut dyn Device);

    fn unbind(&self, device: &mut dyn Device);

    /// Frees the device copy. Destroying an unbuilt buffer does nothing.
    fn destroy(&mut self, device: &mut dyn Device);

    fn is_built(&self) -> bool;
}

/// Interleaved vertex layout as uploaded to the device.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
    pub uv: [f32; 2],
}

impl GpuVertex {
    /// `(name, float count)` of each attribute, in memory order.
    pub const ATTRIBUTES: [(&'static str, usize); 5] = [
        ("vVertex", 3),
        ("vNormal", 3),
        ("vTangent", 3),
        ("vBitangent", 3),
        ("vUV", 2),
    ];

    /// A vertex carrying nothing but a position, as used for debug lines.
    pub fn at(position: Vector3<f32>) -> Self {
        GpuVertex {
            position: position.into(),
            ..Default::default()
        }
    }
}

impl From<&Vertex> for GpuVertex {
    fn from(v: &Vertex) -> Self {
        GpuVertex {
            position: v.position.into(),
            normal: v.normal.into(),
            tangent: v.tangent.into(),
            bitangent: v.bitangent.into(),
            uv: v.uv.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_layout_matches_struct() {
        let floats: usize = GpuVertex::ATTRIBUTES.iter().map(|(_, n)| n).sum();
        assert_eq!(floats * 4, std::mem::size_of::<GpuVertex>());
    }

    #[test]
    fn topology_index_counts() {
        assert_eq!(Topology::Lines.indices_per_primitive(), 2);
        assert_eq!(Topology::Triangles.indices_per_primitive(), 3);
    }

    #[test]
    fn line_vertex_only_has_position() {
        let v = GpuVertex::at(Vector3::new(1., 2., 3.));
        assert_eq!(v.position, [1., 2., 3.]);
        assert_eq!(v.normal, [0.; 3]);
        assert_eq!(v.uv, [0.; 2]);
    }
}
