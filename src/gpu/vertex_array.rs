use super::{BufferObject, Device, IndexBuffer, ShaderProgram, Topology, VertexBuffer};

/// A vertex buffer and an index buffer drawn together as one object.
#[derive(Debug)]
pub struct VertexArray {
    vbo: VertexBuffer,
    ibo: IndexBuffer,
}

impl VertexArray {
    /// Staging room for `vertex_count` vertices and `primitive_count`
    /// primitives of `topology`.
    pub fn new(vertex_count: usize, primitive_count: usize, topology: Topology) -> Self {
        VertexArray {
            vbo: VertexBuffer::new(vertex_count),
            ibo: IndexBuffer::new(topology, primitive_count),
        }
    }

    pub fn vertex_buffer(&self) -> &VertexBuffer {
        &self.vbo
    }

    pub fn vertex_buffer_mut(&mut self) -> &mut VertexBuffer {
        &mut self.vbo
    }

    pub fn index_buffer(&self) -> &IndexBuffer {
        &self.ibo
    }

    pub fn index_buffer_mut(&mut self) -> &mut IndexBuffer {
        &mut self.ibo
    }

    /// Uploads both buffers. Their contents must be complete by now.
    pub fn build(&mut self, device: &mut dyn Device) {
        self.vbo.build(device);
        self.ibo.build(device);
        self.unbind(device);
    }

    pub fn is_built(&self) -> bool {
        self.vbo.is_built() && self.ibo.is_built()
    }

    pub fn bind(&self, device: &mut dyn Device) {
        assert!(self.is_built(), "cannot bind unbuilt vertex array");
        self.vbo.bind(device);
        self.ibo.bind(device);
    }

    /// Draws every index of the index buffer. The array must be bound.
    pub fn render(&self, device: &mut dyn Device, program: &dyn ShaderProgram) {
        device.draw_elements(self.ibo.topology(), self.ibo.index_count(), program);
    }

    pub fn unbind(&self, device: &mut dyn Device) {
        self.vbo.unbind(device);
        self.ibo.unbind(device);
    }

    pub fn destroy(&mut self, device: &mut dyn Device) {
        self.vbo.destroy(device);
        self.ibo.destroy(device);
    }
}
