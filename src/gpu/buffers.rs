use super::{BufferHandle, BufferObject, BufferTarget, Device, GpuVertex, StagingBuffer, Topology};

/// Fixed-size array of [`GpuVertex`] destined for an array buffer.
#[derive(Debug)]
pub struct VertexBuffer {
    staging: StagingBuffer<GpuVertex>,
    handle: Option<BufferHandle>,
}

impl VertexBuffer {
    pub fn new(vertex_count: usize) -> Self {
        VertexBuffer {
            staging: StagingBuffer::new(vertex_count),
            handle: None,
        }
    }

    /// Copies `vertex` into the next free slot. `false` once the buffer is full.
    pub fn add_vertex(&mut self, vertex: GpuVertex) -> bool {
        self.staging.push(vertex)
    }

    pub fn vertex_count(&self) -> usize {
        self.staging.capacity()
    }

    pub fn vertices(&self) -> &[GpuVertex] {
        self.staging.written()
    }
}

impl BufferObject for VertexBuffer {
    fn byte_size(&self) -> usize {
        self.staging.byte_size()
    }

    fn build(&mut self, device: &mut dyn Device) {
        assert!(
            self.handle.is_none(),
            "trying to build already-built vertex buffer"
        );
        self.handle = device.create_buffer(BufferTarget::Array, self.staging.as_bytes());
        if self.handle.is_none() {
            log::warn!("failed to create vertex buffer");
            return;
        }
        self.bind(device);
    }

    fn bind(&self, device: &mut dyn Device) {
        device.bind_buffer(BufferTarget::Array, self.handle);
    }

    fn unbind(&self, device: &mut dyn Device) {
        device.bind_buffer(BufferTarget::Array, None);
    }

    fn destroy(&mut self, device: &mut dyn Device) {
        if let Some(handle) = self.handle.take() {
            device.delete_buffer(handle);
        }
    }

    fn is_built(&self) -> bool {
        self.handle.is_some()
    }
}

/// Fixed-size array of `u32` indices forming lines or triangles.
#[derive(Debug)]
pub struct IndexBuffer {
    topology: Topology,
    staging: StagingBuffer<u32>,
    handle: Option<BufferHandle>,
}

impl IndexBuffer {
    /// Room for exactly `primitive_count` primitives of `topology`.
    pub fn new(topology: Topology, primitive_count: usize) -> Self {
        IndexBuffer {
            topology,
            staging: StagingBuffer::new(topology.indices_per_primitive() * primitive_count),
            handle: None,
        }
    }

    /// `false` when two more indices do not fit.
    pub fn add_line(&mut self, from: u32, to: u32) -> bool {
        self.staging.extend(&[from, to])
    }

    /// `false` when three more indices do not fit.
    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) -> bool {
        self.staging.extend(&[a, b, c])
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Number of indices the buffer was sized for; this many are drawn.
    pub fn index_count(&self) -> usize {
        self.staging.capacity()
    }

    pub fn indices(&self) -> &[u32] {
        self.staging.written()
    }
}

impl BufferObject for IndexBuffer {
    fn byte_size(&self) -> usize {
        self.staging.byte_size()
    }

    fn build(&mut self, device: &mut dyn Device) {
        assert!(
            self.handle.is_none(),
            "trying to build already-built index buffer"
        );
        self.handle = device.create_buffer(BufferTarget::ElementArray, self.staging.as_bytes());
        if self.handle.is_none() {
            log::warn!("failed to create index buffer");
            return;
        }
        self.bind(device);
    }

    fn bind(&self, device: &mut dyn Device) {
        device.bind_buffer(BufferTarget::ElementArray, self.handle);
    }

    fn unbind(&self, device: &mut dyn Device) {
        device.bind_buffer(BufferTarget::ElementArray, None);
    }

    fn destroy(&mut self, device: &mut dyn Device) {
        if let Some(handle) = self.handle.take() {
            device.delete_buffer(handle);
        }
    }

    fn is_built(&self) -> bool {
        self.handle.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_buffer_capacity_contract() {
        let mut vbo = VertexBuffer::new(2);
        assert!(vbo.add_vertex(GpuVertex::default()));
        assert!(vbo.add_vertex(GpuVertex::default()));
        assert!(!vbo.add_vertex(GpuVertex::default()));
        assert_eq!(vbo.vertices().len(), 2);
        assert_eq!(vbo.byte_size(), 2 * std::mem::size_of::<GpuVertex>());
    }

    #[test]
    fn index_buffer_sized_by_topology() {
        let mut lines = IndexBuffer::new(Topology::Lines, 2);
        assert_eq!(lines.index_count(), 4);
        assert!(lines.add_line(0, 1));
        assert!(lines.add_line(2, 3));
        assert!(!lines.add_line(4, 5));

        let mut tris = IndexBuffer::new(Topology::Triangles, 1);
        assert_eq!(tris.byte_size(), 12);
        assert!(tris.add_triangle(0, 1, 2));
        assert!(!tris.add_triangle(0, 1, 2));
        assert_eq!(tris.indices(), &[0, 1, 2]);
    }

    #[test]
    fn partial_primitive_does_not_fit() {
        // a triangle buffer of one primitive has room for one line but not two
        let mut ibo = IndexBuffer::new(Topology::Triangles, 1);
        assert!(ibo.add_line(0, 1));
        assert!(!ibo.add_line(1, 2));
    }
}
