use bytemuck::Pod;

/// Pre-sized CPU copy of a device buffer with a write cursor.
///
/// The capacity is fixed at construction; writes past it are refused instead
/// of growing the buffer. Unwritten slots stay zeroed and are still uploaded.
#[derive(Clone, Debug)]
pub struct StagingBuffer<T: Pod> {
    data: Vec<T>,
    cursor: usize,
}

impl<T: Pod> StagingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        StagingBuffer {
            data: vec![T::zeroed(); capacity],
            cursor: 0,
        }
    }

    /// Writes `element` at the cursor. Returns `false` when full.
    pub fn push(&mut self, element: T) -> bool {
        self.extend(&[element])
    }

    /// Writes every element or none of them. Returns `false` when they do not
    /// all fit.
    pub fn extend(&mut self, elements: &[T]) -> bool {
        if self.cursor + elements.len() > self.data.len() {
            return false;
        }
        self.data[self.cursor..self.cursor + elements.len()].copy_from_slice(elements);
        self.cursor += elements.len();
        true
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of elements written so far.
    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn is_full(&self) -> bool {
        self.cursor == self.data.len()
    }

    pub fn byte_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<T>()
    }

    /// The entire buffer, including slots not written yet.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn written(&self) -> &[T] {
        &self.data[..self.cursor]
    }
}
