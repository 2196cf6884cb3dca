/// Color and depth planes of the software device.
///
/// Pixels are addressed with the origin at the bottom left corner while rows
/// are stored top row first, so [`FrameBuffer::as_bytes`] is directly an
/// RGBA8 image.
#[derive(Clone, Debug)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    color: Vec<u8>,
    depth: Vec<f32>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        FrameBuffer {
            width,
            height,
            color: vec![0; width * height * 4],
            depth: vec![f32::MIN; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Fills the color plane and resets every depth to the far plane.
    pub fn clear(&mut self, color: &[u8; 4]) {
        clear(&mut self.color, color);
        for z in self.depth.iter_mut() {
            *z = f32::MIN;
        }
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: &[u8; 4]) {
        if x < 0 || y < 0 {
            return;
        }
        set_pixel(x as usize, y as usize, &mut self.color, color, self.width, self.height);
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let si = 4 * (x + self.width * (self.height - 1 - y));
        [self.color[si], self.color[si + 1], self.color[si + 2], self.color[si + 3]]
    }

    /// Stores `z` at `(x, y)` if it is nearer than what is there. Larger
    /// values are nearer.
    pub fn depth_test(&mut self, x: usize, y: usize, z: f32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let q = x + y * self.width;
        if self.depth[q] < z {
            self.depth[q] = z;
            true
        } else {
            false
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.color
    }
}

// Sets the pixel color in frame buffer
// Also invert the y coordinate to make origin at bottom left corner
pub fn set_pixel(x: usize, y: usize, frame: &mut [u8], color: &[u8], width: usize, height: usize) {
    if x >= width || y >= height {
        return;
    }
    let si = 4 * (x + width * (height - 1 - y));
    frame[si..si + 4].copy_from_slice(color);
}

pub fn clear(frame: &mut [u8], color: &[u8]) {
    for pixel in frame.chunks_exact_mut(4) {
        pixel.copy_from_slice(color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_bottom_left() {
        let mut frame = FrameBuffer::new(2, 2);
        frame.set_pixel(0, 0, &[9, 9, 9, 255]);
        // bottom row is stored last
        assert_eq!(&frame.as_bytes()[8..12], &[9, 9, 9, 255]);
        assert_eq!(frame.pixel(0, 0), [9, 9, 9, 255]);
    }

    #[test]
    fn out_of_range_pixels_are_dropped() {
        let mut frame = FrameBuffer::new(2, 2);
        frame.set_pixel(-1, 0, &[1; 4]);
        frame.set_pixel(2, 1, &[1; 4]);
        frame.set_pixel(0, 5, &[1; 4]);
        assert!(frame.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn nearer_depth_wins() {
        let mut frame = FrameBuffer::new(1, 1);
        assert!(frame.depth_test(0, 0, -0.5));
        assert!(!frame.depth_test(0, 0, -0.7));
        assert!(frame.depth_test(0, 0, 0.2));
        frame.clear(&[0, 0, 0, 255]);
        assert!(frame.depth_test(0, 0, -0.9));
    }
}
