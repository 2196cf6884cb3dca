use cgmath::{Vector2, Vector3};

use crate::utils::FrameBuffer;

/// Outlines the screen space triangle `vertices`.
pub fn draw_triangle_edges(vertices: &[Vector3<f32>; 3], frame: &mut FrameBuffer, color: &[u8; 4]) {
    for i in 0..3 {
        draw_segment(vertices[i].truncate(), vertices[(i + 1) % 3].truncate(), frame, color);
    }
}

/// Draws the part of the screen space segment `a`-`b` that lies on the
/// frame.
pub fn draw_segment(a: Vector2<f32>, b: Vector2<f32>, frame: &mut FrameBuffer, color: &[u8; 4]) {
    if let Some((a, b)) = clip_segment(a, b, frame.width(), frame.height()) {
        draw_line(a.x as i32, a.y as i32, b.x as i32, b.y as i32, frame, color);
    }
}

/// Liang-Barsky clip of `a`-`b` against the pixel rectangle of a
/// `width` x `height` frame. `None` when nothing is left.
pub fn clip_segment(
    a: Vector2<f32>,
    b: Vector2<f32>,
    width: usize,
    height: usize,
) -> Option<(Vector2<f32>, Vector2<f32>)> {
    if width == 0 || height == 0 {
        return None;
    }
    let d = b - a;
    if ![a.x, a.y, d.x, d.y].iter().all(|c| c.is_finite()) {
        return None;
    }
    let (max_x, max_y) = ((width - 1) as f32, (height - 1) as f32);
    let mut t0: f32 = 0.;
    let mut t1: f32 = 1.;
    for (p, q) in [(-d.x, a.x), (d.x, max_x - a.x), (-d.y, a.y), (d.y, max_y - a.y)] {
        if p == 0. {
            if q < 0. {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0. {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((a + d * t0, a + d * t1))
}

/// Bresenham line between two pixels, both ends included. Pixels off the
/// frame are skipped.
pub fn draw_line(x1: i32, y1: i32, x2: i32, y2: i32, frame: &mut FrameBuffer, color: &[u8; 4]) {
    let (mut x1, mut y1, mut x2, mut y2) = (x1 as i64, y1 as i64, x2 as i64, y2 as i64);
    let mut steep = false;
    if (x1 - x2).abs() < (y1 - y2).abs() {
        std::mem::swap(&mut x1, &mut y1);
        std::mem::swap(&mut x2, &mut y2);
        steep = true;
    }
    if x1 > x2 {
        std::mem::swap(&mut x1, &mut x2);
        std::mem::swap(&mut y1, &mut y2);
    }
    let dx = x2 - x1;
    let dy = y2 - y1;
    let derror = (dy * 2).abs();
    let mut error = 0;
    let mut y = y1;
    for x in x1..=x2 {
        let (px, py) = if steep { (y, x) } else { (x, y) };
        if let (Ok(px), Ok(py)) = (i32::try_from(px), i32::try_from(py)) {
            frame.set_pixel(px, py, color);
        }
        error += derror;
        if error > dx {
            y += if y2 > y1 { 1 } else { -1 };
            error -= dx * 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];

    fn lit(frame: &FrameBuffer) -> usize {
        frame.as_bytes().chunks(4).filter(|p| p[0] == 255).count()
    }

    #[test]
    fn line_includes_both_ends() {
        let mut frame = FrameBuffer::new(8, 8);
        draw_line(1, 1, 5, 1, &mut frame, &RED);
        assert_eq!(lit(&frame), 5);
        assert_eq!(frame.pixel(5, 1), RED);
    }

    #[test]
    fn steep_and_reversed_lines() {
        let mut frame = FrameBuffer::new(8, 8);
        draw_line(6, 7, 6, 0, &mut frame, &RED);
        assert_eq!(lit(&frame), 8);
        let mut frame = FrameBuffer::new(8, 8);
        draw_line(7, 7, 0, 0, &mut frame, &RED);
        for i in 0..8 {
            assert_eq!(frame.pixel(i, i), RED);
        }
    }

    #[test]
    fn clipped_line_does_not_panic() {
        let mut frame = FrameBuffer::new(4, 4);
        draw_line(-10, -3, 20, 9, &mut frame, &RED);
        assert!(lit(&frame) > 0);
    }

    #[test]
    fn extreme_endpoints_do_not_overflow() {
        let mut frame = FrameBuffer::new(8, 8);
        draw_segment(Vector2::new(2., 2.), Vector2::new(4e9, 4e9), &mut frame, &RED);
        assert_eq!(frame.pixel(2, 2), RED);
        assert_eq!(frame.pixel(5, 5), RED);
        let mut frame = FrameBuffer::new(8, 8);
        draw_segment(Vector2::new(-3e38, 1.), Vector2::new(3e38, 1.), &mut frame, &RED);
        assert_eq!(frame.pixel(0, 1), RED);
        assert_eq!(frame.pixel(6, 1), RED);
    }

    #[test]
    fn segments_are_clipped_to_the_frame() {
        let (a, b) = clip_segment(Vector2::new(-4., 2.), Vector2::new(12., 2.), 8, 8).unwrap();
        assert_eq!((a.x, a.y, b.x, b.y), (0., 2., 7., 2.));
        assert!(clip_segment(Vector2::new(-4., -1.), Vector2::new(12., -1.), 8, 8).is_none());
        assert!(clip_segment(Vector2::new(f32::NAN, 0.), Vector2::new(1., 1.), 8, 8).is_none());
    }

    #[test]
    fn triangle_draws_all_edges() {
        let mut frame = FrameBuffer::new(8, 8);
        let tri = [
            Vector3::new(0., 0., 0.),
            Vector3::new(6., 0., 0.),
            Vector3::new(0., 6., 0.),
        ];
        draw_triangle_edges(&tri, &mut frame, &RED);
        assert_eq!(frame.pixel(3, 0), RED);
        assert_eq!(frame.pixel(3, 3), RED);
        assert_eq!(frame.pixel(0, 3), RED);
        assert_eq!(frame.pixel(2, 2), [0; 4]);
    }
}
