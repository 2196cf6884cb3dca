use cgmath::prelude::*;
use cgmath::{Vector2, Vector3};

use crate::utils::FrameBuffer;

/// Barycentric coordinates of a point are represented from points of triangle
/// itself For example: Given triangle with A, B, C, we can have a point P in
/// triangle written as:
///
/// P = (1 -u - v) A + u * B + v * C
///
/// P = A + u * AB + v * AC
///
/// So to find barycentric coordinates we just need to solve above equation for
/// u & v.
///
/// u ABx + v ACx + PAx = 0
///
/// u ABy + v ACy + PAy = 0
///
/// In vector terms, we are looking for a vector (u,v, 1) which is perpendicular
/// to both (ABx, ACx, PAx) and (ABy, ACy, PAy) i.e use cross product.
pub fn barycentric_coordinates(vertices: &[Vector3<f32>; 3], point: Vector2<f32>) -> Vector3<f32> {
    let u = Vector3::cross(
        Vector3::new(
            vertices[1].x - vertices[0].x,
            vertices[2].x - vertices[0].x,
            vertices[0].x - point.x,
        ),
        Vector3::new(
            vertices[1].y - vertices[0].y,
            vertices[2].y - vertices[0].y,
            vertices[0].y - point.y,
        ),
    );

    // `u.z` is twice the signed area in pixels; below one pixel the
    // triangle is degenerate and gets coordinates outside of it
    if u.z.abs() < 1. {
        return Vector3::new(-1., 1., 1.);
    }
    Vector3::new(1. - (u.x + u.y) / u.z, u.x / u.z, u.y / u.z)
}

/// Fills the screen space triangle `vertices` (pixel x, pixel y, depth).
///
/// `shade` receives the barycentric weights of every covered pixel that
/// passes the depth test and returns its color.
pub fn rasterize_triangle<F>(vertices: &[Vector3<f32>; 3], frame: &mut FrameBuffer, mut shade: F)
where
    F: FnMut(Vector3<f32>) -> [u8; 4],
{
    let mut bboxmin: Vector2<f32> = Vector2::new(f32::MAX, f32::MAX);
    let mut bboxmax: Vector2<f32> = Vector2::new(f32::MIN, f32::MIN);
    let clamp: Vector2<f32> = Vector2::new(
        (frame.width() as f32 - 1.).max(0.),
        (frame.height() as f32 - 1.).max(0.),
    );
    for vertex in vertices {
        for j in 0..2 {
            bboxmin[j] = f32::max(0., f32::min(bboxmin[j], vertex[j]));
            bboxmax[j] = f32::min(clamp[j], f32::max(bboxmax[j], vertex[j]));
        }
    }
    if bboxmin.x > bboxmax.x || bboxmin.y > bboxmax.y {
        return;
    }

    for i in bboxmin.x as i32..bboxmax.x as i32 + 1 {
        for j in bboxmin.y as i32..bboxmax.y as i32 + 1 {
            let bc_screen = barycentric_coordinates(vertices, Vector2::new(i as f32, j as f32));
            if bc_screen.x < 0. || bc_screen.y < 0. || bc_screen.z < 0. {
                continue;
            }

            let z: f32 = (0..3).map(|k| vertices[k].z * bc_screen[k]).sum();
            if frame.depth_test(i as usize, j as usize, z) {
                let color = shade(bc_screen);
                frame.set_pixel(i, j, &color);
            }
        }
    }
}

/// Weighted sum of three per-vertex values.
pub fn interpolate<V>(values: &[V; 3], bc: Vector3<f32>) -> V
where
    V: VectorSpace<Scalar = f32>,
{
    values[0] * bc.x + values[1] * bc.y + values[2] * bc.z
}
