//! Small procedural meshes, handy when no .obj file is at hand
//!
//! Every shape is returned preprocessed, so it is already centered,
//! normalized and carries normals, uvs and tangent frames.
use std::f32::consts::PI;

use cgmath::Vector3;

use super::TriangleMesh;

/// A square in the XZ plane facing +Y.
pub fn xz_plane() -> TriangleMesh {
    let mut mesh = TriangleMesh::new();
    mesh.add_vertex(-1., 0., -1.);
    mesh.add_vertex(1., 0., -1.);
    mesh.add_vertex(1., 0., 1.);
    mesh.add_vertex(-1., 0., 1.);
    mesh.add_triangle(0, 2, 1);
    mesh.add_triangle(0, 3, 2);
    mesh.preprocess();
    mesh
}

/// A single triangle at z = 1 facing +Z.
pub fn triangle() -> TriangleMesh {
    let mut mesh = TriangleMesh::new();
    mesh.add_vertex(0., 0.5, 1.);
    mesh.add_vertex(-0.5, -0.5, 1.);
    mesh.add_vertex(0.5, -0.5, 1.);
    mesh.add_triangle(0, 1, 2);
    mesh.preprocess();
    mesh
}

fn sphere_point(theta: f32, phi: f32) -> Vector3<f32> {
    let sin_phi = phi.sin();
    Vector3::new(theta.cos() * sin_phi, phi.cos(), theta.sin() * sin_phi) + Vector3::new(0., 0., 2.)
}

/// Unit sphere centred at (0, 0, 2), made of `stacks` bands of `slices`
/// quads. The polar caps are left open.
///
/// Each quad gets its own four vertices, so seams carry split attributes.
pub fn sphere(stacks: u32, slices: u32) -> TriangleMesh {
    let delta_phi = PI / (stacks + 2) as f32;
    let delta_theta = 2. * PI / slices as f32;

    let mut mesh = TriangleMesh::new();
    let mut phi = delta_phi;
    let mut vertex_count = 0;
    for _ in 0..stacks {
        let next_phi = phi + delta_phi;
        let mut theta = 0.;
        for _ in 0..slices {
            let next_theta = theta + delta_theta;
            for p in [
                sphere_point(theta, phi),
                sphere_point(next_theta, phi),
                sphere_point(next_theta, next_phi),
                sphere_point(theta, next_phi),
            ] {
                mesh.add_vertex(p.x, p.y, p.z);
            }
            let (a, b, c, d) = (vertex_count, vertex_count + 1, vertex_count + 2, vertex_count + 3);
            mesh.add_triangle(a, b, c);
            mesh.add_triangle(a, c, d);
            vertex_count += 4;
            theta = next_theta;
        }
        phi = next_phi;
    }

    mesh.preprocess();
    mesh
}
