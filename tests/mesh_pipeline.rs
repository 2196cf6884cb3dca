//! Import and attribute synthesis, end to end.

use std::f32::consts::PI;
use std::path::PathBuf;

use cgmath::prelude::*;
use cgmath::Vector3;
use rstest::rstest;

use toy_shading::mesh::{shapes, MeshLoader, Projector, TriangleMesh};

const EPS: f32 = 1e-5;

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

fn mean_position(mesh: &TriangleMesh) -> Vector3<f32> {
    mesh.vertices()
        .iter()
        .fold(Vector3::zero(), |acc, v| acc + v.position)
        / mesh.vertex_count() as f32
}

fn wedge() -> TriangleMesh {
    let text = "\
v 10 2 -4
v 14 2 -4
v 10 5 -4
v 10 2 3
v 14 5 3
f 1 3 2
f 1 2 4
f 1 4 3
f 2 3 5
f 2 5 4
f 3 4 5
";
    MeshLoader::parse(text.as_bytes()).unwrap()
}

// ─── Import ─────────────────────────────────────────────────────

#[test]
fn quad_file_imports_with_up_normals() {
    let mesh = MeshLoader::load(data("quad.obj"), Projector::Cylindrical).unwrap();
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.triangle_count(), 2);
    assert_eq!(mesh.polygon_normal(0), mesh.polygon_normal(1));
    assert!((mesh.polygon_normal(0) - Vector3::unit_y()).magnitude() < EPS);
    for v in mesh.vertices() {
        assert!((v.normal - Vector3::unit_y()).magnitude() < EPS);
    }
}

#[test]
fn load_applies_projector() {
    let mesh = MeshLoader::load(data("quad.obj"), Projector::Spherical).unwrap();
    assert_eq!(mesh.projector(), Projector::Spherical);
    // every corner sits on the equator of the projection sphere
    for v in mesh.vertices() {
        assert!((v.uv.y - 0.5).abs() < EPS);
    }
}

#[test]
fn malformed_file_is_rejected() {
    assert!(MeshLoader::load(data("broken.obj"), Projector::Cylindrical).is_none());
}

#[test]
fn missing_file_is_rejected() {
    assert!(MeshLoader::load(data("nope.obj"), Projector::Cylindrical).is_none());
}

#[rstest]
#[case("# a comment\n")]
#[case("vn 0 0 1\n")]
#[case("vt 0.5 0.5\n")]
#[case("usemtl steel\n")]
#[case("\n\n")]
fn unknown_lines_do_not_change_counts(#[case] extra: &str) {
    let base = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
    let plain = MeshLoader::parse(base.as_bytes()).unwrap();
    let padded = MeshLoader::parse(format!("{}{}{}", extra, base, extra).as_bytes()).unwrap();
    assert_eq!(plain.vertex_count(), padded.vertex_count());
    assert_eq!(plain.triangle_count(), padded.triangle_count());
}

// ─── Synthesis ──────────────────────────────────────────────────

#[test]
fn centering_moves_mean_to_origin() {
    let mut mesh = wedge();
    mesh.preprocess();
    assert!(mean_position(&mesh).magnitude() < EPS);
}

#[test]
fn normalization_scales_tightest_extent_to_one() {
    let mut mesh = wedge();
    mesh.preprocess();
    // extents before: 4, 3, 7
    let extent = mesh.bound_max() - mesh.bound_min();
    assert!((extent.y - 1.).abs() < EPS);
    assert!((extent.x - 4. / 3.).abs() < EPS);
    assert!((extent.z - 7. / 3.).abs() < EPS);
}

#[test]
fn normalization_never_grows_large_meshes() {
    let mut mesh = wedge();
    mesh.center();
    let centered: Vec<f32> = mesh.vertices().iter().map(|v| v.position.magnitude()).collect();
    mesh.normalize();
    for (i, v) in mesh.vertices().iter().enumerate() {
        assert!(v.position.magnitude() <= centered[i] + EPS);
    }
}

#[test]
fn face_normals_are_unit_and_perpendicular() {
    let mesh = shapes::sphere(6, 8);
    for t in 0..mesh.triangle_count() {
        let tri = mesh.triangle(t);
        let a = mesh.vertex(tri.a as usize).position;
        let e1 = mesh.vertex(tri.b as usize).position - a;
        let e2 = mesh.vertex(tri.c as usize).position - a;
        let n = mesh.polygon_normal(t);
        assert!((n.magnitude() - 1.).abs() < 1e-4);
        assert!(n.dot(e1).abs() < 1e-4);
        assert!(n.dot(e2).abs() < 1e-4);
    }
}

#[rstest]
#[case(Vector3::new(1., 0.3, 0.))]
#[case(Vector3::new(-0.4, -0.2, 0.7))]
#[case(Vector3::new(0.2, 0.1, -0.9))]
fn cylindrical_u_survives_full_revolution(#[case] p: Vector3<f32>) {
    let (s, c) = (2. * PI).sin_cos();
    let turned = Vector3::new(c * p.x - s * p.z, p.y, s * p.x + c * p.z);
    let a = Projector::Cylindrical.project(p);
    let b = Projector::Cylindrical.project(turned);
    // u wraps, so 0 and 1 are the same place
    let du = (a.x - b.x).abs();
    assert!(du < 1e-4 || (du - 1.).abs() < 1e-4);
    assert!((a.y - b.y).abs() < EPS);
}

#[test]
fn single_triangle_vertices_take_face_attributes() {
    let mesh = shapes::triangle();
    for i in 0..3 {
        let v = mesh.vertex(i);
        assert!((v.normal - mesh.polygon_normal(0)).magnitude() < EPS);
        assert_eq!(v.tangent, mesh.polygon_tangent(0));
        assert_eq!(v.bitangent, mesh.polygon_bitangent(0));
    }
}

#[test]
fn unreferenced_vertex_keeps_zero_attributes() {
    let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 5 5 5\nf 1 2 3\n";
    let mut mesh = MeshLoader::parse(text.as_bytes()).unwrap();
    mesh.preprocess();
    let lonely = mesh.vertex(3);
    assert_eq!(lonely.normal, Vector3::zero());
    assert_eq!(lonely.tangent, Vector3::zero());
    assert_eq!(lonely.bitangent, Vector3::zero());
}

#[test]
fn second_preprocess_is_nearly_idempotent() {
    let mut once = wedge();
    once.preprocess();
    let mut twice = wedge();
    twice.preprocess();
    twice.preprocess();
    for (a, b) in once.vertices().iter().zip(twice.vertices()) {
        assert!((a.position - b.position).magnitude() < 1e-4);
        assert!((a.normal - b.normal).magnitude() < 1e-4);
    }
}

#[test]
fn sliver_faces_around_busy_vertex_import_cleanly() {
    // a half fan of 40 triangles around vertex 1, every third one collapsed
    let n = 40;
    let mut text = String::from("v 0 0 0\n");
    for i in 0..=n {
        let angle = PI * i as f32 / n as f32;
        text += &format!("v {} {} 0\n", angle.cos(), angle.sin());
    }
    for i in 0..n {
        let next = if i % 3 == 2 { i + 2 } else { i + 3 };
        text += &format!("f 1 {} {}\n", i + 2, next);
    }
    let mut mesh = MeshLoader::parse(text.as_bytes()).unwrap();
    mesh.preprocess();

    assert!(mesh.polygon_normal(2).x.is_nan());
    assert!((mesh.vertex(0).normal - Vector3::unit_z()).magnitude() < EPS);
    for v in mesh.vertices() {
        assert!(v.normal.x.is_finite() && v.normal.y.is_finite() && v.normal.z.is_finite());
    }
}
