//! Staging buffers and mesh upload through the software device.

use cgmath::prelude::*;
use cgmath::Vector3;
use rstest::rstest;

use toy_shading::gpu::{GpuVertex, IndexBuffer, Topology, VertexBuffer};
use toy_shading::mesh::{shapes, DebugLines, DEBUG_LINE_SCALE};
use toy_shading::software::{SoftwareDevice, SoftwareProgram};

fn close(a: [f32; 3], b: Vector3<f32>) -> bool {
    (Vector3::from(a) - b).magnitude() < 1e-5
}

// ─── Capacity ───────────────────────────────────────────────────

#[rstest]
#[case(1)]
#[case(4)]
#[case(16)]
fn vertex_buffer_rejects_one_past_capacity(#[case] capacity: usize) {
    let mut vbo = VertexBuffer::new(capacity);
    for _ in 0..capacity {
        assert!(vbo.add_vertex(GpuVertex::default()));
    }
    assert!(!vbo.add_vertex(GpuVertex::default()));
    assert_eq!(vbo.vertices().len(), capacity);
}

#[test]
fn index_buffer_counts_primitives() {
    let mut ibo = IndexBuffer::new(Topology::Lines, 2);
    assert!(ibo.add_line(0, 1));
    assert!(ibo.add_line(2, 3));
    assert!(!ibo.add_line(4, 5));
    assert_eq!(ibo.index_count(), 4);
    assert_eq!(ibo.indices(), &[0, 1, 2, 3]);
}

// ─── Mesh upload ────────────────────────────────────────────────

#[test]
fn build_creates_surface_and_line_buffers() {
    let mut device = SoftwareDevice::new(16, 16);
    let mut mesh = shapes::xz_plane();
    mesh.build(&mut device);

    assert!(mesh.is_built());
    // surface plus four line sets, each with a vertex and an index buffer
    assert_eq!(device.buffer_count(), 10);

    let surface = mesh.surface_array().unwrap();
    assert_eq!(surface.vertex_buffer().vertices().len(), 4);
    assert_eq!(surface.index_buffer().indices(), &[0, 2, 1, 0, 3, 2]);
}

#[test]
fn rebuild_replaces_buffers() {
    let mut device = SoftwareDevice::new(16, 16);
    let mut mesh = shapes::triangle();
    mesh.build(&mut device);
    mesh.build(&mut device);
    assert_eq!(device.buffer_count(), 10);
    mesh.release(&mut device);
    assert!(!mesh.is_built());
    assert_eq!(device.buffer_count(), 0);
}

#[rstest]
#[case(DebugLines::VertexNormals)]
#[case(DebugLines::VertexTangents)]
#[case(DebugLines::VertexBitangents)]
fn vertex_lines_start_at_vertex(#[case] lines: DebugLines) {
    let mut device = SoftwareDevice::new(16, 16);
    let mut mesh = shapes::sphere(3, 4);
    mesh.build(&mut device);

    let array = mesh.debug_array(lines).unwrap();
    let written = array.vertex_buffer().vertices();
    assert_eq!(written.len(), mesh.vertex_count() * 2);
    for (i, v) in mesh.vertices().iter().enumerate() {
        let direction = match lines {
            DebugLines::VertexNormals => v.normal,
            DebugLines::VertexTangents => v.tangent,
            _ => v.bitangent,
        };
        assert!(close(written[2 * i].position, v.position));
        assert!(close(
            written[2 * i + 1].position,
            v.position + direction * DEBUG_LINE_SCALE
        ));
    }
}

#[test]
fn face_lines_start_at_centroid() {
    let mut device = SoftwareDevice::new(16, 16);
    let mut mesh = shapes::xz_plane();
    mesh.build(&mut device);

    let written = mesh
        .debug_array(DebugLines::FaceNormals)
        .unwrap()
        .vertex_buffer()
        .vertices();
    assert_eq!(written.len(), 4);
    for t in 0..mesh.triangle_count() {
        let centroid = mesh.triangle_centroid(t);
        assert!(close(written[2 * t].position, centroid));
        assert!(close(
            written[2 * t + 1].position,
            centroid + Vector3::unit_y() * DEBUG_LINE_SCALE
        ));
    }
}

#[test]
fn render_issues_one_draw_per_array() {
    let mut device = SoftwareDevice::new(16, 16);
    let program = SoftwareProgram::new();
    let mut mesh = shapes::triangle();

    mesh.render(&mut device, &program);
    assert_eq!(device.draw_calls(), 0);

    mesh.build(&mut device);
    mesh.render(&mut device, &program);
    for lines in DebugLines::ALL {
        mesh.render_debug(&mut device, &program, lines);
    }
    assert_eq!(device.draw_calls(), 5);
}
