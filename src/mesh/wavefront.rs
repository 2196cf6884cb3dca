// load the `v`/`f` subset of .obj files

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read},
    path::Path,
    str::FromStr,
};

use cgmath::Vector3;

use super::{Projector, TriangleMesh};
use crate::error::{Error, Result};

/// Reads triangle meshes from wavefront text.
///
/// Only two record kinds are understood: `v x y z` declares a vertex and
/// `f a b c` a triangle of 1-based vertex indices. A face index may carry
/// `/`-separated texture and normal references, which are skipped. Any other
/// line, including `vn`, `vt` and `#` comments, is ignored.
pub struct MeshLoader;

impl MeshLoader {
    /// Loads `path`, assigns `projector` and runs the synthesis pass.
    ///
    /// Failures are logged and reported as `None`.
    pub fn load(path: impl AsRef<Path>, projector: Projector) -> Option<TriangleMesh> {
        let path = path.as_ref();
        let mesh = File::open(path)
            .map_err(Error::from)
            .and_then(Self::parse);
        match mesh {
            Ok(mut mesh) => {
                mesh.set_projector(projector);
                mesh.preprocess();
                log::info!(
                    "loaded mesh {}: {} vertices, {} triangles",
                    path.display(),
                    mesh.vertex_count(),
                    mesh.triangle_count()
                );
                Some(mesh)
            }
            Err(err) => {
                log::warn!("failed to load mesh {}: {}", path.display(), err);
                None
            }
        }
    }

    /// Parses raw geometry without any preprocessing.
    pub fn parse<R: Read>(input: R) -> Result<TriangleMesh> {
        let input = BufReader::new(input);
        let mut mesh = TriangleMesh::new();
        // faces may precede the vertices they name, so indices are checked
        // once the whole file has been read
        let mut faces: Vec<(usize, [i64; 3])> = Vec::new();

        for (idx, line) in input.lines().enumerate() {
            let line = line.map_err(|err| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("failed to readline {}", err),
                )
            })?;
            let line_number = idx + 1;
            let mut words = line.split_whitespace();

            match words.next() {
                Some("v") => {
                    let (v0, v1, v2) = (words.next(), words.next(), words.next());
                    let p: Vector3<f32> = parse_three("v", line_number, v0, v1, v2)?;
                    mesh.add_vertex(p.x, p.y, p.z);
                }
                Some("f") => {
                    let (f0, f1, f2) = (
                        words.next().map(vertex_reference),
                        words.next().map(vertex_reference),
                        words.next().map(vertex_reference),
                    );
                    let f: Vector3<i64> = parse_three("f", line_number, f0, f1, f2)?;
                    faces.push((line_number, f.into()));
                }
                _ => (),
            }
        }

        let vertex_count = mesh.vertex_count();
        for (line_number, face) in faces {
            let mut corners = [0u32; 3];
            for (corner, &index) in corners.iter_mut().zip(face.iter()) {
                if index < 1 || index as usize > vertex_count {
                    return Err(Error::FaceIndexOutOfRange {
                        line_number,
                        index,
                        vertex_count,
                    });
                }
                *corner = (index - 1) as u32;
            }
            mesh.add_triangle(corners[0], corners[1], corners[2]);
        }

        Ok(mesh)
    }
}

/// The position part of a face group such as `3/1/2`.
fn vertex_reference(group: &str) -> &str {
    group.split('/').next().unwrap_or(group)
}

fn parse_three<T: FromStr>(
    command: &'static str,
    line_number: usize,
    n0: Option<&str>,
    n1: Option<&str>,
    n2: Option<&str>,
) -> Result<Vector3<T>> {
    let failure = || Error::ArgumentListFailure {
        command,
        line_number,
        list: format!("{:?} {:?} {:?}", n0, n1, n2),
    };
    let (n0, n1, n2) = match (n0, n1, n2) {
        (Some(n0), Some(n1), Some(n2)) => (n0, n1, n2),
        _ => return Err(failure()),
    };
    match (
        FromStr::from_str(n0),
        FromStr::from_str(n1),
        FromStr::from_str(n2),
    ) {
        (Ok(n0), Ok(n1), Ok(n2)) => Ok(Vector3::new(n0, n1, n2)),
        _ => Err(failure()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# xz plane
v -0.5 0.0 -0.5
v -0.5 0.0 0.5
v 0.5 0.0 0.5
v 0.5 0.0 -0.5
f 1 2 3
f 1 3 4
";

    #[test]
    fn parses_vertices_and_faces() {
        let mesh = MeshLoader::parse(QUAD.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertex(2).position, Vector3::new(0.5, 0., 0.5));
        assert_eq!(mesh.triangle(1).indices(), [0, 2, 3]);
    }

    #[test]
    fn ignores_unknown_records() {
        let text = format!("{}vn 0 1 0\nvt 0.5 0.5\no quad\ng default\ns off\n\n", QUAD);
        let mesh = MeshLoader::parse(text.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn face_groups_use_position_index() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/4/7 2//8 3/6\n";
        let mesh = MeshLoader::parse(text.as_bytes()).unwrap();
        assert_eq!(mesh.triangle(0).indices(), [0, 1, 2]);
    }

    #[test]
    fn faces_may_precede_vertices() {
        let text = "f 3 2 1\nv 0 0 0\nv 1 0 0\nv 0 1 0\n";
        let mesh = MeshLoader::parse(text.as_bytes()).unwrap();
        assert_eq!(mesh.triangle(0).indices(), [2, 1, 0]);
    }

    #[test]
    fn malformed_vertex_fails() {
        let err = MeshLoader::parse("v 1.0 nope 2.0\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            Error::ArgumentListFailure {
                command: "v",
                line_number: 1,
                ..
            }
        ));
    }

    #[test]
    fn short_face_fails() {
        let err = MeshLoader::parse("v 0 0 0\nf 1 1\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            Error::ArgumentListFailure {
                command: "f",
                line_number: 2,
                ..
            }
        ));
    }

    #[test]
    fn out_of_range_faces_fail() {
        for text in ["v 0 0 0\nf 1 1 2\n", "v 0 0 0\nf 0 1 1\n", "v 0 0 0\nf -1 1 1\n"] {
            let err = MeshLoader::parse(text.as_bytes()).unwrap_err();
            assert!(matches!(err, Error::FaceIndexOutOfRange { line_number: 2, .. }));
        }
    }

    #[test]
    fn missing_file_is_none() {
        assert!(MeshLoader::load("does/not/exist.obj", Projector::Cylindrical).is_none());
    }
}
