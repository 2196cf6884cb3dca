// derives rendering attributes from raw positions and topology

use std::{cmp::Ordering, f32::consts::PI, fmt, str::FromStr};

use cgmath::prelude::*;
use cgmath::{Vector2, Vector3, Zero};

use super::TriangleMesh;

/// Raw tangents or bitangents longer than this are renormalized.
pub const STRETCH_LIMIT: f32 = 100.;

/// Function used to map a vertex position onto texture space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Projector {
    #[default]
    Cylindrical,
    Spherical,
}

impl Projector {
    /// Projects a model space position to uv coordinates.
    ///
    /// `u` is the azimuth around the y axis wrapped into [0, 1). A position at
    /// the origin has no polar angle, so spherical `v` comes out as NaN there.
    pub fn project(self, position: Vector3<f32>) -> Vector2<f32> {
        let mut u = (position.z.atan2(position.x) / (2. * PI)).clamp(-1., 1.);
        if u < 0. {
            u += 1.;
        }
        let v = match self {
            Projector::Cylindrical => (position.y + 0.5).clamp(0., 1.),
            Projector::Spherical => {
                let r = position.magnitude();
                (position.y / r).acos().clamp(0., PI) / PI
            }
        };
        Vector2::new(u, v)
    }
}

impl fmt::Display for Projector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projector::Cylindrical => write!(f, "cylindrical"),
            Projector::Spherical => write!(f, "spherical"),
        }
    }
}

impl FromStr for Projector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cylindrical" => Ok(Projector::Cylindrical),
            "spherical" => Ok(Projector::Spherical),
            other => Err(format!("unknown projector `{}`", other)),
        }
    }
}

impl TriangleMesh {
    /// Centers and normalizes the mesh, then derives uvs and tangent frames.
    ///
    /// Nothing guards against calling this twice: a second pass re-centers and
    /// re-normalizes data that already went through the first one, which only
    /// reproduces the same geometry up to rounding.
    pub fn preprocess(&mut self) {
        self.center();
        self.normalize();
        self.generate_uv();
        self.generate_tbn();

        log::debug!(
            "preprocessed mesh: {} vertices, {} triangles, bounds {:?}..{:?}",
            self.vertices.len(),
            self.triangles.len(),
            self.bound_min,
            self.bound_max
        );
    }

    /// Switches projector and regenerates uvs and the tangent frames that
    /// depend on them. Positions are left alone.
    pub fn reproject(&mut self, projector: Projector) {
        self.projector = projector;
        self.generate_uv();
        self.generate_tbn();
    }

    /// Translates every vertex by the negated mean position.
    pub fn center(&mut self) {
        if self.vertices.is_empty() {
            return;
        }

        let sum = self
            .vertices
            .iter()
            .fold(Vector3::zero(), |acc, v| acc + v.position);
        let centroid = sum * (1. / self.vertices.len() as f32);
        for vertex in self.vertices.iter_mut() {
            vertex.position -= centroid;
        }
    }

    /// Scales the mesh uniformly so its tightest positive extent becomes 1.
    ///
    /// Flat axes are ignored when picking the extent. The other axes are left
    /// wherever the uniform scale puts them, possibly beyond unit range.
    pub fn normalize(&mut self) {
        let first = match self.vertices.first() {
            Some(vertex) => vertex.position,
            None => return,
        };

        let (min, max) = self.vertices.iter().fold((first, first), |(min, max), v| {
            let p = v.position;
            (
                Vector3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Vector3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        });

        let extent = max - min;
        let tightest = [extent.x, extent.y, extent.z]
            .iter()
            .copied()
            .filter(|e| *e > 0.)
            .fold(None, |acc: Option<f32>, e| Some(acc.map_or(e, |a| a.min(e))))
            .unwrap_or(1.);

        let scale = 1. / tightest;
        for vertex in self.vertices.iter_mut() {
            vertex.position *= scale;
        }
        self.bound_min = min * scale;
        self.bound_max = max * scale;
    }

    /// Assigns every vertex the uv given by the active projector.
    pub fn generate_uv(&mut self) {
        let projector = self.projector;
        for vertex in self.vertices.iter_mut() {
            vertex.uv = projector.project(vertex.position);
        }
    }

    /// Computes per-face normals, tangents and bitangents and averages them
    /// into the vertices each face touches.
    ///
    /// Every vertex averages the *distinct* vectors it received, so coplanar
    /// neighbours producing bit-identical contributions count once. Vertices
    /// no triangle references keep zeroed attributes.
    ///
    /// A zero-area triangle keeps its NaN face normal, but non-finite
    /// vectors are left out of the vertex averages. A vertex touched only by
    /// such triangles keeps a zero normal.
    pub fn generate_tbn(&mut self) {
        let vertex_count = self.vertices.len();
        self.triangle_normals.clear();
        self.triangle_tangents.clear();
        self.triangle_bitangents.clear();
        self.triangle_normals.reserve(self.triangles.len());
        self.triangle_tangents.reserve(self.triangles.len());
        self.triangle_bitangents.reserve(self.triangles.len());

        let mut normal_sets: Vec<Vec<Vector3<f32>>> = vec![Vec::new(); vertex_count];
        let mut tangent_sets: Vec<Vec<Vector3<f32>>> = vec![Vec::new(); vertex_count];
        let mut bitangent_sets: Vec<Vec<Vector3<f32>>> = vec![Vec::new(); vertex_count];

        for tri in self.triangles.iter() {
            let a = &self.vertices[tri.a as usize];
            let b = &self.vertices[tri.b as usize];
            let c = &self.vertices[tri.c as usize];

            let v1 = b.position - a.position;
            let v2 = c.position - a.position;
            let t1 = b.uv - a.uv;
            let t2 = c.uv - a.uv;

            let normal = v1.cross(v2).normalize();

            let mut denominator = t1.x * t2.y - t1.y * t2.x;
            if denominator == 0. {
                denominator = f32::EPSILON;
            }
            let tangent = limit_stretch((v1 * t2.y - v2 * t1.y) / denominator);
            let bitangent = limit_stretch((v1 * t2.x - v2 * t1.x) / -denominator);

            self.triangle_normals.push(normal);
            self.triangle_tangents.push(tangent);
            self.triangle_bitangents.push(bitangent);

            for index in tri.indices() {
                let index = index as usize;
                push_finite(&mut normal_sets[index], normal);
                push_finite(&mut tangent_sets[index], tangent);
                push_finite(&mut bitangent_sets[index], bitangent);
            }
        }

        for (i, vertex) in self.vertices.iter_mut().enumerate() {
            if let Some(normal) = unique_mean(&mut normal_sets[i]) {
                let length = normal.magnitude();
                vertex.normal = if length > 0. { normal / length } else { normal };
            }
            if let Some(tangent) = unique_mean(&mut tangent_sets[i]) {
                vertex.tangent = tangent;
            }
            if let Some(bitangent) = unique_mean(&mut bitangent_sets[i]) {
                vertex.bitangent = bitangent;
            }
        }
    }
}

fn limit_stretch(v: Vector3<f32>) -> Vector3<f32> {
    if v.magnitude2() > STRETCH_LIMIT * STRETCH_LIMIT {
        v.normalize()
    } else {
        v
    }
}

fn push_finite(set: &mut Vec<Vector3<f32>>, v: Vector3<f32>) {
    if v.x.is_finite() && v.y.is_finite() && v.z.is_finite() {
        set.push(v);
    }
}

fn lexical_order(a: &Vector3<f32>, b: &Vector3<f32>) -> Ordering {
    a.x.total_cmp(&b.x)
        .then(a.y.total_cmp(&b.y))
        .then(a.z.total_cmp(&b.z))
}

/// Mean of the distinct vectors in `set`, summed in lexical order so the
/// result does not depend on triangle order.
fn unique_mean(set: &mut Vec<Vector3<f32>>) -> Option<Vector3<f32>> {
    if set.is_empty() {
        return None;
    }
    set.sort_by(lexical_order);
    set.dedup();
    let sum = set.iter().fold(Vector3::zero(), |acc, v| acc + *v);
    Some(sum / set.len() as f32)
}
