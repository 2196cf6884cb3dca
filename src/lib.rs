//! This library provides a light weight playground for per-pixel lighting
//!
//! It loads a triangle mesh, derives normals, uv coordinates and tangent
//! frames for it, uploads it into vertex and index buffers and shades it with
//! Phong or Blinn lighting, optionally with a diffuse texture and a normal
//! map. Drawing goes through the [`gpu::Device`] trait; the bundled
//! [`software::SoftwareDevice`] rasterizes on the CPU and fills up a frame
//! buffer.
//! It is mostly written for learning purposes and does not aim to be
//! replacement of any rendering library.
//!
//! Example
//!
//! ```no_run
//! use toy_shading::{init, render_scene, Config, MeshSource, Shape};
//!
//! let config = Config {
//!     mesh: MeshSource::Shape(Shape::Sphere),
//!     ..Default::default()
//! };
//! let mut ctx = init(config).expect("sample shapes always load");
//! render_scene(&mut ctx);
//! ctx.device().save("sphere.png").unwrap();
//! ```

pub mod error;
pub mod gpu;
pub mod lighting;
pub mod mesh;
mod rasterizer;
pub mod software;
pub mod texture;
mod utils;
mod wireframe;

use std::{fmt, path::PathBuf, str::FromStr};

use cgmath::{prelude::*, Deg, Matrix4, Point3, Rad, Vector3};

use gpu::{ShaderProgram, Uniform};
use lighting::{Color, Environment, Light, Material, ShadingModel};
use mesh::{shapes, DebugLines, MeshLoader, Projector, TriangleMesh};
use software::{SoftwareDevice, SoftwareProgram};
use texture::{TextureKind, TextureManager};

/// Vertical field of view of the preview camera.
const FOV: Deg<f32> = Deg(57.3);
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.;

/// Stacks and slices of the sample sphere.
const SPHERE_DETAIL: u32 = 12;

/// Procedural meshes available without a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Plane,
    Triangle,
    Sphere,
}

impl Shape {
    fn create(self) -> TriangleMesh {
        match self {
            Shape::Plane => shapes::xz_plane(),
            Shape::Triangle => shapes::triangle(),
            Shape::Sphere => shapes::sphere(SPHERE_DETAIL, SPHERE_DETAIL),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Plane => write!(f, "plane"),
            Shape::Triangle => write!(f, "triangle"),
            Shape::Sphere => write!(f, "sphere"),
        }
    }
}

impl FromStr for Shape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plane" => Ok(Shape::Plane),
            "triangle" => Ok(Shape::Triangle),
            "sphere" => Ok(Shape::Sphere),
            other => Err(format!("unknown shape `{}`", other)),
        }
    }
}

/// Where the rendered mesh comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum MeshSource {
    File(PathBuf),
    Shape(Shape),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    pub mesh: MeshSource,
    pub projector: Projector,
    /// Direction the single directional light travels in.
    pub light_direction: Vector3<f32>,
    pub is_wireframe: bool,
    pub debug_lines: Vec<DebugLines>,
    pub line_color: Color,
    pub background: Color,
    pub shading: ShadingModel,
    pub material: Material,
    pub diffuse_texture: Option<PathBuf>,
    /// Height map converted into a normal map on load.
    pub height_map: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            width: 512,
            height: 512,
            mesh: MeshSource::Shape(Shape::Sphere),
            projector: Projector::Cylindrical,
            light_direction: Vector3::new(-1., -1., -1.),
            is_wireframe: false,
            debug_lines: Vec::new(),
            line_color: Color::YELLOW,
            background: Color::GRAY,
            shading: ShadingModel::Phong,
            material: Material {
                diffuse: Color::rgb(0.8, 0.8, 0.8),
                ..Default::default()
            },
            diffuse_texture: None,
            height_map: None,
        }
    }
}

/// A mesh placed in the world.
#[derive(Debug)]
pub struct RenderObject {
    pub position: Vector3<f32>,
    /// Euler angles in radians, applied around x, then y, then z.
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
    pub mesh: TriangleMesh,
}

impl RenderObject {
    pub fn new(mesh: TriangleMesh) -> Self {
        RenderObject {
            position: Vector3::zero(),
            rotation: Vector3::zero(),
            scale: Vector3::new(1., 1., 1.),
            mesh,
        }
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from_angle_z(Rad(self.rotation.z))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Radius of a sphere around the origin holding the transformed bounds.
    fn radius(&self) -> f32 {
        let extent = self
            .mesh
            .bound_min()
            .magnitude()
            .max(self.mesh.bound_max().magnitude());
        let scale = self.scale.x.abs().max(self.scale.y.abs()).max(self.scale.z.abs());
        self.position.magnitude() + extent * scale
    }
}

pub struct RendererContext {
    config: Config,
    object: RenderObject,
    device: SoftwareDevice,
    program: SoftwareProgram,
    textures: TextureManager,
    environment: Environment,
}

fn load_source(source: &MeshSource, projector: Projector) -> Option<TriangleMesh> {
    match source {
        MeshSource::File(path) => MeshLoader::load(path, projector),
        MeshSource::Shape(shape) => {
            let mut mesh = shape.create();
            if mesh.projector() != projector {
                mesh.reproject(projector);
            }
            Some(mesh)
        }
    }
}

/// Sets up the device and loads everything `config` names. `None` when the
/// mesh cannot be loaded; missing textures only produce warnings.
pub fn init(config: Config) -> Option<RendererContext> {
    let mut mesh = load_source(&config.mesh, config.projector)?;
    let mut device = SoftwareDevice::new(config.width as usize, config.height as usize);
    mesh.build(&mut device);

    let mut textures = TextureManager::new();
    if let Some(path) = &config.diffuse_texture {
        textures.register(TextureKind::Diffuse, path, &mut device);
    }
    if let Some(path) = &config.height_map {
        textures.register_normal_map(TextureKind::Normal, path, &mut device);
    }

    let environment = Environment {
        lights: vec![Light::directional(config.light_direction)],
        ..Default::default()
    };

    Some(RendererContext {
        config,
        object: RenderObject::new(mesh),
        device,
        program: SoftwareProgram::new(),
        textures,
        environment,
    })
}

impl RendererContext {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn object(&self) -> &RenderObject {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut RenderObject {
        &mut self.object
    }

    pub fn device(&self) -> &SoftwareDevice {
        &self.device
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    pub fn textures_mut(&mut self) -> &mut TextureManager {
        &mut self.textures
    }

    /// Replaces the rendered mesh. On failure the current mesh stays and
    /// `false` is returned.
    pub fn load_mesh(&mut self, source: MeshSource) -> bool {
        match load_source(&source, self.config.projector) {
            Some(mut mesh) => {
                self.object.mesh.release(&mut self.device);
                mesh.build(&mut self.device);
                self.object.mesh = mesh;
                self.config.mesh = source;
                true
            }
            None => {
                log::warn!("keeping the previous mesh");
                false
            }
        }
    }

    /// Switches the uv projector of the current mesh and rebuilds it.
    pub fn set_projector(&mut self, projector: Projector) {
        self.config.projector = projector;
        self.object.mesh.reproject(projector);
        self.object.mesh.build(&mut self.device);
    }

    fn upload_camera(&mut self) {
        let aspect = self.config.width as f32 / self.config.height.max(1) as f32;
        let fov: Rad<f32> = FOV.into();
        let distance = self.object.radius().max(Z_NEAR) / (fov.0 / 2.).sin() * 1.1;
        let eye = Point3::new(0., 0., distance);
        let view = Matrix4::look_at_rh(eye, Point3::origin(), Vector3::unit_y());
        let projection = cgmath::perspective(fov, aspect, Z_NEAR, Z_FAR.max(distance * 2.));
        software::upload_transforms(
            &mut self.program,
            self.object.model_matrix(),
            view,
            projection,
            eye.to_vec(),
        );
    }
}

pub fn render_scene(ctx: &mut RendererContext) {
    ctx.device.clear(ctx.config.background);

    ctx.upload_camera();
    ctx.environment.upload(&mut ctx.program);
    ctx.config.material.upload(&mut ctx.program);
    let program = &mut ctx.program;
    program.set_uniform("ShadingModel", Uniform::UInt(ctx.config.shading as u32));
    program.set_uniform("Wireframe", Uniform::UInt(ctx.config.is_wireframe as u32));
    program.set_uniform("LineColor", Uniform::Color(ctx.config.line_color));

    let samplers = [
        (TextureKind::Diffuse, "DiffuseTexture"),
        (TextureKind::Normal, "NormalTexture"),
    ];
    for (kind, sampler) in samplers {
        if ctx.textures.get(kind).is_some() {
            ctx.textures
                .bind_attach(kind, &mut ctx.device, &mut ctx.program, sampler);
        }
    }

    ctx.object.mesh.render(&mut ctx.device, &ctx.program);
    for &lines in &ctx.config.debug_lines {
        ctx.object.mesh.render_debug(&mut ctx.device, &ctx.program, lines);
    }

    for (kind, _) in samplers {
        if ctx.textures.slot(kind).is_some() {
            ctx.textures.unbind(kind, &mut ctx.device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(mesh: MeshSource) -> Config {
        Config {
            width: 32,
            height: 32,
            mesh,
            ..Default::default()
        }
    }

    #[test]
    fn model_matrix_applies_scale_then_rotation_then_translation() {
        let mut object = RenderObject::new(TriangleMesh::new());
        object.position = Vector3::new(1., 0., 0.);
        object.rotation = Vector3::new(0., 0., std::f32::consts::FRAC_PI_2);
        object.scale = Vector3::new(2., 2., 2.);
        let p = object.model_matrix() * Vector3::new(1., 0., 0.).extend(1.);
        assert!((p.truncate() - Vector3::new(1., 2., 0.)).magnitude() < 1e-5);
    }

    #[test]
    fn shape_names() {
        assert_eq!("Sphere".parse::<Shape>(), Ok(Shape::Sphere));
        assert_eq!(Shape::Plane.to_string(), "plane");
        assert!("cube".parse::<Shape>().is_err());
    }

    #[test]
    fn failed_load_keeps_previous_mesh() {
        let mut ctx = init(small(MeshSource::Shape(Shape::Triangle))).unwrap();
        assert!(!ctx.load_mesh(MeshSource::File("missing.obj".into())));
        assert_eq!(ctx.object().mesh.vertex_count(), 3);
        assert!(ctx.object().mesh.is_built());
        assert_eq!(ctx.config().mesh, MeshSource::Shape(Shape::Triangle));
    }

    #[test]
    fn reloading_replaces_device_buffers() {
        let mut ctx = init(small(MeshSource::Shape(Shape::Triangle))).unwrap();
        // surface plus four line sets, each a vertex and an index buffer
        assert_eq!(ctx.device().buffer_count(), 10);
        assert!(ctx.load_mesh(MeshSource::Shape(Shape::Plane)));
        assert_eq!(ctx.device().buffer_count(), 10);
        assert_eq!(ctx.object().mesh.vertex_count(), 4);
    }

    #[test]
    fn init_fails_without_mesh() {
        assert!(init(small(MeshSource::File("missing.obj".into()))).is_none());
    }

    #[test]
    fn render_scene_draws_over_background() {
        let mut ctx = init(small(MeshSource::Shape(Shape::Sphere))).unwrap();
        render_scene(&mut ctx);
        let background = Color::from_rgba8(Color::GRAY.to_rgba8());
        assert_eq!(ctx.device().pixel(0, 0), background);
        assert_ne!(ctx.device().pixel(16, 16), background);
        assert_eq!(ctx.device().draw_calls(), 1);
    }

    #[test]
    fn debug_lines_add_draw_calls() {
        let mut config = small(MeshSource::Shape(Shape::Triangle));
        config.debug_lines = DebugLines::ALL.to_vec();
        let mut ctx = init(config).unwrap();
        render_scene(&mut ctx);
        assert_eq!(ctx.device().draw_calls(), 5);
    }

    #[test]
    fn projector_switch_regenerates_uvs() {
        let mut ctx = init(small(MeshSource::Shape(Shape::Sphere))).unwrap();
        let before = ctx.object().mesh.vertex(0).uv;
        ctx.set_projector(Projector::Spherical);
        assert_eq!(ctx.object().mesh.projector(), Projector::Spherical);
        assert_ne!(ctx.object().mesh.vertex(0).uv, before);
    }
}
