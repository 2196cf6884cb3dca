//! A [`Device`] that rasterizes on the CPU
//!
//! Buffers are plain byte vectors keyed by handle. Drawing decodes the bound
//! array and element buffers back into [`GpuVertex`] and `u32` values and
//! runs them through the rasterizer, shading every pixel with the lights,
//! material and matrices found in the [`ShaderProgram`].
//!
//! Uniforms read while drawing:
//!
//! | name | type | default |
//! |------|------|---------|
//! | `ModelMatrix`, `ViewMatrix`, `ProjectionMatrix` | `Mat4` | identity |
//! | `EyePosition` | `Vec3` | origin |
//! | `ShadingModel` | `UInt` | Phong |
//! | `Wireframe` | `UInt` | 0 |
//! | `LineColor` | `Color` | white |
//! | `DiffuseTexture`, `NormalTexture` | `UInt` slot | unset |
//!
//! together with the names written by [`Environment::upload`] and
//! [`Material::upload`].
use std::{collections::HashMap, mem, path::Path, rc::Rc};

use cgmath::{prelude::*, Matrix4, Vector2, Vector3};

use crate::error::Result;
use crate::gpu::{
    BufferHandle, BufferTarget, Device, GpuVertex, ShaderProgram, Topology, Uniform, TEXTURE_UNITS,
};
use crate::lighting::{Color, Environment, Material, ShadingModel};
use crate::rasterizer::{self, interpolate};
use crate::texture::Texture;
use crate::utils::FrameBuffer;
use crate::wireframe;

/// Uniform storage for the software device.
#[derive(Clone, Debug, Default)]
pub struct SoftwareProgram {
    uniforms: HashMap<String, Uniform>,
}

impl SoftwareProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.uniforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty()
    }

    pub fn clear(&mut self) {
        self.uniforms.clear();
    }
}

impl ShaderProgram for SoftwareProgram {
    fn set_uniform(&mut self, name: &str, value: Uniform) {
        self.uniforms.insert(name.to_string(), value);
    }

    fn uniform(&self, name: &str) -> Option<Uniform> {
        self.uniforms.get(name).copied()
    }
}

#[derive(Debug)]
struct StoredBuffer {
    target: BufferTarget,
    data: Vec<u8>,
}

/// Everything a draw call needs, read once from the program.
struct DrawState<'a> {
    model: Matrix4<f32>,
    normal_matrix: Matrix4<f32>,
    view_projection: Matrix4<f32>,
    eye: Vector3<f32>,
    shading: ShadingModel,
    wireframe: bool,
    line_color: [u8; 4],
    environment: Environment,
    material: Material,
    diffuse_map: Option<&'a Texture>,
    normal_map: Option<&'a Texture>,
}

/// A vertex after the model transform.
#[derive(Clone, Copy, Debug)]
struct Transformed {
    world: Vector3<f32>,
    screen: Vector3<f32>,
    normal: Vector3<f32>,
    tangent: Vector3<f32>,
    bitangent: Vector3<f32>,
    uv: Vector2<f32>,
}

#[derive(Debug)]
pub struct SoftwareDevice {
    buffers: HashMap<u32, StoredBuffer>,
    next_handle: u32,
    array_binding: Option<BufferHandle>,
    element_binding: Option<BufferHandle>,
    textures: [Option<Rc<Texture>>; TEXTURE_UNITS],
    frame: FrameBuffer,
    draw_calls: usize,
}

impl SoftwareDevice {
    pub fn new(width: usize, height: usize) -> Self {
        SoftwareDevice {
            buffers: HashMap::new(),
            next_handle: 1,
            array_binding: None,
            element_binding: None,
            textures: Default::default(),
            frame: FrameBuffer::new(width, height),
            draw_calls: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn clear(&mut self, color: Color) {
        self.frame.clear(&color.to_rgba8());
    }

    /// RGBA8 pixels, top row first.
    pub fn frame(&self) -> &[u8] {
        self.frame.as_bytes()
    }

    /// Color at `(x, y)` counted from the bottom left corner.
    pub fn pixel(&self, x: usize, y: usize) -> Color {
        Color::from_rgba8(self.frame.pixel(x, y))
    }

    /// Writes the frame buffer in the format implied by the extension of
    /// `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        image::save_buffer(
            path,
            self.frame.as_bytes(),
            self.frame.width() as u32,
            self.frame.height() as u32,
            image::ColorType::Rgba8,
        )?;
        Ok(())
    }

    pub fn buffer(&self, handle: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&handle.0).map(|b| b.data.as_slice())
    }

    /// Number of live buffers.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn bound_buffer(&self, target: BufferTarget) -> Option<BufferHandle> {
        match target {
            BufferTarget::Array => self.array_binding,
            BufferTarget::ElementArray => self.element_binding,
        }
    }

    pub fn texture(&self, slot: u8) -> Option<&Rc<Texture>> {
        self.textures.get(slot as usize).and_then(|t| t.as_ref())
    }

    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }

    fn bound_data(&self, target: BufferTarget) -> Option<&[u8]> {
        let handle = self.bound_buffer(target)?;
        let stored = self.buffers.get(&handle.0)?;
        debug_assert_eq!(stored.target, target);
        Some(&stored.data)
    }

    fn sampler(&self, program: &dyn ShaderProgram, name: &str) -> Option<&Texture> {
        match program.uniform(name)? {
            Uniform::UInt(slot) => self.textures.get(slot as usize)?.as_deref(),
            _ => None,
        }
    }

    fn draw_state(&self, program: &dyn ShaderProgram) -> DrawState<'_> {
        let mat4 = |name| match program.uniform(name) {
            Some(Uniform::Mat4(m)) => m,
            _ => Matrix4::identity(),
        };
        let model = mat4("ModelMatrix");
        let flag = |name| matches!(program.uniform(name), Some(Uniform::UInt(v)) if v != 0);
        DrawState {
            model,
            normal_matrix: model.invert().map(|m| m.transpose()).unwrap_or(model),
            view_projection: mat4("ProjectionMatrix") * mat4("ViewMatrix"),
            eye: match program.uniform("EyePosition") {
                Some(Uniform::Vec3(v)) => v,
                _ => Vector3::zero(),
            },
            shading: if program.uniform("ShadingModel") == Some(Uniform::UInt(ShadingModel::Blinn as u32)) {
                ShadingModel::Blinn
            } else {
                ShadingModel::Phong
            },
            wireframe: flag("Wireframe"),
            line_color: match program.uniform("LineColor") {
                Some(Uniform::Color(c)) => c.to_rgba8(),
                _ => Color::WHITE.to_rgba8(),
            },
            environment: Environment::from_uniforms(program),
            material: Material::from_uniforms(program),
            diffuse_map: self.sampler(program, "DiffuseTexture"),
            normal_map: self.sampler(program, "NormalTexture"),
        }
    }
}

fn decode_vertices(data: &[u8]) -> Vec<GpuVertex> {
    data.chunks_exact(mem::size_of::<GpuVertex>())
        .map(bytemuck::pod_read_unaligned)
        .collect()
}

fn decode_indices(data: &[u8]) -> Vec<u32> {
    data.chunks_exact(mem::size_of::<u32>())
        .map(bytemuck::pod_read_unaligned)
        .collect()
}

impl DrawState<'_> {
    /// Applies the model and view-projection transforms. `None` when the
    /// vertex lies in front of the near plane or behind the eye.
    fn transform(&self, v: &GpuVertex, width: usize, height: usize) -> Option<Transformed> {
        let world = (self.model * Vector3::from(v.position).extend(1.)).truncate();
        let clip = self.view_projection * world.extend(1.);
        if clip.w <= 0. || clip.z < -clip.w {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let direction = |d: [f32; 3]| (self.normal_matrix * Vector3::from(d).extend(0.)).truncate();
        Some(Transformed {
            world,
            screen: Vector3::new(
                (ndc.x + 1.) * (width as f32 - 1.) / 2.,
                (ndc.y + 1.) * (height as f32 - 1.) / 2.,
                -ndc.z,
            ),
            normal: direction(v.normal),
            tangent: direction(v.tangent),
            bitangent: direction(v.bitangent),
            uv: v.uv.into(),
        })
    }

    fn shade(&self, corners: &[Transformed; 3], bc: Vector3<f32>) -> [u8; 4] {
        let pick = |f: fn(&Transformed) -> Vector3<f32>| {
            interpolate(&[f(&corners[0]), f(&corners[1]), f(&corners[2])], bc)
        };
        let p = pick(|t| t.world);
        let mut n = pick(|t| t.normal);
        if n.magnitude2() > 0. {
            n = n.normalize();
        }
        let uv = interpolate(&[corners[0].uv, corners[1].uv, corners[2].uv], bc);

        if let Some(normal_map) = self.normal_map {
            let t = pick(|t| t.tangent);
            let b = pick(|t| t.bitangent);
            if t.magnitude2() > 0. && b.magnitude2() > 0. {
                let texel = normal_map.sample(uv);
                let local = Vector3::new(texel.r, texel.g, texel.b) * 2. - Vector3::new(1., 1., 1.);
                let mapped = t.normalize() * local.x + b.normalize() * local.y + n * local.z;
                if mapped.magnitude2() > 0. {
                    n = mapped.normalize();
                }
            }
        }

        let diffuse = match self.diffuse_map {
            Some(texture) => texture.sample(uv),
            None => self.material.diffuse,
        };
        self.environment
            .shade(self.shading, &self.material, diffuse, p, n, self.eye)
            .to_rgba8()
    }
}

impl Device for SoftwareDevice {
    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> Option<BufferHandle> {
        let handle = BufferHandle(self.next_handle);
        self.next_handle = self.next_handle.checked_add(1)?;
        self.buffers.insert(
            handle.0,
            StoredBuffer {
                target,
                data: data.to_vec(),
            },
        );
        Some(handle)
    }

    fn delete_buffer(&mut self, handle: BufferHandle) {
        if self.buffers.remove(&handle.0).is_none() {
            log::warn!("deleting unknown buffer {}", handle.0);
        }
        if self.array_binding == Some(handle) {
            self.array_binding = None;
        }
        if self.element_binding == Some(handle) {
            self.element_binding = None;
        }
    }

    fn bind_buffer(&mut self, target: BufferTarget, handle: Option<BufferHandle>) {
        match target {
            BufferTarget::Array => self.array_binding = handle,
            BufferTarget::ElementArray => self.element_binding = handle,
        }
    }

    fn bind_texture(&mut self, slot: u8, texture: Option<Rc<Texture>>) {
        match self.textures.get_mut(slot as usize) {
            Some(bound) => *bound = texture,
            None => log::warn!("texture slot {} out of range", slot),
        }
    }

    fn draw_elements(&mut self, topology: Topology, index_count: usize, program: &dyn ShaderProgram) {
        let (vertices, indices) = match (
            self.bound_data(BufferTarget::Array),
            self.bound_data(BufferTarget::ElementArray),
        ) {
            (Some(v), Some(i)) => (decode_vertices(v), decode_indices(i)),
            _ => {
                log::warn!("draw call without bound vertex and index buffers");
                return;
            }
        };
        if index_count > indices.len() {
            log::warn!(
                "draw call reads {} indices from a buffer holding {}",
                index_count,
                indices.len()
            );
        }
        self.draw_calls += 1;

        let (width, height) = (self.frame.width(), self.frame.height());
        // the frame is taken out so the draw state can borrow bound textures
        let mut frame = mem::replace(&mut self.frame, FrameBuffer::new(0, 0));
        {
            let state = self.draw_state(program);
            let transformed: Vec<Option<Transformed>> = vertices
                .iter()
                .map(|v| state.transform(v, width, height))
                .collect();
            let corner = |i: u32| transformed.get(i as usize).copied().flatten();

            let count = index_count.min(indices.len());
            match topology {
                Topology::Lines => {
                    for pair in indices[..count].chunks_exact(2) {
                        if let (Some(a), Some(b)) = (corner(pair[0]), corner(pair[1])) {
                            wireframe::draw_segment(
                                a.screen.truncate(),
                                b.screen.truncate(),
                                &mut frame,
                                &state.line_color,
                            );
                        }
                    }
                }
                Topology::Triangles => {
                    for tri in indices[..count].chunks_exact(3) {
                        let corners = match (corner(tri[0]), corner(tri[1]), corner(tri[2])) {
                            (Some(a), Some(b), Some(c)) => [a, b, c],
                            _ => continue,
                        };
                        let screen = [corners[0].screen, corners[1].screen, corners[2].screen];
                        if state.wireframe {
                            wireframe::draw_triangle_edges(&screen, &mut frame, &state.line_color);
                        } else {
                            rasterizer::rasterize_triangle(&screen, &mut frame, |bc| {
                                state.shade(&corners, bc)
                            });
                        }
                    }
                }
            }
        }
        self.frame = frame;
    }
}

/// The matrices a draw call reads, as uniforms.
pub fn upload_transforms(
    program: &mut dyn ShaderProgram,
    model: Matrix4<f32>,
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
    eye: Vector3<f32>,
) {
    program.set_uniform("ModelMatrix", Uniform::Mat4(model));
    program.set_uniform("ViewMatrix", Uniform::Mat4(view));
    program.set_uniform("ProjectionMatrix", Uniform::Mat4(projection));
    program.set_uniform("EyePosition", Uniform::Vec3(eye));
}
