//! Colors, lights and materials, and the Phong/Blinn evaluation that
//! combines them at a surface point
//!
//! Lights and materials travel to the draw call as named uniforms, the same
//! way a GPU program would receive them: [`Environment::upload`] and
//! [`Material::upload`] write them, the `from_uniforms` constructors read
//! them back.
use std::{
    fmt,
    ops::{Add, AddAssign, Mul, MulAssign},
    str::FromStr,
};

use bytemuck::{Pod, Zeroable};
use cgmath::{prelude::*, Vector3, Vector4};

use crate::gpu::{ShaderProgram, Uniform};

/// Number of lights a program accepts.
pub const MAX_LIGHTS: usize = 8;

/// Linear RGBA color with float components, usually in `[0, 1]`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const RED: Color = Color::rgb(1., 0., 0.);
    pub const GREEN: Color = Color::rgb(0., 1., 0.);
    pub const BLUE: Color = Color::rgb(0., 0., 1.);
    pub const YELLOW: Color = Color::rgb(1., 1., 0.);
    pub const CYAN: Color = Color::rgb(0., 1., 1.);
    pub const MAGENTA: Color = Color::rgb(1., 0., 1.);
    pub const WHITE: Color = Color::rgb(1., 1., 1.);
    pub const BLACK: Color = Color::rgb(0., 0., 0.);
    pub const GRAY: Color = Color::rgb(0.5, 0.5, 0.5);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    /// Opaque color.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color::new(r, g, b, 1.)
    }

    /// Unpacks an `0xAARRGGBB` word.
    pub fn from_argb(argb: u32) -> Self {
        let channel = |shift: u32| ((argb >> shift) & 0xff) as f32 / 255.;
        Color::new(channel(16), channel(8), channel(0), channel(24))
    }

    /// Packs into an `0xAARRGGBB` word. Components are truncated, not
    /// rounded.
    pub fn to_argb(self) -> u32 {
        let channel = |v: f32, shift: u32| (((v * 255.) as u32) & 0xff) << shift;
        channel(self.a, 24) | channel(self.r, 16) | channel(self.g, 8) | channel(self.b, 0)
    }

    /// Clamps to `[0, 1]` and quantizes for an 8-bit frame buffer.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0., 1.) * 255. + 0.5) as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    pub fn from_rgba8(rgba: [u8; 4]) -> Self {
        let f = |v: u8| v as f32 / 255.;
        Color::new(f(rgba[0]), f(rgba[1]), f(rgba[2]), f(rgba[3]))
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Color { a, ..self }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, rhs: Color) -> Color {
        Color::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b, self.a + rhs.a)
    }
}

impl AddAssign for Color {
    fn add_assign(&mut self, rhs: Color) {
        *self = *self + rhs;
    }
}

impl Mul for Color {
    type Output = Color;

    fn mul(self, rhs: Color) -> Color {
        Color::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b, self.a * rhs.a)
    }
}

impl MulAssign for Color {
    fn mul_assign(&mut self, rhs: Color) {
        *self = *self * rhs;
    }
}

/// Scales the color channels; alpha is left alone.
impl Mul<f32> for Color {
    type Output = Color;

    fn mul(self, s: f32) -> Color {
        Color::new(self.r * s, self.g * s, self.b * s, self.a)
    }
}

impl From<Color> for Vector4<f32> {
    fn from(c: Color) -> Self {
        Vector4::new(c.r, c.g, c.b, c.a)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightType {
    Directional = 0,
    Spot = 1,
    Point = 2,
}

impl LightType {
    fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(LightType::Directional),
            1 => Some(LightType::Spot),
            2 => Some(LightType::Point),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub kind: LightType,
    /// World position, ignored by directional lights.
    pub position: Vector3<f32>,
    /// Direction the light travels, used by directional and spot lights.
    pub direction: Vector3<f32>,
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub spot_inner: f32,
    pub spot_outer: f32,
    pub spot_falloff: f32,
    /// Size of the marker sphere drawn at the light position.
    pub radius: f32,
}

impl Default for Light {
    fn default() -> Self {
        Light {
            kind: LightType::Point,
            position: Vector3::zero(),
            direction: Vector3::unit_z(),
            ambient: Color::BLACK,
            diffuse: Color::rgb(0.8, 0.8, 0.8),
            specular: Color::WHITE,
            spot_inner: 15f32.to_radians(),
            spot_outer: 30f32.to_radians(),
            spot_falloff: 1.,
            radius: 0.25,
        }
    }
}

impl Light {
    pub fn directional(direction: Vector3<f32>) -> Self {
        Light {
            kind: LightType::Directional,
            direction,
            ..Default::default()
        }
    }

    pub fn point(position: Vector3<f32>) -> Self {
        Light {
            kind: LightType::Point,
            position,
            ..Default::default()
        }
    }

    pub fn spot(position: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Light {
            kind: LightType::Spot,
            position,
            direction,
            ..Default::default()
        }
    }

    fn uniform_name(index: usize, field: &str) -> String {
        format!("Lights[{}].{}", index, field)
    }

    pub fn upload(&self, program: &mut dyn ShaderProgram, index: usize) {
        let name = |field| Self::uniform_name(index, field);
        program.set_uniform(&name("type"), Uniform::UInt(self.kind as u32));
        program.set_uniform(&name("position"), Uniform::Vec3(self.position));
        program.set_uniform(&name("direction"), Uniform::Vec3(self.direction));
        program.set_uniform(&name("ambient"), Uniform::Color(self.ambient));
        program.set_uniform(&name("diffuse"), Uniform::Color(self.diffuse));
        program.set_uniform(&name("specular"), Uniform::Color(self.specular));
        program.set_uniform(&name("spotlight_innerCos"), Uniform::Float(self.spot_inner.cos()));
        program.set_uniform(&name("spotlight_outerCos"), Uniform::Float(self.spot_outer.cos()));
        program.set_uniform(&name("spotlight_falloff"), Uniform::Float(self.spot_falloff));
    }

    /// Reads back light `index`. `None` unless every field is present with
    /// the expected type.
    pub fn from_uniforms(program: &dyn ShaderProgram, index: usize) -> Option<Self> {
        let get = |field| program.uniform(&Self::uniform_name(index, field));
        let kind = match get("type")? {
            Uniform::UInt(v) => LightType::from_u32(v)?,
            _ => return None,
        };
        Some(Light {
            kind,
            position: vec3(get("position")?)?,
            direction: vec3(get("direction")?)?,
            ambient: color(get("ambient")?)?,
            diffuse: color(get("diffuse")?)?,
            specular: color(get("specular")?)?,
            spot_inner: float(get("spotlight_innerCos")?)?.clamp(-1., 1.).acos(),
            spot_outer: float(get("spotlight_outerCos")?)?.clamp(-1., 1.).acos(),
            spot_falloff: float(get("spotlight_falloff")?)?,
            radius: Light::default().radius,
        })
    }

    /// Unit vector from `p` toward the light and the attenuation factor.
    fn incidence(&self, p: Vector3<f32>, coefficients: Vector3<f32>) -> (Vector3<f32>, f32) {
        match self.kind {
            LightType::Directional => (-self.direction.normalize(), 1.),
            LightType::Spot | LightType::Point => {
                let to_light = self.position - p;
                let d = to_light.magnitude();
                let att = 1. / (coefficients.x + coefficients.y * d + coefficients.z * d * d);
                (to_light / d, att.min(1.))
            }
        }
    }

    /// Cone factor of a spot light for light vector `l`; 1 for other kinds.
    fn spot_factor(&self, l: Vector3<f32>) -> f32 {
        if self.kind != LightType::Spot {
            return 1.;
        }
        let cos_alpha = (-l).dot(self.direction.normalize());
        let (inner, outer) = (self.spot_inner.cos(), self.spot_outer.cos());
        if cos_alpha >= inner {
            1.
        } else if cos_alpha <= outer {
            0.
        } else {
            ((cos_alpha - outer) / (inner - outer)).powf(self.spot_falloff)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub emissive: Color,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            ambient: Color::rgb(0.25, 0.25, 0.25),
            diffuse: Color::rgb(0.25, 0.25, 0.25),
            specular: Color::rgb(0.25, 0.25, 0.25),
            emissive: Color::BLACK,
            shininess: 50.,
        }
    }
}

impl Material {
    pub fn upload(&self, program: &mut dyn ShaderProgram) {
        program.set_uniform("Material.ambient", Uniform::Color(self.ambient));
        program.set_uniform("Material.diffuse", Uniform::Color(self.diffuse));
        program.set_uniform("Material.specular", Uniform::Color(self.specular));
        program.set_uniform("Material.emissive", Uniform::Color(self.emissive));
        program.set_uniform("Material.shininess", Uniform::Float(self.shininess));
    }

    /// Material stored in `program`, falling back to the default for
    /// anything missing.
    pub fn from_uniforms(program: &dyn ShaderProgram) -> Self {
        let fallback = Material::default();
        let get_color = |name, default| program.uniform(name).and_then(color).unwrap_or(default);
        Material {
            ambient: get_color("Material.ambient", fallback.ambient),
            diffuse: get_color("Material.diffuse", fallback.diffuse),
            specular: get_color("Material.specular", fallback.specular),
            emissive: get_color("Material.emissive", fallback.emissive),
            shininess: program
                .uniform("Material.shininess")
                .and_then(float)
                .unwrap_or(fallback.shininess),
        }
    }
}

/// How the specular term is computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShadingModel {
    /// Reflected light vector against the view vector.
    #[default]
    Phong = 0,
    /// Half vector against the normal.
    Blinn = 1,
}

impl fmt::Display for ShadingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShadingModel::Phong => write!(f, "phong"),
            ShadingModel::Blinn => write!(f, "blinn"),
        }
    }
}

impl FromStr for ShadingModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "phong" => Ok(ShadingModel::Phong),
            "blinn" => Ok(ShadingModel::Blinn),
            other => Err(format!("unknown shading model `{}`", other)),
        }
    }
}

/// Everything besides the material that lights a scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Environment {
    pub global_ambient: Color,
    /// Constant, linear and quadratic distance attenuation.
    pub attenuation: Vector3<f32>,
    pub lights: Vec<Light>,
}

impl Default for Environment {
    fn default() -> Self {
        Environment {
            global_ambient: Color::rgb(0.2, 0.2, 0.2),
            attenuation: Vector3::new(1., 0.1, 0.),
            lights: vec![Light::default()],
        }
    }
}

impl Environment {
    /// Writes the environment into `program`. Lights past [`MAX_LIGHTS`]
    /// are dropped with a warning.
    pub fn upload(&self, program: &mut dyn ShaderProgram) {
        if self.lights.len() > MAX_LIGHTS {
            log::warn!(
                "{} lights requested, only the first {} are used",
                self.lights.len(),
                MAX_LIGHTS
            );
        }
        let count = self.lights.len().min(MAX_LIGHTS);
        program.set_uniform("globalAmbient", Uniform::Color(self.global_ambient));
        program.set_uniform("vLightAttCoef", Uniform::Vec3(self.attenuation));
        program.set_uniform("LightCount", Uniform::UInt(count as u32));
        for (i, light) in self.lights.iter().take(count).enumerate() {
            light.upload(program, i);
        }
    }

    pub fn from_uniforms(program: &dyn ShaderProgram) -> Self {
        let fallback = Environment::default();
        let count = match program.uniform("LightCount") {
            Some(Uniform::UInt(n)) => (n as usize).min(MAX_LIGHTS),
            _ => 0,
        };
        Environment {
            global_ambient: program
                .uniform("globalAmbient")
                .and_then(color)
                .unwrap_or(fallback.global_ambient),
            attenuation: program
                .uniform("vLightAttCoef")
                .and_then(vec3)
                .unwrap_or(fallback.attenuation),
            lights: (0..count)
                .filter_map(|i| Light::from_uniforms(program, i))
                .collect(),
        }
    }

    /// Lit color of surface point `p` with unit normal `n`, seen from `eye`.
    ///
    /// `diffuse` replaces the material's diffuse color, e.g. with a texel.
    pub fn shade(
        &self,
        model: ShadingModel,
        material: &Material,
        diffuse: Color,
        p: Vector3<f32>,
        n: Vector3<f32>,
        eye: Vector3<f32>,
    ) -> Color {
        let v = (eye - p).normalize();
        let mut total = material.emissive + self.global_ambient * material.ambient;
        for light in &self.lights {
            let (l, att) = light.incidence(p, self.attenuation);
            let n_dot_l = n.dot(l);
            let mut color = light.ambient * material.ambient;
            if n_dot_l > 0. {
                color += light.diffuse * diffuse * n_dot_l;
                let spec = match model {
                    ShadingModel::Phong => {
                        let r = n * (2. * n_dot_l) - l;
                        r.dot(v)
                    }
                    ShadingModel::Blinn => n.dot((l + v).normalize()),
                };
                if spec > 0. {
                    color += light.specular * material.specular * spec.powf(material.shininess);
                }
            }
            total += color * (att * light.spot_factor(l));
        }
        total.with_alpha(1.)
    }
}

fn float(u: Uniform) -> Option<f32> {
    match u {
        Uniform::Float(v) => Some(v),
        _ => None,
    }
}

fn vec3(u: Uniform) -> Option<Vector3<f32>> {
    match u {
        Uniform::Vec3(v) => Some(v),
        _ => None,
    }
}

fn color(u: Uniform) -> Option<Color> {
    match u {
        Uniform::Color(c) => Some(c),
        _ => None,
    }
}
