// image textures and the slots they are bound to

use std::{collections::HashMap, path::Path, rc::Rc};

use cgmath::{prelude::*, Vector2, Vector3};
use image::RgbImage;

use crate::error::{Error, Result};
use crate::gpu::{Device, ShaderProgram, Uniform, TEXTURE_UNITS};
use crate::lighting::Color;

/// Scale applied to height differences when deriving a normal map.
const HEIGHT_SCALE: f32 = 5.;

/// What a height lookup past the image border returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureWrap {
    /// The nearest border texel.
    RepeatBoundary,
    /// Zero height.
    ClampToZero,
}

/// A tightly packed RGB8 image.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl Texture {
    /// Wraps raw rows of RGB triples, first row first.
    ///
    /// Panics if `pixels` does not hold exactly `width * height` texels.
    pub fn from_rgb(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        assert_eq!(
            pixels.len(),
            width as usize * height as usize * 3,
            "pixel data does not match {}x{} RGB",
            width,
            height
        );
        Texture {
            pixels,
            width,
            height,
        }
    }

    fn decode(path: &Path) -> Result<RgbImage> {
        let image = image::open(path)?.to_rgb8();
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::UnsupportedImage(format!(
                "{} has no pixels",
                path.display()
            )));
        }
        Ok(image)
    }

    fn from_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Texture::from_rgb(image.into_raw(), width, height)
    }

    /// Decodes any image `image` reads into RGB. Alpha is dropped.
    pub fn load(path: impl AsRef<Path>) -> Option<Rc<Texture>> {
        let path = path.as_ref();
        match Self::decode(path) {
            Ok(image) => {
                log::debug!("loaded texture {} ({}x{})", path.display(), image.width(), image.height());
                Some(Rc::new(Self::from_image(image)))
            }
            Err(err) => {
                log::warn!("unable to read texture {}: {}", path.display(), err);
                None
            }
        }
    }

    /// Reads a height map from `path` and converts it with
    /// [`Texture::normal_map`].
    pub fn normal_map_from_height(
        path: impl AsRef<Path>,
        h_wrap: TextureWrap,
        v_wrap: TextureWrap,
    ) -> Option<Rc<Texture>> {
        let path = path.as_ref();
        match Self::decode(path) {
            Ok(image) => Some(Rc::new(Self::from_image(image).normal_map(h_wrap, v_wrap))),
            Err(err) => {
                log::warn!("unable to read height map {}: {}", path.display(), err);
                None
            }
        }
    }

    /// Treats the red channel as a height field and encodes its surface
    /// normals as `(n + 1) / 2` in RGB.
    ///
    /// Heights are differentiated with central differences. `h_wrap` governs
    /// lookups past the top and bottom rows, `v_wrap` past the left and right
    /// columns.
    pub fn normal_map(&self, h_wrap: TextureWrap, v_wrap: TextureWrap) -> Texture {
        let (w, h) = (self.width as i64, self.height as i64);
        let mut pixels = Vec::with_capacity(self.pixels.len());
        for i in 0..h {
            for j in 0..w {
                let hz = HEIGHT_SCALE
                    * (self.height_at(i + 1, j, h_wrap) - self.height_at(i - 1, j, h_wrap));
                let vz = HEIGHT_SCALE
                    * (self.height_at(i, j + 1, v_wrap) - self.height_at(i, j - 1, v_wrap));
                let s = Vector3::new(1., 0., hz);
                let t = Vector3::new(0., 1., vz);
                let n = s.cross(t).normalize();
                let encoded = (n + Vector3::new(1., 1., 1.)) * 0.5 * 255.;
                pixels.extend_from_slice(&[encoded.x as u8, encoded.y as u8, encoded.z as u8]);
            }
        }
        Texture::from_rgb(pixels, self.width, self.height)
    }

    /// Red channel at row `i`, column `j` in `[0, 1]`.
    fn height_at(&self, i: i64, j: i64, wrap: TextureWrap) -> f32 {
        let (w, h) = (self.width as i64, self.height as i64);
        let (i, j) = if (0..h).contains(&i) && (0..w).contains(&j) {
            (i, j)
        } else {
            match wrap {
                TextureWrap::ClampToZero => return 0.,
                TextureWrap::RepeatBoundary => (i.clamp(0, h - 1), j.clamp(0, w - 1)),
            }
        };
        self.pixels[((i * w + j) * 3) as usize] as f32 / 255.
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn texel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }

    /// Nearest texel at `uv`, repeating outside `[0, 1)`. `v = 0` is the
    /// last row.
    pub fn sample(&self, uv: Vector2<f32>) -> Color {
        let wrap = |t: f32, size: u32| {
            let t = t - t.floor();
            ((t * size as f32) as u32).min(size - 1)
        };
        let x = wrap(uv.x, self.width);
        let y = self.height - 1 - wrap(uv.y, self.height);
        let [r, g, b] = self.texel(x, y);
        Color::from_rgba8([r, g, b, 255])
    }
}

/// Role a texture plays when shading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Normal,
}

#[derive(Debug)]
struct Registered {
    texture: Rc<Texture>,
    slot: Option<u8>,
}

/// Owns the textures of a scene, one per [`TextureKind`], and hands out the
/// device's texture slots.
#[derive(Debug, Default)]
pub struct TextureManager {
    textures: HashMap<TextureKind, Registered>,
    slots: [bool; TEXTURE_UNITS],
}

impl TextureManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `path` as the texture of `kind`, replacing any previous one.
    /// A failed load leaves `kind` empty.
    pub fn register(
        &mut self,
        kind: TextureKind,
        path: impl AsRef<Path>,
        device: &mut dyn Device,
    ) -> Option<Rc<Texture>> {
        let texture = Texture::load(path);
        self.insert(kind, texture.clone(), device);
        texture
    }

    /// Derives a normal map from the height map at `path`. Borders read as
    /// zero height.
    pub fn register_normal_map(
        &mut self,
        kind: TextureKind,
        path: impl AsRef<Path>,
        device: &mut dyn Device,
    ) -> Option<Rc<Texture>> {
        let texture =
            Texture::normal_map_from_height(path, TextureWrap::ClampToZero, TextureWrap::ClampToZero);
        self.insert(kind, texture.clone(), device);
        texture
    }

    /// Stores an already decoded texture under `kind`. A previous texture
    /// of `kind` still bound is unbound from `device` first.
    pub fn insert(&mut self, kind: TextureKind, texture: Option<Rc<Texture>>, device: &mut dyn Device) {
        if let Some(old) = self.textures.remove(&kind) {
            if let Some(slot) = old.slot {
                self.release_slot(slot, device);
            }
        }
        if let Some(texture) = texture {
            self.textures.insert(kind, Registered { texture, slot: None });
        }
    }

    fn release_slot(&mut self, slot: u8, device: &mut dyn Device) {
        device.bind_texture(slot, None);
        self.slots[slot as usize] = false;
    }

    pub fn get(&self, kind: TextureKind) -> Option<&Rc<Texture>> {
        self.textures.get(&kind).map(|r| &r.texture)
    }

    /// Slot the texture of `kind` is bound to.
    pub fn slot(&self, kind: TextureKind) -> Option<u8> {
        self.textures.get(&kind).and_then(|r| r.slot)
    }

    /// Binds the texture of `kind` to the first free slot and points
    /// `sampler` at it. `false` when nothing is registered or every slot is
    /// taken.
    pub fn bind_attach(
        &mut self,
        kind: TextureKind,
        device: &mut dyn Device,
        program: &mut dyn ShaderProgram,
        sampler: &str,
    ) -> bool {
        let free = self.slots.iter().position(|used| !used);
        let registered = match self.textures.get_mut(&kind) {
            Some(r) => r,
            None => {
                log::warn!("cannot bind/attach with no texture registered to {:?}", kind);
                return false;
            }
        };
        let slot = match (registered.slot, free) {
            (Some(slot), _) => slot,
            (None, Some(slot)) => {
                let slot = slot as u8;
                device.bind_texture(slot, Some(registered.texture.clone()));
                registered.slot = Some(slot);
                self.slots[slot as usize] = true;
                slot
            }
            (None, None) => {
                log::warn!("all {} texture slots are bound, did you forget to unbind?", TEXTURE_UNITS);
                return false;
            }
        };
        program.set_uniform(sampler, Uniform::UInt(slot as u32));
        true
    }

    /// Frees the slot held by the texture of `kind`. `false` when nothing is
    /// registered for it.
    pub fn unbind(&mut self, kind: TextureKind, device: &mut dyn Device) -> bool {
        let registered = match self.textures.get_mut(&kind) {
            Some(r) => r,
            None => {
                log::warn!("cannot unbind with no texture registered to {:?}", kind);
                return false;
            }
        };
        match registered.slot.take() {
            Some(slot) => self.release_slot(slot, device),
            None => log::warn!("cannot unbind unbound {:?} texture", kind),
        }
        true
    }

    /// Drops every texture and unbinds the slots they held.
    pub fn clear(&mut self, device: &mut dyn Device) {
        let bound: Vec<u8> = self.textures.values().filter_map(|r| r.slot).collect();
        for slot in bound {
            self.release_slot(slot, device);
        }
        self.textures.clear();
    }
}
