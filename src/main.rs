use std::path::PathBuf;

use cgmath::Vector3;
use clap::Parser;

use toy_shading::{
    init,
    lighting::ShadingModel,
    mesh::{DebugLines, Projector},
    render_scene, Config, MeshSource, Shape,
};

#[derive(Parser)]
#[command(name = "toy-shading")]
#[command(version, about = "Renders a lit triangle mesh into an image file")]
struct Args {
    /// Wavefront .obj file to render.
    #[arg(long, conflicts_with = "shape")]
    mesh: Option<PathBuf>,

    /// Sample shape rendered when no mesh is given (plane, triangle, sphere).
    #[arg(long, default_value = "sphere")]
    shape: Shape,

    /// Texture coordinate projection (cylindrical, spherical).
    #[arg(long, default_value = "cylindrical")]
    projector: Projector,

    #[arg(long, default_value_t = 512)]
    width: u32,

    #[arg(long, default_value_t = 512)]
    height: u32,

    /// Direction the light travels in.
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    light: Option<Vec<f32>>,

    /// Draw triangle outlines instead of shaded faces.
    #[arg(long)]
    wireframe: bool,

    /// Draw vertex normals.
    #[arg(long)]
    normals: bool,

    /// Draw vertex tangents.
    #[arg(long)]
    tangents: bool,

    /// Draw vertex bitangents.
    #[arg(long)]
    bitangents: bool,

    /// Draw face normals from each triangle centroid.
    #[arg(long)]
    face_normals: bool,

    /// Use the Blinn half vector for specular highlights.
    #[arg(long)]
    blinn: bool,

    /// Diffuse texture (png, tga or bmp).
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Height map turned into a normal map.
    #[arg(long)]
    height_map: Option<PathBuf>,

    /// Image to write; the extension picks the format.
    #[arg(short, long, default_value = "output.png")]
    output: PathBuf,
}

impl Args {
    fn into_config(self) -> Config {
        let defaults = Config::default();
        let debug_lines = [
            (self.normals, DebugLines::VertexNormals),
            (self.tangents, DebugLines::VertexTangents),
            (self.bitangents, DebugLines::VertexBitangents),
            (self.face_normals, DebugLines::FaceNormals),
        ]
        .iter()
        .filter(|(enabled, _)| *enabled)
        .map(|&(_, lines)| lines)
        .collect();

        Config {
            width: self.width,
            height: self.height,
            mesh: match self.mesh {
                Some(path) => MeshSource::File(path),
                None => MeshSource::Shape(self.shape),
            },
            projector: self.projector,
            light_direction: match self.light.as_deref() {
                Some(&[x, y, z]) => Vector3::new(x, y, z),
                _ => defaults.light_direction,
            },
            is_wireframe: self.wireframe,
            debug_lines,
            shading: if self.blinn {
                ShadingModel::Blinn
            } else {
                ShadingModel::Phong
            },
            diffuse_texture: self.texture,
            height_map: self.height_map,
            ..defaults
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let output = args.output.clone();
    let config = args.into_config();

    let mut ctx = match init(config) {
        Some(ctx) => ctx,
        None => {
            eprintln!("Error: nothing to render");
            std::process::exit(1);
        }
    };
    render_scene(&mut ctx);

    if let Err(e) = ctx.device().save(&output) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    log::info!("wrote {}", output.display());
}
