/// Asset handle and model decoding
use std::path::Path;

use crate::error::{Error, Result};
use crate::geometry::{Bounds, Mesh};
use crate::{gltf_mesh, stl};

/// Where the scene looks for its model unless configured otherwise
pub const DEFAULT_MODEL_PATH: &str = "./aesthetic/scene.gltf";

/// A model that either is still streaming in or is ready to draw
#[derive(Debug, Clone, PartialEq)]
pub enum AssetHandle<T> {
    Loading { progress: Option<f32> },
    Ready(T),
}

impl<T> AssetHandle<T> {
    pub fn loading() -> Self {
        AssetHandle::Loading { progress: None }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, AssetHandle::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            AssetHandle::Ready(value) => Some(value),
            AssetHandle::Loading { .. } => None,
        }
    }

    /// Record loader progress; ignored once ready
    pub fn set_progress(&mut self, value: f32) {
        if let AssetHandle::Loading { progress } = self {
            *progress = Some(value.clamp(0.0, 1.0));
        }
    }

    pub fn resolve(&mut self, value: T) {
        *self = AssetHandle::Ready(value);
    }
}

impl<T> Default for AssetHandle<T> {
    fn default() -> Self {
        Self::loading()
    }
}

/// Decoders a model file can be routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFormat {
    Stl,
    Gltf,
}

impl AssetFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "stl" => Some(AssetFormat::Stl),
            "gltf" | "glb" => Some(AssetFormat::Gltf),
            _ => None,
        }
    }

    /// Sniff the format from content; anything unrecognised is treated as binary STL
    pub fn from_bytes(data: &[u8]) -> Self {
        let start = data
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(data.len());
        let body = &data[start..];
        if data.starts_with(b"glTF") || body.starts_with(b"{") {
            AssetFormat::Gltf
        } else {
            AssetFormat::Stl
        }
    }
}

/// The loaded scene graph, flattened to world-space triangles
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub name: String,
    pub mesh: Mesh,
    pub bounds: Option<Bounds>,
}

impl Model {
    pub fn new(name: impl Into<String>, mesh: Mesh) -> Self {
        let bounds = mesh.bounds();
        Self {
            name: name.into(),
            mesh,
            bounds,
        }
    }

    /// Procedural stand-in used when no asset file is supplied
    pub fn placeholder() -> Self {
        Self::new("desktop-computer", Mesh::desktop_computer())
    }
}

/// Decode a model from bytes.
///
/// `name`'s extension picks the decoder; without one the content is sniffed.
/// `base` is where a glTF document's external buffers are resolved from.
pub fn decode_model(name: &str, data: &[u8], base: Option<&Path>) -> Result<Model> {
    let format = format_for(name, Some(data))?;
    let mesh = match format {
        AssetFormat::Stl => stl::parse_stl(data)?,
        AssetFormat::Gltf => gltf_mesh::parse_gltf(data, base)?,
    };

    let model = Model::new(name, mesh);
    match model.bounds {
        Some(bounds) => log::info!(
            "decoded {} ({:?}, {} triangles, extent {:.2} x {:.2} x {:.2})",
            model.name,
            format,
            model.mesh.triangles.len(),
            bounds.size().x,
            bounds.size().y,
            bounds.size().z
        ),
        None => log::warn!("decoded {} but it contains no triangles", model.name),
    }
    Ok(model)
}

/// Load a model file from disk
pub fn load_model(path: &Path) -> Result<Model> {
    let name = path.display().to_string();
    format_for(&name, None)?;
    let data = std::fs::read(path)?;
    decode_model(&name, &data, path.parent())
}

fn format_for(name: &str, data: Option<&[u8]>) -> Result<AssetFormat> {
    let path = Path::new(name);
    match (path.extension(), data) {
        (None, Some(data)) => Ok(AssetFormat::from_bytes(data)),
        _ => AssetFormat::from_path(path).ok_or_else(|| Error::UnsupportedFormat(name.to_string())),
    }
}
