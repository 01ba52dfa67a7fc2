/// deskview core library - host-independent scene logic
///
/// This library derives viewport state from breakpoint and scroll signals,
/// maps it to render parameters, and projects the model into frames that a
/// host surface draws. Hosts supply the signal primitives and the surface.

pub mod asset;
pub mod config;
pub mod error;
pub mod geometry;
pub mod gltf_mesh;
pub mod layout;
pub mod lighting;
pub mod projection;
pub mod scene;
pub mod scroll;
pub mod stl;
pub mod transform;
pub mod viewport;

// Re-export commonly used types
pub use asset::{AssetHandle, Model};
pub use config::{CanvasConfig, FrameLoop, SceneConfig};
pub use error::{Error, Result};
pub use geometry::{Mesh, Triangle, Vertex};
pub use layout::{Breakpoint, LayoutMode};
pub use lighting::LightRig;
pub use projection::{Camera, OrbitControls};
pub use scene::{render_params, DrawSurface, Frame, RenderParams, SceneRenderer, ScreenTriangle};
pub use scroll::{AzimuthRange, CameraAzimuth, ScrollMetrics, ScrollProgress};
pub use transform::{ModelPreset, Transform};
pub use viewport::{Subscription, ViewportConfig, ViewportController, ViewportHost, ViewportState};
