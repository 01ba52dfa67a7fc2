/// Scene renderer: layout presets, projection into frames and the draw step.
///
/// `render_params` is a pure mapping from viewport state to what gets
/// drawn. `SceneRenderer::draw` is the only place that touches a surface,
/// and under the on-demand frame loop it skips the surface entirely when
/// nothing that affects the picture has changed.
use crate::asset::{AssetHandle, Model};
use crate::config::{FrameLoop, SceneConfig};
use crate::layout::LayoutMode;
use crate::lighting::LightRig;
use crate::projection::{Camera, OrbitControls};
use crate::scroll::CameraAzimuth;
use crate::transform::ModelPreset;
use crate::viewport::ViewportState;

/// Everything the draw step needs from the derived state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    pub layout: LayoutMode,
    pub preset: ModelPreset,
    /// Camera azimuth in radians
    pub azimuth: f32,
}

/// Select the preset for `layout` and pair it with the camera azimuth
pub fn render_params(config: &SceneConfig, layout: LayoutMode, azimuth: CameraAzimuth) -> RenderParams {
    let preset = match layout {
        LayoutMode::Compact => config.compact,
        LayoutMode::Standard => config.standard,
    };
    RenderParams {
        layout,
        preset,
        azimuth: azimuth.radians(),
    }
}

/// A projected, shaded triangle in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTriangle {
    /// `(x, y, depth)` per corner, depth in NDC
    pub points: [(f32, f32, f32); 3],
    /// Light received, 0..1
    pub brightness: f32,
}

impl ScreenTriangle {
    pub fn mean_depth(&self) -> f32 {
        self.points.iter().map(|p| p.2).sum::<f32>() / 3.0
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub triangles: Vec<ScreenTriangle>,
}

impl Frame {
    /// Transform, cull, shade and project `model` for a `width` x `height` surface
    pub fn project(
        model: &Model,
        preset: &ModelPreset,
        camera: &Camera,
        lights: &LightRig,
        width: u32,
        height: u32,
    ) -> Self {
        let model_matrix = preset.model_matrix();
        // vertices are already in world space, so only view and projection remain
        let view_projection = camera.view_projection();
        let world = model.mesh.transformed(&model_matrix);

        let mut triangles = Vec::with_capacity(world.triangles.len());
        for triangle in &world.triangles {
            let normal = triangle.calculate_normal();
            let centroid = triangle.centroid();
            if normal.dot(&(camera.position - centroid)) <= 0.0 {
                continue;
            }

            let corners = triangle
                .vertices
                .map(|v| Camera::project_to_screen(&view_projection, &v.position, width, height));
            let [Some(a), Some(b), Some(c)] = corners else {
                continue;
            };

            let brightness = lights.irradiance(&centroid, &normal).clamp(0.0, 1.0);
            triangles.push(ScreenTriangle {
                points: [a, b, c],
                brightness,
            });
        }

        Self {
            width,
            height,
            triangles,
        }
    }
}

/// A drawable target owned by a host
pub trait DrawSurface {
    type Error;

    /// Drawable size in surface units (pixels, terminal cells)
    fn size(&self) -> (u32, u32);

    /// Physical width over height; differs from `size` when units are not square
    fn aspect(&self) -> f32 {
        let (w, h) = self.size();
        if h == 0 {
            1.0
        } else {
            w as f32 / h as f32
        }
    }

    /// Shown while the asset streams in
    fn draw_placeholder(&mut self, progress: Option<f32>) -> Result<(), Self::Error>;

    fn draw_frame(&mut self, frame: &Frame) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DrawKey {
    params: RenderParams,
    ready: bool,
    progress: Option<f32>,
    size: (u32, u32),
}

pub struct SceneRenderer {
    config: SceneConfig,
    camera: Camera,
    controls: OrbitControls,
    last_drawn: Option<DrawKey>,
    invalidated: bool,
}

impl SceneRenderer {
    pub fn new(config: SceneConfig) -> Self {
        if let Err(e) = config.validate() {
            log::warn!("scene config not valid, drawing anyway: {}", e);
        }
        let camera = Camera::new(&config.canvas.camera, 1.0);
        let controls = OrbitControls::new(&camera, config.azimuth);
        Self {
            config,
            camera,
            controls,
            last_drawn: None,
            invalidated: false,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    /// Bind the state's azimuth to the controls and derive this frame's parameters
    pub fn params(&mut self, state: &ViewportState) -> RenderParams {
        self.controls.sync(state.azimuth);
        let azimuth = CameraAzimuth::from_radians(self.controls.azimuth(), &self.config.azimuth);
        render_params(&self.config, state.layout, azimuth)
    }

    /// User orbit gesture; returns whether the view moved
    pub fn drag(&mut self, dx_px: f32, viewport_height_px: f32) -> bool {
        self.controls.drag(dx_px, viewport_height_px)
    }

    /// Force the next `draw` to produce a frame
    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    /// Draw if the frame loop calls for it; returns whether the surface was touched
    pub fn draw<S: DrawSurface>(
        &mut self,
        surface: &mut S,
        asset: &AssetHandle<Model>,
        state: &ViewportState,
    ) -> Result<bool, S::Error> {
        let params = self.params(state);
        let key = DrawKey {
            params,
            ready: asset.is_ready(),
            progress: match asset {
                AssetHandle::Loading { progress } => *progress,
                AssetHandle::Ready(_) => None,
            },
            size: surface.size(),
        };

        let due = match self.config.canvas.frame_loop {
            FrameLoop::Always => true,
            FrameLoop::Demand => self.invalidated || self.last_drawn != Some(key),
            FrameLoop::Never => self.invalidated,
        };
        if !due {
            return Ok(false);
        }

        match asset {
            AssetHandle::Loading { progress } => surface.draw_placeholder(*progress)?,
            AssetHandle::Ready(model) => {
                self.controls.update(&mut self.camera);
                self.camera.set_aspect(surface.aspect());
                let (width, height) = key.size;
                let frame = Frame::project(model, &params.preset, &self.camera, &self.config.lights, width, height);
                log::debug!(
                    "frame {}x{}: {} of {} triangles visible",
                    width,
                    height,
                    frame.triangles.len(),
                    model.mesh.triangles.len()
                );
                surface.draw_frame(&frame)?;
            }
        }

        self.last_drawn = Some(key);
        self.invalidated = false;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Mesh, Triangle, Vertex};
    use crate::projection::CameraConfig;
    use crate::scroll::{AzimuthRange, ScrollProgress};
    use nalgebra::{Point3, Vector3};
    use std::f32::consts::PI;

    #[derive(Default)]
    struct RecordingSurface {
        size: (u32, u32),
        placeholders: Vec<Option<f32>>,
        frames: Vec<Frame>,
    }

    impl RecordingSurface {
        fn new(width: u32, height: u32) -> Self {
            Self {
                size: (width, height),
                ..Self::default()
            }
        }

        fn draws(&self) -> usize {
            self.placeholders.len() + self.frames.len()
        }
    }

    impl DrawSurface for RecordingSurface {
        type Error = std::convert::Infallible;

        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn draw_placeholder(&mut self, progress: Option<f32>) -> Result<(), Self::Error> {
            self.placeholders.push(progress);
            Ok(())
        }

        fn draw_frame(&mut self, frame: &Frame) -> Result<(), Self::Error> {
            self.frames.push(frame.clone());
            Ok(())
        }
    }

    fn state(layout: LayoutMode, progress: f32) -> ViewportState {
        ViewportState {
            layout,
            azimuth: CameraAzimuth::from_progress(ScrollProgress::new(progress), &AzimuthRange::default()),
            revision: 0,
        }
    }

    fn cube_model() -> Model {
        Model::new("cube", Mesh::cuboid(Point3::origin(), Vector3::new(4.0, 4.0, 4.0)))
    }

    #[test]
    fn test_compact_params() {
        let config = SceneConfig::default();
        let params = render_params(&config, LayoutMode::Compact, CameraAzimuth::initial(&config.azimuth));
        assert_eq!(params.preset.scale, 0.13);
        assert_eq!(params.preset.position, [0.0, -3.0, -2.2]);
        assert_eq!(params.azimuth, -PI / 18.0);
    }

    #[test]
    fn test_standard_params() {
        let config = SceneConfig::default();
        let params = render_params(&config, LayoutMode::Standard, CameraAzimuth::initial(&config.azimuth));
        assert_eq!(params.preset.scale, 0.3);
        assert_eq!(params.preset.position, [-1.25, -1.25, 10.0]);
    }

    #[test]
    fn test_placeholder_while_loading() {
        let mut renderer = SceneRenderer::new(SceneConfig::default());
        let mut surface = RecordingSurface::new(80, 40);
        let mut asset: AssetHandle<Model> = AssetHandle::loading();

        assert!(renderer.draw(&mut surface, &asset, &state(LayoutMode::Standard, 0.0)).unwrap());
        assert_eq!(surface.placeholders, vec![None]);

        asset.set_progress(0.5);
        assert!(renderer.draw(&mut surface, &asset, &state(LayoutMode::Standard, 0.0)).unwrap());
        assert_eq!(surface.placeholders, vec![None, Some(0.5)]);
        assert!(surface.frames.is_empty());
    }

    #[test]
    fn test_demand_loop_skips_unchanged_frames() {
        let mut renderer = SceneRenderer::new(SceneConfig::default());
        let mut surface = RecordingSurface::new(80, 40);
        let asset = AssetHandle::Ready(cube_model());
        let s = state(LayoutMode::Standard, 0.25);

        assert!(renderer.draw(&mut surface, &asset, &s).unwrap());
        assert!(!renderer.draw(&mut surface, &asset, &s).unwrap());
        assert_eq!(surface.draws(), 1);

        // layout change
        assert!(renderer.draw(&mut surface, &asset, &state(LayoutMode::Compact, 0.25)).unwrap());
        // scroll change
        assert!(renderer.draw(&mut surface, &asset, &state(LayoutMode::Compact, 0.75)).unwrap());
        // resize
        surface.size = (100, 40);
        assert!(renderer.draw(&mut surface, &asset, &state(LayoutMode::Compact, 0.75)).unwrap());
        // explicit request
        renderer.invalidate();
        assert!(renderer.draw(&mut surface, &asset, &state(LayoutMode::Compact, 0.75)).unwrap());
        assert_eq!(surface.draws(), 5);
    }

    #[test]
    fn test_never_loop_waits_for_invalidate() {
        let mut config = SceneConfig::default();
        config.canvas.frame_loop = FrameLoop::Never;
        let mut renderer = SceneRenderer::new(config);
        let mut surface = RecordingSurface::new(80, 40);
        let asset = AssetHandle::Ready(cube_model());

        assert!(!renderer.draw(&mut surface, &asset, &state(LayoutMode::Standard, 0.0)).unwrap());
        renderer.invalidate();
        assert!(renderer.draw(&mut surface, &asset, &state(LayoutMode::Standard, 0.0)).unwrap());
        assert!(!renderer.draw(&mut surface, &asset, &state(LayoutMode::Compact, 1.0)).unwrap());
    }

    #[test]
    fn test_always_loop_draws_every_call() {
        let mut config = SceneConfig::default();
        config.canvas.frame_loop = FrameLoop::Always;
        let mut renderer = SceneRenderer::new(config);
        let mut surface = RecordingSurface::new(80, 40);
        let asset = AssetHandle::Ready(cube_model());
        for _ in 0..3 {
            renderer.draw(&mut surface, &asset, &state(LayoutMode::Standard, 0.0)).unwrap();
        }
        assert_eq!(surface.frames.len(), 3);
    }

    #[test]
    fn test_ready_model_produces_visible_triangles() {
        let mut config = SceneConfig::default();
        config.standard = ModelPreset {
            scale: 1.0,
            position: [0.0, 0.0, 0.0],
            rotation: Default::default(),
        };
        let mut renderer = SceneRenderer::new(config);
        let mut surface = RecordingSurface::new(200, 100);
        let asset = AssetHandle::Ready(cube_model());

        renderer.draw(&mut surface, &asset, &state(LayoutMode::Standard, 0.5)).unwrap();
        let frame = &surface.frames[0];
        assert_eq!((frame.width, frame.height), (200, 100));
        // at most three faces of a cube face the camera
        assert!(!frame.triangles.is_empty());
        assert!(frame.triangles.len() <= 6);
        for t in &frame.triangles {
            assert!((0.0..=1.0).contains(&t.brightness));
        }
    }

    #[test]
    fn test_standard_preset_applied_once() {
        let preset = ModelPreset::standard();
        let camera = Camera::new(&CameraConfig::default(), 2.0);
        let vertex = |x, y| Vertex::from_parts(Point3::new(x, y, 0.0), Vector3::z());
        let (a, b, c) = (vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(0.0, 1.0));
        // both windings, so one of them survives back-face culling
        let mut mesh = Mesh::new();
        mesh.add_triangle(Triangle::new(a, b, c));
        mesh.add_triangle(Triangle::new(a, c, b));
        let model = Model::new("tri", mesh);

        let frame = Frame::project(&model, &preset, &camera, &LightRig::default(), 200, 100);
        assert_eq!(frame.triangles.len(), 1);

        let expected = Camera::project_to_screen(
            &(camera.view_projection() * preset.model_matrix()),
            &a.position,
            200,
            100,
        )
        .unwrap();
        let actual = frame.triangles[0].points[0];
        assert!((actual.0 - expected.0).abs() < 1e-3, "{:?} vs {:?}", actual, expected);
        assert!((actual.1 - expected.1).abs() < 1e-3, "{:?} vs {:?}", actual, expected);
        assert!((actual.2 - expected.2).abs() < 1e-5, "{:?} vs {:?}", actual, expected);
    }

    #[test]
    fn test_scroll_turns_the_projected_model() {
        let mut renderer = SceneRenderer::new(SceneConfig::default());
        let mut surface = RecordingSurface::new(200, 100);
        let asset = AssetHandle::Ready(Model::placeholder());

        renderer.draw(&mut surface, &asset, &state(LayoutMode::Standard, 0.0)).unwrap();
        renderer.draw(&mut surface, &asset, &state(LayoutMode::Standard, 1.0)).unwrap();
        assert_eq!(surface.frames.len(), 2);
        assert!(!surface.frames[0].triangles.is_empty());
        assert_ne!(surface.frames[0], surface.frames[1]);
        assert!((renderer.controls().azimuth() - (PI / 4.0 - PI / 18.0)).abs() < 1e-6);
    }

    #[test]
    fn test_unvalidated_config_draws_without_panicking() {
        let mut config = SceneConfig::default();
        config.azimuth.min = 1.0;
        config.azimuth.max = -1.0;
        let range = config.azimuth;
        let mut renderer = SceneRenderer::new(config);
        let mut surface = RecordingSurface::new(80, 40);
        let asset = AssetHandle::Ready(cube_model());

        let s = ViewportState {
            layout: LayoutMode::Standard,
            azimuth: CameraAzimuth::from_progress(ScrollProgress::END, &range),
            revision: 0,
        };
        assert!(renderer.draw(&mut surface, &asset, &s).unwrap());
        renderer.drag(50.0, 600.0);
        let az = renderer.controls().azimuth();
        assert!((-1.0..=1.0).contains(&az));
    }

    #[test]
    fn test_drag_redraws_within_band() {
        let mut renderer = SceneRenderer::new(SceneConfig::default());
        let mut surface = RecordingSurface::new(80, 40);
        let asset = AssetHandle::Ready(cube_model());
        let s = state(LayoutMode::Standard, 0.0);

        renderer.draw(&mut surface, &asset, &s).unwrap();
        assert!(renderer.drag(-30.0, 600.0));
        assert!(renderer.draw(&mut surface, &asset, &s).unwrap());
        let az = renderer.controls().azimuth();
        assert!(az > -PI / 18.0 && az <= PI / 4.0);
    }
}
