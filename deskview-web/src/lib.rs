/// deskview web host
///
/// Draws the desktop computer scene onto a `<canvas>` with the 2D context.
/// The page's own scroll turns the camera and a `(max-width: ...)` media
/// query switches the layout. Redraws are coalesced into one animation frame.
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, Window};

use deskview_core::{
    asset, AssetHandle, Model, SceneConfig, SceneRenderer, Subscription, ViewportConfig, ViewportController,
};

pub mod canvas;
pub mod host;
pub mod logger;

pub use canvas::CanvasSurface;
pub use host::BrowserHost;

struct Viewer {
    renderer: SceneRenderer,
    surface: CanvasSurface,
    asset: AssetHandle<Model>,
    controller: Option<ViewportController>,
}

impl Viewer {
    fn render(&mut self) -> Result<bool, JsValue> {
        let Some(controller) = self.controller.as_ref() else {
            return Ok(false);
        };
        let state = controller.state();
        self.renderer.draw(&mut self.surface, &self.asset, &state)
    }
}

/// At most one pending `requestAnimationFrame` at a time
struct FrameScheduler {
    window: Window,
    pending: Rc<Cell<Option<i32>>>,
    callback: Closure<dyn FnMut()>,
}

impl FrameScheduler {
    fn new(window: Window, viewer: Weak<RefCell<Viewer>>) -> Self {
        let pending = Rc::new(Cell::new(None));
        let flag = Rc::clone(&pending);
        let callback = Closure::<dyn FnMut()>::new(move || {
            flag.set(None);
            let Some(viewer) = viewer.upgrade() else {
                return;
            };
            let Ok(mut viewer) = viewer.try_borrow_mut() else {
                log::warn!("frame skipped, viewer busy");
                return;
            };
            if let Err(e) = viewer.render() {
                log::error!("frame failed: {:?}", e);
            }
        });
        Self {
            window,
            pending,
            callback,
        }
    }

    fn request(&self) {
        if self.pending.get().is_some() {
            return;
        }
        match self
            .window
            .request_animation_frame(self.callback.as_ref().unchecked_ref())
        {
            Ok(id) => self.pending.set(Some(id)),
            Err(e) => log::warn!("requestAnimationFrame failed: {:?}", e),
        }
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        if let Some(id) = self.pending.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
    }
}

fn to_js(error: deskview_core::Error) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Size the canvas for the current window and device pixel ratio
fn fit(viewer: &mut Viewer, host: &BrowserHost) -> bool {
    let ratio = viewer.renderer.config().canvas.effective_dpr(host.device_pixel_ratio());
    viewer.surface.fit_to_container(ratio)
}

#[wasm_bindgen]
pub struct DeskView {
    host: Rc<BrowserHost>,
    viewer: Rc<RefCell<Viewer>>,
    scheduler: Rc<FrameScheduler>,
    resize: Option<Subscription>,
}

#[wasm_bindgen]
impl DeskView {
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<DeskView, JsValue> {
        Self::create(canvas_id, SceneConfig::default())
    }

    /// Like the constructor, with a JSON scene configuration
    #[wasm_bindgen(js_name = "withConfig")]
    pub fn with_config(canvas_id: &str, json: &str) -> Result<DeskView, JsValue> {
        let config = SceneConfig::from_json(json).map_err(to_js)?;
        Self::create(canvas_id, config)
    }

    /// Where the configured model lives, for the page to fetch
    #[wasm_bindgen(js_name = "modelPath")]
    pub fn model_path(&self) -> String {
        self.viewer.borrow().renderer.config().model_path.clone()
    }

    /// Decode fetched model bytes; `name`'s extension picks the format
    #[wasm_bindgen(js_name = "loadModel")]
    pub fn load_model(&self, bytes: &[u8], name: &str) -> Result<(), JsValue> {
        let model = asset::decode_model(name, bytes, None).map_err(|e| {
            log::error!("cannot decode {}: {}", name, e);
            to_js(e)
        })?;
        self.viewer.borrow_mut().asset.resolve(model);
        self.scheduler.request();
        Ok(())
    }

    /// Report download progress, 0..1
    #[wasm_bindgen(js_name = "setLoadProgress")]
    pub fn set_load_progress(&self, progress: f32) {
        self.viewer.borrow_mut().asset.set_progress(progress);
        self.scheduler.request();
    }

    /// Orbit by a horizontal pointer movement in CSS pixels
    pub fn drag(&self, dx: f32) {
        let mut viewer = self.viewer.borrow_mut();
        let height = viewer.surface.css_height();
        if viewer.renderer.drag(dx, height) {
            self.scheduler.request();
        }
    }

    /// Refit the canvas after its container changed size
    pub fn resize(&self) {
        if fit(&mut self.viewer.borrow_mut(), &self.host) {
            self.scheduler.request();
        }
    }

    /// Draw now; returns whether a frame was produced
    pub fn render(&self) -> Result<bool, JsValue> {
        self.viewer.borrow_mut().render()
    }

    /// Remove every listener; the canvas keeps its last frame
    pub fn destroy(&mut self) {
        if let Some(resize) = self.resize.take() {
            resize.release();
        }
        if let Some(controller) = self.viewer.borrow_mut().controller.take() {
            controller.unmount();
        }
        log::info!("deskview detached");
    }
}

impl DeskView {
    fn create(canvas_id: &str, config: SceneConfig) -> Result<DeskView, JsValue> {
        let host = Rc::new(BrowserHost::new()?);
        let canvas = host
            .window()
            .document()
            .and_then(|d| d.get_element_by_id(canvas_id))
            .ok_or_else(|| JsValue::from_str(&format!("no element #{}", canvas_id)))?
            .dyn_into::<HtmlCanvasElement>()?;

        let viewport_config = ViewportConfig::from(&config);
        let viewer = Rc::new(RefCell::new(Viewer {
            renderer: SceneRenderer::new(config),
            surface: CanvasSurface::new(canvas)?,
            asset: AssetHandle::loading(),
            controller: None,
        }));
        fit(&mut viewer.borrow_mut(), &host);

        let scheduler = Rc::new(FrameScheduler::new(host.window().clone(), Rc::downgrade(&viewer)));

        let controller = {
            let scheduler = Rc::clone(&scheduler);
            ViewportController::mount(&*host, viewport_config, move |_| scheduler.request())
        };
        viewer.borrow_mut().controller = Some(controller);

        let resize = {
            let weak = Rc::downgrade(&viewer);
            let listener_host = Rc::downgrade(&host);
            let scheduler = Rc::clone(&scheduler);
            host.on_resize(move || {
                let (Some(viewer), Some(host)) = (weak.upgrade(), listener_host.upgrade()) else {
                    return;
                };
                let Ok(mut viewer) = viewer.try_borrow_mut() else {
                    return;
                };
                if fit(&mut viewer, &host) {
                    scheduler.request();
                }
            })
        };

        scheduler.request();
        log::info!("deskview attached to #{}", canvas_id);

        Ok(DeskView {
            host,
            viewer,
            scheduler,
            resize: Some(resize),
        })
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    logger::init(log::LevelFilter::Info);
    Ok(())
}
