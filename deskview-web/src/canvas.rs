/// 2D canvas drawing surface
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use deskview_core::{DrawSurface, Frame, ScreenTriangle};

/// Painter's-algorithm rasterizer over a `<canvas>`
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    pixel_ratio: f64,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            canvas,
            context,
            pixel_ratio: 1.0,
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Displayed height in CSS pixels
    pub fn css_height(&self) -> f32 {
        match self.canvas.client_height() {
            h if h > 0 => h as f32,
            _ => (self.canvas.height() as f64 / self.pixel_ratio) as f32,
        }
    }

    /// Size the backing store to the parent element at `pixel_ratio`.
    ///
    /// Returns whether the backing store changed.
    pub fn fit_to_container(&mut self, pixel_ratio: f64) -> bool {
        self.pixel_ratio = pixel_ratio;
        let (css_width, css_height) = match self.canvas.parent_element() {
            Some(parent) => (parent.client_width(), parent.client_height()),
            None => (self.canvas.client_width(), self.canvas.client_height()),
        };
        let width = (css_width.max(0) as f64 * pixel_ratio).round() as u32;
        let height = (css_height.max(0) as f64 * pixel_ratio).round() as u32;
        if (width, height) == (self.canvas.width(), self.canvas.height()) {
            return false;
        }
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        log::debug!("canvas resized to {}x{} at ratio {}", width, height, pixel_ratio);
        true
    }

    fn clear(&self) {
        self.context
            .clear_rect(0.0, 0.0, self.canvas.width() as f64, self.canvas.height() as f64);
    }

    fn fill_triangle(&self, triangle: &ScreenTriangle) {
        let [a, b, c] = triangle.points;
        let color = fill_color(triangle.brightness);
        self.context.set_fill_style_str(&color);
        // stroking with the fill hides seams between neighbouring faces
        self.context.set_stroke_style_str(&color);
        self.context.begin_path();
        self.context.move_to(a.0 as f64, a.1 as f64);
        self.context.line_to(b.0 as f64, b.1 as f64);
        self.context.line_to(c.0 as f64, c.1 as f64);
        self.context.close_path();
        self.context.fill();
        self.context.stroke();
    }
}

/// Grey level for a shade; unlit faces stay visible against the page
fn fill_color(brightness: f32) -> String {
    let level = (24.0 + brightness.clamp(0.0, 1.0) * 231.0).round() as u8;
    format!("rgb({level},{level},{level})")
}

/// Far-to-near drawing order
fn paint_order(triangles: &[ScreenTriangle]) -> Vec<&ScreenTriangle> {
    let mut ordered: Vec<&ScreenTriangle> = triangles.iter().collect();
    ordered.sort_by(|a, b| b.mean_depth().total_cmp(&a.mean_depth()));
    ordered
}

impl DrawSurface for CanvasSurface {
    type Error = JsValue;

    fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn draw_placeholder(&mut self, progress: Option<f32>) -> Result<(), JsValue> {
        self.clear();
        let (width, height) = (self.canvas.width() as f64, self.canvas.height() as f64);
        let (cx, cy) = (width / 2.0, height / 2.0);
        let ratio = self.pixel_ratio;

        let label = match progress {
            Some(p) => format!("Loading model {:.0}%", p * 100.0),
            None => "Loading model".to_string(),
        };
        self.context.set_fill_style_str("#aaaaaa");
        self.context.set_font(&format!("{}px sans-serif", (14.0 * ratio).round()));
        self.context.set_text_align("center");
        self.context.fill_text(&label, cx, cy)?;

        if let Some(p) = progress {
            let bar_width = (width / 3.0).max(80.0 * ratio);
            let bar_height = 4.0 * ratio;
            let left = cx - bar_width / 2.0;
            let top = cy + 10.0 * ratio;
            self.context.set_fill_style_str("#333333");
            self.context.fill_rect(left, top, bar_width, bar_height);
            self.context.set_fill_style_str("#915eff");
            self.context
                .fill_rect(left, top, bar_width * p.clamp(0.0, 1.0) as f64, bar_height);
        }
        Ok(())
    }

    fn draw_frame(&mut self, frame: &Frame) -> Result<(), JsValue> {
        self.clear();
        self.context.set_line_width(0.5 * self.pixel_ratio);
        for triangle in paint_order(&frame.triangles) {
            self.fill_triangle(triangle);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_depth(z: f32) -> ScreenTriangle {
        ScreenTriangle {
            points: [(0.0, 0.0, z), (1.0, 0.0, z), (0.0, 1.0, z)],
            brightness: z,
        }
    }

    #[test]
    fn test_paint_order_is_far_to_near() {
        let triangles = vec![at_depth(0.2), at_depth(0.9), at_depth(-0.5)];
        let depths: Vec<f32> = paint_order(&triangles).iter().map(|t| t.brightness).collect();
        assert_eq!(depths, vec![0.9, 0.2, -0.5]);
    }

    #[test]
    fn test_fill_color_range() {
        assert_eq!(fill_color(0.0), "rgb(24,24,24)");
        assert_eq!(fill_color(1.0), "rgb(255,255,255)");
        assert_eq!(fill_color(4.0), "rgb(255,255,255)");
    }
}
