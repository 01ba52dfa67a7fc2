/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::{self, Write};

use deskview_core::{DrawSurface, Frame, ScreenTriangle};

use crate::host::{CELL_HEIGHT_PX, CELL_WIDTH_PX};

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Frames of the loading spinner, advanced once per placeholder draw
const SPINNER: &[char] = &['|', '/', '-', '\\'];

/// Character-cell surface with a depth buffer
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    spinner_step: usize,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            spinner_step: 0,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self {
            spinner_step: self.spinner_step,
            ..Self::new(width, height)
        };
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Character at a cell, for inspection
    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    pub fn rasterize_triangle(&mut self, triangle: &ScreenTriangle) {
        let index = (triangle.brightness * (LUMINOSITY_RAMP.len() - 1) as f32).round() as usize;
        // lit faces never vanish into the background character
        let character = LUMINOSITY_RAMP[index.clamp(1, LUMINOSITY_RAMP.len() - 1)];

        let [v0, v1, v2] = triangle.points;

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                if let Some((w0, w1, w2)) = barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py)) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;

                        let idx = y as usize * self.width + x as usize;
                        if depth < self.depth_buffer[idx] {
                            self.depth_buffer[idx] = depth;
                            self.char_buffer[idx] = character;
                        }
                    }
                }
            }
        }
    }

    fn write_centered(&mut self, row: usize, text: &str) {
        if row >= self.height {
            return;
        }
        let len = text.chars().count().min(self.width);
        let start = (self.width - len) / 2;
        for (i, c) in text.chars().take(len).enumerate() {
            self.char_buffer[row * self.width + start + i] = c;
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.char_buffer[y * self.width + x];

                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl DrawSurface for AsciiRenderer {
    type Error = io::Error;

    fn size(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }

    /// Cells are taller than they are wide
    fn aspect(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        (self.width as f64 * CELL_WIDTH_PX / (self.height as f64 * CELL_HEIGHT_PX)) as f32
    }

    fn draw_placeholder(&mut self, progress: Option<f32>) -> io::Result<()> {
        self.clear();
        let spinner = SPINNER[self.spinner_step % SPINNER.len()];
        self.spinner_step += 1;

        let middle = self.height / 2;
        let label = match progress {
            Some(p) => format!("{} loading model {:>3.0}%", spinner, p * 100.0),
            None => format!("{} loading model", spinner),
        };
        self.write_centered(middle, &label);

        if let Some(p) = progress {
            let bar_width = (self.width / 3).max(10);
            let filled = ((p.clamp(0.0, 1.0) * bar_width as f32).round() as usize).min(bar_width);
            let bar = format!("[{}{}]", "#".repeat(filled), ".".repeat(bar_width - filled));
            self.write_centered(middle + 1, &bar);
        }
        Ok(())
    }

    fn draw_frame(&mut self, frame: &Frame) -> io::Result<()> {
        self.clear();
        for triangle in &frame.triangles {
            self.rasterize_triangle(triangle);
        }
        Ok(())
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(v0: (f32, f32), v1: (f32, f32), v2: (f32, f32), p: (f32, f32)) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
