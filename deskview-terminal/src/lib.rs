/// Terminal host for the deskview scene
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use std::io::{self, stdout, Write};
use std::path::PathBuf;
use std::time::Duration;

use deskview_core::{
    AssetHandle, DrawSurface, Model, SceneConfig, SceneRenderer, ScrollProgress, ViewportConfig, ViewportController,
};

pub mod host;
pub mod loader;
pub mod renderer;

pub use host::{PixelSize, TerminalHost};
pub use loader::ModelLoader;
pub use renderer::AsciiRenderer;

/// Pixels moved per wheel notch or j/k press
const SCROLL_STEP_PX: f64 = 48.0;
/// Pixels of simulated drag per h/l press
const ORBIT_STEP_PX: f32 = 24.0;

/// Where the model comes from
pub enum ModelSource {
    /// Decode this file on a background thread
    File(PathBuf),
    /// Use the built-in box model
    Builtin,
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    host: TerminalHost,
    controller: Option<ViewportController>,
    renderer: SceneRenderer,
    surface: AsciiRenderer,
    asset: AssetHandle<Model>,
    loader: Option<ModelLoader>,
    load_error: Option<deskview_core::Error>,
    drag_column: Option<u16>,
    running: bool,
}

impl TerminalApp {
    pub fn new(config: SceneConfig, source: ModelSource) -> io::Result<Self> {
        let (columns, rows) = terminal::size()?;
        let host = TerminalHost::new(host::viewport_pixels()?, config.page_screens);

        // redraws are gated by the renderer's frame loop, not by this callback
        let controller = ViewportController::mount(&host, ViewportConfig::from(&config), |_| {});

        let (asset, loader) = match source {
            ModelSource::File(path) => {
                log::info!("loading model from {}", path.display());
                (AssetHandle::loading(), Some(ModelLoader::spawn(path)))
            }
            ModelSource::Builtin => (AssetHandle::Ready(Model::placeholder()), None),
        };

        Ok(Self {
            host,
            controller: Some(controller),
            renderer: SceneRenderer::new(config),
            surface: AsciiRenderer::new(columns as usize, rows as usize),
            asset,
            loader,
            load_error: None,
            drag_column: None,
            running: true,
        })
    }

    pub fn run(&mut self) -> Result<(), deskview_core::Error> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide, EnableMouseCapture)?;

        let result = self.main_loop();

        // Cleanup
        if let Some(controller) = self.controller.take() {
            controller.unmount();
        }
        execute!(stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen, cursor::Show)?;
        terminal::disable_raw_mode()?;

        result?;
        match self.load_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn main_loop(&mut self) -> io::Result<()> {
        while self.running {
            if let Some(loader) = self.loader.as_mut() {
                if let Some(e) = loader.poll(&mut self.asset) {
                    self.load_error = Some(e);
                    self.running = false;
                    break;
                }
                if loader.is_finished() {
                    self.loader = None;
                }
            }

            // Idle wait doubles as the loader polling interval
            if event::poll(Duration::from_millis(50))? {
                self.handle_event(event::read()?)?;
            }

            self.render()?;
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> io::Result<()> {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(columns, rows) => {
                self.surface.resize(columns as usize, rows as usize);
                self.host.resize(host::viewport_pixels()?);
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        let window = self.host.viewport().height;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('j') | KeyCode::Down => self.host.scroll_by(SCROLL_STEP_PX),
            KeyCode::Char('k') | KeyCode::Up => self.host.scroll_by(-SCROLL_STEP_PX),
            KeyCode::PageDown | KeyCode::Char(' ') => self.host.scroll_by(window),
            KeyCode::PageUp => self.host.scroll_by(-window),
            KeyCode::Home => self.host.scroll_to(0.0),
            KeyCode::End => self.host.scroll_to_end(),
            KeyCode::Char('h') | KeyCode::Left => self.orbit(ORBIT_STEP_PX),
            KeyCode::Char('l') | KeyCode::Right => self.orbit(-ORBIT_STEP_PX),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollDown => self.host.scroll_by(SCROLL_STEP_PX),
            MouseEventKind::ScrollUp => self.host.scroll_by(-SCROLL_STEP_PX),
            MouseEventKind::Down(MouseButton::Left) => self.drag_column = Some(mouse.column),
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(previous) = self.drag_column.replace(mouse.column) {
                    let dx_cells = mouse.column as f32 - previous as f32;
                    self.orbit(dx_cells * host::CELL_WIDTH_PX as f32);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => self.drag_column = None,
            _ => {}
        }
    }

    fn orbit(&mut self, dx_px: f32) {
        let height = self.host.viewport().height as f32;
        if self.renderer.drag(dx_px, height) {
            log::debug!("orbit to {:.4}", self.renderer.controls().azimuth());
        }
    }

    fn render(&mut self) -> io::Result<()> {
        let Some(controller) = self.controller.as_ref() else {
            return Ok(());
        };
        let state = controller.state();
        // the placeholder spinner advances once per tick
        if !self.asset.is_ready() {
            self.renderer.invalidate();
        }

        if !self.renderer.draw(&mut self.surface, &self.asset, &state)? {
            return Ok(());
        }

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.surface.draw(&mut stdout)?;

        let progress = ScrollProgress::from_metrics(&self.host.metrics());
        let status = format!(
            "deskview | {:?} | azimuth {:+.1}\u{b0} | scroll {:>3.0}% | wheel/jk=Scroll drag/hl=Orbit q=Quit",
            state.layout,
            self.renderer.controls().azimuth().to_degrees(),
            progress.value() * 100.0
        );
        let (width, _) = self.surface.size();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(status.chars().take(width as usize).collect::<String>()),
            ResetColor
        )?;

        stdout.flush()
    }
}
