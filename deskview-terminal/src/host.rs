/// Terminal stand-ins for the browser's breakpoint and scroll signals
use std::cell::{Cell, RefCell};
use std::io;
use std::rc::{Rc, Weak};

use crossterm::terminal;
use deskview_core::{Breakpoint, ScrollMetrics, Subscription, ViewportHost};

/// Assumed cell size when the terminal does not report pixel dimensions
pub const CELL_WIDTH_PX: f64 = 8.0;
pub const CELL_HEIGHT_PX: f64 = 16.0;

/// Viewport dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSize {
    pub width: f64,
    pub height: f64,
}

impl PixelSize {
    pub fn from_cells(columns: u16, rows: u16) -> Self {
        Self {
            width: columns as f64 * CELL_WIDTH_PX,
            height: rows as f64 * CELL_HEIGHT_PX,
        }
    }
}

/// Current terminal size in pixels, estimated from the cell grid if needed
pub fn viewport_pixels() -> io::Result<PixelSize> {
    match terminal::window_size() {
        Ok(size) if size.width > 0 && size.height > 0 => Ok(PixelSize {
            width: size.width as f64,
            height: size.height as f64,
        }),
        _ => {
            let (columns, rows) = terminal::size()?;
            Ok(PixelSize::from_cells(columns, rows))
        }
    }
}

struct BreakpointListener {
    id: u64,
    breakpoint: Breakpoint,
    last_match: bool,
    on_change: Box<dyn FnMut(bool)>,
}

struct ScrollListener {
    id: u64,
    on_scroll: Box<dyn FnMut(ScrollMetrics)>,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    breakpoint: Vec<BreakpointListener>,
    scroll: Vec<ScrollListener>,
}

impl Listeners {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Emulated window: a pixel viewport over a virtual page taller than the screen.
///
/// Listeners run synchronously inside `resize` and the scroll methods and
/// must not register or release listeners on this host while running.
pub struct TerminalHost {
    listeners: Rc<RefCell<Listeners>>,
    viewport: Cell<PixelSize>,
    scroll_y: Cell<f64>,
    page_screens: f64,
}

impl TerminalHost {
    pub fn new(viewport: PixelSize, page_screens: f64) -> Self {
        Self {
            listeners: Rc::new(RefCell::new(Listeners::default())),
            viewport: Cell::new(viewport),
            scroll_y: Cell::new(0.0),
            page_screens: page_screens.max(1.0),
        }
    }

    pub fn viewport(&self) -> PixelSize {
        self.viewport.get()
    }

    pub fn metrics(&self) -> ScrollMetrics {
        let viewport = self.viewport.get();
        ScrollMetrics::new(
            self.scroll_y.get(),
            viewport.height * self.page_screens,
            viewport.height,
        )
    }

    pub fn listener_count(&self) -> usize {
        let listeners = self.listeners.borrow();
        listeners.breakpoint.len() + listeners.scroll.len()
    }

    /// Apply a new viewport size, notifying breakpoints whose match flipped
    pub fn resize(&self, viewport: PixelSize) {
        self.viewport.set(viewport);
        {
            let mut listeners = self.listeners.borrow_mut();
            for listener in listeners.breakpoint.iter_mut() {
                let matches = listener.breakpoint.matches(viewport.width);
                if matches != listener.last_match {
                    listener.last_match = matches;
                    (listener.on_change)(matches);
                }
            }
        }
        // a shorter page may pull the offset back in range
        self.scroll_to(self.scroll_y.get());
    }

    pub fn scroll_by(&self, dy_px: f64) {
        self.scroll_to(self.scroll_y.get() + dy_px);
    }

    /// Move the page; like a browser, only an actual move fires scroll listeners
    pub fn scroll_to(&self, y_px: f64) {
        let max = self.metrics().max_scroll();
        let next = if y_px.is_finite() { y_px.clamp(0.0, max) } else { 0.0 };
        if next == self.scroll_y.get() {
            return;
        }
        self.scroll_y.set(next);

        let metrics = self.metrics();
        log::trace!("scroll {:.0}/{:.0}", metrics.scroll_y, metrics.max_scroll());
        for listener in self.listeners.borrow_mut().scroll.iter_mut() {
            (listener.on_scroll)(metrics);
        }
    }

    pub fn scroll_to_end(&self) {
        self.scroll_to(self.metrics().max_scroll());
    }
}

fn release(listeners: &Weak<RefCell<Listeners>>, id: u64) {
    if let Some(listeners) = listeners.upgrade() {
        let mut listeners = listeners.borrow_mut();
        listeners.breakpoint.retain(|l| l.id != id);
        listeners.scroll.retain(|l| l.id != id);
    }
}

impl ViewportHost for TerminalHost {
    fn breakpoint_matches(&self, breakpoint: &Breakpoint) -> bool {
        breakpoint.matches(self.viewport.get().width)
    }

    fn watch_breakpoint(&self, breakpoint: &Breakpoint, on_change: Box<dyn FnMut(bool)>) -> Subscription {
        let last_match = self.breakpoint_matches(breakpoint);
        let id = {
            let mut listeners = self.listeners.borrow_mut();
            let id = listeners.next_id();
            listeners.breakpoint.push(BreakpointListener {
                id,
                breakpoint: *breakpoint,
                last_match,
                on_change,
            });
            id
        };
        let weak = Rc::downgrade(&self.listeners);
        Subscription::new(move || release(&weak, id))
    }

    fn watch_scroll(&self, on_scroll: Box<dyn FnMut(ScrollMetrics)>) -> Subscription {
        let id = {
            let mut listeners = self.listeners.borrow_mut();
            let id = listeners.next_id();
            listeners.scroll.push(ScrollListener { id, on_scroll });
            id
        };
        let weak = Rc::downgrade(&self.listeners);
        Subscription::new(move || release(&weak, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskview_core::{LayoutMode, ViewportConfig, ViewportController};
    use std::f32::consts::PI;

    fn host(width: f64) -> TerminalHost {
        TerminalHost::new(PixelSize { width, height: 600.0 }, 4.0)
    }

    #[test]
    fn test_from_cells() {
        let size = PixelSize::from_cells(80, 24);
        assert_eq!(size.width, 640.0);
        assert_eq!(size.height, 384.0);
    }

    #[test]
    fn test_virtual_page_metrics() {
        let host = host(800.0);
        let metrics = host.metrics();
        assert_eq!(metrics.document_height, 2400.0);
        assert_eq!(metrics.window_height, 600.0);
        assert_eq!(metrics.max_scroll(), 1800.0);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let host = host(800.0);
        host.scroll_by(-100.0);
        assert_eq!(host.metrics().scroll_y, 0.0);
        host.scroll_by(10_000.0);
        assert_eq!(host.metrics().scroll_y, 1800.0);
    }

    #[test]
    fn test_controller_follows_resize_and_scroll() {
        let host = host(800.0);
        let controller = ViewportController::mount(&host, ViewportConfig::default(), |_| {});
        assert_eq!(controller.state().layout, LayoutMode::Standard);

        host.resize(PixelSize { width: 480.0, height: 600.0 });
        assert_eq!(controller.state().layout, LayoutMode::Compact);

        host.scroll_to_end();
        assert_eq!(controller.state().azimuth.radians(), (PI / 4.0) * 1.0 - PI / 18.0);
        assert_eq!(controller.state().layout, LayoutMode::Compact);
    }

    #[test]
    fn test_breakpoint_fires_only_on_flip() {
        let host = host(800.0);
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let _sub = host.watch_breakpoint(
            &Breakpoint::default(),
            Box::new(move |_| counter.set(counter.get() + 1)),
        );

        host.resize(PixelSize { width: 900.0, height: 600.0 });
        assert_eq!(calls.get(), 0);
        host.resize(PixelSize { width: 400.0, height: 600.0 });
        host.resize(PixelSize { width: 300.0, height: 600.0 });
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_unmount_removes_listeners() {
        let host = host(800.0);
        let controller = ViewportController::mount(&host, ViewportConfig::default(), |_| {});
        assert_eq!(host.listener_count(), 2);

        controller.unmount();
        assert_eq!(host.listener_count(), 0);

        // no listeners left to observe these
        host.resize(PixelSize { width: 300.0, height: 600.0 });
        host.scroll_by(500.0);
        assert_eq!(host.metrics().scroll_y, 500.0);
    }

    #[test]
    fn test_release_after_host_dropped() {
        let host = host(800.0);
        let sub = host.watch_scroll(Box::new(|_| {}));
        drop(host);
        sub.release();
    }
}
