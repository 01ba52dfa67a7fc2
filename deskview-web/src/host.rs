/// Browser implementation of the viewport signals
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, MediaQueryList, MediaQueryListEvent, Window};

use deskview_core::{Breakpoint, ScrollMetrics, Subscription, ViewportHost};

/// Window-backed breakpoint and scroll source
pub struct BrowserHost {
    window: Window,
}

impl BrowserHost {
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        Ok(Self { window })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.window.device_pixel_ratio()
    }

    /// Scroll offset and page extent; missing values read as zero
    pub fn metrics(&self) -> ScrollMetrics {
        metrics(&self.window)
    }

    /// Listen for window resizes
    pub fn on_resize(&self, mut on_resize: impl FnMut() + 'static) -> Subscription {
        let closure = Closure::<dyn FnMut(Event)>::new(move |_: Event| on_resize());
        listen(self.window.as_ref(), "resize", closure)
    }

    fn media_query(&self, breakpoint: &Breakpoint) -> Option<MediaQueryList> {
        match self.window.match_media(&breakpoint.media_query()) {
            Ok(list) => list,
            Err(e) => {
                log::warn!("matchMedia({}) failed: {:?}", breakpoint.media_query(), e);
                None
            }
        }
    }
}

fn metrics(window: &Window) -> ScrollMetrics {
    let scroll_y = window.scroll_y().unwrap_or(0.0);
    let window_height = window
        .inner_height()
        .ok()
        .and_then(|h| h.as_f64())
        .unwrap_or(0.0);
    let document_height = window
        .document()
        .and_then(|d| d.document_element())
        .map(|e| e.scroll_height() as f64)
        .unwrap_or(window_height);
    ScrollMetrics::new(scroll_y, document_height, window_height)
}

/// Register `closure` for `event` on `target`; the subscription removes it again
fn listen(target: &EventTarget, event: &'static str, closure: Closure<dyn FnMut(Event)>) -> Subscription {
    if let Err(e) = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
        log::warn!("cannot listen for {}: {:?}", event, e);
        return Subscription::inert();
    }
    let target = target.clone();
    Subscription::new(move || {
        if let Err(e) = target.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
            log::warn!("cannot remove {} listener: {:?}", event, e);
        }
    })
}

impl ViewportHost for BrowserHost {
    fn breakpoint_matches(&self, breakpoint: &Breakpoint) -> bool {
        match self.media_query(breakpoint) {
            Some(list) => list.matches(),
            None => {
                let width = self.window.inner_width().ok().and_then(|w| w.as_f64());
                width.map_or(false, |w| breakpoint.matches(w))
            }
        }
    }

    fn watch_breakpoint(&self, breakpoint: &Breakpoint, mut on_change: Box<dyn FnMut(bool)>) -> Subscription {
        let Some(list) = self.media_query(breakpoint) else {
            return Subscription::inert();
        };
        let fallback = list.clone();
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let matches = event
                .dyn_ref::<MediaQueryListEvent>()
                .map_or_else(|| fallback.matches(), |e| e.matches());
            on_change(matches);
        });
        listen(list.as_ref(), "change", closure)
    }

    fn watch_scroll(&self, mut on_scroll: Box<dyn FnMut(ScrollMetrics)>) -> Subscription {
        let window = self.window.clone();
        let closure = Closure::<dyn FnMut(Event)>::new(move |_: Event| on_scroll(metrics(&window)));
        listen(self.window.as_ref(), "scroll", closure)
    }
}
