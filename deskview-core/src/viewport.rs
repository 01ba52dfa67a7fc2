/// Viewport controller: derives layout and camera azimuth from host signals.
///
/// The controller subscribes to two independent sources on mount, a
/// breakpoint watcher and a scroll watcher, and releases both when it is
/// unmounted or dropped. Each source only ever writes its own half of
/// `ViewportState`.
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::config::SceneConfig;
use crate::layout::{Breakpoint, LayoutMode};
use crate::scroll::{AzimuthRange, CameraAzimuth, ScrollMetrics};

/// A live listener registration; releasing it removes the listener.
///
/// The release action runs exactly once, on [`Subscription::release`] or on drop.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A subscription with nothing to release
    pub fn inert() -> Self {
        Self { release: None }
    }

    pub fn release(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Signal primitives a host environment provides
pub trait ViewportHost {
    /// Current match of the breakpoint query, read synchronously at mount
    fn breakpoint_matches(&self, breakpoint: &Breakpoint) -> bool;

    fn watch_breakpoint(
        &self,
        breakpoint: &Breakpoint,
        on_change: Box<dyn FnMut(bool)>,
    ) -> Subscription;

    fn watch_scroll(&self, on_scroll: Box<dyn FnMut(ScrollMetrics)>) -> Subscription;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportConfig {
    pub breakpoint: Breakpoint,
    pub azimuth: AzimuthRange,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            breakpoint: Breakpoint::default(),
            azimuth: AzimuthRange::default(),
        }
    }
}

impl From<&SceneConfig> for ViewportConfig {
    fn from(config: &SceneConfig) -> Self {
        Self {
            breakpoint: config.breakpoint,
            azimuth: config.azimuth,
        }
    }
}

/// Derived UI state fed to the scene renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub layout: LayoutMode,
    pub azimuth: CameraAzimuth,
    /// Bumped on every actual change, never on a no-op event
    pub revision: u64,
}

impl ViewportState {
    pub fn initial(range: &AzimuthRange) -> Self {
        Self {
            layout: LayoutMode::Standard,
            azimuth: CameraAzimuth::initial(range),
            revision: 0,
        }
    }

    fn set_layout(&mut self, layout: LayoutMode) -> bool {
        if self.layout == layout {
            return false;
        }
        self.layout = layout;
        self.revision += 1;
        true
    }

    fn set_azimuth(&mut self, azimuth: CameraAzimuth) -> bool {
        if self.azimuth == azimuth {
            return false;
        }
        self.azimuth = azimuth;
        self.revision += 1;
        true
    }
}

type Listener = Rc<dyn Fn(&ViewportState)>;

pub struct ViewportController {
    state: Rc<RefCell<ViewportState>>,
    subscriptions: Vec<Subscription>,
}

impl ViewportController {
    /// Subscribe to both signals and apply the initial breakpoint match.
    ///
    /// `on_change` runs after every state change with no borrow held, so it
    /// may read [`ViewportController::state`] or schedule a redraw.
    pub fn mount<H>(host: &H, config: ViewportConfig, on_change: impl Fn(&ViewportState) + 'static) -> Self
    where
        H: ViewportHost + ?Sized,
    {
        let state = Rc::new(RefCell::new(ViewportState::initial(&config.azimuth)));
        let listener: Listener = Rc::new(on_change);

        let initial = LayoutMode::from_matches(host.breakpoint_matches(&config.breakpoint));
        update(&state, &listener, |s| s.set_layout(initial));

        let breakpoint_sub = {
            let state = Rc::clone(&state);
            let listener = Rc::clone(&listener);
            host.watch_breakpoint(
                &config.breakpoint,
                Box::new(move |matches| {
                    update(&state, &listener, |s| s.set_layout(LayoutMode::from_matches(matches)));
                }),
            )
        };

        let scroll_sub = {
            let state = Rc::clone(&state);
            let listener = Rc::clone(&listener);
            let range = config.azimuth;
            host.watch_scroll(Box::new(move |metrics| {
                let azimuth = CameraAzimuth::from_metrics(&metrics, &range);
                update(&state, &listener, |s| s.set_azimuth(azimuth));
            }))
        };

        log::info!(
            "viewport controller mounted ({}, layout {:?})",
            config.breakpoint.media_query(),
            state.borrow().layout
        );

        Self {
            state,
            subscriptions: vec![breakpoint_sub, scroll_sub],
        }
    }

    pub fn state(&self) -> ViewportState {
        *self.state.borrow()
    }

    pub fn is_mounted(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Release both listeners; later host events are ignored
    pub fn unmount(mut self) {
        self.release_all();
    }

    fn release_all(&mut self) {
        if self.subscriptions.is_empty() {
            return;
        }
        for subscription in self.subscriptions.drain(..) {
            subscription.release();
        }
        log::info!("viewport controller unmounted");
    }
}

impl Drop for ViewportController {
    fn drop(&mut self) {
        self.release_all();
    }
}

fn update(
    state: &RefCell<ViewportState>,
    listener: &Listener,
    apply: impl FnOnce(&mut ViewportState) -> bool,
) {
    let snapshot = {
        let mut state = state.borrow_mut();
        if !apply(&mut state) {
            return;
        }
        *state
    };
    log::debug!(
        "viewport state r{}: {:?}, azimuth {:.4}",
        snapshot.revision,
        snapshot.layout,
        snapshot.azimuth.radians()
    );
    listener(&snapshot);
}
