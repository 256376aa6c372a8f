use std::collections::VecDeque;

use crate::map::surface::{RenderSurface, SurfaceOptions};

/// Lifecycle of one mounted surface. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SurfaceState {
    Uninitialized,
    Loading,
    StyleReady,
    LayersReady,
}

type Deferred<S> = Box<dyn FnOnce(&mut S)>;

/// Owns the surface and holds back source/layer mutations until the base
/// style has loaded and every required layer is registered.
///
/// Deferred actions are drained in submission order on the first readiness
/// check that finds the surface fully ready; each runs exactly once.
pub struct ReadinessGate<S> {
    surface: S,
    state: SurfaceState,
    required_layers: &'static [&'static str],
    pending: VecDeque<Deferred<S>>,
}

impl<S: RenderSurface + 'static> ReadinessGate<S> {
    pub fn new(surface: S, required_layers: &'static [&'static str]) -> Self {
        Self {
            surface,
            state: SurfaceState::Uninitialized,
            required_layers,
            pending: VecDeque::new(),
        }
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SurfaceState::LayersReady
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn begin_loading(&mut self, options: &SurfaceOptions) {
        if self.state != SurfaceState::Uninitialized {
            return;
        }
        self.surface.load_style(options);
        self.transition(SurfaceState::Loading);
    }

    /// The surface reported its base style as loaded.
    pub fn mark_style_loaded(&mut self) {
        match self.state {
            SurfaceState::Loading => self.transition(SurfaceState::StyleReady),
            SurfaceState::Uninitialized => {
                tracing::debug!("style loaded before loading began, ignoring")
            }
            SurfaceState::StyleReady | SurfaceState::LayersReady => {}
        }
    }

    /// Runs `f` against the surface once the base style is in place, for
    /// installing sources and layers. Returns `None` before that.
    pub fn with_style<R>(&mut self, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        (self.state >= SurfaceState::StyleReady).then(|| f(&mut self.surface))
    }

    /// Re-examines the surface and, if it is now fully ready, drains every
    /// deferred action. Safe to call on every idle signal.
    pub fn recheck(&mut self) -> SurfaceState {
        if self.state == SurfaceState::Loading && self.surface.is_style_loaded() {
            self.transition(SurfaceState::StyleReady);
        }
        if self.state == SurfaceState::StyleReady
            && self
                .required_layers
                .iter()
                .all(|layer| self.surface.has_layer(layer))
        {
            self.transition(SurfaceState::LayersReady);
        }
        if self.is_ready() {
            self.drain();
        }
        self.state
    }

    /// Runs `action` now if the surface is ready, otherwise on the next
    /// [`recheck`](Self::recheck) that finds it ready.
    pub fn run_when_ready(&mut self, action: impl FnOnce(&mut S) + 'static) {
        if self.is_ready() {
            action(&mut self.surface);
        } else {
            self.pending.push_back(Box::new(action));
            tracing::debug!(
                state = ?self.state,
                pending = self.pending.len(),
                "surface not ready, deferring"
            );
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Direct access for mutations that touch neither sources nor layers
    /// (camera moves, popups, messages).
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    fn drain(&mut self) {
        while let Some(action) = self.pending.pop_front() {
            action(&mut self.surface);
        }
    }

    fn transition(&mut self, next: SurfaceState) {
        tracing::debug!(from = ?self.state, to = ?next, "surface state");
        self.state = next;
    }
}
