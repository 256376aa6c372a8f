use std::sync::Arc;

use shared_types::{FilterSet, NearbyResponse, ViewportCenter};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::config::SyncConfig;
use crate::error::{ConfigError, EngineClosed, FetchError, GeocodeError};
use crate::map::detail::{DetailPopup, SegmentClick, SegmentDetail};
use crate::map::filters::{apply_filters, LayerFilterState};
use crate::map::layers::{self, POI_SOURCE, REQUIRED_LAYERS, SEGMENT_SOURCE};
use crate::map::readiness::{ReadinessGate, SurfaceState};
use crate::map::reminder::ReminderControl;
use crate::map::surface::{RenderSurface, SurfaceOptions};
use crate::map::sync::{DataSynchronizer, SyncOutcome, SyncStatus, SyncedLayers};
use crate::map::viewport::ViewportTracker;
use crate::services::geocoding::Geocoder;
use crate::services::nearby::NearbySource;
use crate::services::notify::Notifier;

pub const UNAVAILABLE_MESSAGE: &str = "Parking data is temporarily unavailable";

#[derive(Debug)]
pub enum EngineEvent {
    /// The surface stopped moving.
    MoveEnd(ViewportCenter),
    /// A debounce timer expired.
    Settled { generation: u64 },
    StyleLoaded,
    /// The surface finished a render pass.
    Idle,
    FiltersChanged(FilterSet),
    SegmentClicked(SegmentClick),
    PanTo(ViewportCenter),
    FetchCompleted {
        seq: u64,
        result: Result<NearbyResponse, FetchError>,
    },
    Shutdown,
}

/// Cloneable command handle into a running engine.
///
/// Surfaces report their signals through it, the filter panel pushes its
/// selection through it, and the search box uses it to move the map.
#[derive(Debug, Clone)]
pub struct MapHandle {
    events: UnboundedSender<EngineEvent>,
}

impl MapHandle {
    fn send(&self, event: EngineEvent) -> Result<(), EngineClosed> {
        self.events.send(event).map_err(|_| EngineClosed)
    }

    pub fn move_end(&self, center: ViewportCenter) -> Result<(), EngineClosed> {
        self.send(EngineEvent::MoveEnd(center))
    }

    pub fn style_loaded(&self) -> Result<(), EngineClosed> {
        self.send(EngineEvent::StyleLoaded)
    }

    pub fn idle(&self) -> Result<(), EngineClosed> {
        self.send(EngineEvent::Idle)
    }

    pub fn set_filters(&self, filters: FilterSet) -> Result<(), EngineClosed> {
        self.send(EngineEvent::FiltersChanged(filters))
    }

    pub fn segment_clicked(&self, click: SegmentClick) -> Result<(), EngineClosed> {
        self.send(EngineEvent::SegmentClicked(click))
    }

    /// Flies the map to `center` and refreshes data there once it settles.
    pub fn pan_to(&self, center: ViewportCenter) -> Result<(), EngineClosed> {
        self.send(EngineEvent::PanTo(center))
    }

    /// Geocodes `query` and pans to the first match.
    pub async fn locate<G: Geocoder>(
        &self,
        geocoder: &G,
        query: &str,
    ) -> Result<ViewportCenter, GeocodeError> {
        let center = geocoder.geocode(query).await?;
        self.pan_to(center)?;
        Ok(center)
    }

    pub fn shutdown(&self) -> Result<(), EngineClosed> {
        self.send(EngineEvent::Shutdown)
    }
}

/// Viewport-driven sync of nearby parking data onto a render surface.
///
/// Every piece of mutable state lives here and is only touched from the task
/// driving [`run`](Self::run) or [`step`](Self::step). Fetches run on spawned
/// tasks and report back as [`EngineEvent::FetchCompleted`].
pub struct MapEngine<S, N> {
    config: SyncConfig,
    gate: ReadinessGate<S>,
    tracker: ViewportTracker,
    sync: DataSynchronizer,
    source: Arc<N>,
    notifier: Arc<dyn Notifier>,
    filters: FilterSet,
    initial_fetch_issued: bool,
    events_tx: UnboundedSender<EngineEvent>,
    events_rx: UnboundedReceiver<EngineEvent>,
}

impl<S, N> MapEngine<S, N>
where
    S: RenderSurface + 'static,
    N: NearbySource,
{
    pub fn new(
        config: SyncConfig,
        surface: S,
        source: N,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Self {
            gate: ReadinessGate::new(surface, REQUIRED_LAYERS),
            tracker: ViewportTracker::new(config.settle_delay, events_tx.clone()),
            sync: DataSynchronizer::new(config.radius_meters, config.discard_stale_responses),
            source: Arc::new(source),
            notifier,
            filters: FilterSet::default(),
            initial_fetch_issued: false,
            events_tx,
            events_rx,
            config,
        })
    }

    /// Starts from a selection other than "everything".
    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    pub fn handle(&self) -> MapHandle {
        MapHandle {
            events: self.events_tx.clone(),
        }
    }

    /// Begins loading the base style. Idempotent.
    pub fn start(&mut self) {
        let options = SurfaceOptions {
            style_url: self.config.style_url.clone(),
            center: self.config.initial_center,
            zoom: self.config.initial_zoom,
        };
        self.gate.begin_loading(&options);
    }

    /// Processes events until shutdown.
    pub async fn run(mut self) {
        self.start();
        while self.step().await {}
        tracing::info!("map engine stopped");
    }

    /// Waits for and handles a single event. Returns `false` once the engine
    /// has been shut down.
    pub async fn step(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => self.dispatch(event),
            None => false,
        }
    }

    pub fn dispatch(&mut self, event: EngineEvent) -> bool {
        match event {
            EngineEvent::MoveEnd(center) => self.tracker.on_move_end(center),
            EngineEvent::Settled { generation } => {
                if let Some(center) = self.tracker.take_settled(generation) {
                    self.fetch_nearby(center);
                }
            }
            EngineEvent::StyleLoaded => {
                self.gate.mark_style_loaded();
                self.advance_readiness();
            }
            EngineEvent::Idle => self.advance_readiness(),
            EngineEvent::FiltersChanged(filters) => {
                self.filters = filters;
                apply_filters(&mut self.gate, &self.filters);
            }
            EngineEvent::SegmentClicked(click) => self.show_segment(click),
            EngineEvent::PanTo(center) => {
                self.gate
                    .surface_mut()
                    .fly_to(center, self.config.locate_zoom);
                self.tracker.schedule(center, self.config.pan_settle_delay);
            }
            EngineEvent::FetchCompleted { seq, result } => self.fetch_completed(seq, result),
            EngineEvent::Shutdown => {
                self.tracker.cancel();
                return false;
            }
        }
        true
    }

    pub fn status(&self) -> &SyncStatus {
        self.sync.status()
    }

    pub fn surface_state(&self) -> SurfaceState {
        self.gate.state()
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn current_center(&self) -> Option<ViewportCenter> {
        self.tracker.current()
    }

    /// Nothing scheduled and nothing in flight.
    pub fn is_settled(&self) -> bool {
        !self.tracker.is_pending() && self.sync.in_flight() == 0
    }

    pub fn surface(&self) -> &S {
        self.gate.surface()
    }

    /// Bypasses the readiness gate; only for popups and other non-layer state.
    pub fn surface_mut(&mut self) -> &mut S {
        self.gate.surface_mut()
    }

    /// Installs sources and layers once the style is there, then lets the
    /// gate re-check. The first time the style is usable, loads the latest
    /// viewport (the configured start if the map has not moved) and applies
    /// the current filters.
    fn advance_readiness(&mut self) {
        self.gate.recheck();
        if self.gate.state() == SurfaceState::StyleReady {
            if let Some(Err(e)) = self.gate.with_style(|surface| layers::install(surface)) {
                tracing::warn!("could not install map layers: {}", e);
            }
            self.gate.recheck();
        }

        if !self.initial_fetch_issued && self.gate.state() >= SurfaceState::StyleReady {
            self.initial_fetch_issued = true;
            let center = self.tracker.current().unwrap_or(self.config.initial_center);
            self.fetch_nearby(center);
            apply_filters(&mut self.gate, &self.filters);
        }
    }

    fn fetch_nearby(&mut self, center: ViewportCenter) {
        let ticket = self.sync.begin(center, &self.filters);
        tracing::debug!(
            seq = ticket.seq,
            lat = center.lat,
            lng = center.long,
            "fetching nearby parking"
        );

        let source = Arc::clone(&self.source);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = source.fetch_nearby(&ticket.query).await;
            let _ = events.send(EngineEvent::FetchCompleted {
                seq: ticket.seq,
                result,
            });
        });
    }

    fn fetch_completed(&mut self, seq: u64, result: Result<NearbyResponse, FetchError>) {
        match self.sync.complete(seq, result) {
            SyncOutcome::Apply(synced) => {
                tracing::info!(
                    seq,
                    pois = synced.pois.len(),
                    segments = synced.segments.len(),
                    "nearby parking synced"
                );
                let filter_state = LayerFilterState::compile(&self.filters);
                self.gate
                    .run_when_ready(move |surface| apply_synced(surface, synced, filter_state));
            }
            SyncOutcome::Stale => {}
            SyncOutcome::Failed(e) => {
                tracing::warn!(seq, "nearby fetch failed: {}", e);
                self.gate.surface_mut().show_message(UNAVAILABLE_MESSAGE);
            }
        }
    }

    fn show_segment(&mut self, click: SegmentClick) {
        let Some(properties) = click.features.first() else {
            return;
        };
        let detail = SegmentDetail::from_properties(properties);
        let reminder = ReminderControl::new(
            detail.max_duration_min,
            Arc::clone(&self.notifier),
            self.config.reminder_tick,
        );
        self.gate.surface_mut().show_detail(DetailPopup {
            anchor: click.anchor,
            detail,
            reminder,
        });
    }
}

/// Replaces both sources, then re-applies filters, as one step.
fn apply_synced<S: RenderSurface>(surface: &mut S, synced: SyncedLayers, filters: LayerFilterState) {
    if !(surface.has_source(POI_SOURCE) && surface.has_source(SEGMENT_SOURCE)) {
        tracing::warn!("map sources missing, skipping data update");
        return;
    }
    let written = surface
        .set_source_data(POI_SOURCE, &synced.pois)
        .and_then(|_| surface.set_source_data(SEGMENT_SOURCE, &synced.segments))
        .and_then(|_| filters.apply(surface));
    if let Err(e) = written {
        tracing::warn!("could not apply synced data: {}", e);
    }
}
