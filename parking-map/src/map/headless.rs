use std::collections::HashMap;

use shared_types::{Feature, FeatureCollection, ViewportCenter};

use crate::error::SurfaceError;
use crate::map::detail::DetailPopup;
use crate::map::expression::Expr;
use crate::map::layers::LayerSpec;
use crate::map::surface::{RenderSurface, SurfaceOptions, Visibility};

#[derive(Debug, Clone, PartialEq)]
pub struct LayerState {
    pub id: &'static str,
    pub source: &'static str,
    pub visibility: Visibility,
    pub filter: Option<Expr>,
}

/// An in-memory surface with no drawing.
///
/// Keeps sources and layers exactly as a renderer would, and can evaluate
/// which features a layer would currently draw. Used by the command line
/// runner and by tests.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    options: Option<SurfaceOptions>,
    style_loads_immediately: bool,
    style_loaded: bool,
    sources: HashMap<String, FeatureCollection>,
    layers: Vec<LayerState>,
    camera: Option<(ViewportCenter, f64)>,
    popup: Option<DetailPopup>,
    messages: Vec<String>,
    source_writes: usize,
}

impl HeadlessSurface {
    /// Reports the style loaded as soon as loading starts.
    pub fn new() -> Self {
        Self {
            style_loads_immediately: true,
            ..Default::default()
        }
    }

    /// Style stays unloaded until [`finish_style_load`](Self::finish_style_load).
    pub fn deferred_style() -> Self {
        Self::default()
    }

    pub fn finish_style_load(&mut self) {
        self.style_loaded = true;
    }

    pub fn options(&self) -> Option<&SurfaceOptions> {
        self.options.as_ref()
    }

    pub fn source(&self, id: &str) -> Option<&FeatureCollection> {
        self.sources.get(id)
    }

    pub fn layer(&self, id: &str) -> Option<&LayerState> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_ids(&self) -> Vec<&'static str> {
        self.layers.iter().map(|l| l.id).collect()
    }

    /// Layer states in draw order, for comparing two surfaces.
    pub fn layer_snapshot(&self) -> Vec<LayerState> {
        self.layers.clone()
    }

    /// Features the layer would draw right now.
    pub fn visible_features(&self, layer_id: &str) -> Vec<&Feature> {
        let Some(layer) = self.layer(layer_id) else {
            return Vec::new();
        };
        if layer.visibility == Visibility::None {
            return Vec::new();
        }
        self.sources
            .get(layer.source)
            .map(|data| {
                data.iter()
                    .filter(|f| {
                        layer
                            .filter
                            .as_ref()
                            .map_or(true, |expr| expr.evaluate(&f.properties))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn camera(&self) -> Option<(ViewportCenter, f64)> {
        self.camera
    }

    /// The open popup, if any. Only one is open at a time.
    pub fn popup(&self) -> Option<&DetailPopup> {
        self.popup.as_ref()
    }

    pub fn popup_mut(&mut self) -> Option<&mut DetailPopup> {
        self.popup.as_mut()
    }

    pub fn close_popup(&mut self) {
        self.popup = None;
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Number of `set_source_data` calls that succeeded.
    pub fn source_writes(&self) -> usize {
        self.source_writes
    }

    fn layer_mut(&mut self, id: &str) -> Result<&mut LayerState, SurfaceError> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| SurfaceError::LayerNotFound(id.to_string()))
    }
}

impl RenderSurface for HeadlessSurface {
    fn load_style(&mut self, options: &SurfaceOptions) {
        tracing::debug!(style = %options.style_url, "loading style");
        self.options = Some(options.clone());
        self.camera = Some((options.center, options.zoom));
        if self.style_loads_immediately {
            self.style_loaded = true;
        }
    }

    fn is_style_loaded(&self) -> bool {
        self.style_loaded
    }

    fn add_source(&mut self, id: &str) {
        self.sources.entry(id.to_string()).or_default();
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn set_source_data(&mut self, id: &str, data: &FeatureCollection) -> Result<(), SurfaceError> {
        let source = self
            .sources
            .get_mut(id)
            .ok_or_else(|| SurfaceError::SourceNotFound(id.to_string()))?;
        *source = data.clone();
        self.source_writes += 1;
        Ok(())
    }

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), SurfaceError> {
        if !self.has_source(layer.source) {
            return Err(SurfaceError::SourceNotFound(layer.source.to_string()));
        }
        self.layers.push(LayerState {
            id: layer.id,
            source: layer.source,
            visibility: Visibility::Visible,
            filter: layer.filter.clone(),
        });
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layer(id).is_some()
    }

    fn set_visibility(
        &mut self,
        layer_id: &str,
        visibility: Visibility,
    ) -> Result<(), SurfaceError> {
        self.layer_mut(layer_id)?.visibility = visibility;
        Ok(())
    }

    fn set_filter(&mut self, layer_id: &str, filter: &Expr) -> Result<(), SurfaceError> {
        self.layer_mut(layer_id)?.filter = Some(filter.clone());
        Ok(())
    }

    fn fly_to(&mut self, center: ViewportCenter, zoom: f64) {
        self.camera = Some((center, zoom));
    }

    fn show_detail(&mut self, popup: DetailPopup) {
        tracing::info!(title = popup.detail.title(), "segment selected");
        // Replacing the popup drops its reminder session.
        self.popup = Some(popup);
    }

    fn show_message(&mut self, message: &str) {
        tracing::warn!(message, "surface message");
        self.messages.push(message.to_string());
    }
}
