use shared_types::{FeatureCollection, ViewportCenter};

use crate::error::SurfaceError;
use crate::map::detail::DetailPopup;
use crate::map::expression::Expr;
use crate::map::layers::LayerSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    None,
}

impl Visibility {
    pub fn shown(shown: bool) -> Self {
        if shown {
            Self::Visible
        } else {
            Self::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::None => "none",
        }
    }
}

/// What the surface is constructed with.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceOptions {
    pub style_url: String,
    pub center: ViewportCenter,
    pub zoom: f64,
}

/// The map renderer the engine drives.
///
/// The surface draws; the engine owns every source and layer mutation. Movement,
/// style lifecycle and click signals travel the other way as
/// [`EngineEvent`](crate::map::engine::EngineEvent)s through a
/// [`MapHandle`](crate::map::engine::MapHandle).
pub trait RenderSurface {
    fn load_style(&mut self, options: &SurfaceOptions);
    fn is_style_loaded(&self) -> bool;

    fn add_source(&mut self, id: &str);
    fn has_source(&self, id: &str) -> bool;
    /// Replaces the whole contents of a source.
    fn set_source_data(&mut self, id: &str, data: &FeatureCollection) -> Result<(), SurfaceError>;

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), SurfaceError>;
    fn has_layer(&self, id: &str) -> bool;
    fn set_visibility(&mut self, layer_id: &str, visibility: Visibility)
        -> Result<(), SurfaceError>;
    fn set_filter(&mut self, layer_id: &str, filter: &Expr) -> Result<(), SurfaceError>;

    fn fly_to(&mut self, center: ViewportCenter, zoom: f64);
    fn show_detail(&mut self, popup: DetailPopup);
    fn show_message(&mut self, message: &str);
}
