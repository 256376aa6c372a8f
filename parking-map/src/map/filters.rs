use shared_types::{FilterKey, FilterSet};

use crate::error::SurfaceError;
use crate::map::expression::Expr;
use crate::map::layers::{GARAGE_LAYER, SEGMENT_LAYER};
use crate::map::readiness::ReadinessGate;
use crate::map::surface::{RenderSurface, Visibility};

/// Filter keys that select segment rule types, in predicate order.
const SEGMENT_KEYS: [FilterKey; 3] = [FilterKey::Free, FilterKey::TwoHour, FilterKey::Permit];

/// Layer visibility and predicates derived from one filter selection.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerFilterState {
    pub garage: Visibility,
    pub segments: Visibility,
    /// `None` when no segment key is selected; the layer is hidden instead.
    pub segment_predicate: Option<Expr>,
}

impl LayerFilterState {
    pub fn compile(filters: &FilterSet) -> Self {
        let conditions: Vec<Expr> = SEGMENT_KEYS
            .iter()
            .filter(|key| filters.contains(key))
            .filter_map(FilterKey::rule_type)
            .map(|rule| Expr::property_eq("rule_type", rule.as_str()))
            .collect();

        let segment_predicate = (!conditions.is_empty()).then(|| Expr::any(conditions));

        Self {
            garage: Visibility::shown(filters.contains(&FilterKey::Garage)),
            segments: Visibility::shown(segment_predicate.is_some()),
            segment_predicate,
        }
    }

    /// Pushes this state onto the surface's layers. Must only run once the
    /// layers exist, which is what [`apply_filters`] guarantees.
    pub fn apply<S: RenderSurface>(&self, surface: &mut S) -> Result<(), SurfaceError> {
        surface.set_visibility(GARAGE_LAYER, self.garage)?;
        match &self.segment_predicate {
            Some(predicate) => {
                surface.set_visibility(SEGMENT_LAYER, Visibility::Visible)?;
                surface.set_filter(SEGMENT_LAYER, predicate)?;
            }
            None => surface.set_visibility(SEGMENT_LAYER, Visibility::None)?,
        }
        Ok(())
    }
}

/// Compiles `filters` and applies them through the gate.
pub fn apply_filters<S: RenderSurface + 'static>(gate: &mut ReadinessGate<S>, filters: &FilterSet) {
    let state = LayerFilterState::compile(filters);
    tracing::debug!(
        garage = state.garage.as_str(),
        segments = state.segments.as_str(),
        "applying filters"
    );
    gate.run_when_ready(move |surface| {
        if let Err(e) = state.apply(surface) {
            tracing::warn!("could not apply filters: {}", e);
        }
    });
}
