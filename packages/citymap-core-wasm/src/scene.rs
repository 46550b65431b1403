// Declarative scene derived from store, interaction and view
use serde::Serialize;

use crate::config::{AppConfig, MapStyle};
use crate::extrude::{extrude_shape, BufferGeometry};
use crate::feature_store::RequestState;
use crate::info_panel::InfoPanel;
use crate::models::{Building, FeatureCollection};
use crate::polygon_geometry::{extrusion_height, to_local_shape, LocalOrigin, LocalShape};
use crate::selection::{Display, Interaction};
use crate::view::ViewState;

pub const FILL_COLOR: [u8; 4] = [160, 160, 180, 200];
pub const LINE_COLOR: [u8; 4] = [80, 80, 80, 255];
pub const HOVER_COLOR: [u8; 4] = [255, 255, 0, 200];
pub const SELECTED_COLOR: [u8; 4] = [74, 144, 226, 230];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    None,
    Hovered,
    Selected,
}

impl Highlight {
    fn fill_color(self) -> [u8; 4] {
        match self {
            Highlight::None => FILL_COLOR,
            Highlight::Hovered => HOVER_COLOR,
            Highlight::Selected => SELECTED_COLOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedBuilding {
    pub id: String,
    /// Closed lng/lat ring for map-layer hosts.
    pub footprint: Vec<[f64; 2]>,
    pub elevation: f64,
    pub fill_color: [u8; 4],
    pub line_color: [u8; 4],
    pub highlight: Highlight,
    /// Closed ring in local space for the generic 3D path.
    pub shape: LocalShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<BufferGeometry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    pub loading: Option<&'static str>,
    pub error: Option<String>,
    pub tooltip: Option<String>,
    pub info_panel: Option<InfoPanel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleOption {
    pub key: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Controls {
    pub filter_text: String,
    pub filter_label: &'static str,
    pub filter_input_enabled: bool,
    pub filter_enabled: bool,
    pub reset_enabled: bool,
    pub style_enabled: bool,
    pub styles: Vec<StyleOption>,
    pub active_style: &'static str,
}

/// Everything the host needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub style_url: String,
    pub view: ViewState,
    pub input_enabled: bool,
    /// False while the store holds no data (before the first load or after
    /// a failed request), as opposed to an empty result.
    pub has_data: bool,
    pub buildings: Vec<RenderedBuilding>,
    pub overlay: Overlay,
    pub controls: Controls,
}

impl Scene {
    #[cfg(test)]
    pub fn building(&self, id: &str) -> Option<&RenderedBuilding> {
        self.buildings.iter().find(|b| b.id == id)
    }
}

/// Read-only inputs for one render.
pub struct SceneInput<'a> {
    pub data: Option<&'a FeatureCollection>,
    pub request_state: &'a RequestState,
    pub interaction: &'a Interaction,
    pub view: ViewState,
    pub style: MapStyle,
    pub style_url: String,
    pub input_enabled: bool,
    pub filter_text: &'a str,
}

pub trait Renderer {
    fn render(&self, input: &SceneInput<'_>) -> Scene;
}

/// Renders every building as an extruded footprint.
#[derive(Debug, Clone)]
pub struct ExtrudedBuildingRenderer {
    origin: LocalOrigin,
    scale: f64,
    fallback_height: f64,
    build_meshes: bool,
}

impl ExtrudedBuildingRenderer {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            origin: LocalOrigin::from(config.local_origin),
            scale: config.local_scale,
            fallback_height: config.fallback_height,
            build_meshes: config.build_meshes,
        }
    }

    fn render_building(&self, building: &Building, highlight: Highlight) -> Option<RenderedBuilding> {
        let footprint = building.closed_footprint();
        let shape = to_local_shape(&footprint, self.origin, self.scale)?;
        let elevation = extrusion_height(building.height, self.fallback_height);
        let mesh = if self.build_meshes {
            extrude_shape(&shape, elevation)
        } else {
            None
        };
        Some(RenderedBuilding {
            id: building.id.clone(),
            footprint,
            elevation,
            fill_color: highlight.fill_color(),
            line_color: LINE_COLOR,
            highlight,
            shape,
            mesh,
        })
    }
}

fn highlight_for(building: &Building, interaction: &Interaction) -> Highlight {
    if interaction.selected().is_some_and(|s| s.id == building.id) {
        Highlight::Selected
    } else if interaction.hovered().is_some_and(|h| h.id == building.id) {
        Highlight::Hovered
    } else {
        Highlight::None
    }
}

fn loading_text(state: &RequestState) -> Option<&'static str> {
    match state {
        RequestState::Loading => Some("Loading Building Data..."),
        RequestState::Filtering => Some("Applying Filter..."),
        _ => None,
    }
}

impl Renderer for ExtrudedBuildingRenderer {
    fn render(&self, input: &SceneInput<'_>) -> Scene {
        let buildings = input
            .data
            .map(|collection| {
                collection
                    .iter()
                    .filter_map(|b| self.render_building(b, highlight_for(b, input.interaction)))
                    .collect()
            })
            .unwrap_or_default();

        let (tooltip, info_panel) = match input.interaction.display() {
            Display::InfoPanel(panel) => (None, Some(panel)),
            Display::Tooltip(text) => (Some(text), None),
            Display::Nothing => (None, None),
        };

        let overlay = Overlay {
            loading: loading_text(input.request_state),
            error: input.request_state.error().map(str::to_string),
            tooltip,
            info_panel,
        };

        let controls = Controls {
            filter_text: input.filter_text.to_string(),
            filter_label: if matches!(input.request_state, RequestState::Filtering) {
                "Filtering..."
            } else {
                "Filter"
            },
            filter_input_enabled: input.input_enabled,
            filter_enabled: input.input_enabled && !input.filter_text.trim().is_empty(),
            reset_enabled: input.input_enabled,
            style_enabled: input.input_enabled,
            styles: MapStyle::ALL
                .iter()
                .map(|s| StyleOption {
                    key: s.key(),
                    label: s.label(),
                })
                .collect(),
            active_style: input.style.key(),
        };

        Scene {
            style_url: input.style_url.clone(),
            view: input.view,
            input_enabled: input.input_enabled,
            has_data: input.data.is_some(),
            buildings,
            overlay,
            controls,
        }
    }
}
