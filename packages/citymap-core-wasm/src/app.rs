// Composition root: wires fetcher, store, interaction, view and renderer
use serde_json::Value;
use std::cell::RefCell;

use crate::config::{AppConfig, MapStyle};
use crate::console_log;
use crate::error::ConfigError;
use crate::feature_store::{FeatureStore, RequestState, StoreHandle};
use crate::fetcher::{DataFetcher, LoadOutcome, LoadRequest, Transport};
use crate::models::Building;
use crate::picking::pick;
use crate::scene::{ExtrudedBuildingRenderer, Renderer, Scene, SceneInput};
use crate::selection::Interaction;
use crate::view::{ViewChange, ViewController, ViewState};

struct UiState {
    interaction: Interaction,
    view: ViewController,
    filter_text: String,
}

/// One map client. All state lives behind `RefCell`s that are only
/// borrowed for the length of a synchronous step, so the async loads can
/// run while the host keeps calling in.
pub struct App<T: Transport> {
    config: AppConfig,
    fetcher: DataFetcher<T>,
    store: RefCell<FeatureStore>,
    ui: RefCell<UiState>,
    renderer: ExtrudedBuildingRenderer,
}

impl<T: Transport> StoreHandle for App<T> {
    fn with_store<R>(&self, f: impl FnOnce(&mut FeatureStore) -> R) -> R {
        let (result, busy) = {
            let mut store = self.store.borrow_mut();
            let result = f(&mut store);
            (result, store.is_busy())
        };
        // Camera and style input follow the request state
        self.ui.borrow_mut().view.set_input_enabled(!busy);
        result
    }
}

impl<T: Transport> App<T> {
    pub fn new(config: AppConfig, transport: T) -> Result<Self, ConfigError> {
        config.validate()?;
        let style = config.default_style()?;
        Ok(Self {
            fetcher: DataFetcher::new(transport, &config),
            renderer: ExtrudedBuildingRenderer::from_config(&config),
            store: RefCell::new(FeatureStore::new()),
            ui: RefCell::new(UiState {
                interaction: Interaction::default(),
                view: ViewController::new(style),
                filter_text: String::new(),
            }),
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        self.fetcher.transport()
    }

    pub async fn initial_load(&self) -> LoadOutcome {
        self.fetcher.load(self, LoadRequest::All).await
    }

    pub fn set_filter_query(&self, text: &str) {
        self.ui.borrow_mut().filter_text = text.to_string();
    }

    pub fn filter_query(&self) -> String {
        self.ui.borrow().filter_text.clone()
    }

    /// Run the filter currently typed in the text box. Blank text sends
    /// nothing and leaves every state untouched.
    pub async fn submit_filter(&self) -> LoadOutcome {
        let text = self.filter_query();
        match LoadRequest::filtered(&text) {
            Some(request) => self.fetcher.load(self, request).await,
            None => {
                console_log!("Filter query is empty; nothing to submit");
                LoadOutcome::Skipped
            }
        }
    }

    /// Clear the text box and fetch the unfiltered listing again.
    pub async fn reset_filter(&self) -> LoadOutcome {
        self.ui.borrow_mut().filter_text.clear();
        self.fetcher.load(self, LoadRequest::All).await
    }

    pub fn set_map_style(&self, style: MapStyle) -> ViewChange {
        self.ui.borrow_mut().view.set_style(style)
    }

    pub fn update_view_state(&self, view: ViewState) -> ViewChange {
        self.ui.borrow_mut().view.apply_gesture(view)
    }

    fn find_building(&self, id: &str) -> Option<Building> {
        self.store
            .borrow()
            .data()
            .and_then(|data| data.get(id))
            .cloned()
    }

    /// Returns false when `id` is not in the current collection.
    pub fn pointer_enter(&self, id: &str) -> bool {
        match self.find_building(id) {
            Some(building) => {
                self.ui.borrow_mut().interaction.pointer_enter(building);
                true
            }
            None => false,
        }
    }

    pub fn pointer_leave(&self) {
        self.ui.borrow_mut().interaction.pointer_leave();
    }

    /// Click on a building id, or on empty space with `None`. An id that is
    /// not in the current collection counts as empty space.
    pub fn click(&self, id: Option<&str>) {
        let target = id.and_then(|id| {
            let found = self.find_building(id);
            if found.is_none() {
                console_log!("Clicked unknown building id {}", id);
            }
            found
        });
        self.ui.borrow_mut().interaction.click(target);
    }

    pub fn hover_at(&self, lng: f64, lat: f64) -> Option<String> {
        let hit = self
            .store
            .borrow()
            .data()
            .and_then(|data| pick(data, lng, lat))
            .cloned();
        let mut ui = self.ui.borrow_mut();
        match hit {
            Some(building) => {
                let id = building.id.clone();
                ui.interaction.pointer_enter(building);
                Some(id)
            }
            None => {
                ui.interaction.pointer_leave();
                None
            }
        }
    }

    pub fn click_at(&self, lng: f64, lat: f64) -> Option<String> {
        let hit = self
            .store
            .borrow()
            .data()
            .and_then(|data| pick(data, lng, lat))
            .cloned();
        let id = hit.as_ref().map(|b| b.id.clone());
        self.ui.borrow_mut().interaction.click(hit);
        id
    }

    pub fn close_info_panel(&self) {
        self.ui.borrow_mut().interaction.close();
    }

    pub fn selected_id(&self) -> Option<String> {
        self.ui.borrow().interaction.selected().map(|b| b.id.clone())
    }

    pub fn hovered_id(&self) -> Option<String> {
        self.ui.borrow().interaction.hovered().map(|b| b.id.clone())
    }

    pub fn request_state(&self) -> RequestState {
        self.store.borrow().state().clone()
    }

    pub fn view_state(&self) -> ViewState {
        self.ui.borrow().view.view()
    }

    pub fn map_style(&self) -> MapStyle {
        self.ui.borrow().view.style()
    }

    /// Current collection as GeoJSON, or `None` while there is no data.
    pub fn buildings_geojson(&self) -> Option<Value> {
        self.store.borrow().data().map(|data| data.to_geojson())
    }

    pub fn building_ids(&self) -> Option<Vec<String>> {
        self.store
            .borrow()
            .data()
            .map(|data| data.iter().map(|b| b.id.clone()).collect())
    }

    pub fn scene(&self) -> Scene {
        let store = self.store.borrow();
        let ui = self.ui.borrow();
        let style = ui.view.style();
        self.renderer.render(&SceneInput {
            data: store.data(),
            request_state: store.state(),
            interaction: &ui.interaction,
            view: ui.view.view(),
            style,
            style_url: self.config.style_url(style),
            input_enabled: ui.view.input_enabled(),
            filter_text: &ui.filter_text,
        })
    }
}
