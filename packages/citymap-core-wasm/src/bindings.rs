// JavaScript surface over the active app instance
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value, Serializer};
use wasm_bindgen::prelude::*;

use crate::config::{AppConfig, MapStyle};
use crate::console_log;
use crate::fetcher::LoadOutcome;
use crate::module_state::ModuleState;
use crate::view::{ViewChange, ViewState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoadReport {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<LoadOutcome> for LoadReport {
    fn from(outcome: LoadOutcome) -> Self {
        let (outcome, count, error) = match outcome {
            LoadOutcome::Applied { count } => ("applied", Some(count), None),
            LoadOutcome::Failed(err) => ("failed", None, Some(err.to_string())),
            LoadOutcome::Superseded => ("superseded", None, None),
            LoadOutcome::Skipped => ("skipped", None, None),
        };
        Self { outcome, count, error }
    }
}

fn report(outcome: LoadOutcome) -> Result<JsValue, JsValue> {
    Ok(to_value(&LoadReport::from(outcome))?)
}

fn applied(change: ViewChange) -> bool {
    change == ViewChange::Applied
}

/// Create the app from a JSON config string (every field optional).
#[wasm_bindgen]
pub fn init_app(config_json: &str) -> Result<(), JsValue> {
    let config = if config_json.trim().is_empty() {
        AppConfig::default()
    } else {
        AppConfig::from_json(config_json)?
    };
    ModuleState::install(config)?;
    console_log!("Map client initialized");
    Ok(())
}

#[wasm_bindgen]
pub async fn load_buildings() -> Result<JsValue, JsValue> {
    let app = ModuleState::app()?;
    report(app.initial_load().await)
}

#[wasm_bindgen]
pub fn set_filter_query(query: &str) -> Result<(), JsValue> {
    ModuleState::with(|app| app.set_filter_query(query))?;
    Ok(())
}

/// Put `query` in the text box and run it.
#[wasm_bindgen]
pub async fn submit_filter(query: String) -> Result<JsValue, JsValue> {
    let app = ModuleState::app()?;
    app.set_filter_query(&query);
    report(app.submit_filter().await)
}

#[wasm_bindgen]
pub async fn reset_filter() -> Result<JsValue, JsValue> {
    let app = ModuleState::app()?;
    report(app.reset_filter().await)
}

#[wasm_bindgen]
pub fn set_map_style(key: &str) -> Result<bool, JsValue> {
    let style: MapStyle = key.parse()?;
    Ok(ModuleState::with(|app| applied(app.set_map_style(style)))?)
}

#[wasm_bindgen]
pub fn update_view_state(view: JsValue) -> Result<bool, JsValue> {
    let view: ViewState = from_value(view)?;
    Ok(ModuleState::with(|app| applied(app.update_view_state(view)))?)
}

#[wasm_bindgen]
pub fn pointer_enter(id: &str) -> Result<bool, JsValue> {
    Ok(ModuleState::with(|app| app.pointer_enter(id))?)
}

#[wasm_bindgen]
pub fn pointer_leave() -> Result<(), JsValue> {
    ModuleState::with(|app| app.pointer_leave())?;
    Ok(())
}

/// Click on a building, or on empty map space when `id` is absent.
#[wasm_bindgen]
pub fn click_building(id: Option<String>) -> Result<(), JsValue> {
    ModuleState::with(|app| app.click(id.as_deref()))?;
    Ok(())
}

#[wasm_bindgen]
pub fn hover_at(lng: f64, lat: f64) -> Result<Option<String>, JsValue> {
    Ok(ModuleState::with(|app| app.hover_at(lng, lat))?)
}

#[wasm_bindgen]
pub fn click_at(lng: f64, lat: f64) -> Result<Option<String>, JsValue> {
    Ok(ModuleState::with(|app| app.click_at(lng, lat))?)
}

#[wasm_bindgen]
pub fn close_info_panel() -> Result<(), JsValue> {
    ModuleState::with(|app| app.close_info_panel())?;
    Ok(())
}

#[wasm_bindgen]
pub fn get_scene() -> Result<JsValue, JsValue> {
    let scene = ModuleState::with(|app| app.scene())?;
    Ok(to_value(&scene)?)
}

/// GeoJSON of the current collection, or `null` while there is no data.
#[wasm_bindgen]
pub fn get_buildings_geojson() -> Result<JsValue, JsValue> {
    match ModuleState::with(|app| app.buildings_geojson())? {
        Some(geojson) => Ok(geojson.serialize(&Serializer::json_compatible())?),
        None => Ok(JsValue::NULL),
    }
}

#[wasm_bindgen]
pub fn get_request_state() -> Result<JsValue, JsValue> {
    let state = ModuleState::with(|app| app.request_state())?;
    Ok(to_value(&state)?)
}
