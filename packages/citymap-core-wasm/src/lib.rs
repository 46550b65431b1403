#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

// Create a console module for logging
pub mod console;
pub mod error;
pub mod config;
// Building data and the API payload shapes
pub mod models;
pub mod polygon_geometry;
#[path = "../geometry_functions/extrude.rs"]
pub mod extrude;
pub mod feature_store;
pub mod fetcher;
pub mod info_panel;
pub mod selection;
pub mod view;
pub mod picking;
pub mod scene;
pub mod app;

// The browser-only pieces: fetch transport, global app and JS exports
#[cfg(target_arch = "wasm32")]
mod module_state;
#[cfg(target_arch = "wasm32")]
mod bindings;
#[cfg(target_arch = "wasm32")]
pub use bindings::*;

#[cfg(test)]
mod test_support;

pub use app::App;
pub use config::{AppConfig, MapStyle};
pub use error::{ConfigError, FetchError};
pub use feature_store::RequestState;
pub use fetcher::{LoadOutcome, LoadRequest, Transport};
pub use models::{Building, FeatureCollection};
pub use scene::Scene;
pub use view::ViewState;

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => ($crate::console::log(&format!($($t)*)))
}

#[macro_export]
macro_rules! console_warn {
    ($($t:tt)*) => ($crate::console::warn(&format!($($t)*)))
}

#[macro_export]
macro_rules! console_error {
    ($($t:tt)*) => ($crate::console::error(&format!($($t)*)))
}

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[cfg_attr(target_arch = "wasm32", wasm_bindgen(start))]
pub fn start() {
    INIT.call_once(|| {
        // Set the panic hook for better error messages
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console_log!("WASM module initialized successfully");
    });
}
