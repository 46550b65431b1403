use std::cell::RefCell;
use std::rc::Rc;

use crate::app::App;
use crate::config::AppConfig;
use crate::console_log;
use crate::error::ConfigError;
use crate::fetcher::HttpTransport;

pub type BrowserApp = App<HttpTransport>;

thread_local! {
    static MODULE_STATE: RefCell<Option<Rc<BrowserApp>>> = const { RefCell::new(None) };
}

pub struct ModuleState;

impl ModuleState {
    /// Build the app from `config` and make it the active instance,
    /// replacing any earlier one.
    pub fn install(config: AppConfig) -> Result<Rc<BrowserApp>, ConfigError> {
        let transport = HttpTransport::new(config.request_timeout_ms);
        let app = Rc::new(App::new(config, transport)?);
        MODULE_STATE.with(|state| {
            if state.borrow_mut().replace(app.clone()).is_some() {
                console_log!("Replacing previously initialized app");
            }
        });
        Ok(app)
    }

    /// Handle to the active app. Async callers clone this so the app
    /// outlives the promise they hand back to JavaScript.
    pub fn app() -> Result<Rc<BrowserApp>, ConfigError> {
        MODULE_STATE.with(|state| state.borrow().clone().ok_or(ConfigError::NotInitialized))
    }

    pub fn with<F, R>(f: F) -> Result<R, ConfigError>
    where
        F: FnOnce(&BrowserApp) -> R,
    {
        let app = Self::app()?;
        Ok(f(&app))
    }
}
