// Camera state and basemap style selection
use serde::{Deserialize, Serialize};

use crate::config::MapStyle;
use crate::console_log;

pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 24.0;
pub const MAX_PITCH: f64 = 85.0;
// Web Mercator latitude limit
pub const MAX_LATITUDE: f64 = 85.051129;

/// Camera of the map view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl Default for ViewState {
    // Downtown Calgary
    fn default() -> Self {
        Self {
            longitude: -114.065,
            latitude: 51.0475,
            zoom: 15.5,
            pitch: 60.0,
            bearing: 0.0,
        }
    }
}

// Into [-180, 180); in-range values pass through untouched
fn wrap_degrees(value: f64) -> f64 {
    if (-180.0..180.0).contains(&value) {
        value
    } else {
        (value + 180.0).rem_euclid(360.0) - 180.0
    }
}

impl ViewState {
    pub fn is_finite(&self) -> bool {
        [self.longitude, self.latitude, self.zoom, self.pitch, self.bearing]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Clamp/wrap every field into the range the map accepts.
    pub fn normalized(self) -> Self {
        Self {
            longitude: wrap_degrees(self.longitude),
            latitude: self.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            zoom: self.zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            pitch: self.pitch.clamp(0.0, MAX_PITCH),
            bearing: wrap_degrees(self.bearing),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewChange {
    Applied,
    /// Input is disabled while a request is in flight.
    Ignored,
    /// The gesture carried a non-finite value.
    Rejected,
}

/// Owns the camera and active style; gates user input while busy.
#[derive(Debug, Clone)]
pub struct ViewController {
    view: ViewState,
    style: MapStyle,
    input_enabled: bool,
}

impl ViewController {
    pub fn new(style: MapStyle) -> Self {
        Self {
            view: ViewState::default(),
            style,
            input_enabled: true,
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn style(&self) -> MapStyle {
        self.style
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    /// Replace the whole camera in one step.
    pub fn apply_gesture(&mut self, next: ViewState) -> ViewChange {
        if !self.input_enabled {
            console_log!("Ignoring view change while data is loading");
            return ViewChange::Ignored;
        }
        if !next.is_finite() {
            console_log!("Rejecting view change with non-finite values: {:?}", next);
            return ViewChange::Rejected;
        }
        self.view = next.normalized();
        ViewChange::Applied
    }

    /// Swap the basemap style. The camera is left exactly as it was.
    pub fn set_style(&mut self, style: MapStyle) -> ViewChange {
        if !self.input_enabled {
            console_log!("Ignoring style change to {} while data is loading", style);
            return ViewChange::Ignored;
        }
        self.style = style;
        ViewChange::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_change_preserves_camera() {
        let mut controller = ViewController::new(MapStyle::Streets);
        let camera = ViewState {
            longitude: -114.07,
            latitude: 51.05,
            zoom: 17.25,
            pitch: 45.0,
            bearing: -30.0,
        };
        assert_eq!(controller.apply_gesture(camera), ViewChange::Applied);
        assert_eq!(controller.set_style(MapStyle::Satellite), ViewChange::Applied);
        assert_eq!(controller.style(), MapStyle::Satellite);
        assert_eq!(controller.view(), camera);
    }

    #[test]
    fn input_is_ignored_while_disabled() {
        let mut controller = ViewController::new(MapStyle::Streets);
        controller.set_input_enabled(false);
        let mut moved = ViewState::default();
        moved.zoom = 10.0;
        assert_eq!(controller.apply_gesture(moved), ViewChange::Ignored);
        assert_eq!(controller.set_style(MapStyle::Basic), ViewChange::Ignored);
        assert_eq!(controller.view(), ViewState::default());
        assert_eq!(controller.style(), MapStyle::Streets);

        controller.set_input_enabled(true);
        assert_eq!(controller.apply_gesture(moved), ViewChange::Applied);
        assert_eq!(controller.view().zoom, 10.0);
    }

    #[test]
    fn non_finite_gesture_is_rejected_whole() {
        let mut controller = ViewController::new(MapStyle::Streets);
        let bad = ViewState {
            longitude: -100.0,
            latitude: 40.0,
            zoom: f64::NAN,
            pitch: 10.0,
            bearing: 5.0,
        };
        assert_eq!(controller.apply_gesture(bad), ViewChange::Rejected);
        assert_eq!(controller.view(), ViewState::default());
    }

    #[test]
    fn gestures_are_normalized() {
        let mut controller = ViewController::new(MapStyle::Streets);
        controller.apply_gesture(ViewState {
            longitude: 190.0,
            latitude: 89.0,
            zoom: 30.0,
            pitch: 90.0,
            bearing: 270.0,
        });
        let view = controller.view();
        assert!((view.longitude + 170.0).abs() < 1e-9);
        assert_eq!(view.latitude, MAX_LATITUDE);
        assert_eq!(view.zoom, MAX_ZOOM);
        assert_eq!(view.pitch, MAX_PITCH);
        assert!((view.bearing + 90.0).abs() < 1e-9);
    }
}
