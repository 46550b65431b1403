use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::console_warn;
use crate::error::ConfigError;

pub const DEFAULT_BUILDINGS_ENDPOINT: &str = "http://127.0.0.1:5000/api/buildings";
pub const DEFAULT_FILTER_ENDPOINT: &str = "http://127.0.0.1:5000/api/filter_buildings";
pub const DEFAULT_STYLE_BASE_URL: &str = "https://api.maptiler.com/maps";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u32 = 10_000;

// Local-space origin used by the extrusion path (downtown Calgary)
pub const DEFAULT_LOCAL_ORIGIN: [f64; 2] = [-114.06, 51.0475];
pub const DEFAULT_LOCAL_SCALE: f64 = 100_000.0;

/// Basemap styles offered by the tile/style provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapStyle {
    Streets,
    Satellite,
    Basic,
    Outdoor,
}

impl MapStyle {
    pub const ALL: [MapStyle; 4] = [
        MapStyle::Streets,
        MapStyle::Satellite,
        MapStyle::Basic,
        MapStyle::Outdoor,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MapStyle::Streets => "streets",
            MapStyle::Satellite => "satellite",
            MapStyle::Basic => "basic",
            MapStyle::Outdoor => "outdoor",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MapStyle::Streets => "Streets",
            MapStyle::Satellite => "Satellite",
            MapStyle::Basic => "Basic",
            MapStyle::Outdoor => "Outdoor",
        }
    }

    /// Path segment of the style on the provider.
    fn provider_path(self) -> &'static str {
        match self {
            MapStyle::Streets => "streets-v2",
            MapStyle::Satellite => "satellite",
            MapStyle::Basic => "basic-v2",
            MapStyle::Outdoor => "outdoor-v2",
        }
    }

    pub fn url(self, base_url: &str, api_key: &str) -> String {
        format!(
            "{}/{}/style.json?key={}",
            base_url.trim_end_matches('/'),
            self.provider_path(),
            api_key
        )
    }
}

impl fmt::Display for MapStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MapStyle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        MapStyle::ALL
            .into_iter()
            .find(|style| style.key() == key)
            .ok_or_else(|| ConfigError::UnknownStyle(s.to_string()))
    }
}

/// Start-up configuration handed over by the host page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub api_key: String,
    pub buildings_endpoint: String,
    pub filter_endpoint: String,
    pub default_style: String,
    pub style_base_url: String,
    pub request_timeout_ms: u32,
    pub fallback_height: f64,
    pub local_origin: [f64; 2],
    pub local_scale: f64,
    pub build_meshes: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            buildings_endpoint: DEFAULT_BUILDINGS_ENDPOINT.to_string(),
            filter_endpoint: DEFAULT_FILTER_ENDPOINT.to_string(),
            default_style: MapStyle::Streets.key().to_string(),
            style_base_url: DEFAULT_STYLE_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            fallback_height: 0.0,
            local_origin: DEFAULT_LOCAL_ORIGIN,
            local_scale: DEFAULT_LOCAL_SCALE,
            build_meshes: true,
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buildings_endpoint.trim().is_empty() {
            return Err(ConfigError::Empty("buildingsEndpoint"));
        }
        if self.filter_endpoint.trim().is_empty() {
            return Err(ConfigError::Empty("filterEndpoint"));
        }
        if self.style_base_url.trim().is_empty() {
            return Err(ConfigError::Empty("styleBaseUrl"));
        }
        self.default_style()?;
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::OutOfRange {
                field: "requestTimeoutMs",
                value: 0.0,
            });
        }
        if !self.local_scale.is_finite() || self.local_scale <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "localScale",
                value: self.local_scale,
            });
        }
        if !self.fallback_height.is_finite() || self.fallback_height < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "fallbackHeight",
                value: self.fallback_height,
            });
        }
        if let Some(bad) = self.local_origin.iter().find(|v| !v.is_finite()) {
            return Err(ConfigError::OutOfRange {
                field: "localOrigin",
                value: *bad,
            });
        }
        if self.api_key.trim().is_empty() {
            console_warn!("No map style API key configured; basemap requests will likely be rejected");
        }
        Ok(())
    }

    pub fn default_style(&self) -> Result<MapStyle, ConfigError> {
        self.default_style.parse()
    }

    pub fn style_url(&self, style: MapStyle) -> String {
        style.url(&self.style_base_url, &self.api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.buildings_endpoint, DEFAULT_BUILDINGS_ENDPOINT);
        assert_eq!(config.filter_endpoint, DEFAULT_FILTER_ENDPOINT);
        assert_eq!(config.default_style().unwrap(), MapStyle::Streets);
        assert_eq!(config.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
        assert!(config.build_meshes);
    }

    #[test]
    fn camel_case_options_are_recognized() {
        let config = AppConfig::from_json(
            r#"{
                "apiKey": "abc123",
                "buildingsEndpoint": "https://example.org/api/buildings",
                "filterEndpoint": "https://example.org/api/filter_buildings",
                "defaultStyle": "satellite",
                "requestTimeoutMs": 2500
            }"#,
        )
        .unwrap();
        assert_eq!(config.api_key, "abc123");
        assert_eq!(config.default_style().unwrap(), MapStyle::Satellite);
        assert_eq!(config.request_timeout_ms, 2500);
        assert_eq!(
            config.style_url(MapStyle::Satellite),
            "https://api.maptiler.com/maps/satellite/style.json?key=abc123"
        );
    }

    #[test]
    fn invalid_options_are_rejected() {
        assert!(matches!(
            AppConfig::from_json(r#"{"defaultStyle": "toner"}"#),
            Err(ConfigError::UnknownStyle(_))
        ));
        assert!(matches!(
            AppConfig::from_json(r#"{"buildingsEndpoint": "  "}"#),
            Err(ConfigError::Empty("buildingsEndpoint"))
        ));
        assert!(matches!(
            AppConfig::from_json(r#"{"requestTimeoutMs": 0}"#),
            Err(ConfigError::OutOfRange { field: "requestTimeoutMs", .. })
        ));
        assert!(matches!(
            AppConfig::from_json(r#"{"fallbackHeight": -3}"#),
            Err(ConfigError::OutOfRange { field: "fallbackHeight", .. })
        ));
        assert!(matches!(AppConfig::from_json("not json"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn style_keys_round_trip_through_from_str() {
        for style in MapStyle::ALL {
            assert_eq!(style.key().parse::<MapStyle>().unwrap(), style);
        }
        assert_eq!(" Outdoor ".parse::<MapStyle>().unwrap(), MapStyle::Outdoor);
        assert_eq!(
            MapStyle::Streets.url("https://tiles.example/maps/", "k"),
            "https://tiles.example/maps/streets-v2/style.json?key=k"
        );
    }
}
