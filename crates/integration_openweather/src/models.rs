//! Weather data models
//!
//! Types for representing current weather returned by the OpenWeatherMap API.

use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// Display name used when the payload carries no `name` field
pub const MISSING_NAME_SENTINEL: &str =
    "Error: invalid jsonDictionary! Verify your appID is correct";

const KELVIN_OFFSET: f64 = 273.15;

/// A single weather condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weather {
    /// Icon identifier, e.g. `10d`
    pub icon: String,
    /// Human-readable description, e.g. `light rain`
    pub description: String,
}

/// Current weather for a coordinate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherInfo {
    /// Temperature in Kelvin, as returned by the provider
    pub temperature: f64,
    /// Weather conditions, most significant first (never empty)
    pub conditions: Vec<Weather>,
    /// Display name of the location
    pub name: String,
}

impl WeatherInfo {
    /// The first (most significant) weather condition
    #[must_use]
    pub fn primary_condition(&self) -> Option<&Weather> {
        self.conditions.first()
    }

    /// Temperature in degrees Celsius
    #[must_use]
    pub fn temperature_celsius(&self) -> f64 {
        self.temperature - KELVIN_OFFSET
    }

    /// Temperature in degrees Fahrenheit
    #[must_use]
    pub fn temperature_fahrenheit(&self) -> f64 {
        self.temperature_celsius().mul_add(9.0 / 5.0, 32.0)
    }

    /// Get a formatted summary of current conditions
    #[must_use]
    pub fn summary(&self) -> String {
        let descriptions: Vec<&str> = self
            .conditions
            .iter()
            .map(|c| c.description.as_str())
            .collect();
        format!(
            "{}: {:.1}°C, {}",
            self.name,
            self.temperature_celsius(),
            descriptions.join(", ")
        )
    }
}

impl TryFrom<ApiResponse> for WeatherInfo {
    type Error = WeatherError;

    fn try_from(response: ApiResponse) -> Result<Self, Self::Error> {
        if response.weather.is_empty() {
            return Err(WeatherError::Decode(
                "weather condition list is empty".to_string(),
            ));
        }

        Ok(Self {
            temperature: response.main.temp,
            conditions: response.weather,
            name: response
                .name
                .unwrap_or_else(|| MISSING_NAME_SENTINEL.to_string()),
        })
    }
}

/// Raw `main` block of the API response
#[derive(Debug, Clone, Deserialize)]
pub struct MainData {
    pub temp: f64,
}

/// Raw API response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub main: MainData,
    pub weather: Vec<Weather>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Error body returned by the provider alongside non-success statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> ApiResponse {
        serde_json::from_str(
            r#"{
                "main": { "temp": 290.15, "humidity": 72 },
                "weather": [
                    { "id": 500, "main": "Rain", "icon": "10d", "description": "light rain" },
                    { "id": 701, "main": "Mist", "icon": "50d", "description": "mist" }
                ],
                "name": "Utrecht"
            }"#,
        )
        .expect("sample should decode")
    }

    #[test]
    fn converts_api_response() {
        let info = WeatherInfo::try_from(sample_response()).expect("should convert");
        assert!((info.temperature - 290.15).abs() < f64::EPSILON);
        assert_eq!(info.name, "Utrecht");
        assert_eq!(info.conditions.len(), 2);
        assert_eq!(
            info.primary_condition().map(|c| c.icon.as_str()),
            Some("10d")
        );
        assert_eq!(info.conditions[1].description, "mist");
    }

    #[test]
    fn missing_name_uses_sentinel() {
        let response: ApiResponse = serde_json::from_str(
            r#"{ "main": { "temp": 280.0 }, "weather": [ { "icon": "01n", "description": "clear sky" } ] }"#,
        )
        .expect("should decode");
        let info = WeatherInfo::try_from(response).expect("should convert");
        assert_eq!(info.name, MISSING_NAME_SENTINEL);
    }

    #[test]
    fn empty_condition_list_is_rejected() {
        let response: ApiResponse =
            serde_json::from_str(r#"{ "main": { "temp": 280.0 }, "weather": [] }"#)
                .expect("should decode");
        let err = WeatherInfo::try_from(response).expect_err("should reject");
        assert!(matches!(err, WeatherError::Decode(_)));
    }

    #[test]
    fn missing_required_field_fails_to_decode() {
        let result = serde_json::from_str::<ApiResponse>(r#"{ "weather": [] }"#);
        assert!(result.is_err());
    }

    #[test]
    fn temperature_conversions() {
        let info = WeatherInfo {
            temperature: 273.15,
            conditions: vec![Weather {
                icon: "13d".to_string(),
                description: "snow".to_string(),
            }],
            name: "Oslo".to_string(),
        };
        assert!(info.temperature_celsius().abs() < 1e-9);
        assert!((info.temperature_fahrenheit() - 32.0).abs() < 1e-9);
    }

    #[test]
    fn summary_lists_all_descriptions() {
        let info = WeatherInfo::try_from(sample_response()).expect("should convert");
        assert_eq!(info.summary(), "Utrecht: 17.0°C, light rain, mist");
    }

    #[test]
    fn error_body_message_is_optional() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{ "cod": 401, "message": "Invalid API key." }"#)
                .expect("should decode");
        assert_eq!(body.message.as_deref(), Some("Invalid API key."));

        let body: ApiErrorBody = serde_json::from_str(r#"{ "cod": "404" }"#).expect("should decode");
        assert!(body.message.is_none());
    }
}
