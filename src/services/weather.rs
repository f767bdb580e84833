use serde::Deserialize;
use std::time::Duration;
use tracing::{error, instrument, warn};

const NOT_APPLICABLE: &str = "N/A";
const KEY_MISSING: &str = "API key missing";
const UNAVAILABLE: &str = "Forecast unavailable";

/// Client for the external weather service. Weather is decorative: every
/// failure degrades to a sentinel string and never propagates.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: Option<WeatherMain>,
    #[serde(default)]
    weather: Vec<WeatherCondition>,
}

#[derive(Debug, Deserialize)]
struct WeatherMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct WeatherCondition {
    description: String,
}

impl WeatherClient {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url,
            api_key,
        }
    }

    /// Formatted current conditions for a city, e.g. "21.5°C, Light Rain".
    #[instrument(skip(self))]
    pub async fn current_conditions(&self, city: &str) -> String {
        if city.trim().is_empty() {
            return NOT_APPLICABLE.to_string();
        }

        let api_key = match &self.api_key {
            Some(key) if !key.is_empty() => key.clone(),
            _ => {
                warn!("Weather API key not configured");
                return KEY_MISSING.to_string();
            }
        };

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", city), ("appid", api_key.as_str()), ("units", "metric")])
            .send()
            .await;

        let body: WeatherResponse = match response.and_then(|r| r.error_for_status()) {
            Ok(r) => match r.json().await {
                Ok(body) => body,
                Err(e) => {
                    error!("Weather response unreadable: {}", e);
                    return UNAVAILABLE.to_string();
                }
            },
            Err(e) => {
                error!("Weather request failed: {}", e);
                return UNAVAILABLE.to_string();
            }
        };

        match (body.main, body.weather.into_iter().next()) {
            (Some(main), Some(condition)) => {
                format!("{}°C, {}", main.temp, title_case(&condition.description))
            }
            _ => UNAVAILABLE.to_string(),
        }
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
