use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub postgrest_url: String,
    pub postgrest_service_key: String,
    pub isoline_base_url: String,
    pub isoline_api_key: String,
    pub isoline_timeout_seconds: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            postgrest_url: env::var("POSTGREST_URL")
                .unwrap_or_else(|_| {
                    warn!("POSTGREST_URL not set, using empty value");
                    String::new()
                }),
            postgrest_service_key: env::var("POSTGREST_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("POSTGREST_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            isoline_base_url: env::var("ISOLINE_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("ISOLINE_BASE_URL not set, using default");
                    "https://api.openrouteservice.org".to_string()
                }),
            isoline_api_key: env::var("ISOLINE_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("ISOLINE_API_KEY not set, using empty value");
                    String::new()
                }),
            isoline_timeout_seconds: env::var("ISOLINE_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.postgrest_url.is_empty() && !self.postgrest_service_key.is_empty()
    }

    pub fn is_geo_routing_configured(&self) -> bool {
        !self.isoline_base_url.is_empty() && !self.isoline_api_key.is_empty()
    }
}
