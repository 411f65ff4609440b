/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// Weather Underground API key, forwarded on every forecast fetch.
    pub api_key: String,
    /// Base URL of the hourly forecast API.
    pub weather_base_url: String,
    /// Base URL of the location autocomplete API.
    pub autocomplete_base_url: String,
    pub port: u16,
    /// Name of the cookie carrying the per-client session id.
    pub session_cookie: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            api_key: std::env::var("WUNDERGROUND_KEY")
                .unwrap_or_else(|_| "development".to_string()),
            weather_base_url: std::env::var("WUNDERGROUND_BASE_URL")
                .unwrap_or_else(|_| "http://api.wunderground.com".to_string()),
            autocomplete_base_url: std::env::var("AUTOCOMPLETE_BASE_URL")
                .unwrap_or_else(|_| "http://autocomplete.wunderground.com".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid u16"),
            session_cookie: std::env::var("SESSION_COOKIE")
                .unwrap_or_else(|_| "seanweather_session".to_string()),
        }
    }
}
