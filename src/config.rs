//! Environment-driven configuration

/// Runtime configuration, read once at startup. The Gemini key is optional:
/// the service starts and serves the order sheet without it, only the
/// extraction endpoint requires it.
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8083),
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-3-flash-preview".to_string()),
        }
    }
}
