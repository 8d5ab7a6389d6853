use crate::completion::{GROQ_DEFAULT_ENDPOINT, GROQ_DEFAULT_MODEL};
use crate::store::default_data_dir;
use std::path::PathBuf;

pub const DEFAULT_FAILURE_TEXT: &str = "Something went wrong.";
pub const DEFAULT_EMPTY_REPLY_TEXT: &str = "No response received.";

/// Runtime configuration, read from the environment.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub proxy_endpoint: Option<String>,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    pub groq_endpoint: String,
    /// System message appended when a turn fails.
    pub failure_text: String,
    /// System message appended when the service answers with nothing.
    pub empty_reply_text: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Settings {
    /// Load `.env` if present, then read settings from the process environment.
    pub fn from_env() -> Self {
        if let Err(err) = dotenvy::dotenv() {
            tracing::debug!(error = %err, "no .env file loaded");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Blank values count as unset
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            data_dir: get("KESTREL_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_data_dir),
            proxy_endpoint: get("KESTREL_ENDPOINT"),
            groq_api_key: get("GROQ_API_KEY"),
            groq_model: get("GROQ_MODEL").unwrap_or_else(|| GROQ_DEFAULT_MODEL.to_string()),
            groq_endpoint: get("GROQ_ENDPOINT")
                .unwrap_or_else(|| GROQ_DEFAULT_ENDPOINT.to_string()),
            failure_text: get("KESTREL_FAILURE_TEXT")
                .unwrap_or_else(|| DEFAULT_FAILURE_TEXT.to_string()),
            empty_reply_text: get("KESTREL_EMPTY_REPLY_TEXT")
                .unwrap_or_else(|| DEFAULT_EMPTY_REPLY_TEXT.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[]);
        assert_eq!(settings.proxy_endpoint, None);
        assert_eq!(settings.groq_api_key, None);
        assert_eq!(settings.groq_model, GROQ_DEFAULT_MODEL);
        assert_eq!(settings.failure_text, "Something went wrong.");
        assert_eq!(settings.data_dir, default_data_dir());
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("KESTREL_DATA_DIR", "/tmp/kestrel-data"),
            ("KESTREL_ENDPOINT", "http://localhost:3000/api/server"),
            ("KESTREL_FAILURE_TEXT", "Try again later."),
        ]);
        assert_eq!(settings.data_dir, PathBuf::from("/tmp/kestrel-data"));
        assert_eq!(
            settings.proxy_endpoint.as_deref(),
            Some("http://localhost:3000/api/server")
        );
        assert_eq!(settings.failure_text, "Try again later.");
    }

    #[test]
    fn test_blank_values_are_unset() {
        let settings = settings(&[("GROQ_API_KEY", "  "), ("GROQ_MODEL", "")]);
        assert_eq!(settings.groq_api_key, None);
        assert_eq!(settings.groq_model, GROQ_DEFAULT_MODEL);
    }
}
