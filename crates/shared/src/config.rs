use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::path::PathBuf;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "https://api.twitter.com/1.1";
const DEFAULT_STREAM_BASE_URL: &str = "https://stream.twitter.com/1.1";

/// Platform credentials. Passed to an [`Authenticator`], never read globally.
#[derive(Clone)]
pub struct Credentials {
    pub bearer_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("bearer_token", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Authenticator {
    credentials: Credentials,
}

impl Authenticator {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.credentials.bearer_token)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub api_base_url: Url,
    pub stream_base_url: Url,
    pub output_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::try_load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bearer_token = lookup("SOCIAL_BEARER_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .context(
                "SOCIAL_BEARER_TOKEN not found.\n\n\
                To fix this, create ~/.config/post-sentiment/.env with:\n  \
                SOCIAL_BEARER_TOKEN=your_token_here\n\n\
                Get a bearer token from your developer portal app settings",
            )?;

        let api_base_url = Self::parse_url(
            "SOCIAL_API_BASE_URL",
            lookup("SOCIAL_API_BASE_URL").as_deref(),
            DEFAULT_API_BASE_URL,
        )?;
        let stream_base_url = Self::parse_url(
            "SOCIAL_STREAM_BASE_URL",
            lookup("SOCIAL_STREAM_BASE_URL").as_deref(),
            DEFAULT_STREAM_BASE_URL,
        )?;

        let output_dir = match lookup("POST_SENTIMENT_OUTPUT_DIR") {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => crate::io::default_output_dir()?,
        };

        Ok(Self {
            credentials: Credentials { bearer_token },
            api_base_url,
            stream_base_url,
            output_dir,
        })
    }

    /// Output directory only; does not require credentials.
    pub fn output_dir_from_env() -> Result<PathBuf> {
        Self::try_load_dotenv();
        match env::var("POST_SENTIMENT_OUTPUT_DIR") {
            Ok(dir) if !dir.trim().is_empty() => Ok(PathBuf::from(dir)),
            _ => crate::io::default_output_dir(),
        }
    }

    pub fn authenticator(&self) -> Authenticator {
        Authenticator::new(self.credentials.clone())
    }

    fn parse_url(key: &str, value: Option<&str>, default: &str) -> Result<Url> {
        let raw = value.filter(|v| !v.trim().is_empty()).unwrap_or(default);
        Url::parse(raw).with_context(|| format!("{} is not a valid URL: {}", key, raw))
    }

    pub fn try_load_dotenv() {
        // Try locations in order of preference:

        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/post-sentiment/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("post-sentiment").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("SOCIAL_BEARER_TOKEN"));
    }

    #[test]
    fn test_blank_token_is_an_error() {
        assert!(Config::from_lookup(lookup_from(&[("SOCIAL_BEARER_TOKEN", "  ")])).is_err());
    }

    #[test]
    fn test_defaults_and_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("SOCIAL_BEARER_TOKEN", "abc"),
            ("SOCIAL_STREAM_BASE_URL", "http://localhost:8080/stream"),
            ("POST_SENTIMENT_OUTPUT_DIR", "/tmp/posts"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url.as_str(), "https://api.twitter.com/1.1");
        assert_eq!(config.stream_base_url.as_str(), "http://localhost:8080/stream");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/posts"));
        assert_eq!(config.authenticator().authorization(), "Bearer abc");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("SOCIAL_BEARER_TOKEN", "abc"),
            ("SOCIAL_API_BASE_URL", "not a url"),
            ("POST_SENTIMENT_OUTPUT_DIR", "/tmp/posts"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SOCIAL_API_BASE_URL"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let credentials = Credentials {
            bearer_token: "secret-token".to_string(),
        };
        assert!(!format!("{:?}", credentials).contains("secret-token"));
    }
}
