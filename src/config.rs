use crate::rate_limit::{DEFAULT_MAX_SUBMISSIONS, DEFAULT_WINDOW_SECS};
use crate::validate::ValidationPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Webhook that receives the URL-encoded submission.
    pub endpoint_url: String,
    #[serde(default = "default_country_code")]
    pub country_code: String,
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
    #[serde(default = "default_require_consent")]
    pub require_consent: bool,
    #[serde(default = "default_require_contact")]
    pub require_contact: bool,
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Extra language tables merged over the built-in ones.
    pub translations_file: Option<String>,
    pub privacy_policy_url: Option<String>,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_country_code() -> String {
    "998".to_string()
}

fn default_max_message_len() -> usize {
    1000
}

fn default_require_consent() -> bool {
    true
}

fn default_require_contact() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    #[serde(default = "default_max_submissions")]
    pub max_submissions: usize,
    #[serde(default = "default_store_path")]
    pub store_path: String,
}

fn default_window_seconds() -> u64 {
    DEFAULT_WINDOW_SECS
}

fn default_max_submissions() -> usize {
    DEFAULT_MAX_SUBMISSIONS
}

fn default_store_path() -> String {
    "/var/lib/formgate/submissions.json".to_string()
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window_seconds(),
            max_submissions: default_max_submissions(),
            store_path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("formgate/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint_url: "https://example.com/api/contact".to_string(),
            country_code: default_country_code(),
            max_message_len: default_max_message_len(),
            require_consent: default_require_consent(),
            require_contact: default_require_contact(),
            default_language: default_language(),
            translations_file: None,
            privacy_policy_url: Some("https://example.com/privacy".to_string()),
            rate_limit: RateLimitConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validation rules derived from this deployment's settings.
    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            max_message_len: self.max_message_len,
            country_code: self.country_code.clone(),
            require_consent: self.require_consent,
            require_contact: self.require_contact,
        }
    }
}
