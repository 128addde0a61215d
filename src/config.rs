use clap::Parser;
use std::time::Duration;

const DEFAULT_APP_URL: &str = "https://platform.valyu.ai";
const DEFAULT_API_URL: &str = "https://api.valyu.ai";

/// Deployment flavour. `Valyu` routes answer calls through the OAuth proxy
/// and bills the signed-in user; `SelfHosted` uses the server API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    SelfHosted,
    Valyu,
}

impl AppMode {
    /// Anything other than the exact literal `valyu` is self-hosted.
    pub fn from_flag(flag: &str) -> Self {
        if flag == "valyu" {
            AppMode::Valyu
        } else {
            AppMode::SelfHosted
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppMode::SelfHosted => "self-hosted",
            AppMode::Valyu => "valyu",
        }
    }
}

/// Meeting prep brief server
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "MEETING_PREP_BIND", default_value = "0.0.0.0:3000")]
    pub bind: String,

    /// `valyu` for OAuth-delegated billing, anything else for self-hosted
    #[arg(long, env = "APP_MODE", default_value = "self-hosted")]
    pub app_mode: String,

    /// Base URL of the Valyu platform hosting the OAuth proxy
    #[arg(long, env = "VALYU_APP_URL", default_value = DEFAULT_APP_URL)]
    pub valyu_app_url: String,

    /// Base URL of the Valyu API used with the server key
    #[arg(long, env = "VALYU_API_URL", default_value = DEFAULT_API_URL)]
    pub valyu_api_url: String,

    /// Server-held API key, only used in self-hosted mode
    #[arg(long, env = "VALYU_API_KEY", hide_env_values = true)]
    pub valyu_api_key: Option<String>,

    /// Upper bound on a single request, enforced by the HTTP layer
    #[arg(long, env = "MEETING_PREP_MAX_DURATION_SECS", default_value_t = 800)]
    pub max_duration_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            app_mode: AppMode::SelfHosted.as_str().to_string(),
            valyu_app_url: DEFAULT_APP_URL.to_string(),
            valyu_api_url: DEFAULT_API_URL.to_string(),
            valyu_api_key: None,
            max_duration_secs: 800,
        }
    }
}

impl Config {
    pub fn mode(&self) -> AppMode {
        AppMode::from_flag(&self.app_mode)
    }

    pub fn is_self_hosted_mode(&self) -> bool {
        self.mode() == AppMode::SelfHosted
    }

    pub fn proxy_url(&self) -> String {
        format!("{}/api/oauth/proxy", self.valyu_app_url.trim_end_matches('/'))
    }

    pub fn answer_url(&self) -> String {
        format!("{}/v1/answer", self.valyu_api_url.trim_end_matches('/'))
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }
}
