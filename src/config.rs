use crate::session::SessionConfig;
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub nats: NatsConfig,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub wake_lock: WakeLockConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    pub url: String,
    pub session_id: String,
    #[serde(default = "default_transcript_subject")]
    pub transcript_subject: String,
    #[serde(default = "default_command_subject")]
    pub command_subject: String,
    #[serde(default = "default_greeting_subject")]
    pub greeting_subject: String,
}

fn default_transcript_subject() -> String {
    "stt.text.>".to_string()
}

fn default_command_subject() -> String {
    "voice.command".to_string()
}

fn default_greeting_subject() -> String {
    "voice.greeting".to_string()
}

/// Session tuning; anything left out keeps the `SessionConfig` default
#[derive(Debug, Default, Deserialize)]
pub struct SessionSettings {
    pub silence_timeout_ms: Option<u64>,
    pub conversation_idle_timeout_ms: Option<u64>,
    pub wake_patterns: Option<Vec<String>>,
    pub end_patterns: Option<Vec<String>>,
    #[serde(default)]
    pub auto_start: bool,
}

#[derive(Debug, Deserialize)]
pub struct WakeLockConfig {
    pub enabled: bool,
}

impl Default for WakeLockConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load `path` (any extension the `config` crate understands), then apply
    /// `VOICE_SESSION__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("VOICE_SESSION").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn session_config(&self) -> SessionConfig {
        let defaults = SessionConfig::default();
        let settings = &self.session;

        SessionConfig {
            session_id: self.nats.session_id.clone(),
            silence_timeout: settings
                .silence_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.silence_timeout),
            conversation_idle_timeout: settings
                .conversation_idle_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.conversation_idle_timeout),
            wake_patterns: settings
                .wake_patterns
                .clone()
                .unwrap_or(defaults.wake_patterns),
            end_patterns: settings
                .end_patterns
                .clone()
                .unwrap_or(defaults.end_patterns),
        }
    }
}
