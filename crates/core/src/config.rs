use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub aws: AwsConfig,
    pub queue: QueueConfig,
    pub storage: StorageConfig,
    pub notify: NotifyConfig,
    pub monitor: MonitorConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `HEARTWATCH_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("HEARTWATCH_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            aws: AwsConfig::from_env_profiled(p),
            queue: QueueConfig::from_env_profiled(p),
            storage: StorageConfig::from_env_profiled(p),
            notify: NotifyConfig::from_env_profiled(p),
            monitor: MonitorConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  aws:      region={}, credentials={}", self.aws.region, self.aws.has_static_credentials());
        tracing::info!("  queue:    url={}", if self.queue.queue_url.is_empty() { "(none)" } else { &self.queue.queue_url });
        tracing::info!("  storage:  backend={}, data_dir={}", self.storage.backend, self.storage.data_dir.display());
        tracing::info!(
            "  notify:   topic={}, webhook={}, email={}",
            self.notify.topic,
            self.notify.webhook_url.is_some(),
            self.notify.email_configured()
        );
        tracing::info!(
            "  monitor:  max_notify_count={}, poll_count={}, server_time={}",
            self.monitor.max_notify_count,
            self.monitor.poll_count,
            self.monitor.use_server_time
        );
    }
}

// ── AWS ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub endpoint_url: Option<String>,
}

impl AwsConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            region: profiled_env_or(p, "AWS_REGION", "us-east-1"),
            access_key_id: profiled_env_opt(p, "AWS_ACCESS_KEY_ID"),
            secret_access_key: profiled_env_opt(p, "AWS_SECRET_ACCESS_KEY"),
            session_token: profiled_env_opt(p, "AWS_SESSION_TOKEN"),
            endpoint_url: profiled_env_opt(p, "QUEUE_AWS_ENDPOINT_URL"),
        }
    }

    pub fn has_static_credentials(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some()
    }
}

// ── Heartbeat queue ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// SQS queue URL; empty means no remote queue.
    pub queue_url: String,
    pub visibility_timeout_secs: u32,
    /// Messages per receive call (SQS caps this at 10).
    pub max_batch_size: u32,
}

impl QueueConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            queue_url: profiled_env_or(p, "HEARTWATCH_QUEUE_URL", ""),
            visibility_timeout_secs: profiled_env_u32(p, "HEARTWATCH_QUEUE_VISIBILITY_TIMEOUT_SECS", 30),
            max_batch_size: profiled_env_u32(p, "HEARTWATCH_QUEUE_MAX_BATCH", 10),
        }
    }
}

// ── Record storage ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "file" or "memory"
    pub backend: String,
    pub data_dir: PathBuf,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            backend: profiled_env_or(p, "HEARTWATCH_STORE", "file"),
            data_dir: PathBuf::from(profiled_env_or(p, "HEARTWATCH_DATA_DIR", "data")),
        }
    }
}

// ── Notifications ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub topic: String,
    pub webhook_url: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_tls: bool,
    pub smtp_username: Option<String>,
    #[serde(skip_serializing)]
    pub smtp_password: Option<String>,
    pub email_from: Option<String>,
    pub email_to: Vec<String>,
}

impl NotifyConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            topic: profiled_env_or(p, "HEARTWATCH_TOPIC", "heartwatch"),
            webhook_url: profiled_env_opt(p, "HEARTWATCH_WEBHOOK_URL"),
            smtp_host: profiled_env_opt(p, "SMTP_HOST"),
            smtp_port: profiled_env_opt(p, "SMTP_PORT").and_then(|v| v.parse().ok()),
            smtp_tls: profiled_env_bool(p, "SMTP_TLS", true),
            smtp_username: profiled_env_opt(p, "SMTP_USERNAME"),
            smtp_password: profiled_env_opt(p, "SMTP_PASSWORD"),
            email_from: profiled_env_opt(p, "HEARTWATCH_EMAIL_FROM"),
            email_to: profiled_env_opt(p, "HEARTWATCH_EMAIL_TO")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    pub fn email_configured(&self) -> bool {
        self.smtp_host.is_some() && self.email_from.is_some() && !self.email_to.is_empty()
    }
}

// ── Monitor behaviour ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Down alerts per outage before the sweep goes quiet.
    pub max_notify_count: u32,
    /// Queue batches drained per poll cycle.
    pub poll_count: u32,
    /// Use processing time instead of the time carried by the heartbeat.
    pub use_server_time: bool,
    pub run_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_notify_count: 3,
            poll_count: 3,
            use_server_time: true,
            run_interval_secs: 60,
        }
    }
}

impl MonitorConfig {
    fn from_env_profiled(p: &str) -> Self {
        let defaults = Self::default();
        Self {
            max_notify_count: profiled_env_u32(p, "HEARTWATCH_MAX_NOTIFY_COUNT", defaults.max_notify_count),
            poll_count: profiled_env_u32(p, "HEARTWATCH_POLL_COUNT", defaults.poll_count),
            use_server_time: profiled_env_bool(p, "HEARTWATCH_USE_SERVER_TIME", defaults.use_server_time),
            run_interval_secs: profiled_env_u64(p, "HEARTWATCH_RUN_INTERVAL_SECS", defaults.run_interval_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_prefix_wins_over_plain_key() {
        env::set_var("CFGTEST_HEARTWATCH_TOPIC", "prod-alerts");
        env::set_var("HEARTWATCH_MAX_NOTIFY_COUNT", "7");
        let config = Config::for_profile("cfgtest");
        assert_eq!(config.profile_label(), "CFGTEST");
        assert_eq!(config.notify.topic, "prod-alerts");
        assert_eq!(config.monitor.max_notify_count, 7);
        env::remove_var("CFGTEST_HEARTWATCH_TOPIC");
        env::remove_var("HEARTWATCH_MAX_NOTIFY_COUNT");
    }

    #[test]
    fn email_recipients_are_split() {
        env::set_var("EMAILTEST_HEARTWATCH_EMAIL_TO", "a@example.com, b@example.com,");
        let config = Config::for_profile("EMAILTEST");
        assert_eq!(config.notify.email_to, vec!["a@example.com", "b@example.com"]);
        assert!(!config.notify.email_configured());
        env::remove_var("EMAILTEST_HEARTWATCH_EMAIL_TO");
    }

    #[test]
    fn smtp_credentials_follow_the_profile() {
        env::set_var("SMTPTEST_SMTP_USERNAME", "alerts");
        env::set_var("SMTPTEST_SMTP_PASSWORD", "hunter2");
        let config = Config::for_profile("SMTPTEST");
        assert_eq!(config.notify.smtp_username.as_deref(), Some("alerts"));
        assert_eq!(config.notify.smtp_password.as_deref(), Some("hunter2"));

        let json = serde_json::to_string(&config.notify).unwrap();
        assert!(!json.contains("hunter2"));
        env::remove_var("SMTPTEST_SMTP_USERNAME");
        env::remove_var("SMTPTEST_SMTP_PASSWORD");
    }

    #[test]
    fn monitor_defaults() {
        let defaults = MonitorConfig::default();
        assert_eq!(defaults.max_notify_count, 3);
        assert_eq!(defaults.poll_count, 3);
        assert!(defaults.use_server_time);
    }
}
