//! Tracker configuration, read once and passed by reference

use crate::error::ConfigError;
use std::{
    fmt::{Debug, Formatter},
    time::Duration,
};

pub const DEFAULT_BASE_URL: &str = "https://usmanjoy.atlassian.net";
pub const DEFAULT_ENVIRONMENT: &str = "Rust Playwright Tests";
pub const DEFAULT_FRAMEWORK: &str = "e2e runner";

pub const USERNAME_VAR: &str = "JIRA_USERNAME";
pub const TOKEN_VAR: &str = "JIRA_TOKEN";
pub const TIMEOUT_VAR: &str = "JIRA_TIMEOUT_SECS";
pub const ENVIRONMENT_VAR: &str = "JIRA_TEST_ENVIRONMENT";

#[derive(Clone)]
pub struct TrackerConfig {
    base_url: String,
    username: String,
    token: String,
    /// Request timeout, applied to every call.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Labels written into every report comment.
    pub environment: String,
    pub framework: String,
    pub machine: String,
}

impl TrackerConfig {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Result<Self, ConfigError> {
        let username = username.into();
        let token = token.into();
        if username.trim().is_empty() {
            return Err(ConfigError::Missing(USERNAME_VAR));
        }
        if token.trim().is_empty() {
            return Err(ConfigError::Missing(TOKEN_VAR));
        }

        Ok(TrackerConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            username,
            token,
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            framework: DEFAULT_FRAMEWORK.to_string(),
            machine: "Unknown".to_string(),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source; `from_env` uses the process environment.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let username = lookup(USERNAME_VAR).ok_or(ConfigError::Missing(USERNAME_VAR))?;
        let token = lookup(TOKEN_VAR).ok_or(ConfigError::Missing(TOKEN_VAR))?;
        let mut config = TrackerConfig::new(username, token)?;

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    name: TIMEOUT_VAR,
                    reason: format!("expected a positive number of seconds, got {:?}", raw),
                })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(environment) = lookup(ENVIRONMENT_VAR).filter(|v| !v.trim().is_empty()) {
            config.environment = environment;
        }
        if let Some(machine) = lookup("COMPUTERNAME")
            .or_else(|| lookup("HOSTNAME"))
            .filter(|v| !v.trim().is_empty())
        {
            config.machine = machine;
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    /// Token with everything but the last four characters hidden.
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.token.chars().collect();
        let visible = chars.len().min(4);
        let hidden = chars.len() - visible;
        let tail: String = chars[hidden..].iter().collect();
        format!("{}{}", "*".repeat(hidden), tail)
    }
}

impl Debug for TrackerConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("token", &self.masked_token())
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("environment", &self.environment)
            .field("framework", &self.framework)
            .field("machine", &self.machine)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn missing_username_is_reported_first() {
        let err = TrackerConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(USERNAME_VAR));
    }

    #[test]
    fn missing_or_blank_token() {
        let err = TrackerConfig::from_lookup(lookup(&[(USERNAME_VAR, "qa@example.com")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing(TOKEN_VAR));

        let err = TrackerConfig::from_lookup(lookup(&[
            (USERNAME_VAR, "qa@example.com"),
            (TOKEN_VAR, ""),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing(TOKEN_VAR));
    }

    #[test]
    fn optional_values() {
        let config = TrackerConfig::from_lookup(lookup(&[
            (USERNAME_VAR, "qa@example.com"),
            (TOKEN_VAR, "secret-token-1234"),
            (TIMEOUT_VAR, "3"),
            (ENVIRONMENT_VAR, "staging"),
            ("HOSTNAME", "ci-runner-7"),
        ]))
        .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.environment, "staging");
        assert_eq!(config.machine, "ci-runner-7");
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = TrackerConfig::from_lookup(lookup(&[
            (USERNAME_VAR, "qa@example.com"),
            (TOKEN_VAR, "token"),
            (TIMEOUT_VAR, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: TIMEOUT_VAR, .. }));
    }

    #[test]
    fn token_is_masked_in_debug_output() {
        let config = TrackerConfig::new("qa@example.com", "abcdefgh1234").unwrap();
        assert_eq!(config.masked_token(), "********1234");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("abcdefgh1234"));
        assert!(debug.contains("********1234"));

        let short = TrackerConfig::new("qa", "ab").unwrap();
        assert_eq!(short.masked_token(), "ab");
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let config = TrackerConfig::new("qa", "token")
            .unwrap()
            .with_base_url("http://127.0.0.1:1234/");
        assert_eq!(config.base_url(), "http://127.0.0.1:1234");
    }

    #[test]
    #[serial]
    fn reads_process_environment() {
        std::env::remove_var(USERNAME_VAR);
        std::env::remove_var(TOKEN_VAR);
        assert_eq!(
            TrackerConfig::from_env().unwrap_err(),
            ConfigError::Missing(USERNAME_VAR)
        );

        std::env::set_var(USERNAME_VAR, "qa@example.com");
        std::env::set_var(TOKEN_VAR, "env-token-9876");
        let config = TrackerConfig::from_env().unwrap();
        assert_eq!(config.username(), "qa@example.com");
        assert_eq!(config.masked_token(), "**********9876");

        std::env::remove_var(USERNAME_VAR);
        std::env::remove_var(TOKEN_VAR);
    }
}
