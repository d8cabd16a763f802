// ABOUTME: Configuration types and parsing for skiff.yml.
// ABOUTME: Handles YAML parsing, discovery, and merging with CLI overrides.

use crate::error::{Error, Result};
use crate::session::SessionConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "skiff.yml";
pub const CONFIG_FILENAME_ALT: &str = "skiff.yaml";

/// Connection defaults read from skiff.yml. Every field is optional here;
/// whatever the CLI does not override must be present by the time a session
/// is built.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub key_path: Option<PathBuf>,

    /// Accept and persist unknown host keys (Trust On First Use).
    #[serde(default)]
    pub trust: bool,

    #[serde(default)]
    pub known_hosts_path: Option<PathBuf>,

    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,

    #[serde(default = "default_command_timeout", with = "humantime_serde")]
    pub command_timeout: Duration,
}

fn default_port() -> u16 {
    22
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(300)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: None,
            port: default_port(),
            user: None,
            key_path: None,
            trust: false,
            known_hosts_path: None,
            connect_timeout: default_connect_timeout(),
            command_timeout: default_command_timeout(),
        }
    }
}

impl Config {
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Look for skiff.yml in the given directory. Returns defaults when no
    /// file exists, since the CLI flags alone can describe a connection.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [dir.join(CONFIG_FILENAME), dir.join(CONFIG_FILENAME_ALT)];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// Build a SessionConfig, requiring host and user to be resolved by now.
    /// The password, when any, is supplied separately (it never lives in the
    /// config file).
    pub fn session_config(&self, password: Option<String>) -> Result<SessionConfig> {
        let host = self.host.as_deref().ok_or(Error::MissingOption("host"))?;
        let user = self.user.as_deref().ok_or(Error::MissingOption("user"))?;

        let mut config = SessionConfig::new(host, user)
            .port(self.port)
            .trust_unknown_hosts(self.trust)
            .connect_timeout(self.connect_timeout)
            .command_timeout(self.command_timeout);

        if let Some(key_path) = &self.key_path {
            config = config.key_path(key_path);
        }
        if let Some(known_hosts) = &self.known_hosts_path {
            config = config.known_hosts_path(known_hosts);
        }
        if let Some(password) = password {
            config = config.password(password);
        }

        Ok(config)
    }
}

/// A `[user@]host[:port]` target as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: Option<u16>,
    pub user: Option<String>,
}

impl Target {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("target address cannot be empty".to_string());
        }

        let (user_part, rest) = if let Some(at_pos) = s.find('@') {
            (Some(&s[..at_pos]), &s[at_pos + 1..])
        } else {
            (None, s)
        };

        let (host, port) = if let Some(colon_pos) = rest.rfind(':') {
            let port_str = &rest[colon_pos + 1..];
            let port = port_str
                .parse::<u16>()
                .map_err(|_| format!("invalid port: {}", port_str))?;
            (&rest[..colon_pos], Some(port))
        } else {
            (rest, None)
        };

        if host.is_empty() {
            return Err("hostname cannot be empty".to_string());
        }

        Ok(Target {
            host: host.to_string(),
            port,
            user: user_part.map(|s| s.to_string()),
        })
    }
}

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, template_yaml())?;
    Ok(())
}

fn template_yaml() -> String {
    r#"host: server.example.com
port: 22
user: deploy
# key_path: ~/.ssh/id_ed25519
# SSH host key verification (default: false for security)
# Set to true to enable Trust-On-First-Use, or pre-populate ~/.ssh/known_hosts
# trust: true
# connect_timeout: 30s
# command_timeout: 5m
"#
    .to_string()
}
