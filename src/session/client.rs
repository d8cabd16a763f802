// ABOUTME: SSH session management using russh.
// ABOUTME: Handles connection lifecycle, authentication, and command execution.

use super::error::{Error, Result};
use super::transfer::TransferChannel;
use russh::client::{self, Config, Handle};
use russh::keys::known_hosts::{
    check_known_hosts, check_known_hosts_path, learn_known_hosts, learn_known_hosts_path,
};
use russh::keys::{PrivateKeyWithHashAlg, decode_secret_key, load_secret_key, ssh_key};
use russh::{ChannelMsg, Disconnect};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for establishing a session.
///
/// Nothing is validated at construction time; missing credentials and
/// unreachable hosts only surface when a connection is attempted.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Remote host to connect to.
    pub host: String,
    /// SSH port (default: 22).
    pub port: u16,
    /// Username for authentication.
    pub user: String,
    /// Optional password. When key material is also present, this doubles
    /// as the key passphrase.
    pub password: Option<String>,
    /// Optional in-memory private key material (PEM / OpenSSH encoded).
    pub key: Option<String>,
    /// Optional path to a private key file.
    pub key_path: Option<PathBuf>,
    /// Whether to accept unknown host keys (Trust On First Use).
    /// If false, connection to unknown hosts will fail.
    pub trust_unknown_hosts: bool,
    /// Optional path to a known_hosts file.
    /// If None, uses the default ~/.ssh/known_hosts.
    pub known_hosts_path: Option<PathBuf>,
    /// Timeout for the connection attempt (default: 30 seconds).
    pub connect_timeout: Duration,
    /// Timeout for command execution (default: 5 minutes).
    pub command_timeout: Duration,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            user: user.into(),
            password: None,
            key: None,
            key_path: None,
            trust_unknown_hosts: false,
            known_hosts_path: None,
            connect_timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(300), // 5 minutes
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(path.into());
        self
    }

    pub fn trust_unknown_hosts(mut self, trust: bool) -> Self {
        self.trust_unknown_hosts = trust;
        self
    }

    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

/// Output from a remote command execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code of the command.
    pub exit_code: u32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Host key verification handler for russh.
pub(crate) struct HostVerifier {
    host: String,
    port: u16,
    trust_unknown_hosts: bool,
    known_hosts_path: Option<PathBuf>,
}

impl HostVerifier {
    fn new(config: &SessionConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            trust_unknown_hosts: config.trust_unknown_hosts,
            known_hosts_path: config.known_hosts_path.clone(),
        }
    }
}

impl client::Handler for HostVerifier {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let check_result = match &self.known_hosts_path {
            Some(path) => check_known_hosts_path(&self.host, self.port, server_public_key, path),
            None => check_known_hosts(&self.host, self.port, server_public_key),
        };

        match check_result {
            Ok(true) => Ok(true),
            Ok(false) => {
                // Host not in known_hosts
                if self.trust_unknown_hosts {
                    tracing::warn!(
                        "Trust-On-First-Use: accepting unknown host key for {}:{}",
                        self.host,
                        self.port
                    );
                    let learn_result = match &self.known_hosts_path {
                        Some(path) => {
                            learn_known_hosts_path(&self.host, self.port, server_public_key, path)
                        }
                        None => learn_known_hosts(&self.host, self.port, server_public_key),
                    };
                    if let Err(e) = learn_result {
                        tracing::warn!("Failed to save host key to known_hosts: {}", e);
                    }
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Err(russh::keys::Error::KeyChanged { .. }) => Ok(false),
            Err(_) => {
                // Other errors - treat as unknown host
                if self.trust_unknown_hosts {
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    }
}

/// Credentials resolved from config.
///
/// When key material or a key path is supplied, only that key is used; there
/// is no fallback to an SSH agent or to default key locations.
enum Credentials {
    Key(Arc<ssh_key::PrivateKey>),
    Password(String),
}

/// Connection lifecycle state owned by the session.
///
/// A transient "connecting" phase exists only inside `ensure_connected` and is
/// never observable from outside a single-threaded async call.
enum ConnectionState {
    Disconnected,
    Connected(Arc<Handle<HostVerifier>>),
    Failed,
}

/// A remote session: lazily connected transport plus a cached SFTP channel.
pub struct Session {
    config: SessionConfig,
    state: ConnectionState,
    transfer: Option<TransferChannel>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected(_) => "connected",
            ConnectionState::Failed => "failed",
        };
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("state", &state)
            .finish()
    }
}

impl Session {
    /// Create a session without connecting. The transport is established on
    /// first use.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: ConnectionState::Disconnected,
            transfer: None,
        }
    }

    /// Create a session and connect immediately.
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        let mut session = Self::new(config);
        session.ensure_connected().await?;
        Ok(session)
    }

    /// Establish the transport if absent or failed, reusing a live one.
    pub async fn ensure_connected(&mut self) -> Result<()> {
        if let ConnectionState::Connected(_) = self.state {
            return Ok(());
        }

        // Any cached transfer channel belonged to a dead transport.
        self.transfer = None;

        match Self::open_transport(&self.config).await {
            Ok(handle) => {
                self.state = ConnectionState::Connected(Arc::new(handle));
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Failed;
                Err(e)
            }
        }
    }

    fn handle(&self) -> Result<Arc<Handle<HostVerifier>>> {
        match &self.state {
            ConnectionState::Connected(handle) => Ok(Arc::clone(handle)),
            _ => Err(Error::NotConnected),
        }
    }

    async fn open_transport(config: &SessionConfig) -> Result<Handle<HostVerifier>> {
        let credentials = Self::resolve_credentials(config)?;

        let russh_config = Config {
            inactivity_timeout: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        let handler = HostVerifier::new(config);

        let connect = client::connect(
            Arc::new(russh_config),
            (config.host.as_str(), config.port),
            handler,
        );
        let mut session = match tokio::time::timeout(config.connect_timeout, connect).await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                if e.to_string().contains("Connection refused") {
                    return Err(Error::Connection(format!(
                        "connection refused to {}:{}",
                        config.host, config.port
                    )));
                }
                return Err(Error::Connection(e.to_string()));
            }
            Err(_) => return Err(Error::ConnectTimeout(config.connect_timeout)),
        };

        let auth_success = Self::authenticate(&mut session, config, credentials).await?;
        if !auth_success {
            return Err(Error::AuthenticationFailed);
        }

        Ok(session)
    }

    /// Resolve which credentials to use. In-memory key material wins over a
    /// key file path, which wins over a bare password.
    fn resolve_credentials(config: &SessionConfig) -> Result<Credentials> {
        if let Some(pem) = &config.key {
            let key = decode_secret_key(pem, config.password.as_deref())
                .map_err(|e| Error::InvalidKey(e.to_string()))?;
            return Ok(Credentials::Key(Arc::new(key)));
        }

        if let Some(key_path) = &config.key_path {
            let key = load_secret_key(key_path, config.password.as_deref()).map_err(|e| {
                Error::KeyLoadFailed {
                    path: key_path.clone(),
                    reason: e.to_string(),
                }
            })?;
            return Ok(Credentials::Key(Arc::new(key)));
        }

        if let Some(password) = &config.password {
            return Ok(Credentials::Password(password.clone()));
        }

        Err(Error::NoCredentials)
    }

    async fn authenticate(
        session: &mut Handle<HostVerifier>,
        config: &SessionConfig,
        credentials: Credentials,
    ) -> Result<bool> {
        match credentials {
            Credentials::Key(key) => {
                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .map_err(Error::Protocol)?
                    .flatten();

                let result = session
                    .authenticate_publickey(&config.user, PrivateKeyWithHashAlg::new(key, hash_alg))
                    .await
                    .map_err(Error::Protocol)?;

                Ok(result.success())
            }
            Credentials::Password(password) => {
                let result = session
                    .authenticate_password(&config.user, &password)
                    .await
                    .map_err(Error::Protocol)?;

                Ok(result.success())
            }
        }
    }

    /// Execute a command on the remote host.
    pub async fn exec(&mut self, command: &str) -> Result<CommandOutput> {
        let timeout = self.config.command_timeout;
        self.exec_with_timeout(command, timeout).await
    }

    /// Execute a command with a custom timeout.
    pub async fn exec_with_timeout(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<CommandOutput> {
        match tokio::time::timeout(timeout, self.exec_inner(command, None)).await {
            Ok(result) => result,
            Err(_) => Err(Error::CommandTimeout(timeout)),
        }
    }

    /// Execute each command in order, applying the optional environment to
    /// every channel. Commands are logged at debug level, output lines at
    /// info level.
    pub async fn run_commands(
        &mut self,
        commands: &[String],
        environment: Option<&HashMap<String, String>>,
    ) -> Result<Vec<CommandOutput>> {
        let timeout = self.config.command_timeout;
        let mut outputs = Vec::with_capacity(commands.len());

        for command in commands {
            tracing::debug!(command = %command, "executing remote command");
            let output = match tokio::time::timeout(
                timeout,
                self.exec_inner(command, environment),
            )
            .await
            {
                Ok(result) => result?,
                Err(_) => return Err(Error::CommandTimeout(timeout)),
            };

            for line in output.stdout.lines() {
                tracing::info!(command = %command, output = %line);
            }
            outputs.push(output);
        }

        Ok(outputs)
    }

    async fn exec_inner(
        &mut self,
        command: &str,
        environment: Option<&HashMap<String, String>>,
    ) -> Result<CommandOutput> {
        self.ensure_connected().await?;
        let handle = self.handle()?;

        let mut channel = match handle.channel_open_session().await {
            Ok(channel) => channel,
            Err(e) => {
                // Channel open failing usually means the transport died;
                // the next operation will reconnect.
                self.state = ConnectionState::Failed;
                self.transfer = None;
                return Err(Error::CommandFailed(format!("failed to open channel: {}", e)));
            }
        };

        if let Some(environment) = environment {
            for (name, value) in environment {
                channel
                    .set_env(false, name.as_str(), value.as_str())
                    .await
                    .map_err(|e| {
                        Error::CommandFailed(format!("failed to set environment: {}", e))
                    })?;
            }
        }

        channel
            .exec(true, command)
            .await
            .map_err(|e| Error::CommandFailed(format!("failed to exec command: {}", e)))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = 0u32;

        let mut got_exit_status = false;
        let mut got_eof = false;

        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { data }) => {
                    stdout.extend_from_slice(&data);
                }
                Some(ChannelMsg::ExtendedData { data, ext }) => {
                    if ext == 1 {
                        // stderr
                        stderr.extend_from_slice(&data);
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    exit_code = exit_status;
                    got_exit_status = true;
                    // If we already got EOF, we can exit now
                    if got_eof {
                        break;
                    }
                }
                Some(ChannelMsg::Eof) => {
                    got_eof = true;
                    // If we already got exit status, we can exit now
                    if got_exit_status {
                        break;
                    }
                }
                Some(ChannelMsg::Close) => {
                    break;
                }
                Some(_) => {}
                None => break,
            }
        }

        // If the channel closed without providing an exit status, this indicates
        // an abnormal termination (e.g., connection timeout, network issue)
        if !got_exit_status {
            return Err(Error::ChannelClosed);
        }

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
        })
    }

    /// Get the SFTP transfer channel, opening one over the live transport if
    /// none is cached.
    pub async fn transfer(&mut self) -> Result<&TransferChannel> {
        self.ensure_connected().await?;
        if self.transfer.is_none() {
            let handle = self.handle()?;
            match TransferChannel::open(&handle).await {
                Ok(channel) => self.transfer = Some(channel),
                Err(e) => {
                    // Channel open failing usually means the transport died;
                    // the next operation will reconnect.
                    self.state = ConnectionState::Failed;
                    return Err(e);
                }
            }
        }
        self.transfer.as_ref().ok_or(Error::NotConnected)
    }

    /// List entries of a remote directory.
    pub async fn list_remote_entries(&mut self, dir: &str) -> Result<Vec<String>> {
        self.transfer().await?.list_dir(dir).await
    }

    /// List files under a local directory, recursively.
    pub fn list_local_entries(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        super::local::list_local_entries(dir)
    }

    /// Copy a local file to a remote path.
    pub async fn upload_file(&mut self, local: &Path, remote: &str) -> Result<()> {
        self.transfer().await?.upload(local, remote).await
    }

    /// Write in-memory bytes to a remote path.
    pub async fn write_to_remote_file(&mut self, content: &[u8], remote: &str) -> Result<()> {
        self.transfer().await?.write(content, remote).await
    }

    /// Read a remote file fully into memory.
    pub async fn open_file(&mut self, remote: &str) -> Result<Vec<u8>> {
        self.transfer().await?.read_file(remote).await
    }

    /// Copy a remote file to a local path.
    pub async fn download_file(&mut self, remote: &str, local: &Path) -> Result<()> {
        self.transfer().await?.download(remote, local).await
    }

    /// Close the transfer channel and the transport, if present. Safe to call
    /// when nothing was ever connected.
    pub async fn disconnect(&mut self) -> Result<()> {
        let mut transfer_err = None;
        if let Some(transfer) = self.transfer.take() {
            if let Err(e) = transfer.close().await {
                tracing::warn!("failed to close transfer channel: {}", e);
                transfer_err = Some(e);
            }
        }

        let state = std::mem::replace(&mut self.state, ConnectionState::Disconnected);
        if let ConnectionState::Connected(handle) = state {
            handle
                .disconnect(Disconnect::ByApplication, "", "en")
                .await
                .map_err(Error::Protocol)?;
        }

        match transfer_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
