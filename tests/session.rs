// ABOUTME: Integration tests for the session module.
// ABOUTME: Tests run against a shared SSH container.

mod support;

use skiff::session::{Error, Session, SessionConfig};
use std::time::Duration;
use support::ssh_container::shared_container;

/// Test: Connect to SSH server and execute `echo hello`.
/// Expected: Returns "hello" with exit code 0.
#[tokio::test]
async fn connect_and_execute_echo() {
    let container = shared_container().await;
    let config = container.session_config();

    let mut session = Session::connect(config)
        .await
        .expect("connection should succeed");

    let output = session
        .exec("echo hello")
        .await
        .expect("command should succeed");

    assert!(output.success(), "exit code should be 0");
    assert_eq!(output.stdout.trim(), "hello");

    session
        .disconnect()
        .await
        .expect("disconnect should succeed");
}

/// Test: Execute command that writes to stderr.
/// Expected: stderr is captured correctly.
#[tokio::test]
async fn capture_stderr() {
    let container = shared_container().await;
    let config = container.session_config();

    let mut session = Session::connect(config)
        .await
        .expect("connection should succeed");

    let output = session
        .exec("echo error >&2")
        .await
        .expect("command should succeed");

    assert!(output.success());
    assert!(output.stdout.trim().is_empty());
    assert_eq!(output.stderr.trim(), "error");

    session
        .disconnect()
        .await
        .expect("disconnect should succeed");
}

/// Test: Execute command with non-zero exit code.
/// Expected: exit_code reflects the actual exit status.
#[tokio::test]
async fn nonzero_exit_code() {
    let container = shared_container().await;
    let config = container.session_config();

    let mut session = Session::connect(config)
        .await
        .expect("connection should succeed");

    let output = session
        .exec("exit 42")
        .await
        .expect("command should complete");

    assert_eq!(output.exit_code, 42);
    assert!(!output.success());

    session
        .disconnect()
        .await
        .expect("disconnect should succeed");
}

/// Test: Connection to invalid host fails with connection error.
#[tokio::test]
async fn invalid_host_returns_connection_error() {
    let config = SessionConfig::new("nonexistent.invalid.host.example", "testuser")
        .password("irrelevant")
        .connect_timeout(Duration::from_secs(10));

    let result = Session::connect(config).await;

    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(
        matches!(err, Error::Connection(_) | Error::ConnectTimeout(_)),
        "expected Connection error, got: {:?}",
        err
    );
}

/// Test: Connecting without any credentials fails before touching the network.
#[tokio::test]
async fn no_credentials_returns_error() {
    let config = SessionConfig::new("nonexistent.invalid.host.example", "testuser");

    let result = Session::connect(config).await;

    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(
        matches!(err, Error::NoCredentials),
        "expected NoCredentials error, got: {:?}",
        err
    );
}

/// Test: Connection with invalid key path returns a key load error.
#[tokio::test]
async fn invalid_key_returns_load_error() {
    let container = shared_container().await;
    let config = container
        .session_config()
        .key_path("/nonexistent/key/path");

    let result = Session::connect(config).await;

    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(
        matches!(err, Error::KeyLoadFailed { .. }),
        "expected KeyLoadFailed error, got: {:?}",
        err
    );
}

/// Test: Password authentication succeeds against the container.
#[tokio::test]
async fn password_authentication_succeeds() {
    let container = shared_container().await;
    let config = container.session_config_password();

    let mut session = Session::connect(config)
        .await
        .expect("password connection should succeed");

    let output = session
        .exec("echo via-password")
        .await
        .expect("command should succeed");
    assert_eq!(output.stdout.trim(), "via-password");

    session
        .disconnect()
        .await
        .expect("disconnect should succeed");
}

/// Test: Wrong password is rejected by the server.
#[tokio::test]
async fn wrong_password_returns_authentication_failed() {
    let container = shared_container().await;
    let config = container
        .session_config_password()
        .password("definitely-wrong");

    let result = Session::connect(config).await;

    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(
        matches!(err, Error::AuthenticationFailed),
        "expected AuthenticationFailed, got: {:?}",
        err
    );
}

/// Test: An unknown host key must fail the connection when trust is off.
#[tokio::test]
async fn unknown_host_without_trust_fails() {
    let container = shared_container().await;

    // Fresh empty known_hosts: the container's key is guaranteed unknown.
    let known_hosts = tempfile::NamedTempFile::new().expect("temp file");

    let config = container
        .session_config()
        .known_hosts_path(known_hosts.path())
        .trust_unknown_hosts(false);

    let result = Session::connect(config).await;

    assert!(
        result.is_err(),
        "connection to an unknown host must fail without trust"
    );
}

/// Test: Each command in a batch is executed individually.
/// Expected: two distinct executions with distinct outputs.
#[tokio::test]
async fn run_commands_executes_each_command() {
    let container = shared_container().await;
    let config = container.session_config();

    let mut session = Session::connect(config)
        .await
        .expect("connection should succeed");

    let outputs = session
        .run_commands(&["echo a".to_string(), "echo b".to_string()], None)
        .await
        .expect("commands should succeed");

    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].stdout.trim(), "a");
    assert_eq!(outputs[1].stdout.trim(), "b");

    session
        .disconnect()
        .await
        .expect("disconnect should succeed");
}

/// Test: The transport is reused across operations on one session.
#[tokio::test]
async fn transport_is_reused_across_operations() {
    let container = shared_container().await;
    let config = container.session_config();

    let mut session = Session::connect(config)
        .await
        .expect("connection should succeed");

    let first = session.exec("echo one").await.expect("first command");
    let second = session.exec("echo two").await.expect("second command");

    assert_eq!(first.stdout.trim(), "one");
    assert_eq!(second.stdout.trim(), "two");

    session
        .disconnect()
        .await
        .expect("disconnect should succeed");
}

/// Test: Command times out when execution exceeds timeout.
#[tokio::test]
async fn command_timeout_returns_error() {
    let container = shared_container().await;
    let config = container.session_config();

    let mut session = Session::connect(config)
        .await
        .expect("connection should succeed");

    // Execute a sleep command with a very short timeout
    let result = session
        .exec_with_timeout("sleep 10", Duration::from_millis(100))
        .await;

    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(
        matches!(err, Error::CommandTimeout(_)),
        "expected CommandTimeout error, got: {:?}",
        err
    );

    session
        .disconnect()
        .await
        .expect("disconnect should succeed");
}

/// Test: disconnect is a no-op when nothing was ever connected.
#[tokio::test]
async fn disconnect_without_connect_is_noop() {
    let config = SessionConfig::new("example.com", "testuser");
    let mut session = Session::new(config);

    session
        .disconnect()
        .await
        .expect("disconnect on a never-connected session should succeed");
}
