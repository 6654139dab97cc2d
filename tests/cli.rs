//! The binary's stdout/stderr split, driven through real invocations

use std::path::Path;
use std::process::Output;
use tokio::process::Command;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Run the binary inside `dir` with every path pinned to it
async fn merchant_auth(dir: &Path, args: &[&str]) -> Output {
    let config_file = dir.join("config.json");
    if !config_file.exists() {
        std::fs::write(&config_file, "{}").unwrap();
    }

    Command::new(env!("CARGO_BIN_EXE_merchant-auth"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .arg("--config")
        .arg(&config_file)
        .arg("--authfiles")
        .arg(dir)
        .arg("--token-file")
        .arg(dir.join("token.json"))
        .args(args)
        .output()
        .await
        .unwrap()
}

fn write_client_secrets(dir: &Path, token_uri: &str) {
    let secrets = serde_json::json!({
        "web": {
            "client_id": "cid",
            "client_secret": "csecret",
            "token_uri": token_uri
        }
    });
    std::fs::write(dir.join("client-secrets.json"), secrets.to_string()).unwrap();
}

#[tokio::test]
async fn token_prints_only_the_access_token() {
    let endpoint = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.scripted",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&endpoint)
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_client_secrets(dir.path(), &format!("{}/token", endpoint.uri()));
    std::fs::write(dir.path().join("token.json"), r#"{"refresh_token": "1//stored"}"#).unwrap();

    let output = merchant_auth(dir.path(), &["token"]).await;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "ya29.scripted\n");
}

#[tokio::test]
async fn token_shows_consent_url_on_stderr() {
    let dir = tempfile::tempdir().unwrap();
    write_client_secrets(dir.path(), "http://127.0.0.1:1/token");

    let output = merchant_auth(dir.path(), &["--port", "0", "--timeout", "1", "token"]).await;

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty(), "{}", String::from_utf8_lossy(&output.stdout));
    assert!(stderr.contains("https://accounts.google.com/o/oauth2/auth?response_type=code"), "{stderr}");
    assert!(stderr.contains("Waiting for authorization and callback to: http://127.0.0.1:"), "{stderr}");
    assert!(stderr.contains("No authorization callback received within 1s"), "{stderr}");
}

#[tokio::test]
async fn revoked_token_reports_endpoint_detail() {
    let endpoint = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Token has been expired or revoked."
        })))
        .mount(&endpoint)
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_client_secrets(dir.path(), &format!("{}/token", endpoint.uri()));
    std::fs::write(dir.path().join("token.json"), r#"{"refresh_token": "1//revoked"}"#).unwrap();

    let output = merchant_auth(dir.path(), &["login"]).await;

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("invalid_grant: Token has been expired or revoked."), "{stderr}");
    assert!(stderr.contains("merchant-auth logout"), "{stderr}");
}

#[tokio::test]
async fn status_needs_no_network() {
    let dir = tempfile::tempdir().unwrap();
    write_client_secrets(dir.path(), "http://127.0.0.1:1/token");

    let output = merchant_auth(dir.path(), &["status"]).await;

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(output.status.success());
    assert!(stdout.contains("Would use interactive authorization"), "{stdout}");
}
