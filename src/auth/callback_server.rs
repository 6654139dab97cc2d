//! OAuth2 callback server
//!
//! A one-shot local HTTP listener that captures the authorization code from
//! the browser redirect. Exactly one connection is accepted and answered;
//! the listener is closed as soon as that connection arrives.

use regex::Regex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use crate::Result;
use crate::error::Error;

/// Default callback port
pub const CALLBACK_PORT: u16 = 8080;

/// The redirect is read with a single read of at most this many bytes
const MAX_REQUEST_BYTES: usize = 1024;

/// Request line pattern; the space before the HTTP version is required
const QUERY_PATTERN: &str = r"GET\s/\?(.*) ";

const SUCCESS_MESSAGE: &str = "Authorization code was successfully retrieved.";

/// A bound, listening callback socket waiting for its single request
#[derive(Debug)]
pub struct CallbackServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl CallbackServer {
    /// Bind with address reuse and a backlog of one.
    ///
    /// Must be called from within a tokio runtime. An address already held
    /// by another listener (for example a second authorization running at
    /// the same time) fails here with [`Error::CallbackBind`].
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listen = || -> std::io::Result<TcpListener> {
            let socket = if addr.is_ipv4() {
                TcpSocket::new_v4()?
            } else {
                TcpSocket::new_v6()?
            };
            socket.set_reuseaddr(true)?;
            socket.bind(addr)?;
            socket.listen(1)
        };

        let listener = listen().map_err(|source| Error::CallbackBind { addr, source })?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Callback server listening on http://{}", local_addr);
        Ok(Self { listener, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The redirect URI registered for this listener, without a trailing slash
    pub fn redirect_uri(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Accept one connection and return the raw (percent-encoded) code.
    ///
    /// The browser always gets a `200 OK` page describing the outcome before
    /// this returns, on failure paths included.
    pub async fn wait_for_code(self, expected_state: &str, timeout: Option<Duration>) -> Result<String> {
        let Self { listener, .. } = self;

        let accepted = match timeout {
            Some(limit) => tokio::time::timeout(limit, listener.accept())
                .await
                .map_err(|_| Error::CallbackTimeout(limit))?,
            None => listener.accept().await,
        };
        let (stream, peer) = accepted?;
        drop(listener);

        tracing::info!("Callback connection from {}", peer);

        let mut connection = CallbackConnection { stream };
        let outcome = connection
            .read_request()
            .await
            .and_then(|request| parse_query_params(&request))
            .and_then(|params| validate_callback(&params, expected_state));

        let message = match &outcome {
            Ok(_) => SUCCESS_MESSAGE.to_string(),
            Err(e) => e.to_string(),
        };
        connection.respond(&message).await;

        outcome
    }
}

/// Owns the accepted stream; `respond` consumes it, so the reply is sent and
/// the socket closed exactly once.
struct CallbackConnection {
    stream: TcpStream,
}

impl CallbackConnection {
    async fn read_request(&mut self) -> Result<String> {
        let mut buffer = [0u8; MAX_REQUEST_BYTES];
        let n = self.stream.read(&mut buffer).await?;

        String::from_utf8(buffer[..n].to_vec())
            .map_err(|_| Error::CallbackParse("request is not valid UTF-8".to_string()))
    }

    async fn respond(mut self, message: &str) {
        let response = render_response(message);

        if let Err(e) = self.stream.write_all(response.as_bytes()).await {
            tracing::warn!("Failed to send callback response: {}", e);
        }
        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!("Callback connection shutdown: {}", e);
        }
    }
}

fn render_response(message: &str) -> String {
    let body = format!(
        "<b>{}</b><p>Please check the console output.</p>\n",
        escape_html(message)
    );
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Extract the query parameters from a raw request.
///
/// Values are left percent-encoded. A repeated key keeps its last value.
fn parse_query_params(request: &str) -> Result<HashMap<String, String>> {
    let re = Regex::new(QUERY_PATTERN)
        .map_err(|e| Error::CallbackParse(format!("invalid pattern: {}", e)))?;

    let query = re
        .captures(request)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| Error::CallbackParse("expected `GET /?<query> HTTP/..`".to_string()))?
        .as_str();

    Ok(query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key.to_string(), value.to_string())
        })
        .collect())
}

/// Decide the outcome: a missing code wins over a state mismatch
fn validate_callback(params: &HashMap<String, String>, expected_state: &str) -> Result<String> {
    let Some(code) = params.get("code").filter(|code| !code.is_empty()) else {
        let error = params.get("error").map(String::as_str).unwrap_or("unknown");
        return Err(Error::AuthorizationDenied(error.to_string()));
    };

    if params.get("state").map(String::as_str) != Some(expected_state) {
        return Err(Error::StateMismatch);
    }

    Ok(code.clone())
}
