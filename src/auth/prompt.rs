use std::io::{self, BufRead, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use log::{info, warn};
use tiny_http::{Response, Server};
use url::Url;

use crate::error::AuthError;

/// Obtains an authorization code from the operator for a consent URL.
pub trait CodePrompt {
    fn obtain_code(&self, auth_url: &Url) -> Result<String, AuthError>;
}

/// Prints the consent URL and reads the pasted code from stdin.
#[derive(Default)]
pub struct ConsolePrompt;

impl CodePrompt for ConsolePrompt {
    fn obtain_code(&self, auth_url: &Url) -> Result<String, AuthError> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        read_code(auth_url, &mut stdin.lock(), &mut stdout.lock())
    }
}

fn read_code(
    auth_url: &Url,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<String, AuthError> {
    let io_err = |e: io::Error| AuthError::Prompt(e.to_string());

    writeln!(
        output,
        "Please visit this url and authorize the app.\nIt will give you a short code to enter.\nAuth Url: {auth_url}"
    )
    .map_err(io_err)?;
    write!(output, "Please enter the code here: ").map_err(io_err)?;
    output.flush().map_err(io_err)?;

    let mut line = String::new();
    input.read_line(&mut line).map_err(io_err)?;
    writeln!(
        output,
        "If you still have the authentication page open, please close it."
    )
    .map_err(io_err)?;

    let code = line.trim();
    if code.is_empty() {
        return Err(AuthError::Prompt("no authorization code entered".to_string()));
    }
    Ok(code.to_string())
}

/// Opens the browser and catches the redirect on a loopback listener bound
/// to the redirect URI's port.
pub struct LoopbackPrompt {
    redirect: Url,
    timeout: Duration,
}

impl LoopbackPrompt {
    pub fn new(redirect_uri: &str) -> Result<Self, AuthError> {
        let redirect = Url::parse(redirect_uri)
            .map_err(|e| AuthError::Prompt(format!("invalid redirect_uri '{redirect_uri}': {e}")))?;
        Ok(Self {
            redirect,
            timeout: Duration::from_secs(120),
        })
    }

    fn bind_addr(&self) -> Result<SocketAddr, AuthError> {
        let host = self
            .redirect
            .host_str()
            .ok_or_else(|| AuthError::Prompt(format!("redirect_uri missing host: {}", self.redirect)))?;
        let port = self
            .redirect
            .port_or_known_default()
            .ok_or_else(|| AuthError::Prompt(format!("redirect_uri missing port: {}", self.redirect)))?;

        let ip: IpAddr = match host {
            "localhost" | "127.0.0.1" => IpAddr::V4(Ipv4Addr::LOCALHOST),
            other => other.parse().map_err(|_| {
                AuthError::Prompt(format!("redirect_uri host must be loopback or an IP: {other}"))
            })?,
        };
        Ok(SocketAddr::new(ip, port))
    }
}

impl CodePrompt for LoopbackPrompt {
    fn obtain_code(&self, auth_url: &Url) -> Result<String, AuthError> {
        let bind_addr = self.bind_addr()?;
        // Listen before the browser can redirect.
        let server = Server::http(bind_addr)
            .map_err(|e| AuthError::Prompt(format!("failed to bind callback server on {bind_addr}: {e}")))?;

        info!("Open this URL in your browser:\n{auth_url}");
        if let Err(e) = open::that(auth_url.as_str()) {
            warn!("could not open browser automatically: {e}");
        }

        let state = expected_state(auth_url);
        wait_for_code(&server, &self.redirect, state.as_deref(), self.timeout)
    }
}

/// The `state` the provider must echo back, if the consent URL carries one.
fn expected_state(auth_url: &Url) -> Option<String> {
    auth_url
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
}

/// Serves callbacks on `server` until one carries a code, the listener
/// fails, or `timeout` elapses.
fn wait_for_code(
    server: &Server,
    redirect: &Url,
    state: Option<&str>,
    timeout: Duration,
) -> Result<String, AuthError> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        let request = match server.recv_timeout(Duration::from_millis(500)) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => {
                warn!("callback listener failed: {e}");
                return Err(AuthError::Prompt(format!("callback listener failed: {e}")));
            }
        };

        match code_from_callback(redirect, request.url(), state) {
            Some(code) => {
                let _ = request.respond(Response::from_string(
                    "Authorization received. You can close this tab.",
                ));
                return Ok(code);
            }
            None => {
                let _ = request.respond(
                    Response::from_string("No valid code found in redirect. You can close this tab.")
                        .with_status_code(400),
                );
            }
        }
    }

    Err(AuthError::Prompt("no authorization code received before timeout".to_string()))
}

/// `path_and_query` is the request target, e.g. `/callback?code=...`.
/// When `state` is given the callback must echo it.
fn code_from_callback(redirect: &Url, path_and_query: &str, state: Option<&str>) -> Option<String> {
    let full = redirect.join(path_and_query).ok()?;
    let mut code = None;
    let mut returned_state = None;
    for (k, v) in full.query_pairs() {
        match k.as_ref() {
            "code" => code = Some(v.into_owned()),
            "state" => returned_state = Some(v.into_owned()),
            _ => {}
        }
    }

    if let Some(expected) = state
        && returned_state.as_deref() != Some(expected)
    {
        warn!("ignoring callback with missing or mismatched state");
        return None;
    }
    code.filter(|c| !c.is_empty())
}
