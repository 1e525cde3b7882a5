use std::error::Error as StdError;
use std::time::{Duration, Instant};

use anyhow::Result;
use reqwest::{Client, Method, redirect};
use tracing::debug;

use super::types::ProbeOutcome;
use crate::database::models::{HttpMethod, HttpProbeConfig};

pub const MIN_TIMEOUT_MS: u64 = 1_000;
pub const MAX_TIMEOUT_MS: u64 = 60_000;
const MAX_REDIRECTS: usize = 5;
const USER_AGENT: &str = concat!("pulse-monitor/", env!("CARGO_PKG_VERSION"));

/// Clamp a per-monitor timeout to the supported window
pub fn effective_timeout(timeout_ms: u64) -> Duration {
    Duration::from_millis(timeout_ms.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS))
}

/// Redirect and certificate handling are client-level settings in reqwest,
/// so one client is kept per combination.
struct ClientSet {
    follow_strict: Client,
    follow_lax: Client,
    direct_strict: Client,
    direct_lax: Client,
}

impl ClientSet {
    fn build() -> Result<Self> {
        let build = |follow: bool, validate_ssl: bool| -> Result<Client> {
            let policy = if follow { redirect::Policy::limited(MAX_REDIRECTS) } else { redirect::Policy::none() };
            Ok(Client::builder()
                .user_agent(USER_AGENT)
                .redirect(policy)
                .danger_accept_invalid_certs(!validate_ssl)
                .build()?)
        };

        Ok(Self {
            follow_strict: build(true, true)?,
            follow_lax: build(true, false)?,
            direct_strict: build(false, true)?,
            direct_lax: build(false, false)?,
        })
    }

    fn pick(&self, follow_redirects: bool, validate_ssl: bool) -> &Client {
        match (follow_redirects, validate_ssl) {
            (true, true) => &self.follow_strict,
            (true, false) => &self.follow_lax,
            (false, true) => &self.direct_strict,
            (false, false) => &self.direct_lax,
        }
    }
}

/// HTTP/HTTPS checker
///
/// Performs exactly one request per call and classifies the outcome. Any
/// status code is accepted from the transport; whether it counts as UP is
/// decided against the monitor's expectations.
pub struct HttpChecker {
    clients: ClientSet,
}

impl HttpChecker {
    pub fn new() -> Result<Self> {
        Ok(Self { clients: ClientSet::build()? })
    }

    pub async fn probe(&self, config: &HttpProbeConfig) -> ProbeOutcome {
        let timeout = effective_timeout(config.timeout_ms);
        let client = self.clients.pick(config.follow_redirects, config.validate_ssl);

        debug!("Performing HTTP check: {} {}", config.method, config.url);

        let mut request = client.request(to_reqwest_method(config.method), &config.url).timeout(timeout);
        for (key, value) in &config.headers {
            request = request.header(key, value);
        }
        if let Some(body) = &config.body {
            request = request.body(body.clone());
        }

        let start = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => {
                let elapsed = elapsed_ms(start);
                return ProbeOutcome::down(elapsed, describe_transport_error(&error, config, timeout));
            }
        };

        let status_code = response.status().as_u16();
        let expected =
            if config.expected_status_codes.is_empty() { vec![200] } else { config.expected_status_codes.clone() };

        if !expected.contains(&status_code) {
            let elapsed = elapsed_ms(start);
            let expected_list = expected.iter().map(u16::to_string).collect::<Vec<_>>().join(", ");
            return ProbeOutcome::down(
                elapsed,
                format!("Unexpected status code: {status_code}. Expected: {expected_list}"),
            )
            .with_status_code(status_code);
        }

        let Some(keyword) = config.expected_keyword.as_deref().filter(|k| !k.is_empty()) else {
            return ProbeOutcome::up(elapsed_ms(start), Some(status_code));
        };

        let body = match response.text().await {
            Ok(body) => body,
            Err(error) => {
                let elapsed = elapsed_ms(start);
                return ProbeOutcome::down(elapsed, describe_transport_error(&error, config, timeout))
                    .with_status_code(status_code);
            }
        };
        let elapsed = elapsed_ms(start);

        if body.contains(keyword) {
            ProbeOutcome::up(elapsed, Some(status_code)).with_keyword_match(true)
        } else {
            ProbeOutcome::down(elapsed, format!("Keyword \"{keyword}\" not found in response"))
                .with_status_code(status_code)
                .with_keyword_match(false)
        }
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Head => Method::HEAD,
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Flatten an error and all of its sources into one lowercase string
fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ").to_lowercase()
}

fn has_io_kind(error: &(dyn StdError + 'static), kind: std::io::ErrorKind) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(inner) = current {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            if io.kind() == kind {
                return true;
            }
        }
        current = inner.source();
    }
    false
}

/// Map a transport failure to a reason naming its class and the target
fn describe_transport_error(error: &reqwest::Error, config: &HttpProbeConfig, timeout: Duration) -> String {
    let url = &config.url;
    if error.is_timeout() {
        return format!("Request timed out after {}ms", timeout.as_millis());
    }

    let chain = error_chain(error);

    if has_io_kind(error, std::io::ErrorKind::ConnectionRefused) || chain.contains("connection refused") {
        return format!("Connection refused to {url}");
    }

    if chain.contains("dns error")
        || chain.contains("failed to lookup address")
        || chain.contains("name or service not known")
        || chain.contains("no such host")
    {
        return format!("DNS lookup failed for {url}");
    }

    if ["certificate", "tls", "ssl", "handshake", "corrupt message"].iter().any(|needle| chain.contains(needle)) {
        return format!("TLS handshake failed for {url}: {error}");
    }

    if error.is_redirect() {
        return format!("Too many redirects for {url}");
    }

    if error.is_builder() {
        return format!("Invalid request for {url}: {error}");
    }

    format!("Network error for {url}: {error}")
}
