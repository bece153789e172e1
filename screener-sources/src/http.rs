//! Shared HTTP plumbing: client construction and failure classification.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use screener_core::{ScreenerError, SourceError};
use serde::de::DeserializeOwned;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Build the HTTP client shared by every adapter.
///
/// # Errors
/// Returns `Config` when the TLS backend cannot be initialised.
pub fn build_client(timeout: Duration) -> Result<Client, ScreenerError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ScreenerError::config("HTTP_TIMEOUT", format!("http client: {e}")))
}

/// Map a non-success status to the source taxonomy.
pub fn classify_status(provider: &str, status: StatusCode, body: &str) -> SourceError {
    let snippet: String = body.chars().take(200).collect();
    match status {
        StatusCode::TOO_MANY_REQUESTS => SourceError::rate_limited(provider),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SourceError::auth(provider, format!("HTTP {status}: {snippet}"))
        }
        StatusCode::NOT_FOUND => SourceError::not_found(provider, format!("HTTP 404: {snippet}")),
        s => SourceError::InvalidResponse {
            provider: provider.to_string(),
            msg: format!("HTTP {s}: {snippet}"),
            status: Some(s.as_u16()),
        },
    }
}

/// Map a transport failure to the source taxonomy.
pub fn classify_transport(provider: &str, e: &reqwest::Error) -> SourceError {
    if e.is_timeout() {
        return SourceError::timeout(provider);
    }
    if e.is_decode() {
        return SourceError::invalid(provider, format!("decode: {e}"));
    }
    SourceError::invalid(provider, format!("transport: {e}"))
}

/// Send `req` and return the body of a successful response.
pub async fn send_text(provider: &str, req: RequestBuilder) -> Result<String, SourceError> {
    let resp = req
        .send()
        .await
        .map_err(|e| classify_transport(provider, &e))?;
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| classify_transport(provider, &e))?;
    if !status.is_success() {
        tracing::debug!(provider, status = status.as_u16(), "non-success response");
        return Err(classify_status(provider, status, &body));
    }
    Ok(body)
}

/// Send `req` and decode a JSON body, classifying every failure.
pub async fn send_json<T: DeserializeOwned>(
    provider: &str,
    req: RequestBuilder,
) -> Result<T, SourceError> {
    let body = send_text(provider, req).await?;
    serde_json::from_str(&body)
        .map_err(|e| SourceError::invalid(provider, format!("decode: {e}")))
}

/// Parse a provider numeric string, treating placeholders as absent.
pub fn parse_num(raw: Option<&str>) -> Option<f64> {
    let s = raw?.trim().trim_end_matches('%');
    if s.is_empty() || s == "None" || s == "-" || s == "N/A" {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Drop empty strings.
pub fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty() && s != "None")
}
