//! Shared HTTP plumbing for the provider clients

use ecofarm_common::{Error, Result};
use std::time::Duration;

const USER_AGENT: &str = concat!("EcoFarm/", env!("CARGO_PKG_VERSION"));

/// Build a client with the service user agent and a bounded request timeout
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Internal(format!("HTTP client build failed: {}", e)))
}

/// Connect failures and timeouts are worth one more attempt
fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

/// Send a request, retrying once on a transient transport failure
///
/// Any failure that survives the retry is `UpstreamUnavailable`. Status
/// handling is left to the caller.
pub async fn send_with_retry(
    request: reqwest::RequestBuilder,
    provider: &str,
) -> Result<reqwest::Response> {
    let retry = request.try_clone();

    match request.send().await {
        Ok(response) => Ok(response),
        Err(first) if is_transient(&first) => {
            let Some(retry) = retry else {
                return Err(upstream(provider, &first));
            };
            tracing::warn!(provider, error = %first, "Transient provider failure, retrying once");
            retry.send().await.map_err(|e| upstream(provider, &e))
        }
        Err(e) => Err(upstream(provider, &e)),
    }
}

/// Fail with `UpstreamUnavailable` unless the status is 2xx
pub async fn ensure_success(
    response: reqwest::Response,
    provider: &str,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::UpstreamUnavailable(format!(
        "{} returned {}: {}",
        provider,
        status.as_u16(),
        truncate(&body, 200)
    )))
}

fn upstream(provider: &str, err: &reqwest::Error) -> Error {
    Error::UpstreamUnavailable(format!("{} request failed: {}", provider, err))
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 200), "short");
        assert_eq!(truncate("ñandú", 2), "ña");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_upstream_unavailable() {
        let client = build_client(Duration::from_secs(2)).unwrap();
        // Port 9 on localhost: nothing listens, connection refused immediately
        let request = client.get("http://127.0.0.1:9/weather");

        let result = send_with_retry(request, "weather").await;
        assert!(matches!(result, Err(Error::UpstreamUnavailable(_))));
    }
}
