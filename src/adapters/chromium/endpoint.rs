use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::error::{Result, ScraperError};

/// Turn a configured remote endpoint into a CDP websocket URL.
///
/// `ws://` and `wss://` URLs are used as-is. An `http(s)://` DevTools address
/// is resolved through its `/json/version` document.
pub async fn resolve_ws_endpoint(http: &Client, endpoint: &str) -> Result<String> {
    let url = Url::parse(endpoint.trim())?;
    match url.scheme() {
        "ws" | "wss" => Ok(url.to_string()),
        "http" | "https" => {
            let version_url = url.join("/json/version")?;
            debug!(url = %version_url, "Discovering CDP websocket endpoint");

            let response = http.get(version_url.as_str()).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ScraperError::Config(format!(
                    "remote browser endpoint {version_url} answered HTTP {status}"
                )));
            }
            let body: serde_json::Value = response.json().await?;
            let ws = body
                .get("webSocketDebuggerUrl")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    ScraperError::Config(format!(
                        "no webSocketDebuggerUrl in {version_url} response"
                    ))
                })?;
            info!(endpoint = ws, "Discovered CDP endpoint");
            Ok(ws.to_string())
        }
        other => Err(ScraperError::Config(format!(
            "unsupported remote endpoint scheme '{other}', expected ws, wss, http or https"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ws_url_passes_through() {
        let http = Client::new();
        let ws = resolve_ws_endpoint(&http, "wss://user:pw@brd.superproxy.io:9222")
            .await
            .unwrap();
        assert!(ws.starts_with("wss://"));
        assert!(ws.contains("brd.superproxy.io:9222"));
    }

    #[tokio::test]
    async fn unsupported_scheme_is_config_error() {
        let http = Client::new();
        let err = resolve_ws_endpoint(&http, "ftp://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ScraperError::Config(_)));
    }

    #[tokio::test]
    async fn garbage_is_url_error() {
        let http = Client::new();
        let err = resolve_ws_endpoint(&http, "not a url").await.unwrap_err();
        assert!(matches!(err, ScraperError::Url(_)));
    }
}
