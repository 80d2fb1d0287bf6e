//! Blocking JSON-over-HTTP helper shared by the model and search clients.
//!
//! Requests run on tokio's blocking pool so callers can simply await them.

use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

/// Header name/value pairs sent with a request.
pub type Headers = Vec<(String, String)>;

pub fn bearer(token: &str) -> (String, String) {
    ("Authorization".to_string(), format!("Bearer {}", token))
}

/// POSTs `body` as JSON to `url` and parses the response body as JSON.
///
/// Non-2xx statuses are errors carrying the provider's message when the body
/// has one. Transport errors and timeouts are errors too.
pub async fn post_json(url: String, headers: Headers, body: Value, timeout: Duration) -> Result<Value> {
    tokio::task::spawn_blocking(move || post_json_blocking(&url, &headers, &body, timeout))
        .await
        .context("HTTP worker task failed")?
}

fn post_json_blocking(url: &str, headers: &Headers, body: &Value, timeout: Duration) -> Result<Value> {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into();

    let request_body_str = serde_json::to_string(body).context("Failed to serialize request body")?;

    let mut request = agent.post(url).header("Content-Type", "application/json");
    for (name, value) in headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let mut response = request
        .send(&request_body_str)
        .with_context(|| format!("Request to {} failed", url))?;
    let status = response.status();
    let response_body: String = response
        .body_mut()
        .read_to_string()
        .with_context(|| format!("Failed to read response from {}", url))?;

    if !status.is_success() {
        let detail = serde_json::from_str::<Value>(&response_body)
            .ok()
            .and_then(|value| error_message(&value))
            .unwrap_or_else(|| response_body.trim().to_string());
        anyhow::bail!("{} returned HTTP {}: {}", url, status.as_u16(), detail);
    }

    serde_json::from_str(&response_body)
        .with_context(|| format!("Response from {} is not valid JSON", url))
}

/// Error text from the common provider error shapes:
/// `{"error": "..."}`, `{"error": {"message": "..."}}` and `{"detail": ...}`.
fn error_message(body: &Value) -> Option<String> {
    body["error"]
        .as_str()
        .or_else(|| body["error"]["message"].as_str())
        .or_else(|| body["detail"].as_str())
        .or_else(|| body["detail"]["error"].as_str())
        .map(str::to_string)
}

/// Joins a base URL and a path without doubling or dropping the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://localhost:11434", "/api/chat"),
            "http://localhost:11434/api/chat"
        );
        assert_eq!(
            join_url("https://api.openai.com/v1/", "chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_bearer_header() {
        let (name, value) = bearer("sk-test");
        assert_eq!(name, "Authorization");
        assert_eq!(value, "Bearer sk-test");
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(&serde_json::json!({"error": "model 'qwen9' not found"})).as_deref(),
            Some("model 'qwen9' not found")
        );
        assert_eq!(
            error_message(&serde_json::json!({
                "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
            }))
            .as_deref(),
            Some("Incorrect API key provided")
        );
        assert_eq!(
            error_message(&serde_json::json!({"detail": {"error": "Unauthorized: missing API key"}}))
                .as_deref(),
            Some("Unauthorized: missing API key")
        );
        assert_eq!(
            error_message(&serde_json::json!({"detail": "Invalid API key"})).as_deref(),
            Some("Invalid API key")
        );
        assert_eq!(error_message(&serde_json::json!({"ok": true})), None);
    }

    /// Serves one canned HTTP response on a local port and returns its URL.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = stream.read(&mut buf).unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some((head, rest)) = text.split_once("\r\n\r\n") {
                    let length = head
                        .lines()
                        .filter_map(|line| line.split_once(':'))
                        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if rest.len() >= length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{}/v1/chat/completions", addr)
    }

    #[tokio::test]
    async fn test_post_json_error_status_keeps_provider_message() {
        let url = serve_once(
            "HTTP/1.1 401 Unauthorized",
            r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#,
        );
        let err = post_json(url, Vec::new(), serde_json::json!({}), Duration::from_secs(5))
            .await
            .unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("HTTP 401"), "{}", message);
        assert!(message.contains("Incorrect API key provided"), "{}", message);
    }

    #[tokio::test]
    async fn test_post_json_success_returns_body() {
        let url = serve_once("HTTP/1.1 200 OK", r#"{"choices": []}"#);
        let value = post_json(url, Vec::new(), serde_json::json!({"a": 1}), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(value, serde_json::json!({"choices": []}));
    }

    #[tokio::test]
    async fn test_post_json_unreachable_host_is_error() {
        let result = post_json(
            "http://127.0.0.1:9/unreachable".to_string(),
            Vec::new(),
            serde_json::json!({}),
            Duration::from_millis(500),
        )
        .await;
        assert!(result.is_err());
    }
}
