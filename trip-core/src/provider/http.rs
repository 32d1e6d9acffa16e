use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::IdProvider;

/// Placeholder endpoint that echoes a post back with an `id`.
pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";

/// Id provider backed by a JSONPlaceholder-style `POST /posts` endpoint.
#[derive(Debug, Clone)]
pub struct HttpIdProvider {
    endpoint: String,
    http: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdRequest<'a> {
    destination: &'a str,
    request_id: u64,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: u64,
}

impl HttpIdProvider {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { endpoint: endpoint.into(), http })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl IdProvider for HttpIdProvider {
    async fn request_id(&self, destination: &str, nonce: u64) -> Result<u64> {
        let res = self
            .http
            .post(&self.endpoint)
            .json(&IdRequest { destination, request_id: nonce })
            .send()
            .await
            .with_context(|| format!("Failed to send id request to {}", self.endpoint))?;

        let status = res.status();
        let body = res.text().await.context("Failed to read id response body")?;

        let id = parse_id_response(status, &body)?;
        tracing::debug!(%destination, id, "Received id from provider");
        Ok(id)
    }
}

fn parse_id_response(status: StatusCode, body: &str) -> Result<u64> {
    if !status.is_success() {
        return Err(anyhow!(
            "Id request failed with status {}: {}",
            status,
            truncate_body(body),
        ));
    }

    let parsed: IdResponse =
        serde_json::from_str(body).context("Id response did not contain a numeric id")?;

    Ok(parsed.id)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/posts", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&request).into_owned()
        });

        (url, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };

        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse().ok())?
            })
            .unwrap_or(0usize);

        raw.len() >= header_end + 4 + content_length
    }

    #[tokio::test]
    async fn returns_id_from_success_response() {
        let (url, server) = serve_once("201 Created", r#"{"destination":"Paris","id":101}"#).await;
        let provider = HttpIdProvider::new(url.clone(), Duration::from_secs(5)).unwrap();
        assert_eq!(provider.endpoint(), url);

        let id = provider.request_id("Paris", 7).await.unwrap();
        assert_eq!(id, 101);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /posts"));
        assert!(request.contains(r#""destination":"Paris""#));
        assert!(request.contains(r#""requestId":7"#));
    }

    #[tokio::test]
    async fn non_success_status_is_failure() {
        let (url, _server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let provider = HttpIdProvider::new(url, Duration::from_secs(5)).unwrap();

        let err = provider.request_id("Paris", 1).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn missing_id_is_failure() {
        let err = parse_id_response(StatusCode::CREATED, r#"{"title":"no id"}"#).unwrap_err();
        assert!(err.to_string().contains("numeric id"));
    }

    #[test]
    fn non_numeric_id_is_failure() {
        assert!(parse_id_response(StatusCode::OK, r#"{"id":"abc"}"#).is_err());
    }

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("short"), "short");
        let long = "é".repeat(150);
        assert!(truncate_body(&long).ends_with("..."));
    }
}
