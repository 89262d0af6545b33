use std::time::{Duration, Instant};

use async_trait::async_trait;
use chat_dispatch_core::{ForwardError, Forwarder};
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::reply::parse_reply;

const CHAT_PATH: &str = "chat";
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_LOGGED_BODY: usize = 512;

#[derive(Serialize)]
struct ForwardBody<'a> {
    message: &'a str,
}

/// HTTP client that forwards prompts to downstream `/chat` endpoints.
#[derive(Clone)]
pub struct DownstreamClient {
    http: Client,
}

impl DownstreamClient {
    /// Creates a client whose every call is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Forwarder for DownstreamClient {
    async fn forward(&self, endpoint: &Url, message: &str) -> Result<String, ForwardError> {
        let url = endpoint.join(CHAT_PATH)?;
        let started = Instant::now();

        let response = self
            .http
            .post(url.clone())
            .json(&ForwardBody { message })
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        debug!(
            stage = "forward",
            %url,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "downstream responded"
        );

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            return Err(ForwardError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<unavailable>"));
            return Err(ForwardError::Status {
                status: status.as_u16(),
                body: truncate_for_log(body),
            });
        }

        let body = response.bytes().await.map_err(classify)?;
        parse_reply(&body)
    }
}

fn classify(err: reqwest::Error) -> ForwardError {
    if err.is_timeout() {
        ForwardError::Timeout
    } else {
        ForwardError::Unreachable(err.to_string())
    }
}

fn truncate_for_log(mut body: String) -> String {
    if body.len() > MAX_LOGGED_BODY {
        let mut cut = MAX_LOGGED_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}
