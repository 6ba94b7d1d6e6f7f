//! Rate limited HTTP client shared by the remote adapters
//!
//! Requests wait for the governor quota, then go out exactly once. Failures
//! are classified into network, decode and status errors and returned to the
//! caller; nothing is retried here.

use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::LogContext;
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};

pub type DirectRateLimiter = GovernorRateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
    governor::middleware::NoOpMiddleware,
>;

const USER_AGENT: &str = "cinelist/0.1";
const MAX_LOGGED_BODY: usize = 200;

/// HTTP client that honours a per-provider request quota
pub struct RateLimitClient {
    client: Client,
    rate_limiter: DirectRateLimiter,
    provider_name: String,
}

impl RateLimitClient {
    /// Client for TMDB (the documented soft limit is ~50 req/s; stay well below)
    pub fn for_tmdb(requests_per_second: f64, timeout: Duration) -> Self {
        Self::new(
            "TMDB",
            Self::create_rate_limiter(requests_per_second, 10),
            timeout,
        )
    }

    /// Client for the Firestore REST API
    pub fn for_firestore(timeout: Duration) -> Self {
        Self::new("Firestore", Self::create_rate_limiter(10.0, 5), timeout)
    }

    /// Create a rate limiter with specified requests per second and burst capacity
    fn create_rate_limiter(requests_per_second: f64, burst_size: u32) -> DirectRateLimiter {
        // Convert rate to duration between requests
        let period = if requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::from_secs(1)
        };

        let burst = NonZeroU32::new(burst_size.max(1)).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(burst);

        GovernorRateLimiter::direct(quota)
    }

    pub fn new(provider_name: &str, rate_limiter: DirectRateLimiter, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                log::warn!(
                    "{}: falling back to default HTTP client ({})",
                    provider_name,
                    e
                );
                Client::new()
            });

        Self {
            client,
            rate_limiter,
            provider_name: provider_name.to_string(),
        }
    }

    /// Make a GET request and decode the JSON body
    pub async fn get<T>(&self, url: &str) -> AppResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.send_json(Method::GET, url, None, None).await
    }

    /// Send a request with an optional JSON body and bearer token
    pub async fn send_json<T>(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        bearer_token: Option<&str>,
    ) -> AppResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.rate_limiter.until_ready().await;

        let endpoint = redact(url);
        LogContext::api_call(&self.provider_name, &endpoint, "start", None);
        let started = Instant::now();

        let mut request_builder = self
            .client
            .request(method.clone(), url)
            .header("Accept", "application/json");
        if let Some(token) = bearer_token {
            request_builder = request_builder.bearer_auth(token);
        }
        if let Some(json_body) = body {
            request_builder = request_builder.json(json_body);
        }

        let response = request_builder.send().await.map_err(|e| {
            log::warn!("{} {} {} failed: {}", self.provider_name, method, endpoint, e);
            AppError::from(e)
        })?;

        let status = response.status();
        LogContext::api_call(
            &self.provider_name,
            &endpoint,
            status.as_str(),
            Some(started.elapsed().as_millis() as u64),
        );

        if !status.is_success() {
            return Err(self.error_from_response(status, response).await);
        }

        self.parse_response(response).await
    }

    /// Decode a JSON body, keeping a short excerpt of the payload in the error
    async fn parse_response<T>(&self, response: Response) -> AppResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response_text = response.text().await.map_err(|e| {
            AppError::NetworkError(format!(
                "Failed to read {} response: {}",
                self.provider_name, e
            ))
        })?;

        serde_json::from_str(&response_text).map_err(|e| {
            AppError::DecodeError(format!(
                "Failed to parse {} response: {}. Response: {}",
                self.provider_name,
                e,
                excerpt(&response_text)
            ))
        })
    }

    async fn error_from_response(&self, status: StatusCode, response: Response) -> AppError {
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| excerpt(&body));
        log::warn!(
            "{} responded with {}: {}",
            self.provider_name,
            status.as_u16(),
            message
        );
        AppError::from_status(
            status.as_u16(),
            &format!("{}: {}", self.provider_name, message),
        )
    }

    /// Get provider name
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }
}

/// Pull the human readable message out of a TMDB or Google API error body
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("status_message")
        .or_else(|| value.get("error").and_then(|e| e.get("message")))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn excerpt(text: &str) -> String {
    if text.len() > MAX_LOGGED_BODY {
        let cut = (0..=MAX_LOGGED_BODY)
            .rev()
            .find(|i| text.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}...", &text[..cut])
    } else {
        text.to_string()
    }
}

/// Strip query parameters (API keys live there) before logging
fn redact(url: &str) -> String {
    url.split('?').next().unwrap_or(url).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = RateLimitClient::for_tmdb(20.0, Duration::from_secs(5));
        assert_eq!(client.provider_name(), "TMDB");

        let firestore = RateLimitClient::for_firestore(Duration::from_secs(5));
        assert_eq!(firestore.provider_name(), "Firestore");
    }

    #[test]
    fn test_error_message_extraction() {
        let tmdb = r#"{"status_code":7,"status_message":"Invalid API key","success":false}"#;
        assert_eq!(error_message(tmdb).as_deref(), Some("Invalid API key"));

        let google = r#"{"error":{"code":403,"message":"Missing permissions","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(error_message(google).as_deref(), Some("Missing permissions"));

        assert_eq!(error_message("<html>"), None);
    }

    #[test]
    fn test_redact_and_excerpt() {
        assert_eq!(
            redact("https://api.themoviedb.org/3/movie/550?api_key=secret"),
            "https://api.themoviedb.org/3/movie/550"
        );
        let long = "é".repeat(150);
        assert!(excerpt(&long).ends_with("..."));
        assert_eq!(excerpt("short"), "short");
    }
}
