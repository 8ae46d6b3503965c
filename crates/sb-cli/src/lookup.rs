//! HTTP lookup backend.
//!
//! Each call is one blocking exchange driven on a private current-thread
//! runtime. Retries (off by default) only cover transport failures, 429 and
//! 5xx responses.

use std::time::Duration;

use log::{debug, warn};
use reqwest::StatusCode;

use sb_core::protocol::{
    FindFullHashesRequest, FindFullHashesResponse, LookupError, LookupService, FULL_HASHES_PATH,
};

pub struct HttpLookupService {
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_retries: usize,
}

impl HttpLookupService {
    pub fn new(
        server: &str,
        api_key: &str,
        timeout: Duration,
        max_retries: usize,
    ) -> Result<Self, String> {
        if api_key.trim().is_empty() {
            return Err("Missing API key".to_string());
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            runtime,
            client,
            endpoint: format!("{}{}", server.trim_end_matches('/'), FULL_HASHES_PATH),
            api_key: api_key.trim().to_string(),
            max_retries,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn exchange(
        &self,
        request: &FindFullHashesRequest,
    ) -> Result<FindFullHashesResponse, LookupError> {
        let mut attempt = 0usize;
        loop {
            debug!(
                "POST {} ({} entries, attempt {})",
                self.endpoint,
                request.threat_info.threat_entries.len(),
                attempt + 1
            );
            let sent = self
                .client
                .post(&self.endpoint)
                .query(&[("key", self.api_key.as_str())])
                .json(request)
                .send()
                .await;

            let error = match sent {
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp
                        .text()
                        .await
                        .map_err(|e| LookupError::Transport(e.to_string()))?;
                    if status.is_success() {
                        return decode_response(&body);
                    }
                    let error = LookupError::Status {
                        status: status.as_u16(),
                        body,
                    };
                    if !should_retry(status) {
                        return Err(error);
                    }
                    error
                }
                Err(err) => LookupError::Transport(err.to_string()),
            };

            if attempt >= self.max_retries {
                return Err(error);
            }
            attempt += 1;
            warn!("lookup attempt {} failed, retrying: {}", attempt, error);
            tokio::time::sleep(retry_backoff(attempt)).await;
        }
    }
}

impl LookupService for HttpLookupService {
    fn find_full_hashes(
        &mut self,
        request: &FindFullHashesRequest,
    ) -> Result<FindFullHashesResponse, LookupError> {
        self.runtime.block_on(self.exchange(request))
    }
}

/// An empty body is a valid "no matches" answer.
fn decode_response(body: &str) -> Result<FindFullHashesResponse, LookupError> {
    if body.trim().is_empty() {
        return Ok(FindFullHashesResponse::default());
    }
    serde_json::from_str(body).map_err(|e| LookupError::Decode(e.to_string()))
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(100 * (1 << capped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use sb_core::hash::Digest;
    use sb_core::protocol::ClientConfig;
    use serde_json::json;

    fn request() -> FindFullHashesRequest {
        ClientConfig::default().request(&[Digest::of("google.com/").prefix()])
    }

    fn service(server: &mockito::Server, retries: usize) -> HttpLookupService {
        HttpLookupService::new(&server.url(), "test-key", Duration::from_secs(5), retries).unwrap()
    }

    #[test]
    fn test_posts_prefixes_with_key() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v4/fullHashes:find")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::PartialJson(json!({
                "client": {"clientId": "NSRG", "clientVersion": "1.0"},
                "threatInfo": {"threatEntries": [{"hash": "iJgeYg=="}]}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "matches": [{
                        "threatType": "MALWARE",
                        "platformType": "ANY_PLATFORM",
                        "threat": {"hash": Digest::of("google.com/").to_base64()}
                    }]
                })
                .to_string(),
            )
            .create();

        let mut lookup = service(&server, 0);
        let response = lookup.find_full_hashes(&request()).unwrap();

        mock.assert();
        assert_eq!(response.matches.len(), 1);
        assert_eq!(
            response.matches[0].full_hash(),
            "iJgeYmO+NKbAtTrac9Fotogo3WQ3I9NKgS6fimq7Xuk="
        );
    }

    #[test]
    fn test_empty_body_means_no_matches() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v4/fullHashes:find")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("")
            .create();

        let response = service(&server, 0).find_full_hashes(&request()).unwrap();
        mock.assert();
        assert!(response.matches.is_empty());
    }

    #[test]
    fn test_empty_object_means_no_matches() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/v4/fullHashes:find")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create();

        let response = service(&server, 0).find_full_hashes(&request()).unwrap();
        assert!(response.matches.is_empty());
    }

    #[test]
    fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v4/fullHashes:find")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body("API key not valid")
            .expect(1)
            .create();

        let err = service(&server, 3).find_full_hashes(&request()).unwrap_err();
        mock.assert();
        match err {
            LookupError::Status { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "API key not valid");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_server_error_retried() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v4/fullHashes:find")
            .match_query(Matcher::Any)
            .with_status(503)
            .expect(2)
            .create();

        let err = service(&server, 1).find_full_hashes(&request()).unwrap_err();
        mock.assert();
        assert!(matches!(err, LookupError::Status { status: 503, .. }));
    }

    #[test]
    fn test_malformed_body() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/v4/fullHashes:find")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create();

        let err = service(&server, 0).find_full_hashes(&request()).unwrap_err();
        assert!(matches!(err, LookupError::Decode(_)));
    }

    #[test]
    fn test_unreachable_server() {
        let mut lookup =
            HttpLookupService::new("http://127.0.0.1:1", "k", Duration::from_secs(2), 0).unwrap();
        let err = lookup.find_full_hashes(&request()).unwrap_err();
        assert!(matches!(err, LookupError::Transport(_)));
    }

    #[test]
    fn test_endpoint_and_key_validation() {
        let lookup =
            HttpLookupService::new("https://lookup.example/", "k", Duration::from_secs(1), 0)
                .unwrap();
        assert_eq!(lookup.endpoint(), "https://lookup.example/v4/fullHashes:find");
        assert!(HttpLookupService::new("https://lookup.example", "  ", Duration::from_secs(1), 0).is_err());
    }
}
