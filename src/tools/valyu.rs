use crate::config::Config;
use crate::error::BriefError;
use crate::models::{AnswerRequest, AnswerResult, ProxyRequest};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

/// One way of reaching the Valyu answer endpoint.
#[async_trait]
pub trait AnswerTransport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn answer(&self, request: &AnswerRequest) -> Result<AnswerResult, BriefError>;
}

/// OAuth proxy call, billed to the signed-in user's credits.
pub struct ProxyTransport {
    client: reqwest::Client,
    url: String,
    token: String,
}

/// Direct call with the server-held API key.
pub struct DirectTransport {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProxyErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

#[async_trait]
impl AnswerTransport for ProxyTransport {
    fn name(&self) -> &'static str {
        "proxy"
    }

    async fn answer(&self, request: &AnswerRequest) -> Result<AnswerResult, BriefError> {
        info!("Using OAuth proxy for user credit billing");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&ProxyRequest::answer(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = match response.json::<ProxyErrorBody>().await {
                Ok(body) => body
                    .error_description
                    .filter(|s| !s.is_empty())
                    .or(body.error.filter(|s| !s.is_empty()))
                    .unwrap_or_else(|| "Valyu proxy request failed".to_string()),
                Err(_) => "proxy_failed".to_string(),
            };
            warn!("Proxy returned {}: {}", status, message);
            return Err(BriefError::UpstreamProxy(message));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl AnswerTransport for DirectTransport {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn answer(&self, request: &AnswerRequest) -> Result<AnswerResult, BriefError> {
        info!("Using server API key (self-hosted mode)");

        let api_key = self.api_key.as_deref().ok_or(BriefError::MissingApiKey)?;

        // The answer API reports failures in-band; transport and HTTP errors keep that shape.
        let response = match self
            .client
            .post(&self.url)
            .header("x-api-key", api_key)
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!("Answer API request failed: {}", err);
                return Ok(AnswerResult::failed("answer request failed"));
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                warn!("Answer API body could not be read: {}", err);
                return Ok(AnswerResult::failed("answer body unreadable"));
            }
        };

        if !status.is_success() {
            warn!("Answer API returned {}: {}", status, text);
        }

        match serde_json::from_str::<AnswerResult>(&text) {
            Ok(mut result) => {
                result.success &= status.is_success();
                Ok(result)
            }
            Err(err) => {
                warn!("Answer API returned an undecodable body ({}): {}", status, err);
                Ok(AnswerResult::failed(format!("HTTP {}", status)))
            }
        }
    }
}

/// Shared HTTP client plus the endpoints both transports need.
#[derive(Clone)]
pub struct ValyuClient {
    client: reqwest::Client,
    proxy_url: String,
    answer_url: String,
    api_key: Option<String>,
}

impl ValyuClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            proxy_url: config.proxy_url(),
            answer_url: config.answer_url(),
            api_key: config.valyu_api_key.clone(),
        }
    }

    /// Proxy when the caller holds a token, direct otherwise.
    pub fn transport(&self, access_token: Option<&str>) -> Box<dyn AnswerTransport> {
        match access_token {
            Some(token) => Box::new(ProxyTransport {
                client: self.client.clone(),
                url: self.proxy_url.clone(),
                token: token.to_string(),
            }),
            None => Box::new(DirectTransport {
                client: self.client.clone(),
                url: self.answer_url.clone(),
                api_key: self.api_key.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, api_key: Option<&str>) -> ValyuClient {
        let config = Config {
            valyu_app_url: server.uri(),
            valyu_api_url: server.uri(),
            valyu_api_key: api_key.map(str::to_string),
            ..Config::default()
        };
        ValyuClient::new(&config)
    }

    #[test]
    fn token_selects_proxy() {
        let client = ValyuClient::new(&Config::default());
        assert_eq!(client.transport(Some("tok")).name(), "proxy");
        assert_eq!(client.transport(None).name(), "direct");
    }

    #[tokio::test]
    async fn proxy_sends_bearer_and_wrapped_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/oauth/proxy"))
            .and(header("authorization", "Bearer user-token"))
            .and(body_partial_json(json!({
                "path": "/v1/answer",
                "method": "POST",
                "body": { "query": "Latest news and key developments about Acme" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "contents": { "executive_summary": "ok" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server, None)
            .transport(Some("user-token"))
            .answer(&AnswerRequest::meeting_brief("Acme"))
            .await
            .unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn proxy_error_prefers_error_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/oauth/proxy"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": "payment_required",
                "error_description": "insufficient credits"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .transport(Some("t"))
            .answer(&AnswerRequest::meeting_brief("Acme"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "insufficient credits");
    }

    #[tokio::test]
    async fn proxy_error_falls_back_to_error_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "error": "forbidden" })))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .transport(Some("t"))
            .answer(&AnswerRequest::meeting_brief("Acme"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "forbidden");
    }

    #[tokio::test]
    async fn proxy_error_with_empty_object_uses_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({})))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .transport(Some("t"))
            .answer(&AnswerRequest::meeting_brief("Acme"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Valyu proxy request failed");
    }

    #[tokio::test]
    async fn proxy_error_with_unparseable_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .transport(Some("t"))
            .answer(&AnswerRequest::meeting_brief("Acme"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "proxy_failed");
    }

    #[tokio::test]
    async fn direct_sends_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/answer"))
            .and(header("x-api-key", "server-key"))
            .and(body_partial_json(json!({
                "structuredOutput": { "type": "object" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "contents": "{}"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server, Some("server-key"))
            .transport(None)
            .answer(&AnswerRequest::meeting_brief("Acme"))
            .await
            .unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn direct_without_key_fails_before_calling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .transport(None)
            .answer(&AnswerRequest::meeting_brief("Acme"))
            .await
            .unwrap_err();
        assert!(matches!(err, BriefError::MissingApiKey));
    }

    #[tokio::test]
    async fn direct_http_error_is_reported_in_band() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let result = client_for(&server, Some("bad-key"))
            .transport(None)
            .answer(&AnswerRequest::meeting_brief("Acme"))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.error, Some(json!("HTTP 401 Unauthorized")));
    }

    #[tokio::test]
    async fn direct_connection_failure_is_reported_in_band() {
        let config = Config {
            valyu_api_url: "http://127.0.0.1:9".to_string(),
            valyu_api_key: Some("server-key".to_string()),
            ..Config::default()
        };
        let result = ValyuClient::new(&config)
            .transport(None)
            .answer(&AnswerRequest::meeting_brief("Acme"))
            .await
            .unwrap();
        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(!error.to_string().contains("127.0.0.1"));
    }

    #[tokio::test]
    async fn direct_undecodable_success_body_is_reported_in_band() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let result = client_for(&server, Some("server-key"))
            .transport(None)
            .answer(&AnswerRequest::meeting_brief("Acme"))
            .await
            .unwrap();
        assert!(!result.success);
    }
}
