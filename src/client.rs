use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{
    COMPLETION_DURATION, COMPLETION_ERRORS, COMPLETION_MALFORMED, COMPLETION_REQUESTS,
};
use crate::types::{ChatCompletion, ChatCompletionParams};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/";
const API_KEY_VAR: &str = "OPENAI_API_KEY";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Something that turns a transcript into a completion.
///
/// The conversation only ever talks to this trait, so hosts and tests can
/// supply their own implementation in place of [`OpenAi`].
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete the transcript in `params`.
    async fn complete(&self, params: ChatCompletionParams) -> Result<ChatCompletion>;
}

/// Client for the Chat Completions API.
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl std::fmt::Debug for OpenAi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAi")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl OpenAi {
    /// Create a new client.
    ///
    /// The API key can be provided directly or read from the OPENAI_API_KEY
    /// environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => env::var(API_KEY_VAR).map_err(|_| {
                Error::authentication(
                    "API key not provided and OPENAI_API_KEY environment variable not set",
                )
            })?,
        };
        HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| Error::authentication("API key contains invalid header characters"))?;

        let base_url = base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        url::Url::parse(&base_url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that observes every request, response and error.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| Error::authentication("API key contains invalid header characters"))?;
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|val| val.to_str().ok())
            .map(String::from);

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        error_from_status(status_code, &error_body, request_id, retry_after)
    }

    async fn send(&self, params: &ChatCompletionParams) -> Result<ChatCompletion> {
        let url = format!("{}chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .headers(self.default_headers()?)
            .json(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {}", e),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response.json::<ChatCompletion>().await.map_err(|e| {
            Error::malformed_response(format!("Failed to parse completion: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl CompletionClient for OpenAi {
    async fn complete(&self, params: ChatCompletionParams) -> Result<ChatCompletion> {
        COMPLETION_REQUESTS.click();
        if let Some(logger) = &self.logger {
            logger.log_request(&params);
        }

        let start = Instant::now();
        let result = self.send(&params).await;
        COMPLETION_DURATION.add(start.elapsed().as_secs_f64());

        match &result {
            Ok(completion) => {
                if let Some(logger) = &self.logger {
                    logger.log_response(completion);
                }
            }
            Err(err) => {
                if err.is_malformed_response() {
                    COMPLETION_MALFORMED.click();
                } else {
                    COMPLETION_ERRORS.click();
                }
                if let Some(logger) = &self.logger {
                    logger.log_error(err);
                }
            }
        }
        result
    }
}

/// Map a non-success status and its body to an [`Error`].
///
/// The body is parsed as `{"error": {"message", "type", "param"}}` when
/// possible and used verbatim otherwise.
fn error_from_status(
    status_code: u16,
    body: &str,
    request_id: Option<String>,
    retry_after: Option<u64>,
) -> Error {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: Option<ErrorDetail>,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(rename = "type")]
        error_type: Option<String>,
        message: Option<String>,
        param: Option<String>,
    }

    let detail = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error);
    let error_type = detail.as_ref().and_then(|e| e.error_type.clone());
    let error_message = detail
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| body.to_string());
    let error_param = detail.as_ref().and_then(|e| e.param.clone());

    match status_code {
        400 => Error::bad_request(error_message, error_param),
        401 => Error::authentication(error_message),
        403 => Error::permission(error_message),
        404 => Error::not_found(error_message),
        408 => Error::timeout(error_message, None),
        429 => Error::rate_limit(error_message, retry_after),
        500 => Error::internal_server(error_message, request_id),
        502..=504 => Error::service_unavailable(error_message, retry_after),
        _ => Error::api(status_code, error_type, error_message, request_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{KnownModel, Model, Turn};

    #[test]
    fn test_client_creation() {
        let client = OpenAi::new(Some("test-key".to_string())).unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url, DEFAULT_API_URL);
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);

        let client = OpenAi::with_options(
            Some("test-key".to_string()),
            Some("https://proxy.example.com/v1/".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://proxy.example.com/v1/");
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = OpenAi::with_options(
            Some("test-key".to_string()),
            Some("not a url".to_string()),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn invalid_api_key_is_rejected() {
        let err = OpenAi::new(Some("bad\nkey".to_string())).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn bearer_header() {
        let client = OpenAi::new(Some("sk-test".to_string())).unwrap();
        let headers = client.default_headers().unwrap();
        assert_eq!(
            headers.get(header::AUTHORIZATION).unwrap(),
            "Bearer sk-test"
        );
    }

    #[test]
    fn error_body_is_parsed() {
        let body = r#"{"error": {"message": "Rate limit reached", "type": "requests", "param": null}}"#;
        let err = error_from_status(429, body, None, Some(20));
        match err {
            Error::RateLimit {
                message,
                retry_after,
            } => {
                assert_eq!(message, "Rate limit reached");
                assert_eq!(retry_after, Some(20));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unparseable_error_body_is_kept() {
        let err = error_from_status(502, "<html>bad gateway</html>", None, None);
        assert_eq!(
            err.to_string(),
            "Service unavailable: <html>bad gateway</html>"
        );
    }

    #[test]
    fn status_mapping() {
        assert!(error_from_status(401, "{}", None, None).is_authentication());
        assert!(matches!(
            error_from_status(400, r#"{"error": {"message": "bad", "param": "model"}}"#, None, None),
            Error::BadRequest { param: Some(p), .. } if p == "model"
        ));
        assert!(matches!(
            error_from_status(404, "{}", None, None),
            Error::NotFound { .. }
        ));
        assert_eq!(
            error_from_status(418, r#"{"error": {"message": "teapot", "type": "odd"}}"#, None, None)
                .to_string(),
            "odd: teapot"
        );
        assert!(error_from_status(500, "{}", Some("req_1".to_string()), None).is_api());
    }

    #[tokio::test]
    #[ignore] // Requires a real API key
    async fn test_live_completion() {
        let api_key = env::var(API_KEY_VAR).ok();
        if api_key.is_none() {
            println!("Skipping test_live_completion: OPENAI_API_KEY not set");
            return;
        }

        let client = OpenAi::new(api_key).unwrap();
        let params = ChatCompletionParams::new(
            Model::Known(KnownModel::Gpt4oMini),
            vec![Turn::system(""), Turn::user("Reply with one word: hello")],
        );
        let completion = client.complete(params).await.unwrap();
        assert!(!completion.text().unwrap().is_empty());
        assert!(completion.usage().unwrap().total_tokens > 0);
    }
}
