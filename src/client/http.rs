//! HTTP Client
//!
//! Gemini REST client used as the production model backend.

use crate::api::{
    ErrorResponse, GenerateContentRequest, GenerateContentResponse, ListModelsResponse, ModelInfo,
};
use crate::client::classify::BackendError;
use crate::client::ModelBackend;
use crate::error::{OrbitError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Public Gemini endpoint
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";
const PAGE_SIZE: u32 = 100;

/// Gemini client. Holds no credential: every call is made with the key the
/// caller's model handle is bound to.
pub struct GeminiClient {
    /// Inner reqwest client
    client: Client,

    /// API base, without trailing slash
    base_url: String,
}

impl GeminiClient {
    /// Create a new client against `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300)) // long generations
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| OrbitError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// API base in use
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(api_key: &str) -> std::result::Result<HeaderMap, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(api_key)
                .map_err(|e| BackendError::transport(format!("Invalid API key format: {}", e)))?,
        );
        Ok(headers)
    }

    /// Fetch the full model catalog, following page tokens
    pub async fn list_all_models(
        &self,
        api_key: &str,
    ) -> std::result::Result<Vec<ModelInfo>, BackendError> {
        let url = format!("{}/models", self.base_url);
        let headers = Self::headers(api_key)?;
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .headers(headers.clone())
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: ListModelsResponse = read_json(request.send().await?).await?;
            debug!(count = page.models.len(), "fetched model catalog page");
            models.extend(page.models);

            match page.next_page_token {
                Some(token) if !token.is_empty() && page_token.as_ref() != Some(&token) => {
                    page_token = Some(token)
                }
                _ => break,
            }
        }

        Ok(models)
    }

    /// Run a single-turn generation
    pub async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> std::result::Result<GenerateContentResponse, BackendError> {
        let model = model.strip_prefix("models/").unwrap_or(model);
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let body = GenerateContentRequest::from_prompt(prompt);

        debug!(model, prompt_len = prompt.len(), "sending generateContent");

        let response = self
            .client
            .post(&url)
            .headers(Self::headers(api_key)?)
            .json(&body)
            .send()
            .await?;

        read_json(response).await
    }
}

#[async_trait]
impl ModelBackend for GeminiClient {
    async fn list_models(&self, credential: &str) -> std::result::Result<Vec<ModelInfo>, BackendError> {
        self.list_all_models(credential).await
    }

    async fn generate(
        &self,
        credential: &str,
        model: &str,
        prompt: &str,
    ) -> std::result::Result<String, BackendError> {
        let response = self.generate_content(credential, model, prompt).await?;
        Ok(response.text())
    }
}

/// Decode a success body, or turn an error body into a `BackendError`
async fn read_json<R: DeserializeOwned>(response: Response) -> std::result::Result<R, BackendError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return serde_json::from_str(&body).map_err(|e| {
            BackendError::transport(format!(
                "Failed to parse response: {}. Body: {}",
                e,
                truncate(&body, 500)
            ))
        });
    }

    Err(match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(envelope) => BackendError::http(
            status.as_u16(),
            envelope.error.status,
            envelope.error.message,
        ),
        Err(_) => BackendError::http(status.as_u16(), None, truncate(&body, 500)),
    })
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_client_creation() {
        let client = GeminiClient::new("https://example.com/v1beta/").unwrap();
        assert_eq!(client.base_url(), "https://example.com/v1beta");
    }

    #[tokio::test]
    async fn test_generate_returns_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-1.5-flash:generateContent")
            .match_header(API_KEY_HEADER, "key-a")
            .match_body(Matcher::PartialJsonString(
                r#"{"contents":[{"role":"user","parts":[{"text":"hi"}]}]}"#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"hello"}]}}]}"#)
            .create_async()
            .await;

        let client = GeminiClient::new(server.url()).unwrap();
        let text = client
            .generate("key-a", "models/gemini-1.5-flash", "hi")
            .await
            .unwrap();

        assert_eq!(text, "hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_envelope_is_structured() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-1.5-flash:generateContent")
            .with_status(429)
            .with_body(r#"{"error":{"code":429,"message":"Resource has been exhausted (e.g. check quota).","status":"RESOURCE_EXHAUSTED"}}"#)
            .create_async()
            .await;

        let client = GeminiClient::new(server.url()).unwrap();
        let err = client
            .generate("key-a", "gemini-1.5-flash", "hi")
            .await
            .unwrap_err();

        assert_eq!(err.status, Some(429));
        assert_eq!(err.reason.as_deref(), Some("RESOURCE_EXHAUSTED"));
    }

    #[tokio::test]
    async fn test_non_json_error_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-1.5-flash:generateContent")
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let client = GeminiClient::new(server.url()).unwrap();
        let err = client
            .generate("key-a", "gemini-1.5-flash", "hi")
            .await
            .unwrap_err();

        assert_eq!(err.status, Some(503));
        assert_eq!(err.message, "upstream unavailable");
    }

    #[tokio::test]
    async fn test_list_models_follows_pages() {
        let mut server = mockito::Server::new_async().await;
        let second = server
            .mock("GET", "/models")
            .match_query(Matcher::UrlEncoded("pageToken".into(), "next".into()))
            .with_status(200)
            .with_body(r#"{"models":[{"name":"models/gemini-1.5-pro","supportedGenerationMethods":["generateContent"]}]}"#)
            .create_async()
            .await;
        let first = server
            .mock("GET", "/models")
            .match_query(Matcher::Exact("pageSize=100".into()))
            .with_status(200)
            .with_body(r#"{"models":[{"name":"models/gemini-1.5-flash","supportedGenerationMethods":["generateContent"]}],"nextPageToken":"next"}"#)
            .create_async()
            .await;

        let client = GeminiClient::new(server.url()).unwrap();
        let models = client.list_models("key-a").await.unwrap();

        let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["models/gemini-1.5-flash", "models/gemini-1.5-pro"]);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_repeated_page_token_stops_paging() {
        let mut server = mockito::Server::new_async().await;
        let repeated = server
            .mock("GET", "/models")
            .match_query(Matcher::UrlEncoded("pageToken".into(), "same".into()))
            .with_status(200)
            .with_body(r#"{"models":[{"name":"models/gemini-1.5-pro","supportedGenerationMethods":["generateContent"]}],"nextPageToken":"same"}"#)
            .expect(1)
            .create_async()
            .await;
        server
            .mock("GET", "/models")
            .match_query(Matcher::Exact("pageSize=100".into()))
            .with_status(200)
            .with_body(r#"{"models":[{"name":"models/gemini-1.5-flash","supportedGenerationMethods":["generateContent"]}],"nextPageToken":"same"}"#)
            .create_async()
            .await;

        let client = GeminiClient::new(server.url()).unwrap();
        let models = client.list_models("key-a").await.unwrap();

        assert_eq!(models.len(), 2);
        repeated.assert_async().await;
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("ééé", 2), "éé");
    }
}
