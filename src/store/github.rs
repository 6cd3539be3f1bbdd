//! GitHub document store
//!
//! Keeps the study document in a repository file through the contents API.

use crate::config::GithubSettings;
use crate::error::{OrbitError, Result};
use crate::store::document::StudyDocument;
use base64::engine::general_purpose::STANDARD as B64_ENGINE;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Commit message used for every save
pub const SYNC_COMMIT_MESSAGE: &str = "🤖 Orbit Session Sync";

/// A file as returned by `GET /repos/{repo}/contents/{path}`
#[derive(Debug, Clone, Deserialize)]
struct ContentsFile {
    /// Base64, wrapped with newlines
    content: String,
    sha: String,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

/// Repository-backed store
pub struct GithubStore {
    client: Client,
    url: String,
}

impl GithubStore {
    /// Build a store from settings; `None` unless both token and repo are set
    pub fn from_settings(settings: &GithubSettings) -> Result<Option<Self>> {
        let Some((token, repo)) = settings.credentials() else {
            return Ok(None);
        };
        Self::new(&settings.api_base, token, repo, &settings.path).map(Some)
    }

    pub fn new(api_base: &str, token: &str, repo: &str, path: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("orbit-study-assistant"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| OrbitError::Config(format!("Invalid GitHub token format: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| OrbitError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: format!(
                "{}/repos/{}/contents/{}",
                api_base.trim_end_matches('/'),
                repo.trim_matches('/'),
                path.trim_start_matches('/')
            ),
        })
    }

    /// Contents URL of the document
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the current file, `None` when it does not exist yet
    async fn fetch(&self) -> Result<Option<ContentsFile>> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OrbitError::Store(format!(
                "GitHub returned {} for {}: {}",
                status, self.url, body
            )));
        }

        Ok(Some(response.json().await?))
    }

    /// Load the document from the repository
    pub async fn load(&self) -> Result<Option<StudyDocument>> {
        let Some(file) = self.fetch().await? else {
            return Ok(None);
        };

        let compact: String = file.content.split_whitespace().collect();
        let bytes = B64_ENGINE
            .decode(compact)
            .map_err(|e| OrbitError::Store(format!("Invalid base64 content: {}", e)))?;
        let doc = serde_json::from_slice(&bytes)
            .map_err(|e| OrbitError::Store(format!("Failed to parse remote document: {}", e)))?;

        debug!(url = %self.url, sha = %file.sha, "loaded study document from GitHub");
        Ok(Some(doc))
    }

    /// Commit the document, updating the file in place when it exists
    pub async fn save(&self, doc: &StudyDocument) -> Result<()> {
        let sha = self.fetch().await?.map(|f| f.sha);
        let body = UpdateRequest {
            message: SYNC_COMMIT_MESSAGE,
            content: B64_ENGINE.encode(doc.to_pretty_json()?),
            sha,
        };

        let response = self.client.put(&self.url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OrbitError::Store(format!(
                "GitHub rejected update ({}): {}",
                status, body
            )));
        }

        debug!(url = %self.url, "committed study document to GitHub");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn encoded(json: &str) -> String {
        // GitHub wraps base64 at 60 characters
        let raw = B64_ENGINE.encode(json);
        raw.as_bytes()
            .chunks(60)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_from_settings_requires_token_and_repo() {
        let settings = GithubSettings {
            repo: Some("me/notes".to_string()),
            ..GithubSettings::default()
        };
        assert!(GithubStore::from_settings(&settings).unwrap().is_none());
    }

    #[test]
    fn test_contents_url() {
        let store = GithubStore::new("https://api.github.com/", "t", "me/notes", "config.json")
            .unwrap();
        assert_eq!(
            store.url(),
            "https://api.github.com/repos/me/notes/contents/config.json"
        );
    }

    #[tokio::test]
    async fn test_load_decodes_wrapped_base64() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "content": encoded(r#"{"user_name": "Ada", "current_units": ["Compilers", "Distributed Systems"]}"#),
            "sha": "abc123",
            "encoding": "base64"
        });
        let mock = server
            .mock("GET", "/repos/me/notes/contents/config.json")
            .match_header("authorization", "Bearer ghp_test")
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let store = GithubStore::new(&server.url(), "ghp_test", "me/notes", "config.json").unwrap();
        let doc = store.load().await.unwrap().unwrap();

        assert_eq!(doc.user_name, "Ada");
        assert_eq!(doc.current_units.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_save_sends_current_sha() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/me/notes/contents/config.json")
            .with_status(200)
            .with_body(serde_json::json!({"content": encoded("{}"), "sha": "abc123"}).to_string())
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/repos/me/notes/contents/config.json")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "message": SYNC_COMMIT_MESSAGE,
                "sha": "abc123"
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let store = GithubStore::new(&server.url(), "ghp_test", "me/notes", "config.json").unwrap();
        store.save(&StudyDocument::default()).await.unwrap();

        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_store_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/me/notes/contents/config.json")
            .with_status(401)
            .with_body(r#"{"message": "Bad credentials"}"#)
            .create_async()
            .await;

        let store = GithubStore::new(&server.url(), "bad", "me/notes", "config.json").unwrap();
        assert!(matches!(store.load().await, Err(OrbitError::Store(_))));
    }
}
