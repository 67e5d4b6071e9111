//! Dataset hub client
//!
//! HTTP client for the remote dataset repository that stores uploaded
//! datasets, cleaned snapshots, and trained model artifacts. Speaks the
//! Hugging Face Hub wire format: repo probe/create plus NDJSON commits for
//! uploads and `resolve` URLs for downloads.

use crate::config::HubConfig;
use crate::hub::HubError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;

/// Result of a file-upload commit
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubCommit {
    /// URL of the created commit, when the hub reports one
    #[serde(default)]
    pub commit_url: Option<String>,
    /// Object id of the created commit
    #[serde(default)]
    #[allow(dead_code)] // Part of the hub response format
    pub commit_oid: Option<String>,
}

/// Client for one dataset repository on the hub
#[derive(Debug, Clone)]
pub struct HubClient {
    client: reqwest::Client,
    base_url: String,
    repo_id: String,
    token: Option<String>,
}

impl HubClient {
    /// Create a client from the shared HTTP client and hub configuration
    pub fn new(client: reqwest::Client, config: &HubConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            repo_id: config.repo_id.clone(),
            token: config.token.clone(),
        }
    }

    /// Repository id this client talks to
    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Check whether the dataset repository exists
    pub async fn repo_exists(&self) -> Result<bool, HubError> {
        let url = format!("{}/api/datasets/{}", self.base_url, self.repo_id);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| HubError::Request(e.to_string()))?;

        match response.status().as_u16() {
            200 => Ok(true),
            401 | 404 => Ok(false),
            status => Err(HubError::Status {
                status,
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Create the dataset repository
    pub async fn create_repo(&self) -> Result<(), HubError> {
        let url = format!("{}/api/repos/create", self.base_url);
        let body = json!({
            "type": "dataset",
            "name": self.repo_id,
            "private": false,
        });

        let response = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| HubError::Request(e.to_string()))?;

        let status = response.status();
        // 409 means the repo already exists, which is fine for our purposes
        if status.is_success() || status.as_u16() == 409 {
            tracing::info!(repo = %self.repo_id, "Dataset repository ready");
            Ok(())
        } else {
            Err(HubError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }

    /// Make sure the dataset repository exists, creating it on first use
    pub async fn ensure_repo(&self) -> Result<(), HubError> {
        if self.repo_exists().await? {
            return Ok(());
        }
        tracing::info!(repo = %self.repo_id, "Repository does not exist, creating");
        self.create_repo().await
    }

    /// Upload one file to the repository via an NDJSON commit
    ///
    /// # Arguments
    /// * `path_in_repo` - Destination path, e.g. "uploads/iris.csv"
    /// * `bytes` - File content
    /// * `summary` - Commit message
    pub async fn upload_file(
        &self,
        path_in_repo: &str,
        bytes: &[u8],
        summary: &str,
    ) -> Result<HubCommit, HubError> {
        let url = format!(
            "{}/api/datasets/{}/commit/main",
            self.base_url, self.repo_id
        );

        let header_line = json!({
            "key": "header",
            "value": {"summary": summary},
        });
        let file_line = json!({
            "key": "file",
            "value": {
                "path": path_in_repo,
                "content": BASE64.encode(bytes),
                "encoding": "base64",
            },
        });
        let payload = format!("{}\n{}\n", header_line, file_line);

        tracing::debug!(
            path = %path_in_repo,
            size = bytes.len(),
            "Uploading file to hub"
        );

        let response = self
            .authorize(self.client.post(&url))
            .header("content-type", "application/x-ndjson")
            .body(payload)
            .send()
            .await
            .map_err(|e| HubError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HubError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| HubError::Request(e.to_string()))?;
        let commit: HubCommit =
            serde_json::from_str(&body).map_err(|e| HubError::Parse(e.to_string()))?;

        tracing::info!(path = %path_in_repo, commit_url = ?commit.commit_url, "Uploaded file to hub");
        Ok(commit)
    }

    /// Download one file from the repository
    ///
    /// # Arguments
    /// * `path_in_repo` - Path inside the repo, e.g. "uploads/iris.csv"
    pub async fn download_file(&self, path_in_repo: &str) -> Result<Vec<u8>, HubError> {
        let url = format!(
            "{}/datasets/{}/resolve/main/{}",
            self.base_url, self.repo_id, path_in_repo
        );

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| HubError::Request(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(HubError::NotFound(path_in_repo.to_string()));
        }
        if !status.is_success() {
            return Err(HubError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| HubError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serial_test::serial;

    fn test_client(base_url: &str, token: Option<&str>) -> HubClient {
        HubClient::new(
            reqwest::Client::new(),
            &HubConfig {
                token: token.map(|t| t.to_string()),
                repo_id: "acme/zeroml-data".to_string(),
                base_url: base_url.to_string(),
                timeout_secs: 10,
            },
        )
    }

    #[tokio::test]
    #[serial]
    async fn test_repo_exists_true() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/datasets/acme/zeroml-data")
            .with_status(200)
            .with_body(r#"{"id": "acme/zeroml-data"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url(), Some("hub-token"));
        let exists = client.repo_exists().await.unwrap();

        mock.assert_async().await;
        assert!(exists);
    }

    #[tokio::test]
    #[serial]
    async fn test_repo_exists_false_on_404() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/datasets/acme/zeroml-data")
            .with_status(404)
            .create_async()
            .await;

        let client = test_client(&server.url(), None);
        let exists = client.repo_exists().await.unwrap();

        mock.assert_async().await;
        assert!(!exists);
    }

    #[tokio::test]
    #[serial]
    async fn test_create_repo_treats_conflict_as_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/repos/create")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "type": "dataset",
                "name": "acme/zeroml-data",
            })))
            .with_status(409)
            .create_async()
            .await;

        let client = test_client(&server.url(), Some("hub-token"));
        assert!(client.create_repo().await.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    #[serial]
    async fn test_upload_file_sends_ndjson_commit() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/datasets/acme/zeroml-data/commit/main")
            .match_header("content-type", "application/x-ndjson")
            .match_header("authorization", "Bearer hub-token")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("\"key\":\"header\"".to_string()),
                Matcher::Regex("\"encoding\":\"base64\"".to_string()),
                Matcher::Regex("uploads/iris.csv".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"commitUrl": "https://hub/commit/abc", "commitOid": "abc"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url(), Some("hub-token"));
        let commit = client
            .upload_file("uploads/iris.csv", b"a,b\n1,2\n", "Upload iris")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(commit.commit_oid.as_deref(), Some("abc"));
    }

    #[tokio::test]
    #[serial]
    async fn test_upload_file_propagates_hub_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/datasets/acme/zeroml-data/commit/main")
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let client = test_client(&server.url(), Some("bad-token"));
        let err = client
            .upload_file("uploads/iris.csv", b"data", "Upload")
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, HubError::Status { status: 403, .. }));
    }

    #[tokio::test]
    #[serial]
    async fn test_download_file() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/datasets/acme/zeroml-data/resolve/main/uploads/iris.csv")
            .with_status(200)
            .with_body("a,b\n1,2\n")
            .create_async()
            .await;

        let client = test_client(&server.url(), None);
        let bytes = client.download_file("uploads/iris.csv").await.unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, b"a,b\n1,2\n");
    }

    #[tokio::test]
    #[serial]
    async fn test_download_missing_file_is_not_found() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/datasets/acme/zeroml-data/resolve/main/uploads/nope.csv")
            .with_status(404)
            .create_async()
            .await;

        let client = test_client(&server.url(), None);
        let err = client.download_file("uploads/nope.csv").await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, HubError::NotFound(_)));
    }
}
