use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

use crate::error::{PublishError, Result};
use crate::manifest::{GitHubRepository, TOKEN_ENV};
use crate::staging::StagedFile;

/// User agent sent when the project has no name
pub const DEFAULT_USER_AGENT: &str = "node-pre-gyp-github";

/// Largest page size the releases endpoint accepts
const PER_PAGE: usize = 100;

/// A github release. Does not contain all fields.
///
/// See the github [docs](https://docs.github.com/en/rest/releases/releases) for more information
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    pub draft: bool,
    pub prerelease: bool,
    /// URI template returned by the API, e.g.
    /// `https://uploads.github.com/repos/o/r/releases/1/assets{?name,label}`
    pub upload_url: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// A release's asset. Does not contain all fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
}

impl Release {
    pub fn has_asset(&self, name: &str) -> bool {
        self.assets.iter().any(|asset| asset.name == name)
    }
}

/// Body of a release creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRelease {
    pub tag_name: String,
    pub target_commitish: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
}

/// Release operations the publisher needs from a GitHub-compatible API.
#[async_trait]
pub trait ReleaseApi: Send + Sync {
    /// List every release of the repository, across all pages
    async fn list_releases(&self, repository: &GitHubRepository) -> Result<Vec<Release>>;

    async fn create_release(
        &self,
        repository: &GitHubRepository,
        release: &NewRelease,
    ) -> Result<Release>;

    /// Upload a staged file as an asset of `release`
    async fn upload_asset(
        &self,
        repository: &GitHubRepository,
        release: &Release,
        file: &StagedFile,
    ) -> Result<()>;
}

pub struct GitHubClient {
    http_client: Client,
    api_base: String,
}

impl GitHubClient {
    /// Build a client bound to the repository's API host.
    pub fn new(repository: &GitHubRepository, user_agent: &str, token: &str) -> Result<Self> {
        Self::with_api_base(&repository.api_base_url(), user_agent, token)
    }

    /// Build a client for the REST API rooted at `api_base`.
    pub fn with_api_base(api_base: &str, user_agent: &str, token: &str) -> Result<Self> {
        let mut authorization = HeaderValue::from_str(&format!("token {token}"))
            .map_err(|_| PublishError::InvalidToken { var: TOKEN_ENV })?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(AUTHORIZATION, authorization);

        let http_client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn releases_url(&self, repository: &GitHubRepository) -> String {
        format!(
            "{}/repos/{}/{}/releases",
            self.api_base, repository.owner, repository.repo
        )
    }
}

#[async_trait]
impl ReleaseApi for GitHubClient {
    async fn list_releases(&self, repository: &GitHubRepository) -> Result<Vec<Release>> {
        let url = self.releases_url(repository);
        let mut releases = Vec::new();

        for page in 1.. {
            tracing::debug!("Listing releases of {} (page {})", repository, page);

            let response = self
                .http_client
                .get(&url)
                .query(&[("per_page", PER_PAGE), ("page", page)])
                .send()
                .await?;
            let batch: Vec<Release> = check_status(response).await?.json().await?;

            let last_page = batch.len() < PER_PAGE;
            releases.extend(batch);
            if last_page {
                break;
            }
        }

        Ok(releases)
    }

    async fn create_release(
        &self,
        repository: &GitHubRepository,
        release: &NewRelease,
    ) -> Result<Release> {
        tracing::debug!("Creating release {} in {}", release.tag_name, repository);

        let response = self
            .http_client
            .post(self.releases_url(repository))
            .json(release)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    async fn upload_asset(
        &self,
        repository: &GitHubRepository,
        release: &Release,
        file: &StagedFile,
    ) -> Result<()> {
        let url = upload_target(release)?;
        tracing::debug!(
            "Uploading {} ({} bytes, {}) to {} for {}",
            file.name,
            file.size,
            file.content_type,
            url,
            repository
        );

        let handle = tokio::fs::File::open(&file.path).await?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(handle));

        let response = self
            .http_client
            .post(url)
            .query(&[("name", file.name.as_str())])
            .header(CONTENT_TYPE, &file.content_type)
            .header(CONTENT_LENGTH, file.size)
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PublishError::UploadRejected {
                file: file.name.clone(),
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(PublishError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Expand the release's upload URI template into the bare upload endpoint.
pub fn upload_target(release: &Release) -> Result<Url> {
    let base = release
        .upload_url
        .split_once('{')
        .map_or(release.upload_url.as_str(), |(base, _)| base);

    Url::parse(base).map_err(|_| PublishError::InvalidUploadUrl {
        url: release.upload_url.clone(),
        tag: release.tag_name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(upload_url: &str) -> Release {
        Release {
            id: 1,
            tag_name: "1.0.0".to_string(),
            draft: true,
            prerelease: false,
            upload_url: upload_url.to_string(),
            assets: vec![ReleaseAsset {
                name: "a.node".to_string(),
            }],
        }
    }

    #[test]
    fn test_upload_target_strips_template() {
        let release =
            release("https://uploads.github.com/repos/owner/repo/releases/1/assets{?name,label}");
        assert_eq!(
            upload_target(&release).unwrap().as_str(),
            "https://uploads.github.com/repos/owner/repo/releases/1/assets"
        );
    }

    #[test]
    fn test_upload_target_without_template() {
        let release = release("https://uploads.example.com/repos/owner/repo/releases/1/assets");
        assert_eq!(
            upload_target(&release).unwrap().as_str(),
            "https://uploads.example.com/repos/owner/repo/releases/1/assets"
        );
    }

    #[test]
    fn test_upload_target_invalid() {
        let err = upload_target(&release("{?name,label}")).unwrap_err();
        assert!(matches!(err, PublishError::InvalidUploadUrl { .. }));
    }

    #[test]
    fn test_has_asset() {
        let release = release("https://uploads.github.com/");
        assert!(release.has_asset("a.node"));
        assert!(!release.has_asset("b.node"));
    }

    #[test]
    fn test_release_deserializes_partial_payload() {
        let release: Release = serde_json::from_value(serde_json::json!({
            "id": 42,
            "tag_name": "2.0.0",
            "name": "v2.0.0",
            "draft": true,
            "prerelease": false,
            "upload_url": "https://uploads.github.com/repos/o/r/releases/42/assets{?name,label}",
            "assets": [{ "id": 1, "name": "addon.node", "size": 10 }],
        }))
        .unwrap();

        assert_eq!(release.id, 42);
        assert!(release.has_asset("addon.node"));
    }

    #[test]
    fn test_new_release_body() {
        let request = NewRelease {
            tag_name: "2.0.0".to_string(),
            target_commitish: "main".to_string(),
            name: "v2.0.0".to_string(),
            body: "addon 2.0.0".to_string(),
            draft: true,
            prerelease: false,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "tag_name": "2.0.0",
                "target_commitish": "main",
                "name": "v2.0.0",
                "body": "addon 2.0.0",
                "draft": true,
                "prerelease": false,
            })
        );
    }

    #[test]
    fn test_token_with_newline_is_rejected() {
        let err = GitHubClient::with_api_base("https://api.github.com", "addon", "abc\ndef")
            .err()
            .unwrap();
        assert!(matches!(err, PublishError::InvalidToken { .. }));
    }
}
