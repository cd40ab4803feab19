use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::error::{PublishError, Result};

/// Name of the project metadata file read from the project directory.
pub const MANIFEST_FILE: &str = "package.json";

/// Environment variable holding the GitHub token.
pub const TOKEN_ENV: &str = "NODE_PRE_GYP_GITHUB_TOKEN";

/// Placeholder substituted in `binary.remote_path`.
pub const VERSION_PLACEHOLDER: &str = "{version}";

#[derive(Debug, Deserialize)]
struct PackageJson {
    name: Option<String>,
    version: Option<String>,
    #[serde(default)]
    repository: Option<Value>,
    #[serde(default)]
    binary: Option<Value>,
}

/// Validated project metadata for one publish run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub name: Option<String>,
    pub version: String,
    pub repository: GitHubRepository,
    pub binary_host: String,
    pub remote_path: Option<String>,
}

/// Repository coordinates derived from `repository.url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubRepository {
    /// API host, e.g. `api.github.com`
    pub api_host: String,
    pub owner: String,
    pub repo: String,
}

impl GitHubRepository {
    /// Parse a repository URL of the form `http(s)://host/owner/repo.git`.
    ///
    /// The scheme may be preceded by a prefix such as `git+`. Everything between
    /// the host and the last `.git` is the path, whose first two segments are
    /// the owner and the repository.
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = || PublishError::InvalidRepositoryUrl {
            url: url.to_string(),
        };

        let lower = url.to_ascii_lowercase();
        let start = ["https://", "http://"]
            .iter()
            .filter_map(|scheme| lower.find(scheme).map(|i| (i, scheme.len())))
            .min_by_key(|(i, _)| *i)
            .map(|(i, len)| i + len)
            .ok_or_else(invalid)?;

        let rest = &url[start..];
        let (host, path) = rest.split_once('/').ok_or_else(invalid)?;
        if host.is_empty() {
            return Err(invalid());
        }

        let end = path
            .to_ascii_lowercase()
            .rfind(".git")
            .ok_or_else(invalid)?;
        let mut segments = path[..end].split('/');
        let owner = segments.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let repo = segments.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;

        Ok(Self {
            api_host: format!("api.{host}"),
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// Prefix every `binary.host` must start with once normalized.
    pub fn download_prefix(&self) -> String {
        format!(
            "https://{}/{}/{}/releases/download/",
            self.api_host, self.owner, self.repo
        )
    }

    pub fn api_base_url(&self) -> String {
        format!("https://{}", self.api_host)
    }
}

impl std::fmt::Display for GitHubRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl ProjectConfig {
    /// Load and validate `package.json` from the project directory
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).map_err(|source| {
            PublishError::ManifestRead {
                path: path.clone(),
                source,
            }
        })?;

        Self::from_json(&content).map_err(|err| match err {
            PublishError::ManifestParse { source, .. } => PublishError::ManifestParse {
                path: path.clone(),
                source,
            },
            other => other,
        })
    }

    /// Parse and validate the contents of a `package.json`
    pub fn from_json(content: &str) -> Result<Self> {
        let package: PackageJson =
            serde_json::from_str(content).map_err(|source| PublishError::ManifestParse {
                path: MANIFEST_FILE.into(),
                source,
            })?;

        let url = package
            .repository
            .as_ref()
            .and_then(|r| r.get("url"))
            .and_then(Value::as_str)
            .ok_or(PublishError::MissingField {
                field: "repository.url",
            })?;
        let repository = GitHubRepository::parse(url)?;

        let binary = package
            .binary
            .as_ref()
            .filter(|b| b.is_object())
            .ok_or(PublishError::MissingField {
                field: "binary.host",
            })?;
        let binary_host = binary
            .get("host")
            .and_then(Value::as_str)
            .ok_or(PublishError::MissingField {
                field: "binary.host",
            })?
            .to_string();
        validate_binary_host(&binary_host, &repository)?;

        let remote_path = binary
            .get("remote_path")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        let version = package
            .version
            .ok_or(PublishError::MissingField { field: "version" })?;

        Ok(Self {
            name: package.name.filter(|n| !n.is_empty()),
            version,
            repository,
            binary_host,
            remote_path,
        })
    }

    /// Release tag for this version, honoring `binary.remote_path`
    pub fn release_tag(&self) -> String {
        match &self.remote_path {
            Some(template) => substitute_version(template, &self.version),
            None => self.version.clone(),
        }
    }
}

/// Check that `binary.host` points at this repository's release downloads.
pub fn validate_binary_host(host: &str, repository: &GitHubRepository) -> Result<()> {
    let expected = repository.download_prefix();
    let normalized = host.replacen("https://", "https://api.", 1);
    if normalized.starts_with(&expected) {
        Ok(())
    } else {
        Err(PublishError::InvalidBinaryHost { expected })
    }
}

/// Replace every `{version}` in `template`.
pub fn substitute_version(template: &str, version: &str) -> String {
    template.replace(VERSION_PLACEHOLDER, version)
}

/// Read the token from the environment, treating an empty value as absent.
pub fn token_from_env() -> Result<String> {
    token_from(|var| std::env::var(var).ok())
}

/// Look the token up through `lookup`, treating an empty value as absent.
pub fn token_from(lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    lookup(TOKEN_ENV)
        .filter(|t| !t.is_empty())
        .ok_or(PublishError::MissingToken { var: TOKEN_ENV })
}
