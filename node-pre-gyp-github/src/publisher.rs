use std::path::PathBuf;

use crate::config::ReleaseOverrides;
use crate::error::{PublishError, Result};
use crate::github::{GitHubClient, NewRelease, Release, ReleaseApi, DEFAULT_USER_AGENT};
use crate::manifest::{token_from_env, ProjectConfig};
use crate::staging::{self, StagedFile};

/// Branch new releases target unless overridden
pub const DEFAULT_TARGET_COMMITISH: &str = "main";

#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Emit informational log lines
    pub verbose: bool,
    /// Directory holding `package.json` and `build/stage`
    pub project_dir: PathBuf,
    /// Applied only when a release has to be created
    pub release: ReleaseOverrides,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            verbose: true,
            project_dir: PathBuf::from("."),
            release: ReleaseOverrides::default(),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub release: Release,
    pub created: bool,
    pub uploaded: Vec<StagedFile>,
}

/// Load the project from `options.project_dir`, authenticate with the token
/// from the environment and publish the staged files.
pub async fn publish(options: PublishOptions) -> Result<PublishReport> {
    let config = ProjectConfig::load(&options.project_dir)?;
    let token = token_from_env()?;

    let user_agent = config.name.as_deref().unwrap_or(DEFAULT_USER_AGENT);
    let client = GitHubClient::new(&config.repository, user_agent, &token)?;

    Publisher::new(config, client, &options).run().await
}

/// State of one publish run: the validated project, the API it talks to and
/// the caller's options.
pub struct Publisher<A> {
    config: ProjectConfig,
    api: A,
    project_dir: PathBuf,
    overrides: ReleaseOverrides,
    verbose: bool,
}

impl<A: ReleaseApi> Publisher<A> {
    pub fn new(config: ProjectConfig, api: A, options: &PublishOptions) -> Self {
        Self {
            config,
            api,
            project_dir: options.project_dir.clone(),
            overrides: options.release.clone(),
            verbose: options.verbose,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Directory the staged files for this run are read from
    pub fn stage_dir(&self) -> PathBuf {
        staging::stage_dir(
            &self.project_dir,
            &self.config.release_tag(),
            self.config.remote_path.is_some(),
        )
    }

    /// Creation request for the current version with overrides applied
    pub fn new_release(&self) -> NewRelease {
        let version = &self.config.version;
        let overrides = self.overrides.clone();
        let default_body = || match &self.config.name {
            Some(name) => format!("{name} {version}"),
            None => version.clone(),
        };

        NewRelease {
            tag_name: self.config.release_tag(),
            target_commitish: overrides
                .target_commitish
                .unwrap_or_else(|| DEFAULT_TARGET_COMMITISH.to_string()),
            name: overrides.name.unwrap_or_else(|| format!("v{version}")),
            body: overrides.body.unwrap_or_else(default_body),
            draft: overrides.draft.unwrap_or(true),
            prerelease: overrides.prerelease.unwrap_or(false),
        }
    }

    pub async fn run(&self) -> Result<PublishReport> {
        let (release, created) = self.resolve_release().await?;
        let uploaded = self.upload_assets(&release).await?;

        Ok(PublishReport {
            release,
            created,
            uploaded,
        })
    }

    /// Find the release tagged for this version, creating a draft when none
    /// exists. Returns the release and whether it was created.
    pub async fn resolve_release(&self) -> Result<(Release, bool)> {
        let tag = self.config.release_tag();
        let releases = self.api.list_releases(&self.config.repository).await?;

        if let Some(existing) = releases.into_iter().find(|r| r.tag_name == tag) {
            tracing::debug!("Reusing release {} (id {})", existing.tag_name, existing.id);
            return Ok((existing, false));
        }

        let release = self
            .api
            .create_release(&self.config.repository, &self.new_release())
            .await?;

        if release.draft {
            self.info(format_args!(
                "Release {} not found, so a draft release was created. YOU MUST MANUALLY PUBLISH THIS DRAFT WITHIN GITHUB FOR IT TO BE ACCESSIBLE.",
                release.tag_name
            ));
        } else {
            self.info(format_args!(
                "Release {} not found, so a new release was created and published.",
                release.tag_name
            ));
        }
        if release.prerelease {
            self.info(format_args!(
                "Release {} is marked as a prerelease.",
                release.tag_name
            ));
        }

        Ok((release, true))
    }

    /// Upload every staged file to `release`, one at a time.
    ///
    /// All names are checked against the release's assets before the first
    /// upload, so a collision leaves the release untouched.
    pub async fn upload_assets(&self, release: &Release) -> Result<Vec<StagedFile>> {
        let stage_dir = self.stage_dir();
        self.info(format_args!("Stage directory path: {}", stage_dir.display()));

        let files = staging::collect_staged_files(&stage_dir).await?;
        check_collisions(release, &files)?;

        for file in &files {
            self.info(format_args!(
                "Staged file {} found. Proceeding to upload it.",
                file.name
            ));

            self.api
                .upload_asset(&self.config.repository, release, file)
                .await?;

            self.info(format_args!(
                "Staged file {} saved to {} release {} successfully.",
                file.name, self.config.repository, release.tag_name
            ));
        }

        Ok(files)
    }

    fn info(&self, message: std::fmt::Arguments<'_>) {
        if self.verbose {
            tracing::info!("{}", message);
        }
    }
}

/// Fail on the first staged file whose name is already an asset of `release`.
pub fn check_collisions(release: &Release, files: &[StagedFile]) -> Result<()> {
    match files.iter().find(|file| release.has_asset(&file.name)) {
        Some(file) => Err(PublishError::AssetExists {
            file: file.name.clone(),
            tag: release.tag_name.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::ReleaseAsset;
    use std::path::Path;

    fn release_with_assets(names: &[&str]) -> Release {
        Release {
            id: 1,
            tag_name: "1.0.0".to_string(),
            draft: false,
            prerelease: false,
            upload_url: "https://uploads.github.com/repos/o/r/releases/1/assets{?name,label}"
                .to_string(),
            assets: names
                .iter()
                .map(|name| ReleaseAsset {
                    name: name.to_string(),
                })
                .collect(),
        }
    }

    fn staged(name: &str) -> StagedFile {
        StagedFile {
            name: name.to_string(),
            path: Path::new("/stage").join(name),
            content_type: "application/octet-stream".to_string(),
            size: 1,
        }
    }

    #[test]
    fn test_collision_detected() {
        let release = release_with_assets(&["a.node"]);
        let err = check_collisions(&release, &[staged("b.node"), staged("a.node")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Staged file a.node found but it already exists in release 1.0.0. If you would like to replace it, you must first manually delete it within GitHub."
        );
    }

    #[test]
    fn test_no_collision() {
        let release = release_with_assets(&["a.node"]);
        assert!(check_collisions(&release, &[staged("b.node")]).is_ok());
        assert!(check_collisions(&release_with_assets(&[]), &[staged("a.node")]).is_ok());
    }

    #[test]
    fn test_default_options() {
        let options = PublishOptions::default();
        assert!(options.verbose);
        assert_eq!(options.release, ReleaseOverrides::default());
    }
}
