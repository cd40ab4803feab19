use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, ReleaseOverrides};
use crate::error::Result;
use crate::publisher::PublishOptions;

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "node-pre-gyp-github",
    version,
    about = "Publish prebuilt native addon binaries to GitHub Releases",
    long_about = None
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Option<Command>,

    /// Only print errors
    #[clap(short, long, global = true)]
    pub silent: bool,

    /// Directory containing package.json and build/stage
    #[clap(long, default_value = ".", global = true)]
    pub project_dir: PathBuf,

    /// Configuration file path
    /// If not specified, uses .config/node-pre-gyp-github.toml in the project
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Branch or commit a newly created release points at (default: main)
    #[clap(long, global = true)]
    pub target_commitish: Option<String>,

    /// Name of a newly created release (default: v<version>)
    #[clap(long, global = true)]
    pub name: Option<String>,

    /// Body of a newly created release (default: "<name> <version>")
    #[clap(long, global = true)]
    pub body: Option<String>,

    /// Publish a newly created release instead of leaving it as a draft
    #[clap(long, global = true)]
    pub release: bool,

    /// Mark a newly created release as a prerelease
    #[clap(long, global = true)]
    pub prerelease: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Upload the staged binaries to the release for the package version
    Publish,
}

impl Cli {
    /// Release overrides given on the command line. Flags left unset do not
    /// override the configuration file.
    pub fn release_overrides(&self) -> ReleaseOverrides {
        ReleaseOverrides {
            target_commitish: self.target_commitish.clone(),
            name: self.name.clone(),
            body: self.body.clone(),
            draft: self.release.then_some(false),
            prerelease: self.prerelease.then_some(true),
        }
    }

    /// Combine the arguments with the discovered configuration file
    pub fn into_options(self) -> Result<PublishOptions> {
        let config = Config::discover(&self.project_dir, self.config.as_deref())?;
        let release = config.merge_with_args(self.release_overrides());

        Ok(PublishOptions {
            verbose: !self.silent,
            project_dir: self.project_dir,
            release,
        })
    }
}
