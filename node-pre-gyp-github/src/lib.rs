//! # node-pre-gyp-github
//!
//! Publish prebuilt native addon binaries to GitHub releases.
//!
//! ## Overview
//!
//! The tool reads `package.json`, finds the GitHub release tagged with the
//! package version (or with `binary.remote_path` after `{version}`
//! substitution), creates it as a draft when it does not exist yet, and
//! uploads every file in the staging directory as a release asset. Assets
//! already attached to the release are never overwritten.
//!
//! ## Usage
//!
//! ```bash
//! export NODE_PRE_GYP_GITHUB_TOKEN=...
//!
//! # Upload build/stage/* to the release for the package version
//! node-pre-gyp-github publish
//!
//! # Publish the release right away instead of leaving a draft
//! node-pre-gyp-github publish --release
//! ```
//!
//! ## package.json
//!
//! ```json
//! {
//!   "name": "addon",
//!   "version": "1.0.0",
//!   "repository": { "url": "git+https://github.com/owner/addon.git" },
//!   "binary": {
//!     "host": "https://github.com/owner/addon/releases/download/",
//!     "remote_path": "{version}"
//!   }
//! }
//! ```
//!
//! With `remote_path` set, files are read from `build/stage/<tag>` where the
//! tag is the substituted remote path.
//!
//! ## Configuration
//!
//! Defaults for newly created releases can be set in
//! `.config/node-pre-gyp-github.toml` in the project directory or
//! `~/.config/node-pre-gyp-github.toml` for user-wide settings.

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Configuration file handling and release overrides
pub mod config;

/// Error types and error handling utilities
pub mod error;

/// GitHub API client for listing and creating releases and uploading assets
pub mod github;

/// `package.json` loading and validation
pub mod manifest;

/// Release resolution and asset upload for one run
pub mod publisher;

/// Staging directory enumeration
pub mod staging;

pub use error::{PublishError, Result};
pub use publisher::{publish, PublishOptions, PublishReport, Publisher};
