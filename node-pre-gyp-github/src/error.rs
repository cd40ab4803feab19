use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("GitHub API error: HTTP {status} - {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {}: {source}", .path.display())]
    ManifestRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    ManifestParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Missing {field} in package.json")]
    MissingField { field: &'static str },

    #[error("A correctly formatted GitHub repository.url was not found within package.json")]
    InvalidRepositoryUrl { url: String },

    #[error("binary.host in package.json should begin with: \"{expected}\"")]
    InvalidBinaryHost { expected: String },

    #[error("{var} environment variable not found")]
    MissingToken { var: &'static str },

    #[error("{var} contains characters that are not allowed in an HTTP header")]
    InvalidToken { var: &'static str },

    #[error("Configuration error at {path}: {message}")]
    Config { path: String, message: String },

    #[error("Stage directory {} could not be read: {source}", .path.display())]
    StageDirUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No files found within the stage directory: {}", .path.display())]
    EmptyStageDir { path: PathBuf },

    #[error("Staged file {file} found but it already exists in release {tag}. If you would like to replace it, you must first manually delete it within GitHub.")]
    AssetExists { file: String, tag: String },

    #[error("Failed to upload {file}: HTTP {status} - {message}")]
    UploadRejected {
        file: String,
        status: u16,
        message: String,
    },

    #[error("Invalid upload URL '{url}' for release {tag}")]
    InvalidUploadUrl { url: String, tag: String },
}

pub type Result<T> = std::result::Result<T, PublishError>;
