use std::path::{Path, PathBuf};

use crate::error::{PublishError, Result};

/// Staging directory relative to the project directory
pub const STAGE_DIR: &str = "build/stage";

/// A file produced by the build and waiting to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub name: String,
    pub path: PathBuf,
    pub content_type: String,
    pub size: u64,
}

/// Resolve the directory holding the files for `tag`.
///
/// With a remote path template the files live in a subdirectory named after
/// the resolved tag.
pub fn stage_dir(project_dir: &Path, tag: &str, remote_path: bool) -> PathBuf {
    let base = project_dir.join(STAGE_DIR);
    if remote_path {
        base.join(tag)
    } else {
        base
    }
}

/// List the regular files directly inside `dir`, sorted by name.
pub async fn collect_staged_files(dir: &Path) -> Result<Vec<StagedFile>> {
    let unreadable = |source: std::io::Error| PublishError::StageDirUnreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await.map_err(unreadable)?;
    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        let metadata = tokio::fs::metadata(entry.path()).await?;
        if !metadata.is_file() {
            tracing::debug!("Skipping non-file entry {}", entry.path().display());
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::debug!("Skipping non UTF-8 file name {:?}", entry.file_name());
            continue;
        };

        files.push(StagedFile {
            content_type: get_content_type(&name),
            path: entry.path(),
            size: metadata.len(),
            name,
        });
    }

    if files.is_empty() {
        return Err(PublishError::EmptyStageDir {
            path: dir.to_path_buf(),
        });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// Determine content type for an asset from its file name.
///
/// Textual types carry an explicit UTF-8 charset. Names without a known
/// extension, such as `addon.node`, are sent as `application/octet-stream`.
pub fn get_content_type(file_name: &str) -> String {
    let Some(mime) = mime_guess::from_path(file_name).first() else {
        return "application/octet-stream".to_string();
    };

    let textual = mime.type_().as_str() == "text"
        || matches!(mime.essence_str(), "application/javascript" | "application/json");
    if textual {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.essence_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_content_type() {
        assert_eq!(get_content_type("addon.ZIP"), "application/zip");
        assert_eq!(get_content_type("SHASUMS.txt"), "text/plain; charset=utf-8");
        assert_eq!(get_content_type("index.html"), "text/html; charset=utf-8");
        assert_eq!(get_content_type("manifest.json"), "application/json; charset=utf-8");
        assert!(get_content_type("binding.js").ends_with("javascript; charset=utf-8"));
        assert_eq!(get_content_type("addon.7z"), "application/x-7z-compressed");
        assert_eq!(get_content_type("addon.node"), "application/octet-stream");
        assert_eq!(get_content_type("LICENSE"), "application/octet-stream");
    }

    #[test]
    fn test_stage_dir() {
        let root = Path::new("/project");
        assert_eq!(
            stage_dir(root, "2.0.0", false),
            PathBuf::from("/project/build/stage")
        );
        assert_eq!(
            stage_dir(root, "3.1.0/linux-x64", true),
            PathBuf::from("/project/build/stage/3.1.0/linux-x64")
        );
    }

    #[tokio::test]
    async fn test_collect_staged_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.node"), b"bbbb").unwrap();
        fs::write(dir.path().join("a.zip"), b"aa").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.node"), b"c").unwrap();

        let files = collect_staged_files(dir.path()).await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.zip", "b.node"]);

        assert_eq!(files[0].size, 2);
        assert_eq!(files[0].content_type, "application/zip");
        assert_eq!(files[1].size, 4);
        assert_eq!(files[1].path, dir.path().join("b.node"));
    }

    #[tokio::test]
    async fn test_empty_stage_dir() {
        let dir = tempdir().unwrap();
        let err = collect_staged_files(dir.path()).await.unwrap_err();
        assert!(matches!(err, PublishError::EmptyStageDir { .. }));
    }

    #[tokio::test]
    async fn test_missing_stage_dir() {
        let dir = tempdir().unwrap();
        let err = collect_staged_files(&dir.path().join("build/stage"))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::StageDirUnreadable { .. }));
    }
}
