use crate::error::{ReadFailure, Result, ScanError};
use context_protocol::{validate_relative_path, FileDescriptor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// A file read for a batch, keyed by its canonical id rather than the spelling
/// it was requested with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub path: String,
    pub content: String,
}

/// Resolve a client-supplied relative path to a descriptor for an existing
/// regular file that stays inside `root` once symlinks are resolved.
pub async fn describe(root: &Path, raw: &str) -> Result<FileDescriptor> {
    let relative = validate_relative_path(raw).map_err(|reason| ScanError::InvalidPath {
        path: raw.to_string(),
        reason,
    })?;
    let descriptor = FileDescriptor::under_root(root, &relative);

    let canonical_root = tokio::fs::canonicalize(root)
        .await
        .map_err(|err| ScanError::from_io(".".to_string(), err))?;
    let canonical = tokio::fs::canonicalize(descriptor.absolute_path())
        .await
        .map_err(|err| ScanError::from_io(relative.clone(), err))?;
    if !canonical.starts_with(&canonical_root) {
        return Err(ScanError::PermissionDenied(relative));
    }

    let metadata = tokio::fs::metadata(&canonical)
        .await
        .map_err(|err| ScanError::from_io(relative.clone(), err))?;
    if !metadata.is_file() {
        return Err(ScanError::NotFound(relative));
    }
    Ok(descriptor)
}

/// Read the current content of a described file as UTF-8 text.
pub async fn read_descriptor(descriptor: &FileDescriptor) -> Result<String> {
    let bytes = tokio::fs::read(descriptor.absolute_path())
        .await
        .map_err(|err| ScanError::from_io(descriptor.id().to_string(), err))?;
    String::from_utf8(bytes).map_err(|_| ScanError::Decode(descriptor.id().to_string()))
}

pub async fn read_file(root: &Path, raw: &str) -> Result<String> {
    let descriptor = describe(root, raw).await?;
    read_descriptor(&descriptor).await
}

/// Upper bound on files open at once during a batch read.
pub const MAX_CONCURRENT_READS: usize = 16;

/// Read every path concurrently, at most [`MAX_CONCURRENT_READS`] at a time.
///
/// Results keep the order of `paths` and carry each file's canonical id; when
/// several reads fail, the earliest one in that order is reported.
pub async fn read_many(
    root: &Path,
    paths: &[String],
) -> std::result::Result<Vec<LoadedFile>, ReadFailure> {
    let permits = Arc::new(Semaphore::new(MAX_CONCURRENT_READS));
    let mut tasks = JoinSet::new();
    for (index, path) in paths.iter().enumerate() {
        let root: PathBuf = root.to_path_buf();
        let path = path.clone();
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let result = match permits.acquire_owned().await {
                Ok(_permit) => read_loaded(&root, &path).await,
                Err(err) => Err(ScanError::Other(format!("read limiter closed: {err}"))),
            };
            (index, result)
        });
    }

    let mut slots: Vec<Option<Result<LoadedFile>>> = paths.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(err) => log::warn!("File read task failed: {err}"),
        }
    }

    let mut loaded = Vec::with_capacity(paths.len());
    for (path, slot) in paths.iter().zip(slots) {
        match slot {
            Some(Ok(file)) => loaded.push(file),
            Some(Err(source)) => {
                return Err(ReadFailure {
                    path: path.clone(),
                    source,
                })
            }
            None => {
                return Err(ReadFailure {
                    path: path.clone(),
                    source: ScanError::Other("read task did not complete".to_string()),
                })
            }
        }
    }
    Ok(loaded)
}

async fn read_loaded(root: &Path, raw: &str) -> Result<LoadedFile> {
    let descriptor = describe(root, raw).await?;
    let content = read_descriptor(&descriptor).await?;
    Ok(LoadedFile {
        path: descriptor.id().to_string(),
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_protocol::ErrorKind;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn reads_text_through_equivalent_spellings() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub").join("b.js"), "let y=2;").unwrap();

        assert_eq!(read_file(temp.path(), "sub/b.js").await.unwrap(), "let y=2;");
        assert_eq!(read_file(temp.path(), "./sub//b.js").await.unwrap(), "let y=2;");
    }

    #[tokio::test]
    async fn whitespace_edged_names_are_distinct_files() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("notes"), "plain").unwrap();
        fs::write(temp.path().join("notes "), "trailing").unwrap();

        assert_eq!(read_file(temp.path(), "notes ").await.unwrap(), "trailing");
        assert_eq!(read_file(temp.path(), "notes").await.unwrap(), "plain");
        let err = read_file(temp.path(), " notes").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn binary_content_is_a_decode_error() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("blob.bin"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let err = read_file(temp.path(), "blob.bin").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn rejects_traversal_and_directories() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("sub")).unwrap();

        let err = read_file(temp.path(), "../outside.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPath);

        let err = read_file(temp.path(), "sub").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = read_file(temp.path(), "missing.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinks_escaping_root_are_denied() {
        let outside = tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), "s3cret").unwrap();
        let temp = tempdir().unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("secret.txt"),
            temp.path().join("link.txt"),
        )
        .unwrap();

        let err = read_file(temp.path(), "link.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn read_many_keeps_request_order() {
        let temp = tempdir().unwrap();
        for (name, body) in [("a.txt", "A"), ("b.txt", "B"), ("c.txt", "C")] {
            fs::write(temp.path().join(name), body).unwrap();
        }
        let paths = vec!["c.txt".to_string(), "a.txt".to_string(), "b.txt".to_string()];

        let loaded = read_many(temp.path(), &paths).await.unwrap();
        let order: Vec<(&str, &str)> = loaded
            .iter()
            .map(|f| (f.path.as_str(), f.content.as_str()))
            .collect();
        assert_eq!(order, vec![("c.txt", "C"), ("a.txt", "A"), ("b.txt", "B")]);
    }

    #[tokio::test]
    async fn read_many_reports_canonical_ids() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("a.js"), "let x=1;").unwrap();
        fs::write(temp.path().join("sub").join("b.js"), "let y=2;").unwrap();
        let paths = vec!["./a.js".to_string(), "sub//./b.js".to_string()];

        let loaded = read_many(temp.path(), &paths).await.unwrap();
        let ids: Vec<&str> = loaded.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(ids, vec!["a.js", "sub/b.js"]);
    }

    #[tokio::test]
    async fn read_many_handles_more_files_than_the_limit() {
        let temp = tempdir().unwrap();
        let paths: Vec<String> = (0..MAX_CONCURRENT_READS * 4)
            .map(|n| {
                let name = format!("f{n:03}.txt");
                fs::write(temp.path().join(&name), n.to_string()).unwrap();
                name
            })
            .collect();

        let loaded = read_many(temp.path(), &paths).await.unwrap();
        assert_eq!(loaded.len(), paths.len());
        for (n, file) in loaded.iter().enumerate() {
            assert_eq!(file.path, paths[n]);
            assert_eq!(file.content, n.to_string());
        }
    }

    #[tokio::test]
    async fn read_many_names_first_failing_path() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "A").unwrap();
        let paths = vec![
            "a.txt".to_string(),
            "gone.txt".to_string(),
            "also-gone.txt".to_string(),
        ];

        let failure = read_many(temp.path(), &paths).await.unwrap_err();
        assert_eq!(failure.path, "gone.txt");
        assert_eq!(failure.source.kind(), ErrorKind::NotFound);
    }
}
