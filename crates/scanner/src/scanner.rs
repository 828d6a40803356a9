use crate::error::{Result, ScanError};
use context_protocol::{relative_path_from, FileDescriptor};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Walk behaviour. The default lists every regular file, hidden ones included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Enter symlinked directories and list symlinked files. Cycles abort the scan.
    pub follow_links: bool,
    pub include_hidden: bool,
    /// Honor `.gitignore`, `.ignore` and git exclude files.
    pub respect_ignore_files: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            follow_links: false,
            include_hidden: true,
            respect_ignore_files: false,
        }
    }
}

/// Depth-first scanner producing one descriptor per regular file under a root
pub struct PathScanner {
    root: PathBuf,
    options: ScanOptions,
}

impl PathScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            options: ScanOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Entries are visited sorted by file name, so an unchanged tree always
    /// yields the same sequence. Any unreadable entry fails the whole scan.
    pub fn scan(&self) -> Result<Vec<FileDescriptor>> {
        let metadata = std::fs::metadata(&self.root)
            .map_err(|err| ScanError::from_io(self.root.display().to_string(), err))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(self.root.display().to_string()));
        }

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .standard_filters(false)
            .hidden(!self.options.include_hidden)
            .follow_links(self.options.follow_links)
            .sort_by_file_name(|a, b| a.cmp(b));
        if self.options.respect_ignore_files {
            builder
                .ignore(true)
                .git_ignore(true)
                .git_global(true)
                .git_exclude(true)
                .require_git(false);
        }

        let mut files = Vec::new();
        for result in builder.build() {
            let entry = result.map_err(|err| self.classify_walk_error(err))?;
            let Some(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }
            let Some(relative) = relative_path_from(&self.root, entry.path()) else {
                log::debug!("Skipping entry outside root: {}", entry.path().display());
                continue;
            };
            files.push(FileDescriptor::new(&relative, entry.path()));
        }

        log::info!("Found {} files under {}", files.len(), self.root.display());
        Ok(files)
    }

    fn display_path(&self, path: &Path) -> String {
        relative_path_from(&self.root, path).unwrap_or_else(|| ".".to_string())
    }

    fn classify_walk_error(&self, err: ignore::Error) -> ScanError {
        match err {
            ignore::Error::Loop { ancestor, child } => ScanError::SymlinkLoop {
                path: self.display_path(&child),
                ancestor: self.display_path(&ancestor),
            },
            ignore::Error::WithPath { path, err } => match *err {
                ignore::Error::Io(io) => ScanError::from_io(self.display_path(&path), io),
                other => self.classify_walk_error(other),
            },
            ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
                self.classify_walk_error(*err)
            }
            ignore::Error::Io(io) => ScanError::from_io(self.display_path(&self.root), io),
            ignore::Error::Partial(mut errs) if !errs.is_empty() => {
                self.classify_walk_error(errs.remove(0))
            }
            other => ScanError::Other(other.to_string()),
        }
    }
}
