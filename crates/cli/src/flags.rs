use clap::Args;
use context_scanner::ScanOptions;

/// Walk switches shared by every subcommand that scans a root.
#[derive(Args, Debug, Clone, Copy, Default)]
pub(crate) struct ScanFlags {
    /// Follow symbolic links while listing (reads stay confined to the root)
    #[arg(long)]
    pub(crate) follow_links: bool,

    /// Leave dot-files and dot-directories out of the listing
    #[arg(long)]
    pub(crate) skip_hidden: bool,

    /// Honor .gitignore, .ignore and git exclude files
    #[arg(long)]
    pub(crate) respect_gitignore: bool,
}

impl ScanFlags {
    pub(crate) const fn as_options(self) -> ScanOptions {
        ScanOptions {
            follow_links: self.follow_links,
            include_hidden: !self.skip_hidden,
            respect_ignore_files: self.respect_gitignore,
        }
    }
}
