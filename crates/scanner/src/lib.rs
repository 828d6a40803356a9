//! # Context Scanner
//!
//! Lists the files under a scan root and reads them back on demand.
//!
//! ```text
//! Root directory
//!     │
//!     ├──> PathScanner (depth-first, sorted by name)
//!     │      └─> [FileDescriptor]
//!     │
//!     └──> read_file / read_many (validated, root-confined)
//!            └─> UTF-8 text
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use context_scanner::PathScanner;
//!
//! # fn main() -> context_scanner::Result<()> {
//! let files = PathScanner::new("/path/to/project").scan()?;
//! for file in &files {
//!     println!("{}", file.id());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod reader;
mod scanner;

pub use error::{ReadFailure, Result, ScanError};
pub use reader::{
    describe, read_descriptor, read_file, read_many, LoadedFile, MAX_CONCURRENT_READS,
};
pub use scanner::{PathScanner, ScanOptions};
