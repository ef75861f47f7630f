//! Pear toolchain wrapper
//!
//! The wrapper is symlinked in place of a compiler, linker or other toolchain
//! executable. For every invocation it rewrites the argument vector according
//! to the configured command, records the command line for build analysis
//! and for a source indexer, then runs the real tool.
//!
//! ## Architecture
//!
//! 1. Resolve argv[0] on PATH to find the invoked name and wrapper directory
//! 2. Load `pear.conf` from next to the wrapper directory
//! 3. Expand prepends and appends, drop filtered arguments
//! 4. Write the build log and the scrubbed indexer log
//! 5. Run the real tool with the wrapper directory in front of PATH
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pear_shim::run_shim;
//!
//! fn main() -> anyhow::Result<()> {
//!     let exit_code = run_shim()?;
//!     std::process::exit(exit_code);
//! }
//! ```

pub use classify::{classify, Classification};
pub use context::InvocationContext;
pub use exec::{dispatch, run_shim, Logging};
pub use logger::{log_line, write_log_file, LogIdentity};
pub use scrub::{ScrubResult, Scrubber};

mod classify;
mod context;
pub mod diagnostics;
mod exec;
mod logger;
mod resolver;
mod scrub;

pub use anyhow::{Context, Result};
