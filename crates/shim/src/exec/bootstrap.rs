use crate::resolver::{resolve_command, search_paths};
use anyhow::{Context, Result};
use pear_common::paths::prepend_search_path;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::{debug, warn};

/// Locate the real executable on the wrapper's own PATH. Unresolvable names
/// are returned as given so the spawn reports the failure.
pub(crate) fn resolve_executable(exec: &str) -> PathBuf {
    let search = search_paths(env::var_os("PATH").as_deref());
    match resolve_command(exec, &search) {
        Some(path) => {
            debug!(exec, resolved = %path.display(), "resolved executable");
            path
        }
        None => {
            warn!(exec, "executable not found on PATH, running it as given");
            PathBuf::from(exec)
        }
    }
}

/// Run `binary` with inherited stdio and the wrapper directory in front of
/// PATH, so tools the child spawns are wrapped too.
pub(crate) fn execute_command(
    binary: &Path,
    args: &[OsString],
    wrapper_dir: &Path,
) -> Result<ExitStatus> {
    let path = prepend_search_path(wrapper_dir, env::var_os("PATH").as_deref());

    Command::new(binary)
        .args(args)
        .env("PATH", path)
        .status()
        .with_context(|| format!("Failed to execute {}", binary.display()))
}

/// Exit code the wrapper reports for a finished child.
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    status.code().unwrap_or(1)
}
