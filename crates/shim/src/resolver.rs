//! Executable lookup on PATH
//!
//! Used twice per invocation: once to find where the wrapper itself was
//! invoked from (its `argv[0]`), and once to find the real executable named by
//! a command's `exec` template.

use std::ffi::OsStr;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Split a PATH value into its non-empty entries, in order.
pub fn search_paths(path_var: Option<&OsStr>) -> Vec<PathBuf> {
    path_var
        .map(|value| {
            std::env::split_paths(value)
                .filter(|entry| !entry.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Find `command` the way a shell would: names containing a separator are
/// taken as given, bare names are looked up in `search_paths`.
pub fn resolve_command(command: &str, search_paths: &[PathBuf]) -> Option<PathBuf> {
    if command.contains(MAIN_SEPARATOR) || command.contains('/') {
        let path = PathBuf::from(command);
        return is_executable(&path).then_some(path);
    }
    resolve_in_search_paths(command, search_paths)
}

fn resolve_in_search_paths(command: &str, search_paths: &[PathBuf]) -> Option<PathBuf> {
    for dir in search_paths {
        let candidate = dir.join(command);

        // On Windows, try with common executable extensions
        #[cfg(windows)]
        {
            let extensions =
                std::env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());

            for ext in extensions.split(';') {
                if let Some(ext) = ext.strip_prefix('.') {
                    let path_with_ext = candidate.with_extension(ext);
                    if is_executable(&path_with_ext) {
                        return Some(path_with_ext);
                    }
                }
            }
        }

        if is_executable(&candidate) {
            return Some(candidate);
        }
    }

    None
}

/// Check if a path is an executable file (symlinks are followed)
pub(crate) fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = std::fs::metadata(path) {
            metadata.is_file() && (metadata.permissions().mode() & 0o111 != 0)
        } else {
            false
        }
    }

    #[cfg(windows)]
    {
        std::fs::metadata(path)
            .map(|m| m.is_file())
            .unwrap_or(false)
    }
}
