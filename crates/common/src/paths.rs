use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "pear.conf";
pub const CONFIG_OVERRIDE_VAR: &str = "PEAR_CONFIG";

/// Separator between entries of PATH-like variables.
pub const SEARCH_PATH_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// Location of the configuration file for a wrapper installed in `wrapper_dir`.
///
/// `PEAR_CONFIG` wins when set to a non-empty value, otherwise the file sits
/// next to the wrapper directory (`<wrapper_dir>/../pear.conf`).
pub fn config_file(wrapper_dir: &Path) -> PathBuf {
    if let Ok(override_path) = std::env::var(CONFIG_OVERRIDE_VAR) {
        let trimmed = override_path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    wrapper_dir.join("..").join(CONFIG_FILE_NAME)
}

/// Join a relative `path` onto `base` and normalize the result lexically.
/// Absolute paths are returned unchanged.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    normalize(&base.join(path))
}

/// String flavoured [`absolutize`] for argument vectors.
pub fn absolutize_str(base: &str, path: &str) -> String {
    absolutize(Path::new(base), Path::new(path))
        .to_string_lossy()
        .into_owned()
}

/// Lexical cleanup: drops `.` components, folds `..` into its parent and
/// collapses repeated separators. Symlinks are not consulted.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Put `dir` in front of an existing PATH value.
pub fn prepend_search_path(dir: &Path, existing: Option<&std::ffi::OsStr>) -> OsString {
    let mut path = OsString::from(dir.as_os_str());
    if let Some(existing) = existing.filter(|value| !value.is_empty()) {
        path.push(SEARCH_PATH_SEPARATOR.to_string());
        path.push(existing);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn absolutize_joins_relative_paths() {
        assert_eq!(
            absolutize(Path::new("/wd"), Path::new("foo")),
            PathBuf::from("/wd/foo")
        );
        assert_eq!(absolutize_str("/wd", "src/../inc/./x.h"), "/wd/inc/x.h");
    }

    #[test]
    fn absolutize_keeps_absolute_paths() {
        assert_eq!(absolutize_str("/wd", "/usr/include"), "/usr/include");
    }

    #[test]
    fn normalize_never_climbs_above_root() {
        assert_eq!(normalize(Path::new("/a/../../b")), PathBuf::from("/b"));
        assert_eq!(normalize(Path::new("/opt//pear/")), PathBuf::from("/opt/pear"));
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
        assert_eq!(normalize(Path::new("a/..")), PathBuf::from("."));
    }

    #[cfg(unix)]
    #[test]
    fn prepend_search_path_puts_wrapper_first() {
        let path = prepend_search_path(Path::new("/opt/pear"), Some(OsStr::new("/usr/bin")));
        assert_eq!(path, OsString::from("/opt/pear:/usr/bin"));
    }

    #[test]
    fn prepend_search_path_without_existing_value() {
        assert_eq!(
            prepend_search_path(Path::new("/opt/pear"), None),
            OsString::from("/opt/pear")
        );
        assert_eq!(
            prepend_search_path(Path::new("/opt/pear"), Some(OsStr::new(""))),
            OsString::from("/opt/pear")
        );
    }

    #[test]
    fn config_file_sits_next_to_wrapper_dir() {
        std::env::remove_var(CONFIG_OVERRIDE_VAR);
        let path = config_file(Path::new("/opt/pear/bin"));
        assert_eq!(path, PathBuf::from("/opt/pear/bin/../pear.conf"));
    }
}
