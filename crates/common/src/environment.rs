//! Template variables and `$(name)` / `@(name)` expansion
//!
//! Every configuration template (executable, prepend/append arguments, log
//! paths, command names) is expanded against an [`Environment`]. Two sigils
//! are understood:
//!
//! * `$(name)` substitutes the value verbatim;
//! * `@(name)` substitutes the value as a path, re-basing relative values onto
//!   the wrapper directory (`.cdir`).
//!
//! References to unset or empty variables are left in place. Substituted text
//! is never rescanned, so expansion is a single pass.

use crate::paths::absolutize;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::Path;

/// Invoked command base name.
pub const ARG0_VAR: &str = ".arg0";
/// Directory holding the wrapper symlink.
pub const CDIR_VAR: &str = ".cdir";
pub const HOME_VAR: &str = ".home";
pub const USER_VAR: &str = ".user";
/// Local date as `YYYYMMDD`.
pub const DATE_VAR: &str = ".date";
/// Local time as `HHMMSS`.
pub const TIME_VAR: &str = ".time";
/// Working directory of the invocation.
pub const WDIR_VAR: &str = ".wdir";
/// Hex digest of the serialized log line. Only set while expanding log paths.
pub const SHA1_VAR: &str = ".sha1";
/// Absolute input file, or the digest. Only set while expanding log paths.
pub const INPUT_VAR: &str = ".input";
/// Absolute output file, or the digest. Only set while expanding log paths.
pub const OUTPUT_VAR: &str = ".output";

static REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[$@]\(.+?\)").expect("reference pattern is valid"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `name`, or the empty string when unset.
    pub fn get(&self, name: &str) -> &str {
        self.vars.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Store `value` after expanding it against the current contents.
    pub fn set_expanded(&mut self, name: impl Into<String>, value: &str) {
        let expanded = self.expand(value);
        self.vars.insert(name.into(), expanded);
    }

    /// Copy of this environment with `overrides` applied on top.
    pub fn scoped<'a, I>(&self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        let mut scoped = self.clone();
        for (name, value) in overrides {
            scoped.set(name, value);
        }
        scoped
    }

    pub fn expand(&self, template: &str) -> String {
        REFERENCE
            .replace_all(template, |caps: &Captures<'_>| self.substitute(&caps[0]))
            .into_owned()
    }

    fn substitute(&self, reference: &str) -> String {
        // reference is `$(name)` or `@(name)`
        let name = &reference[2..reference.len() - 1];
        let value = self.get(name);
        if value.is_empty() {
            return reference.to_string();
        }
        if reference.starts_with('@') {
            return absolutize(Path::new(self.get(CDIR_VAR)), Path::new(value))
                .to_string_lossy()
                .into_owned();
        }
        value.to_string()
    }
}
