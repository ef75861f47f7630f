//! Invocation context and derived template variables
//!
//! The wrapper is installed as a symlink named after the tool it stands in
//! for. The name it was invoked under selects the configured command, and the
//! directory holding the symlink anchors the configuration file, `@(...)`
//! expansion and the PATH handed to the real tool.

use crate::resolver::{resolve_command, search_paths};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use pear_common::environment::{
    ARG0_VAR, CDIR_VAR, DATE_VAR, HOME_VAR, TIME_VAR, USER_VAR, WDIR_VAR,
};
use pear_common::paths::normalize;
use pear_common::Environment;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable names understood by the wrapper
pub const BYPASS_VAR: &str = "PEAR_BYPASS"; // Skip build and indexer logging
pub const LOG_FILTER_VAR: &str = "PEAR_LOG"; // tracing filter for wrapper diagnostics

/// Everything known about one invocation before the configuration is read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    /// Base name the wrapper was invoked as (e.g. "gcc")
    pub command_name: String,
    /// Directory containing the invoked symlink, absolute
    pub wrapper_dir: PathBuf,
    /// Working directory of the invocation
    pub working_dir: PathBuf,
    /// Arguments after argv[0], exactly as received
    pub args: Vec<OsString>,
}

impl InvocationContext {
    /// Build the context from this process' argv, PATH and working directory.
    pub fn from_process() -> Result<Self> {
        let mut argv = env::args_os();
        let arg0 = argv
            .next()
            .ok_or_else(|| anyhow!("wrapper was started without argv[0]"))?;
        let args = argv.collect();
        let working_dir =
            env::current_dir().context("Failed to determine the working directory")?;
        let search = search_paths(env::var_os("PATH").as_deref());

        Self::resolve(&arg0.to_string_lossy(), args, working_dir, &search)
    }

    /// Locate `arg0` on `search_paths` and derive the command name and
    /// wrapper directory from the absolute location. Symlinks are not
    /// followed: the wrapper directory is where the link lives.
    pub fn resolve(
        arg0: &str,
        args: Vec<OsString>,
        working_dir: PathBuf,
        search_paths: &[PathBuf],
    ) -> Result<Self> {
        let invoked = resolve_command(arg0, search_paths)
            .ok_or_else(|| anyhow!("exec: \"{arg0}\": executable file not found in $PATH"))?;
        let invoked = normalize(&working_dir.join(invoked));

        let command_name = invoked
            .file_name()
            .ok_or_else(|| anyhow!("Invoked path {} has no filename", invoked.display()))?
            .to_string_lossy()
            .into_owned();
        let wrapper_dir = invoked
            .parent()
            .ok_or_else(|| anyhow!("Invoked path {} has no parent directory", invoked.display()))?
            .to_path_buf();

        Ok(Self {
            command_name,
            wrapper_dir,
            working_dir,
            args,
        })
    }

    /// Derived variables seeded from the process environment and the clock.
    pub fn environment(&self) -> Environment {
        self.derived_environment(
            &env::var("HOME").unwrap_or_default(),
            &env::var("USER").unwrap_or_default(),
            chrono::Local::now().naive_local(),
        )
    }

    pub fn derived_environment(&self, home: &str, user: &str, now: NaiveDateTime) -> Environment {
        let mut env = Environment::new();
        env.set(ARG0_VAR, self.command_name.as_str());
        env.set(CDIR_VAR, path_string(&self.wrapper_dir));
        env.set(HOME_VAR, home);
        env.set(USER_VAR, user);
        env.set(DATE_VAR, now.format("%Y%m%d").to_string());
        env.set(TIME_VAR, now.format("%H%M%S").to_string());
        env.set(WDIR_VAR, path_string(&self.working_dir));
        env
    }

    /// When PEAR_BYPASS=1 the invocation is forwarded without writing logs.
    pub fn is_bypass_enabled() -> bool {
        env::var(BYPASS_VAR).as_deref() == Ok("1")
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
