//! Per-tool rewrite rules

use crate::environment::Environment;
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};

/// Rewrite rule for one wrapped executable, keyed by its invocation name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    /// Template resolving to the real executable.
    pub exec: String,
    /// Template for the plain build log path.
    pub logfile: String,
    /// Template for the scrubbed indexer log path.
    pub rtags_logfile: String,
    pub prepend: Vec<String>,
    pub append: Vec<String>,
    pub filter_out: Vec<String>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Fold a later definition into this one. Scalars are replaced only by
    /// non-empty values; lists accumulate in declaration order.
    pub fn merge(&mut self, other: &Command) {
        fn set_string(target: &mut String, value: &str) {
            if !value.is_empty() {
                *target = value.to_string();
            }
        }

        set_string(&mut self.exec, &other.exec);
        set_string(&mut self.logfile, &other.logfile);
        set_string(&mut self.rtags_logfile, &other.rtags_logfile);
        self.prepend.extend(other.prepend.iter().cloned());
        self.append.extend(other.append.iter().cloned());
        self.filter_out.extend(other.filter_out.iter().cloned());
    }

    /// Expand `exec`; an empty result means the command cannot run.
    pub fn resolve_exec(&self, env: &Environment) -> Result<String, MissingExecutable> {
        let exec = env.expand(&self.exec);
        if exec.is_empty() {
            return Err(MissingExecutable {
                command: self.name.clone(),
            });
        }
        Ok(exec)
    }

    /// Final argument vector: expanded prepends, the caller's arguments,
    /// expanded appends, minus every filtered literal. Caller arguments are
    /// carried as raw OS strings and never re-encoded.
    pub fn build_args(&self, env: &Environment, caller_args: &[OsString]) -> Vec<OsString> {
        let args: Vec<OsString> = self
            .prepend
            .iter()
            .map(|arg| OsString::from(env.expand(arg)))
            .chain(caller_args.iter().cloned())
            .chain(self.append.iter().map(|arg| OsString::from(env.expand(arg))))
            .collect();
        filter_out(args, &self.filter_out)
    }

    pub fn logs_plain(&self) -> bool {
        !self.logfile.is_empty()
    }

    pub fn logs_indexer(&self) -> bool {
        !self.rtags_logfile.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("executable name missing for command '{command}'")]
pub struct MissingExecutable {
    pub command: String,
}

/// Drop every argument equal to one of `patterns`, all occurrences.
pub fn filter_out<A: AsRef<OsStr>>(args: Vec<A>, patterns: &[String]) -> Vec<A> {
    if patterns.is_empty() {
        return args;
    }
    let patterns: HashSet<&OsStr> = patterns.iter().map(OsStr::new).collect();
    args.into_iter()
        .filter(|arg| !patterns.contains(arg.as_ref()))
        .collect()
}
