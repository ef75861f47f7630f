//! Content-addressed build and indexer logs
//!
//! Every invocation is identified by the SHA-1 of its serialized command line.
//! The digest, the classified input and the classified output are exposed to
//! log path templates as `.sha1`, `.input` and `.output`, so a configuration
//! can file logs per translation unit, per artifact or per distinct command.

use crate::classify::classify;
use anyhow::{Context, Result};
use pear_common::environment::{INPUT_VAR, OUTPUT_VAR, SHA1_VAR};
use pear_common::paths::absolutize_str;
use pear_common::Environment;
use sha1::{Digest, Sha1};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Serialized command line, newline terminated.
pub fn log_line(exec: &str, args: &[String]) -> String {
    format!("{exec} {}\n", args.join(" "))
}

/// Values naming one invocation inside log path templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogIdentity {
    pub sha1: String,
    pub input: String,
    pub output: String,
}

impl LogIdentity {
    /// Digest `line` and classify `args`. A missing input or output falls
    /// back to the digest so every template still expands to a stable name.
    pub fn derive(line: &str, args: &[String], working_dir: &str) -> Self {
        let sha1 = format!("{:x}", Sha1::digest(line.as_bytes()));
        let classification = classify(args);
        let anchor = |path: Option<String>| match path {
            Some(path) => absolutize_str(working_dir, &path),
            None => sha1.clone(),
        };

        let input = anchor(classification.input);
        let output = anchor(classification.output);
        Self {
            sha1,
            input,
            output,
        }
    }

    /// Environment for expanding one log path. The shared configuration is
    /// left untouched.
    pub fn apply(&self, env: &Environment) -> Environment {
        env.scoped([
            (SHA1_VAR, self.sha1.clone()),
            (INPUT_VAR, self.input.clone()),
            (OUTPUT_VAR, self.output.clone()),
        ])
    }

    /// Expand `template` into the path of this invocation's log file.
    pub fn log_path(&self, env: &Environment, template: &str) -> PathBuf {
        PathBuf::from(self.apply(env).expand(template))
    }
}

/// Write `line` to `path`, replacing any previous content.
pub fn write_log_file(path: &Path, line: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    fs::write(path, line).with_context(|| format!("Failed to write log file {}", path.display()))?;
    debug!(path = %path.display(), bytes = line.len(), "wrote log file");
    Ok(())
}
