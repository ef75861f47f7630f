use crate::logger::{log_line, write_log_file, LogIdentity};
use crate::scrub::{unescape_quotes, ScrubResult, Scrubber};
use anyhow::Result;
use pear_common::Environment;
use std::path::PathBuf;
use tracing::debug;

/// Write the raw command line to the build log. Returns the path written.
pub(crate) fn record_build_log(
    env: &Environment,
    template: &str,
    exec: &str,
    args: &[String],
    working_dir: &str,
) -> Result<PathBuf> {
    let line = log_line(exec, args);
    let identity = LogIdentity::derive(&line, args, working_dir);
    let path = identity.log_path(env, template);
    write_log_file(&path, &line)?;
    Ok(path)
}

/// Write the scrubbed command line to the indexer log. Preprocessing passes
/// and invocations that scrub down to nothing leave no file behind.
pub(crate) fn record_indexer_log(
    env: &Environment,
    template: &str,
    exec: &str,
    args: &[String],
    working_dir: &str,
) -> Result<Option<PathBuf>> {
    let scrubbed = match Scrubber::new(working_dir).scrub(args) {
        ScrubResult::Scrubbed(scrubbed) if !scrubbed.is_empty() => scrubbed,
        ScrubResult::Scrubbed(_) => {
            debug!("nothing left after scrubbing, indexer log skipped");
            return Ok(None);
        }
        ScrubResult::Suppressed => return Ok(None),
    };

    let line = unescape_quotes(&log_line(exec, &scrubbed));
    // named after the digest of what the indexer sees, but the raw
    // arguments still decide input and output
    let identity = LogIdentity::derive(&line, args, working_dir);
    let path = identity.log_path(env, template);
    write_log_file(&path, &line)?;
    Ok(Some(path))
}
