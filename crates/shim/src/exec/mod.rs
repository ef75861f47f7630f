mod bootstrap;
mod logging;

use self::bootstrap::{execute_command, exit_code, resolve_executable};
use self::logging::{record_build_log, record_indexer_log};
use crate::context::InvocationContext;
use anyhow::Result;
use pear_common::{paths, Config};
use tracing::debug;

/// Main wrapper entry point: resolve the invocation, load the configuration
/// and dispatch. Returns the exit code to report.
pub fn run_shim() -> Result<i32> {
    let ctx = InvocationContext::from_process()?;
    debug!(
        version = env!("PEAR_VERSION"),
        command = %ctx.command_name,
        wrapper_dir = %ctx.wrapper_dir.display(),
        "invocation resolved"
    );

    let config_path = paths::config_file(&ctx.wrapper_dir);
    let mut config = Config::new(ctx.environment());
    config.read_file(&config_path)?;

    let logging = if InvocationContext::is_bypass_enabled() {
        debug!("PEAR_BYPASS set, skipping logs");
        Logging::Disabled
    } else {
        Logging::Enabled
    };

    dispatch(&config, &ctx, logging)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logging {
    Enabled,
    Disabled,
}

/// Rewrite, log and run one invocation against a loaded configuration.
pub fn dispatch(config: &Config, ctx: &InvocationContext, logging: Logging) -> Result<i32> {
    let command = config.command(&ctx.command_name)?;
    let env = config.environment();

    let exec = command.resolve_exec(env)?;
    let args = command.build_args(env, &ctx.args);
    debug!(exec = %exec, args = ?args, "final command line");

    if logging == Logging::Enabled {
        let working_dir = ctx.working_dir.to_string_lossy();
        // logs are text; the tool still receives the raw arguments
        let text_args: Vec<String> = args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        if command.logs_plain() {
            let path =
                record_build_log(env, &command.logfile, &exec, &text_args, &working_dir)?;
            debug!(path = %path.display(), "build log written");
        }
        if command.logs_indexer() {
            if let Some(path) =
                record_indexer_log(env, &command.rtags_logfile, &exec, &text_args, &working_dir)?
            {
                debug!(path = %path.display(), "indexer log written");
            }
        }
    }

    let binary = resolve_executable(&exec);
    let status = execute_command(&binary, &args, &ctx.wrapper_dir)?;
    Ok(exit_code(status))
}
