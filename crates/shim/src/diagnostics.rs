use crate::context::LOG_FILTER_VAR;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the stderr subscriber for wrapper diagnostics.
///
/// The wrapper shares stderr with the compiler it runs, so the default level
/// is `warn` and `PEAR_LOG` opts into more.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_env(LOG_FILTER_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr));

    // a subscriber installed earlier (test harness, embedding binary) wins
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .ok();
}
