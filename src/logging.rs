use std::path::PathBuf;
use std::sync::Once;

use tracing::Level;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

// Log targets, one per pipeline stage
pub const CATALOG_ADAPTER: &str = "catalog::adapter";
pub const CATALOG_VALIDATE: &str = "catalog::validate";
pub const CATALOG_SECTIONS: &str = "catalog::sections";
pub const CATALOG_IMAGES: &str = "catalog::images";
pub const CATALOG_SIMILARITY: &str = "catalog::similarity";
pub const CATALOG_CLUSTER: &str = "catalog::cluster";

static INIT: Once = Once::new();

const STAGE_TARGETS: &[&str] = &[
    CATALOG_ADAPTER,
    CATALOG_VALIDATE,
    CATALOG_SECTIONS,
    CATALOG_IMAGES,
    CATALOG_SIMILARITY,
    CATALOG_CLUSTER,
];

fn stage_filter(verbose: bool) -> EnvFilter {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_for(directives.as_deref(), verbose)
}

/// Non-empty `RUST_LOG` directives replace the stage defaults.
fn filter_for(directives: Option<&str>, verbose: bool) -> EnvFilter {
    if let Some(filter) = directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
    {
        return filter;
    }

    let level = if verbose { "debug" } else { "info" };
    STAGE_TARGETS.iter().fold(
        EnvFilter::default().add_directive(Level::WARN.into()),
        |filter, target| match format!("{}={}", target, level).parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        },
    )
}

/// Logs to stderr. `RUST_LOG`, when set, takes the place of the stage defaults.
pub fn init_logging(verbose: bool) {
    INIT.call_once(|| {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(stage_filter(verbose));

        tracing_subscriber::registry().with(stderr_layer).init();
    });
}

/// Logs to stderr and to `catalog-clusters.log` inside `log_dir`.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the duration of the run.
pub fn init_logging_with_dir(verbose: bool, log_dir: PathBuf) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::NEVER, log_dir, "catalog-clusters.log");
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

    INIT.call_once(|| {
        let file_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_line_number(true)
            .with_writer(non_blocking_appender)
            .with_filter(stage_filter(true));

        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(stage_filter(verbose));

        tracing_subscriber::registry()
            .with(file_layer)
            .with(stderr_layer)
            .init();
    });

    Ok(guard)
}
