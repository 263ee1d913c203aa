use std::panic;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::error;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing: stderr always, plus a daily rotated file in `log_dir`
/// when one is given. `RUST_LOG` overrides the default `info` level.
pub fn setup_tracing(log_dir: Option<&Path>) -> Result<()> {
    let file_appender = log_dir
        .map(|dir| {
            RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("explorer.log")
                .build(dir)
                .with_context(|| format!("create log file in '{}'", dir.display()))
        })
        .transpose()?;
    let file_layer =
        file_appender.map(|appender| fmt::layer().with_ansi(false).with_writer(appender));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .with(filter)
        .try_init()
        .context("install tracing subscriber")?;

    Ok(())
}

/// Make sure panics end up in the log
pub fn setup_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        error!("Application panicked!");
        error!("Panic info: {:?}", panic_info);
        error!("Backtrace: {:?}", backtrace);
        default_hook(panic_info);
    }));
}
