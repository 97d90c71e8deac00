use crate::cfg::Cfg;
use backtrace::Backtrace;
use std::{cell::RefCell, io};
use tracing::{warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{writer::MakeWriterExt, Layer},
    prelude::*,
};

thread_local! {
    pub static BACKTRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

/// Logs to stdout and to a daily rolling file in the configured log folder, up to the configured
/// level. Keep the returned guard alive until the end of `main`, otherwise buffered file logs
/// are lost.
/// # Panics
/// In case tracing cannot be setup properly, e.g., a global subscriber is already set.
pub fn tracing_setup(cfg: &Cfg) -> WorkerGuard {
    let level = cfg.log_level();
    let max_level = *level.as_ref().unwrap_or(&Level::INFO);
    let file_appender = tracing_appender::rolling::daily(cfg.log_folder(), "shotmark.log");
    let (file_appender, guard_flush_file) = tracing_appender::non_blocking(file_appender);
    let file_appender = Layer::new()
        .with_writer(file_appender.with_max_level(max_level))
        .with_line_number(true)
        .compact()
        .with_ansi(false)
        .with_file(true);
    let stdout = Layer::new()
        .with_writer(io::stdout.with_max_level(max_level))
        .with_file(true)
        .with_line_number(true);
    tracing_subscriber::registry()
        .with(file_appender)
        .with(stdout)
        .init();
    if let Err(e) = level {
        warn!("{e}, logging up to {max_level}");
    }
    std::panic::set_hook(Box::new(|_| {
        let trace = Backtrace::new();
        BACKTRACE.with(move |b| b.borrow_mut().replace(trace));
    }));
    guard_flush_file
}

use std::sync::Once;
static INIT: Once = Once::new();

pub fn init_tracing_for_tests() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .init();
    });
}
