//! Observers of analysis progress.
//!
//! A sink only watches: the pipeline never reads anything back from it.
use log::info;

pub trait ProgressSink {
    fn status(&self, message: &str);
}

/// Discards every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn status(&self, _message: &str) {}
}

/// Forwards messages to the `log` facade at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn status(&self, message: &str) {
        info!("{message}");
    }
}

impl<F> ProgressSink for F
where
    F: Fn(&str),
{
    fn status(&self, message: &str) {
        self(message)
    }
}
