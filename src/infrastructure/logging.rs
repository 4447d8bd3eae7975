//! Human-visible narration of remote sessions.

use tracing::info;

use crate::common::result::DeployResult;
use crate::domain::value_objects::StreamKind;
use crate::infrastructure::remote::{Channel, LineHandler};

/// Accepts `(message, prefix)` pairs
pub trait PrefixLogger: Send + Sync {
    fn log(&self, message: &str, prefix: &str);
}

/// [`PrefixLogger`] that emits `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl PrefixLogger for TracingLogger {
    fn log(&self, message: &str, prefix: &str) {
        info!(target: "svndeploy::session", prefix, "{}", message);
    }
}

/// Prefix identifying the stream and host a line came from
pub fn stream_prefix(stream: StreamKind, host: &str) -> String {
    format!("{} :: {}", stream, host)
}

/// Logs every line and never answers
pub struct LogLines<'a> {
    logger: &'a dyn PrefixLogger,
}

impl<'a> LogLines<'a> {
    pub fn new(logger: &'a dyn PrefixLogger) -> Self {
        Self { logger }
    }
}

impl LineHandler for LogLines<'_> {
    fn on_line(
        &mut self,
        channel: &mut dyn Channel,
        stream: StreamKind,
        line: &str,
    ) -> DeployResult<()> {
        self.logger.log(line, &stream_prefix(stream, channel.host()));
        Ok(())
    }
}
