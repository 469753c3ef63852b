//! Concurrent draining of the subprocess output channels.

use std::io;

use futures_util::StreamExt;
use tokio::io::AsyncRead;

use crate::cli::{decode_lines, MessageClassifier, ResultMessage};
use crate::display::{truncate, MAX_CONTENT_LEN};
use crate::logging::{LogFields, LogLevel, RunLogger};

/// Everything collected from one subprocess run's output channels.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedOutput {
    /// Terminal result message, if the tool emitted one.
    pub result: Option<ResultMessage>,
    /// Diagnostic text, newline-joined, possibly empty.
    pub diagnostics: String,
}

/// Drain both output channels of one subprocess concurrently to completion.
///
/// The primary channel runs through the decoder and classifier until the
/// terminal result is seen; lines after the result are never consumed. The
/// diagnostic channel is logged line-by-line at error level and accumulated
/// for later inspection. Both drains progress in parallel within the calling
/// task so neither pipe can fill and stall the subprocess. A channel reaching
/// natural end of stream is not a failure.
///
/// # Errors
///
/// Returns an error only if reading one of the pipes fails at the OS level.
pub async fn collect_output<O, D>(
    primary: O,
    diagnostic: D,
    logger: &dyn RunLogger,
    fields: &LogFields,
) -> io::Result<CollectedOutput>
where
    O: AsyncRead + Unpin,
    D: AsyncRead + Unpin,
{
    let classifier = MessageClassifier::new(logger, fields.clone());

    let primary_drain = async {
        let lines = decode_lines(primary);
        tokio::pin!(lines);
        while let Some(line) = lines.next().await {
            let line = line?;
            if let Some(result) = classifier.classify(&line) {
                return Ok::<_, io::Error>(Some(result));
            }
        }
        Ok(None)
    };

    let diagnostic_drain = async {
        let lines = decode_lines(diagnostic);
        tokio::pin!(lines);
        let mut collected = String::new();
        while let Some(line) = lines.next().await {
            let line = line?;
            logger.log(
                LogLevel::Error,
                &format!("stderr: {}", truncate(&line, MAX_CONTENT_LEN)),
                fields,
            );
            if !collected.is_empty() {
                collected.push('\n');
            }
            collected.push_str(&line);
        }
        Ok::<_, io::Error>(collected)
    };

    let (result, diagnostics) = tokio::join!(primary_drain, diagnostic_drain);
    Ok(CollectedOutput {
        result: result?,
        diagnostics: diagnostics?,
    })
}
