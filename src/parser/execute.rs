//! Callback execution
//!
//! Scheduled terminal commands run in FIFO order. Each invocation runs
//! pre-hooks (in the configured direction), the callback, then post-hooks
//! in the reverse direction; post-hooks always run. Failures are recorded
//! per command path.

use crate::error::ParseError;

use super::Parser;

/// Run one invocation: hooks around the callback. The failure (if any) is
/// recorded per path and also returned, rendered, so exec-on-parse can wrap
/// it.
pub(crate) fn run_invocation(parser: &mut Parser, path: &str) -> Option<anyhow::Error> {
    let Some(cmd) = parser.registry.command(path).cloned() else {
        let error = ParseError::CommandNotFound { path: path.to_string() };
        parser.state.exec_errors.insert(path.to_string(), error);
        return Some(anyhow::anyhow!("no executable command found at path: {path}"));
    };
    let Some(callback) = cmd.callback_ref().cloned() else {
        let error = ParseError::CommandNotFound { path: path.to_string() };
        parser.state.exec_errors.insert(path.to_string(), error);
        return Some(anyhow::anyhow!("no executable command found at path: {path}"));
    };

    let pre = parser.hooks.pre_sequence(path);
    let post = parser.hooks.post_sequence(path);

    let mut failure: Option<anyhow::Error> = None;
    for hook in pre {
        if let Err(error) = hook.as_ref()(parser, &cmd) {
            failure = Some(error);
            break;
        }
    }
    if failure.is_none() {
        tracing::debug!(path, "running command callback");
        if let Err(error) = callback.as_ref()(parser, &cmd) {
            failure = Some(error);
        }
    }
    // post-hooks run on every exit path
    for hook in post {
        if let Err(error) = hook.as_ref()(parser, &cmd, failure.as_ref()) {
            if failure.is_none() {
                failure = Some(error);
            }
        }
    }

    if let Some(error) = failure {
        tracing::warn!(path, "command callback failed: {error:#}");
        // the surviving copy keeps the full source chain; the returned one
        // carries the rendered message for exec-on-parse wrapping
        let rendered = anyhow::anyhow!("{error:#}");
        parser.state.exec_errors.insert(path.to_string(), ParseError::callback_error(path, error));
        return Some(rendered);
    }
    parser.state.exec_errors.shift_remove(path);
    None
}

/// Drain the FIFO queue; every invocation runs even when earlier ones
/// failed. Returns the number of failures.
pub(crate) fn run_all(parser: &mut Parser) -> usize {
    let queue = std::mem::take(&mut parser.state.scheduled);
    let mut failures = 0;
    for path in queue {
        if run_invocation(parser, &path).is_some() {
            failures += 1;
        }
    }
    failures
}
