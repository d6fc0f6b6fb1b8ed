//! Suspending transaction driver for Tokio callers.
//!
//! Waiting for the port lock and for the device suspends the task rather
//! than blocking a runtime thread. Dropping an `execute` future mid-flight
//! releases the lock; the half-finished exchange marks the link so the next
//! transaction discards whatever the device sends late.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::timeout;

use super::transaction::{Plan, Transaction};
use super::Link;
use crate::config::ClientConfig;
use crate::error::{AmpError, AmpResult};
use crate::transport::AsyncTransport;
use crate::types::{Command, Reply};

/// Slack on top of the read timeout before the engine gives up on a
/// transport that does not time out on its own.
const READ_GRACE: Duration = Duration::from_millis(250);

/// Runs commands over an [`AsyncTransport`], one transaction at a time.
pub struct SuspendingEngine<T: AsyncTransport> {
    link: Mutex<Link<T>>,
    config: ClientConfig,
}

impl<T: AsyncTransport> SuspendingEngine<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            link: Mutex::new(Link::new(transport)),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Validates, sends and awaits the reply to `command`.
    ///
    /// Multi-step commands run every step under one hold of the port.
    pub async fn execute(&self, command: Command) -> AmpResult<Reply> {
        let plan = Plan::new(command)?;
        let mut link = self.link.lock().await;
        let mut last = Reply::Ack;
        for (completed, step) in plan.steps().iter().enumerate() {
            last = self
                .transact(&mut link, step)
                .await
                .map_err(|err| plan.fail(completed, err))?;
        }
        Ok(last)
    }

    async fn transact(&self, link: &mut Link<T>, tx: &Transaction) -> AmpResult<Reply> {
        if link.closed {
            return Err(AmpError::Closed);
        }
        if link.contaminated {
            log::warn!("[Amp] Previous transaction was interrupted, resynchronising");
        }

        let read_timeout = self.config.read_timeout;
        link.contaminated = true;
        timeout(read_timeout, link.transport.discard_input())
            .await
            .map_err(|_| elapsed("discard before", tx, read_timeout))??;

        log::debug!("[Amp] -> {}", tx.frame().escape_ascii());
        let write_timeout = self.config.write_timeout;
        timeout(write_timeout, link.transport.write_all(tx.frame()))
            .await
            .map_err(|_| elapsed("write of", tx, write_timeout))?
            .map_err(|err| AmpError::from_transport(err, write_timeout))?;

        // The transport enforces `read_timeout` itself and reports any partial
        // line; the outer bound only catches a transport that ignores it.
        let mut lines = Vec::with_capacity(tx.lines_expected());
        for _ in 0..tx.lines_expected() {
            let line = timeout(read_timeout + READ_GRACE, link.transport.read_line(read_timeout))
                .await
                .map_err(|_| elapsed("reply to", tx, read_timeout))?
                .map_err(|err| {
                    let err = AmpError::from_transport(err, read_timeout);
                    if matches!(err, AmpError::Timeout { .. }) {
                        log::warn!(
                            "[Amp] No reply to {} within {:?}",
                            tx.frame().escape_ascii(),
                            read_timeout
                        );
                    }
                    err
                })?;
            log::debug!("[Amp] <- {}", line.escape_ascii());
            lines.push(line);
        }

        link.contaminated = false;
        tx.interpret(&lines)
    }

    /// Closes the transport. Later commands fail with [`AmpError::Closed`].
    pub async fn close(&self) -> AmpResult<()> {
        let mut link = self.link.lock().await;
        if link.closed {
            return Ok(());
        }
        link.closed = true;
        link.transport.close().await?;
        log::info!("[Amp] Closed");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn is_contaminated(&self) -> bool {
        self.link.lock().await.contaminated
    }
}

fn elapsed(what: &str, tx: &Transaction, after: Duration) -> AmpError {
    log::warn!(
        "[Amp] No {} {} within {:?}",
        what,
        tx.frame().escape_ascii(),
        after
    );
    AmpError::Timeout {
        after,
        received: Vec::new(),
    }
}
