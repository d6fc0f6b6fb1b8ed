//! Blocking transaction driver.

use parking_lot::Mutex;

use super::transaction::{Plan, Transaction};
use super::Link;
use crate::config::ClientConfig;
use crate::error::{AmpError, AmpResult};
use crate::transport::Transport;
use crate::types::{Command, Reply};

/// Runs commands over a [`Transport`], one transaction at a time.
///
/// Callers on other threads wait on the port lock; their commands run in
/// lock acquisition order.
pub struct BlockingEngine<T: Transport> {
    link: Mutex<Link<T>>,
    config: ClientConfig,
}

impl<T: Transport> BlockingEngine<T> {
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
    /// Multi-step commands run every step under one hold of the port, so no
    /// other caller's transaction lands between them. The reply of the last
    /// step is returned.
    pub fn execute(&self, command: Command) -> AmpResult<Reply> {
        let plan = Plan::new(command)?;
        let mut link = self.link.lock();
        let mut last = Reply::Ack;
        for (completed, step) in plan.steps().iter().enumerate() {
            last = self
                .transact(&mut link, step)
                .map_err(|err| plan.fail(completed, err))?;
        }
        Ok(last)
    }

    fn transact(&self, link: &mut Link<T>, tx: &Transaction) -> AmpResult<Reply> {
        if link.closed {
            return Err(AmpError::Closed);
        }
        if link.contaminated {
            log::warn!("[Amp] Previous transaction was interrupted, resynchronising");
        }

        link.transport.discard_input()?;
        link.contaminated = true;

        log::debug!("[Amp] -> {}", tx.frame().escape_ascii());
        let write_timeout = self.config.write_timeout;
        link.transport
            .write_all(tx.frame())
            .map_err(|err| AmpError::from_transport(err, write_timeout))?;

        let read_timeout = self.config.read_timeout;
        let mut lines = Vec::with_capacity(tx.lines_expected());
        for _ in 0..tx.lines_expected() {
            let line = link.transport.read_line(read_timeout).map_err(|err| {
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
    ///
    /// Waits for any in-flight transaction. Closing twice is a no-op.
    pub fn close(&self) -> AmpResult<()> {
        let mut link = self.link.lock();
        if link.closed {
            return Ok(());
        }
        link.closed = true;
        link.transport.close()?;
        log::info!("[Amp] Closed");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn is_contaminated(&self) -> bool {
        self.link.lock().contaminated
    }
}
