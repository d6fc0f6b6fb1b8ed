//! Transaction planning and reply interpretation, free of I/O.
//!
//! Both drivers ([`blocking`](super::blocking) and
//! [`suspending`](super::suspending)) build a [`Plan`], write each step's
//! frame, read the number of lines its [`ReplyPolicy`] asks for, and hand
//! the lines back here. Only the waiting differs between them.

use crate::codec::{self, is_status_line};
use crate::error::{AmpError, AmpResult, MalformedResponse};
use crate::types::{Command, Reply, ReplyPolicy, Setting, Unit};
use crate::validate::validate;

/// One frame written and the reply lines it expects.
#[derive(Debug)]
pub(crate) struct Transaction {
    command: Command,
    policy: ReplyPolicy,
    frame: Vec<u8>,
}

impl Transaction {
    fn new(command: Command) -> Self {
        let frame = codec::encode(&command);
        let policy = command
            .reply_policy()
            .unwrap_or(ReplyPolicy::Ack);
        Self {
            command,
            policy,
            frame,
        }
    }

    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    pub fn lines_expected(&self) -> usize {
        self.policy.lines()
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Checks the reply lines against the policy and decodes them.
    pub fn interpret(&self, lines: &[Vec<u8>]) -> AmpResult<Reply> {
        debug_assert_eq!(lines.len(), self.lines_expected());

        match self.policy {
            ReplyPolicy::Ack => {
                if let Some(line) = lines.iter().find(|line| is_status_line(line)) {
                    return Err(MalformedResponse::UnexpectedStatus {
                        line: String::from_utf8_lossy(line).into_owned(),
                    }
                    .into());
                }
                Ok(Reply::Ack)
            }
            ReplyPolicy::Status { zone } => {
                let line = status_line(&lines[1])?;
                let status = codec::decode(line)?;
                if status.zone().id() != zone {
                    return Err(MalformedResponse::ZoneMismatch {
                        expected: zone,
                        found: status.zone().id(),
                    }
                    .into());
                }
                Ok(Reply::Status(status))
            }
            ReplyPolicy::Unit { unit } => {
                let unit = Unit::new(unit)?;
                let status_lines = lines[1..]
                    .iter()
                    .map(|line| status_line(line))
                    .collect::<AmpResult<Vec<_>>>()?;
                codec::decode_unit(unit, &status_lines).map(Reply::Unit)
            }
        }
    }
}

fn status_line(line: &[u8]) -> AmpResult<&[u8]> {
    if is_status_line(line) {
        Ok(line)
    } else {
        Err(MalformedResponse::MissingStatus {
            line: String::from_utf8_lossy(line).into_owned(),
        }
        .into())
    }
}

/// The validated, single-frame transactions that make up a command.
#[derive(Debug)]
pub(crate) struct Plan {
    steps: Vec<Transaction>,
    composite: bool,
}

impl Plan {
    /// Validates `command` and splits it into transactions.
    ///
    /// Nothing has been written when this fails.
    pub fn new(command: Command) -> AmpResult<Self> {
        let command = validate(command)?;
        let composite = matches!(command, Command::RestoreZone(_));
        let steps = command.steps().into_iter().map(Transaction::new).collect();
        Ok(Self { steps, composite })
    }

    pub fn steps(&self) -> &[Transaction] {
        &self.steps
    }

    /// Wraps the failure of step `completed` (0-based, so also the number of
    /// steps that succeeded) in a restore report when the plan is a restore.
    pub fn fail(&self, completed: usize, err: AmpError) -> AmpError {
        if !self.composite {
            return err;
        }
        let failed = self.steps[completed]
            .command()
            .setting()
            .unwrap_or(Setting::Zone);
        AmpError::Restore {
            completed,
            failed,
            source: Box::new(err),
        }
    }
}
