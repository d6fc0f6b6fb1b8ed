//! Client facades.
//!
//! [`Monoprice`] and [`MonopriceAsync`] expose the same operations; pick the
//! one that matches how the caller waits. Zone and value arguments are the
//! raw numbers from the amplifier manual (zone `11`, volume `0..=38`) and
//! are validated before anything is written.

mod blocking;
mod suspending;

pub use blocking::Monoprice;
pub use suspending::MonopriceAsync;

use crate::error::{AmpError, AmpResult, MalformedResponse};
use crate::types::{Reply, ZoneStatus};

// The engine interprets replies per command, so a mismatched variant here
// means the reply policy table and the facade disagree.

fn into_status(reply: Reply) -> AmpResult<ZoneStatus> {
    match reply {
        Reply::Status(status) => Ok(status),
        other => Err(unexpected(other)),
    }
}

fn into_unit(reply: Reply) -> AmpResult<Vec<ZoneStatus>> {
    match reply {
        Reply::Unit(statuses) => Ok(statuses),
        other => Err(unexpected(other)),
    }
}

fn into_ack(reply: Reply) -> AmpResult<()> {
    match reply {
        Reply::Ack => Ok(()),
        other => Err(unexpected(other)),
    }
}

fn unexpected(reply: Reply) -> AmpError {
    MalformedResponse::UnexpectedStatus {
        line: format!("{reply:?}"),
    }
    .into()
}
