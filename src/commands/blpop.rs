use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

use crate::blocked::BlockedCommand;
use crate::commands::{CommandError, utf8_argument};
use crate::executor::{ExecResult, ExecutionContext};
use crate::resp::RespValue;
use crate::store::DataType;

#[derive(Debug, Clone, PartialEq)]
pub struct BlpopArguments {
    pub key: Bytes,
    /// Seconds to wait; `0.0` blocks until data arrives.
    pub timeout_secs: f64,
}

impl BlpopArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::WrongArity("blpop"));
        }

        let timeout_secs = utf8_argument(&arguments[1])?
            .parse::<f64>()
            .map_err(|_| CommandError::InvalidTimeout)?;
        if !timeout_secs.is_finite() {
            return Err(CommandError::InvalidTimeout);
        }
        if timeout_secs < 0.0 {
            return Err(CommandError::NegativeTimeout);
        }

        Ok(BlpopArguments {
            key: arguments[0].clone(),
            timeout_secs,
        })
    }
}

/// Handles the BLPOP command.
///
/// If the list already has a head element it is popped and returned as
/// `[key, element]`. Otherwise the client is registered in the blocked
/// registry and no reply is written; a later push or the timeout resolves
/// it. Inside EXEC the command never blocks and replies with a null array
/// instead.
pub fn blpop(
    arguments: &BlpopArguments,
    ctx: &mut ExecutionContext,
) -> Result<ExecResult, CommandError> {
    if let Some(entry) = ctx.store.get_mut(&arguments.key) {
        let DataType::List(list) = &mut entry.data else {
            return Err(CommandError::WrongType);
        };
        if let Some(element) = list.pop_front() {
            return Ok(ExecResult::Reply(RespValue::Array(vec![
                RespValue::BulkString(arguments.key.clone()),
                RespValue::BulkString(element),
            ])));
        }
    }

    if ctx.in_exec {
        return Ok(ExecResult::Reply(RespValue::NullArray));
    }

    let deadline = (arguments.timeout_secs > 0.0)
        .then(|| Instant::now() + Duration::from_secs_f64(arguments.timeout_secs));

    ctx.blocked.block(
        ctx.client_id,
        [arguments.key.clone()],
        BlockedCommand::BlPop {
            key: arguments.key.clone(),
        },
        deadline,
    );

    Ok(ExecResult::NoResponse)
}
