use crate::client::SessionMode;
use crate::commands::CommandError;
use crate::executor::{self, ExecResult, ExecutionContext};
use crate::resp::RespValue;

/// Handles the EXEC command.
///
/// Runs the queued commands in enqueue order and collects every reply into
/// one array. A failing command contributes its error reply and does not
/// abort the batch; a command that would block contributes a null array
/// instead of suspending the whole transaction.
pub fn exec(ctx: &mut ExecutionContext) -> Result<RespValue, CommandError> {
    let record = ctx
        .clients
        .get_mut(&ctx.client_id)
        .expect("executor only dispatches for registered clients");

    if !matches!(record.mode, SessionMode::Multi(_)) {
        return Err(CommandError::ExecWithoutMulti);
    }
    let SessionMode::Multi(queued) = std::mem::replace(&mut record.mode, SessionMode::Standard)
    else {
        unreachable!("mode was just checked to be Multi");
    };

    let was_in_exec = ctx.in_exec;
    ctx.in_exec = true;

    let mut replies = Vec::with_capacity(queued.len());
    for command in &queued {
        match executor::dispatch(command, ctx) {
            Ok(ExecResult::Reply(value)) => replies.push(value),
            Ok(ExecResult::NoResponse) => replies.push(RespValue::NullArray),
            Err(err) => replies.push(err.to_resp()),
        }
    }

    ctx.in_exec = was_in_exec;
    Ok(RespValue::Array(replies))
}
