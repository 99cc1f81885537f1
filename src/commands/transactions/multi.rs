use crate::client::SessionMode;
use crate::commands::CommandError;
use crate::executor::ExecutionContext;
use crate::resp::RespValue;

/// Handles the MULTI command: opens a transaction with an empty queue.
pub fn multi(ctx: &mut ExecutionContext) -> Result<RespValue, CommandError> {
    let record = ctx
        .clients
        .get_mut(&ctx.client_id)
        .expect("executor only dispatches for registered clients");

    if matches!(record.mode, SessionMode::Multi(_)) {
        return Err(CommandError::NestedMulti);
    }

    record.mode = SessionMode::Multi(Vec::new());
    Ok(RespValue::SimpleString("OK".to_string()))
}
