use crate::client::SessionMode;
use crate::commands::CommandError;
use crate::executor::ExecutionContext;
use crate::resp::RespValue;

/// Handles the DISCARD command: drops the queued commands and returns the
/// connection to standard mode.
pub fn discard(ctx: &mut ExecutionContext) -> Result<RespValue, CommandError> {
    let record = ctx
        .clients
        .get_mut(&ctx.client_id)
        .expect("executor only dispatches for registered clients");

    if !matches!(record.mode, SessionMode::Multi(_)) {
        return Err(CommandError::DiscardWithoutMulti);
    }

    record.mode = SessionMode::Standard;
    Ok(RespValue::SimpleString("OK".to_string()))
}
